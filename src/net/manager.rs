/*!
 * Socket Manager
 *
 * BSD socket calls adapted onto a transport provider. Records live in a
 * generation-tagged table whose lock is never held across a yield; blocking
 * calls snapshot what they need, release the table and spin on the yield
 * primitive.
 */

use super::notifier::{Notifier, SocketFlags};
use super::transport::{
    EndpointRef, OtStatus, RcvOptions, TransportKind, TransportProvider,
};
use super::types::*;
use crate::core::config::{ListenUnbound, Posix9Config};
use crate::core::errno::Errno;
use crate::core::{InlineString, SlotHandle, SlotTable};
use crate::host::Yielder;
use crate::signals::{Signal, SignalDelivery};
use parking_lot::Mutex;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::Arc;
use tracing::{debug, info, warn};

struct SocketRecord {
    endpoint: EndpointRef,
    socket_type: SocketType,
    protocol: i32,
    flags: Arc<SocketFlags>,
    notifier: Notifier,
    listening: bool,
    nonblocking: bool,
    /// Outgoing stream connect not yet collected
    connecting: bool,
    /// Stream connection made (it may since have been closed by the peer),
    /// or default datagram peer set
    established: bool,
    local: Option<SocketAddrV4>,
    peer: Option<SocketAddrV4>,
    shut_read: bool,
    shut_write: bool,
    options: SocketOptions,
}

impl SocketRecord {
    fn new(endpoint: EndpointRef, socket_type: SocketType, protocol: i32) -> Self {
        let flags = SocketFlags::new();
        Self {
            endpoint,
            socket_type,
            protocol,
            notifier: Notifier::new(flags.clone()),
            flags,
            listening: false,
            nonblocking: false,
            connecting: false,
            established: false,
            local: None,
            peer: None,
            shut_read: false,
            shut_write: false,
            options: SocketOptions::default(),
        }
    }

    fn io(&self) -> IoContext {
        IoContext {
            endpoint: self.endpoint,
            socket_type: self.socket_type,
            flags: self.flags.clone(),
            notifier: self.notifier.clone(),
            nonblocking: self.nonblocking,
            established: self.established,
            local: self.local,
            peer: self.peer,
            shut_read: self.shut_read,
            shut_write: self.shut_write,
        }
    }
}

/// What a call needs after the table lock is released
struct IoContext {
    endpoint: EndpointRef,
    socket_type: SocketType,
    flags: Arc<SocketFlags>,
    notifier: Notifier,
    nonblocking: bool,
    established: bool,
    local: Option<SocketAddrV4>,
    peer: Option<SocketAddrV4>,
    shut_read: bool,
    shut_write: bool,
}

/// Readiness of one socket for `select`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Readiness {
    pub read: bool,
    pub write: bool,
    pub except: bool,
}

/// Socket table and the BSD socket calls
pub struct SocketManager {
    provider: Arc<dyn TransportProvider>,
    yielder: Arc<Yielder>,
    signals: Arc<dyn SignalDelivery>,
    table: Mutex<SlotTable<SocketRecord>>,
    fd_base: i32,
    default_backlog: u32,
    listen_unbound: ListenUnbound,
    hostname: InlineString,
}

impl SocketManager {
    pub fn new(
        provider: Arc<dyn TransportProvider>,
        yielder: Arc<Yielder>,
        signals: Arc<dyn SignalDelivery>,
        config: &Posix9Config,
    ) -> Arc<Self> {
        info!(
            "Socket manager initialized ({} slots from fd {})",
            config.max_sockets, config.socket_fd_base
        );
        Arc::new(Self {
            provider,
            yielder,
            signals,
            table: Mutex::new(SlotTable::with_capacity(config.max_sockets)),
            fd_base: config.socket_fd_base,
            default_backlog: config.default_backlog.max(1),
            listen_unbound: config.listen_unbound,
            hostname: config.hostname.clone(),
        })
    }

    pub(crate) fn provider(&self) -> &Arc<dyn TransportProvider> {
        &self.provider
    }

    pub(crate) fn yielder(&self) -> &Arc<Yielder> {
        &self.yielder
    }

    pub(crate) fn hostname(&self) -> &InlineString {
        &self.hostname
    }

    // =========================================================================
    // Descriptors
    // =========================================================================

    /// Whether `raw` falls in the socket descriptor band
    pub fn is_socket_raw(&self, raw: i32) -> bool {
        raw >= self.fd_base && ((raw - self.fd_base) as usize) < self.table.lock().capacity()
    }

    /// Resolve a raw descriptor number to a live socket
    pub fn resolve(&self, raw: i32) -> SocketResult<SocketFd> {
        if !self.is_socket_raw(raw) {
            return Err(SocketError::NotSocket(raw));
        }
        let index = (raw - self.fd_base) as usize;
        self.table
            .lock()
            .handle_at(index)
            .map(|handle| self.fd_for(handle))
            .ok_or(SocketError::BadDescriptor(raw))
    }

    pub fn socket_count(&self) -> usize {
        self.table.lock().len()
    }

    pub fn info(&self, fd: SocketFd) -> SocketResult<SocketInfo> {
        self.with_record(fd, |rec| {
            self.settle(rec);
            Ok(SocketInfo {
                fd: fd.raw(),
                socket_type: rec.socket_type,
                protocol: rec.protocol,
                bound: rec.local.is_some(),
                listening: rec.listening,
                connected: rec.established && rec.flags.connected(),
                nonblocking: rec.nonblocking,
                local: rec.local,
                peer: rec.peer,
                readable: rec.flags.readable(),
                writable: rec.flags.writable(),
                has_oob: rec.flags.has_oob(),
                options: rec.options,
            })
        })
    }

    fn fd_for(&self, handle: SlotHandle) -> SocketFd {
        SocketFd::new(handle, self.fd_base + handle.index() as i32)
    }

    fn with_record<R, F>(&self, fd: SocketFd, f: F) -> SocketResult<R>
    where
        F: FnOnce(&mut SocketRecord) -> SocketResult<R>,
    {
        let mut table = self.table.lock();
        let rec = table
            .get_mut(fd.handle())
            .ok_or(SocketError::BadDescriptor(fd.raw()))?;
        f(rec)
    }

    fn insert(&self, record: SocketRecord) -> SocketResult<SocketFd> {
        let inserted = self.table.lock().insert(record);
        match inserted {
            Some(handle) => Ok(self.fd_for(handle)),
            None => Err(SocketError::TableFull),
        }
    }

    /// Snapshot for a call that may block
    fn io_context(&self, fd: SocketFd) -> SocketResult<IoContext> {
        self.with_record(fd, |rec| {
            self.settle(rec);
            Ok(rec.io())
        })
    }

    /// Collect a finished outgoing connect, if there is one
    fn settle(&self, rec: &mut SocketRecord) {
        if !rec.connecting {
            return;
        }
        match self.provider.rcv_connect(rec.endpoint) {
            Err(OtStatus::NO_DATA) => {}
            Ok(peer) => {
                rec.connecting = false;
                rec.established = true;
                rec.peer = Some(peer);
                rec.flags.set_connected(true);
                rec.flags.reset_connect();
                debug!("Connect to {} completed", peer);
            }
            Err(status) => {
                rec.connecting = false;
                rec.flags.reset_connect();
                rec.flags.set_async_error(status);
                debug!("Connect failed: {}", status);
            }
        }
    }

    /// Deliver queued endpoint events and apply the current one
    fn refresh(&self, endpoint: EndpointRef, notifier: &Notifier) {
        if let Ok(Some((event, result))) = self.provider.look(endpoint) {
            notifier.notify(event, result);
        }
    }

    fn broken_pipe(&self, flags: MsgFlags) -> SocketError {
        if !flags.contains(MsgFlags::NOSIGNAL) {
            // SIGPIPE is a valid signal number
            let _ = self.signals.raise(Signal::SIGPIPE.number());
        }
        SocketError::BrokenPipe
    }

    fn open(&self, socket_type: SocketType, protocol: i32) -> SocketResult<SocketRecord> {
        let endpoint = self.provider.open_endpoint(socket_type.transport())?;
        let record = SocketRecord::new(endpoint, socket_type, protocol);
        let setup = self
            .provider
            .install_notifier(endpoint, record.notifier.clone())
            .and_then(|_| self.provider.set_synchronous(endpoint));
        if let Err(status) = setup {
            let _ = self.provider.close(endpoint);
            return Err(status.into());
        }
        Ok(record)
    }

    // =========================================================================
    // Creation and addressing
    // =========================================================================

    /// `socket(domain, type, protocol)`
    pub fn socket(&self, domain: i32, socket_type: i32, protocol: i32) -> SocketResult<SocketFd> {
        if domain != AF_INET {
            return Err(SocketError::AddressFamily(domain));
        }
        let ty = SocketType::from_raw(socket_type)
            .ok_or(SocketError::ProtocolNotSupported(socket_type))?;
        let protocol = match protocol {
            0 => ty.default_protocol(),
            p if p == ty.default_protocol() => p,
            p => return Err(SocketError::ProtocolNotSupported(p)),
        };

        let record = self.open(ty, protocol)?;
        let endpoint = record.endpoint;
        match self.insert(record) {
            Ok(fd) => {
                info!("Socket {} created ({:?}, protocol {})", fd.raw(), ty, protocol);
                Ok(fd)
            }
            Err(e) => {
                let _ = self.provider.close(endpoint);
                warn!("Socket table full");
                Err(e)
            }
        }
    }

    pub fn bind(&self, fd: SocketFd, addr: SocketAddrV4) -> SocketResult<()> {
        self.with_record(fd, |rec| {
            if rec.local.is_some() {
                return Err(SocketError::InvalidArgument("socket already bound".into()));
            }
            let local = self.provider.bind(rec.endpoint, Some(addr), 0)?;
            rec.local = Some(local);
            info!("Socket {} bound to {}", fd.raw(), local);
            Ok(())
        })
    }

    /// Bind to an ephemeral port if the socket has no address yet
    fn ensure_bound(&self, fd: SocketFd) -> SocketResult<SocketAddrV4> {
        self.with_record(fd, |rec| match rec.local {
            Some(local) => Ok(local),
            None => {
                let local = self.provider.bind(rec.endpoint, None, 0)?;
                rec.local = Some(local);
                debug!("Socket {} auto-bound to {}", fd.raw(), local);
                Ok(local)
            }
        })
    }

    pub fn getsockname(&self, fd: SocketFd) -> SocketResult<SocketAddrV4> {
        self.with_record(fd, |rec| {
            Ok(rec
                .local
                .unwrap_or(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0)))
        })
    }

    pub fn getpeername(&self, fd: SocketFd) -> SocketResult<SocketAddrV4> {
        self.with_record(fd, |rec| {
            self.settle(rec);
            match (rec.established, rec.peer) {
                (true, Some(peer)) => Ok(peer),
                _ => Err(SocketError::NotConnected),
            }
        })
    }

    // =========================================================================
    // Connection setup
    // =========================================================================

    /// Mark a stream socket passive with queue length `backlog`
    /// (non-positive values use the configured default)
    pub fn listen(&self, fd: SocketFd, backlog: i32) -> SocketResult<()> {
        self.with_record(fd, |rec| {
            if rec.socket_type != SocketType::Stream {
                return Err(SocketError::NotSupported("listen on a datagram socket".into()));
            }
            if rec.established || rec.connecting {
                return Err(SocketError::InvalidArgument("socket is connected".into()));
            }
            let qlen = if backlog > 0 {
                backlog as u32
            } else {
                self.default_backlog
            };

            match rec.local {
                // Keeps the binding and any queued connection indications
                Some(_) => self.provider.set_queue_length(rec.endpoint, qlen)?,
                None => match self.listen_unbound {
                    ListenUnbound::MarkOnly => {}
                    ListenUnbound::AutoBind => {
                        rec.local = Some(self.provider.bind(rec.endpoint, None, qlen)?);
                    }
                    ListenUnbound::Reject => {
                        return Err(SocketError::InvalidArgument(
                            "listen on an unbound socket".into(),
                        ));
                    }
                },
            }

            rec.listening = true;
            info!(
                "Socket {} listening on {:?} (backlog {})",
                fd.raw(),
                rec.local,
                qlen
            );
            Ok(())
        })
    }

    /// Take the next connection; returns the new socket and the peer address
    pub fn accept(&self, fd: SocketFd) -> SocketResult<(SocketFd, SocketAddrV4)> {
        let (ctx, protocol, options) = self.with_record(fd, |rec| {
            if !rec.listening {
                return Err(SocketError::InvalidArgument(
                    "socket is not listening".into(),
                ));
            }
            Ok((rec.io(), rec.protocol, rec.options))
        })?;

        let call = loop {
            match self.provider.listen(ctx.endpoint) {
                Ok(call) => break call,
                Err(OtStatus::NO_DATA) if ctx.nonblocking => return Err(SocketError::WouldBlock),
                Err(OtStatus::NO_DATA) => {
                    ctx.flags.clear_readable();
                    self.yielder.yield_once();
                    self.yielder.pump();
                }
                Err(status) => return Err(status.into()),
            }
        };
        ctx.flags.clear_readable();

        let mut record = self.open(SocketType::Stream, protocol)?;
        let resource = record.endpoint;
        if let Err(status) = self.provider.accept(ctx.endpoint, resource, &call) {
            let _ = self.provider.close(resource);
            warn!("Socket {} failed to accept {}: {}", fd.raw(), call.addr, status);
            return Err(status.into());
        }
        record.flags.set_connected(true);
        record.established = true;
        record.local = ctx.local;
        record.peer = Some(call.addr);
        record.options = options;

        match self.insert(record) {
            Ok(new_fd) => {
                info!(
                    "Socket {} accepted {} as socket {}",
                    fd.raw(),
                    call.addr,
                    new_fd.raw()
                );
                Ok((new_fd, call.addr))
            }
            Err(e) => {
                let _ = self.provider.snd_disconnect(resource);
                let _ = self.provider.close(resource);
                warn!("Socket table full, dropped connection from {}", call.addr);
                Err(e)
            }
        }
    }

    /// Connect to `dest`, waiting for the handshake unless non-blocking
    pub fn connect(&self, fd: SocketFd, dest: SocketAddrV4) -> SocketResult<()> {
        // State checks come before the implicit bind so a rejected
        // connect leaves the socket unbound
        self.with_record(fd, |rec| {
            if rec.listening {
                return Err(SocketError::InvalidArgument("socket is listening".into()));
            }
            self.settle(rec);
            if rec.connecting {
                return Err(SocketError::AlreadyInProgress);
            }
            if rec.socket_type == SocketType::Stream && rec.established {
                return Err(SocketError::AlreadyConnected);
            }
            Ok(())
        })?;
        self.ensure_bound(fd)?;

        let ctx = self.with_record(fd, |rec| {
            if rec.socket_type == SocketType::Datagram {
                rec.peer = Some(dest);
                rec.established = true;
                rec.flags.set_connected(true);
                debug!("Socket {} default peer {}", fd.raw(), dest);
                return Ok(None);
            }

            rec.flags.reset_connect();
            self.provider.connect(rec.endpoint, dest)?;
            rec.connecting = true;
            if rec.nonblocking {
                return Err(SocketError::InProgress);
            }
            Ok(Some(rec.io()))
        })?;

        let Some(ctx) = ctx else {
            return Ok(());
        };
        self.yielder.wait_until(None, || {
            self.refresh(ctx.endpoint, &ctx.notifier);
            ctx.flags.connect_done()
        });

        self.with_record(fd, |rec| {
            rec.connecting = false;
            rec.flags.reset_connect();
            match self.provider.rcv_connect(rec.endpoint) {
                Ok(peer) => {
                    rec.established = true;
                    rec.peer = Some(peer);
                    rec.flags.set_connected(true);
                    info!("Socket {} connected to {}", fd.raw(), peer);
                    Ok(())
                }
                Err(status) => {
                    rec.flags.take_async_error();
                    warn!("Socket {} connect to {} failed: {}", fd.raw(), dest, status);
                    Err(status.into())
                }
            }
        })
    }

    // =========================================================================
    // Data transfer
    // =========================================================================

    /// Send on a connected socket; blocks while flow-controlled unless
    /// non-blocking, in which case a partial count may be returned
    pub fn send(&self, fd: SocketFd, data: &[u8], flags: MsgFlags) -> SocketResult<usize> {
        let ctx = self.io_context(fd)?;
        if ctx.socket_type == SocketType::Datagram {
            let dest = ctx.peer.ok_or(SocketError::DestinationRequired)?;
            return self.send_datagram(fd, &ctx, dest, data, flags);
        }
        if !ctx.established {
            return Err(SocketError::NotConnected);
        }
        if ctx.shut_write {
            return Err(self.broken_pipe(flags));
        }

        let nonblocking = ctx.nonblocking || flags.contains(MsgFlags::DONTWAIT);
        let expedited = flags.contains(MsgFlags::OOB);
        let mut sent = 0;
        while sent < data.len() {
            match self.provider.snd(ctx.endpoint, &data[sent..], expedited) {
                Ok(n) => sent += n,
                Err(OtStatus::FLOW) => {
                    ctx.flags.clear_writable();
                    if nonblocking {
                        return if sent > 0 {
                            Ok(sent)
                        } else {
                            Err(SocketError::WouldBlock)
                        };
                    }
                    self.yielder.wait_until(None, || {
                        self.refresh(ctx.endpoint, &ctx.notifier);
                        ctx.flags.writable()
                    });
                }
                Err(_) if sent > 0 => break,
                Err(OtStatus::K_EPIPE) => return Err(self.broken_pipe(flags)),
                Err(status) => return Err(status.into()),
            }
        }
        Ok(sent)
    }

    /// Receive; with nothing queued a blocking socket reports end of stream
    /// (0) and a non-blocking one `WouldBlock`
    pub fn recv(&self, fd: SocketFd, buf: &mut [u8], flags: MsgFlags) -> SocketResult<usize> {
        let ctx = self.io_context(fd)?;
        self.recv_with(&ctx, buf, flags).map(|(n, _)| n)
    }

    /// Send to `dest` (datagram) or to the connected peer
    pub fn sendto(
        &self,
        fd: SocketFd,
        data: &[u8],
        flags: MsgFlags,
        dest: Option<SocketAddrV4>,
    ) -> SocketResult<usize> {
        let ctx = self.io_context(fd)?;
        match ctx.socket_type {
            SocketType::Stream => self.send(fd, data, flags),
            SocketType::Datagram => {
                let dest = dest.or(ctx.peer).ok_or(SocketError::DestinationRequired)?;
                self.send_datagram(fd, &ctx, dest, data, flags)
            }
        }
    }

    /// Receive with the sender's address
    pub fn recvfrom(
        &self,
        fd: SocketFd,
        buf: &mut [u8],
        flags: MsgFlags,
    ) -> SocketResult<(usize, Option<SocketAddrV4>)> {
        let ctx = self.io_context(fd)?;
        self.recv_with(&ctx, buf, flags)
    }

    fn send_datagram(
        &self,
        fd: SocketFd,
        ctx: &IoContext,
        dest: SocketAddrV4,
        data: &[u8],
        flags: MsgFlags,
    ) -> SocketResult<usize> {
        if ctx.shut_write {
            return Err(self.broken_pipe(flags));
        }
        if ctx.local.is_none() {
            self.ensure_bound(fd)?;
        }
        self.provider.snd_udata(ctx.endpoint, dest, data)?;
        Ok(data.len())
    }

    fn recv_with(
        &self,
        ctx: &IoContext,
        buf: &mut [u8],
        flags: MsgFlags,
    ) -> SocketResult<(usize, Option<SocketAddrV4>)> {
        let nonblocking = ctx.nonblocking || flags.contains(MsgFlags::DONTWAIT);
        let peek = flags.contains(MsgFlags::PEEK);
        let no_data = || {
            if nonblocking {
                Err(SocketError::WouldBlock)
            } else {
                Ok((0, None))
            }
        };

        if ctx.shut_read {
            return Ok((0, ctx.peer));
        }

        match ctx.socket_type {
            SocketType::Datagram => match self.provider.rcv_udata(ctx.endpoint, buf, peek) {
                Ok((n, src)) => {
                    if !peek {
                        ctx.flags.clear_readable();
                    }
                    Ok((n, Some(src)))
                }
                Err(OtStatus::NO_DATA) => no_data(),
                Err(status) => Err(status.into()),
            },
            SocketType::Stream => {
                if !ctx.established {
                    return Err(SocketError::NotConnected);
                }
                let expedited = flags.contains(MsgFlags::OOB);
                let options = RcvOptions { peek, expedited };
                match self.provider.rcv(ctx.endpoint, buf, options) {
                    Ok(n) => {
                        if !peek {
                            if expedited {
                                ctx.flags.clear_oob();
                            } else {
                                ctx.flags.clear_readable();
                            }
                        }
                        Ok((n, ctx.peer))
                    }
                    Err(OtStatus::NO_DATA) => no_data(),
                    Err(status) => Err(status.into()),
                }
            }
        }
    }

    /// `shutdown(how)`; shutting down the write side sends an orderly release
    pub fn shutdown(&self, fd: SocketFd, how: i32) -> SocketResult<()> {
        let how = ShutdownHow::from_raw(how)
            .ok_or_else(|| SocketError::InvalidArgument(format!("shutdown how {}", how).into()))?;
        self.with_record(fd, |rec| {
            self.settle(rec);
            if !rec.established {
                return Err(SocketError::NotConnected);
            }
            if how != ShutdownHow::Read
                && rec.socket_type == SocketType::Stream
                && !rec.shut_write
            {
                match self.provider.snd_orderly_disconnect(rec.endpoint) {
                    Ok(()) | Err(OtStatus::NO_RELEASE) => {}
                    Err(status) => return Err(status.into()),
                }
            }
            match how {
                ShutdownHow::Read => rec.shut_read = true,
                ShutdownHow::Write => rec.shut_write = true,
                ShutdownHow::Both => {
                    rec.shut_read = true;
                    rec.shut_write = true;
                }
            }
            debug!("Socket {} shut down {:?}", fd.raw(), how);
            Ok(())
        })
    }

    // =========================================================================
    // Options and modes
    // =========================================================================

    pub fn getsockopt(&self, fd: SocketFd, level: i32, name: i32) -> SocketResult<i32> {
        self.with_record(fd, |rec| {
            self.settle(rec);
            let stream = rec.socket_type == SocketType::Stream;
            match (level, name) {
                (SOL_SOCKET, SO_TYPE) => Ok(rec.socket_type.raw()),
                (SOL_SOCKET, SO_ERROR) => Ok(rec
                    .flags
                    .take_async_error()
                    .and_then(OtStatus::to_errno)
                    .map_or(0, Errno::code)),
                (SOL_SOCKET, SO_ACCEPTCONN) => Ok(rec.listening as i32),
                (SOL_SOCKET, SO_REUSEADDR) => Ok(rec.options.reuse_addr as i32),
                (SOL_SOCKET, SO_KEEPALIVE) => Ok(rec.options.keep_alive as i32),
                (SOL_SOCKET, SO_BROADCAST) => Ok(rec.options.broadcast as i32),
                (IPPROTO_TCP, TCP_NODELAY) if stream => Ok(rec.options.no_delay as i32),
                _ => Err(SocketError::NoProtocolOption { level, name }),
            }
        })
    }

    pub fn setsockopt(&self, fd: SocketFd, level: i32, name: i32, value: i32) -> SocketResult<()> {
        self.with_record(fd, |rec| {
            let on = value != 0;
            let stream = rec.socket_type == SocketType::Stream;
            match (level, name) {
                (SOL_SOCKET, SO_REUSEADDR) => rec.options.reuse_addr = on,
                (SOL_SOCKET, SO_KEEPALIVE) => rec.options.keep_alive = on,
                (SOL_SOCKET, SO_BROADCAST) => rec.options.broadcast = on,
                (IPPROTO_TCP, TCP_NODELAY) if stream => rec.options.no_delay = on,
                _ => return Err(SocketError::NoProtocolOption { level, name }),
            }
            Ok(())
        })
    }

    /// `fcntl(F_SETFL, O_NONBLOCK)` equivalent
    pub fn set_nonblocking(&self, fd: SocketFd, nonblocking: bool) -> SocketResult<()> {
        self.with_record(fd, |rec| {
            rec.nonblocking = nonblocking;
            Ok(())
        })
    }

    pub fn is_nonblocking(&self, fd: SocketFd) -> SocketResult<bool> {
        self.with_record(fd, |rec| Ok(rec.nonblocking))
    }

    // =========================================================================
    // Teardown and readiness
    // =========================================================================

    /// Release the connection (if any), close the endpoint and free the slot
    pub fn close(&self, fd: SocketFd) -> SocketResult<()> {
        let record = self
            .table
            .lock()
            .remove(fd.handle())
            .ok_or(SocketError::BadDescriptor(fd.raw()))?;

        if record.connecting {
            let _ = self.provider.snd_disconnect(record.endpoint);
        } else if record.established
            && record.socket_type == SocketType::Stream
            && !record.shut_write
        {
            if let Err(status) = self.provider.snd_orderly_disconnect(record.endpoint) {
                debug!("Socket {} release skipped: {}", fd.raw(), status);
            }
        }
        self.provider.close(record.endpoint)?;
        info!("Socket {} closed", fd.raw());
        Ok(())
    }

    /// Refresh one socket's events and report its readiness
    pub(crate) fn poll_readiness(&self, fd: SocketFd) -> SocketResult<Readiness> {
        let ctx = self.io_context(fd)?;
        self.refresh(ctx.endpoint, &ctx.notifier);
        let flags = &ctx.flags;
        let write_target = ctx.socket_type == SocketType::Datagram
            || flags.connected()
            || flags.async_error().is_some();
        Ok(Readiness {
            read: flags.readable(),
            write: flags.writable() && write_target,
            except: flags.has_oob(),
        })
    }
}
