/*!
 * Loopback Transport
 *
 * In-memory transport provider. Connections, unit data and events stay
 * inside the process; only local (127/8 or wildcard) addresses are
 * reachable. Events for endpoints in synchronous mode are queued and
 * delivered by housekeeping or `look`.
 */

use super::notifier::Notifier;
use super::transport::{
    Call, EndpointRef, OtResult, OtStatus, RcvOptions, TransportEvent, TransportKind,
    TransportProvider,
};
use crate::core::limits::{EPHEMERAL_PORT_START, LOOPBACK_BUFFER_BYTES};
use crate::core::InlineString;
use crate::host::Housekeeping;
use ahash::RandomState;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::Arc;
use tracing::debug;

/// Largest datagram accepted by `snd_udata`
const MAX_DATAGRAM: usize = 65_507;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Link {
    Idle,
    /// Waiting for the listener to accept
    Outgoing { listener: EndpointRef, sequence: u32 },
    Connected { peer: EndpointRef },
    /// Peer disconnected or went away
    Reset,
}

#[derive(Debug)]
struct Indication {
    sequence: u32,
    connector: EndpointRef,
    addr: SocketAddrV4,
    retrieved: bool,
}

struct LoopEndpoint {
    kind: TransportKind,
    synchronous: bool,
    notifier: Option<Notifier>,
    local: Option<SocketAddrV4>,
    /// Bound explicitly (accepted endpoints share the listener's port)
    owns_port: bool,
    qlen: u32,
    link: Link,
    indications: VecDeque<Indication>,
    connect_result: Option<OtResult<SocketAddrV4>>,
    inbox: VecDeque<u8>,
    expedited: VecDeque<u8>,
    datagrams: VecDeque<(SocketAddrV4, Vec<u8>)>,
    /// Peer sent an orderly release
    peer_released: bool,
    /// We sent an orderly release
    released: bool,
    /// Last `snd` hit a full peer buffer
    flow_blocked: bool,
    queued: VecDeque<(TransportEvent, OtStatus)>,
}

impl LoopEndpoint {
    fn new(kind: TransportKind) -> Self {
        Self {
            kind,
            synchronous: false,
            notifier: None,
            local: None,
            owns_port: false,
            qlen: 0,
            link: Link::Idle,
            indications: VecDeque::new(),
            connect_result: None,
            inbox: VecDeque::new(),
            expedited: VecDeque::new(),
            datagrams: VecDeque::new(),
            peer_released: false,
            released: false,
            flow_blocked: false,
            queued: VecDeque::new(),
        }
    }

    fn post(&mut self, event: TransportEvent, result: OtStatus) {
        if self.synchronous {
            self.queued.push_back((event, result));
        } else if let Some(notifier) = &self.notifier {
            notifier.notify(event, result);
        }
    }

    fn flush(&mut self) {
        while let Some((event, result)) = self.queued.pop_front() {
            if let Some(notifier) = &self.notifier {
                notifier.notify(event, result);
            }
        }
    }

    /// Level-triggered view of the endpoint
    fn current_event(&self) -> Option<(TransportEvent, OtStatus)> {
        if let Some(result) = &self.connect_result {
            return Some(match result {
                Ok(_) => (TransportEvent::Connect, OtStatus::NO_ERROR),
                Err(status) => (TransportEvent::Disconnect, *status),
            });
        }
        if self.indications.iter().any(|ind| !ind.retrieved) {
            return Some((TransportEvent::Listen, OtStatus::NO_ERROR));
        }
        if !self.expedited.is_empty() {
            return Some((TransportEvent::ExData, OtStatus::NO_ERROR));
        }
        if !self.inbox.is_empty() || !self.datagrams.is_empty() {
            return Some((TransportEvent::Data, OtStatus::NO_ERROR));
        }
        if self.peer_released {
            return Some((TransportEvent::OrdRel, OtStatus::NO_ERROR));
        }
        if self.link == Link::Reset {
            return Some((TransportEvent::Disconnect, OtStatus::NO_ERROR));
        }
        None
    }
}

struct LoopbackState {
    endpoints: HashMap<EndpointRef, LoopEndpoint, RandomState>,
    next_endpoint: u64,
    next_port: u16,
    next_sequence: u32,
}

impl LoopbackState {
    fn endpoint(&self, ep: EndpointRef) -> OtResult<&LoopEndpoint> {
        self.endpoints.get(&ep).ok_or(OtStatus::BAD_REFERENCE)
    }

    fn endpoint_mut(&mut self, ep: EndpointRef) -> OtResult<&mut LoopEndpoint> {
        self.endpoints.get_mut(&ep).ok_or(OtStatus::BAD_REFERENCE)
    }

    fn port_in_use(&self, kind: TransportKind, port: u16) -> bool {
        self.endpoints.values().any(|e| {
            e.kind == kind && e.owns_port && e.local.is_some_and(|addr| addr.port() == port)
        })
    }

    fn ephemeral_port(&mut self, kind: TransportKind) -> OtResult<u16> {
        let span = (u16::MAX - EPHEMERAL_PORT_START) as u32 + 1;
        for _ in 0..span {
            let port = self.next_port;
            self.next_port = if port == u16::MAX {
                EPHEMERAL_PORT_START
            } else {
                port + 1
            };
            if !self.port_in_use(kind, port) {
                return Ok(port);
            }
        }
        Err(OtStatus::ADDRESS_BUSY)
    }

    /// Listener whose port matches `dest`
    fn find_listener(&self, dest: SocketAddrV4, except: EndpointRef) -> Option<EndpointRef> {
        self.endpoints
            .iter()
            .find(|(r, e)| {
                **r != except
                    && e.kind == TransportKind::Tcp
                    && e.owns_port
                    && e.qlen > 0
                    && e.local.is_some_and(|addr| addr.port() == dest.port())
            })
            .map(|(r, _)| *r)
    }

    /// Fail every connector still queued on `indications`
    fn refuse(&mut self, indications: VecDeque<Indication>) {
        for ind in indications {
            if let Some(connector) = self.endpoints.get_mut(&ind.connector) {
                connector.link = Link::Idle;
                connector.connect_result = Some(Err(OtStatus::K_ECONNREFUSED));
                connector.post(TransportEvent::Disconnect, OtStatus::K_ECONNREFUSED);
            }
        }
    }

    fn drop_indication(&mut self, listener: EndpointRef, sequence: u32) {
        if let Some(lst) = self.endpoints.get_mut(&listener) {
            lst.indications.retain(|ind| ind.sequence != sequence);
        }
    }

    /// Tell `peer` that its connection is gone
    fn reset_peer(&mut self, peer: EndpointRef, abortive: bool) {
        if let Some(p) = self.endpoints.get_mut(&peer) {
            p.link = Link::Reset;
            if abortive {
                p.post(TransportEvent::Disconnect, OtStatus::K_ECONNRESET);
            }
        }
        // A blocked sender must wake to see the reset
        self.release_flow(peer);
    }

    /// Wake a sender that hit flow control
    fn release_flow(&mut self, sender: EndpointRef) {
        if let Some(p) = self.endpoints.get_mut(&sender) {
            if p.flow_blocked {
                p.flow_blocked = false;
                p.post(TransportEvent::GoData, OtStatus::NO_ERROR);
            }
        }
    }
}

fn is_local(ip: Ipv4Addr) -> bool {
    ip.is_loopback() || ip.is_unspecified()
}

fn drain_into(queue: &mut VecDeque<u8>, buf: &mut [u8], peek: bool) -> usize {
    let n = buf.len().min(queue.len());
    for (dst, src) in buf.iter_mut().zip(queue.iter()) {
        *dst = *src;
    }
    if !peek {
        queue.drain(..n);
    }
    n
}

/// In-process transport provider
pub struct LoopbackTransport {
    hostname: InlineString,
    buffer_bytes: usize,
    state: Mutex<LoopbackState>,
}

impl LoopbackTransport {
    /// Provider resolving `hostname` and `localhost` to 127.0.0.1
    pub fn new(hostname: &str) -> Arc<Self> {
        Self::with_buffer(hostname, LOOPBACK_BUFFER_BYTES)
    }

    /// As [`new`](Self::new) with a per-connection receive buffer of
    /// `buffer_bytes`
    pub fn with_buffer(hostname: &str, buffer_bytes: usize) -> Arc<Self> {
        Arc::new(Self {
            hostname: hostname.into(),
            buffer_bytes: buffer_bytes.max(1),
            state: Mutex::new(LoopbackState {
                endpoints: HashMap::with_hasher(RandomState::new()),
                next_endpoint: 1,
                next_port: EPHEMERAL_PORT_START,
                next_sequence: 1,
            }),
        })
    }

    pub fn endpoint_count(&self) -> usize {
        self.state.lock().endpoints.len()
    }

    /// Events queued and not yet delivered, across all endpoints
    pub fn queued_events(&self) -> usize {
        self.state
            .lock()
            .endpoints
            .values()
            .map(|e| e.queued.len())
            .sum()
    }
}

impl Housekeeping for LoopbackTransport {
    fn service(&self) {
        let mut state = self.state.lock();
        for endpoint in state.endpoints.values_mut() {
            endpoint.flush();
        }
    }
}

impl TransportProvider for LoopbackTransport {
    fn open_endpoint(&self, kind: TransportKind) -> OtResult<EndpointRef> {
        let mut state = self.state.lock();
        let ep = EndpointRef(state.next_endpoint);
        state.next_endpoint += 1;
        state.endpoints.insert(ep, LoopEndpoint::new(kind));
        Ok(ep)
    }

    fn install_notifier(&self, ep: EndpointRef, notifier: Notifier) -> OtResult<()> {
        self.state.lock().endpoint_mut(ep)?.notifier = Some(notifier);
        Ok(())
    }

    fn set_synchronous(&self, ep: EndpointRef) -> OtResult<()> {
        self.state.lock().endpoint_mut(ep)?.synchronous = true;
        Ok(())
    }

    fn bind(
        &self,
        ep: EndpointRef,
        requested: Option<SocketAddrV4>,
        qlen: u32,
    ) -> OtResult<SocketAddrV4> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let endpoint = state.endpoint(ep)?;
        if endpoint.local.is_some() {
            return Err(OtStatus::OUT_STATE);
        }
        let kind = endpoint.kind;

        let requested = requested.unwrap_or(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0));
        if !is_local(*requested.ip()) {
            return Err(OtStatus::BAD_ADDRESS);
        }
        let port = match requested.port() {
            0 => state.ephemeral_port(kind)?,
            port if state.port_in_use(kind, port) => return Err(OtStatus::ADDRESS_BUSY),
            port => port,
        };
        let host = if requested.ip().is_unspecified() {
            Ipv4Addr::LOCALHOST
        } else {
            *requested.ip()
        };
        let addr = SocketAddrV4::new(host, port);

        let endpoint = state.endpoint_mut(ep)?;
        endpoint.local = Some(addr);
        endpoint.owns_port = true;
        endpoint.qlen = if kind == TransportKind::Tcp { qlen } else { 0 };
        debug!("{} bound to {} (qlen {})", ep, addr, endpoint.qlen);
        Ok(addr)
    }

    fn set_queue_length(&self, ep: EndpointRef, qlen: u32) -> OtResult<()> {
        let mut state = self.state.lock();
        let endpoint = state.endpoint_mut(ep)?;
        if endpoint.kind != TransportKind::Tcp {
            return Err(OtStatus::NOT_SUPPORTED);
        }
        if endpoint.local.is_none() || endpoint.link != Link::Idle {
            return Err(OtStatus::OUT_STATE);
        }
        endpoint.qlen = qlen;
        debug!("{} queue length now {}", ep, qlen);
        if qlen == 0 {
            let pending = std::mem::take(&mut endpoint.indications);
            state.refuse(pending);
        }
        Ok(())
    }

    fn listen(&self, ep: EndpointRef) -> OtResult<Call> {
        let mut state = self.state.lock();
        let endpoint = state.endpoint_mut(ep)?;
        if endpoint.kind != TransportKind::Tcp {
            return Err(OtStatus::NOT_SUPPORTED);
        }
        if endpoint.local.is_none() || endpoint.qlen == 0 {
            return Err(OtStatus::OUT_STATE);
        }
        let ind = endpoint
            .indications
            .iter_mut()
            .find(|ind| !ind.retrieved)
            .ok_or(OtStatus::NO_DATA)?;
        ind.retrieved = true;
        Ok(Call {
            addr: ind.addr,
            sequence: ind.sequence,
        })
    }

    fn accept(&self, listener: EndpointRef, resource: EndpointRef, call: &Call) -> OtResult<()> {
        if listener == resource {
            return Err(OtStatus::NOT_SUPPORTED);
        }
        let mut state = self.state.lock();

        let res = state.endpoint(resource)?;
        if res.kind != TransportKind::Tcp {
            return Err(OtStatus::PROVIDER_MISMATCH);
        }
        if res.link != Link::Idle {
            return Err(OtStatus::OUT_STATE);
        }

        let lst = state.endpoint_mut(listener)?;
        let local = lst.local.ok_or(OtStatus::OUT_STATE)?;
        let pos = lst
            .indications
            .iter()
            .position(|ind| ind.sequence == call.sequence)
            .ok_or(OtStatus::BAD_SEQUENCE)?;
        let ind = lst.indications.remove(pos).ok_or(OtStatus::BAD_SEQUENCE)?;

        let expected = Link::Outgoing {
            listener,
            sequence: ind.sequence,
        };
        match state.endpoints.get_mut(&ind.connector) {
            Some(connector) if connector.link == expected => {
                connector.link = Link::Connected { peer: resource };
                connector.connect_result = Some(Ok(local));
                connector.post(TransportEvent::Connect, OtStatus::NO_ERROR);
            }
            _ => return Err(OtStatus::K_ECONNABORTED),
        }

        let res = state.endpoint_mut(resource)?;
        res.local.get_or_insert(local);
        res.link = Link::Connected {
            peer: ind.connector,
        };
        res.post(TransportEvent::PassCon, OtStatus::NO_ERROR);
        debug!("{} accepted {} from {} onto {}", listener, ind.connector, ind.addr, resource);
        Ok(())
    }

    fn connect(&self, ep: EndpointRef, dest: SocketAddrV4) -> OtResult<()> {
        let mut state = self.state.lock();
        let endpoint = state.endpoint(ep)?;
        if endpoint.kind != TransportKind::Tcp {
            return Err(OtStatus::NOT_SUPPORTED);
        }
        match endpoint.link {
            Link::Idle | Link::Reset => {}
            Link::Connected { .. } => return Err(OtStatus::K_EISCONN),
            Link::Outgoing { .. } => return Err(OtStatus::K_EALREADY),
        }
        let from = endpoint.local.ok_or(OtStatus::OUT_STATE)?;
        if !is_local(*dest.ip()) {
            return Err(OtStatus::K_ENETUNREACH);
        }

        let listener = state
            .find_listener(dest, ep)
            .ok_or(OtStatus::K_ECONNREFUSED)?;
        let sequence = state.next_sequence;
        state.next_sequence = state.next_sequence.wrapping_add(1);

        let lst = state.endpoint_mut(listener)?;
        if lst.indications.len() >= lst.qlen as usize {
            return Err(OtStatus::K_ECONNREFUSED);
        }
        lst.indications.push_back(Indication {
            sequence,
            connector: ep,
            addr: from,
            retrieved: false,
        });
        lst.post(TransportEvent::Listen, OtStatus::NO_ERROR);

        let endpoint = state.endpoint_mut(ep)?;
        endpoint.link = Link::Outgoing { listener, sequence };
        endpoint.connect_result = None;
        endpoint.peer_released = false;
        endpoint.released = false;
        debug!("{} connecting from {} to {}", ep, from, dest);
        Ok(())
    }

    fn rcv_connect(&self, ep: EndpointRef) -> OtResult<SocketAddrV4> {
        let mut state = self.state.lock();
        let endpoint = state.endpoint_mut(ep)?;
        match endpoint.connect_result.take() {
            Some(result) => result,
            None if matches!(endpoint.link, Link::Outgoing { .. }) => Err(OtStatus::NO_DATA),
            None => Err(OtStatus::OUT_STATE),
        }
    }

    fn snd(&self, ep: EndpointRef, data: &[u8], expedited: bool) -> OtResult<usize> {
        let mut state = self.state.lock();
        let endpoint = state.endpoint(ep)?;
        if endpoint.kind != TransportKind::Tcp {
            return Err(OtStatus::NOT_SUPPORTED);
        }
        let peer = match endpoint.link {
            Link::Connected { peer } => peer,
            Link::Reset => return Err(OtStatus::K_EPIPE),
            Link::Idle | Link::Outgoing { .. } => return Err(OtStatus::OUT_STATE),
        };
        if endpoint.released {
            return Err(OtStatus::OUT_STATE);
        }
        if data.is_empty() {
            return Ok(0);
        }

        let capacity = self.buffer_bytes;
        let Some(p) = state.endpoints.get_mut(&peer) else {
            state.endpoint_mut(ep)?.link = Link::Reset;
            return Err(OtStatus::K_EPIPE);
        };
        let queue = if expedited {
            &mut p.expedited
        } else {
            &mut p.inbox
        };
        let room = capacity.saturating_sub(queue.len());
        if room == 0 {
            state.endpoint_mut(ep)?.flow_blocked = true;
            return Err(OtStatus::FLOW);
        }
        let n = room.min(data.len());
        queue.extend(&data[..n]);
        let event = if expedited {
            TransportEvent::ExData
        } else {
            TransportEvent::Data
        };
        p.post(event, OtStatus::NO_ERROR);
        Ok(n)
    }

    fn rcv(&self, ep: EndpointRef, buf: &mut [u8], options: RcvOptions) -> OtResult<usize> {
        let mut state = self.state.lock();
        let endpoint = state.endpoint_mut(ep)?;
        if endpoint.kind != TransportKind::Tcp {
            return Err(OtStatus::NOT_SUPPORTED);
        }

        if options.expedited {
            if endpoint.expedited.is_empty() {
                return Err(OtStatus::NO_DATA);
            }
            let link = endpoint.link;
            let n = drain_into(&mut endpoint.expedited, buf, options.peek);
            if let (false, Link::Connected { peer }) = (options.peek, link) {
                state.release_flow(peer);
            }
            return Ok(n);
        }

        if endpoint.inbox.is_empty() {
            if endpoint.peer_released {
                return Ok(0);
            }
            return Err(match endpoint.link {
                Link::Connected { .. } => OtStatus::NO_DATA,
                Link::Reset => OtStatus::K_ECONNRESET,
                Link::Idle | Link::Outgoing { .. } => OtStatus::OUT_STATE,
            });
        }

        let n = drain_into(&mut endpoint.inbox, buf, options.peek);
        let has_room = endpoint.inbox.len() < self.buffer_bytes;
        if let (false, true, Link::Connected { peer }) = (options.peek, has_room, endpoint.link) {
            state.release_flow(peer);
        }
        Ok(n)
    }

    fn snd_udata(&self, ep: EndpointRef, dest: SocketAddrV4, data: &[u8]) -> OtResult<()> {
        let mut state = self.state.lock();
        let endpoint = state.endpoint(ep)?;
        if endpoint.kind != TransportKind::Udp {
            return Err(OtStatus::NOT_SUPPORTED);
        }
        let src = endpoint.local.ok_or(OtStatus::OUT_STATE)?;
        if data.len() > MAX_DATAGRAM {
            return Err(OtStatus::BAD_DATA);
        }
        let broadcast = dest.ip().is_broadcast();
        if !broadcast && !is_local(*dest.ip()) {
            return Err(OtStatus::K_ENETUNREACH);
        }

        for target in state.endpoints.values_mut() {
            let matches = target.kind == TransportKind::Udp
                && target.owns_port
                && target.local.is_some_and(|addr| addr.port() == dest.port());
            if matches {
                target.datagrams.push_back((src, data.to_vec()));
                target.post(TransportEvent::Data, OtStatus::NO_ERROR);
                if !broadcast {
                    break;
                }
            }
        }
        Ok(())
    }

    fn rcv_udata(
        &self,
        ep: EndpointRef,
        buf: &mut [u8],
        peek: bool,
    ) -> OtResult<(usize, SocketAddrV4)> {
        let mut state = self.state.lock();
        let endpoint = state.endpoint_mut(ep)?;
        if endpoint.kind != TransportKind::Udp {
            return Err(OtStatus::NOT_SUPPORTED);
        }
        if endpoint.local.is_none() {
            return Err(OtStatus::OUT_STATE);
        }
        let (src, datagram) = endpoint.datagrams.front().ok_or(OtStatus::NO_DATA)?;
        let src = *src;
        let n = buf.len().min(datagram.len());
        buf[..n].copy_from_slice(&datagram[..n]);
        if !peek {
            endpoint.datagrams.pop_front();
        }
        Ok((n, src))
    }

    fn snd_disconnect(&self, ep: EndpointRef) -> OtResult<()> {
        let mut state = self.state.lock();
        let endpoint = state.endpoint_mut(ep)?;
        let link = endpoint.link;
        endpoint.link = Link::Idle;
        endpoint.connect_result = None;
        match link {
            Link::Outgoing { listener, sequence } => state.drop_indication(listener, sequence),
            Link::Connected { peer } => state.reset_peer(peer, true),
            Link::Reset => {}
            Link::Idle => return Err(OtStatus::NO_DISCONNECT),
        }
        debug!("{} disconnected", ep);
        Ok(())
    }

    fn snd_orderly_disconnect(&self, ep: EndpointRef) -> OtResult<()> {
        let mut state = self.state.lock();
        let endpoint = state.endpoint_mut(ep)?;
        let peer = match endpoint.link {
            Link::Connected { peer } => peer,
            Link::Reset => return Err(OtStatus::NO_RELEASE),
            Link::Idle | Link::Outgoing { .. } => return Err(OtStatus::OUT_STATE),
        };
        if endpoint.released {
            return Err(OtStatus::OUT_STATE);
        }
        endpoint.released = true;
        if let Some(p) = state.endpoints.get_mut(&peer) {
            p.peer_released = true;
            p.post(TransportEvent::OrdRel, OtStatus::NO_ERROR);
        }
        Ok(())
    }

    fn look(&self, ep: EndpointRef) -> OtResult<Option<(TransportEvent, OtStatus)>> {
        let mut state = self.state.lock();
        let endpoint = state.endpoint_mut(ep)?;
        endpoint.flush();
        Ok(endpoint.current_event())
    }

    fn close(&self, ep: EndpointRef) -> OtResult<()> {
        let mut state = self.state.lock();
        let endpoint = state
            .endpoints
            .remove(&ep)
            .ok_or(OtStatus::BAD_REFERENCE)?;
        match endpoint.link {
            Link::Outgoing { listener, sequence } => state.drop_indication(listener, sequence),
            Link::Connected { peer } => state.reset_peer(peer, !endpoint.released),
            Link::Idle | Link::Reset => {}
        }
        state.refuse(endpoint.indications);
        debug!("{} closed", ep);
        Ok(())
    }

    fn string_to_address(&self, name: &str) -> OtResult<Ipv4Addr> {
        let name = name.trim();
        if let Ok(addr) = name.parse::<Ipv4Addr>() {
            return Ok(addr);
        }
        if name.eq_ignore_ascii_case("localhost") || name.eq_ignore_ascii_case(&self.hostname) {
            return Ok(Ipv4Addr::LOCALHOST);
        }
        Err(OtStatus::BAD_NAME)
    }

    fn address_to_name(&self, addr: Ipv4Addr) -> OtResult<String> {
        if addr.is_loopback() {
            Ok("localhost".to_string())
        } else {
            Err(OtStatus::BAD_ADDRESS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::notifier::SocketFlags;

    fn addr(port: u16) -> SocketAddrV4 {
        SocketAddrV4::new(Ipv4Addr::LOCALHOST, port)
    }

    fn tcp(lb: &LoopbackTransport) -> (EndpointRef, Arc<SocketFlags>) {
        let ep = lb.open_endpoint(TransportKind::Tcp).unwrap();
        let flags = SocketFlags::new();
        lb.install_notifier(ep, Notifier::new(flags.clone())).unwrap();
        (ep, flags)
    }

    fn connected_pair(lb: &LoopbackTransport) -> (EndpointRef, EndpointRef) {
        let (listener, _) = tcp(lb);
        lb.bind(listener, Some(addr(7000)), 5).unwrap();
        let (client, _) = tcp(lb);
        lb.bind(client, None, 0).unwrap();
        lb.connect(client, addr(7000)).unwrap();
        let call = lb.listen(listener).unwrap();
        let (server, _) = tcp(lb);
        lb.accept(listener, server, &call).unwrap();
        lb.rcv_connect(client).unwrap();
        (client, server)
    }

    #[test]
    fn test_bind_conflicts() {
        let lb = LoopbackTransport::new("macintosh");
        let (a, _) = tcp(&lb);
        let (b, _) = tcp(&lb);
        assert_eq!(lb.bind(a, Some(addr(80)), 0), Ok(addr(80)));
        assert_eq!(lb.bind(b, Some(addr(80)), 0), Err(OtStatus::ADDRESS_BUSY));
        assert_eq!(lb.bind(a, None, 0), Err(OtStatus::OUT_STATE));

        let remote = SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 1), 80);
        assert_eq!(lb.bind(b, Some(remote), 0), Err(OtStatus::BAD_ADDRESS));
        let wildcard = lb.bind(b, None, 0).unwrap();
        assert_eq!(*wildcard.ip(), Ipv4Addr::LOCALHOST);
        assert!(wildcard.port() >= EPHEMERAL_PORT_START);
    }

    #[test]
    fn test_connect_accept_handshake() {
        let lb = LoopbackTransport::new("macintosh");
        let (listener, lflags) = tcp(&lb);
        lb.bind(listener, Some(addr(7000)), 1).unwrap();
        let (client, cflags) = tcp(&lb);
        let client_addr = lb.bind(client, None, 0).unwrap();

        assert_eq!(lb.listen(listener), Err(OtStatus::NO_DATA));
        lb.connect(client, addr(7000)).unwrap();
        assert!(lflags.readable());
        assert_eq!(lb.rcv_connect(client), Err(OtStatus::NO_DATA));

        let call = lb.listen(listener).unwrap();
        assert_eq!(call.addr, client_addr);
        let (server, sflags) = tcp(&lb);
        lb.accept(listener, server, &call).unwrap();

        assert!(cflags.connected());
        assert!(sflags.connected());
        assert_eq!(lb.rcv_connect(client), Ok(addr(7000)));
    }

    #[test]
    fn test_refused_without_listener() {
        let lb = LoopbackTransport::new("macintosh");
        let (client, _) = tcp(&lb);
        lb.bind(client, None, 0).unwrap();
        assert_eq!(lb.connect(client, addr(9)), Err(OtStatus::K_ECONNREFUSED));
    }

    #[test]
    fn test_flow_control_and_godata() {
        let lb = LoopbackTransport::with_buffer("macintosh", 4);
        let (client, server) = connected_pair(&lb);

        assert_eq!(lb.snd(client, b"abcdef", false), Ok(4));
        assert_eq!(lb.snd(client, b"ef", false), Err(OtStatus::FLOW));

        let mut buf = [0u8; 2];
        assert_eq!(lb.rcv(server, &mut buf, RcvOptions::default()), Ok(2));
        assert_eq!(&buf, b"ab");
        assert_eq!(lb.snd(client, b"ef", false), Ok(2));
    }

    #[test]
    fn test_expedited_data_is_flow_controlled() {
        let lb = LoopbackTransport::with_buffer("macintosh", 4);
        let (client, server) = connected_pair(&lb);

        assert_eq!(lb.snd(client, b"urgent", true), Ok(4));
        assert_eq!(lb.snd(client, b"!", true), Err(OtStatus::FLOW));
        // The normal stream has its own budget
        assert_eq!(lb.snd(client, b"ab", false), Ok(2));

        let mut buf = [0u8; 8];
        let oob = RcvOptions {
            peek: false,
            expedited: true,
        };
        assert_eq!(lb.rcv(server, &mut buf, oob), Ok(4));
        assert_eq!(&buf[..4], b"urge");
        assert_eq!(lb.snd(client, b"!", true), Ok(1));
    }

    #[test]
    fn test_orderly_release_reads_eof() {
        let lb = LoopbackTransport::new("macintosh");
        let (client, server) = connected_pair(&lb);
        lb.snd(client, b"bye", false).unwrap();
        lb.snd_orderly_disconnect(client).unwrap();

        let mut buf = [0u8; 8];
        assert_eq!(lb.rcv(server, &mut buf, RcvOptions::default()), Ok(3));
        assert_eq!(lb.rcv(server, &mut buf, RcvOptions::default()), Ok(0));
        assert_eq!(lb.snd(client, b"x", false), Err(OtStatus::OUT_STATE));
    }

    #[test]
    fn test_abortive_close_resets_peer() {
        let lb = LoopbackTransport::new("macintosh");
        let (client, server) = connected_pair(&lb);
        lb.close(client).unwrap();

        let mut buf = [0u8; 8];
        assert_eq!(
            lb.rcv(server, &mut buf, RcvOptions::default()),
            Err(OtStatus::K_ECONNRESET)
        );
        assert_eq!(lb.snd(server, b"x", false), Err(OtStatus::K_EPIPE));
    }

    #[test]
    fn test_synchronous_events_wait_for_housekeeping() {
        let lb = LoopbackTransport::new("macintosh");
        let (client, server) = connected_pair(&lb);
        let flags = SocketFlags::new();
        lb.install_notifier(server, Notifier::new(flags.clone())).unwrap();
        lb.set_synchronous(server).unwrap();

        lb.snd(client, b"hi", false).unwrap();
        assert!(!flags.readable());
        assert_eq!(lb.queued_events(), 1);
        lb.service();
        assert!(flags.readable());
        assert_eq!(lb.queued_events(), 0);
    }

    #[test]
    fn test_unit_data() {
        let lb = LoopbackTransport::new("macintosh");
        let a = lb.open_endpoint(TransportKind::Udp).unwrap();
        let b = lb.open_endpoint(TransportKind::Udp).unwrap();
        let a_addr = lb.bind(a, None, 0).unwrap();
        lb.bind(b, Some(addr(5353)), 0).unwrap();

        lb.snd_udata(a, addr(5353), b"ping").unwrap();
        let mut buf = [0u8; 2];
        assert_eq!(lb.rcv_udata(b, &mut buf, false), Ok((2, a_addr)));
        assert_eq!(&buf, b"pi");
        assert_eq!(lb.rcv_udata(b, &mut buf, false), Err(OtStatus::NO_DATA));
    }

    #[test]
    fn test_name_resolution() {
        let lb = LoopbackTransport::new("macintosh");
        assert_eq!(lb.string_to_address("MACINTOSH"), Ok(Ipv4Addr::LOCALHOST));
        assert_eq!(
            lb.string_to_address("10.1.2.3"),
            Ok(Ipv4Addr::new(10, 1, 2, 3))
        );
        assert_eq!(lb.string_to_address("nowhere"), Err(OtStatus::BAD_NAME));
        assert_eq!(lb.address_to_name(Ipv4Addr::LOCALHOST).unwrap(), "localhost");
    }
}
