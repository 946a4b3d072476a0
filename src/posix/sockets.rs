/*!
 * Socket Calls
 * `<sys/socket.h>`, `<sys/select.h>` and `<netdb.h>` over raw descriptors
 */

use super::{Descriptor, Posix9};
use crate::net::{FdSet, HostEnt, MsgFlags, SocketError, SocketFd, SocketResult};
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;

impl Posix9 {
    fn socket_fd(&self, fd: i32) -> SocketResult<SocketFd> {
        match Descriptor::from_raw(fd, &self.inner.sockets)? {
            Descriptor::Socket(sock) => Ok(sock),
            Descriptor::File(raw) => Err(SocketError::NotSocket(raw)),
        }
    }

    fn on_socket<T, F>(&self, fd: i32, f: F) -> SocketResult<T>
    where
        F: FnOnce(SocketFd) -> SocketResult<T>,
    {
        self.track(self.socket_fd(fd).and_then(f))
    }

    pub fn socket(&self, domain: i32, socket_type: i32, protocol: i32) -> SocketResult<i32> {
        self.track(
            self.inner
                .sockets
                .socket(domain, socket_type, protocol)
                .map(|fd| fd.raw()),
        )
    }

    pub fn bind(&self, fd: i32, addr: SocketAddrV4) -> SocketResult<()> {
        self.on_socket(fd, |sock| self.inner.sockets.bind(sock, addr))
    }

    pub fn listen(&self, fd: i32, backlog: i32) -> SocketResult<()> {
        self.on_socket(fd, |sock| self.inner.sockets.listen(sock, backlog))
    }

    pub fn accept(&self, fd: i32) -> SocketResult<(i32, SocketAddrV4)> {
        self.blocking("accept", || {
            let sock = self.socket_fd(fd)?;
            let (new_fd, peer) = self.inner.sockets.accept(sock)?;
            Ok((new_fd.raw(), peer))
        })
    }

    pub fn connect(&self, fd: i32, addr: SocketAddrV4) -> SocketResult<()> {
        self.blocking("connect", || {
            let sock = self.socket_fd(fd)?;
            self.inner.sockets.connect(sock, addr)
        })
    }

    pub fn send(&self, fd: i32, data: &[u8], flags: MsgFlags) -> SocketResult<usize> {
        self.blocking("send", || {
            let sock = self.socket_fd(fd)?;
            self.inner.sockets.send(sock, data, flags)
        })
    }

    pub fn recv(&self, fd: i32, buf: &mut [u8], flags: MsgFlags) -> SocketResult<usize> {
        self.on_socket(fd, |sock| self.inner.sockets.recv(sock, buf, flags))
    }

    pub fn sendto(
        &self,
        fd: i32,
        data: &[u8],
        flags: MsgFlags,
        dest: Option<SocketAddrV4>,
    ) -> SocketResult<usize> {
        self.blocking("sendto", || {
            let sock = self.socket_fd(fd)?;
            self.inner.sockets.sendto(sock, data, flags, dest)
        })
    }

    pub fn recvfrom(
        &self,
        fd: i32,
        buf: &mut [u8],
        flags: MsgFlags,
    ) -> SocketResult<(usize, Option<SocketAddrV4>)> {
        self.on_socket(fd, |sock| self.inner.sockets.recvfrom(sock, buf, flags))
    }

    pub fn shutdown(&self, fd: i32, how: i32) -> SocketResult<()> {
        self.on_socket(fd, |sock| self.inner.sockets.shutdown(sock, how))
    }

    pub fn getsockname(&self, fd: i32) -> SocketResult<SocketAddrV4> {
        self.on_socket(fd, |sock| self.inner.sockets.getsockname(sock))
    }

    pub fn getpeername(&self, fd: i32) -> SocketResult<SocketAddrV4> {
        self.on_socket(fd, |sock| self.inner.sockets.getpeername(sock))
    }

    pub fn getsockopt(&self, fd: i32, level: i32, name: i32) -> SocketResult<i32> {
        self.on_socket(fd, |sock| self.inner.sockets.getsockopt(sock, level, name))
    }

    pub fn setsockopt(&self, fd: i32, level: i32, name: i32, value: i32) -> SocketResult<()> {
        self.on_socket(fd, |sock| {
            self.inner.sockets.setsockopt(sock, level, name, value)
        })
    }

    /// `fcntl(fd, F_SETFL, O_NONBLOCK)`
    pub fn set_nonblocking(&self, fd: i32, nonblocking: bool) -> SocketResult<()> {
        self.on_socket(fd, |sock| {
            self.inner.sockets.set_nonblocking(sock, nonblocking)
        })
    }

    pub fn select(
        &self,
        nfds: i32,
        readfds: Option<&mut FdSet>,
        writefds: Option<&mut FdSet>,
        exceptfds: Option<&mut FdSet>,
        timeout: Option<Duration>,
    ) -> SocketResult<usize> {
        self.blocking("select", || {
            self.inner
                .sockets
                .select(nfds, readfds, writefds, exceptfds, timeout)
        })
    }

    pub fn gethostbyname(&self, name: &str) -> SocketResult<HostEnt> {
        self.track(self.inner.sockets.gethostbyname(name))
    }

    pub fn gethostbyaddr(&self, addr: Ipv4Addr) -> SocketResult<HostEnt> {
        self.track(self.inner.sockets.gethostbyaddr(addr))
    }

    pub fn gethostname(&self) -> String {
        self.inner.sockets.gethostname()
    }

    pub fn sethostname(&self, name: &str) -> SocketResult<()> {
        self.track(self.inner.sockets.sethostname(name))
    }
}
