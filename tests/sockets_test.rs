/*!
 * Socket Tests
 * Stream and datagram sockets over the loopback transport
 */

use parking_lot::Mutex;
use posix9::core::{Errno, ListenUnbound, Posix9Config};
use posix9::net::*;
use posix9::signals::Signal;
use posix9::threads::ThreadAttr;
use posix9::Posix9;
use pretty_assertions::assert_eq;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::Arc;
use std::time::Duration;

fn local(port: u16) -> SocketAddrV4 {
    SocketAddrV4::new(Ipv4Addr::LOCALHOST, port)
}

fn stream(posix: &Posix9) -> i32 {
    posix.socket(AF_INET, SOCK_STREAM, 0).unwrap()
}

fn wait_readable(posix: &Posix9, fd: i32) {
    let mut readable: FdSet = [fd].into_iter().collect();
    let n = posix
        .select(fd + 1, Some(&mut readable), None, None, Some(Duration::from_secs(5)))
        .unwrap();
    assert_eq!(n, 1, "socket {} never became readable", fd);
}

/// Listener, client and accepted server socket, connected without yielding
fn connected_pair(posix: &Posix9, port: u16) -> (i32, i32, i32) {
    let listener = stream(posix);
    posix.bind(listener, local(port)).unwrap();
    posix.listen(listener, 4).unwrap();

    let client = stream(posix);
    posix.set_nonblocking(client, true).unwrap();
    assert_eq!(posix.connect(client, local(port)), Err(SocketError::InProgress));
    let (server, _) = posix.accept(listener).unwrap();
    posix.set_nonblocking(client, false).unwrap();
    assert_eq!(posix.getpeername(client).unwrap(), local(port));
    (listener, client, server)
}

#[test]
fn test_stream_echo_between_threads() {
    let posix = Posix9::simulated();
    let listener = stream(&posix);
    posix.bind(listener, local(7000)).unwrap();
    posix.listen(listener, 1).unwrap();

    let p = posix.clone();
    let server = posix
        .pthread_create(&ThreadAttr::default().with_name("echo"), move || {
            let (conn, _) = p.accept(listener).unwrap();
            let mut buf = [0u8; 64];
            let mut total = 0;
            loop {
                wait_readable(&p, conn);
                let n = p.recv(conn, &mut buf, MsgFlags::NONE).unwrap();
                if n == 0 {
                    break;
                }
                total += p.send(conn, &buf[..n], MsgFlags::NONE).unwrap();
            }
            p.close(conn).unwrap();
            total
        })
        .unwrap();

    let client = stream(&posix);
    posix.connect(client, local(7000)).unwrap();
    assert_eq!(posix.send(client, b"hello", MsgFlags::NONE), Ok(5));

    wait_readable(&posix, client);
    let mut buf = [0u8; 64];
    assert_eq!(posix.recv(client, &mut buf, MsgFlags::NONE), Ok(5));
    assert_eq!(&buf[..5], b"hello");

    posix.close(client).unwrap();
    assert_eq!(posix.pthread_join(server), Ok(5));
    posix.close(listener).unwrap();
    assert_eq!(posix.socket_manager().socket_count(), 0);
    assert_eq!(posix.loopback().endpoint_count(), 0);
}

#[test]
fn test_addresses_of_a_connection() {
    let posix = Posix9::simulated();
    let (listener, client, server) = connected_pair(&posix, 7001);

    let client_addr = posix.getsockname(client).unwrap();
    assert_eq!(*client_addr.ip(), Ipv4Addr::LOCALHOST);
    assert_ne!(client_addr.port(), 0);

    assert_eq!(posix.getsockname(server).unwrap(), local(7001));
    assert_eq!(posix.getpeername(server).unwrap(), client_addr);
    assert_eq!(posix.getsockname(listener).unwrap(), local(7001));
    assert_eq!(posix.getpeername(listener), Err(SocketError::NotConnected));
    assert_eq!(posix.errno(), Some(Errno::ENOTCONN));
}

#[test]
fn test_unbound_socket_name_is_wildcard() {
    let posix = Posix9::simulated();
    let sock = stream(&posix);
    assert_eq!(
        posix.getsockname(sock).unwrap(),
        SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0)
    );
}

#[test]
fn test_connect_refused_without_listener() {
    let posix = Posix9::simulated();
    let sock = stream(&posix);
    let err = posix.connect(sock, local(9)).unwrap_err();
    assert_eq!(err.errno(), Errno::ECONNREFUSED);
    assert_eq!(posix.errno(), Some(Errno::ECONNREFUSED));
}

#[test]
fn test_full_backlog_refuses() {
    let posix = Posix9::simulated();
    let listener = stream(&posix);
    posix.bind(listener, local(7002)).unwrap();
    posix.listen(listener, 1).unwrap();

    let first = stream(&posix);
    let second = stream(&posix);
    posix.set_nonblocking(first, true).unwrap();
    posix.set_nonblocking(second, true).unwrap();
    assert_eq!(posix.connect(first, local(7002)), Err(SocketError::InProgress));
    let err = posix.connect(second, local(7002)).unwrap_err();
    assert_eq!(err.errno(), Errno::ECONNREFUSED);
}

#[test]
fn test_blocking_connect_refused_when_listener_closes() {
    let posix = Posix9::simulated();
    let listener = stream(&posix);
    posix.bind(listener, local(7003)).unwrap();
    posix.listen(listener, 1).unwrap();

    let p = posix.clone();
    let closer = posix
        .pthread_create(&ThreadAttr::default(), move || {
            p.close(listener).unwrap();
            0
        })
        .unwrap();

    let sock = stream(&posix);
    let err = posix.connect(sock, local(7003)).unwrap_err();
    assert_eq!(err.errno(), Errno::ECONNREFUSED);
    posix.pthread_join(closer).unwrap();
}

#[test]
fn test_bind_conflicts() {
    let posix = Posix9::simulated();
    let a = stream(&posix);
    let b = stream(&posix);
    posix.bind(a, local(8080)).unwrap();

    let err = posix.bind(b, local(8080)).unwrap_err();
    assert_eq!(err.errno(), Errno::EADDRINUSE);

    let err = posix.bind(a, local(8081)).unwrap_err();
    assert_eq!(err.errno(), Errno::EINVAL);

    let remote = SocketAddrV4::new(Ipv4Addr::new(192, 168, 1, 10), 80);
    let err = posix.bind(b, remote).unwrap_err();
    assert_eq!(err.errno(), Errno::EADDRNOTAVAIL);

    // Ports are per protocol
    let udp = posix.socket(AF_INET, SOCK_DGRAM, 0).unwrap();
    assert_eq!(posix.bind(udp, local(8080)), Ok(()));
}

#[test]
fn test_nonblocking_connect_completes_through_select() {
    let posix = Posix9::simulated();
    let listener = stream(&posix);
    posix.bind(listener, local(7004)).unwrap();
    posix.listen(listener, 2).unwrap();

    let client = stream(&posix);
    posix.set_nonblocking(client, true).unwrap();
    assert_eq!(posix.connect(client, local(7004)), Err(SocketError::InProgress));
    assert_eq!(posix.errno(), Some(Errno::EINPROGRESS));
    assert_eq!(
        posix.connect(client, local(7004)),
        Err(SocketError::AlreadyInProgress)
    );

    // Not writable until the handshake finishes
    let mut writable: FdSet = [client].into_iter().collect();
    let n = posix
        .select(client + 1, None, Some(&mut writable), None, Some(Duration::ZERO))
        .unwrap();
    assert_eq!(n, 0);
    assert!(writable.is_empty());

    let (server, peer) = posix.accept(listener).unwrap();
    assert_eq!(peer, posix.getsockname(client).unwrap());

    let mut writable: FdSet = [client].into_iter().collect();
    let n = posix
        .select(client + 1, None, Some(&mut writable), None, Some(Duration::from_secs(1)))
        .unwrap();
    assert_eq!(n, 1);
    assert!(writable.is_set(client));

    assert_eq!(posix.getsockopt(client, SOL_SOCKET, SO_ERROR), Ok(0));
    assert_eq!(posix.getpeername(client).unwrap(), local(7004));
    assert_eq!(
        posix.connect(client, local(7004)),
        Err(SocketError::AlreadyConnected)
    );
    assert!(posix
        .socket_manager()
        .info(posix.socket_manager().resolve(server).unwrap())
        .unwrap()
        .connected);
}

#[test]
fn test_pending_connect_refused_reports_so_error() {
    let posix = Posix9::simulated();
    let listener = stream(&posix);
    posix.bind(listener, local(7005)).unwrap();
    posix.listen(listener, 2).unwrap();

    let client = stream(&posix);
    posix.set_nonblocking(client, true).unwrap();
    assert_eq!(posix.connect(client, local(7005)), Err(SocketError::InProgress));
    posix.close(listener).unwrap();

    // A failed connect is reported as writable with the error pending
    let mut writable: FdSet = [client].into_iter().collect();
    let n = posix
        .select(client + 1, None, Some(&mut writable), None, Some(Duration::from_secs(1)))
        .unwrap();
    assert_eq!(n, 1);
    assert_eq!(
        posix.getsockopt(client, SOL_SOCKET, SO_ERROR),
        Ok(Errno::ECONNREFUSED.code())
    );
    assert_eq!(posix.getsockopt(client, SOL_SOCKET, SO_ERROR), Ok(0));
    assert_eq!(posix.getpeername(client), Err(SocketError::NotConnected));
}

#[test]
fn test_blocking_send_waits_for_flow_control() {
    let posix = Posix9::simulated();
    let listener = stream(&posix);
    posix.bind(listener, local(7006)).unwrap();
    posix.listen(listener, 1).unwrap();

    let received = Arc::new(Mutex::new(Vec::new()));
    let (p, r) = (posix.clone(), received.clone());
    let reader = posix
        .pthread_create(&ThreadAttr::default(), move || {
            let (conn, _) = p.accept(listener).unwrap();
            let mut buf = [0u8; 4096];
            loop {
                wait_readable(&p, conn);
                let n = p.recv(conn, &mut buf, MsgFlags::NONE).unwrap();
                if n == 0 {
                    break;
                }
                r.lock().extend_from_slice(&buf[..n]);
            }
            p.close(conn).unwrap();
            0
        })
        .unwrap();

    // Three times the loopback buffer
    let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
    let client = stream(&posix);
    posix.connect(client, local(7006)).unwrap();
    assert_eq!(posix.send(client, &data, MsgFlags::NONE), Ok(data.len()));
    posix.close(client).unwrap();

    posix.pthread_join(reader).unwrap();
    assert_eq!(received.lock().len(), data.len());
    assert!(*received.lock() == data);
}

#[test]
fn test_nonblocking_send_partial_then_would_block() {
    let posix = Posix9::simulated();
    let (_listener, client, server) = connected_pair(&posix, 7007);
    posix.set_nonblocking(client, true).unwrap();

    let data = vec![7u8; 100_000];
    let sent = posix.send(client, &data, MsgFlags::NONE).unwrap();
    assert!(sent > 0 && sent < data.len());
    assert_eq!(posix.send(client, &data, MsgFlags::NONE), Err(SocketError::WouldBlock));
    assert_eq!(posix.errno(), Some(Errno::EWOULDBLOCK));

    let mut writable: FdSet = [client].into_iter().collect();
    let n = posix
        .select(client + 1, None, Some(&mut writable), None, Some(Duration::ZERO))
        .unwrap();
    assert_eq!(n, 0);

    // Draining the peer reopens the window
    let mut buf = [0u8; 1000];
    assert_eq!(posix.recv(server, &mut buf, MsgFlags::NONE), Ok(1000));
    let n = posix
        .select(client + 1, None, Some(&mut writable), None, Some(Duration::ZERO))
        .unwrap();
    assert_eq!(n, 1);
    assert_eq!(posix.send(client, &data, MsgFlags::NONE), Ok(1000));
}

#[test]
fn test_orderly_close_reads_eof_then_broken_pipe() {
    let posix = Posix9::simulated();
    let (_listener, client, server) = connected_pair(&posix, 7008);

    posix.send(server, b"last words", MsgFlags::NONE).unwrap();
    posix.close(server).unwrap();

    let mut buf = [0u8; 32];
    assert_eq!(posix.recv(client, &mut buf, MsgFlags::NONE), Ok(10));
    assert_eq!(&buf[..10], b"last words");
    assert_eq!(posix.recv(client, &mut buf, MsgFlags::NONE), Ok(0));

    assert_eq!(
        posix.send(client, b"anyone?", MsgFlags::NOSIGNAL),
        Err(SocketError::BrokenPipe)
    );
    assert!(!posix.signal_manager().pending().contains(Signal::SIGPIPE));

    assert_eq!(
        posix.send(client, b"anyone?", MsgFlags::NONE),
        Err(SocketError::BrokenPipe)
    );
    assert_eq!(posix.errno(), Some(Errno::EPIPE));
    assert!(posix.signal_manager().pending().contains(Signal::SIGPIPE));
}

#[test]
fn test_shutdown_write_side() {
    let posix = Posix9::simulated();
    let (_listener, client, server) = connected_pair(&posix, 7009);

    posix.send(client, b"req", MsgFlags::NONE).unwrap();
    posix.shutdown(client, SHUT_WR).unwrap();

    let mut buf = [0u8; 8];
    assert_eq!(posix.recv(server, &mut buf, MsgFlags::NONE), Ok(3));
    assert_eq!(posix.recv(server, &mut buf, MsgFlags::NONE), Ok(0));

    // The other direction still flows
    posix.send(server, b"resp", MsgFlags::NONE).unwrap();
    assert_eq!(posix.recv(client, &mut buf, MsgFlags::NONE), Ok(4));

    assert_eq!(
        posix.send(client, b"more", MsgFlags::NOSIGNAL),
        Err(SocketError::BrokenPipe)
    );
}

#[test]
fn test_shutdown_read_side_and_bad_arguments() {
    let posix = Posix9::simulated();
    let (listener, client, server) = connected_pair(&posix, 7010);

    posix.send(client, b"ignored", MsgFlags::NONE).unwrap();
    posix.shutdown(server, SHUT_RD).unwrap();
    let mut buf = [0u8; 8];
    assert_eq!(posix.recv(server, &mut buf, MsgFlags::NONE), Ok(0));

    let err = posix.shutdown(server, 7).unwrap_err();
    assert_eq!(err.errno(), Errno::EINVAL);
    assert_eq!(posix.shutdown(listener, SHUT_RDWR), Err(SocketError::NotConnected));
}

#[test]
fn test_peek_leaves_data_queued() {
    let posix = Posix9::simulated();
    let (_listener, client, server) = connected_pair(&posix, 7011);
    posix.send(client, b"abcdef", MsgFlags::NONE).unwrap();

    let mut buf = [0u8; 3];
    assert_eq!(posix.recv(server, &mut buf, MsgFlags::PEEK), Ok(3));
    assert_eq!(&buf, b"abc");
    assert_eq!(posix.recv(server, &mut buf, MsgFlags::NONE), Ok(3));
    assert_eq!(&buf, b"abc");
    assert_eq!(posix.recv(server, &mut buf, MsgFlags::NONE), Ok(3));
    assert_eq!(&buf, b"def");
}

#[test]
fn test_out_of_band_data() {
    let posix = Posix9::simulated();
    let (_listener, client, server) = connected_pair(&posix, 7012);

    posix.send(client, b"!", MsgFlags::OOB).unwrap();
    posix.send(client, b"normal", MsgFlags::NONE).unwrap();

    let mut except: FdSet = [server].into_iter().collect();
    let n = posix
        .select(server + 1, None, None, Some(&mut except), Some(Duration::ZERO))
        .unwrap();
    assert_eq!(n, 1);

    let mut buf = [0u8; 8];
    assert_eq!(posix.recv(server, &mut buf, MsgFlags::OOB), Ok(1));
    assert_eq!(buf[0], b'!');
    assert_eq!(posix.recv(server, &mut buf, MsgFlags::NONE), Ok(6));
    assert_eq!(&buf[..6], b"normal");

    let mut except: FdSet = [server].into_iter().collect();
    let n = posix
        .select(server + 1, None, None, Some(&mut except), Some(Duration::ZERO))
        .unwrap();
    assert_eq!(n, 0);
}

#[test]
fn test_recv_without_data() {
    let posix = Posix9::simulated();
    let (_listener, client, _server) = connected_pair(&posix, 7013);
    let mut buf = [0u8; 8];

    // Blocking sockets report an empty read
    assert_eq!(posix.recv(client, &mut buf, MsgFlags::NONE), Ok(0));
    assert_eq!(
        posix.recv(client, &mut buf, MsgFlags::DONTWAIT),
        Err(SocketError::WouldBlock)
    );
    posix.set_nonblocking(client, true).unwrap();
    assert_eq!(
        posix.recv(client, &mut buf, MsgFlags::NONE),
        Err(SocketError::WouldBlock)
    );
}

#[test]
fn test_datagram_exchange() {
    let posix = Posix9::simulated();
    let server = posix.socket(AF_INET, SOCK_DGRAM, 0).unwrap();
    posix.bind(server, local(5353)).unwrap();
    let client = posix.socket(AF_INET, SOCK_DGRAM, IPPROTO_UDP).unwrap();

    assert_eq!(
        posix.send(client, b"x", MsgFlags::NONE),
        Err(SocketError::DestinationRequired)
    );
    assert_eq!(posix.errno(), Some(Errno::EDESTADDRREQ));

    assert_eq!(
        posix.sendto(client, b"query", MsgFlags::NONE, Some(local(5353))),
        Ok(5)
    );
    let client_addr = posix.getsockname(client).unwrap();
    assert_ne!(client_addr.port(), 0);

    let mut buf = [0u8; 16];
    let (n, from) = posix.recvfrom(server, &mut buf, MsgFlags::NONE).unwrap();
    assert_eq!(&buf[..n], b"query");
    assert_eq!(from, Some(client_addr));

    posix
        .sendto(server, b"answer", MsgFlags::NONE, from)
        .unwrap();
    let (n, from) = posix.recvfrom(client, &mut buf, MsgFlags::NONE).unwrap();
    assert_eq!(&buf[..n], b"answer");
    assert_eq!(from, Some(local(5353)));

    assert_eq!(
        posix.recvfrom(client, &mut buf, MsgFlags::DONTWAIT),
        Err(SocketError::WouldBlock)
    );
}

#[test]
fn test_datagram_default_peer() {
    let posix = Posix9::simulated();
    let server = posix.socket(AF_INET, SOCK_DGRAM, 0).unwrap();
    posix.bind(server, local(5354)).unwrap();
    let client = posix.socket(AF_INET, SOCK_DGRAM, 0).unwrap();

    posix.connect(client, local(5354)).unwrap();
    assert_eq!(posix.getpeername(client).unwrap(), local(5354));
    assert_eq!(posix.send(client, b"hi", MsgFlags::NONE), Ok(2));

    let mut buf = [0u8; 1];
    let (n, _) = posix.recvfrom(server, &mut buf, MsgFlags::PEEK).unwrap();
    assert_eq!(n, 1);
    let mut buf = [0u8; 4];
    let (n, _) = posix.recvfrom(server, &mut buf, MsgFlags::NONE).unwrap();
    assert_eq!(&buf[..n], b"hi");

    let err = posix.listen(client, 1).unwrap_err();
    assert_eq!(err.errno(), Errno::EOPNOTSUPP);
}

#[test]
fn test_socket_argument_validation() {
    let posix = Posix9::simulated();
    assert_eq!(
        posix.socket(AF_INET6, SOCK_STREAM, 0),
        Err(SocketError::AddressFamily(AF_INET6))
    );
    assert_eq!(posix.errno(), Some(Errno::EAFNOSUPPORT));
    assert_eq!(
        posix.socket(AF_INET, SOCK_RAW, 0).unwrap_err().errno(),
        Errno::EPROTONOSUPPORT
    );
    assert_eq!(
        posix.socket(AF_INET, SOCK_STREAM, IPPROTO_UDP).unwrap_err().errno(),
        Errno::EPROTONOSUPPORT
    );

    let mut buf = [0u8; 4];
    assert_eq!(
        posix.recv(1, &mut buf, MsgFlags::NONE),
        Err(SocketError::NotSocket(1))
    );
    assert_eq!(posix.errno(), Some(Errno::ENOTSOCK));
}

#[test]
fn test_closed_descriptor_is_bad() {
    let posix = Posix9::simulated();
    let sock = stream(&posix);
    posix.close(sock).unwrap();
    let err = posix.send(sock, b"x", MsgFlags::NONE).unwrap_err();
    assert_eq!(err, SocketError::BadDescriptor(sock));
    assert_eq!(posix.errno(), Some(Errno::EBADF));
}

#[test]
fn test_socket_table_full() {
    let config = Posix9Config {
        max_sockets: 2,
        ..Posix9Config::default()
    };
    let posix = Posix9::simulated_with(config).unwrap();
    let a = stream(&posix);
    let _b = stream(&posix);
    assert_eq!(
        posix.socket(AF_INET, SOCK_STREAM, 0),
        Err(SocketError::TableFull)
    );
    assert_eq!(posix.errno(), Some(Errno::EMFILE));

    posix.close(a).unwrap();
    assert!(posix.socket(AF_INET, SOCK_DGRAM, 0).is_ok());
}

#[test]
fn test_listen_unbound_auto_binds_when_configured() {
    let config = Posix9Config {
        listen_unbound: ListenUnbound::AutoBind,
        ..Posix9Config::default()
    };
    let posix = Posix9::simulated_with(config).unwrap();
    let listener = stream(&posix);
    posix.listen(listener, 0).unwrap();

    let addr = posix.getsockname(listener).unwrap();
    assert!(addr.port() >= 49152);
    assert_eq!(posix.getsockopt(listener, SOL_SOCKET, SO_ACCEPTCONN), Ok(1));
}

#[test]
fn test_accepted_socket_inherits_options() {
    let posix = Posix9::simulated();
    let listener = stream(&posix);
    posix.setsockopt(listener, SOL_SOCKET, SO_KEEPALIVE, 1).unwrap();
    posix.setsockopt(listener, IPPROTO_TCP, TCP_NODELAY, 1).unwrap();
    posix.bind(listener, local(7014)).unwrap();
    posix.listen(listener, 1).unwrap();

    let client = stream(&posix);
    posix.set_nonblocking(client, true).unwrap();
    let _ = posix.connect(client, local(7014));
    let (server, _) = posix.accept(listener).unwrap();

    assert_eq!(posix.getsockopt(server, SOL_SOCKET, SO_KEEPALIVE), Ok(1));
    assert_eq!(posix.getsockopt(server, IPPROTO_TCP, TCP_NODELAY), Ok(1));
    assert_eq!(posix.getsockopt(server, SOL_SOCKET, SO_TYPE), Ok(SOCK_STREAM));
    assert_eq!(posix.getsockopt(client, SOL_SOCKET, SO_KEEPALIVE), Ok(0));
}

#[test]
fn test_unsupported_options() {
    let posix = Posix9::simulated();
    let udp = posix.socket(AF_INET, SOCK_DGRAM, 0).unwrap();
    assert_eq!(
        posix.setsockopt(udp, IPPROTO_TCP, TCP_NODELAY, 1),
        Err(SocketError::NoProtocolOption {
            level: IPPROTO_TCP,
            name: TCP_NODELAY
        })
    );
    assert_eq!(posix.errno(), Some(Errno::ENOPROTOOPT));
    assert!(posix.getsockopt(udp, SOL_SOCKET, SO_LINGER).is_err());
    assert_eq!(posix.getsockopt(udp, SOL_SOCKET, SO_TYPE), Ok(SOCK_DGRAM));
}

#[test]
fn test_listen_again_keeps_pending_connections() {
    let posix = Posix9::simulated();
    let listener = stream(&posix);
    posix.bind(listener, local(7030)).unwrap();
    posix.listen(listener, 4).unwrap();

    let client = stream(&posix);
    posix.set_nonblocking(client, true).unwrap();
    assert_eq!(posix.connect(client, local(7030)), Err(SocketError::InProgress));

    // A second listen only changes the backlog
    posix.listen(listener, 8).unwrap();
    assert_eq!(posix.getsockname(listener).unwrap(), local(7030));

    posix.set_nonblocking(listener, true).unwrap();
    let (server, peer) = posix.accept(listener).unwrap();
    assert_eq!(peer, posix.getsockname(client).unwrap());
    assert_eq!(posix.getpeername(client).unwrap(), local(7030));
    posix.close(server).unwrap();
}

#[test]
fn test_rejected_connect_leaves_socket_unbound() {
    let posix = Posix9::simulated();
    let passive = stream(&posix);
    posix.listen(passive, 1).unwrap();

    let err = posix.connect(passive, local(7031)).unwrap_err();
    assert_eq!(err.errno(), Errno::EINVAL);
    assert_eq!(
        posix.getsockname(passive).unwrap(),
        SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0)
    );
}

#[test]
fn test_datagram_send_after_shutdown_raises_sigpipe() {
    let posix = Posix9::simulated();
    let client = posix.socket(AF_INET, SOCK_DGRAM, 0).unwrap();
    posix.connect(client, local(5360)).unwrap();
    posix.shutdown(client, SHUT_WR).unwrap();

    assert_eq!(
        posix.send(client, b"x", MsgFlags::NOSIGNAL),
        Err(SocketError::BrokenPipe)
    );
    assert!(!posix.signal_manager().pending().contains(Signal::SIGPIPE));

    assert_eq!(
        posix.sendto(client, b"x", MsgFlags::NONE, Some(local(5361))),
        Err(SocketError::BrokenPipe)
    );
    assert_eq!(posix.errno(), Some(Errno::EPIPE));
    assert!(posix.signal_manager().pending().contains(Signal::SIGPIPE));
}
