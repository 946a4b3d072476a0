/*!
 * posix9 - Demo Entry Point
 *
 * Runs a loopback echo session between two cooperative threads while an
 * alarm and an interrupt-key handler fire, then prints signal statistics.
 */

use miette::IntoDiagnostic;
use posix9::net::{FdSet, MsgFlags, AF_INET, SHUT_WR, SOCK_STREAM};
use posix9::{
    init_tracing, Posix9, Posix9Config, Posix9Error, SigHandler, Signal, SocketError, ThreadAttr,
};
use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

const ECHO_PORT: u16 = 7070;
const IO_TIMEOUT: Duration = Duration::from_secs(5);

fn main() -> miette::Result<()> {
    init_tracing();

    let config = Posix9Config::from_env()?;
    info!("posix9 demo starting (hostname {})", config.hostname.as_str());
    let posix = Posix9::new(config)?;

    let alarms = Arc::new(AtomicUsize::new(0));
    let interrupts = Arc::new(AtomicUsize::new(0));
    {
        let alarms = alarms.clone();
        posix.signal(
            Signal::SIGALRM.number(),
            SigHandler::handler(move |sig| {
                alarms.fetch_add(1, Ordering::Relaxed);
                info!("{} handled", sig);
            }),
        )?;
        let interrupts = interrupts.clone();
        posix.signal(
            Signal::SIGINT.number(),
            SigHandler::handler(move |sig| {
                interrupts.fetch_add(1, Ordering::Relaxed);
                info!("{} handled", sig);
            }),
        )?;
    }
    posix.alarm(1)?;

    let listener = posix.socket(AF_INET, SOCK_STREAM, 0)?;
    posix.bind(listener, SocketAddrV4::new(Ipv4Addr::LOCALHOST, ECHO_PORT))?;
    posix.listen(listener, 0)?;

    let server_side = posix.clone();
    let server = posix.pthread_create(&ThreadAttr::default().with_name("echo-server"), move || {
        serve(&server_side, listener).unwrap_or_else(|e| {
            error!("Echo server failed: {}", e);
            0
        })
    })?;
    let client_side = posix.clone();
    let client = posix.pthread_create(&ThreadAttr::default().with_name("echo-client"), move || {
        exchange(&client_side, b"hello from posix9").unwrap_or_else(|e| {
            error!("Echo client failed: {}", e);
            0
        })
    })?;

    let echoed = posix.pthread_join(server)?;
    let received = posix.pthread_join(client)?;
    posix.close(listener).map_err(Posix9Error::from)?;
    info!("Server echoed {} bytes, client received {}", echoed, received);

    if alarms.load(Ordering::Relaxed) == 0 {
        // Ends with EINTR once SIGALRM is delivered
        let _ = posix.pause();
    }
    posix.host().press_interrupt_key();
    posix.signal_process();

    let stats = serde_json::to_string_pretty(&posix.signal_stats()).into_diagnostic()?;
    println!("{}", stats);
    info!(
        "Done: {} alarm(s), {} interrupt(s)",
        alarms.load(Ordering::Relaxed),
        interrupts.load(Ordering::Relaxed)
    );
    Ok(())
}

/// Wait until `fd` is readable
fn wait_readable(posix: &Posix9, fd: i32) -> Result<(), SocketError> {
    let mut readable: FdSet = [fd].into_iter().collect();
    match posix.select(fd + 1, Some(&mut readable), None, None, Some(IO_TIMEOUT))? {
        0 => Err(SocketError::WouldBlock),
        _ => Ok(()),
    }
}

/// Accept one connection and echo it until the peer releases
fn serve(posix: &Posix9, listener: i32) -> Result<usize, SocketError> {
    let (conn, peer) = posix.accept(listener)?;
    info!("Echo server accepted {}", peer);

    let mut buf = [0u8; 512];
    let mut total = 0;
    loop {
        wait_readable(posix, conn)?;
        let n = posix.recv(conn, &mut buf, MsgFlags::NONE)?;
        if n == 0 {
            break;
        }
        total += posix.send(conn, &buf[..n], MsgFlags::NONE)?;
    }
    posix.close(conn).map_err(|_| SocketError::BadDescriptor(conn))?;
    Ok(total)
}

/// Send `message`, half-close, read the echo back
fn exchange(posix: &Posix9, message: &[u8]) -> Result<usize, SocketError> {
    let sock = posix.socket(AF_INET, SOCK_STREAM, 0)?;
    posix.connect(sock, SocketAddrV4::new(Ipv4Addr::LOCALHOST, ECHO_PORT))?;
    posix.send(sock, message, MsgFlags::NONE)?;
    posix.shutdown(sock, SHUT_WR)?;

    let mut echo = Vec::new();
    let mut buf = [0u8; 512];
    loop {
        wait_readable(posix, sock)?;
        let n = posix.recv(sock, &mut buf, MsgFlags::NONE)?;
        if n == 0 {
            break;
        }
        echo.extend_from_slice(&buf[..n]);
    }
    info!("Echo client got {:?}", String::from_utf8_lossy(&echo));
    posix.close(sock).map_err(|_| SocketError::BadDescriptor(sock))?;
    Ok(echo.len())
}
