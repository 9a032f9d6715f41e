//! Test utilities for exercising DCCP sockets.
//!
//! DCCP left mainline Linux in 6.16 and was a config option long before
//! that, so live-socket tests cannot assume the protocol exists. Suites
//! call [`dccp_supported`] first and skip with a note when it fails;
//! [`EchoListener`] gives them a real in-kernel peer to talk to when it
//! succeeds.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use dccp_sock::{Ccid, DccpError, DccpListener, DccpSocket, Result};

/// Poll interval for the accept and recv loops.
const POLL_SLEEP: Duration = Duration::from_millis(1);

/// Per-call read timeout on accepted connections.
const READ_TIMEOUT: Duration = Duration::from_millis(20);

/// True when the running kernel can create DCCP sockets.
pub fn dccp_supported() -> bool {
    DccpSocket::v4().is_ok()
}

/// True when DCCP sockets exist and CCID 3 (TFRC) can be requested.
pub fn ccid3_supported() -> bool {
    match DccpSocket::v4() {
        Ok(sock) => sock.set_ccid(Ccid::Ccid3).is_ok(),
        Err(_) => false,
    }
}

/// Background DCCP peer on loopback that records every datagram it
/// receives and echoes it back.
///
/// One connection is served at a time, which is all the round-trip tests
/// need. The listener pins CCID 3 when the kernel has it so that clients
/// which insist on TFRC can complete feature negotiation.
pub struct EchoListener {
    addr: SocketAddr,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    received: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl EchoListener {
    /// Bind on a loopback ephemeral port with `service_code` and start the
    /// accept loop.
    pub fn spawn(service_code: u32) -> Result<Self> {
        let bind = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0));
        let listener = match DccpListener::bind_with_ccid(bind, service_code, Some(Ccid::Ccid3)) {
            Ok(listener) => listener,
            // No CCID 3 in this kernel; fall back to its default CCID.
            Err(DccpError::OptionSet { .. }) => DccpListener::bind(bind, service_code)?,
            Err(e) => return Err(e),
        };
        let addr = listener.local_addr()?;
        listener.set_nonblocking(true)?;

        let running = Arc::new(AtomicBool::new(true));
        let received = Arc::new(Mutex::new(Vec::new()));

        let flag = running.clone();
        let sink = received.clone();
        let handle = thread::spawn(move || accept_loop(listener, flag, sink));

        Ok(Self {
            addr,
            running,
            handle: Some(handle),
            received,
        })
    }

    /// Address clients should connect to.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Datagrams recorded so far, payloads exactly as received.
    pub fn received(&self) -> Vec<Vec<u8>> {
        self.received.lock().expect("recorder poisoned").clone()
    }

    /// Block until `count` datagrams arrived or `deadline` elapses.
    pub fn wait_for(&self, count: usize, deadline: Duration) -> bool {
        let start = Instant::now();
        while start.elapsed() < deadline {
            if self.received().len() >= count {
                return true;
            }
            thread::sleep(POLL_SLEEP);
        }
        false
    }

    /// Stop the loop, join the thread, and hand back everything received.
    pub fn stop(mut self) -> Vec<Vec<u8>> {
        self.shutdown();
        self.received.lock().expect("recorder poisoned").clone()
    }

    fn shutdown(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for EchoListener {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn accept_loop(
    listener: DccpListener,
    running: Arc<AtomicBool>,
    sink: Arc<Mutex<Vec<Vec<u8>>>>,
) {
    while running.load(Ordering::Relaxed) {
        match listener.accept() {
            Ok((socket, _peer)) => serve_connection(socket, &running, &sink),
            // Nonblocking accept; nothing pending yet.
            Err(_) => thread::sleep(POLL_SLEEP),
        }
    }
}

fn serve_connection(socket: DccpSocket, running: &AtomicBool, sink: &Mutex<Vec<Vec<u8>>>) {
    if socket.set_read_timeout(Some(READ_TIMEOUT)).is_err() {
        return;
    }
    let mut buf = vec![0u8; 65536];
    while running.load(Ordering::Relaxed) {
        match socket.recv(&mut buf) {
            // Peer closed.
            Ok(0) => break,
            Ok(n) => {
                let payload = buf[..n].to_vec();
                // Echo first; the recording is what tests assert on.
                let _ = socket.send(&payload);
                sink.lock().expect("recorder poisoned").push(payload);
            }
            Err(DccpError::Recv(e))
                if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) =>
            {
                continue;
            }
            // Reset or some other hard failure; give up on this peer.
            Err(_) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probes_are_stable_across_calls() {
        assert_eq!(dccp_supported(), dccp_supported());
        assert_eq!(ccid3_supported(), ccid3_supported());
        // CCID 3 implies the protocol itself.
        if ccid3_supported() {
            assert!(dccp_supported());
        }
    }

    #[test]
    fn listener_spawns_and_stops_cleanly() {
        if !dccp_supported() {
            eprintln!("skipping: kernel lacks DCCP support");
            return;
        }
        let listener = EchoListener::spawn(17).expect("spawn echo listener");
        assert_ne!(listener.addr().port(), 0);
        assert!(listener.received().is_empty());
        assert!(listener.stop().is_empty());
    }
}
