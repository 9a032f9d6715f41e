//! DCCP listener.
//!
//! A DCCP server socket must carry its service code before `listen()`:
//! connection requests with a different code are reset by the kernel and
//! never reach accept.

use std::net::SocketAddr;
use std::os::unix::io::{AsRawFd, RawFd};

use socket2::SockAddr;

use crate::abi::Ccid;
use crate::error::{DccpError, Result};
use crate::socket::DccpSocket;

/// Accept backlog for listening sockets.
const BACKLOG: i32 = 8;

/// Listening DCCP socket. Accepted connections come back as
/// [`DccpSocket`]s.
#[derive(Debug)]
pub struct DccpListener {
    inner: DccpSocket,
}

impl DccpListener {
    /// Bind a listener that answers for `service_code` on `addr`.
    pub fn bind(addr: SocketAddr, service_code: u32) -> Result<Self> {
        Self::bind_with_ccid(addr, service_code, None)
    }

    /// Bind and pin a congestion control id before listening. Accepted
    /// sockets inherit it, and connection requests that cannot negotiate
    /// it are reset.
    pub fn bind_with_ccid(
        addr: SocketAddr,
        service_code: u32,
        ccid: Option<Ccid>,
    ) -> Result<Self> {
        let sock = match addr {
            SocketAddr::V4(_) => DccpSocket::v4()?,
            SocketAddr::V6(_) => DccpSocket::v6()?,
        };
        sock.inner()
            .set_reuse_address(true)
            .map_err(|e| DccpError::OptionSet {
                option: "SO_REUSEADDR",
                source: e,
            })?;
        sock.set_service_code(service_code)?;
        if let Some(ccid) = ccid {
            sock.set_ccid(ccid)?;
        }
        sock.inner()
            .bind(&SockAddr::from(addr))
            .map_err(DccpError::Bind)?;
        sock.inner().listen(BACKLOG).map_err(DccpError::Listen)?;
        trace_debug!("listening on {} (service code {})", addr, service_code);
        Ok(Self { inner: sock })
    }

    /// Accept one connection, returning the connected socket and the peer
    /// address.
    pub fn accept(&self) -> Result<(DccpSocket, SocketAddr)> {
        let (socket, peer) = self.inner.inner().accept().map_err(DccpError::Accept)?;
        let peer = peer
            .as_socket()
            .ok_or_else(|| DccpError::InvalidAddress("peer address is not an inet address".into()))?;
        trace_debug!("accepted connection from {}", peer);
        Ok((DccpSocket::from_socket2(socket), peer))
    }

    /// Address the listener is bound to. The port is the one the kernel
    /// picked when binding to port 0.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.inner.local_addr()
    }

    pub fn set_nonblocking(&self, nonblocking: bool) -> Result<()> {
        self.inner.set_nonblocking(nonblocking)
    }
}

impl AsRawFd for DccpListener {
    fn as_raw_fd(&self) -> RawFd {
        self.inner.as_raw_fd()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, SocketAddrV4};

    #[test]
    fn binds_an_ephemeral_port_with_a_service_code() {
        let bind = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0));
        let listener = match DccpListener::bind(bind, 99) {
            Ok(listener) => listener,
            Err(_) => {
                eprintln!("skipping: kernel lacks DCCP support");
                return;
            }
        };
        let addr = listener.local_addr().unwrap();
        assert_ne!(addr.port(), 0);
        assert_eq!(listener.inner.service_codes().unwrap(), vec![99]);
    }
}
