//! DCCP socket wrapper.
//!
//! [`DccpSocket`] owns one DCCP file descriptor. Generic lifecycle work
//! (create, connect, send, recv) goes through `socket2`; the DCCP option
//! level has no portable wrapper anywhere, so those calls go straight to
//! `libc` against the raw fd.

use std::io;
use std::mem::MaybeUninit;
use std::net::SocketAddr;
use std::os::unix::io::{AsRawFd, RawFd};
use std::time::Duration;

use bytemuck::Zeroable;
use libc::{c_int, c_void, socklen_t};
use socket2::{Domain, Protocol, SockAddr, Socket, Type};

use crate::abi::{self, Ccid};
use crate::error::{DccpError, Result};
use crate::stats::{TfrcRxInfo, TfrcTxInfo};

/// A DCCP socket: connection-oriented, congestion-controlled datagrams.
///
/// The descriptor closes on drop. Options marked "before connect" belong to
/// feature negotiation and are rejected by the kernel once the handshake
/// has started.
#[derive(Debug)]
pub struct DccpSocket {
    inner: Socket,
}

impl DccpSocket {
    /// Open an IPv4 DCCP socket.
    pub fn v4() -> Result<Self> {
        Self::open(Domain::IPV4)
    }

    /// Open an IPv6 DCCP socket.
    pub fn v6() -> Result<Self> {
        Self::open(Domain::IPV6)
    }

    fn open(domain: Domain) -> Result<Self> {
        let inner = Socket::new(
            domain,
            Type::from(abi::SOCK_DCCP),
            Some(Protocol::from(abi::IPPROTO_DCCP)),
        )
        .map_err(DccpError::SocketCreation)?;
        trace_debug!("opened DCCP socket fd={}", inner.as_raw_fd());
        Ok(Self { inner })
    }

    /// Wrap a descriptor handed out by accept.
    pub(crate) fn from_socket2(inner: Socket) -> Self {
        Self { inner }
    }

    pub(crate) fn inner(&self) -> &Socket {
        &self.inner
    }

    /// Set the service code announced in the connection request. Before
    /// connect.
    ///
    /// The kernel stores service codes in network byte order; `code` is
    /// host order and converted here.
    pub fn set_service_code(&self, code: u32) -> Result<()> {
        let wire = code.to_be();
        self.set_opt("DCCP_SOCKOPT_SERVICE", abi::DCCP_SOCKOPT_SERVICE, &wire)
    }

    /// Service codes currently bound to the socket, host order.
    pub fn service_codes(&self) -> Result<Vec<u32>> {
        let mut wire = [0u32; abi::DCCP_SERVICE_LIST_MAX_LEN];
        let len = self.get_opt("DCCP_SOCKOPT_SERVICE", abi::DCCP_SOCKOPT_SERVICE, &mut wire)?;
        let entries = len / std::mem::size_of::<u32>();
        Ok(wire[..entries.min(wire.len())]
            .iter()
            .map(|be| u32::from_be(*be))
            .collect())
    }

    /// Request a congestion control id for both half-connections. Before
    /// connect.
    ///
    /// The kernel rejects ids it was not built with, so EINVAL here usually
    /// means the CCID module is absent.
    pub fn set_ccid(&self, ccid: Ccid) -> Result<()> {
        self.set_opt("DCCP_SOCKOPT_CCID", abi::DCCP_SOCKOPT_CCID, &ccid.id())
    }

    /// Request a congestion control id for the TX half-connection only.
    /// Before connect.
    pub fn set_tx_ccid(&self, ccid: Ccid) -> Result<()> {
        self.set_opt("DCCP_SOCKOPT_TX_CCID", abi::DCCP_SOCKOPT_TX_CCID, &ccid.id())
    }

    /// Request a congestion control id for the RX half-connection only.
    /// Before connect.
    pub fn set_rx_ccid(&self, ccid: Ccid) -> Result<()> {
        self.set_opt("DCCP_SOCKOPT_RX_CCID", abi::DCCP_SOCKOPT_RX_CCID, &ccid.id())
    }

    /// Congestion control id currently driving the TX half-connection.
    pub fn tx_ccid(&self) -> Result<u8> {
        let mut value: c_int = 0;
        self.get_opt("DCCP_SOCKOPT_TX_CCID", abi::DCCP_SOCKOPT_TX_CCID, &mut value)?;
        Ok(value as u8)
    }

    /// Congestion control id currently driving the RX half-connection.
    pub fn rx_ccid(&self) -> Result<u8> {
        let mut value: c_int = 0;
        self.get_opt("DCCP_SOCKOPT_RX_CCID", abi::DCCP_SOCKOPT_RX_CCID, &mut value)?;
        Ok(value as u8)
    }

    /// Congestion control ids the running kernel was built with.
    pub fn available_ccids(&self) -> Result<Vec<u8>> {
        // More slots than any kernel has ever shipped CCIDs.
        let mut ids = [0u8; 16];
        let len = self.get_opt(
            "DCCP_SOCKOPT_AVAILABLE_CCIDS",
            abi::DCCP_SOCKOPT_AVAILABLE_CCIDS,
            &mut ids,
        )?;
        Ok(ids[..len.min(ids.len())].to_vec())
    }

    /// Current maximum packet size in bytes, as constrained by the path MTU
    /// and the congestion state. Only meaningful once connected.
    pub fn current_mps(&self) -> Result<u32> {
        let mut mps: c_int = 0;
        self.get_opt(
            "DCCP_SOCKOPT_GET_CUR_MPS",
            abi::DCCP_SOCKOPT_GET_CUR_MPS,
            &mut mps,
        )?;
        Ok(mps as u32)
    }

    /// Sender-side TFRC statistics. Available while CCID 3 runs the TX
    /// half-connection; ENOPROTOOPT otherwise.
    ///
    /// The kernel writes the struct back raw. A reported length other than
    /// [`TfrcTxInfo::SIZE`] means the layouts disagree and the bytes are
    /// rejected rather than reinterpreted.
    pub fn tfrc_tx_info(&self) -> Result<TfrcTxInfo> {
        let mut info = TfrcTxInfo::zeroed();
        let len = self.get_opt(
            "DCCP_SOCKOPT_CCID_TX_INFO",
            abi::DCCP_SOCKOPT_CCID_TX_INFO,
            &mut info,
        )?;
        if len != TfrcTxInfo::SIZE {
            return Err(DccpError::StatsSize {
                option: "DCCP_SOCKOPT_CCID_TX_INFO",
                expected: TfrcTxInfo::SIZE,
                got: len,
            });
        }
        Ok(info)
    }

    /// Receiver-side TFRC statistics. Available while CCID 3 runs the RX
    /// half-connection; ENOPROTOOPT otherwise.
    pub fn tfrc_rx_info(&self) -> Result<TfrcRxInfo> {
        let mut info = TfrcRxInfo::zeroed();
        let len = self.get_opt(
            "DCCP_SOCKOPT_CCID_RX_INFO",
            abi::DCCP_SOCKOPT_CCID_RX_INFO,
            &mut info,
        )?;
        if len != TfrcRxInfo::SIZE {
            return Err(DccpError::StatsSize {
                option: "DCCP_SOCKOPT_CCID_RX_INFO",
                expected: TfrcRxInfo::SIZE,
                got: len,
            });
        }
        Ok(info)
    }

    /// Restrict the checksum to cover only part of outgoing packets.
    /// 0 covers the whole packet, 1..=15 cover the header plus
    /// `(cscov - 1) * 4` payload bytes.
    pub fn set_send_cscov(&self, cscov: u32) -> Result<()> {
        self.set_opt(
            "DCCP_SOCKOPT_SEND_CSCOV",
            abi::DCCP_SOCKOPT_SEND_CSCOV,
            &(cscov as c_int),
        )
    }

    /// Checksum coverage currently applied to outgoing packets.
    pub fn send_cscov(&self) -> Result<u32> {
        let mut value: c_int = 0;
        self.get_opt(
            "DCCP_SOCKOPT_SEND_CSCOV",
            abi::DCCP_SOCKOPT_SEND_CSCOV,
            &mut value,
        )?;
        Ok(value as u32)
    }

    /// Require at least this checksum coverage on incoming packets.
    pub fn set_recv_cscov(&self, cscov: u32) -> Result<()> {
        self.set_opt(
            "DCCP_SOCKOPT_RECV_CSCOV",
            abi::DCCP_SOCKOPT_RECV_CSCOV,
            &(cscov as c_int),
        )
    }

    /// Minimum checksum coverage accepted on incoming packets.
    pub fn recv_cscov(&self) -> Result<u32> {
        let mut value: c_int = 0;
        self.get_opt(
            "DCCP_SOCKOPT_RECV_CSCOV",
            abi::DCCP_SOCKOPT_RECV_CSCOV,
            &mut value,
        )?;
        Ok(value as u32)
    }

    /// Ask the peer to hold the TIMEWAIT state when this side closes first.
    /// Server-side sockets only.
    pub fn set_server_timewait(&self, enable: bool) -> Result<()> {
        self.set_opt(
            "DCCP_SOCKOPT_SERVER_TIMEWAIT",
            abi::DCCP_SOCKOPT_SERVER_TIMEWAIT,
            &(enable as c_int),
        )
    }

    /// Select the TX queueing policy, one of the `DCCPQ_POLICY_*` values.
    pub fn set_qpolicy_id(&self, policy: c_int) -> Result<()> {
        self.set_opt(
            "DCCP_SOCKOPT_QPOLICY_ID",
            abi::DCCP_SOCKOPT_QPOLICY_ID,
            &policy,
        )
    }

    /// Bound the TX queue length used by the queueing policy.
    pub fn set_qpolicy_txqlen(&self, len: u32) -> Result<()> {
        self.set_opt(
            "DCCP_SOCKOPT_QPOLICY_TXQLEN",
            abi::DCCP_SOCKOPT_QPOLICY_TXQLEN,
            &(len as c_int),
        )
    }

    /// Connect to a DCCP peer. Blocks until the handshake finishes or the
    /// kernel gives up.
    pub fn connect(&self, addr: SocketAddr) -> Result<()> {
        trace_debug!("connecting to {}", addr);
        self.inner
            .connect(&SockAddr::from(addr))
            .map_err(DccpError::Connect)
    }

    /// Send one datagram. DCCP preserves message boundaries, so each call
    /// becomes one packet on the wire, bounded by the current MPS.
    pub fn send(&self, buf: &[u8]) -> Result<usize> {
        self.inner.send(buf).map_err(DccpError::Send)
    }

    /// Receive one datagram into `buf` and return its length. `Ok(0)` means
    /// the peer closed the connection.
    pub fn recv(&self, buf: &mut [u8]) -> Result<usize> {
        // Safety: MaybeUninit<u8> has u8's layout, and recv only writes
        // into the slice.
        let uninit =
            unsafe { &mut *(buf as *mut [u8] as *mut [MaybeUninit<u8>]) };
        self.inner.recv(uninit).map_err(DccpError::Recv)
    }

    /// Local address of the socket.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        let addr = self.inner.local_addr()?;
        addr.as_socket()
            .ok_or_else(|| DccpError::InvalidAddress("local address is not an inet address".into()))
    }

    /// Peer address of a connected socket.
    pub fn peer_addr(&self) -> Result<SocketAddr> {
        let addr = self.inner.peer_addr()?;
        addr.as_socket()
            .ok_or_else(|| DccpError::InvalidAddress("peer address is not an inet address".into()))
    }

    pub fn set_nonblocking(&self, nonblocking: bool) -> Result<()> {
        Ok(self.inner.set_nonblocking(nonblocking)?)
    }

    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        Ok(self.inner.set_read_timeout(timeout)?)
    }

    fn set_opt<T>(&self, name: &'static str, option: c_int, value: &T) -> Result<()> {
        // Safety: the pointer and length describe the caller's value, which
        // lives across the call.
        let rc = unsafe {
            libc::setsockopt(
                self.inner.as_raw_fd(),
                abi::SOL_DCCP,
                option,
                value as *const T as *const c_void,
                std::mem::size_of::<T>() as socklen_t,
            )
        };
        if rc != 0 {
            return Err(DccpError::OptionSet {
                option: name,
                source: io::Error::last_os_error(),
            });
        }
        trace_debug!("setsockopt({}) ok", name);
        Ok(())
    }

    /// getsockopt into `value`, returning the length the kernel reported.
    fn get_opt<T>(&self, name: &'static str, option: c_int, value: &mut T) -> Result<usize> {
        let mut len = std::mem::size_of::<T>() as socklen_t;
        // Safety: the pointer and length describe the caller's value; the
        // kernel never writes past the length handed in.
        let rc = unsafe {
            libc::getsockopt(
                self.inner.as_raw_fd(),
                abi::SOL_DCCP,
                option,
                value as *mut T as *mut c_void,
                &mut len,
            )
        };
        if rc != 0 {
            return Err(DccpError::OptionGet {
                option: name,
                source: io::Error::last_os_error(),
            });
        }
        trace_debug!("getsockopt({}) -> {} bytes", name, len);
        Ok(len as usize)
    }
}

impl AsRawFd for DccpSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.inner.as_raw_fd()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creation_succeeds_or_reports_an_os_error() {
        match DccpSocket::v4() {
            Ok(sock) => {
                // Unbound sockets still answer getsockname.
                let addr = sock.local_addr().unwrap();
                assert!(addr.is_ipv4());
            }
            Err(DccpError::SocketCreation(e)) => {
                assert!(e.raw_os_error().is_some(), "{e}");
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn service_code_round_trips_before_connect() {
        let sock = match DccpSocket::v4() {
            Ok(sock) => sock,
            Err(_) => {
                eprintln!("skipping: kernel lacks DCCP support");
                return;
            }
        };
        sock.set_service_code(42).unwrap();
        let codes = sock.service_codes().unwrap();
        assert_eq!(codes, vec![42]);
    }

    #[test]
    fn available_ccids_reports_only_known_ids() {
        let sock = match DccpSocket::v4() {
            Ok(sock) => sock,
            Err(_) => {
                eprintln!("skipping: kernel lacks DCCP support");
                return;
            }
        };
        let ids = sock.available_ccids().unwrap();
        for id in ids {
            assert!(Ccid::try_from(id).is_ok(), "unknown CCID {id}");
        }
    }

    #[test]
    fn retired_change_options_are_rejected() {
        let sock = match DccpSocket::v4() {
            Ok(sock) => sock,
            Err(_) => {
                eprintln!("skipping: kernel lacks DCCP support");
                return;
            }
        };
        let err = sock
            .set_opt("DCCP_SOCKOPT_CHANGE_L", abi::DCCP_SOCKOPT_CHANGE_L, &1u8)
            .unwrap_err();
        assert_eq!(err.errno(), Some(libc::EINVAL));
    }

    #[test]
    fn stats_require_a_connected_ccid3_socket() {
        let sock = match DccpSocket::v4() {
            Ok(sock) => sock,
            Err(_) => {
                eprintln!("skipping: kernel lacks DCCP support");
                return;
            }
        };
        // Not connected, no CCID negotiated: the option cannot succeed.
        assert!(sock.tfrc_tx_info().is_err());
    }
}
