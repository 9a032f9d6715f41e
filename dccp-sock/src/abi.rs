//! Kernel ABI constants for DCCP sockets.
//!
//! libc stopped at the socket type and protocol numbers; the DCCP option
//! names never made it in, so they are declared here. All values are fixed
//! by the kernel ABI (`include/uapi/linux/dccp.h`) and must never change.

use libc::c_int;

/// Socket-option level for DCCP options.
pub const SOL_DCCP: c_int = 269;

/// Socket type for DCCP (connection-oriented datagrams).
pub const SOCK_DCCP: c_int = 6;

/// IP protocol number assigned to DCCP.
pub const IPPROTO_DCCP: c_int = 33;

/// Service code list, network byte order. Write before connect/listen.
pub const DCCP_SOCKOPT_SERVICE: c_int = 2;
/// Retired feature-change interface; the kernel answers EINVAL.
pub const DCCP_SOCKOPT_CHANGE_L: c_int = 3;
/// Retired feature-change interface; the kernel answers EINVAL.
pub const DCCP_SOCKOPT_CHANGE_R: c_int = 4;
/// Current maximum packet size, read-only once connected.
pub const DCCP_SOCKOPT_GET_CUR_MPS: c_int = 5;
/// Let the server side carry the TIMEWAIT state on close.
pub const DCCP_SOCKOPT_SERVER_TIMEWAIT: c_int = 6;
/// Partial checksum coverage for outgoing packets.
pub const DCCP_SOCKOPT_SEND_CSCOV: c_int = 10;
/// Minimum checksum coverage accepted on incoming packets.
pub const DCCP_SOCKOPT_RECV_CSCOV: c_int = 11;
/// CCIDs the running kernel was built with, as a u8 array.
pub const DCCP_SOCKOPT_AVAILABLE_CCIDS: c_int = 12;
/// Congestion control for both half-connections. Write before connect.
pub const DCCP_SOCKOPT_CCID: c_int = 13;
/// Congestion control for the TX half-connection only.
pub const DCCP_SOCKOPT_TX_CCID: c_int = 14;
/// Congestion control for the RX half-connection only.
pub const DCCP_SOCKOPT_RX_CCID: c_int = 15;
/// TX queueing policy, one of the `DCCPQ_POLICY_*` values.
pub const DCCP_SOCKOPT_QPOLICY_ID: c_int = 16;
/// TX queue length bound used by the queueing policy.
pub const DCCP_SOCKOPT_QPOLICY_TXQLEN: c_int = 17;
/// Start of the CCID-specific RX option range.
pub const DCCP_SOCKOPT_CCID_RX_INFO: c_int = 128;
/// Start of the CCID-specific TX option range.
pub const DCCP_SOCKOPT_CCID_TX_INFO: c_int = 192;

/// Most service codes one socket may announce.
pub const DCCP_SERVICE_LIST_MAX_LEN: usize = 32;

/// FIFO queueing policy, the kernel default.
pub const DCCPQ_POLICY_SIMPLE: c_int = 0;
/// Priority queueing policy; priorities ride in `cmsg` on send.
pub const DCCPQ_POLICY_PRIO: c_int = 1;

/// Congestion control id negotiated per half-connection at setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Ccid {
    /// CCID 2, TCP-like window-based congestion control (RFC 4341).
    Ccid2 = 2,
    /// CCID 3, TFRC rate-based congestion control (RFC 4342).
    Ccid3 = 3,
}

impl Ccid {
    /// The wire value carried in feature negotiation.
    #[inline]
    pub fn id(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Ccid {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(Ccid::Ccid2),
            3 => Ok(Ccid::Ccid3),
            other => Err(other),
        }
    }
}
