//! # dccp-sock
//!
//! Linux DCCP sockets from Rust: the kernel sockopt ABI (option constants
//! plus fixed-layout TFRC statistics structs) and safe client/listener
//! wrappers over the raw syscalls.
//!
//! ## What DCCP gives you
//!
//! - Connection-oriented, congestion-controlled datagrams without
//!   retransmission (RFC 4340)
//! - Congestion control negotiated per connection: CCID 2 (TCP-like) or
//!   CCID 3 (TFRC rate-based)
//! - Sender and receiver congestion state readable straight from the
//!   kernel
//!
//! ## Example
//!
//! ```rust,no_run
//! use dccp_sock::{Ccid, DccpSocket};
//!
//! fn main() -> dccp_sock::Result<()> {
//!     let sock = DccpSocket::v4()?;
//!     sock.set_service_code(42)?;
//!     sock.set_ccid(Ccid::Ccid3)?;
//!     sock.connect("127.0.0.1:5001".parse().unwrap())?;
//!     sock.send(b"ping\0")?;
//!     let stats = sock.tfrc_tx_info()?;
//!     println!("rtt: {} us, send rate: {} B/s", stats.rtt, stats.send_rate());
//!     Ok(())
//! }
//! ```
//!
//! DCCP left mainline Linux in 6.16. On kernels without the protocol every
//! constructor fails with the socket(2) errno, which is also how the test
//! suite decides to skip live-socket cases.

#[cfg(not(target_os = "linux"))]
compile_error!("dccp-sock speaks the Linux DCCP ABI; no other kernel ships it");

// Tracing macro - no-op when feature disabled
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) }
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}

pub mod abi;
mod error;
mod listener;
mod socket;
mod stats;

pub use abi::Ccid;
pub use error::{DccpError, Result};
pub use listener::DccpListener;
pub use socket::DccpSocket;
pub use stats::{TfrcRxInfo, TfrcTxInfo};
