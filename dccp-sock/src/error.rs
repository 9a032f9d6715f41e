//! Error types for DCCP socket operations.

use std::io;

use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, DccpError>;

/// Errors raised by DCCP socket operations.
///
/// Syscall-backed variants keep the underlying [`io::Error`] so the OS
/// error number stays reachable through [`DccpError::errno`]; callers that
/// mirror kernel semantics in their exit status rely on it.
#[derive(Error, Debug)]
pub enum DccpError {
    /// Ancillary socket I/O (address lookups, mode and timeout flags).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("socket(SOCK_DCCP, IPPROTO_DCCP) failed: {0}")]
    SocketCreation(#[source] io::Error),

    #[error("setsockopt({option}) failed: {source}")]
    OptionSet {
        option: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("getsockopt({option}) failed: {source}")]
    OptionGet {
        option: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("connect failed: {0}")]
    Connect(#[source] io::Error),

    #[error("send failed: {0}")]
    Send(#[source] io::Error),

    #[error("recv failed: {0}")]
    Recv(#[source] io::Error),

    #[error("bind failed: {0}")]
    Bind(#[source] io::Error),

    #[error("listen failed: {0}")]
    Listen(#[source] io::Error),

    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),

    /// The kernel reported a stats length other than the struct size. The
    /// buffer contents cannot be trusted in that case.
    #[error("getsockopt({option}) wrote {got} bytes, expected exactly {expected}")]
    StatsSize {
        option: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

impl DccpError {
    /// OS error number behind this error, if the failing call set one.
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::Io(e)
            | Self::SocketCreation(e)
            | Self::Connect(e)
            | Self::Send(e)
            | Self::Recv(e)
            | Self::Bind(e)
            | Self::Listen(e)
            | Self::Accept(e) => e.raw_os_error(),
            Self::OptionSet { source, .. } | Self::OptionGet { source, .. } => {
                source.raw_os_error()
            }
            Self::StatsSize { .. } | Self::InvalidAddress(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_failing_option() {
        let err = DccpError::OptionSet {
            option: "DCCP_SOCKOPT_SERVICE",
            source: io::Error::from_raw_os_error(libc::EINVAL),
        };
        let msg = err.to_string();
        assert!(msg.contains("DCCP_SOCKOPT_SERVICE"), "{msg}");
    }

    #[test]
    fn errno_survives_every_syscall_variant() {
        let refused = || io::Error::from_raw_os_error(libc::ECONNREFUSED);
        assert_eq!(
            DccpError::SocketCreation(refused()).errno(),
            Some(libc::ECONNREFUSED)
        );
        assert_eq!(
            DccpError::Connect(refused()).errno(),
            Some(libc::ECONNREFUSED)
        );
        assert_eq!(
            DccpError::OptionGet {
                option: "DCCP_SOCKOPT_GET_CUR_MPS",
                source: refused(),
            }
            .errno(),
            Some(libc::ECONNREFUSED)
        );
        assert_eq!(DccpError::Send(refused()).errno(), Some(libc::ECONNREFUSED));
    }

    #[test]
    fn non_syscall_failures_have_no_errno() {
        let err = DccpError::StatsSize {
            option: "DCCP_SOCKOPT_CCID_TX_INFO",
            expected: 40,
            got: 36,
        };
        assert_eq!(err.errno(), None);
        let msg = err.to_string();
        assert!(msg.contains("40") && msg.contains("36"), "{msg}");

        assert_eq!(DccpError::InvalidAddress("nope".into()).errno(), None);
    }
}
