//! DCCP example client.
//!
//! Connects to a DCCP server with a given service code, requests CCID 3
//! (TFRC) congestion control, sends each message argument as one datagram,
//! then reports the kernel's view of the connection: maximum packet size,
//! RTT estimate, and the TFRC sending rate.
//!
//! Failures exit with the errno of the syscall that failed, so scripts can
//! tell ECONNREFUSED from EINVAL from ENOPROTOOPT.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::process::exit;
use std::thread;
use std::time::Duration;

use dccp_sock::{Ccid, DccpError, DccpSocket};
use thiserror::Error;

/// Everything one run needs, parsed up front so no socket work starts on a
/// bad command line.
#[derive(Debug, PartialEq, Eq)]
struct Invocation {
    addr: Ipv4Addr,
    port: u16,
    service_code: u32,
    messages: Vec<String>,
}

/// Connection tunables, fixed for now but kept apart from the argument
/// parsing they do not belong to.
#[derive(Debug, Clone)]
struct ClientConfig {
    /// Congestion control requested for both half-connections.
    ccid: Ccid,
    /// Grace period before close so in-flight datagrams drain.
    flush_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ccid: Ccid::Ccid3,
            flush_delay: Duration::from_millis(5),
        }
    }
}

#[derive(Error, Debug)]
enum ClientError {
    #[error("expected at least 4 arguments")]
    MissingArguments,

    #[error("invalid {what}: {value:?}")]
    BadArgument { what: &'static str, value: String },

    #[error("invalid address {0:?} (want an IPv4 address like 10.0.0.1)")]
    InvalidAddress(String),

    #[error(transparent)]
    Dccp(#[from] DccpError),
}

impl ClientError {
    /// Exit status for this failure: the OS error number when the failing
    /// syscall produced one, 1 otherwise.
    fn exit_code(&self) -> i32 {
        match self {
            ClientError::Dccp(e) => e.errno().unwrap_or(1),
            _ => 1,
        }
    }
}

fn print_usage() {
    println!("Usage: dccp-client <server address> <port> <service code> <message 1> [message 2] ...");
}

fn parse_args(args: &[String]) -> Result<Invocation, ClientError> {
    if args.len() < 5 {
        return Err(ClientError::MissingArguments);
    }
    let addr: Ipv4Addr = args[1]
        .parse()
        .map_err(|_| ClientError::InvalidAddress(args[1].clone()))?;
    let port: u16 = args[2].parse().map_err(|_| ClientError::BadArgument {
        what: "port",
        value: args[2].clone(),
    })?;
    let service_code: u32 = args[3].parse().map_err(|_| ClientError::BadArgument {
        what: "service code",
        value: args[3].clone(),
    })?;
    Ok(Invocation {
        addr,
        port,
        service_code,
        messages: args[4..].to_vec(),
    })
}

fn run(invocation: &Invocation, config: &ClientConfig) -> Result<(), ClientError> {
    let socket = DccpSocket::v4()?;
    socket.set_service_code(invocation.service_code)?;
    socket.set_ccid(config.ccid)?;

    let server = SocketAddr::V4(SocketAddrV4::new(invocation.addr, invocation.port));
    socket.connect(server)?;

    // Diagnostic only; sends below are not clamped against it.
    println!("Maximum Packet Size: {}", socket.current_mps()?);

    // One datagram per message. The NUL terminator travels with the
    // payload, so receivers see C-string framing.
    for message in &invocation.messages {
        let mut payload = Vec::with_capacity(message.len() + 1);
        payload.extend_from_slice(message.as_bytes());
        payload.push(0);
        socket.send(&payload)?;
    }

    let stats = socket.tfrc_tx_info()?;
    println!("TFRC RTT estimate: {} us", stats.rtt);
    println!("TFRC send rate: {} B/s", stats.send_rate());

    // Closing right after send can drop queued datagrams; give the kernel
    // a moment first.
    thread::sleep(config.flush_delay);

    Ok(())
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let invocation = match parse_args(&args) {
        Ok(invocation) => invocation,
        Err(ClientError::MissingArguments) => {
            print_usage();
            exit(1);
        }
        Err(err) => {
            eprintln!("{err}");
            if matches!(err, ClientError::BadArgument { .. }) {
                print_usage();
            }
            exit(err.exit_code());
        }
    };

    if let Err(err) = run(&invocation, &ClientConfig::default()) {
        eprintln!("{err}");
        exit(err.exit_code());
    }
}
