//! TFRC congestion statistics mirrored from the kernel.
//!
//! `getsockopt` on the CCID info options fills the caller's buffer with a
//! raw copy of the kernel struct, so the layouts here must be bit-identical
//! to `struct tfrc_tx_info` / `struct tfrc_rx_info`: same field order, same
//! widths, natural alignment. Unit tests pin the size and every offset.

use bytemuck::{Pod, Zeroable};

/// Rates in these structs are scaled by 64, i.e. stored as 64 * bytes/sec.
const RATE_SHIFT: u32 = 6;

/// Sender-side TFRC state (`struct tfrc_tx_info`), readable through
/// [`DccpSocket::tfrc_tx_info`](crate::DccpSocket::tfrc_tx_info) while
/// CCID 3 runs the TX half-connection.
///
/// The u64 fields force 8-byte alignment, which leaves tail padding after
/// `ipi` on 64-bit targets. Padding rules this type out of `Pod`; it is
/// only `Zeroable`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Zeroable)]
pub struct TfrcTxInfo {
    /// Current sending rate, 64 * bytes/second.
    pub x: u64,
    /// Receive rate reported by the peer, 64 * bytes/second.
    pub x_recv: u64,
    /// Rate from the TFRC throughput equation, bytes/second.
    pub x_calc: u32,
    /// Round-trip time estimate, microseconds.
    pub rtt: u32,
    /// Loss event rate in [0, 1], scaled by 1_000_000.
    pub p: u32,
    /// Nofeedback timer setting, microseconds.
    pub rto: u32,
    /// Inter-packet interval the sender paces at, microseconds.
    pub ipi: u32,
}

impl TfrcTxInfo {
    /// Exact byte length the kernel writes for this option.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Current sending rate in plain bytes per second.
    #[inline]
    pub fn send_rate(&self) -> u64 {
        self.x >> RATE_SHIFT
    }

    /// Peer-reported receive rate in plain bytes per second.
    #[inline]
    pub fn recv_rate(&self) -> u64 {
        self.x_recv >> RATE_SHIFT
    }

    /// Loss event rate as a fraction in `0.0..=1.0`.
    #[inline]
    pub fn loss_event_rate(&self) -> f64 {
        f64::from(self.p) / 1_000_000.0
    }
}

/// Receiver-side TFRC state (`struct tfrc_rx_info`). No padding anywhere,
/// so this one is full `Pod`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct TfrcRxInfo {
    /// Receive rate, 64 * bytes/second.
    pub x_recv: u64,
    /// Round-trip time estimate, microseconds.
    pub rtt: u32,
    /// Loss event rate in [0, 1], scaled by 1_000_000.
    pub p: u32,
}

impl TfrcRxInfo {
    /// Exact byte length the kernel writes for this option.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Receive rate in plain bytes per second.
    #[inline]
    pub fn recv_rate(&self) -> u64 {
        self.x_recv >> RATE_SHIFT
    }

    /// Loss event rate as a fraction in `0.0..=1.0`.
    #[inline]
    pub fn loss_event_rate(&self) -> f64 {
        f64::from(self.p) / 1_000_000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::offset_of;

    #[test]
    fn tx_info_layout_matches_the_kernel() {
        assert_eq!(offset_of!(TfrcTxInfo, x), 0);
        assert_eq!(offset_of!(TfrcTxInfo, x_recv), 8);
        assert_eq!(offset_of!(TfrcTxInfo, x_calc), 16);
        assert_eq!(offset_of!(TfrcTxInfo, rtt), 20);
        assert_eq!(offset_of!(TfrcTxInfo, p), 24);
        assert_eq!(offset_of!(TfrcTxInfo, rto), 28);
        assert_eq!(offset_of!(TfrcTxInfo, ipi), 32);
        // u64 alignment pads the tail out to 40 on 64-bit targets.
        #[cfg(target_pointer_width = "64")]
        assert_eq!(TfrcTxInfo::SIZE, 40);
    }

    #[test]
    fn rx_info_layout_matches_the_kernel() {
        assert_eq!(offset_of!(TfrcRxInfo, x_recv), 0);
        assert_eq!(offset_of!(TfrcRxInfo, rtt), 8);
        assert_eq!(offset_of!(TfrcRxInfo, p), 12);
        assert_eq!(TfrcRxInfo::SIZE, 16);
    }

    #[test]
    fn rates_unscale_to_bytes_per_second() {
        let mut info = TfrcTxInfo::zeroed();
        info.x = 1460 << 6;
        info.x_recv = 93440; // 1460 B/s, pre-shifted
        assert_eq!(info.send_rate(), 1460);
        assert_eq!(info.recv_rate(), 1460);
    }

    #[test]
    fn loss_rate_unscales_to_a_fraction() {
        let mut info = TfrcTxInfo::zeroed();
        info.p = 25_000;
        assert!((info.loss_event_rate() - 0.025).abs() < 1e-9);

        let mut rx = TfrcRxInfo::zeroed();
        rx.p = 1_000_000;
        assert!((rx.loss_event_rate() - 1.0).abs() < 1e-9);
    }
}
