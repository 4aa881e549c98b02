//! Reno congestion control with a 0.7 multiplicative decrease.
//!
//! Congestion avoidance is the classic additive increase: acknowledged
//! bytes accumulate in a stash, and every full window's worth of stash buys
//! one extra datagram of cwnd.

use crate::congestion::Window;

/// Per-algorithm state for Reno-Modified.
#[derive(Debug, Default)]
pub(crate) struct Reno {
    /// Acknowledged bytes not yet converted into window growth.
    stash: u32,
}

impl Reno {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Congestion-avoidance growth: one datagram per cwnd acknowledged.
    pub(crate) fn on_acked(&mut self, window: &mut Window, bytes: u32, max_udp_payload_size: u16) {
        self.stash = self.stash.saturating_add(bytes);
        if self.stash < window.cwnd {
            return;
        }
        let steps = self.stash / window.cwnd;
        self.stash -= steps * window.cwnd;
        window.cwnd = window
            .cwnd
            .saturating_add(steps * u32::from(max_udp_payload_size));
    }

    /// Multiplicative decrease, beta = 0.7. The caller has already
    /// established that this loss opens a new episode. Integer arithmetic
    /// keeps the reduction exact (1_000_000 -> 700_000, not 699_999).
    pub(crate) fn on_lost(&mut self, window: &mut Window) {
        window.cwnd = ((u64::from(window.cwnd) * 7 / 10) as u32).max(window.cwnd_minimum);
        window.ssthresh = window.cwnd;
    }

    /// Forget avoidance progress (persistent congestion).
    pub(crate) fn reset(&mut self) {
        self.stash = 0;
    }
}
