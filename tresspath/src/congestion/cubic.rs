//! CUBIC congestion control (RFC 8312).
//!
//! After a congestion event the window regrows along
//! W(t) = C * (t - K)^3 + w_max, with K = cbrt(w_max * (1 - beta) / C);
//! a Reno-equivalent estimate provides the TCP-friendly floor of RFC 8312
//! section 4.2, and fast convergence (section 4.6) releases bandwidth when
//! consecutive events show the flow's share is shrinking.

use std::time::Instant;

use crate::congestion::Window;
use crate::loss::LossState;

/// Cubic scaling constant C, in MSS units per second cubed.
const CUBIC_C: f64 = 0.4;
/// Multiplicative decrease factor beta.
const CUBIC_BETA: f64 = 0.7;

/// Per-algorithm state for CUBIC.
#[derive(Debug, Default)]
pub(crate) struct Cubic {
    /// Seconds from the latest congestion event until the curve reaches
    /// `w_max` again.
    k: f64,
    /// Window at the latest congestion event, bytes.
    w_max: u32,
    /// `w_max` of the previous congestion event, for fast convergence.
    w_last_max: u32,
    /// Start of the current avoidance epoch; `None` until a congestion
    /// event opens one.
    avoidance_start: Option<Instant>,
}

impl Cubic {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// W_cubic(t), in bytes (RFC 8312 section 4.1).
    fn w_cubic(&self, t_sec: f64, mss: f64) -> f64 {
        let tk = t_sec - self.k;
        (CUBIC_C * tk * tk * tk + f64::from(self.w_max) / mss) * mss
    }

    /// W_est(t), the Reno-equivalent window in bytes (RFC 8312 section 4.2).
    fn w_est(&self, t_sec: f64, rtt_sec: f64, mss: f64) -> f64 {
        (f64::from(self.w_max) / mss * CUBIC_BETA
            + 3.0 * (1.0 - CUBIC_BETA) / (1.0 + CUBIC_BETA) * (t_sec / rtt_sec))
            * mss
    }

    /// K = cbrt(w_max * (1 - beta) / C), with w_max in MSS units.
    fn calc_k(w_max: u32, max_udp_payload_size: u16) -> f64 {
        let w_max_mss = f64::from(w_max) / f64::from(max_udp_payload_size);
        (w_max_mss * (1.0 - CUBIC_BETA) / CUBIC_C).cbrt()
    }

    /// Congestion-avoidance growth toward the cubic curve.
    pub(crate) fn on_acked(
        &mut self,
        window: &mut Window,
        loss: &LossState,
        bytes: u32,
        max_udp_payload_size: u16,
        now: Instant,
    ) {
        let start = match self.avoidance_start {
            Some(start) => start,
            None => {
                // Avoidance entered without a congestion event on this
                // epoch (slow start ended at ssthresh): open the epoch at
                // the current window.
                self.w_max = window.cwnd;
                self.k = Self::calc_k(self.w_max, max_udp_payload_size);
                self.avoidance_start = Some(now);
                now
            }
        };

        let mss = f64::from(max_udp_payload_size);
        let t = now.saturating_duration_since(start).as_secs_f64();
        // Timer-granularity floor keeps the t/RTT term finite.
        let rtt = loss.rtt.smoothed().as_secs_f64().max(0.001);

        let w_cubic = self.w_cubic(t, mss);
        let w_est = self.w_est(t, rtt, mss);

        if w_cubic < w_est {
            // TCP-friendly region: follow the Reno-equivalent estimate.
            // An ack never shrinks the window, so only raise it.
            window.cwnd = window.cwnd.max(w_est as u32);
        } else {
            // Concave/convex region: move toward where the curve will be
            // one RTT from now, scaled by the bytes this ack covers.
            let target = self.w_cubic(t + rtt, mss);
            let cwnd = f64::from(window.cwnd);
            if target > cwnd {
                let growth = (target - cwnd) / cwnd * f64::from(bytes);
                window.cwnd = window.cwnd.saturating_add(growth as u32);
            }
        }
    }

    /// Multiplicative decrease plus curve reset. The caller has already
    /// established that this loss opens a new episode.
    pub(crate) fn on_lost(&mut self, window: &mut Window, max_udp_payload_size: u16, now: Instant) {
        self.w_max = window.cwnd;
        // RFC 8312 section 4.6, fast convergence: a loss arriving before
        // the window regained the previous peak means the flow competes
        // with new traffic; remember an artificially lowered peak.
        if self.w_max < self.w_last_max {
            self.w_last_max = self.w_max;
            // w_max = cwnd * (1 + beta) / 2
            self.w_max = (u64::from(window.cwnd) * 17 / 20) as u32;
        } else {
            self.w_last_max = self.w_max;
        }

        // cwnd = cwnd * beta, floored like every reduction.
        window.cwnd = ((u64::from(window.cwnd) * 7 / 10) as u32).max(window.cwnd_minimum);
        window.ssthresh = window.cwnd;

        self.avoidance_start = Some(now);
        self.k = Self::calc_k(self.w_max, max_udp_payload_size);
    }

    /// Drop the curve state (persistent congestion).
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}
