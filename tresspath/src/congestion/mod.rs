//! Congestion control.
//!
//! One `CongestionController` is created per connection and owns the
//! congestion window. Two algorithms are provided: Reno with a 0.7 backoff
//! ([`Algorithm::RenoModified`], the default) and CUBIC per RFC 8312
//! ([`Algorithm::Cubic`]). The algorithm is selected at construction and
//! never changes for the lifetime of the connection.
//!
//! The controller consumes three events from the loss-detection module --
//! [`CongestionController::on_acked`], [`CongestionController::on_lost`],
//! [`CongestionController::on_persistent_congestion`] -- and exposes the
//! current window to the send scheduler via
//! [`CongestionController::window`]. Timestamps are read from a monotonic
//! clock at the call site and passed in; nothing here samples a clock.

pub mod cubic;
pub mod reno;

use std::time::Instant;

use crate::loss::LossState;

use self::cubic::Cubic;
use self::reno::Reno;

/// Smallest congestion window: two maximum-sized UDP datagrams.
pub const MIN_CWND: u32 = 2 * 1472;
/// Largest congestion window: 1 GiB. Bounds the f64 curve arithmetic and
/// memory pressure on very fat paths.
pub const MAX_CWND: u32 = 1024 * 1024 * 1024;

/// Datagram budget of the initial window (RFC 9002 section 7.2).
const INITIAL_WINDOW_PACKETS: u32 = 10;
/// Absolute byte cap of the initial window.
const INITIAL_WINDOW_CAP: u32 = 14720;

/// Initial congestion window for a given maximum UDP payload size
/// (RFC 9002 section 7.2): ten datagrams, capped at 14720 bytes, never less
/// than two datagrams.
pub fn calc_initial_cwnd(max_udp_payload_size: u16) -> u32 {
    let mss = u32::from(max_udp_payload_size);
    (INITIAL_WINDOW_PACKETS * mss).min((2 * mss).max(INITIAL_WINDOW_CAP))
}

/// Congestion control algorithm selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Algorithm {
    /// Reno with a 0.7 multiplicative decrease instead of the classic 0.5.
    #[default]
    RenoModified,
    /// CUBIC (RFC 8312).
    Cubic,
}

impl Algorithm {
    /// Canonical name, as used in configuration.
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::RenoModified => "reno",
            Algorithm::Cubic => "cubic",
        }
    }

    /// Parse a configured name. Unrecognized names select Reno-Modified,
    /// the documented default, so a bad configuration degrades instead of
    /// refusing the connection.
    pub fn from_name(name: &str) -> Self {
        match name {
            "cubic" => Algorithm::Cubic,
            _ => Algorithm::RenoModified,
        }
    }
}

/// Congestion-controller configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct CcConfig {
    pub algorithm: Algorithm,
}

/// Window state shared by both algorithms.
///
/// `ssthresh` is `u32::MAX` (no threshold) until the first loss; the window
/// is in slow start while `cwnd < ssthresh`.
#[derive(Debug, Clone)]
pub(crate) struct Window {
    /// Current congestion window, bytes.
    pub(crate) cwnd: u32,
    /// Slow-start threshold, bytes.
    pub(crate) ssthresh: u32,
    /// Packets numbered below this were sent before the latest congestion
    /// event; further losses among them do not count as new events.
    pub(crate) recovery_end: u64,
    /// Window the connection started with.
    pub(crate) cwnd_initial: u32,
    /// Window recorded when slow start first ended; 0 until then.
    pub(crate) cwnd_exiting_slow_start: u32,
    /// Floor applied to every reduction.
    pub(crate) cwnd_minimum: u32,
    /// Ceiling applied to every increase.
    pub(crate) cwnd_maximum: u32,
    /// Number of window reductions so far.
    pub(crate) num_loss_episodes: u32,
}

impl Window {
    pub(crate) fn new(initial_cwnd: u32) -> Self {
        let cwnd = initial_cwnd.clamp(MIN_CWND, MAX_CWND);
        Self {
            cwnd,
            ssthresh: u32::MAX,
            recovery_end: 0,
            cwnd_initial: cwnd,
            cwnd_exiting_slow_start: 0,
            cwnd_minimum: MIN_CWND,
            cwnd_maximum: MAX_CWND,
            num_loss_episodes: 0,
        }
    }

    pub(crate) fn in_slow_start(&self) -> bool {
        self.cwnd < self.ssthresh
    }

    /// Clamp the window into its configured bounds.
    pub(crate) fn clamp_cwnd(&mut self) {
        self.cwnd = self.cwnd.clamp(self.cwnd_minimum, self.cwnd_maximum);
    }

    /// Bookkeeping shared by both algorithms when a loss arrives. Returns
    /// `false` when the loss falls inside the current recovery episode and
    /// must be ignored.
    fn begin_loss_episode(&mut self, lost_pn: u64, next_pn: u64) -> bool {
        if lost_pn < self.recovery_end {
            return false;
        }
        self.recovery_end = next_pn;
        self.num_loss_episodes += 1;
        if self.cwnd_exiting_slow_start == 0 {
            self.cwnd_exiting_slow_start = self.cwnd;
        }
        true
    }
}

/// Per-algorithm state; exactly one variant is alive per controller.
#[derive(Debug)]
enum AlgorithmState {
    Reno(Reno),
    Cubic(Cubic),
}

/// Congestion controller for one connection.
///
/// All operations are total: inputs come from the loss-detection module and
/// are handled by clamping, never by returning errors.
#[derive(Debug)]
pub struct CongestionController {
    window: Window,
    state: AlgorithmState,
}

impl CongestionController {
    /// Create a controller with the configured algorithm and the given
    /// initial window (normally from [`calc_initial_cwnd`]).
    pub fn new(config: &CcConfig, initial_cwnd: u32) -> Self {
        let state = match config.algorithm {
            Algorithm::RenoModified => AlgorithmState::Reno(Reno::new()),
            Algorithm::Cubic => AlgorithmState::Cubic(Cubic::new()),
        };
        Self {
            window: Window::new(initial_cwnd),
            state,
        }
    }

    /// Handle newly acknowledged bytes.
    ///
    /// `largest_acked` is the largest packet number covered by the
    /// acknowledgment, `inflight` the bytes outstanding before it arrived.
    /// The window never shrinks here; while the acknowledgment only covers
    /// packets sent before the current recovery window closed, it does not
    /// grow either.
    pub fn on_acked(
        &mut self,
        loss: &LossState,
        bytes: u32,
        largest_acked: u64,
        inflight: u32,
        max_udp_payload_size: u16,
        now: Instant,
    ) {
        debug_assert!(inflight >= bytes);
        if largest_acked < self.window.recovery_end {
            return;
        }

        if self.window.in_slow_start() {
            self.window.cwnd = self.window.cwnd.saturating_add(bytes);
            self.window.clamp_cwnd();
            return;
        }

        match &mut self.state {
            AlgorithmState::Reno(reno) => {
                reno.on_acked(&mut self.window, bytes, max_udp_payload_size)
            }
            AlgorithmState::Cubic(cubic) => {
                cubic.on_acked(&mut self.window, loss, bytes, max_udp_payload_size, now)
            }
        }
        self.window.clamp_cwnd();
    }

    /// Handle a packet declared lost. `next_pn` is the next unsent packet
    /// number and becomes the recovery watermark; losses of packets sent
    /// before an earlier watermark are already accounted for and ignored.
    pub fn on_lost(
        &mut self,
        _loss: &LossState,
        _bytes_lost: u32,
        lost_pn: u64,
        next_pn: u64,
        max_udp_payload_size: u16,
        now: Instant,
    ) {
        if !self.window.begin_loss_episode(lost_pn, next_pn) {
            return;
        }

        match &mut self.state {
            AlgorithmState::Reno(reno) => reno.on_lost(&mut self.window),
            AlgorithmState::Cubic(cubic) => {
                cubic.on_lost(&mut self.window, max_udp_payload_size, now)
            }
        }
        self.window.clamp_cwnd();

        tracing::debug!(
            algorithm = self.algorithm().name(),
            cwnd = self.window.cwnd,
            episode = self.window.num_loss_episodes,
            "congestion window reduced"
        );
    }

    /// Handle a persistent-congestion declaration: collapse the window to
    /// its minimum and re-enter slow start.
    pub fn on_persistent_congestion(&mut self, _loss: &LossState) {
        self.window.cwnd = self.window.cwnd_minimum;
        self.window.ssthresh = u32::MAX;
        match &mut self.state {
            AlgorithmState::Reno(reno) => reno.reset(),
            AlgorithmState::Cubic(cubic) => cubic.reset(),
        }

        tracing::debug!(
            cwnd = self.window.cwnd,
            "persistent congestion, window collapsed to minimum"
        );
    }

    /// Current congestion window in bytes, read by the send scheduler.
    pub fn window(&self) -> u32 {
        self.window.cwnd
    }

    /// Slow-start threshold; `u32::MAX` until the first loss.
    pub fn ssthresh(&self) -> u32 {
        self.window.ssthresh
    }

    pub fn in_slow_start(&self) -> bool {
        self.window.in_slow_start()
    }

    /// Whether an acknowledgment for `pn` would still fall inside the
    /// current recovery episode.
    pub fn in_recovery(&self, pn: u64) -> bool {
        pn < self.window.recovery_end
    }

    /// Number of window reductions since the connection started.
    pub fn loss_episodes(&self) -> u32 {
        self.window.num_loss_episodes
    }

    pub fn algorithm(&self) -> Algorithm {
        match self.state {
            AlgorithmState::Reno(_) => Algorithm::RenoModified,
            AlgorithmState::Cubic(_) => Algorithm::Cubic,
        }
    }

    /// Window the connection started with.
    pub fn cwnd_initial(&self) -> u32 {
        self.window.cwnd_initial
    }

    /// Window recorded when slow start first ended; 0 while still in the
    /// initial slow start.
    pub fn cwnd_exiting_slow_start(&self) -> u32 {
        self.window.cwnd_exiting_slow_start
    }

    /// The (floor, ceiling) bounds every mutation is clamped into.
    pub fn cwnd_bounds(&self) -> (u32, u32) {
        (self.window.cwnd_minimum, self.window.cwnd_maximum)
    }
}
