//! Read-only summary of loss-detection state.
//!
//! The loss detector itself lives outside this crate. The congestion
//! controller only consumes the summary handed to each event, together with
//! the scalar byte counts and packet numbers the detector passes alongside.

use crate::rtt::RttEstimator;

/// Snapshot of the loss detector's path estimates, passed by reference into
/// every congestion-controller event. CUBIC's time-based formula reads the
/// smoothed RTT; Reno ignores it.
#[derive(Debug, Clone, Default)]
pub struct LossState {
    /// Round-trip estimates for the path.
    pub rtt: RttEstimator,
}

impl LossState {
    pub fn new() -> Self {
        Self {
            rtt: RttEstimator::new(),
        }
    }
}
