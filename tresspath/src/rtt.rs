//! RTT estimation per RFC 9002 section 5.
//!
//! smoothed_rtt = 7/8 * smoothed_rtt + 1/8 * adjusted_rtt
//! rttvar       = 3/4 * rttvar + 1/4 * |smoothed_rtt - adjusted_rtt|
//!
//! where adjusted_rtt is the sample minus the peer-reported ack delay,
//! applied only while that keeps the sample at or above the path minimum.

use std::time::Duration;

/// Assumed RTT before the first sample (RFC 9002 section 6.2.2).
const INITIAL_RTT: Duration = Duration::from_millis(333);
/// Timer granularity floor for the variance component of the PTO.
const GRANULARITY: Duration = Duration::from_millis(1);

/// RTT estimator, fed by the loss-detection module with one sample per
/// ack-eliciting acknowledgment.
#[derive(Debug, Clone)]
pub struct RttEstimator {
    /// Most recent sample.
    latest: Duration,
    /// Smallest sample observed on the current path.
    min: Duration,
    /// Smoothed RTT, `None` until the first sample.
    smoothed: Option<Duration>,
    /// RTT variance.
    rttvar: Duration,
}

impl RttEstimator {
    pub fn new() -> Self {
        Self {
            latest: INITIAL_RTT,
            min: INITIAL_RTT,
            smoothed: None,
            rttvar: INITIAL_RTT / 2,
        }
    }

    /// Update the estimator with a new sample and the ack delay the peer
    /// reported for it.
    pub fn update(&mut self, sample: Duration, ack_delay: Duration) {
        self.latest = sample;
        match self.smoothed {
            None => {
                // First sample: smoothed = sample, rttvar = sample / 2.
                self.min = sample;
                self.smoothed = Some(sample);
                self.rttvar = sample / 2;
            }
            Some(smoothed) => {
                self.min = self.min.min(sample);
                // RFC 9002 section 5.3: only subtract the ack delay while
                // the result stays at or above min_rtt.
                let adjusted = if sample >= self.min + ack_delay {
                    sample - ack_delay
                } else {
                    sample
                };
                let diff = if smoothed > adjusted {
                    smoothed - adjusted
                } else {
                    adjusted - smoothed
                };
                self.rttvar = (self.rttvar * 3 + diff) / 4;
                self.smoothed = Some((smoothed * 7 + adjusted) / 8);
            }
        }
    }

    /// Smoothed RTT; the RFC 9002 initial value until a sample arrives.
    pub fn smoothed(&self) -> Duration {
        self.smoothed.unwrap_or(INITIAL_RTT)
    }

    /// Most recent sample.
    pub fn latest(&self) -> Duration {
        self.latest
    }

    /// Smallest sample observed.
    pub fn min(&self) -> Duration {
        self.min
    }

    /// Probe timeout interval: smoothed + max(4 * rttvar, granularity).
    pub fn pto(&self) -> Duration {
        self.smoothed() + std::cmp::max(self.rttvar * 4, GRANULARITY)
    }
}

impl Default for RttEstimator {
    fn default() -> Self {
        Self::new()
    }
}
