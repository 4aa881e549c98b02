//! TressPath: congestion control and connection-ID lifecycle for the Tress
//! Protocol's QUIC transport.
//!
//! Two independent cores, each owned by a single connection and driven
//! synchronously from its processing loop:
//!
//! - [`congestion::CongestionController`] -- the congestion-window state
//!   machine, with Reno-Modified (0.7 backoff) and CUBIC (RFC 8312)
//!   selectable at construction time.
//! - [`remote_cid::RemoteCidSet`] -- the fixed-capacity table of connection
//!   IDs granted by the peer, with duplicate/stale/conflict detection and
//!   bulk retirement.
//!
//! Packet parsing, TLS, loss detection, and socket I/O live elsewhere in
//! the stack; this crate only consumes their outputs (byte counts, packet
//! numbers, RTT estimates, decoded frame fields) and never samples a clock
//! itself.

pub mod cid;
pub mod congestion;
pub mod error;
pub mod loss;
pub mod remote_cid;
pub mod rtt;

pub use cid::{ConnectionId, StatelessResetToken};
pub use congestion::{calc_initial_cwnd, Algorithm, CcConfig, CongestionController};
pub use error::{Result, TransportErrorCode, TressPathError};
pub use loss::LossState;
pub use remote_cid::{RemoteCid, RemoteCidSet, LOCAL_ACTIVE_CID_LIMIT};
pub use rtt::RttEstimator;
