//! Connection IDs received from the peer.
//!
//! The peer grants CIDs through NEW_CONNECTION_ID frames; this module tracks
//! which grants are live, which sequence numbers are still anticipated, and
//! which have been retired. Slot 0 always holds the current CID used when
//! addressing outgoing packets.
//!
//! Retired slots are not erased. Each one is re-reserved for the next
//! sequence number the peer is expected to issue, so every slot always names
//! a distinct sequence and a frame about a sequence matching no slot is
//! recognized as stale instead of being re-accepted.

use crate::cid::{ConnectionId, StatelessResetToken};
use crate::error::{Result, TressPathError};

/// How many active CIDs we track: the active_connection_id_limit this stack
/// advertises in its transport parameters.
pub const LOCAL_ACTIVE_CID_LIMIT: usize = 8;

/// One tracked CID from the peer.
#[derive(Debug, Clone, Copy)]
pub struct RemoteCid {
    /// Live grant when true; reserved placeholder when false.
    is_active: bool,
    /// For an active slot, the grant's sequence number. For a reserved
    /// slot, a sequence number that is anticipated but not yet received.
    sequence: u64,
    cid: ConnectionId,
    reset_token: StatelessResetToken,
}

impl RemoteCid {
    fn reserved(sequence: u64) -> Self {
        Self {
            is_active: false,
            sequence,
            cid: ConnectionId::default(),
            reset_token: StatelessResetToken::default(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn cid(&self) -> &ConnectionId {
        &self.cid
    }

    pub fn reset_token(&self) -> &StatelessResetToken {
        &self.reset_token
    }
}

/// Fixed-capacity table of peer-granted connection IDs.
///
/// The table never grows: the slot count is the negotiated limit, and bulk
/// retirement frees slots in place.
#[derive(Debug, Clone)]
pub struct RemoteCidSet {
    /// `cids[0]` is the current CID for outgoing packets.
    cids: [RemoteCid; LOCAL_ACTIVE_CID_LIMIT],
    /// Highest sequence number the set is prepared to accept without
    /// treating the peer as over-issuing.
    largest_sequence_expected: u64,
}

impl RemoteCidSet {
    /// Empty set anticipating sequences `0..LOCAL_ACTIVE_CID_LIMIT`.
    pub fn new() -> Self {
        let mut cids = [RemoteCid::reserved(0); LOCAL_ACTIVE_CID_LIMIT];
        for (i, slot) in cids.iter_mut().enumerate() {
            slot.sequence = i as u64;
        }
        Self {
            cids,
            largest_sequence_expected: LOCAL_ACTIVE_CID_LIMIT as u64 - 1,
        }
    }

    /// Register a CID granted by a NEW_CONNECTION_ID frame.
    ///
    /// Retransmitted duplicates and frames about already-retired sequences
    /// succeed as no-ops. Genuine violations -- over-issuing past the
    /// negotiated limit, or contradicting an earlier grant -- come back as
    /// errors carrying the RFC 9000 transport code to close with.
    pub fn register(
        &mut self,
        sequence: u64,
        cid: ConnectionId,
        reset_token: StatelessResetToken,
    ) -> Result<()> {
        let limit = LOCAL_ACTIVE_CID_LIMIT as u64;
        if sequence > self.largest_sequence_expected + limit {
            return Err(TressPathError::CidLimitExceeded {
                sequence,
                largest_expected: self.largest_sequence_expected,
                limit,
            });
        }

        if let Some(i) = self.cids.iter().position(|c| c.sequence == sequence) {
            if self.cids[i].is_active {
                // Retransmitted NEW_CONNECTION_ID, or an equivocating peer.
                if self.cids[i].cid == cid && self.cids[i].reset_token == reset_token {
                    return Ok(());
                }
                return Err(TressPathError::CidConflict(sequence));
            }
            // The reserved slot waiting for exactly this sequence.
            self.cids[i] = RemoteCid {
                is_active: true,
                sequence,
                cid,
                reset_token,
            };
            return Ok(());
        }

        if sequence <= self.largest_sequence_expected {
            // No slot remembers this sequence: it was retired. Replayed or
            // badly delayed frame; drop it.
            return Ok(());
        }

        // Sequence beyond the anticipated range. Consume the youngest
        // reserved slot -- the oldest anticipations are the grants most
        // plausibly still in flight.
        let slot = self
            .cids
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_active)
            .max_by_key(|(_, c)| c.sequence)
            .map(|(i, _)| i);
        match slot {
            Some(i) => {
                self.cids[i] = RemoteCid {
                    is_active: true,
                    sequence,
                    cid,
                    reset_token,
                };
                self.largest_sequence_expected = sequence;
                Ok(())
            }
            // Every slot is live: the peer is over-issuing.
            None => Err(TressPathError::CidLimitExceeded {
                sequence,
                largest_expected: self.largest_sequence_expected,
                limit,
            }),
        }
    }

    /// Retire the CID registered under `sequence`.
    ///
    /// The vacated slot is re-reserved for the next sequence the peer is
    /// expected to issue. Fails when no active slot holds `sequence`; the
    /// caller decides whether that is a protocol violation or a duplicate
    /// RETIRE to ignore.
    pub fn unregister(&mut self, sequence: u64) -> Result<()> {
        match self
            .cids
            .iter_mut()
            .find(|c| c.is_active && c.sequence == sequence)
        {
            Some(slot) => {
                self.largest_sequence_expected += 1;
                *slot = RemoteCid::reserved(self.largest_sequence_expected);
                Ok(())
            }
            None => Err(TressPathError::RetireUnknownSequence(sequence)),
        }
    }

    /// Retire every active CID with a sequence below `threshold`, returning
    /// the retired sequence numbers for the caller to echo in
    /// RETIRE_CONNECTION_ID frames. Used when the connection moves to a new
    /// CID and older reset tokens must stop being honored.
    pub fn unregister_prior_to(&mut self, threshold: u64) -> Vec<u64> {
        let mut retired = Vec::new();
        for i in 0..LOCAL_ACTIVE_CID_LIMIT {
            if self.cids[i].is_active && self.cids[i].sequence < threshold {
                retired.push(self.cids[i].sequence);
                self.largest_sequence_expected += 1;
                self.cids[i] = RemoteCid::reserved(self.largest_sequence_expected);
            }
        }
        if !retired.is_empty() {
            tracing::debug!(
                count = retired.len(),
                threshold,
                "bulk-retired connection IDs"
            );
        }
        retired
    }

    /// Install a current CID when slot 0 holds none: the active slot with
    /// the lowest sequence number is promoted. Returns whether a current
    /// CID is available afterwards.
    pub fn promote(&mut self) -> bool {
        if self.cids[0].is_active {
            return true;
        }
        let candidate = self
            .cids
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, c)| c.is_active)
            .min_by_key(|(_, c)| c.sequence)
            .map(|(i, _)| i);
        match candidate {
            Some(i) => {
                self.cids.swap(0, i);
                true
            }
            None => false,
        }
    }

    /// The CID to address outgoing packets with, if one is installed.
    pub fn current(&self) -> Option<&RemoteCid> {
        if self.cids[0].is_active {
            Some(&self.cids[0])
        } else {
            None
        }
    }

    /// Number of live grants.
    pub fn active_count(&self) -> usize {
        self.cids.iter().filter(|c| c.is_active).count()
    }

    /// Whether `sequence` is currently registered.
    pub fn is_active(&self, sequence: u64) -> bool {
        self.cids
            .iter()
            .any(|c| c.is_active && c.sequence == sequence)
    }

    pub fn largest_sequence_expected(&self) -> u64 {
        self.largest_sequence_expected
    }
}

impl Default for RemoteCidSet {
    fn default() -> Self {
        Self::new()
    }
}
