//! Received-CID set scenario tests: registration, retirement, migration.

use tresspath::{
    ConnectionId, RemoteCidSet, StatelessResetToken, TransportErrorCode, TressPathError,
    LOCAL_ACTIVE_CID_LIMIT,
};

fn random_cid() -> ConnectionId {
    let bytes: [u8; 8] = rand::random();
    ConnectionId::from_slice(&bytes).unwrap()
}

fn random_token() -> StatelessResetToken {
    StatelessResetToken::from(rand::random::<[u8; 16]>())
}

#[test]
fn grant_retire_regrant_cycle() {
    let mut set = RemoteCidSet::new();
    let (cid, token) = (random_cid(), random_token());

    set.register(3, cid, token).unwrap();
    assert!(set.is_active(3));

    set.unregister(3).unwrap();
    assert!(!set.is_active(3));

    // Same grant again: the reserved slot remembers the retirement.
    set.register(3, cid, token).unwrap();
    assert!(!set.is_active(3), "retired sequence was re-accepted");
}

#[test]
fn duplicate_frames_are_idempotent() {
    let mut set = RemoteCidSet::new();
    let (cid, token) = (random_cid(), random_token());

    for _ in 0..5 {
        set.register(2, cid, token).unwrap();
    }
    assert_eq!(set.active_count(), 1);
}

#[test]
fn violations_carry_wire_codes() {
    let mut set = RemoteCidSet::new();
    let (cid, token) = (random_cid(), random_token());
    set.register(1, cid, token).unwrap();

    // Equivocation on a known sequence.
    let err = set.register(1, random_cid(), token).unwrap_err();
    assert_eq!(
        err.transport_code(),
        Some(TransportErrorCode::ProtocolViolation)
    );
    assert_eq!(err.transport_code().unwrap().code(), 0x0a);

    // Over-issuing far past the expected range.
    let err = set.register(1000, random_cid(), random_token()).unwrap_err();
    assert_eq!(
        err.transport_code(),
        Some(TransportErrorCode::ConnectionIdLimit)
    );
    assert_eq!(err.transport_code().unwrap().code(), 0x09);

    // The failed registrations left no trace.
    assert_eq!(set.active_count(), 1);
}

#[test]
fn retire_unknown_is_for_the_caller_to_judge() {
    let mut set = RemoteCidSet::new();
    let err = set.unregister(4).unwrap_err();
    assert_eq!(err, TressPathError::RetireUnknownSequence(4));
    assert_eq!(err.transport_code(), None);
}

#[test]
fn migration_retires_old_grants_in_bulk() {
    let mut set = RemoteCidSet::new();
    for seq in [1u64, 2, 3, 6, 7] {
        set.register(seq, random_cid(), random_token()).unwrap();
    }

    // Move to sequence 6; everything below 5 must go.
    let retired = set.unregister_prior_to(5);
    assert_eq!(retired, vec![1, 2, 3]);
    assert_eq!(retired.len(), 3);
    assert_eq!(set.active_count(), 2);
    assert!(set.is_active(6));
    assert!(set.is_active(7));

    // Their reset tokens must stop being honored: a replayed grant for a
    // retired sequence stays dead.
    set.register(2, random_cid(), random_token()).unwrap();
    assert!(!set.is_active(2));
}

#[test]
fn promotion_after_current_cid_retires() {
    let mut set = RemoteCidSet::new();
    let first = random_cid();
    set.register(0, first, random_token()).unwrap();
    set.register(1, random_cid(), random_token()).unwrap();
    set.register(2, random_cid(), random_token()).unwrap();
    assert_eq!(set.current().unwrap().cid(), &first);

    set.unregister(0).unwrap();
    assert!(set.current().is_none());

    assert!(set.promote());
    let current = set.current().unwrap();
    assert_eq!(current.sequence(), 1);
    assert!(current.is_active());
}

#[test]
fn full_lifetime_churn_stays_bounded() {
    let mut set = RemoteCidSet::new();
    let limit = LOCAL_ACTIVE_CID_LIMIT as u64;

    // The peer rotates CIDs for a long time: grant the next batch, retire
    // the old one, repeatedly.
    let mut next_seq = 0u64;
    for round in 0..100u64 {
        while next_seq <= set.largest_sequence_expected()
            && set.active_count() < LOCAL_ACTIVE_CID_LIMIT
        {
            set.register(next_seq, random_cid(), random_token()).unwrap();
            next_seq += 1;
        }
        let retired = set.unregister_prior_to(round * limit / 2);
        assert!(retired.len() <= LOCAL_ACTIVE_CID_LIMIT);
        assert!(set.active_count() <= LOCAL_ACTIVE_CID_LIMIT);
    }

    // Sequences from long-finished rounds are stale, not errors.
    set.register(0, random_cid(), random_token()).unwrap();
    assert!(!set.is_active(0));
}
