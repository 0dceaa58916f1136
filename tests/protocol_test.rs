//! Behavioral tests for the claim protocol and query service
//!
//! Every scenario runs against both store adapters, and the core
//! invariant (`remaining == capacity - ledger length`) is checked
//! directly against storage, not only through the query API.

use claim_engine::{
    ClaimEngine, ClaimOutcome, ClaimStore, DurableStore, Error, MemoryStore, StoreConfig,
};
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn deadline() -> Instant {
    Instant::now() + Duration::from_secs(5)
}

fn memory_engine() -> ClaimEngine<MemoryStore> {
    ClaimEngine::new(MemoryStore::new())
}

fn durable_engine(dir: &TempDir) -> ClaimEngine<DurableStore> {
    let config = StoreConfig::new(dir.path().to_path_buf())
        .with_persist_mode(fjall::PersistMode::SyncData);
    ClaimEngine::new(DurableStore::open(config).unwrap())
}

/// remaining == capacity - count(claims), read straight from the store.
fn assert_storage_invariant<S: ClaimStore>(engine: &ClaimEngine<S>, resource: &str) {
    let record = engine.store().read_resource(resource).unwrap().unwrap();
    let ledger = engine.store().read_claimants(resource).unwrap();

    assert!(record.remaining <= record.capacity);
    assert_eq!(record.remaining, record.capacity - ledger.len() as u64);
}

fn check_creation(engine: &ClaimEngine<impl ClaimStore>) {
    engine.create_resource("spring", 3).unwrap();

    let details = engine.details("spring").unwrap();
    assert_eq!(details.name, "spring");
    assert_eq!(details.capacity, 3);
    assert_eq!(details.remaining, 3);
    assert!(details.claimants.is_empty());

    assert_eq!(
        engine.create_resource("spring", 7),
        Err(Error::ResourceExists("spring".to_string()))
    );
    // The collision left the original untouched
    assert_eq!(engine.resource("spring").unwrap().capacity, 3);

    assert_eq!(
        engine.details("autumn"),
        Err(Error::ResourceNotFound("autumn".to_string()))
    );
}

#[test]
fn test_creation_memory() {
    check_creation(&memory_engine());
}

#[test]
fn test_creation_durable() {
    let dir = TempDir::new().unwrap();
    check_creation(&durable_engine(&dir));
}

fn check_claim_outcomes(engine: &ClaimEngine<impl ClaimStore>) {
    engine.create_resource("summer", 2).unwrap();

    assert_eq!(
        engine.claim("summer", "u1", deadline()).unwrap(),
        ClaimOutcome::Success
    );

    // Re-issuing a successful pair is stable while stock remains
    assert_eq!(
        engine.claim("summer", "u1", deadline()).unwrap(),
        ClaimOutcome::AlreadyClaimed
    );
    assert_eq!(engine.resource("summer").unwrap().remaining, 1);

    assert_eq!(
        engine.claim("summer", "u2", deadline()).unwrap(),
        ClaimOutcome::Success
    );
    assert_eq!(
        engine.claim("summer", "u3", deadline()).unwrap(),
        ClaimOutcome::Exhausted
    );

    assert_storage_invariant(engine, "summer");
}

#[test]
fn test_claim_outcomes_memory() {
    check_claim_outcomes(&memory_engine());
}

#[test]
fn test_claim_outcomes_durable() {
    let dir = TempDir::new().unwrap();
    check_claim_outcomes(&durable_engine(&dir));
}

fn check_unknown_resource(engine: &ClaimEngine<impl ClaimStore>) {
    assert_eq!(
        engine.claim("nonexistent", "u1", deadline()).unwrap(),
        ClaimOutcome::NotFound
    );

    // Nothing was created or recorded
    assert!(engine.store().read_resource("nonexistent").unwrap().is_none());
    assert!(engine.store().read_claimants("nonexistent").unwrap().is_empty());
}

#[test]
fn test_unknown_resource_memory() {
    check_unknown_resource(&memory_engine());
}

#[test]
fn test_unknown_resource_durable() {
    let dir = TempDir::new().unwrap();
    check_unknown_resource(&durable_engine(&dir));
}

fn check_capacity_one_boundary(engine: &ClaimEngine<impl ClaimStore>) {
    engine.create_resource("x", 1).unwrap();

    assert_eq!(
        engine.claim("x", "u1", deadline()).unwrap(),
        ClaimOutcome::Success
    );
    assert_eq!(engine.resource("x").unwrap().remaining, 0);

    assert_eq!(
        engine.claim("x", "u2", deadline()).unwrap(),
        ClaimOutcome::Exhausted
    );

    assert_storage_invariant(engine, "x");
}

#[test]
fn test_capacity_one_boundary_memory() {
    check_capacity_one_boundary(&memory_engine());
}

#[test]
fn test_capacity_one_boundary_durable() {
    let dir = TempDir::new().unwrap();
    check_capacity_one_boundary(&durable_engine(&dir));
}

fn check_prior_winner_after_exhaustion(engine: &ClaimEngine<impl ClaimStore>) {
    engine.create_resource("gone", 1).unwrap();

    assert_eq!(
        engine.claim("gone", "u1", deadline()).unwrap(),
        ClaimOutcome::Success
    );
    assert_eq!(engine.resource("gone").unwrap().remaining, 0);

    // The winner re-claiming an exhausted resource still sees its claim,
    // never a false Exhausted
    assert_eq!(
        engine.claim("gone", "u1", deadline()).unwrap(),
        ClaimOutcome::AlreadyClaimed
    );
    assert_eq!(
        engine.claim("gone", "u2", deadline()).unwrap(),
        ClaimOutcome::Exhausted
    );

    assert_storage_invariant(engine, "gone");
}

#[test]
fn test_prior_winner_after_exhaustion_memory() {
    check_prior_winner_after_exhaustion(&memory_engine());
}

#[test]
fn test_prior_winner_after_exhaustion_durable() {
    let dir = TempDir::new().unwrap();
    check_prior_winner_after_exhaustion(&durable_engine(&dir));
}

fn check_claimants_in_commit_order(engine: &ClaimEngine<impl ClaimStore>) {
    engine.create_resource("ordered", 5).unwrap();

    for claimant in ["u1", "u2", "u3", "u4"] {
        assert_eq!(
            engine.claim("ordered", claimant, deadline()).unwrap(),
            ClaimOutcome::Success
        );
    }

    assert_eq!(
        engine.claimants("ordered").unwrap(),
        vec!["u1", "u2", "u3", "u4"]
    );

    let details = engine.details("ordered").unwrap();
    assert_eq!(details.remaining, 1);
    assert_eq!(details.claimants.len(), 4);

    assert_eq!(
        engine.claimants("missing"),
        Err(Error::ResourceNotFound("missing".to_string()))
    );
}

#[test]
fn test_claimants_in_commit_order_memory() {
    check_claimants_in_commit_order(&memory_engine());
}

#[test]
fn test_claimants_in_commit_order_durable() {
    let dir = TempDir::new().unwrap();
    check_claimants_in_commit_order(&durable_engine(&dir));
}

#[test]
fn test_durable_state_survives_reopen() {
    let dir = TempDir::new().unwrap();

    {
        let engine = durable_engine(&dir);
        engine.create_resource("persist", 3).unwrap();
        engine.claim("persist", "u1", deadline()).unwrap();
        engine.claim("persist", "u2", deadline()).unwrap();
    }

    let engine = durable_engine(&dir);

    let details = engine.details("persist").unwrap();
    assert_eq!(details.capacity, 3);
    assert_eq!(details.remaining, 1);
    assert_eq!(details.claimants, vec!["u1", "u2"]);

    // Constraints still hold against the recovered state
    assert_eq!(
        engine.claim("persist", "u1", deadline()).unwrap(),
        ClaimOutcome::AlreadyClaimed
    );
    assert_eq!(
        engine.claim("persist", "u3", deadline()).unwrap(),
        ClaimOutcome::Success
    );
    assert_storage_invariant(&engine, "persist");
}
