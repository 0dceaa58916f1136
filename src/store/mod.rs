//! Storage layer: the store-agnostic claim contract and its adapters
//!
//! The claim protocol is written once against the [`ClaimStore`] /
//! [`ClaimTransaction`] capability pair; each adapter supplies the
//! serialization point (exclusive row locking or commit-validated
//! conditional updates) that keeps concurrent claims correct.

mod durable;
mod keys;
mod lock;
mod memory;

pub use durable::DurableStore;
pub use lock::{ResourceLockGuard, ResourceLockManager};
pub use memory::MemoryStore;

use crate::error::Result;
use crate::types::Resource;
use chrono::{DateTime, Utc};
use std::time::Instant;

/// How a store serializes conflicting claims on one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Serialization {
    /// Exclusive per-resource lock held for the whole transaction.
    /// Claimants of the same resource block each other; claimants of
    /// different resources never do.
    ResourceLock,
    /// Writes are staged and their conditions re-validated atomically at
    /// commit; an invalidated condition surfaces as a retryable
    /// serialization conflict.
    ConditionalUpdate,
}

/// Result of an insert guarded by a uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueInsert {
    Inserted,
    Duplicate,
}

/// Result of the guarded decrement (`remaining > 0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionalUpdate {
    Applied,
    /// Zero rows matched: the resource is exhausted or absent. The caller
    /// must re-read to disambiguate.
    Unmatched,
}

/// Transactional store capable of backing the claim protocol.
///
/// Requires enforceable uniqueness on `Resource.name` and on the
/// `(claimant_id, resource_name)` pair, plus commit/rollback semantics
/// for the per-claim transaction.
pub trait ClaimStore: Send + Sync {
    type Txn<'a>: ClaimTransaction
    where
        Self: 'a;

    /// The serialization discipline this adapter implements.
    fn serialization(&self) -> Serialization;

    /// Open a claim transaction scoped to a single resource.
    ///
    /// Rolling back is dropping the transaction; no durable state may
    /// change before `commit`.
    fn begin(&self, resource: &str, deadline: Instant) -> Result<Self::Txn<'_>>;

    /// Insert a resource record, enforcing name uniqueness. Durable on
    /// `Ok(Inserted)`; no partial state otherwise.
    fn insert_resource(&self, resource: Resource) -> Result<UniqueInsert>;

    /// Read-committed view of a resource record.
    fn read_resource(&self, name: &str) -> Result<Option<Resource>>;

    /// Claimant ids for a resource in commit order of successful claims.
    /// Empty when the resource exists but has no claims, or is unknown.
    fn read_claimants(&self, name: &str) -> Result<Vec<String>>;
}

/// One claim's transaction: the capability set the protocol drives.
pub trait ClaimTransaction {
    /// Current record of the transaction's resource. Under resource
    /// locking this read is stable for the transaction's lifetime.
    fn resource(&mut self) -> Result<Option<Resource>>;

    /// Stage the ledger insert, enforcing pair uniqueness.
    fn insert_claim(
        &mut self,
        claimant: &str,
        claimed_at: DateTime<Utc>,
    ) -> Result<UniqueInsert>;

    /// Stage the decrement of `remaining`, guarded by `remaining > 0`.
    fn decrement_remaining(&mut self) -> Result<ConditionalUpdate>;

    /// Atomically commit the staged ledger insert and decrement.
    fn commit(self) -> Result<()>;
}
