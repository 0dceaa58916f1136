//! In-memory store with optimistic conditional updates
//!
//! Transactions stage their ledger insert and decrement without taking any
//! per-resource lock, then re-validate both conditions against current
//! committed state at commit, under the state's write lock. A condition
//! invalidated by a concurrent commit surfaces as a serialization
//! conflict, and the protocol re-runs the whole transaction.

use crate::error::{Error, Result};
use crate::store::{ClaimStore, ClaimTransaction, ConditionalUpdate, Serialization, UniqueInsert};
use crate::types::{Claim, Resource};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

#[derive(Default)]
struct MemoryState {
    /// Resource records by name
    resources: HashMap<String, Resource>,

    /// Committed claims per resource, in commit order
    claims: HashMap<String, Vec<Claim>>,

    /// Uniqueness index over (resource_name, claimant_id)
    claim_index: HashSet<(String, String)>,
}

/// In-memory claim store (strategy: conditional update).
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClaimStore for MemoryStore {
    type Txn<'a>
        = MemoryTxn
    where
        Self: 'a;

    fn serialization(&self) -> Serialization {
        Serialization::ConditionalUpdate
    }

    fn begin(&self, resource: &str, deadline: Instant) -> Result<MemoryTxn> {
        Ok(MemoryTxn {
            state: self.state.clone(),
            resource: resource.to_string(),
            deadline,
            staged_claim: None,
            decremented: false,
        })
    }

    fn insert_resource(&self, resource: Resource) -> Result<UniqueInsert> {
        let mut state = self.state.write();

        if state.resources.contains_key(&resource.name) {
            return Ok(UniqueInsert::Duplicate);
        }

        state.resources.insert(resource.name.clone(), resource);
        Ok(UniqueInsert::Inserted)
    }

    fn read_resource(&self, name: &str) -> Result<Option<Resource>> {
        Ok(self.state.read().resources.get(name).cloned())
    }

    fn read_claimants(&self, name: &str) -> Result<Vec<String>> {
        let state = self.state.read();
        Ok(state
            .claims
            .get(name)
            .map(|claims| claims.iter().map(|c| c.claimant_id.clone()).collect())
            .unwrap_or_default())
    }
}

/// Optimistic claim transaction: stages writes, validates at commit.
pub struct MemoryTxn {
    state: Arc<RwLock<MemoryState>>,
    resource: String,
    deadline: Instant,
    staged_claim: Option<Claim>,
    decremented: bool,
}

impl ClaimTransaction for MemoryTxn {
    fn resource(&mut self) -> Result<Option<Resource>> {
        Ok(self.state.read().resources.get(&self.resource).cloned())
    }

    fn insert_claim(
        &mut self,
        claimant: &str,
        claimed_at: DateTime<Utc>,
    ) -> Result<UniqueInsert> {
        let pair = (self.resource.clone(), claimant.to_string());
        if self.state.read().claim_index.contains(&pair) {
            return Ok(UniqueInsert::Duplicate);
        }

        self.staged_claim = Some(Claim::new(claimant, self.resource.clone(), claimed_at));
        Ok(UniqueInsert::Inserted)
    }

    fn decrement_remaining(&mut self) -> Result<ConditionalUpdate> {
        match self.state.read().resources.get(&self.resource) {
            Some(record) if record.remaining > 0 => {
                self.decremented = true;
                Ok(ConditionalUpdate::Applied)
            }
            _ => Ok(ConditionalUpdate::Unmatched),
        }
    }

    fn commit(self) -> Result<()> {
        if Instant::now() > self.deadline {
            return Err(Error::DeadlineExceeded);
        }

        let Some(claim) = self.staged_claim else {
            return Err(Error::Storage(
                "commit without a staged claim".to_string(),
            ));
        };
        if !self.decremented {
            return Err(Error::Storage(
                "commit without a staged decrement".to_string(),
            ));
        }

        let mut state = self.state.write();

        // Re-validate both conditions against current committed state: a
        // concurrent commit may have claimed the pair or the last unit
        // since this transaction staged its writes
        let pair = (claim.resource_name.clone(), claim.claimant_id.clone());
        if state.claim_index.contains(&pair) {
            return Err(Error::SerializationConflict);
        }
        match state.resources.get(&self.resource) {
            Some(record) if record.remaining > 0 => {}
            _ => return Err(Error::SerializationConflict),
        }

        let record = state
            .resources
            .get_mut(&self.resource)
            .expect("validated above");
        record.remaining -= 1;

        state
            .claims
            .entry(claim.resource_name.clone())
            .or_default()
            .push(claim);
        state.claim_index.insert(pair);

        Ok(())
    }
}
