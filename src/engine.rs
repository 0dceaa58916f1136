//! Claim transaction protocol and query service
//!
//! `ClaimEngine` carries the single copy of the claim business logic and
//! drives whichever serialization discipline its store declares. All
//! conflict resolution is delegated to the store; the engine keeps no
//! state of its own between calls.

use crate::error::{Error, Result};
use crate::store::{ClaimStore, ClaimTransaction, ConditionalUpdate, Serialization, UniqueInsert};
use crate::types::{ClaimOutcome, Resource, ResourceDetails};
use chrono::Utc;
use std::time::Instant;

/// Engine for creating, claiming, and inspecting resources.
pub struct ClaimEngine<S: ClaimStore> {
    store: S,
}

impl<S: ClaimStore> ClaimEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Access the backing store (read-committed inspection).
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create a resource with `remaining = capacity`.
    ///
    /// Fails with `ResourceExists` on a name collision; no partial state
    /// on any failure.
    pub fn create_resource(&self, name: &str, capacity: u64) -> Result<()> {
        if name.is_empty() {
            return Err(Error::EmptyResourceName);
        }
        if capacity == 0 {
            return Err(Error::ZeroCapacity);
        }

        match self.store.insert_resource(Resource::new(name, capacity))? {
            UniqueInsert::Inserted => {
                tracing::info!(resource = name, capacity, "resource created");
                Ok(())
            }
            UniqueInsert::Duplicate => Err(Error::ResourceExists(name.to_string())),
        }
    }

    /// Attempt to claim one unit of a resource for a claimant.
    ///
    /// The entire check-decrement-record sequence commits atomically or
    /// not at all; the call is bounded by `deadline`, and deadline expiry
    /// rolls back and reports a transient error, never a false outcome.
    pub fn claim(
        &self,
        resource_name: &str,
        claimant_id: &str,
        deadline: Instant,
    ) -> Result<ClaimOutcome> {
        if resource_name.is_empty() {
            return Err(Error::EmptyResourceName);
        }
        if claimant_id.is_empty() {
            return Err(Error::EmptyClaimantId);
        }

        let result = match self.store.serialization() {
            Serialization::ResourceLock => self.claim_locked(resource_name, claimant_id, deadline),
            Serialization::ConditionalUpdate => {
                self.claim_conditional(resource_name, claimant_id, deadline)
            }
        };

        match &result {
            Ok(outcome) => {
                tracing::debug!(
                    resource = resource_name,
                    claimant = claimant_id,
                    outcome = %outcome,
                    "claim resolved"
                );
            }
            Err(e) if e.is_transient() => {
                tracing::warn!(
                    resource = resource_name,
                    claimant = claimant_id,
                    error = %e,
                    "claim failed transiently"
                );
            }
            Err(_) => {}
        }

        result
    }

    /// Pessimistic sequence: lock the row, insert, check stock, decrement.
    fn claim_locked(
        &self,
        resource_name: &str,
        claimant_id: &str,
        deadline: Instant,
    ) -> Result<ClaimOutcome> {
        let mut txn = self.store.begin(resource_name, deadline)?;

        let Some(record) = txn.resource()? else {
            return Ok(ClaimOutcome::NotFound);
        };
        // Duplicate check precedes the stock check: a prior winner is told
        // AlreadyClaimed even once the resource is exhausted
        if txn.insert_claim(claimant_id, Utc::now())? == UniqueInsert::Duplicate {
            return Ok(ClaimOutcome::AlreadyClaimed);
        }
        if record.is_exhausted() {
            return Ok(ClaimOutcome::Exhausted);
        }

        match txn.decrement_remaining()? {
            ConditionalUpdate::Applied => {
                txn.commit()?;
                Ok(ClaimOutcome::Success)
            }
            // Unreachable under the row lock; kept total for the contract
            ConditionalUpdate::Unmatched => Ok(ClaimOutcome::Exhausted),
        }
    }

    /// Optimistic sequence, re-run from scratch on serialization conflicts
    /// while the deadline allows. Partial state is never resumed.
    fn claim_conditional(
        &self,
        resource_name: &str,
        claimant_id: &str,
        deadline: Instant,
    ) -> Result<ClaimOutcome> {
        loop {
            match self.try_claim_conditional(resource_name, claimant_id, deadline) {
                Err(Error::SerializationConflict) if Instant::now() < deadline => continue,
                result => return result,
            }
        }
    }

    fn try_claim_conditional(
        &self,
        resource_name: &str,
        claimant_id: &str,
        deadline: Instant,
    ) -> Result<ClaimOutcome> {
        let mut txn = self.store.begin(resource_name, deadline)?;

        if txn.insert_claim(claimant_id, Utc::now())? == UniqueInsert::Duplicate {
            return Ok(ClaimOutcome::AlreadyClaimed);
        }

        match txn.decrement_remaining()? {
            ConditionalUpdate::Applied => {
                txn.commit()?;
                Ok(ClaimOutcome::Success)
            }
            ConditionalUpdate::Unmatched => {
                // A vanished resource and exhausted stock both match zero
                // rows; re-read to tell them apart
                if txn.resource()?.is_some() {
                    Ok(ClaimOutcome::Exhausted)
                } else {
                    Ok(ClaimOutcome::NotFound)
                }
            }
        }
    }

    /// Current record of a resource.
    pub fn resource(&self, name: &str) -> Result<Resource> {
        self.store
            .read_resource(name)?
            .ok_or_else(|| Error::ResourceNotFound(name.to_string()))
    }

    /// Capacity, remaining stock, and claimants in commit order.
    ///
    /// Read-committed: may trail in-flight claims, which is acceptable
    /// for this diagnostic path.
    pub fn details(&self, name: &str) -> Result<ResourceDetails> {
        let record = self.resource(name)?;
        let claimants = self.store.read_claimants(name)?;

        Ok(ResourceDetails {
            name: record.name,
            capacity: record.capacity,
            remaining: record.remaining,
            claimants,
        })
    }

    /// Claimants of a resource in commit order of successful claims.
    pub fn claimants(&self, name: &str) -> Result<Vec<String>> {
        // Existence check keeps read-path semantics aligned with details()
        self.resource(name)?;
        self.store.read_claimants(name)
    }
}
