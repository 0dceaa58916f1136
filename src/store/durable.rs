//! Fjall-backed store with pessimistic per-resource locking
//!
//! One claim transaction holds the exclusive lock on its resource row for
//! the whole check-decrement-record sequence, so conflicting claims
//! serialize on the lock and the staged writes land in a single atomic
//! batch. The read path scans committed partitions without locking.
//!
//! Partitions:
//! - `resources`: name -> resource record (name uniqueness)
//! - `claims`: (resource, claimant) -> claim record (pair uniqueness)
//! - `claim_log`: (resource, seq) -> claimant id (commit order)

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::store::keys;
use crate::store::lock::{ResourceLockGuard, ResourceLockManager};
use crate::store::{ClaimStore, ClaimTransaction, ConditionalUpdate, Serialization, UniqueInsert};
use crate::types::{Claim, Resource};
use chrono::{DateTime, Utc};
use fjall::{Keyspace, Partition, PartitionCreateOptions};
use std::time::Instant;

/// Durable claim store (strategy: exclusive resource locking).
pub struct DurableStore {
    keyspace: Keyspace,
    resources: Partition,
    claims: Partition,
    claim_log: Partition,
    locks: ResourceLockManager,
    config: StoreConfig,
}

impl DurableStore {
    /// Open (or create) a store at the configured data directory.
    ///
    /// Reopening an existing directory recovers all committed state.
    pub fn open(config: StoreConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;

        let keyspace = fjall::Config::new(&config.data_dir)
            .cache_size(config.block_cache_size)
            .open()?;

        let resources = keyspace.open_partition(
            "resources",
            PartitionCreateOptions::default()
                .block_size(16 * 1024)
                .compression(config.compression),
        )?;

        let claims = keyspace.open_partition(
            "claims",
            PartitionCreateOptions::default()
                .block_size(32 * 1024)
                .compression(config.compression),
        )?;

        let claim_log = keyspace.open_partition(
            "claim_log",
            PartitionCreateOptions::default()
                .block_size(32 * 1024)
                .compression(config.compression),
        )?;

        Ok(Self {
            keyspace,
            resources,
            claims,
            claim_log,
            locks: ResourceLockManager::new(),
            config,
        })
    }

    fn decode_resource(bytes: &[u8]) -> Result<Resource> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl ClaimStore for DurableStore {
    type Txn<'a>
        = DurableTxn<'a>
    where
        Self: 'a;

    fn serialization(&self) -> Serialization {
        Serialization::ResourceLock
    }

    fn begin(&self, resource: &str, deadline: Instant) -> Result<DurableTxn<'_>> {
        let guard = self.locks.acquire(resource, deadline)?;

        Ok(DurableTxn {
            store: self,
            resource: resource.to_string(),
            deadline,
            staged_claim: None,
            decremented: false,
            _guard: guard,
        })
    }

    fn insert_resource(&self, resource: Resource) -> Result<UniqueInsert> {
        // Serialize racing creators of the same name on the row lock
        let deadline = Instant::now() + self.config.lock_timeout;
        let _guard = self.locks.acquire(&resource.name, deadline)?;

        if self.resources.get(resource.name.as_bytes())?.is_some() {
            return Ok(UniqueInsert::Duplicate);
        }

        self.resources
            .insert(resource.name.as_bytes(), serde_json::to_vec(&resource)?)?;
        self.keyspace.persist(self.config.persist_mode)?;

        Ok(UniqueInsert::Inserted)
    }

    fn read_resource(&self, name: &str) -> Result<Option<Resource>> {
        match self.resources.get(name.as_bytes())? {
            Some(bytes) => Ok(Some(Self::decode_resource(&bytes)?)),
            None => Ok(None),
        }
    }

    fn read_claimants(&self, name: &str) -> Result<Vec<String>> {
        let mut claimants = Vec::new();

        // Sequence keys are big-endian, so the scan yields commit order
        for entry in self.claim_log.prefix(keys::claim_prefix(name)) {
            let (_key, value) = entry?;
            let claimant = String::from_utf8(value.to_vec())
                .map_err(|e| Error::Encoding(e.to_string()))?;
            claimants.push(claimant);
        }

        Ok(claimants)
    }
}

/// Claim transaction holding the exclusive lock on its resource row.
///
/// Dropping the transaction without committing releases the lock and
/// leaves durable state untouched.
pub struct DurableTxn<'a> {
    store: &'a DurableStore,
    resource: String,
    deadline: Instant,
    staged_claim: Option<Claim>,
    decremented: bool,
    _guard: ResourceLockGuard<'a>,
}

impl ClaimTransaction for DurableTxn<'_> {
    fn resource(&mut self) -> Result<Option<Resource>> {
        // Stable under the exclusive lock: no other writer can touch
        // this row until the guard drops
        self.store.read_resource(&self.resource)
    }

    fn insert_claim(
        &mut self,
        claimant: &str,
        claimed_at: DateTime<Utc>,
    ) -> Result<UniqueInsert> {
        let key = keys::claim_pair_key(&self.resource, claimant);
        if self.store.claims.get(&key)?.is_some() {
            return Ok(UniqueInsert::Duplicate);
        }

        self.staged_claim = Some(Claim::new(claimant, self.resource.clone(), claimed_at));
        Ok(UniqueInsert::Inserted)
    }

    fn decrement_remaining(&mut self) -> Result<ConditionalUpdate> {
        match self.store.read_resource(&self.resource)? {
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

        let mut record = self
            .store
            .read_resource(&self.resource)?
            .ok_or_else(|| Error::Storage("resource row vanished mid-transaction".to_string()))?;
        record.remaining -= 1;

        // nth successful claim; strictly increasing under the row lock
        let seq = record.claimed();

        let mut batch = self.store.keyspace.batch();
        batch.insert(
            &self.store.resources,
            record.name.as_bytes(),
            serde_json::to_vec(&record)?,
        );
        batch.insert(
            &self.store.claims,
            keys::claim_pair_key(&self.resource, &claim.claimant_id),
            serde_json::to_vec(&claim)?,
        );
        batch.insert(
            &self.store.claim_log,
            keys::claim_seq_key(&self.resource, seq),
            claim.claimant_id.as_bytes(),
        );
        batch.commit()?;

        self.store.keyspace.persist(self.store.config.persist_mode)?;

        Ok(())
    }
}
