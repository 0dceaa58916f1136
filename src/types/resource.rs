//! Durable representation of a claimable resource

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Inventory record for one claimable resource.
///
/// `name` and `capacity` are immutable after creation; `remaining` is
/// mutated only by the claim protocol and always satisfies
/// `0 <= remaining <= capacity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    pub capacity: u64,
    pub remaining: u64,
    pub created_at: DateTime<Utc>,
}

impl Resource {
    /// Create a fresh record with full remaining stock.
    pub fn new(name: impl Into<String>, capacity: u64) -> Self {
        Self {
            name: name.into(),
            capacity,
            remaining: capacity,
            created_at: Utc::now(),
        }
    }

    /// Units successfully claimed so far.
    pub fn claimed(&self) -> u64 {
        self.capacity - self.remaining
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}

/// Read-path view of a resource and its claimants, in commit order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDetails {
    pub name: String,
    pub capacity: u64,
    pub remaining: u64,
    pub claimants: Vec<String>,
}
