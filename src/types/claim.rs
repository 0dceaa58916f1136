//! Claim ledger entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A write-once record that a claimant acquired one unit of a resource.
///
/// The pair `(claimant_id, resource_name)` is unique across the whole
/// ledger; entries are never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub claimant_id: String,
    pub resource_name: String,
    pub claimed_at: DateTime<Utc>,
}

impl Claim {
    pub fn new(
        claimant_id: impl Into<String>,
        resource_name: impl Into<String>,
        claimed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            claimant_id: claimant_id.into(),
            resource_name: resource_name.into(),
            claimed_at,
        }
    }
}
