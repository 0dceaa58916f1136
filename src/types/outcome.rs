//! Claim attempt outcomes

use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of results a claim attempt can produce.
///
/// All four are definite business outcomes: re-issuing the identical
/// call reproduces the same outcome (transient storage failures are
/// reported as errors, not outcomes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimOutcome {
    /// The decrement and the ledger insert committed together
    Success,
    /// The referenced resource does not exist
    NotFound,
    /// This claimant already holds a claim on this resource
    AlreadyClaimed,
    /// No remaining stock
    Exhausted,
}

impl fmt::Display for ClaimOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClaimOutcome::Success => write!(f, "success"),
            ClaimOutcome::NotFound => write!(f, "not_found"),
            ClaimOutcome::AlreadyClaimed => write!(f, "already_claimed"),
            ClaimOutcome::Exhausted => write!(f, "exhausted"),
        }
    }
}
