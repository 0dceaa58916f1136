//! Type definitions for the claim engine

mod claim;
mod outcome;
mod resource;

pub use claim::Claim;
pub use outcome::ClaimOutcome;
pub use resource::{Resource, ResourceDetails};
