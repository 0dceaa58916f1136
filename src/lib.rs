//! A claim engine for finite, named resources
//!
//! This crate lets many independent callers race to claim units of a named
//! resource without ever over-claiming or double-claiming:
//! - Total successful claims never exceed the configured capacity
//! - A claimant succeeds at most once per resource
//! - Results stay consistent under thousands of concurrent attempts
//!
//! Correctness comes entirely from the store's serialization point, never
//! from shared mutable state between calls. Two store adapters implement
//! the same capability contract with different disciplines:
//! - [`DurableStore`]: fjall-backed, exclusive per-resource locking,
//!   atomic batch commits
//! - [`MemoryStore`]: in-process, conditional updates validated at commit

pub mod config;
pub mod engine;
pub mod error;
pub mod store;
pub mod types;

pub use config::StoreConfig;
pub use engine::ClaimEngine;
pub use error::{Error, Result};
pub use store::{ClaimStore, ClaimTransaction, DurableStore, MemoryStore, Serialization};
pub use types::{Claim, ClaimOutcome, Resource, ResourceDetails};
