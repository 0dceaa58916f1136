//! Composite key encoding for the durable store's claim partitions
//!
//! Key format: `{resource_len(4 BE)}{resource}{suffix}`. The length prefix
//! keeps resources with common name prefixes from colliding under prefix
//! scans; big-endian fixed-width suffixes make lexicographic key order
//! match logical order.

/// Prefix covering every claim key of one resource.
pub fn claim_prefix(resource: &str) -> Vec<u8> {
    let name = resource.as_bytes();
    let mut key = Vec::with_capacity(4 + name.len());
    key.extend_from_slice(&(name.len() as u32).to_be_bytes());
    key.extend_from_slice(name);
    key
}

/// Uniqueness key for the `(resource, claimant)` pair.
pub fn claim_pair_key(resource: &str, claimant: &str) -> Vec<u8> {
    let mut key = claim_prefix(resource);
    key.extend_from_slice(claimant.as_bytes());
    key
}

/// Commit-order key: claims scan back in sequence order per resource.
pub fn claim_seq_key(resource: &str, seq: u64) -> Vec<u8> {
    let mut key = claim_prefix(resource);
    key.extend_from_slice(&seq.to_be_bytes());
    key
}
