//! Test fixtures: deterministic header chains and forks.
//!
//! Public so that downstream crates can drive the mock execution client and
//! the fetcher in their own tests.

use shared_types::{Hash, Header};

/// Deterministic block hash for a `(branch, number)` pair.
pub fn test_hash(branch: u8, number: u64) -> Hash {
    let mut hash = [0u8; 32];
    hash[0] = branch;
    hash[8..16].copy_from_slice(&number.to_be_bytes());
    hash
}

/// A contiguous header chain on branch `branch`, starting at block `start`.
///
/// Timestamps advance by five seconds per block from a fixed origin, so the
/// chains line up with the slot-timing fixtures used across the workspace.
pub fn header_chain(branch: u8, start: u64, len: usize) -> Vec<Header> {
    (0..len as u64)
        .map(|i| {
            let number = start + i;
            Header {
                hash: test_hash(branch, number),
                parent_hash: if number == 0 {
                    [0u8; 32]
                } else {
                    test_hash(branch, number - 1)
                },
                number,
                timestamp: 1000 + number * 5,
            }
        })
        .collect()
}

/// A fork of `len` blocks on branch `branch` whose first block is a child of
/// `parent`.
pub fn fork_chain(parent: &Header, branch: u8, len: usize) -> Vec<Header> {
    let mut headers = header_chain(branch, parent.number + 1, len);
    if let Some(first) = headers.first_mut() {
        first.parent_hash = parent.hash;
    }
    headers
}
