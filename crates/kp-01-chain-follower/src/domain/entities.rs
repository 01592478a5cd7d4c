//! # Chain Segments
//!
//! A `ChainSegment` is a non-empty ordered run of headers where each header
//! is the parent of the next. All reorg topology is expressed as operations
//! on segments, so downstream handlers only ever see `(Remove, Append)`
//! pairs and stay reorg-oblivious.

use shared_types::{Hash, Header};

use super::errors::ChainFollowerError;

/// Cap on blocks fetched per extend-left step while closing gaps between
/// two chain segments.
pub const MAX_POLL_BLOCKS: u64 = 50;

/// Cap on blocks requested right of the synced chain in a single gap-fill
/// pass of the fetcher.
pub const MAX_REQUEST_BLOCK_RANGE: u64 = 1000;

/// A contiguous, never-empty run of block headers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainSegment {
    headers: Vec<Header>,
}

impl ChainSegment {
    /// Construct a segment from headers that must already be contiguous.
    pub fn new(headers: Vec<Header>) -> Result<Self, ChainFollowerError> {
        if headers.is_empty() {
            return Err(ChainFollowerError::EmptySegment);
        }
        for window in headers.windows(2) {
            if !window[0].is_parent_of(&window[1]) {
                return Err(ChainFollowerError::InvalidSegment(format!(
                    "broken parent link at block {}",
                    window[1].number
                )));
            }
        }
        Ok(Self { headers })
    }

    /// A segment holding a single header.
    pub fn single(header: Header) -> Self {
        Self {
            headers: vec![header],
        }
    }

    /// Number of headers in the segment.
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Always false: live segments are never empty.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// All headers, earliest first.
    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    /// The earliest (leftmost) header.
    pub fn earliest(&self) -> &Header {
        &self.headers[0]
    }

    /// The latest (rightmost) header.
    pub fn latest(&self) -> &Header {
        &self.headers[self.headers.len() - 1]
    }

    /// Look up a header by its block hash.
    pub fn header_by_hash(&self, hash: &Hash) -> Option<&Header> {
        self.headers.iter().find(|h| &h.hash == hash)
    }

    /// The `n` latest headers as a new segment; the whole segment if shorter.
    pub fn latest_n(&self, n: usize) -> ChainSegment {
        let n = n.min(self.headers.len());
        Self {
            headers: self.headers[self.headers.len() - n..].to_vec(),
        }
    }

    /// The `n` earliest headers as a new segment; the whole segment if shorter.
    pub fn earliest_n(&self, n: usize) -> ChainSegment {
        let n = n.min(self.headers.len());
        Self {
            headers: self.headers[..n].to_vec(),
        }
    }

    /// Append `other` to the right. The caller guarantees that `other`'s
    /// earliest block is the child of this segment's latest block; this is
    /// not checked.
    pub fn add_right(&mut self, other: &ChainSegment) {
        self.headers.extend_from_slice(&other.headers);
    }

    /// Prepend a header. The caller guarantees `header` is the parent of the
    /// current earliest block.
    pub(crate) fn push_front(&mut self, header: Header) {
        self.headers.insert(0, header);
    }

    /// Compare against another segment starting at the same block number.
    /// Walks both left to right and from the first hash mismatch on collects
    /// the old blocks into `removed` and the new blocks into `updated`.
    /// Positions past the end of `self` contribute to `updated` only. When a
    /// mismatch occurred and `self` is longer than `other`, the old tail
    /// blocks past the end of `other` were reorged away with nothing in
    /// their place yet and also land in `removed`. Identical segments yield
    /// `(None, None)`.
    pub fn diff_left_aligned(
        &self,
        other: &ChainSegment,
    ) -> (Option<ChainSegment>, Option<ChainSegment>) {
        let mut removed = Vec::new();
        let mut updated = Vec::new();
        for (i, new_header) in other.headers.iter().enumerate() {
            match self.headers.get(i) {
                None => updated.push(new_header.clone()),
                Some(old_header) if old_header.hash != new_header.hash => {
                    removed.push(old_header.clone());
                    updated.push(new_header.clone());
                }
                Some(_) => {}
            }
        }
        if !removed.is_empty() && self.headers.len() > other.headers.len() {
            removed.extend_from_slice(&self.headers[other.headers.len()..]);
        }
        let removed = (!removed.is_empty()).then(|| ChainSegment { headers: removed });
        let updated = (!updated.is_empty()).then(|| ChainSegment { headers: updated });
        (removed, updated)
    }
}

/// The unit of delivery to handlers: blocks that left the canonical chain
/// and the blocks that replaced or extended it. A Remove is always applied
/// before its superseding Append.
#[derive(Clone, Debug)]
pub struct ChainUpdate {
    /// Reorged-away blocks, if any.
    pub remove: Option<ChainSegment>,
    /// New canonical blocks.
    pub append: ChainSegment,
}
