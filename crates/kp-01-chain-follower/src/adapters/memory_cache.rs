//! # In-Memory Chain Cache
//!
//! Bounded tail of canonical headers behind a mutex. The critical sections
//! are short and never perform I/O.

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{Hash, Header};

use crate::domain::{ChainFollowerError, ChainSegment, ChainUpdate};
use crate::ports::ChainCache;

/// In-memory [`ChainCache`] bounded to `max_size` headers, evicting oldest
/// after each append.
pub struct MemoryChainCache {
    chain: Mutex<Option<ChainSegment>>,
    max_size: usize,
}

impl MemoryChainCache {
    /// An empty cache holding at most `max_size` headers.
    pub fn new(max_size: usize) -> Self {
        Self {
            chain: Mutex::new(None),
            max_size,
        }
    }

    /// A cache pre-seeded with a segment.
    pub fn with_segment(max_size: usize, segment: ChainSegment) -> Self {
        Self {
            chain: Mutex::new(Some(segment)),
            max_size,
        }
    }
}

#[async_trait]
impl ChainCache for MemoryChainCache {
    async fn get(&self) -> Result<Option<ChainSegment>, ChainFollowerError> {
        Ok(self.chain.lock().clone())
    }

    async fn header_by_hash(&self, hash: &Hash) -> Result<Option<Header>, ChainFollowerError> {
        Ok(self
            .chain
            .lock()
            .as_ref()
            .and_then(|segment| segment.header_by_hash(hash).cloned()))
    }

    async fn update(&self, update: &ChainUpdate) -> Result<(), ChainFollowerError> {
        let mut chain = self.chain.lock();
        let mut headers: Vec<Header> = match chain.as_ref() {
            Some(segment) => {
                let removed: Vec<Hash> = update
                    .remove
                    .as_ref()
                    .map(|r| r.headers().iter().map(|h| h.hash).collect())
                    .unwrap_or_default();
                segment
                    .headers()
                    .iter()
                    .filter(|h| !removed.contains(&h.hash))
                    .cloned()
                    .collect()
            }
            None => Vec::new(),
        };
        headers.extend_from_slice(update.append.headers());
        if headers.len() > self.max_size {
            headers.drain(..headers.len() - self.max_size);
        }
        *chain = Some(ChainSegment::new(headers)?);
        Ok(())
    }
}
