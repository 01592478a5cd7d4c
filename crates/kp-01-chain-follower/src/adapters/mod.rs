//! Adapters implementing the outbound ports.

pub mod memory_cache;

pub use memory_cache::MemoryChainCache;
