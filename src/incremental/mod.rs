//! The incremental recomputation API (§4.7, §6): a persistent layout tree
//! that reuses prior work across mutations instead of recomputing a fresh
//! `Node` tree from scratch on every call.

mod cache;
mod tree;

pub use cache::CacheStats;
pub use tree::LayoutTree;
