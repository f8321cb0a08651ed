//! The engine's only fallibility surface. Layout computation itself is
//! total (§4.6/§7); `LayoutError` exists solely for misuse of the
//! incremental tree's mutation API, where a caller-supplied `uid` can
//! reference a node that was already removed.

use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("no node with uid {0} exists in this tree")]
    UnknownUid(u64),

    #[error("node {child} is not a child of node {parent}")]
    NotAChild { parent: u64, child: u64 },

    #[error("child index {index} is out of bounds for node {uid} ({len} children)")]
    ChildIndexOutOfBounds { uid: u64, index: usize, len: usize },
}
