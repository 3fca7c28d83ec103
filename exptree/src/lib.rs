//! An in-memory, copy-on-write exponential tree: an ordered key-value index
//! where every `put` reallocates the touched root-to-leaf path instead of
//! mutating nodes in place, recycling freed node memory through a
//! size-class cache instead of returning straight to the allocator.
//!
//! Layers, leaves-first:
//!
//! - [`eytzinger`]: bidirectional conversion between sorted-linear and
//!   Eytzinger (implicit binary-search-tree in array) position.
//! - `alloc` (crate-private): the raw arena and size-class cache backing
//!   every node allocation.
//! - `node` (crate-private): per-node operations — `dupe`,
//!   `dupe_insert_or_split_leaf`, `dupe_insert_or_split_internal`, `min`,
//!   and the typed accessors for a node's tail.
//! - [`tree`]: the public [`Tree`] handle — root, descent, copy-on-write
//!   propagation, and the two memory-accounting counters.

mod alloc;
mod node;
mod tree;

pub mod error;
pub mod eytzinger;

pub use error::Error;
pub use tree::Tree;
