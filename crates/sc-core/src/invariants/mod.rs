//! Invariant traits for guarded containers.
//!
//! Each module defines the view a container exposes for checking and the
//! checker that evaluates the invariants against it.
//!
//! - `linked_list`: EmptyConsistency, ForwardReachability, BackwardReachability,
//!   LinkSymmetry, ForwardBackwardAgree, NoLostElements, MonotonicGeneration
//! - `hash_map`: NoDuplicateKeys, BucketPlacement, LoadFactorBounded, SizeMatchesEntries

pub mod hash_map;
pub mod linked_list;

pub use hash_map::{BucketView, HashMapProperties, HashMapPropertyChecker};
pub use linked_list::{ChainView, LinkedListProperties, LinkedListPropertyChecker, ListHistory};
