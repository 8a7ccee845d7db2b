//! # sc-core
//!
//! Core types and invariants for guarded containers.
//!
//! This crate provides:
//! - `ContainerError` / `ConfigError`, the error taxonomy shared by every container
//! - `PropertyResult` and `PropertyChecker` for verifying invariants
//! - `Counterexample` for rendering failure paths
//! - Invariant traits for each container (`LinkedListProperties`, `HashMapProperties`)
//!
//! Containers expose read-only views of their internal shape; the checkers
//! here decide whether those views satisfy the structural invariants.

pub mod counterexample;
pub mod error;
pub mod invariants;
pub mod property;

pub use counterexample::{ChainDefect, Counterexample, StateSnapshot, ThreadAction};
pub use error::{ConfigError, ContainerError, ContainerResult};
pub use invariants::{
    BucketView, ChainView, HashMapProperties, HashMapPropertyChecker, LinkedListProperties,
    LinkedListPropertyChecker, ListHistory,
};
pub use property::{PropertyChecker, PropertyResult};
