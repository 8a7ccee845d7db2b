//! # sc-model
//!
//! Exhaustive model of the fail-fast iterator protocol.
//!
//! One writer appends and deletes on a small list while one reader steps a
//! cursor with separate `has_next` / `next` calls. Every interleaving is
//! explored, and the same action paths can be replayed against
//! `LinkedListContainer` to check that the container behaves as modelled.
//!
//! ## Usage
//!
//! ```ignore
//! use sc_model::IteratorModel;
//! use stateright::{Checker, Model};
//!
//! IteratorModel::default()
//!     .checker()
//!     .spawn_bfs()
//!     .join()
//!     .assert_properties();
//! ```

pub mod conformance;
pub mod iterator;

pub use conformance::{explore_paths, replay, ConformanceResult};
pub use iterator::{IterAction, IterState, IteratorModel, ReaderState, StepOutcome};
