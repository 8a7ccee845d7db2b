//! # sc-containers
//!
//! In-memory containers behind a minimal collection contract.
//!
//! - `LinkedListContainer`: doubly linked list guarded by a single mutex,
//!   with a generation counter that makes its iterators fail fast
//! - `Iter`: generation-stamped cursor over a `LinkedListContainer`
//! - `HashMapLesson`: separate-chaining hash map
//! - `SimpleContainer`: the add/get/size contract shared by list containers
//!
//! # Testing
//!
//! ```bash
//! cargo test -p sc-containers
//! RUSTFLAGS="--cfg loom" cargo test -p sc-containers --release
//! cargo kani -p sc-containers
//! ```

pub mod container;
pub mod hash_map;
pub mod iter;
pub mod kani_proofs;
pub mod linked_list;
mod node;
mod sync;

pub use container::SimpleContainer;
pub use hash_map::{HashMapLesson, MapConfig};
pub use iter::{CursorState, Iter};
pub use linked_list::LinkedListContainer;
pub use sc_core::{ContainerError, ContainerResult};
