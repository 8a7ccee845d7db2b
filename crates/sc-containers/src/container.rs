//! The contract shared by list containers.

use sc_core::ContainerResult;

/// Minimal indexed container: append, positional read, size.
///
/// Implementations are internally synchronized, so every method takes `&self`.
pub trait SimpleContainer<E> {
    /// Append `value` at the end.
    fn add(&self, value: E);

    /// Element at `index`, counted from the front.
    fn get(&self, index: usize) -> ContainerResult<E>;

    /// Number of live elements.
    fn size(&self) -> usize;
}
