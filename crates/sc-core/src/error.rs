//! Shared error model for container APIs.

use thiserror::Error;

/// Result type returned by fallible container operations.
pub type ContainerResult<T> = Result<T, ContainerError>;

/// Failures surfaced synchronously by container operations and iterators.
///
/// None of these are retried internally. An iterator that returned
/// `ConcurrentModification` keeps returning it for the rest of its life.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContainerError {
    /// `get`/`delete` index outside `[0, size)`.
    #[error("index {index} out of bounds for container of size {size}")]
    IndexOutOfBounds { index: usize, size: usize },

    /// The container changed shape after the iterator captured its generation.
    #[error("container modified during iteration (expected generation {expected}, found {actual})")]
    ConcurrentModification { expected: u64, actual: u64 },

    /// `next` called on an exhausted iterator.
    #[error("no more elements")]
    NoSuchElement,
}

/// Invalid construction parameters.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("capacity must be greater than zero")]
    ZeroCapacity,

    #[error("capacity must be a power of two, got {0}")]
    CapacityNotPowerOfTwo(usize),

    #[error("load factor must be in (0, 1], got {0}")]
    InvalidLoadFactor(f64),

    #[error("probability must be in [0, 1], got {0}")]
    InvalidProbability(f64),

    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}
