//! Fail-fast cursor over a `LinkedListContainer`.
//!
//! The cursor captures the list's generation when it is created and checks
//! it, under the list lock, before every step. The first mismatch moves the
//! cursor to `Invalid`, which is terminal.
//!
//! `has_next` and `next_element` each take the lock once, so the pair is not
//! atomic: another thread may mutate the list between them. `next_element`
//! validates again before touching the node, so that mutation is reported
//! as `ConcurrentModification` rather than read through a stale handle.
//! Detection is a debugging aid, not a synchronization mechanism.

use std::iter::FusedIterator;

use sc_core::{ContainerError, ContainerResult};

use crate::linked_list::{Chain, LinkedListContainer};
use crate::node::NodeId;

/// Lifecycle of an `Iter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorState {
    /// Created, nothing yielded yet.
    Fresh,
    /// Positioned on a live node, generation matches.
    Active,
    /// Cursor is past the tail.
    Exhausted,
    /// Generation mismatch observed; every later call fails.
    Invalid,
}

/// Single-pass, generation-stamped iterator.
///
/// The explicit API (`has_next` / `next_element`) keeps failing once the
/// cursor is invalid. The `Iterator` impl yields the
/// `ConcurrentModification` error once and then ends, so
/// `collect::<Result<Vec<_>, _>>()` surfaces it.
pub struct Iter<'a, E> {
    list: &'a LinkedListContainer<E>,
    cursor: Option<NodeId>,
    expected: u64,
    state: CursorState,
    fused: bool,
}

impl<'a, E> Iter<'a, E> {
    pub(crate) fn new(list: &'a LinkedListContainer<E>, first: Option<NodeId>, generation: u64) -> Self {
        Self {
            list,
            cursor: first,
            expected: generation,
            state: CursorState::Fresh,
            fused: false,
        }
    }

    #[must_use]
    pub fn state(&self) -> CursorState {
        self.state
    }

    /// Generation captured at creation.
    #[must_use]
    pub fn expected_generation(&self) -> u64 {
        self.expected
    }

    fn validate(&mut self, chain: &Chain<E>) -> ContainerResult<()> {
        if self.state != CursorState::Invalid && chain.mod_count == self.expected {
            return Ok(());
        }
        if self.state != CursorState::Invalid {
            tracing::debug!(
                expected = self.expected,
                actual = chain.mod_count,
                "concurrent modification detected"
            );
            self.state = CursorState::Invalid;
        }
        Err(ContainerError::ConcurrentModification {
            expected: self.expected,
            actual: chain.mod_count,
        })
    }

    /// Whether another element is available.
    ///
    /// # Errors
    ///
    /// `ConcurrentModification` if the list changed shape since this
    /// iterator was created.
    pub fn has_next(&mut self) -> ContainerResult<bool> {
        let list = self.list;
        let chain = list.lock();
        self.validate(&chain)?;
        if self.cursor.is_none() {
            self.state = CursorState::Exhausted;
        }
        Ok(self.cursor.is_some())
    }
}

impl<'a, E: Clone> Iter<'a, E> {
    /// Return the element under the cursor and advance.
    ///
    /// # Errors
    ///
    /// `ConcurrentModification` as for `has_next`; `NoSuchElement` when the
    /// cursor is past the tail.
    pub fn next_element(&mut self) -> ContainerResult<E> {
        let list = self.list;
        let chain = list.lock();
        self.validate(&chain)?;

        let Some(id) = self.cursor else {
            self.state = CursorState::Exhausted;
            return Err(ContainerError::NoSuchElement);
        };

        // Generation unchanged since creation, so every handle we hold is live.
        let node = &chain.nodes[id];
        self.cursor = node.next;
        self.state = if self.cursor.is_some() {
            CursorState::Active
        } else {
            CursorState::Exhausted
        };
        Ok(node.element.clone())
    }
}

impl<'a, E: Clone> Iterator for Iter<'a, E> {
    type Item = ContainerResult<E>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.fused {
            return None;
        }
        match self.next_element() {
            Ok(element) => Some(Ok(element)),
            Err(ContainerError::NoSuchElement) => {
                self.fused = true;
                None
            }
            Err(err) => {
                self.fused = true;
                Some(Err(err))
            }
        }
    }
}

impl<'a, E: Clone> FusedIterator for Iter<'a, E> {}
