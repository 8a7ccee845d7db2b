//! Mutex-guarded doubly linked list.
//!
//! # Invariants
//!
//! | Property | Checked By |
//! |----------|------------|
//! | EmptyConsistency | property checker, proptest |
//! | Forward/BackwardReachability | property checker, DST |
//! | LinkSymmetry | property checker, DST |
//! | MonotonicGeneration | property checker with history, loom |
//!
//! # Locking
//!
//! Every operation holds the container's mutex for its whole duration, so
//! operations are linearizable with respect to each other. The generation
//! (`mod_count`) is bumped once by every `add` and every successful
//! `delete`; iterators compare against it on each step.

use std::fmt;
use std::sync::PoisonError;

use sc_core::invariants::linked_list::{ChainView, LinkedListProperties};
use sc_core::{ContainerError, ContainerResult};

use crate::container::SimpleContainer;
use crate::iter::Iter;
use crate::node::{Node, NodeArena, NodeId};
use crate::sync::{Mutex, MutexGuard};

/// State guarded by the container lock.
pub(crate) struct Chain<E> {
    pub(crate) nodes: NodeArena<E>,
    pub(crate) first: Option<NodeId>,
    pub(crate) last: Option<NodeId>,
    pub(crate) size: usize,
    pub(crate) mod_count: u64,
}

impl<E> Chain<E> {
    fn new() -> Self {
        Self {
            nodes: NodeArena::new(),
            first: None,
            last: None,
            size: 0,
            mod_count: 0,
        }
    }

    fn push_back(&mut self, value: E) {
        let id = self.nodes.insert(Node::new(value, self.last, None));
        match self.last {
            Some(last) => self.nodes[last].next = Some(id),
            None => self.first = Some(id),
        }
        self.last = Some(id);
        self.size += 1;
        self.mod_count += 1;
        debug_assert_eq!(self.nodes.live(), self.size);
        tracing::trace!(size = self.size, generation = self.mod_count, "add");
    }

    fn check_index(&self, index: usize) -> ContainerResult<()> {
        if index >= self.size {
            return Err(ContainerError::IndexOutOfBounds {
                index,
                size: self.size,
            });
        }
        Ok(())
    }

    /// Walk `index` hops from `first`.
    fn node_at(&self, index: usize) -> ContainerResult<NodeId> {
        self.check_index(index)?;
        let mut current = self.first;
        for _ in 0..index {
            current = current.and_then(|id| self.nodes[id].next);
        }
        current.ok_or(ContainerError::IndexOutOfBounds {
            index,
            size: self.size,
        })
    }

    fn unlink(&mut self, index: usize) -> ContainerResult<E> {
        let id = self.node_at(index)?;
        let (prev, next) = {
            let node = &self.nodes[id];
            (node.prev, node.next)
        };

        match prev {
            Some(prev) => self.nodes[prev].next = next,
            None => self.first = next,
        }
        match next {
            Some(next) => self.nodes[next].prev = prev,
            None => self.last = prev,
        }

        let node = self.nodes.remove(id).ok_or(ContainerError::IndexOutOfBounds {
            index,
            size: self.size,
        })?;
        self.size -= 1;
        self.mod_count += 1;
        debug_assert_eq!(self.nodes.live(), self.size);
        Ok(node.element)
    }

    fn elements(&self) -> impl Iterator<Item = &E> + '_ {
        let mut cursor = self.first;
        std::iter::from_fn(move || {
            let node = &self.nodes[cursor?];
            cursor = node.next;
            Some(&node.element)
        })
    }
}

/// A doubly linked list safe to share between threads.
///
/// Appends are O(1); `get` and `delete` walk from the head and are
/// O(index); `contains` is O(size).
///
/// ```
/// use sc_containers::LinkedListContainer;
///
/// let list = LinkedListContainer::new();
/// list.add(10);
/// list.add(20);
/// list.add(30);
/// assert_eq!(list.delete(1), Ok(20));
/// assert_eq!(list.get(1), Ok(30));
/// assert_eq!(list.size(), 2);
/// ```
pub struct LinkedListContainer<E> {
    chain: Mutex<Chain<E>>,
}

impl<E> LinkedListContainer<E> {
    /// Create a new empty list.
    #[must_use]
    pub fn new() -> Self {
        Self {
            chain: Mutex::new(Chain::new()),
        }
    }

    /// No operation panics between its first and last link update, so a
    /// poisoned lock still guards a consistent chain.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Chain<E>> {
        self.chain.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append `value` after the current tail.
    pub fn add(&self, value: E) {
        self.lock().push_back(value);
    }

    /// Remove and return the element at `index`.
    ///
    /// # Errors
    ///
    /// `IndexOutOfBounds` when `index >= size()`.
    pub fn delete(&self, index: usize) -> ContainerResult<E> {
        let mut chain = self.lock();
        let element = chain.unlink(index)?;
        tracing::trace!(
            index,
            size = chain.size,
            generation = chain.mod_count,
            "delete"
        );
        Ok(element)
    }

    /// Number of live elements.
    #[must_use]
    pub fn size(&self) -> usize {
        self.lock().size
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Structural mutations applied so far.
    #[must_use]
    pub fn modification_count(&self) -> u64 {
        self.lock().mod_count
    }

    /// Fail-fast iterator positioned at the current head.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, E> {
        let chain = self.lock();
        Iter::new(self, chain.first, chain.mod_count)
    }
}

impl<E: Clone> LinkedListContainer<E> {
    /// Clone of the element at `index`.
    ///
    /// # Errors
    ///
    /// `IndexOutOfBounds` when `index >= size()`.
    pub fn get(&self, index: usize) -> ContainerResult<E> {
        let chain = self.lock();
        let id = chain.node_at(index)?;
        Ok(chain.nodes[id].element.clone())
    }

    /// All elements in chain order, read under a single lock acquisition.
    #[must_use]
    pub fn to_vec(&self) -> Vec<E> {
        self.lock().elements().cloned().collect()
    }
}

impl<E: PartialEq> LinkedListContainer<E> {
    /// Whether any element equals `value`.
    #[must_use]
    pub fn contains(&self, value: &E) -> bool {
        self.lock().elements().any(|element| element == value)
    }
}

impl<E> Default for LinkedListContainer<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: fmt::Debug> fmt::Debug for LinkedListContainer<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chain = self.lock();
        f.debug_list().entries(chain.elements()).finish()
    }
}

impl<E> Extend<E> for LinkedListContainer<E> {
    fn extend<I: IntoIterator<Item = E>>(&mut self, iter: I) {
        let mut chain = self.lock();
        for value in iter {
            chain.push_back(value);
        }
    }
}

impl<E> FromIterator<E> for LinkedListContainer<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        let mut list = Self::new();
        list.extend(iter);
        list
    }
}

impl<E> From<Vec<E>> for LinkedListContainer<E> {
    fn from(values: Vec<E>) -> Self {
        values.into_iter().collect()
    }
}

impl<'a, E: Clone> IntoIterator for &'a LinkedListContainer<E> {
    type Item = ContainerResult<E>;
    type IntoIter = Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<E: Clone> SimpleContainer<E> for LinkedListContainer<E> {
    fn add(&self, value: E) {
        LinkedListContainer::add(self, value);
    }

    fn get(&self, index: usize) -> ContainerResult<E> {
        LinkedListContainer::get(self, index)
    }

    fn size(&self) -> usize {
        LinkedListContainer::size(self)
    }
}

impl LinkedListProperties for LinkedListContainer<u64> {
    fn chain_view(&self) -> ChainView {
        let chain = self.lock();
        let bound = chain.size + 1;

        let mut view = ChainView {
            declared_size: chain.size,
            has_first: chain.first.is_some(),
            has_last: chain.last.is_some(),
            generation: chain.mod_count,
            ..ChainView::default()
        };

        let mut cursor = chain.first;
        let mut expected_prev = None;
        while let Some(id) = cursor {
            if view.forward.len() == bound {
                break;
            }
            let Some(node) = chain.nodes.get(id) else {
                break;
            };
            if node.prev != expected_prev {
                view.asymmetric_links.push(view.forward.len());
            }
            view.forward.push(node.element);
            expected_prev = Some(id);
            cursor = node.next;
        }
        view.forward_terminated = cursor.is_none();

        let mut cursor = chain.last;
        while let Some(id) = cursor {
            if view.backward.len() == bound {
                break;
            }
            let Some(node) = chain.nodes.get(id) else {
                break;
            };
            view.backward.push(node.element);
            cursor = node.prev;
        }
        view.backward_terminated = cursor.is_none();

        view
    }
}

#[cfg(all(test, not(loom)))]
mod tests {
    use super::*;
    use sc_core::{LinkedListPropertyChecker, ListHistory, PropertyChecker};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::Layer;

    #[test]
    fn test_add_get_delete_scenario() {
        let list = LinkedListContainer::new();
        list.add(10);
        list.add(20);
        list.add(30);

        assert_eq!(list.size(), 3);
        assert_eq!(list.get(0), Ok(10));
        assert_eq!(list.get(1), Ok(20));
        assert_eq!(list.get(2), Ok(30));

        assert_eq!(list.delete(1), Ok(20));
        assert_eq!(list.size(), 2);
        assert_eq!(list.get(0), Ok(10));
        assert_eq!(list.get(1), Ok(30));
    }

    #[test]
    fn test_out_of_range() {
        let list: LinkedListContainer<u64> = LinkedListContainer::new();
        assert_eq!(
            list.get(0),
            Err(ContainerError::IndexOutOfBounds { index: 0, size: 0 })
        );
        assert_eq!(
            list.delete(usize::MAX),
            Err(ContainerError::IndexOutOfBounds {
                index: usize::MAX,
                size: 0
            })
        );

        list.add(1);
        assert_eq!(
            list.get(1),
            Err(ContainerError::IndexOutOfBounds { index: 1, size: 1 })
        );
        assert!(list.delete(1).is_err());
        assert_eq!(list.modification_count(), 1, "failed delete is not a mutation");
    }

    #[test]
    fn test_delete_ends() {
        let list: LinkedListContainer<u64> = vec![1, 2, 3, 4].into();

        assert_eq!(list.delete(0), Ok(1));
        assert_eq!(list.delete(2), Ok(4));
        assert_eq!(list.to_vec(), vec![2, 3]);
        assert!(LinkedListPropertyChecker::new(&list).all_hold());

        assert_eq!(list.delete(1), Ok(3));
        assert_eq!(list.delete(0), Ok(2));
        assert!(list.is_empty());
        let view = list.chain_view();
        assert!(!view.has_first && !view.has_last);

        // Reuse after emptying.
        list.add(9);
        assert_eq!(list.to_vec(), vec![9]);
        assert!(LinkedListPropertyChecker::new(&list).all_hold());
    }

    #[test]
    fn test_contains() {
        let list: LinkedListContainer<&str> = ["a", "b"].into_iter().collect();
        assert!(list.contains(&"a"));
        assert!(list.contains(&"b"));
        assert!(!list.contains(&"c"));
        let empty: LinkedListContainer<&str> = LinkedListContainer::new();
        assert!(!empty.contains(&"a"));
    }

    #[test]
    fn test_reads_do_not_bump_generation() {
        let list: LinkedListContainer<u64> = vec![1, 2].into();
        let before = list.modification_count();
        let _ = list.get(1);
        let _ = list.contains(&2);
        let _ = list.size();
        let _ = list.to_vec();
        assert_eq!(list.modification_count(), before);
    }

    #[test]
    fn test_generation_counts_mutations() {
        let list = LinkedListContainer::new();
        let mut history = ListHistory::new();
        for value in 1..=5_u64 {
            list.add(value);
            history.record_add(value, list.modification_count());
        }
        let removed = list.delete(2).unwrap();
        history.record_delete(removed, list.modification_count());

        let checker = LinkedListPropertyChecker::new(&list).with_history(&history);
        assert!(checker.all_hold(), "{}", checker.report());
        assert_eq!(list.modification_count(), 6);
    }

    /// Counts trace events emitted by this module.
    struct MutationEvents(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> Layer<S> for MutationEvents {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            let metadata = event.metadata();
            if *metadata.level() == tracing::Level::TRACE
                && metadata.target() == "sc_containers::linked_list"
            {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn test_every_mutation_is_traced() {
        let events = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(MutationEvents(Arc::clone(&events)));

        tracing::subscriber::with_default(subscriber, || {
            let mut list = LinkedListContainer::new();
            list.add(1_u64);
            list.extend([2, 3, 4]);
            let _ = list.delete(0);
            let _ = list.delete(10);
            let _ = list.get(0);
        });

        // One add, three extended, one successful delete.
        assert_eq!(events.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_debug_format() {
        let list: LinkedListContainer<u64> = vec![1, 2].into();
        assert_eq!(format!("{:?}", list), "[1, 2]");
    }

    #[test]
    fn test_simple_container_contract() {
        fn fill<C: SimpleContainer<u64>>(container: &C) {
            for i in 0..3 {
                container.add(i);
            }
        }
        let list = LinkedListContainer::new();
        fill(&list);
        assert_eq!(SimpleContainer::size(&list), 3);
        assert_eq!(SimpleContainer::get(&list, 2), Ok(2));
    }

    #[test]
    fn test_concurrent_add_no_lost_elements() {
        const THREADS: u64 = 8;
        const OPS_PER_THREAD: u64 = 500;

        let list = Arc::new(LinkedListContainer::new());
        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let list = Arc::clone(&list);
                thread::spawn(move || {
                    for i in 0..OPS_PER_THREAD {
                        list.add(t * OPS_PER_THREAD + i);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(list.size() as u64, THREADS * OPS_PER_THREAD);
        assert_eq!(list.modification_count(), THREADS * OPS_PER_THREAD);
        let mut values = list.to_vec();
        values.sort_unstable();
        assert_eq!(values, (0..THREADS * OPS_PER_THREAD).collect::<Vec<_>>());
        assert!(LinkedListPropertyChecker::new(&*list).all_hold());
    }

    #[test]
    fn test_concurrent_add_and_delete() {
        const THREADS: usize = 4;
        const OPS_PER_THREAD: usize = 200;

        let list: Arc<LinkedListContainer<u64>> =
            Arc::new((0..(THREADS * OPS_PER_THREAD) as u64).collect());

        let mut handles = vec![];
        for t in 0..THREADS {
            let list = Arc::clone(&list);
            handles.push(thread::spawn(move || {
                for i in 0..OPS_PER_THREAD {
                    list.add(10_000 + (t * OPS_PER_THREAD + i) as u64);
                }
                0
            }));
        }
        for _ in 0..THREADS {
            let list = Arc::clone(&list);
            handles.push(thread::spawn(move || {
                let mut deleted = 0;
                for _ in 0..OPS_PER_THREAD {
                    if list.delete(0).is_ok() {
                        deleted += 1;
                    }
                }
                deleted
            }));
        }
        let deleted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

        assert_eq!(deleted, THREADS * OPS_PER_THREAD);
        assert_eq!(list.size(), THREADS * OPS_PER_THREAD);
        assert_eq!(
            list.modification_count(),
            (3 * THREADS * OPS_PER_THREAD) as u64
        );
        assert!(LinkedListPropertyChecker::new(&*list).all_hold());
    }
}
