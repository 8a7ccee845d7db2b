//! Node cells and the arena that owns them.
//!
//! The arena is the single owner of every node. Links between nodes are
//! `NodeId` handles, so `prev` never keeps a node alive and there is no
//! ownership cycle. A handle stays valid until its node is removed; the
//! slot is then recycled by a later insert.

use std::ops::{Index, IndexMut};

/// Stable handle to a live node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(usize);

/// One list cell.
#[derive(Debug)]
pub(crate) struct Node<E> {
    pub(crate) element: E,
    pub(crate) prev: Option<NodeId>,
    pub(crate) next: Option<NodeId>,
}

impl<E> Node<E> {
    pub(crate) fn new(element: E, prev: Option<NodeId>, next: Option<NodeId>) -> Self {
        Self {
            element,
            prev,
            next,
        }
    }
}

#[derive(Debug)]
enum Slot<E> {
    Occupied(Node<E>),
    Vacant { next_free: Option<usize> },
}

/// Slot storage with an intrusive free list.
#[derive(Debug)]
pub(crate) struct NodeArena<E> {
    slots: Vec<Slot<E>>,
    free_head: Option<usize>,
    live: usize,
}

impl<E> NodeArena<E> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            live: 0,
        }
    }

    /// Store `node`, reusing a vacant slot when one exists.
    pub(crate) fn insert(&mut self, node: Node<E>) -> NodeId {
        self.live += 1;
        match self.free_head {
            Some(index) => {
                if let Slot::Vacant { next_free } = self.slots[index] {
                    self.free_head = next_free;
                }
                self.slots[index] = Slot::Occupied(node);
                NodeId(index)
            }
            None => {
                self.slots.push(Slot::Occupied(node));
                NodeId(self.slots.len() - 1)
            }
        }
    }

    /// Take the node out of its slot. `None` if the handle is stale.
    pub(crate) fn remove(&mut self, id: NodeId) -> Option<Node<E>> {
        let slot = self.slots.get_mut(id.0)?;
        if matches!(slot, Slot::Vacant { .. }) {
            return None;
        }
        let vacant = Slot::Vacant {
            next_free: self.free_head,
        };
        match std::mem::replace(slot, vacant) {
            Slot::Occupied(node) => {
                self.free_head = Some(id.0);
                self.live -= 1;
                Some(node)
            }
            Slot::Vacant { .. } => None,
        }
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&Node<E>> {
        match self.slots.get(id.0)? {
            Slot::Occupied(node) => Some(node),
            Slot::Vacant { .. } => None,
        }
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node<E>> {
        match self.slots.get_mut(id.0)? {
            Slot::Occupied(node) => Some(node),
            Slot::Vacant { .. } => None,
        }
    }

    /// Number of occupied slots.
    pub(crate) fn live(&self) -> usize {
        self.live
    }
}

/// Panics on a stale handle: the chain only stores handles of live nodes.
impl<E> Index<NodeId> for NodeArena<E> {
    type Output = Node<E>;

    fn index(&self, id: NodeId) -> &Node<E> {
        match self.get(id) {
            Some(node) => node,
            None => panic!("stale node handle {:?}", id),
        }
    }
}

impl<E> IndexMut<NodeId> for NodeArena<E> {
    fn index_mut(&mut self, id: NodeId) -> &mut Node<E> {
        match self.get_mut(id) {
            Some(node) => node,
            None => panic!("stale node handle {:?}", id),
        }
    }
}
