//! Doubly linked list invariants.
//!
//! | Property | Description |
//! |----------|-------------|
//! | EmptyConsistency | `size == 0` iff `first` is none iff `last` is none |
//! | ForwardReachability | `size` hops along `next` from `first` reach the end |
//! | BackwardReachability | `size` hops along `prev` from `last` reach the end |
//! | LinkSymmetry | `node.next.prev == node` for every node |
//! | ForwardBackwardAgree | backward walk is the reverse of the forward walk |
//! | NoLostElements | live elements == added minus deleted (needs history) |
//! | MonotonicGeneration | generation never decreases, one step per mutation (needs history) |

use std::collections::HashMap;

use crate::counterexample::{ChainDefect, Counterexample, StateSnapshot};
use crate::property::{PropertyChecker, PropertyResult};

const STRUCTURE: &str = "linked_list";

/// Raw shape of a chain, captured under the container lock.
///
/// Walks stop after `declared_size + 1` hops so a corrupted chain with a
/// cycle still produces a finite view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainView {
    pub declared_size: usize,
    pub has_first: bool,
    pub has_last: bool,
    /// Elements following `next` from `first`.
    pub forward: Vec<u64>,
    /// Whether the forward walk reached the end within the hop bound.
    pub forward_terminated: bool,
    /// Elements following `prev` from `last` (tail first).
    pub backward: Vec<u64>,
    pub backward_terminated: bool,
    /// Forward positions whose successor does not link back to them.
    pub asymmetric_links: Vec<usize>,
    /// Current modification counter.
    pub generation: u64,
}

/// Implemented by list containers that can expose their chain shape.
pub trait LinkedListProperties {
    fn chain_view(&self) -> ChainView;
}

/// Record of structural mutations applied to a list, in linearization order.
#[derive(Debug, Clone, Default)]
pub struct ListHistory {
    pub added: Vec<u64>,
    pub deleted: Vec<u64>,
    /// Generation observed right after each mutation.
    pub generations: Vec<u64>,
}

impl ListHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_add(&mut self, value: u64, generation: u64) {
        self.added.push(value);
        self.generations.push(generation);
    }

    pub fn record_delete(&mut self, value: u64, generation: u64) {
        self.deleted.push(value);
        self.generations.push(generation);
    }

    /// Number of structural mutations recorded.
    #[must_use]
    pub fn mutations(&self) -> u64 {
        (self.added.len() + self.deleted.len()) as u64
    }
}

/// Property checker for linked list implementations.
pub struct LinkedListPropertyChecker<'a, T: LinkedListProperties> {
    list: &'a T,
    history: Option<&'a ListHistory>,
    dst_seed: Option<u64>,
}

impl<'a, T: LinkedListProperties> LinkedListPropertyChecker<'a, T> {
    #[must_use]
    pub fn new(list: &'a T) -> Self {
        Self {
            list,
            history: None,
            dst_seed: None,
        }
    }

    /// Also check the history-dependent invariants.
    ///
    /// The history must cover every mutation since the list was created.
    #[must_use]
    pub fn with_history(mut self, history: &'a ListHistory) -> Self {
        self.history = Some(history);
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        debug_assert!(seed != 0, "DST seed should not be zero");
        self.dst_seed = Some(seed);
        self
    }

    fn counterexample(&self, view: &ChainView, defect: ChainDefect) -> Counterexample {
        let mut ce = match self.dst_seed {
            Some(seed) => Counterexample::with_seed(seed),
            None => Counterexample::new(),
        };
        ce.add_state(StateSnapshot {
            step: 1,
            description: format!("size={} generation={}", view.declared_size, view.generation),
            variables: vec![
                ("forward".to_string(), format!("{:?}", view.forward)),
                ("backward".to_string(), format!("{:?}", view.backward)),
            ],
        });
        ce.add_defect(defect);
        ce
    }

    fn check_empty_consistency(&self, view: &ChainView) -> PropertyResult {
        let empty = view.declared_size == 0;
        if empty == !view.has_first && empty == !view.has_last {
            return PropertyResult::pass("EmptyConsistency", STRUCTURE);
        }
        let defect = ChainDefect::DanglingEnd {
            size: view.declared_size,
            has_first: view.has_first,
            has_last: view.has_last,
        };
        PropertyResult::fail(
            "EmptyConsistency",
            STRUCTURE,
            defect.to_string(),
            Some(self.counterexample(view, defect)),
        )
    }

    fn check_reachability(&self, view: &ChainView, forward: bool) -> PropertyResult {
        let (name, walk, terminated) = if forward {
            ("ForwardReachability", &view.forward, view.forward_terminated)
        } else {
            ("BackwardReachability", &view.backward, view.backward_terminated)
        };

        if !terminated {
            let defect = ChainDefect::Cycle {
                forward,
                hops: walk.len(),
            };
            return PropertyResult::fail(
                name,
                STRUCTURE,
                defect.to_string(),
                Some(self.counterexample(view, defect)),
            );
        }

        if walk.len() != view.declared_size {
            let defect = ChainDefect::SizeMismatch {
                declared: view.declared_size,
                reachable: walk.len(),
                forward,
            };
            return PropertyResult::fail(
                name,
                STRUCTURE,
                defect.to_string(),
                Some(self.counterexample(view, defect)),
            );
        }

        PropertyResult::pass(name, STRUCTURE)
    }

    fn check_link_symmetry(&self, view: &ChainView) -> PropertyResult {
        match view.asymmetric_links.first() {
            None => PropertyResult::pass("LinkSymmetry", STRUCTURE),
            Some(&position) => {
                let defect = ChainDefect::AsymmetricLink { position };
                PropertyResult::fail(
                    "LinkSymmetry",
                    STRUCTURE,
                    format!(
                        "{} ({} asymmetric links total)",
                        defect,
                        view.asymmetric_links.len()
                    ),
                    Some(self.counterexample(view, defect)),
                )
            }
        }
    }

    fn check_forward_backward_agree(&self, view: &ChainView) -> PropertyResult {
        let reversed: Vec<u64> = view.backward.iter().rev().copied().collect();
        if reversed == view.forward {
            PropertyResult::pass("ForwardBackwardAgree", STRUCTURE)
        } else {
            PropertyResult::fail(
                "ForwardBackwardAgree",
                STRUCTURE,
                format!(
                    "forward walk {:?} differs from reversed backward walk {:?}",
                    view.forward, reversed
                ),
                None,
            )
        }
    }

    fn check_no_lost_elements(&self, view: &ChainView, history: &ListHistory) -> PropertyResult {
        let mut expected: HashMap<u64, i64> = HashMap::new();
        for value in &history.added {
            *expected.entry(*value).or_default() += 1;
        }
        for value in &history.deleted {
            *expected.entry(*value).or_default() -= 1;
        }

        let mut actual: HashMap<u64, i64> = HashMap::new();
        for value in &view.forward {
            *actual.entry(*value).or_default() += 1;
        }

        for (value, count) in &expected {
            let found = actual.get(value).copied().unwrap_or(0);
            if found != *count {
                return PropertyResult::fail(
                    "NoLostElements",
                    STRUCTURE,
                    format!(
                        "value {} expected {} time(s) in the list, found {}",
                        value, count, found
                    ),
                    None,
                );
            }
        }
        for (value, found) in &actual {
            if !expected.contains_key(value) {
                return PropertyResult::fail(
                    "NoLostElements",
                    STRUCTURE,
                    format!("value {} present {} time(s) but never added", value, found),
                    None,
                );
            }
        }

        PropertyResult::pass("NoLostElements", STRUCTURE)
    }

    fn check_monotonic_generation(&self, view: &ChainView, history: &ListHistory) -> PropertyResult {
        for pair in history.generations.windows(2) {
            if pair[1] <= pair[0] {
                return PropertyResult::fail(
                    "MonotonicGeneration",
                    STRUCTURE,
                    format!("generation went from {} to {}", pair[0], pair[1]),
                    None,
                );
            }
        }

        if view.generation != history.mutations() {
            return PropertyResult::fail(
                "MonotonicGeneration",
                STRUCTURE,
                format!(
                    "generation is {} after {} structural mutations",
                    view.generation,
                    history.mutations()
                ),
                None,
            );
        }

        PropertyResult::pass("MonotonicGeneration", STRUCTURE)
    }
}

impl<'a, T: LinkedListProperties> PropertyChecker for LinkedListPropertyChecker<'a, T> {
    fn check_all(&self) -> Vec<PropertyResult> {
        let view = self.list.chain_view();
        let mut results = vec![
            self.check_empty_consistency(&view),
            self.check_reachability(&view, true),
            self.check_reachability(&view, false),
            self.check_link_symmetry(&view),
            self.check_forward_backward_agree(&view),
        ];
        if let Some(history) = self.history {
            results.push(self.check_no_lost_elements(&view, history));
            results.push(self.check_monotonic_generation(&view, history));
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedView(ChainView);

    impl LinkedListProperties for FixedView {
        fn chain_view(&self) -> ChainView {
            self.0.clone()
        }
    }

    fn healthy(values: &[u64], generation: u64) -> ChainView {
        ChainView {
            declared_size: values.len(),
            has_first: !values.is_empty(),
            has_last: !values.is_empty(),
            forward: values.to_vec(),
            forward_terminated: true,
            backward: values.iter().rev().copied().collect(),
            backward_terminated: true,
            asymmetric_links: vec![],
            generation,
        }
    }

    #[test]
    fn test_healthy_chain_passes() {
        let list = FixedView(healthy(&[1, 2, 3], 3));
        let checker = LinkedListPropertyChecker::new(&list);
        assert!(checker.all_hold(), "{}", checker.report());
    }

    #[test]
    fn test_empty_chain_passes() {
        let list = FixedView(healthy(&[], 0));
        assert!(LinkedListPropertyChecker::new(&list).all_hold());
    }

    #[test]
    fn test_dangling_last_detected() {
        let mut view = healthy(&[], 2);
        view.has_last = true;
        let list = FixedView(view);
        let violations = LinkedListPropertyChecker::new(&list).violations();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].name, "EmptyConsistency");
        assert!(violations[0].counterexample.is_some());
    }

    #[test]
    fn test_stale_tail_detected() {
        // Tail was not retreated after deleting the last node.
        let mut view = healthy(&[1, 2], 3);
        view.backward = vec![3, 2, 1];
        let list = FixedView(view);
        let names: Vec<_> = LinkedListPropertyChecker::new(&list)
            .violations()
            .iter()
            .map(|r| r.name)
            .collect();
        assert!(names.contains(&"BackwardReachability"));
        assert!(names.contains(&"ForwardBackwardAgree"));
    }

    #[test]
    fn test_cycle_and_asymmetry_detected() {
        let mut view = healthy(&[1, 2], 2);
        view.forward = vec![1, 2, 1];
        view.forward_terminated = false;
        view.asymmetric_links = vec![1];
        let list = FixedView(view);
        let checker = LinkedListPropertyChecker::new(&list).with_seed(7);
        let violations = checker.violations();
        let cycle = violations
            .iter()
            .find(|r| r.name == "ForwardReachability")
            .expect("cycle must be reported");
        let diagram = cycle.counterexample.as_ref().unwrap().render_diagram();
        assert!(diagram.contains("DST_SEED=7"));
        assert!(violations.iter().any(|r| r.name == "LinkSymmetry"));
    }

    #[test]
    fn test_history_checks() {
        let mut history = ListHistory::new();
        history.record_add(5, 1);
        history.record_add(6, 2);
        history.record_add(5, 3);
        history.record_delete(6, 4);

        let list = FixedView(healthy(&[5, 5], 4));
        let checker = LinkedListPropertyChecker::new(&list).with_history(&history);
        assert!(checker.all_hold(), "{}", checker.report());

        let lost = FixedView(healthy(&[5], 4));
        let violations = LinkedListPropertyChecker::new(&lost)
            .with_history(&history)
            .violations();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].name, "NoLostElements");
    }

    #[test]
    fn test_uncounted_delete_detected() {
        // A delete that leaves the generation untouched.
        let mut history = ListHistory::new();
        history.record_add(1, 1);
        history.record_delete(1, 1);

        let list = FixedView(healthy(&[], 1));
        let violations = LinkedListPropertyChecker::new(&list)
            .with_history(&history)
            .violations();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].name, "MonotonicGeneration");
    }
}
