//! Replays model action paths against `LinkedListContainer<u64>`.
//!
//! After every action the container must agree with the model on the list
//! contents, the generation, the cursor state and the reader's outcome.

use std::collections::HashSet;

use sc_containers::{Iter, LinkedListContainer};
use sc_core::ContainerError;

use crate::iterator::{IterAction, IterState, IteratorModel, StepOutcome};

/// Result of replaying one path.
#[derive(Debug, Clone)]
pub struct ConformanceResult {
    /// Whether the container matched the model at every step.
    pub passed: bool,
    /// Actions applied before stopping.
    pub steps: usize,
    /// Mismatch description if replay failed.
    pub error: Option<String>,
}

impl ConformanceResult {
    fn fail(steps: usize, error: String) -> Self {
        Self {
            passed: false,
            steps,
            error: Some(error),
        }
    }
}

/// Every distinct path of at most `max_depth` actions, one per reachable
/// state (first path found wins).
pub fn explore_paths(model: &IteratorModel, max_depth: usize) -> Vec<Vec<IterAction>> {
    let mut visited = HashSet::new();
    let mut paths = Vec::new();
    explore(
        model,
        IterState::new(&model.initial),
        Vec::new(),
        max_depth,
        &mut visited,
        &mut paths,
    );
    paths
}

fn explore(
    model: &IteratorModel,
    state: IterState,
    path: Vec<IterAction>,
    max_depth: usize,
    visited: &mut HashSet<IterState>,
    paths: &mut Vec<Vec<IterAction>>,
) {
    if !visited.insert(state.clone()) {
        return;
    }
    if !path.is_empty() {
        paths.push(path.clone());
    }
    if path.len() >= max_depth {
        return;
    }
    for action in state.possible_actions(model.max_mutations) {
        if let Some(next) = state.apply(&action) {
            let mut new_path = path.clone();
            new_path.push(action);
            explore(model, next, new_path, max_depth, visited, paths);
        }
    }
}

fn observe<T>(result: Result<T, ContainerError>, ok: impl FnOnce(T) -> StepOutcome) -> Result<StepOutcome, String> {
    match result {
        Ok(value) => Ok(ok(value)),
        Err(ContainerError::NoSuchElement) => Ok(StepOutcome::NoSuchElement),
        Err(ContainerError::ConcurrentModification { .. }) => Ok(StepOutcome::ConcurrentModification),
        Err(err) => Err(format!("unexpected error from cursor: {}", err)),
    }
}

/// Apply `path` to the model and to a real list built from
/// `model.initial`, comparing them after every action.
pub fn replay(model: &IteratorModel, path: &[IterAction]) -> ConformanceResult {
    let list = LinkedListContainer::from(model.initial.clone());
    let mut iter: Option<Iter<'_, u64>> = None;
    let mut state = IterState::new(&model.initial);

    for (step, action) in path.iter().enumerate() {
        let Some(next) = state.apply(action) else {
            return ConformanceResult::fail(step, format!("{:?} not enabled in the model", action));
        };
        state = next;

        let outcome = match *action {
            IterAction::Add => {
                list.add(state.next_value - 1);
                None
            }
            IterAction::Delete(index) => {
                if let Err(err) = list.delete(index) {
                    return ConformanceResult::fail(step, format!("delete({}) failed: {}", index, err));
                }
                None
            }
            IterAction::CreateIterator => {
                iter = Some(list.iter());
                None
            }
            IterAction::HasNext | IterAction::Next => {
                let Some(cursor) = iter.as_mut() else {
                    return ConformanceResult::fail(step, "no iterator to step".to_string());
                };
                let observed = if *action == IterAction::HasNext {
                    observe(cursor.has_next(), StepOutcome::HasNext)
                } else {
                    observe(cursor.next_element(), StepOutcome::Yielded)
                };
                match observed {
                    Ok(outcome) => Some(outcome),
                    Err(err) => return ConformanceResult::fail(step, err),
                }
            }
        };

        if list.to_vec() != state.list {
            return ConformanceResult::fail(
                step,
                format!("list {:?}, model {:?}", list.to_vec(), state.list),
            );
        }
        if list.modification_count() != state.generation {
            return ConformanceResult::fail(
                step,
                format!(
                    "generation {}, model {}",
                    list.modification_count(),
                    state.generation
                ),
            );
        }
        if let (Some(cursor), Some(reader)) = (iter.as_ref(), state.reader.as_ref()) {
            if cursor.state() != reader.cursor {
                return ConformanceResult::fail(
                    step,
                    format!("cursor {:?}, model {:?}", cursor.state(), reader.cursor),
                );
            }
            if outcome.is_some() && outcome != reader.last {
                return ConformanceResult::fail(
                    step,
                    format!("{:?} returned {:?}, model {:?}", action, outcome, reader.last),
                );
            }
        }
    }

    tracing::trace!(steps = path.len(), "replay matched model");
    ConformanceResult {
        passed: true,
        steps: path.len(),
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replay_detection() {
        let model = IteratorModel::default();
        let result = replay(
            &model,
            &[
                IterAction::CreateIterator,
                IterAction::Next,
                IterAction::Add,
                IterAction::HasNext,
                IterAction::Next,
            ],
        );
        assert!(result.passed, "{:?}", result.error);
        assert_eq!(result.steps, 5);
    }

    #[test]
    fn test_replay_rejects_disabled_action() {
        let model = IteratorModel::new(vec![1], 1);
        let result = replay(&model, &[IterAction::Delete(3)]);
        assert!(!result.passed);
        assert_eq!(result.steps, 0);
    }

    #[test]
    fn test_explore_paths_unique_states() {
        let model = IteratorModel::new(vec![1], 1);
        let paths = explore_paths(&model, 3);
        assert!(!paths.is_empty());
        assert!(paths.iter().all(|p| p.len() <= 3));
        assert!(paths.contains(&vec![IterAction::CreateIterator]));
    }
}
