//! Writer/reader state machine for a fail-fast cursor.
//!
//! # Properties
//!
//! 1. `yields only snapshot prefix`: everything the reader received is a
//!    prefix of the list as it was when the cursor was created
//! 2. `invalid is terminal`: once a mismatch is detected the cursor stays
//!    `Invalid` and keeps reporting it
//! 3. `exhausted means complete`: a cursor only runs out after yielding the
//!    whole snapshot
//! 4. `clean exhaustion` and `mutation detected` are both reachable

use sc_containers::CursorState;
use stateright::{Model, Property};

/// Outcome of the reader's last call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepOutcome {
    HasNext(bool),
    Yielded(u64),
    NoSuchElement,
    ConcurrentModification,
}

/// Action taken by the writer or the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IterAction {
    /// Writer appends a fresh value.
    Add,
    /// Writer deletes the element at this index.
    Delete(usize),
    /// Reader creates its cursor.
    CreateIterator,
    HasNext,
    Next,
}

/// Reader-side state. `snapshot` and `detected` are ghost variables.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReaderState {
    pub snapshot: Vec<u64>,
    pub expected: u64,
    pub position: usize,
    pub yielded: Vec<u64>,
    pub cursor: CursorState,
    pub last: Option<StepOutcome>,
    pub detected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IterState {
    pub list: Vec<u64>,
    pub generation: u64,
    pub next_value: u64,
    pub mutations: u8,
    pub reader: Option<ReaderState>,
}

impl IterState {
    /// List built by appending `initial`, reader not yet created.
    pub fn new(initial: &[u64]) -> Self {
        Self {
            list: initial.to_vec(),
            generation: initial.len() as u64,
            next_value: initial.iter().max().map_or(1, |max| max + 1),
            mutations: 0,
            reader: None,
        }
    }

    pub fn possible_actions(&self, max_mutations: u8) -> Vec<IterAction> {
        let mut actions = Vec::new();
        if self.mutations < max_mutations {
            actions.push(IterAction::Add);
            actions.extend((0..self.list.len()).map(IterAction::Delete));
        }
        if self.reader.is_none() {
            actions.push(IterAction::CreateIterator);
        } else {
            actions.push(IterAction::HasNext);
            actions.push(IterAction::Next);
        }
        actions
    }

    /// Successor state, or `None` when the action is not enabled.
    pub fn apply(&self, action: &IterAction) -> Option<Self> {
        let mut next = self.clone();
        match *action {
            IterAction::Add => {
                next.list.push(next.next_value);
                next.next_value += 1;
                next.generation += 1;
                next.mutations += 1;
            }
            IterAction::Delete(index) => {
                if index >= next.list.len() {
                    return None;
                }
                next.list.remove(index);
                next.generation += 1;
                next.mutations += 1;
            }
            IterAction::CreateIterator => {
                if next.reader.is_some() {
                    return None;
                }
                next.reader = Some(ReaderState {
                    snapshot: next.list.clone(),
                    expected: next.generation,
                    position: 0,
                    yielded: Vec::new(),
                    cursor: CursorState::Fresh,
                    last: None,
                    detected: false,
                });
            }
            IterAction::HasNext => {
                let len = next.list.len();
                let generation = next.generation;
                let reader = next.reader.as_mut()?;
                if Self::validate(reader, generation) {
                    let has = reader.position < len;
                    if !has {
                        reader.cursor = CursorState::Exhausted;
                    }
                    reader.last = Some(StepOutcome::HasNext(has));
                }
            }
            IterAction::Next => {
                let generation = next.generation;
                let list = &next.list;
                let reader = next.reader.as_mut()?;
                if Self::validate(reader, generation) {
                    match list.get(reader.position) {
                        Some(&value) => {
                            reader.position += 1;
                            reader.yielded.push(value);
                            reader.cursor = if reader.position < list.len() {
                                CursorState::Active
                            } else {
                                CursorState::Exhausted
                            };
                            reader.last = Some(StepOutcome::Yielded(value));
                        }
                        None => {
                            reader.cursor = CursorState::Exhausted;
                            reader.last = Some(StepOutcome::NoSuchElement);
                        }
                    }
                }
            }
        }
        Some(next)
    }

    /// Generation check shared by both reader calls. `false` means the call
    /// failed with a concurrent modification.
    fn validate(reader: &mut ReaderState, generation: u64) -> bool {
        if reader.cursor != CursorState::Invalid && reader.expected == generation {
            return true;
        }
        reader.cursor = CursorState::Invalid;
        reader.detected = true;
        reader.last = Some(StepOutcome::ConcurrentModification);
        false
    }

    pub fn yields_only_snapshot_prefix(&self) -> bool {
        self.reader
            .as_ref()
            .map_or(true, |r| r.snapshot.starts_with(&r.yielded))
    }

    pub fn invalid_is_terminal(&self) -> bool {
        self.reader.as_ref().map_or(true, |r| {
            !r.detected
                || (r.cursor == CursorState::Invalid
                    && r.last == Some(StepOutcome::ConcurrentModification))
        })
    }

    pub fn exhausted_means_complete(&self) -> bool {
        self.reader
            .as_ref()
            .map_or(true, |r| r.cursor != CursorState::Exhausted || r.yielded == r.snapshot)
    }

    pub fn cleanly_exhausted(&self) -> bool {
        self.reader
            .as_ref()
            .is_some_and(|r| r.cursor == CursorState::Exhausted && !r.yielded.is_empty())
    }

    pub fn mutation_detected(&self) -> bool {
        self.reader.as_ref().is_some_and(|r| r.detected)
    }

    /// Names of the safety properties that do not hold in this state.
    pub fn check_invariants(&self) -> Vec<&'static str> {
        let mut violations = Vec::new();
        if !self.yields_only_snapshot_prefix() {
            violations.push("yields only snapshot prefix");
        }
        if !self.invalid_is_terminal() {
            violations.push("invalid is terminal");
        }
        if !self.exhausted_means_complete() {
            violations.push("exhausted means complete");
        }
        violations
    }
}

/// Bounded writer/reader model.
#[derive(Debug, Clone)]
pub struct IteratorModel {
    /// List contents before the writer starts.
    pub initial: Vec<u64>,
    /// Writer stops after this many adds and deletes.
    pub max_mutations: u8,
}

impl Default for IteratorModel {
    fn default() -> Self {
        Self {
            initial: vec![1, 2],
            max_mutations: 2,
        }
    }
}

impl IteratorModel {
    pub fn new(initial: Vec<u64>, max_mutations: u8) -> Self {
        Self {
            initial,
            max_mutations,
        }
    }
}

impl Model for IteratorModel {
    type State = IterState;
    type Action = IterAction;

    fn init_states(&self) -> Vec<Self::State> {
        vec![IterState::new(&self.initial)]
    }

    fn actions(&self, state: &Self::State, actions: &mut Vec<Self::Action>) {
        actions.extend(state.possible_actions(self.max_mutations));
    }

    fn next_state(&self, last_state: &Self::State, action: Self::Action) -> Option<Self::State> {
        last_state.apply(&action)
    }

    fn properties(&self) -> Vec<Property<Self>> {
        vec![
            Property::always("yields only snapshot prefix", |_, state: &IterState| {
                state.yields_only_snapshot_prefix()
            }),
            Property::always("invalid is terminal", |_, state: &IterState| {
                state.invalid_is_terminal()
            }),
            Property::always("exhausted means complete", |_, state: &IterState| {
                state.exhausted_means_complete()
            }),
            Property::sometimes("clean exhaustion", |_, state: &IterState| {
                state.cleanly_exhausted()
            }),
            Property::sometimes("mutation detected", |_, state: &IterState| {
                state.mutation_detected()
            }),
        ]
    }
}
