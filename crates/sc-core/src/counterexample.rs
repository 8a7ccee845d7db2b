//! Counterexample representation and rendering.
//!
//! When an invariant violation is detected, a counterexample shows
//! the sequence of operations and the chain defects that led to it.

use std::fmt;

/// A counterexample showing the failure path.
///
/// Contains the sequence of states and thread actions that led
/// to an invariant violation. Can be rendered as a human-readable
/// thread diagram.
#[derive(Debug, Clone, Default)]
pub struct Counterexample {
    /// Sequence of state snapshots
    pub states: Vec<StateSnapshot>,
    /// Thread interleaving that caused the failure
    pub interleaving: Vec<ThreadAction>,
    /// Structural defects found in the node chain
    pub defects: Vec<ChainDefect>,
    /// DST seed for reproduction (if applicable)
    pub dst_seed: Option<u64>,
    /// Human-readable description of the failure
    pub description: Option<String>,
}

/// Snapshot of container state at a point in time.
#[derive(Debug, Clone)]
pub struct StateSnapshot {
    /// Step number in the execution
    pub step: u64,
    /// Description of the state
    pub description: String,
    /// Variable values at this point
    pub variables: Vec<(String, String)>,
}

/// Operation performed by a thread.
#[derive(Debug, Clone)]
pub struct ThreadAction {
    pub thread_id: u64,
    pub step: u64,
    /// e.g. `add(7)`, `delete(0)`, `iter.next()`
    pub action: String,
    pub success: bool,
}

/// Structural defect in a doubly linked chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainDefect {
    /// `size` disagrees with the number of nodes reachable in one direction
    SizeMismatch {
        declared: usize,
        reachable: usize,
        forward: bool,
    },
    /// `first`/`last` presence disagrees with `size`
    DanglingEnd {
        size: usize,
        has_first: bool,
        has_last: bool,
    },
    /// `node.next.prev != node` at the given forward position
    AsymmetricLink { position: usize },
    /// Walk did not terminate within `size` hops
    Cycle { forward: bool, hops: usize },
}

impl Counterexample {
    /// Create a new empty counterexample.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a counterexample with DST seed for reproduction.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        debug_assert!(seed != 0, "DST seed should not be zero");
        Self {
            dst_seed: Some(seed),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a state snapshot. Steps must be strictly increasing.
    pub fn add_state(&mut self, state: StateSnapshot) {
        debug_assert!(
            self.states.last().map_or(true, |last| state.step > last.step),
            "States must be added in order"
        );
        self.states.push(state);
    }

    pub fn add_action(&mut self, action: ThreadAction) {
        self.interleaving.push(action);
    }

    pub fn add_defect(&mut self, defect: ChainDefect) {
        self.defects.push(defect);
    }

    /// Render the counterexample as a human-readable thread diagram.
    ///
    /// ```text
    /// DST_SEED=12345
    ///
    /// Step | Thread 0 | Thread 1 | State
    /// -----|----------|----------|------
    ///    1 | add(1) |          | size=1
    ///    2 |          | iter.next() |
    /// ```
    #[must_use]
    pub fn render_diagram(&self) -> String {
        let mut output = String::new();

        if let Some(seed) = self.dst_seed {
            output.push_str(&format!("DST_SEED={}\n\n", seed));
        }

        if let Some(ref desc) = self.description {
            output.push_str("Failure: ");
            output.push_str(desc);
            output.push_str("\n\n");
        }

        let mut threads: Vec<u64> = self.interleaving.iter().map(|a| a.thread_id).collect();
        threads.sort_unstable();
        threads.dedup();

        if threads.is_empty() {
            output.push_str("(no thread actions recorded)\n");
        } else {
            output.push_str("Step |");
            for tid in &threads {
                output.push_str(&format!(" Thread {} |", tid));
            }
            output.push_str(" State\n");

            output.push_str("-----|");
            for _ in &threads {
                output.push_str("----------|");
            }
            output.push_str("------\n");

            let max_step = self.interleaving.iter().map(|a| a.step).max().unwrap_or(0);

            for step in 1..=max_step {
                output.push_str(&format!("{:4} |", step));

                for tid in &threads {
                    let action = self
                        .interleaving
                        .iter()
                        .find(|a| a.step == step && a.thread_id == *tid);

                    match action {
                        Some(a) => {
                            let status = if a.success { "" } else { " [FAIL]" };
                            output.push_str(&format!(" {}{} |", a.action, status));
                        }
                        None => output.push_str("          |"),
                    }
                }

                if let Some(state) = self.states.iter().find(|s| s.step == step) {
                    output.push_str(&format!(" {}", state.description));
                }

                output.push('\n');
            }
        }

        if !self.defects.is_empty() {
            output.push_str("\nChain Defects:\n");
            for defect in &self.defects {
                output.push_str(&format!("  - {}\n", defect));
            }
        }

        output
    }
}

impl fmt::Display for ChainDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainDefect::SizeMismatch {
                declared,
                reachable,
                forward,
            } => write!(
                f,
                "Size mismatch: size={} but {} nodes reachable walking {}",
                declared,
                reachable,
                if *forward { "forward" } else { "backward" }
            ),
            ChainDefect::DanglingEnd {
                size,
                has_first,
                has_last,
            } => write!(
                f,
                "Dangling end: size={} first={} last={}",
                size,
                if *has_first { "set" } else { "none" },
                if *has_last { "set" } else { "none" }
            ),
            ChainDefect::AsymmetricLink { position } => {
                write!(f, "Asymmetric link at position {}", position)
            }
            ChainDefect::Cycle { forward, hops } => write!(
                f,
                "{} walk did not terminate after {} hops",
                if *forward { "Forward" } else { "Backward" },
                hops
            ),
        }
    }
}
