//! Property results and the checker trait.
//!
//! A checker inspects a container (through one of the `*Properties`
//! traits) and returns one `PropertyResult` per invariant.

use std::fmt;

use crate::counterexample::Counterexample;

/// Outcome of checking a single invariant.
#[derive(Debug, Clone)]
pub struct PropertyResult {
    /// Invariant name (e.g. "LinkSymmetry")
    pub name: &'static str,
    /// Structure the invariant belongs to (e.g. "linked_list")
    pub structure: &'static str,
    /// Whether the invariant held
    pub holds: bool,
    /// Failure explanation
    pub message: Option<String>,
    /// Failure path, when the checker could build one
    pub counterexample: Option<Counterexample>,
}

impl PropertyResult {
    #[must_use]
    pub fn pass(name: &'static str, structure: &'static str) -> Self {
        Self {
            name,
            structure,
            holds: true,
            message: None,
            counterexample: None,
        }
    }

    #[must_use]
    pub fn fail(
        name: &'static str,
        structure: &'static str,
        message: impl Into<String>,
        counterexample: Option<Counterexample>,
    ) -> Self {
        Self {
            name,
            structure,
            holds: false,
            message: Some(message.into()),
            counterexample,
        }
    }
}

impl fmt::Display for PropertyResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.holds { "PASS" } else { "FAIL" };
        write!(f, "[{}] {}::{}", status, self.structure, self.name)?;
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

/// Something that can verify a set of invariants.
pub trait PropertyChecker {
    /// Check every invariant and return one result per invariant.
    fn check_all(&self) -> Vec<PropertyResult>;

    /// True when every invariant holds.
    fn all_hold(&self) -> bool {
        self.check_all().iter().all(|r| r.holds)
    }

    /// Only the failed results.
    fn violations(&self) -> Vec<PropertyResult> {
        self.check_all().into_iter().filter(|r| !r.holds).collect()
    }

    /// Multi-line report, one line per invariant.
    fn report(&self) -> String {
        self.check_all()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
