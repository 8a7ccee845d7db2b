//! Fault injection for list containers.
//!
//! Faults are injected at OPERATION BOUNDARIES, never inside a locked
//! section. The container under test is unchanged; the runner decides
//! before and after each call whether the "caller" crashes, is delayed, or
//! never gets to issue the call.
//!
//! ```text
//! ┌─────────────┐    ┌──────────────────────┐    ┌─────────────┐
//! │ FaultPoint  │───>│ list.add/get/delete  │───>│ FaultPoint  │
//! │ (pre-op)    │    │ (pure, locked)       │    │ (post-op)   │
//! └─────────────┘    └──────────────────────┘    └─────────────┘
//!   "Op never issued?"                            "Caller crashed?"
//! ```
//!
//! Every completed operation is mirrored into a `Vec<u64>` model; the
//! runner reports any disagreement between list and model.

use sc_containers::LinkedListContainer;
use sc_core::invariants::linked_list::LinkedListProperties;
use sc_core::{ContainerError, ContainerResult, LinkedListPropertyChecker, ListHistory, PropertyChecker};

use crate::fault::{FaultConfig, FaultInjector};
use crate::random::DeterministicRng;

/// Fault injection points (between operations, not inside).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultPoint {
    BeforeOperation,
    AfterOperation,
}

/// Types of faults that can be injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultType {
    /// Node allocation fails; the operation never starts
    AllocationFailure,
    /// Caller "crashes"; before the op it is abandoned, after it the result is dropped
    ThreadCrash,
    /// Caller is slow; simulated time advances
    Delay,
}

/// List interface driven by the DST runners.
///
/// MINIMAL interface - the container has no knowledge of DST.
pub trait DstTestableList: Send + Sync {
    fn new() -> Self;
    fn add(&self, value: u64);
    fn get(&self, index: usize) -> ContainerResult<u64>;
    fn delete(&self, index: usize) -> ContainerResult<u64>;
    fn contains(&self, value: u64) -> bool;
    fn size(&self) -> usize;
    /// Full traversal through the container's fail-fast iterator.
    fn iterate(&self) -> ContainerResult<Vec<u64>>;
    fn generation(&self) -> u64;
}

impl DstTestableList for LinkedListContainer<u64> {
    fn new() -> Self {
        LinkedListContainer::new()
    }

    fn add(&self, value: u64) {
        LinkedListContainer::add(self, value);
    }

    fn get(&self, index: usize) -> ContainerResult<u64> {
        LinkedListContainer::get(self, index)
    }

    fn delete(&self, index: usize) -> ContainerResult<u64> {
        LinkedListContainer::delete(self, index)
    }

    fn contains(&self, value: u64) -> bool {
        LinkedListContainer::contains(self, &value)
    }

    fn size(&self) -> usize {
        LinkedListContainer::size(self)
    }

    fn iterate(&self) -> ContainerResult<Vec<u64>> {
        self.iter().collect()
    }

    fn generation(&self) -> u64 {
        self.modification_count()
    }
}

/// DST operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DstOp {
    Add(u64),
    Get(usize),
    Delete(usize),
    Contains(u64),
    Iterate,
}

impl DstOp {
    /// Random operation; indices may fall outside the list on purpose.
    pub fn random(rng: &mut DeterministicRng, size: usize) -> Self {
        let index_bound = size + 2;
        match rng.gen_range(0..6_u8) {
            0 | 1 => DstOp::Add(rng.gen_range(0..1_000)),
            2 => DstOp::Get(rng.gen_range(0..index_bound)),
            3 => DstOp::Delete(rng.gen_range(0..index_bound)),
            4 => DstOp::Contains(rng.gen_range(0..1_000)),
            _ => DstOp::Iterate,
        }
    }
}

/// DST test runner for list containers.
pub struct DstRunner<L> {
    list: L,
    rng: DeterministicRng,
    fault_injector: FaultInjector,
    seed: u64,
    model: Vec<u64>,
    history: ListHistory,
    violations: Vec<String>,
    operations_count: u64,
    faults_injected: u64,
    abandoned_operations: u64,
}

impl<L: DstTestableList + LinkedListProperties> DstRunner<L> {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_fault_config(seed, FaultConfig::default())
    }

    #[must_use]
    pub fn with_fault_config(seed: u64, config: FaultConfig) -> Self {
        Self {
            list: L::new(),
            rng: DeterministicRng::new(seed),
            fault_injector: FaultInjector::new(DeterministicRng::new(seed.wrapping_add(1)), config),
            seed,
            model: Vec::new(),
            history: ListHistory::new(),
            violations: Vec::new(),
            operations_count: 0,
            faults_injected: 0,
            abandoned_operations: 0,
        }
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub fn list(&self) -> &L {
        &self.list
    }

    #[must_use]
    pub fn model(&self) -> &[u64] {
        &self.model
    }

    fn maybe_inject_fault(&mut self, point: FaultPoint) -> Option<FaultType> {
        if !self.fault_injector.should_fail() {
            return None;
        }
        let fault = match point {
            FaultPoint::BeforeOperation => self.fault_injector.pick(&[
                FaultType::AllocationFailure,
                FaultType::ThreadCrash,
                FaultType::Delay,
            ]),
            FaultPoint::AfterOperation => {
                self.fault_injector.pick(&[FaultType::ThreadCrash, FaultType::Delay])
            }
        };
        self.faults_injected += 1;
        fault
    }

    /// `Err` when the op was abandoned before it ran.
    fn before(&mut self) -> Result<(), FaultType> {
        match self.maybe_inject_fault(FaultPoint::BeforeOperation) {
            Some(fault @ (FaultType::AllocationFailure | FaultType::ThreadCrash)) => {
                self.abandoned_operations += 1;
                Err(fault)
            }
            _ => Ok(()),
        }
    }

    /// `Err` when the op ran but the caller never saw the result.
    fn after(&mut self) -> Result<(), FaultType> {
        self.operations_count += 1;
        match self.maybe_inject_fault(FaultPoint::AfterOperation) {
            Some(FaultType::ThreadCrash) => {
                self.abandoned_operations += 1;
                Err(FaultType::ThreadCrash)
            }
            _ => Ok(()),
        }
    }

    fn violation(&mut self, message: String) {
        tracing::debug!(seed = self.seed, %message, "model disagreement");
        self.violations.push(message);
    }

    pub fn add(&mut self, value: u64) -> Result<(), FaultType> {
        self.before()?;
        self.list.add(value);
        // The value is in the list whether or not the caller survives.
        self.model.push(value);
        self.history.record_add(value, self.list.generation());
        self.after()
    }

    pub fn get(&mut self, index: usize) -> Result<ContainerResult<u64>, FaultType> {
        self.before()?;
        let result = self.list.get(index);
        let expected = self.expected_at(index);
        if result != expected {
            self.violation(format!("get({}) returned {:?}, model expected {:?}", index, result, expected));
        }
        self.after()?;
        Ok(result)
    }

    pub fn delete(&mut self, index: usize) -> Result<ContainerResult<u64>, FaultType> {
        self.before()?;
        let result = self.list.delete(index);
        let expected = self.expected_at(index);
        if result != expected {
            self.violation(format!(
                "delete({}) returned {:?}, model expected {:?}",
                index, result, expected
            ));
        }
        if index < self.model.len() {
            let removed = self.model.remove(index);
            self.history.record_delete(removed, self.list.generation());
        }
        self.after()?;
        Ok(result)
    }

    pub fn contains(&mut self, value: u64) -> Result<bool, FaultType> {
        self.before()?;
        let found = self.list.contains(value);
        if found != self.model.contains(&value) {
            self.violation(format!("contains({}) returned {}", value, found));
        }
        self.after()?;
        Ok(found)
    }

    pub fn iterate(&mut self) -> Result<ContainerResult<Vec<u64>>, FaultType> {
        self.before()?;
        let result = self.list.iterate();
        // Single-threaded: nothing can invalidate the iterator.
        if result.as_deref() != Ok(self.model.as_slice()) {
            self.violation(format!("iterate returned {:?}, model is {:?}", result, self.model));
        }
        self.after()?;
        Ok(result)
    }

    /// Execute one op, mapping every outcome to "did a fault fire".
    pub fn apply(&mut self, op: DstOp) -> Result<(), FaultType> {
        match op {
            DstOp::Add(v) => self.add(v),
            DstOp::Get(i) => self.get(i).map(|_| ()),
            DstOp::Delete(i) => self.delete(i).map(|_| ()),
            DstOp::Contains(v) => self.contains(v).map(|_| ()),
            DstOp::Iterate => self.iterate().map(|_| ()),
        }
    }

    /// Random op against the current size.
    pub fn random_op(&mut self) -> DstOp {
        DstOp::random(&mut self.rng, self.model.len())
    }

    fn expected_at(&self, index: usize) -> ContainerResult<u64> {
        self.model
            .get(index)
            .copied()
            .ok_or(ContainerError::IndexOutOfBounds {
                index,
                size: self.model.len(),
            })
    }

    /// List contents and size agree with the model.
    #[must_use]
    pub fn check_model_agreement(&self) -> bool {
        self.violations.is_empty()
            && self.list.size() == self.model.len()
            && self.list.iterate().as_deref() == Ok(self.model.as_slice())
    }

    /// Structural and history invariants.
    #[must_use]
    pub fn check_invariants(&self) -> bool {
        LinkedListPropertyChecker::new(&self.list)
            .with_history(&self.history)
            .with_seed(self.seed.max(1))
            .all_hold()
    }

    /// Human-readable invariant report.
    #[must_use]
    pub fn invariant_report(&self) -> String {
        LinkedListPropertyChecker::new(&self.list)
            .with_history(&self.history)
            .report()
    }

    #[must_use]
    pub fn violations(&self) -> &[String] {
        &self.violations
    }

    #[must_use]
    pub fn stats(&self) -> DstStats {
        DstStats {
            seed: self.seed,
            operations_count: self.operations_count,
            faults_injected: self.faults_injected,
            abandoned_operations: self.abandoned_operations,
            generation: self.list.generation(),
        }
    }
}

/// Statistics from a DST run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DstStats {
    pub seed: u64,
    pub operations_count: u64,
    pub faults_injected: u64,
    pub abandoned_operations: u64,
    pub generation: u64,
}

impl DstStats {
    #[must_use]
    pub fn format(&self) -> String {
        format!(
            "DST_SEED={} ops={} faults={} abandoned={} generation={}",
            self.seed,
            self.operations_count,
            self.faults_injected,
            self.abandoned_operations,
            self.generation
        )
    }
}

/// DST result.
#[derive(Debug)]
pub struct DstResult {
    pub passed: bool,
    pub model_agreement: bool,
    pub invariants_hold: bool,
    pub stats: DstStats,
    pub fault_errors: Vec<String>,
    pub violations: Vec<String>,
}

impl DstResult {
    #[must_use]
    pub fn format(&self) -> String {
        let status = if self.passed { "PASS" } else { "FAIL" };
        let mut result = format!("[{}] {}", status, self.stats.format());
        if !self.model_agreement {
            result.push_str("\n  VIOLATION: ModelAgreement");
        }
        if !self.invariants_hold {
            result.push_str("\n  VIOLATION: ChainInvariants");
        }
        for violation in &self.violations {
            result.push_str("\n    ");
            result.push_str(violation);
        }
        result
    }
}

/// Run a DST scenario. Invariants are checked at the end.
pub fn run_dst_scenario<L: DstTestableList + LinkedListProperties>(
    seed: u64,
    operations: Vec<DstOp>,
) -> DstResult {
    let mut runner: DstRunner<L> = DstRunner::new(seed);
    let mut fault_errors = Vec::new();

    for op in operations {
        // Faults are expected - they're part of the test
        if let Err(fault) = runner.apply(op) {
            fault_errors.push(format!("{:?}", fault));
        }
    }

    let model_agreement = runner.check_model_agreement();
    let invariants_hold = runner.check_invariants();
    let stats = runner.stats();
    tracing::info!(stats = %stats.format(), model_agreement, invariants_hold, "DST scenario finished");

    DstResult {
        passed: model_agreement && invariants_hold,
        model_agreement,
        invariants_hold,
        stats,
        fault_errors,
        violations: runner.violations.clone(),
    }
}
