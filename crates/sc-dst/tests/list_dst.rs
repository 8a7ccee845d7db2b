//! DST integration tests for `LinkedListContainer`.
//!
//! Seeds come from `DST_SEED` when set; iteration counts from
//! `DST_ITERATIONS`.

use std::sync::atomic::{AtomicU64, Ordering};

use sc_containers::LinkedListContainer;
use sc_core::{ChainView, ContainerResult, LinkedListProperties};
use sc_dst::{
    get_or_generate_seed, iterations_or, run_dst_scenario, DstHarness, DstOp, DstRunner,
    DstTestableList, FaultConfig, HarnessConfig,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Drops every third add on the floor.
struct LeakyList {
    inner: LinkedListContainer<u64>,
    adds: AtomicU64,
}

impl DstTestableList for LeakyList {
    fn new() -> Self {
        Self {
            inner: LinkedListContainer::new(),
            adds: AtomicU64::new(0),
        }
    }

    fn add(&self, value: u64) {
        if self.adds.fetch_add(1, Ordering::Relaxed) % 3 != 2 {
            self.inner.add(value);
        }
    }

    fn get(&self, index: usize) -> ContainerResult<u64> {
        self.inner.get(index)
    }

    fn delete(&self, index: usize) -> ContainerResult<u64> {
        self.inner.delete(index)
    }

    fn contains(&self, value: u64) -> bool {
        self.inner.contains(&value)
    }

    fn size(&self) -> usize {
        self.inner.size()
    }

    fn iterate(&self) -> ContainerResult<Vec<u64>> {
        self.inner.iter().collect()
    }

    fn generation(&self) -> u64 {
        self.inner.modification_count()
    }
}

impl LinkedListProperties for LeakyList {
    fn chain_view(&self) -> ChainView {
        self.inner.chain_view()
    }
}

#[test]
fn test_random_runs_with_faults() {
    init_tracing();
    let seed = get_or_generate_seed();
    let runs = iterations_or(20);

    for run in 0..runs {
        let run_seed = seed.wrapping_add(run).max(1);
        let mut runner: DstRunner<LinkedListContainer<u64>> = DstRunner::new(run_seed);
        for _ in 0..300 {
            let op = runner.random_op();
            let _ = runner.apply(op);
        }
        assert!(
            runner.check_model_agreement() && runner.check_invariants(),
            "DST_SEED={} run {}: {:?}\n{}",
            seed,
            run,
            runner.violations(),
            runner.invariant_report()
        );
    }
}

#[test]
fn test_aggressive_faults_keep_model() {
    let seed = get_or_generate_seed();
    let mut runner: DstRunner<LinkedListContainer<u64>> =
        DstRunner::with_fault_config(seed, FaultConfig::aggressive());
    for _ in 0..1_000 {
        let op = runner.random_op();
        let _ = runner.apply(op);
    }
    let stats = runner.stats();
    println!("{}", stats.format());
    assert!(runner.check_model_agreement(), "{:?}", runner.violations());
    assert!(runner.check_invariants(), "{}", runner.invariant_report());
}

#[test]
fn test_scenario_replay() {
    let ops = vec![
        DstOp::Add(10),
        DstOp::Add(20),
        DstOp::Add(30),
        DstOp::Get(2),
        DstOp::Delete(1),
        DstOp::Get(1),
        DstOp::Contains(20),
        DstOp::Iterate,
    ];

    let result = run_dst_scenario::<LinkedListContainer<u64>>(12345, ops);
    println!("{}", result.format());
    assert!(result.passed, "{}", result.format());
}

#[test]
fn test_runner_catches_lost_adds() {
    let mut runner: DstRunner<LeakyList> = DstRunner::with_fault_config(7, FaultConfig::none());
    for value in 0..6 {
        runner.add(value).unwrap();
    }
    assert!(!runner.check_model_agreement());
    assert!(!runner.check_invariants());
}

#[test]
fn test_harness_quick() {
    init_tracing();
    let seed = get_or_generate_seed();
    let harness = DstHarness::new(seed, HarnessConfig::quick()).unwrap();
    let result = harness.run::<LinkedListContainer<u64>>();
    println!("{}", result.format());
    assert!(result.all_invariants_held, "{}", result.format());
}

#[test]
fn test_harness_default_with_faults() {
    init_tracing();
    let seed = get_or_generate_seed();
    let harness = DstHarness::new(seed, HarnessConfig::default()).unwrap();
    let result = harness.run::<LinkedListContainer<u64>>();
    println!("{}", result.format());
    assert!(result.all_invariants_held, "{}", result.format());
    assert!(result.iterations_completed + result.iterations_invalidated > 0);
}

#[test]
#[ignore = "slow; run with --ignored"]
fn test_harness_stress() {
    init_tracing();
    let seed = get_or_generate_seed();
    let harness = DstHarness::new(seed, HarnessConfig::stress()).unwrap();
    let result = harness.run::<LinkedListContainer<u64>>();
    println!("{}", result.format());
    assert!(result.all_invariants_held, "{}", result.format());
}

#[test]
fn test_harness_catches_lost_adds() {
    let config = HarnessConfig {
        threads_count: 2,
        operations_per_thread: 100,
        fault_config: FaultConfig::none(),
        invariant_check_interval: 0,
    };
    let harness = DstHarness::new(99, config).unwrap();
    let result = harness.run::<LeakyList>();
    assert!(!result.all_invariants_held);
    assert!(result.first_violation.is_some());
}
