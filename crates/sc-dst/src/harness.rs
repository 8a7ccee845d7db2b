//! Threaded DST harness.
//!
//! Spawns real threads that issue seeded random operations against one
//! shared list. Structural invariants are checked every
//! `invariant_check_interval` operations while the threads run; the
//! history invariants (no lost elements, one generation step per mutation)
//! are checked once all threads have joined.
//!
//! Thread interleaving comes from the OS, so only each thread's operation
//! stream is reproducible from the seed, not the global order.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread;

use sc_core::invariants::linked_list::LinkedListProperties;
use sc_core::{ConfigError, ContainerError, LinkedListPropertyChecker, ListHistory, PropertyChecker};

use crate::env::DstEnv;
use crate::fault::FaultConfig;
use crate::fault_injection::DstTestableList;
use crate::random::DeterministicRng;

/// Maximum number of worker threads.
const THREADS_COUNT_MAX: usize = 64;

/// Configuration for the DST harness.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Number of worker threads
    pub threads_count: usize,
    /// Number of operations per thread
    pub operations_per_thread: u64,
    /// Fault injection configuration
    pub fault_config: FaultConfig,
    /// Check invariants after every N operations (0 = only at the end)
    pub invariant_check_interval: u64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            threads_count: 4,
            operations_per_thread: 200,
            fault_config: FaultConfig::default(),
            invariant_check_interval: 25,
        }
    }
}

impl HarnessConfig {
    /// Configuration for stress testing.
    pub fn stress() -> Self {
        Self {
            threads_count: 8,
            operations_per_thread: 2_000,
            fault_config: FaultConfig::aggressive(),
            invariant_check_interval: 100,
        }
    }

    /// Configuration for quick testing.
    pub fn quick() -> Self {
        Self {
            threads_count: 2,
            operations_per_thread: 50,
            fault_config: FaultConfig::none(),
            invariant_check_interval: 10,
        }
    }

    /// # Errors
    ///
    /// `ConfigError` for a thread count outside `1..=64` or an invalid
    /// fault configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threads_count == 0 || self.threads_count > THREADS_COUNT_MAX {
            return Err(ConfigError::Invalid("threads_count must be in 1..=64"));
        }
        self.fault_config.validate()
    }
}

/// Result of running the harness.
#[derive(Debug, Clone)]
pub struct HarnessResult {
    /// Seed used for reproduction
    pub seed: u64,
    /// Total operations executed
    pub operations_count: u64,
    /// Faults injected across all threads
    pub faults_injected_count: u64,
    /// Invariant checks performed
    pub invariant_checks_count: u64,
    /// Traversals that reached the end
    pub iterations_completed: u64,
    /// Traversals stopped by `ConcurrentModification`
    pub iterations_invalidated: u64,
    /// Whether all invariants held
    pub all_invariants_held: bool,
    /// First violation (if any)
    pub first_violation: Option<String>,
}

impl HarnessResult {
    #[must_use]
    pub fn format(&self) -> String {
        let status = if self.all_invariants_held { "PASS" } else { "FAIL" };
        let mut result = format!(
            "[{}] DST_SEED={} ops={} faults={} checks={} iterations={}/{} invalidated",
            status,
            self.seed,
            self.operations_count,
            self.faults_injected_count,
            self.invariant_checks_count,
            self.iterations_completed,
            self.iterations_invalidated
        );
        if let Some(ref violation) = self.first_violation {
            result.push_str(&format!("\n  Violation: {}", violation));
        }
        result
    }
}

/// What one worker thread did.
#[derive(Debug, Default)]
struct ThreadLog {
    added: Vec<u64>,
    deleted: Vec<u64>,
    faults: u64,
}

/// DST harness for concurrent testing.
pub struct DstHarness {
    seed: u64,
    config: HarnessConfig,
    operations_count: AtomicU64,
    invariant_checks_count: AtomicU64,
    iterations_completed: AtomicU64,
    iterations_invalidated: AtomicU64,
    violation: Mutex<Option<String>>,
    stopped: AtomicBool,
}

impl DstHarness {
    /// # Errors
    ///
    /// See [`HarnessConfig::validate`].
    pub fn new(seed: u64, config: HarnessConfig) -> Result<Self, ConfigError> {
        debug_assert!(seed != 0, "Seed should not be zero");
        config.validate()?;
        Ok(Self {
            seed,
            config,
            operations_count: AtomicU64::new(0),
            invariant_checks_count: AtomicU64::new(0),
            iterations_completed: AtomicU64::new(0),
            iterations_invalidated: AtomicU64::new(0),
            violation: Mutex::new(None),
            stopped: AtomicBool::new(false),
        })
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Check if the harness has been stopped due to a violation.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Stop every worker, keeping the first violation message.
    pub fn stop_with_violation(&self, message: String) {
        let mut guard = self.violation.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.is_none() {
            tracing::warn!(seed = self.seed, %message, "invariant violation");
            *guard = Some(message);
        }
        self.stopped.store(true, Ordering::Release);
    }

    /// Run the configured workload against a fresh `L`.
    pub fn run<L>(&self) -> HarnessResult
    where
        L: DstTestableList + LinkedListProperties,
    {
        tracing::info!(
            seed = self.seed,
            threads = self.config.threads_count,
            ops_per_thread = self.config.operations_per_thread,
            "starting DST harness"
        );

        let list = L::new();
        let mut root = DeterministicRng::new(self.seed);
        let envs: Vec<DstEnv> = (0..self.config.threads_count)
            .map(|_| DstEnv::with_fault_config(root.fork().seed(), self.config.fault_config))
            .collect();

        let logs: Vec<ThreadLog> = thread::scope(|s| {
            let handles: Vec<_> = envs
                .into_iter()
                .enumerate()
                .map(|(thread_id, env)| {
                    let list = &list;
                    s.spawn(move || self.run_thread(list, thread_id as u64, env))
                })
                .collect();

            handles
                .into_iter()
                .enumerate()
                .map(|(thread_id, handle)| {
                    handle.join().unwrap_or_else(|_| {
                        self.stop_with_violation(format!("Thread {} panicked", thread_id));
                        ThreadLog::default()
                    })
                })
                .collect()
        });

        let mut history = ListHistory::new();
        let mut faults_injected_count = 0;
        for log in logs {
            history.added.extend(log.added);
            history.deleted.extend(log.deleted);
            faults_injected_count += log.faults;
        }

        if !self.is_stopped() {
            self.invariant_checks_count.fetch_add(1, Ordering::Relaxed);
            let checker = LinkedListPropertyChecker::new(&list)
                .with_history(&history)
                .with_seed(self.seed.max(1));
            if !checker.all_hold() {
                self.stop_with_violation(checker.report());
            }
        }

        let violation = self
            .violation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let result = HarnessResult {
            seed: self.seed,
            operations_count: self.operations_count.load(Ordering::Relaxed),
            faults_injected_count,
            invariant_checks_count: self.invariant_checks_count.load(Ordering::Relaxed),
            iterations_completed: self.iterations_completed.load(Ordering::Relaxed),
            iterations_invalidated: self.iterations_invalidated.load(Ordering::Relaxed),
            all_invariants_held: violation.is_none(),
            first_violation: violation,
        };
        tracing::info!(result = %result.format(), "DST harness finished");
        result
    }

    fn run_thread<L>(
        &self,
        list: &L,
        thread_id: u64,
        mut env: DstEnv,
    ) -> ThreadLog
    where
        L: DstTestableList + LinkedListProperties,
    {
        let mut log = ThreadLog::default();
        let mut next_value = 0_u64;

        for _ in 0..self.config.operations_per_thread {
            if self.is_stopped() {
                break;
            }
            // Caller crashed before issuing the operation.
            if env.fault().should_fail() {
                continue;
            }
            if env.maybe_delay() {
                thread::yield_now();
            }

            let size = list.size();
            match env.rng().gen_range(0..5_u8) {
                0 | 1 => {
                    // Values are unique across threads: thread id in the high bits.
                    let value = (thread_id << 32) | next_value;
                    next_value += 1;
                    list.add(value);
                    log.added.push(value);
                }
                2 => {
                    let index = env.rng().gen_range(0..=size);
                    match list.delete(index) {
                        Ok(value) => log.deleted.push(value),
                        Err(ContainerError::IndexOutOfBounds { .. }) => {}
                        Err(err) => self.stop_with_violation(format!(
                            "Thread {}: delete({}) failed with {}",
                            thread_id, index, err
                        )),
                    }
                }
                3 => {
                    let index = env.rng().gen_range(0..=size);
                    match list.get(index) {
                        Ok(value) if (value >> 32) >= self.config.threads_count as u64 => {
                            self.stop_with_violation(format!(
                                "Thread {}: get({}) returned unknown value {:#x}",
                                thread_id, index, value
                            ));
                        }
                        Ok(_) | Err(ContainerError::IndexOutOfBounds { .. }) => {}
                        Err(err) => self.stop_with_violation(format!(
                            "Thread {}: get({}) failed with {}",
                            thread_id, index, err
                        )),
                    }
                    // No thread ever adds a value with all high bits set.
                    if list.contains(u64::MAX) {
                        self.stop_with_violation(format!(
                            "Thread {}: contains() found a value never added",
                            thread_id
                        ));
                    }
                }
                _ => self.traverse(list, thread_id),
            }

            let count = self.operations_count.fetch_add(1, Ordering::Relaxed) + 1;
            let interval = self.config.invariant_check_interval;
            if interval > 0 && count % interval == 0 {
                self.invariant_checks_count.fetch_add(1, Ordering::Relaxed);
                let checker = LinkedListPropertyChecker::new(list).with_seed(self.seed.max(1));
                let violations = checker.violations();
                if let Some(first) = violations.first() {
                    self.stop_with_violation(format!("Thread {}: {}", thread_id, first));
                }
            }
        }

        let stats = env.stats();
        tracing::debug!(thread_id, %stats, "worker finished");
        log.faults = stats.failures_injected + stats.delays_injected;
        log
    }

    /// Walk the whole list. A completed walk must not repeat a value.
    fn traverse<L: DstTestableList>(&self, list: &L, thread_id: u64) {
        match list.iterate() {
            Ok(values) => {
                let mut sorted = values.clone();
                sorted.sort_unstable();
                sorted.dedup();
                if sorted.len() != values.len() {
                    self.stop_with_violation(format!(
                        "Thread {}: completed traversal repeated a value: {:?}",
                        thread_id, values
                    ));
                }
                self.iterations_completed.fetch_add(1, Ordering::Relaxed);
            }
            Err(ContainerError::ConcurrentModification { .. }) => {
                self.iterations_invalidated.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => self.stop_with_violation(format!(
                "Thread {}: traversal failed with {}",
                thread_id, err
            )),
        }
    }
}
