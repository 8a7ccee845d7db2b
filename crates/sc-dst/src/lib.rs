//! # sc-dst
//!
//! Deterministic Simulation Testing for guarded containers.
//!
//! Simulated time, randomness and faults all derive from one seed, so a
//! failing run can be replayed exactly.
//!
//! ## Runners
//!
//! - `fault_injection`: single-threaded runner that checks a list against a
//!   `Vec` model, with faults injected at operation boundaries
//! - `harness`: real threads hammering a shared list, with invariant checks
//!   while it runs and at the end
//!
//! ## Usage
//!
//! ```rust
//! use sc_dst::DstEnv;
//!
//! let mut env = DstEnv::new(12345);
//!
//! env.clock().advance_ns(1_000_000);
//! let value: u64 = env.rng().gen();
//! let choice = env.rng().gen_range(0..10);
//! if env.fault().should_fail() {
//!     // Simulate failure
//! }
//! ```
//!
//! ## Reproducibility
//!
//! ```bash
//! DST_SEED=12345 cargo test -p sc-dst
//! ```

pub mod clock;
pub mod env;
pub mod fault;
pub mod fault_injection;
pub mod harness;
pub mod random;

pub use clock::SimClock;
pub use env::{DstEnv, DstEnvStats};
pub use fault::{FaultConfig, FaultInjector};
pub use fault_injection::{
    run_dst_scenario, DstOp, DstResult, DstRunner, DstStats, DstTestableList, FaultPoint, FaultType,
};
pub use harness::{DstHarness, HarnessConfig, HarnessResult};
pub use random::DeterministicRng;

/// Get DST seed from environment or generate random one.
///
/// Prints the seed for reproduction. Use `DST_SEED=<seed>` to reproduce.
/// An unparseable `DST_SEED` is reported and replaced by a random seed.
#[must_use]
pub fn get_or_generate_seed() -> u64 {
    let from_env = std::env::var("DST_SEED").ok().and_then(|s| match s.parse::<u64>() {
        Ok(seed) if seed != 0 => Some(seed),
        _ => {
            tracing::warn!(value = %s, "ignoring invalid DST_SEED");
            None
        }
    });

    match from_env {
        Some(seed) => {
            println!("DST_SEED={} (from environment)", seed);
            seed
        }
        None => {
            let seed = rand::random::<u64>().max(1);
            println!("DST_SEED={} (randomly generated)", seed);
            seed
        }
    }
}

/// Iteration count for DST loops, from `DST_ITERATIONS` or `default`.
#[must_use]
pub fn iterations_or(default: u64) -> u64 {
    std::env::var("DST_ITERATIONS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
