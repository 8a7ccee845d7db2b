//! Simulation environment bundling clock, randomness and faults.

use std::fmt;

use crate::clock::SimClock;
use crate::fault::{FaultConfig, FaultInjector};
use crate::random::DeterministicRng;

/// Everything a DST test needs, derived from one seed.
#[derive(Debug, Clone)]
pub struct DstEnv {
    seed: u64,
    rng: DeterministicRng,
    clock: SimClock,
    fault: FaultInjector,
}

/// Counters describing a DST run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DstEnvStats {
    pub seed: u64,
    pub elapsed_ns: u64,
    pub failures_injected: u64,
    pub delays_injected: u64,
}

impl DstEnv {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_fault_config(seed, FaultConfig::default())
    }

    #[must_use]
    pub fn with_fault_config(seed: u64, config: FaultConfig) -> Self {
        debug_assert!(seed != 0, "Seed should not be zero");
        Self {
            seed,
            rng: DeterministicRng::new(seed),
            clock: SimClock::new(),
            fault: FaultInjector::new(DeterministicRng::new(seed.wrapping_add(1)), config),
        }
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn rng(&mut self) -> &mut DeterministicRng {
        &mut self.rng
    }

    pub fn clock(&mut self) -> &mut SimClock {
        &mut self.clock
    }

    pub fn fault(&mut self) -> &mut FaultInjector {
        &mut self.fault
    }

    /// Advance simulated time if the injector decides this step is slow.
    /// Returns whether it did.
    pub fn maybe_delay(&mut self) -> bool {
        match self.fault.maybe_delay_us() {
            Some(us) => {
                self.clock.advance_us(us);
                true
            }
            None => false,
        }
    }

    /// `DST_SEED=<seed>`, ready to paste into a shell.
    #[must_use]
    pub fn format_seed(&self) -> String {
        format!("DST_SEED={}", self.seed)
    }

    #[must_use]
    pub fn stats(&self) -> DstEnvStats {
        DstEnvStats {
            seed: self.seed,
            elapsed_ns: self.clock.now_ns(),
            failures_injected: self.fault.failures_injected(),
            delays_injected: self.fault.delays_injected(),
        }
    }
}

impl fmt::Display for DstEnvStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DST_SEED={} elapsed={}ns failures={} delays={}",
            self.seed, self.elapsed_ns, self.failures_injected, self.delays_injected
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_is_reproducible() {
        let run = |seed| {
            let mut env = DstEnv::new(seed);
            let mut draws = Vec::new();
            for _ in 0..50 {
                env.maybe_delay();
                draws.push(env.rng().gen_range(0..100_u64));
                let _ = env.fault().should_fail();
            }
            (draws, env.stats())
        };
        assert_eq!(run(1234), run(1234));
    }

    #[test]
    fn test_format_seed() {
        let env = DstEnv::with_fault_config(77, FaultConfig::none());
        assert_eq!(env.format_seed(), "DST_SEED=77");
        assert!(env.stats().to_string().starts_with("DST_SEED=77"));
    }
}
