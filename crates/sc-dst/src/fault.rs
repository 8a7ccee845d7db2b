//! Fault injection configuration and decisions.

use sc_core::ConfigError;

use crate::random::DeterministicRng;

/// How often faults fire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaultConfig {
    /// Probability that an operation boundary injects a failure
    pub failure_probability: f64,
    /// Probability that an operation boundary injects a delay
    pub delay_probability: f64,
    /// Upper bound for a single injected delay
    pub max_delay_us: u64,
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self {
            failure_probability: 0.05,
            delay_probability: 0.1,
            max_delay_us: 100,
        }
    }
}

impl FaultConfig {
    /// No faults at all.
    pub fn none() -> Self {
        Self {
            failure_probability: 0.0,
            delay_probability: 0.0,
            max_delay_us: 0,
        }
    }

    /// Configuration for stress testing.
    pub fn aggressive() -> Self {
        Self {
            failure_probability: 0.2,
            delay_probability: 0.3,
            max_delay_us: 1_000,
        }
    }

    /// # Errors
    ///
    /// `InvalidProbability` when either probability is outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for p in [self.failure_probability, self.delay_probability] {
            if p.is_nan() || !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::InvalidProbability(p));
            }
        }
        Ok(())
    }
}

/// Decides, deterministically, when a fault fires.
#[derive(Debug, Clone)]
pub struct FaultInjector {
    rng: DeterministicRng,
    config: FaultConfig,
    failures_injected: u64,
    delays_injected: u64,
}

impl FaultInjector {
    #[must_use]
    pub fn new(rng: DeterministicRng, config: FaultConfig) -> Self {
        Self {
            rng,
            config,
            failures_injected: 0,
            delays_injected: 0,
        }
    }

    #[must_use]
    pub fn config(&self) -> &FaultConfig {
        &self.config
    }

    pub fn should_fail(&mut self) -> bool {
        let fail = self.rng.gen_bool(self.config.failure_probability);
        if fail {
            self.failures_injected += 1;
        }
        fail
    }

    /// Length of an injected delay, if one fires.
    pub fn maybe_delay_us(&mut self) -> Option<u64> {
        if self.config.max_delay_us == 0 || !self.rng.gen_bool(self.config.delay_probability) {
            return None;
        }
        self.delays_injected += 1;
        Some(self.rng.gen_range(1..=self.config.max_delay_us))
    }

    /// Pick uniformly among `choices`. Used to choose which fault fires.
    pub fn pick<T: Copy>(&mut self, choices: &[T]) -> Option<T> {
        self.rng.choose(choices).copied()
    }

    #[must_use]
    pub fn failures_injected(&self) -> u64 {
        self.failures_injected
    }

    #[must_use]
    pub fn delays_injected(&self) -> u64 {
        self.delays_injected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_never_fires() {
        let mut injector = FaultInjector::new(DeterministicRng::new(1), FaultConfig::none());
        for _ in 0..1000 {
            assert!(!injector.should_fail());
            assert!(injector.maybe_delay_us().is_none());
        }
        assert_eq!(injector.failures_injected(), 0);
    }

    #[test]
    fn test_aggressive_fires() {
        let mut injector = FaultInjector::new(DeterministicRng::new(1), FaultConfig::aggressive());
        let failures = (0..1000).filter(|_| injector.should_fail()).count();
        assert!(failures > 100 && failures < 300, "failures={}", failures);
        assert_eq!(injector.failures_injected(), failures as u64);

        let delay = (0..100).find_map(|_| injector.maybe_delay_us());
        assert!(matches!(delay, Some(d) if (1..=1_000).contains(&d)));
    }

    #[test]
    fn test_validate() {
        assert!(FaultConfig::default().validate().is_ok());
        let bad = FaultConfig {
            failure_probability: 1.5,
            ..FaultConfig::none()
        };
        assert_eq!(bad.validate(), Err(ConfigError::InvalidProbability(1.5)));
    }
}
