use std::time::Duration;

use getset::{CopyGetters, Setters};
use rand::{rngs::StdRng, Rng, SeedableRng};

use super::base::ConfigError;

/// Options common to all optimizers.
///
/// ```rust
/// use std::time::Duration;
/// use bbopt::Options;
///
/// let mut options = Options::default();
/// options
///     .set_max_function_evaluations(Some(5000))
///     .set_max_runtime(Some(Duration::from_secs(10)))
///     .set_seed_rng(2022);
/// ```
#[derive(Debug, Clone, CopyGetters, Setters)]
#[getset(get_copy = "pub", set = "pub")]
pub struct Options {
    /// Maximum number of function evaluations. Default: unbounded.
    max_function_evaluations: Option<usize>,
    /// Maximum wall-clock runtime. Default: unbounded.
    max_runtime: Option<Duration>,
    /// Stop when the best-so-far value is at least as good as this value (in
    /// the sign convention of the problem). Default: none.
    fitness_threshold: Option<f64>,
    /// Top-level seed from which the initialization and optimization seeds are
    /// derived when not given explicitly. Default: `0`.
    seed_rng: u64,
    /// Seed for sampling starting points. Default: derived from `seed_rng`.
    seed_initialization: Option<u64>,
    /// Seed for sampling during the search. Default: derived from `seed_rng`.
    seed_optimization: Option<u64>,
    /// Stride of the compressed fitness history. `0` disables the history.
    /// Default: `0`.
    saving_fitness: usize,
    /// Report progress every this many generations. `0` disables reporting.
    /// Default: `10`.
    verbose: usize,
    /// Allow the algorithm to restart on stagnation. Default: `true`.
    is_restart: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_function_evaluations: None,
            max_runtime: None,
            fitness_threshold: None,
            seed_rng: 0,
            seed_initialization: None,
            seed_optimization: None,
            saving_fitness: 0,
            verbose: 10,
            is_restart: true,
        }
    }
}

impl Options {
    /// Checks the option values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_function_evaluations == Some(0) {
            return Err(ConfigError::option(
                "max_function_evaluations",
                0.0,
                "must be positive",
            ));
        }

        if let Some(threshold) = self.fitness_threshold {
            if threshold.is_nan() {
                return Err(ConfigError::option(
                    "fitness_threshold",
                    threshold,
                    "must not be NaN",
                ));
            }
        }

        Ok(())
    }

    /// Resolves the seeds of the two generators.
    pub fn seeds(&self) -> Seeds {
        // Both seeds are always drawn, so that setting one of them explicitly
        // does not shift the other.
        let mut rng = StdRng::seed_from_u64(self.seed_rng);
        let initialization: u64 = rng.gen();
        let optimization: u64 = rng.gen();

        Seeds {
            initialization: self.seed_initialization.unwrap_or(initialization),
            optimization: self.seed_optimization.unwrap_or(optimization),
        }
    }
}

/// Seeds of the two independent generators of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seeds {
    /// Seed of the generator for sampling starting points.
    pub initialization: u64,
    /// Seed of the generator used by the search loop.
    pub optimization: u64,
}

impl Seeds {
    /// Creates the generators.
    pub fn rngs(&self) -> (StdRng, StdRng) {
        (
            StdRng::seed_from_u64(self.initialization),
            StdRng::seed_from_u64(self.optimization),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_are_deterministic() {
        let options = Options::default();
        assert_eq!(options.seeds(), options.seeds());
    }

    #[test]
    fn explicit_seed_does_not_shift_other() {
        let mut options = Options::default();
        options.set_seed_rng(42);
        let derived = options.seeds();

        options.set_seed_initialization(Some(7));
        let seeds = options.seeds();

        assert_eq!(seeds.initialization, 7);
        assert_eq!(seeds.optimization, derived.optimization);
    }

    #[test]
    fn different_top_level_seeds() {
        let mut a = Options::default();
        a.set_seed_rng(1);
        let mut b = Options::default();
        b.set_seed_rng(2);

        assert_ne!(a.seeds(), b.seeds());
    }

    #[test]
    fn zero_budget_rejected() {
        let mut options = Options::default();
        options.set_max_function_evaluations(Some(0));
        assert!(options.validate().is_err());
    }
}
