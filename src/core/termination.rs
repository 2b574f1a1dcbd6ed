use std::time::{Duration, Instant};

use super::options::Options;

/// Reason of stopping the optimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Termination {
    /// No stopping condition is satisfied.
    #[default]
    None,
    /// The number of evaluations reached the maximum.
    MaxFunctionEvaluations,
    /// The runtime reached the maximum.
    MaxRuntime,
    /// The best-so-far value reached the fitness threshold.
    FitnessThreshold,
}

impl Termination {
    /// Returns the name of the termination reason.
    pub fn as_str(&self) -> &str {
        match self {
            Termination::None => "no termination",
            Termination::MaxFunctionEvaluations => "max function evaluations",
            Termination::MaxRuntime => "max runtime",
            Termination::FitnessThreshold => "fitness threshold",
        }
    }
}

/// Decides whether to stop the optimization.
///
/// The conditions are checked in a fixed priority order: the number of
/// evaluations, the runtime and the fitness threshold. Once a condition is
/// satisfied, the reason is kept for the rest of the run.
#[derive(Debug, Clone)]
pub struct TerminationPolicy {
    max_function_evaluations: Option<usize>,
    max_runtime: Option<Duration>,
    threshold: Option<f64>,
    start: Instant,
    signal: Termination,
}

impl TerminationPolicy {
    /// Creates the policy from the options. The start time is set to now.
    ///
    /// The fitness threshold is converted into the internal (minimization)
    /// convention here, so that it can be compared with the values of the
    /// evaluator directly.
    pub fn new(options: &Options, maximize: bool) -> Self {
        let threshold = options
            .fitness_threshold()
            .map(|threshold| if maximize { -threshold } else { threshold });

        Self {
            max_function_evaluations: options.max_function_evaluations(),
            max_runtime: options.max_runtime(),
            threshold,
            start: Instant::now(),
            signal: Termination::None,
        }
    }

    /// Time elapsed since the start of the run.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// The termination reason determined so far.
    pub fn signal(&self) -> Termination {
        self.signal
    }

    /// Checks the stopping conditions given the number of evaluations and the
    /// best-so-far value in the internal convention.
    pub fn check(&mut self, n_evaluations: usize, best_y: f64) -> (bool, Termination) {
        if self.signal != Termination::None {
            return (true, self.signal);
        }

        let signal = if self
            .max_function_evaluations
            .map_or(false, |max| n_evaluations >= max)
        {
            Termination::MaxFunctionEvaluations
        } else if self
            .max_runtime
            .map_or(false, |max| self.start.elapsed() >= max)
        {
            Termination::MaxRuntime
        } else if self.threshold.map_or(false, |threshold| best_y <= threshold) {
            Termination::FitnessThreshold
        } else {
            Termination::None
        };

        self.signal = signal;
        (signal != Termination::None, signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_conditions() {
        let mut policy = TerminationPolicy::new(&Options::default(), false);
        assert_eq!(policy.check(1_000_000, f64::NEG_INFINITY), (false, Termination::None));
    }

    #[test]
    fn evaluations_before_threshold() {
        let mut options = Options::default();
        options
            .set_max_function_evaluations(Some(10))
            .set_fitness_threshold(Some(1.0));

        let mut policy = TerminationPolicy::new(&options, false);
        assert_eq!(
            policy.check(10, 0.0),
            (true, Termination::MaxFunctionEvaluations)
        );
    }

    #[test]
    fn runtime_before_threshold() {
        let mut options = Options::default();
        options
            .set_max_runtime(Some(Duration::ZERO))
            .set_fitness_threshold(Some(1.0));

        let mut policy = TerminationPolicy::new(&options, false);
        assert_eq!(policy.check(0, 0.0), (true, Termination::MaxRuntime));
    }

    #[test]
    fn threshold_minimization() {
        let mut options = Options::default();
        options.set_fitness_threshold(Some(1.0));

        let mut policy = TerminationPolicy::new(&options, false);
        assert_eq!(policy.check(5, 1.5), (false, Termination::None));
        assert_eq!(policy.check(6, 1.0), (true, Termination::FitnessThreshold));
    }

    #[test]
    fn threshold_maximization() {
        let mut options = Options::default();
        options.set_fitness_threshold(Some(1.0));

        // Internal values are negated, so the original value 0.5 is -0.5.
        let mut policy = TerminationPolicy::new(&options, true);
        assert_eq!(policy.check(5, -0.5), (false, Termination::None));
        assert_eq!(policy.check(6, -1.5), (true, Termination::FitnessThreshold));
    }

    #[test]
    fn signal_is_sticky() {
        let mut options = Options::default();
        options
            .set_max_function_evaluations(Some(3))
            .set_fitness_threshold(Some(0.0));

        let mut policy = TerminationPolicy::new(&options, false);
        assert_eq!(policy.check(2, -1.0), (true, Termination::FitnessThreshold));
        assert_eq!(policy.check(3, -1.0), (true, Termination::FitnessThreshold));
        assert_eq!(policy.signal(), Termination::FitnessThreshold);
    }
}
