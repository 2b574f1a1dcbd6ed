use std::time::Duration;

use getset::{CopyGetters, Getters, Setters};
use nalgebra::DVector;

use super::{recorder::FitnessTable, termination::Termination};

/// Results of a completed optimization run.
///
/// All values are in the sign convention of the problem, i.e., for
/// maximization problems the best-so-far value is the maximum found.
///
/// The results are read-only:
///
/// ```compile_fail
/// fn tamper(results: &mut bbopt::Results) {
///     results.set_n_restarts(10);
/// }
/// ```
#[derive(Debug, Clone, CopyGetters, Getters, Setters)]
pub struct Results {
    /// The best point found. It is `None` only if no evaluation succeeded.
    #[getset(get = "pub")]
    best_so_far_x: Option<DVector<f64>>,
    /// The best value found.
    #[getset(get_copy = "pub")]
    best_so_far_y: f64,
    /// Total number of evaluations.
    #[getset(get_copy = "pub")]
    n_function_evaluations: usize,
    /// Total wall-clock time of the run.
    #[getset(get_copy = "pub")]
    runtime: Duration,
    /// Total time spent inside the objective.
    #[getset(get_copy = "pub")]
    time_function_evaluations: Duration,
    /// The reason of stopping.
    #[getset(get_copy = "pub")]
    termination: Termination,
    /// Compressed fitness history, if enabled by
    /// [`Options::saving_fitness`](super::options::Options::saving_fitness).
    #[getset(get = "pub")]
    fitness: Option<FitnessTable>,
    /// Number of completed generations.
    #[getset(get_copy = "pub")]
    n_generations: usize,
    /// Number of restarts performed by the algorithm.
    #[getset(get_copy = "pub", set = "pub(crate)")]
    n_restarts: usize,
    /// Final step size of the algorithm, if it has one.
    #[getset(get_copy = "pub", set = "pub(crate)")]
    sigma: Option<f64>,
    /// Final mean of the search distribution, if the algorithm has one.
    #[getset(get = "pub", set = "pub(crate)")]
    mean: Option<DVector<f64>>,
}

impl Results {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        best_so_far_x: Option<DVector<f64>>,
        best_so_far_y: f64,
        n_function_evaluations: usize,
        runtime: Duration,
        time_function_evaluations: Duration,
        termination: Termination,
        fitness: Option<FitnessTable>,
        n_generations: usize,
    ) -> Self {
        Self {
            best_so_far_x,
            best_so_far_y,
            n_function_evaluations,
            runtime,
            time_function_evaluations,
            termination,
            fitness,
            n_generations,
            n_restarts: 0,
            sigma: None,
            mean: None,
        }
    }
}
