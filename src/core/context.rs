use nalgebra::DVector;
use rand::rngs::StdRng;

use super::{
    base::ProblemError,
    domain::Domain,
    evaluator::Evaluator,
    function::Function,
    options::Options,
    recorder::FitnessRecorder,
    termination::{Termination, TerminationPolicy},
};

/// Shared state of a single optimization run handed to the [`Optimizer`]
/// methods.
///
/// The context owns the evaluator, the termination policy and the two
/// generators of the run. Algorithms evaluate points exclusively through
/// [`Context::evaluate`] or [`Context::evaluate_min`] and are expected to call
/// [`Context::should_stop`] before every evaluation in their inner loops.
///
/// [`Optimizer`]: super::optimizer::Optimizer
pub struct Context<'a, F: Function> {
    domain: Domain,
    initial: Option<DVector<f64>>,
    pub(crate) evaluator: Evaluator<'a, F>,
    pub(crate) termination: TerminationPolicy,
    rng_initialization: StdRng,
    rng_optimization: StdRng,
}

impl<'a, F: Function> Context<'a, F> {
    /// Creates the context of a new run. The generators are seeded from the
    /// options, so that runs with the same options are identical.
    pub fn new(
        f: &'a F,
        args: Option<&'a F::Args>,
        domain: Domain,
        initial: Option<DVector<f64>>,
        options: &Options,
    ) -> Self {
        let record = FitnessRecorder::new(options.saving_fitness()).is_enabled();
        let evaluator = Evaluator::new(f, args, domain.dim(), record);
        let termination = TerminationPolicy::new(options, f.is_maximization());
        let (rng_initialization, rng_optimization) = options.seeds().rngs();

        Self {
            domain,
            initial,
            evaluator,
            termination,
            rng_initialization,
            rng_optimization,
        }
    }

    /// Dimensionality of the problem.
    pub fn dim(&self) -> usize {
        self.domain.dim()
    }

    /// Domain of the problem.
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Evaluates the objective and returns the value in the convention of the
    /// problem, see [`Evaluator::evaluate`].
    pub fn evaluate(&mut self, x: &DVector<f64>) -> Result<f64, ProblemError> {
        self.evaluator.evaluate(x)
    }

    /// Evaluates the objective and returns the value in the internal
    /// (minimization) convention. Algorithms that compare values should use
    /// this method, so that they work for maximization problems as well.
    pub fn evaluate_min(&mut self, x: &DVector<f64>) -> Result<f64, ProblemError> {
        self.evaluator.evaluate_min(x)
    }

    /// Checks the stopping conditions.
    pub fn should_stop(&mut self) -> bool {
        self.check_termination().0
    }

    /// Checks the stopping conditions and returns also the reason.
    pub fn check_termination(&mut self) -> (bool, Termination) {
        self.termination
            .check(self.evaluator.n_evaluations(), self.evaluator.best_y())
    }

    /// Returns the starting point of a search segment.
    ///
    /// The point given by the user is used for the first segment. Restarts,
    /// or runs without the given point, sample it uniformly within the
    /// initial bounds using the initialization generator.
    pub fn initial_point(&mut self, is_restart: bool) -> DVector<f64> {
        match &self.initial {
            Some(x) if !is_restart => x.clone_owned(),
            _ => {
                let mut x = DVector::zeros(self.domain.dim());
                self.domain.sample(&mut x, &mut self.rng_initialization);
                x
            }
        }
    }

    /// Generator for the search loop.
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng_optimization
    }

    /// Number of evaluations so far.
    pub fn n_evaluations(&self) -> usize {
        self.evaluator.n_evaluations()
    }

    /// Best-so-far value in the internal (minimization) convention.
    pub fn best_y(&self) -> f64 {
        self.evaluator.best_y()
    }

    /// Copy of the best-so-far point.
    pub fn best_x(&self) -> Option<DVector<f64>> {
        self.evaluator.best_x()
    }

    /// Best value of the current search segment.
    pub fn segment_best_y(&self) -> f64 {
        self.evaluator.segment_best_y()
    }

    /// Marks the beginning of a new search segment after a restart.
    pub fn begin_segment(&mut self) {
        self.evaluator.begin_segment();
    }
}
