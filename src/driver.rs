//! High-level API for optimization.
//!
//! This module contains the driver that encapsulates all internal state of a
//! run and provides a simple API to execute the iterative process of an
//! [`Optimizer`] until a stopping condition is satisfied.
//!
//! The simplest way of using the driver is to initialize it with the defaults:
//!
//! ```rust
//! use bbopt::{Domain, Objective, OptimizerDriver};
//!
//! let f = Objective::new(Domain::rect(vec![-5.0; 2], vec![5.0; 2]), |x| {
//!     x.iter().map(|xi| xi * xi).sum()
//! });
//!
//! let mut optimizer = OptimizerDriver::new(&f)?;
//! # Ok::<(), bbopt::ConfigError>(())
//! ```
//!
//! If you need to specify additional settings, use the builder:
//!
//! ```rust
//! use bbopt::{algo::PatternSearch, Domain, Objective, OptimizerDriver, Options};
//!
//! let f = Objective::new(Domain::rect(vec![-5.0; 2], vec![5.0; 2]), |x| {
//!     x.iter().map(|xi| xi * xi).sum()
//! });
//!
//! let mut options = Options::default();
//! options
//!     .set_max_function_evaluations(Some(1000))
//!     .set_fitness_threshold(Some(1e-8));
//!
//! let mut optimizer = OptimizerDriver::builder(&f)
//!     .with_options(options)
//!     .with_initial(vec![3.0, -2.0])
//!     .with_algo(PatternSearch::new)
//!     .with_progress(|progress| println!("{}", progress.best_so_far_y()))
//!     .build()?;
//! # Ok::<(), bbopt::ConfigError>(())
//! ```
//!
//! Once you have the optimizer, you can run it:
//!
//! ```rust
//! # use bbopt::{Domain, Objective, OptimizerDriver, Options};
//! #
//! # let f = Objective::new(Domain::rect(vec![-5.0; 2], vec![5.0; 2]), |x| {
//! #     x.iter().map(|xi| xi * xi).sum()
//! # });
//! #
//! # let mut options = Options::default();
//! # options.set_max_function_evaluations(Some(1000));
//! #
//! # let mut optimizer = OptimizerDriver::builder(&f).with_options(options).build().unwrap();
//! #
//! let results = optimizer.optimize().expect("optimizer error");
//! println!(
//!     "f(x) = {} after {} evaluations ({})",
//!     results.best_so_far_y(),
//!     results.n_function_evaluations(),
//!     results.termination().as_str(),
//! );
//! ```

use log::{debug, info};
use nalgebra::DVector;

use crate::{
    algo::EvolutionStrategy, ConfigError, Context, Domain, FitnessRecorder, Function, Optimizer,
    Options, Results,
};

type ProgressCallback<'a> = Box<dyn FnMut(&Progress<'_>) + 'a>;

/// Builder for the [`OptimizerDriver`].
pub struct OptimizerBuilder<'a, F: Function, A> {
    f: &'a F,
    dom: Domain,
    algo: A,
    options: Options,
    x0: Option<Vec<f64>>,
    args: Option<&'a F::Args>,
    progress: Option<ProgressCallback<'a>>,
}

impl<'a, F: Function> OptimizerBuilder<'a, F, EvolutionStrategy> {
    fn new(f: &'a F) -> Self {
        let dom = f.domain();
        let algo = EvolutionStrategy::new(f, &dom);

        Self {
            f,
            dom,
            algo,
            options: Options::default(),
            x0: None,
            args: None,
            progress: None,
        }
    }
}

impl<'a, F: Function, A> OptimizerBuilder<'a, F, A> {
    /// Sets the options common to all optimizers.
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Sets the initial point from which the iterative process starts. If not
    /// set, the point is sampled within the initial bounds of the domain.
    pub fn with_initial(mut self, x0: Vec<f64>) -> Self {
        self.x0 = Some(x0);
        self
    }

    /// Sets the extra arguments passed to every evaluation of the objective.
    pub fn with_args(mut self, args: &'a F::Args) -> Self {
        self.args = Some(args);
        self
    }

    /// Sets specific algorithm to be used.
    ///
    /// This builder method accepts a closure that takes the reference to the
    /// problem and its domain. For algorithms in bbopt, you can simply pass
    /// the `new` constructor directly (e.g., `PatternSearch::new`).
    pub fn with_algo<A2, FA>(self, factory: FA) -> OptimizerBuilder<'a, F, A2>
    where
        FA: FnOnce(&F, &Domain) -> A2,
    {
        let algo = factory(self.f, &self.dom);

        OptimizerBuilder {
            f: self.f,
            dom: self.dom,
            algo,
            options: self.options,
            x0: self.x0,
            args: self.args,
            progress: self.progress,
        }
    }

    /// Sets the callback invoked every [`verbose`](Options::verbose)
    /// generations and once more at termination.
    pub fn with_progress<C>(mut self, callback: C) -> Self
    where
        C: FnMut(&Progress<'_>) + 'a,
    {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Builds the [`OptimizerDriver`]. Fails if the domain, the options or
    /// the initial point are invalid.
    pub fn build(self) -> Result<OptimizerDriver<'a, F, A>, ConfigError> {
        let Self {
            f,
            dom,
            algo,
            options,
            x0,
            args,
            progress,
        } = self;

        dom.validate()?;
        options.validate()?;

        let x0 = match x0 {
            Some(x0) if x0.len() != dom.dim() => {
                return Err(ConfigError::InitialDimension {
                    expected: dom.dim(),
                    actual: x0.len(),
                })
            }
            Some(x0) => Some(DVector::from_vec(x0)),
            None => None,
        };

        Ok(OptimizerDriver {
            f,
            dom,
            algo,
            options,
            x0,
            args,
            progress,
        })
    }
}

/// The driver for the process of optimization.
///
/// For default settings, use [`OptimizerDriver::new`]. For more flexibility,
/// use [`OptimizerDriver::builder`]. For the usage of the driver, see
/// [module](self) documentation.
pub struct OptimizerDriver<'a, F: Function, A> {
    f: &'a F,
    dom: Domain,
    algo: A,
    options: Options,
    x0: Option<DVector<f64>>,
    args: Option<&'a F::Args>,
    progress: Option<ProgressCallback<'a>>,
}

impl<'a, F: Function> OptimizerDriver<'a, F, EvolutionStrategy> {
    /// Returns the builder for specifying additional settings.
    pub fn builder(f: &'a F) -> OptimizerBuilder<'a, F, EvolutionStrategy> {
        OptimizerBuilder::new(f)
    }

    /// Initializes the driver with the default settings.
    pub fn new(f: &'a F) -> Result<Self, ConfigError> {
        OptimizerDriver::builder(f).build()
    }
}

impl<'a, F: Function, A> OptimizerDriver<'a, F, A> {
    /// Returns reference to the options.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Returns reference to the domain.
    pub fn domain(&self) -> &Domain {
        &self.dom
    }

    /// Returns reference to the algorithm.
    pub fn algo(&self) -> &A {
        &self.algo
    }
}

impl<'a, F: Function, A: Optimizer<F>> OptimizerDriver<'a, F, A> {
    /// Runs the iterative process until a stopping condition is satisfied.
    ///
    /// Every call starts a fresh run with its own evaluator, termination state
    /// and generators, so repeated calls with the same settings give identical
    /// results. Objective failures abort the run and are returned as errors.
    pub fn optimize(&mut self) -> Result<Results, A::Error> {
        let mut ctx = Context::new(
            self.f,
            self.args,
            self.dom.clone(),
            self.x0.clone(),
            &self.options,
        );

        debug!(
            "optimizing {} ({} dimensions) with {}",
            self.f.name().unwrap_or("unnamed problem"),
            ctx.dim(),
            A::NAME
        );

        self.algo.initialize(&mut ctx)?;

        let mut n_generations = 0;
        self.report(&mut ctx, n_generations, false);

        loop {
            self.algo.iterate(&mut ctx)?;

            if ctx.should_stop() {
                break;
            }

            n_generations += 1;
            self.report(&mut ctx, n_generations, false);

            if self.options.is_restart() && self.algo.restart(&mut ctx)? {
                debug!(
                    "{} restarted after {} generations",
                    A::NAME,
                    n_generations
                );
            }
        }

        self.report(&mut ctx, n_generations, true);

        Ok(self.collect(ctx, n_generations))
    }

    /// Swaps the objective and runs the iterative process. The domain, the
    /// initial point and the options given to the builder are kept.
    pub fn optimize_with(&mut self, f: &'a F) -> Result<Results, A::Error> {
        self.f = f;
        self.optimize()
    }

    /// Returns the name of the used optimizer.
    pub fn name(&self) -> &str {
        A::NAME
    }

    fn report(&mut self, ctx: &mut Context<'a, F>, generation: usize, terminated: bool) {
        let recent = ctx.evaluator.take_recent();
        let verbose = self.options.verbose();

        if verbose == 0 || (!terminated && generation % verbose != 0) {
            return;
        }

        let evaluator = &ctx.evaluator;
        let fitness = if evaluator.is_maximization() {
            recent.iter().map(|y| -y).collect()
        } else {
            recent
        };

        let progress = Progress {
            generation,
            n_function_evaluations: evaluator.n_evaluations(),
            best_so_far_y: evaluator.external(evaluator.best_y()),
            fitness: &fitness,
        };

        info!(
            "generation {}: {} evaluations, best so far {}",
            progress.generation, progress.n_function_evaluations, progress.best_so_far_y
        );

        if let Some(callback) = self.progress.as_mut() {
            callback(&progress);
        }
    }

    fn collect(&self, mut ctx: Context<'a, F>, n_generations: usize) -> Results {
        let termination = ctx.termination.signal();
        let runtime = ctx.termination.elapsed();

        let recorder = FitnessRecorder::new(self.options.saving_fitness());
        let evaluator = &mut ctx.evaluator;
        let maximize = evaluator.is_maximization();

        let fitness = evaluator
            .take_history()
            .and_then(|history| recorder.compress(history))
            .map(|table| if maximize { table.map_values(|y| -y) } else { table });

        let mut results = Results::new(
            evaluator.best_x(),
            evaluator.external(evaluator.best_y()),
            evaluator.n_evaluations(),
            runtime,
            evaluator.time_evaluations(),
            termination,
            fitness,
            n_generations,
        );

        self.algo.finish(&mut results);

        info!(
            "{} terminated ({}) after {} evaluations, best so far {}",
            A::NAME,
            termination.as_str(),
            results.n_function_evaluations(),
            results.best_so_far_y()
        );

        results
    }
}

/// Snapshot of the run passed to the progress callback. All values are in the
/// sign convention of the problem.
pub struct Progress<'a> {
    generation: usize,
    n_function_evaluations: usize,
    best_so_far_y: f64,
    fitness: &'a [f64],
}

impl<'a> Progress<'a> {
    /// Number of completed generations.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Number of evaluations so far.
    pub fn n_function_evaluations(&self) -> usize {
        self.n_function_evaluations
    }

    /// Best-so-far value.
    pub fn best_so_far_y(&self) -> f64 {
        self.best_so_far_y
    }

    /// Values evaluated in the most recent generation.
    pub fn fitness(&self) -> &[f64] {
        self.fitness
    }
}
