//! Hooke-Jeeves pattern search.
//!
//! [Pattern search](https://en.wikipedia.org/wiki/Pattern_search_(optimization))
//! probes the neighborhood of the incumbent point along every coordinate axis
//! with the current step size. If some probe improves the incumbent, the best
//! of them becomes the new incumbent, otherwise the step size shrinks. The
//! method is deterministic given the starting point.
//!
//! When restarts are enabled, the search starts over from a freshly sampled
//! point once the step size collapses or the best value of the search segment
//! stagnates.
//!
//! # References
//!
//! \[1\] ["Direct Search" Solution of Numerical and Statistical
//! Problems](https://dl.acm.org/doi/10.1145/321062.321069)
//!
//! \[2\] [Direct search methods: Then and
//! now](https://www.sciencedirect.com/science/article/pii/S0377042700004234)

use getset::{CopyGetters, Setters};
use log::debug;
use nalgebra::DVector;

use super::stagnation::Stagnation;
use crate::core::{
    ConfigError, Context, Domain, Function, Optimizer, Problem, ProblemError, Results, Step,
};

/// Options for [`PatternSearch`] optimizer.
#[derive(Debug, Clone, CopyGetters, Setters)]
#[getset(get_copy = "pub", set = "pub")]
pub struct PatternSearchOptions {
    /// Initial step size. Default: `1`.
    sigma: f64,
    /// Shrinking factor of the step size, must be in (0, 1). Default: `0.5`.
    gamma: f64,
    /// Restart when the step size drops below this value. Default: `1e-12`.
    sigma_threshold: f64,
    /// Number of generations considered for stagnation. Default: `max(30,
    /// n)`.
    stagnation: Option<usize>,
    /// Minimal improvement over the stagnation window. Default: `1e-12`.
    fitness_diff: f64,
}

impl Default for PatternSearchOptions {
    fn default() -> Self {
        Self {
            sigma: 1.0,
            gamma: 0.5,
            sigma_threshold: 1e-12,
            stagnation: None,
            fitness_diff: 1e-12,
        }
    }
}

impl PatternSearchOptions {
    /// Checks that the options are valid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.sigma > 0.0) {
            return Err(ConfigError::option("sigma", self.sigma, "must be positive"));
        }

        if !(self.gamma > 0.0 && self.gamma < 1.0) {
            return Err(ConfigError::option(
                "gamma",
                self.gamma,
                "must be in (0, 1)",
            ));
        }

        if !(self.sigma_threshold >= 0.0) {
            return Err(ConfigError::option(
                "sigma_threshold",
                self.sigma_threshold,
                "must be non-negative",
            ));
        }

        if self.stagnation == Some(0) {
            return Err(ConfigError::option("stagnation", 0.0, "must be positive"));
        }

        if !(self.fitness_diff >= 0.0) {
            return Err(ConfigError::option(
                "fitness_diff",
                self.fitness_diff,
                "must be non-negative",
            ));
        }

        Ok(())
    }

    fn window(&self, dim: usize) -> usize {
        self.stagnation.unwrap_or_else(|| dim.max(30))
    }
}

/// Pattern search optimizer.
///
/// See [module](self) documentation for more details.
pub struct PatternSearch {
    options: PatternSearchOptions,
    sigma: f64,
    x: DVector<f64>,
    y: f64,
    probe: DVector<f64>,
    stagnation: Stagnation,
    n_restarts: usize,
}

impl PatternSearch {
    /// Initializes pattern search optimizer with default options.
    pub fn new<F: Problem>(f: &F, dom: &Domain) -> Self {
        let _ = f;
        Self::init(dom, PatternSearchOptions::default())
    }

    /// Initializes pattern search optimizer with given options.
    pub fn with_options<F: Problem>(
        f: &F,
        dom: &Domain,
        options: PatternSearchOptions,
    ) -> Result<Self, ConfigError> {
        let _ = f;
        options.validate()?;
        Ok(Self::init(dom, options))
    }

    fn init(dom: &Domain, options: PatternSearchOptions) -> Self {
        let dim = dom.dim();
        let stagnation = Stagnation::new(options.window(dim), options.fitness_diff);

        Self {
            sigma: options.sigma,
            options,
            x: DVector::zeros(dim),
            y: f64::INFINITY,
            probe: DVector::zeros(dim),
            stagnation,
            n_restarts: 0,
        }
    }

    /// Current step size.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Current incumbent point.
    pub fn incumbent(&self) -> &DVector<f64> {
        &self.x
    }

    fn start<F: Function>(
        &mut self,
        ctx: &mut Context<'_, F>,
        is_restart: bool,
    ) -> Result<(), ProblemError> {
        let mut x = ctx.initial_point(is_restart);
        ctx.domain().project(&mut x);

        self.y = ctx.evaluate_min(&x)?;
        self.x = x;
        self.sigma = self.options.sigma;
        self.stagnation.reset(self.options.window(ctx.dim()));

        Ok(())
    }
}

impl<F: Function> Optimizer<F> for PatternSearch {
    const NAME: &'static str = "Pattern search";

    type Error = ProblemError;

    fn initialize(&mut self, ctx: &mut Context<'_, F>) -> Result<(), Self::Error> {
        self.n_restarts = 0;
        self.start(ctx, false)
    }

    fn iterate(&mut self, ctx: &mut Context<'_, F>) -> Result<Step, Self::Error> {
        let Self {
            sigma,
            x,
            y,
            probe,
            options,
            ..
        } = self;

        let mut best: Option<(DVector<f64>, f64)> = None;
        let mut best_y = *y;

        for i in 0..ctx.dim() {
            for step in [-*sigma, *sigma] {
                if ctx.should_stop() {
                    return Ok(Step::Aborted);
                }

                probe.copy_from(&*x);
                probe[i] += step;
                ctx.domain().project(probe);

                let yp = ctx.evaluate_min(probe)?;

                // Ties keep the probe found first.
                if yp < best_y {
                    best_y = yp;
                    best = Some((probe.clone_owned(), yp));
                }
            }
        }

        match best {
            Some((xb, yb)) => {
                debug!("moving incumbent, f(x) improved from {} to {}", y, yb);
                *x = xb;
                *y = yb;
            }
            None => {
                *sigma *= options.gamma;
                debug!("no improving probe, shrinking step size to {}", sigma);
            }
        }

        Ok(Step::Completed)
    }

    fn restart(&mut self, ctx: &mut Context<'_, F>) -> Result<bool, Self::Error> {
        self.stagnation.push(ctx.segment_best_y());

        let collapsed = self.sigma < self.options.sigma_threshold;
        if !collapsed && !self.stagnation.is_stagnating() {
            return Ok(false);
        }

        debug!(
            "restarting pattern search (step size {}, segment best {})",
            self.sigma,
            ctx.segment_best_y()
        );

        ctx.begin_segment();
        self.start(ctx, true)?;
        self.n_restarts += 1;

        Ok(true)
    }

    fn finish(&self, results: &mut Results) {
        results
            .set_n_restarts(self.n_restarts)
            .set_sigma(Some(self.sigma));
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::dvector;

    use super::*;
    use crate::core::{Objective, Options, Termination};
    use crate::testing::*;

    #[test]
    fn sphere_scenario() {
        let f = Sphere::new(2);
        let dom = f.domain();

        let mut options = Options::default();
        options.set_max_function_evaluations(Some(200));

        let mut ctx = Context::new(&f, None, dom.clone(), Some(dvector![3.0, 3.0]), &options);
        let mut optimizer = PatternSearch::new(&f, &dom);

        optimizer.initialize(&mut ctx).unwrap();
        assert_eq!(ctx.best_y(), 18.0);

        let mut best = Vec::new();
        for _ in 0..10 {
            assert_eq!(optimizer.iterate(&mut ctx).unwrap(), Step::Completed);
            best.push(ctx.best_y());
        }

        assert_eq!(&best[..4], &[13.0, 8.0, 5.0, 2.0]);
        assert!(best[..4].windows(2).all(|w| w[1] < w[0]));
        assert_eq!(ctx.best_y(), 0.0);
        assert!(optimizer.sigma() < 1.0);
        assert_eq!(ctx.n_evaluations(), 1 + 10 * 4);
    }

    #[test]
    fn aborted_sweep_keeps_state() {
        let f = Sphere::new(2);
        let dom = f.domain();

        let mut options = Options::default();
        options.set_max_function_evaluations(Some(3));

        let mut ctx = Context::new(&f, None, dom.clone(), Some(dvector![3.0, 3.0]), &options);
        let mut optimizer = PatternSearch::new(&f, &dom);

        optimizer.initialize(&mut ctx).unwrap();
        assert_eq!(optimizer.iterate(&mut ctx).unwrap(), Step::Aborted);

        assert_eq!(ctx.n_evaluations(), 3);
        assert_eq!(optimizer.incumbent(), &dvector![3.0, 3.0]);
        assert_eq!(optimizer.sigma(), 1.0);
    }

    #[test]
    fn restarts_after_collapse() {
        let f = Sphere::new(2);
        let dom = f.domain();

        let mut pattern_options = PatternSearchOptions::default();
        pattern_options.set_sigma_threshold(0.3);
        let mut optimizer = PatternSearch::with_options(&f, &dom, pattern_options).unwrap();

        let options = Options::default();
        let mut ctx = Context::new(&f, None, dom.clone(), Some(dvector![0.0, 0.0]), &options);

        optimizer.initialize(&mut ctx).unwrap();

        // Two shrinks from the optimum: 0.5, then 0.25.
        optimizer.iterate(&mut ctx).unwrap();
        assert!(!optimizer.restart(&mut ctx).unwrap());
        optimizer.iterate(&mut ctx).unwrap();
        assert!(optimizer.restart(&mut ctx).unwrap());

        assert_eq!(optimizer.sigma(), 1.0);
        assert_eq!(ctx.best_y(), 0.0);
        assert_ne!(optimizer.incumbent(), &dvector![0.0, 0.0]);

        let mut results = Results::new(
            None,
            0.0,
            0,
            Default::default(),
            Default::default(),
            Default::default(),
            None,
            0,
        );
        <PatternSearch as Optimizer<Sphere>>::finish(&optimizer, &mut results);
        assert_eq!(results.n_restarts(), 1);
    }

    #[test]
    fn respects_bounds() {
        let f = Sphere::new(1);
        let dom = Domain::rect(vec![2.0], vec![4.0]);

        let options = Options::default();
        let mut ctx = Context::new(&f, None, dom.clone(), Some(dvector![3.0]), &options);
        let mut optimizer = PatternSearch::new(&f, &dom);

        optimizer.initialize(&mut ctx).unwrap();
        for _ in 0..5 {
            optimizer.iterate(&mut ctx).unwrap();
        }

        assert_eq!(ctx.best_y(), 4.0);
        assert!(dom.contains(optimizer.incumbent()));
    }

    #[test]
    fn huge_bounds() {
        let f = Objective::new(Domain::rect(vec![-f64::MAX], vec![f64::MAX]), |x| {
            x[0].abs()
        });
        let dom = f.domain();

        let mut options = Options::default();
        options.set_max_function_evaluations(Some(20));

        let results = optimize(&f, PatternSearch::new(&f, &dom), None, options).unwrap();
        assert_eq!(results.termination(), Termination::MaxFunctionEvaluations);
        assert!(results.best_so_far_y().is_finite());
    }

    #[test]
    fn invalid_options() {
        let f = Sphere::new(2);
        let dom = f.domain();

        let mut options = PatternSearchOptions::default();
        options.set_gamma(1.0);
        assert!(matches!(
            PatternSearch::with_options(&f, &dom, options),
            Err(ConfigError::InvalidOption { name: "gamma", .. })
        ));

        let mut options = PatternSearchOptions::default();
        options.set_sigma(0.0);
        assert!(matches!(
            PatternSearch::with_options(&f, &dom, options),
            Err(ConfigError::InvalidOption { name: "sigma", .. })
        ));
    }
}
