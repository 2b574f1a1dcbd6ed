//! Matrix adaptation evolution strategy (MA-ES).
//!
//! MA-ES is a simplification of the well-known
//! [CMA-ES](https://en.wikipedia.org/wiki/CMA-ES) which avoids the covariance
//! matrix, its eigendecomposition and the second evolution path. Instead, it
//! directly adapts a transformation matrix _M_ applied to standard normal
//! samples. Every generation, _λ_ candidates `m + σ M z` are evaluated and the
//! best _μ_ of them are recombined with log-rank weights to update the mean,
//! the evolution path, the matrix and the step size.
//!
//! When restarts are enabled, the strategy restarts from a freshly sampled
//! mean with doubled population size whenever the step size collapses or the
//! search stagnates (IPOP restart scheme).
//!
//! # References
//!
//! \[1\] [Simplify Your Covariance Matrix Adaptation Evolution Strategy](https://ieeexplore.ieee.org/document/7875115)
//!
//! \[2\] [A Restart CMA Evolution Strategy With Increasing Population
//! Size](https://ieeexplore.ieee.org/document/1554902)

use getset::{CopyGetters, Setters};
use log::debug;
use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand_distr::StandardNormal;

use super::stagnation::Stagnation;
use crate::core::{
    ConfigError, Context, Domain, Function, Optimizer, Problem, ProblemError, Results, Step,
};

/// Options for [`EvolutionStrategy`] optimizer.
#[derive(Debug, Clone, CopyGetters, Setters)]
#[getset(get_copy = "pub", set = "pub")]
pub struct EvolutionStrategyOptions {
    /// Number of offspring per generation (_λ_). Default: `4 + ⌊3 ln n⌋`.
    population_size: Option<usize>,
    /// Number of parents used in recombination (_μ_). Default: `⌊λ / 2⌋`.
    parents: Option<usize>,
    /// Initial step size. Default: `1`.
    sigma: f64,
    /// Restart when the step size drops below this value. Default: `1e-12`.
    sigma_threshold: f64,
    /// Number of generations considered for stagnation. Default: `10 + ⌈30 n
    /// / λ⌉`.
    stagnation: Option<usize>,
    /// Minimal improvement over the stagnation window. Default: `1e-12`.
    fitness_diff: f64,
}

impl Default for EvolutionStrategyOptions {
    fn default() -> Self {
        Self {
            population_size: None,
            parents: None,
            sigma: 1.0,
            sigma_threshold: 1e-12,
            stagnation: None,
            fitness_diff: 1e-12,
        }
    }
}

impl EvolutionStrategyOptions {
    /// Checks that the options are valid for problem of given dimension.
    pub fn validate(&self, dim: usize) -> Result<(), ConfigError> {
        let lambda = self.lambda(dim);
        if lambda < 2 {
            return Err(ConfigError::option(
                "population_size",
                lambda as f64,
                "must be at least 2",
            ));
        }

        let mu = self.mu(lambda);
        if mu == 0 || mu > lambda {
            return Err(ConfigError::option(
                "parents",
                mu as f64,
                "must be positive and not greater than the population size",
            ));
        }

        if !(self.sigma > 0.0) {
            return Err(ConfigError::option("sigma", self.sigma, "must be positive"));
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

    fn lambda(&self, dim: usize) -> usize {
        self.population_size
            .unwrap_or_else(|| 4 + (3.0 * (dim.max(1) as f64).ln()).floor() as usize)
    }

    fn mu(&self, lambda: usize) -> usize {
        self.parents.unwrap_or(lambda / 2)
    }

    fn window(&self, dim: usize, lambda: usize) -> usize {
        self.stagnation
            .unwrap_or_else(|| 10 + (30.0 * dim as f64 / lambda as f64).ceil() as usize)
    }
}

/// Strategy parameters derived from the dimension and the population size.
#[derive(Debug, Clone)]
struct Parameters {
    lambda: usize,
    weights: Vec<f64>,
    mu_eff: f64,
    c_s: f64,
    c_1: f64,
    c_w: f64,
    d_sigma: f64,
    e_chi: f64,
}

impl Parameters {
    fn new(dim: usize, lambda: usize, mu: usize) -> Self {
        let n = dim as f64;

        let w_base = ((lambda as f64 + 1.0) / 2.0).ln();
        let log_sum: f64 = (1..=mu).map(|i| (i as f64).ln()).sum();
        let w_sum = mu as f64 * w_base - log_sum;
        let weights: Vec<f64> = (1..=mu)
            .map(|i| (w_base - (i as f64).ln()) / w_sum)
            .collect();
        let mu_eff = 1.0 / weights.iter().map(|w| w * w).sum::<f64>();

        let e_chi = n.sqrt() * (1.0 - 1.0 / (4.0 * n) + 1.0 / (21.0 * n * n));

        let alpha_cov = 2.0;
        let c_s = (mu_eff + 2.0) / (mu_eff + n + 5.0);
        let c_1 = alpha_cov / ((n + 1.3).powi(2) + mu_eff);
        let c_w = (1.0 - c_1).min(
            alpha_cov * (mu_eff + 1.0 / mu_eff - 2.0)
                / ((n + 2.0).powi(2) + alpha_cov * mu_eff / 2.0),
        );
        let d_sigma = 1.0 + c_s + 2.0 * (((mu_eff - 1.0) / (n + 1.0)).sqrt() - 1.0).max(0.0);

        Self {
            lambda,
            weights,
            mu_eff,
            c_s,
            c_1,
            c_w,
            d_sigma,
            e_chi,
        }
    }
}

/// MA-ES optimizer.
///
/// See [module](self) documentation for more details.
pub struct EvolutionStrategy {
    options: EvolutionStrategyOptions,
    dim: usize,
    params: Parameters,
    mean: DVector<f64>,
    sigma: f64,
    path: DVector<f64>,
    transform: DMatrix<f64>,
    z: Vec<DVector<f64>>,
    d: Vec<DVector<f64>>,
    y: Vec<f64>,
    x: DVector<f64>,
    order: Vec<usize>,
    stagnation: Stagnation,
    n_restarts: usize,
}

impl EvolutionStrategy {
    /// Initializes MA-ES optimizer with default options.
    pub fn new<F: Problem>(f: &F, dom: &Domain) -> Self {
        let _ = f;
        Self::init(dom, EvolutionStrategyOptions::default())
    }

    /// Initializes MA-ES optimizer with given options.
    pub fn with_options<F: Problem>(
        f: &F,
        dom: &Domain,
        options: EvolutionStrategyOptions,
    ) -> Result<Self, ConfigError> {
        let _ = f;
        options.validate(dom.dim())?;
        Ok(Self::init(dom, options))
    }

    fn init(dom: &Domain, options: EvolutionStrategyOptions) -> Self {
        let dim = dom.dim();
        let lambda = options.lambda(dim);
        let params = Parameters::new(dim, lambda, options.mu(lambda));
        let stagnation = Stagnation::new(options.window(dim, lambda), options.fitness_diff);

        let mut this = Self {
            sigma: options.sigma,
            options,
            dim,
            params,
            mean: DVector::zeros(dim),
            path: DVector::zeros(dim),
            transform: DMatrix::identity(dim, dim),
            z: Vec::new(),
            d: Vec::new(),
            y: Vec::new(),
            x: DVector::zeros(dim),
            order: Vec::new(),
            stagnation,
            n_restarts: 0,
        };
        this.resize_population();
        this
    }

    fn resize_population(&mut self) {
        let lambda = self.params.lambda;
        self.z.resize(lambda, DVector::zeros(self.dim));
        self.d.resize(lambda, DVector::zeros(self.dim));
        self.y.resize(lambda, f64::INFINITY);
    }

    fn set_population_size(&mut self, lambda: usize) {
        self.params = Parameters::new(self.dim, lambda, self.options.mu(lambda));
        self.resize_population();
    }

    /// Current population size.
    pub fn population_size(&self) -> usize {
        self.params.lambda
    }

    /// Current step size.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Current mean of the search distribution.
    pub fn mean(&self) -> &DVector<f64> {
        &self.mean
    }

    fn start<F: Function>(
        &mut self,
        ctx: &mut Context<'_, F>,
        is_restart: bool,
    ) -> Result<(), ProblemError> {
        let mut mean = ctx.initial_point(is_restart);
        ctx.domain().project(&mut mean);
        ctx.evaluate_min(&mean)?;

        self.mean = mean;
        self.sigma = self.options.sigma;
        self.path.fill(0.0);
        self.transform.fill_with_identity();
        self.stagnation
            .reset(self.options.window(self.dim, self.params.lambda));

        Ok(())
    }
}

impl<F: Function> Optimizer<F> for EvolutionStrategy {
    const NAME: &'static str = "MA-ES";

    type Error = ProblemError;

    fn initialize(&mut self, ctx: &mut Context<'_, F>) -> Result<(), Self::Error> {
        let lambda = self.options.lambda(self.dim);
        if lambda != self.params.lambda {
            self.set_population_size(lambda);
        }
        self.n_restarts = 0;
        self.start(ctx, false)
    }

    fn iterate(&mut self, ctx: &mut Context<'_, F>) -> Result<Step, Self::Error> {
        let Self {
            params,
            mean,
            sigma,
            path,
            transform,
            z,
            d,
            y,
            x,
            order,
            ..
        } = self;

        let Parameters {
            lambda,
            ref weights,
            mu_eff,
            c_s,
            c_1,
            c_w,
            d_sigma,
            e_chi,
        } = *params;

        for k in 0..lambda {
            if ctx.should_stop() {
                return Ok(Step::Aborted);
            }

            let rng = ctx.rng();
            z[k].iter_mut().for_each(|zi| *zi = rng.sample(StandardNormal));
            d[k].gemv(1.0, &*transform, &z[k], 0.0);

            x.copy_from(&*mean);
            x.axpy(*sigma, &d[k], 1.0);
            ctx.domain().project(x);

            y[k] = ctx.evaluate_min(x)?;
        }

        if ctx.should_stop() {
            return Ok(Step::Aborted);
        }

        // NaN values are ranked last.
        let key = |v: f64| if v.is_nan() { f64::INFINITY } else { v };
        order.clear();
        order.extend(0..lambda);
        order.sort_by(|&a, &b| key(y[a]).total_cmp(&key(y[b])));

        let n = mean.nrows();
        let mut wz = DVector::zeros(n);
        let mut wd = DVector::zeros(n);
        let mut wzz = DMatrix::zeros(n, n);

        for (w, &k) in weights.iter().zip(order.iter()) {
            wz.axpy(*w, &z[k], 1.0);
            wd.axpy(*w, &d[k], 1.0);
            wzz.ger(*w, &z[k], &z[k], 1.0);
        }

        mean.axpy(*sigma, &wd, 1.0);

        *path *= 1.0 - c_s;
        path.axpy((mu_eff * c_s * (2.0 - c_s)).sqrt(), &wz, 1.0);

        // I + c_1/2 (s sᵀ - I) + c_w/2 (Σ wᵢ zᵢ zᵢᵀ - I)
        let mut update = DMatrix::identity(n, n) * (1.0 - c_1 / 2.0 - c_w / 2.0);
        update.ger(c_1 / 2.0, &*path, &*path, 1.0);
        update += wzz * (c_w / 2.0);
        *transform = &*transform * update;

        *sigma *= (c_s / d_sigma * (path.norm() / e_chi - 1.0)).exp();

        debug!(
            "best offspring f(x) = {}, step size updated to {}",
            y[order[0]], sigma
        );

        Ok(Step::Completed)
    }

    fn restart(&mut self, ctx: &mut Context<'_, F>) -> Result<bool, Self::Error> {
        self.stagnation.push(ctx.segment_best_y());

        let collapsed = self.sigma < self.options.sigma_threshold;
        if !collapsed && !self.stagnation.is_stagnating() {
            return Ok(false);
        }

        let lambda = 2 * self.params.lambda;
        debug!(
            "restarting MA-ES (step size {}, segment best {}), population size {}",
            self.sigma,
            ctx.segment_best_y(),
            lambda
        );

        self.set_population_size(lambda);
        ctx.begin_segment();
        self.start(ctx, true)?;
        self.n_restarts += 1;

        Ok(true)
    }

    fn finish(&self, results: &mut Results) {
        results
            .set_n_restarts(self.n_restarts)
            .set_sigma(Some(self.sigma))
            .set_mean(Some(self.mean.clone_owned()));
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::dvector;

    use super::*;
    use crate::core::{Options, Termination};
    use crate::testing::*;

    #[test]
    fn default_parameters() {
        let f = Sphere::new(10);
        let dom = f.domain();
        let optimizer = EvolutionStrategy::new(&f, &dom);

        // 4 + floor(3 ln 10) = 4 + 6
        assert_eq!(optimizer.population_size(), 10);

        let weights = &optimizer.params.weights;
        assert_eq!(weights.len(), 5);
        assert_relative_eq!(weights.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert!(weights.windows(2).all(|w| w[0] > w[1]));
        assert!(optimizer.params.mu_eff > 1.0 && optimizer.params.mu_eff < 5.0);
        assert!(optimizer.params.c_w <= 1.0 - optimizer.params.c_1);
    }

    #[test]
    fn sphere_scenario() {
        let f = Sphere::new(2);
        let dom = f.domain();

        let mut es_options = EvolutionStrategyOptions::default();
        es_options.set_population_size(Some(20));
        let mut optimizer = EvolutionStrategy::with_options(&f, &dom, es_options).unwrap();

        let mut options = Options::default();
        options
            .set_fitness_threshold(Some(1e-10))
            .set_max_function_evaluations(Some(100_000));

        let mut ctx = Context::new(&f, None, dom, Some(dvector![3.0, -2.0]), &options);

        optimizer.initialize(&mut ctx).unwrap();
        while !ctx.should_stop() {
            optimizer.iterate(&mut ctx).unwrap();
        }

        assert_eq!(ctx.check_termination().1, Termination::FitnessThreshold);
        assert!(ctx.best_y() <= 1e-10);
        assert!(ctx.n_evaluations() < 100_000);
    }

    #[test]
    fn rosenbrock_converges() {
        let f = Rosenbrock::new(2);
        let dom = f.domain();

        let mut options = Options::default();
        options
            .set_fitness_threshold(Some(1e-8))
            .set_max_function_evaluations(Some(50_000))
            .set_seed_rng(3);

        for x in f.initials() {
            let mut optimizer = EvolutionStrategy::new(&f, &dom);
            let mut ctx = Context::new(&f, None, dom.clone(), Some(x), &options);

            optimizer.initialize(&mut ctx).unwrap();
            while !ctx.should_stop() {
                optimizer.iterate(&mut ctx).unwrap();
            }

            assert!(f.is_optimum(&ctx.best_x().unwrap(), 1e-3));
        }
    }

    #[test]
    fn aborted_generation_keeps_distribution() {
        let f = Sphere::new(2);
        let dom = f.domain();

        let mut options = Options::default();
        options.set_max_function_evaluations(Some(4));

        let mut ctx = Context::new(&f, None, dom.clone(), Some(dvector![1.0, 1.0]), &options);
        let mut optimizer = EvolutionStrategy::new(&f, &dom);

        optimizer.initialize(&mut ctx).unwrap();
        assert_eq!(optimizer.iterate(&mut ctx).unwrap(), Step::Aborted);

        assert_eq!(ctx.n_evaluations(), 4);
        assert_eq!(optimizer.mean(), &dvector![1.0, 1.0]);
        assert_eq!(optimizer.sigma(), 1.0);
    }

    #[test]
    fn restart_doubles_population() {
        let f = Sphere::new(2);
        let dom = f.domain();

        let mut es_options = EvolutionStrategyOptions::default();
        es_options.set_sigma_threshold(10.0);
        let mut optimizer = EvolutionStrategy::with_options(&f, &dom, es_options).unwrap();

        let options = Options::default();
        let mut ctx = Context::new(&f, None, dom, None, &options);

        optimizer.initialize(&mut ctx).unwrap();
        let lambda = optimizer.population_size();

        optimizer.iterate(&mut ctx).unwrap();
        assert!(optimizer.restart(&mut ctx).unwrap());

        assert_eq!(optimizer.population_size(), 2 * lambda);
        assert_eq!(optimizer.sigma(), 1.0);

        let evaluations = ctx.n_evaluations();
        optimizer.iterate(&mut ctx).unwrap();
        assert_eq!(ctx.n_evaluations() - evaluations, 2 * lambda);

        // A new run starts with the configured population size again.
        let mut ctx = Context::new(&f, None, f.domain(), None, &options);
        optimizer.initialize(&mut ctx).unwrap();
        assert_eq!(optimizer.population_size(), lambda);
    }

    #[test]
    fn invalid_options() {
        let f = Sphere::new(2);
        let dom = f.domain();

        let mut options = EvolutionStrategyOptions::default();
        options.set_population_size(Some(1));
        assert!(matches!(
            EvolutionStrategy::with_options(&f, &dom, options),
            Err(ConfigError::InvalidOption {
                name: "population_size",
                ..
            })
        ));

        let mut options = EvolutionStrategyOptions::default();
        options.set_population_size(Some(6)).set_parents(Some(7));
        assert!(matches!(
            EvolutionStrategy::with_options(&f, &dom, options),
            Err(ConfigError::InvalidOption { name: "parents", .. })
        ));
    }
}
