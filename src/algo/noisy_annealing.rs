//! Simulated annealing for noisy objectives.
//!
//! Every generation a candidate is drawn from an isotropic Gaussian around the
//! incumbent and accepted by the Metropolis criterion. To cope with noise, both
//! the candidate and the incumbent are sampled several times and their means
//! are compared. The number of samples grows over the run following a virtual
//! time driven by exponentially distributed increments, so that the
//! comparison gets more precise as the temperature decreases.
//!
//! # References
//!
//! \[1\] [Simulated annealing with noisy or imprecise energy
//! measurements](https://link.springer.com/article/10.1007/BF00940575)
//!
//! \[2\] [Optimization by simulated
//! annealing](https://www.science.org/doi/10.1126/science.220.4598.671)

use std::{fmt, str::FromStr};

use getset::{CopyGetters, Setters};
use log::debug;
use nalgebra::DVector;
use rand::Rng;
use rand_distr::{Exp1, Poisson, StandardNormal};

use crate::core::{
    ConfigError, Context, Domain, Function, Optimizer, Problem, ProblemError, Results, Step,
};

/// Growth of the sampling intensity with the virtual time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Schedule {
    /// Intensity equals the virtual time.
    #[default]
    Linear,
    /// Intensity equals the square of the virtual time.
    Quadratic,
}

impl Schedule {
    /// Mean number of additional samples at virtual time `t`.
    pub fn intensity(&self, t: f64) -> f64 {
        match self {
            Schedule::Linear => t,
            Schedule::Quadratic => t * t,
        }
    }

    /// Name of the schedule as accepted by [`FromStr`].
    pub fn as_str(&self) -> &str {
        match self {
            Schedule::Linear => "linear",
            Schedule::Quadratic => "quadratic",
        }
    }
}

impl FromStr for Schedule {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" => Ok(Schedule::Linear),
            "quadratic" => Ok(Schedule::Quadratic),
            other => Err(ConfigError::UnknownSchedule(other.to_string())),
        }
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for [`NoisyAnnealing`] optimizer.
#[derive(Debug, Clone, CopyGetters, Setters)]
#[getset(get_copy = "pub", set = "pub")]
pub struct NoisyAnnealingOptions {
    /// Standard deviation of the candidate perturbation. Default: `1`.
    sigma: f64,
    /// Initial temperature. Default: `100`.
    temperature: f64,
    /// Multiplicative cooling rate per generation, must be in (0, 1].
    /// Default: `0.99`.
    cooling_rate: f64,
    /// Lower bound of the temperature. Default: `1e-200`.
    temperature_min: f64,
    /// Fixed number of samples per point. If not set, the number follows the
    /// [schedule](Schedule). Default: not set.
    n_samples: Option<usize>,
    /// Resample the incumbent every generation. Default: `true`.
    is_noisy: bool,
    /// Schedule of the sampling intensity. Default: linear.
    schedule: Schedule,
}

impl Default for NoisyAnnealingOptions {
    fn default() -> Self {
        Self {
            sigma: 1.0,
            temperature: 100.0,
            cooling_rate: 0.99,
            temperature_min: 1e-200,
            n_samples: None,
            is_noisy: true,
            schedule: Schedule::Linear,
        }
    }
}

impl NoisyAnnealingOptions {
    /// Checks that the options are valid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.sigma > 0.0) {
            return Err(ConfigError::option("sigma", self.sigma, "must be positive"));
        }

        if !(self.temperature > 0.0) {
            return Err(ConfigError::option(
                "temperature",
                self.temperature,
                "must be positive",
            ));
        }

        if !(self.cooling_rate > 0.0 && self.cooling_rate <= 1.0) {
            return Err(ConfigError::option(
                "cooling_rate",
                self.cooling_rate,
                "must be in (0, 1]",
            ));
        }

        if !(self.temperature_min > 0.0) {
            return Err(ConfigError::option(
                "temperature_min",
                self.temperature_min,
                "must be positive",
            ));
        }

        if self.n_samples == Some(0) {
            return Err(ConfigError::option("n_samples", 0.0, "must be positive"));
        }

        Ok(())
    }
}

/// Noisy simulated annealing optimizer.
///
/// See [module](self) documentation for more details.
pub struct NoisyAnnealing {
    options: NoisyAnnealingOptions,
    x: DVector<f64>,
    y: f64,
    candidate: DVector<f64>,
    temperature: f64,
    time: f64,
    n_accepted: usize,
}

impl NoisyAnnealing {
    /// Initializes noisy annealing optimizer with default options.
    pub fn new<F: Problem>(f: &F, dom: &Domain) -> Self {
        let _ = f;
        Self::init(dom, NoisyAnnealingOptions::default())
    }

    /// Initializes noisy annealing optimizer with given options.
    pub fn with_options<F: Problem>(
        f: &F,
        dom: &Domain,
        options: NoisyAnnealingOptions,
    ) -> Result<Self, ConfigError> {
        let _ = f;
        options.validate()?;
        Ok(Self::init(dom, options))
    }

    fn init(dom: &Domain, options: NoisyAnnealingOptions) -> Self {
        Self {
            temperature: options.temperature,
            options,
            x: DVector::zeros(dom.dim()),
            y: f64::INFINITY,
            candidate: DVector::zeros(dom.dim()),
            time: 0.0,
            n_accepted: 0,
        }
    }

    /// Current temperature.
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Current incumbent point.
    pub fn incumbent(&self) -> &DVector<f64> {
        &self.x
    }

    /// Number of accepted candidates.
    pub fn n_accepted(&self) -> usize {
        self.n_accepted
    }

    fn n_samples<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        if let Some(n) = self.options.n_samples {
            return n;
        }

        let intensity = self.options.schedule.intensity(self.time);
        let extra = if !intensity.is_finite() {
            debug!("intensity {} is not finite, sampling only once", intensity);
            0
        } else if intensity > 0.0 {
            match Poisson::new(intensity) {
                Ok(poisson) => rng.sample::<f64, _>(poisson) as usize,
                Err(error) => {
                    debug!("intensity {} not usable for sampling: {}", intensity, error);
                    0
                }
            }
        } else {
            0
        };

        extra + 1
    }
}

/// Mean of `n` evaluations of the same point, `None` if interrupted.
fn sample_mean<F: Function>(
    ctx: &mut Context<'_, F>,
    x: &DVector<f64>,
    n: usize,
) -> Result<Option<f64>, ProblemError> {
    let mut sum = 0.0;

    for _ in 0..n {
        if ctx.should_stop() {
            return Ok(None);
        }

        sum += ctx.evaluate_min(x)?;
    }

    Ok(Some(sum / n as f64))
}

impl<F: Function> Optimizer<F> for NoisyAnnealing {
    const NAME: &'static str = "Noisy annealing";

    type Error = ProblemError;

    fn initialize(&mut self, ctx: &mut Context<'_, F>) -> Result<(), Self::Error> {
        let mut x = ctx.initial_point(false);
        ctx.domain().project(&mut x);

        self.y = ctx.evaluate_min(&x)?;
        self.x = x;
        self.temperature = self.options.temperature;
        self.time = 0.0;
        self.n_accepted = 0;

        Ok(())
    }

    fn iterate(&mut self, ctx: &mut Context<'_, F>) -> Result<Step, Self::Error> {
        let sigma = self.options.sigma;

        let rng = ctx.rng();
        for (ci, xi) in self.candidate.iter_mut().zip(self.x.iter()) {
            *ci = xi + sigma * rng.sample::<f64, _>(StandardNormal);
        }
        self.time += rng.sample::<f64, _>(Exp1);
        let n = self.n_samples(rng);

        ctx.domain().project(&mut self.candidate);

        let candidate_y = match sample_mean(ctx, &self.candidate, n)? {
            Some(y) => y,
            None => return Ok(Step::Aborted),
        };

        let incumbent_y = if self.options.is_noisy {
            match sample_mean(ctx, &self.x, n)? {
                Some(y) => y,
                None => return Ok(Step::Aborted),
            }
        } else {
            self.y
        };

        let diff = incumbent_y - candidate_y;

        // The uniform number is drawn only for worsening candidates.
        let accept =
            diff >= 0.0 || ctx.rng().gen::<f64>() < (diff / self.temperature).exp();

        if accept {
            std::mem::swap(&mut self.x, &mut self.candidate);
            self.y = candidate_y;
            self.n_accepted += 1;
            debug!(
                "accepted candidate with mean {} over {} samples (difference {})",
                candidate_y, n, diff
            );
        } else {
            self.y = incumbent_y;
        }

        self.temperature = (self.temperature * self.options.cooling_rate)
            .max(self.options.temperature_min);

        Ok(Step::Completed)
    }

    fn finish(&self, results: &mut Results) {
        results.set_sigma(Some(self.options.sigma));
    }
}
