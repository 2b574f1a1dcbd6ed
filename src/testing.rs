//! Testing functions and utilities useful for benchmarking, debugging and
//! smoke testing.
//!
//! [`Sphere`] and [`Rosenbrock`] are recommended for first tests. Others can
//! be used for specific conditions (e.g., ill-conditioning or noise).
//!
//! # References
//!
//! \[1\] [A Literature Survey of Benchmark Functions For Global Optimization
//! Problems](https://arxiv.org/abs/1308.4008)
//!
//! \[2\] [Real-Parameter Black-Box Optimization Benchmarking: Noiseless
//! Functions Definitions](https://hal.inria.fr/inria-00362633)

#![allow(unused)]

use std::cell::{Cell, RefCell};

use approx::abs_diff_eq;
use nalgebra::DVector;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::StandardNormal;
use thiserror::Error;

use crate::{
    core::{Domain, Function, Optimizer, Options, Problem, ProblemError, Results},
    driver::OptimizerDriver,
};

/// Extension of the [`Function`] trait that provides additional information
/// that is useful for testing optimizers.
pub trait TestFunction: Function {
    /// Standard initial values for the problem. Using the same initial values
    /// is essential for fair comparison of methods.
    fn initials(&self) -> Vec<DVector<f64>>;

    /// A set of global optima (if known and finite). This is mostly just for
    /// information, for example to know how close an optimizer got even if it
    /// failed. For testing if a given point is global optimum,
    /// [`TestFunction::is_optimum`] should be used.
    fn optima(&self) -> Vec<DVector<f64>> {
        Vec::new()
    }

    /// Test if given point is a global optimum of the function, given the
    /// tolerance `eps`.
    fn is_optimum(&self, x: &DVector<f64>, eps: f64) -> bool {
        self.optima()
            .iter()
            .any(|optimum| abs_diff_eq!(x, optimum, epsilon = eps))
    }
}

fn test_domain(n: usize) -> Domain {
    Domain::unconstrained(n).with_initial_bounds(vec![-5.0; n], vec![5.0; n])
}

/// [Sphere](https://www.sfu.ca/~ssurjano/spheref.html) function.
///
/// This is a simple paraboloid which can be used in early development and
/// debugging. The minimum can optionally be shifted from the origin.
#[derive(Debug, Clone)]
pub struct Sphere {
    offset: DVector<f64>,
}

impl Sphere {
    /// Initializes the function with given dimension.
    pub fn new(n: usize) -> Self {
        assert!(n > 0, "n must be greater than zero");
        Self {
            offset: DVector::zeros(n),
        }
    }

    /// Initializes the function with the minimum in given point.
    pub fn with_offset(offset: Vec<f64>) -> Self {
        assert!(!offset.is_empty(), "n must be greater than zero");
        Self {
            offset: DVector::from_vec(offset),
        }
    }
}

impl Default for Sphere {
    fn default() -> Self {
        Self::new(2)
    }
}

impl Problem for Sphere {
    fn domain(&self) -> Domain {
        test_domain(self.offset.nrows())
    }

    fn name(&self) -> Option<&str> {
        Some("sphere")
    }
}

impl Function for Sphere {
    type Args = ();

    fn apply(&self, x: &DVector<f64>, _: Option<&()>) -> Result<f64, ProblemError> {
        Ok(x.iter()
            .zip(self.offset.iter())
            .map(|(xi, oi)| (xi - oi).powi(2))
            .sum())
    }
}

impl TestFunction for Sphere {
    fn initials(&self) -> Vec<DVector<f64>> {
        let n = self.offset.nrows();
        let alternating = DVector::from_fn(n, |i, _| if i % 2 == 0 { 3.0 } else { -2.0 });

        vec![DVector::from_element(n, 3.0), alternating]
    }

    fn optima(&self) -> Vec<DVector<f64>> {
        vec![self.offset.clone_owned()]
    }
}

/// Extended [Rosenbrock](https://en.wikipedia.org/wiki/Rosenbrock_function)
/// function.
///
/// The minimum lies at the end of a long, curved, narrow valley.
#[derive(Debug, Clone, Copy)]
pub struct Rosenbrock {
    n: usize,
}

impl Rosenbrock {
    /// Initializes the function with given dimension.
    pub fn new(n: usize) -> Self {
        assert!(n > 1, "n must be greater than one");
        Self { n }
    }
}

impl Default for Rosenbrock {
    fn default() -> Self {
        Self::new(2)
    }
}

impl Problem for Rosenbrock {
    fn domain(&self) -> Domain {
        test_domain(self.n)
    }

    fn name(&self) -> Option<&str> {
        Some("rosenbrock")
    }
}

impl Function for Rosenbrock {
    type Args = ();

    fn apply(&self, x: &DVector<f64>, _: Option<&()>) -> Result<f64, ProblemError> {
        Ok(x.as_slice()
            .windows(2)
            .map(|w| 100.0 * (w[1] - w[0].powi(2)).powi(2) + (1.0 - w[0]).powi(2))
            .sum())
    }
}

impl TestFunction for Rosenbrock {
    fn initials(&self) -> Vec<DVector<f64>> {
        let classic = DVector::from_fn(self.n, |i, _| if i % 2 == 0 { -1.2 } else { 1.0 });
        vec![classic, DVector::from_element(self.n, 2.0)]
    }

    fn optima(&self) -> Vec<DVector<f64>> {
        vec![DVector::from_element(self.n, 1.0)]
    }
}

/// Ellipsoid function with condition number 10^6.
///
/// Separable but ill-conditioned, the coefficients grow exponentially along
/// the coordinates.
#[derive(Debug, Clone, Copy)]
pub struct Ellipsoid {
    n: usize,
}

impl Ellipsoid {
    /// Initializes the function with given dimension.
    pub fn new(n: usize) -> Self {
        assert!(n > 0, "n must be greater than zero");
        Self { n }
    }

    fn coeff(&self, i: usize) -> f64 {
        if self.n == 1 {
            1.0
        } else {
            10f64.powf(6.0 * i as f64 / (self.n - 1) as f64)
        }
    }
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self::new(2)
    }
}

impl Problem for Ellipsoid {
    fn domain(&self) -> Domain {
        test_domain(self.n)
    }

    fn name(&self) -> Option<&str> {
        Some("ellipsoid")
    }
}

impl Function for Ellipsoid {
    type Args = ();

    fn apply(&self, x: &DVector<f64>, _: Option<&()>) -> Result<f64, ProblemError> {
        Ok(x.iter()
            .enumerate()
            .map(|(i, xi)| self.coeff(i) * xi * xi)
            .sum())
    }
}

impl TestFunction for Ellipsoid {
    fn initials(&self) -> Vec<DVector<f64>> {
        vec![DVector::from_element(self.n, 1.0)]
    }

    fn optima(&self) -> Vec<DVector<f64>> {
        vec![DVector::zeros(self.n)]
    }
}

/// Sphere function corrupted by additive Gaussian noise.
///
/// The noise is generated from an internal generator seeded at construction,
/// so that the sequence of values is reproducible.
#[derive(Debug)]
pub struct NoisySphere {
    n: usize,
    noise: f64,
    rng: RefCell<StdRng>,
}

impl NoisySphere {
    /// Initializes the function with given dimension, standard deviation of the
    /// noise and seed of the noise generator.
    pub fn new(n: usize, noise: f64, seed: u64) -> Self {
        assert!(n > 0, "n must be greater than zero");
        Self {
            n,
            noise,
            rng: RefCell::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Problem for NoisySphere {
    fn domain(&self) -> Domain {
        test_domain(self.n)
    }

    fn name(&self) -> Option<&str> {
        Some("noisy sphere")
    }
}

impl Function for NoisySphere {
    type Args = ();

    fn apply(&self, x: &DVector<f64>, _: Option<&()>) -> Result<f64, ProblemError> {
        let noise: f64 = self.rng.borrow_mut().sample(StandardNormal);
        Ok(x.norm_squared() + self.noise * noise)
    }
}

impl TestFunction for NoisySphere {
    fn initials(&self) -> Vec<DVector<f64>> {
        vec![DVector::from_element(self.n, 3.0)]
    }

    fn optima(&self) -> Vec<DVector<f64>> {
        vec![DVector::zeros(self.n)]
    }
}

/// Error returned by [`Failing`] function.
#[derive(Debug, Error)]
#[error("evaluation {0} failed")]
pub struct EvaluationFailed(pub usize);

/// Sphere function that fails at given evaluation. Useful for testing the
/// error propagation.
#[derive(Debug)]
pub struct Failing {
    n: usize,
    fail_at: usize,
    calls: Cell<usize>,
}

impl Failing {
    /// Initializes the function with given dimension that fails on the
    /// `fail_at`-th call (counted from one).
    pub fn new(n: usize, fail_at: usize) -> Self {
        Self {
            n,
            fail_at,
            calls: Cell::new(0),
        }
    }
}

impl Problem for Failing {
    fn domain(&self) -> Domain {
        test_domain(self.n)
    }
}

impl Function for Failing {
    type Args = ();

    fn apply(&self, x: &DVector<f64>, _: Option<&()>) -> Result<f64, ProblemError> {
        let calls = self.calls.get() + 1;
        self.calls.set(calls);

        if calls == self.fail_at {
            Err(ProblemError::Custom(Box::new(EvaluationFailed(calls))))
        } else {
            Ok(x.norm_squared())
        }
    }
}

/// A simple optimization driver that can be used in tests.
pub fn optimize<F: Function, O: Optimizer<F>>(
    f: &F,
    optimizer: O,
    x0: Option<Vec<f64>>,
    options: Options,
) -> Result<Results, O::Error> {
    let builder = OptimizerDriver::builder(f)
        .with_options(options)
        .with_algo(|_, _| optimizer);

    let builder = match x0 {
        Some(x0) => builder.with_initial(x0),
        None => builder,
    };

    // Test configurations are always valid.
    let mut driver = match builder.build() {
        Ok(driver) => driver,
        Err(error) => panic!("invalid test configuration: {}", error),
    };

    driver.optimize()
}

#[cfg(test)]
mod tests {
    use nalgebra::dvector;

    use super::*;

    #[test]
    fn optima_are_zero() {
        assert_eq!(Sphere::new(3).apply(&dvector![0.0, 0.0, 0.0], None).unwrap(), 0.0);
        assert_eq!(Rosenbrock::new(3).apply(&dvector![1.0, 1.0, 1.0], None).unwrap(), 0.0);
        assert_eq!(Ellipsoid::new(2).apply(&dvector![0.0, 0.0], None).unwrap(), 0.0);

        let f = Sphere::with_offset(vec![1.0, -1.0]);
        assert!(f.is_optimum(&dvector![1.0, -1.0], 1e-12));
        assert!(!f.is_optimum(&dvector![0.0, 0.0], 1e-12));
    }

    #[test]
    fn ellipsoid_conditioning() {
        let f = Ellipsoid::new(3);
        assert_eq!(f.apply(&dvector![1.0, 0.0, 0.0], None).unwrap(), 1.0);
        assert_eq!(f.apply(&dvector![0.0, 0.0, 1.0], None).unwrap(), 1e6);
    }

    #[test]
    fn noise_is_reproducible() {
        let f = NoisySphere::new(2, 0.1, 7);
        let g = NoisySphere::new(2, 0.1, 7);
        let x = dvector![1.0, 1.0];

        let a = f.apply(&x, None).unwrap();
        assert_eq!(a, g.apply(&x, None).unwrap());
        assert_ne!(a, f.apply(&x, None).unwrap());
    }

    #[test]
    fn failing_fails_once() {
        let f = Failing::new(1, 2);
        let x = dvector![2.0];

        assert!(f.apply(&x, None).is_ok());
        assert!(f.apply(&x, None).is_err());
        assert!(f.apply(&x, None).is_ok());
    }
}
