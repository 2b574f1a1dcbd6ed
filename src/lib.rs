#![allow(clippy::many_single_char_names)]
#![allow(clippy::type_complexity)]
#![warn(missing_docs)]

//! # bbopt
//!
//! A pure Rust framework and implementation of derivative-free methods for
//! black-box (bound-constrained) continuous optimization.
//!
//! ## Algorithms
//!
//! * [MA-ES](algo::evolution_strategy) -- Recommended method to be used as a
//!   default. A matrix adaptation evolution strategy with restarts and
//!   increasing population size.
//! * [Pattern search](algo::pattern_search) -- Deterministic Hooke-Jeeves
//!   coordinate search, useful for cheap low-dimensional problems.
//! * [Noisy annealing](algo::noisy_annealing) -- Simulated annealing with
//!   adaptive sampling intensity for objectives corrupted by noise.
//!
//! ## Problem
//!
//! The problem of black-box optimization is about finding a point which
//! minimizes (or maximizes) an objective function that can only be
//! evaluated. There is no access to derivatives or any other structure, so
//! the algorithms are compared by the quality reached for a given budget of
//! evaluations.
//!
//! Mathematically, the problem is formulated as
//!
//! ```text
//! min f(x),
//!
//! where x = { x1, ..., xn }
//! and Li <= xi <= Ui for some bounds [L, U] for every i
//! ```
//!
//! The bounds can be negative/positive infinity, effectively making the
//! variable unconstrained.
//!
//! More sophisticated constraints, discrete variables or multiple objectives
//! are currently out of the scope of this library.
//!
//! When it comes to code, the problem is any type that implements the
//! [`Function`] and [`Problem`] traits.
//!
//! ```rust
//! // bbopt is based on `nalgebra` crate.
//! use bbopt::nalgebra as na;
//! use bbopt::{Domain, Function, Problem, ProblemError};
//!
//! // A problem is represented by a type.
//! struct Rosenbrock {
//!     a: f64,
//!     b: f64,
//! }
//!
//! impl Problem for Rosenbrock {
//!     // Specification for the domain. At the very least, the dimension
//!     // must be known.
//!     fn domain(&self) -> Domain {
//!         Domain::unconstrained(2)
//!     }
//! }
//!
//! impl Function for Rosenbrock {
//!     // No extra arguments.
//!     type Args = ();
//!
//!     // Evaluate the objective in given point.
//!     fn apply(&self, x: &na::DVector<f64>, _: Option<&()>) -> Result<f64, ProblemError> {
//!         Ok((self.a - x[0]).powi(2) + self.b * (x[1] - x[0].powi(2)).powi(2))
//!     }
//! }
//! ```
//!
//! For simple cases, a closure can be wrapped in an [`Objective`] instead. The
//! previous example used unconstrained variables, but it is also possible to
//! specify bounds.
//!
//! ```rust
//! use bbopt::{Domain, Objective};
//!
//! let f = Objective::new(
//!     [(-10.0, 10.0), (-10.0, 10.0)].into_iter().collect::<Domain>(),
//!     |x| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0].powi(2)).powi(2),
//! )
//! .with_name("rosenbrock");
//! ```
//!
//! ## Usage
//!
//! When you have your function available, you can use the [`OptimizerDriver`]
//! to run the iteration process until a stopping condition is satisfied.
//!
//! ```rust
//! # use bbopt::{Domain, Objective};
//! #
//! # let f = Objective::new(
//! #     [(-10.0, 10.0), (-10.0, 10.0)].into_iter().collect::<Domain>(),
//! #     |x| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0].powi(2)).powi(2),
//! # );
//! use bbopt::{OptimizerDriver, Options, Termination};
//!
//! let mut options = Options::default();
//! options
//!     .set_max_function_evaluations(Some(20_000))
//!     .set_fitness_threshold(Some(1e-10))
//!     .set_seed_rng(2022);
//!
//! let mut optimizer = OptimizerDriver::builder(&f)
//!     .with_options(options)
//!     .with_initial(vec![-1.2, 1.0])
//!     .with_progress(|progress| {
//!         println!(
//!             "generation = {}\tevaluations = {}\tf(x) = {}",
//!             progress.generation(),
//!             progress.n_function_evaluations(),
//!             progress.best_so_far_y(),
//!         )
//!     })
//!     .build()
//!     .expect("invalid configuration");
//!
//! let results = optimizer.optimize().expect("optimizer encountered an error");
//!
//! if results.termination() == Termination::FitnessThreshold {
//!     println!("optimized: {:?}", results.best_so_far_x());
//! } else {
//!     println!("stopped: {}", results.termination().as_str());
//! }
//! ```
//!
//! ## License
//!
//! Licensed under MIT.

pub mod algo;
mod core;
pub mod driver;

pub use core::*;
pub use driver::{OptimizerBuilder, OptimizerDriver, Progress};

#[cfg(feature = "testing")]
pub mod testing;

#[cfg(not(feature = "testing"))]
pub(crate) mod testing;

pub use nalgebra;
