//! Core abstractions and types for bbopt.
//!
//! *Users* are mainly interested in implementing the [`Function`] trait,
//! optionally specifying the [domain](Domain), and reading the [`Results`].
//!
//! Algorithms *developers* are interested in implementing the [`Optimizer`]
//! trait and using the [`Context`] for evaluating points, checking the
//! stopping conditions and sampling.

mod base;
mod context;
mod domain;
mod evaluator;
mod function;
mod optimizer;
mod options;
mod recorder;
mod results;
mod termination;

pub use base::*;
pub use context::*;
pub use domain::*;
pub use evaluator::*;
pub use function::*;
pub use optimizer::*;
pub use options::*;
pub use recorder::*;
pub use results::*;
pub use termination::*;
