use thiserror::Error;

use super::domain::Domain;

/// The base trait for [`Function`](super::function::Function).
///
/// It describes everything about the problem apart from the objective itself:
/// the [domain](Domain) of the search, an optional human-readable name and
/// the direction of the optimization.
pub trait Problem {
    /// Get the domain (dimensionality, bound constraints) of the problem.
    fn domain(&self) -> Domain;

    /// Human-readable name of the problem, used in logs. If not overridden,
    /// the problem is anonymous.
    fn name(&self) -> Option<&str> {
        None
    }

    /// Whether the objective is to be maximized instead of minimized. If not
    /// overridden, the objective is minimized.
    ///
    /// Algorithms always minimize. For maximization problems, the values are
    /// negated when they enter the evaluator and negated back in the reported
    /// results.
    fn is_maximization(&self) -> bool {
        false
    }
}

/// Error encountered while evaluating the objective function.
#[derive(Debug, Error)]
pub enum ProblemError {
    /// The number of variables does not match the dimensionality of the
    /// problem.
    #[error("invalid dimensionality: expected {expected}, got {actual}")]
    InvalidDimensionality {
        /// Dimensionality of the problem.
        expected: usize,
        /// Length of the evaluated point.
        actual: usize,
    },
    /// A custom error specific to the objective.
    #[error("{0}")]
    Custom(Box<dyn std::error::Error + Send + Sync>),
}

/// Invalid configuration detected when constructing an optimizer.
///
/// These errors always surface before any evaluation of the objective takes
/// place.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// The dimensionality of the problem is zero.
    #[error("dimensionality must be positive")]
    EmptyDomain,
    /// Bound vectors do not have the dimensionality of the problem.
    #[error("{name} bounds have dimension {actual}, expected {expected}")]
    BoundsDimension {
        /// Which bounds ("lower", "upper", "initial lower", ...).
        name: &'static str,
        /// Dimensionality of the problem.
        expected: usize,
        /// Length of the bound vector.
        actual: usize,
    },
    /// Lower bound is greater than the upper bound in some coordinate.
    #[error("lower bound {lower} is greater than upper bound {upper} in coordinate {index}")]
    InvalidBounds {
        /// Coordinate index.
        index: usize,
        /// Lower bound value.
        lower: f64,
        /// Upper bound value.
        upper: f64,
    },
    /// The starting point does not have the dimensionality of the problem.
    #[error("initial point has dimension {actual}, expected {expected}")]
    InitialDimension {
        /// Dimensionality of the problem.
        expected: usize,
        /// Length of the initial point.
        actual: usize,
    },
    /// An option value is outside of its valid range.
    #[error("invalid value {value} of option `{name}`: {reason}")]
    InvalidOption {
        /// Name of the option.
        name: &'static str,
        /// The rejected value.
        value: f64,
        /// Description of the valid range.
        reason: &'static str,
    },
    /// Unsupported schedule for the sampling intensity.
    #[error("unsupported schedule `{0}`, only `linear` and `quadratic` are supported")]
    UnknownSchedule(String),
}

impl ConfigError {
    pub(crate) fn option(name: &'static str, value: f64, reason: &'static str) -> Self {
        ConfigError::InvalidOption {
            name,
            value,
            reason,
        }
    }
}
