use nalgebra::DVector;

use super::{
    base::{Problem, ProblemError},
    domain::Domain,
};

/// Definition of an objective function.
///
/// ## Defining a function
///
/// A function is any type that implements [`Function`] and [`Problem`] traits.
///
/// ```rust
/// use bbopt::nalgebra as na;
/// use bbopt::{Domain, Function, Problem, ProblemError};
///
/// // https://en.wikipedia.org/wiki/Rosenbrock_function
/// struct Rosenbrock {
///     a: f64,
///     b: f64,
/// }
///
/// impl Problem for Rosenbrock {
///     fn domain(&self) -> Domain {
///         Domain::unconstrained(2)
///     }
/// }
///
/// impl Function for Rosenbrock {
///     // No extra arguments.
///     type Args = ();
///
///     fn apply(&self, x: &na::DVector<f64>, _: Option<&()>) -> Result<f64, ProblemError> {
///         Ok((self.a - x[0]).powi(2) + self.b * (x[1] - x[0].powi(2)).powi(2))
///     }
/// }
/// ```
///
/// The evaluation may fail. Such failure is propagated unmodified to the
/// caller of the optimization and the failed evaluation is not counted.
pub trait Function: Problem {
    /// Type of extra arguments forwarded to every evaluation. Use `()` if the
    /// function does not need any.
    type Args: ?Sized;

    /// Calculates the function value in given point.
    fn apply(&self, x: &DVector<f64>, args: Option<&Self::Args>) -> Result<f64, ProblemError>;
}

/// Adapter turning a closure into a [`Function`].
///
/// ```rust
/// use bbopt::{Domain, Objective};
///
/// let sphere = Objective::new(Domain::unconstrained(3), |x| x.iter().map(|xi| xi * xi).sum::<f64>())
///     .with_name("sphere");
/// ```
pub struct Objective<G> {
    f: G,
    domain: Domain,
    name: Option<String>,
    maximize: bool,
}

impl<G> Objective<G>
where
    G: Fn(&[f64]) -> f64,
{
    /// Wraps the closure with given domain. The function is minimized.
    pub fn new(domain: Domain, f: G) -> Self {
        Self {
            f,
            domain,
            name: None,
            maximize: false,
        }
    }

    /// Sets the name of the problem.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Marks the function to be maximized instead of minimized.
    pub fn maximize(mut self) -> Self {
        self.maximize = true;
        self
    }
}

impl<G> Problem for Objective<G> {
    fn domain(&self) -> Domain {
        self.domain.clone()
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn is_maximization(&self) -> bool {
        self.maximize
    }
}

impl<G> Function for Objective<G>
where
    G: Fn(&[f64]) -> f64,
{
    type Args = ();

    fn apply(&self, x: &DVector<f64>, _: Option<&()>) -> Result<f64, ProblemError> {
        Ok((self.f)(x.as_slice()))
    }
}
