use super::{base::ProblemError, context::Context, function::Function, results::Results};

/// Outcome of a single generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The generation was completed and the search state was updated.
    Completed,
    /// A stopping condition was satisfied in the middle of the generation.
    /// Evaluations done so far are counted, but the search state was left
    /// untouched.
    Aborted,
}

/// Interface of an optimizer.
///
/// An optimizer is an iterative algorithm that repeatedly samples and
/// evaluates points through the [`Context`], minimizing the objective. The
/// lifecycle is driven by [`OptimizerDriver`](crate::OptimizerDriver):
/// [`initialize`](Optimizer::initialize) once, then
/// [`iterate`](Optimizer::iterate) until a stopping condition is satisfied,
/// with the chance to [`restart`](Optimizer::restart) after every completed
/// generation.
///
/// The values returned by [`Context::evaluate`] are always in the
/// minimization convention, even for maximization problems.
///
/// If you implement an optimizer, please reach out to discuss if we could
/// include it in bbopt.
///
/// ## Implementing an optimizer
///
/// Here is an implementation of a random "optimizer" which randomly generates
/// values in a hope that a minimum can be found with enough luck.
///
/// ```rust
/// use bbopt::{Context, Function, Optimizer, ProblemError, Step};
///
/// struct Random;
///
/// impl<F: Function> Optimizer<F> for Random {
///     const NAME: &'static str = "Random";
///     type Error = ProblemError;
///
///     fn initialize(&mut self, ctx: &mut Context<'_, F>) -> Result<(), Self::Error> {
///         let x = ctx.initial_point(false);
///         ctx.evaluate(&x)?;
///         Ok(())
///     }
///
///     fn iterate(&mut self, ctx: &mut Context<'_, F>) -> Result<Step, Self::Error> {
///         if ctx.should_stop() {
///             return Ok(Step::Aborted);
///         }
///
///         // Randomly sample in the domain.
///         let x = ctx.initial_point(true);
///         ctx.evaluate(&x)?;
///         Ok(Step::Completed)
///     }
/// }
/// ```
pub trait Optimizer<F: Function> {
    /// Name of the optimizer.
    const NAME: &'static str;

    /// Error while computing the next step. Failures of the objective must be
    /// propagated unmodified.
    type Error: From<ProblemError>;

    /// Initializes the search state and evaluates the starting point(s).
    fn initialize(&mut self, ctx: &mut Context<'_, F>) -> Result<(), Self::Error>;

    /// Advances the search by exactly one generation.
    ///
    /// Implementations evaluating more than one point per generation must
    /// check [`Context::should_stop`] before each evaluation and return
    /// [`Step::Aborted`] without updating the search state if it is satisfied.
    fn iterate(&mut self, ctx: &mut Context<'_, F>) -> Result<Step, Self::Error>;

    /// Decides whether the search stagnated and restarts it if so. Returns
    /// whether the restart happened. Called after every completed generation
    /// if restarts are enabled. The default implementation never restarts.
    fn restart(&mut self, ctx: &mut Context<'_, F>) -> Result<bool, Self::Error> {
        let _ = ctx;
        Ok(false)
    }

    /// Adds algorithm-specific information to the results. The fields are
    /// read-only outside of this crate.
    fn finish(&self, results: &mut Results) {
        let _ = results;
    }
}
