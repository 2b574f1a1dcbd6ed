use std::time::{Duration, Instant};

use log::trace;
use nalgebra::DVector;

use super::{base::ProblemError, function::Function};

/// Wrapper of the objective function that does the bookkeeping of all
/// evaluations.
///
/// Algorithms always minimize. If the problem is a maximization problem, the
/// value of the objective is negated right after the evaluation and all values
/// stored by the evaluator are in this internal convention. The conversion
/// back happens only when the results are collected, or when the value is
/// returned from [`Evaluator::evaluate`].
pub struct Evaluator<'a, F: Function> {
    f: &'a F,
    args: Option<&'a F::Args>,
    dim: usize,
    maximize: bool,
    n_evaluations: usize,
    time_evaluations: Duration,
    best: Option<(DVector<f64>, f64)>,
    segment_best: f64,
    history: Option<Vec<f64>>,
    recent: Vec<f64>,
}

impl<'a, F: Function> Evaluator<'a, F> {
    /// Creates the evaluator. If `record` is true, all values are stored in
    /// the history.
    pub fn new(f: &'a F, args: Option<&'a F::Args>, dim: usize, record: bool) -> Self {
        Self {
            f,
            args,
            dim,
            maximize: f.is_maximization(),
            n_evaluations: 0,
            time_evaluations: Duration::ZERO,
            best: None,
            segment_best: f64::INFINITY,
            history: record.then(Vec::new),
            recent: Vec::new(),
        }
    }

    /// Evaluates the objective in given point and returns the value in the
    /// convention of the problem (i.e., as returned by the objective).
    ///
    /// On success, the number of evaluations is incremented by exactly one and
    /// the best-so-far point is updated if the value strictly improves it. On
    /// failure, no state is changed.
    pub fn evaluate(&mut self, x: &DVector<f64>) -> Result<f64, ProblemError> {
        self.evaluate_min(x).map(|y| self.external(y))
    }

    /// Same as [`Evaluator::evaluate`], but returns the value in the internal
    /// (minimization) convention.
    pub fn evaluate_min(&mut self, x: &DVector<f64>) -> Result<f64, ProblemError> {
        if x.nrows() != self.dim {
            return Err(ProblemError::InvalidDimensionality {
                expected: self.dim,
                actual: x.nrows(),
            });
        }

        let start = Instant::now();
        let value = self.f.apply(x, self.args)?;
        self.time_evaluations += start.elapsed();

        let y = if self.maximize { -value } else { value };
        self.n_evaluations += 1;

        trace!("evaluation {}: f(x) = {}", self.n_evaluations, value);

        if y < self.best_y() {
            self.best = Some((x.clone_owned(), y));
        }

        if y < self.segment_best {
            self.segment_best = y;
        }

        if let Some(history) = &mut self.history {
            history.push(y);
        }
        self.recent.push(y);

        Ok(y)
    }

    /// Number of successful evaluations.
    pub fn n_evaluations(&self) -> usize {
        self.n_evaluations
    }

    /// Cumulative time spent inside the objective.
    pub fn time_evaluations(&self) -> Duration {
        self.time_evaluations
    }

    /// Best-so-far value in the internal convention (infinity if nothing was
    /// evaluated yet).
    pub fn best_y(&self) -> f64 {
        self.best.as_ref().map(|(_, y)| *y).unwrap_or(f64::INFINITY)
    }

    /// Copy of the best-so-far point.
    pub fn best_x(&self) -> Option<DVector<f64>> {
        self.best.as_ref().map(|(x, _)| x.clone_owned())
    }

    /// Best value since the current search segment began.
    pub fn segment_best_y(&self) -> f64 {
        self.segment_best
    }

    /// Starts a new search segment after a restart. The global best-so-far is
    /// kept.
    pub fn begin_segment(&mut self) {
        self.segment_best = f64::INFINITY;
    }

    /// Whether the problem is maximized.
    pub fn is_maximization(&self) -> bool {
        self.maximize
    }

    /// Converts a value of the internal convention to the convention of the
    /// problem.
    pub fn external(&self, y: f64) -> f64 {
        if self.maximize {
            -y
        } else {
            y
        }
    }

    /// Values evaluated since the last call to [`Evaluator::take_recent`].
    pub fn recent(&self) -> &[f64] {
        &self.recent
    }

    /// Clears the recent values.
    pub fn take_recent(&mut self) -> Vec<f64> {
        std::mem::take(&mut self.recent)
    }

    /// Consumes the history of all values, if it was recorded.
    pub fn take_history(&mut self) -> Option<Vec<f64>> {
        self.history.take()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use nalgebra::dvector;

    use super::*;
    use crate::core::{Domain, Objective, Problem};

    #[test]
    fn counts_and_tracks_best() {
        let f = Objective::new(Domain::unconstrained(1), |x| x[0].abs());
        let mut evaluator = Evaluator::new(&f, None, 1, true);

        assert_eq!(evaluator.evaluate(&dvector![3.0]).unwrap(), 3.0);
        assert_eq!(evaluator.evaluate(&dvector![1.0]).unwrap(), 1.0);
        assert_eq!(evaluator.evaluate(&dvector![2.0]).unwrap(), 2.0);

        assert_eq!(evaluator.n_evaluations(), 3);
        assert_eq!(evaluator.best_y(), 1.0);
        assert_eq!(evaluator.best_x().unwrap(), dvector![1.0]);
        assert_eq!(evaluator.take_history().unwrap(), vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn ties_keep_first_point() {
        let f = Objective::new(Domain::unconstrained(1), |_| 1.0);
        let mut evaluator = Evaluator::new(&f, None, 1, false);

        evaluator.evaluate(&dvector![5.0]).unwrap();
        evaluator.evaluate(&dvector![6.0]).unwrap();

        assert_eq!(evaluator.best_x().unwrap(), dvector![5.0]);
        assert!(evaluator.take_history().is_none());
    }

    #[test]
    fn maximization_is_negated() {
        let f = Objective::new(Domain::unconstrained(1), |x| x[0]).maximize();
        let mut evaluator = Evaluator::new(&f, None, 1, false);

        assert_eq!(evaluator.evaluate(&dvector![2.0]).unwrap(), 2.0);
        assert_eq!(evaluator.evaluate_min(&dvector![1.0]).unwrap(), -1.0);

        assert_eq!(evaluator.n_evaluations(), 2);
        assert_eq!(evaluator.best_x().unwrap(), dvector![2.0]);
        assert_eq!(evaluator.best_y(), -2.0);
        assert_eq!(evaluator.external(evaluator.best_y()), 2.0);
    }

    struct FailOnSecond(Cell<usize>);

    impl Problem for FailOnSecond {
        fn domain(&self) -> Domain {
            Domain::unconstrained(1)
        }
    }

    impl Function for FailOnSecond {
        type Args = ();

        fn apply(&self, x: &DVector<f64>, _: Option<&()>) -> Result<f64, ProblemError> {
            let calls = self.0.get() + 1;
            self.0.set(calls);

            if calls == 2 {
                Err(ProblemError::Custom("boom".into()))
            } else {
                Ok(x[0])
            }
        }
    }

    #[test]
    fn failed_evaluation_is_not_counted() {
        let f = FailOnSecond(Cell::new(0));
        let mut evaluator = Evaluator::new(&f, None, 1, true);

        evaluator.evaluate(&dvector![1.0]).unwrap();
        assert!(evaluator.evaluate(&dvector![0.0]).is_err());

        assert_eq!(evaluator.n_evaluations(), 1);
        assert_eq!(evaluator.best_y(), 1.0);
        assert_eq!(evaluator.take_history().unwrap(), vec![1.0]);
    }

    #[test]
    fn segment_best_is_independent() {
        let f = Objective::new(Domain::unconstrained(1), |x| x[0]);
        let mut evaluator = Evaluator::new(&f, None, 1, false);

        evaluator.evaluate(&dvector![1.0]).unwrap();
        evaluator.begin_segment();
        evaluator.evaluate(&dvector![5.0]).unwrap();

        assert_eq!(evaluator.segment_best_y(), 5.0);
        assert_eq!(evaluator.best_y(), 1.0);
    }

    #[test]
    fn wrong_dimension() {
        let f = Objective::new(Domain::unconstrained(2), |x| x[0]);
        let mut evaluator = Evaluator::new(&f, None, 2, false);

        assert!(matches!(
            evaluator.evaluate(&dvector![1.0]),
            Err(ProblemError::InvalidDimensionality {
                expected: 2,
                actual: 1
            })
        ));
        assert_eq!(evaluator.n_evaluations(), 0);
    }
}
