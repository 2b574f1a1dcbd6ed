//! Problem domain definition (dimensionality, bound constraints).

use std::iter::FromIterator;

use nalgebra::DVector;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal, Uniform};

use super::base::ConfigError;

/// Domain for a problem.
///
/// Besides the bounds of the search space, the domain can hold separate
/// *initial* bounds which are used only for sampling starting points. If they
/// are not given, the search bounds are used.
#[derive(Debug, Clone)]
pub struct Domain {
    lower: DVector<f64>,
    upper: DVector<f64>,
    initial: Option<(DVector<f64>, DVector<f64>)>,
}

impl Domain {
    /// Creates unconstrained domain with given dimensionality.
    pub fn unconstrained(dim: usize) -> Self {
        Self {
            lower: DVector::from_element(dim, f64::NEG_INFINITY),
            upper: DVector::from_element(dim, f64::INFINITY),
            initial: None,
        }
    }

    /// Creates rectangular domain with given lower and upper bounds.
    ///
    /// Positive and negative infinity can be used to indicate a value unbounded
    /// in that dimension and direction. If the entire domain is unconstrained,
    /// use [`Domain::unconstrained`] instead.
    ///
    /// The bounds are checked by [`Domain::validate`] when an optimizer is
    /// built.
    pub fn rect(lower: Vec<f64>, upper: Vec<f64>) -> Self {
        Self {
            lower: DVector::from_vec(lower),
            upper: DVector::from_vec(upper),
            initial: None,
        }
    }

    /// Sets the bounds used only for sampling starting points.
    pub fn with_initial_bounds(mut self, lower: Vec<f64>, upper: Vec<f64>) -> Self {
        self.initial = Some((DVector::from_vec(lower), DVector::from_vec(upper)));
        self
    }

    /// Gets the dimensionality of the domain.
    pub fn dim(&self) -> usize {
        self.lower.nrows()
    }

    /// Lower bounds of the search space.
    pub fn lower(&self) -> &DVector<f64> {
        &self.lower
    }

    /// Upper bounds of the search space.
    pub fn upper(&self) -> &DVector<f64> {
        &self.upper
    }

    /// Lower bounds for sampling starting points.
    pub fn initial_lower(&self) -> &DVector<f64> {
        self.initial
            .as_ref()
            .map(|(lower, _)| lower)
            .unwrap_or(&self.lower)
    }

    /// Upper bounds for sampling starting points.
    pub fn initial_upper(&self) -> &DVector<f64> {
        self.initial
            .as_ref()
            .map(|(_, upper)| upper)
            .unwrap_or(&self.upper)
    }

    /// Checks the invariants of the domain: positive dimensionality, matching
    /// lengths of all bound vectors and lower <= upper in every coordinate.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let dim = self.dim();

        if dim == 0 {
            return Err(ConfigError::EmptyDomain);
        }

        let mut bounds = vec![("lower", &self.lower, "upper", &self.upper)];
        if let Some((lower, upper)) = &self.initial {
            bounds.push(("initial lower", lower, "initial upper", upper));
        }

        for (lower_name, lower, upper_name, upper) in bounds {
            for (name, bound) in [(lower_name, lower), (upper_name, upper)] {
                if bound.nrows() != dim {
                    return Err(ConfigError::BoundsDimension {
                        name,
                        expected: dim,
                        actual: bound.nrows(),
                    });
                }
            }

            // NaN bounds are rejected as well.
            if let Some((index, (li, ui))) = lower
                .iter()
                .zip(upper.iter())
                .enumerate()
                .find(|(_, (li, ui))| !(li <= ui))
            {
                return Err(ConfigError::InvalidBounds {
                    index,
                    lower: *li,
                    upper: *ui,
                });
            }
        }

        Ok(())
    }

    /// Checks whether the point lies inside the search bounds.
    pub fn contains(&self, x: &DVector<f64>) -> bool {
        self.lower
            .iter()
            .zip(self.upper.iter())
            .zip(x.iter())
            .all(|((li, ui), xi)| li <= xi && xi <= ui)
    }

    /// Projects given point into the domain. Returns `true` if the point was
    /// not feasible.
    pub fn project(&self, x: &mut DVector<f64>) -> bool {
        let mut not_feasible = false;

        self.lower
            .iter()
            .zip(self.upper.iter())
            .zip(x.iter_mut())
            .for_each(|((li, ui), xi)| {
                if *xi < *li {
                    *xi = *li;
                    not_feasible = true;
                } else if *xi > *ui {
                    *xi = *ui;
                    not_feasible = true;
                }
            });

        not_feasible
    }

    /// Samples a point within the initial bounds.
    ///
    /// Coordinates with both initial bounds finite are sampled uniformly.
    /// Unbounded coordinates are sampled from the standard normal
    /// distribution, reflected into the interval if it is bounded from one
    /// side.
    pub fn sample<R: Rng + ?Sized>(&self, x: &mut DVector<f64>, rng: &mut R) {
        let lower = self.initial_lower();
        let upper = self.initial_upper();

        x.iter_mut()
            .zip(lower.iter().copied().zip(upper.iter().copied()))
            .for_each(|(xi, (li, ui))| {
                if li.is_finite() && ui.is_finite() {
                    *xi = if (ui - li).is_finite() {
                        Uniform::new_inclusive(li, ui).sample(rng)
                    } else {
                        // The width overflows, so the bounds have opposite
                        // signs and the interpolation cannot overflow.
                        let u: f64 = rng.gen();
                        ((1.0 - u) * li + u * ui).clamp(li, ui)
                    };
                    return;
                }

                let random: f64 = StandardNormal.sample(rng);
                *xi = if li.is_finite() {
                    li + random.abs()
                } else if ui.is_finite() {
                    ui - random.abs()
                } else {
                    random
                };
            });
    }
}

impl FromIterator<(f64, f64)> for Domain {
    fn from_iter<I: IntoIterator<Item = (f64, f64)>>(iter: I) -> Self {
        let (lower, upper): (Vec<_>, Vec<_>) = iter.into_iter().unzip();
        Self::rect(lower, upper)
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[test]
    fn validate_rejects_empty() {
        assert_eq!(
            Domain::unconstrained(0).validate(),
            Err(ConfigError::EmptyDomain)
        );
    }

    #[test]
    fn validate_rejects_inverted_bounds() {
        let dom = Domain::rect(vec![-1.0, 2.0], vec![1.0, 1.0]);
        assert_eq!(
            dom.validate(),
            Err(ConfigError::InvalidBounds {
                index: 1,
                lower: 2.0,
                upper: 1.0
            })
        );
    }

    #[test]
    fn validate_rejects_mismatched_initial_bounds() {
        let dom = Domain::unconstrained(2).with_initial_bounds(vec![0.0], vec![1.0]);
        assert!(matches!(
            dom.validate(),
            Err(ConfigError::BoundsDimension {
                expected: 2,
                actual: 1,
                ..
            })
        ));
    }

    #[test]
    fn sample_within_initial_bounds() {
        let dom = [(-10.0, 10.0), (-10.0, 10.0)]
            .into_iter()
            .collect::<Domain>()
            .with_initial_bounds(vec![1.0, 2.0], vec![1.5, 2.5]);
        let mut rng = StdRng::seed_from_u64(3);
        let mut x = DVector::zeros(2);

        for _ in 0..100 {
            dom.sample(&mut x, &mut rng);
            assert!((1.0..=1.5).contains(&x[0]));
            assert!((2.0..=2.5).contains(&x[1]));
        }
    }

    #[test]
    fn sample_half_bounded() {
        let dom = Domain::rect(vec![0.0], vec![f64::INFINITY]);
        let mut rng = StdRng::seed_from_u64(3);
        let mut x = DVector::zeros(1);

        for _ in 0..100 {
            dom.sample(&mut x, &mut rng);
            assert!(x[0] >= 0.0);
        }
    }

    #[test]
    fn sample_huge_bounds() {
        let dom = Domain::rect(vec![-f64::MAX, 0.0], vec![f64::MAX, f64::MAX]);
        let mut rng = StdRng::seed_from_u64(3);
        let mut x = DVector::zeros(2);

        for _ in 0..100 {
            dom.sample(&mut x, &mut rng);
            assert!(x.iter().all(|xi| xi.is_finite()));
            assert!(dom.contains(&x));
        }
    }

    #[test]
    fn project_into_bounds() {
        let dom = Domain::rect(vec![0.0, 0.0], vec![1.0, 1.0]);
        let mut x = DVector::from_vec(vec![10.0, -10.0]);

        assert!(dom.project(&mut x));
        assert_eq!(x.as_slice(), &[1.0, 0.0]);
        assert!(dom.contains(&x));
    }
}
