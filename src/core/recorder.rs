/// Compressed record of the search progress.
///
/// Each row is a pair of a 1-based evaluation index and the best value found
/// up to that evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct FitnessTable {
    rows: Vec<(usize, f64)>,
}

impl FitnessTable {
    /// The rows of the table.
    pub fn rows(&self) -> &[(usize, f64)] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterates over the evaluation indices.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.rows.iter().map(|(index, _)| *index)
    }

    /// Iterates over the values.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().map(|(_, value)| *value)
    }

    pub(crate) fn map_values(mut self, f: impl Fn(f64) -> f64) -> Self {
        self.rows.iter_mut().for_each(|(_, value)| *value = f(*value));
        self
    }
}

/// Compresses the history of values into a [`FitnessTable`].
#[derive(Debug, Clone, Copy)]
pub struct FitnessRecorder {
    stride: usize,
}

impl FitnessRecorder {
    /// Creates the recorder with given stride. Stride `0` disables recording.
    pub fn new(stride: usize) -> Self {
        Self { stride }
    }

    /// Whether the history needs to be recorded at all.
    pub fn is_enabled(&self) -> bool {
        self.stride > 0
    }

    /// Compresses the history (in the minimization convention).
    ///
    /// The values are first turned into a non-increasing sequence of
    /// best-so-far values. With stride 1, every entry is kept. With stride
    /// `s > 1`, the entries at indices `1, 1 + s, 1 + 2s, ...` are kept
    /// together with the last entry which is always present.
    pub fn compress(&self, mut history: Vec<f64>) -> Option<FitnessTable> {
        if self.stride == 0 {
            return None;
        }

        non_increasing(&mut history);
        let len = history.len();

        let rows = if self.stride == 1 {
            history
                .into_iter()
                .enumerate()
                .map(|(i, value)| (i + 1, value))
                .collect()
        } else if len == 0 {
            Vec::new()
        } else {
            let mut rows = (0..len - 1)
                .step_by(self.stride)
                .map(|i| (i + 1, history[i]))
                .collect::<Vec<_>>();
            rows.push((len, history[len - 1]));

            rows[0].0 = 1;
            rows
        };

        Some(FitnessTable { rows })
    }
}

/// Transforms the values into the running minimum in place.
pub fn non_increasing(values: &mut [f64]) {
    for i in 1..values.len() {
        let previous = values[i - 1];
        // NaN never propagates forward, it is replaced by the next value.
        if previous.is_nan() {
            continue;
        }

        if values[i].is_nan() || values[i] > previous {
            values[i] = previous;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled() {
        assert_eq!(FitnessRecorder::new(0).compress(vec![1.0, 2.0]), None);
    }

    #[test]
    fn stride_one_running_minimum() {
        let table = FitnessRecorder::new(1)
            .compress(vec![5.0, 6.0, 3.0, 4.0, 1.0])
            .unwrap();

        assert_eq!(
            table.rows(),
            &[(1, 5.0), (2, 5.0), (3, 3.0), (4, 3.0), (5, 1.0)]
        );
    }

    #[test]
    fn nan_is_not_propagated() {
        let table = FitnessRecorder::new(1)
            .compress(vec![f64::NAN, 3.0, 1.0])
            .unwrap();
        assert!(table.rows()[0].1.is_nan());
        assert_eq!(&table.rows()[1..], &[(2, 3.0), (3, 1.0)]);

        let table = FitnessRecorder::new(1)
            .compress(vec![1.0, f64::NAN, 2.0])
            .unwrap();
        assert_eq!(table.rows(), &[(1, 1.0), (2, 1.0), (3, 1.0)]);
    }

    #[test]
    fn stride_one_idempotent() {
        let sorted = vec![9.0, 7.0, 7.0, 2.0, 0.5];
        let table = FitnessRecorder::new(1).compress(sorted.clone()).unwrap();
        assert_eq!(table.values().collect::<Vec<_>>(), sorted);

        let mut again = table.values().collect::<Vec<_>>();
        non_increasing(&mut again);
        assert_eq!(again, sorted);
    }

    #[test]
    fn stride_boundary_not_divisible() {
        // L - 1 = 9 is not divisible by 4.
        let history = (0..10).rev().map(|v| v as f64).collect::<Vec<_>>();
        let table = FitnessRecorder::new(4).compress(history).unwrap();

        assert_eq!(table.indices().collect::<Vec<_>>(), vec![1, 5, 9, 10]);
        assert_eq!(table.values().collect::<Vec<_>>(), vec![9.0, 5.0, 1.0, 0.0]);
    }

    #[test]
    fn stride_boundary_divisible() {
        // L - 1 = 8 is divisible by 4.
        let history = vec![3.0; 9];
        let table = FitnessRecorder::new(4).compress(history).unwrap();

        assert_eq!(table.indices().collect::<Vec<_>>(), vec![1, 5, 9]);
    }

    #[test]
    fn stride_single_entry() {
        let table = FitnessRecorder::new(3).compress(vec![2.0]).unwrap();
        assert_eq!(table.rows(), &[(1, 2.0)]);
    }

    #[test]
    fn stride_applies_running_minimum() {
        let table = FitnessRecorder::new(2)
            .compress(vec![4.0, 1.0, 8.0, 9.0])
            .unwrap();

        assert_eq!(table.rows(), &[(1, 4.0), (3, 1.0), (4, 1.0)]);
    }
}
