use std::collections::VecDeque;

/// Trailing window of segment-best values used to detect that a search
/// segment stopped making progress.
#[derive(Debug, Clone)]
pub(crate) struct Stagnation {
    values: VecDeque<f64>,
    window: usize,
    fitness_diff: f64,
}

impl Stagnation {
    pub fn new(window: usize, fitness_diff: f64) -> Self {
        Self {
            values: VecDeque::with_capacity(window),
            window,
            fitness_diff,
        }
    }

    /// Appends the best value of the last generation.
    pub fn push(&mut self, y: f64) {
        if self.values.len() == self.window {
            self.values.pop_front();
        }
        self.values.push_back(y);
    }

    /// The window is full and the improvement over it is below the
    /// tolerance.
    pub fn is_stagnating(&self) -> bool {
        if self.window == 0 || self.values.len() < self.window {
            return false;
        }

        match (self.values.front(), self.values.back()) {
            (Some(first), Some(last)) => first - last < self.fitness_diff,
            _ => false,
        }
    }

    pub fn reset(&mut self, window: usize) {
        self.values.clear();
        self.window = window;
    }
}
