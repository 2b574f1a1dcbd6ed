//! The collection of implemented algorithms.

pub mod evolution_strategy;
pub mod noisy_annealing;
pub mod pattern_search;
mod stagnation;

pub use evolution_strategy::EvolutionStrategy;
pub use noisy_annealing::NoisyAnnealing;
pub use pattern_search::PatternSearch;
