//! Concrete engines built on the stage-driven simulator.
//!
//! Every metric these engines publish is a simulated demo value drawn from
//! fixed ranges; none of them look at market data.

pub mod chess;
pub mod dna;
pub mod predator;

pub use chess::{ChessEngine, ChessScenario, ChessState, ChessStrategy};
pub use dna::{DnaEngine, DnaScenario, DnaState, EvolutionStage};
pub use predator::{HuntingMode, PredatorEngine, PredatorScenario, PredatorState};
