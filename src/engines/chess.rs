//! Chess-strategy engine.
//!
//! Walks Opening → Middle Game → Attack → Sacrifice → Defense → End Game,
//! re-drawing a book of "moves ahead" and a threat level at every stage.
//! All probabilities and pip targets are simulated demo values.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use crate::sim::aggregate::{self, Finding, FindingSummary};
use crate::sim::generator::{pick, FindingGenerator, MetricRange};
use crate::sim::{Scenario, Schedule, Simulator, Stage};
use crate::types::Timeframe;

const MOVE_PROBABILITY: MetricRange = MetricRange::between(0.60, 0.95);
const EXPECTED_PIPS: MetricRange = MetricRange::between(15.0, 45.0);

/// Default search depth.
pub const DEFAULT_MOVES_AHEAD: usize = 20;

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ChessStrategy {
    Opening,
    MiddleGame,
    Attack,
    Sacrifice,
    Defense,
    EndGame,
}

impl Stage for ChessStrategy {
    const SEQUENCE: &'static [Self] = &[
        ChessStrategy::Opening,
        ChessStrategy::MiddleGame,
        ChessStrategy::Attack,
        ChessStrategy::Sacrifice,
        ChessStrategy::Defense,
        ChessStrategy::EndGame,
    ];
}

impl fmt::Display for ChessStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChessStrategy::Opening => write!(f, "Opening Book"),
            ChessStrategy::MiddleGame => write!(f, "Middle Game"),
            ChessStrategy::Attack => write!(f, "Attack Mode"),
            ChessStrategy::Sacrifice => write!(f, "Sacrifice Play"),
            ChessStrategy::Defense => write!(f, "Defense Mode"),
            ChessStrategy::EndGame => write!(f, "End Game"),
        }
    }
}

// ---------------------------------------------------------------------------
// Threat level
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Default)]
pub enum ThreatLevel {
    #[default]
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl ThreatLevel {
    /// Map a uniform draw in `[0, 1)` onto a threat band.
    pub fn from_draw(u: f64) -> Self {
        match u {
            u if u < 0.3 => ThreatLevel::None,
            u if u < 0.5 => ThreatLevel::Low,
            u if u < 0.7 => ThreatLevel::Medium,
            u if u < 0.9 => ThreatLevel::High,
            _ => ThreatLevel::Critical,
        }
    }
}

impl fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreatLevel::None => write!(f, "No Threats"),
            ThreatLevel::Low => write!(f, "Low Risk"),
            ThreatLevel::Medium => write!(f, "Medium Risk"),
            ThreatLevel::High => write!(f, "High Risk"),
            ThreatLevel::Critical => write!(f, "Critical Risk"),
        }
    }
}

// ---------------------------------------------------------------------------
// Findings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MoveType {
    LiquidityGrab,
    Retracement,
    Breakout,
    Manipulation,
    Continuation,
    Reversal,
}

impl MoveType {
    pub const ALL: &'static [MoveType] = &[
        MoveType::LiquidityGrab,
        MoveType::Retracement,
        MoveType::Breakout,
        MoveType::Manipulation,
        MoveType::Continuation,
        MoveType::Reversal,
    ];

    fn tag(&self) -> &'static str {
        match self {
            MoveType::LiquidityGrab => "liquidity_grab",
            MoveType::Retracement => "retracement",
            MoveType::Breakout => "breakout",
            MoveType::Manipulation => "manipulation",
            MoveType::Continuation => "continuation",
            MoveType::Reversal => "reversal",
        }
    }
}

/// One simulated move in the look-ahead sequence.
#[derive(Debug, Clone, Serialize)]
pub struct MarketMove {
    pub id: Uuid,
    pub sequence: usize,
    pub move_type: MoveType,
    /// Simulated probability (demo value).
    pub probability: f64,
    pub expected_pips: f64,
    pub timeframe: Timeframe,
    pub description: String,
    pub generation: u32,
}

impl Finding for MarketMove {
    fn category(&self) -> &'static str {
        self.move_type.tag()
    }
    fn strength(&self) -> f64 {
        self.probability
    }
    fn description(&self) -> &str {
        &self.description
    }
    fn generation(&self) -> u32 {
        self.generation
    }
}

/// Entry in the fixed opening book.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChessOpening {
    pub name: &'static str,
    pub pattern: &'static str,
    pub win_rate: f64,
}

pub const OPENING_BOOK: &[ChessOpening] = &[
    ChessOpening { name: "London System", pattern: "Liquidity Grab → Retracement → Breakout", win_rate: 78.5 },
    ChessOpening { name: "Sicilian Defense", pattern: "False Break → Reversal → Continuation", win_rate: 82.3 },
    ChessOpening { name: "Queen's Gambit", pattern: "Sacrifice Small → Gain Large → Dominate", win_rate: 74.8 },
    ChessOpening { name: "King's Indian", pattern: "Defensive Setup → Counter Attack → Victory", win_rate: 76.9 },
    ChessOpening { name: "Ruy Lopez", pattern: "Pressure → Advantage → Conversion", win_rate: 79.2 },
];

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize)]
pub struct ChessState {
    pub moves: Vec<MarketMove>,
    pub threat: ThreatLevel,
    /// Mean move probability (demo value).
    pub position_strength: f64,
    pub opening: Option<ChessOpening>,
    /// Number of move scans performed this run.
    pub generation: u32,
    pub last_analysis_at: Option<DateTime<Utc>>,
}

impl ChessState {
    /// Highest-probability move, if any have been calculated.
    pub fn best_move(&self) -> Option<&MarketMove> {
        aggregate::strongest(&self.moves)
    }

    pub fn summary(&self) -> FindingSummary {
        FindingSummary::of(&self.moves)
    }

    /// Flavor text for the given stage.
    pub fn recommendation(&self, stage: ChessStrategy) -> String {
        match stage {
            ChessStrategy::Opening => format!(
                "Execute opening book strategy - {}",
                self.opening.map(|o| o.name).unwrap_or("Standard Opening")
            ),
            ChessStrategy::MiddleGame => "Focus on positional advantage and piece development".into(),
            ChessStrategy::Attack => "Aggressive assault mode - maximum pressure".into(),
            ChessStrategy::Sacrifice => "Tactical sacrifice detected - high reward potential".into(),
            ChessStrategy::Defense => "Defensive positioning - wait for counterattack opportunity".into(),
            ChessStrategy::EndGame => "Precise calculation required - convert advantage to victory".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Scenario
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ChessScenario {
    moves_ahead: usize,
}

impl ChessScenario {
    pub fn new(moves_ahead: usize) -> Self {
        Self { moves_ahead }
    }

    pub fn moves_ahead(&self) -> usize {
        self.moves_ahead
    }

    fn calculate_moves<R: Rng + ?Sized>(&self, state: &mut ChessState, rng: &mut R) {
        state.generation += 1;
        let generation = state.generation;
        let sequence: Vec<usize> = (1..=self.moves_ahead).collect();

        state.moves = FindingGenerator::exhaustive().scan(&sequence, rng, |&n, rng| {
            let move_type = *pick(MoveType::ALL, rng).unwrap_or(&MoveType::LiquidityGrab);
            MarketMove {
                id: Uuid::new_v4(),
                sequence: n,
                move_type,
                probability: MOVE_PROBABILITY.sample(rng),
                expected_pips: EXPECTED_PIPS.sample(rng),
                timeframe: Timeframe::M15,
                description: format!("Calculated move #{n}"),
                generation,
            }
        });
    }

    fn analyse<R: Rng + ?Sized>(&self, state: &mut ChessState, rng: &mut R) {
        self.calculate_moves(state, rng);
        state.threat = ThreatLevel::from_draw(rng.gen::<f64>());
        state.position_strength = aggregate::mean_strength(&state.moves);
        state.last_analysis_at = Some(Utc::now());
    }
}

impl Default for ChessScenario {
    fn default() -> Self {
        Self::new(DEFAULT_MOVES_AHEAD)
    }
}

impl Scenario for ChessScenario {
    type Stage = ChessStrategy;
    type State = ChessState;
    const NAME: &'static str = "chess";

    fn begin<R: Rng + ?Sized>(&self, state: &mut ChessState, rng: &mut R) {
        state.opening = pick(OPENING_BOOK, rng).copied();
        self.analyse(state, rng);
    }

    fn advance<R: Rng + ?Sized>(&self, state: &mut ChessState, _stage: ChessStrategy, rng: &mut R) {
        self.analyse(state, rng);
    }
}

pub type ChessEngine<R> = Simulator<ChessScenario, R>;

impl<R: Rng + Send + 'static> Simulator<ChessScenario, R> {
    pub fn chess(moves_ahead: usize, rng: R, schedule: Schedule) -> Self {
        Simulator::new(ChessScenario::new(moves_ahead), rng, schedule)
    }

    /// Recommendation for the current stage.
    pub fn strategic_recommendation(&self) -> String {
        let snap = self.snapshot();
        snap.state.recommendation(snap.stage)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_threat_bands() {
        assert_eq!(ThreatLevel::from_draw(0.0), ThreatLevel::None);
        assert_eq!(ThreatLevel::from_draw(0.29), ThreatLevel::None);
        assert_eq!(ThreatLevel::from_draw(0.3), ThreatLevel::Low);
        assert_eq!(ThreatLevel::from_draw(0.55), ThreatLevel::Medium);
        assert_eq!(ThreatLevel::from_draw(0.89), ThreatLevel::High);
        assert_eq!(ThreatLevel::from_draw(0.95), ThreatLevel::Critical);
    }

    #[test]
    fn test_begin_calculates_moves() {
        let scenario = ChessScenario::new(8);
        let mut state = ChessState::default();
        let mut rng = StdRng::seed_from_u64(5);

        scenario.begin(&mut state, &mut rng);

        assert_eq!(state.moves.len(), 8);
        assert!(state.opening.is_some());
        assert_eq!(state.generation, 1);
        for (i, m) in state.moves.iter().enumerate() {
            assert_eq!(m.sequence, i + 1);
            assert!(MOVE_PROBABILITY.contains(m.probability));
            assert!(EXPECTED_PIPS.contains(m.expected_pips));
            assert_eq!(m.generation, 1);
        }
        let mean = state.moves.iter().map(|m| m.probability).sum::<f64>() / 8.0;
        assert!((state.position_strength - mean).abs() < 1e-12);
    }

    #[test]
    fn test_advance_replaces_moves() {
        let scenario = ChessScenario::new(4);
        let mut state = ChessState::default();
        let mut rng = StdRng::seed_from_u64(5);
        scenario.begin(&mut state, &mut rng);
        let first_ids: Vec<Uuid> = state.moves.iter().map(|m| m.id).collect();

        scenario.advance(&mut state, ChessStrategy::MiddleGame, &mut rng);

        assert_eq!(state.generation, 2);
        assert_eq!(state.moves.len(), 4);
        assert!(state.moves.iter().all(|m| !first_ids.contains(&m.id)));
        assert!(state.moves.iter().all(|m| m.generation == 2));
    }

    #[test]
    fn test_best_move_is_max_probability() {
        let scenario = ChessScenario::new(12);
        let mut state = ChessState::default();
        scenario.begin(&mut state, &mut StdRng::seed_from_u64(21));

        let best = state.best_move().unwrap();
        assert!(state.moves.iter().all(|m| m.probability <= best.probability));
    }

    #[test]
    fn test_zero_depth_has_no_best_move() {
        let scenario = ChessScenario::new(0);
        let mut state = ChessState::default();
        scenario.begin(&mut state, &mut StdRng::seed_from_u64(1));
        assert!(state.moves.is_empty());
        assert!(state.best_move().is_none());
        assert_eq!(state.position_strength, 0.0);
    }

    #[test]
    fn test_recommendation_mentions_opening() {
        let state = ChessState {
            opening: Some(OPENING_BOOK[1]),
            ..Default::default()
        };
        assert_eq!(
            state.recommendation(ChessStrategy::Opening),
            "Execute opening book strategy - Sicilian Defense"
        );
        assert!(ChessState::default()
            .recommendation(ChessStrategy::Opening)
            .ends_with("Standard Opening"));
    }

    #[test]
    fn test_state_serializes_to_json() {
        let scenario = ChessScenario::new(5);
        let mut state = ChessState::default();
        scenario.begin(&mut state, &mut StdRng::seed_from_u64(9));

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["moves"].as_array().map(Vec::len), Some(5));
        assert_eq!(json["generation"], 1);
        assert!(json["opening"]["name"].is_string());
    }

    #[test]
    fn test_metric_ranges_validate() {
        for range in [MOVE_PROBABILITY, EXPECTED_PIPS] {
            assert_eq!(MetricRange::try_new(range.lo(), range.hi()), Ok(range));
        }
    }

    #[test]
    fn test_strategy_display() {
        assert_eq!(format!("{}", ChessStrategy::MiddleGame), "Middle Game");
        assert_eq!(ChessStrategy::terminal(), ChessStrategy::EndGame);
    }
}
