//! Predator-instinct engine.
//!
//! A hunt runs Stalking → Tracking → Ambush → Pursuit → Strike → Feeding.
//! Prey is scanned once at the start; sensors are resampled at every
//! stage and instinct strength follows their mean scaled by the mode's
//! stealth. Career statistics outlive individual hunts.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use crate::sim::aggregate::{self, Finding, FindingSummary};
use crate::sim::generator::{FindingGenerator, MetricRange, Probability};
use crate::sim::{Scenario, Schedule, Simulator, Stage};
use crate::types::Timeframe;

const PREY_STRENGTH: MetricRange = MetricRange::between(0.3, 0.8);
const PREY_VULNERABILITY: MetricRange = MetricRange::between(0.4, 0.9);
const PREY_DISTANCE: MetricRange = MetricRange::between(10.0, 100.0);
const PREY_REWARD: MetricRange = MetricRange::between(25.0, 75.0);
const PREY_RISK: MetricRange = MetricRange::between(0.1, 0.6);
const HUNT_REWARD: MetricRange = MetricRange::between(30.0, 80.0);

pub const DEFAULT_DETECTION_CHANCE: f64 = 0.4;
pub const DEFAULT_STRIKE_THRESHOLD: f64 = 0.6;

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HuntingMode {
    Stalking,
    Tracking,
    Ambush,
    Pursuit,
    Strike,
    Feeding,
}

impl HuntingMode {
    pub fn stealth(&self) -> f64 {
        match self {
            HuntingMode::Stalking => 1.0,
            HuntingMode::Tracking => 0.9,
            HuntingMode::Ambush => 0.95,
            HuntingMode::Pursuit => 0.7,
            HuntingMode::Strike => 0.3,
            HuntingMode::Feeding => 0.8,
        }
    }
}

impl Stage for HuntingMode {
    const SEQUENCE: &'static [Self] = &[
        HuntingMode::Stalking,
        HuntingMode::Tracking,
        HuntingMode::Ambush,
        HuntingMode::Pursuit,
        HuntingMode::Strike,
        HuntingMode::Feeding,
    ];
}

impl fmt::Display for HuntingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HuntingMode::Stalking => write!(f, "Stealth Stalking"),
            HuntingMode::Tracking => write!(f, "Prey Tracking"),
            HuntingMode::Ambush => write!(f, "Ambush Position"),
            HuntingMode::Pursuit => write!(f, "Active Pursuit"),
            HuntingMode::Strike => write!(f, "Strike Mode"),
            HuntingMode::Feeding => write!(f, "Feeding"),
        }
    }
}

// ---------------------------------------------------------------------------
// Prey
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PreyType {
    WeakLiquidity,
    OverextendedPrice,
    FalseBreakout,
    StopHunt,
    LiquidityGrab,
    ManipulationZone,
}

impl PreyType {
    pub const ALL: &'static [PreyType] = &[
        PreyType::WeakLiquidity,
        PreyType::OverextendedPrice,
        PreyType::FalseBreakout,
        PreyType::StopHunt,
        PreyType::LiquidityGrab,
        PreyType::ManipulationZone,
    ];

    fn tag(&self) -> &'static str {
        match self {
            PreyType::WeakLiquidity => "weak_liquidity",
            PreyType::OverextendedPrice => "overextended_price",
            PreyType::FalseBreakout => "false_breakout",
            PreyType::StopHunt => "stop_hunt",
            PreyType::LiquidityGrab => "liquidity_grab",
            PreyType::ManipulationZone => "manipulation_zone",
        }
    }
}

impl fmt::Display for PreyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreyType::WeakLiquidity => write!(f, "Weak Liquidity"),
            PreyType::OverextendedPrice => write!(f, "Overextended Price"),
            PreyType::FalseBreakout => write!(f, "False Breakout"),
            PreyType::StopHunt => write!(f, "Stop Hunt"),
            PreyType::LiquidityGrab => write!(f, "Liquidity Grab"),
            PreyType::ManipulationZone => write!(f, "Manipulation Zone"),
        }
    }
}

/// Simulated opportunity picked up by a prey scan.
#[derive(Debug, Clone, Serialize)]
pub struct MarketPrey {
    pub id: Uuid,
    pub prey_type: PreyType,
    pub strength: f64,
    pub vulnerability: f64,
    pub distance: f64,
    pub reward: f64,
    pub risk_level: f64,
    pub timeframe: Timeframe,
    pub description: String,
    pub generation: u32,
}

impl Finding for MarketPrey {
    fn category(&self) -> &'static str {
        self.prey_type.tag()
    }
    fn strength(&self) -> f64 {
        self.strength
    }
    fn description(&self) -> &str {
        &self.description
    }
    fn generation(&self) -> u32 {
        self.generation
    }
}

// ---------------------------------------------------------------------------
// Sensors & stats
// ---------------------------------------------------------------------------

/// Six simulated sensor gauges.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SensoryData {
    pub liquidity_movements: f64,
    pub momentum_surges: f64,
    pub volume_intensity: f64,
    pub price_velocity: f64,
    pub market_tension: f64,
    pub environmental_factors: f64,
}

impl SensoryData {
    fn sample<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            liquidity_movements: MetricRange::between(0.1, 1.0).sample(rng),
            momentum_surges: MetricRange::between(0.2, 0.9).sample(rng),
            volume_intensity: MetricRange::between(0.3, 0.8).sample(rng),
            price_velocity: MetricRange::between(0.1, 0.7).sample(rng),
            market_tension: MetricRange::between(0.2, 0.85).sample(rng),
            environmental_factors: MetricRange::between(0.4, 0.9).sample(rng),
        }
    }

    pub fn average(&self) -> f64 {
        (self.liquidity_movements
            + self.momentum_surges
            + self.volume_intensity
            + self.price_velocity
            + self.market_tension
            + self.environmental_factors)
            / 6.0
    }
}

/// Career statistics across hunts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PredatorStats {
    pub successful_hunts: u32,
    pub failed_hunts: u32,
    pub total_reward: f64,
    /// Running mean of hunt durations, in seconds.
    pub average_stalk_secs: f64,
}

impl PredatorStats {
    pub fn total_hunts(&self) -> u32 {
        self.successful_hunts + self.failed_hunts
    }

    /// Fraction of successful hunts; 0.0 before the first hunt.
    pub fn success_rate(&self) -> f64 {
        match self.total_hunts() {
            0 => 0.0,
            n => self.successful_hunts as f64 / n as f64,
        }
    }

    /// Success rate as a percentage.
    pub fn efficiency(&self) -> f64 {
        self.success_rate() * 100.0
    }

    pub fn rank(&self) -> &'static str {
        match self.efficiency() {
            e if e < 30.0 => "Novice",
            e if e < 50.0 => "Hunter",
            e if e < 70.0 => "Skilled",
            e if e < 85.0 => "Expert",
            e if e < 95.0 => "Master",
            _ => "Alpha",
        }
    }

    pub fn record_hunt(&mut self, success: bool, reward: f64, stalk_secs: f64) {
        if success {
            self.successful_hunts += 1;
            self.total_reward += reward;
        } else {
            self.failed_hunts += 1;
        }
        let n = self.total_hunts() as f64;
        self.average_stalk_secs += (stalk_secs - self.average_stalk_secs) / n;
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize)]
pub struct PredatorState {
    pub prey: Vec<MarketPrey>,
    pub sensors: SensoryData,
    pub stealth_level: f64,
    /// Mean sensor reading scaled by stealth (demo value).
    pub instinct_strength: f64,
    pub peak_instinct: f64,
    pub stats: PredatorStats,
    pub hunt_started_at: Option<DateTime<Utc>>,
    pub last_hunt_at: Option<DateTime<Utc>>,
    /// Outcome of the last completed hunt.
    pub last_hunt_success: Option<bool>,
    pub generation: u32,
}

impl PredatorState {
    /// Most vulnerable prey, if any was detected.
    pub fn prime_target(&self) -> Option<&MarketPrey> {
        aggregate::best_by(&self.prey, |p| p.vulnerability)
    }

    pub fn summary(&self) -> FindingSummary {
        FindingSummary::of(&self.prey)
    }

    fn sense<R: Rng + ?Sized>(&mut self, stealth: f64, rng: &mut R) {
        self.stealth_level = stealth;
        self.sensors = SensoryData::sample(rng);
        self.instinct_strength = self.sensors.average() * stealth;
        self.peak_instinct = self.peak_instinct.max(self.instinct_strength);
    }
}

// ---------------------------------------------------------------------------
// Scenario
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PredatorScenario {
    detection: FindingGenerator,
    strike_threshold: f64,
}

impl PredatorScenario {
    pub fn new(detection: Probability, strike_threshold: f64) -> Self {
        Self {
            detection: FindingGenerator::new(detection),
            strike_threshold,
        }
    }

    fn scan_for_prey<R: Rng + ?Sized>(&self, generation: u32, rng: &mut R) -> Vec<MarketPrey> {
        self.detection.scan(PreyType::ALL, rng, |&prey_type, rng| MarketPrey {
            id: Uuid::new_v4(),
            prey_type,
            strength: PREY_STRENGTH.sample(rng),
            vulnerability: PREY_VULNERABILITY.sample(rng),
            distance: PREY_DISTANCE.sample(rng),
            reward: PREY_REWARD.sample(rng),
            risk_level: PREY_RISK.sample(rng),
            timeframe: Timeframe::M15,
            description: format!("Detected {prey_type} - High probability target"),
            generation,
        })
    }

    fn complete_hunt<R: Rng + ?Sized>(&self, state: &mut PredatorState, rng: &mut R) {
        let now = Utc::now();
        let success = state.peak_instinct > self.strike_threshold;
        let reward = if success { HUNT_REWARD.sample(rng) } else { 0.0 };
        let stalk_secs = state
            .hunt_started_at
            .map(|start| (now - start).num_milliseconds().max(0) as f64 / 1000.0)
            .unwrap_or(0.0);

        state.stats.record_hunt(success, reward, stalk_secs);
        state.last_hunt_at = Some(now);
        state.last_hunt_success = Some(success);
    }
}

impl Default for PredatorScenario {
    fn default() -> Self {
        Self::new(Probability::fixed(DEFAULT_DETECTION_CHANCE), DEFAULT_STRIKE_THRESHOLD)
    }
}

impl Scenario for PredatorScenario {
    type Stage = HuntingMode;
    type State = PredatorState;
    const NAME: &'static str = "predator";

    fn begin<R: Rng + ?Sized>(&self, state: &mut PredatorState, rng: &mut R) {
        state.generation += 1;
        state.hunt_started_at = Some(Utc::now());
        state.prey = self.scan_for_prey(state.generation, rng);
        state.sense(HuntingMode::Stalking.stealth(), rng);
    }

    fn advance<R: Rng + ?Sized>(&self, state: &mut PredatorState, stage: HuntingMode, rng: &mut R) {
        state.sense(stage.stealth(), rng);
        if stage.is_terminal() {
            self.complete_hunt(state, rng);
        }
    }

    /// Clears the hunt but keeps career stats.
    fn reset(&self, state: &mut PredatorState) {
        let stats = std::mem::take(&mut state.stats);
        let last_hunt_at = state.last_hunt_at;
        *state = PredatorState {
            stats,
            last_hunt_at,
            ..PredatorState::default()
        };
    }
}

pub type PredatorEngine<R> = Simulator<PredatorScenario, R>;

impl<R: Rng + Send + 'static> Simulator<PredatorScenario, R> {
    pub fn predator(detection: Probability, strike_threshold: f64, rng: R, schedule: Schedule) -> Self {
        Simulator::new(PredatorScenario::new(detection, strike_threshold), rng, schedule)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
