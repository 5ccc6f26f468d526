//! Configuration loading from TOML.
//!
//! Every section is optional; a missing section or key falls back to the
//! engine defaults, so an empty file is a valid configuration.

use anyhow::{ensure, Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs;

use crate::engines::{chess, dna, predator};
use crate::journal::{Direction, TradeGrade, TradeOutcome, TradeRecord};
use crate::sim::generator::Probability;
use crate::sim::Schedule;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub simulation: SimulationConfig,
    pub chess: ChessConfig,
    pub dna: DnaConfig,
    pub predator: PredatorConfig,
    pub journal: JournalConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct SimulationConfig {
    /// Master seed; each engine derives its own stream from it.
    /// Unset means entropy-seeded runs.
    pub seed: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChessConfig {
    pub moves_ahead: usize,
    pub stage_delay_ms: u64,
}

impl Default for ChessConfig {
    fn default() -> Self {
        Self {
            moves_ahead: chess::DEFAULT_MOVES_AHEAD,
            stage_delay_ms: DEFAULT_STAGE_DELAY_MS,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DnaConfig {
    pub strands_per_type: usize,
    pub mutation_chance: f64,
    pub stage_delay_ms: u64,
}

impl Default for DnaConfig {
    fn default() -> Self {
        Self {
            strands_per_type: dna::DEFAULT_STRANDS_PER_TYPE,
            mutation_chance: dna::DEFAULT_MUTATION_CHANCE,
            stage_delay_ms: DEFAULT_STAGE_DELAY_MS,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PredatorConfig {
    pub detection_chance: f64,
    pub strike_threshold: f64,
    pub stage_delay_ms: u64,
}

impl Default for PredatorConfig {
    fn default() -> Self {
        Self {
            detection_chance: predator::DEFAULT_DETECTION_CHANCE,
            strike_threshold: predator::DEFAULT_STRIKE_THRESHOLD,
            stage_delay_ms: DEFAULT_STAGE_DELAY_MS,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct JournalConfig {
    pub auto_logging: bool,
    /// Trades loaded into the journal at startup.
    pub seed_trades: Vec<SeedTrade>,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            auto_logging: true,
            seed_trades: Vec::new(),
        }
    }
}

/// A trade as written in the config file.
#[derive(Debug, Deserialize, Clone)]
pub struct SeedTrade {
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: Decimal,
    #[serde(default)]
    pub exit_price: Option<Decimal>,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    pub lot_size: Decimal,
    #[serde(default)]
    pub pnl: Decimal,
    #[serde(default)]
    pub r_multiple: f64,
    pub outcome: TradeOutcome,
    pub grade: TradeGrade,
    #[serde(default)]
    pub setup: String,
    #[serde(default)]
    pub emotional_state: String,
    #[serde(default = "default_rating")]
    pub emotional_rating: u8,
}

fn default_rating() -> u8 {
    3
}

impl SeedTrade {
    pub fn to_record(&self) -> TradeRecord {
        let mut record = TradeRecord::new(
            self.symbol.clone(),
            self.direction,
            self.entry_price,
            self.stop_loss,
            self.take_profit,
            self.lot_size,
        )
        .with_grade(self.grade)
        .with_notes(self.setup.clone(), self.emotional_state.clone(), self.emotional_rating);

        record.exit_price = self.exit_price;
        record.pnl = self.pnl;
        record.r_multiple = self.r_multiple;
        record.outcome = self.outcome;
        record
    }
}

pub const DEFAULT_STAGE_DELAY_MS: u64 = 1000;

impl AppConfig {
    /// Load and validate configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::parse(&contents).with_context(|| format!("Invalid config file: {path}"))
    }

    /// Parse and validate configuration from TOML text.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.chess.moves_ahead > 0, "chess.moves_ahead must be at least 1");
        Probability::new(self.dna.mutation_chance).context("dna.mutation_chance")?;
        Probability::new(self.predator.detection_chance).context("predator.detection_chance")?;
        ensure!(
            (0.0..=1.0).contains(&self.predator.strike_threshold),
            "predator.strike_threshold must be within [0, 1], got {}",
            self.predator.strike_threshold
        );
        Ok(())
    }
}

impl ChessConfig {
    pub fn schedule(&self) -> Schedule {
        Schedule::from_millis(self.stage_delay_ms)
    }
}

impl DnaConfig {
    pub fn schedule(&self) -> Schedule {
        Schedule::from_millis(self.stage_delay_ms)
    }

    pub fn mutation(&self) -> Result<Probability> {
        Ok(Probability::new(self.mutation_chance)?)
    }
}

impl PredatorConfig {
    pub fn schedule(&self) -> Schedule {
        Schedule::from_millis(self.stage_delay_ms)
    }

    pub fn detection(&self) -> Result<Probability> {
        Ok(Probability::new(self.detection_chance)?)
    }
}
