//! DNA pattern engine.
//!
//! Seeds a population of random "strands", then evolves it through six
//! stages. At the Mutating stage it discovers new patterns and lets each
//! strand mutate independently. Every score is a simulated demo value.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use crate::sim::aggregate::{self, Finding, FindingSummary};
use crate::sim::generator::{pick, FindingGenerator, MetricRange, Probability};
use crate::sim::{Scenario, Schedule, Simulator, Stage};
use crate::types::Timeframe;

const STRAND_STRENGTH: MetricRange = MetricRange::between(0.6, 0.9);
const STRAND_FREQUENCY: MetricRange = MetricRange::between(0.4, 0.8);
const STRAND_RELIABILITY: MetricRange = MetricRange::between(0.7, 0.95);
const PATTERN_STRENGTH: MetricRange = MetricRange::between(0.7, 0.95);
const PATTERN_FREQUENCY: MetricRange = MetricRange::between(0.4, 0.8);
const ACCUMULATION: MetricRange = MetricRange::between(0.3, 0.9);
const DISTRIBUTION: MetricRange = MetricRange::between(0.2, 0.8);
const MANIPULATION: MetricRange = MetricRange::between(0.1, 0.7);

const SEQUENCE_LEN: usize = 12;
const MUTATION_TAIL: usize = 4;
const PATTERNS_PER_MUTATION: u32 = 3;
const BASES: &[char] = &['A', 'T', 'G', 'C'];

pub const DEFAULT_STRANDS_PER_TYPE: usize = 3;
pub const DEFAULT_MUTATION_CHANCE: f64 = 0.3;

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EvolutionStage {
    Initial,
    Developing,
    Adapting,
    Evolving,
    Mutating,
    Advanced,
}

impl EvolutionStage {
    /// Adaptation level reached at this stage.
    pub fn progress(&self) -> f64 {
        match self {
            EvolutionStage::Initial => 0.1,
            EvolutionStage::Developing => 0.3,
            EvolutionStage::Adapting => 0.5,
            EvolutionStage::Evolving => 0.7,
            EvolutionStage::Mutating => 0.9,
            EvolutionStage::Advanced => 1.0,
        }
    }
}

impl Stage for EvolutionStage {
    const SEQUENCE: &'static [Self] = &[
        EvolutionStage::Initial,
        EvolutionStage::Developing,
        EvolutionStage::Adapting,
        EvolutionStage::Evolving,
        EvolutionStage::Mutating,
        EvolutionStage::Advanced,
    ];
}

impl fmt::Display for EvolutionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvolutionStage::Initial => write!(f, "Initial Stage"),
            EvolutionStage::Developing => write!(f, "Developing"),
            EvolutionStage::Adapting => write!(f, "Adapting"),
            EvolutionStage::Evolving => write!(f, "Evolving"),
            EvolutionStage::Mutating => write!(f, "Mutating"),
            EvolutionStage::Advanced => write!(f, "Advanced"),
        }
    }
}

// ---------------------------------------------------------------------------
// Strands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DnaType {
    PriceAction,
    Volume,
    LiquidityFlow,
    SmartMoney,
    Manipulation,
    Reversal,
}

impl DnaType {
    pub const ALL: &'static [DnaType] = &[
        DnaType::PriceAction,
        DnaType::Volume,
        DnaType::LiquidityFlow,
        DnaType::SmartMoney,
        DnaType::Manipulation,
        DnaType::Reversal,
    ];

    fn tag(&self) -> &'static str {
        match self {
            DnaType::PriceAction => "price_action",
            DnaType::Volume => "volume",
            DnaType::LiquidityFlow => "liquidity_flow",
            DnaType::SmartMoney => "smart_money",
            DnaType::Manipulation => "manipulation",
            DnaType::Reversal => "reversal",
        }
    }
}

impl fmt::Display for DnaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DnaType::PriceAction => write!(f, "Price Action DNA"),
            DnaType::Volume => write!(f, "Volume DNA"),
            DnaType::LiquidityFlow => write!(f, "Liquidity Flow DNA"),
            DnaType::SmartMoney => write!(f, "Smart Money DNA"),
            DnaType::Manipulation => write!(f, "Manipulation DNA"),
            DnaType::Reversal => write!(f, "Reversal DNA"),
        }
    }
}

/// A simulated pattern "strand".
#[derive(Debug, Clone, Serialize)]
pub struct DnaStrand {
    pub id: Uuid,
    pub sequence: String,
    pub dna_type: DnaType,
    pub strength: f64,
    pub frequency: f64,
    pub reliability: f64,
    pub timeframe: Timeframe,
    pub generation: u32,
    pub mutations: Vec<String>,
}

impl DnaStrand {
    fn spawn<R: Rng + ?Sized>(dna_type: DnaType, rng: &mut R) -> Self {
        Self {
            id: Uuid::new_v4(),
            sequence: random_bases(SEQUENCE_LEN, rng),
            dna_type,
            strength: STRAND_STRENGTH.sample(rng),
            frequency: STRAND_FREQUENCY.sample(rng),
            reliability: STRAND_RELIABILITY.sample(rng),
            timeframe: *pick(Timeframe::INTRADAY, rng).unwrap_or(&Timeframe::H1),
            generation: 1,
            mutations: Vec::new(),
        }
    }

    /// The next-generation strand that replaces this one.
    pub fn evolve<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        let generation = self.generation + 1;
        let mut mutations = self.mutations.clone();
        mutations.push(format!("Gen {generation} Enhancement"));

        Self {
            id: Uuid::new_v4(),
            sequence: format!("{}{}", self.sequence, random_bases(MUTATION_TAIL, rng)),
            dna_type: self.dna_type,
            strength: (self.strength * 1.1).min(1.0),
            frequency: self.frequency,
            reliability: (self.reliability * 1.05).min(1.0),
            timeframe: self.timeframe,
            generation,
            mutations,
        }
    }
}

impl Finding for DnaStrand {
    fn category(&self) -> &'static str {
        self.dna_type.tag()
    }
    fn strength(&self) -> f64 {
        self.strength
    }
    fn description(&self) -> &str {
        &self.sequence
    }
    fn generation(&self) -> u32 {
        self.generation
    }
}

fn random_bases<R: Rng + ?Sized>(len: usize, rng: &mut R) -> String {
    (0..len)
        .map(|_| *pick(BASES, rng).unwrap_or(&'A'))
        .collect()
}

// ---------------------------------------------------------------------------
// Clusters & discovered patterns
// ---------------------------------------------------------------------------

/// Fixed catalogue entry grouping related patterns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PatternCluster {
    pub name: &'static str,
    pub patterns: &'static [&'static str],
    pub strength: f64,
    pub frequency: f64,
    pub reliability: f64,
    pub market_conditions: &'static [&'static str],
    pub timeframes: &'static [Timeframe],
    pub profitability: f64,
}

pub const CLUSTER_CATALOGUE: &[PatternCluster] = &[
    PatternCluster {
        name: "Liquidity Hunt Cluster",
        patterns: &["Stop Hunt", "Liquidity Grab", "False Breakout"],
        strength: 0.89,
        frequency: 0.75,
        reliability: 0.84,
        market_conditions: &["Ranging", "Pre-News"],
        timeframes: &[Timeframe::M5, Timeframe::M15, Timeframe::H1],
        profitability: 0.78,
    },
    PatternCluster {
        name: "Smart Money Cluster",
        patterns: &["Accumulation", "Distribution", "Markup"],
        strength: 0.92,
        frequency: 0.65,
        reliability: 0.88,
        market_conditions: &["Trending", "Post-News"],
        timeframes: &[Timeframe::H1, Timeframe::H4, Timeframe::D1],
        profitability: 0.85,
    },
    PatternCluster {
        name: "Reversal Cluster",
        patterns: &["Double Top", "Head & Shoulders", "Divergence"],
        strength: 0.81,
        frequency: 0.55,
        reliability: 0.79,
        market_conditions: &["Overbought", "Oversold"],
        timeframes: &[Timeframe::H4, Timeframe::D1, Timeframe::W1],
        profitability: 0.72,
    },
];

const PATTERN_NAMES: &[&str] = &[
    "Liquidity Mirage Pattern",
    "Smart Money Fingerprint",
    "Institutional Footprint",
    "Algorithmic Signature",
    "Market Maker Behavior",
    "Whale Movement Pattern",
    "Retail Trap Formation",
    "News Reaction Pattern",
];

const SMART_MONEY_SIGNALS: &[&str] = &[
    "🐋 Whale accumulation detected",
    "🏛️ Institutional buying pressure",
    "📊 Smart money distribution phase",
    "🎯 Market maker positioning",
    "⚡ Algorithmic pattern identified",
];

const PATTERN_MUTATIONS: &[&str] = &["Enhanced Recognition", "Improved Timing", "Better Accuracy"];

/// Pattern surfaced during a mutation step.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveredPattern {
    pub id: Uuid,
    pub name: &'static str,
    pub description: String,
    pub strength: f64,
    pub frequency: f64,
    pub discovered_at: DateTime<Utc>,
    pub generation: u32,
    pub parent_patterns: Vec<&'static str>,
    /// Traits the pattern picked up while evolving.
    pub mutations: Vec<&'static str>,
}

impl DiscoveredPattern {
    fn discover<R: Rng + ?Sized>(generation: u32, rng: &mut R) -> Self {
        let accuracy: u32 = rng.gen_range(70..=95);
        Self {
            id: Uuid::new_v4(),
            name: pick(PATTERN_NAMES, rng).copied().unwrap_or("Unknown Pattern"),
            description: format!("Evolved pattern with {accuracy}% accuracy"),
            strength: PATTERN_STRENGTH.sample(rng),
            frequency: PATTERN_FREQUENCY.sample(rng),
            discovered_at: Utc::now(),
            generation,
            parent_patterns: PATTERN_NAMES.iter().take(2).copied().collect(),
            mutations: PATTERN_MUTATIONS.to_vec(),
        }
    }
}

impl Finding for DiscoveredPattern {
    fn category(&self) -> &'static str {
        "discovered"
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

/// Simulated smart-money gauges.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SmartMoneyDna {
    pub accumulation: f64,
    pub distribution: f64,
    pub manipulation: f64,
    /// Dominant footprint seen on the last resample.
    pub footprint: &'static str,
    pub flow_direction: &'static str,
}

impl SmartMoneyDna {
    pub const FOOTPRINTS: &'static [&'static str] = &[
        "Large Volume Spikes",
        "Hidden Orders",
        "Iceberg Orders",
        "Block Trades",
        "Dark Pool Activity",
    ];

    pub const FLOW_DIRECTIONS: &'static [&'static str] = &[
        "Institutional Buying",
        "Institutional Selling",
        "Retail Flushing",
        "Algorithmic Trading",
        "Central Bank Intervention",
    ];

    fn resample<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.accumulation = ACCUMULATION.sample(rng);
        self.distribution = DISTRIBUTION.sample(rng);
        self.manipulation = MANIPULATION.sample(rng);
        self.footprint = pick(Self::FOOTPRINTS, rng).copied().unwrap_or_default();
        self.flow_direction = pick(Self::FLOW_DIRECTIONS, rng).copied().unwrap_or_default();
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize)]
pub struct DnaState {
    pub strands: Vec<DnaStrand>,
    pub clusters: Vec<PatternCluster>,
    pub discovered: Vec<DiscoveredPattern>,
    pub smart_money: SmartMoneyDna,
    pub adaptation_level: f64,
    /// Mean strand strength (demo value).
    pub genetic_strength: f64,
    pub last_mutation_at: Option<DateTime<Utc>>,
}

impl DnaState {
    /// Strongest discovered pattern, `None` before the first mutation.
    pub fn recognize_pattern(&self) -> Option<&DiscoveredPattern> {
        aggregate::strongest(&self.discovered)
    }

    /// Most reliable cluster in the loaded catalogue.
    pub fn best_cluster(&self) -> Option<&PatternCluster> {
        aggregate::best_by(&self.clusters, |c| c.reliability)
    }

    pub fn summary(&self) -> FindingSummary {
        FindingSummary::of(&self.strands)
    }
}

// ---------------------------------------------------------------------------
// Scenario
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DnaScenario {
    strands_per_type: usize,
    mutation: Probability,
}

impl DnaScenario {
    pub fn new(strands_per_type: usize, mutation: Probability) -> Self {
        Self { strands_per_type, mutation }
    }

    fn seed_strands<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<DnaStrand> {
        let candidates: Vec<DnaType> = DnaType::ALL
            .iter()
            .flat_map(|t| std::iter::repeat(*t).take(self.strands_per_type))
            .collect();
        FindingGenerator::exhaustive().scan(&candidates, rng, |t, rng| DnaStrand::spawn(*t, rng))
    }

    fn mutate<R: Rng + ?Sized>(&self, state: &mut DnaState, rng: &mut R) {
        state.last_mutation_at = Some(Utc::now());

        for generation in 1..=PATTERNS_PER_MUTATION {
            state.discovered.push(DiscoveredPattern::discover(generation, rng));
        }

        let mutation = self.mutation;
        state.strands = state
            .strands
            .iter()
            .map(|s| if mutation.trial(rng) { s.evolve(rng) } else { s.clone() })
            .collect();
    }
}

impl Default for DnaScenario {
    fn default() -> Self {
        Self::new(DEFAULT_STRANDS_PER_TYPE, Probability::fixed(DEFAULT_MUTATION_CHANCE))
    }
}

impl Scenario for DnaScenario {
    type Stage = EvolutionStage;
    type State = DnaState;
    const NAME: &'static str = "dna";

    fn begin<R: Rng + ?Sized>(&self, state: &mut DnaState, rng: &mut R) {
        state.strands = self.seed_strands(rng);
        state.smart_money.resample(rng);
        state.clusters = CLUSTER_CATALOGUE.to_vec();
        state.adaptation_level = EvolutionStage::Initial.progress();
        state.genetic_strength = aggregate::mean_strength(&state.strands);
    }

    fn advance<R: Rng + ?Sized>(&self, state: &mut DnaState, stage: EvolutionStage, rng: &mut R) {
        state.adaptation_level = stage.progress();
        state.smart_money.resample(rng);
        if stage == EvolutionStage::Mutating {
            self.mutate(state, rng);
        }
        state.genetic_strength = aggregate::mean_strength(&state.strands);
    }
}

pub type DnaEngine<R> = Simulator<DnaScenario, R>;

impl<R: Rng + Send + 'static> Simulator<DnaScenario, R> {
    pub fn dna(strands_per_type: usize, mutation: Probability, rng: R, schedule: Schedule) -> Self {
        Simulator::new(DnaScenario::new(strands_per_type, mutation), rng, schedule)
    }

    /// One flavor line drawn from the engine's random source.
    pub fn smart_money_signal(&self) -> &'static str {
        self.with_rng(|rng| pick(SMART_MONEY_SIGNALS, rng).copied().unwrap_or("No smart money signal"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
