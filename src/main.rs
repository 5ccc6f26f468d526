//! ProTrader: simulated market analysis engines and trading journal.
//!
//! Entry point. Loads configuration, initialises structured logging, runs
//! one full progression of each engine, then seeds the journal and reports
//! playbook statistics.

use anyhow::Result;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use protrader::config::AppConfig;
use protrader::engines::{ChessEngine, DnaEngine, PredatorEngine};
use protrader::journal::JournalEngine;
use protrader::logging::init_logging;
use protrader::rng::engine_rng;
use protrader::sim::{Snapshot, Stage};
use serde::Serialize;

const BANNER: &str = r#"
 ____            _____              _
|  _ \ _ __ ___ |_   _| __ __ _  __| | ___ _ __
| |_) | '__/ _ \  | || '__/ _` |/ _` |/ _ \ '__|
|  __/| | | (_) | | || | | (_| | (_| |  __/ |
|_|   |_|  \___/  |_||_|  \__,_|\__,_|\___|_|

  Simulated analysis engines and trading journal
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let path = std::env::var("PROTRADER_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let cfg = if std::path::Path::new(&path).exists() {
        AppConfig::load(&path)?
    } else {
        AppConfig::default()
    };

    init_logging();

    println!("{BANNER}");
    info!(config = %path, seed = ?cfg.simulation.seed, "ProTrader starting up");

    // -- Engines ---------------------------------------------------------

    let seed = cfg.simulation.seed;

    let mut chess = ChessEngine::chess(
        cfg.chess.moves_ahead,
        engine_rng(seed, "chess"),
        cfg.chess.schedule(),
    );
    let mut dna = DnaEngine::dna(
        cfg.dna.strands_per_type,
        cfg.dna.mutation()?,
        engine_rng(seed, "dna"),
        cfg.dna.schedule(),
    );
    let mut predator = PredatorEngine::predator(
        cfg.predator.detection()?,
        cfg.predator.strike_threshold,
        engine_rng(seed, "predator"),
        cfg.predator.schedule(),
    );

    spawn_stage_logger("chess", chess.subscribe());
    spawn_stage_logger("dna", dna.subscribe());
    spawn_stage_logger("predator", predator.subscribe());

    chess.activate();
    dna.activate();
    predator.activate();

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!("Engines running. Press Ctrl+C to stop.");

    tokio::select! {
        _ = async { tokio::join!(chess.settled(), dna.settled(), predator.settled()) } => {
            info!("All engines reached their final stage");
        }
        _ = &mut shutdown => {
            warn!("Shutdown signal received, stopping engines");
        }
    }

    report_engines(&chess, &dna, &predator);

    chess.deactivate();
    dna.deactivate();
    predator.deactivate();

    // -- Journal ---------------------------------------------------------

    let mut journal = JournalEngine::with_rng(engine_rng(seed, "journal"));
    journal.set_auto_logging(cfg.journal.auto_logging);
    for trade in &cfg.journal.seed_trades {
        journal.add_trade(trade.to_record());
    }

    let stats = journal.statistics();
    info!(
        trades = stats.total_trades,
        entries = journal.entries().len(),
        win_rate = %stats.formatted_win_rate(),
        profit_factor = %stats.formatted_profit_factor(),
        avg_r = format!("{:.2}", stats.average_r_multiple),
        total_pnl = %stats.total_pnl,
        grade = stats.overall_grade(),
        psychology = stats.psychology_grade(),
        "Playbook statistics"
    );

    info!("ProTrader shut down cleanly.");
    Ok(())
}

/// Log every stage change published by an engine.
fn spawn_stage_logger<G, T>(engine: &'static str, mut rx: watch::Receiver<Snapshot<G, T>>)
where
    G: Stage,
    T: Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut last = None;
        while rx.changed().await.is_ok() {
            let (run, stage, active) = {
                let snap = rx.borrow_and_update();
                (snap.run, snap.stage, snap.active)
            };
            if last != Some((run, stage)) {
                debug!(engine, run, stage = %stage, active, "Stage changed");
                last = Some((run, stage));
            }
        }
    });
}

/// Log a summary of each engine's final state.
fn report_engines<R1, R2, R3>(chess: &ChessEngine<R1>, dna: &DnaEngine<R2>, predator: &PredatorEngine<R3>)
where
    R1: rand::Rng + Send + 'static,
    R2: rand::Rng + Send + 'static,
    R3: rand::Rng + Send + 'static,
{
    let snap = chess.snapshot();
    let summary = snap.state.summary();
    info!(
        stage = %snap.stage,
        moves = summary.count,
        position_strength = format!("{:.2}", snap.state.position_strength),
        threat = ?snap.state.threat,
        recommendation = %chess.strategic_recommendation(),
        "Chess engine"
    );
    dump_state("chess", &snap);

    let snap = dna.snapshot();
    let summary = snap.state.summary();
    info!(
        stage = %snap.stage,
        patterns = summary.count,
        mean_strength = format!("{:.2}", summary.mean_strength),
        cluster = snap.state.best_cluster().map(|c| c.name).unwrap_or("none"),
        signal = dna.smart_money_signal(),
        footprint = snap.state.smart_money.footprint,
        flow = snap.state.smart_money.flow_direction,
        "DNA engine"
    );
    dump_state("dna", &snap);

    let snap = predator.snapshot();
    let stats = &snap.state.stats;
    info!(
        stage = %snap.stage,
        prey = snap.state.prey.len(),
        success_rate = format!("{:.1}%", stats.success_rate() * 100.0),
        rank = stats.rank(),
        "Predator engine"
    );
    dump_state("predator", &snap);
}

/// Full snapshot as one JSON line at debug level.
fn dump_state<T: Serialize>(engine: &'static str, snap: &T) {
    match serde_json::to_string(snap) {
        Ok(json) => debug!(engine, state = %json, "Final snapshot"),
        Err(err) => warn!(engine, error = %err, "Could not serialize snapshot"),
    }
}
