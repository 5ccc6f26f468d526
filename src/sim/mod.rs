//! Stage-driven simulator: the timed state machine behind every engine.
//!
//! A [`Scenario`] supplies the stage enumeration and the state mutations;
//! [`Simulator`] owns the state, publishes it through a `watch` channel,
//! and walks the stage sequence on a fixed per-stage delay.
//!
//! Each activation is a *run* with its own id. The progression task only
//! applies a step while the published snapshot still carries its run id,
//! and the check happens under the same lock as the mutation, so a
//! deactivated or re-activated engine never sees a stale transition.

pub mod aggregate;
pub mod generator;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// Stage & scenario traits
// ---------------------------------------------------------------------------

/// A closed, ordered enumeration of stages.
///
/// `SEQUENCE` must be non-empty; its first element is the initial stage
/// and its last the terminal one.
pub trait Stage: Copy + Eq + fmt::Debug + fmt::Display + Send + Sync + 'static {
    const SEQUENCE: &'static [Self];

    fn initial() -> Self {
        Self::SEQUENCE[0]
    }

    fn terminal() -> Self {
        Self::SEQUENCE[Self::SEQUENCE.len() - 1]
    }

    fn is_terminal(self) -> bool {
        self == Self::terminal()
    }

    /// Position of this stage in the sequence.
    fn index(self) -> usize {
        Self::SEQUENCE.iter().position(|s| *s == self).unwrap_or(0)
    }
}

/// Engine-specific behaviour plugged into a [`Simulator`].
pub trait Scenario: Send + Sync + 'static {
    type Stage: Stage;
    type State: Clone + Default + fmt::Debug + Send + Sync + 'static;

    /// Short name used in log fields.
    const NAME: &'static str;

    /// Populate a freshly reset state for the initial stage.
    fn begin<R: Rng + ?Sized>(&self, state: &mut Self::State, rng: &mut R);

    /// Apply the transition into `stage`.
    fn advance<R: Rng + ?Sized>(&self, state: &mut Self::State, stage: Self::Stage, rng: &mut R);

    /// Clear derived state. Scenarios that keep career totals override this.
    fn reset(&self, state: &mut Self::State) {
        *state = Self::State::default();
    }
}

// ---------------------------------------------------------------------------
// Schedule & snapshot
// ---------------------------------------------------------------------------

/// Timing of a progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    /// Delay before each transition after the initial stage.
    pub stage_delay: Duration,
}

impl Schedule {
    pub fn every(stage_delay: Duration) -> Self {
        Self { stage_delay }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::every(Duration::from_millis(ms))
    }

    /// Total time from activation to the terminal stage.
    pub fn total<G: Stage>(&self) -> Duration {
        let steps = G::SEQUENCE.len().saturating_sub(1) as u32;
        self.stage_delay * steps
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::from_millis(1_000)
    }
}

/// Published view of a simulator.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot<G, T> {
    /// Id of the current (or last) run; bumped on every activate/deactivate.
    pub run: u64,
    pub active: bool,
    /// True while stage transitions are still scheduled.
    pub progressing: bool,
    pub stage: G,
    /// Stages entered during the current run, in order.
    pub visited: Vec<G>,
    pub state: T,
    pub updated_at: DateTime<Utc>,
}

/// Snapshot type of a given scenario.
pub type SnapshotOf<S> = Snapshot<<S as Scenario>::Stage, <S as Scenario>::State>;

impl<G: Stage, T: Default> Snapshot<G, T> {
    fn idle() -> Self {
        Self {
            run: 0,
            active: false,
            progressing: false,
            stage: G::initial(),
            visited: Vec::new(),
            state: T::default(),
            updated_at: Utc::now(),
        }
    }

    /// Fraction of the sequence completed in this run (0.0–1.0).
    pub fn progress(&self) -> f64 {
        let steps = G::SEQUENCE.len().saturating_sub(1);
        if steps == 0 || self.visited.is_empty() {
            return if self.active { 1.0 } else { 0.0 };
        }
        self.stage.index() as f64 / steps as f64
    }
}

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

/// Owner of one engine instance.
///
/// `activate` spawns the progression on the ambient tokio runtime and
/// must be called from within one.
pub struct Simulator<S: Scenario, R> {
    scenario: Arc<S>,
    rng: Arc<Mutex<R>>,
    tx: Arc<watch::Sender<SnapshotOf<S>>>,
    schedule: Schedule,
    task: Option<JoinHandle<()>>,
}

impl<S, R> Simulator<S, R>
where
    S: Scenario,
    R: Rng + Send + 'static,
{
    pub fn new(scenario: S, rng: R, schedule: Schedule) -> Self {
        let (tx, _rx) = watch::channel(Snapshot::idle());
        Self {
            scenario: Arc::new(scenario),
            rng: Arc::new(Mutex::new(rng)),
            tx: Arc::new(tx),
            schedule,
            task: None,
        }
    }

    pub fn scenario(&self) -> &S {
        &self.scenario
    }

    pub fn schedule(&self) -> Schedule {
        self.schedule
    }

    /// Reset to the initial stage and start a new timed progression.
    ///
    /// Any progression still in flight is cancelled first.
    pub fn activate(&mut self) {
        self.cancel_task();

        let scenario = Arc::clone(&self.scenario);
        let rng = Arc::clone(&self.rng);
        let multi_stage = S::Stage::SEQUENCE.len() > 1;
        let mut run = 0;

        self.tx.send_modify(|snap| {
            snap.run += 1;
            run = snap.run;
            snap.active = true;
            snap.progressing = multi_stage;
            snap.stage = S::Stage::initial();
            snap.visited = vec![S::Stage::initial()];
            scenario.reset(&mut snap.state);
            scenario.begin(&mut snap.state, &mut *lock(&rng));
            snap.updated_at = Utc::now();
        });

        info!(
            engine = S::NAME,
            run,
            stage = %S::Stage::initial(),
            delay_ms = self.schedule.stage_delay.as_millis() as u64,
            "Engine activated"
        );

        if multi_stage {
            self.task = Some(tokio::spawn(progress(
                scenario,
                rng,
                Arc::clone(&self.tx),
                run,
                self.schedule.stage_delay,
            )));
        }
    }

    /// Stop progression and clear all derived state.
    pub fn deactivate(&mut self) {
        self.cancel_task();

        let scenario = Arc::clone(&self.scenario);
        let mut run = 0;
        self.tx.send_modify(|snap| {
            snap.run += 1;
            run = snap.run;
            snap.active = false;
            snap.progressing = false;
            snap.stage = S::Stage::initial();
            snap.visited.clear();
            scenario.reset(&mut snap.state);
            snap.updated_at = Utc::now();
        });

        info!(engine = S::NAME, run, "Engine deactivated");
    }

    /// Owned copy of the current published state.
    pub fn snapshot(&self) -> SnapshotOf<S> {
        self.tx.borrow().clone()
    }

    /// Receiver that observes every mutation.
    pub fn subscribe(&self) -> watch::Receiver<SnapshotOf<S>> {
        self.tx.subscribe()
    }

    pub fn is_active(&self) -> bool {
        self.tx.borrow().active
    }

    pub fn is_progressing(&self) -> bool {
        self.tx.borrow().progressing
    }

    /// Wait until no transitions remain scheduled.
    pub async fn settled(&self) {
        let mut rx = self.subscribe();
        // The sender lives as long as `self`, so this only returns once settled.
        let _ = rx.wait_for(|snap| !snap.progressing).await;
    }

    /// Run a closure against the engine's random source.
    ///
    /// Used for one-off draws such as flavor signals, so that they share the
    /// injected generator with the progression.
    pub fn with_rng<T>(&self, f: impl FnOnce(&mut R) -> T) -> T {
        f(&mut *lock(&self.rng))
    }

    fn cancel_task(&mut self) {
        if let Some(task) = self.task.take() {
            if !task.is_finished() {
                debug!(engine = S::NAME, "Cancelling in-flight progression");
            }
            task.abort();
        }
    }
}

impl<S: Scenario, R> Drop for Simulator<S, R> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Walk the remaining stages of run `run`, one per `delay`.
async fn progress<S, R>(
    scenario: Arc<S>,
    rng: Arc<Mutex<R>>,
    tx: Arc<watch::Sender<SnapshotOf<S>>>,
    run: u64,
    delay: Duration,
) where
    S: Scenario,
    R: Rng + Send + 'static,
{
    for &stage in S::Stage::SEQUENCE.iter().skip(1) {
        tokio::time::sleep(delay).await;

        let applied = tx.send_if_modified(|snap| {
            if snap.run != run || !snap.active {
                return false;
            }
            scenario.advance(&mut snap.state, stage, &mut *lock(&rng));
            snap.stage = stage;
            snap.visited.push(stage);
            snap.progressing = !stage.is_terminal();
            snap.updated_at = Utc::now();
            true
        });

        if !applied {
            warn!(engine = S::NAME, run, stage = %stage, "Stale step suppressed");
            return;
        }

        if stage.is_terminal() {
            info!(engine = S::NAME, run, stage = %stage, "Progression complete");
        } else {
            debug!(engine = S::NAME, run, stage = %stage, "Stage entered");
        }
    }
}

/// Lock the shared random source, recovering from poisoning.
fn lock<R>(rng: &Mutex<R>) -> MutexGuard<'_, R> {
    rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Phase {
        Warmup,
        Scan,
        Done,
    }

    impl fmt::Display for Phase {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{self:?}")
        }
    }

    impl Stage for Phase {
        const SEQUENCE: &'static [Self] = &[Phase::Warmup, Phase::Scan, Phase::Done];
    }

    #[derive(Debug, Clone, Default)]
    struct Counter {
        begun: u32,
        advanced: Vec<Phase>,
        level: f64,
    }

    struct Counting;

    impl Scenario for Counting {
        type Stage = Phase;
        type State = Counter;
        const NAME: &'static str = "counting";

        fn begin<R: Rng + ?Sized>(&self, state: &mut Counter, rng: &mut R) {
            state.begun += 1;
            state.level = rng.gen_range(0.0..1.0);
        }

        fn advance<R: Rng + ?Sized>(&self, state: &mut Counter, stage: Phase, rng: &mut R) {
            state.advanced.push(stage);
            state.level = rng.gen_range(0.0..1.0);
        }
    }

    fn sim() -> Simulator<Counting, StdRng> {
        Simulator::new(Counting, StdRng::seed_from_u64(11), Schedule::from_millis(100))
    }

    #[test]
    fn test_stage_defaults() {
        assert_eq!(Phase::initial(), Phase::Warmup);
        assert_eq!(Phase::terminal(), Phase::Done);
        assert!(Phase::Done.is_terminal());
        assert_eq!(Phase::Scan.index(), 1);
    }

    #[test]
    fn test_schedule_total() {
        let schedule = Schedule::from_millis(250);
        assert_eq!(schedule.total::<Phase>(), Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_new_is_idle() {
        let sim = sim();
        let snap = sim.snapshot();
        assert!(!snap.active);
        assert!(!snap.progressing);
        assert_eq!(snap.stage, Phase::Warmup);
        assert!(snap.visited.is_empty());
        assert_eq!(snap.progress(), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_activate_runs_full_sequence() {
        let mut sim = sim();
        sim.activate();

        let snap = sim.snapshot();
        assert!(snap.active);
        assert!(snap.progressing);
        assert_eq!(snap.stage, Phase::Warmup);
        assert_eq!(snap.state.begun, 1);

        sim.settled().await;

        let snap = sim.snapshot();
        assert_eq!(snap.stage, Phase::Done);
        assert_eq!(snap.visited, Phase::SEQUENCE.to_vec());
        assert_eq!(snap.state.advanced, vec![Phase::Scan, Phase::Done]);
        assert!(!snap.progressing);
        assert!(snap.active);
        assert_eq!(snap.progress(), 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transitions_wait_for_delay() {
        let mut sim = sim();
        sim.activate();

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(sim.snapshot().stage, Phase::Scan);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(sim.snapshot().stage, Phase::Done);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deactivate_suppresses_pending_steps() {
        let mut sim = sim();
        sim.activate();
        tokio::time::sleep(Duration::from_millis(150)).await;

        sim.deactivate();
        tokio::time::sleep(Duration::from_secs(5)).await;

        let snap = sim.snapshot();
        assert!(!snap.active);
        assert!(!snap.progressing);
        assert_eq!(snap.stage, Phase::Warmup);
        assert!(snap.visited.is_empty());
        assert!(snap.state.advanced.is_empty());
        assert_eq!(snap.state.begun, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reactivate_mid_run_restarts_cleanly() {
        let mut sim = sim();
        sim.activate();
        tokio::time::sleep(Duration::from_millis(150)).await;
        let first_run = sim.snapshot().run;

        sim.activate();
        let snap = sim.snapshot();
        assert!(snap.run > first_run);
        assert_eq!(snap.visited, vec![Phase::Warmup]);
        assert!(snap.state.advanced.is_empty());

        sim.settled().await;
        assert_eq!(sim.snapshot().visited, Phase::SEQUENCE.to_vec());
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_observe_each_stage() {
        let mut sim = sim();
        let mut rx = sim.subscribe();
        sim.activate();

        let mut seen = Vec::new();
        loop {
            rx.changed().await.unwrap();
            let snap = rx.borrow_and_update().clone();
            seen.push(snap.stage);
            if !snap.progressing {
                break;
            }
        }

        assert_eq!(seen, Phase::SEQUENCE.to_vec());
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_seed_same_levels() {
        let mut a = sim();
        let mut b = sim();
        a.activate();
        b.activate();
        a.settled().await;
        b.settled().await;
        assert_eq!(a.snapshot().state.level, b.snapshot().state.level);
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_rng_shares_source() {
        let sim = sim();
        let x: f64 = sim.with_rng(|rng| rng.gen());
        let mut fresh = StdRng::seed_from_u64(11);
        assert_eq!(x, fresh.gen::<f64>());
    }
}
