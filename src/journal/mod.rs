//! Trading journal: trade records, reflective entries and playbook stats.
//!
//! Adding a trade can synthesize a templated analysis entry linked to the
//! trade by id; deleting the trade removes exactly those entries.

pub mod models;
pub mod stats;

use chrono::{TimeDelta, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};
use uuid::Uuid;

use crate::sim::generator::pick;

pub use models::{Direction, EntryKind, JournalEntry, TradeGrade, TradeOutcome, TradeRecord};
pub use stats::PlaybookStatistics;

/// Lessons attached to auto-generated entries.
pub const LESSONS: &[&str] = &[
    "Every trade outcome is independent - this doesn't predict the next trade",
    "Focus on executing your process, not the outcome",
    "Maintain emotional equilibrium regardless of results",
    "Think in probabilities, not certainties",
    "Trust your edge and execute consistently",
];

/// In-memory trade journal.
pub struct JournalEngine<R: Rng = StdRng> {
    trades: Vec<TradeRecord>,
    entries: Vec<JournalEntry>,
    auto_logging: bool,
    rng: R,
}

impl JournalEngine<StdRng> {
    /// Journal with auto-logging on and an entropy-seeded lesson picker.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl Default for JournalEngine<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> JournalEngine<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            trades: Vec::new(),
            entries: Vec::new(),
            auto_logging: true,
            rng,
        }
    }

    pub fn set_auto_logging(&mut self, enabled: bool) {
        self.auto_logging = enabled;
    }

    pub fn auto_logging(&self) -> bool {
        self.auto_logging
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn trade(&self, id: Uuid) -> Option<&TradeRecord> {
        self.trades.iter().find(|t| t.id == id)
    }

    // -- Trade management ----------------------------------------------------

    /// Append a trade, writing an analysis entry for it when auto-logging is on.
    pub fn add_trade(&mut self, record: TradeRecord) {
        info!(
            id = %record.id,
            symbol = %record.symbol,
            outcome = %record.outcome,
            pnl = %record.pnl,
            "Trade recorded"
        );

        if self.auto_logging {
            let entry = self.auto_entry(&record);
            debug!(trade_id = %record.id, entry_id = %entry.id, "Auto-generated journal entry");
            self.entries.push(entry);
        }
        self.trades.push(record);
    }

    /// Replace the stored trade with the same id. Returns `false` (and
    /// changes nothing) when no such trade exists.
    pub fn update_trade(&mut self, record: TradeRecord) -> bool {
        match self.trades.iter_mut().find(|t| t.id == record.id) {
            Some(slot) => {
                debug!(id = %record.id, outcome = %record.outcome, "Trade updated");
                *slot = record;
                true
            }
            None => {
                debug!(id = %record.id, "Update for unknown trade ignored");
                false
            }
        }
    }

    /// Remove a trade and every entry generated for it.
    ///
    /// Entries are matched by `trade_id`, so other entries that merely
    /// mention the same symbol are kept.
    pub fn delete_trade(&mut self, id: Uuid) -> Option<TradeRecord> {
        let pos = self.trades.iter().position(|t| t.id == id)?;
        let removed = self.trades.remove(pos);

        let before = self.entries.len();
        self.entries.retain(|e| e.trade_id != Some(id));

        info!(
            id = %id,
            symbol = %removed.symbol,
            entries_removed = before - self.entries.len(),
            "Trade deleted"
        );
        Some(removed)
    }

    // -- Journal entries -----------------------------------------------------

    pub fn add_entry(&mut self, entry: JournalEntry) {
        debug!(id = %entry.id, kind = %entry.kind, "Journal entry added");
        self.entries.push(entry);
    }

    pub fn entries_of_kind(&self, kind: EntryKind) -> Vec<&JournalEntry> {
        self.entries.iter().filter(|e| e.kind == kind).collect()
    }

    /// Entries written within the last `days` days.
    ///
    /// A window reaching past the earliest representable time returns every
    /// entry; a negative window returns none.
    pub fn recent_entries(&self, days: i64) -> Vec<&JournalEntry> {
        if days < 0 {
            return Vec::new();
        }
        let cutoff = TimeDelta::try_days(days).and_then(|window| Utc::now().checked_sub_signed(window));
        match cutoff {
            Some(cutoff) => self.entries.iter().filter(|e| e.timestamp >= cutoff).collect(),
            None => self.entries.iter().collect(),
        }
    }

    /// Newest first.
    pub fn entries_by_date(&self) -> Vec<&JournalEntry> {
        let mut out: Vec<_> = self.entries.iter().collect();
        out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        out
    }

    // -- Trade views ---------------------------------------------------------

    pub fn winning_trades(&self) -> Vec<&TradeRecord> {
        self.trades_with(TradeOutcome::Win)
    }

    pub fn losing_trades(&self) -> Vec<&TradeRecord> {
        self.trades_with(TradeOutcome::Loss)
    }

    pub fn running_trades(&self) -> Vec<&TradeRecord> {
        self.trades_with(TradeOutcome::Running)
    }

    pub fn elite_trades(&self) -> Vec<&TradeRecord> {
        self.trades.iter().filter(|t| t.grade == TradeGrade::Elite).collect()
    }

    /// Newest first.
    pub fn trades_by_date(&self) -> Vec<&TradeRecord> {
        let mut out: Vec<_> = self.trades.iter().collect();
        out.sort_by(|a, b| b.opened_at.cmp(&a.opened_at));
        out
    }

    /// Largest P/L first.
    pub fn trades_by_pnl(&self) -> Vec<&TradeRecord> {
        let mut out: Vec<_> = self.trades.iter().collect();
        out.sort_by(|a, b| b.pnl.cmp(&a.pnl));
        out
    }

    fn trades_with(&self, outcome: TradeOutcome) -> Vec<&TradeRecord> {
        self.trades.iter().filter(|t| t.outcome == outcome).collect()
    }

    // -- Statistics ----------------------------------------------------------

    pub fn win_rate(&self) -> f64 {
        stats::win_rate(&self.trades)
    }

    pub fn profit_factor(&self) -> f64 {
        stats::profit_factor(&self.trades)
    }

    pub fn average_r_multiple(&self) -> f64 {
        stats::average_r_multiple(&self.trades)
    }

    pub fn elite_count(&self) -> usize {
        stats::elite_count(&self.trades)
    }

    pub fn statistics(&self) -> PlaybookStatistics {
        PlaybookStatistics::compute(&self.trades)
    }

    // -- Auto logging --------------------------------------------------------

    fn auto_entry(&mut self, trade: &TradeRecord) -> JournalEntry {
        let lesson = pick(LESSONS, &mut self.rng).copied().unwrap_or(LESSONS[0]);

        let mut entry = JournalEntry::manual(
            EntryKind::TradeAnalysis,
            format!("Auto-Generated: {} Trade", trade.symbol),
            auto_analysis(trade),
            trade.emotional_rating,
            lesson,
        )
        .for_trade(trade.id);
        entry.timestamp = trade.opened_at;
        entry
    }
}

fn auto_analysis(trade: &TradeRecord) -> String {
    let won = trade.outcome == TradeOutcome::Win;
    let result = if won { "successful" } else { "unsuccessful" };
    let went_right = if won {
        "Proper execution of setup"
    } else {
        "Followed risk management rules"
    };
    let exit = trade
        .exit_price
        .map(|p| format!("{:.2}", p))
        .unwrap_or_else(|| "N/A".to_string());

    format!(
        "Trade Analysis - {symbol}:\n\n\
         Setup: {setup}\n\
         Entry: {entry:.2}\n\
         Exit: {exit}\n\
         Result: {result} ({r:.1}R)\n\n\
         What went right: {went_right}\n\
         What could improve: {improve}\n\n\
         Emotional state: {emotional}\n\
         Grade: {grade}",
        symbol = trade.symbol,
        setup = trade.setup_description,
        entry = trade.entry_price,
        r = trade.r_multiple,
        improve = trade.grade.improvement_suggestion(),
        emotional = trade.emotional_state,
        grade = trade.grade,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn journal() -> JournalEngine<StdRng> {
        JournalEngine::with_rng(StdRng::seed_from_u64(11))
    }

    fn gold(outcome: TradeOutcome, pnl: rust_decimal::Decimal, r: f64) -> TradeRecord {
        let trade = TradeRecord::new("XAUUSD", Direction::Buy, dec!(2674.50), dec!(2668.00), dec!(2690.00), dec!(0.01))
            .with_notes("Liquidity sweep into order block", "Calm and focused", 4);
        match outcome {
            TradeOutcome::Running => trade,
            _ => trade.close(dec!(2682.25), pnl, r, outcome),
        }
    }

    #[test]
    fn test_add_trade_auto_logs() {
        let mut j = journal();
        let trade = gold(TradeOutcome::Win, dec!(77.5), 1.2).with_grade(TradeGrade::Elite);
        let id = trade.id;
        j.add_trade(trade);

        assert_eq!(j.trades().len(), 1);
        assert_eq!(j.entries().len(), 1);

        let entry = &j.entries()[0];
        assert_eq!(entry.trade_id, Some(id));
        assert_eq!(Some(entry.timestamp), j.trade(id).map(|t| t.opened_at));
        assert_eq!(entry.kind, EntryKind::TradeAnalysis);
        assert_eq!(entry.title, "Auto-Generated: XAUUSD Trade");
        assert_eq!(entry.emotional_rating, 4);
        assert!(LESSONS.contains(&entry.lesson.as_str()));
        assert!(entry.content.contains("Entry: 2674.50"));
        assert!(entry.content.contains("Exit: 2682.25"));
        assert!(entry.content.contains("Result: successful (1.2R)"));
        assert!(entry.content.contains("Perfect execution - maintain this standard"));
        assert!(entry.content.contains("Emotional state: Calm and focused"));
        assert!(entry.content.contains("Grade: Elite"));
    }

    #[test]
    fn test_running_trade_analysis() {
        let mut j = journal();
        j.add_trade(gold(TradeOutcome::Running, dec!(0), 0.0));
        let content = &j.entries()[0].content;
        assert!(content.contains("Exit: N/A"));
        assert!(content.contains("unsuccessful"));
        assert!(content.contains("Followed risk management rules"));
    }

    #[test]
    fn test_auto_logging_disabled() {
        let mut j = journal();
        j.set_auto_logging(false);
        assert!(!j.auto_logging());
        j.add_trade(gold(TradeOutcome::Win, dec!(10), 0.5));
        assert_eq!(j.trades().len(), 1);
        assert!(j.entries().is_empty());
    }

    #[test]
    fn test_update_trade() {
        let mut j = journal();
        let trade = gold(TradeOutcome::Running, dec!(0), 0.0);
        let id = trade.id;
        j.add_trade(trade.clone());

        let closed = trade.close(dec!(2682.25), dec!(77.5), 1.2, TradeOutcome::Win);
        assert!(j.update_trade(closed));
        assert_eq!(j.trade(id).map(|t| t.outcome), Some(TradeOutcome::Win));
        assert_eq!(j.trades().len(), 1);
    }

    #[test]
    fn test_update_unknown_trade_is_noop() {
        let mut j = journal();
        j.add_trade(gold(TradeOutcome::Win, dec!(10), 0.5));
        let before = j.trades().to_vec();

        assert!(!j.update_trade(gold(TradeOutcome::Loss, dec!(-10), -0.5)));
        assert_eq!(j.trades(), before.as_slice());
    }

    #[test]
    fn test_delete_trade_cascades_by_id() {
        let mut j = journal();
        let first = gold(TradeOutcome::Win, dec!(50), 1.0);
        let second = gold(TradeOutcome::Loss, dec!(-20), -0.4);
        let (first_id, second_id) = (first.id, second.id);
        j.add_trade(first);
        j.add_trade(second);
        j.add_entry(JournalEntry::manual(
            EntryKind::MarketObservation,
            "XAUUSD range day",
            "Gold chopped all session",
            3,
            "",
        ));

        let removed = j.delete_trade(first_id);
        assert_eq!(removed.map(|t| t.id), Some(first_id));
        assert_eq!(j.trades().len(), 1);
        // second trade's entry and the manual note survive
        assert_eq!(j.entries().len(), 2);
        assert!(j.entries().iter().all(|e| e.trade_id != Some(first_id)));
        assert!(j.entries().iter().any(|e| e.trade_id == Some(second_id)));
    }

    #[test]
    fn test_delete_unknown_trade() {
        let mut j = journal();
        j.add_trade(gold(TradeOutcome::Win, dec!(50), 1.0));
        assert!(j.delete_trade(Uuid::new_v4()).is_none());
        assert_eq!(j.trades().len(), 1);
        assert_eq!(j.entries().len(), 1);
    }

    #[test]
    fn test_statistics_example() {
        let mut j = journal();
        j.add_trade(gold(TradeOutcome::Win, dec!(100), 1.0).with_grade(TradeGrade::Elite));
        j.add_trade(gold(TradeOutcome::Win, dec!(50), 0.5));
        j.add_trade(gold(TradeOutcome::Loss, dec!(-75), -1.0));

        assert!((j.win_rate() - 2.0 / 3.0).abs() < 1e-9);
        assert!((j.profit_factor() - 2.0).abs() < 1e-9);
        assert_eq!(j.elite_count(), 1);

        let stats = j.statistics();
        assert_eq!(stats.total_trades, 3);
        assert_eq!(stats.total_pnl, dec!(75));
        assert!((stats.average_emotional_rating - 4.0).abs() < 1e-9);
        assert_eq!(stats.psychology_grade(), "Well Controlled");
    }

    #[test]
    fn test_views_and_sorting() {
        let mut j = journal();
        j.add_trade(gold(TradeOutcome::Loss, dec!(-30), -0.5));
        j.add_trade(gold(TradeOutcome::Win, dec!(90), 1.5).with_grade(TradeGrade::Elite));
        j.add_trade(gold(TradeOutcome::Running, dec!(0), 0.0));

        assert_eq!(j.winning_trades().len(), 1);
        assert_eq!(j.losing_trades().len(), 1);
        assert_eq!(j.running_trades().len(), 1);
        assert_eq!(j.elite_trades().len(), 1);

        let pnls: Vec<_> = j.trades_by_pnl().iter().map(|t| t.pnl).collect();
        assert_eq!(pnls, vec![dec!(90), dec!(0), dec!(-30)]);
        assert_eq!(j.trades_by_date().len(), 3);
    }

    #[test]
    fn test_entry_queries() {
        let mut j = journal();
        j.add_trade(gold(TradeOutcome::Win, dec!(10), 0.2));
        j.add_entry(JournalEntry::manual(EntryKind::GoalSetting, "Weekly goals", "Two A+ setups only", 4, ""));

        let mut old = JournalEntry::manual(EntryKind::Reflection, "Last month", "Overtraded", 2, "Patience");
        old.timestamp = Utc::now() - TimeDelta::days(30);
        j.add_entry(old);

        assert_eq!(j.entries_of_kind(EntryKind::TradeAnalysis).len(), 1);
        assert_eq!(j.entries_of_kind(EntryKind::GoalSetting).len(), 1);
        assert_eq!(j.recent_entries(7).len(), 2);
        assert_eq!(j.recent_entries(i64::MAX).len(), 3);
        assert_eq!(j.recent_entries(365_000_000).len(), 3);
        assert!(j.recent_entries(-1).is_empty());
        assert_eq!(j.entries_by_date().last().map(|e| e.title.as_str()), Some("Last month"));
    }
}
