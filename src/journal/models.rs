//! Trade records and journal entries.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Buy,
    Sell,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Buy => write!(f, "Buy"),
            Direction::Sell => write!(f, "Sell"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeOutcome {
    Win,
    Loss,
    Breakeven,
    Running,
}

impl TradeOutcome {
    /// Whether the trade is closed.
    pub fn is_resolved(&self) -> bool {
        !matches!(self, TradeOutcome::Running)
    }
}

impl fmt::Display for TradeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeOutcome::Win => write!(f, "Win"),
            TradeOutcome::Loss => write!(f, "Loss"),
            TradeOutcome::Breakeven => write!(f, "Breakeven"),
            TradeOutcome::Running => write!(f, "Running"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeGrade {
    Elite,
    Good,
    Average,
    Poor,
}

impl TradeGrade {
    pub fn score(&self) -> u8 {
        match self {
            TradeGrade::Elite => 5,
            TradeGrade::Good => 4,
            TradeGrade::Average => 3,
            TradeGrade::Poor => 2,
        }
    }

    /// Canned follow-up advice for a trade of this grade.
    pub fn improvement_suggestion(&self) -> &'static str {
        match self {
            TradeGrade::Elite => "Perfect execution - maintain this standard",
            TradeGrade::Good => "Good trade - minor timing improvements possible",
            TradeGrade::Average => "Consider better entry timing and risk management",
            TradeGrade::Poor => "Review setup criteria and emotional state before entry",
        }
    }
}

impl fmt::Display for TradeGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeGrade::Elite => write!(f, "Elite"),
            TradeGrade::Good => write!(f, "Good"),
            TradeGrade::Average => write!(f, "Average"),
            TradeGrade::Poor => write!(f, "Poor"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    DailyReview,
    TradeAnalysis,
    PsychologyNote,
    MarketObservation,
    LearningNote,
    GoalSetting,
    Reflection,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::DailyReview => write!(f, "Daily Review"),
            EntryKind::TradeAnalysis => write!(f, "Trade Analysis"),
            EntryKind::PsychologyNote => write!(f, "Psychology Note"),
            EntryKind::MarketObservation => write!(f, "Market Observation"),
            EntryKind::LearningNote => write!(f, "Learning Note"),
            EntryKind::GoalSetting => write!(f, "Goal Setting"),
            EntryKind::Reflection => write!(f, "Reflection"),
        }
    }
}

/// Clamp an emotional rating onto the 1–5 scale.
pub fn clamp_rating(rating: u8) -> u8 {
    rating.clamp(1, 5)
}

// ---------------------------------------------------------------------------
// Trade record
// ---------------------------------------------------------------------------

/// A trade logged in the playbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: Uuid,
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: Decimal,
    pub exit_price: Option<Decimal>,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    pub lot_size: Decimal,
    /// Realized P/L; zero while running.
    pub pnl: Decimal,
    pub r_multiple: f64,
    pub outcome: TradeOutcome,
    pub grade: TradeGrade,
    pub setup_description: String,
    pub emotional_state: String,
    pub opened_at: DateTime<Utc>,
    /// 1–5.
    pub emotional_rating: u8,
}

impl TradeRecord {
    /// A new running trade with neutral grading.
    pub fn new(
        symbol: impl Into<String>,
        direction: Direction,
        entry_price: Decimal,
        stop_loss: Decimal,
        take_profit: Decimal,
        lot_size: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol: symbol.into(),
            direction,
            entry_price,
            exit_price: None,
            stop_loss,
            take_profit,
            lot_size,
            pnl: Decimal::ZERO,
            r_multiple: 0.0,
            outcome: TradeOutcome::Running,
            grade: TradeGrade::Average,
            setup_description: String::new(),
            emotional_state: String::new(),
            opened_at: Utc::now(),
            emotional_rating: 3,
        }
    }

    /// Close the trade at `exit_price` with the given result.
    pub fn close(mut self, exit_price: Decimal, pnl: Decimal, r_multiple: f64, outcome: TradeOutcome) -> Self {
        self.exit_price = Some(exit_price);
        self.pnl = pnl;
        self.r_multiple = r_multiple;
        self.outcome = outcome;
        self
    }

    pub fn with_grade(mut self, grade: TradeGrade) -> Self {
        self.grade = grade;
        self
    }

    pub fn with_notes(mut self, setup: impl Into<String>, emotional_state: impl Into<String>, rating: u8) -> Self {
        self.setup_description = setup.into();
        self.emotional_state = emotional_state.into();
        self.emotional_rating = clamp_rating(rating);
        self
    }

    pub fn is_running(&self) -> bool {
        self.outcome == TradeOutcome::Running
    }

    pub fn is_profitable(&self) -> bool {
        self.pnl > Decimal::ZERO
    }

    /// |entry − stop| × size.
    ///
    /// Pinned at `Decimal::MAX` when the product leaves the decimal range.
    pub fn risk_amount(&self) -> Decimal {
        distance_times(self.entry_price, self.stop_loss, self.lot_size)
    }

    /// |take profit − entry| × size, pinned like [`Self::risk_amount`].
    pub fn reward_amount(&self) -> Decimal {
        distance_times(self.take_profit, self.entry_price, self.lot_size)
    }

    /// Planned reward over risk; zero when no risk is defined.
    pub fn risk_reward_ratio(&self) -> Decimal {
        let risk = self.risk_amount();
        if risk.is_zero() {
            return Decimal::ZERO;
        }
        self.reward_amount().checked_div(risk).unwrap_or(Decimal::MAX)
    }

    /// Signed P/L, e.g. `+$77.50`.
    pub fn formatted_pnl(&self) -> String {
        let sign = if self.pnl >= Decimal::ZERO { "+" } else { "-" };
        format!("{sign}${:.2}", self.pnl.abs())
    }

    /// Signed R-multiple, e.g. `+1.20R`.
    pub fn formatted_r_multiple(&self) -> String {
        let sign = if self.r_multiple >= 0.0 { "+" } else { "" };
        format!("{sign}{:.2}R", self.r_multiple)
    }
}

impl fmt::Display for TradeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} @ {} [{}] {} {} ({})",
            self.direction,
            self.symbol,
            self.entry_price,
            self.outcome,
            self.formatted_pnl(),
            self.formatted_r_multiple(),
            self.grade,
        )
    }
}

fn distance_times(a: Decimal, b: Decimal, size: Decimal) -> Decimal {
    a.checked_sub(b)
        .and_then(|d| d.abs().checked_mul(size.abs()))
        .unwrap_or(Decimal::MAX)
}

// ---------------------------------------------------------------------------
// Journal entry
// ---------------------------------------------------------------------------

/// A free-text journal entry, optionally tied to a trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: Uuid,
    /// Trade this entry was generated from; removed with it.
    pub trade_id: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
    pub kind: EntryKind,
    pub title: String,
    pub content: String,
    /// 1–5.
    pub emotional_rating: u8,
    pub lesson: String,
}

impl JournalEntry {
    /// An entry stamped now and not yet linked to any trade.
    pub fn manual(
        kind: EntryKind,
        title: impl Into<String>,
        content: impl Into<String>,
        emotional_rating: u8,
        lesson: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            trade_id: None,
            timestamp: Utc::now(),
            kind,
            title: title.into(),
            content: content.into(),
            emotional_rating: clamp_rating(emotional_rating),
            lesson: lesson.into(),
        }
    }

    /// Link this entry to a trade so it is removed along with it.
    pub fn for_trade(mut self, trade_id: Uuid) -> Self {
        self.trade_id = Some(trade_id);
        self
    }

    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }

    /// Estimated reading time at 200 words per minute, at least one minute.
    pub fn reading_minutes(&self) -> usize {
        self.word_count().div_ceil(200).max(1)
    }

    pub fn mood_description(&self) -> &'static str {
        match self.emotional_rating {
            5 => "Excellent mindset",
            4 => "Good mindset",
            3 => "Neutral mindset",
            2 => "Challenging mindset",
            1 => "Difficult mindset",
            _ => "Unknown mindset",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn gold_long() -> TradeRecord {
        TradeRecord::new("XAUUSD", Direction::Buy, dec!(2674.50), dec!(2668.00), dec!(2690.00), dec!(0.01))
    }

    #[test]
    fn test_new_trade_is_running() {
        let trade = gold_long();
        assert!(trade.is_running());
        assert_eq!(trade.pnl, Decimal::ZERO);
        assert!(trade.exit_price.is_none());
        assert!(!trade.is_profitable());
    }

    #[test]
    fn test_close_sets_result() {
        let trade = gold_long().close(dec!(2682.25), dec!(77.50), 1.2, TradeOutcome::Win);
        assert_eq!(trade.exit_price, Some(dec!(2682.25)));
        assert!(trade.is_profitable());
        assert!(trade.outcome.is_resolved());
    }

    #[test]
    fn test_risk_and_reward() {
        let trade = gold_long();
        assert_eq!(trade.risk_amount(), dec!(0.065));
        assert_eq!(trade.reward_amount(), dec!(0.155));
        assert_eq!(trade.risk_reward_ratio().round_dp(4), dec!(2.3846));
    }

    #[test]
    fn test_zero_risk_ratio() {
        let mut trade = gold_long();
        trade.stop_loss = trade.entry_price;
        assert_eq!(trade.risk_reward_ratio(), Decimal::ZERO);
    }

    #[test]
    fn test_risk_helpers_pin_instead_of_overflowing() {
        let mut trade = gold_long();
        trade.entry_price = Decimal::MAX;
        trade.stop_loss = Decimal::MIN;
        trade.lot_size = dec!(2);
        assert_eq!(trade.risk_amount(), Decimal::MAX);

        let mut tight = gold_long();
        tight.entry_price = Decimal::ONE;
        tight.stop_loss = dec!(0.9999999999999999999999999);
        tight.take_profit = Decimal::MAX;
        tight.lot_size = Decimal::ONE;
        assert_eq!(tight.risk_reward_ratio(), Decimal::MAX);
    }

    #[test]
    fn test_formatting() {
        let win = gold_long().close(dec!(2682.25), dec!(77.5), 1.2, TradeOutcome::Win);
        assert_eq!(win.formatted_pnl(), "+$77.50");
        assert_eq!(win.formatted_r_multiple(), "+1.20R");

        let loss = gold_long().close(dec!(2669.50), dec!(-25), -0.36, TradeOutcome::Loss);
        assert_eq!(loss.formatted_pnl(), "-$25.00");
        assert_eq!(loss.formatted_r_multiple(), "-0.36R");
    }

    #[test]
    fn test_ratings_are_clamped() {
        let trade = gold_long().with_notes("setup", "calm", 9);
        assert_eq!(trade.emotional_rating, 5);
        let entry = JournalEntry::manual(EntryKind::Reflection, "t", "c", 0, "l");
        assert_eq!(entry.emotional_rating, 1);
    }

    #[test]
    fn test_entry_reading_time() {
        let entry = JournalEntry::manual(EntryKind::LearningNote, "Notes", "one two three", 4, "");
        assert_eq!(entry.word_count(), 3);
        assert_eq!(entry.reading_minutes(), 1);

        let long = JournalEntry::manual(EntryKind::LearningNote, "Long", "word ".repeat(401), 4, "");
        assert_eq!(long.reading_minutes(), 3);
        assert_eq!(long.mood_description(), "Good mindset");
    }

    #[test]
    fn test_trade_serialization_roundtrip() {
        let trade = gold_long().with_grade(TradeGrade::Elite);
        let json = serde_json::to_string(&trade).unwrap();
        let parsed: TradeRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, trade.id);
        assert_eq!(parsed.grade, TradeGrade::Elite);
        assert_eq!(parsed.entry_price, dec!(2674.50));
    }

    #[test]
    fn test_grade_scores() {
        assert_eq!(TradeGrade::Elite.score(), 5);
        assert_eq!(TradeGrade::Poor.score(), 2);
    }
}
