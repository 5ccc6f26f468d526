//! Aggregate playbook statistics.
//!
//! Everything here is a pure function over a trade slice; nothing is cached.

use rust_decimal::prelude::*;
use serde::Serialize;

use super::models::{TradeGrade, TradeOutcome, TradeRecord};

/// Wins over resolved trades (win, loss, breakeven). Zero when none are resolved.
pub fn win_rate(trades: &[TradeRecord]) -> f64 {
    let resolved = trades.iter().filter(|t| t.outcome.is_resolved()).count();
    if resolved == 0 {
        return 0.0;
    }
    let wins = trades.iter().filter(|t| t.outcome == TradeOutcome::Win).count();
    wins as f64 / resolved as f64
}

/// Gross winning P/L over absolute gross losing P/L.
///
/// `f64::INFINITY` when there are wins and no losses, or when the ratio
/// exceeds the decimal range; `0.0` when there are neither.
pub fn profit_factor(trades: &[TradeRecord]) -> f64 {
    let gross_win = saturating_sum(
        trades
            .iter()
            .filter(|t| t.outcome == TradeOutcome::Win)
            .map(|t| t.pnl),
    );
    let gross_loss = saturating_sum(
        trades
            .iter()
            .filter(|t| t.outcome == TradeOutcome::Loss)
            .map(|t| t.pnl),
    )
    .abs();

    if gross_loss.is_zero() {
        return if gross_win > Decimal::ZERO { f64::INFINITY } else { 0.0 };
    }
    match gross_win.checked_div(gross_loss) {
        Some(ratio) => ratio.to_f64().unwrap_or(f64::INFINITY),
        None => f64::INFINITY,
    }
}

/// Mean R-multiple over every trade, running ones included.
pub fn average_r_multiple(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().map(|t| t.r_multiple).sum::<f64>() / trades.len() as f64
}

pub fn elite_count(trades: &[TradeRecord]) -> usize {
    trades.iter().filter(|t| t.grade == TradeGrade::Elite).count()
}

/// Sum of realized P/L, clamped to the decimal range.
pub fn total_pnl(trades: &[TradeRecord]) -> Decimal {
    saturating_sum(trades.iter().map(|t| t.pnl))
}

/// Add up amounts, pinning at `Decimal::MAX` / `Decimal::MIN` on overflow.
pub(crate) fn saturating_sum(amounts: impl Iterator<Item = Decimal>) -> Decimal {
    amounts.fold(Decimal::ZERO, |acc, x| {
        acc.checked_add(x).unwrap_or(if x.is_sign_negative() {
            Decimal::MIN
        } else {
            Decimal::MAX
        })
    })
}

pub fn average_emotional_rating(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().map(|t| t.emotional_rating as f64).sum::<f64>() / trades.len() as f64
}

// ---------------------------------------------------------------------------
// Statistics snapshot
// ---------------------------------------------------------------------------

/// Point-in-time summary of the whole playbook.
#[derive(Debug, Clone, Serialize)]
pub struct PlaybookStatistics {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub running_trades: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub average_r_multiple: f64,
    pub total_pnl: Decimal,
    pub elite_trades: usize,
    pub average_emotional_rating: f64,
    pub best_trade: Option<TradeRecord>,
    pub worst_trade: Option<TradeRecord>,
}

impl PlaybookStatistics {
    pub fn compute(trades: &[TradeRecord]) -> Self {
        let count = |outcome: TradeOutcome| trades.iter().filter(|t| t.outcome == outcome).count();

        Self {
            total_trades: trades.len(),
            winning_trades: count(TradeOutcome::Win),
            losing_trades: count(TradeOutcome::Loss),
            running_trades: count(TradeOutcome::Running),
            win_rate: win_rate(trades),
            profit_factor: profit_factor(trades),
            average_r_multiple: average_r_multiple(trades),
            total_pnl: total_pnl(trades),
            elite_trades: elite_count(trades),
            average_emotional_rating: average_emotional_rating(trades),
            best_trade: trades.iter().max_by_key(|t| t.pnl).cloned(),
            worst_trade: trades.iter().min_by_key(|t| t.pnl).cloned(),
        }
    }

    /// Skill label from win rate, average R and share of elite trades.
    pub fn overall_grade(&self) -> &'static str {
        if self.total_trades == 0 {
            return "Learning Trader";
        }
        if self.win_rate >= 0.7 && self.average_r_multiple >= 1.0 && self.elite_trades >= self.total_trades / 3 {
            "Elite Trader"
        } else if self.win_rate >= 0.6 && self.average_r_multiple >= 0.5 {
            "Skilled Trader"
        } else if self.win_rate >= 0.5 && self.average_r_multiple >= 0.0 {
            "Developing Trader"
        } else {
            "Learning Trader"
        }
    }

    /// Discipline label from the average emotional rating.
    pub fn psychology_grade(&self) -> &'static str {
        match self.average_emotional_rating {
            r if r >= 4.5 => "Zen Master",
            r if r >= 4.0 => "Well Controlled",
            r if r >= 3.5 => "Good Control",
            r if r >= 3.0 => "Average Control",
            r if r >= 2.5 => "Needs Work",
            _ => "High Stress",
        }
    }

    pub fn formatted_win_rate(&self) -> String {
        format!("{:.1}%", self.win_rate * 100.0)
    }

    pub fn formatted_profit_factor(&self) -> String {
        if self.profit_factor.is_infinite() {
            "inf".to_string()
        } else {
            format!("{:.2}", self.profit_factor)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::models::Direction;
    use rust_decimal_macros::dec;

    fn trade(outcome: TradeOutcome, pnl: Decimal, r: f64, grade: TradeGrade) -> TradeRecord {
        let base = TradeRecord::new("XAUUSD", Direction::Buy, dec!(2000), dec!(1990), dec!(2020), dec!(0.1))
            .with_grade(grade);
        match outcome {
            TradeOutcome::Running => base,
            _ => base.close(dec!(2005), pnl, r, outcome),
        }
    }

    fn sample_book() -> Vec<TradeRecord> {
        vec![
            trade(TradeOutcome::Win, dec!(100), 1.0, TradeGrade::Elite),
            trade(TradeOutcome::Win, dec!(50), 0.5, TradeGrade::Good),
            trade(TradeOutcome::Loss, dec!(-75), -1.0, TradeGrade::Poor),
        ]
    }

    #[test]
    fn test_sample_book_metrics() {
        let book = sample_book();
        assert!((win_rate(&book) - 2.0 / 3.0).abs() < 1e-9);
        assert!((profit_factor(&book) - 2.0).abs() < 1e-9);
        assert!((average_r_multiple(&book) - 0.5 / 3.0).abs() < 1e-9);
        assert_eq!(elite_count(&book), 1);
        assert_eq!(total_pnl(&book), dec!(75));
    }

    #[test]
    fn test_empty_book() {
        assert_eq!(win_rate(&[]), 0.0);
        assert_eq!(profit_factor(&[]), 0.0);
        assert_eq!(average_r_multiple(&[]), 0.0);
        assert_eq!(elite_count(&[]), 0);
    }

    #[test]
    fn test_profit_factor_without_losses_is_infinite() {
        let book = vec![trade(TradeOutcome::Win, dec!(10), 0.2, TradeGrade::Good)];
        assert!(profit_factor(&book).is_infinite());
    }

    #[test]
    fn test_profit_factor_ratio_beyond_decimal_range() {
        let huge = Decimal::from_i128_with_scale(10i128.pow(26), 0);
        let book = vec![
            trade(TradeOutcome::Win, huge, 3.0, TradeGrade::Elite),
            trade(TradeOutcome::Loss, dec!(-0.001), -0.1, TradeGrade::Poor),
        ];
        assert!(profit_factor(&book).is_infinite());
    }

    #[test]
    fn test_total_pnl_saturates() {
        let book = vec![
            trade(TradeOutcome::Win, Decimal::MAX, 1.0, TradeGrade::Good),
            trade(TradeOutcome::Win, Decimal::MAX, 1.0, TradeGrade::Good),
        ];
        assert_eq!(total_pnl(&book), Decimal::MAX);
        assert!(profit_factor(&book).is_infinite());

        let losses = vec![
            trade(TradeOutcome::Loss, Decimal::MIN, -1.0, TradeGrade::Poor),
            trade(TradeOutcome::Loss, Decimal::MIN, -1.0, TradeGrade::Poor),
            trade(TradeOutcome::Win, dec!(10), 0.1, TradeGrade::Good),
        ];
        assert_eq!(total_pnl(&losses), Decimal::MIN + dec!(10));
        assert!(profit_factor(&losses) < 1e-20);
    }

    #[test]
    fn test_running_trades_excluded_from_win_rate() {
        let mut book = sample_book();
        book.push(trade(TradeOutcome::Running, Decimal::ZERO, 0.0, TradeGrade::Average));
        assert!((win_rate(&book) - 2.0 / 3.0).abs() < 1e-9);
        // still part of the R average
        assert!((average_r_multiple(&book) - 0.5 / 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_only_running_trades() {
        let book = vec![trade(TradeOutcome::Running, Decimal::ZERO, 0.0, TradeGrade::Average)];
        assert_eq!(win_rate(&book), 0.0);
        assert_eq!(profit_factor(&book), 0.0);
    }

    #[test]
    fn test_statistics_snapshot() {
        let stats = PlaybookStatistics::compute(&sample_book());
        assert_eq!(stats.total_trades, 3);
        assert_eq!(stats.winning_trades, 2);
        assert_eq!(stats.losing_trades, 1);
        assert_eq!(stats.running_trades, 0);
        assert_eq!(stats.best_trade.as_ref().map(|t| t.pnl), Some(dec!(100)));
        assert_eq!(stats.worst_trade.as_ref().map(|t| t.pnl), Some(dec!(-75)));
        assert_eq!(stats.formatted_win_rate(), "66.7%");
        assert_eq!(stats.formatted_profit_factor(), "2.00");
    }

    #[test]
    fn test_grades() {
        let stats = PlaybookStatistics::compute(&sample_book());
        // 66% win rate, ~0.17R average
        assert_eq!(stats.overall_grade(), "Developing Trader");
        assert_eq!(stats.psychology_grade(), "Average Control");

        let empty = PlaybookStatistics::compute(&[]);
        assert_eq!(empty.overall_grade(), "Learning Trader");
        assert_eq!(empty.psychology_grade(), "High Stress");
    }

    #[test]
    fn test_elite_grade() {
        let book = vec![
            trade(TradeOutcome::Win, dec!(200), 2.0, TradeGrade::Elite),
            trade(TradeOutcome::Win, dec!(150), 1.5, TradeGrade::Elite),
            trade(TradeOutcome::Win, dec!(80), 0.8, TradeGrade::Good),
        ];
        let stats = PlaybookStatistics::compute(&book);
        assert_eq!(stats.overall_grade(), "Elite Trader");
        assert_eq!(stats.formatted_profit_factor(), "inf");
    }
}
