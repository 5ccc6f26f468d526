//! Derived metrics over a finding collection.
//!
//! Nothing here is stored; summaries are recomputed from the current
//! findings whenever they are asked for.

use serde::Serialize;
use std::collections::BTreeMap;

/// A simulated record produced by an engine scan.
///
/// Strength values are demo numbers drawn from fixed ranges and carry
/// no predictive meaning.
pub trait Finding {
    /// Category tag used for grouping.
    fn category(&self) -> &'static str;
    /// Primary scalar metric, in `[0, 1]`.
    fn strength(&self) -> f64;
    fn description(&self) -> &str;
    /// Scan generation this record belongs to.
    fn generation(&self) -> u32;
}

/// Aggregate view of a finding collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FindingSummary {
    pub count: usize,
    pub mean_strength: f64,
    pub max_strength: f64,
    pub by_category: BTreeMap<&'static str, usize>,
}

impl FindingSummary {
    /// Summarise `findings`. An empty slice yields all-zero metrics.
    pub fn of<F: Finding>(findings: &[F]) -> Self {
        if findings.is_empty() {
            return Self::default();
        }

        let mut by_category = BTreeMap::new();
        for f in findings {
            *by_category.entry(f.category()).or_insert(0) += 1;
        }

        Self {
            count: findings.len(),
            mean_strength: mean_strength(findings),
            max_strength: findings
                .iter()
                .map(Finding::strength)
                .fold(0.0, f64::max),
            by_category,
        }
    }
}

/// Arithmetic mean of finding strengths, 0.0 when empty.
pub fn mean_strength<F: Finding>(findings: &[F]) -> f64 {
    if findings.is_empty() {
        return 0.0;
    }
    findings.iter().map(Finding::strength).sum::<f64>() / findings.len() as f64
}

/// The finding with the highest value of `key`, if any.
pub fn best_by<F, K>(findings: &[F], key: K) -> Option<&F>
where
    K: Fn(&F) -> f64,
{
    findings
        .iter()
        .max_by(|a, b| key(a).partial_cmp(&key(b)).unwrap_or(std::cmp::Ordering::Equal))
}

/// The strongest finding, if any.
pub fn strongest<F: Finding>(findings: &[F]) -> Option<&F> {
    best_by(findings, |f| f.strength())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
