//! Finding generator: Bernoulli-filtered candidate scans.
//!
//! Every draw takes the caller's random source, so a seeded `StdRng`
//! reproduces a scan exactly.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::types::SimError;

// ---------------------------------------------------------------------------
// Metric range
// ---------------------------------------------------------------------------

/// Closed interval a simulated metric is sampled from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricRange {
    lo: f64,
    hi: f64,
}

impl MetricRange {
    /// Build a range from in-crate constants. `lo <= hi` must hold;
    /// callers outside the crate go through [`MetricRange::try_new`].
    pub(crate) const fn between(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    /// Build a range from untrusted input.
    pub fn try_new(lo: f64, hi: f64) -> Result<Self, SimError> {
        if !lo.is_finite() || !hi.is_finite() || lo > hi {
            return Err(SimError::InvalidRange { lo, hi });
        }
        Ok(Self { lo, hi })
    }

    pub fn lo(&self) -> f64 {
        self.lo
    }

    pub fn hi(&self) -> f64 {
        self.hi
    }

    /// Uniform sample within `[lo, hi]`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.lo >= self.hi {
            return self.lo;
        }
        rng.gen_range(self.lo..=self.hi)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lo && value <= self.hi
    }
}

// ---------------------------------------------------------------------------
// Probability
// ---------------------------------------------------------------------------

/// A validated probability in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Probability(f64);

impl Probability {
    pub const ALWAYS: Probability = Probability(1.0);
    pub const NEVER: Probability = Probability(0.0);

    /// Build from an in-crate constant in `[0, 1]`; callers outside the
    /// crate go through [`Probability::new`].
    pub(crate) const fn fixed(p: f64) -> Self {
        Self(p)
    }

    pub fn new(p: f64) -> Result<Self, SimError> {
        if !(0.0..=1.0).contains(&p) {
            return Err(SimError::InvalidProbability(p));
        }
        Ok(Self(p))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// One independent Bernoulli trial.
    pub fn trial<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        rng.gen_bool(self.0)
    }
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// Produces the subset of a fixed candidate list that passes an
/// independent inclusion trial, each annotated with fresh metrics.
#[derive(Debug, Clone, Copy)]
pub struct FindingGenerator {
    inclusion: Probability,
}

impl FindingGenerator {
    pub fn new(inclusion: Probability) -> Self {
        Self { inclusion }
    }

    /// Generator that keeps every candidate.
    pub fn exhaustive() -> Self {
        Self::new(Probability::ALWAYS)
    }

    pub fn inclusion(&self) -> Probability {
        self.inclusion
    }

    /// Scan `candidates`, keeping each with the inclusion probability and
    /// building a finding for it with `annotate`.
    ///
    /// An empty result is a valid outcome, not an error.
    pub fn scan<'a, C, T, R, F>(&self, candidates: &'a [C], rng: &mut R, mut annotate: F) -> Vec<T>
    where
        R: Rng + ?Sized,
        F: FnMut(&'a C, &mut R) -> T,
    {
        let mut found = Vec::new();
        for candidate in candidates {
            if self.inclusion.trial(rng) {
                found.push(annotate(candidate, rng));
            }
        }
        found
    }
}

/// Uniformly pick one item, `None` for an empty slice.
pub fn pick<'a, T, R: Rng + ?Sized>(items: &'a [T], rng: &mut R) -> Option<&'a T> {
    items.choose(rng)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
