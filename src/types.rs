//! Shared types for the ProTrader engines.
//!
//! Small value types used by the simulator core and by every engine,
//! kept here so that `sim`, `engines` and `journal` can depend on them
//! without depending on each other.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Timeframe
// ---------------------------------------------------------------------------

/// Chart timeframe label attached to simulated findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    M5,
    M15,
    H1,
    H4,
    D1,
    W1,
}

impl Timeframe {
    /// Intraday timeframes used when sampling strand timeframes.
    pub const INTRADAY: &'static [Timeframe] =
        &[Timeframe::M5, Timeframe::M15, Timeframe::H1, Timeframe::H4];
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timeframe::M5 => write!(f, "M5"),
            Timeframe::M15 => write!(f, "M15"),
            Timeframe::H1 => write!(f, "H1"),
            Timeframe::H4 => write!(f, "H4"),
            Timeframe::D1 => write!(f, "D1"),
            Timeframe::W1 => write!(f, "W1"),
        }
    }
}

impl std::str::FromStr for Timeframe {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "M5" => Ok(Timeframe::M5),
            "M15" => Ok(Timeframe::M15),
            "H1" => Ok(Timeframe::H1),
            "H4" => Ok(Timeframe::H4),
            "D1" => Ok(Timeframe::D1),
            "W1" => Ok(Timeframe::W1),
            _ => Err(anyhow::anyhow!("Unknown timeframe: {s}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Construction-time validation errors.
///
/// Engine operations themselves are total; these only surface when a
/// range or probability is built from untrusted input (e.g. config).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    #[error("Invalid metric range: [{lo}, {hi}]")]
    InvalidRange { lo: f64, hi: f64 },

    #[error("Probability out of [0, 1]: {0}")]
    InvalidProbability(f64),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeframe_display() {
        assert_eq!(format!("{}", Timeframe::M15), "M15");
        assert_eq!(format!("{}", Timeframe::W1), "W1");
    }

    #[test]
    fn test_timeframe_from_str() {
        assert_eq!("m5".parse::<Timeframe>().unwrap(), Timeframe::M5);
        assert_eq!("H4".parse::<Timeframe>().unwrap(), Timeframe::H4);
        assert!("M7".parse::<Timeframe>().is_err());
    }

    #[test]
    fn test_timeframe_serialization() {
        let json = serde_json::to_string(&Timeframe::H1).unwrap();
        assert_eq!(json, "\"H1\"");
        let parsed: Timeframe = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Timeframe::H1);
    }

    #[test]
    fn test_sim_error_display() {
        let err = SimError::InvalidRange { lo: 0.9, hi: 0.1 };
        assert_eq!(err.to_string(), "Invalid metric range: [0.9, 0.1]");
        assert_eq!(
            SimError::InvalidProbability(1.5).to_string(),
            "Probability out of [0, 1]: 1.5"
        );
    }
}
