use super::metrics::CategoryAccumulator;
use crate::error::MetricsError;
use serde::{Deserialize, Serialize};

/// Weight of the recognition score in the CoT score, guaranteed to lie in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Alpha(f64);

impl Alpha {
    pub fn new(value: f64) -> Result<Self, MetricsError> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(MetricsError::InvalidAlpha(value))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for Alpha {
    fn default() -> Self {
        Self(0.5)
    }
}

impl TryFrom<f64> for Alpha {
    type Error = MetricsError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Alpha::new(value)
    }
}

impl From<Alpha> for f64 {
    fn from(alpha: Alpha) -> Self {
        alpha.0
    }
}

/// Clap value parser for `--alpha`
pub fn parse_alpha(s: &str) -> Result<Alpha, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a number", s))?;
    Alpha::new(value).map_err(|e| e.to_string())
}

/// Final numbers for one scope, as raw fractions
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScopeReport {
    pub count: usize,
    pub recognition_score: f64,
    pub reasoning_score: f64,
    pub cot_score: f64,
    pub avg_steps: f64,
}

/// Turn an accumulator into averages and the weighted CoT score.
///
/// Empty scopes report zeros.
pub fn summarize(acc: &CategoryAccumulator, alpha: Alpha) -> ScopeReport {
    if acc.count == 0 {
        return ScopeReport::default();
    }

    let count = acc.count as f64;
    let recognition_score = acc.acc_sum / count;
    let reasoning_score = acc.reason_sum / count;
    let alpha = alpha.value();

    ScopeReport {
        count: acc.count,
        recognition_score,
        reasoning_score,
        cot_score: alpha * recognition_score + (1.0 - alpha) * reasoning_score,
        avg_steps: acc.step_sum as f64 / count,
    }
}
