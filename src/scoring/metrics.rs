use crate::error::MetricsError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reduction of one record's step scores
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StepMetrics {
    /// Score of the final step (emotion label match)
    pub recognition: f64,
    /// Mean score of every step before the final one
    pub reasoning: f64,
    /// Number of steps
    pub steps: usize,
}

/// Reduce a step sequence: last element is recognition, the rest average into reasoning
pub fn reduce(scores: &[f64]) -> StepMetrics {
    let Some((&recognition, reasoning_steps)) = scores.split_last() else {
        return StepMetrics::default();
    };

    let reasoning = if reasoning_steps.is_empty() {
        0.0
    } else {
        reasoning_steps.iter().sum::<f64>() / reasoning_steps.len() as f64
    };

    StepMetrics {
        recognition,
        reasoning,
        steps: scores.len(),
    }
}

/// Running sums for one scope (the total, or a single category)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CategoryAccumulator {
    pub acc_sum: f64,
    pub reason_sum: f64,
    pub step_sum: usize,
    pub count: usize,
}

impl CategoryAccumulator {
    /// Add one record's metrics. Zero-step metrics are ignored.
    pub fn fold(&mut self, metrics: &StepMetrics) {
        if metrics.steps == 0 {
            return;
        }
        self.acc_sum += metrics.recognition;
        self.reason_sum += metrics.reasoning;
        self.step_sum += metrics.steps;
        self.count += 1;
    }

    /// Field-wise sum of two accumulators
    pub fn merge(&mut self, other: &CategoryAccumulator) {
        self.acc_sum += other.acc_sum;
        self.reason_sum += other.reason_sum;
        self.step_sum += other.step_sum;
        self.count += other.count;
    }
}

/// How to treat step ratios outside [0, 1], e.g. `2/1` from a sloppy judge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum StepPolicy {
    /// Use the ratio as written
    Keep,
    /// Clamp into [0, 1]
    #[default]
    Clamp,
    /// Drop the whole record
    Reject,
}

impl fmt::Display for StepPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepPolicy::Keep => write!(f, "keep"),
            StepPolicy::Clamp => write!(f, "clamp"),
            StepPolicy::Reject => write!(f, "reject"),
        }
    }
}

impl StepPolicy {
    /// Apply the policy in place, returning how many steps were adjusted.
    pub fn apply(&self, scores: &mut [f64]) -> Result<usize, MetricsError> {
        let mut adjusted = 0;
        for (index, value) in scores.iter_mut().enumerate() {
            if (0.0..=1.0).contains(value) {
                continue;
            }
            match self {
                StepPolicy::Keep => {}
                StepPolicy::Clamp => {
                    *value = value.clamp(0.0, 1.0);
                    adjusted += 1;
                }
                StepPolicy::Reject => {
                    return Err(MetricsError::StepOutOfRange {
                        index: index + 1,
                        value: *value,
                    });
                }
            }
        }
        Ok(adjusted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduce_empty() {
        assert_eq!(reduce(&[]), StepMetrics::default());
    }

    #[test]
    fn test_reduce_single_step() {
        let metrics = reduce(&[0.0]);
        assert_eq!(metrics.recognition, 0.0);
        assert_eq!(metrics.reasoning, 0.0);
        assert_eq!(metrics.steps, 1);

        let metrics = reduce(&[1.0]);
        assert_eq!(metrics.recognition, 1.0);
        assert_eq!(metrics.reasoning, 0.0);
    }

    #[test]
    fn test_reduce_multi_step() {
        let metrics = reduce(&[1.0, 0.0, 1.0]);
        assert_eq!(metrics.recognition, 1.0);
        assert_eq!(metrics.reasoning, 0.5);
        assert_eq!(metrics.steps, 3);
    }

    #[test]
    fn test_fold_empty_leaves_count() {
        let mut acc = CategoryAccumulator::default();
        acc.fold(&reduce(&[]));
        assert_eq!(acc.count, 0);
        assert_eq!(acc, CategoryAccumulator::default());
    }

    #[test]
    fn test_fold_accumulates() {
        let mut acc = CategoryAccumulator::default();
        acc.fold(&reduce(&[1.0, 1.0]));
        acc.fold(&reduce(&[0.0]));
        assert_eq!(acc.count, 2);
        assert_eq!(acc.acc_sum, 1.0);
        assert_eq!(acc.reason_sum, 1.0);
        assert_eq!(acc.step_sum, 3);
    }

    #[test]
    fn test_merge_matches_sequential_fold() {
        let seqs: [&[f64]; 4] = [&[1.0, 0.0, 1.0], &[0.5], &[1.0, 1.0], &[0.0, 0.25, 0.0]];

        let mut sequential = CategoryAccumulator::default();
        for seq in seqs {
            sequential.fold(&reduce(seq));
        }

        let mut left = CategoryAccumulator::default();
        let mut right = CategoryAccumulator::default();
        for seq in &seqs[..2] {
            left.fold(&reduce(seq));
        }
        for seq in &seqs[2..] {
            right.fold(&reduce(seq));
        }
        left.merge(&right);

        assert_eq!(left, sequential);
    }

    #[test]
    fn test_step_policy_keep() {
        let mut scores = vec![2.0, 1.0];
        assert_eq!(StepPolicy::Keep.apply(&mut scores), Ok(0));
        assert_eq!(scores, vec![2.0, 1.0]);
    }

    #[test]
    fn test_step_policy_clamp() {
        let mut scores = vec![2.0, 0.5, 3.0];
        assert_eq!(StepPolicy::Clamp.apply(&mut scores), Ok(2));
        assert_eq!(scores, vec![1.0, 0.5, 1.0]);
    }

    #[test]
    fn test_step_policy_reject() {
        let mut scores = vec![1.0, 4.0];
        let err = StepPolicy::Reject.apply(&mut scores).unwrap_err();
        assert_eq!(err, MetricsError::StepOutOfRange { index: 2, value: 4.0 });
    }
}
