//! Folding judged records into per-category statistics, and pooling
//! several evaluation subsets into one pass.

use super::records::ScoredRecord;
use crate::scoring::{parser, reduce, CategoryAccumulator, LabelNormalizer, StepPolicy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Token counts reported by the judge, passed through untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UsageSummary {
    /// Records that carried any token count
    pub records: usize,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl UsageSummary {
    fn record(&mut self, record: &ScoredRecord) {
        if record.input_tokens.is_none() && record.output_tokens.is_none() {
            return;
        }
        self.records += 1;
        self.input_tokens += record.input_tokens.unwrap_or(0);
        self.output_tokens += record.output_tokens.unwrap_or(0);
    }

    fn merge(&mut self, other: &UsageSummary) {
        self.records += other.records;
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }

    pub fn avg_input_tokens(&self) -> f64 {
        if self.records == 0 {
            0.0
        } else {
            self.input_tokens as f64 / self.records as f64
        }
    }

    pub fn avg_output_tokens(&self) -> f64 {
        if self.records == 0 {
            0.0
        } else {
            self.output_tokens as f64 / self.records as f64
        }
    }
}

/// Accumulated statistics for one aggregation run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AggregationStats {
    pub total: CategoryAccumulator,
    pub by_category: BTreeMap<String, CategoryAccumulator>,
    /// Records without a usable score span, or rejected by the step policy
    pub skipped: usize,
    /// Steps altered by the step policy
    pub adjusted_steps: usize,
    pub usage: UsageSummary,
}

impl AggregationStats {
    /// Field-wise sum; merging shards gives the same result as folding all records at once.
    pub fn merge(&mut self, other: &AggregationStats) {
        self.total.merge(&other.total);
        for (category, acc) in &other.by_category {
            self.by_category
                .entry(category.clone())
                .or_default()
                .merge(acc);
        }
        self.skipped += other.skipped;
        self.adjusted_steps += other.adjusted_steps;
        self.usage.merge(&other.usage);
    }
}

/// Per-record processing: parse, apply the step policy, normalize the label, fold.
#[derive(Debug, Clone)]
pub struct Pipeline {
    normalizer: LabelNormalizer,
    step_policy: StepPolicy,
    category_breakdown: bool,
}

impl Pipeline {
    pub fn new(normalizer: LabelNormalizer, step_policy: StepPolicy) -> Self {
        Self {
            normalizer,
            step_policy,
            category_breakdown: true,
        }
    }

    /// Only fill the `total` accumulator
    pub fn without_categories(mut self) -> Self {
        self.category_breakdown = false;
        self
    }

    pub fn fold_record(&self, stats: &mut AggregationStats, record: &ScoredRecord) {
        stats.usage.record(record);

        let Some(mut scores) = record.score_text.as_deref().and_then(parser::parse) else {
            debug!("Skipping record '{}': no score span", record.video_id);
            stats.skipped += 1;
            return;
        };

        if scores.is_empty() {
            debug!("Skipping record '{}': score span has no steps", record.video_id);
            stats.skipped += 1;
            return;
        }

        match self.step_policy.apply(&mut scores) {
            Ok(0) => {}
            Ok(adjusted) => {
                warn!(
                    "Record '{}': clamped {} out-of-range step(s)",
                    record.video_id, adjusted
                );
                stats.adjusted_steps += adjusted;
            }
            Err(e) => {
                warn!("Skipping record '{}': {}", record.video_id, e);
                stats.skipped += 1;
                return;
            }
        }

        let metrics = reduce(&scores);
        stats.total.fold(&metrics);

        if self.category_breakdown {
            let category = self.normalizer.normalize(&record.ground_truth);
            stats.by_category.entry(category).or_default().fold(&metrics);
        }
    }

    pub fn fold<'a, I>(&self, records: I) -> AggregationStats
    where
        I: IntoIterator<Item = &'a ScoredRecord>,
    {
        let mut stats = AggregationStats::default();
        for record in records {
            self.fold_record(&mut stats, record);
        }
        stats
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(LabelNormalizer::standard(), StepPolicy::default())
    }
}

/// Records of one evaluation subset (e.g. one task type)
#[derive(Debug, Clone)]
pub struct SubsetRecords {
    pub name: String,
    pub records: Vec<ScoredRecord>,
}

/// Pools records from several named subsets; every record weighs the same.
#[derive(Debug, Clone, Default)]
pub struct MultiDatasetAggregator {
    subsets: Vec<SubsetRecords>,
}

impl MultiDatasetAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_subset(&mut self, name: &str, records: Vec<ScoredRecord>) {
        self.subsets.push(SubsetRecords {
            name: name.to_string(),
            records,
        });
    }

    #[cfg(test)]
    pub fn subsets(&self) -> &[SubsetRecords] {
        &self.subsets
    }

    pub fn into_subsets(self) -> Vec<SubsetRecords> {
        self.subsets
    }

    pub fn len(&self) -> usize {
        self.subsets.iter().map(|s| s.records.len()).sum()
    }

    /// Concatenate all subsets in the order they were added
    pub fn aggregate(self) -> Vec<ScoredRecord> {
        concat(self.subsets.into_iter().map(|s| s.records))
    }
}

/// Concatenate record collections, preserving source order
pub fn concat<I>(sources: I) -> Vec<ScoredRecord>
where
    I: IntoIterator<Item = Vec<ScoredRecord>>,
{
    sources.into_iter().flatten().collect()
}
