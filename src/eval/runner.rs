use super::aggregator::{AggregationStats, MultiDatasetAggregator, Pipeline};
use super::records::load_records;
use super::results::MetricsReport;
use crate::cli::ModelSuite;
use crate::scoring::Alpha;
use anyhow::Result;
use futures::future::try_join_all;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

/// Computes metrics reports from judged result files
pub struct MetricsRunner {
    pipeline: Pipeline,
    alpha: Alpha,
    subset_breakdown: bool,
}

impl MetricsRunner {
    pub fn new(pipeline: Pipeline, alpha: Alpha) -> Self {
        Self {
            pipeline,
            alpha,
            subset_breakdown: false,
        }
    }

    /// Fold each subset separately and report it next to the pooled numbers
    pub fn with_subset_breakdown(mut self, enabled: bool) -> Self {
        self.subset_breakdown = enabled;
        self
    }

    /// Metrics for a single results file
    pub async fn run_file(&self, model: &str, path: &Path) -> Result<MetricsReport> {
        info!("Computing metrics for {:?}", path);

        let records = load_records(path).await?;
        let stats = self.pipeline.fold(&records);
        log_stats(model, &stats);

        Ok(MetricsReport::new(
            &Uuid::new_v4().to_string(),
            model,
            self.alpha,
            &stats,
        ))
    }

    /// Pooled metrics across every subset configured for a model
    pub async fn run_suite(&self, suite: &ModelSuite) -> Result<MetricsReport> {
        info!(
            "Computing overall metrics for {} across {} subsets",
            suite.name,
            suite.subsets.len()
        );

        let loaded = try_join_all(suite.subsets.iter().map(|subset| async move {
            let records = load_records(&subset.path).await?;
            anyhow::Ok((subset.name.clone(), records))
        }))
        .await?;

        let mut aggregator = MultiDatasetAggregator::new();
        for (name, records) in loaded {
            aggregator.add_subset(&name, records);
        }
        info!("Loaded {} records for {}", aggregator.len(), suite.name);

        let report_id = Uuid::new_v4().to_string();

        if !self.subset_breakdown {
            let stats = self.pipeline.fold(&aggregator.aggregate());
            log_stats(&suite.name, &stats);
            return Ok(MetricsReport::new(&report_id, &suite.name, self.alpha, &stats));
        }

        // Each subset is an independent shard; shards merge field-wise.
        let handles: Vec<_> = aggregator
            .into_subsets()
            .into_iter()
            .map(|subset| {
                let pipeline = self.pipeline.clone();
                tokio::task::spawn_blocking(move || (subset.name, pipeline.fold(&subset.records)))
            })
            .collect();

        let mut shards = Vec::with_capacity(handles.len());
        for handle in handles {
            shards.push(handle.await?);
        }

        let mut overall = AggregationStats::default();
        for (_, stats) in &shards {
            overall.merge(stats);
        }
        log_stats(&suite.name, &overall);

        let mut report = MetricsReport::new(&report_id, &suite.name, self.alpha, &overall);
        for (name, stats) in &shards {
            report.add_subset(name, stats);
        }

        Ok(report)
    }

    /// Save text and JSON reports to the output directory
    pub fn save_report(
        report: &MetricsReport,
        output_dir: &Path,
        stem: &str,
    ) -> Result<(PathBuf, PathBuf)> {
        std::fs::create_dir_all(output_dir)?;

        let text_path = output_dir.join(format!("Overall_{}_metrics.txt", stem));
        report.save_text(&text_path)?;
        info!("Saved report to {:?}", text_path);

        let json_path = output_dir.join(format!("Overall_{}_metrics.json", stem));
        report.save_json(&json_path)?;
        info!("Saved results to {:?}", json_path);

        Ok((text_path, json_path))
    }
}

fn log_stats(model: &str, stats: &AggregationStats) {
    info!(
        "{}: {} records scored, {} categories",
        model,
        stats.total.count,
        stats.by_category.len()
    );
    if stats.skipped > 0 {
        warn!("{}: skipped {} records without a usable score", model, stats.skipped);
    }
}
