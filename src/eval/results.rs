use super::aggregator::{AggregationStats, UsageSummary};
use crate::scoring::{summarize, Alpha, ScopeReport};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metrics for one evaluation subset inside an overall report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubsetReport {
    /// Subset name (e.g. "ER-Lab")
    pub name: String,
    /// Total scope of the subset
    pub metrics: ScopeReport,
    /// Records skipped in this subset
    pub skipped: usize,
}

/// Complete metrics report for one model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsReport {
    /// Unique report ID
    pub report_id: String,
    /// Evaluated model name
    pub model: String,
    /// Recognition weight used for the CoT score
    pub alpha: Alpha,
    /// Generation time
    pub generated_at: DateTime<Utc>,
    /// Metrics over every parsed record
    pub overall: ScopeReport,
    /// Per-category metrics, keyed by canonical label
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub categories: BTreeMap<String, ScopeReport>,
    /// Per-subset metrics, in source order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subsets: Vec<SubsetReport>,
    /// Records without a usable score
    pub skipped: usize,
    /// Steps altered by the out-of-range policy
    pub adjusted_steps: usize,
    /// Judge token usage
    pub usage: UsageSummary,
}

impl MetricsReport {
    pub fn new(report_id: &str, model: &str, alpha: Alpha, stats: &AggregationStats) -> Self {
        Self {
            report_id: report_id.to_string(),
            model: model.to_string(),
            alpha,
            generated_at: Utc::now(),
            overall: summarize(&stats.total, alpha),
            categories: stats
                .by_category
                .iter()
                .map(|(category, acc)| (category.clone(), summarize(acc, alpha)))
                .collect(),
            subsets: Vec::new(),
            skipped: stats.skipped,
            adjusted_steps: stats.adjusted_steps,
            usage: stats.usage,
        }
    }

    /// Add a subset breakdown entry
    pub fn add_subset(&mut self, name: &str, stats: &AggregationStats) {
        self.subsets.push(SubsetReport {
            name: name.to_string(),
            metrics: summarize(&stats.total, self.alpha),
            skipped: stats.skipped,
        });
    }

    /// Save the report as JSON
    pub fn save_json(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Save the human-readable report
    pub fn save_text(&self, path: &std::path::Path) -> anyhow::Result<()> {
        std::fs::write(path, self.generate_report())?;
        Ok(())
    }

    /// Generate the human-readable report; scores are shown as percentages.
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str(&format!("Model: {}\n", self.model));
        report.push_str(&format!("Alpha: {:.1}\n\n", self.alpha.value()));

        report.push_str("=== Overall Metrics ===\n");
        report.push_str(&format!("Total Count: {}\n", self.overall.count));
        write_scope(&mut report, "", &self.overall);
        if self.skipped > 0 {
            report.push_str(&format!("Skipped Records: {}\n", self.skipped));
        }
        if self.adjusted_steps > 0 {
            report.push_str(&format!("Adjusted Steps: {}\n", self.adjusted_steps));
        }
        report.push('\n');

        if !self.categories.is_empty() {
            report.push_str("=== Category Metrics ===\n");
            for (category, scope) in &self.categories {
                report.push_str(&format!("Category: {}\n", category));
                write_scope(&mut report, "  ", scope);
                report.push_str(&format!("{}\n", "-".repeat(40)));
            }
            report.push('\n');
        }

        if !self.subsets.is_empty() {
            report.push_str("=== Subset Metrics ===\n");
            for subset in &self.subsets {
                report.push_str(&format!("Subset: {}\n", subset.name));
                report.push_str(&format!("  Count: {}\n", subset.metrics.count));
                write_scope(&mut report, "  ", &subset.metrics);
                report.push_str(&format!("{}\n", "-".repeat(40)));
            }
            report.push('\n');
        }

        if self.usage.records > 0 {
            report.push_str("=== Judge Usage ===\n");
            report.push_str(&format!("Records: {}\n", self.usage.records));
            report.push_str(&format!("Input Tokens: {}\n", self.usage.input_tokens));
            report.push_str(&format!("Output Tokens: {}\n", self.usage.output_tokens));
            report.push_str(&format!(
                "Avg Input Tokens: {:.1}\n",
                self.usage.avg_input_tokens()
            ));
            report.push_str(&format!(
                "Avg Output Tokens: {:.1}\n",
                self.usage.avg_output_tokens()
            ));
        }

        report
    }
}

fn write_scope(report: &mut String, indent: &str, scope: &ScopeReport) {
    report.push_str(&format!(
        "{}Recognition Score: {:.1}\n",
        indent,
        100.0 * scope.recognition_score
    ));
    report.push_str(&format!(
        "{}Reasoning Score: {:.1}\n",
        indent,
        100.0 * scope.reasoning_score
    ));
    report.push_str(&format!("{}CoT Score: {:.1}\n", indent, 100.0 * scope.cot_score));
    report.push_str(&format!("{}Avg Steps: {:.1}\n", indent, scope.avg_steps));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::aggregator::Pipeline;
    use crate::eval::records::ScoredRecord;

    fn sample_stats() -> AggregationStats {
        let records = vec![
            ScoredRecord::new("a", "anger", "<score>Step 1: 1/1, Step 2: 1/1</score>"),
            ScoredRecord::new("b", "angry", "<score>Step 1: 0/1</score>"),
            ScoredRecord::new(
                "c",
                "happy",
                "<score>Step 1: 1/1, Step 2: 0/1, Step 3: 1/1</score>",
            ),
            ScoredRecord::new("d", "happy", "judge failed"),
        ];
        Pipeline::default().fold(&records)
    }

    #[test]
    fn test_report_scopes() {
        let alpha = Alpha::new(0.5).unwrap();
        let report = MetricsReport::new("r-1", "TestModel", alpha, &sample_stats());

        assert_eq!(report.overall.count, 3);
        assert_eq!(report.skipped, 1);
        let categories: Vec<&String> = report.categories.keys().collect();
        assert_eq!(categories, vec!["anger", "happiness"]);
        assert_eq!(report.categories["anger"].count, 2);
        assert_eq!(report.categories["anger"].cot_score, 0.5);
    }

    #[test]
    fn test_text_report_format() {
        let alpha = Alpha::new(0.5).unwrap();
        let report = MetricsReport::new("r-1", "TestModel", alpha, &sample_stats());
        let text = report.generate_report();

        assert!(text.starts_with("Model: TestModel\nAlpha: 0.5\n\n=== Overall Metrics ===\n"));
        assert!(text.contains("Total Count: 3\n"));
        // recognition: (1 + 0 + 1) / 3, reasoning: (1 + 0 + 0.5) / 3
        assert!(text.contains("Recognition Score: 66.7\n"));
        assert!(text.contains("Reasoning Score: 50.0\n"));
        assert!(text.contains("CoT Score: 58.3\n"));
        assert!(text.contains("Avg Steps: 2.0\n"));
        assert!(text.contains("Skipped Records: 1\n"));
        assert!(text.contains("Category: anger\n  Recognition Score: 50.0\n"));
        assert!(text.contains("Category: happiness\n  Recognition Score: 100.0\n"));
        assert!(!text.contains("=== Subset Metrics ==="));
        assert!(!text.contains("=== Judge Usage ==="));
    }

    #[test]
    fn test_subsets_and_usage_sections() {
        let pipeline = Pipeline::default().without_categories();
        let lab = pipeline.fold(&[
            ScoredRecord::new("a", "happy", "<score>Step 1: 1/1</score>").with_tokens(100, 10)
        ]);
        let wild = pipeline.fold(&[ScoredRecord::new("b", "sad", "<score>Step 1: 0/1</score>")]);

        let mut overall = lab.clone();
        overall.merge(&wild);

        let mut report = MetricsReport::new("r-2", "M", Alpha::new(1.0).unwrap(), &overall);
        report.add_subset("ER-Lab", &lab);
        report.add_subset("ER-Wild", &wild);
        let text = report.generate_report();

        assert!(report.categories.is_empty());
        assert!(!text.contains("=== Category Metrics ==="));
        assert!(text.contains("Subset: ER-Lab\n  Count: 1\n  Recognition Score: 100.0\n"));
        assert!(text.contains("Subset: ER-Wild\n  Count: 1\n  Recognition Score: 0.0\n"));
        assert!(text.contains("=== Judge Usage ===\nRecords: 1\nInput Tokens: 100\n"));
    }

    #[test]
    fn test_save_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = MetricsReport::new("r-3", "M", Alpha::new(0.3).unwrap(), &sample_stats());
        report.save_json(&path).unwrap();

        let parsed: MetricsReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.report_id, "r-3");
        assert_eq!(parsed.alpha.value(), 0.3);
        assert_eq!(parsed.overall.count, report.overall.count);
        assert!((parsed.overall.cot_score - report.overall.cot_score).abs() < 1e-9);
        assert_eq!(parsed.categories.len(), 2);
    }
}
