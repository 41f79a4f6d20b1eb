use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::Path;

/// One judged sample as written by the judging stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    /// Video identifier
    #[serde(default)]
    pub video_id: String,
    /// Ground-truth emotion label, before alias resolution
    #[serde(default = "unknown_label", deserialize_with = "label_text")]
    pub ground_truth: String,
    /// Raw judge output; `None` when the judge produced nothing
    #[serde(rename = "score", default, deserialize_with = "score_text")]
    pub score_text: Option<String>,
    /// Judge prompt tokens, passed through for usage reporting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u64>,
    /// Judge completion tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u64>,
}

/// Label used when a record carries no ground truth
pub const UNKNOWN_LABEL: &str = "unknown";

fn unknown_label() -> String {
    UNKNOWN_LABEL.to_string()
}

#[cfg(test)]
impl ScoredRecord {
    pub fn new(video_id: &str, ground_truth: &str, score_text: &str) -> Self {
        Self {
            video_id: video_id.to_string(),
            ground_truth: ground_truth.to_string(),
            score_text: Some(score_text.to_string()),
            input_tokens: None,
            output_tokens: None,
        }
    }

    pub fn with_tokens(mut self, input_tokens: u64, output_tokens: u64) -> Self {
        self.input_tokens = Some(input_tokens);
        self.output_tokens = Some(output_tokens);
        self
    }
}

/// Judges sometimes emit structured output instead of a string; stringify it.
fn score_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

/// Labels are only needed for the category breakdown, so a bad one must not
/// fail the whole file. Non-string labels are stringified, null becomes "unknown".
fn label_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => unknown_label(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

/// Parse a JSON array of judged records
pub fn parse_records(content: &str) -> Result<Vec<ScoredRecord>> {
    let records: Vec<ScoredRecord> =
        serde_json::from_str(content).context("Failed to parse judged records")?;
    Ok(records)
}

/// Load a results file written by the judging stage
pub async fn load_records<P: AsRef<Path>>(path: P) -> Result<Vec<ScoredRecord>> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path)
        .await
        .context(format!("Failed to read results file: {:?}", path))?;

    let records =
        parse_records(&content).context(format!("Invalid results file: {:?}", path))?;
    tracing::debug!("Loaded {} records from {:?}", records.len(), path);

    Ok(records)
}
