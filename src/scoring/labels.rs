use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Standard synonym table for ground-truth emotion labels
pub const STANDARD_ALIASES: [(&str, &str); 5] = [
    ("angry", "anger"),
    ("disgusted", "disgust"),
    ("happy", "happiness"),
    ("sad", "sadness"),
    ("surprised", "surprise"),
];

/// Maps raw ground-truth labels onto canonical category keys.
///
/// Labels without an alias pass through unchanged. A disabled normalizer keys
/// every record by its raw label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelNormalizer {
    enabled: bool,
    aliases: BTreeMap<String, String>,
}

impl LabelNormalizer {
    /// Normalizer applying the standard alias table
    pub fn standard() -> Self {
        Self {
            enabled: true,
            aliases: STANDARD_ALIASES
                .iter()
                .map(|(raw, canonical)| (raw.to_string(), canonical.to_string()))
                .collect(),
        }
    }

    /// Normalizer that keeps labels as written
    pub fn passthrough() -> Self {
        Self {
            enabled: false,
            aliases: BTreeMap::new(),
        }
    }

    /// Build from config: the standard table plus any extra aliases, or passthrough
    pub fn from_settings(enabled: bool, extra: &BTreeMap<String, String>) -> Self {
        if !enabled {
            return Self::passthrough();
        }
        Self::standard().with_aliases(extra.clone())
    }

    pub fn with_aliases(mut self, extra: BTreeMap<String, String>) -> Self {
        self.aliases.extend(extra);
        self
    }

    #[cfg(test)]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn normalize(&self, raw: &str) -> String {
        if !self.enabled {
            return raw.to_string();
        }
        self.aliases
            .get(raw)
            .cloned()
            .unwrap_or_else(|| raw.to_string())
    }
}

impl Default for LabelNormalizer {
    fn default() -> Self {
        Self::standard()
    }
}
