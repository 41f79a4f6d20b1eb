use crate::error::MetricsError;
use crate::eval::Pipeline;
use crate::scoring::{Alpha, LabelNormalizer, StepPolicy};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Evaluation subsets produced for every model, in reporting order
const SAMPLE_SUBSETS: [(&str, &str); 8] = [
    ("ER-Lab", "ER_Lab"),
    ("ER-Wild", "ER_SL_Wild"),
    ("ML-ER", "ML_ER"),
    ("FG-ER", "FG_ER"),
    ("Noise-ER", "Noise_ER"),
    ("IR", "IR"),
    ("SA", "SA"),
    ("FG-SA", "FG_SA"),
];

/// Configuration for computing metrics over judged results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Name of this metrics suite
    pub name: String,

    /// Description of the suite
    #[serde(default)]
    pub description: String,

    /// Global settings
    #[serde(default)]
    pub settings: MetricsSettings,

    /// Evaluated models and their result files
    pub models: Vec<ModelSuite>,
}

/// Result files for one evaluated model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSuite {
    /// Display name of the model
    pub name: String,

    /// File stem for saved reports (default: derived from the name)
    #[serde(default)]
    pub output_name: Option<String>,

    /// Judged result files, one per evaluation subset, pooled in this order
    pub subsets: Vec<SubsetSource>,
}

/// One judged results file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubsetSource {
    /// Subset name (e.g. "ER-Lab")
    pub name: String,

    /// Path to the JSON results file
    pub path: PathBuf,
}

impl ModelSuite {
    /// File stem used for this model's reports
    pub fn file_stem(&self) -> String {
        match &self.output_name {
            Some(name) => name.clone(),
            None => self
                .name
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
                .collect(),
        }
    }
}

/// Global metrics settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSettings {
    /// Weight of the recognition score in the CoT score
    #[serde(default)]
    pub alpha: Alpha,

    /// Resolve label synonyms (angry -> anger, ...) before grouping
    #[serde(default = "default_normalize_labels")]
    pub normalize_labels: bool,

    /// Extra label aliases on top of the standard table
    #[serde(default)]
    pub label_aliases: BTreeMap<String, String>,

    /// Handling of step ratios outside [0, 1]
    #[serde(default)]
    pub step_policy: StepPolicy,

    /// Break pooled metrics down by emotion category
    #[serde(default)]
    pub category_breakdown: bool,

    /// Report each subset next to the pooled metrics
    #[serde(default = "default_subset_breakdown")]
    pub subset_breakdown: bool,

    /// Output directory for reports
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            alpha: Alpha::default(),
            normalize_labels: default_normalize_labels(),
            label_aliases: BTreeMap::new(),
            step_policy: StepPolicy::default(),
            category_breakdown: false,
            subset_breakdown: default_subset_breakdown(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_normalize_labels() -> bool {
    true
}

fn default_subset_breakdown() -> bool {
    true
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./metrics-results")
}

impl MetricsSettings {
    /// Build the record pipeline these settings describe
    pub fn pipeline(&self) -> Pipeline {
        let normalizer = LabelNormalizer::from_settings(self.normalize_labels, &self.label_aliases);
        let pipeline = Pipeline::new(normalizer, self.step_policy);
        if self.category_breakdown {
            pipeline
        } else {
            pipeline.without_categories()
        }
    }
}

impl MetricsConfig {
    /// Load configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .context(format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: MetricsConfig =
            serde_yaml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;

        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .context(format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Every model needs at least one subset
    pub fn validate(&self) -> Result<(), MetricsError> {
        match self.models.iter().find(|m| m.subsets.is_empty()) {
            Some(model) => Err(MetricsError::EmptySuite(model.name.clone())),
            None => Ok(()),
        }
    }

    /// Look up a model by name
    pub fn model(&self, name: &str) -> Result<&ModelSuite, MetricsError> {
        self.models
            .iter()
            .find(|m| m.name == name)
            .ok_or_else(|| MetricsError::UnknownModel(name.to_string()))
    }

    /// Models selected on the command line, or all of them
    pub fn select(&self, name: Option<&str>) -> Result<Vec<&ModelSuite>, MetricsError> {
        match name {
            Some(name) => Ok(vec![self.model(name)?]),
            None => Ok(self.models.iter().collect()),
        }
    }

    /// Generate a sample configuration
    pub fn sample() -> Self {
        let model = |name: &str, key: &str| ModelSuite {
            name: name.to_string(),
            output_name: Some(key.to_string()),
            subsets: SAMPLE_SUBSETS
                .iter()
                .map(|(subset, prefix)| SubsetSource {
                    name: subset.to_string(),
                    path: PathBuf::from(format!(
                        "eval_cot/{}/results/{}_{}_eval.json",
                        subset, prefix, key
                    )),
                })
                .collect(),
        };

        Self {
            name: "Overall CoT Metrics".to_string(),
            description: "Pooled recognition and reasoning scores across all evaluation subsets"
                .to_string(),
            settings: MetricsSettings::default(),
            models: vec![
                model("AffectGPT", "affectgpt"),
                model("R1-Omni-0.5B", "r1_omni_0.5b"),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_config() {
        let config = MetricsConfig::sample();
        assert_eq!(config.models.len(), 2);
        assert_eq!(config.models[0].subsets.len(), 8);
        assert_eq!(
            config.models[0].subsets[1].path,
            PathBuf::from("eval_cot/ER-Wild/results/ER_SL_Wild_affectgpt_eval.json")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_serialize_deserialize() {
        let config = MetricsConfig::sample();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: MetricsConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.name, config.name);
        assert_eq!(parsed.models[1].subsets.len(), 8);
        assert_eq!(parsed.settings.step_policy, StepPolicy::Clamp);
    }

    #[test]
    fn test_minimal_config_defaults() {
        let yaml = r#"
name: minimal
models:
  - name: Qwen2-VL-7B
    subsets:
      - name: ER-Lab
        path: lab.json
"#;
        let config: MetricsConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.settings.alpha.value(), 0.5);
        assert!(config.settings.normalize_labels);
        assert!(!config.settings.category_breakdown);
        assert!(config.settings.subset_breakdown);
        assert_eq!(config.models[0].file_stem(), "Qwen2-VL-7B");
    }

    #[test]
    fn test_invalid_alpha_in_config() {
        let yaml = r#"
name: bad
settings:
  alpha: 1.5
models: []
"#;
        assert!(serde_yaml::from_str::<MetricsConfig>(yaml).is_err());
    }

    #[test]
    fn test_model_lookup() {
        let config = MetricsConfig::sample();
        assert_eq!(config.model("AffectGPT").unwrap().file_stem(), "affectgpt");
        assert_eq!(
            config.model("nope").unwrap_err(),
            MetricsError::UnknownModel("nope".to_string())
        );
        assert_eq!(config.select(None).unwrap().len(), 2);
        assert_eq!(config.select(Some("R1-Omni-0.5B")).unwrap().len(), 1);
    }

    #[test]
    fn test_empty_suite_is_rejected() {
        let mut config = MetricsConfig::sample();
        config.models[0].subsets.clear();
        assert_eq!(
            config.validate(),
            Err(MetricsError::EmptySuite("AffectGPT".to_string()))
        );
    }

    #[test]
    fn test_load_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.yaml");
        MetricsConfig::sample().save(&path).unwrap();

        let loaded = MetricsConfig::load(&path).unwrap();
        assert_eq!(loaded.models[0].name, "AffectGPT");
    }

    #[test]
    fn test_file_stem_sanitizes_name() {
        let suite = ModelSuite {
            name: "Video LLaMA/2".to_string(),
            output_name: None,
            subsets: vec![],
        };
        assert_eq!(suite.file_stem(), "Video_LLaMA_2");
    }
}
