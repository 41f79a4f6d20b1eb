use crate::scoring::{parse_alpha, Alpha, StepPolicy};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// COT-METRICS: chain-of-thought scoring for emotion recognition evaluations
///
/// Turns judge annotations (`<score>Step 1: 1/1, ...</score>`) into recognition,
/// reasoning and CoT scores, per emotion category and across evaluation subsets.
#[derive(Parser, Debug)]
#[command(name = "cot-metrics")]
#[command(version = "0.1.0")]
#[command(about = "Aggregate judge step scores into emotion recognition metrics")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute metrics for a single judged results file
    Score(ScoreArgs),

    /// Compute pooled metrics across every subset configured for a model
    Overall(OverallArgs),

    /// Parse a single judge annotation and show its step scores
    Parse(ParseArgs),

    /// Generate a sample metrics config file
    Init(InitArgs),
}

#[derive(Parser, Debug)]
pub struct ScoreArgs {
    /// Judged results file (JSON array)
    #[arg(short, long)]
    pub input_json: PathBuf,

    /// Name of the evaluated model
    #[arg(short, long, default_value = "")]
    pub model_name: String,

    /// Weight of the recognition score in the CoT score
    #[arg(long, default_value = "0.5", value_parser = parse_alpha)]
    pub alpha: Alpha,

    /// Key categories by raw ground-truth label (skip alias resolution)
    #[arg(long)]
    pub raw_labels: bool,

    /// Skip the per-category breakdown
    #[arg(long)]
    pub no_categories: bool,

    /// Handling of step ratios outside [0, 1]
    #[arg(long, value_enum, default_value_t = StepPolicy::Clamp)]
    pub step_policy: StepPolicy,

    /// Write the text report here
    #[arg(short, long)]
    pub output_txt: Option<PathBuf>,

    /// Write the JSON report here
    #[arg(long)]
    pub output_json: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct OverallArgs {
    /// Path to the metrics config file (YAML)
    #[arg(short, long)]
    pub config: PathBuf,

    /// Only compute metrics for this model (default: every configured model)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Override the configured alpha
    #[arg(long, value_parser = parse_alpha)]
    pub alpha: Option<Alpha>,

    /// Override the output directory
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Show what would be aggregated without reading any results
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Parser, Debug)]
pub struct ParseArgs {
    /// Judge annotation, e.g. "<score>Step 1: 1/1, Step 2: 0/1</score>"
    pub text: String,

    /// Weight of the recognition score in the CoT score
    #[arg(long, default_value = "0.5", value_parser = parse_alpha)]
    pub alpha: Alpha,
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Output path for the config file
    #[arg(short, long, default_value = "metrics-config.yaml")]
    pub output: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_args_defaults() {
        let args = Args::try_parse_from(["cot-metrics", "score", "-i", "results.json"]).unwrap();
        match args.command {
            Command::Score(score) => {
                assert_eq!(score.alpha.value(), 0.5);
                assert_eq!(score.step_policy, StepPolicy::Clamp);
                assert!(!score.raw_labels);
                assert!(score.output_txt.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_alpha_is_rejected() {
        let result =
            Args::try_parse_from(["cot-metrics", "score", "-i", "r.json", "--alpha", "1.5"]);
        assert!(result.is_err());

        let result = Args::try_parse_from(["cot-metrics", "parse", "x", "--alpha", "-0.2"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_overall_args() {
        let args = Args::try_parse_from([
            "cot-metrics",
            "overall",
            "-c",
            "suite.yaml",
            "--model",
            "AffectGPT",
            "--alpha",
            "0.7",
        ])
        .unwrap();
        match args.command {
            Command::Overall(overall) => {
                assert_eq!(overall.model.as_deref(), Some("AffectGPT"));
                assert_eq!(overall.alpha.map(Alpha::value), Some(0.7));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
