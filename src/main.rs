mod cli;
mod error;
mod eval;
mod scoring;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Args, Command, MetricsConfig};
use eval::{MetricsReport, MetricsRunner, Pipeline};
use scoring::{parser, reduce, summarize, CategoryAccumulator, LabelNormalizer};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let _subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Score(score_args) => {
            score_file(score_args).await?;
        }
        Command::Overall(overall_args) => {
            score_overall(overall_args).await?;
        }
        Command::Parse(parse_args) => {
            parse_annotation(parse_args);
        }
        Command::Init(init_args) => {
            generate_sample_config(init_args)?;
        }
    }

    Ok(())
}

async fn score_file(args: cli::ScoreArgs) -> Result<()> {
    let normalizer = if args.raw_labels {
        LabelNormalizer::passthrough()
    } else {
        LabelNormalizer::standard()
    };
    let mut pipeline = Pipeline::new(normalizer, args.step_policy);
    if args.no_categories {
        pipeline = pipeline.without_categories();
    }

    let runner = MetricsRunner::new(pipeline, args.alpha);
    let report = runner.run_file(&args.model_name, &args.input_json).await?;

    if args.output_txt.is_none() && args.output_json.is_none() {
        print!("{}", report.generate_report());
        return Ok(());
    }

    print_summary(&report);

    if let Some(path) = &args.output_txt {
        report
            .save_text(path)
            .context(format!("Failed to write report: {:?}", path))?;
        println!("Metrics saved to {:?}", path);
    }
    if let Some(path) = &args.output_json {
        report
            .save_json(path)
            .context(format!("Failed to write report: {:?}", path))?;
        println!("Metrics saved to {:?}", path);
    }

    Ok(())
}

async fn score_overall(args: cli::OverallArgs) -> Result<()> {
    info!("Loading metrics config from {:?}", args.config);

    let config = MetricsConfig::load(&args.config)?;
    let suites = config.select(args.model.as_deref())?;
    let alpha = args.alpha.unwrap_or(config.settings.alpha);
    let output_dir = args
        .output_dir
        .unwrap_or_else(|| config.settings.output_dir.clone());

    if args.dry_run {
        println!("Dry run mode - no results will be read");
        println!("\nConfiguration:");
        println!("  Name: {}", config.name);
        println!("  Alpha: {:.2}", alpha.value());
        println!("  Normalize labels: {}", config.settings.normalize_labels);
        println!("  Step policy: {}", config.settings.step_policy);
        println!("  Output: {:?}", output_dir);
        println!("\nModels:");
        for suite in &suites {
            println!("  - {} ({} subsets)", suite.name, suite.subsets.len());
            for subset in &suite.subsets {
                println!("      {}: {:?}", subset.name, subset.path);
            }
        }
        return Ok(());
    }

    let runner = MetricsRunner::new(config.settings.pipeline(), alpha)
        .with_subset_breakdown(config.settings.subset_breakdown);

    for suite in suites {
        let report = runner.run_suite(suite).await?;
        print_summary(&report);

        let (text_path, _) = MetricsRunner::save_report(&report, &output_dir, &suite.file_stem())?;
        println!("\nMetrics saved to: {:?}", text_path);
    }

    Ok(())
}

fn print_summary(report: &MetricsReport) {
    println!("\n{}", "=".repeat(60));
    println!("METRICS: {}", report.model);
    println!("{}", "=".repeat(60));
    println!("  Scored records: {}", report.overall.count);
    println!("  Skipped records: {}", report.skipped);
    println!(
        "  Recognition: {:.1}  Reasoning: {:.1}  CoT: {:.1}  (alpha {:.1})",
        100.0 * report.overall.recognition_score,
        100.0 * report.overall.reasoning_score,
        100.0 * report.overall.cot_score,
        report.alpha.value()
    );
    println!("  Avg steps: {:.1}", report.overall.avg_steps);

    for subset in &report.subsets {
        println!(
            "    {:<12} n={:<6} CoT {:.1}",
            subset.name,
            subset.metrics.count,
            100.0 * subset.metrics.cot_score
        );
    }
}

fn parse_annotation(args: cli::ParseArgs) {
    let Some(scores) = parser::parse(&args.text) else {
        println!("No <score>...</score> span found; the record would be skipped");
        return;
    };

    println!("Steps: {}", scores.len());
    for (i, score) in scores.iter().enumerate() {
        println!("  Step {}: {:.3}", i + 1, score);
    }

    let metrics = reduce(&scores);
    let mut acc = CategoryAccumulator::default();
    acc.fold(&metrics);
    let scope = summarize(&acc, args.alpha);

    println!("Recognition: {:.3}", metrics.recognition);
    println!("Reasoning: {:.3}", metrics.reasoning);
    println!("CoT (alpha {:.2}): {:.3}", args.alpha.value(), scope.cot_score);
}

fn generate_sample_config(args: cli::InitArgs) -> Result<()> {
    let config = MetricsConfig::sample();

    config.save(&args.output)?;
    println!("Generated sample config at: {:?}", args.output);

    Ok(())
}
