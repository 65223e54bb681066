use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chatset::{
    dataset_hash, format_dataset, load_records, preflight, read_dataset, serialize_dataset,
    split_records, write_dataset, BpeTokenizer, CharTokenizer, ColumnMap, FormatConfig,
    PreflightConfig, PreflightReport, SplitConfig, Tokenizer,
};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::config::PrepConfig;

#[derive(Parser, Debug)]
#[command(name = "prep", about = "Prepare and check chat fine-tuning datasets.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert a labeled review CSV into train/validation JSONL files
    Format(FormatArgs),

    /// Validate JSONL files and report token statistics and training cost
    Check(CheckArgs),
}

#[derive(Args, Debug)]
pub struct FormatArgs {
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long, default_value = "data/train.jsonl")]
    pub train: PathBuf,

    #[arg(long, default_value = "data/validation.jsonl")]
    pub validation: PathBuf,

    #[arg(long, default_value = "Review")]
    pub text_column: String,

    #[arg(long, default_value = "Rating")]
    pub rating_column: String,

    #[arg(long, default_value = "Sentiment")]
    pub sentiment_column: String,

    /// Overrides PREP_SYSTEM_PROMPT
    #[arg(long)]
    pub system_prompt: Option<String>,

    /// Overrides PREP_VALIDATION_FRACTION
    #[arg(long)]
    pub validation_fraction: Option<f64>,

    /// Overrides PREP_SEED; without a seed the input order is kept
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Write the reports as JSON to this path
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Overrides PREP_MODEL
    #[arg(long)]
    pub model: Option<String>,

    /// Overrides PREP_MAX_TOKENS
    #[arg(long)]
    pub max_tokens: Option<usize>,

    /// Count 4 characters per token instead of loading the BPE tables
    #[arg(long)]
    pub stub_tokenizer: bool,
}

impl Cli {
    pub fn run(self, cfg: &PrepConfig) -> Result<()> {
        match self.command {
            Command::Format(args) => run_format(args, cfg),
            Command::Check(args) => run_check(args, cfg),
        }
    }
}

fn run_format(args: FormatArgs, cfg: &PrepConfig) -> Result<()> {
    let columns = ColumnMap {
        text: args.text_column,
        label_a: args.rating_column,
        label_b: args.sentiment_column,
    };
    let records = load_records(&args.input, &columns)
        .with_context(|| format!("Failed to load records from {}", args.input.display()))?;

    let mut format_cfg = FormatConfig::default();
    if let Some(p) = args.system_prompt.or_else(|| cfg.system_prompt.clone()) {
        format_cfg.system_prompt = p;
    }
    let split_cfg = SplitConfig {
        validation_fraction: args.validation_fraction.unwrap_or(cfg.validation_fraction),
        seed: args.seed.or(cfg.seed),
    };

    let (train, validation) = split_records(records, &split_cfg)?;
    let train = format_dataset(&train, &format_cfg)?;
    let validation = format_dataset(&validation, &format_cfg)?;

    write_output(&args.train, &train)?;
    write_output(&args.validation, &validation)?;
    Ok(())
}

fn write_output(path: &Path, dataset: &[chatset::Exchange]) -> Result<()> {
    write_dataset(path, dataset).with_context(|| format!("Failed to write {}", path.display()))?;
    let hash = dataset_hash(&serialize_dataset(dataset)?);
    println!("{}: {} examples (blake3 {hash})", path.display(), dataset.len());
    Ok(())
}

fn run_check(args: CheckArgs, cfg: &PrepConfig) -> Result<()> {
    let tok: Box<dyn Tokenizer> = if args.stub_tokenizer {
        Box::new(CharTokenizer::new(4))
    } else {
        let model = args.model.as_deref().unwrap_or(&cfg.model);
        Box::new(BpeTokenizer::for_model(model).with_context(|| format!("No tokenizer for model {model}"))?)
    };

    let mut pre_cfg = PreflightConfig::default();
    pre_cfg.stats.max_tokens_per_example = args.max_tokens.unwrap_or(cfg.max_tokens);

    let mut reports = serde_json::Map::new();
    for path in &args.files {
        info!(path = %path.display(), "checking");
        let dataset = read_dataset(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let report = preflight(&dataset, tok.as_ref(), &pre_cfg)
            .with_context(|| format!("Pre-flight failed for {}", path.display()))?;

        print_report(path, &report);
        reports.insert(path.display().to_string(), serde_json::to_value(&report)?);
    }

    if let Some(out) = args.json {
        let json = serde_json::to_string_pretty(&reports)?;
        std::fs::write(&out, json).with_context(|| format!("Failed to write {}", out.display()))?;
        info!(path = %out.display(), "report written");
    }
    Ok(())
}

fn print_report(path: &Path, r: &PreflightReport) {
    println!("\n=== {} ===", path.display());
    println!("Examples: {}  (fingerprint {})", r.examples, r.fingerprint);

    if r.is_clean() {
        println!("No errors found");
    } else {
        println!("Issues: {}", r.issues.len());
        for issue in &r.issues {
            println!("  {issue}");
        }
    }
    println!("Missing system: {}  missing user: {}  duplicates: {}", r.n_missing_system, r.n_missing_user, r.n_duplicates);

    let rows = [
        ("messages per example", &r.stats.messages_summary),
        ("tokens per example", &r.stats.total_summary),
        ("assistant tokens", &r.stats.assistant_summary),
    ];
    for (label, s) in rows {
        println!(
            "{label:>22}: min {:.0}  max {:.0}  mean {:.1}  median {:.1}  p5 {:.1}  p95 {:.1}",
            s.min, s.max, s.mean, s.median, s.p5, s.p95
        );
    }

    println!(
        "{} examples may be over the {} token limit, they will be truncated during fine-tuning",
        r.stats.n_too_long, r.stats.max_tokens_per_example
    );
    println!(
        "~{} billable tokens per epoch, {} epochs, ~{} tokens total",
        r.estimate.billable_tokens, r.estimate.epochs, r.estimate.total_billable_tokens
    );
}
