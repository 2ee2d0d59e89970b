//! newspaper-pdf CLI entry point

use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use newspaper_pdf::cli::{Cli, Commands, ExtractArgs, InspectArgs, TextArgs};
use newspaper_pdf::{
    discover_pdfs, write_csv, AppConfig, BatchReport, BatchRunner, LayoutConverter,
    NewspaperExtractor, ProgressCallback, TextConverter,
};

/// Progress bar driven by batch callbacks
struct CliProgress {
    bar: ProgressBar,
    verbose: bool,
}

impl CliProgress {
    fn new(enabled: bool, verbose: bool) -> Self {
        let bar = if enabled {
            ProgressBar::new(0)
        } else {
            ProgressBar::hidden()
        };
        bar.set_style(
            ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar, verbose }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressCallback for CliProgress {
    fn on_batch_start(&self, total: usize) {
        self.bar.set_length(total as u64);
    }

    fn on_file_start(&self, path: &Path) {
        let name = file_name(path);
        if self.verbose {
            self.bar.println(format!("Processing: {name}"));
        }
        self.bar.set_message(name);
    }

    fn on_file_complete(&self, _path: &Path, _ok: bool) {
        self.bar.inc(1);
    }

    fn on_debug(&self, message: &str) {
        if self.verbose {
            self.bar.println(message);
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(cli.log_level().to_string()),
    )
    .format_timestamp(None)
    .init();

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let mut config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;

    match &cli.command {
        Commands::Extract(args) => {
            args.apply_to(&mut config);
            run_extract(args, &config, cli.verbose > 0)
        }
        Commands::Text(args) => run_text(args, &config),
        Commands::Inspect(args) => run_inspect(args, &mut config),
    }
}

fn run_extract(args: &ExtractArgs, config: &AppConfig, verbose: bool) -> Result<ExitCode> {
    if !args.input_dir.exists() {
        eprintln!(
            "Error: Input path '{}' does not exist",
            args.input_dir.display()
        );
        return Ok(ExitCode::FAILURE);
    }

    let files = discover_pdfs(&args.input_dir)?;
    if files.is_empty() {
        println!("No PDF files found in {}", args.input_dir.display());
        return Ok(ExitCode::SUCCESS);
    }
    println!("Found {} PDF files", files.len());

    let extractor = NewspaperExtractor::new(config.layout.clone(), config.parser.clone());
    let runner = BatchRunner::new(extractor, config.output.jobs);
    let progress = CliProgress::new(config.output.progress, verbose);
    let report = runner.run(&files, &progress)?;
    progress.finish();

    if !report.records.is_empty() {
        write_csv(&config.output.path, &report.records)
            .with_context(|| format!("writing {}", config.output.path.display()))?;
        println!(
            "\nExtraction complete! Data saved to: {}",
            config.output.path.display()
        );
    }

    print_summary(&report);
    Ok(ExitCode::SUCCESS)
}

fn print_summary(report: &BatchReport) {
    println!("\nSummary:");
    println!("Total files processed: {}", report.total);
    println!("Successfully processed: {}", report.succeeded());
    println!("Errors encountered: {}", report.failed());
    println!("Unique publishers: {}", report.unique_publishers());
    if let Some(((y0, m0), (y1, m1))) = report.date_range() {
        println!("Date range: {y0}-{m0} to {y1}-{m1}");
    }

    if !report.failures.is_empty() {
        println!("\nErrors encountered:");
        for failure in &report.failures {
            println!("- {}: {}", failure.filename, failure.error);
        }
    }
}

fn run_text(args: &TextArgs, config: &AppConfig) -> Result<ExitCode> {
    let converter = LayoutConverter::new(config.layout.clone());
    let text = converter
        .convert(&args.input)
        .with_context(|| format!("converting {}", args.input.display()))?;
    print!("{text}");
    Ok(ExitCode::SUCCESS)
}

fn run_inspect(args: &InspectArgs, config: &mut AppConfig) -> Result<ExitCode> {
    if let Some(strategy) = args.strategy {
        config.parser.strategy = strategy;
    }
    let extractor = NewspaperExtractor::new(config.layout.clone(), config.parser.clone());
    let record = extractor
        .extract(&args.input)
        .with_context(|| format!("extracting {}", args.input.display()))?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(ExitCode::SUCCESS)
}
