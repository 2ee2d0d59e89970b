//! CLI argument definitions

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::config::AppConfig;
use crate::header::HeaderStrategy;

/// Newspaper PDF metadata extractor
#[derive(Debug, Parser)]
#[command(name = "newspaper-pdf", version, about, long_about = None)]
pub struct Cli {
    /// Verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (default: <config dir>/newspaper-pdf/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Extract metadata from every PDF in a directory into a CSV file
    Extract(ExtractArgs),
    /// Print the converted text of one PDF
    Text(TextArgs),
    /// Print the extracted record of one PDF as JSON
    Inspect(InspectArgs),
}

#[derive(Debug, Args)]
pub struct ExtractArgs {
    /// Directory containing PDF files
    pub input_dir: PathBuf,

    /// Output CSV file [default: newspaper_data.csv]
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Header parsing strategy
    #[arg(long, value_enum)]
    pub strategy: Option<HeaderStrategy>,

    /// Parallel workers (0 = one per CPU)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

impl ExtractArgs {
    /// Apply command-line overrides on top of file configuration
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(output) = &self.output {
            config.output.path = output.clone();
        }
        if let Some(strategy) = self.strategy {
            config.parser.strategy = strategy;
        }
        if let Some(jobs) = self.jobs {
            config.output.jobs = jobs;
        }
        if self.no_progress {
            config.output.progress = false;
        }
    }
}

#[derive(Debug, Args)]
pub struct TextArgs {
    /// PDF file
    pub input: PathBuf,
}

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// PDF file
    pub input: PathBuf,

    /// Header parsing strategy
    #[arg(long, value_enum)]
    pub strategy: Option<HeaderStrategy>,
}

impl Cli {
    /// Log level filter for the verbosity count
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_extract_defaults() {
        let cli = Cli::try_parse_from(["newspaper-pdf", "extract", "pdfs"]).unwrap();
        assert_eq!(cli.verbose, 0);
        let Commands::Extract(args) = cli.command else {
            panic!("expected extract");
        };
        assert_eq!(args.input_dir, PathBuf::from("pdfs"));
        assert!(args.output.is_none());
        assert!(args.strategy.is_none());
        assert!(!args.no_progress);
    }

    #[test]
    fn test_extract_overrides_config() {
        let cli = Cli::try_parse_from([
            "newspaper-pdf",
            "extract",
            "pdfs",
            "-o",
            "out.csv",
            "--strategy",
            "paragraph-split",
            "--jobs",
            "0",
            "--no-progress",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.log_level(), log::LevelFilter::Debug);
        let Commands::Extract(args) = cli.command else {
            panic!("expected extract");
        };
        let mut config = AppConfig::default();
        args.apply_to(&mut config);
        assert_eq!(config.output.path, PathBuf::from("out.csv"));
        assert_eq!(config.parser.strategy, HeaderStrategy::ParagraphSplit);
        assert_eq!(config.output.jobs, 0);
        assert!(!config.output.progress);
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        let result = Cli::try_parse_from(["newspaper-pdf", "extract", "pdfs", "--strategy", "x"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_inspect_args() {
        let cli =
            Cli::try_parse_from(["newspaper-pdf", "inspect", "a.pdf", "--strategy", "auto"]).unwrap();
        let Commands::Inspect(args) = cli.command else {
            panic!("expected inspect");
        };
        assert_eq!(args.strategy, Some(HeaderStrategy::Auto));
    }
}
