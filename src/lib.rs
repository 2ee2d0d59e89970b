//! newspaper-pdf - Chinese newspaper PDF metadata extraction
//!
//! Converts newspaper PDFs into reading-order text with a layout analyzer,
//! then parses the page header (publisher, date, page number) and headline
//! into an [`ExtractionRecord`]. Batches of files are exported to CSV.
//!
//! # Modules
//!
//! - [`layout`]: glyph/line/box grouping and reading order
//! - [`pdf`]: fonts, CMaps and the content-stream interpreter
//! - [`converter`]: PDF to text
//! - [`header`]: header and headline strategies
//! - [`extract`]: one file to one record
//! - [`batch`]: directory runs, progress and summary statistics
//! - [`export`]: CSV output
//! - [`config`]: TOML configuration
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use newspaper_pdf::{LayoutParams, NewspaperExtractor, ParserOptions};
//!
//! let extractor = NewspaperExtractor::new(LayoutParams::default(), ParserOptions::default());
//! let record = extractor.extract(Path::new("page.pdf"))?;
//! println!("{:?} {:?}-{:?}", record.publisher, record.year, record.month);
//! # Ok::<(), newspaper_pdf::DocumentError>(())
//! ```

pub mod batch;
pub mod cli;
pub mod config;
pub mod converter;
pub mod export;
pub mod extract;
pub mod header;
pub mod layout;
pub mod pdf;
pub mod record;

pub use batch::{
    discover_pdfs, BatchError, BatchFailure, BatchReport, BatchRunner, ProgressCallback,
    SilentProgress,
};
pub use config::{AppConfig, ConfigError, OutputConfig};
pub use converter::{LayoutConverter, TextConverter};
pub use export::{read_csv, write_csv, ExportError};
pub use extract::NewspaperExtractor;
pub use header::{HeaderFields, HeaderParser, HeaderStrategy, ParsedText, ParserOptions};
pub use layout::{LayoutParams, LayoutParamsBuilder};
pub use pdf::DocumentError;
pub use record::ExtractionRecord;
