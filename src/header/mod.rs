//! Header and headline parsing
//!
//! Two strategies turn converted page text into header fields, a headline
//! and body text:
//!
//! - [`HeaderStrategy::LineScan`]: a compact `publisher/YYYY年M月D日/第N版`
//!   line near the top and a headline below a section marker
//! - [`HeaderStrategy::ParagraphSplit`]: blank-line separated header block,
//!   headline and body, tolerating spaces inside the date
//!
//! [`HeaderStrategy::Auto`] runs the line scan first and falls back to the
//! paragraph split when no header line is found.
//!
//! A field that cannot be parsed is left absent; parsing never fails.

pub mod line_scan;
pub mod paragraph;
mod types;

pub use types::{
    HeaderFields, HeaderStrategy, ParsedText, ParserOptions, ParserOptionsBuilder,
    DEFAULT_HEADER_SCAN_LINES, DEFAULT_TITLE_MARKER, DEFAULT_TITLE_OFFSET,
};

/// Header parser configured with one strategy
#[derive(Debug, Clone, Default)]
pub struct HeaderParser {
    options: ParserOptions,
}

impl HeaderParser {
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Parse converted text with the configured strategy
    pub fn parse(&self, text: &str) -> ParsedText {
        match self.options.strategy {
            HeaderStrategy::LineScan => line_scan::parse(text, &self.options),
            HeaderStrategy::ParagraphSplit => paragraph::parse(text),
            HeaderStrategy::Auto => {
                let primary = line_scan::parse(text, &self.options);
                if primary.header_found {
                    return primary;
                }
                let fallback = paragraph::parse(text);
                if fallback.header_found {
                    log::debug!("No header line found, using paragraph split");
                    fallback
                } else {
                    primary
                }
            }
        }
    }
}
