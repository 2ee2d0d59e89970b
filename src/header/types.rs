//! Header parser core types
//!
//! Strategy selection, parser options and the fields a strategy fills in.

use serde::{Deserialize, Serialize};

// ============================================================
// Constants
// ============================================================

/// Number of leading lines searched for the header line
pub const DEFAULT_HEADER_SCAN_LINES: usize = 10;

/// Section marker ("industry/population") that precedes the headline
pub const DEFAULT_TITLE_MARKER: &str = "行业/人口";

/// Lines between the marker and the headline
pub const DEFAULT_TITLE_OFFSET: usize = 2;

/// Upper clamp for the header scan window
pub const MAX_HEADER_SCAN_LINES: usize = 1000;

// ============================================================
// Strategy
// ============================================================

/// How the header and headline are located in converted text
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum HeaderStrategy {
    /// One `publisher/YYYY年M月D日/第N版` line near the top, headline after a section marker
    #[default]
    LineScan,
    /// Blank-line separated paragraphs: header, headline, then body
    ParagraphSplit,
    /// Line scan, falling back to paragraphs when no header line is found
    Auto,
}

impl HeaderStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeaderStrategy::LineScan => "line-scan",
            HeaderStrategy::ParagraphSplit => "paragraph-split",
            HeaderStrategy::Auto => "auto",
        }
    }
}

impl std::fmt::Display for HeaderStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================
// Options
// ============================================================

/// Header parser options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserOptions {
    pub strategy: HeaderStrategy,
    /// Lines searched for the header by the line scan
    pub header_scan_lines: usize,
    /// Literal text marking the line before the headline
    pub title_marker: String,
    /// Distance from the marker line to the headline line
    pub title_offset: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            strategy: HeaderStrategy::default(),
            header_scan_lines: DEFAULT_HEADER_SCAN_LINES,
            title_marker: DEFAULT_TITLE_MARKER.to_string(),
            title_offset: DEFAULT_TITLE_OFFSET,
        }
    }
}

impl ParserOptions {
    pub fn builder() -> ParserOptionsBuilder {
        ParserOptionsBuilder::default()
    }
}

/// Builder for ParserOptions
#[derive(Debug, Default)]
pub struct ParserOptionsBuilder {
    options: ParserOptions,
}

impl ParserOptionsBuilder {
    #[must_use]
    pub fn strategy(mut self, strategy: HeaderStrategy) -> Self {
        self.options.strategy = strategy;
        self
    }

    /// Set the header scan window (clamped to 1..=1000)
    #[must_use]
    pub fn header_scan_lines(mut self, lines: usize) -> Self {
        self.options.header_scan_lines = lines.clamp(1, MAX_HEADER_SCAN_LINES);
        self
    }

    #[must_use]
    pub fn title_marker(mut self, marker: impl Into<String>) -> Self {
        self.options.title_marker = marker.into();
        self
    }

    #[must_use]
    pub fn title_offset(mut self, offset: usize) -> Self {
        self.options.title_offset = offset;
        self
    }

    #[must_use]
    pub fn build(self) -> ParserOptions {
        self.options
    }
}

// ============================================================
// Results
// ============================================================

/// Fields parsed from the header line or block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderFields {
    pub publisher: Option<String>,
    pub year: Option<u32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    /// Page/edition number exactly as printed
    pub volume: Option<String>,
}

impl HeaderFields {
    /// True when no header field was found
    pub fn is_empty(&self) -> bool {
        self.publisher.is_none()
            && self.year.is_none()
            && self.month.is_none()
            && self.day.is_none()
            && self.volume.is_none()
    }
}

/// Everything a strategy extracts from one document's text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedText {
    pub header: HeaderFields,
    pub title: Option<String>,
    pub text: String,
    /// Whether the strategy located a header at all
    pub header_found: bool,
}

/// Parse a digit run, leaving the field absent on overflow.
/// Full-width digits are accepted.
pub(crate) fn parse_number(digits: &str) -> Option<u32> {
    let ascii: String = digits
        .chars()
        .map(|c| match c {
            '０'..='９' => char::from(b'0' + (c as u32 - '０' as u32) as u8),
            _ => c,
        })
        .collect();
    match ascii.parse::<u32>() {
        Ok(value) => Some(value),
        Err(e) => {
            log::debug!("Discarding unparsable number {:?}: {}", digits, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = ParserOptions::default();
        assert_eq!(opts.strategy, HeaderStrategy::LineScan);
        assert_eq!(opts.header_scan_lines, 10);
        assert_eq!(opts.title_marker, "行业/人口");
        assert_eq!(opts.title_offset, 2);
    }

    #[test]
    fn test_builder_clamps_scan_lines() {
        let opts = ParserOptions::builder().header_scan_lines(0).build();
        assert_eq!(opts.header_scan_lines, 1);
        let opts = ParserOptions::builder().header_scan_lines(5000).build();
        assert_eq!(opts.header_scan_lines, MAX_HEADER_SCAN_LINES);
    }

    #[test]
    fn test_builder_chain() {
        let opts = ParserOptions::builder()
            .strategy(HeaderStrategy::Auto)
            .title_marker("要闻")
            .title_offset(1)
            .build();
        assert_eq!(opts.strategy, HeaderStrategy::Auto);
        assert_eq!(opts.title_marker, "要闻");
        assert_eq!(opts.title_offset, 1);
    }

    #[test]
    fn test_strategy_serde_names() {
        let json = serde_json::to_string(&HeaderStrategy::ParagraphSplit).unwrap();
        assert_eq!(json, "\"paragraph-split\"");
        let parsed: HeaderStrategy = serde_json::from_str("\"auto\"").unwrap();
        assert_eq!(parsed, HeaderStrategy::Auto);
        assert_eq!(HeaderStrategy::LineScan.to_string(), "line-scan");
    }

    #[test]
    fn test_parse_number_overflow() {
        assert_eq!(parse_number("2020"), Some(2020));
        assert_eq!(parse_number("99999999999999999999"), None);
        assert_eq!(parse_number("２０２０"), Some(2020));
    }

    #[test]
    fn test_header_fields_is_empty() {
        assert!(HeaderFields::default().is_empty());
        let fields = HeaderFields {
            month: Some(3),
            ..Default::default()
        };
        assert!(!fields.is_empty());
    }
}
