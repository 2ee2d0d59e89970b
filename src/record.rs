//! Extraction record

use serde::{Deserialize, Serialize};

use crate::header::ParsedText;

/// Metadata extracted from one newspaper PDF
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    /// File name of the source PDF (no directory)
    pub filename: String,
    pub publisher: Option<String>,
    pub year: Option<u32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    /// Page/edition number as printed
    pub volume: Option<String>,
    pub title: Option<String>,
    /// Body text; the full converted text unless a strategy narrowed it
    pub text: String,
}

impl ExtractionRecord {
    /// Build a record from parser output
    pub fn from_parsed(filename: impl Into<String>, parsed: ParsedText) -> Self {
        let ParsedText {
            header,
            title,
            text,
            ..
        } = parsed;
        Self {
            filename: filename.into(),
            publisher: header.publisher,
            year: header.year,
            month: header.month,
            day: header.day,
            volume: header.volume,
            title,
            text,
        }
    }

    /// `(year, month)` when both are known
    pub fn year_month(&self) -> Option<(u32, u32)> {
        Some((self.year?, self.month?))
    }
}
