//! Single-document extraction: convert, then parse

use std::path::Path;
use std::sync::Arc;

use crate::converter::{LayoutConverter, TextConverter};
use crate::header::{HeaderParser, ParserOptions};
use crate::layout::LayoutParams;
use crate::pdf::DocumentError;
use crate::record::ExtractionRecord;

/// Converter plus header parser for one document at a time.
///
/// Holds no mutable state, so one extractor can serve many threads.
#[derive(Clone)]
pub struct NewspaperExtractor {
    converter: Arc<dyn TextConverter>,
    parser: HeaderParser,
}

impl std::fmt::Debug for NewspaperExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewspaperExtractor")
            .field("parser", &self.parser)
            .finish_non_exhaustive()
    }
}

impl Default for NewspaperExtractor {
    fn default() -> Self {
        Self::new(LayoutParams::default(), ParserOptions::default())
    }
}

impl NewspaperExtractor {
    /// Layout-analysis converter with the given tolerances
    pub fn new(layout: LayoutParams, parser: ParserOptions) -> Self {
        Self::with_converter(Arc::new(LayoutConverter::new(layout)), parser)
    }

    /// Use a custom converter
    pub fn with_converter(converter: Arc<dyn TextConverter>, parser: ParserOptions) -> Self {
        Self {
            converter,
            parser: HeaderParser::new(parser),
        }
    }

    pub fn parser(&self) -> &HeaderParser {
        &self.parser
    }

    /// Extract one record. Only conversion failures are errors; missing
    /// fields are left absent.
    pub fn extract(&self, path: &Path) -> Result<ExtractionRecord, DocumentError> {
        let text = self.converter.convert(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        log::debug!("{}: converted {} chars", filename, text.chars().count());

        let parsed = self.parser.parse(&text);
        Ok(ExtractionRecord::from_parsed(filename, parsed))
    }
}
