//! PDF to text conversion
//!
//! [`TextConverter`] is the seam between document decoding and header
//! parsing; [`LayoutConverter`] is the layout-analysis implementation.

use std::path::Path;

use lopdf::Document;

use crate::layout::{analyze_page, render_page, LayoutParams, TextChar};
use crate::pdf::{decrypt_with_empty_password, extract_pages, DocumentError};

/// Turns a document into one text blob
pub trait TextConverter: Send + Sync {
    /// Convert the file at `path`
    fn convert(&self, path: &Path) -> Result<String, DocumentError>;
}

/// Layout-aware converter: glyphs are grouped into lines and boxes and the
/// boxes are emitted in reading order, page after page.
#[derive(Debug, Clone, Default)]
pub struct LayoutConverter {
    params: LayoutParams,
}

impl LayoutConverter {
    pub fn new(params: LayoutParams) -> Self {
        Self {
            params: params.clamped(),
        }
    }

    pub fn params(&self) -> &LayoutParams {
        &self.params
    }

    /// Convert an in-memory PDF. Encrypted files are opened with the empty
    /// user password.
    pub fn convert_bytes(&self, data: &[u8]) -> Result<String, DocumentError> {
        let mut doc = Document::load_mem(data)?;
        decrypt_with_empty_password(&mut doc)?;
        self.convert_document(&doc)
    }

    /// Convert an already loaded document
    pub fn convert_document(&self, doc: &Document) -> Result<String, DocumentError> {
        let pages = extract_pages(doc)?;
        Ok(self.render_pages(&pages))
    }

    fn render_pages(&self, pages: &[Vec<TextChar>]) -> String {
        let mut out = String::new();
        for (index, chars) in pages.iter().enumerate() {
            let boxes = analyze_page(chars, &self.params);
            log::debug!(
                "Page {}: {} glyphs in {} text boxes",
                index + 1,
                chars.len(),
                boxes.len()
            );
            out.push_str(&render_page(&boxes));
        }
        out
    }
}

impl TextConverter for LayoutConverter {
    fn convert(&self, path: &Path) -> Result<String, DocumentError> {
        if !path.exists() {
            return Err(DocumentError::NotFound(path.to_path_buf()));
        }
        let data = std::fs::read(path)?;
        self.convert_bytes(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::BBox;

    fn row(text: &str, x0: f64, y0: f64) -> Vec<TextChar> {
        text.chars()
            .enumerate()
            .map(|(i, c)| {
                let x = x0 + i as f64 * 10.0;
                TextChar::new(c.to_string(), BBox::new(x, y0, x + 10.0, y0 + 10.0))
            })
            .collect()
    }

    #[test]
    fn test_render_pages_separates_pages() {
        let converter = LayoutConverter::default();
        let pages = vec![row("第一页", 0.0, 100.0), row("第二页", 0.0, 100.0)];
        assert_eq!(
            converter.render_pages(&pages),
            "第一页\n\n\x0c第二页\n\n\x0c"
        );
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let converter = LayoutConverter::default();
        let result = converter.convert(Path::new("/definitely/not/here.pdf"));
        assert!(matches!(result, Err(DocumentError::NotFound(_))));
    }

    #[test]
    fn test_garbage_bytes_fail() {
        let converter = LayoutConverter::default();
        assert!(converter.convert_bytes(b"this is not a pdf").is_err());
    }

    #[test]
    fn test_new_clamps_params() {
        let params = LayoutParams {
            line_overlap: 5.0,
            ..LayoutParams::default()
        };
        assert_eq!(LayoutConverter::new(params).params().line_overlap, 1.0);
    }
}
