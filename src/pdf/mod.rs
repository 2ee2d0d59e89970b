//! PDF object access
//!
//! Fonts, ToUnicode CMaps and the content-stream interpreter that turns a
//! page into positioned glyphs. Object parsing itself is done by `lopdf`.

pub mod cmap;
pub mod font;
pub mod interpreter;

use std::path::PathBuf;

use lopdf::{Dictionary, Document, Object};
use thiserror::Error;

pub use cmap::ToUnicode;
pub use font::PdfFont;
pub use interpreter::{extract_pages, PageInterpreter};

// ============================================================
// Error Types
// ============================================================

/// Failure to read a document
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Encrypted PDF cannot be opened without a password")]
    Encrypted,

    #[error("Document has no pages")]
    NoPages,

    #[error("Page {page}: {message}")]
    Page { page: u32, message: String },
}

pub type Result<T> = std::result::Result<T, DocumentError>;

// ============================================================
// Decryption
// ============================================================

/// Decrypt with the empty user password, which opens files that only carry
/// an owner password. Unencrypted documents are left untouched.
pub fn decrypt_with_empty_password(doc: &mut Document) -> Result<()> {
    if !doc.is_encrypted() {
        return Ok(());
    }
    doc.decrypt("").map_err(|e| {
        log::debug!("Decryption with the empty password failed: {}", e);
        DocumentError::Encrypted
    })?;
    log::debug!("Decrypted document with the empty password");
    Ok(())
}

// ============================================================
// Object helpers
// ============================================================

/// Follow a reference, returning the object itself otherwise
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Dictionary entry with references followed
pub(crate) fn get<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    dict.get(key).ok().map(|obj| resolve(doc, obj))
}

/// Dictionary entry that is (or points to) a dictionary; streams yield their dictionary
pub(crate) fn get_dict<'a>(
    doc: &'a Document,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Dictionary> {
    match get(doc, dict, key)? {
        Object::Dictionary(d) => Some(d),
        Object::Stream(s) => Some(&s.dict),
        _ => None,
    }
}

pub(crate) fn get_array<'a>(
    doc: &'a Document,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Vec<Object>> {
    match get(doc, dict, key)? {
        Object::Array(items) => Some(items),
        _ => None,
    }
}

pub(crate) fn get_name<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a [u8]> {
    match get(doc, dict, key)? {
        Object::Name(name) => Some(name.as_slice()),
        _ => None,
    }
}

pub(crate) fn get_number(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<f64> {
    get(doc, dict, key).and_then(number)
}

/// Numeric value of an integer or real object
pub(crate) fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}
