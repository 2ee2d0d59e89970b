//! CSV export of extraction records
//!
//! UTF-8 with a byte-order mark so spreadsheet tools pick the right
//! encoding. Absent fields are written as empty cells.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::ExtractionRecord;

/// UTF-8 byte-order mark
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Column order of the exported table
pub const COLUMNS: [&str; 8] = [
    "filename", "title", "publisher", "year", "month", "day", "volume", "text",
];

/// CSV export error types
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// One table row; field order is the column order
#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    filename: String,
    title: Option<String>,
    publisher: Option<String>,
    year: Option<u32>,
    month: Option<u32>,
    day: Option<u32>,
    volume: Option<String>,
    text: String,
}

impl From<&ExtractionRecord> for CsvRow {
    fn from(r: &ExtractionRecord) -> Self {
        Self {
            filename: r.filename.clone(),
            title: r.title.clone(),
            publisher: r.publisher.clone(),
            year: r.year,
            month: r.month,
            day: r.day,
            volume: r.volume.clone(),
            text: r.text.clone(),
        }
    }
}

impl From<CsvRow> for ExtractionRecord {
    fn from(row: CsvRow) -> Self {
        Self {
            filename: row.filename,
            publisher: row.publisher,
            year: row.year,
            month: row.month,
            day: row.day,
            volume: row.volume,
            title: row.title,
            text: row.text,
        }
    }
}

/// Write records to any writer, BOM first
pub fn write_records<W: Write>(out: W, records: &[ExtractionRecord]) -> Result<(), ExportError> {
    let mut out = out;
    out.write_all(UTF8_BOM)?;
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(out);
    writer.write_record(COLUMNS)?;
    for record in records {
        writer.serialize(CsvRow::from(record))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write records to a CSV file
pub fn write_csv(path: &Path, records: &[ExtractionRecord]) -> Result<(), ExportError> {
    let file = BufWriter::new(File::create(path)?);
    write_records(file, records)?;
    log::info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

/// Read records back from CSV data (BOM optional)
pub fn read_records<R: Read>(mut input: R) -> Result<Vec<ExtractionRecord>, ExportError> {
    let mut data = Vec::new();
    input.read_to_end(&mut data)?;
    let body = data.strip_prefix(UTF8_BOM).unwrap_or(&data);

    let mut reader = csv::Reader::from_reader(body);
    reader
        .deserialize::<CsvRow>()
        .map(|row| Ok(ExtractionRecord::from(row?)))
        .collect()
}

/// Read records back from a CSV file
pub fn read_csv(path: &Path) -> Result<Vec<ExtractionRecord>, ExportError> {
    read_records(File::open(path)?)
}
