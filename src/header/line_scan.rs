//! Line-scan header strategy
//!
//! The header is a single `publisher/YYYY年M月D日/第N版` line among the first
//! few lines; the headline sits a fixed number of lines below a section
//! marker.

use lazy_static::lazy_static;
use regex::Regex;

use super::types::{parse_number, HeaderFields, ParsedText, ParserOptions};

lazy_static! {
    // Digits are ASCII or full-width; other Unicode digit scripts do not match
    static ref HEADER_RE: Regex = Regex::new(
        r"(.*?)/([0-9０-９]+)年([0-9０-９]{1,2})月([0-9０-９]{1,2})日/第([0-9０-９]+)版"
    )
    .expect("header pattern is valid");
}

/// Find the header line within the scan window
pub fn scan_header(lines: &[&str], scan_lines: usize) -> Option<HeaderFields> {
    lines.iter().take(scan_lines).enumerate().find_map(|(index, line)| {
        let caps = HEADER_RE.captures(line)?;
        log::debug!("Header line {} matched: {:?}", index, &caps[0]);
        Some(HeaderFields {
            publisher: Some(caps[1].to_string()),
            year: parse_number(&caps[2]),
            month: parse_number(&caps[3]),
            day: parse_number(&caps[4]),
            volume: Some(caps[5].to_string()),
        })
    })
}

/// Headline: the line `offset` lines below the first marker line that has one
pub fn find_title(lines: &[&str], marker: &str, offset: usize) -> Option<String> {
    lines
        .iter()
        .enumerate()
        .find(|(i, line)| line.contains(marker) && i + offset < lines.len())
        .map(|(i, _)| lines[i + offset].trim().to_string())
}

/// Run the line-scan strategy. The body text is always the full input.
pub fn parse(text: &str, options: &ParserOptions) -> ParsedText {
    let lines: Vec<&str> = text.split('\n').collect();
    let header = scan_header(&lines, options.header_scan_lines);
    let title = find_title(&lines, &options.title_marker, options.title_offset);
    if header.is_none() {
        log::debug!(
            "No header line in the first {} lines",
            options.header_scan_lines
        );
    }

    ParsedText {
        header_found: header.is_some(),
        header: header.unwrap_or_default(),
        title,
        text: text.to_string(),
    }
}
