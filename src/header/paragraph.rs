//! Paragraph-split header strategy
//!
//! The converted text is cut into paragraphs at blank lines. The first
//! paragraph is the header block, the second the headline and the rest the
//! body. Date and page numbers may carry spaces around the digits
//! (`2023 年 5 月 1 日`, `第 3 版`).

use lazy_static::lazy_static;
use regex::Regex;

use super::types::{parse_number, HeaderFields, ParsedText};

lazy_static! {
    static ref PARAGRAPH_BREAK_RE: Regex =
        Regex::new(r"\n\s*\n").expect("paragraph pattern is valid");
    static ref PART_SEPARATOR_RE: Regex =
        Regex::new(r"[\s/]+").expect("separator pattern is valid");
    // Digits are ASCII or full-width; other Unicode digit scripts do not match
    static ref YEAR_RE: Regex =
        Regex::new(r"([0-9０-９]+)\s*年").expect("year pattern is valid");
    static ref MONTH_RE: Regex =
        Regex::new(r"([0-9０-９]+)\s*月").expect("month pattern is valid");
    static ref DAY_RE: Regex =
        Regex::new(r"([0-9０-９]+)\s*日").expect("day pattern is valid");
    static ref VOLUME_RE: Regex =
        Regex::new(r"第\s*([0-9０-９]+)\s*版").expect("volume pattern is valid");
}

/// Trimmed, non-empty paragraphs in order
pub fn split_paragraphs(text: &str) -> Vec<&str> {
    PARAGRAPH_BREAK_RE
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Split a header block on `/` when it has one, otherwise on runs of
/// whitespace and slashes
pub fn split_header_parts(header: &str) -> Vec<&str> {
    let parts: Vec<&str> = if header.contains('/') {
        header.split('/').collect()
    } else {
        PART_SEPARATOR_RE.split(header).collect()
    };
    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// First capture of `re` across the parts, in order
fn first_capture<'a>(parts: &[&'a str], re: &Regex) -> Option<&'a str> {
    parts
        .iter()
        .find_map(|part| re.captures(part).and_then(|caps| caps.get(1)).map(|m| m.as_str()))
}

/// Parse the header block into fields
pub fn parse_header_block(header: &str) -> HeaderFields {
    let parts = split_header_parts(header);
    log::debug!("Header parts: {:?}", parts);

    let year = first_capture(&parts, &YEAR_RE);
    let month = first_capture(&parts, &MONTH_RE);
    let day = first_capture(&parts, &DAY_RE);
    let volume = first_capture(&parts, &VOLUME_RE);
    log::debug!(
        "Header matches: year={:?} month={:?} day={:?} volume={:?}",
        year,
        month,
        day,
        volume
    );

    HeaderFields {
        publisher: parts.first().map(|p| p.to_string()),
        year: year.and_then(parse_number),
        month: month.and_then(parse_number),
        day: day.and_then(parse_number),
        volume: volume.map(str::to_string),
    }
}

/// Run the paragraph strategy.
///
/// The body is the third paragraph onwards joined by newlines; with fewer
/// than three paragraphs it stays the full input.
pub fn parse(text: &str) -> ParsedText {
    let paragraphs = split_paragraphs(text);
    log::debug!("Found {} paragraphs", paragraphs.len());

    let header = paragraphs
        .first()
        .map(|block| parse_header_block(block))
        .unwrap_or_default();
    let title = paragraphs.get(1).map(|p| p.to_string());
    let body = if paragraphs.len() >= 3 {
        paragraphs[2..].join("\n")
    } else {
        text.to_string()
    };

    ParsedText {
        header_found: !header.is_empty(),
        header,
        title,
        text: body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spaced_header_example() {
        let text = "报社/2023 年 5 月 1 日/第 3 版\n\nHeadline Text\n\nBody para one\n\nBody para two";
        let parsed = parse(text);
        assert_eq!(parsed.header.publisher.as_deref(), Some("报社"));
        assert_eq!(parsed.header.year, Some(2023));
        assert_eq!(parsed.header.month, Some(5));
        assert_eq!(parsed.header.day, Some(1));
        assert_eq!(parsed.header.volume.as_deref(), Some("3"));
        assert_eq!(parsed.title.as_deref(), Some("Headline Text"));
        assert_eq!(parsed.text, "Body para one\nBody para two");
    }

    #[test]
    fn test_split_paragraphs_collapses_blank_runs() {
        let paragraphs = split_paragraphs("A\n\nB\n \n\n C \n\n\nD\n\n\x0c");
        assert_eq!(paragraphs, vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_header_split_on_whitespace_without_slash() {
        let fields = parse_header_block("光明日报  2021年 7月 1日 第 2 版");
        assert_eq!(fields.publisher.as_deref(), Some("光明日报"));
        assert_eq!(fields.year, Some(2021));
        assert_eq!(fields.month, Some(7));
        assert_eq!(fields.day, Some(1));
        // "第" and "2" land in separate parts, so the volume pattern misses
        assert_eq!(fields.volume, None);
    }

    #[test]
    fn test_unspaced_header_also_matches() {
        let fields = parse_header_block("人民日报/2020年3月5日/第4版");
        assert_eq!(fields.year, Some(2020));
        assert_eq!(fields.volume.as_deref(), Some("4"));
    }

    #[test]
    fn test_two_paragraphs_keep_full_text() {
        let text = "报社/2023年5月1日\n\n标题";
        let parsed = parse(text);
        assert_eq!(parsed.title.as_deref(), Some("标题"));
        assert_eq!(parsed.text, text);
        assert_eq!(parsed.header.volume, None);
    }

    #[test]
    fn test_empty_text() {
        let parsed = parse("");
        assert!(!parsed.header_found);
        assert_eq!(parsed.title, None);
        assert_eq!(parsed.text, "");
    }

    #[test]
    fn test_header_without_date_still_has_publisher() {
        let parsed = parse("只有报名\n\n标题\n\n正文");
        assert_eq!(parsed.header.publisher.as_deref(), Some("只有报名"));
        assert!(parsed.header_found);
        assert_eq!(parsed.header.year, None);
        assert_eq!(parsed.text, "正文");
    }

    #[test]
    fn test_digit_scripts() {
        let fields = parse_header_block("报社/２０２３ 年 ５ 月 １ 日/第 ３ 版");
        assert_eq!(fields.year, Some(2023));
        assert_eq!(fields.month, Some(5));
        assert_eq!(fields.day, Some(1));

        let fields = parse_header_block("报社/٢٠٢٣年٥月١日/第٣版");
        assert_eq!(fields.publisher.as_deref(), Some("报社"));
        assert_eq!(fields.year, None);
        assert_eq!(fields.month, None);
        assert_eq!(fields.day, None);
        assert_eq!(fields.volume, None);
    }
}
