//! ToUnicode CMap parsing
//!
//! Handles the `bfchar`/`bfrange` mapping sections and `codespacerange`,
//! which tells how many bytes make up one character code.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TOKEN_RE: Regex =
        Regex::new(r"<([0-9A-Fa-f\s]*)>|\[|\]").expect("token pattern is valid");
}

/// Mapping from character codes to Unicode text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToUnicode {
    map: HashMap<u32, String>,
    /// Distinct code lengths in bytes from `codespacerange`, ascending
    code_lengths: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Hex(Vec<u8>),
    Open,
    Close,
}

impl ToUnicode {
    /// Parse a decompressed CMap stream. Malformed entries are skipped.
    pub fn parse(data: &[u8]) -> Self {
        let content = String::from_utf8_lossy(data);
        let mut cmap = ToUnicode::default();

        for section in sections(&content, "begincodespacerange", "endcodespacerange") {
            let tokens = tokenize(section);
            for pair in tokens.chunks(2) {
                if let [Token::Hex(lo), Token::Hex(_)] = pair {
                    if !cmap.code_lengths.contains(&lo.len()) && !lo.is_empty() {
                        cmap.code_lengths.push(lo.len());
                    }
                }
            }
        }
        cmap.code_lengths.sort_unstable();

        for section in sections(&content, "beginbfchar", "endbfchar") {
            let tokens = tokenize(section);
            for pair in tokens.chunks(2) {
                if let [Token::Hex(src), Token::Hex(dst)] = pair {
                    if let Some(text) = decode_utf16be(dst) {
                        log::trace!("ToUnicode bfchar: {:02X?} -> {:?}", src, text);
                        cmap.insert(src, text);
                    }
                }
            }
        }

        for section in sections(&content, "beginbfrange", "endbfrange") {
            cmap.parse_bfrange(&tokenize(section));
        }

        if cmap.code_lengths.is_empty() {
            // No codespace declared: guess from the widest source code seen
            let width = if cmap.map.keys().any(|&code| code > 0xFF) { 2 } else { 1 };
            cmap.code_lengths.push(width);
        }

        log::debug!(
            "Parsed ToUnicode CMap: {} mappings, code lengths {:?}",
            cmap.map.len(),
            cmap.code_lengths
        );
        cmap
    }

    fn parse_bfrange(&mut self, tokens: &[Token]) {
        let mut i = 0;
        while i + 2 < tokens.len() {
            let (lo, hi) = match (&tokens[i], &tokens[i + 1]) {
                (Token::Hex(lo), Token::Hex(hi)) => (code_value(lo), code_value(hi)),
                _ => {
                    i += 1;
                    continue;
                }
            };
            if hi < lo || hi - lo > 0xFFFF {
                log::warn!("Skipping oversized bfrange {:X}..{:X}", lo, hi);
                i += 3;
                continue;
            }
            match &tokens[i + 2] {
                Token::Hex(dst) => {
                    for (offset, code) in (lo..=hi).enumerate() {
                        let text = increment_last(dst, offset).and_then(|d| decode_utf16be(&d));
                        if let Some(text) = text {
                            self.map.insert(code, text);
                        }
                    }
                    i += 3;
                }
                Token::Open => {
                    let mut j = i + 3;
                    let mut code = lo;
                    while j < tokens.len() && tokens[j] != Token::Close {
                        if let Token::Hex(dst) = &tokens[j] {
                            if code <= hi {
                                if let Some(text) = decode_utf16be(dst) {
                                    self.map.insert(code, text);
                                }
                            }
                            code = code.saturating_add(1);
                        }
                        j += 1;
                    }
                    i = j + 1;
                }
                Token::Close => i += 3,
            }
        }
    }

    fn insert(&mut self, src: &[u8], text: String) {
        self.map.insert(code_value(src), text);
    }

    /// Look up one character code
    pub fn get(&self, code: u32) -> Option<&str> {
        self.map.get(&code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Split a string operand into character codes using the codespace widths.
    ///
    /// The shortest width whose code is mapped wins; otherwise the widest
    /// declared width is consumed.
    pub fn split_codes(&self, bytes: &[u8]) -> Vec<u32> {
        let widest = self.code_lengths.last().copied().unwrap_or(1);
        let mut codes = Vec::new();
        let mut pos = 0;
        while pos < bytes.len() {
            let mut taken = None;
            for &len in &self.code_lengths {
                if pos + len <= bytes.len() {
                    let code = code_value(&bytes[pos..pos + len]);
                    if self.map.contains_key(&code) {
                        taken = Some((code, len));
                        break;
                    }
                }
            }
            let (code, len) = taken.unwrap_or_else(|| {
                let len = widest.min(bytes.len() - pos);
                (code_value(&bytes[pos..pos + len]), len)
            });
            codes.push(code);
            pos += len;
        }
        codes
    }
}

fn sections<'a>(content: &'a str, begin: &str, end: &str) -> Vec<&'a str> {
    let mut found = Vec::new();
    let mut rest = content;
    while let Some(start) = rest.find(begin) {
        let after = &rest[start + begin.len()..];
        match after.find(end) {
            Some(stop) => {
                found.push(&after[..stop]);
                rest = &after[stop + end.len()..];
            }
            None => break,
        }
    }
    found
}

fn tokenize(section: &str) -> Vec<Token> {
    TOKEN_RE
        .captures_iter(section)
        .filter_map(|caps| match caps.get(1) {
            Some(hex) => parse_hex(hex.as_str()).map(Token::Hex),
            None => match &caps[0] {
                "[" => Some(Token::Open),
                _ => Some(Token::Close),
            },
        })
        .collect()
}

fn parse_hex(raw: &str) -> Option<Vec<u8>> {
    let mut digits: Vec<u8> = raw
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    if digits.len() % 2 == 1 {
        digits.push(b'0');
    }
    digits
        .chunks(2)
        .map(|pair| {
            let text = std::str::from_utf8(pair).ok()?;
            u8::from_str_radix(text, 16).ok()
        })
        .collect()
}

fn code_value(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b))
}

/// Add `offset` to the last byte of a destination string (bfrange semantics)
fn increment_last(dst: &[u8], offset: usize) -> Option<Vec<u8>> {
    let mut out = dst.to_vec();
    let last = out.last_mut()?;
    let sum = usize::from(*last) + offset;
    if sum > 0xFF {
        // Carry into the previous byte, as a 16-bit unit
        let len = out.len();
        if len < 2 {
            return None;
        }
        let unit = ((u32::from(out[len - 2]) << 8) | u32::from(out[len - 1])) + offset as u32;
        if unit > 0xFFFF {
            return None;
        }
        out[len - 2] = (unit >> 8) as u8;
        out[len - 1] = (unit & 0xFF) as u8;
    } else {
        *last = sum as u8;
    }
    Some(out)
}

/// Decode big-endian UTF-16, including surrogate pairs
pub fn decode_utf16be(bytes: &[u8]) -> Option<String> {
    if bytes.is_empty() {
        return None;
    }
    if bytes.len() == 1 {
        return char::from_u32(u32::from(bytes[0])).map(String::from);
    }
    let units: Vec<u16> = bytes
        .chunks(2)
        .map(|pair| match pair {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            [single] => u16::from(*single),
            _ => 0,
        })
        .collect();
    let text: String = char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect();
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &[u8] = b"/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
2 beginbfchar
<0001> <4EBA>
<0002> <6C11>
endbfchar
2 beginbfrange
<0010> <0012> <65E5>
<0020> <0021> [<5E74> <6708>]
endbfrange
endcmap";

    #[test]
    fn test_parse_bfchar() {
        let cmap = ToUnicode::parse(SAMPLE);
        assert_eq!(cmap.get(0x0001), Some("人"));
        assert_eq!(cmap.get(0x0002), Some("民"));
    }

    #[test]
    fn test_parse_bfrange_increment() {
        let cmap = ToUnicode::parse(SAMPLE);
        assert_eq!(cmap.get(0x0010), Some("日"));
        assert_eq!(cmap.get(0x0011), Some("旦"));
        assert_eq!(cmap.get(0x0012), Some("旧"));
        assert_eq!(cmap.get(0x0013), None);
    }

    #[test]
    fn test_parse_bfrange_array() {
        let cmap = ToUnicode::parse(SAMPLE);
        assert_eq!(cmap.get(0x0020), Some("年"));
        assert_eq!(cmap.get(0x0021), Some("月"));
    }

    #[test]
    fn test_split_two_byte_codes() {
        let cmap = ToUnicode::parse(SAMPLE);
        assert_eq!(cmap.split_codes(&[0x00, 0x01, 0x00, 0x02]), vec![1, 2]);
    }

    #[test]
    fn test_single_byte_codespace_guess() {
        let cmap = ToUnicode::parse(b"beginbfchar\n<41> <0041>\nendbfchar");
        assert_eq!(cmap.split_codes(b"AA"), vec![0x41, 0x41]);
        assert_eq!(cmap.get(0x41), Some("A"));
    }

    #[test]
    fn test_surrogate_pair_destination() {
        let cmap = ToUnicode::parse(b"beginbfchar\n<0005> <D835DF0C>\nendbfchar");
        assert_eq!(cmap.get(5), Some("\u{1D70C}"));
    }

    #[test]
    fn test_malformed_cmap_is_empty() {
        let cmap = ToUnicode::parse(b"not a cmap at all");
        assert!(cmap.is_empty());
    }
}
