//! Font model for text extraction
//!
//! Only what layout needs: how to split a string into character codes, the
//! Unicode text of a code, glyph advance widths, vertical metrics and the
//! font descent. Glyph outlines are never read.

use std::collections::HashMap;

use encoding_rs::{Encoding, GBK, UTF_16BE, WINDOWS_1252};
use lopdf::{Dictionary, Document, Object};

use super::cmap::ToUnicode;
use super::{get, get_array, get_dict, get_name, get_number, number};

/// Default horizontal width of a CID font glyph (glyph space)
pub const DEFAULT_CID_WIDTH: f64 = 1000.0;

/// Default vertical origin and advance (`/DW2`)
pub const DEFAULT_VERTICAL_METRICS: (f64, f64) = (880.0, -1000.0);

/// Width used for simple fonts that carry no `/Widths` array
pub const FALLBACK_SIMPLE_WIDTH: f64 = 500.0;

/// How string bytes become character codes and, without a ToUnicode map, text
#[derive(Debug, Clone, PartialEq)]
pub enum CodeScheme {
    /// One byte per code; text from `/Differences` or Windows-1252
    Simple { differences: HashMap<u32, String> },
    /// Two bytes per code, code equals CID (`Identity-H`, `Identity-V`)
    Identity,
    /// Two bytes per code, code is a UTF-16 unit (`UniGB-UCS2-H`, `UniGB-UTF16-H`, ...)
    Utf16,
    /// One or two bytes per code, code is GBK (`GBK-EUC-H`, `GBpc-EUC-H`, ...)
    Gbk,
    /// Embedded encoding CMap; codespace widths only
    Embedded(ToUnicode),
}

/// A loaded font resource
#[derive(Debug, Clone)]
pub struct PdfFont {
    pub name: String,
    pub scheme: CodeScheme,
    pub vertical: bool,
    to_unicode: Option<ToUnicode>,
    widths: HashMap<u32, f64>,
    default_width: f64,
    /// code -> (w1y, vx, vy)
    vertical_metrics: HashMap<u32, (f64, f64, f64)>,
    default_vy: f64,
    default_w1y: f64,
    /// Descent in glyph space (usually negative)
    descent: f64,
}

impl PdfFont {
    /// Font used when a `Tf` operand names no known resource
    pub fn fallback() -> Self {
        Self {
            name: "unknown".to_string(),
            scheme: CodeScheme::Simple {
                differences: HashMap::new(),
            },
            vertical: false,
            to_unicode: None,
            widths: HashMap::new(),
            default_width: FALLBACK_SIMPLE_WIDTH,
            vertical_metrics: HashMap::new(),
            default_vy: DEFAULT_VERTICAL_METRICS.0,
            default_w1y: DEFAULT_VERTICAL_METRICS.1,
            descent: 0.0,
        }
    }

    /// Load a font dictionary. Missing or malformed entries fall back to defaults.
    pub fn load(doc: &Document, dict: &Dictionary) -> Self {
        let subtype = get_name(doc, dict, b"Subtype").unwrap_or(&b"Type1"[..]);
        let name = get_name(doc, dict, b"BaseFont")
            .map(|n| String::from_utf8_lossy(n).into_owned())
            .unwrap_or_else(|| "unnamed".to_string());
        let to_unicode = match get(doc, dict, b"ToUnicode") {
            Some(Object::Stream(stream)) => match stream.decompressed_content() {
                Ok(data) => Some(ToUnicode::parse(&data)),
                Err(_) => Some(ToUnicode::parse(&stream.content)),
            },
            _ => None,
        };

        let font = if subtype == b"Type0" {
            Self::load_composite(doc, dict, name, to_unicode)
        } else {
            Self::load_simple(doc, dict, name, to_unicode)
        };
        log::debug!(
            "Loaded font {} ({:?}, vertical={}, {} widths)",
            font.name,
            font.scheme_label(),
            font.vertical,
            font.widths.len()
        );
        font
    }

    fn load_simple(
        doc: &Document,
        dict: &Dictionary,
        name: String,
        to_unicode: Option<ToUnicode>,
    ) -> Self {
        let mut widths = HashMap::new();
        let first_char = get_number(doc, dict, b"FirstChar").unwrap_or(0.0) as u32;
        let has_widths = match get_array(doc, dict, b"Widths") {
            Some(items) => {
                for (i, item) in items.iter().enumerate() {
                    let Some(code) = cid_at(first_char, i) else { break };
                    if let Some(w) = number(resolve_item(doc, item)) {
                        widths.insert(code, w);
                    }
                }
                true
            }
            None => false,
        };

        let descriptor = get_dict(doc, dict, b"FontDescriptor");
        let missing_width = descriptor.and_then(|d| get_number(doc, d, b"MissingWidth"));
        let default_width = match (missing_width, has_widths) {
            (Some(w), _) => w,
            (None, true) => 0.0,
            (None, false) => FALLBACK_SIMPLE_WIDTH,
        };

        let mut differences = HashMap::new();
        if let Some(Object::Dictionary(encoding)) = get(doc, dict, b"Encoding") {
            if let Some(items) = get_array(doc, encoding, b"Differences") {
                // None once the running code leaves the u32 range
                let mut code = Some(0u32);
                for item in items {
                    match resolve_item(doc, item) {
                        Object::Integer(start) => code = u32::try_from(*start).ok(),
                        Object::Name(glyph) => {
                            let Some(current) = code else { continue };
                            if let Some(text) = glyph_to_unicode(glyph) {
                                differences.insert(current, text);
                            }
                            code = current.checked_add(1);
                        }
                        _ => {}
                    }
                }
            }
        }

        Self {
            name,
            scheme: CodeScheme::Simple { differences },
            vertical: false,
            to_unicode,
            widths,
            default_width,
            vertical_metrics: HashMap::new(),
            default_vy: DEFAULT_VERTICAL_METRICS.0,
            default_w1y: DEFAULT_VERTICAL_METRICS.1,
            descent: descriptor
                .and_then(|d| get_number(doc, d, b"Descent"))
                .unwrap_or(0.0),
        }
    }

    fn load_composite(
        doc: &Document,
        dict: &Dictionary,
        name: String,
        to_unicode: Option<ToUnicode>,
    ) -> Self {
        let (scheme, vertical) = match get(doc, dict, b"Encoding") {
            Some(Object::Name(cmap_name)) => scheme_for_cmap_name(cmap_name),
            Some(Object::Stream(stream)) => {
                let data = stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone());
                let wmode = get_number(doc, &stream.dict, b"WMode").unwrap_or(0.0);
                let text = String::from_utf8_lossy(&data);
                let vertical = wmode == 1.0 || text.contains("/WMode 1");
                (CodeScheme::Embedded(ToUnicode::parse(&data)), vertical)
            }
            _ => {
                log::warn!("Font {} has no usable /Encoding, assuming Identity-H", name);
                (CodeScheme::Identity, false)
            }
        };

        let descendant = get_array(doc, dict, b"DescendantFonts")
            .and_then(|items| items.first())
            .map(|item| resolve_item(doc, item))
            .and_then(|obj| match obj {
                Object::Dictionary(d) => Some(d),
                _ => None,
            });

        let mut font = Self {
            name,
            scheme,
            vertical,
            to_unicode,
            widths: HashMap::new(),
            default_width: DEFAULT_CID_WIDTH,
            vertical_metrics: HashMap::new(),
            default_vy: DEFAULT_VERTICAL_METRICS.0,
            default_w1y: DEFAULT_VERTICAL_METRICS.1,
            descent: 0.0,
        };

        let Some(cid_font) = descendant else {
            log::warn!("Font {} has no descendant font, using default metrics", font.name);
            return font;
        };

        if let Some(dw) = get_number(doc, cid_font, b"DW") {
            font.default_width = dw;
        }
        if let Some(items) = get_array(doc, cid_font, b"W") {
            font.widths = parse_cid_widths(doc, items);
        }
        if let Some(items) = get_array(doc, cid_font, b"DW2") {
            let values: Vec<f64> = items.iter().filter_map(|o| number(resolve_item(doc, o))).collect();
            if let [vy, w1y] = values[..] {
                font.default_vy = vy;
                font.default_w1y = w1y;
            }
        }
        if let Some(items) = get_array(doc, cid_font, b"W2") {
            font.vertical_metrics = parse_cid_vertical_metrics(doc, items);
        }
        font.descent = get_dict(doc, cid_font, b"FontDescriptor")
            .and_then(|d| get_number(doc, d, b"Descent"))
            .unwrap_or(0.0);
        font
    }

    fn scheme_label(&self) -> &'static str {
        match self.scheme {
            CodeScheme::Simple { .. } => "simple",
            CodeScheme::Identity => "identity",
            CodeScheme::Utf16 => "utf16",
            CodeScheme::Gbk => "gbk",
            CodeScheme::Embedded(_) => "embedded",
        }
    }

    /// True when codes span more than one byte (word spacing then never applies)
    pub fn is_multibyte(&self) -> bool {
        !matches!(self.scheme, CodeScheme::Simple { .. })
    }

    /// Split a string operand into character codes
    pub fn decode(&self, bytes: &[u8]) -> Vec<u32> {
        match &self.scheme {
            CodeScheme::Simple { .. } => bytes.iter().map(|&b| u32::from(b)).collect(),
            CodeScheme::Identity | CodeScheme::Utf16 => bytes
                .chunks(2)
                .map(|pair| pair.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b)))
                .collect(),
            CodeScheme::Gbk => {
                let mut codes = Vec::new();
                let mut i = 0;
                while i < bytes.len() {
                    if bytes[i] >= 0x81 && i + 1 < bytes.len() {
                        codes.push((u32::from(bytes[i]) << 8) | u32::from(bytes[i + 1]));
                        i += 2;
                    } else {
                        codes.push(u32::from(bytes[i]));
                        i += 1;
                    }
                }
                codes
            }
            CodeScheme::Embedded(cmap) => cmap.split_codes(bytes),
        }
    }

    /// Unicode text of a code, `None` when the font cannot tell
    pub fn to_unicode(&self, code: u32) -> Option<String> {
        if let Some(text) = self.to_unicode.as_ref().and_then(|map| map.get(code)) {
            return Some(text.to_string());
        }
        match &self.scheme {
            CodeScheme::Simple { differences } => differences
                .get(&code)
                .cloned()
                .or_else(|| decode_with(WINDOWS_1252, &[code as u8])),
            CodeScheme::Utf16 => decode_with(UTF_16BE, &(code as u16).to_be_bytes()),
            CodeScheme::Gbk => {
                if code > 0xFF {
                    decode_with(GBK, &(code as u16).to_be_bytes())
                } else {
                    decode_with(GBK, &[code as u8])
                }
            }
            CodeScheme::Identity | CodeScheme::Embedded(_) => None,
        }
    }

    /// Code used to look up metrics; only identity-mapped codes are CIDs
    fn metric_key(&self, code: u32) -> Option<u32> {
        match self.scheme {
            CodeScheme::Simple { .. } | CodeScheme::Identity | CodeScheme::Embedded(_) => Some(code),
            CodeScheme::Utf16 | CodeScheme::Gbk => None,
        }
    }

    /// Advance in text space units per unit font size.
    ///
    /// Horizontal fonts advance right (positive); vertical fonts advance down
    /// (negative `w1y`).
    pub fn advance(&self, code: u32) -> f64 {
        let key = self.metric_key(code);
        let glyph_units = if self.vertical {
            key.and_then(|k| self.vertical_metrics.get(&k))
                .map(|&(w1y, _, _)| w1y)
                .unwrap_or(self.default_w1y)
        } else {
            key.and_then(|k| self.widths.get(&k))
                .copied()
                .unwrap_or(self.default_width)
        };
        glyph_units * 0.001
    }

    /// Vertical position vector `(vx, vy)` in glyph space; `vx` is `None`
    /// when the glyph uses the default (half the width)
    pub fn position_vector(&self, code: u32) -> (Option<f64>, f64) {
        match self
            .metric_key(code)
            .and_then(|k| self.vertical_metrics.get(&k))
        {
            Some(&(_, vx, vy)) => (Some(vx), vy),
            None => (None, self.default_vy),
        }
    }

    /// Descent per unit font size
    pub fn descent(&self) -> f64 {
        self.descent * 0.001
    }
}

fn resolve_item<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    super::resolve(doc, obj)
}

fn decode_with(encoding: &'static Encoding, bytes: &[u8]) -> Option<String> {
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors || text.is_empty() {
        None
    } else {
        Some(text.into_owned())
    }
}

/// Classify a predefined CMap name. Returns the scheme and writing mode.
pub fn scheme_for_cmap_name(name: &[u8]) -> (CodeScheme, bool) {
    let name = String::from_utf8_lossy(name);
    let vertical = name.ends_with("-V");
    let scheme = if name.starts_with("Identity") {
        CodeScheme::Identity
    } else if name.contains("UCS2") || name.contains("UTF16") {
        CodeScheme::Utf16
    } else if name.contains("GBK") || name.contains("EUC") || name.contains("GBT") {
        CodeScheme::Gbk
    } else {
        log::warn!("Unsupported CMap {}, treating codes as CIDs", name);
        CodeScheme::Identity
    };
    (scheme, vertical)
}

/// `first + offset`, or `None` past the end of the `u32` code range
fn cid_at(first: u32, offset: usize) -> Option<u32> {
    u32::try_from(offset).ok().and_then(|offset| first.checked_add(offset))
}

/// Parse a `/W` array: `c [w1 w2 ...]` or `c_first c_last w`
fn parse_cid_widths(doc: &Document, items: &[Object]) -> HashMap<u32, f64> {
    let mut widths = HashMap::new();
    let mut i = 0;
    while i < items.len() {
        let Some(first) = number(resolve_item(doc, &items[i])) else {
            i += 1;
            continue;
        };
        let first = first.max(0.0) as u32;
        match items.get(i + 1).map(|o| resolve_item(doc, o)) {
            Some(Object::Array(list)) => {
                for (offset, w) in list.iter().enumerate() {
                    let Some(cid) = cid_at(first, offset) else { break };
                    if let Some(w) = number(resolve_item(doc, w)) {
                        widths.insert(cid, w);
                    }
                }
                i += 2;
            }
            Some(last) => {
                let last = number(last).unwrap_or(0.0).max(0.0) as u32;
                let w = items.get(i + 2).and_then(|o| number(resolve_item(doc, o)));
                if let Some(w) = w {
                    for cid in first..=last.min(first.saturating_add(0xFFFF)) {
                        widths.insert(cid, w);
                    }
                }
                i += 3;
            }
            None => break,
        }
    }
    widths
}

/// Parse a `/W2` array: `c [w1y vx vy ...]` or `c_first c_last w1y vx vy`
fn parse_cid_vertical_metrics(doc: &Document, items: &[Object]) -> HashMap<u32, (f64, f64, f64)> {
    let mut metrics = HashMap::new();
    let mut i = 0;
    while i < items.len() {
        let Some(first) = number(resolve_item(doc, &items[i])) else {
            i += 1;
            continue;
        };
        let first = first.max(0.0) as u32;
        match items.get(i + 1).map(|o| resolve_item(doc, o)) {
            Some(Object::Array(list)) => {
                let values: Vec<f64> = list
                    .iter()
                    .filter_map(|o| number(resolve_item(doc, o)))
                    .collect();
                for (offset, triple) in values.chunks_exact(3).enumerate() {
                    let Some(cid) = cid_at(first, offset) else { break };
                    metrics.insert(cid, (triple[0], triple[1], triple[2]));
                }
                i += 2;
            }
            Some(last) => {
                let last = number(last).unwrap_or(0.0).max(0.0) as u32;
                let values: Vec<f64> = items
                    .iter()
                    .skip(i + 2)
                    .take(3)
                    .filter_map(|o| number(resolve_item(doc, o)))
                    .collect();
                if let [w1y, vx, vy] = values[..] {
                    for cid in first..=last.min(first.saturating_add(0xFFFF)) {
                        metrics.insert(cid, (w1y, vx, vy));
                    }
                }
                i += 5;
            }
            None => break,
        }
    }
    metrics
}

/// Unicode text for a glyph name from a `/Differences` array
pub fn glyph_to_unicode(name: &[u8]) -> Option<String> {
    let name = std::str::from_utf8(name).ok()?;
    let base = name.split('.').next().unwrap_or(name);

    if let Some(hex) = base.strip_prefix("uni") {
        if hex.len() >= 4 && hex.len() % 4 == 0 {
            let units: Option<Vec<u16>> = (0..hex.len())
                .step_by(4)
                .map(|i| u16::from_str_radix(&hex[i..i + 4], 16).ok())
                .collect();
            return units.and_then(|u| String::from_utf16(&u).ok());
        }
    }
    if let Some(hex) = base.strip_prefix('u') {
        if (4..=6).contains(&hex.len()) {
            if let Some(ch) = u32::from_str_radix(hex, 16).ok().and_then(char::from_u32) {
                return Some(ch.to_string());
            }
        }
    }
    if base.chars().count() == 1 {
        return Some(base.to_string());
    }

    let ch = match base {
        "space" => ' ',
        "exclam" => '!',
        "quotedbl" => '"',
        "numbersign" => '#',
        "dollar" => '$',
        "percent" => '%',
        "ampersand" => '&',
        "quotesingle" | "quoteright" => '\'',
        "parenleft" => '(',
        "parenright" => ')',
        "asterisk" => '*',
        "plus" => '+',
        "comma" => ',',
        "hyphen" | "minus" => '-',
        "period" => '.',
        "slash" => '/',
        "zero" => '0',
        "one" => '1',
        "two" => '2',
        "three" => '3',
        "four" => '4',
        "five" => '5',
        "six" => '6',
        "seven" => '7',
        "eight" => '8',
        "nine" => '9',
        "colon" => ':',
        "semicolon" => ';',
        "less" => '<',
        "equal" => '=',
        "greater" => '>',
        "question" => '?',
        "at" => '@',
        "bracketleft" => '[',
        "backslash" => '\\',
        "bracketright" => ']',
        "underscore" => '_',
        "quoteleft" => '`',
        "braceleft" => '{',
        "bar" => '|',
        "braceright" => '}',
        "asciitilde" => '~',
        "endash" => '\u{2013}',
        "emdash" => '\u{2014}',
        "quotedblleft" => '\u{201C}',
        "quotedblright" => '\u{201D}',
        "bullet" => '\u{2022}',
        _ => return None,
    };
    Some(ch.to_string())
}
