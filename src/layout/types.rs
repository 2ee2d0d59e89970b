//! Layout module core types
//!
//! Geometry, layout tolerances and the char / line / box containers the
//! grouping passes produce.

use serde::{Deserialize, Serialize};

// ============================================================
// Constants
// ============================================================

/// Default minimum overlap ratio for two glyphs to share a line
pub const DEFAULT_LINE_OVERLAP: f64 = 0.5;

/// Default horizontal gap (x glyph width) tolerated inside one line
pub const DEFAULT_CHAR_MARGIN: f64 = 2.0;

/// Default vertical gap (x line height) tolerated inside one text box
pub const DEFAULT_LINE_MARGIN: f64 = 0.5;

/// Default gap (x glyph size) above which a space is inserted
pub const DEFAULT_WORD_MARGIN: f64 = 0.1;

/// Default balance between vertical and horizontal box ordering
pub const DEFAULT_BOXES_FLOW: f64 = 0.5;

/// Lower clamp for `boxes_flow`
pub const MIN_BOXES_FLOW: f64 = -1.0;

/// Upper clamp for `boxes_flow`
pub const MAX_BOXES_FLOW: f64 = 1.0;

// ============================================================
// Geometry
// ============================================================

/// Axis-aligned bounding box in PDF user space (y grows upwards)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl BBox {
    /// Create a bounding box, normalizing the corner order
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    /// Empty box that any `union` replaces
    pub fn empty() -> Self {
        Self {
            x0: f64::INFINITY,
            y0: f64::INFINITY,
            x1: f64::NEG_INFINITY,
            y1: f64::NEG_INFINITY,
        }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// True when the box has no extent in either direction
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Smallest box containing both
    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Check if two boxes touch or overlap
    pub fn intersects(&self, other: &BBox) -> bool {
        self.x0 <= other.x1 && other.x0 <= self.x1 && self.y0 <= other.y1 && other.y0 <= self.y1
    }

    pub fn is_hoverlap(&self, other: &BBox) -> bool {
        other.x0 <= self.x1 && self.x0 <= other.x1
    }

    /// Horizontal gap, zero when the boxes overlap horizontally
    pub fn hdistance(&self, other: &BBox) -> f64 {
        if self.is_hoverlap(other) {
            0.0
        } else {
            (self.x0 - other.x1).abs().min((self.x1 - other.x0).abs())
        }
    }

    /// Horizontal overlap, zero when the boxes are apart
    pub fn hoverlap(&self, other: &BBox) -> f64 {
        if self.is_hoverlap(other) {
            (self.x0 - other.x1).abs().min((self.x1 - other.x0).abs())
        } else {
            0.0
        }
    }

    pub fn is_voverlap(&self, other: &BBox) -> bool {
        other.y0 <= self.y1 && self.y0 <= other.y1
    }

    /// Vertical gap, zero when the boxes overlap vertically
    pub fn vdistance(&self, other: &BBox) -> f64 {
        if self.is_voverlap(other) {
            0.0
        } else {
            (self.y0 - other.y1).abs().min((self.y1 - other.y0).abs())
        }
    }

    /// Vertical overlap, zero when the boxes are apart
    pub fn voverlap(&self, other: &BBox) -> f64 {
        if self.is_voverlap(other) {
            (self.y0 - other.y1).abs().min((self.y1 - other.y0).abs())
        } else {
            0.0
        }
    }
}

// ============================================================
// Layout parameters
// ============================================================

/// Tolerances controlling how glyphs are grouped into lines, words and boxes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutParams {
    /// Minimum overlap (x smaller glyph) for two glyphs to share a line
    pub line_overlap: f64,
    /// Maximum gap (x larger glyph) between two glyphs of the same line
    pub char_margin: f64,
    /// Maximum gap (x line height) between two lines of the same box
    pub line_margin: f64,
    /// Gap (x glyph size) above which a space is inserted between glyphs
    pub word_margin: f64,
    /// Box ordering balance; `None` sorts boxes by position only
    pub boxes_flow: Option<f64>,
    /// Recognize top-to-bottom text runs
    pub detect_vertical: bool,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            line_overlap: DEFAULT_LINE_OVERLAP,
            char_margin: DEFAULT_CHAR_MARGIN,
            line_margin: DEFAULT_LINE_MARGIN,
            word_margin: DEFAULT_WORD_MARGIN,
            boxes_flow: Some(DEFAULT_BOXES_FLOW),
            detect_vertical: true,
        }
    }
}

impl LayoutParams {
    /// Create a new params builder
    pub fn builder() -> LayoutParamsBuilder {
        LayoutParamsBuilder::default()
    }

    /// Horizontal-only layout, as used for western single-direction documents
    pub fn horizontal_only() -> Self {
        Self {
            detect_vertical: false,
            ..Default::default()
        }
    }

    /// Return a copy with every value forced into its valid range
    #[must_use]
    pub fn clamped(&self) -> Self {
        Self::builder()
            .line_overlap(self.line_overlap)
            .char_margin(self.char_margin)
            .line_margin(self.line_margin)
            .word_margin(self.word_margin)
            .boxes_flow(self.boxes_flow)
            .detect_vertical(self.detect_vertical)
            .build()
    }
}

/// Builder for LayoutParams
#[derive(Debug, Default)]
pub struct LayoutParamsBuilder {
    params: LayoutParams,
}

impl LayoutParamsBuilder {
    /// Set line overlap ratio (clamped to 0-1)
    #[must_use]
    pub fn line_overlap(mut self, ratio: f64) -> Self {
        self.params.line_overlap = ratio.clamp(0.0, 1.0);
        self
    }

    /// Set char margin (negative values become 0)
    #[must_use]
    pub fn char_margin(mut self, margin: f64) -> Self {
        self.params.char_margin = margin.max(0.0);
        self
    }

    /// Set line margin (negative values become 0)
    #[must_use]
    pub fn line_margin(mut self, margin: f64) -> Self {
        self.params.line_margin = margin.max(0.0);
        self
    }

    /// Set word margin (negative values become 0)
    #[must_use]
    pub fn word_margin(mut self, margin: f64) -> Self {
        self.params.word_margin = margin.max(0.0);
        self
    }

    /// Set boxes flow (clamped to -1..1), or disable flow ordering with `None`
    #[must_use]
    pub fn boxes_flow(mut self, flow: Option<f64>) -> Self {
        self.params.boxes_flow = flow.map(|f| f.clamp(MIN_BOXES_FLOW, MAX_BOXES_FLOW));
        self
    }

    /// Enable or disable vertical text detection
    #[must_use]
    pub fn detect_vertical(mut self, detect: bool) -> Self {
        self.params.detect_vertical = detect;
        self
    }

    /// Build the params
    #[must_use]
    pub fn build(self) -> LayoutParams {
        self.params
    }
}

// ============================================================
// Layout containers
// ============================================================

/// Writing direction of a line or box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// A single positioned glyph
#[derive(Debug, Clone, PartialEq)]
pub struct TextChar {
    /// Decoded text (usually one char, may be a ligature or `(cid:N)`)
    pub text: String,
    /// Device-space bounding box
    pub bbox: BBox,
    /// Glyph size (height for horizontal fonts, width for vertical fonts)
    pub size: f64,
    /// False for rotated or mirrored glyphs
    pub upright: bool,
}

impl TextChar {
    pub fn new(text: impl Into<String>, bbox: BBox) -> Self {
        let size = bbox.height();
        Self {
            text: text.into(),
            bbox,
            size,
            upright: true,
        }
    }
}

/// A run of glyphs read in one direction
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub orientation: Orientation,
    pub bbox: BBox,
    text: String,
    word_margin: f64,
    /// Trailing edge of the last glyph (x1 for horizontal, y0 for vertical)
    edge: f64,
}

impl TextLine {
    pub fn new(orientation: Orientation, word_margin: f64) -> Self {
        let edge = match orientation {
            Orientation::Horizontal => f64::INFINITY,
            Orientation::Vertical => f64::NEG_INFINITY,
        };
        Self {
            orientation,
            bbox: BBox::empty(),
            text: String::new(),
            word_margin,
            edge,
        }
    }

    /// Append a glyph, inserting a space when the gap exceeds the word margin
    pub fn push(&mut self, ch: &TextChar) {
        let margin = self.word_margin * ch.bbox.width().max(ch.bbox.height());
        match self.orientation {
            Orientation::Horizontal => {
                if self.edge < ch.bbox.x0 - margin {
                    self.text.push(' ');
                }
                self.edge = ch.bbox.x1;
            }
            Orientation::Vertical => {
                if ch.bbox.y1 + margin < self.edge {
                    self.text.push(' ');
                }
                self.edge = ch.bbox.y0;
            }
        }
        self.text.push_str(&ch.text);
        self.bbox = self.bbox.union(&ch.bbox);
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Degenerate or whitespace-only lines carry no readable text
    pub fn is_empty(&self) -> bool {
        self.bbox.is_degenerate() || self.text.trim().is_empty()
    }
}

/// A block of neighbouring lines sharing one orientation
#[derive(Debug, Clone, PartialEq)]
pub struct TextBox {
    pub orientation: Orientation,
    pub bbox: BBox,
    pub lines: Vec<TextLine>,
}

impl TextBox {
    pub fn new(orientation: Orientation) -> Self {
        Self {
            orientation,
            bbox: BBox::empty(),
            lines: Vec::new(),
        }
    }

    pub fn push(&mut self, line: TextLine) {
        self.bbox = self.bbox.union(&line.bbox);
        self.lines.push(line);
    }

    /// Order lines top-to-bottom (horizontal) or right-to-left (vertical)
    pub fn sort_lines(&mut self) {
        match self.orientation {
            Orientation::Horizontal => self
                .lines
                .sort_by(|a, b| b.bbox.y1.total_cmp(&a.bbox.y1)),
            Orientation::Vertical => self
                .lines
                .sort_by(|a, b| b.bbox.x1.total_cmp(&a.bbox.x1)),
        }
    }

    /// Box text: every line terminated by a newline
    pub fn text(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(line.text());
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyph(text: &str, x0: f64, y0: f64, x1: f64, y1: f64) -> TextChar {
        TextChar::new(text, BBox::new(x0, y0, x1, y1))
    }

    #[test]
    fn test_layout_params_default() {
        let params = LayoutParams::default();
        assert_eq!(params.line_margin, 0.5);
        assert_eq!(params.word_margin, 0.1);
        assert_eq!(params.char_margin, 2.0);
        assert_eq!(params.boxes_flow, Some(0.5));
        assert!(params.detect_vertical);
    }

    #[test]
    fn test_layout_params_horizontal_only() {
        let params = LayoutParams::horizontal_only();
        assert!(!params.detect_vertical);
        assert_eq!(params.line_margin, DEFAULT_LINE_MARGIN);
    }

    #[test]
    fn test_builder_clamping() {
        let params = LayoutParams::builder()
            .boxes_flow(Some(3.0))
            .line_overlap(2.0)
            .char_margin(-1.0)
            .build();
        assert_eq!(params.boxes_flow, Some(1.0));
        assert_eq!(params.line_overlap, 1.0);
        assert_eq!(params.char_margin, 0.0);

        let params = LayoutParams::builder().boxes_flow(None).build();
        assert_eq!(params.boxes_flow, None);
    }

    #[test]
    fn test_clamped_copy() {
        let raw = LayoutParams {
            word_margin: -0.5,
            boxes_flow: Some(-4.0),
            ..Default::default()
        };
        let fixed = raw.clamped();
        assert_eq!(fixed.word_margin, 0.0);
        assert_eq!(fixed.boxes_flow, Some(-1.0));
    }

    #[test]
    fn test_bbox_normalizes_corners() {
        let b = BBox::new(10.0, 20.0, 0.0, 5.0);
        assert_eq!((b.x0, b.y0, b.x1, b.y1), (0.0, 5.0, 10.0, 20.0));
        assert_eq!(b.area(), 150.0);
    }

    #[test]
    fn test_bbox_distances() {
        let a = BBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BBox::new(15.0, 5.0, 25.0, 15.0);
        assert!(!a.is_hoverlap(&b));
        assert_eq!(a.hdistance(&b), 5.0);
        assert!(a.is_voverlap(&b));
        assert_eq!(a.voverlap(&b), 5.0);
        assert_eq!(a.vdistance(&b), 0.0);
    }

    #[test]
    fn test_line_inserts_space_over_word_margin() {
        let mut line = TextLine::new(Orientation::Horizontal, 0.1);
        line.push(&glyph("A", 0.0, 0.0, 10.0, 10.0));
        line.push(&glyph("B", 10.5, 0.0, 20.5, 10.0));
        line.push(&glyph("C", 25.0, 0.0, 35.0, 10.0));
        assert_eq!(line.text(), "AB C");
        assert_eq!(line.bbox.x1, 35.0);
    }

    #[test]
    fn test_vertical_line_spacing() {
        let mut line = TextLine::new(Orientation::Vertical, 0.1);
        line.push(&glyph("上", 0.0, 90.0, 10.0, 100.0));
        line.push(&glyph("下", 0.0, 79.5, 10.0, 89.5));
        line.push(&glyph("字", 0.0, 50.0, 10.0, 60.0));
        assert_eq!(line.text(), "上下 字");
    }

    #[test]
    fn test_whitespace_line_is_empty() {
        let mut line = TextLine::new(Orientation::Horizontal, 0.1);
        line.push(&glyph(" ", 0.0, 0.0, 5.0, 10.0));
        assert!(line.is_empty());
    }

    #[test]
    fn test_box_sorts_and_renders_lines() {
        let mut lower = TextLine::new(Orientation::Horizontal, 0.1);
        lower.push(&glyph("下", 0.0, 0.0, 10.0, 10.0));
        let mut upper = TextLine::new(Orientation::Horizontal, 0.1);
        upper.push(&glyph("上", 0.0, 20.0, 10.0, 30.0));

        let mut text_box = TextBox::new(Orientation::Horizontal);
        text_box.push(lower);
        text_box.push(upper);
        text_box.sort_lines();
        assert_eq!(text_box.text(), "上\n下\n");
        assert_eq!(text_box.bbox.y1, 30.0);
    }
}
