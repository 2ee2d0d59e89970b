//! Page layout analysis
//!
//! Turns positioned glyphs into lines, lines into boxes, and boxes into
//! reading order.

pub mod grouping;
pub mod ordering;
pub mod render;
pub mod types;

pub use render::{render_page, PAGE_BREAK};
pub use types::{BBox, LayoutParams, LayoutParamsBuilder, Orientation, TextBox, TextChar, TextLine};

/// Run the full analysis for one page's glyphs
pub fn analyze_page(chars: &[TextChar], params: &LayoutParams) -> Vec<TextBox> {
    let lines: Vec<TextLine> = grouping::group_chars(chars, params)
        .into_iter()
        .filter(|line| !line.is_empty())
        .collect();
    let boxes = grouping::group_lines(lines, params);
    log::trace!("Page analysis: {} glyphs, {} boxes", chars.len(), boxes.len());
    ordering::order_boxes(boxes, params)
}
