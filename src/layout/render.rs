//! Plain-text rendering of analyzed pages

use super::types::TextBox;

/// Page separator (form feed)
pub const PAGE_BREAK: char = '\x0c';

/// Render one page: each box's lines, a blank line after every box and a
/// form feed at the end of the page.
pub fn render_page(boxes: &[TextBox]) -> String {
    let mut out = String::new();
    for text_box in boxes {
        out.push_str(&text_box.text());
        out.push('\n');
    }
    out.push(PAGE_BREAK);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::types::{BBox, Orientation, TextChar, TextLine};

    fn one_line_box(text: &str) -> TextBox {
        let mut line = TextLine::new(Orientation::Horizontal, 0.1);
        line.push(&TextChar::new(text, BBox::new(0.0, 0.0, 10.0, 10.0)));
        let mut b = TextBox::new(Orientation::Horizontal);
        b.push(line);
        b
    }

    #[test]
    fn test_render_blank_line_between_boxes() {
        let page = render_page(&[one_line_box("甲"), one_line_box("乙")]);
        assert_eq!(page, "甲\n\n乙\n\n\x0c");
    }

    #[test]
    fn test_render_empty_page() {
        assert_eq!(render_page(&[]), "\x0c");
    }
}
