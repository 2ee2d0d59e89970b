//! Glyph and line grouping
//!
//! Two passes over a page: consecutive glyphs become lines, then lines that
//! sit close together with a shared alignment become text boxes.

use super::types::{LayoutParams, Orientation, TextBox, TextChar, TextLine};

/// Group glyphs into lines, in content-stream order.
///
/// A glyph joins the current line while it stays aligned with the previous
/// glyph in the line's direction. Glyphs aligned in neither direction end up
/// as single-glyph horizontal lines.
pub fn group_chars(chars: &[TextChar], params: &LayoutParams) -> Vec<TextLine> {
    let mut lines = Vec::new();
    let mut current: Option<TextLine> = None;
    let mut prev: Option<&TextChar> = None;

    for ch in chars {
        if let Some(p) = prev {
            let halign = is_halign(p, ch, params);
            let valign = params.detect_vertical && is_valign(p, ch, params);

            let extends = current.as_ref().is_some_and(|line| match line.orientation {
                Orientation::Horizontal => halign,
                Orientation::Vertical => valign,
            });

            if extends {
                if let Some(line) = current.as_mut() {
                    line.push(ch);
                }
            } else if let Some(line) = current.take() {
                lines.push(line);
            } else if valign && !halign {
                let mut line = TextLine::new(Orientation::Vertical, params.word_margin);
                line.push(p);
                line.push(ch);
                current = Some(line);
            } else if halign && !valign {
                let mut line = TextLine::new(Orientation::Horizontal, params.word_margin);
                line.push(p);
                line.push(ch);
                current = Some(line);
            } else {
                let mut line = TextLine::new(Orientation::Horizontal, params.word_margin);
                line.push(p);
                lines.push(line);
            }
        }
        prev = Some(ch);
    }

    match current {
        Some(line) => lines.push(line),
        None => {
            if let Some(p) = prev {
                let mut line = TextLine::new(Orientation::Horizontal, params.word_margin);
                line.push(p);
                lines.push(line);
            }
        }
    }

    lines
}

fn is_halign(a: &TextChar, b: &TextChar, params: &LayoutParams) -> bool {
    a.bbox.is_voverlap(&b.bbox)
        && a.bbox.height().min(b.bbox.height()) * params.line_overlap < a.bbox.voverlap(&b.bbox)
        && a.bbox.hdistance(&b.bbox) < a.bbox.width().max(b.bbox.width()) * params.char_margin
}

fn is_valign(a: &TextChar, b: &TextChar, params: &LayoutParams) -> bool {
    a.bbox.is_hoverlap(&b.bbox)
        && a.bbox.width().min(b.bbox.width()) * params.line_overlap < a.bbox.hoverlap(&b.bbox)
        && a.bbox.vdistance(&b.bbox) < a.bbox.height().max(b.bbox.height()) * params.char_margin
}

/// Group lines into text boxes.
///
/// Two lines are neighbours when they share an orientation, lie within
/// `line_margin` (x line size) of each other, have a similar size and are
/// left-, right- or centre-aligned. Neighbourhood is merged transitively.
/// Boxes come out in the order of their first line; lines inside a box are
/// sorted into reading order.
pub fn group_lines(lines: Vec<TextLine>, params: &LayoutParams) -> Vec<TextBox> {
    let n = lines.len();
    let mut parent: Vec<usize> = (0..n).collect();

    for i in 0..n {
        for j in 0..n {
            if i != j && is_neighbor(&lines[i], &lines[j], params.line_margin) {
                union(&mut parent, i, j);
            }
        }
    }

    let mut roots: Vec<usize> = Vec::new();
    let mut boxes: Vec<TextBox> = Vec::new();
    for (i, line) in lines.into_iter().enumerate() {
        let root = find(&mut parent, i);
        let slot = match roots.iter().position(|&r| r == root) {
            Some(slot) => slot,
            None => {
                roots.push(root);
                boxes.push(TextBox::new(line.orientation));
                boxes.len() - 1
            }
        };
        boxes[slot].push(line);
    }

    for text_box in &mut boxes {
        text_box.sort_lines();
    }
    boxes
}

fn is_neighbor(line: &TextLine, other: &TextLine, ratio: f64) -> bool {
    if line.orientation != other.orientation {
        return false;
    }
    let (a, b) = (&line.bbox, &other.bbox);
    match line.orientation {
        Orientation::Horizontal => {
            let d = ratio * a.height();
            let search = (a.x0, a.y0 - d, a.x1, a.y1 + d);
            overlaps_strict(search, b)
                && (b.height() - a.height()).abs() <= d
                && ((b.x0 - a.x0).abs() <= d
                    || (b.x1 - a.x1).abs() <= d
                    || ((b.x0 + b.x1) / 2.0 - (a.x0 + a.x1) / 2.0).abs() <= d)
        }
        Orientation::Vertical => {
            let d = ratio * a.width();
            let search = (a.x0 - d, a.y0, a.x1 + d, a.y1);
            overlaps_strict(search, b)
                && (b.width() - a.width()).abs() <= d
                && ((b.y0 - a.y0).abs() <= d
                    || (b.y1 - a.y1).abs() <= d
                    || ((b.y0 + b.y1) / 2.0 - (a.y0 + a.y1) / 2.0).abs() <= d)
        }
    }
}

/// Touching edges do not count as overlap
fn overlaps_strict(area: (f64, f64, f64, f64), b: &super::types::BBox) -> bool {
    let (x0, y0, x1, y1) = area;
    !(b.x1 <= x0 || x1 <= b.x0 || b.y1 <= y0 || y1 <= b.y0)
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        // Keep the smaller index as root so box order follows first line
        let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
        parent[hi] = lo;
    }
}
