//! Content-stream interpreter
//!
//! Walks the operators of a page (and the form XObjects it paints) and
//! records every shown glyph as a positioned [`TextChar`] in page space.
//! Only text and transformation operators matter; painting is ignored and
//! invisible text (render mode 3) is kept like any other.

use std::collections::HashMap;
use std::rc::Rc;

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};

use super::font::PdfFont;
use super::{get, get_array, get_dict, get_name, number, DocumentError, Result};
use crate::layout::{BBox, TextChar};

/// Form XObjects nested deeper than this are skipped
pub const MAX_FORM_DEPTH: usize = 8;

/// Affine matrix `[a b c d e f]`
pub type Matrix = [f64; 6];

pub const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// `m1 x m0`
pub fn mult_matrix(m1: &Matrix, m0: &Matrix) -> Matrix {
    let [a1, b1, c1, d1, e1, f1] = *m1;
    let [a0, b0, c0, d0, e0, f0] = *m0;
    [
        a0 * a1 + c0 * b1,
        b0 * a1 + d0 * b1,
        a0 * c1 + c0 * d1,
        b0 * c1 + d0 * d1,
        a0 * e1 + c0 * f1 + e0,
        b0 * e1 + d0 * f1 + f0,
    ]
}

pub fn translate_matrix(m: &Matrix, (x, y): (f64, f64)) -> Matrix {
    let [a, b, c, d, e, f] = *m;
    [a, b, c, d, x * a + y * c + e, x * b + y * d + f]
}

pub fn apply_matrix(m: &Matrix, (x, y): (f64, f64)) -> (f64, f64) {
    let [a, b, c, d, e, f] = *m;
    (a * x + c * y + e, b * x + d * y + f)
}

// ============================================================
// State
// ============================================================

#[derive(Debug, Clone)]
struct TextState {
    font: Option<Rc<PdfFont>>,
    fontsize: f64,
    charspace: f64,
    wordspace: f64,
    /// Horizontal scaling in percent
    scaling: f64,
    /// Stored negated, so `T*` adds it like `TD` does
    leading: f64,
    rise: f64,
    matrix: Matrix,
    line: (f64, f64),
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font: None,
            fontsize: 0.0,
            charspace: 0.0,
            wordspace: 0.0,
            scaling: 100.0,
            leading: 0.0,
            rise: 0.0,
            matrix: IDENTITY,
            line: (0.0, 0.0),
        }
    }
}

impl TextState {
    fn reset_matrix(&mut self) {
        self.matrix = IDENTITY;
        self.line = (0.0, 0.0);
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        let [a, b, c, d, e, f] = self.matrix;
        self.matrix = [a, b, c, d, tx * a + ty * c + e, tx * b + ty * d + f];
        self.line = (0.0, 0.0);
    }

    fn next_line(&mut self) {
        self.move_line(0.0, self.leading);
    }
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    text: TextState,
}

// ============================================================
// Interpreter
// ============================================================

/// Glyph collector for one page
pub struct PageInterpreter<'a> {
    doc: &'a Document,
    fonts: HashMap<ObjectId, Rc<PdfFont>>,
    chars: Vec<TextChar>,
}

impl<'a> PageInterpreter<'a> {
    pub fn new(doc: &'a Document) -> Self {
        Self {
            doc,
            fonts: HashMap::new(),
            chars: Vec::new(),
        }
    }

    /// Interpret one page and return its glyphs in content-stream order
    pub fn run_page(mut self, page_number: u32, page_id: ObjectId) -> Result<Vec<TextChar>> {
        let doc = self.doc;
        let page = doc
            .get_object(page_id)
            .and_then(Object::as_dict)
            .map_err(|e| DocumentError::Page {
                page: page_number,
                message: e.to_string(),
            })?;

        let data = doc.get_page_content(page_id).map_err(|e| DocumentError::Page {
            page: page_number,
            message: format!("unreadable content: {e}"),
        })?;
        let content = Content::decode(&data).map_err(|e| DocumentError::Page {
            page: page_number,
            message: format!("undecodable content: {e}"),
        })?;

        let resources = inherited(doc, page, b"Resources").and_then(|obj| match obj {
            Object::Dictionary(d) => Some(d),
            _ => None,
        });
        let ctm = page_ctm(doc, page);
        log::trace!(
            "Page {}: {} operations, ctm {:?}",
            page_number,
            content.operations.len(),
            ctm
        );

        self.execute(&content, resources, ctm, 0);
        Ok(self.chars)
    }

    fn execute(
        &mut self,
        content: &Content,
        resources: Option<&'a Dictionary>,
        ctm: Matrix,
        depth: usize,
    ) {
        let mut state = GraphicsState {
            ctm,
            text: TextState::default(),
        };
        let mut stack: Vec<GraphicsState> = Vec::new();

        for op in &content.operations {
            let args = &op.operands;
            let num = |i: usize| args.get(i).and_then(number).unwrap_or(0.0);
            let text = &mut state.text;

            match op.operator.as_str() {
                "q" => stack.push(state.clone()),
                "Q" => {
                    if let Some(saved) = stack.pop() {
                        state = saved;
                    }
                }
                "cm" => {
                    let m = [num(0), num(1), num(2), num(3), num(4), num(5)];
                    state.ctm = mult_matrix(&m, &state.ctm);
                }
                "BT" => text.reset_matrix(),
                "ET" => {}
                "Tc" => text.charspace = num(0),
                "Tw" => text.wordspace = num(0),
                "Tz" => text.scaling = num(0),
                "TL" => text.leading = -num(0),
                "Ts" => text.rise = num(0),
                "Tf" => {
                    let font = match args.first() {
                        Some(Object::Name(name)) => self.font(resources, name),
                        _ => Rc::new(PdfFont::fallback()),
                    };
                    text.font = Some(font);
                    text.fontsize = num(1);
                }
                "Td" => text.move_line(num(0), num(1)),
                "TD" => {
                    text.leading = num(1);
                    text.move_line(num(0), num(1));
                }
                "Tm" => {
                    text.matrix = [num(0), num(1), num(2), num(3), num(4), num(5)];
                    text.line = (0.0, 0.0);
                }
                "T*" => text.next_line(),
                "Tj" => {
                    if let Some(s @ Object::String(..)) = args.first() {
                        self.show(&mut state, std::slice::from_ref(s));
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = args.first() {
                        self.show(&mut state, items);
                    }
                }
                "'" => {
                    text.next_line();
                    if let Some(s @ Object::String(..)) = args.first() {
                        self.show(&mut state, std::slice::from_ref(s));
                    }
                }
                "\"" => {
                    text.wordspace = num(0);
                    text.charspace = num(1);
                    text.next_line();
                    if let Some(s @ Object::String(..)) = args.get(2) {
                        self.show(&mut state, std::slice::from_ref(s));
                    }
                }
                "Do" => {
                    if let Some(Object::Name(name)) = args.first() {
                        self.paint_xobject(resources, name, state.ctm, depth);
                    }
                }
                _ => {}
            }
        }
    }

    fn font(&mut self, resources: Option<&'a Dictionary>, name: &[u8]) -> Rc<PdfFont> {
        let doc = self.doc;
        let entry = resources
            .and_then(|r| get_dict(doc, r, b"Font"))
            .and_then(|fonts| fonts.get(name).ok());

        let Some(entry) = entry else {
            log::warn!(
                "Font /{} not found in resources, using fallback",
                String::from_utf8_lossy(name)
            );
            return Rc::new(PdfFont::fallback());
        };

        if let Object::Reference(id) = entry {
            if let Some(font) = self.fonts.get(id) {
                return Rc::clone(font);
            }
        }

        let font = match super::resolve(doc, entry) {
            Object::Dictionary(dict) => Rc::new(PdfFont::load(doc, dict)),
            _ => {
                log::warn!("Font /{} is not a dictionary", String::from_utf8_lossy(name));
                Rc::new(PdfFont::fallback())
            }
        };
        if let Object::Reference(id) = entry {
            self.fonts.insert(*id, Rc::clone(&font));
        }
        font
    }

    fn paint_xobject(
        &mut self,
        resources: Option<&'a Dictionary>,
        name: &[u8],
        ctm: Matrix,
        depth: usize,
    ) {
        let doc = self.doc;
        let stream = resources
            .and_then(|r| get_dict(doc, r, b"XObject"))
            .and_then(|xobjects| get(doc, xobjects, name))
            .and_then(|obj| match obj {
                Object::Stream(s) => Some(s),
                _ => None,
            });
        let Some(stream) = stream else {
            return;
        };
        if get_name(doc, &stream.dict, b"Subtype") != Some(&b"Form"[..]) {
            return;
        }
        if depth >= MAX_FORM_DEPTH {
            log::warn!(
                "Form XObject /{} nested too deep, skipped",
                String::from_utf8_lossy(name)
            );
            return;
        }

        let data = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());
        let content = match Content::decode(&data) {
            Ok(content) => content,
            Err(e) => {
                log::warn!(
                    "Form XObject /{} undecodable: {}",
                    String::from_utf8_lossy(name),
                    e
                );
                return;
            }
        };

        let form_matrix = get_array(doc, &stream.dict, b"Matrix")
            .map(|items| items.iter().filter_map(number).collect::<Vec<f64>>())
            .and_then(|values| <[f64; 6]>::try_from(values).ok())
            .unwrap_or(IDENTITY);
        let form_resources = get_dict(doc, &stream.dict, b"Resources").or(resources);

        self.execute(
            &content,
            form_resources,
            mult_matrix(&form_matrix, &ctm),
            depth + 1,
        );
    }

    /// Show a string or a `TJ` array, advancing the text line position
    fn show(&mut self, state: &mut GraphicsState, items: &[Object]) {
        let text = &mut state.text;
        let Some(font) = text.font.clone() else {
            log::warn!("Text shown before any font was selected, skipped");
            return;
        };

        let matrix = mult_matrix(&text.matrix, &state.ctm);
        let fontsize = text.fontsize;
        let scaling = text.scaling * 0.01;
        let charspace = text.charspace * scaling;
        let wordspace = if font.is_multibyte() {
            0.0
        } else {
            text.wordspace * scaling
        };
        let rise = text.rise;
        let dxscale = 0.001 * fontsize * scaling;

        let (mut x, mut y) = text.line;
        let mut need_charspace = false;
        for item in items {
            match item {
                Object::String(bytes, _) => {
                    for code in font.decode(bytes) {
                        if need_charspace {
                            if font.vertical {
                                y += charspace;
                            } else {
                                x += charspace;
                            }
                        }
                        let glyph_matrix = translate_matrix(&matrix, (x, y));
                        let adv = self.render_char(&glyph_matrix, &font, fontsize, scaling, rise, code);
                        let space = if code == 32 { wordspace } else { 0.0 };
                        if font.vertical {
                            y += adv + space;
                        } else {
                            x += adv + space;
                        }
                        need_charspace = true;
                    }
                }
                other => {
                    if let Some(n) = number(other) {
                        if font.vertical {
                            y -= n * dxscale;
                        } else {
                            x -= n * dxscale;
                        }
                        need_charspace = true;
                    }
                }
            }
        }
        text.line = (x, y);
    }

    fn render_char(
        &mut self,
        matrix: &Matrix,
        font: &PdfFont,
        fontsize: f64,
        scaling: f64,
        rise: f64,
        code: u32,
    ) -> f64 {
        let text = font
            .to_unicode(code)
            .unwrap_or_else(|| format!("(cid:{code})"));
        let adv = font.advance(code) * fontsize * scaling;

        let (lower_left, upper_right) = if font.vertical {
            let (vx, vy) = font.position_vector(code);
            let vx = vx.map_or(fontsize * 0.5, |vx| vx * fontsize * 0.001);
            let vy = (1000.0 - vy) * fontsize * 0.001;
            ((-vx, vy + rise + adv), (-vx + fontsize, vy + rise))
        } else {
            let descent = font.descent() * fontsize;
            ((0.0, descent + rise), (adv, descent + rise + fontsize))
        };

        let (x0, y0) = apply_matrix(matrix, lower_left);
        let (x1, y1) = apply_matrix(matrix, upper_right);
        let bbox = BBox::new(x0, y0, x1, y1);
        let [a, b, c, d, _, _] = *matrix;

        let mut ch = TextChar::new(text, bbox);
        ch.upright = 0.0 < a * d * scaling && b * c <= 0.0;
        ch.size = if font.vertical { bbox.width() } else { bbox.height() };
        self.chars.push(ch);
        adv
    }
}

/// Page attribute, looked up through the `/Parent` chain when not set on the page
fn inherited<'a>(doc: &'a Document, page: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    let mut current = page;
    for _ in 0..32 {
        if let Some(value) = get(doc, current, key) {
            return Some(value);
        }
        current = match get(doc, current, b"Parent") {
            Some(Object::Dictionary(parent)) => parent,
            _ => return None,
        };
    }
    None
}

/// Initial CTM from the media box and page rotation
fn page_ctm(doc: &Document, page: &Dictionary) -> Matrix {
    let media_box = inherited(doc, page, b"MediaBox")
        .and_then(|obj| match obj {
            Object::Array(items) => {
                let values: Vec<f64> = items
                    .iter()
                    .filter_map(|o| number(super::resolve(doc, o)))
                    .collect();
                <[f64; 4]>::try_from(values).ok()
            }
            _ => None,
        })
        .unwrap_or([0.0, 0.0, 612.0, 792.0]);
    let [x0, y0, x1, y1] = media_box;
    let rotate = inherited(doc, page, b"Rotate")
        .and_then(number)
        .map_or(0, |r| (r as i64).rem_euclid(360));

    match rotate {
        90 => [0.0, -1.0, 1.0, 0.0, -y0, x1],
        180 => [-1.0, 0.0, 0.0, -1.0, x1, y1],
        270 => [0.0, 1.0, -1.0, 0.0, y1, -x0],
        _ => [1.0, 0.0, 0.0, 1.0, -x0, -y0],
    }
}

/// Interpret every page of a document in page-number order. A document that
/// is still encrypted is rejected.
pub fn extract_pages(doc: &Document) -> Result<Vec<Vec<TextChar>>> {
    if doc.trailer.get(b"Encrypt").is_ok() {
        return Err(DocumentError::Encrypted);
    }
    let pages = doc.get_pages();
    if pages.is_empty() {
        return Err(DocumentError::NoPages);
    }
    pages
        .into_iter()
        .map(|(number, id)| PageInterpreter::new(doc).run_page(number, id))
        .collect()
}
