//! Synthetic newspaper PDFs for integration tests
//!
//! Text is drawn with a Type0 font (Identity-H or Identity-V) whose codes
//! are mapped back to Unicode through a ToUnicode CMap, the way typeset
//! Chinese newspapers embed their fonts.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, encryption, Document, Object, Stream, StringFormat};

pub const FONT_SIZE: i64 = 12;

/// One run of text drawn at a position
#[derive(Debug, Clone)]
pub struct TextRun {
    pub text: String,
    pub x: i64,
    pub y: i64,
    pub vertical: bool,
}

pub fn run(text: &str, x: i64, y: i64) -> TextRun {
    TextRun {
        text: text.to_string(),
        x,
        y,
        vertical: false,
    }
}

pub fn vertical_run(text: &str, x: i64, y: i64) -> TextRun {
    TextRun {
        vertical: true,
        ..run(text, x, y)
    }
}

/// The page layout the line-scan strategy expects
pub fn front_page(header: &str, title: &str, body: &str) -> Vec<TextRun> {
    vec![
        run(header, 50, 750),
        run("行业/人口", 50, 700),
        run(title, 50, 650),
        run(body, 50, 600),
    ]
}

fn to_unicode_cmap(codes: &BTreeMap<char, u16>) -> Vec<u8> {
    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n\
         /CMapName /Test-UCS def\n1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
    );
    cmap.push_str(&format!("{} beginbfchar\n", codes.len()));
    for (ch, code) in codes {
        let mut units = [0u16; 2];
        let hex: String = ch
            .encode_utf16(&mut units)
            .iter()
            .map(|u| format!("{u:04X}"))
            .collect();
        cmap.push_str(&format!("<{code:04X}> <{hex}>\n"));
    }
    cmap.push_str("endbfchar\nendcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
    cmap.into_bytes()
}

/// Build a PDF with one page per entry of `pages`
pub fn newspaper_pdf(pages: &[Vec<TextRun>]) -> Vec<u8> {
    let mut codes: BTreeMap<char, u16> = BTreeMap::new();
    for page in pages {
        for r in page {
            for ch in r.text.chars() {
                let next = codes.len() as u16 + 1;
                codes.entry(ch).or_insert(next);
            }
        }
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let cmap_id = doc.add_object(Stream::new(dictionary! {}, to_unicode_cmap(&codes)));
    let cid_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType2",
        "BaseFont" => "SimSun",
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("Identity"),
            "Supplement" => Object::Integer(0),
        },
        "DW" => Object::Integer(1000),
    });
    let font = |encoding: &str| {
        dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => "SimSun",
            "Encoding" => Object::Name(encoding.as_bytes().to_vec()),
            "DescendantFonts" => vec![Object::Reference(cid_font_id)],
            "ToUnicode" => Object::Reference(cmap_id),
        }
    };
    let horizontal_id = doc.add_object(font("Identity-H"));
    let vertical_id = doc.add_object(font("Identity-V"));
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => Object::Reference(horizontal_id),
            "F2" => Object::Reference(vertical_id),
        },
    });

    let mut kids = Vec::new();
    for page in pages {
        let mut operations = Vec::new();
        for r in page {
            let bytes: Vec<u8> = r
                .text
                .chars()
                .flat_map(|ch| codes[&ch].to_be_bytes())
                .collect();
            let font_name = if r.vertical { "F2" } else { "F1" };
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new(
                "Tf",
                vec![Object::Name(font_name.as_bytes().to_vec()), Object::Integer(FONT_SIZE)],
            ));
            operations.push(Operation::new(
                "Tm",
                vec![
                    Object::Integer(1),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(1),
                    Object::Integer(r.x),
                    Object::Integer(r.y),
                ],
            ));
            operations.push(Operation::new(
                "Tj",
                vec![Object::String(bytes, StringFormat::Hexadecimal)],
            ));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations }
            .encode()
            .expect("content encodes");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "Contents" => Object::Reference(content_id),
            "Resources" => Object::Reference(resources_id),
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(count),
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(595),
                Object::Integer(842),
            ],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut out = Vec::new();
    doc.save_to(&mut out).expect("pdf serializes");
    out
}

/// Standard security handler (RC4, 40-bit, revision 2) over `newspaper_pdf`.
///
/// Without `user_check` the file only carries an owner password and opens
/// with the empty user password. With it, a `/U` entry that no empty
/// password can satisfy is added.
pub fn encrypted_newspaper_pdf(pages: &[Vec<TextRun>], user_check: bool) -> Vec<u8> {
    let mut doc = Document::load_mem(&newspaper_pdf(pages)).expect("pdf reloads");
    let file_id = b"newspaper-sample".to_vec();
    doc.trailer.set(
        "ID",
        vec![
            Object::String(file_id.clone(), StringFormat::Hexadecimal),
            Object::String(file_id, StringFormat::Hexadecimal),
        ],
    );

    let mut encrypt = dictionary! {
        "Filter" => "Standard",
        "V" => Object::Integer(1),
        "R" => Object::Integer(2),
        "Length" => Object::Integer(40),
        "O" => Object::String(vec![0x5A; 32], StringFormat::Hexadecimal),
        "P" => Object::Integer(-44),
    };
    if user_check {
        encrypt.set("U", Object::String(vec![0xA5; 32], StringFormat::Hexadecimal));
    }
    let encrypt_id = doc.add_object(encrypt);
    doc.trailer.set("Encrypt", Object::Reference(encrypt_id));

    let key = encryption::get_encryption_key(&doc, "", false).expect("key derives");
    for (&id, obj) in doc.objects.iter_mut() {
        if id == encrypt_id {
            continue;
        }
        // RC4 is symmetric, so the decryption routine also encrypts
        let Ok(cipher) = encryption::decrypt_object(&key, id, &*obj) else {
            continue;
        };
        match obj {
            Object::Stream(stream) => stream.set_content(cipher),
            Object::String(content, _) => *content = cipher,
            _ => {}
        }
    }

    let mut out = Vec::new();
    doc.save_to(&mut out).expect("pdf serializes");
    out
}

pub fn write_pdf(path: &Path, pages: &[Vec<TextRun>]) {
    std::fs::write(path, newspaper_pdf(pages)).expect("pdf written");
}
