//! Header parsing and layout analysis benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use newspaper_pdf::layout::{analyze_page, BBox, TextChar};
use newspaper_pdf::{HeaderParser, HeaderStrategy, LayoutParams, ParserOptions};

fn page_text() -> String {
    let mut text = String::from("人民日报/2020年3月5日/第4版\n\n行业/人口\n\n全国人口普查启动\n\n");
    for i in 0..200 {
        text.push_str(&format!("第{i}段正文内容，记者从有关部门获悉。\n\n"));
    }
    text.push('\x0c');
    text
}

/// A page of two text columns, 40 rows of 20 glyphs each
fn page_chars() -> Vec<TextChar> {
    let mut chars = Vec::new();
    for column in 0..2 {
        for row in 0..40 {
            for i in 0..20 {
                let x = 50.0 + column as f64 * 270.0 + i as f64 * 12.0;
                let y = 780.0 - row as f64 * 14.0;
                chars.push(TextChar::new("字", BBox::new(x, y, x + 12.0, y + 12.0)));
            }
        }
    }
    chars
}

fn bench_header(c: &mut Criterion) {
    let text = page_text();
    let mut group = c.benchmark_group("header");
    for strategy in [HeaderStrategy::LineScan, HeaderStrategy::ParagraphSplit] {
        let parser = HeaderParser::new(ParserOptions::builder().strategy(strategy).build());
        group.bench_function(strategy.as_str(), |b| {
            b.iter(|| parser.parse(black_box(&text)))
        });
    }
    group.finish();
}

fn bench_layout(c: &mut Criterion) {
    let chars = page_chars();
    let params = LayoutParams::default();
    c.bench_function("layout_two_columns", |b| {
        b.iter(|| analyze_page(black_box(&chars), &params))
    });
}

criterion_group!(benches, bench_header, bench_layout);
criterion_main!(benches);
