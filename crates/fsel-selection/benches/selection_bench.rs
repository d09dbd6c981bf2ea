//! Benchmarks for selection movement.
//!
//! Run with: cargo bench -p fsel-selection --bench selection_bench
//!
//! Workloads:
//! - **Character walk**: caret moves right across a long paragraph.
//! - **Word extend**: extension by words from the document start.
//! - **Vertical**: consecutive line moves over wrapped text, holding the
//!   horizontal anchor.

use std::hint::black_box;
use std::rc::Rc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use fsel_core::{Granularity, Position, SelectionDirection};
use fsel_selection::{Alteration, SelectionController};
use fsel_text::{ElementData, LayoutMetrics, TextDocument};

// ── Fixtures ────────────────────────────────────────────────────────────

fn document(words: usize) -> (Rc<TextDocument>, fsel_core::NodeId) {
    let text: Vec<&str> = ["lorem", "ipsum", "dolor", "sit", "amet,"]
        .iter()
        .cycle()
        .take(words)
        .copied()
        .collect();
    let doc = TextDocument::with_root(ElementData::block().editable(true)).with_metrics(
        LayoutMetrics {
            wrap_columns: 60,
            ..LayoutMetrics::default()
        },
    );
    let node = doc
        .append_paragraph(doc.root(), &text.join(" "))
        .unwrap_or(fsel_core::NodeId(0));
    (Rc::new(doc), node)
}

fn walk(ctl: &mut SelectionController, alter: Alteration, g: Granularity, steps: usize) -> usize {
    let mut moved = 0;
    for _ in 0..steps {
        if ctl.modify(alter, SelectionDirection::Forward, g, true) {
            moved += 1;
        }
    }
    moved
}

// ── Benchmark Functions ─────────────────────────────────────────────────

fn bench_character_walk(c: &mut Criterion) {
    let mut group = c.benchmark_group("selection/character_walk");
    for words in [50usize, 500] {
        let (doc, node) = document(words);
        group.bench_with_input(BenchmarkId::from_parameter(words), &words, |b, _| {
            b.iter(|| {
                let mut ctl = SelectionController::new(&doc);
                ctl.move_to(Position::new(node, 0), false);
                black_box(walk(&mut ctl, Alteration::Move, Granularity::Character, 200))
            });
        });
    }
    group.finish();
}

fn bench_word_extend(c: &mut Criterion) {
    let mut group = c.benchmark_group("selection/word_extend");
    for words in [50usize, 500] {
        let (doc, node) = document(words);
        group.bench_with_input(BenchmarkId::from_parameter(words), &words, |b, _| {
            b.iter(|| {
                let mut ctl = SelectionController::new(&doc);
                ctl.move_to(Position::new(node, 0), false);
                black_box(walk(&mut ctl, Alteration::Extend, Granularity::Word, 40))
            });
        });
    }
    group.finish();
}

fn bench_vertical(c: &mut Criterion) {
    let (doc, node) = document(500);
    c.bench_function("selection/vertical_lines", |b| {
        b.iter(|| {
            let mut ctl = SelectionController::new(&doc);
            ctl.move_to(Position::new(node, 17), false);
            black_box(walk(&mut ctl, Alteration::Move, Granularity::Line, 30))
        });
    });
}

criterion_group!(benches, bench_character_walk, bench_word_extend, bench_vertical);
criterion_main!(benches);
