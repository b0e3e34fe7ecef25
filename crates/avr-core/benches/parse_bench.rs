//! Criterion benchmarks for reply-line parsing.
//!
//! The poll loop parses every reply line the receiver emits, so parsing sits
//! on the hot path of the 2-second status cycle.
//!
//! Run with:
//! ```bash
//! cargo bench --package avr-core --bench parse_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use avr_core::protocol::event::ReceiverEvent;
use avr_core::protocol::state::ReceiverState;

const REPLY_LINES: &[&str] = &[
    "PWON",
    "MV55",
    "MV675",
    "MUOFF",
    "SICBL/SAT",
    "MSSTEREO",
    "Z2MUON",
    "Z240",
    "MVMAX 80",
    "CVFL 50",
];

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_reply");
    for line in REPLY_LINES {
        group.bench_with_input(BenchmarkId::from_parameter(line), line, |b, line| {
            b.iter(|| ReceiverEvent::parse(black_box(line)));
        });
    }
    group.finish();
}

fn bench_poll_cycle(c: &mut Criterion) {
    // One full poll tick: fold every reply into a state record.
    c.bench_function("apply_poll_replies", |b| {
        b.iter(|| {
            let mut state = ReceiverState::default();
            for line in REPLY_LINES {
                state.apply_line(black_box(line));
            }
            state
        });
    });
}

criterion_group!(benches, bench_parse, bench_poll_cycle);
criterion_main!(benches);
