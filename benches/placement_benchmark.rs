//! Placement benchmark: burst sends, saturated drains and raw timer churn.
//!
//! Target: a 1000-message burst over 20 lanes in well under a millisecond.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use danmaku::timer::TimerQueue;
use danmaku::{Danmaku, DanmakuConfig, MemoryStage, OutputBuffer, Rect, TerminalStage};
use std::time::Duration;

fn scheduler(lines: usize) -> Danmaku<MemoryStage> {
    let stage = MemoryStage::new(1920.0, 1080.0).with_measure(|body| body.len() as f64 * 12.0);
    let config = DanmakuConfig::default().with_line_count(lines).with_seed(9);
    Danmaku::new(stage, config).unwrap()
}

fn burst_placement(c: &mut Criterion) {
    let mut group = c.benchmark_group("burst_placement");
    for lines in [5, 20, 80] {
        group.bench_with_input(BenchmarkId::from_parameter(lines), &lines, |b, &lines| {
            b.iter(|| {
                let mut danmaku = scheduler(lines);
                for i in 0..1000 {
                    black_box(danmaku.send(black_box(if i % 2 == 0 { "hello" } else { "a longer comment" })));
                }
                danmaku
            });
        });
    }
    group.finish();
}

fn saturated_drain(c: &mut Criterion) {
    c.bench_function("drain_500_over_10_lanes", |b| {
        b.iter(|| {
            let mut danmaku = scheduler(10);
            for _ in 0..500 {
                danmaku.send("queued comment");
            }
            // 500 entries at 500ms per tick.
            danmaku.advance_by(Duration::from_secs(300));
            black_box(danmaku.overflow().len())
        });
    });
}

fn timer_queue_churn(c: &mut Criterion) {
    c.bench_function("timer_queue_10k_once", |b| {
        b.iter(|| {
            let mut timers: TimerQueue<u32> = TimerQueue::new();
            for i in 0..10_000u32 {
                let id = timers.schedule_once(Duration::from_micros(u64::from(i % 997)), i);
                if i % 3 == 0 {
                    timers.cancel(id);
                }
            }
            let mut fired = 0u32;
            while timers.pop_due(Duration::from_secs(1)).is_some() {
                fired += 1;
            }
            black_box(fired)
        });
    });
}

fn terminal_render(c: &mut Criterion) {
    let config = DanmakuConfig::default()
        .with_line_count(50)
        .with_margin(4.0)
        .with_colorize(true)
        .with_seed(3);
    let mut danmaku = Danmaku::new(TerminalStage::new(Rect::from_size(200, 50)), config).unwrap();
    for i in 0..200 {
        danmaku.send(&format!("comment number {i} 🎉"));
    }
    danmaku.advance_by(Duration::from_secs(2));
    let mut out = OutputBuffer::with_capacity(64 * 1024);

    c.bench_function("terminal_render_200x50", |b| {
        b.iter(|| {
            out.clear();
            danmaku.stage().render(black_box(danmaku.now()), &mut out);
            black_box(out.len())
        });
    });
}

criterion_group!(
    benches,
    burst_placement,
    saturated_drain,
    timer_queue_churn,
    terminal_render
);
criterion_main!(benches);
