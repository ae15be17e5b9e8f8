//! Smoke test: run the scheduler headless on a virtual clock.
//!
//! Pushes a burst through a small stage, pauses halfway, resumes and
//! prints what happened. No terminal required.

use danmaku::{Completion, Danmaku, DanmakuConfig, LaneKind, MemoryStage, Placement};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn main() -> danmaku::Result<()> {
    println!("Danmaku Smoke Test");
    println!("==================");
    println!();

    let stage = MemoryStage::new(1280.0, 360.0).with_measure(|body| body.chars().count() as f64 * 14.0);
    let config = DanmakuConfig::default().with_line_count(6).with_seed(42);
    let mut danmaku = Danmaku::new(stage, config)?;

    let finished: Arc<Mutex<Vec<Completion>>> = Arc::new(Mutex::new(Vec::new()));
    let mut placed = 0;
    let mut deferred = 0;

    for i in 0..40 {
        let sink = Arc::clone(&finished);
        let placement = danmaku.send_with(
            &format!("comment #{i}"),
            None,
            Some(Box::new(move |done: &Completion| {
                if let Ok(mut done_list) = sink.lock() {
                    done_list.push(*done);
                }
            })),
        );
        match placement {
            Placement::Placed { .. } => placed += 1,
            Placement::Deferred => deferred += 1,
            Placement::Dropped | Placement::Ignored => {}
        }
    }
    danmaku.centered_send("centered banner");

    println!("Burst of 40: {placed} placed, {deferred} deferred");
    println!("Lanes busy:  {}", danmaku.lanes().occupied(LaneKind::Scrolling));
    println!();

    for second in 1..=6 {
        danmaku.advance_by(Duration::from_secs(1));
        println!(
            "t={second:>2}s  on stage: {:>2}  queued: {:>2}  finished: {:>2}",
            danmaku.stage().len(),
            danmaku.overflow().len(),
            finished.lock().map_or(0, |done| done.len()),
        );
    }

    danmaku.pause();
    println!();
    println!("Paused with {} messages frozen", danmaku.flights().count());
    danmaku.advance_by(Duration::from_secs(5));
    danmaku.play();
    println!("Resumed");
    println!();

    danmaku.advance_by(Duration::from_secs(60));
    println!(
        "Drained: on stage {}, queued {}, finished with callback {}",
        danmaku.stage().len(),
        danmaku.overflow().len(),
        finished.lock().map_or(0, |done| done.len()),
    );
    println!("Removed in order: {} elements", danmaku.stage().removed().len());

    Ok(())
}
