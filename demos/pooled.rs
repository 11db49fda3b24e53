//! # Example: pooled
//!
//! Demonstrates handle reuse through the driver's pool.
//!
//! Shows how to:
//! - Acquire short-lived tasks in waves
//! - Let finished handles return to the pool on their own
//! - Inspect pool counters with [`Driver::pool_stats`]
//! - Stop the frame pump with a [`CancellationToken`]
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► wave 1: acquire 3 tasks (pool empty → 3 created)
//!   ├─► drive until idle → all 3 self-recycle
//!   ├─► wave 2: acquire 3 tasks (3 reused)
//!   └─► drive with a 50ms deadline → cancelled, leftovers released manually
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example pooled
//! ```

use std::time::Duration;

use tickvisor::{
    drive, yields, Config, DriveExit, Driver, FrameLoop, IterRoutine, TaskHandle,
};
use tokio_util::sync::CancellationToken;

fn wave(driver: &Driver, label: &'static str, steps: usize) -> anyhow::Result<Vec<TaskHandle>> {
    (0..3)
        .map(|i| {
            let task = TaskHandle::acquire(driver, yields(steps + i), true)?;
            task.on_finished(move |manual| {
                println!("[{label}-{i}] finished (stopped: {manual})");
            })?;
            Ok::<_, anyhow::Error>(task)
        })
        .collect()
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();
    println!("=== pooled example ===\n");

    let cfg = Config {
        tick_interval: Duration::from_millis(5),
        pool_limit: 8,
        ..Config::default()
    };
    let frames = FrameLoop::new();
    let driver = Driver::new(cfg.clone(), frames.clone());

    // 1. First wave fills the pool
    let first = wave(&driver, "first", 2)?;
    drive(&frames, &cfg, &CancellationToken::new()).await;
    println!("after first wave: {:?}\n", driver.pool_stats::<TaskHandle>());

    // 2. Second wave reuses every handle
    let second = wave(&driver, "second", 1)?;
    for (a, b) in first.iter().zip(&second) {
        println!("reused same handle: {}", TaskHandle::ptr_eq(a, b));
    }
    drive(&frames, &cfg, &CancellationToken::new()).await;

    // 3. A never-ending task, cut short by cancelling the pump
    let endless = TaskHandle::acquire(&driver, IterRoutine::new(std::iter::repeat(())), true)?;
    let token = CancellationToken::new();
    let cancel = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
    });

    let report = drive(&frames, &cfg, &token).await;
    assert_eq!(report.exit, DriveExit::Cancelled);
    println!("\npump cancelled after {} ticks", report.ticks);

    endless.release()?;
    frames.run_until_idle(1);
    println!("final: {:?}", driver.pool_stats::<TaskHandle>());
    Ok(())
}
