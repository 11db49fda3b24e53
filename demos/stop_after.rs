//! # Example: stop_after
//!
//! Demonstrates stopping a never-ending task from a second task.
//!
//! Shows how to:
//! - Write a task body as an `async` block suspended with [`next_tick`]
//! - Compose a timeout from a [`Timed`] task and a finished subscriber
//! - Pump the frame loop from tokio with [`drive`]
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► spinner: async loop, one frame per tick
//!   ├─► timeout: Timed over 200ms, prints progress
//!   │     └─► on finished → spinner.stop()
//!   └─► drive(frames) until idle
//!         ├─► tick N:   timeout exhausts, Finished(false)
//!         └─► tick N+1: spinner sees the stop, Finished(true)
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example stop_after
//! ```

use std::rc::Rc;
use std::time::Duration;

use tickvisor::{
    drive, next_tick, Config, Driver, FrameLoop, FutureRoutine, Subscribe, TaskHandle,
};
use tokio_util::sync::CancellationToken;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();
    println!("=== stop_after example ===\n");

    // 1. Configure driver: 60 ticks per second
    let cfg = Config {
        tick_interval: Duration::from_millis(16),
        ..Config::default()
    };

    // 2. Optional: log driver events (requires "logging" feature)
    #[cfg(feature = "logging")]
    let subs: Vec<Rc<dyn Subscribe>> = vec![Rc::new(tickvisor::LogWriter::new())];
    #[cfg(not(feature = "logging"))]
    let subs: Vec<Rc<dyn Subscribe>> = Vec::new();

    // 3. Create the frame loop and the driver on top of it
    let frames = FrameLoop::new();
    let driver = Driver::builder(cfg.clone())
        .with_host(frames.clone())
        .with_subscribers(subs)
        .build();

    // 4. A task that would spin forever
    let spinner = TaskHandle::acquire(
        &driver,
        FutureRoutine::new(async {
            let mut frame = 0u64;
            loop {
                if frame % 4 == 0 {
                    println!("[spinner] frame {frame}");
                }
                frame += 1;
                next_tick().await;
            }
        }),
        true,
    )?;
    spinner.on_finished(|manual| println!("[spinner] finished (stopped: {manual})"))?;

    // 5. The timeout: stops the spinner once 200ms of frame time passed
    let timeout = TaskHandle::acquire_timed(
        &driver,
        Duration::from_millis(200),
        |t| {
            if (0.5..0.6).contains(&t) {
                println!("[timeout] halfway");
            }
        },
        true,
    )?;
    let target = spinner.clone();
    timeout.on_finished(move |_| {
        if let Err(err) = target.stop() {
            eprintln!("[timeout] cannot stop spinner: {err}");
        }
    })?;

    // 6. Run the frame loop until nothing is scheduled
    let report = drive(&frames, &cfg, &CancellationToken::new()).await;
    println!("\nframe loop idle after {} ticks", report.ticks);
    println!("spinner released: {}", spinner.is_released());
    Ok(())
}
