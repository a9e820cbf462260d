// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cadence playground - headless transition demo
//!
//! Runs a few chained transitions against a stand-in panel:
//! - Fade and slide in, then settle with a bounce
//! - Brush crossfade from a solid fill to a gradient
//! - An exclusive transition interrupted by a newer one
//!
//! ## Architecture
//!
//! Property writes are marshaled onto a dedicated home thread, standing in for
//! a UI thread, while frame loops run on a tokio runtime. An optional RON
//! config file path may be passed as the first argument.

mod panel;

use cadence_interp::{Brush, Color, CornerRadius, Ease, Gradient, Point, Thickness, Transform2D};
use cadence_transition::{
    read_on_home, DispatchPriority, EngineConfig, HomeThread, Outcome, TransitionEngine, TransitionEventArgs,
};
use panel::{Panel, BACKGROUND, CORNERS, OFFSET, OPACITY, PADDING, TRANSFORM};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn main() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("cadence_playground=info,cadence_transition=debug,cadence_interp=info")
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_thread_names(true))
        .init();

    tracing::info!("Starting Cadence playground v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run() {
        tracing::error!("Playground failed: {e}");
        std::process::exit(1);
    }
}

fn run() -> cadence_transition::Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load(Path::new(&path))?,
        None => EngineConfig::default(),
    };

    let home = Arc::new(HomeThread::spawn(config.home_thread_name.clone())?);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("cadence-frames")
        .enable_all()
        .build()?;

    let engine = TransitionEngine::builder()
        .config(config)
        .dispatcher(home.clone())
        .runtime(runtime.handle().clone())
        .build()?;

    let result = runtime.block_on(demo(&engine, &home));
    home.shutdown();
    result
}

async fn demo(engine: &TransitionEngine, home: &HomeThread) -> cadence_transition::Result<()> {
    let panel = Panel::new("toast");

    // Fade and slide in, then settle the padding with a bounce
    let name = panel.name().to_string();
    let entrance = engine
        .transition(&panel)
        .property(OPACITY, 1.0)?
        .property(OFFSET, Point::new(0.0, 0.0))?
        .effect_with(|e| {
            e.duration = Duration::from_millis(300);
            e.ease = Arc::new(Ease::OutCubic);
            e.on_completed(move |args: &TransitionEventArgs| {
                tracing::info!("{} visible after frame {}", name, args.frame_index);
            });
        })
        .await_then(Duration::from_millis(100))
        .property(PADDING, Thickness::uniform(12.0))?
        .property(CORNERS, CornerRadius::uniform(8.0))?
        .effect_with(|e| {
            e.duration = Duration::from_millis(400);
            e.ease = Arc::new(Ease::OutBounce);
        })
        .execute();
    report(&panel, home, "entrance", entrance.join().await).await;

    // Solid to gradient has no in-between brush; it crossfades instead
    let gradient = Brush::LinearGradient(Gradient::two_stop(Color::rgb(32, 64, 160), Color::rgb(160, 32, 96)));
    let fill = engine
        .transition(&panel)
        .property(BACKGROUND, gradient)?
        .effect_with(|e| {
            e.duration = Duration::from_millis(250);
            e.on_update(|args| {
                if args.frame_index % 5 == 0 {
                    tracing::debug!("Crossfade at {:.2}", args.progress);
                }
            });
        })
        .execute();
    report(&panel, home, "fill", fill.join().await).await;

    // A pulse that never ends on its own, interrupted by a newer exclusive transition
    let pulse = engine
        .transition(&panel)
        .property(TRANSFORM, Transform2D::scale(1.1))?
        .effect_with(|e| {
            e.duration = Duration::from_millis(200);
            e.is_auto_reverse = true;
            e.loop_time = cadence_transition::LOOP_FOREVER;
            e.ease = Arc::new(Ease::InOutSine);
            e.on_canceled(|_| tracing::info!("Pulse interrupted"));
        })
        .execute();
    tokio::time::sleep(Duration::from_millis(500)).await;

    let exit = engine
        .transition(&panel)
        .property(OPACITY, 0.0)?
        .property(TRANSFORM, Transform2D::rotation(-4.0))?
        .effect_with(|e| {
            e.duration = Duration::from_millis(200);
            e.ease = Arc::new(Ease::InBack);
            e.priority = DispatchPriority::Normal;
        })
        .execute();
    report(&panel, home, "pulse", pulse.join().await).await;
    report(&panel, home, "exit", exit.join().await).await;

    Ok(())
}

/// Log a run's outcome with the panel state as seen from the home thread
async fn report(panel: &Arc<Panel>, home: &HomeThread, label: &str, outcome: Outcome) {
    let panel = panel.clone();
    let state = read_on_home(home, DispatchPriority::Idle, move || panel.describe()).await;
    match state {
        Some(state) => tracing::info!("{label}: {outcome:?} | {state}"),
        None => tracing::warn!("{label}: {outcome:?} | home thread gone"),
    }
}
