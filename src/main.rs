//! Simulation driver for the overlay engine.
//
//! Opens a JSON-backed store, reconciles instance bookkeeping, then
//! replays a scripted session: launch windows, drag and resize one,
//! edit spotlight openings, and report what survived to disk. Run it
//! twice against the same store file to watch recovery reattach the
//! previous session's windows.

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use overlay_wm::{
    FeatureKind, JsonFileStore, OverlayService, Point, ScreenBounds, TouchEvent,
};

#[derive(Parser, Debug)]
#[command(name = "overlay-wm", about = "Overlay widget engine simulation driver")]
struct Args {
    /// Path of the JSON state store.
    #[arg(long, default_value = "overlay-state.json")]
    store: PathBuf,

    /// Screen width in device pixels.
    #[arg(long, default_value_t = 1920)]
    screen_width: u32,

    /// Screen height in device pixels.
    #[arg(long, default_value_t = 1080)]
    screen_height: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    overlay_wm::tracing_sub::init_default();
    let args = Args::parse();

    let store = Arc::new(JsonFileStore::open(&args.store)?);
    let bounds = ScreenBounds::new(args.screen_width, args.screen_height);
    let service = OverlayService::new(store, bounds);

    let adopted = service.recover_all().await?;
    if adopted > 0 {
        println!("recovered {adopted} window(s) from {}", args.store.display());
    }

    let mut clock = service.open_window(FeatureKind::Clock).await?;
    let start = clock.controller.current_bounds();
    println!(
        "clock #{} opened at ({}, {}) {}x{}",
        clock.instance, start.x, start.y, start.width, start.height
    );

    // Drag the clock toward the top-left corner.
    let grab = Point::new(start.x as f32 + 40.0, start.y as f32 + 40.0);
    clock.controller.on_touch_event(TouchEvent::Down(grab));
    clock
        .controller
        .on_touch_event(TouchEvent::Move(Point::new(60.0, 60.0)));
    clock
        .controller
        .on_touch_event(TouchEvent::Up(Point::new(60.0, 60.0)));
    let dragged = clock.controller.current_bounds();
    println!(
        "clock #{} dragged to ({}, {})",
        clock.instance, dragged.x, dragged.y
    );

    // Grow it from the trailing corner; the aspect ratio is preserved.
    let corner = Point::new(
        (dragged.x + dragged.width as i32) as f32 - 5.0,
        (dragged.y + dragged.height as i32) as f32 - 5.0,
    );
    clock.controller.on_touch_event(TouchEvent::Down(corner));
    clock
        .controller
        .on_touch_event(TouchEvent::Move(Point::new(corner.x + 80.0, corner.y + 80.0)));
    clock
        .controller
        .on_touch_event(TouchEvent::Up(Point::new(corner.x + 80.0, corner.y + 80.0)));
    let resized = clock.controller.current_bounds();
    println!(
        "clock #{} resized to {}x{} (aspect {:.3})",
        clock.instance,
        resized.width,
        resized.height,
        resized.aspect()
    );

    // A spotlight window with its opening collection.
    let spotlight = service.open_window(FeatureKind::Spotlight).await?;
    let mut openings = service.open_opening_set(&spotlight).await?;
    let mut subscription = openings.subscribe();

    let added = openings.add_opening()?;
    openings.toggle_shape(added.id);
    openings.toggle_lock(added.id);
    println!(
        "spotlight #{} now shows {} openings",
        spotlight.instance,
        openings.openings().len()
    );

    // Let the background workers land every commit, then show what the
    // observers saw.
    service.writer().drain().await;
    while let Some(committed) = subscription.try_recv() {
        let state = committed.ui_state();
        println!(
            "committed revision {}: {} opening(s), any locked: {}",
            committed.revision,
            state.openings.len(),
            state.is_any_locked
        );
    }

    for kind in FeatureKind::ALL {
        let active = service.pool().active_ids(kind);
        if !active.is_empty() {
            println!("{kind}: active instances {active:?}");
        }
    }
    println!("state saved to {}", args.store.display());
    Ok(())
}
