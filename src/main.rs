use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use raylib::prelude::*;
use tokio::sync::oneshot;
use tracing::info;
use tracing_subscriber::EnvFilter;

use carousel::config::{CarouselConfig, ConfigOverrides};
use carousel::constants::*;
use carousel::discovery::discover;
use carousel::decode::DecodedCache;
use carousel::preload::DecodingPreloader;
use carousel::prober::FsProber;
use carousel::{AssetList, Carousel};

mod stage;
mod texture_loader;

use crate::stage::{Hit, Stage};

#[derive(Parser, Debug)]
#[command(name = "carousel", version, about = "Rotate through the images found under a directory")]
struct Args {
    /// Directory asset references are resolved against
    root: PathBuf,

    /// JSON file with carousel settings
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: ConfigOverrides,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = CarouselConfig::layered(args.config.as_deref(), &args.overrides)?;

    // Without its root there is nothing to anchor the carousel to.
    if !args.root.is_dir() {
        info!(root = %args.root.display(), "asset root not found, carousel disabled");
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let prober = Arc::new(FsProber::new(&args.root));

    // --- Discover and build the asset list while the window is already up ---
    let (assets_tx, mut assets_rx) = oneshot::channel();
    {
        let prober = Arc::clone(&prober);
        let params = config.discovery_params();
        let configured = config.configured_assets();
        let fallback = config.fallback_asset();
        runtime.spawn(async move {
            let discovered = discover(prober, &params).await;
            let _ = assets_tx.send(AssetList::build(&configured, &discovered, fallback));
        });
    }

    let decoded = DecodedCache::default();
    let preloader =
        DecodingPreloader::new(runtime.handle().clone(), prober, decoded.clone(), config.probe_timeout());
    let mut carousel = Carousel::new(preloader, config.timing());

    let (mut rl, thread) = raylib::init()
        .size(WINDOW_WIDTH, WINDOW_HEIGHT)
        .title("Carousel")
        .vsync()
        .resizable()
        .build();
    rl.set_target_fps(FPS);
    rl.set_trace_log(TraceLogLevel::LOG_ERROR);

    let mut stage = Stage::new(&args.root, decoded);
    let mut hovered = false;

    // --- Main Loop ---
    while !rl.window_should_close() {
        let dt = rl.get_frame_time();

        if let Ok(assets) = assets_rx.try_recv() {
            info!(assets = ?assets.as_slice(), "asset list built");
            carousel.initialize(assets);
            if hovered {
                carousel.pointer_enter();
            }
        }

        // --- Input ---
        let inside = rl.is_cursor_on_screen();
        if inside != hovered {
            hovered = inside;
            if inside {
                carousel.pointer_enter();
            } else {
                carousel.pointer_leave();
            }
        }

        if rl.is_key_pressed(KeyboardKey::KEY_RIGHT) {
            carousel.next();
        }
        if rl.is_key_pressed(KeyboardKey::KEY_LEFT) {
            carousel.prev();
        }
        if rl.is_mouse_button_pressed(MouseButton::MOUSE_BUTTON_LEFT) {
            let sw = rl.get_screen_width() as f32;
            let sh = rl.get_screen_height() as f32;
            match stage::hit_test(rl.get_mouse_position(), carousel.indicators().len(), sw, sh) {
                Some(Hit::Prev) => carousel.prev(),
                Some(Hit::Next) => carousel.next(),
                Some(Hit::Indicator(index)) => carousel.select(index),
                None => {}
            }
        }

        // --- Update Logic ---
        carousel.update(dt);
        stage.sync(&mut rl, &thread, carousel.displayed());

        // --- Render ---
        let mut d = rl.begin_drawing(&thread);
        d.clear_background(Color::BLACK);
        stage.draw(&mut d, carousel.opacity());
        stage::draw_controls(&mut d, carousel.indicators());
    }

    carousel.dispose();
    runtime.shutdown_background();
    Ok(())
}
