use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use globetex::prelude::*;
use image::{Rgba, RgbaImage};

/// Drive the compositor without a 3D renderer: fly from orbit down to street
/// level over London, wait for tiles, and write the surface out as a PNG.
///
/// Usage: `cargo run --example headless -- [BASE_IMAGE] [OUTPUT]`
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let base_path = args.next().map(PathBuf::from);
    let output = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("globetex-london.png"));

    println!("Globe texture compositor, headless");
    println!("==================================");

    let config = CompositorConfig::default();
    let mut compositor = TileCompositor::builder()
        .with_config(config.clone())
        .build()
        .context("building compositor")?;

    let base = match base_path {
        Some(path) => image::open(&path)
            .with_context(|| format!("reading base image {}", path.display()))?
            .to_rgba8(),
        None => placeholder_world(),
    };
    compositor.init_with_image(base)?;

    let mut redraws = 0usize;
    let (tx, rx) = crossbeam_channel::unbounded();
    compositor.set_on_update(move || {
        let _ = tx.send(());
    });

    let (lat, lng) = (51.5074, -0.1278);
    for altitude in [2.0, 0.3, 0.01, 0.0001] {
        compositor.update(lat, lng, altitude);
        let settled = settle(&mut compositor, Duration::from_secs(20)).await;
        redraws += rx.try_iter().count();

        let stats = compositor.stats();
        let uv = compositor.uv_bounds();
        println!(
            "altitude {:<7} zoom {:>2}  tiles cached {:>3}  failed {:>2}  uv [{:.5}..{:.5}] x [{:.5}..{:.5}]{}",
            altitude,
            stats.zoom.unwrap_or_default(),
            stats.cached_tiles,
            stats.failed,
            uv.u_min,
            uv.u_max,
            uv.v_min,
            uv.v_max,
            if settled { "" } else { "  (timed out)" }
        );
        if !config.wants_tiles(altitude) {
            println!("  above the tile threshold, a globe would show its plain texture here");
        }
    }

    let transform = compositor.texture_transform();
    println!(
        "\nTexture repeat ({:.2}, {:.2}), offset ({:.2}, {:.2})",
        transform.repeat.0, transform.repeat.1, transform.offset.0, transform.offset.1
    );
    println!("Surface redrawn {} times", redraws);
    if compositor.tiles_active() {
        println!("Map data {}", compositor.attribution());
    }
    println!("Stats: {}", serde_json::to_string(&compositor.stats())?);

    compositor
        .surface()
        .save(&output)
        .with_context(|| format!("writing {}", output.display()))?;
    println!("Wrote {}", output.display());

    compositor.dispose();
    Ok(())
}

/// Poll until no downloads remain or `timeout` passes
async fn settle(compositor: &mut TileCompositor, timeout: Duration) -> bool {
    let start = Instant::now();
    loop {
        compositor.poll();
        if compositor.is_idle() {
            return true;
        }
        if start.elapsed() > timeout {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(16)).await;
    }
}

/// Equirectangular stand-in for a real world texture: ocean with a graticule
fn placeholder_world() -> RgbaImage {
    RgbaImage::from_fn(1024, 512, |x, y| {
        if x % 64 == 0 || y % 64 == 0 {
            Rgba([200, 200, 200, 255])
        } else {
            Rgba([20, 60, 120, 255])
        }
    })
}
