use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use tilemap::prelude::*;

/// Paints every tile a flat colour derived from its URL, so the demo runs
/// without network access. Pass `--http` to fetch real OpenStreetMap tiles.
struct CheckerLoader;

#[async_trait]
impl ImageLoader for CheckerLoader {
    type Bitmap = RgbaImage;

    async fn load(&self, url: &str) -> tilemap::Result<RgbaImage> {
        tokio::time::sleep(Duration::from_millis(5)).await;
        let shade = (url.len() * 37 % 200) as u8 + 40;
        Ok(RgbaImage::from_pixel(256, 256, Rgba([shade, shade, shade, 255])))
    }
}

const OSM: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";

const MARKERS: &str = r##"[
    {"latitude": 48.8566, "longitude": 2.3522, "size": 24, "circle": "blue", "cluster": "#1c7ed6", "clickable": true},
    {"latitude": 48.8606, "longitude": 2.3376, "size": 24, "circle": "blue", "cluster": "#1c7ed6", "clickable": true},
    {"latitude": 45.7640, "longitude": 4.8357, "size": 24, "circle": "blue", "cluster": "#1c7ed6"},
    {"latitude": 43.2965, "longitude": 5.3698, "size": 18, "circle": "#e8590c"}
]"##;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tilemap::init_logging();
    let use_http = std::env::args().any(|arg| arg == "--http");

    let spawner = Arc::new(TokioSpawner::current().ok_or_else(|| anyhow::anyhow!("no runtime"))?);
    let surface = RenderContext::<RgbaImage>::new(1024, 768);

    if use_http {
        let map = TileMap::new(surface, Arc::new(HttpImageLoader::new()), spawner);
        run(map).await
    } else {
        let map = TileMap::new(surface, Arc::new(CheckerLoader), spawner);
        run(map).await
    }
}

async fn run<L>(mut map: TileMap<RenderContext<RgbaImage>, L>) -> anyhow::Result<()>
where
    L: ImageLoader<Bitmap = RgbaImage>,
{
    println!("🗺️ tilemap headless demo");

    map.init(TileMapConfig::new(OSM).with_zoom_range(2, 18))?;
    map.move_to(48.8566, 2.3522, Some(6))?;
    map.set_markers_json("cities", &serde_json::from_str::<serde_json::Value>(MARKERS)?)?;
    map.set_on_click(|markers| {
        log::info!("clicked {} marker(s)", markers.len());
    });

    settle(&mut map).await;
    report(&map);

    // Drag the map a little to the east, then zoom in on the centre
    let center = map.viewport().screen_center();
    map.update(&PointerState::at(center.x, center.y).with_left(ButtonState::Down { frames: 1 }));
    map.update(&PointerState::at(center.x - 120.0, center.y).with_left(ButtonState::Down { frames: 2 }));
    map.update(&PointerState::at(center.x - 120.0, center.y).with_left(ButtonState::Released));
    map.zoom(2, None);

    settle(&mut map).await;
    report(&map);

    let stats = map.fetch_stats();
    log::info!(
        "fetches: {} started, {} loaded, {} failed, {} discarded",
        stats.started,
        stats.loaded,
        stats.failed,
        stats.discarded
    );
    println!("\n✅ Headless demo completed");
    Ok(())
}

/// Drive frames until the map stops animating and no fetch is outstanding
async fn settle<L>(map: &mut TileMap<RenderContext<RgbaImage>, L>)
where
    L: ImageLoader<Bitmap = RgbaImage>,
{
    for _ in 0..600 {
        map.update(&PointerState::default());
        map.draw();
        if !map.is_busy() && map.scheduler().in_flight() == 0 && map.scheduler().misses() == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(16)).await;
    }
    log::warn!("map did not settle within 600 frames");
}

fn report<L>(map: &TileMap<RenderContext<RgbaImage>, L>)
where
    L: ImageLoader<Bitmap = RgbaImage>,
{
    let center = map.coordinates();
    let surface = map.surface();
    println!(
        "\n📍 {:.4}, {:.4} at zoom {}",
        center.lat,
        center.lng,
        map.zoom_level()
    );
    println!("   tiles cached: {}", map.tile_cache().len());
    println!("   elements: {}", map.elements().len());
    println!(
        "   last frame: {} bitmaps, {} circles, {} labels",
        surface.bitmaps().count(),
        surface.circles().count(),
        surface.texts().count()
    );
}
