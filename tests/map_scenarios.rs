use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use tilemap::{
    prelude::*,
    rendering::{context::RenderContext, DrawSurface},
    tiles::TileSource,
};

const URL: &str = "https://{s}.tile.example/{z}/{x}/{y}{r}.{ext}";

/// Resolves every url to itself and remembers what was asked for
#[derive(Default)]
struct RecordingLoader {
    requested: Mutex<Vec<String>>,
}

#[async_trait]
impl ImageLoader for RecordingLoader {
    type Bitmap = String;

    async fn load(&self, url: &str) -> tilemap::Result<String> {
        self.requested.lock().unwrap().push(url.to_string());
        Ok(url.to_string())
    }
}

/// Fails every load so caches only hold what the test puts there
struct OfflineLoader;

#[async_trait]
impl ImageLoader for OfflineLoader {
    type Bitmap = String;

    async fn load(&self, url: &str) -> tilemap::Result<String> {
        Err(MapError::Http {
            status: 503,
            url: url.to_string(),
        })
    }
}

fn config() -> TileMapConfig {
    TileMapConfig::new(URL)
        .with_tile_size(256)
        .with_zoom_range(1, 18)
}

fn recording_map() -> (TileMap<RenderContext, RecordingLoader>, Arc<RecordingLoader>) {
    let loader = Arc::new(RecordingLoader::default());
    let mut map = TileMap::new(
        RenderContext::new(800, 600),
        loader.clone(),
        Arc::new(InlineSpawner),
    );
    map.init(config()).unwrap();
    (map, loader)
}

fn offline_map() -> TileMap<RenderContext, OfflineLoader> {
    let mut map = TileMap::new(
        RenderContext::new(800, 600),
        Arc::new(OfflineLoader),
        Arc::new(InlineSpawner),
    );
    map.init(config()).unwrap();
    map
}

fn idle() -> PointerState {
    PointerState::at(-1000.0, -1000.0)
}

#[test]
fn test_paris_requests_exactly_the_visible_tiles() {
    let (mut map, loader) = recording_map();
    map.move_to(48.8566, 2.3522, Some(7)).unwrap();
    map.update(&idle());

    // Work out the intersecting tiles independently from the renderer
    let bounds = map.viewport().bounds();
    let mut expected = HashSet::new();
    for i in 0..128_u32 {
        for j in 0..128_u32 {
            let (x, y) = (i as f64 * 256.0, j as f64 * 256.0);
            if x < bounds.x2 && x + 256.0 > bounds.x1 && y < bounds.y2 && y + 256.0 > bounds.y1 {
                expected.insert(UrlTemplate::new(URL).url(TileCoord::new(i, j, 7)));
            }
        }
    }
    assert_eq!(expected.len(), 16);

    // Frames until everything visible is cached
    for _ in 0..4 {
        map.draw();
        map.update(&idle());
    }

    let requested = loader.requested.lock().unwrap().clone();
    let unique: HashSet<_> = requested.iter().cloned().collect();
    assert_eq!(unique.len(), requested.len(), "a tile was fetched twice");
    assert_eq!(unique, expected);

    for url in &requested {
        let parts: Vec<u32> = url
            .trim_start_matches("https://a.tile.example/")
            .trim_end_matches(".png")
            .split('/')
            .map(|p| p.parse().unwrap())
            .collect();
        assert_eq!(parts[0], 7);
        assert!(parts[1] < 128 && parts[2] < 128);
    }

    // Fully cached: the last frame drew every tile and asked for nothing
    assert_eq!(map.surface().bitmaps().count(), 16);
    assert_eq!(map.scheduler().misses(), 0);
    assert_eq!(map.fetch_stats().loaded, 16);
}

#[test]
fn test_world_edges_never_request_invalid_tiles() {
    let (mut map, loader) = recording_map();
    map.move_to(85.0, -180.0, Some(1)).unwrap();
    map.update(&idle());
    map.draw();
    map.update(&idle());

    // Zoom 1 world is 512px wide: centred, and only its four tiles exist
    assert_eq!(map.viewport().position, Point::new(256.0, 256.0));
    let requested = loader.requested.lock().unwrap();
    assert_eq!(requested.len(), 4);
    assert!(requested.iter().all(|url| url.contains("/1/")));
}

#[test]
fn test_pan_is_clamped_to_world() {
    let mut map = offline_map();
    map.move_to(85.0, -180.0, Some(3)).unwrap();
    map.update(&idle());
    assert_eq!(map.viewport().position, Point::new(400.0, 300.0));

    // Dragging further towards the corner does not move the view
    map.update(&PointerState::at(100.0, 100.0).with_left(ButtonState::Down { frames: 1 }));
    map.update(&PointerState::at(300.0, 300.0).with_left(ButtonState::Down { frames: 2 }));
    assert_eq!(map.viewport().position, Point::new(400.0, 300.0));

    map.move_to(-85.0, 180.0, Some(3)).unwrap();
    map.update(&idle());
    assert_eq!(map.viewport().position, Point::new(2048.0 - 400.0, 2048.0 - 300.0));
}

#[test]
fn test_missing_tile_falls_back_to_cached_pyramid() {
    let mut map = offline_map();
    map.move_to(48.8566, 2.3522, Some(7)).unwrap();
    map.update(&idle());

    let range = map.visible_tiles();
    let (i, j) = (range.i1 as u32, range.j1 as u32);
    let template = UrlTemplate::new(URL);

    let parent = template.url(TileCoord::new(i / 2, j / 2, 6));
    let child = template.url(TileCoord::new(2 * i + 1, 2 * j, 8));
    map.tile_cache_mut().insert(parent.clone(), parent.clone());
    map.tile_cache_mut().insert(child.clone(), child.clone());

    map.draw();

    let (x, y) = (i as f64 * 256.0, j as f64 * 256.0);
    let bitmaps: Vec<_> = map.surface().bitmaps().collect();

    let upscaled = bitmaps
        .iter()
        .find(|(id, _, dst)| *id == parent && *dst == Rect::square(x, y, 256.0))
        .expect("ancestor drawn over the missing tile");
    assert_eq!(
        upscaled.1,
        Some(Rect::square(128.0 * (i % 2) as f64, 128.0 * (j % 2) as f64, 128.0))
    );

    let patch = bitmaps
        .iter()
        .find(|(id, _, _)| *id == child)
        .expect("descendant patched in");
    assert_eq!(patch.1, None);
    assert_eq!(patch.2, Rect::square(x + 128.0, y, 128.0));

    // Only the exact tiles count as misses, never the pyramid lookups
    assert_eq!(map.scheduler().misses(), 16);
}

#[test]
fn test_markers_cluster_by_distance() {
    let mut map = offline_map();
    map.move_to(48.8566, 2.3522, Some(7)).unwrap();
    map.update(&idle());

    let a = map.screen_to_coord(Point::new(400.0, 300.0));
    let b = map.screen_to_coord(Point::new(402.0, 300.0));
    let far = map.screen_to_coord(Point::new(10400.0, 300.0));

    let tagged = |at: LatLng| Marker::circle(at.lat, at.lng, 12.0, Color::GRAY).with_cluster("#ff0000");

    map.set_markers("near", vec![tagged(a), tagged(b)]).unwrap();
    map.update(&idle());
    assert_eq!(map.elements().len(), 1);
    let cluster = &map.elements()[0];
    assert!(cluster.is_cluster());
    assert_eq!(cluster.count(), 2);
    assert_eq!(
        cluster.kind,
        RenderKind::Cluster {
            color: Color::rgb(255, 0, 0)
        }
    );
    let cluster_size = cluster.size;

    map.draw();
    assert_eq!(map.surface().texts().collect::<Vec<_>>(), vec!["2"]);
    let (_, radius, color) = map.surface().circles().next().unwrap();
    assert_eq!(color, Color::rgb(255, 0, 0));
    assert!((radius - cluster_size / 2.0).abs() < 1e-9);

    map.set_markers("near", vec![tagged(a), tagged(far)]).unwrap();
    map.update(&idle());
    assert_eq!(map.elements().len(), 2);
    assert!(map.elements().iter().all(|e| !e.is_cluster()));

    // The far one is off screen and culled
    map.draw();
    assert_eq!(map.surface().circles().count(), 1);
}

#[test]
fn test_clicking_a_cluster_reports_all_members() {
    let mut map = offline_map();
    map.move_to(48.8566, 2.3522, Some(7)).unwrap();
    map.update(&idle());

    let markers: Vec<_> = [400.0, 403.0, 406.0]
        .iter()
        .map(|&x| {
            let at = map.screen_to_coord(Point::new(x, 300.0));
            Marker::circle(at.lat, at.lng, 24.0, Color::GRAY).with_cluster("group")
        })
        .collect();
    map.set_markers("pins", markers).unwrap();

    let clicked = Arc::new(Mutex::new(Vec::new()));
    let sink = clicked.clone();
    map.set_on_click(move |markers| sink.lock().unwrap().push(markers.len()));

    map.update(&idle());
    let target = map.elements()[0].position;
    let at = PointerState::at(target.x, target.y);

    map.update(&at.with_left(ButtonState::Down { frames: 1 }));
    map.update(&at.with_left(ButtonState::Released));
    map.update(&at);

    assert_eq!(*clicked.lock().unwrap(), vec![3]);
}

#[test]
fn test_marker_filters_and_icons() {
    let (mut map, loader) = recording_map();
    map.move_to(48.8566, 2.3522, Some(7)).unwrap();
    map.update(&idle());

    let left = map.screen_to_coord(Point::new(200.0, 300.0));
    let right = map.screen_to_coord(Point::new(600.0, 300.0));
    map.set_markers(
        "mixed",
        vec![
            Marker::icon(left.lat, left.lng, 32.0, "https://icons.example/pin.png")
                .with_filter("grayscale(100%)"),
            Marker::circle(right.lat, right.lng, 10.0, Color::BLACK),
        ],
    )
    .unwrap();

    for _ in 0..3 {
        map.update(&idle());
        map.draw();
    }

    assert!(loader
        .requested
        .lock()
        .unwrap()
        .contains(&"https://icons.example/pin.png".to_string()));

    let queue = map.surface().get_drawing_queue();
    assert!(queue.contains(&DrawCommand::Filter(Some("grayscale(100%)".into()))));

    let icon = map
        .surface()
        .bitmaps()
        .find(|(id, _, _)| *id == "https://icons.example/pin.png")
        .expect("icon drawn once loaded");
    assert_eq!(icon.2.width, 32.0);
    assert_eq!(map.icon_cache().len(), 1);
}

#[test]
fn test_zoom_animation_draws_scaled_frames() {
    let mut map = offline_map();
    map.move_to(48.8566, 2.3522, Some(7)).unwrap();
    map.update(&idle());

    assert!(map.zoom(1, None));
    assert_eq!(map.zoom_level(), 8);
    map.update(&idle());
    assert!(map.viewport().is_animating());
    map.draw();

    let scale = map
        .surface()
        .get_drawing_queue()
        .iter()
        .find_map(|cmd| match cmd {
            DrawCommand::Scale { factor } => Some(*factor),
            _ => None,
        })
        .unwrap();
    assert!(scale > 0.5 && scale < 0.51);

    // Ring tiles are looked up but never requested
    let range = map.visible_tiles();
    let visible = (range.i2 - range.i1 + 1) * (range.j2 - range.j1 + 1);
    assert_eq!(map.scheduler().misses() as i64, visible);

    for _ in 0..60 {
        map.update(&idle());
    }
    assert!(!map.viewport().is_animating());
    map.draw();
    assert!(map
        .surface()
        .get_drawing_queue()
        .contains(&DrawCommand::Scale { factor: 1.0 }));
}

#[test]
fn test_invalid_marker_input() {
    let mut map = offline_map();
    let result = map.set_markers_json("x", &serde_json::json!("markers"));
    assert!(matches!(result, Err(MapError::InvalidMarkers(_))));

    let result = map.set_markers_json(
        "x",
        &serde_json::json!([{ "latitude": 1.0, "longitude": 2.0, "size": -4.0 }]),
    );
    assert!(matches!(result, Err(MapError::InvalidMarkers(_))));
    assert!(map.markers("x").is_none());
}

#[test]
fn test_drawing_is_balanced() {
    let mut map = offline_map();
    map.set_markers("one", vec![Marker::circle(48.86, 2.33, 12.0, Color::GRAY)])
        .unwrap();
    map.update(&idle());
    map.draw();
    assert_eq!(map.surface().depth(), 0);
    assert_eq!(DrawSurface::width(map.surface()), 800);
}
