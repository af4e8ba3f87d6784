#![cfg(feature = "tokio-runtime")]

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use tilemap::{constants::MAX_FETCHERS, prelude::*};

const URL: &str = "https://{s}.tile.example/{z}/{x}/{y}.png";

/// Never finishes a load
#[derive(Default)]
struct StalledLoader {
    started: AtomicUsize,
}

#[async_trait]
impl ImageLoader for StalledLoader {
    type Bitmap = String;

    async fn load(&self, _url: &str) -> tilemap::Result<String> {
        self.started.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }
}

/// Takes a little while per tile
struct SlowLoader {
    delay: Duration,
}

#[async_trait]
impl ImageLoader for SlowLoader {
    type Bitmap = String;

    async fn load(&self, url: &str) -> tilemap::Result<String> {
        tokio::time::sleep(self.delay).await;
        Ok(url.to_string())
    }
}

fn paris<L: ImageLoader<Bitmap = String>>(loader: Arc<L>) -> TileMap<RenderContext, L> {
    let spawner = TokioSpawner::current().expect("inside a tokio runtime");
    let mut map = TileMap::new(RenderContext::new(800, 600), loader, Arc::new(spawner));
    map.init(TileMapConfig::new(URL).with_zoom_range(1, 18)).unwrap();
    map.move_to(48.8566, 2.3522, Some(7)).unwrap();
    map.update(&PointerState::default());
    map
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_never_more_than_max_fetchers() {
    let loader = Arc::new(StalledLoader::default());
    let mut map = paris(loader.clone());

    map.draw();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(map.scheduler().active_workers(), MAX_FETCHERS);
    assert_eq!(map.scheduler().in_flight(), MAX_FETCHERS);
    assert_eq!(loader.started.load(Ordering::SeqCst), MAX_FETCHERS);

    // Later frames keep missing the same tiles but cannot add workers
    for _ in 0..5 {
        map.update(&PointerState::default());
        map.draw();
    }
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(map.scheduler().active_workers(), MAX_FETCHERS);
    assert_eq!(loader.started.load(Ordering::SeqCst), MAX_FETCHERS);
    assert_eq!(map.fetch_stats().started, MAX_FETCHERS as u64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_completed_fetches_fill_the_cache() {
    let woken = Arc::new(AtomicUsize::new(0));
    let mut map = paris(Arc::new(SlowLoader {
        delay: Duration::from_millis(10),
    }));
    let counter = woken.clone();
    map.set_waker(Some(Arc::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    })));
    map.take_redraw_request();

    // Keep driving frames until every visible tile arrived
    for _ in 0..100 {
        map.update(&PointerState::default());
        map.draw();
        if map.tile_cache().len() == 16 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(map.tile_cache().len(), 16);
    assert!(map.take_redraw_request());
    assert_eq!(map.fetch_stats().loaded, 16);
    assert!(woken.load(Ordering::SeqCst) >= 16);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_zoom_discards_in_flight_fetches() {
    let mut map = paris(Arc::new(SlowLoader {
        delay: Duration::from_millis(100),
    }));

    map.draw();
    assert_eq!(map.scheduler().in_flight(), MAX_FETCHERS);

    assert!(map.zoom(1, None));
    tokio::time::sleep(Duration::from_millis(300)).await;
    map.update(&PointerState::default());

    assert!(map.tile_cache().is_empty());
    let stats = map.fetch_stats();
    assert_eq!(stats.loaded, 0);
    assert_eq!(stats.discarded, MAX_FETCHERS as u64);
    assert_eq!(map.scheduler().active_workers(), 0);
    assert_eq!(map.scheduler().in_flight(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_zoom_frees_workers_held_by_stalled_fetches() {
    let loader = Arc::new(StalledLoader::default());
    let mut map = paris(loader.clone());

    map.draw();
    assert_eq!(map.scheduler().active_workers(), MAX_FETCHERS);

    // Every worker of the old zoom level hands over to a tile of the new one
    assert!(map.zoom(1, None));
    for _ in 0..100 {
        map.update(&PointerState::default());
        map.draw();
        if map.fetch_stats().started >= 2 * MAX_FETCHERS as u64 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let stats = map.fetch_stats();
    assert_eq!(stats.discarded, MAX_FETCHERS as u64);
    assert_eq!(stats.started, 2 * MAX_FETCHERS as u64);
    assert_eq!(map.scheduler().active_workers(), MAX_FETCHERS);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(loader.started.load(Ordering::SeqCst), 2 * MAX_FETCHERS);
}

#[tokio::test]
async fn test_http_loader_fits_the_map() {
    let spawner = TokioSpawner::current().unwrap();
    let mut map: TileMap<RenderContext<image::RgbaImage>, HttpImageLoader> = TileMap::new(
        RenderContext::new(320, 240),
        Arc::new(HttpImageLoader::new()),
        Arc::new(spawner),
    );
    map.init(TileMapConfig::new(URL)).unwrap();
    assert_eq!(map.zoom_level(), 7);
    assert!(map.tile_cache().is_empty());
}
