//! # tilemap
//!
//! An interactive, pannable and zoomable raster tile map.
//!
//! The crate is split the way a slippy map naturally splits:
//! Web-Mercator projection math, grid based marker clustering, an LRU tile
//! cache, a bounded async fetch scheduler and a viewport/renderer pair that is
//! driven once per frame by the host through [`TileMap::update`] and
//! [`TileMap::draw`].
//!
//! The host supplies the drawing surface ([`DrawSurface`]), the image loader
//! ([`ImageLoader`]) and an async spawner ([`AsyncSpawner`]); everything else
//! lives in the per-map [`TileMap`] context.

pub mod animation;
pub mod core;
pub mod input;
pub mod layers;
pub mod prelude;
pub mod rendering;
pub mod runtime;
pub mod spatial;
pub mod tiles;
pub mod traits;
pub use crate::core::constants;

// Re-export public API
pub use core::{
    config::{TileMapConfig, TileMapProfile},
    geo::{LatLng, Point, TileCoord},
    map::TileMap,
    projection::WebMercator,
    viewport::Viewport,
};

pub use layers::{
    element::{RenderElement, RenderKind},
    marker::{Color, Marker, MarkerAppearance},
};

pub use input::events::{ButtonState, MapCursor, PointerState};

pub use rendering::{
    context::{DrawCommand, RenderContext},
    surface::{DrawSurface, Rect},
};

pub use runtime::AsyncSpawner;

pub use spatial::clustering::{Cluster, Clustering};

pub use tiles::{
    cache::TileCache,
    loader::{HttpImageLoader, ImageLoader},
    scheduler::{CacheTarget, FetchScheduler, FetchStats},
    source::{TileSource, UrlTemplate},
};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status} for '{url}'")]
    Http { status: u16, url: String },

    #[error("Image decode error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid markers: {0}")]
    InvalidMarkers(String),

    #[error("Invalid coordinates ({lat}, {lng})")]
    InvalidCoordinates { lat: f64, lng: f64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Map is not initialized")]
    NotInitialized,
}

/// Error type alias for convenience
pub type Error = MapError;

/// Install `env_logger` as the `log` backend, honouring `RUST_LOG`.
///
/// Safe to call more than once; later calls are ignored.
#[cfg(feature = "debug")]
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .is_test(cfg!(test))
        .try_init();
}
