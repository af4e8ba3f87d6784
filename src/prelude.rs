//! Prelude module for common tilemap types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use tilemap::prelude::*;`

pub use crate::core::{
    config::{TileMapConfig, TileMapProfile},
    constants,
    geo::{LatLng, Point, TileCoord},
    map::{ClickHandler, TileMap},
    projection::WebMercator,
    viewport::Viewport,
};

pub use crate::animation::zoom::ZoomAnimation;

pub use crate::layers::{
    element::{RenderElement, RenderKind},
    marker::{Color, Marker, MarkerAppearance},
};

pub use crate::input::events::{ButtonState, MapCursor, PointerState};

pub use crate::spatial::clustering::{Cluster, Clustering};

pub use crate::tiles::{
    cache::TileCache,
    loader::{HttpImageLoader, ImageLoader},
    scheduler::{CacheTarget, FetchScheduler, FetchStats},
    source::{TileSource, UrlTemplate},
};

pub use crate::rendering::{
    context::{DrawCommand, RenderContext},
    surface::{DrawSurface, Rect},
};

pub use crate::runtime::{spawners::InlineSpawner, AsyncSpawner};

#[cfg(feature = "tokio-runtime")]
pub use crate::runtime::spawners::tokio_impl::TokioSpawner;

pub use crate::traits::{CoordinateTransform, Lerp};

pub use crate::{Error as MapError, Result};

pub use std::{
    sync::Arc,
    time::{Duration, Instant},
};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};

pub use futures::future::BoxFuture;
