//! Configuration for a tile map instance
//!
//! The public surface mirrors what a host hands to `init`: a URL template, the
//! tile size and the zoom range. The remaining knobs tune the fetcher, the
//! caches and the animation, and can be picked wholesale through
//! [`TileMapProfile`] presets.

use serde::{Deserialize, Serialize};

use crate::{
    core::constants::{
        CLUSTER_GRID_FACTOR, DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM, ICON_CACHE_CAPACITY,
        MAX_FETCHERS, TILE_CACHE_CAPACITY, TILE_SIZE, WHEEL_ZOOM_INTERVAL_MS,
        ZOOM_ANIMATION_FRAMES,
    },
    MapError, Result,
};

/// Highest zoom level the pyramid math supports without overflowing `u32`
/// tile indices.
const MAX_SUPPORTED_ZOOM: u8 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileMapConfig {
    /// URL template, e.g. `https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png`
    pub url: String,
    #[serde(alias = "tilesize")]
    pub tile_size: u32,
    pub min_zoom: u8,
    pub max_zoom: u8,
    /// Upper bound on concurrently active fetch workers
    pub max_fetchers: usize,
    pub tile_cache_size: usize,
    pub icon_cache_size: usize,
    /// Zoom animation length, in frames
    pub zoom_animation_frames: u32,
    /// Clustering bucket size, in pixels
    pub cluster_grid_factor: f64,
    pub wheel_interval_ms: u64,
}

impl Default for TileMapConfig {
    fn default() -> Self {
        TileMapProfile::default().resolve()
    }
}

impl TileMapConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Parse a JSON configuration object; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    pub fn with_zoom_range(mut self, min_zoom: u8, max_zoom: u8) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_max_fetchers(mut self, max_fetchers: usize) -> Self {
        self.max_fetchers = max_fetchers;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.is_empty() {
            return Err(MapError::InvalidConfig("url template is empty".into()));
        }
        if self.tile_size == 0 {
            return Err(MapError::InvalidConfig("tile_size must be positive".into()));
        }
        if self.min_zoom > self.max_zoom {
            return Err(MapError::InvalidConfig(format!(
                "min_zoom {} exceeds max_zoom {}",
                self.min_zoom, self.max_zoom
            )));
        }
        if self.max_zoom > MAX_SUPPORTED_ZOOM {
            return Err(MapError::InvalidConfig(format!(
                "max_zoom {} exceeds {}",
                self.max_zoom, MAX_SUPPORTED_ZOOM
            )));
        }
        if self.max_fetchers == 0 {
            return Err(MapError::InvalidConfig("max_fetchers must be positive".into()));
        }
        if self.tile_cache_size == 0 || self.icon_cache_size == 0 {
            return Err(MapError::InvalidConfig("cache sizes must be positive".into()));
        }
        if !(self.cluster_grid_factor.is_finite() && self.cluster_grid_factor > 0.0) {
            return Err(MapError::InvalidConfig(
                "cluster_grid_factor must be a positive number".into(),
            ));
        }
        Ok(())
    }
}

/// Tuning presets
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TileMapProfile {
    #[default]
    Balanced,
    LowResource,
    HighPerformance,
    Custom(TileMapConfig),
}

impl TileMapProfile {
    pub fn resolve(&self) -> TileMapConfig {
        let balanced = TileMapConfig {
            url: String::new(),
            tile_size: TILE_SIZE,
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            max_fetchers: MAX_FETCHERS,
            tile_cache_size: TILE_CACHE_CAPACITY,
            icon_cache_size: ICON_CACHE_CAPACITY,
            zoom_animation_frames: ZOOM_ANIMATION_FRAMES,
            cluster_grid_factor: CLUSTER_GRID_FACTOR,
            wheel_interval_ms: WHEEL_ZOOM_INTERVAL_MS,
        };

        match self {
            Self::Balanced => balanced,
            Self::LowResource => TileMapConfig {
                max_fetchers: 2,
                tile_cache_size: 64,
                icon_cache_size: 16,
                zoom_animation_frames: 20,
                ..balanced
            },
            Self::HighPerformance => TileMapConfig {
                max_fetchers: 16,
                tile_cache_size: 1024,
                icon_cache_size: 128,
                ..balanced
            },
            Self::Custom(config) => config.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_defaults_fill_missing_fields() {
        let config = TileMapConfig::from_json_str(
            r#"{ "url": "https://{s}.tile.osm.org/{z}/{x}/{y}.{ext}", "tilesize": 512, "max_zoom": 16 }"#,
        )
        .unwrap();

        assert_eq!(config.tile_size, 512);
        assert_eq!(config.min_zoom, DEFAULT_MIN_ZOOM);
        assert_eq!(config.max_zoom, 16);
        assert_eq!(config.max_fetchers, MAX_FETCHERS);
    }

    #[test]
    fn test_validation_rejects_inverted_zoom_range() {
        let config = TileMapConfig::new("x").with_zoom_range(10, 4);
        assert!(matches!(config.validate(), Err(MapError::InvalidConfig(_))));
        assert!(TileMapConfig::default().validate().is_err());
    }

    #[test]
    fn test_profiles() {
        let low = TileMapProfile::LowResource.resolve();
        let high = TileMapProfile::HighPerformance.resolve();
        assert!(low.max_fetchers < high.max_fetchers);
        assert!(low.tile_cache_size < high.tile_cache_size);
    }
}
