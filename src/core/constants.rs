//! Core constants shared by the projection, the renderer and the scheduler.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

/// Default square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Web-Mercator latitude validity bound, in degrees.
pub const MAX_LATITUDE: f64 = 85.05112878;

/// Longitude bound, in degrees.
pub const MAX_LONGITUDE: f64 = 180.0;

/// Zoom level used until the host moves the map.
pub const DEFAULT_ZOOM: u8 = 7;

/// Initial map centre (Paris).
pub const DEFAULT_CENTER: (f64, f64) = (48.866667, 2.333333);

/// Lowest zoom a configuration may request when it does not set one.
pub const DEFAULT_MIN_ZOOM: u8 = 1;

/// Highest zoom a configuration may request when it does not set one.
pub const DEFAULT_MAX_ZOOM: u8 = 18;

/// Maximum number of concurrently active fetch workers.
pub const MAX_FETCHERS: usize = 8;

/// Capacity of the map tile cache.
pub const TILE_CACHE_CAPACITY: usize = 256;

/// Capacity of the marker icon cache.
pub const ICON_CACHE_CAPACITY: usize = 32;

/// Length of a zoom animation, in update frames.
pub const ZOOM_ANIMATION_FRAMES: u32 = 60;

/// Clustering bucket size in pixels.
pub const CLUSTER_GRID_FACTOR: f64 = 8.0;

/// Minimum delay between two wheel-driven zoom steps.
pub const WHEEL_ZOOM_INTERVAL_MS: u64 = 200;

/// Markers are drawn at full size from this zoom level upwards.
pub const FULL_MARKER_SIZE_ZOOM: f64 = 7.0;

/// How many finer pyramid levels are searched for partial patches.
pub const DESCENDANT_LEVELS: u8 = 4;

/// Extra ring of tiles drawn (from cache only) while a zoom animates.
pub const ANIMATION_TILE_MARGIN: i64 = 2;

/// Upper bound on a single HTTP tile request, in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 30;
