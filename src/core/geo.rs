use serde::{Deserialize, Serialize};

use crate::core::constants::{MAX_LATITUDE, MAX_LONGITUDE};

/// Represents a geographical coordinate with latitude and longitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Creates a new LatLng coordinate
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Validates that the coordinates are finite and within valid ranges
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Clamps latitude to the Web-Mercator range
    pub fn clamp_lat(lat: f64) -> f64 {
        lat.clamp(-MAX_LATITUDE, MAX_LATITUDE)
    }

    /// Clamps longitude to [-180, 180]
    pub fn clamp_lng(lng: f64) -> f64 {
        lng.clamp(-MAX_LONGITUDE, MAX_LONGITUDE)
    }

    /// Returns a copy clamped to the projectable range
    pub fn clamped(&self) -> Self {
        Self::new(Self::clamp_lat(self.lat), Self::clamp_lng(self.lng))
    }
}

impl Default for LatLng {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Represents a point in screen or world pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn add(&self, other: &Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    pub fn subtract(&self, other: &Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    pub fn multiply(&self, scalar: f64) -> Point {
        Point::new(self.x * scalar, self.y * scalar)
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn floor(&self) -> Point {
        Point::new(self.x.floor(), self.y.floor())
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// A tile coordinate in the slippy map pyramid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

impl TileCoord {
    pub fn new(x: u32, y: u32, z: u8) -> Self {
        Self { x, y, z }
    }

    /// Builds a coordinate from signed grid indices, rejecting anything
    /// outside `[0, 2^z)` on either axis.
    pub fn checked(x: i64, y: i64, z: u8) -> Option<Self> {
        let n = Self::tiles_per_axis(z) as i64;
        if x < 0 || y < 0 || x >= n || y >= n {
            return None;
        }
        Some(Self::new(x as u32, y as u32, z))
    }

    /// Number of tiles along one axis at zoom `z`
    pub fn tiles_per_axis(z: u8) -> u64 {
        1u64 << z
    }

    /// The ancestor `levels` zoom levels up, together with the index of this
    /// tile inside it (in units of this tile's size).
    pub fn ancestor(&self, levels: u8) -> Option<(TileCoord, u32, u32)> {
        if levels > self.z {
            return None;
        }
        let factor = 1u32 << levels;
        let ancestor = TileCoord::new(self.x / factor, self.y / factor, self.z - levels);
        Some((ancestor, self.x % factor, self.y % factor))
    }

    /// All descendants `levels` zoom levels down, with their offset inside
    /// this tile (in units of the descendant's size).
    pub fn descendants(&self, levels: u8) -> impl Iterator<Item = (TileCoord, u32, u32)> + '_ {
        let factor = 1u32 << levels;
        let (x0, y0, z) = (self.x * factor, self.y * factor, self.z + levels);
        (0..factor).flat_map(move |di| {
            (0..factor).map(move |dj| (TileCoord::new(x0 + di, y0 + dj, z), di, dj))
        })
    }

    /// Checks if the tile is valid for its zoom level
    pub fn is_valid(&self) -> bool {
        let max_coord = Self::tiles_per_axis(self.z);
        (self.x as u64) < max_coord && (self.y as u64) < max_coord
    }
}
