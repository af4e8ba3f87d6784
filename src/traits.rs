//! Shared trait abstractions
//!
//! Seams used by more than one module: coordinate projection and linear
//! interpolation of zoom levels.

use crate::core::geo::{LatLng, Point};

/// Conversion between geographic coordinates and world pixels
pub trait CoordinateTransform {
    /// Transform geographic coordinates to world pixel coordinates
    fn project(&self, lat_lng: LatLng, zoom: u8) -> Point;

    /// Transform world pixel coordinates to geographic coordinates
    fn unproject(&self, point: Point, zoom: u8) -> LatLng;

    /// Size in pixels of the square world at `zoom`
    fn world_size(&self, zoom: u8) -> f64;
}

/// Unified interpolation trait
pub trait Lerp {
    fn lerp(&self, other: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        self + (other - self) * t
    }
}
