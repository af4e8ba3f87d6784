//! Spherical Web-Mercator (EPSG:3857) projection into tile pixel space.

use std::f64::consts::PI;

use crate::{
    core::{
        constants::TILE_SIZE,
        geo::{LatLng, Point},
    },
    traits::CoordinateTransform,
};

/// Projects to and from the pixel space of a `tile_size` pyramid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WebMercator {
    pub tile_size: u32,
}

impl WebMercator {
    pub fn new(tile_size: u32) -> Self {
        Self { tile_size }
    }
}

impl Default for WebMercator {
    fn default() -> Self {
        Self::new(TILE_SIZE)
    }
}

impl CoordinateTransform for WebMercator {
    fn world_size(&self, zoom: u8) -> f64 {
        self.tile_size as f64 * 2_f64.powi(zoom as i32)
    }

    fn project(&self, lat_lng: LatLng, zoom: u8) -> Point {
        let LatLng { lat, lng } = lat_lng.clamped();

        let x = (lng + 180.0) / 360.0;
        let sin_lat = lat.to_radians().sin();
        let y = 0.5 - ((1.0 + sin_lat) / (1.0 - sin_lat)).ln() / (4.0 * PI);

        let size = self.world_size(zoom);
        Point::new(
            (x * size).clamp(0.0, size),
            (y * size).clamp(0.0, size),
        )
    }

    fn unproject(&self, point: Point, zoom: u8) -> LatLng {
        let size = self.world_size(zoom);
        let x = point.x.clamp(0.0, size) / size;
        let y = point.y.clamp(0.0, size) / size;

        let lng = x * 360.0 - 180.0;
        let lat = (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees();

        LatLng::new(LatLng::clamp_lat(lat), lng)
    }
}
