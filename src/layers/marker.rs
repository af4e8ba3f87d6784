use serde::Deserialize;

use crate::{core::geo::LatLng, MapError, Result};

/// RGBA colour used for circle markers and cluster discs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const GRAY: Color = Color::rgb(128, 128, 128);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#rgb`, `#rrggbb`, `#rrggbbaa` or a basic colour name.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Some(hex) = text.strip_prefix('#') {
            let digit = |i: usize| u8::from_str_radix(hex.get(i..i + 1)?, 16).ok();
            let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
            return match hex.len() {
                3 => Some(Self::rgb(digit(0)? * 17, digit(1)? * 17, digit(2)? * 17)),
                6 => Some(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
                8 => Some(Self {
                    a: byte(6)?,
                    ..Self::rgb(byte(0)?, byte(2)?, byte(4)?)
                }),
                _ => None,
            };
        }

        let named = match text.to_ascii_lowercase().as_str() {
            "white" => Self::WHITE,
            "black" => Self::BLACK,
            "gray" | "grey" => Self::GRAY,
            "red" => Self::rgb(255, 0, 0),
            "green" => Self::rgb(0, 128, 0),
            "blue" => Self::rgb(0, 0, 255),
            "orange" => Self::rgb(255, 165, 0),
            "purple" => Self::rgb(128, 0, 128),
            "yellow" => Self::rgb(255, 255, 0),
            _ => return None,
        };
        Some(named)
    }

    /// Cluster tags double as colours; unparseable tags fall back to gray.
    pub fn from_tag(tag: Option<&str>) -> Self {
        tag.and_then(Self::parse).unwrap_or(Self::GRAY)
    }
}

/// How a single marker is drawn
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerAppearance {
    /// Bitmap fetched from this URL through the icon cache
    Icon(String),
    /// Filled circle
    Circle(Color),
    /// Clusterable and clickable, but not drawn
    Hidden,
}

/// A caller supplied point of interest.
///
/// Markers are read-only to the map: they are stored behind `Arc` and handed
/// back unchanged to the click callback.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawMarker")]
pub struct Marker {
    pub latitude: f64,
    pub longitude: f64,
    /// Footprint diameter in pixels at full size
    pub size: f64,
    /// Markers sharing a tag may merge into one cluster
    pub cluster: Option<String>,
    pub appearance: MarkerAppearance,
    pub clickable: bool,
    /// Surface filter applied while drawing, e.g. `grayscale(100%)`
    pub filter: Option<String>,
}

impl Marker {
    pub fn circle(latitude: f64, longitude: f64, size: f64, color: Color) -> Self {
        Self {
            latitude,
            longitude,
            size,
            cluster: None,
            appearance: MarkerAppearance::Circle(color),
            clickable: false,
            filter: None,
        }
    }

    pub fn icon(latitude: f64, longitude: f64, size: f64, url: impl Into<String>) -> Self {
        Self {
            appearance: MarkerAppearance::Icon(url.into()),
            ..Self::circle(latitude, longitude, size, Color::GRAY)
        }
    }

    pub fn with_cluster(mut self, tag: impl Into<String>) -> Self {
        self.cluster = Some(tag.into());
        self
    }

    pub fn with_clickable(mut self, clickable: bool) -> Self {
        self.clickable = clickable;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }

    /// Reject markers the projection and clustering cannot make sense of.
    pub fn validate(&self) -> Result<()> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(MapError::InvalidMarkers(format!(
                "non-finite position ({}, {})",
                self.latitude, self.longitude
            )));
        }
        if !self.size.is_finite() || self.size < 0.0 {
            return Err(MapError::InvalidMarkers(format!(
                "invalid size {}",
                self.size
            )));
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct RawMarker {
    latitude: f64,
    longitude: f64,
    size: f64,
    #[serde(default)]
    cluster: Option<String>,
    #[serde(default)]
    icon: Option<String>,
    #[serde(default)]
    circle: Option<String>,
    #[serde(default)]
    clickable: bool,
    #[serde(default)]
    filter: Option<String>,
}

impl TryFrom<RawMarker> for Marker {
    type Error = MapError;

    fn try_from(raw: RawMarker) -> Result<Self> {
        let appearance = match (raw.icon, raw.circle) {
            (Some(url), _) => MarkerAppearance::Icon(url),
            (None, Some(color)) => MarkerAppearance::Circle(Color::parse(&color).ok_or_else(
                || MapError::InvalidMarkers(format!("unknown circle colour '{}'", color)),
            )?),
            (None, None) => MarkerAppearance::Hidden,
        };

        let marker = Marker {
            latitude: raw.latitude,
            longitude: raw.longitude,
            size: raw.size,
            cluster: raw.cluster,
            appearance,
            clickable: raw.clickable,
            filter: raw.filter,
        };
        marker.validate()?;
        Ok(marker)
    }
}
