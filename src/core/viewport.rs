use crate::{
    animation::zoom::ZoomAnimation,
    core::{
        constants::{DEFAULT_CENTER, DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM, DEFAULT_ZOOM},
        geo::{LatLng, Point},
        projection::WebMercator,
    },
    traits::CoordinateTransform,
};

/// Visible world pixels at the current integer zoom.
///
/// Uses the rounding of the tile grid walk: left/top and bottom are floored,
/// right is ceiled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBounds {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl ViewBounds {
    pub fn top_left(&self) -> Point {
        Point::new(self.x1, self.y1)
    }
}

/// Transform applied while a zoom animation runs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTransform {
    /// Fractional zoom being displayed
    pub zoom: f64,
    /// Scale of content laid out at the integer zoom
    pub scale: f64,
    /// Offset (integer zoom pixels) keeping the animation anchor in place
    pub adjust: Point,
}

impl FrameTransform {
    pub fn identity(zoom: u8) -> Self {
        Self {
            zoom: zoom as f64,
            scale: 1.0,
            adjust: Point::new(0.0, 0.0),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.scale == 1.0 && self.adjust == Point::new(0.0, 0.0)
    }

    /// Where a screen point laid out at the integer zoom shows up this frame
    pub fn apply(&self, screen: Point, screen_center: Point) -> Point {
        let centered = screen.subtract(&screen_center).add(&self.adjust);
        let moved = screen_center.add(&centered.multiply(self.scale));
        Point::new(moved.x.round(), moved.y.round())
    }
}

/// Manages the current view of the map: pan position, zoom, and screen
/// dimensions
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    /// World pixel shown at the centre of the screen
    pub position: Point,
    pub zoom: u8,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub width: f64,
    pub height: f64,
    /// Last pointer position of an ongoing drag
    grab: Option<Point>,
    animation: Option<ZoomAnimation>,
    projection: WebMercator,
}

impl Viewport {
    pub fn new(projection: WebMercator) -> Self {
        let zoom = DEFAULT_ZOOM;
        Self {
            position: projection.project(LatLng::new(DEFAULT_CENTER.0, DEFAULT_CENTER.1), zoom),
            zoom,
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            width: 0.0,
            height: 0.0,
            grab: None,
            animation: None,
            projection,
        }
    }

    pub fn projection(&self) -> &WebMercator {
        &self.projection
    }

    pub fn set_size(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    pub fn set_zoom_limits(&mut self, min_zoom: u8, max_zoom: u8) {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self.zoom = self.zoom.clamp(min_zoom, max_zoom);
    }

    pub fn screen_center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn world_size(&self) -> f64 {
        self.projection.world_size(self.zoom)
    }

    pub fn bounds(&self) -> ViewBounds {
        ViewBounds {
            x1: (self.position.x - self.width / 2.0).floor(),
            y1: (self.position.y - self.height / 2.0).floor(),
            x2: (self.position.x + self.width / 2.0).ceil(),
            y2: (self.position.y + self.height / 2.0).floor(),
        }
    }

    /// Jump to `center`, optionally changing zoom (clamped to the allowed
    /// range). Any running animation is dropped.
    ///
    /// Returns `true` when the integer zoom changed.
    pub fn move_to(&mut self, center: LatLng, zoom: Option<u8>) -> bool {
        let old_zoom = self.zoom;
        if let Some(zoom) = zoom {
            self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        }
        self.position = self.projection.project(center, self.zoom);
        self.animation = None;
        self.zoom != old_zoom
    }

    /// Change zoom by `delta` levels around the screen point `anchor`.
    ///
    /// The pan position is rescaled so the world point under `anchor` stays
    /// put, and an animation is started (or retargeted) from the zoom being
    /// displayed. Returns `false`, changing nothing, when the target zoom is
    /// outside the allowed range.
    pub fn zoom_by(&mut self, delta: i32, anchor: Point, frame: u64, duration_frames: u32) -> bool {
        let Some(target) = (self.zoom as i32).checked_add(delta) else {
            return false;
        };
        if target < self.min_zoom as i32 || target > self.max_zoom as i32 {
            return false;
        }

        let offset = anchor.subtract(&self.screen_center());
        for _ in 0..delta.max(0) {
            self.position = self.position.multiply(2.0).add(&offset);
        }
        for _ in 0..(-delta).max(0) {
            self.position = self.position.multiply(0.5).subtract(&offset.multiply(0.5));
        }

        match self.animation.as_mut() {
            Some(animation) => animation.chain(target as f64, frame, anchor),
            None => {
                self.animation = Some(ZoomAnimation::new(
                    self.zoom as f64,
                    target as f64,
                    frame,
                    duration_frames,
                    anchor,
                ))
            }
        }

        self.zoom = target as u8;
        true
    }

    /// Step the zoom animation. Returns `true` while it is still running.
    pub fn advance_animation(&mut self, frame: u64) -> bool {
        let running = self
            .animation
            .as_mut()
            .map(|animation| animation.advance(frame))
            .unwrap_or(false);
        if !running {
            self.animation = None;
        }
        running
    }

    pub fn animation(&self) -> Option<&ZoomAnimation> {
        self.animation.as_ref()
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    pub fn frame_transform(&self) -> FrameTransform {
        match &self.animation {
            Some(animation) => FrameTransform {
                zoom: animation.value(),
                scale: animation.scale(self.zoom),
                adjust: animation.adjust(self.zoom, self.screen_center()),
            },
            None => FrameTransform::identity(self.zoom),
        }
    }

    pub fn pan(&mut self, delta: Point) {
        self.position = self.position.add(&delta);
    }

    /// Follow the pointer during a drag
    pub fn drag_to(&mut self, pointer: Point) {
        if let Some(grab) = self.grab {
            self.pan(grab.subtract(&pointer));
        }
        self.grab = Some(pointer);
    }

    pub fn release(&mut self) {
        self.grab = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.grab.is_some()
    }

    /// Keep the view inside the world and snap it to whole pixels.
    ///
    /// An axis on which the world is smaller than the screen is centred on
    /// the world midpoint.
    pub fn clamp_to_world(&mut self) {
        let size = self.world_size();
        self.position.x = clamp_axis(self.position.x, self.width, size);
        self.position.y = clamp_axis(self.position.y, self.height, size);
        self.position = self.position.floor();
    }

    pub fn project(&self, lat_lng: LatLng) -> Point {
        self.projection.project(lat_lng, self.zoom)
    }

    /// World pixel under a screen point
    pub fn screen_to_world(&self, screen: Point) -> Point {
        self.position.add(&screen.subtract(&self.screen_center()))
    }

    /// Screen point of a world pixel, relative to the viewport's top-left
    pub fn world_to_screen(&self, world: Point) -> Point {
        world.subtract(&self.bounds().top_left())
    }

    pub fn coord_to_screen(&self, lat_lng: LatLng) -> Point {
        self.world_to_screen(self.project(lat_lng))
    }

    pub fn screen_to_coord(&self, screen: Point) -> LatLng {
        self.projection.unproject(self.screen_to_world(screen), self.zoom)
    }

    /// Geographic location at the centre of the screen
    pub fn center(&self) -> LatLng {
        self.screen_to_coord(self.screen_center())
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(WebMercator::default())
    }
}

fn clamp_axis(value: f64, extent: f64, world: f64) -> f64 {
    if world >= extent {
        value.clamp(extent / 2.0, world - extent / 2.0)
    } else {
        world / 2.0
    }
}
