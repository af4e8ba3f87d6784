//! Frame drawing for [`TileMap`]: tile pyramid first, markers and clusters on
//! top.

use std::sync::Arc;

use crate::{
    core::{
        constants::{ANIMATION_TILE_MARGIN, DESCENDANT_LEVELS, FULL_MARKER_SIZE_ZOOM},
        geo::{Point, TileCoord},
        map::TileMap,
        viewport::FrameTransform,
    },
    layers::{
        element::{RenderElement, RenderKind},
        marker::{Color, MarkerAppearance},
    },
    rendering::surface::{DrawSurface, Rect},
    tiles::{loader::ImageLoader, scheduler::CacheTarget, source::TileSource},
};

/// Marker footprint at `zoom`: full size from zoom 7 upwards, shrinking
/// linearly below.
pub fn adapt_marker_size(size: f64, zoom: f64) -> f64 {
    if zoom >= FULL_MARKER_SIZE_ZOOM {
        size
    } else {
        size * ((zoom + 3.0) / 10.0)
    }
}

/// Inclusive tile index range covering the visible rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub i1: i64,
    pub j1: i64,
    pub i2: i64,
    pub j2: i64,
}

impl TileRange {
    pub fn iter(&self) -> impl Iterator<Item = (i64, i64)> {
        let TileRange { i1, j1, i2, j2 } = *self;
        (i1..=i2).flat_map(move |i| (j1..=j2).map(move |j| (i, j)))
    }

    /// Tiles surrounding the range up to `margin` tiles away
    pub fn ring(&self, margin: i64) -> impl Iterator<Item = (i64, i64)> {
        let TileRange { i1, j1, i2, j2 } = *self;
        let columns = (1..=margin).flat_map(move |m| [i1 - m, i2 + m]);
        let rows = (1..=margin).flat_map(move |m| [j1 - m, j2 + m]);

        let sides = columns.flat_map(move |i| (j1 - margin..=j2 + margin).map(move |j| (i, j)));
        let caps = rows.flat_map(move |j| (i1..=i2).map(move |i| (i, j)));
        sides.chain(caps)
    }
}

impl<S, L> TileMap<S, L>
where
    S: DrawSurface,
    L: ImageLoader<Bitmap = S::Bitmap>,
{
    /// Tiles intersecting the visible rectangle at the current integer zoom
    pub fn visible_tiles(&self) -> TileRange {
        let tile_size = self.tile_size();
        let bounds = self.viewport.bounds();
        TileRange {
            i1: (bounds.x1 / tile_size).floor() as i64,
            j1: (bounds.y1 / tile_size).floor() as i64,
            i2: (bounds.x2 / tile_size).ceil() as i64 - 1,
            j2: (bounds.y2 / tile_size).ceil() as i64 - 1,
        }
    }

    fn tile_size(&self) -> f64 {
        self.viewport.projection().tile_size as f64
    }

    /// Draw one frame onto the surface and start fetching whatever was
    /// missing from the caches.
    pub fn draw(&mut self) {
        if self.config.is_none() {
            return;
        }
        self.sync_size();

        let transform = self.viewport.frame_transform();
        self.scheduler.begin_frame();
        self.surface.clear();

        self.draw_tiles(&transform);
        self.draw_elements(&transform);

        self.scheduler.end_frame();
    }

    fn draw_tiles(&mut self, transform: &FrameTransform) {
        let position = self.viewport.position;
        let (width, height) = (self.viewport.width, self.viewport.height);

        self.surface.save();
        self.surface
            .translate((width / 2.0).floor(), (height / 2.0).floor());
        self.surface.scale(transform.scale);
        self.surface.translate(
            -position.x + transform.adjust.x,
            -position.y + transform.adjust.y,
        );

        let range = self.visible_tiles();
        for (i, j) in range.iter() {
            self.draw_tile(i, j, true);
        }

        // Zooming out uncovers tiles around the grid; show what is cached
        if self.viewport.is_animating() {
            for (i, j) in range.ring(ANIMATION_TILE_MARGIN) {
                self.draw_tile(i, j, false);
            }
        }

        self.surface.restore();
    }

    /// Cached tile at `coord`, reporting a miss to the scheduler if asked to
    fn cached_tile(&mut self, coord: TileCoord, fetch: bool) -> Option<Arc<S::Bitmap>> {
        let url = self.source.url(coord);
        let tile = self.tiles.get(&url);
        if tile.is_none() && fetch {
            self.scheduler.request(&url, CacheTarget::Tile);
        }
        tile
    }

    fn draw_tile(&mut self, i: i64, j: i64, fetch: bool) {
        let zoom = self.viewport.zoom;
        let Some(coord) = TileCoord::checked(i, j, zoom) else {
            return;
        };

        let tile_size = self.tile_size();
        let dst = Rect::square(i as f64 * tile_size, j as f64 * tile_size, tile_size);

        if let Some(tile) = self.cached_tile(coord, fetch) {
            self.surface.draw_bitmap(&tile, None, dst);
            return;
        }

        // Upscale the closest coarser tile we have
        let min_zoom = self.viewport.min_zoom;
        for levels in 1..=zoom.saturating_sub(min_zoom) {
            let Some((ancestor, di, dj)) = coord.ancestor(levels) else {
                break;
            };
            if let Some(tile) = self.cached_tile(ancestor, false) {
                let part = tile_size / (1u32 << levels) as f64;
                let src = Rect::square(part * di as f64, part * dj as f64, part);
                self.surface.draw_bitmap(&tile, Some(src), dst);
                break;
            }
        }

        // Patch in finer tiles where available
        let max_zoom = self.viewport.max_zoom;
        for levels in 1..=DESCENDANT_LEVELS {
            if zoom as u32 + levels as u32 > max_zoom as u32 {
                break;
            }
            let part = tile_size / (1u32 << levels) as f64;
            for (child, di, dj) in coord.descendants(levels) {
                if let Some(tile) = self.cached_tile(child, false) {
                    let patch = Rect::square(dst.x + di as f64 * part, dst.y + dj as f64 * part, part);
                    self.surface.draw_bitmap(&tile, None, patch);
                }
            }
        }
    }

    fn draw_elements(&mut self, transform: &FrameTransform) {
        let (width, height) = (self.viewport.width, self.viewport.height);
        let center = self.viewport.screen_center();
        let zoom = self.viewport.zoom as f64;
        let animating = self.viewport.is_animating();

        self.surface.save();
        self.surface.translate(0.5, 0.5);
        self.surface.set_filter(None);
        let mut current_filter: Option<String> = None;

        let elements = std::mem::take(&mut self.elements);
        for element in &elements {
            let position = if animating {
                transform.apply(element.position, center)
            } else {
                element.position
            };

            let size = element.size;
            if position.x < -size || position.x > width + size {
                continue;
            }
            if position.y < -size || position.y > height + size {
                continue;
            }

            match &element.kind {
                RenderKind::Marker => {
                    let marker = &element.markers[0];
                    if marker.filter != current_filter {
                        self.surface.set_filter(marker.filter.as_deref());
                        current_filter = marker.filter.clone();
                    }

                    match &marker.appearance {
                        MarkerAppearance::Icon(url) => {
                            let side = adapt_marker_size(marker.size, transform.zoom);
                            if let Some(icon) = self.cached_icon(url) {
                                let dst = Rect::square(
                                    position.x - side / 2.0,
                                    position.y - side / 2.0,
                                    side,
                                );
                                self.surface.draw_bitmap(&icon, None, dst);
                            }
                        }
                        MarkerAppearance::Circle(color) => {
                            let radius = adapt_marker_size(marker.size / 2.0, zoom);
                            self.surface.fill_circle(position, radius, *color);
                        }
                        MarkerAppearance::Hidden => {}
                    }
                }
                RenderKind::Cluster { color } => {
                    if current_filter.take().is_some() {
                        self.surface.set_filter(None);
                    }
                    self.draw_cluster(element, position, *color, zoom);
                }
            }
        }
        self.elements = elements;

        self.surface.restore();
    }

    fn cached_icon(&mut self, url: &str) -> Option<Arc<S::Bitmap>> {
        let icon = self.icons.get(url);
        if icon.is_none() {
            self.scheduler.request(url, CacheTarget::Icon);
        }
        icon
    }

    fn draw_cluster(&mut self, element: &RenderElement, position: Point, color: Color, zoom: f64) {
        let radius = adapt_marker_size(element.size / 2.0, zoom);
        self.surface.fill_circle(position, radius, color);

        let font_px = (element.size / 2.0).floor();
        let text = element.count().to_string();
        let width = self.surface.measure_text(&text, font_px) + 8.0;
        let baseline = Point::new(
            position.x - width / 2.0 + 4.0,
            position.y + element.size / 6.0,
        );
        self.surface.fill_text(&text, baseline, font_px, Color::WHITE);
    }
}
