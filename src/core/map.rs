use std::{sync::Arc, time::Duration};

use instant::Instant;
use serde::Deserialize;

use crate::{
    core::{
        config::TileMapConfig,
        constants::DEFAULT_CENTER,
        geo::{LatLng, Point},
        projection::WebMercator,
        viewport::Viewport,
    },
    input::events::{ButtonState, MapCursor, PointerState},
    layers::{
        element::{RenderElement, RenderKind},
        marker::{Color, Marker},
    },
    rendering::{renderer::adapt_marker_size, surface::DrawSurface},
    runtime::AsyncSpawner,
    spatial::clustering::cluster_markers,
    tiles::{
        cache::TileCache,
        loader::ImageLoader,
        scheduler::{FetchScheduler, FetchStats, FetchWaker},
        source::UrlTemplate,
    },
    MapError, Result,
};

/// Receives the markers under the pointer when a clickable element is clicked
pub type ClickHandler = Box<dyn FnMut(&[Arc<Marker>]) + Send>;

/// A single interactive map bound to one drawing surface.
///
/// The host drives it once per frame: [`update`](Self::update) with the
/// current pointer state, then [`draw`](Self::draw). Everything the map needs
/// (viewport, marker groups, tile and icon caches, fetch scheduler) lives in
/// this struct, so several maps can coexist without sharing state.
pub struct TileMap<S, L>
where
    S: DrawSurface,
    L: ImageLoader<Bitmap = S::Bitmap>,
{
    pub(crate) surface: S,
    pub(crate) config: Option<TileMapConfig>,
    pub(crate) source: UrlTemplate,
    pub(crate) viewport: Viewport,
    /// Marker groups in insertion order
    groups: Vec<(String, Vec<Arc<Marker>>)>,
    pub(crate) elements: Vec<RenderElement>,
    pub(crate) tiles: TileCache<S::Bitmap>,
    pub(crate) icons: TileCache<S::Bitmap>,
    pub(crate) scheduler: FetchScheduler<L>,
    on_click: Option<ClickHandler>,
    cursor: MapCursor,
    frame: u64,
    last_wheel: Option<Instant>,
    busy: bool,
}

impl<S, L> TileMap<S, L>
where
    S: DrawSurface,
    L: ImageLoader<Bitmap = S::Bitmap>,
{
    pub fn new(surface: S, loader: Arc<L>, spawner: Arc<dyn AsyncSpawner>) -> Self {
        Self {
            surface,
            config: None,
            source: UrlTemplate::new(""),
            viewport: Viewport::default(),
            groups: Vec::new(),
            elements: Vec::new(),
            tiles: TileCache::default(),
            icons: TileCache::default(),
            scheduler: FetchScheduler::new(loader, spawner),
            on_click: None,
            cursor: MapCursor::default(),
            frame: 0,
            last_wheel: None,
            busy: false,
        }
    }

    /// Configure the tile source and reset the view to its default centre.
    ///
    /// Calling it again swaps the configuration and drops every cached
    /// bitmap. Marker groups and the click handler are kept.
    pub fn init(&mut self, config: TileMapConfig) -> Result<()> {
        config.validate()?;

        self.scheduler.cancel();
        self.scheduler.set_max_workers(config.max_fetchers);
        self.tiles = TileCache::new(config.tile_cache_size);
        self.icons = TileCache::new(config.icon_cache_size);
        self.source = UrlTemplate::new(config.url.as_str());

        let mut viewport = Viewport::new(WebMercator::new(config.tile_size));
        viewport.set_zoom_limits(config.min_zoom, config.max_zoom);
        let zoom = viewport.zoom;
        viewport.move_to(LatLng::new(DEFAULT_CENTER.0, DEFAULT_CENTER.1), Some(zoom));
        self.viewport = viewport;
        self.sync_size();

        log::debug!(
            "tile map initialized: {} (tile size {}, zoom {}..={})",
            config.url,
            config.tile_size,
            config.min_zoom,
            config.max_zoom
        );

        self.config = Some(config);
        self.elements.clear();
        self.busy = true;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.config.is_some()
    }

    pub(crate) fn sync_size(&mut self) {
        self.viewport
            .set_size(self.surface.width() as f64, self.surface.height() as f64);
    }

    /// Centre the view on (`lat`, `lng`), optionally switching zoom level.
    ///
    /// The zoom is clamped to the configured range and any zoom animation is
    /// stopped.
    pub fn move_to(&mut self, lat: f64, lng: f64, zoom: Option<u8>) -> Result<()> {
        if self.config.is_none() {
            return Err(MapError::NotInitialized);
        }
        if !lat.is_finite() || !lng.is_finite() {
            return Err(MapError::InvalidCoordinates { lat, lng });
        }

        self.sync_size();
        if self.viewport.move_to(LatLng::new(lat, lng), zoom) {
            self.scheduler.cancel();
        }
        self.busy = true;
        Ok(())
    }

    /// Replace (or create) the marker group `group`.
    ///
    /// Every marker is validated first; on error the previous group content is
    /// left untouched.
    pub fn set_markers(&mut self, group: impl Into<String>, markers: Vec<Marker>) -> Result<()> {
        for marker in &markers {
            marker.validate()?;
        }
        let markers: Vec<_> = markers.into_iter().map(Arc::new).collect();

        let group = group.into();
        match self.groups.iter_mut().find(|(key, _)| *key == group) {
            Some((_, existing)) => *existing = markers,
            None => self.groups.push((group, markers)),
        }
        self.busy = true;
        Ok(())
    }

    /// Same as [`set_markers`](Self::set_markers), from a JSON array of
    /// marker objects.
    pub fn set_markers_json(
        &mut self,
        group: impl Into<String>,
        markers: &serde_json::Value,
    ) -> Result<()> {
        if !markers.is_array() {
            return Err(MapError::InvalidMarkers("not an array of markers".into()));
        }
        let markers = Vec::<Marker>::deserialize(markers)
            .map_err(|err| MapError::InvalidMarkers(err.to_string()))?;
        self.set_markers(group, markers)
    }

    /// Remove a marker group. Returns `false` if it did not exist.
    pub fn clear_markers(&mut self, group: &str) -> bool {
        let before = self.groups.len();
        self.groups.retain(|(key, _)| key != group);
        let removed = self.groups.len() != before;
        self.busy |= removed;
        removed
    }

    pub fn markers(&self, group: &str) -> Option<&[Arc<Marker>]> {
        self.groups
            .iter()
            .find(|(key, _)| key == group)
            .map(|(_, markers)| markers.as_slice())
    }

    pub fn set_on_click<F>(&mut self, handler: F)
    where
        F: FnMut(&[Arc<Marker>]) + Send + 'static,
    {
        self.on_click = Some(Box::new(handler));
    }

    /// Callback run by fetch tasks when a bitmap is ready to be applied
    pub fn set_waker(&mut self, waker: Option<FetchWaker>) {
        self.scheduler.set_waker(waker);
    }

    /// Zoom by `delta` levels keeping the screen point `anchor` (default: the
    /// screen centre) fixed.
    ///
    /// Returns `false` without touching anything when the map is not
    /// initialized or the target zoom is outside the configured range.
    pub fn zoom(&mut self, delta: i32, anchor: Option<Point>) -> bool {
        let Some(frames) = self.config.as_ref().map(|c| c.zoom_animation_frames) else {
            return false;
        };

        self.sync_size();
        let anchor = anchor.unwrap_or_else(|| self.viewport.screen_center());
        if !self.viewport.zoom_by(delta, anchor, self.frame, frames) {
            return false;
        }

        self.scheduler.cancel();
        self.busy = true;
        true
    }

    /// Advance one frame: apply finished fetches, step the zoom animation,
    /// rebuild clusters and react to the pointer.
    pub fn update(&mut self, pointer: &PointerState) {
        let Some((grid_factor, wheel_interval)) = self
            .config
            .as_ref()
            .map(|c| (c.cluster_grid_factor, Duration::from_millis(c.wheel_interval_ms)))
        else {
            return;
        };
        self.sync_size();

        if self
            .scheduler
            .process_completions(&mut self.tiles, &mut self.icons)
        {
            self.busy = true;
        }

        self.frame += 1;
        if self.viewport.is_animating() && self.viewport.advance_animation(self.frame) {
            self.busy = true;
        }

        self.rebuild_elements(grid_factor);

        // Topmost clickable element under the pointer
        let zoom = self.viewport.zoom as f64;
        let targets = self
            .elements
            .iter()
            .rev()
            .find(|element| {
                element.clickable
                    && element.position.distance_to(&pointer.position)
                        < adapt_marker_size(element.size, zoom) / 2.0
            })
            .map(|element| element.markers.clone());

        if pointer.left.is_down() && (targets.is_none() || self.viewport.is_dragging()) {
            self.viewport.drag_to(pointer.position);
        } else if pointer.left == ButtonState::Up {
            self.viewport.release();
        }

        if pointer.left.is_released() && !self.viewport.is_dragging() {
            if let (Some(targets), Some(handler)) = (&targets, self.on_click.as_mut()) {
                handler(targets.as_slice());
            }
        }

        self.cursor = if self.viewport.is_dragging() {
            MapCursor::Grabbing
        } else if targets.is_some() {
            MapCursor::Pointer
        } else {
            MapCursor::Grab
        };

        if pointer.wheel != 0.0 {
            let now = Instant::now();
            let ready = self
                .last_wheel
                .map_or(true, |last| now.duration_since(last) >= wheel_interval);
            if ready {
                let delta = if pointer.wheel < 0.0 { 1 } else { -1 };
                self.zoom(delta, Some(pointer.position));
                self.last_wheel = Some(now);
            }
        }

        self.viewport.clamp_to_world();
    }

    fn rebuild_elements(&mut self, grid_factor: f64) {
        let origin = self.viewport.bounds().top_left();
        let viewport = &self.viewport;

        let projected = self
            .groups
            .iter()
            .flat_map(|(_, markers)| markers.iter())
            .map(|marker| (viewport.project(marker.position()), marker));
        let clusters = cluster_markers(grid_factor, projected);

        let mut markers = Vec::new();
        let mut merged = Vec::new();
        for cluster in clusters {
            let position = cluster.center.subtract(&origin);
            if cluster.is_single() {
                markers.push(RenderElement {
                    kind: RenderKind::Marker,
                    position,
                    size: cluster.radius,
                    clickable: cluster.members[0].clickable,
                    markers: cluster.members,
                });
            } else {
                merged.push(RenderElement {
                    kind: RenderKind::Cluster {
                        color: Color::from_tag(cluster.tag.as_deref()),
                    },
                    position,
                    size: cluster.radius,
                    clickable: true,
                    markers: cluster.members,
                });
            }
        }

        // Individual markers go on top
        merged.extend(markers);
        self.elements = merged;
    }

    pub fn coord_to_screen(&self, lat: f64, lng: f64) -> Point {
        self.viewport.coord_to_screen(LatLng::new(lat, lng))
    }

    pub fn screen_to_coord(&self, point: Point) -> LatLng {
        self.viewport.screen_to_coord(point)
    }

    /// Geographic location at the centre of the screen
    pub fn coordinates(&self) -> LatLng {
        self.viewport.center()
    }

    pub fn zoom_level(&self) -> u8 {
        self.viewport.zoom
    }

    pub fn width(&self) -> u32 {
        self.surface.width()
    }

    pub fn height(&self) -> u32 {
        self.surface.height()
    }

    pub fn cursor(&self) -> MapCursor {
        self.cursor
    }

    /// `true` while the map wants more frames (animation running, view moved,
    /// fresh bitmaps available) and nobody took the request yet.
    pub fn is_busy(&self) -> bool {
        self.busy || self.viewport.is_animating()
    }

    pub fn take_redraw_request(&mut self) -> bool {
        std::mem::take(&mut self.busy)
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Render elements built by the last update
    pub fn elements(&self) -> &[RenderElement] {
        &self.elements
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn tile_cache(&self) -> &TileCache<S::Bitmap> {
        &self.tiles
    }

    /// Mutable access to the tile cache, e.g. to seed it with bitmaps the
    /// host already has
    pub fn tile_cache_mut(&mut self) -> &mut TileCache<S::Bitmap> {
        &mut self.tiles
    }

    pub fn icon_cache(&self) -> &TileCache<S::Bitmap> {
        &self.icons
    }

    pub fn fetch_stats(&self) -> FetchStats {
        self.scheduler.stats()
    }

    pub fn scheduler(&self) -> &FetchScheduler<L> {
        &self.scheduler
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }
}
