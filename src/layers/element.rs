use std::sync::Arc;

use crate::{
    core::geo::Point,
    layers::marker::{Color, Marker},
};

#[derive(Debug, Clone, PartialEq)]
pub enum RenderKind {
    /// A lone marker drawn with its own appearance
    Marker,
    /// Two or more merged markers, drawn as a disc with a count badge
    Cluster { color: Color },
}

/// Something drawn on top of the tiles during one frame.
///
/// Rebuilt on every update; positions are screen pixels relative to the
/// top-left corner of the viewport at the current integer zoom.
#[derive(Debug, Clone)]
pub struct RenderElement {
    pub kind: RenderKind,
    pub position: Point,
    /// Radius of the smallest circle containing every member footprint
    pub size: f64,
    pub clickable: bool,
    pub markers: Vec<Arc<Marker>>,
}

impl RenderElement {
    pub fn is_cluster(&self) -> bool {
        matches!(self.kind, RenderKind::Cluster { .. })
    }

    pub fn count(&self) -> usize {
        self.markers.len()
    }
}
