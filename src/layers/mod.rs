pub mod element;
pub mod marker;

pub use element::{RenderElement, RenderKind};
pub use marker::{Color, Marker, MarkerAppearance};
