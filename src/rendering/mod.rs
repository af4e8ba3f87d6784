pub mod context;
pub mod renderer;
pub mod surface;

// Re-export main types
pub use context::{BitmapId, DrawCommand, RenderContext};
pub use renderer::{adapt_marker_size, TileRange};
pub use surface::{DrawSurface, Rect};
