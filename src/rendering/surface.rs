use crate::{core::geo::Point, layers::marker::Color};

/// Axis aligned rectangle in surface pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn square(x: f64, y: f64, side: f64) -> Self {
        Self::new(x, y, side, side)
    }
}

/// 2D drawing target supplied by the host.
///
/// Mirrors a canvas style API: a transform stack (`save`/`restore`,
/// `translate`, `scale`) applied to every subsequent primitive. Coordinates
/// passed to the primitives are in the current transformed space.
pub trait DrawSurface {
    /// Bitmap type accepted by [`draw_bitmap`](Self::draw_bitmap)
    type Bitmap;

    fn width(&self) -> u32;
    fn height(&self) -> u32;

    fn clear(&mut self);
    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, dx: f64, dy: f64);
    fn scale(&mut self, factor: f64);

    /// Draw `bitmap` (or the `src` crop of it) stretched into `dst`
    fn draw_bitmap(&mut self, bitmap: &Self::Bitmap, src: Option<Rect>, dst: Rect);
    fn fill_circle(&mut self, center: Point, radius: f64, color: Color);
    fn measure_text(&self, text: &str, font_px: f64) -> f64;
    /// `position` is the left end of the text baseline
    fn fill_text(&mut self, text: &str, position: Point, font_px: f64, color: Color);
    /// CSS style filter applied to subsequent primitives, `None` resets it
    fn set_filter(&mut self, filter: Option<&str>);
}
