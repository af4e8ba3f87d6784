use std::{marker::PhantomData, sync::Arc};

use crate::{
    core::geo::Point,
    layers::marker::Color,
    rendering::surface::{DrawSurface, Rect},
};

/// Commands recorded by [`RenderContext`]
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear,
    Save,
    Restore,
    Translate { dx: f64, dy: f64 },
    Scale { factor: f64 },
    Bitmap {
        /// Identity of the bitmap, see [`BitmapId`]
        id: String,
        src: Option<Rect>,
        dst: Rect,
    },
    Circle {
        center: Point,
        radius: f64,
        color: Color,
    },
    Text {
        text: String,
        position: Point,
        font_px: f64,
        color: Color,
    },
    Filter(Option<String>),
}

/// Gives recorded bitmaps a printable identity.
///
/// The recording context does not rasterize anything, so it only keeps
/// enough to tell which bitmap was drawn.
pub trait BitmapId {
    fn bitmap_id(&self) -> String;
}

impl BitmapId for String {
    fn bitmap_id(&self) -> String {
        self.clone()
    }
}

impl BitmapId for image::RgbaImage {
    fn bitmap_id(&self) -> String {
        format!("rgba {}x{}", self.width(), self.height())
    }
}

impl<T: BitmapId + ?Sized> BitmapId for Arc<T> {
    fn bitmap_id(&self) -> String {
        (**self).bitmap_id()
    }
}

/// Headless surface that records every drawing call in a queue.
///
/// Used by tests and by hosts that replay the queue onto their own canvas.
/// Text width is estimated at 0.6 em per character.
pub struct RenderContext<B = String> {
    pub width: u32,
    pub height: u32,
    pub drawing_queue: Vec<DrawCommand>,
    depth: usize,
    _bitmap: PhantomData<fn(&B)>,
}

impl<B> RenderContext<B> {
    /// Create a new render context
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            drawing_queue: Vec::new(),
            depth: 0,
            _bitmap: PhantomData,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// Get the current drawing queue
    pub fn get_drawing_queue(&self) -> &[DrawCommand] {
        &self.drawing_queue
    }

    /// Take the recorded commands, leaving the queue empty
    pub fn take_queue(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.drawing_queue)
    }

    /// Current `save` nesting depth
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn bitmaps(&self) -> impl Iterator<Item = (&str, Option<Rect>, Rect)> + '_ {
        self.drawing_queue.iter().filter_map(|cmd| match cmd {
            DrawCommand::Bitmap { id, src, dst } => Some((id.as_str(), *src, *dst)),
            _ => None,
        })
    }

    pub fn circles(&self) -> impl Iterator<Item = (Point, f64, Color)> + '_ {
        self.drawing_queue.iter().filter_map(|cmd| match cmd {
            DrawCommand::Circle {
                center,
                radius,
                color,
            } => Some((*center, *radius, *color)),
            _ => None,
        })
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.drawing_queue.iter().filter_map(|cmd| match cmd {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

impl<B: BitmapId> DrawSurface for RenderContext<B> {
    type Bitmap = B;

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear(&mut self) {
        self.drawing_queue.clear();
        self.drawing_queue.push(DrawCommand::Clear);
    }

    fn save(&mut self) {
        self.depth += 1;
        self.drawing_queue.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.drawing_queue.push(DrawCommand::Restore);
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.drawing_queue.push(DrawCommand::Translate { dx, dy });
    }

    fn scale(&mut self, factor: f64) {
        self.drawing_queue.push(DrawCommand::Scale { factor });
    }

    fn draw_bitmap(&mut self, bitmap: &B, src: Option<Rect>, dst: Rect) {
        self.drawing_queue.push(DrawCommand::Bitmap {
            id: bitmap.bitmap_id(),
            src,
            dst,
        });
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: Color) {
        self.drawing_queue.push(DrawCommand::Circle {
            center,
            radius,
            color,
        });
    }

    fn measure_text(&self, text: &str, font_px: f64) -> f64 {
        text.chars().count() as f64 * font_px * 0.6
    }

    fn fill_text(&mut self, text: &str, position: Point, font_px: f64, color: Color) {
        self.drawing_queue.push(DrawCommand::Text {
            text: text.to_string(),
            position,
            font_px,
            color,
        });
    }

    fn set_filter(&mut self, filter: Option<&str>) {
        self.drawing_queue
            .push(DrawCommand::Filter(filter.map(str::to_owned)));
    }
}
