use crate::{
    animation::interpolation::{ease, ease_in_out_sine},
    core::geo::Point,
};

/// Interpolated transition between two integer zoom levels.
///
/// Time is measured in update frames, so the animation stays in lockstep with
/// the host's render loop regardless of wall-clock jitter.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomAnimation {
    from: f64,
    to: f64,
    value: f64,
    start_frame: u64,
    duration_frames: u32,
    /// Screen point held fixed while the scale changes
    anchor: Point,
}

impl ZoomAnimation {
    pub fn new(from: f64, to: f64, start_frame: u64, duration_frames: u32, anchor: Point) -> Self {
        Self {
            from,
            to,
            value: from,
            start_frame,
            duration_frames: duration_frames.max(1),
            anchor,
        }
    }

    /// Retarget a running animation: it continues from its current
    /// interpolated value instead of jumping to the previous target.
    pub fn chain(&mut self, to: f64, start_frame: u64, anchor: Point) {
        self.from = self.value;
        self.to = to;
        self.start_frame = start_frame;
        self.anchor = anchor;
    }

    /// Advance to `frame`. Returns `false` once the animation has finished.
    pub fn advance(&mut self, frame: u64) -> bool {
        let elapsed = frame.saturating_sub(self.start_frame) as f64;
        let t = elapsed / self.duration_frames as f64;

        if ease_in_out_sine(t) < 1.0 {
            self.value = ease(&self.from, &self.to, t);
            true
        } else {
            self.value = self.to;
            false
        }
    }

    /// Current fractional zoom
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn target(&self) -> f64 {
        self.to
    }

    pub fn anchor(&self) -> Point {
        self.anchor
    }

    /// Scale applied to content laid out at integer `zoom`
    pub fn scale(&self, zoom: u8) -> f64 {
        2_f64.powf(self.value - zoom as f64)
    }

    /// Translation (in `zoom` pixels) that keeps the anchor fixed on screen
    /// while content is drawn at [`scale`](Self::scale).
    pub fn adjust(&self, zoom: u8, screen_center: Point) -> Point {
        let delta = 2_f64.powf(zoom as f64 - self.value) - 1.0;
        self.anchor.subtract(&screen_center).multiply(delta)
    }
}
