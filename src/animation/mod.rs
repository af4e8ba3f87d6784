pub mod interpolation;
pub mod zoom;

pub use interpolation::{ease, ease_in_out_sine};
pub use zoom::ZoomAnimation;
