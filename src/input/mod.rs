pub mod events;

pub use events::{ButtonState, MapCursor, PointerState};
