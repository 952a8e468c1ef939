pub mod geometry;
pub mod input;
pub mod result;
pub mod scale;
pub mod view;

pub use input::{InputEvent, Key, PRIMARY_BUTTON, TrackPoint};
pub use result::{InvalidResult, RatingResult};
pub use scale::{InvalidTick, MIN_POINT_COUNT, Scale, Tick};
pub use view::{DisplayTarget, ScaleLabels, ScaleView, VisualOptions};
