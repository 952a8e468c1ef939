pub mod layout;
pub mod render;
pub mod style;
pub mod text;

pub use layout::{Bounds, Hit, ScaleLayout};
pub use render::{FrameStats, SkiaRenderer};
pub use style::{parse_hex_color, ScaleStyle};
pub use text::{plain_text, render_text_pixmap, TextRenderer};
