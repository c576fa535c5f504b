pub mod canvas;
pub mod color;
pub mod halfblock;

pub use canvas::HalfBlockImage;
pub use color::ColorMode;
pub use halfblock::{render_image, TerminalGrid, Viewport};
