pub mod canvas;
pub mod renderer;
pub mod skeleton;

pub use canvas::RgbaCanvas;
pub use renderer::{HudState, Renderer};
