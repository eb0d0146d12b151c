pub mod camera;
pub mod graph;
pub mod layout;
pub mod loader;

pub use camera::ScreenPoint;
pub use graph::{NodeId, SceneGraph};
