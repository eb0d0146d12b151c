pub mod capture;
pub mod commands;
#[cfg_attr(not(feature = "handpose-ort"), allow(dead_code))]
pub mod handpose;
pub mod landmarks;
#[cfg(feature = "handpose-ort")]
pub mod model_download;

// Re-exports for convenience
pub use capture::{BlankFrames, FrameSource};
pub use commands::{CommandQueue, LineSource, spawn_command_listener};
pub use landmarks::{LandmarkExtractor, NoHands, ReplayExtractor};
