//! Where rendered frames go: a native window or nowhere but a PNG snapshot.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use image::RgbaImage;

use crate::types::Frame;

pub trait Viewport {
    fn is_open(&self) -> bool;

    fn present(&mut self, frame: &Frame) -> Result<()>;

    /// Key tokens pressed since the last call, e.g. `"r"` or `"escape"`.
    fn poll_keys(&mut self) -> Vec<String> {
        Vec::new()
    }

    /// Called once after the loop exits.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Keeps the last presented frame and optionally writes it as PNG on finish.
#[derive(Default)]
pub struct HeadlessViewport {
    last: Option<Frame>,
    snapshot: Option<PathBuf>,
    presented: usize,
}

impl HeadlessViewport {
    pub fn new(snapshot: Option<PathBuf>) -> Self {
        Self {
            snapshot,
            ..Self::default()
        }
    }

    pub fn last_frame(&self) -> Option<&Frame> {
        self.last.as_ref()
    }

    pub fn presented(&self) -> usize {
        self.presented
    }
}

impl Viewport for HeadlessViewport {
    fn is_open(&self) -> bool {
        true
    }

    fn present(&mut self, frame: &Frame) -> Result<()> {
        self.last = Some(frame.clone());
        self.presented += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let Some(path) = self.snapshot.as_deref() else {
            return Ok(());
        };
        match self.last_frame() {
            Some(frame) => save_png(frame, path),
            None => {
                log::warn!("no frame rendered, skipping snapshot {}", path.display());
                Ok(())
            }
        }
    }
}

pub fn save_png(frame: &Frame, path: &Path) -> Result<()> {
    let img = RgbaImage::from_raw(frame.width, frame.height, frame.rgba.clone())
        .ok_or_else(|| anyhow!("frame buffer does not match {}x{}", frame.width, frame.height))?;
    img.save(path)
        .with_context(|| format!("failed to write snapshot {}", path.display()))?;
    log::info!("saved snapshot to {}", path.display());
    Ok(())
}

#[cfg(feature = "window-minifb")]
pub use window::WindowViewport;

#[cfg(feature = "window-minifb")]
mod window {
    use std::time::Duration;

    use anyhow::{Result, anyhow};
    use minifb::{Key, KeyRepeat, Window, WindowOptions};

    use super::Viewport;
    use crate::types::Frame;

    pub struct WindowViewport {
        window: Window,
        buf: Vec<u32>,
    }

    impl WindowViewport {
        pub fn new(title: &str, width: u32, height: u32) -> Result<Self> {
            let mut window = Window::new(
                title,
                width as usize,
                height as usize,
                WindowOptions {
                    resize: true,
                    ..WindowOptions::default()
                },
            )
            .map_err(|e| anyhow!("failed to open window: {e}"))?;
            window.limit_update_rate(Some(Duration::from_millis(16)));
            Ok(Self {
                window,
                buf: Vec::new(),
            })
        }
    }

    impl Viewport for WindowViewport {
        fn is_open(&self) -> bool {
            self.window.is_open()
        }

        fn present(&mut self, frame: &Frame) -> Result<()> {
            self.buf.clear();
            self.buf.extend(frame.rgba.chunks_exact(4).map(|px| {
                0xFF00_0000 | (px[0] as u32) << 16 | (px[1] as u32) << 8 | px[2] as u32
            }));
            self.window
                .update_with_buffer(&self.buf, frame.width as usize, frame.height as usize)
                .map_err(|e| anyhow!("failed to present frame: {e}"))
        }

        fn poll_keys(&mut self) -> Vec<String> {
            self.window
                .get_keys_pressed(KeyRepeat::No)
                .into_iter()
                .filter_map(|key| {
                    let token = match key {
                        Key::R => "r",
                        Key::D => "d",
                        Key::Z => "z",
                        Key::C => "c",
                        Key::Home => "home",
                        Key::Q => "q",
                        Key::Escape => "escape",
                        _ => return None,
                    };
                    Some(token.to_string())
                })
                .collect()
        }
    }
}
