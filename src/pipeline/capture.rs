//! Frame sources: live camera capture on a worker thread and synthetic
//! frames for replay.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};

use crate::types::{Frame, RunFlag};

const FRAME_WAIT: Duration = Duration::from_millis(200);
const REPLAY_BACKGROUND: [u8; 4] = [24, 24, 32, 255];

pub trait FrameSource {
    /// Next frame to process, or `None` once the source is gone.
    fn next_frame(&mut self) -> Option<Frame>;
}

/// Endless solid frames of a fixed size.
pub struct BlankFrames {
    width: u32,
    height: u32,
}

impl BlankFrames {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl FrameSource for BlankFrames {
    fn next_frame(&mut self) -> Option<Frame> {
        Some(Frame::solid(self.width, self.height, REPLAY_BACKGROUND))
    }
}

/// Receives frames from a capture thread, skipping to the newest one.
#[cfg_attr(not(feature = "camera-nokhwa"), allow(dead_code))]
pub struct ChannelFrames {
    rx: Receiver<Frame>,
    running: RunFlag,
}

#[cfg_attr(not(feature = "camera-nokhwa"), allow(dead_code))]
impl ChannelFrames {
    pub fn new(rx: Receiver<Frame>, running: RunFlag) -> Self {
        Self { rx, running }
    }
}

impl FrameSource for ChannelFrames {
    fn next_frame(&mut self) -> Option<Frame> {
        while self.running.is_running() {
            match self.rx.recv_timeout(FRAME_WAIT) {
                Ok(frame) => return Some(self.rx.try_iter().last().unwrap_or(frame)),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    log::warn!("capture stream closed");
                    return None;
                }
            }
        }
        None
    }
}

#[cfg(any(feature = "camera-nokhwa", test))]
fn rgb_to_rgba(data: &[u8], width: u32, height: u32) -> anyhow::Result<Vec<u8>> {
    use rayon::prelude::*;

    let expected_len = width as usize * height as usize * 3;
    if data.len() < expected_len {
        anyhow::bail!(
            "RGB buffer too small: got {}, expected {}",
            data.len(),
            expected_len
        );
    }

    let mut rgba = vec![0u8; (width as usize * height as usize) * 4];
    rgba.par_chunks_mut(4)
        .zip(data.par_chunks_exact(3))
        .for_each(|(dst, src)| {
            dst[..3].copy_from_slice(src);
            dst[3] = 255;
        });
    Ok(rgba)
}

#[cfg(feature = "camera-nokhwa")]
pub use device::{CaptureStream, start_capture};

#[cfg(feature = "camera-nokhwa")]
mod device {
    use std::{thread, time::Instant};

    use anyhow::{Result, anyhow};
    use crossbeam_channel::Sender;
    use nokhwa::{
        Camera,
        pixel_format::RgbFormat,
        utils::{CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType},
    };

    use super::rgb_to_rgba;
    use crate::types::{Frame, RunFlag};

    const PREFERRED_PIXEL_FORMATS: &[FrameFormat] = &[
        FrameFormat::MJPEG,
        FrameFormat::YUYV,
        FrameFormat::NV12,
        FrameFormat::RAWRGB,
    ];

    fn requested_formats() -> [RequestedFormat<'static>; 3] {
        [
            RequestedFormat::with_formats(
                RequestedFormatType::AbsoluteHighestFrameRate,
                PREFERRED_PIXEL_FORMATS,
            ),
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate),
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::None),
        ]
    }

    /// Handle to the capture thread; dropping it stops and joins the thread.
    #[derive(Debug)]
    pub struct CaptureStream {
        running: RunFlag,
        handle: Option<thread::JoinHandle<()>>,
    }

    impl Drop for CaptureStream {
        fn drop(&mut self) {
            self.running.stop();
            if let Some(handle) = self.handle.take() {
                let _ = handle.join();
            }
        }
    }

    fn open_camera(index: u32) -> Result<Camera> {
        let mut last_err = None;
        for requested in requested_formats() {
            match Camera::new(CameraIndex::Index(index), requested) {
                Ok(mut camera) => match camera.open_stream() {
                    Ok(()) => return Ok(camera),
                    Err(err) => last_err = Some(err.into()),
                },
                Err(err) => last_err = Some(err.into()),
            }
        }
        Err(last_err.unwrap_or_else(|| anyhow!("failed to open camera {index}")))
    }

    /// Opens camera `index` and forwards decoded frames on `frame_tx`,
    /// mirrored when `mirror` is set. Frames are dropped while the
    /// receiver is still holding the previous one.
    pub fn start_capture(
        index: u32,
        mirror: bool,
        frame_tx: Sender<Frame>,
        running: RunFlag,
    ) -> Result<CaptureStream> {
        // Fail fast before spawning the capture thread.
        drop(open_camera(index)?);

        let flag = running.clone();
        let handle = thread::spawn(move || {
            let mut camera = match open_camera(index) {
                Ok(camera) => camera,
                Err(err) => {
                    log::error!("failed to open camera: {err:?}");
                    return;
                }
            };
            log::info!("camera {index} streaming at {}", camera.resolution());

            while flag.is_running() {
                let read_start = Instant::now();
                let buffer = match camera.frame() {
                    Ok(buffer) => buffer,
                    Err(err) => {
                        log::warn!(
                            "camera frame read failed (after {:?}): {err:?}",
                            read_start.elapsed()
                        );
                        continue;
                    }
                };
                let decoded = match buffer.decode_image::<RgbFormat>() {
                    Ok(img) => img,
                    Err(err) => {
                        log::warn!("failed to decode camera frame: {err:?}");
                        continue;
                    }
                };
                let (width, height) = (decoded.width(), decoded.height());
                let rgba = match rgb_to_rgba(&decoded.into_raw(), width, height) {
                    Ok(rgba) => rgba,
                    Err(err) => {
                        log::warn!("failed to convert camera frame: {err:?}");
                        continue;
                    }
                };

                let mut frame = Frame {
                    rgba,
                    width,
                    height,
                    timestamp: Instant::now(),
                };
                if mirror {
                    frame.mirror_horizontal();
                }
                let _ = frame_tx.try_send(frame);
            }
            if let Err(err) = camera.stop_stream() {
                log::warn!("failed to stop camera stream: {err:?}");
            }
        });

        Ok(CaptureStream {
            running,
            handle: Some(handle),
        })
    }
}
