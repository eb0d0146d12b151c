//! Hand-pose landmark model: letterboxed preprocessing and landmark decoding,
//! with an ONNX Runtime session behind the `handpose-ort` feature.

use anyhow::{Result, anyhow};
use image::{RgbaImage, imageops::FilterType};
use ndarray::Array4;

use crate::types::{Frame, HandKeypoints, NUM_KEYPOINTS};

pub const INPUT_SIZE: u32 = 224;

/// Hands scored below this are treated as absent.
pub const MIN_HAND_CONFIDENCE: f32 = 0.5;

/// Maps model input pixels back to the source frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
    pub orig_w: u32,
    pub orig_h: u32,
}

/// Resizes `frame` to fit a square `INPUT_SIZE` canvas, centred on black
/// padding, as an NHWC tensor in [0, 1].
pub fn prepare_frame(frame: &Frame) -> Result<(Array4<f32>, Letterbox)> {
    let img = RgbaImage::from_raw(frame.width, frame.height, frame.rgba.clone())
        .ok_or_else(|| anyhow!("failed to build RGBA image from frame"))?;

    let scale = INPUT_SIZE as f32 / (frame.width.max(frame.height).max(1) as f32);
    let new_w = ((frame.width as f32 * scale).round() as u32).clamp(1, INPUT_SIZE);
    let new_h = ((frame.height as f32 * scale).round() as u32).clamp(1, INPUT_SIZE);
    let resized = image::imageops::resize(&img, new_w, new_h, FilterType::Triangle);

    let pad_x = (INPUT_SIZE - new_w) / 2;
    let pad_y = (INPUT_SIZE - new_h) / 2;
    let mut input = Array4::<f32>::zeros((1, INPUT_SIZE as usize, INPUT_SIZE as usize, 3));
    for (x, y, pixel) in resized.enumerate_pixels() {
        let (ix, iy) = ((x + pad_x) as usize, (y + pad_y) as usize);
        for c in 0..3 {
            input[[0, iy, ix, c]] = pixel.0[c] as f32 / 255.0;
        }
    }

    Ok((
        input,
        Letterbox {
            scale,
            pad_x: pad_x as f32,
            pad_y: pad_y as f32,
            orig_w: frame.width,
            orig_h: frame.height,
        },
    ))
}

/// Reads 21 `(x, y, z)` triples in model input pixels.
pub fn decode_landmarks(flat: &[f32]) -> Result<Vec<[f32; 3]>> {
    if flat.len() < NUM_KEYPOINTS * 3 {
        return Err(anyhow!(
            "unexpected landmarks length: got {}, need {}",
            flat.len(),
            NUM_KEYPOINTS * 3
        ));
    }
    Ok(flat
        .chunks_exact(3)
        .take(NUM_KEYPOINTS)
        .map(|c| [c[0], c[1], c[2]])
        .collect())
}

/// Undoes the letterbox and normalises to [0, 1] frame coordinates.
pub fn normalise_landmarks(landmarks: &[[f32; 3]], letterbox: &Letterbox) -> Option<HandKeypoints> {
    let w = letterbox.orig_w.max(1) as f32;
    let h = letterbox.orig_h.max(1) as f32;
    let points: Vec<(f32, f32)> = landmarks
        .iter()
        .map(|[x, y, _]| {
            let px = (x - letterbox.pad_x) / letterbox.scale;
            let py = (y - letterbox.pad_y) / letterbox.scale;
            ((px / w).clamp(0.0, 1.0), (py / h).clamp(0.0, 1.0))
        })
        .collect();
    HandKeypoints::from_slice(&points)
}

#[cfg(feature = "handpose-ort")]
pub use engine::OrtExtractor;

#[cfg(feature = "handpose-ort")]
mod engine {
    use std::path::Path;

    use anyhow::{Context, Result, anyhow};
    use ort::{
        session::{Session, builder::GraphOptimizationLevel},
        value::Tensor,
    };

    use super::{MIN_HAND_CONFIDENCE, decode_landmarks, normalise_landmarks, prepare_frame};
    use crate::{
        pipeline::{landmarks::LandmarkExtractor, model_download::ensure_handpose_model_ready},
        types::{Frame, HandKeypoints},
    };

    /// Single-hand extractor over the full (letterboxed) frame.
    pub struct OrtExtractor {
        session: Session,
    }

    impl OrtExtractor {
        pub fn new(model_path: &Path) -> Result<Self> {
            ensure_handpose_model_ready(model_path).with_context(|| {
                format!("failed to prepare handpose model at {}", model_path.display())
            })?;

            let session = Session::builder()?
                .with_optimization_level(GraphOptimizationLevel::Level3)?
                .with_intra_threads(2)?
                .commit_from_file(model_path)
                .with_context(|| {
                    format!("failed to load ORT session from {}", model_path.display())
                })?;
            log::info!("handpose ORT backend ready using {}", model_path.display());
            Ok(Self { session })
        }
    }

    impl LandmarkExtractor for OrtExtractor {
        fn name(&self) -> &str {
            "onnx"
        }

        fn extract(&mut self, frame: &Frame) -> Result<Vec<HandKeypoints>> {
            let (input, letterbox) = prepare_frame(frame)?;
            let tensor = Tensor::from_array(input)?;
            let outputs = self
                .session
                .run(ort::inputs![tensor])
                .context("failed to run ORT session")?;

            if outputs.len() < 1 {
                return Err(anyhow!("model returned no outputs"));
            }
            let coords = outputs[0].try_extract_array::<f32>()?;
            let flattened: Vec<f32> = coords.iter().copied().collect();
            let landmarks = decode_landmarks(&flattened)?;

            let confidence = if outputs.len() > 1 {
                outputs[1]
                    .try_extract_array::<f32>()
                    .ok()
                    .and_then(|arr| arr.iter().next().copied())
                    .unwrap_or(0.0)
            } else {
                0.0
            };
            if confidence < MIN_HAND_CONFIDENCE {
                return Ok(Vec::new());
            }

            Ok(normalise_landmarks(&landmarks, &letterbox).into_iter().collect())
        }
    }
}
