//! Hand landmark extraction boundary.

use std::{collections::VecDeque, fs, path::Path};

use anyhow::{Context, Result, anyhow};

use crate::types::{Frame, HandKeypoints, NUM_KEYPOINTS};

/// Produces zero or more hands per frame. Hand order carries no identity
/// across frames.
pub trait LandmarkExtractor {
    fn name(&self) -> &str;

    fn extract(&mut self, frame: &Frame) -> Result<Vec<HandKeypoints>>;

    /// True once no further hands will ever be produced.
    fn exhausted(&self) -> bool {
        false
    }
}

/// Stand-in when no model backend is compiled in.
pub struct NoHands;

impl LandmarkExtractor for NoHands {
    fn name(&self) -> &str {
        "none"
    }

    fn extract(&mut self, _frame: &Frame) -> Result<Vec<HandKeypoints>> {
        Ok(Vec::new())
    }
}

/// Plays back recorded keypoints, one script entry per frame.
///
/// The script is a JSON array of frames; each frame is an array of hands
/// and each hand is an array of 21 `[x, y]` pairs in normalised frame
/// coordinates.
#[derive(Debug)]
pub struct ReplayExtractor {
    frames: VecDeque<Vec<HandKeypoints>>,
    total: usize,
}

impl ReplayExtractor {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read replay script {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("invalid replay script {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let raw: Vec<Vec<Vec<[f32; 2]>>> =
            serde_json::from_str(content).context("replay script is not a frame array")?;
        let frames = raw
            .into_iter()
            .enumerate()
            .map(|(frame_idx, hands)| {
                hands
                    .into_iter()
                    .enumerate()
                    .map(|(hand_idx, points)| {
                        let points = points
                            .into_iter()
                            .map(replay_point)
                            .collect::<Option<Vec<_>>>()
                            .ok_or_else(|| {
                                anyhow!("frame {frame_idx}, hand {hand_idx}: non-finite coordinate")
                            })?;
                        HandKeypoints::from_slice(&points).ok_or_else(|| {
                            anyhow!(
                                "frame {frame_idx}, hand {hand_idx}: expected {NUM_KEYPOINTS} points, got {}",
                                points.len()
                            )
                        })
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<VecDeque<_>>>()?;

        let total = frames.len();
        log::info!("loaded replay script with {total} frames");
        Ok(Self { frames, total })
    }

    pub fn from_frames(frames: Vec<Vec<HandKeypoints>>) -> Self {
        let total = frames.len();
        Self {
            frames: frames.into(),
            total,
        }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

/// Scripted points are clamped into the frame like decoded model output;
/// NaN and infinities are rejected.
fn replay_point([x, y]: [f32; 2]) -> Option<(f32, f32)> {
    (x.is_finite() && y.is_finite()).then(|| (x.clamp(0.0, 1.0), y.clamp(0.0, 1.0)))
}

impl LandmarkExtractor for ReplayExtractor {
    fn name(&self) -> &str {
        "replay"
    }

    fn extract(&mut self, _frame: &Frame) -> Result<Vec<HandKeypoints>> {
        Ok(self.frames.pop_front().unwrap_or_default())
    }

    fn exhausted(&self) -> bool {
        self.remaining() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn hand_json(x: f32, y: f32) -> String {
        let points: Vec<String> = (0..NUM_KEYPOINTS).map(|_| format!("[{x}, {y}]")).collect();
        format!("[{}]", points.join(", "))
    }

    fn blank() -> Frame {
        Frame::solid(4, 4, [0, 0, 0, 255])
    }

    #[test]
    fn replays_frames_in_order() {
        let script = format!(
            "[[], [{}], [{}, {}]]",
            hand_json(0.5, 0.5),
            hand_json(0.2, 0.3),
            hand_json(0.8, 0.3)
        );
        let mut replay = ReplayExtractor::from_json(&script).unwrap();
        assert_eq!(replay.total(), 3);

        let frame = blank();
        assert!(replay.extract(&frame).unwrap().is_empty());
        assert_eq!(replay.extract(&frame).unwrap().len(), 1);
        let two = replay.extract(&frame).unwrap();
        assert_eq!(two[1].point(0), (0.8, 0.3));
        assert!(replay.exhausted());
        assert!(replay.extract(&frame).unwrap().is_empty());
    }

    #[test]
    fn rejects_short_hands() {
        let err = ReplayExtractor::from_json("[[[[0.1, 0.2]]]]").unwrap_err();
        assert!(format!("{err:#}").contains("expected 21 points"));
        assert!(ReplayExtractor::from_json("{\"frames\": []}").is_err());
    }

    #[test]
    fn out_of_frame_points_are_clamped() {
        let mut points = vec!["[0.5, 0.5]".to_string(); NUM_KEYPOINTS];
        points[0] = "[-1e12, 0.5]".to_string();
        points[1] = "[1e12, 2.5]".to_string();
        let script = format!("[[[{}]]]", points.join(", "));
        let mut replay = ReplayExtractor::from_json(&script).unwrap();
        let hands = replay.extract(&blank()).unwrap();
        assert_eq!(hands[0].point(0), (0.0, 0.5));
        assert_eq!(hands[0].point(1), (1.0, 1.0));
    }

    #[test]
    fn non_finite_points_are_rejected() {
        assert_eq!(replay_point([0.2, 0.3]), Some((0.2, 0.3)));
        assert_eq!(replay_point([f32::NAN, 0.3]), None);
        assert_eq!(replay_point([0.2, f32::INFINITY]), None);
    }

    #[test]
    fn loads_script_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[[{}]]", hand_json(0.1, 0.9)).unwrap();
        let replay = ReplayExtractor::from_file(file.path()).unwrap();
        assert_eq!(replay.remaining(), 1);
    }

    #[test]
    fn no_hands_is_never_exhausted() {
        let mut extractor = NoHands;
        assert!(extractor.extract(&blank()).unwrap().is_empty());
        assert!(!extractor.exhausted());
    }
}
