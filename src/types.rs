use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Instant,
};

pub const NUM_KEYPOINTS: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_TIP: usize = 4;
pub const INDEX_TIP: usize = 8;
pub const FINGERTIPS: [usize; 5] = [4, 8, 12, 16, 20];

#[derive(Clone, Debug)]
pub struct Frame {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
    #[allow(dead_code)]
    pub timestamp: Instant,
}

impl Frame {
    /// Opaque frame filled with a single colour.
    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        let mut rgba = vec![0u8; (width as usize) * (height as usize) * 4];
        for px in rgba.chunks_exact_mut(4) {
            px.copy_from_slice(&color);
        }
        Self {
            rgba,
            width,
            height,
            timestamp: Instant::now(),
        }
    }

    pub fn mirror_horizontal(&mut self) {
        let stride = self.width as usize * 4;
        if stride == 0 {
            return;
        }
        for row in self.rgba.chunks_exact_mut(stride) {
            let (mut left, mut right) = (0usize, self.width as usize - 1);
            while left < right {
                for c in 0..4 {
                    row.swap(left * 4 + c, right * 4 + c);
                }
                left += 1;
                right -= 1;
            }
        }
    }
}

/// 21 normalised landmarks of one hand, x/y in [0, 1] frame space.
#[derive(Clone, Debug, PartialEq)]
pub struct HandKeypoints {
    points: [(f32, f32); NUM_KEYPOINTS],
}

impl HandKeypoints {
    pub fn new(points: [(f32, f32); NUM_KEYPOINTS]) -> Self {
        Self { points }
    }

    pub fn from_slice(points: &[(f32, f32)]) -> Option<Self> {
        let points: [(f32, f32); NUM_KEYPOINTS] = points.try_into().ok()?;
        Some(Self { points })
    }

    pub fn point(&self, idx: usize) -> (f32, f32) {
        self.points[idx]
    }

    pub fn points(&self) -> &[(f32, f32)] {
        &self.points
    }

    pub fn centroid(&self) -> (f32, f32) {
        let n = NUM_KEYPOINTS as f32;
        let (sx, sy) = self
            .points
            .iter()
            .fold((0.0, 0.0), |acc, p| (acc.0 + p.0, acc.1 + p.1));
        (sx / n, sy / n)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GestureKind {
    None,
    Pinch,
    Fist,
    TwoHandZoom,
}

impl GestureKind {
    pub fn label(&self) -> &'static str {
        match self {
            GestureKind::None => "none",
            GestureKind::Pinch => "pinch",
            GestureKind::Fist => "fist",
            GestureKind::TwoHandZoom => "two_hand_zoom",
        }
    }
}

/// Payload of a single-hand gesture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandGesture {
    pub position: (f32, f32),
    /// Motion since the previous frame of the same gesture kind.
    pub displacement: (f32, f32),
    pub confidence: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomGesture {
    pub left: (f32, f32),
    pub right: (f32, f32),
    pub distance: f32,
    pub ratio: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureEvent {
    None,
    Pinch(HandGesture),
    Fist(HandGesture),
    TwoHandZoom(ZoomGesture),
}

impl GestureEvent {
    pub fn kind(&self) -> GestureKind {
        match self {
            GestureEvent::None => GestureKind::None,
            GestureEvent::Pinch(_) => GestureKind::Pinch,
            GestureEvent::Fist(_) => GestureKind::Fist,
            GestureEvent::TwoHandZoom(_) => GestureKind::TwoHandZoom,
        }
    }

    pub fn display_text(&self) -> String {
        match self {
            GestureEvent::None => "No gesture".to_string(),
            GestureEvent::Pinch(g) => format!(
                "Pinch at ({:.2}, {:.2}) {:.0}%",
                g.position.0,
                g.position.1,
                g.confidence * 100.0
            ),
            GestureEvent::Fist(g) => format!("Fist {:.0}%", g.confidence * 100.0),
            GestureEvent::TwoHandZoom(z) => format!("Zoom factor: {:.2}", z.ratio),
        }
    }
}

/// Cooperative shutdown flag shared by the main loop and worker threads.
#[derive(Clone, Debug)]
pub struct RunFlag(Arc<AtomicBool>);

impl Default for RunFlag {
    fn default() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }
}

impl RunFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn stop(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
