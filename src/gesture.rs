use crate::{
    config::GestureConfig,
    types::{
        FINGERTIPS, GestureEvent, GestureKind, HandGesture, HandKeypoints, INDEX_TIP, THUMB_TIP,
        WRIST, ZoomGesture,
    },
};

/// Turns zero, one or two hands into a single [`GestureEvent`].
///
/// Displacement history is kept per gesture kind. When the hand switches
/// from pinch to fist and back, the pinch entry still holds the position of
/// the last pinch frame; it is overwritten on the next pinch rather than
/// cleared when another kind takes over.
pub struct GestureClassifier {
    cfg: GestureConfig,
    history: GestureHistory,
}

#[derive(Clone, Debug, Default)]
struct GestureHistory {
    pinch: Option<(f32, f32)>,
    fist: Option<(f32, f32)>,
    two_hand_distance: Option<f32>,
}

impl GestureHistory {
    fn slot(&mut self, kind: GestureKind) -> Option<&mut Option<(f32, f32)>> {
        match kind {
            GestureKind::Pinch => Some(&mut self.pinch),
            GestureKind::Fist => Some(&mut self.fist),
            GestureKind::TwoHandZoom | GestureKind::None => None,
        }
    }

    /// Returns the displacement from the previous position of `kind` and
    /// records `position` as the new reference.
    fn track(&mut self, kind: GestureKind, position: (f32, f32)) -> (f32, f32) {
        let Some(slot) = self.slot(kind) else {
            return (0.0, 0.0);
        };
        let displacement = match *slot {
            Some(prev) => (position.0 - prev.0, position.1 - prev.1),
            None => (0.0, 0.0),
        };
        *slot = Some(position);
        displacement
    }
}

impl GestureClassifier {
    pub fn new(cfg: GestureConfig) -> Self {
        Self {
            cfg,
            history: GestureHistory::default(),
        }
    }

    pub fn classify(&mut self, hands: &[HandKeypoints]) -> GestureEvent {
        match hands {
            [] => GestureEvent::None,
            [hand] => self.classify_single(hand),
            [first, second, rest @ ..] => {
                if !rest.is_empty() {
                    log::debug!("ignoring {} extra hands", rest.len());
                }
                self.classify_two_hands(first, second)
            }
        }
    }

    fn classify_single(&mut self, hand: &HandKeypoints) -> GestureEvent {
        // Pinch wins when both tests pass.
        if let Some((position, confidence)) = detect_pinch(hand, self.cfg.pinch_threshold) {
            let displacement = self.history.track(GestureKind::Pinch, position);
            log::debug!("pinch at ({:.3}, {:.3})", position.0, position.1);
            return GestureEvent::Pinch(HandGesture {
                position,
                displacement,
                confidence,
            });
        }

        if let Some((position, confidence)) = detect_fist(hand, self.cfg.fist_threshold) {
            let displacement = self.history.track(GestureKind::Fist, position);
            log::debug!("fist at ({:.3}, {:.3})", position.0, position.1);
            return GestureEvent::Fist(HandGesture {
                position,
                displacement,
                confidence,
            });
        }

        GestureEvent::None
    }

    fn classify_two_hands(&mut self, a: &HandKeypoints, b: &HandKeypoints) -> GestureEvent {
        let zoom = self.measure_zoom(a, b);
        if (zoom.ratio - 1.0).abs() > self.cfg.zoom_significance {
            log::debug!("two-hand zoom ratio {:.3}", zoom.ratio);
            GestureEvent::TwoHandZoom(zoom)
        } else {
            GestureEvent::None
        }
    }

    /// Ratio of the current hand separation to the previous one, snapped to
    /// 1.0 when the change is within the jitter band.
    fn measure_zoom(&mut self, a: &HandKeypoints, b: &HandKeypoints) -> ZoomGesture {
        let left = a.centroid();
        let right = b.centroid();
        let distance = distance2(left, right);

        let mut ratio = 1.0;
        if let Some(prev) = self.history.two_hand_distance {
            if prev > 0.0 {
                ratio = distance / prev;
                if (ratio - 1.0).abs() < self.cfg.zoom_snap_threshold {
                    ratio = 1.0;
                }
            }
        }
        self.history.two_hand_distance = Some(distance);

        ZoomGesture {
            left,
            right,
            distance,
            ratio,
        }
    }
}

fn detect_pinch(hand: &HandKeypoints, threshold: f32) -> Option<((f32, f32), f32)> {
    let thumb = hand.point(THUMB_TIP);
    let index = hand.point(INDEX_TIP);
    let distance = distance2(thumb, index);
    if distance >= threshold {
        return None;
    }
    let center = ((thumb.0 + index.0) / 2.0, (thumb.1 + index.1) / 2.0);
    Some((center, confidence(distance, threshold)))
}

fn detect_fist(hand: &HandKeypoints, threshold: f32) -> Option<((f32, f32), f32)> {
    let wrist = hand.point(WRIST);
    let mean = FINGERTIPS
        .iter()
        .map(|&idx| distance2(wrist, hand.point(idx)))
        .sum::<f32>()
        / FINGERTIPS.len() as f32;
    if mean >= threshold {
        return None;
    }
    Some((hand.centroid(), confidence(mean, threshold)))
}

fn confidence(distance: f32, threshold: f32) -> f32 {
    (1.0 - distance / threshold).max(0.0)
}

fn distance2(a: (f32, f32), b: (f32, f32)) -> f32 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}
