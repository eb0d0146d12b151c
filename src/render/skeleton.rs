use super::canvas::{Canvas, Color};
use crate::types::HandKeypoints;

/// Bone list for the 21-point hand model.
pub const CONNECTIONS: &[(usize, usize)] = &[
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 4),
    (0, 5),
    (5, 6),
    (6, 7),
    (7, 8),
    (0, 9),
    (9, 10),
    (10, 11),
    (11, 12),
    (0, 13),
    (13, 14),
    (14, 15),
    (15, 16),
    (0, 17),
    (17, 18),
    (18, 19),
    (19, 20),
    (5, 9),
    (9, 13),
    (13, 17),
];

const BONE_COLOR: Color = [56, 189, 248, 255];
const JOINT_COLOR: Color = [248, 113, 113, 255];
const BONE_THICKNESS: i32 = 3;
const JOINT_RADIUS: i32 = 3;

/// Draws each hand's bones and joints, scaling normalised points to pixels.
pub fn draw_hands(canvas: &mut dyn Canvas, hands: &[HandKeypoints]) {
    let (width, height) = canvas.size();
    for hand in hands {
        let points: Vec<(f32, f32)> = hand
            .points()
            .iter()
            .map(|&(x, y)| (x * width as f32, y * height as f32))
            .collect();

        for &(a, b) in CONNECTIONS {
            if let (Some(&pa), Some(&pb)) = (points.get(a), points.get(b)) {
                canvas.line(pa, pb, BONE_COLOR, BONE_THICKNESS);
            }
        }
        for &(x, y) in &points {
            canvas.fill_circle((x.round() as i32, y.round() as i32), JOINT_RADIUS, JOINT_COLOR);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{render::canvas::RgbaCanvas, types::Frame};

    #[test]
    fn joints_land_at_scaled_positions() {
        let mut frame = Frame::solid(100, 50, [0, 0, 0, 255]);
        let hand = HandKeypoints::new([(0.5, 0.5); 21]);
        draw_hands(&mut RgbaCanvas::new(&mut frame), &[hand]);
        let idx = ((25 * 100 + 50) * 4) as usize;
        assert_eq!(&frame.rgba[idx..idx + 4], &JOINT_COLOR);
        assert_eq!(&frame.rgba[0..4], &[0, 0, 0, 255]);
    }

    #[test]
    fn every_bone_references_a_keypoint() {
        assert!(CONNECTIONS.iter().all(|&(a, b)| a < 21 && b < 21));
    }
}
