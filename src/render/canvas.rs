//! Minimal 2D drawing surface over an RGBA frame buffer.

use crate::types::Frame;

pub type Color = [u8; 4];

/// Pixel height of one text line at scale 1 (5 rows plus spacing).
pub const LINE_HEIGHT: i32 = 7;
const GLYPH_ADVANCE: i32 = 4;

/// Drawing primitives the renderer needs. Coordinates are pixels and may
/// fall outside the surface; implementations clip.
pub trait Canvas {
    fn size(&self) -> (u32, u32);
    fn line(&mut self, from: (f32, f32), to: (f32, f32), color: Color, thickness: i32);
    fn fill_circle(&mut self, center: (i32, i32), radius: i32, color: Color);
    fn ring(&mut self, center: (i32, i32), radius: i32, color: Color, thickness: i32);
    fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Color);
    fn text(&mut self, origin: (i32, i32), text: &str, color: Color, scale: i32);
}

/// Width in pixels of `text` drawn at `scale`.
pub fn text_width(text: &str, scale: i32) -> i32 {
    text.chars().count() as i32 * GLYPH_ADVANCE * scale.max(1)
}

pub struct RgbaCanvas<'a> {
    frame: &'a mut Frame,
}

impl<'a> RgbaCanvas<'a> {
    pub fn new(frame: &'a mut Frame) -> Self {
        Self { frame }
    }

    /// Visits the on-surface pixels of the `radius` box around `center`
    /// whose squared distance passes `keep`.
    fn disc_pixels(
        &mut self,
        center: (i32, i32),
        radius: i32,
        keep: impl Fn(u64) -> bool,
        color: Color,
    ) {
        let (cx, cy) = (i64::from(center.0), i64::from(center.1));
        let r = i64::from(radius.max(0));
        let (w, h) = self.size();
        let (Some((x0, x1)), Some((y0, y1))) = (clip_span(cx - r, cx + r, w), clip_span(cy - r, cy + r, h))
        else {
            return;
        };
        for y in y0..=y1 {
            let dy = (i64::from(y) - cy).unsigned_abs();
            for x in x0..=x1 {
                let dx = (i64::from(x) - cx).unsigned_abs();
                if keep(dx * dx + dy * dy) {
                    self.put_pixel(x, y, color);
                }
            }
        }
    }

    fn put_pixel(&mut self, x: i32, y: i32, color: Color) {
        if x < 0 || y < 0 {
            return;
        }
        let (ux, uy) = (x as u32, y as u32);
        if ux >= self.frame.width || uy >= self.frame.height {
            return;
        }
        let idx = ((uy * self.frame.width + ux) as usize) * 4;
        let Some(px) = self.frame.rgba.get_mut(idx..idx + 4) else {
            return;
        };
        if color[3] == 255 {
            px.copy_from_slice(&color);
            return;
        }
        let alpha = color[3] as u16;
        for c in 0..3 {
            px[c] = ((color[c] as u16 * alpha + px[c] as u16 * (255 - alpha)) / 255) as u8;
        }
        px[3] = 255;
    }
}

impl Canvas for RgbaCanvas<'_> {
    fn size(&self) -> (u32, u32) {
        (self.frame.width, self.frame.height)
    }

    /// Bresenham with a diamond brush for thickness. The segment is clipped
    /// to the surface first, so far-off endpoints cost nothing.
    fn line(&mut self, from: (f32, f32), to: (f32, f32), color: Color, thickness: i32) {
        let radius = (thickness.max(1) - 1) / 2;
        let pad = f64::from(radius + 1);
        let (w, h) = self.size();
        let bounds = ((-pad, -pad), (f64::from(w) - 1.0 + pad, f64::from(h) - 1.0 + pad));
        let Some((from, to)) = clip_segment(from, to, bounds) else {
            return;
        };

        let (mut x0, mut y0) = (from.0.round() as i32, from.1.round() as i32);
        let (x1, y1) = (to.0.round() as i32, to.1.round() as i32);
        let dx = (x1 - x0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let dy = -(y1 - y0).abs();
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            for ox in -radius..=radius {
                for oy in -radius..=radius {
                    if ox.abs() + oy.abs() <= radius {
                        self.put_pixel(x0 + ox, y0 + oy, color);
                    }
                }
            }
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    fn fill_circle(&mut self, center: (i32, i32), radius: i32, color: Color) {
        let r = u64::from(radius.max(0).unsigned_abs());
        self.disc_pixels(center, radius, |d| d <= r * r, color);
    }

    fn ring(&mut self, center: (i32, i32), radius: i32, color: Color, thickness: i32) {
        let outer = u64::from(radius.max(0).unsigned_abs()).pow(2);
        let inner = u64::from((radius - thickness.max(1)).max(0).unsigned_abs()).pow(2);
        self.disc_pixels(center, radius, |d| d <= outer && d > inner, color);
    }

    fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Color) {
        let (width, height) = self.size();
        let xs = clip_span(i64::from(x), i64::from(x) + i64::from(w) - 1, width);
        let ys = clip_span(i64::from(y), i64::from(y) + i64::from(h) - 1, height);
        let (Some((x0, x1)), Some((y0, y1))) = (xs, ys) else {
            return;
        };
        for py in y0..=y1 {
            for px in x0..=x1 {
                self.put_pixel(px, py, color);
            }
        }
    }

    fn text(&mut self, origin: (i32, i32), text: &str, color: Color, scale: i32) {
        let scale = scale.max(1);
        let mut cx = origin.0;
        for ch in text.chars() {
            for (row, bits) in glyph(ch).into_iter().enumerate() {
                for col in 0..3i32 {
                    if (bits >> (2 - col)) & 1 != 0 {
                        self.fill_rect(
                            cx + col * scale,
                            origin.1 + row as i32 * scale,
                            scale,
                            scale,
                            color,
                        );
                    }
                }
            }
            cx = cx.saturating_add(GLYPH_ADVANCE * scale);
        }
    }
}

/// Inclusive `[lo, hi]` intersected with `[0, limit)`.
fn clip_span(lo: i64, hi: i64, limit: u32) -> Option<(i32, i32)> {
    let lo = lo.max(0);
    let hi = hi.min(i64::from(limit) - 1);
    // Both ends now lie in [0, limit), which fits i32 for any real frame.
    (lo <= hi).then(|| (lo as i32, hi as i32))
}

/// Liang-Barsky clip of a segment to an axis-aligned box, in f64 so huge
/// endpoints keep sub-pixel precision. `None` when nothing is inside or an
/// endpoint is not finite.
fn clip_segment(
    from: (f32, f32),
    to: (f32, f32),
    (min, max): ((f64, f64), (f64, f64)),
) -> Option<((f64, f64), (f64, f64))> {
    let (x0, y0) = (f64::from(from.0), f64::from(from.1));
    let (x1, y1) = (f64::from(to.0), f64::from(to.1));
    if ![x0, y0, x1, y1].iter().all(|v| v.is_finite()) {
        return None;
    }
    let (dx, dy) = (x1 - x0, y1 - y0);
    let (mut t0, mut t1) = (0.0f64, 1.0f64);
    for (p, q) in [(-dx, x0 - min.0), (dx, max.0 - x0), (-dy, y0 - min.1), (dy, max.1 - y0)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }
    let clamp = |x: f64, y: f64| (x.clamp(min.0, max.0), y.clamp(min.1, max.1));
    Some((clamp(x0 + t0 * dx, y0 + t0 * dy), clamp(x0 + t1 * dx, y0 + t1 * dy)))
}

/// 3x5 bitmap glyphs, one `u8` per row with the three low bits as columns.
fn glyph(c: char) -> [u8; 5] {
    match c.to_ascii_lowercase() {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '(' => [0b001, 0b010, 0b010, 0b010, 0b001],
        ')' => [0b100, 0b010, 0b010, 0b010, 0b100],
        '%' => [0b101, 0b001, 0b010, 0b100, 0b101],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        '_' => [0b000, 0b000, 0b000, 0b000, 0b111],
        ' ' => [0b000; 5],
        _ => [0b000, 0b000, 0b010, 0b000, 0b000],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: Color = [0, 0, 0, 255];
    const WHITE: Color = [255, 255, 255, 255];

    fn pixel(frame: &Frame, x: u32, y: u32) -> [u8; 4] {
        let idx = ((y * frame.width + x) * 4) as usize;
        [
            frame.rgba[idx],
            frame.rgba[idx + 1],
            frame.rgba[idx + 2],
            frame.rgba[idx + 3],
        ]
    }

    #[test]
    fn line_covers_both_endpoints() {
        let mut frame = Frame::solid(10, 10, BLACK);
        RgbaCanvas::new(&mut frame).line((1.0, 1.0), (8.0, 6.0), WHITE, 1);
        assert_eq!(pixel(&frame, 1, 1), WHITE);
        assert_eq!(pixel(&frame, 8, 6), WHITE);
        assert_eq!(pixel(&frame, 8, 1), BLACK);
    }

    #[test]
    fn drawing_outside_is_clipped() {
        let mut frame = Frame::solid(4, 4, BLACK);
        let mut canvas = RgbaCanvas::new(&mut frame);
        canvas.fill_circle((-20, -20), 5, WHITE);
        canvas.line((-5.0, 2.0), (50.0, 2.0), WHITE, 3);
        canvas.text((100, 100), "hidden", WHITE, 2);
        assert_eq!(frame.rgba.len(), 4 * 4 * 4);
        assert_eq!(pixel(&frame, 0, 0), BLACK);
        assert_eq!(pixel(&frame, 3, 2), WHITE);
    }

    #[test]
    fn far_off_endpoints_are_clipped_not_walked() {
        let mut frame = Frame::solid(8, 4, BLACK);
        let mut canvas = RgbaCanvas::new(&mut frame);
        canvas.line((-1e12, 2.0), (1e12, 2.0), WHITE, 1);
        canvas.line((f32::NAN, 0.0), (3.0, 0.0), WHITE, 1);
        canvas.line((f32::NEG_INFINITY, 0.0), (3.0, 0.0), WHITE, 1);
        for x in 0..8 {
            assert_eq!(pixel(&frame, x, 2), WHITE);
            assert_eq!(pixel(&frame, x, 0), BLACK);
        }
    }

    #[test]
    fn extreme_shapes_do_not_overflow() {
        let mut frame = Frame::solid(4, 4, BLACK);
        let mut canvas = RgbaCanvas::new(&mut frame);
        canvas.fill_circle((i32::MIN, i32::MAX), 5, WHITE);
        canvas.ring((i32::MAX, i32::MAX), 5, WHITE, 2);
        canvas.fill_rect(i32::MAX - 1, i32::MAX - 1, i32::MAX, 10, WHITE);
        assert!(frame.rgba.chunks_exact(4).all(|px| px == BLACK));

        RgbaCanvas::new(&mut frame).fill_circle((2, 2), i32::MAX, WHITE);
        assert!(frame.rgba.chunks_exact(4).all(|px| px == WHITE));
    }

    #[test]
    fn ring_leaves_centre_untouched() {
        let mut frame = Frame::solid(21, 21, BLACK);
        RgbaCanvas::new(&mut frame).ring((10, 10), 8, WHITE, 2);
        assert_eq!(pixel(&frame, 10, 10), BLACK);
        assert_eq!(pixel(&frame, 18, 10), WHITE);
    }

    #[test]
    fn translucent_colour_blends() {
        let mut frame = Frame::solid(1, 1, BLACK);
        RgbaCanvas::new(&mut frame).fill_rect(0, 0, 1, 1, [255, 0, 0, 128]);
        let px = pixel(&frame, 0, 0);
        assert_eq!(px[0], 128);
        assert_eq!(px[3], 255);
    }

    #[test]
    fn text_is_scaled() {
        let mut frame = Frame::solid(16, 16, BLACK);
        RgbaCanvas::new(&mut frame).text((0, 0), "1", WHITE, 2);
        // Top row of '1' is 0b010, so only the middle column at scale 2.
        assert_eq!(pixel(&frame, 0, 0), BLACK);
        assert_eq!(pixel(&frame, 2, 0), WHITE);
        assert_eq!(pixel(&frame, 3, 1), WHITE);
        assert_eq!(text_width("abc", 2), 24);
    }
}
