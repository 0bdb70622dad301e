//! Draws the hand skeleton and the current prediction onto a copy of the frame.

use image::Rgb;

use crate::config::{parse_hex, UiConfig};
use crate::font;
use crate::types::{ChannelOrder, Frame, HandLandmarkSet, Prediction, RgbFrame};

/// Bones of the 21-point hand model: thumb, four fingers, and the palm edge.
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 4),
    (0, 5),
    (5, 6),
    (6, 7),
    (7, 8),
    (5, 9),
    (9, 10),
    (10, 11),
    (11, 12),
    (9, 13),
    (13, 14),
    (14, 15),
    (15, 16),
    (13, 17),
    (0, 17),
    (17, 18),
    (18, 19),
    (19, 20),
];

const TEXT_MARGIN: u32 = 10;

#[derive(Debug, Clone)]
pub struct FrameAnnotator {
    landmark_color: [u8; 3],
    connection_color: [u8; 3],
    text_color: [u8; 3],
    dot_size: u32,
    text_scale: u32,
}

impl Default for FrameAnnotator {
    fn default() -> Self {
        Self::new(&UiConfig::default())
    }
}

impl FrameAnnotator {
    pub fn new(ui: &UiConfig) -> Self {
        Self {
            landmark_color: parse_hex(&ui.landmark_color_hex),
            connection_color: parse_hex(&ui.connection_color_hex),
            text_color: parse_hex(&ui.text_color_hex),
            dot_size: ui.landmark_dot_size.max(1),
            text_scale: ui.text_scale.max(1),
        }
    }

    /// Returns an annotated copy in the frame's own channel order. The input is untouched.
    pub fn annotate(&self, frame: &Frame, landmarks: Option<&HandLandmarkSet>, prediction: Option<&Prediction>) -> Frame {
        let mut out = frame.clone();
        let pen = |c: [u8; 3]| match frame.order {
            ChannelOrder::Rgb => Rgb(c),
            ChannelOrder::Bgr => Rgb([c[2], c[1], c[0]]),
        };

        if let Some(hand) = landmarks {
            let (w, h) = (out.width() as f32, out.height() as f32);
            let to_px = |i: usize| {
                let p = hand.points()[i];
                (p.x * w, p.y * h)
            };

            for &(a, b) in HAND_CONNECTIONS.iter() {
                draw_line(&mut out.image, to_px(a), to_px(b), pen(self.connection_color));
            }
            for i in 0..hand.points().len() {
                let (x, y) = to_px(i);
                draw_dot(&mut out.image, x, y, self.dot_size, pen(self.landmark_color));
            }
        }

        if let Some(p) = prediction {
            font::draw_text_line(
                &mut out.image,
                TEXT_MARGIN,
                TEXT_MARGIN,
                &p.to_string(),
                pen(self.text_color),
                self.text_scale,
            );
        }

        out
    }
}

fn put(img: &mut RgbFrame, x: f32, y: f32, color: Rgb<u8>) {
    // also rejects NaN
    if !(x >= 0.0 && y >= 0.0) {
        return;
    }
    let (px, py) = (x as u32, y as u32);
    if px < img.width() && py < img.height() {
        img.put_pixel(px, py, color);
    }
}

/// Steps through the part of the segment that lies on the image, one pixel at a time.
fn draw_line(img: &mut RgbFrame, from: (f32, f32), to: (f32, f32), color: Rgb<u8>) {
    let Some((from, to)) = clip_segment(from, to, img.width() as f32, img.height() as f32) else {
        return;
    };
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as u32;
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        put(img, from.0 + dx * t, from.1 + dy * t, color);
    }
}

/// Liang-Barsky clip against `[0, w] x [0, h]`. `None` when nothing is visible or an
/// endpoint is not finite.
fn clip_segment(from: (f32, f32), to: (f32, f32), w: f32, h: f32) -> Option<((f32, f32), (f32, f32))> {
    if ![from.0, from.1, to.0, to.1].iter().all(|v| v.is_finite()) {
        return None;
    }
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let (mut t0, mut t1) = (0.0f32, 1.0f32);
    for (p, q) in [(-dx, from.0), (dx, w - from.0), (-dy, from.1), (dy, h - from.1)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                t0 = t0.max(r);
            } else {
                t1 = t1.min(r);
            }
        }
    }
    if t0 > t1 {
        return None;
    }
    Some((
        (from.0 + dx * t0, from.1 + dy * t0),
        (from.0 + dx * t1, from.1 + dy * t1),
    ))
}

/// Square dot of side `size` centred on (x, y).
fn draw_dot(img: &mut RgbFrame, x: f32, y: f32, size: u32, color: Rgb<u8>) {
    let half = (size / 2) as f32;
    for dy in 0..size {
        for dx in 0..size {
            put(img, x - half + dx as f32, y - half + dy as f32, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::GestureLabel;
    use crate::landmarks::tests::centered_hand;
    use image::ImageBuffer;

    fn gray() -> Frame {
        Frame::rgb(ImageBuffer::from_pixel(64, 48, Rgb([40, 40, 40])))
    }

    #[test]
    fn nothing_to_draw_is_a_passthrough() {
        let f = gray();
        let out = FrameAnnotator::default().annotate(&f, None, None);
        assert_eq!(out.image, f.image);
    }

    #[test]
    fn landmarks_are_drawn_at_scaled_positions() {
        let f = gray();
        let hand = centered_hand();
        let out = FrameAnnotator::default().annotate(&f, Some(&hand), None);
        let wrist = hand.points()[0];
        let (x, y) = ((wrist.x * 64.0) as u32, (wrist.y * 48.0) as u32);
        assert_eq!(out.image.get_pixel(x, y).0, [255, 0, 0]);
        // the input frame is left alone
        assert_eq!(f.image.get_pixel(x, y).0, [40, 40, 40]);
    }

    #[test]
    fn prediction_text_is_overlaid() {
        let f = gray();
        let p = Prediction::new(GestureLabel::Yes, 0.5);
        let out = FrameAnnotator::default().annotate(&f, None, Some(&p));
        assert_ne!(out.image, f.image);
        assert!(out.image.pixels().any(|px| px.0 == [0, 255, 0]));
    }

    #[test]
    fn colors_follow_bgr_frames() {
        let mut f = gray();
        f.order = ChannelOrder::Bgr;
        let hand = centered_hand();
        let out = FrameAnnotator::default().annotate(&f, Some(&hand), None);
        let wrist = hand.points()[0];
        let (x, y) = ((wrist.x * 64.0) as u32, (wrist.y * 48.0) as u32);
        assert_eq!(out.image.get_pixel(x, y).0, [0, 0, 255]);
        assert_eq!(out.order, ChannelOrder::Bgr);
    }

    #[test]
    fn runaway_landmarks_are_clipped_not_walked() {
        let mut hand = *centered_hand().points();
        hand[4].x = f32::INFINITY;
        hand[8].x = 1.0e30;
        hand[12].y = -1.0e30;
        let hand = HandLandmarkSet::new(hand);

        let started = std::time::Instant::now();
        let out = FrameAnnotator::default().annotate(&gray(), Some(&hand), None);
        assert!(started.elapsed() < std::time::Duration::from_secs(1));

        // the visible part of the 7-8 bone still runs towards the right edge
        let white = |x: u32| (0..48).any(|y| out.image.get_pixel(x, y).0 == [255, 255, 255]);
        assert!((55..64).any(white));
    }

    #[test]
    fn clipping_keeps_inside_segments_whole() {
        assert_eq!(
            clip_segment((1.0, 2.0), (5.0, 6.0), 10.0, 10.0),
            Some(((1.0, 2.0), (5.0, 6.0)))
        );
        assert_eq!(clip_segment((-5.0, -5.0), (-1.0, -1.0), 10.0, 10.0), None);
        assert_eq!(clip_segment((0.0, f32::NAN), (1.0, 1.0), 10.0, 10.0), None);
        let (a, b) = clip_segment((5.0, 5.0), (1.0e30, 5.0), 10.0, 10.0).unwrap();
        assert_eq!(a, (5.0, 5.0));
        assert!((b.0 - 10.0).abs() < 1e-3 && b.1 == 5.0);
    }

    #[test]
    fn nan_dots_are_not_drawn_at_the_origin() {
        let mut points = *centered_hand().points();
        points[0].x = f32::NAN;
        let out = FrameAnnotator::default().annotate(&gray(), Some(&HandLandmarkSet::new(points)), None);
        assert_eq!(out.image.get_pixel(0, 14).0, [40, 40, 40]);
    }

    #[test]
    fn offscreen_landmarks_do_not_panic() {
        let values = [-0.5f32; crate::types::FEATURE_LEN];
        let hand = HandLandmarkSet::from_flat(&values).unwrap();
        FrameAnnotator::default().annotate(&gray(), Some(&hand), None);
    }
}
