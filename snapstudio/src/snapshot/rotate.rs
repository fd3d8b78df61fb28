//! Rotation onto an enlarged square canvas.

use tiny_skia::{FilterQuality, Pixmap, PixmapPaint, Transform};

/// Rotations smaller than this are treated as zero.
pub const ROTATION_EPSILON_DEG: f32 = 0.01;

/// Canvas side that fully contains a `side`-pixel square rotated by
/// `degrees`: side × (|cos θ| + |sin θ|), rounded up.
pub fn rotated_canvas_side(side: u32, degrees: f32) -> u32 {
    let theta = degrees.to_radians();
    let scale = theta.cos().abs() + theta.sin().abs();
    (side as f32 * scale).ceil() as u32
}

/// Rotate `src` about its center onto a square canvas large enough that no
/// source corner is clipped at any angle. The source keeps its original
/// scale; uncovered canvas corners stay transparent.
pub(crate) fn rotate_about_center(src: &Pixmap, degrees: f32) -> Option<Pixmap> {
    let side = src.width().min(src.height());
    let out_side = rotated_canvas_side(side, degrees);
    let mut out = Pixmap::new(out_side, out_side)?;

    let offset_x = (out_side as f32 - src.width() as f32) / 2.0;
    let offset_y = (out_side as f32 - src.height() as f32) / 2.0;
    let half = out_side as f32 / 2.0;
    let transform =
        Transform::from_rotate_at(degrees, half, half).pre_translate(offset_x, offset_y);

    let paint = PixmapPaint {
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };
    out.draw_pixmap(0, 0, src.as_ref(), &paint, transform, None);
    Some(out)
}

/// Where a source-space point lands on the rotated canvas.
#[cfg(test)]
pub(crate) fn map_source_point(
    src_side: u32,
    degrees: f32,
    point: (f32, f32),
) -> (f32, f32) {
    let out_side = rotated_canvas_side(src_side, degrees) as f32;
    let offset = (out_side - src_side as f32) / 2.0;
    let half = out_side / 2.0;
    let theta = degrees.to_radians();
    let (sin, cos) = theta.sin_cos();
    let dx = point.0 + offset - half;
    let dy = point.1 + offset - half;
    (dx * cos - dy * sin + half, dx * sin + dy * cos + half)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiny_skia::Color;

    fn opaque_square(side: u32) -> Pixmap {
        let mut pixmap = Pixmap::new(side, side).unwrap();
        pixmap.fill(Color::from_rgba8(200, 120, 40, 255));
        pixmap
    }

    #[test]
    fn test_canvas_side_identity_at_zero() {
        assert_eq!(rotated_canvas_side(100, 0.0), 100);
        assert_eq!(rotated_canvas_side(100, 90.0), 100);
    }

    #[test]
    fn test_canvas_side_grows_at_45() {
        // 100 * sqrt(2) = 141.42, rounded up.
        assert_eq!(rotated_canvas_side(100, 45.0), 142);
    }

    #[test]
    fn test_rotation_output_is_square() {
        let src = opaque_square(100);
        let out = rotate_about_center(&src, 30.0).unwrap();
        assert_eq!(out.width(), out.height());
        assert_eq!(out.width(), rotated_canvas_side(100, 30.0));
    }

    #[test]
    fn test_45_degrees_keeps_all_corners_inside() {
        let src = opaque_square(100);
        let out = rotate_about_center(&src, 45.0).unwrap();
        let side = out.width() as f32;

        // Sample just inside each source corner and verify the mapped pixel
        // is both inside the canvas and opaque.
        for corner in [(3.0, 3.0), (97.0, 3.0), (3.0, 97.0), (97.0, 97.0)] {
            let (x, y) = map_source_point(100, 45.0, corner);
            assert!(x >= 0.0 && x < side && y >= 0.0 && y < side);
            let pixel = out
                .pixel(x.round() as u32, y.round() as u32)
                .expect("mapped corner inside canvas");
            assert!(pixel.alpha() > 0, "corner {corner:?} was clipped");
        }
    }

    #[test]
    fn test_center_survives_any_angle() {
        let src = opaque_square(64);
        for degrees in [10.0, 45.0, 123.0, 300.0] {
            let out = rotate_about_center(&src, degrees).unwrap();
            let mid = out.width() / 2;
            let pixel = out.pixel(mid, mid).unwrap();
            assert!(pixel.alpha() > 0);
        }
    }
}
