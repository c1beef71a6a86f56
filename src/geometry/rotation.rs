//! Rotation handling for free text annotations.
//!
//! A rotated free text box is stored with a `/Rect` that is the axis-aligned
//! bounding box of the rotated box. For angles off the 90 degree grid the
//! unrotated size has to be solved back out of that bounding box.

/// Below this `|cos^2 - sin^2|` the size system is treated as singular (45 degrees).
const DEGENERATE_DETERMINANT: f64 = 0.01;

/// Minimum difference before the appearance `/BBox` is preferred over `/Rect`.
const BBOX_SIGNIFICANT_DIFFERENCE: f64 = 1.0;

/// Rotation angle of an appearance `/Matrix [a b c d e f]` in degrees,
/// rounded to two decimals.
pub fn matrix_angle_degrees(matrix: &[f64]) -> Option<f64> {
    match *matrix {
        [a, b, ..] if a != 0.0 || b != 0.0 => Some((b.atan2(a).to_degrees() * 100.0).round() / 100.0),
        _ => None,
    }
}

/// Derive an annotation rotation from the appearance matrix angle.
///
/// The matrix also carries any page rotation, so only the deviation from the
/// nearest multiple of 90 counts. The sign is inverted (view space is Y-down)
/// and deviations of one degree or less are treated as no rotation.
pub fn rotation_from_matrix_angle(matrix_angle: f64) -> f64 {
    let base = (matrix_angle / 90.0).round() * 90.0;
    let rotation = (-(matrix_angle - base)).round();
    if rotation.abs() <= 1.0 {
        0.0
    } else {
        rotation
    }
}

/// Axis-aligned bounding size of a `width x height` box rotated by `degrees`.
pub fn rotated_bounds(width: f64, height: f64, degrees: f64) -> (f64, f64) {
    let (s, c) = degrees.to_radians().sin_cos();
    let (s, c) = (s.abs(), c.abs());
    (width * c + height * s, height * c + width * s)
}

/// Recover the unrotated size of a box from its rotated bounding size.
///
/// `rect_size` is `(W, H)` from `/Rect`, `bbox_size` the appearance stream's
/// unrotated `/BBox` size if known. Multiples of 90 degrees return `(W, H)`
/// unchanged. Otherwise solves `W = w|cos| + h|sin|`, `H = h|cos| + w|sin|`;
/// near 45 degrees the system is singular and the `/BBox` size is used when it
/// differs meaningfully from `(W, H)`.
pub fn recover_unrotated_size(
    rect_size: (f64, f64),
    degrees: f64,
    bbox_size: Option<(f64, f64)>,
) -> (f64, f64) {
    let (w_rect, h_rect) = rect_size;
    if degrees == 0.0 || degrees % 90.0 == 0.0 {
        return rect_size;
    }

    let (s, c) = degrees.to_radians().sin_cos();
    let (s, c) = (s.abs(), c.abs());
    let det = c * c - s * s;

    if det.abs() > DEGENERATE_DETERMINANT {
        let w = ((w_rect * c - h_rect * s) / det).round();
        let h = ((h_rect * c - w_rect * s) / det).round();
        if w > 0.0 && h > 0.0 {
            return (w, h);
        }
        log::debug!("Rotated size solve gave {}x{}, keeping rect size", w, h);
        return rect_size;
    }

    match bbox_size {
        Some((bw, bh))
            if bw > 0.0
                && bh > 0.0
                && ((bw - w_rect).abs() > BBOX_SIGNIFICANT_DIFFERENCE
                    || (bh - h_rect).abs() > BBOX_SIGNIFICANT_DIFFERENCE) =>
        {
            (bw, bh)
        },
        _ => rect_size,
    }
}
