//! Monotone cubic interpolation (Fritsch–Carlson).
//!
//! A plain cubic spline overshoots around flat stretches, which reads as data
//! that was never there. The monotone variant limits tangents so each segment
//! stays within the range of its endpoints.

use chartkit_core::Point;

/// Horizontal distance, in pixels, between generated samples.
pub const INTERPOLATION_STEP: f32 = 2.0;

fn secants(points: &[Point]) -> Vec<f32> {
    points
        .windows(2)
        .map(|w| {
            let dx = w[1].x - w[0].x;
            if dx == 0.0 {
                0.0
            } else {
                (w[1].y - w[0].y) / dx
            }
        })
        .collect()
}

/// Slope limited tangents for `points`, one per point.
///
/// Points are expected in the units the curve is drawn in; the caller scales
/// chart-relative values to pixels first.
pub fn monotone_tangents(points: &[Point]) -> Vec<f32> {
    let n = points.len();
    if n < 2 {
        return vec![0.0; n];
    }
    let m = secants(points);

    let mut t = Vec::with_capacity(n);
    t.push(m[0]);
    for i in 1..n - 1 {
        let (left, right) = (m[i - 1], m[i]);
        t.push(if left * right <= 0.0 {
            0.0
        } else {
            (left + right) * 0.5
        });
    }
    t.push(m[n - 2]);

    for (i, &secant) in m.iter().enumerate() {
        if secant == 0.0 {
            t[i] = 0.0;
            t[i + 1] = 0.0;
            continue;
        }
        let mut alpha = t[i] / secant;
        let mut beta = t[i + 1] / secant;
        if alpha < 0.0 {
            alpha = 0.0;
            t[i] = 0.0;
        }
        if beta < 0.0 {
            beta = 0.0;
            t[i + 1] = 0.0;
        }
        let s = alpha * alpha + beta * beta;
        if s > 9.0 {
            let tau = 3.0 / s.sqrt();
            t[i] = tau * alpha * secant;
            t[i + 1] = tau * beta * secant;
        }
    }
    t
}

fn hermite(p0: Point, p1: Point, t0: f32, t1: f32, t: f32) -> Point {
    let dx = p1.x - p0.x;
    let t2 = t * t;
    let t3 = t2 * t;
    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;
    Point::new(
        p0.x + dx * t,
        h00 * p0.y + h10 * dx * t0 + h01 * p1.y + h11 * dx * t1,
    )
}

/// Densify `points` (x in pixels, y in [0, 1]) into a smooth curve that never
/// overshoots its samples.
///
/// Y is scaled by `height` for the tangent computation and scaled back in the
/// output. Segments may run in either X direction. Fewer than two points or a
/// non-positive height return the input unchanged.
pub fn interpolate_monotone(points: &[Point], height: f32) -> Vec<Point> {
    if points.len() < 2 || !(height > 0.0) {
        return points.to_vec();
    }

    let scaled: Vec<Point> = points
        .iter()
        .map(|p| Point::new(p.x, p.y * height))
        .collect();
    let tangents = monotone_tangents(&scaled);

    let mut out = Vec::with_capacity(points.len());
    out.push(scaled[0]);
    for (i, w) in scaled.windows(2).enumerate() {
        let (p0, p1) = (w[0], w[1]);
        let width = (p1.x - p0.x).abs();
        let steps = (width / INTERPOLATION_STEP).ceil() as usize;
        if steps > 1 && (p1.y - p0.y).abs() > f32::EPSILON {
            for k in 1..steps {
                let t = k as f32 * INTERPOLATION_STEP / width;
                out.push(hermite(p0, p1, tangents[i], tangents[i + 1], t));
            }
        }
        out.push(p1);
    }

    for p in &mut out {
        p.y /= height;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(raw: &[(f32, f32)]) -> Vec<Point> {
        raw.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn short_input_is_returned_unchanged() {
        let one = pts(&[(0.0, 0.5)]);
        assert_eq!(interpolate_monotone(&one, 100.0), one);
        assert!(interpolate_monotone(&[], 100.0).is_empty());

        let two = pts(&[(0.0, 0.0), (10.0, 1.0)]);
        assert_eq!(interpolate_monotone(&two, 0.0), two);
    }

    #[test]
    fn two_points_interpolate_linearly() {
        let out = interpolate_monotone(&pts(&[(0.0, 0.2), (20.0, 0.8)]), 100.0);
        assert_eq!(out.len(), 11);
        for p in &out {
            let expected = 0.2 + 0.6 * p.x / 20.0;
            assert!((p.y - expected).abs() < 1e-5, "{p:?}");
        }
    }

    #[test]
    fn endpoints_are_preserved() {
        let input = pts(&[(0.0, 0.1), (9.0, 0.7), (30.0, 0.4)]);
        let out = interpolate_monotone(&input, 50.0);
        assert_eq!(out.first().map(|p| p.x), Some(0.0));
        assert!((out[0].y - 0.1).abs() < 1e-6);
        let last = out.last().copied().unwrap();
        assert_eq!(last.x, 30.0);
        assert!((last.y - 0.4).abs() < 1e-6);
    }

    #[test]
    fn flat_and_single_step_segments_emit_endpoints() {
        let input = pts(&[(0.0, 0.5), (40.0, 0.5), (41.0, 0.9)]);
        let out = interpolate_monotone(&input, 100.0);
        assert_eq!(out.len(), input.len());
        for (a, b) in out.iter().zip(&input) {
            assert_eq!(a.x, b.x);
            assert!((a.y - b.y).abs() < 1e-6);
        }
    }

    #[test]
    fn local_extremum_has_flat_tangent() {
        let t = monotone_tangents(&pts(&[(0.0, 0.0), (1.0, 10.0), (2.0, 0.0)]));
        assert_eq!(t[1], 0.0);
        assert_eq!(t[0], 10.0);
        assert_eq!(t[2], -10.0);
    }

    #[test]
    fn steep_tangents_are_rescaled() {
        // Secants 1 then 100: the averaged tangent at the middle point is far
        // above three times the first secant and must be limited.
        let t = monotone_tangents(&pts(&[(0.0, 0.0), (1.0, 1.0), (2.0, 101.0)]));
        let (alpha, beta) = (t[0] / 1.0, t[1] / 1.0);
        assert!(alpha * alpha + beta * beta <= 9.0 + 1e-3);
    }

    #[test]
    fn walks_right_to_left() {
        let out = interpolate_monotone(&pts(&[(20.0, 0.0), (0.0, 1.0)]), 10.0);
        assert_eq!(out.len(), 11);
        assert!(out.windows(2).all(|w| w[1].x < w[0].x && w[1].y >= w[0].y));
    }
}
