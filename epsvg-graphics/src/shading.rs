//! Radial (type 3) shading geometry and color ramps.
//!
//! A radial shading blends between two circles. The color along the
//! blend is given by a function over the parameter `s` in [0, 1];
//! backends that cannot evaluate arbitrary functions approximate the
//! ramp with linear segments between fitted breakpoints.

use kurbo::Point;

use crate::types::Scalar;

// ---------------------------------------------------------------------------
// Color ramp functions
// ---------------------------------------------------------------------------

/// A color function over the domain [0, 1] producing RGB.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorRamp {
    /// Exponential interpolation (function type 2):
    /// `c(t) = c0 + t^n * (c1 - c0)`.
    Exponential {
        c0: [Scalar; 3],
        c1: [Scalar; 3],
        n: Scalar,
    },
    /// Stitching of subfunctions (function type 3). `bounds` holds the
    /// interior split points; segment `i` re-encodes its subdomain into
    /// `encode[i]` and evaluates `functions[i]`.
    Stitched {
        bounds: Vec<Scalar>,
        encode: Vec<(Scalar, Scalar)>,
        functions: Vec<ColorRamp>,
    },
}

impl ColorRamp {
    /// A two-color linear ramp.
    #[must_use]
    pub const fn linear(c0: [Scalar; 3], c1: [Scalar; 3]) -> Self {
        Self::Exponential { c0, c1, n: 1.0 }
    }

    /// Evaluate the ramp at `t`, clamped to [0, 1].
    #[must_use]
    pub fn color_at(&self, t: Scalar) -> [Scalar; 3] {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Exponential { c0, c1, n } => {
                let f = t.powf(*n);
                [
                    f.mul_add(c1[0] - c0[0], c0[0]),
                    f.mul_add(c1[1] - c0[1], c0[1]),
                    f.mul_add(c1[2] - c0[2], c0[2]),
                ]
            }
            Self::Stitched {
                bounds,
                encode,
                functions,
            } => {
                let mut idx = bounds.len();
                for (i, b) in bounds.iter().enumerate() {
                    if t < *b {
                        idx = i;
                        break;
                    }
                }
                let lo = if idx == 0 { 0.0 } else { bounds[idx - 1] };
                let hi = if idx == bounds.len() { 1.0 } else { bounds[idx] };
                let (e0, e1) = encode.get(idx).copied().unwrap_or((0.0, 1.0));
                let span = hi - lo;
                let local = if span <= 0.0 { 0.0 } else { (t - lo) / span };
                match functions.get(idx) {
                    Some(f) => f.color_at(local.mul_add(e1 - e0, e0)),
                    None => [0.0; 3],
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Radial shading
// ---------------------------------------------------------------------------

/// A radial shading between a start and an end circle.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialShading {
    /// Start circle center.
    pub start: Point,
    /// Start circle radius.
    pub r_start: Scalar,
    /// End circle center.
    pub end: Point,
    /// End circle radius.
    pub r_end: Scalar,
    /// Extend the shading before the start circle.
    pub extend_start: bool,
    /// Extend the shading beyond the end circle.
    pub extend_end: bool,
    /// Color function over [0, 1].
    pub ramp: ColorRamp,
}

impl RadialShading {
    /// Color at parameter `s`. Outside [0, 1] the boundary colors hold,
    /// matching the behavior of an extended shading.
    #[must_use]
    pub fn color_at(&self, s: Scalar) -> [Scalar; 3] {
        self.ramp.color_at(s)
    }

    /// Circle center at parameter `s` (extrapolates outside [0, 1]).
    #[must_use]
    pub fn center_at(&self, s: Scalar) -> Point {
        Point::new(
            s.mul_add(self.end.x - self.start.x, self.start.x),
            s.mul_add(self.end.y - self.start.y, self.start.y),
        )
    }

    /// Circle radius at parameter `s` (extrapolates outside [0, 1]).
    #[must_use]
    pub fn radius_at(&self, s: Scalar) -> Scalar {
        s.mul_add(self.r_end - self.r_start, self.r_start)
    }

    /// The parameter at which the radius has grown `distance` past the
    /// start radius. Degenerate shadings (equal radii) report `1.0`.
    #[must_use]
    pub fn s_for_distance(&self, distance: Scalar) -> Scalar {
        let dr = self.r_end - self.r_start;
        if dr.abs() < Scalar::EPSILON {
            1.0
        } else {
            (distance / dr).abs()
        }
    }

    /// Fit breakpoints so that linear RGB interpolation between adjacent
    /// breakpoints stays within `tolerance` per channel.
    ///
    /// The result always contains 0 and 1 and is strictly increasing. A
    /// ramp that is already linear yields exactly `[0, 1]`.
    #[must_use]
    pub fn fit_breakpoints(&self, tolerance: Scalar) -> Vec<Scalar> {
        let mut points = vec![0.0];
        self.refine(0.0, 1.0, tolerance, 0, &mut points);
        points.push(1.0);
        points
    }

    fn refine(
        &self,
        lo: Scalar,
        hi: Scalar,
        tolerance: Scalar,
        depth: u32,
        out: &mut Vec<Scalar>,
    ) {
        // Bisection bottoms out at 2^-10 of the domain
        if depth >= 10 {
            return;
        }
        let mid = 0.5 * (lo + hi);
        let actual = self.color_at(mid);
        let a = self.color_at(lo);
        let b = self.color_at(hi);
        let max_err = (0..3)
            .map(|i| (0.5 * (a[i] + b[i]) - actual[i]).abs())
            .fold(0.0, Scalar::max);
        if max_err > tolerance {
            self.refine(lo, mid, tolerance, depth + 1, out);
            out.push(mid);
            self.refine(mid, hi, tolerance, depth + 1, out);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn shading(ramp: ColorRamp) -> RadialShading {
        RadialShading {
            start: Point::new(0.0, 0.0),
            r_start: 1.0,
            end: Point::new(10.0, 0.0),
            r_end: 5.0,
            extend_start: false,
            extend_end: false,
            ramp,
        }
    }

    #[test]
    fn exponential_endpoints() {
        let ramp = ColorRamp::Exponential {
            c0: [1.0, 0.0, 0.0],
            c1: [0.0, 0.0, 1.0],
            n: 2.0,
        };
        assert_eq!(ramp.color_at(0.0), [1.0, 0.0, 0.0]);
        assert_eq!(ramp.color_at(1.0), [0.0, 0.0, 1.0]);
        // n = 2 bends the curve: midpoint is a quarter of the way
        let mid = ramp.color_at(0.5);
        assert!((mid[0] - 0.75).abs() < 1e-12);
        assert!((mid[2] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn stitched_evaluates_segments() {
        // Black→red on [0, 0.5), red→white on [0.5, 1]
        let ramp = ColorRamp::Stitched {
            bounds: vec![0.5],
            encode: vec![(0.0, 1.0), (0.0, 1.0)],
            functions: vec![
                ColorRamp::linear([0.0; 3], [1.0, 0.0, 0.0]),
                ColorRamp::linear([1.0, 0.0, 0.0], [1.0; 3]),
            ],
        };
        assert_eq!(ramp.color_at(0.0), [0.0, 0.0, 0.0]);
        let quarter = ramp.color_at(0.25);
        assert!((quarter[0] - 0.5).abs() < 1e-12);
        assert_eq!(ramp.color_at(0.5), [1.0, 0.0, 0.0]);
        assert_eq!(ramp.color_at(1.0), [1.0, 1.0, 1.0]);
    }

    #[test]
    fn stitched_honors_encode_reversal() {
        let ramp = ColorRamp::Stitched {
            bounds: vec![],
            encode: vec![(1.0, 0.0)],
            functions: vec![ColorRamp::linear([0.0; 3], [1.0; 3])],
        };
        assert_eq!(ramp.color_at(0.0), [1.0, 1.0, 1.0]);
        assert_eq!(ramp.color_at(1.0), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn geometry_interpolation() {
        let sh = shading(ColorRamp::linear([0.0; 3], [1.0; 3]));
        assert_eq!(sh.center_at(0.5), Point::new(5.0, 0.0));
        assert!((sh.radius_at(0.5) - 3.0).abs() < 1e-12);
        // Extrapolation past the end circle
        assert!((sh.radius_at(2.0) - 9.0).abs() < 1e-12);
    }

    #[test]
    fn s_for_distance_linear_in_radius() {
        let sh = shading(ColorRamp::linear([0.0; 3], [1.0; 3]));
        // Radius grows by 4 over the full span
        assert!((sh.s_for_distance(4.0) - 1.0).abs() < 1e-12);
        assert!((sh.s_for_distance(8.0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn s_for_distance_degenerate() {
        let mut sh = shading(ColorRamp::linear([0.0; 3], [1.0; 3]));
        sh.r_end = sh.r_start;
        assert!((sh.s_for_distance(100.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn linear_ramp_fits_two_breakpoints() {
        let sh = shading(ColorRamp::linear([0.0; 3], [1.0; 3]));
        assert_eq!(sh.fit_breakpoints(0.01), vec![0.0, 1.0]);
    }

    #[test]
    fn curved_ramp_fits_more_breakpoints() {
        let sh = shading(ColorRamp::Exponential {
            c0: [0.0; 3],
            c1: [1.0; 3],
            n: 3.0,
        });
        let points = sh.fit_breakpoints(0.01);
        assert!(points.len() > 2, "expected refinement, got {points:?}");
        assert_eq!(points[0], 0.0);
        assert_eq!(*points.last().unwrap(), 1.0);
        assert!(points.windows(2).all(|w| w[0] < w[1]), "unsorted: {points:?}");
    }

    #[test]
    fn tighter_tolerance_never_fits_fewer() {
        let sh = shading(ColorRamp::Exponential {
            c0: [1.0, 1.0, 0.0],
            c1: [0.0, 0.0, 1.0],
            n: 2.0,
        });
        let coarse = sh.fit_breakpoints(0.05);
        let fine = sh.fit_breakpoints(0.005);
        assert!(fine.len() >= coarse.len());
    }
}
