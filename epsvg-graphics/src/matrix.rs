//! The six-coefficient transformation matrix.
//!
//! PostScript matrices are written `[a b c d tx ty]` and map user space
//! to device space:
//!
//! ```text
//! x' = a*x + c*y + tx
//! y' = b*x + d*y + ty
//! ```
//!
//! This is the same coefficient order [`kurbo::Affine`] uses, so the
//! conversions are direct.

use kurbo::{Affine, Point};

use crate::error::GraphicsError;
use crate::types::{Scalar, DIFF_TOLERANCE};

// ---------------------------------------------------------------------------
// Matrix
// ---------------------------------------------------------------------------

/// A transformation matrix `[a b c d tx ty]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: Scalar,
    pub b: Scalar,
    pub c: Scalar,
    pub d: Scalar,
    pub tx: Scalar,
    pub ty: Scalar,
}

impl Matrix {
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    /// Build from the six coefficients in PostScript order.
    #[must_use]
    pub const fn new(a: Scalar, b: Scalar, c: Scalar, d: Scalar, tx: Scalar, ty: Scalar) -> Self {
        Self { a, b, c, d, tx, ty }
    }

    /// Build from a coefficient array in PostScript order.
    #[must_use]
    pub const fn from_coeffs(m: [Scalar; 6]) -> Self {
        Self::new(m[0], m[1], m[2], m[3], m[4], m[5])
    }

    /// The coefficients in PostScript order.
    #[must_use]
    pub const fn as_coeffs(&self) -> [Scalar; 6] {
        [self.a, self.b, self.c, self.d, self.tx, self.ty]
    }

    /// A pure translation.
    #[must_use]
    pub const fn translation(tx: Scalar, ty: Scalar) -> Self {
        Self {
            tx,
            ty,
            ..Self::IDENTITY
        }
    }

    /// A pure (possibly anisotropic) scaling.
    #[must_use]
    pub const fn scaling(sx: Scalar, sy: Scalar) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        }
    }

    /// A pure rotation (counterclockwise, degrees).
    #[must_use]
    pub fn rotation(degrees: Scalar) -> Self {
        let rad = degrees.to_radians();
        let (s, c) = rad.sin_cos();
        Self::new(c, s, -s, c, 0.0, 0.0)
    }

    // -- Application --------------------------------------------------------

    /// Apply to a point.
    #[must_use]
    pub fn apply(&self, p: Point) -> Point {
        self.to_affine() * p
    }

    /// Apply the linear part only (distances ignore translation).
    #[must_use]
    pub fn apply_distance(&self, p: Point) -> Point {
        Point::new(
            self.a.mul_add(p.x, self.c * p.y),
            self.b.mul_add(p.x, self.d * p.y),
        )
    }

    // -- Composition --------------------------------------------------------

    /// Compose so that `m` applies first, then `self`.
    ///
    /// This is the CTM update performed by `concat` and friends:
    /// `CTM' = m × CTM`.
    #[must_use]
    pub fn prepend(&self, m: &Self) -> Self {
        Self::from_affine(self.to_affine() * m.to_affine())
    }

    /// Determinant of the linear part.
    #[must_use]
    pub fn determinant(&self) -> Scalar {
        self.a.mul_add(self.d, -(self.b * self.c))
    }

    /// The inverse matrix, or an error when singular.
    pub fn inverse(&self) -> Result<Self, GraphicsError> {
        let det = self.determinant();
        if det.abs() < DIFF_TOLERANCE {
            return Err(GraphicsError::SingularMatrix);
        }
        Ok(Self::from_affine(self.to_affine().inverse()))
    }

    /// Map a device-space point back to user space.
    pub fn inverse_apply(&self, p: Point) -> Result<Point, GraphicsError> {
        Ok(self.inverse()?.apply(p))
    }

    /// Map a device-space distance back to user space.
    pub fn inverse_apply_distance(&self, p: Point) -> Result<Point, GraphicsError> {
        Ok(self.inverse()?.apply_distance(p))
    }

    // -- Decomposition ------------------------------------------------------
    //
    // Backends describe the matrix as mean scaling, per-axis ratios, and a
    // rotation, emitting only the factors that deviate from identity.

    /// Scale factor along the transformed x axis.
    #[must_use]
    pub fn x_scaling(&self) -> Scalar {
        self.a.hypot(self.b)
    }

    /// Scale factor along the transformed y axis.
    #[must_use]
    pub fn y_scaling(&self) -> Scalar {
        self.c.hypot(self.d)
    }

    /// Geometric mean of the axis scale factors.
    #[must_use]
    pub fn mean_scaling(&self) -> Scalar {
        (self.x_scaling() * self.y_scaling()).sqrt()
    }

    /// Rotation of the transformed x axis, in degrees.
    #[must_use]
    pub fn rotation_degrees(&self) -> Scalar {
        self.b.atan2(self.a).to_degrees()
    }

    // -- Conversions --------------------------------------------------------

    /// Convert to a [`kurbo::Affine`].
    #[must_use]
    pub const fn to_affine(&self) -> Affine {
        Affine::new([self.a, self.b, self.c, self.d, self.tx, self.ty])
    }

    /// Convert from a [`kurbo::Affine`].
    #[must_use]
    pub fn from_affine(affine: Affine) -> Self {
        Self::from_coeffs(affine.as_coeffs())
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: Scalar = 1e-9;

    fn assert_close(p: Point, x: Scalar, y: Scalar) {
        assert!((p.x - x).abs() < EPS, "x: {} != {x}", p.x);
        assert!((p.y - y).abs() < EPS, "y: {} != {y}", p.y);
    }

    #[test]
    fn identity_apply() {
        assert_close(Matrix::IDENTITY.apply(Point::new(3.0, 4.0)), 3.0, 4.0);
    }

    #[test]
    fn translation_apply() {
        let m = Matrix::translation(10.0, -5.0);
        assert_close(m.apply(Point::new(1.0, 2.0)), 11.0, -3.0);
        // Distances ignore the translation
        assert_close(m.apply_distance(Point::new(1.0, 2.0)), 1.0, 2.0);
    }

    #[test]
    fn rotation_apply() {
        let m = Matrix::rotation(90.0);
        assert_close(m.apply(Point::new(1.0, 0.0)), 0.0, 1.0);
    }

    #[test]
    fn prepend_applies_argument_first() {
        // translate then scale: scaling sees the shifted point
        let ctm = Matrix::scaling(2.0, 2.0);
        let updated = ctm.prepend(&Matrix::translation(1.0, 0.0));
        assert_close(updated.apply(Point::new(0.0, 0.0)), 2.0, 0.0);
    }

    #[test]
    fn inverse_roundtrip() {
        let m = Matrix::rotation(30.0).prepend(&Matrix::scaling(2.0, 3.0));
        let p = Point::new(7.0, -2.0);
        let back = m.inverse().unwrap().apply(m.apply(p));
        assert_close(back, p.x, p.y);
    }

    #[test]
    fn inverse_singular() {
        let m = Matrix::scaling(0.0, 1.0);
        assert_eq!(m.inverse(), Err(GraphicsError::SingularMatrix));
    }

    #[test]
    fn decomposition_scale_rotate() {
        let m = Matrix::rotation(45.0).prepend(&Matrix::scaling(2.0, 2.0));
        assert!((m.mean_scaling() - 2.0).abs() < EPS);
        assert!((m.x_scaling() - 2.0).abs() < EPS);
        assert!((m.y_scaling() - 2.0).abs() < EPS);
        assert!((m.rotation_degrees() - 45.0).abs() < EPS);
    }

    #[test]
    fn decomposition_anisotropic() {
        let m = Matrix::scaling(4.0, 1.0);
        assert!((m.mean_scaling() - 2.0).abs() < EPS);
        assert!((m.x_scaling() - 4.0).abs() < EPS);
        assert!((m.y_scaling() - 1.0).abs() < EPS);
        assert!(m.rotation_degrees().abs() < EPS);
    }

    #[test]
    fn coeff_roundtrip() {
        let m = Matrix::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0);
        assert_eq!(Matrix::from_coeffs(m.as_coeffs()), m);
        assert_eq!(Matrix::from_affine(m.to_affine()), m);
    }
}
