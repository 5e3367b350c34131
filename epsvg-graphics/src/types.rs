//! Shared scalar types and stroke attribute enums.

// ---------------------------------------------------------------------------
// Scalar
// ---------------------------------------------------------------------------

/// Convenience alias for coordinate arithmetic.
pub type Scalar = f64;

/// Tolerance below which two emitted device values are considered equal.
///
/// Backends cache the last emitted line width, dash pattern, and transform
/// factors and suppress re-emission when the new value is within this
/// tolerance of the cached one.
pub const DIFF_TOLERANCE: Scalar = 1e-10;

/// Device units per PostScript point.
///
/// Device space is measured in micrometers with y pointing up, so the
/// default transformation matrix is `25400 / 72` micrometers per point.
pub const DEVICE_UNITS_PER_POINT: Scalar = 25_400.0 / 72.0;

// ---------------------------------------------------------------------------
// LineCap / LineJoin
// ---------------------------------------------------------------------------

/// Stroke line-cap styles (PostScript `setlinecap` codes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Butt = 0,
    Round = 1,
    Square = 2,
}

impl LineCap {
    /// Map a `setlinecap` operand to a cap style. Out-of-range codes are
    /// rejected.
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Butt),
            1 => Some(Self::Round),
            2 => Some(Self::Square),
            _ => None,
        }
    }
}

/// Stroke line-join styles (PostScript `setlinejoin` codes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    #[default]
    Miter = 0,
    Round = 1,
    Bevel = 2,
}

impl LineJoin {
    /// Map a `setlinejoin` operand to a join style. Out-of-range codes are
    /// rejected.
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Miter),
            1 => Some(Self::Round),
            2 => Some(Self::Bevel),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// DashPattern
// ---------------------------------------------------------------------------

/// A dash pattern: alternating on/off lengths with a phase offset.
///
/// An empty `dashes` vector means a solid line. Lengths are in user units;
/// backends scale them by the CTM's mean scaling at stroke time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DashPattern {
    /// Alternating on, off, on, off, ... lengths.
    pub dashes: Vec<Scalar>,
    /// Starting offset into the pattern.
    pub offset: Scalar,
}

impl DashPattern {
    /// A solid (undashed) line.
    #[must_use]
    pub const fn solid() -> Self {
        Self {
            dashes: Vec::new(),
            offset: 0.0,
        }
    }

    /// Whether this pattern draws a solid line.
    #[must_use]
    pub fn is_solid(&self) -> bool {
        self.dashes.is_empty()
    }

    /// Elementwise comparison within [`DIFF_TOLERANCE`].
    #[must_use]
    pub fn approx_eq(&self, other: &Self) -> bool {
        self.dashes.len() == other.dashes.len()
            && (self.offset - other.offset).abs() <= DIFF_TOLERANCE
            && self
                .dashes
                .iter()
                .zip(&other.dashes)
                .all(|(a, b)| (a - b).abs() <= DIFF_TOLERANCE)
    }

    /// Return a copy with every length multiplied by `factor`.
    #[must_use]
    pub fn scaled(&self, factor: Scalar) -> Self {
        Self {
            dashes: self.dashes.iter().map(|d| d * factor).collect(),
            offset: self.offset * factor,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cap_codes() {
        assert_eq!(LineCap::from_code(0), Some(LineCap::Butt));
        assert_eq!(LineCap::from_code(2), Some(LineCap::Square));
        assert_eq!(LineCap::from_code(3), None);
        assert_eq!(LineCap::from_code(-1), None);
    }

    #[test]
    fn join_codes() {
        assert_eq!(LineJoin::from_code(1), Some(LineJoin::Round));
        assert_eq!(LineJoin::from_code(5), None);
    }

    #[test]
    fn dash_approx_eq() {
        let a = DashPattern {
            dashes: vec![3.0, 1.0],
            offset: 0.0,
        };
        let b = DashPattern {
            dashes: vec![3.0 + 1e-12, 1.0],
            offset: 0.0,
        };
        let c = DashPattern {
            dashes: vec![3.0, 1.5],
            offset: 0.0,
        };
        assert!(a.approx_eq(&b));
        assert!(!a.approx_eq(&c));
        assert!(!a.approx_eq(&DashPattern::solid()));
    }

    #[test]
    fn dash_scaled() {
        let d = DashPattern {
            dashes: vec![2.0, 1.0],
            offset: 0.5,
        };
        let s = d.scaled(2.0);
        assert_eq!(s.dashes, vec![4.0, 2.0]);
        assert!((s.offset - 1.0).abs() < 1e-12);
    }
}
