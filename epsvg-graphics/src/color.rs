//! Color spaces and color values.
//!
//! The interpreter tracks a current color *space* and a current color
//! *value*. Device spaces (gray, RGB, CMYK) resolve components directly;
//! an indexed space resolves an integer index through a byte lookup table
//! into its base space.

use crate::error::GraphicsError;
use crate::types::Scalar;

/// Largest permitted `hival` for an indexed color space.
pub const MAX_INDEX: i32 = 4095;

// ---------------------------------------------------------------------------
// Color values
// ---------------------------------------------------------------------------

/// A resolved color in one of the device spaces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Color {
    Gray(Scalar),
    Rgb(Scalar, Scalar, Scalar),
    Cmyk(Scalar, Scalar, Scalar, Scalar),
}

impl Color {
    pub const BLACK: Self = Self::Gray(0.0);
    pub const WHITE: Self = Self::Gray(1.0);

    /// A gray level, clamped to [0, 1].
    #[must_use]
    pub fn gray(g: Scalar) -> Self {
        Self::Gray(clamp01(g))
    }

    /// An RGB color, components clamped to [0, 1].
    #[must_use]
    pub fn rgb(r: Scalar, g: Scalar, b: Scalar) -> Self {
        Self::Rgb(clamp01(r), clamp01(g), clamp01(b))
    }

    /// A CMYK color, components clamped to [0, 1].
    #[must_use]
    pub fn cmyk(c: Scalar, m: Scalar, y: Scalar, k: Scalar) -> Self {
        Self::Cmyk(clamp01(c), clamp01(m), clamp01(y), clamp01(k))
    }

    /// Convert from hue/saturation/brightness, all in [0, 1].
    #[must_use]
    pub fn hsb(h: Scalar, s: Scalar, b: Scalar) -> Self {
        let h = clamp01(h);
        let s = clamp01(s);
        let v = clamp01(b);
        if s == 0.0 {
            return Self::Rgb(v, v, v);
        }
        let h6 = (h * 6.0) % 6.0;
        #[allow(clippy::cast_possible_truncation)]
        let sector = h6.floor() as i32;
        let f = h6 - h6.floor();
        let p = v * (1.0 - s);
        let q = v * (1.0 - s * f);
        let t = v * (1.0 - s * (1.0 - f));
        match sector {
            0 => Self::Rgb(v, t, p),
            1 => Self::Rgb(q, v, p),
            2 => Self::Rgb(p, v, t),
            3 => Self::Rgb(p, q, v),
            4 => Self::Rgb(t, p, v),
            _ => Self::Rgb(v, p, q),
        }
    }

    /// RGB components of this color.
    #[must_use]
    pub fn to_rgb(&self) -> [Scalar; 3] {
        match *self {
            Self::Gray(g) => [g, g, g],
            Self::Rgb(r, g, b) => [r, g, b],
            Self::Cmyk(c, m, y, k) => [
                1.0 - (c + k).min(1.0),
                1.0 - (m + k).min(1.0),
                1.0 - (y + k).min(1.0),
            ],
        }
    }

    /// Luminosity gray level of this color.
    #[must_use]
    pub fn to_gray(&self) -> Scalar {
        match *self {
            Self::Gray(g) => g,
            _ => {
                let [r, g, b] = self.to_rgb();
                0.3 * r + 0.59 * g + 0.11 * b
            }
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

fn clamp01(v: Scalar) -> Scalar {
    v.clamp(0.0, 1.0)
}

// ---------------------------------------------------------------------------
// Color spaces
// ---------------------------------------------------------------------------

/// A color space the interpreter can select with `setcolorspace`.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorSpace {
    DeviceGray,
    DeviceRgb,
    DeviceCmyk,
    Indexed(IndexedSpace),
}

impl ColorSpace {
    /// Number of `setcolor` operands this space consumes.
    #[must_use]
    pub const fn num_components(&self) -> usize {
        match self {
            Self::DeviceGray | Self::Indexed(_) => 1,
            Self::DeviceRgb => 3,
            Self::DeviceCmyk => 4,
        }
    }

    /// The PostScript family name of this space.
    #[must_use]
    pub const fn family_name(&self) -> &'static str {
        match self {
            Self::DeviceGray => "DeviceGray",
            Self::DeviceRgb => "DeviceRGB",
            Self::DeviceCmyk => "DeviceCMYK",
            Self::Indexed(_) => "Indexed",
        }
    }

    /// Resolve `setcolor` operands into a color value.
    ///
    /// For an indexed space the single component is the table index; it
    /// must already be integral (the interpreter enforces the type).
    pub fn resolve(&self, components: &[Scalar]) -> Result<Color, GraphicsError> {
        if components.len() != self.num_components() {
            return Err(GraphicsError::Malformed(format!(
                "{} expects {} component(s), got {}",
                self.family_name(),
                self.num_components(),
                components.len()
            )));
        }
        match self {
            Self::DeviceGray => Ok(Color::gray(components[0])),
            Self::DeviceRgb => Ok(Color::rgb(components[0], components[1], components[2])),
            Self::DeviceCmyk => Ok(Color::cmyk(
                components[0],
                components[1],
                components[2],
                components[3],
            )),
            #[allow(clippy::cast_possible_truncation)]
            Self::Indexed(indexed) => indexed.resolve(components[0] as i32),
        }
    }
}

impl Default for ColorSpace {
    fn default() -> Self {
        Self::DeviceGray
    }
}

// ---------------------------------------------------------------------------
// Indexed space
// ---------------------------------------------------------------------------

/// An indexed color space: integer indices resolved through a byte
/// lookup table into a base device space.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedSpace {
    base: Box<ColorSpace>,
    hival: i32,
    lookup: Vec<u8>,
}

impl IndexedSpace {
    /// Build an indexed space.
    ///
    /// `hival` is the largest valid index (at most [`MAX_INDEX`]); the
    /// lookup table must supply `(hival + 1) * n` bytes where `n` is the
    /// base space's component count. The base may not itself be indexed.
    pub fn new(base: ColorSpace, hival: i32, lookup: Vec<u8>) -> Result<Self, GraphicsError> {
        if matches!(base, ColorSpace::Indexed(_)) {
            return Err(GraphicsError::Malformed(
                "indexed base space may not be indexed".into(),
            ));
        }
        if !(0..=MAX_INDEX).contains(&hival) {
            return Err(GraphicsError::RangeCheck(format!(
                "hival {hival} outside 0..={MAX_INDEX}"
            )));
        }
        let needed = (hival as usize + 1) * base.num_components();
        if lookup.len() < needed {
            return Err(GraphicsError::RangeCheck(format!(
                "lookup table has {} byte(s), needs {needed}",
                lookup.len()
            )));
        }
        Ok(Self {
            base: Box::new(base),
            hival,
            lookup,
        })
    }

    /// The largest valid index.
    #[must_use]
    pub const fn hival(&self) -> i32 {
        self.hival
    }

    /// The base space.
    #[must_use]
    pub fn base(&self) -> &ColorSpace {
        &self.base
    }

    /// Resolve an index into a base-space color.
    pub fn resolve(&self, index: i32) -> Result<Color, GraphicsError> {
        if !(0..=self.hival).contains(&index) {
            return Err(GraphicsError::RangeCheck(format!(
                "index {index} outside 0..={}",
                self.hival
            )));
        }
        let n = self.base.num_components();
        let start = index as usize * n;
        let components: Vec<Scalar> = self.lookup[start..start + n]
            .iter()
            .map(|&b| Scalar::from(b) / 255.0)
            .collect();
        self.base.resolve(&components)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn components_clamped() {
        assert_eq!(Color::gray(1.5), Color::Gray(1.0));
        assert_eq!(Color::rgb(-0.2, 0.5, 2.0), Color::Rgb(0.0, 0.5, 1.0));
    }

    #[test]
    fn cmyk_to_rgb() {
        let [r, g, b] = Color::cmyk(1.0, 0.0, 0.0, 0.0).to_rgb();
        assert!((r - 0.0).abs() < 1e-12);
        assert!((g - 1.0).abs() < 1e-12);
        assert!((b - 1.0).abs() < 1e-12);
        // Full black key drives every channel to zero
        assert_eq!(Color::cmyk(0.0, 0.5, 0.0, 1.0).to_rgb(), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn gray_luminosity() {
        assert!((Color::rgb(1.0, 1.0, 1.0).to_gray() - 1.0).abs() < 1e-12);
        let g = Color::rgb(1.0, 0.0, 0.0).to_gray();
        assert!((g - 0.3).abs() < 1e-12);
    }

    #[test]
    fn hsb_primaries() {
        assert_eq!(Color::hsb(0.0, 1.0, 1.0).to_rgb(), [1.0, 0.0, 0.0]);
        let [r, g, b] = Color::hsb(1.0 / 3.0, 1.0, 1.0).to_rgb();
        assert!(r.abs() < 1e-9 && (g - 1.0).abs() < 1e-9 && b.abs() < 1e-9);
        // Zero saturation is an achromatic gray
        assert_eq!(Color::hsb(0.7, 0.0, 0.5).to_rgb(), [0.5, 0.5, 0.5]);
    }

    #[test]
    fn space_component_counts() {
        assert_eq!(ColorSpace::DeviceGray.num_components(), 1);
        assert_eq!(ColorSpace::DeviceRgb.num_components(), 3);
        assert_eq!(ColorSpace::DeviceCmyk.num_components(), 4);
    }

    #[test]
    fn resolve_wrong_arity() {
        assert!(ColorSpace::DeviceRgb.resolve(&[1.0]).is_err());
    }

    #[test]
    fn indexed_resolves_through_table() {
        // Two RGB entries: red, then mid-gray
        let lookup = vec![255, 0, 0, 128, 128, 128];
        let space = IndexedSpace::new(ColorSpace::DeviceRgb, 1, lookup).unwrap();
        assert_eq!(space.resolve(0).unwrap().to_rgb(), [1.0, 0.0, 0.0]);
        let [r, ..] = space.resolve(1).unwrap().to_rgb();
        assert!((r - 128.0 / 255.0).abs() < 1e-12);
    }

    #[test]
    fn indexed_rejects_out_of_range_index() {
        let space = IndexedSpace::new(ColorSpace::DeviceGray, 1, vec![0, 255]).unwrap();
        assert!(matches!(
            space.resolve(2),
            Err(GraphicsError::RangeCheck(_))
        ));
        assert!(matches!(
            space.resolve(-1),
            Err(GraphicsError::RangeCheck(_))
        ));
    }

    #[test]
    fn indexed_rejects_big_hival() {
        let err = IndexedSpace::new(ColorSpace::DeviceGray, MAX_INDEX + 1, vec![0; 5000]);
        assert!(matches!(err, Err(GraphicsError::RangeCheck(_))));
    }

    #[test]
    fn indexed_rejects_short_table() {
        let err = IndexedSpace::new(ColorSpace::DeviceRgb, 1, vec![0, 0, 0]);
        assert!(matches!(err, Err(GraphicsError::RangeCheck(_))));
    }

    #[test]
    fn indexed_rejects_indexed_base() {
        let inner = IndexedSpace::new(ColorSpace::DeviceGray, 0, vec![0]).unwrap();
        let err = IndexedSpace::new(ColorSpace::Indexed(inner), 0, vec![0]);
        assert!(matches!(err, Err(GraphicsError::Malformed(_))));
    }
}
