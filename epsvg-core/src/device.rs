//! The output device contract.
//!
//! An [`OutputDevice`] receives painting events in device space and
//! turns them into concrete output. Path construction never reaches the
//! device; only paint, clip, scope, and text events do. The interpreter
//! drives exactly one device per run.

use epsvg_graphics::color::Color;
use epsvg_graphics::matrix::Matrix;
use epsvg_graphics::path::Path;
use epsvg_graphics::shading::RadialShading;
use epsvg_graphics::types::{LineCap, LineJoin, Scalar, DEVICE_UNITS_PER_POINT};
use kurbo::Point;

use crate::error::PsResult;
use crate::gstate::GraphicsState;

// ---------------------------------------------------------------------------
// Text anchoring
// ---------------------------------------------------------------------------

/// Vertical part of a text anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalAnchor {
    Top,
    Center,
    Baseline,
    Bottom,
}

/// Horizontal part of a text anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalAnchor {
    Left,
    Center,
    Right,
}

/// Where a text label attaches to its position, written as a two-letter
/// code: vertical (`t`, `c`, `B`, `b`) then horizontal (`l`, `c`, `r`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub vertical: VerticalAnchor,
    pub horizontal: HorizontalAnchor,
}

impl Anchor {
    /// Baseline-left, the anchor plain `show` uses.
    pub const BASELINE_LEFT: Self = Self {
        vertical: VerticalAnchor::Baseline,
        horizontal: HorizontalAnchor::Left,
    };

    /// Parse a two-letter anchor code.
    #[must_use]
    pub fn parse(code: &str) -> Option<Self> {
        let mut chars = code.chars();
        let vertical = match chars.next()? {
            't' => VerticalAnchor::Top,
            'c' => VerticalAnchor::Center,
            'B' => VerticalAnchor::Baseline,
            'b' => VerticalAnchor::Bottom,
            _ => return None,
        };
        let horizontal = match chars.next()? {
            'l' => HorizontalAnchor::Left,
            'c' => HorizontalAnchor::Center,
            'r' => HorizontalAnchor::Right,
            _ => return None,
        };
        if chars.next().is_some() {
            return None;
        }
        Some(Self {
            vertical,
            horizontal,
        })
    }
}

/// A piece of text ready for the device.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLabel {
    /// The characters to draw.
    pub text: String,
    /// Anchor position in device space.
    pub position: Point,
    /// Rotation in degrees, counterclockwise.
    pub angle_degrees: Scalar,
    /// Font size in points, after the CTM scaling.
    pub font_size: Scalar,
    /// PostScript font name, e.g. `Times-Roman`.
    pub font_name: String,
    /// How the text attaches to its position.
    pub anchor: Anchor,
}

// ---------------------------------------------------------------------------
// Device trait
// ---------------------------------------------------------------------------

/// Receiver of painting events.
///
/// `init` is called once before execution and `finish` exactly once
/// after, including on the error path, so a device always gets the
/// chance to produce well-formed output. Scopes opened by `start_scope`
/// that are still open at `finish` are force-closed there.
pub trait OutputDevice {
    /// The initial user-to-device CTM.
    fn default_ctm(&self) -> Matrix;

    /// Called once before any other event.
    fn init(&mut self) -> PsResult<()>;

    /// Called exactly once after execution ends.
    fn finish(&mut self) -> PsResult<()>;

    /// Open a graphics scope (`gsave`).
    fn start_scope(&mut self) -> PsResult<()>;

    /// Close the innermost graphics scope (`grestore`).
    fn end_scope(&mut self) -> PsResult<()>;

    /// Fill the current path, nonzero winding rule.
    fn fill(&mut self, gs: &GraphicsState) -> PsResult<()>;

    /// Fill the current path, even-odd rule.
    fn eofill(&mut self, gs: &GraphicsState) -> PsResult<()>;

    /// Stroke the current path.
    fn stroke(&mut self, gs: &GraphicsState) -> PsResult<()>;

    /// Replace the clipping path, nonzero winding rule.
    fn clip(&mut self, path: &Path) -> PsResult<()>;

    /// Replace the clipping path, even-odd rule.
    fn eoclip(&mut self, path: &Path) -> PsResult<()>;

    /// Paint a radial shading clipped to the current path.
    fn shade(&mut self, shading: &RadialShading, gs: &GraphicsState) -> PsResult<()>;

    /// Set the paint color.
    fn set_color(&mut self, color: &Color) -> PsResult<()>;

    fn set_line_cap(&mut self, cap: LineCap) -> PsResult<()>;

    fn set_line_join(&mut self, join: LineJoin) -> PsResult<()>;

    fn set_miter_limit(&mut self, limit: Scalar) -> PsResult<()>;

    /// Draw an anchored text label.
    fn show_text(&mut self, label: &TextLabel) -> PsResult<()>;

    /// Draw a small filled dot at a device-space point.
    fn draw_dot(&mut self, center: Point) -> PsResult<()>;

    /// Draw a filled axis-aligned rectangle in device space.
    fn draw_rect(&mut self, lower: Point, upper: Point) -> PsResult<()>;
}

// ---------------------------------------------------------------------------
// Null device
// ---------------------------------------------------------------------------

/// A device that swallows everything. Used for measurement-only runs
/// and in tests that only care about interpreter state.
#[derive(Debug, Default)]
pub struct NullDevice;

impl NullDevice {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl OutputDevice for NullDevice {
    fn default_ctm(&self) -> Matrix {
        Matrix::scaling(DEVICE_UNITS_PER_POINT, DEVICE_UNITS_PER_POINT)
    }

    fn init(&mut self) -> PsResult<()> {
        Ok(())
    }

    fn finish(&mut self) -> PsResult<()> {
        Ok(())
    }

    fn start_scope(&mut self) -> PsResult<()> {
        Ok(())
    }

    fn end_scope(&mut self) -> PsResult<()> {
        Ok(())
    }

    fn fill(&mut self, _gs: &GraphicsState) -> PsResult<()> {
        Ok(())
    }

    fn eofill(&mut self, _gs: &GraphicsState) -> PsResult<()> {
        Ok(())
    }

    fn stroke(&mut self, _gs: &GraphicsState) -> PsResult<()> {
        Ok(())
    }

    fn clip(&mut self, _path: &Path) -> PsResult<()> {
        Ok(())
    }

    fn eoclip(&mut self, _path: &Path) -> PsResult<()> {
        Ok(())
    }

    fn shade(&mut self, _shading: &RadialShading, _gs: &GraphicsState) -> PsResult<()> {
        Ok(())
    }

    fn set_color(&mut self, _color: &Color) -> PsResult<()> {
        Ok(())
    }

    fn set_line_cap(&mut self, _cap: LineCap) -> PsResult<()> {
        Ok(())
    }

    fn set_line_join(&mut self, _join: LineJoin) -> PsResult<()> {
        Ok(())
    }

    fn set_miter_limit(&mut self, _limit: Scalar) -> PsResult<()> {
        Ok(())
    }

    fn show_text(&mut self, _label: &TextLabel) -> PsResult<()> {
        Ok(())
    }

    fn draw_dot(&mut self, _center: Point) -> PsResult<()> {
        Ok(())
    }

    fn draw_rect(&mut self, _lower: Point, _upper: Point) -> PsResult<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_codes_parse() {
        let anchor = Anchor::parse("Bl").unwrap();
        assert_eq!(anchor, Anchor::BASELINE_LEFT);
        let anchor = Anchor::parse("tc").unwrap();
        assert_eq!(anchor.vertical, VerticalAnchor::Top);
        assert_eq!(anchor.horizontal, HorizontalAnchor::Center);
        let anchor = Anchor::parse("br").unwrap();
        assert_eq!(anchor.vertical, VerticalAnchor::Bottom);
        assert_eq!(anchor.horizontal, HorizontalAnchor::Right);
    }

    #[test]
    fn bad_anchor_codes_rejected() {
        assert!(Anchor::parse("").is_none());
        assert!(Anchor::parse("B").is_none());
        assert!(Anchor::parse("xl").is_none());
        assert!(Anchor::parse("Bx").is_none());
        assert!(Anchor::parse("Blx").is_none());
    }

    #[test]
    fn null_device_default_ctm_is_micrometers_per_point() {
        let device = NullDevice::new();
        let ctm = device.default_ctm();
        let p = ctm.apply(Point::new(72.0, 0.0));
        // 72 pt is exactly one inch, 25.4 mm
        assert!((p.x - 25_400.0).abs() < 1e-9);
    }
}
