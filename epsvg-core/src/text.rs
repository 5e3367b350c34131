//! Text measurement and label building.
//!
//! Font dictionaries are plain PostScript dictionaries; the helpers
//! here pull the `FontMatrix` and `FontName` entries out and combine
//! them with a [`FontMetrics`] provider to measure strings and build
//! device labels. All advances come back in user-space units.

use epsvg_fonts::{FontMetrics, DEFAULT_ADVANCE};
use epsvg_graphics::matrix::Matrix;
use epsvg_graphics::types::{Scalar, DEVICE_UNITS_PER_POINT};

use crate::device::{Anchor, TextLabel};
use crate::error::{ErrorKind, PsError, PsResult};
use crate::gstate::GraphicsState;
use crate::object::DictObj;

/// Name given to fonts whose dictionary carries no `FontName`.
const UNKNOWN_FONT: &str = "Unknown";

// ---------------------------------------------------------------------------
// Font dictionary access
// ---------------------------------------------------------------------------

/// The font's name, or `Unknown` when the dictionary has none.
#[must_use]
pub fn font_name(font: &DictObj) -> String {
    font.get("FontName")
        .and_then(|obj| obj.to_name_text().map(str::to_string).ok())
        .unwrap_or_else(|| UNKNOWN_FONT.to_string())
}

/// The font matrix, mapping glyph space to user space.
pub fn font_matrix(font: &DictObj) -> PsResult<Matrix> {
    let entry = font
        .get("FontMatrix")
        .ok_or_else(|| PsError::new(ErrorKind::TypeCheck, "font has no FontMatrix"))?;
    entry.to_matrix()
}

/// The font size in user-space units.
///
/// Glyph space is 1000 units per em, so the size is the matrix's mean
/// scaling times 1000. A font scaled with `12 scalefont` reports 12.
pub fn font_size(font: &DictObj) -> PsResult<Scalar> {
    Ok(font_matrix(font)?.mean_scaling() * 1000.0)
}

// ---------------------------------------------------------------------------
// Measurement
// ---------------------------------------------------------------------------

/// Advance of a string in user space, as `(wx, wy)`.
pub fn string_width(
    bytes: &[u8],
    font: &DictObj,
    metrics: &dyn FontMetrics,
) -> PsResult<(Scalar, Scalar)> {
    let size = font_size(font)?;
    let name = font_name(font);
    let total: Scalar = bytes
        .iter()
        .map(|&code| {
            metrics
                .glyph_metrics(&name, code)
                .map_or(DEFAULT_ADVANCE, |g| g.advance)
        })
        .sum();
    Ok((total / 1000.0 * size, 0.0))
}

// ---------------------------------------------------------------------------
// Label building
// ---------------------------------------------------------------------------

/// Build the device label for showing `bytes` at the current point.
///
/// The label is anchored baseline-left, rotated with the CTM, and its
/// size converts the CTM scaling back into points.
pub fn make_label(bytes: &[u8], gs: &GraphicsState) -> PsResult<TextLabel> {
    let font = gs
        .font
        .as_ref()
        .ok_or_else(|| PsError::new(ErrorKind::TypeCheck, "no current font"))?;
    let position = gs.current_device_point()?;
    let size_user = font_size(font)?;
    Ok(TextLabel {
        text: bytes.iter().map(|&b| char::from(b)).collect(),
        position,
        angle_degrees: gs.ctm.rotation_degrees(),
        font_size: size_user * gs.ctm.mean_scaling() / DEVICE_UNITS_PER_POINT,
        font_name: font_name(font),
        anchor: Anchor::BASELINE_LEFT,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
