//! Font and text operators.
//!
//! Fonts are ordinary dictionaries carrying `FontName`, `FontMatrix`,
//! `FontType`, and `Encoding`. Text never becomes outlines here; shown
//! strings go to the device as anchored labels and the current point
//! advances by the measured width.

use epsvg_fonts::standard_encoding;
use epsvg_graphics::matrix::Matrix;
use epsvg_graphics::types::Scalar;

use crate::error::{ErrorKind, PsError, PsResult};
use crate::object::{DictObj, Object, OpFn};
use crate::text;

use super::{encoding_array, Interpreter};

pub(super) const OPERATORS: &[(&str, OpFn)] = &[
    ("findfont", findfont),
    ("scalefont", scalefont),
    ("makefont", makefont),
    ("setfont", setfont),
    ("currentfont", currentfont),
    ("definefont", definefont),
    ("show", show),
    ("ashow", ashow),
    ("widthshow", widthshow),
    ("awidthshow", awidthshow),
    ("stringwidth", stringwidth),
];

/// Build a fresh unscaled font dictionary for a face name.
pub(super) fn base_font(name: &str) -> DictObj {
    let dict = DictObj::with_capacity(8);
    dict.set("FontName", Object::literal_name(name));
    dict.set("FontType", Object::integer(1));
    dict.set(
        "FontMatrix",
        Object::from_matrix(&Matrix::scaling(0.001, 0.001)),
    );
    dict.set(
        "Encoding",
        Object::array(encoding_array(&standard_encoding())),
    );
    dict
}

/// Shallow copy of a font dictionary, for `scalefont`/`makefont`.
fn clone_font(font: &DictObj) -> DictObj {
    let copy = DictObj::with_capacity(font.len());
    for (key, value) in font.entries() {
        copy.set(key, value);
    }
    copy
}

fn current_font(interp: &Interpreter) -> PsResult<DictObj> {
    interp
        .gs()
        .font
        .clone()
        .ok_or_else(|| PsError::new(ErrorKind::TypeCheck, "no current font"))
}

// ---------------------------------------------------------------------------
// Font selection
// ---------------------------------------------------------------------------

fn findfont(interp: &mut Interpreter) -> PsResult<()> {
    let key = interp.op_stack.pop_key()?;
    let font = match interp.font_directory().get(&key) {
        Some(found) => found.to_font()?,
        None => {
            // Unknown faces get a synthesized dictionary under the
            // requested name so metric matching can still work
            log::warn!("font {key} is not available, substituting a default face");
            let substitute = base_font(&key);
            interp
                .font_directory()
                .set(key, Object::font(substitute.clone()));
            substitute
        }
    };
    interp.op_stack.push(Object::font(font));
    Ok(())
}

fn scalefont(interp: &mut Interpreter) -> PsResult<()> {
    let scale = interp.op_stack.pop_real()?;
    let font = interp.op_stack.pop()?.to_font()?;
    let scaled = apply_font_matrix(&font, &Matrix::scaling(scale, scale))?;
    interp.op_stack.push(Object::font(scaled));
    Ok(())
}

fn makefont(interp: &mut Interpreter) -> PsResult<()> {
    let m = interp.op_stack.pop_matrix()?;
    let font = interp.op_stack.pop()?.to_font()?;
    let transformed = apply_font_matrix(&font, &m)?;
    interp.op_stack.push(Object::font(transformed));
    Ok(())
}

fn apply_font_matrix(font: &DictObj, m: &Matrix) -> PsResult<DictObj> {
    let old = text::font_matrix(font)?;
    let copy = clone_font(font);
    copy.set("FontMatrix", Object::from_matrix(&m.prepend(&old)));
    Ok(copy)
}

fn setfont(interp: &mut Interpreter) -> PsResult<()> {
    let font = interp.op_stack.pop()?.to_font()?;
    interp.gs_mut().font = Some(font);
    Ok(())
}

fn currentfont(interp: &mut Interpreter) -> PsResult<()> {
    let font = current_font(interp)?;
    interp.op_stack.push(Object::font(font));
    Ok(())
}

fn definefont(interp: &mut Interpreter) -> PsResult<()> {
    let font = interp.op_stack.pop()?.to_font()?;
    let key = interp.op_stack.pop_key()?;
    if !font.contains("FontName") {
        font.set("FontName", Object::literal_name(key.clone()));
    }
    interp.font_directory().set(key, Object::font(font.clone()));
    interp.op_stack.push(Object::font(font));
    Ok(())
}

// ---------------------------------------------------------------------------
// Showing text
// ---------------------------------------------------------------------------

/// Show `bytes` at the current point and advance it by the measured
/// width plus `extra` per-character adjustment.
fn show_with_advance(
    interp: &mut Interpreter,
    bytes: &[u8],
    extra: (Scalar, Scalar),
) -> PsResult<()> {
    let label = text::make_label(bytes, interp.gs())?;
    let font = current_font(interp)?;
    let (wx, wy) = text::string_width(bytes, &font, interp.metrics.as_ref())?;
    interp.device.show_text(&label)?;
    let user = interp.gs().current_point()?;
    interp
        .gs_mut()
        .moveto(user.x + wx + extra.0, user.y + wy + extra.1);
    Ok(())
}

fn show(interp: &mut Interpreter) -> PsResult<()> {
    let s = interp.op_stack.pop_string()?;
    show_with_advance(interp, &s.bytes(), (0.0, 0.0))
}

fn ashow(interp: &mut Interpreter) -> PsResult<()> {
    let s = interp.op_stack.pop_string()?;
    let (ax, ay) = interp.op_stack.pop_xy()?;
    let bytes = s.bytes();
    #[allow(clippy::cast_precision_loss)]
    let n = bytes.len() as Scalar;
    show_with_advance(interp, &bytes, (ax * n, ay * n))
}

fn widthshow(interp: &mut Interpreter) -> PsResult<()> {
    let s = interp.op_stack.pop_string()?;
    let marker = interp.op_stack.pop_int()?;
    let (cx, cy) = interp.op_stack.pop_xy()?;
    let bytes = s.bytes();
    #[allow(clippy::cast_precision_loss)]
    let hits = bytes
        .iter()
        .filter(|&&b| i32::from(b) == marker)
        .count() as Scalar;
    show_with_advance(interp, &bytes, (cx * hits, cy * hits))
}

fn awidthshow(interp: &mut Interpreter) -> PsResult<()> {
    let s = interp.op_stack.pop_string()?;
    let (ax, ay) = interp.op_stack.pop_xy()?;
    let marker = interp.op_stack.pop_int()?;
    let (cx, cy) = interp.op_stack.pop_xy()?;
    let bytes = s.bytes();
    #[allow(clippy::cast_precision_loss)]
    let n = bytes.len() as Scalar;
    #[allow(clippy::cast_precision_loss)]
    let hits = bytes
        .iter()
        .filter(|&&b| i32::from(b) == marker)
        .count() as Scalar;
    show_with_advance(interp, &bytes, (ax * n + cx * hits, ay * n + cy * hits))
}

fn stringwidth(interp: &mut Interpreter) -> PsResult<()> {
    let s = interp.op_stack.pop_string()?;
    let font = current_font(interp)?;
    let (wx, wy) = text::string_width(&s.bytes(), &font, interp.metrics.as_ref())?;
    interp.op_stack.push(Object::real(wx));
    interp.op_stack.push(Object::real(wy));
    Ok(())
}
