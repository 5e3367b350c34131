//! Font metric provider trait and the built-in approximate tables.

/// Metrics for a single glyph, in 1/1000 em units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphMetrics {
    /// Horizontal advance width.
    pub advance: f64,
    /// Bounding box: left, bottom, right, top.
    pub bbox: [f64; 4],
}

/// Trait for resolving character metrics of a named font.
///
/// Implementations may back this with real metric files; the shipped
/// [`BuiltinMetrics`] uses class-based approximations for the standard
/// text faces. Returning `None` makes the caller fall back to a default
/// advance.
pub trait FontMetrics {
    /// Metrics for character `code` in the font named `font`, or `None`
    /// if the provider has nothing better than the default.
    fn glyph_metrics(&self, font: &str, code: u8) -> Option<GlyphMetrics>;
}

/// Fallback advance width (1/1000 em) when no provider matches.
pub const DEFAULT_ADVANCE: f64 = 500.0;

// ---------------------------------------------------------------------------
// Built-in approximations
// ---------------------------------------------------------------------------

/// Approximate metrics for the standard text faces.
///
/// Courier is genuinely monospaced at 600/1000 em. The proportional
/// faces use per-class averages of the real AFM widths; they are close
/// enough for anchor placement and advance accumulation, which is all
/// the output backends need.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinMetrics;

#[derive(Clone, Copy)]
struct ClassWidths {
    space: f64,
    digit: f64,
    upper: f64,
    lower: f64,
    punct: f64,
}

const COURIER: ClassWidths = ClassWidths {
    space: 600.0,
    digit: 600.0,
    upper: 600.0,
    lower: 600.0,
    punct: 600.0,
};

const TIMES: ClassWidths = ClassWidths {
    space: 250.0,
    digit: 500.0,
    upper: 677.0,
    lower: 444.0,
    punct: 333.0,
};

const HELVETICA: ClassWidths = ClassWidths {
    space: 278.0,
    digit: 556.0,
    upper: 667.0,
    lower: 556.0,
    punct: 333.0,
};

impl FontMetrics for BuiltinMetrics {
    fn glyph_metrics(&self, font: &str, code: u8) -> Option<GlyphMetrics> {
        let widths = if font.contains("Courier") || font.contains("Mono") {
            COURIER
        } else if font.contains("Times") || font.contains("Roman") {
            TIMES
        } else if font.contains("Helvetica") || font.contains("Arial") {
            HELVETICA
        } else {
            return None;
        };
        let advance = match code {
            b' ' => widths.space,
            b'0'..=b'9' => widths.digit,
            b'A'..=b'Z' => widths.upper,
            b'a'..=b'z' => widths.lower,
            0x21..=0x7e => widths.punct,
            _ => DEFAULT_ADVANCE,
        };
        Some(GlyphMetrics {
            advance,
            bbox: [0.0, -212.0, advance, 717.0],
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn courier_is_monospaced() {
        let m = BuiltinMetrics;
        let i = m.glyph_metrics("Courier", b'i').unwrap();
        let w = m.glyph_metrics("Courier-Bold", b'W').unwrap();
        assert_eq!(i.advance, 600.0);
        assert_eq!(w.advance, 600.0);
    }

    #[test]
    fn proportional_classes_differ() {
        let m = BuiltinMetrics;
        let lower = m.glyph_metrics("Times-Roman", b'a').unwrap();
        let upper = m.glyph_metrics("Times-Roman", b'A').unwrap();
        assert!(upper.advance > lower.advance);
    }

    #[test]
    fn unknown_face_defers() {
        let m = BuiltinMetrics;
        assert!(m.glyph_metrics("Chancery-Fancy", b'a').is_none());
    }

    #[test]
    fn bbox_tracks_advance() {
        let m = BuiltinMetrics;
        let g = m.glyph_metrics("Helvetica", b'x').unwrap();
        assert_eq!(g.bbox[2], g.advance);
        assert!(g.bbox[1] < 0.0 && g.bbox[3] > 0.0);
    }
}
