//! SVG output device.
//!
//! [`SvgDevice`] receives painting events from the interpreter and
//! assembles an SVG [`Document`]. Device space is micrometers with y
//! pointing up; emitted coordinates are PostScript points with y
//! pointing down, so every y is negated on the way out.
//!
//! Scopes, clips, and stroke styles become nested `<g>` elements. The
//! document is assembled in [`OutputDevice::finish`], which the
//! interpreter calls even on the error path, so the output is always
//! well-formed XML.

use std::cell::RefCell;
use std::rc::Rc;

use epsvg_core::device::{HorizontalAnchor, OutputDevice, TextLabel, VerticalAnchor};
use epsvg_core::error::{ErrorKind, PsError, PsResult};
use epsvg_core::gstate::GraphicsState;
use epsvg_core::interpreter::Interpreter;
use epsvg_graphics::color::Color;
use epsvg_graphics::matrix::Matrix;
use epsvg_graphics::path::{Path, PathSection};
use epsvg_graphics::shading::RadialShading;
use epsvg_graphics::types::{
    DashPattern, LineCap, LineJoin, Scalar, DEVICE_UNITS_PER_POINT, DIFF_TOLERANCE,
};
use kurbo::Point;
use svg::node::element::{
    Circle, ClipPath, Definitions, Group, Path as SvgPath, RadialGradient, Rectangle, Stop,
    Text as SvgText,
};
use svg::{Document, Node};

/// Points per device unit.
const PT_PER_DEVICE_UNIT: Scalar = 1.0 / DEVICE_UNITS_PER_POINT;

/// Device-space distance by which an extended shading is enlarged,
/// far past any realistic figure (30 cm).
const EXTEND_DISTANCE: Scalar = 300_000.0;

/// Per-channel tolerance when approximating a color ramp with linear
/// gradient stops.
const RAMP_TOLERANCE: Scalar = 0.01;

/// Radius of a debug dot, in points.
const DOT_RADIUS: Scalar = 1.0;

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Run a PostScript program and return the rendered SVG [`Document`].
pub fn render(source: &str) -> PsResult<Document> {
    render_with_options(source, &SvgOptions::default())
}

/// Run a PostScript program with custom rendering options.
pub fn render_with_options(source: &str, opts: &SvgOptions) -> PsResult<Document> {
    let device = SvgDevice::with_options(opts.clone());
    let handle = device.output_handle();
    let mut interp = Interpreter::new(Box::new(device));
    interp.run(source)?;
    let doc = handle.borrow_mut().take();
    doc.ok_or_else(|| PsError::new(ErrorKind::IoError, "device produced no document"))
}

/// Rendering options for [`SvgDevice`].
#[derive(Debug, Clone)]
pub struct SvgOptions {
    /// Margin around the painted content, in points.
    pub margin: Scalar,
    /// Number of decimal places in emitted coordinates.
    pub precision: usize,
}

impl Default for SvgOptions {
    fn default() -> Self {
        Self {
            margin: 2.0,
            precision: 3,
        }
    }
}

/// Shared slot the finished [`Document`] lands in.
///
/// The interpreter owns its device, so callers keep a handle and read
/// the output after the run.
pub type OutputHandle = Rc<RefCell<Option<Document>>>;

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

/// What opened a group on the frame stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    /// The document content group.
    Root,
    /// A `gsave` scope.
    Scope,
    /// A stroke style change within a scope.
    Style,
    /// A clip region within a scope.
    Clip,
}

struct Frame {
    kind: FrameKind,
    group: Group,
}

/// Values already in effect for the innermost scope. Style groups are
/// only opened when a newly requested value differs from these.
#[derive(Debug, Clone)]
struct ScopeState {
    color: [Scalar; 3],
    /// Last emitted stroke width, in points.
    stroke_width: Option<Scalar>,
    /// Last emitted dash pattern, in points.
    stroke_dash: Option<DashPattern>,
}

impl ScopeState {
    fn new() -> Self {
        Self {
            color: [0.0; 3],
            stroke_width: None,
            stroke_dash: None,
        }
    }
}

// ---------------------------------------------------------------------------
// The device
// ---------------------------------------------------------------------------

/// An [`OutputDevice`] producing an SVG document.
pub struct SvgDevice {
    opts: SvgOptions,
    frames: Vec<Frame>,
    scopes: Vec<ScopeState>,
    clip_defs: Vec<ClipPath>,
    gradient_defs: Vec<RadialGradient>,
    clip_counter: usize,
    gradient_counter: usize,
    /// Bounding box of everything painted so far, in point coordinates.
    bounds: Option<(Point, Point)>,
    document: OutputHandle,
}

impl SvgDevice {
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(SvgOptions::default())
    }

    #[must_use]
    pub fn with_options(opts: SvgOptions) -> Self {
        Self {
            opts,
            frames: Vec::new(),
            scopes: vec![ScopeState::new()],
            clip_defs: Vec::new(),
            gradient_defs: Vec::new(),
            clip_counter: 0,
            gradient_counter: 0,
            bounds: None,
            document: Rc::new(RefCell::new(None)),
        }
    }

    /// Handle to the slot the finished document is stored in.
    #[must_use]
    pub fn output_handle(&self) -> OutputHandle {
        Rc::clone(&self.document)
    }

    // -- Frame stack --------------------------------------------------------

    fn append<T>(&mut self, node: T)
    where
        T: Into<Box<dyn Node>>,
    {
        if self.frames.is_empty() {
            self.frames.push(Frame {
                kind: FrameKind::Root,
                group: Group::new(),
            });
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.group.append(node);
        }
    }

    /// Merge the top frame into its parent. The root frame stays.
    fn close_top_frame(&mut self) {
        if self.frames.len() < 2 {
            return;
        }
        if let Some(frame) = self.frames.pop() {
            self.append(frame.group);
        }
    }

    fn scope(&mut self) -> &mut ScopeState {
        if self.scopes.is_empty() {
            self.scopes.push(ScopeState::new());
        }
        let top = self.scopes.len() - 1;
        &mut self.scopes[top]
    }

    // -- Bounds tracking ----------------------------------------------------

    fn include(&mut self, lo: Point, hi: Point) {
        self.bounds = Some(match self.bounds {
            None => (lo, hi),
            Some((a, b)) => (
                Point::new(a.x.min(lo.x), a.y.min(lo.y)),
                Point::new(b.x.max(hi.x), b.y.max(hi.y)),
            ),
        });
    }

    /// Grow the bounds by a device-space rectangle plus `pad` points.
    fn include_device_rect(&mut self, lo: Point, hi: Point, pad: Scalar) {
        let a = device_to_pt(lo);
        let b = device_to_pt(hi);
        self.include(
            Point::new(a.x.min(b.x) - pad, a.y.min(b.y) - pad),
            Point::new(a.x.max(b.x) + pad, a.y.max(b.y) + pad),
        );
    }

    // -- Painting helpers ---------------------------------------------------

    fn paint_fill(&mut self, gs: &GraphicsState, rule: Option<&str>) {
        if gs.path.is_empty() {
            return;
        }
        let mut el = SvgPath::new()
            .set("d", path_to_d(&gs.path, self.opts.precision))
            .set("fill", color_to_svg(gs.color.to_rgb()))
            .set("stroke", "none");
        if let Some(rule) = rule {
            el = el.set("fill-rule", rule);
        }
        self.append(el);
        if let Some((lo, hi)) = gs.path.device_bounds() {
            self.include_device_rect(lo, hi, 0.0);
        }
    }

    /// Open a style group when the stroke width or dash pattern differs
    /// from the values already in effect.
    fn ensure_stroke_style(&mut self, gs: &GraphicsState) {
        let width = gs.device_line_width() * PT_PER_DEVICE_UNIT;
        let dash = gs.device_dash().scaled(PT_PER_DEVICE_UNIT);
        let scope = self.scope();
        let width_stale = match scope.stroke_width {
            Some(w) => (w - width).abs() > DIFF_TOLERANCE,
            None => true,
        };
        let dash_stale = match &scope.stroke_dash {
            Some(d) => !d.approx_eq(&dash),
            None => true,
        };
        if !width_stale && !dash_stale {
            return;
        }
        scope.stroke_width = Some(width);
        scope.stroke_dash = Some(dash.clone());

        let precision = self.opts.precision;
        let mut group = Group::new().set("stroke-width", fmt_scalar(width, precision));
        if dash.is_solid() {
            group = group.set("stroke-dasharray", "none");
        } else {
            group = group.set("stroke-dasharray", dash_to_svg(&dash, precision));
            if dash.offset.abs() > DIFF_TOLERANCE {
                group = group.set("stroke-dashoffset", fmt_scalar(dash.offset, precision));
            }
        }
        self.frames.push(Frame {
            kind: FrameKind::Style,
            group,
        });
    }

    fn push_clip(&mut self, path: &Path, evenodd: bool) {
        let id = format!("c{}", self.clip_counter);
        self.clip_counter += 1;

        let mut clip_path = SvgPath::new().set("d", path_to_d(path, self.opts.precision));
        if evenodd {
            clip_path = clip_path.set("clip-rule", "evenodd");
        }
        self.clip_defs
            .push(ClipPath::new().set("id", id.as_str()).add(clip_path));
        self.frames.push(Frame {
            kind: FrameKind::Clip,
            group: Group::new().set("clip-path", format!("url(#{id})")),
        });
    }
}

impl Default for SvgDevice {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// OutputDevice implementation
// ---------------------------------------------------------------------------

impl OutputDevice for SvgDevice {
    fn default_ctm(&self) -> Matrix {
        Matrix::scaling(DEVICE_UNITS_PER_POINT, DEVICE_UNITS_PER_POINT)
    }

    fn init(&mut self) -> PsResult<()> {
        self.frames.clear();
        self.frames.push(Frame {
            kind: FrameKind::Root,
            group: Group::new(),
        });
        self.scopes = vec![ScopeState::new()];
        self.clip_defs.clear();
        self.gradient_defs.clear();
        self.clip_counter = 0;
        self.gradient_counter = 0;
        self.bounds = None;
        *self.document.borrow_mut() = None;
        Ok(())
    }

    fn finish(&mut self) -> PsResult<()> {
        while self.frames.len() > 1 {
            self.close_top_frame();
        }
        let content = match self.frames.pop() {
            Some(frame) => frame.group,
            None => Group::new(),
        };

        let m = self.opts.margin;
        let p = self.opts.precision;
        let (x, y, w, h) = match self.bounds {
            Some((lo, hi)) => (
                lo.x - m,
                lo.y - m,
                hi.x - lo.x + 2.0 * m,
                hi.y - lo.y + 2.0 * m,
            ),
            None => (0.0, 0.0, 1.0, 1.0),
        };

        let mut doc = Document::new()
            .set("xmlns", "http://www.w3.org/2000/svg")
            .set(
                "viewBox",
                format!(
                    "{} {} {} {}",
                    fmt_scalar(x, p),
                    fmt_scalar(y, p),
                    fmt_scalar(w, p),
                    fmt_scalar(h, p)
                ),
            )
            .set("width", format!("{}pt", fmt_scalar(w, p)))
            .set("height", format!("{}pt", fmt_scalar(h, p)));

        if !self.clip_defs.is_empty() || !self.gradient_defs.is_empty() {
            let mut defs = Definitions::new();
            for clip in &self.clip_defs {
                defs = defs.add(clip.clone());
            }
            for gradient in &self.gradient_defs {
                defs = defs.add(gradient.clone());
            }
            doc = doc.add(defs);
        }

        *self.document.borrow_mut() = Some(doc.add(content));
        Ok(())
    }

    fn start_scope(&mut self) -> PsResult<()> {
        self.frames.push(Frame {
            kind: FrameKind::Scope,
            group: Group::new(),
        });
        let inherited = self.scope().clone();
        self.scopes.push(inherited);
        Ok(())
    }

    fn end_scope(&mut self) -> PsResult<()> {
        while self.frames.len() > 1 {
            let kind = match self.frames.last() {
                Some(frame) => frame.kind,
                None => break,
            };
            self.close_top_frame();
            if kind == FrameKind::Scope {
                break;
            }
        }
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
        Ok(())
    }

    fn fill(&mut self, gs: &GraphicsState) -> PsResult<()> {
        self.paint_fill(gs, None);
        Ok(())
    }

    fn eofill(&mut self, gs: &GraphicsState) -> PsResult<()> {
        self.paint_fill(gs, Some("evenodd"));
        Ok(())
    }

    fn stroke(&mut self, gs: &GraphicsState) -> PsResult<()> {
        if gs.path.is_empty() {
            return Ok(());
        }
        self.ensure_stroke_style(gs);
        let mut el = SvgPath::new()
            .set("d", path_to_d(&gs.path, self.opts.precision))
            .set("fill", "none")
            .set("stroke", color_to_svg(gs.color.to_rgb()))
            .set("stroke-linecap", linecap_to_svg(gs.line_cap))
            .set("stroke-linejoin", linejoin_to_svg(gs.line_join));
        if gs.line_join == LineJoin::Miter {
            el = el.set(
                "stroke-miterlimit",
                fmt_scalar(gs.miter_limit, self.opts.precision),
            );
        }
        self.append(el);
        if let Some((lo, hi)) = gs.path.device_bounds() {
            let pad = 0.5 * gs.device_line_width() * PT_PER_DEVICE_UNIT;
            self.include_device_rect(lo, hi, pad);
        }
        Ok(())
    }

    fn clip(&mut self, path: &Path) -> PsResult<()> {
        self.push_clip(path, false);
        Ok(())
    }

    fn eoclip(&mut self, path: &Path) -> PsResult<()> {
        self.push_clip(path, true);
        Ok(())
    }

    fn shade(&mut self, shading: &RadialShading, _gs: &GraphicsState) -> PsResult<()> {
        let (s_min, s_max) = shade_span(shading);
        let outer_r = shading.radius_at(s_max);
        if s_max - s_min <= 0.0 || outer_r <= 0.0 {
            return Ok(());
        }

        let id = format!("g{}", self.gradient_counter);
        self.gradient_counter += 1;

        let p = self.opts.precision;
        let center = device_to_pt(shading.center_at(s_max));
        let focus = device_to_pt(shading.center_at(s_min));
        let r = outer_r * PT_PER_DEVICE_UNIT;
        let mut gradient = RadialGradient::new()
            .set("id", id.as_str())
            .set("gradientUnits", "userSpaceOnUse")
            .set("cx", fmt_scalar(center.x, p))
            .set("cy", fmt_scalar(center.y, p))
            .set("r", fmt_scalar(r, p))
            .set("fx", fmt_scalar(focus.x, p))
            .set("fy", fmt_scalar(focus.y, p));

        let mut stops = Vec::new();
        if s_min < 0.0 {
            stops.push(s_min);
        }
        stops.extend(shading.fit_breakpoints(RAMP_TOLERANCE));
        if s_max > 1.0 {
            stops.push(s_max);
        }
        let span = s_max - s_min;
        for s in stops {
            gradient = gradient.add(
                Stop::new()
                    .set("offset", fmt_scalar((s - s_min) / span, p))
                    .set("stop-color", color_to_svg(shading.color_at(s))),
            );
        }
        self.gradient_defs.push(gradient);

        self.append(
            Circle::new()
                .set("cx", fmt_scalar(center.x, p))
                .set("cy", fmt_scalar(center.y, p))
                .set("r", fmt_scalar(r, p))
                .set("fill", format!("url(#{id})")),
        );
        self.include(
            Point::new(center.x - r, center.y - r),
            Point::new(center.x + r, center.y + r),
        );
        Ok(())
    }

    fn set_color(&mut self, color: &Color) -> PsResult<()> {
        self.scope().color = color.to_rgb();
        Ok(())
    }

    fn set_line_cap(&mut self, _cap: LineCap) -> PsResult<()> {
        // Stroke attributes are read from the graphics state at paint time
        Ok(())
    }

    fn set_line_join(&mut self, _join: LineJoin) -> PsResult<()> {
        Ok(())
    }

    fn set_miter_limit(&mut self, _limit: Scalar) -> PsResult<()> {
        Ok(())
    }

    fn show_text(&mut self, label: &TextLabel) -> PsResult<()> {
        let p = self.opts.precision;
        let pos = device_to_pt(label.position);
        let mut transform = format!(
            "translate({},{})",
            fmt_scalar(pos.x, p),
            fmt_scalar(pos.y, p)
        );
        if label.angle_degrees.abs() > DIFF_TOLERANCE {
            // SVG rotates clockwise in its y-down space
            transform.push_str(&format!(" rotate({})", fmt_scalar(-label.angle_degrees, p)));
        }

        let (family, weight, style) = font_attributes(&label.font_name);
        let color = self.scope().color;
        let mut el = SvgText::new(label.text.clone())
            .set("transform", transform)
            .set("font-family", family)
            .set("font-size", fmt_scalar(label.font_size, p))
            .set("fill", color_to_svg(color));
        if let Some(weight) = weight {
            el = el.set("font-weight", weight);
        }
        if let Some(style) = style {
            el = el.set("font-style", style);
        }
        match label.anchor.horizontal {
            HorizontalAnchor::Left => {}
            HorizontalAnchor::Center => el = el.set("text-anchor", "middle"),
            HorizontalAnchor::Right => el = el.set("text-anchor", "end"),
        }
        match label.anchor.vertical {
            VerticalAnchor::Baseline => {}
            VerticalAnchor::Top => el = el.set("dominant-baseline", "text-before-edge"),
            VerticalAnchor::Center => el = el.set("dominant-baseline", "central"),
            VerticalAnchor::Bottom => el = el.set("dominant-baseline", "text-after-edge"),
        }
        self.append(el);

        let pad = label.font_size.max(1.0);
        self.include(
            Point::new(pos.x - pad, pos.y - pad),
            Point::new(pos.x + pad, pos.y + pad),
        );
        Ok(())
    }

    fn draw_dot(&mut self, center: Point) -> PsResult<()> {
        let p = self.opts.precision;
        let c = device_to_pt(center);
        let color = self.scope().color;
        self.append(
            Circle::new()
                .set("cx", fmt_scalar(c.x, p))
                .set("cy", fmt_scalar(c.y, p))
                .set("r", fmt_scalar(DOT_RADIUS, p))
                .set("fill", color_to_svg(color)),
        );
        self.include(
            Point::new(c.x - DOT_RADIUS, c.y - DOT_RADIUS),
            Point::new(c.x + DOT_RADIUS, c.y + DOT_RADIUS),
        );
        Ok(())
    }

    fn draw_rect(&mut self, lower: Point, upper: Point) -> PsResult<()> {
        let p = self.opts.precision;
        let a = device_to_pt(lower);
        let b = device_to_pt(upper);
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        let w = (b.x - a.x).abs();
        let h = (b.y - a.y).abs();
        let color = self.scope().color;
        self.append(
            Rectangle::new()
                .set("x", fmt_scalar(x, p))
                .set("y", fmt_scalar(y, p))
                .set("width", fmt_scalar(w, p))
                .set("height", fmt_scalar(h, p))
                .set("fill", color_to_svg(color)),
        );
        self.include(Point::new(x, y), Point::new(x + w, y + h));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Shading helpers
// ---------------------------------------------------------------------------

/// Parameter range covered by the gradient, honoring the extend flags.
/// The range never lets the interpolated radius go negative.
fn shade_span(shading: &RadialShading) -> (Scalar, Scalar) {
    let mut s_min = 0.0;
    let mut s_max = 1.0;
    let extra = shading.s_for_distance(EXTEND_DISTANCE);
    if shading.extend_start {
        s_min = -extra;
    }
    if shading.extend_end {
        s_max = 1.0 + extra;
    }

    let dr = shading.r_end - shading.r_start;
    if dr.abs() > Scalar::EPSILON {
        // radius_at(s_zero) == 0
        let s_zero = -shading.r_start / dr;
        if dr > 0.0 {
            s_min = s_min.max(s_zero);
        } else {
            s_max = s_max.min(s_zero);
        }
    }
    (s_min, s_max)
}

// ---------------------------------------------------------------------------
// Path → SVG "d" attribute
// ---------------------------------------------------------------------------

/// Convert a device-space [`Path`] to an SVG path data string in point
/// coordinates. Y coordinates are negated to convert to SVG's y-down
/// orientation.
fn path_to_d(path: &Path, precision: usize) -> String {
    let mut d = String::with_capacity(path.sections.len() * 24);
    for section in &path.sections {
        match *section {
            PathSection::Moveto { device, .. } => {
                d.push('M');
                write_point(&mut d, device, precision);
            }
            PathSection::Lineto(p) => {
                d.push('L');
                write_point(&mut d, p, precision);
            }
            PathSection::Curveto(c1, c2, end) => {
                d.push('C');
                write_point(&mut d, c1, precision);
                d.push(' ');
                write_point(&mut d, c2, precision);
                d.push(' ');
                write_point(&mut d, end, precision);
            }
            PathSection::Closepath => d.push('Z'),
        }
    }
    d
}

fn device_to_pt(p: Point) -> Point {
    Point::new(p.x * PT_PER_DEVICE_UNIT, -p.y * PT_PER_DEVICE_UNIT)
}

/// Write "x,y" in points with the given precision.
///
/// Normalizes negative zero to positive zero for cleaner output.
fn write_point(d: &mut String, device: Point, precision: usize) {
    use std::fmt::Write;
    let p = device_to_pt(device);
    let x = if p.x == 0.0 { 0.0 } else { p.x };
    let y = if p.y == 0.0 { 0.0 } else { p.y };
    let _ = write!(d, "{x:.precision$},{y:.precision$}");
}

// ---------------------------------------------------------------------------
// Attribute helpers
// ---------------------------------------------------------------------------

/// Convert RGB components in [0, 1] to an SVG color string.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn color_to_svg(rgb: [Scalar; 3]) -> String {
    let r = (rgb[0].clamp(0.0, 1.0) * 255.0).round() as u8;
    let g = (rgb[1].clamp(0.0, 1.0) * 255.0).round() as u8;
    let b = (rgb[2].clamp(0.0, 1.0) * 255.0).round() as u8;
    if r == 0 && g == 0 && b == 0 {
        "black".to_owned()
    } else if r == 255 && g == 255 && b == 255 {
        "white".to_owned()
    } else {
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}

const fn linecap_to_svg(cap: LineCap) -> &'static str {
    match cap {
        LineCap::Butt => "butt",
        LineCap::Round => "round",
        LineCap::Square => "square",
    }
}

const fn linejoin_to_svg(join: LineJoin) -> &'static str {
    match join {
        LineJoin::Miter => "miter",
        LineJoin::Round => "round",
        LineJoin::Bevel => "bevel",
    }
}

fn dash_to_svg(dash: &DashPattern, precision: usize) -> String {
    dash.dashes
        .iter()
        .map(|v| format!("{v:.precision$}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Format a scalar to the given precision, stripping trailing zeros.
fn fmt_scalar(v: Scalar, precision: usize) -> String {
    let s = format!("{v:.precision$}");
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.');
        trimmed.to_owned()
    } else {
        s
    }
}

/// Map a PostScript face name to a CSS family plus weight and style.
fn font_attributes(name: &str) -> (String, Option<&'static str>, Option<&'static str>) {
    let base = name.split('-').next().unwrap_or(name);
    let family = match base {
        "Courier" => "Courier, monospace".to_owned(),
        "Times" => "Times, serif".to_owned(),
        "Helvetica" => "Helvetica, sans-serif".to_owned(),
        other => other.to_owned(),
    };
    let weight = if name.contains("Bold") {
        Some("bold")
    } else {
        None
    };
    let style = if name.contains("Italic") || name.contains("Oblique") {
        Some("italic")
    } else {
        None
    };
    (family, weight, style)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
