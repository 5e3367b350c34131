//! Graphics state and its save stack.
//!
//! The state keeps the current path in device space. Path construction
//! operators take user-space coordinates and transform them through the
//! CTM on entry, so `scale`/`rotate`/`translate` after a segment never
//! disturb what was already built.

use epsvg_graphics::color::{Color, ColorSpace};
use epsvg_graphics::matrix::Matrix;
use epsvg_graphics::path::Path;
use epsvg_graphics::types::{DashPattern, LineCap, LineJoin, Scalar};
use kurbo::Point;

use crate::error::{ErrorKind, PsError, PsResult};
use crate::object::DictObj;

// ---------------------------------------------------------------------------
// Graphics state
// ---------------------------------------------------------------------------

/// One snapshot of the graphics state.
#[derive(Debug, Clone)]
pub struct GraphicsState {
    /// Current transformation matrix, user space to device space.
    pub ctm: Matrix,
    /// The device's initial CTM, restored by `initmatrix`.
    pub default_ctm: Matrix,
    /// Current path, in device space.
    pub path: Path,
    /// Current clipping path, in device space.
    pub clip_path: Path,
    /// Current point in device space, if any.
    pub position: Option<Point>,
    /// Current color space.
    pub color_space: ColorSpace,
    /// Current color.
    pub color: Color,
    /// Line width in user-space units.
    pub line_width: Scalar,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    pub miter_limit: Scalar,
    /// Dash pattern in user-space units.
    pub dash: DashPattern,
    pub flatness: Scalar,
    /// Current font dictionary, unset until the first `setfont`.
    pub font: Option<DictObj>,
}

impl GraphicsState {
    /// A fresh state on the given device CTM.
    #[must_use]
    pub fn new(default_ctm: Matrix) -> Self {
        Self {
            ctm: default_ctm,
            default_ctm,
            path: Path::new(),
            clip_path: Path::new(),
            position: None,
            color_space: ColorSpace::DeviceGray,
            color: Color::BLACK,
            line_width: 1.0,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            miter_limit: 10.0,
            dash: DashPattern::solid(),
            flatness: 1.0,
            font: None,
        }
    }

    // -- Current point ------------------------------------------------------

    /// The current point in user space.
    pub fn current_point(&self) -> PsResult<Point> {
        let device = self
            .position
            .ok_or_else(|| PsError::from_kind(ErrorKind::NoCurrentPoint))?;
        Ok(self.ctm.inverse_apply(device)?)
    }

    /// The current point in device space.
    pub fn current_device_point(&self) -> PsResult<Point> {
        self.position
            .ok_or_else(|| PsError::from_kind(ErrorKind::NoCurrentPoint))
    }

    // -- Path construction --------------------------------------------------

    /// Begin a new subpath at a user-space point.
    pub fn moveto(&mut self, x: Scalar, y: Scalar) {
        let user = Point::new(x, y);
        let device = self.ctm.apply(user);
        self.path.moveto(device, user);
        self.position = Some(device);
    }

    /// Straight segment to a user-space point.
    pub fn lineto(&mut self, x: Scalar, y: Scalar) -> PsResult<()> {
        self.current_device_point()?;
        let device = self.ctm.apply(Point::new(x, y));
        self.path.lineto(device);
        self.position = Some(device);
        Ok(())
    }

    /// Cubic segment through two user-space control points.
    pub fn curveto(
        &mut self,
        c1: (Scalar, Scalar),
        c2: (Scalar, Scalar),
        end: (Scalar, Scalar),
    ) -> PsResult<()> {
        self.current_device_point()?;
        let c1 = self.ctm.apply(Point::new(c1.0, c1.1));
        let c2 = self.ctm.apply(Point::new(c2.0, c2.1));
        let end = self.ctm.apply(Point::new(end.0, end.1));
        self.path.curveto(c1, c2, end);
        self.position = Some(end);
        Ok(())
    }

    /// Close the current subpath. The current point moves back to the
    /// subpath start; on an empty or just-closed path this is a no-op.
    pub fn closepath(&mut self) {
        let device_start = self.path.subpath_start_device();
        if self.path.closepath().is_some() {
            self.position = device_start;
        }
    }

    /// Drop the current path and current point (`newpath`).
    pub fn newpath(&mut self) {
        self.path = Path::new();
        self.position = None;
    }

    /// Bounding box of the current path in user space, as
    /// `(llx, lly, urx, ury)`.
    pub fn pathbbox(&self) -> PsResult<(Scalar, Scalar, Scalar, Scalar)> {
        let (lo, hi) = self
            .path
            .device_bounds()
            .ok_or_else(|| PsError::from_kind(ErrorKind::NoCurrentPoint))?;
        let inverse = self.ctm.inverse()?;
        let corners = [
            inverse.apply(Point::new(lo.x, lo.y)),
            inverse.apply(Point::new(hi.x, lo.y)),
            inverse.apply(Point::new(lo.x, hi.y)),
            inverse.apply(Point::new(hi.x, hi.y)),
        ];
        let mut llx = Scalar::INFINITY;
        let mut lly = Scalar::INFINITY;
        let mut urx = Scalar::NEG_INFINITY;
        let mut ury = Scalar::NEG_INFINITY;
        for p in corners {
            llx = llx.min(p.x);
            lly = lly.min(p.y);
            urx = urx.max(p.x);
            ury = ury.max(p.y);
        }
        Ok((llx, lly, urx, ury))
    }

    // -- Derived quantities -------------------------------------------------

    /// Line width in device units.
    #[must_use]
    pub fn device_line_width(&self) -> Scalar {
        self.line_width * self.ctm.mean_scaling()
    }

    /// Dash pattern in device units.
    #[must_use]
    pub fn device_dash(&self) -> DashPattern {
        self.dash.scaled(self.ctm.mean_scaling())
    }
}

// ---------------------------------------------------------------------------
// Save stack
// ---------------------------------------------------------------------------

/// The `gsave`/`grestore` stack. The bottom state is permanent.
#[derive(Debug)]
pub struct GstateStack {
    states: Vec<GraphicsState>,
}

impl GstateStack {
    #[must_use]
    pub fn new(initial: GraphicsState) -> Self {
        Self {
            states: vec![initial],
        }
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn current(&self) -> &GraphicsState {
        &self.states[self.states.len() - 1]
    }

    pub fn current_mut(&mut self) -> &mut GraphicsState {
        let top = self.states.len() - 1;
        &mut self.states[top]
    }

    pub fn gsave(&mut self) {
        self.states.push(self.current().clone());
    }

    /// Restore the previous state. On the bottom state this is a no-op.
    pub fn grestore(&mut self) {
        if self.states.len() > 1 {
            self.states.pop();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
