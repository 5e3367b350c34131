//! The device-space path model.
//!
//! A path is an ordered list of sections. All coordinates are device
//! space, with one exception: a `Moveto` also records the user-space
//! point it was issued with, because `closepath` must restore the
//! current point to the *user-space* start of the subpath (the CTM may
//! have changed since the subpath began).

use kurbo::Point;

// ---------------------------------------------------------------------------
// Path sections
// ---------------------------------------------------------------------------

/// One section of a path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSection {
    /// Start of a subpath. Records both coordinate spaces.
    Moveto {
        /// Position in device space.
        device: Point,
        /// Position in user space at the time of the moveto.
        user: Point,
    },
    /// Straight segment to a device-space point.
    Lineto(Point),
    /// Cubic segment with two control points and an endpoint.
    Curveto(Point, Point, Point),
    /// Close the current subpath back to its starting moveto.
    Closepath,
}

impl PathSection {
    /// The device-space endpoint of this section, if it has one.
    #[must_use]
    pub const fn device_end(&self) -> Option<Point> {
        match self {
            Self::Moveto { device, .. } => Some(*device),
            Self::Lineto(p) | Self::Curveto(_, _, p) => Some(*p),
            Self::Closepath => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Path
// ---------------------------------------------------------------------------

/// An ordered list of path sections.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    pub sections: Vec<PathSection>,
}

impl Path {
    /// Create an empty path.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sections: Vec::new(),
        }
    }

    /// Whether the path has no sections.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Start a new subpath.
    pub fn moveto(&mut self, device: Point, user: Point) {
        self.sections.push(PathSection::Moveto { device, user });
    }

    /// Append a straight segment.
    pub fn lineto(&mut self, device: Point) {
        self.sections.push(PathSection::Lineto(device));
    }

    /// Append a cubic segment.
    pub fn curveto(&mut self, c1: Point, c2: Point, end: Point) {
        self.sections.push(PathSection::Curveto(c1, c2, end));
    }

    /// Close the current subpath.
    ///
    /// Returns the *user-space* starting point of the subpath being
    /// closed, so the caller can issue the implicit moveto that makes it
    /// the new current point. On an empty path (or one whose last section
    /// is already a close) this is a no-op returning `None`.
    pub fn closepath(&mut self) -> Option<Point> {
        match self.sections.last() {
            None | Some(PathSection::Closepath) => return None,
            Some(_) => {}
        }
        let start = self.subpath_start_user();
        self.sections.push(PathSection::Closepath);
        start
    }

    /// The user-space start of the currently open subpath.
    #[must_use]
    pub fn subpath_start_user(&self) -> Option<Point> {
        for section in self.sections.iter().rev() {
            if let PathSection::Moveto { user, .. } = section {
                return Some(*user);
            }
        }
        None
    }

    /// The device-space start of the currently open subpath.
    #[must_use]
    pub fn subpath_start_device(&self) -> Option<Point> {
        for section in self.sections.iter().rev() {
            if let PathSection::Moveto { device, .. } = section {
                return Some(*device);
            }
        }
        None
    }

    /// The current device-space point: the endpoint of the last section,
    /// or the subpath start right after a close.
    #[must_use]
    pub fn current_device_point(&self) -> Option<Point> {
        match self.sections.last() {
            None => None,
            Some(PathSection::Closepath) => self.subpath_start_device(),
            Some(section) => section.device_end(),
        }
    }

    /// Replace every curve with a polyline approximation.
    ///
    /// Each cubic is sampled at `steps` uniform parameter values. The
    /// starting point of each cubic is taken from the preceding section.
    #[must_use]
    pub fn flattened(&self, steps: usize) -> Self {
        let mut out = Self::new();
        let mut current = Point::ZERO;
        for section in &self.sections {
            match *section {
                PathSection::Curveto(c1, c2, end) => {
                    for i in 1..=steps {
                        #[allow(clippy::cast_precision_loss)]
                        let t = i as f64 / steps as f64;
                        out.lineto(cubic_at(current, c1, c2, end, t));
                    }
                    current = end;
                }
                other => {
                    if let Some(p) = other.device_end() {
                        current = p;
                    }
                    out.sections.push(other);
                }
            }
        }
        out
    }

    /// Device-space bounding box over all section endpoints and control
    /// points, or `None` for an empty path.
    #[must_use]
    pub fn device_bounds(&self) -> Option<(Point, Point)> {
        let mut bounds: Option<(Point, Point)> = None;
        let mut include = |p: Point| {
            bounds = Some(match bounds {
                None => (p, p),
                Some((lo, hi)) => (
                    Point::new(lo.x.min(p.x), lo.y.min(p.y)),
                    Point::new(hi.x.max(p.x), hi.y.max(p.y)),
                ),
            });
        };
        for section in &self.sections {
            match *section {
                PathSection::Moveto { device, .. } => include(device),
                PathSection::Lineto(p) => include(p),
                PathSection::Curveto(c1, c2, end) => {
                    include(c1);
                    include(c2);
                    include(end);
                }
                PathSection::Closepath => {}
            }
        }
        bounds
    }
}

/// Evaluate a cubic Bezier at parameter `t`.
fn cubic_at(p0: Point, c1: Point, c2: Point, p3: Point, t: f64) -> Point {
    let u = 1.0 - t;
    let b0 = u * u * u;
    let b1 = 3.0 * u * u * t;
    let b2 = 3.0 * u * t * t;
    let b3 = t * t * t;
    Point::new(
        b0 * p0.x + b1 * c1.x + b2 * c2.x + b3 * p3.x,
        b0 * p0.y + b1 * c1.y + b2 * c2.y + b3 * p3.y,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn empty_path_has_no_current_point() {
        let path = Path::new();
        assert!(path.current_device_point().is_none());
        assert!(path.device_bounds().is_none());
    }

    #[test]
    fn current_point_tracks_last_section() {
        let mut path = Path::new();
        path.moveto(pt(1.0, 1.0), pt(1.0, 1.0));
        assert_eq!(path.current_device_point(), Some(pt(1.0, 1.0)));
        path.lineto(pt(4.0, 5.0));
        assert_eq!(path.current_device_point(), Some(pt(4.0, 5.0)));
        path.curveto(pt(5.0, 5.0), pt(6.0, 6.0), pt(7.0, 5.0));
        assert_eq!(path.current_device_point(), Some(pt(7.0, 5.0)));
    }

    #[test]
    fn closepath_returns_subpath_start() {
        let mut path = Path::new();
        path.moveto(pt(10.0, 20.0), pt(1.0, 2.0));
        path.lineto(pt(30.0, 20.0));
        let start = path.closepath();
        assert_eq!(start, Some(pt(1.0, 2.0)));
        assert_eq!(path.sections.last(), Some(&PathSection::Closepath));
        // After a close the current device point is the subpath start
        assert_eq!(path.current_device_point(), Some(pt(10.0, 20.0)));
    }

    #[test]
    fn closepath_on_empty_path_is_noop() {
        let mut path = Path::new();
        assert_eq!(path.closepath(), None);
        assert!(path.is_empty());
    }

    #[test]
    fn double_closepath_is_noop() {
        let mut path = Path::new();
        path.moveto(pt(0.0, 0.0), pt(0.0, 0.0));
        path.lineto(pt(1.0, 0.0));
        assert!(path.closepath().is_some());
        assert_eq!(path.closepath(), None);
        assert_eq!(path.sections.len(), 3);
    }

    #[test]
    fn closepath_uses_latest_subpath() {
        let mut path = Path::new();
        path.moveto(pt(0.0, 0.0), pt(0.0, 0.0));
        path.lineto(pt(1.0, 0.0));
        path.moveto(pt(5.0, 5.0), pt(0.5, 0.5));
        path.lineto(pt(6.0, 5.0));
        assert_eq!(path.closepath(), Some(pt(0.5, 0.5)));
    }

    #[test]
    fn flatten_replaces_curves() {
        let mut path = Path::new();
        path.moveto(pt(0.0, 0.0), pt(0.0, 0.0));
        path.curveto(pt(0.0, 1.0), pt(1.0, 1.0), pt(1.0, 0.0));
        let flat = path.flattened(4);
        assert_eq!(flat.sections.len(), 5);
        assert!(flat
            .sections
            .iter()
            .all(|s| !matches!(s, PathSection::Curveto(..))));
        // Endpoint is preserved exactly
        assert_eq!(flat.current_device_point(), Some(pt(1.0, 0.0)));
    }

    #[test]
    fn bounds_cover_control_points() {
        let mut path = Path::new();
        path.moveto(pt(0.0, 0.0), pt(0.0, 0.0));
        path.curveto(pt(-1.0, 2.0), pt(3.0, 2.0), pt(2.0, 0.0));
        let (lo, hi) = path.device_bounds().unwrap();
        assert_eq!(lo, pt(-1.0, 0.0));
        assert_eq!(hi, pt(3.0, 2.0));
    }
}
