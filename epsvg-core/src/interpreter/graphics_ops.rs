//! Graphics state, path construction, and painting operators.

use epsvg_graphics::color::{Color, ColorSpace, IndexedSpace};
use epsvg_graphics::matrix::Matrix;
use epsvg_graphics::shading::{ColorRamp, RadialShading};
use epsvg_graphics::types::{DashPattern, LineCap, LineJoin, Scalar};
use kurbo::Point;

use crate::error::{ErrorKind, PsError, PsResult};
use crate::object::{ArrayObj, DictObj, Object, OpFn, Value};

use super::{fill_matrix, top_is_array, Interpreter};

pub(super) const OPERATORS: &[(&str, OpFn)] = &[
    // path construction
    ("newpath", newpath),
    ("moveto", moveto),
    ("rmoveto", rmoveto),
    ("lineto", lineto),
    ("rlineto", rlineto),
    ("curveto", curveto),
    ("rcurveto", rcurveto),
    ("closepath", closepath),
    ("currentpoint", currentpoint),
    ("clippath", clippath),
    ("pathbbox", pathbbox),
    ("flattenpath", flattenpath),
    // painting
    ("fill", fill),
    ("eofill", eofill),
    ("stroke", stroke),
    ("shfill", shfill),
    ("showpage", showpage),
    ("erasepage", erasepage),
    ("copypage", copypage),
    ("rectfill", rectfill),
    ("rectstroke", rectstroke),
    ("rectclip", rectclip),
    // clipping
    ("clip", clip),
    ("eoclip", eoclip),
    ("initclip", initclip),
    // state
    ("gsave", gsave),
    ("grestore", grestore),
    ("grestoreall", grestoreall),
    ("initgraphics", initgraphics),
    // transformations
    ("translate", translate),
    ("scale", scale),
    ("rotate", rotate),
    ("concat", concat),
    ("concatmatrix", concatmatrix),
    ("matrix", matrix),
    ("currentmatrix", currentmatrix),
    ("defaultmatrix", defaultmatrix),
    ("initmatrix", initmatrix),
    ("invertmatrix", invertmatrix),
    ("transform", transform),
    ("itransform", itransform),
    ("dtransform", dtransform),
    ("idtransform", idtransform),
    // attributes
    ("setlinewidth", setlinewidth),
    ("currentlinewidth", currentlinewidth),
    ("setlinecap", setlinecap),
    ("currentlinecap", currentlinecap),
    ("setlinejoin", setlinejoin),
    ("currentlinejoin", currentlinejoin),
    ("setmiterlimit", setmiterlimit),
    ("currentmiterlimit", currentmiterlimit),
    ("setdash", setdash),
    ("currentdash", currentdash),
    ("setflat", setflat),
    ("currentflat", currentflat),
    // color
    ("setgray", setgray),
    ("currentgray", currentgray),
    ("setrgbcolor", setrgbcolor),
    ("currentrgbcolor", currentrgbcolor),
    ("sethsbcolor", sethsbcolor),
    ("currenthsbcolor", currenthsbcolor),
    ("setcmykcolor", setcmykcolor),
    ("currentcmykcolor", currentcmykcolor),
    ("setcolor", setcolor),
    ("currentcolor", currentcolor),
    ("setcolorspace", setcolorspace),
    ("currentcolorspace", currentcolorspace),
];

/// Curve subdivision used by `flattenpath`.
const FLATTEN_STEPS: usize = 16;

// ---------------------------------------------------------------------------
// Path construction
// ---------------------------------------------------------------------------

fn newpath(interp: &mut Interpreter) -> PsResult<()> {
    interp.gs_mut().newpath();
    Ok(())
}

fn moveto(interp: &mut Interpreter) -> PsResult<()> {
    let (x, y) = interp.op_stack.pop_xy()?;
    interp.gs_mut().moveto(x, y);
    Ok(())
}

fn rmoveto(interp: &mut Interpreter) -> PsResult<()> {
    let (dx, dy) = interp.op_stack.pop_xy()?;
    let current = interp.gs().current_point()?;
    interp.gs_mut().moveto(current.x + dx, current.y + dy);
    Ok(())
}

fn lineto(interp: &mut Interpreter) -> PsResult<()> {
    let (x, y) = interp.op_stack.pop_xy()?;
    interp.gs_mut().lineto(x, y)
}

fn rlineto(interp: &mut Interpreter) -> PsResult<()> {
    let (dx, dy) = interp.op_stack.pop_xy()?;
    let current = interp.gs().current_point()?;
    interp.gs_mut().lineto(current.x + dx, current.y + dy)
}

fn curveto(interp: &mut Interpreter) -> PsResult<()> {
    let end = interp.op_stack.pop_xy()?;
    let c2 = interp.op_stack.pop_xy()?;
    let c1 = interp.op_stack.pop_xy()?;
    interp.gs_mut().curveto(c1, c2, end)
}

fn rcurveto(interp: &mut Interpreter) -> PsResult<()> {
    let end = interp.op_stack.pop_xy()?;
    let c2 = interp.op_stack.pop_xy()?;
    let c1 = interp.op_stack.pop_xy()?;
    let p = interp.gs().current_point()?;
    interp.gs_mut().curveto(
        (p.x + c1.0, p.y + c1.1),
        (p.x + c2.0, p.y + c2.1),
        (p.x + end.0, p.y + end.1),
    )
}

fn closepath(interp: &mut Interpreter) -> PsResult<()> {
    interp.gs_mut().closepath();
    Ok(())
}

fn currentpoint(interp: &mut Interpreter) -> PsResult<()> {
    let p = interp.gs().current_point()?;
    interp.op_stack.push(Object::real(p.x));
    interp.op_stack.push(Object::real(p.y));
    Ok(())
}

/// `clippath` installs the clip path as the current path.
fn clippath(interp: &mut Interpreter) -> PsResult<()> {
    let gs = interp.gs_mut();
    gs.path = gs.clip_path.clone();
    gs.position = gs.path.current_device_point();
    Ok(())
}

fn pathbbox(interp: &mut Interpreter) -> PsResult<()> {
    let (llx, lly, urx, ury) = interp.gs().pathbbox()?;
    interp.op_stack.push(Object::real(llx));
    interp.op_stack.push(Object::real(lly));
    interp.op_stack.push(Object::real(urx));
    interp.op_stack.push(Object::real(ury));
    Ok(())
}

fn flattenpath(interp: &mut Interpreter) -> PsResult<()> {
    let gs = interp.gs_mut();
    gs.path = gs.path.flattened(FLATTEN_STEPS);
    Ok(())
}

// ---------------------------------------------------------------------------
// Painting
// ---------------------------------------------------------------------------

fn fill(interp: &mut Interpreter) -> PsResult<()> {
    let gs = interp.gstates.current().clone();
    interp.device.fill(&gs)?;
    interp.gs_mut().newpath();
    Ok(())
}

fn eofill(interp: &mut Interpreter) -> PsResult<()> {
    let gs = interp.gstates.current().clone();
    interp.device.eofill(&gs)?;
    interp.gs_mut().newpath();
    Ok(())
}

fn stroke(interp: &mut Interpreter) -> PsResult<()> {
    let gs = interp.gstates.current().clone();
    interp.device.stroke(&gs)?;
    interp.gs_mut().newpath();
    Ok(())
}

/// `showpage` is meaningless for a single-figure vector backend, as are
/// `erasepage` and `copypage`.
fn showpage(_interp: &mut Interpreter) -> PsResult<()> {
    Ok(())
}

fn erasepage(_interp: &mut Interpreter) -> PsResult<()> {
    Ok(())
}

fn copypage(_interp: &mut Interpreter) -> PsResult<()> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Clipping
// ---------------------------------------------------------------------------

fn clip(interp: &mut Interpreter) -> PsResult<()> {
    // Intersection is not supported; the new path replaces the old clip
    log::warn!("clip: replacing the clip path instead of intersecting");
    let path = interp.gs().path.clone();
    interp.device.clip(&path)?;
    interp.gs_mut().clip_path = path;
    Ok(())
}

fn eoclip(interp: &mut Interpreter) -> PsResult<()> {
    log::warn!("eoclip: replacing the clip path instead of intersecting");
    let path = interp.gs().path.clone();
    interp.device.eoclip(&path)?;
    interp.gs_mut().clip_path = path;
    Ok(())
}

fn initclip(_interp: &mut Interpreter) -> PsResult<()> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Rectangles
// ---------------------------------------------------------------------------

/// Pop rectangle operands: either `x y w h` or an array holding a
/// multiple of four numbers.
fn pop_rects(interp: &mut Interpreter) -> PsResult<Vec<(Scalar, Scalar, Scalar, Scalar)>> {
    if top_is_array(interp) {
        let arr = interp.op_stack.pop_array()?;
        let numbers: PsResult<Vec<Scalar>> =
            arr.snapshot().iter().map(Object::to_real).collect();
        let numbers = numbers?;
        if numbers.len() % 4 != 0 {
            return Err(PsError::new(
                ErrorKind::RangeCheck,
                "rectangle array length must be a multiple of four",
            ));
        }
        Ok(numbers
            .chunks_exact(4)
            .map(|q| (q[0], q[1], q[2], q[3]))
            .collect())
    } else {
        let h = interp.op_stack.pop_real()?;
        let w = interp.op_stack.pop_real()?;
        let (x, y) = interp.op_stack.pop_xy()?;
        Ok(vec![(x, y, w, h)])
    }
}

/// Build the rectangles as a standalone path, leaving the current path
/// untouched, and hand it to `paint`.
fn with_rect_path(
    interp: &mut Interpreter,
    paint: fn(&mut Interpreter) -> PsResult<()>,
) -> PsResult<()> {
    let rects = pop_rects(interp)?;
    let saved_path = interp.gs().path.clone();
    let saved_position = interp.gs().position;
    interp.gs_mut().newpath();
    for (x, y, w, h) in rects {
        let gs = interp.gs_mut();
        gs.moveto(x, y);
        gs.lineto(x + w, y)?;
        gs.lineto(x + w, y + h)?;
        gs.lineto(x, y + h)?;
        gs.closepath();
    }
    let result = paint(interp);
    let gs = interp.gs_mut();
    gs.path = saved_path;
    gs.position = saved_position;
    result
}

fn rectfill(interp: &mut Interpreter) -> PsResult<()> {
    with_rect_path(interp, |interp| {
        let gs = interp.gstates.current().clone();
        interp.device.fill(&gs)
    })
}

fn rectstroke(interp: &mut Interpreter) -> PsResult<()> {
    with_rect_path(interp, |interp| {
        let gs = interp.gstates.current().clone();
        interp.device.stroke(&gs)
    })
}

fn rectclip(interp: &mut Interpreter) -> PsResult<()> {
    let rects = pop_rects(interp)?;
    interp.gs_mut().newpath();
    for (x, y, w, h) in rects {
        let gs = interp.gs_mut();
        gs.moveto(x, y);
        gs.lineto(x + w, y)?;
        gs.lineto(x + w, y + h)?;
        gs.lineto(x, y + h)?;
        gs.closepath();
    }
    log::warn!("rectclip: replacing the clip path instead of intersecting");
    let path = interp.gs().path.clone();
    interp.device.clip(&path)?;
    let gs = interp.gs_mut();
    gs.clip_path = path;
    gs.newpath();
    Ok(())
}

// ---------------------------------------------------------------------------
// Graphics state
// ---------------------------------------------------------------------------

fn gsave(interp: &mut Interpreter) -> PsResult<()> {
    interp.gstates.gsave();
    interp.device.start_scope()
}

fn grestore(interp: &mut Interpreter) -> PsResult<()> {
    if interp.gstates.depth() > 1 {
        interp.gstates.grestore();
        interp.device.end_scope()?;
    }
    Ok(())
}

fn grestoreall(interp: &mut Interpreter) -> PsResult<()> {
    while interp.gstates.depth() > 1 {
        interp.gstates.grestore();
        interp.device.end_scope()?;
    }
    Ok(())
}

fn initgraphics(interp: &mut Interpreter) -> PsResult<()> {
    let default_ctm = interp.gs().default_ctm;
    let fresh = crate::gstate::GraphicsState::new(default_ctm);
    let gs = interp.gs_mut();
    let clip = gs.clip_path.clone();
    *gs = fresh;
    gs.clip_path = clip;
    interp.device.set_color(&Color::BLACK)?;
    interp.device.set_line_cap(LineCap::Butt)?;
    interp.device.set_line_join(LineJoin::Miter)?;
    interp.device.set_miter_limit(10.0)
}

// ---------------------------------------------------------------------------
// Transformations
// ---------------------------------------------------------------------------

fn translate(interp: &mut Interpreter) -> PsResult<()> {
    if top_is_array(interp) {
        let arr = interp.op_stack.pop_array()?;
        let (x, y) = interp.op_stack.pop_xy()?;
        let result = fill_matrix(&arr, &Matrix::translation(x, y))?;
        interp.op_stack.push(result);
    } else {
        let (x, y) = interp.op_stack.pop_xy()?;
        let gs = interp.gs_mut();
        gs.ctm = gs.ctm.prepend(&Matrix::translation(x, y));
    }
    Ok(())
}

fn scale(interp: &mut Interpreter) -> PsResult<()> {
    if top_is_array(interp) {
        let arr = interp.op_stack.pop_array()?;
        let (x, y) = interp.op_stack.pop_xy()?;
        let result = fill_matrix(&arr, &Matrix::scaling(x, y))?;
        interp.op_stack.push(result);
    } else {
        let (x, y) = interp.op_stack.pop_xy()?;
        let gs = interp.gs_mut();
        gs.ctm = gs.ctm.prepend(&Matrix::scaling(x, y));
    }
    Ok(())
}

fn rotate(interp: &mut Interpreter) -> PsResult<()> {
    if top_is_array(interp) {
        let arr = interp.op_stack.pop_array()?;
        let degrees = interp.op_stack.pop_real()?;
        let result = fill_matrix(&arr, &Matrix::rotation(degrees))?;
        interp.op_stack.push(result);
    } else {
        let degrees = interp.op_stack.pop_real()?;
        let gs = interp.gs_mut();
        gs.ctm = gs.ctm.prepend(&Matrix::rotation(degrees));
    }
    Ok(())
}

fn concat(interp: &mut Interpreter) -> PsResult<()> {
    let m = interp.op_stack.pop_matrix()?;
    let gs = interp.gs_mut();
    gs.ctm = gs.ctm.prepend(&m);
    Ok(())
}

fn concatmatrix(interp: &mut Interpreter) -> PsResult<()> {
    let target = interp.op_stack.pop_array()?;
    let m2 = interp.op_stack.pop_matrix()?;
    let m1 = interp.op_stack.pop_matrix()?;
    let result = fill_matrix(&target, &m2.prepend(&m1))?;
    interp.op_stack.push(result);
    Ok(())
}

fn matrix(interp: &mut Interpreter) -> PsResult<()> {
    interp.op_stack.push(Object::from_matrix(&Matrix::IDENTITY));
    Ok(())
}

fn currentmatrix(interp: &mut Interpreter) -> PsResult<()> {
    let target = interp.op_stack.pop_array()?;
    let ctm = interp.gs().ctm;
    let result = fill_matrix(&target, &ctm)?;
    interp.op_stack.push(result);
    Ok(())
}

fn defaultmatrix(interp: &mut Interpreter) -> PsResult<()> {
    let target = interp.op_stack.pop_array()?;
    let m = interp.gs().default_ctm;
    let result = fill_matrix(&target, &m)?;
    interp.op_stack.push(result);
    Ok(())
}

fn initmatrix(interp: &mut Interpreter) -> PsResult<()> {
    let gs = interp.gs_mut();
    gs.ctm = gs.default_ctm;
    Ok(())
}

fn invertmatrix(interp: &mut Interpreter) -> PsResult<()> {
    let target = interp.op_stack.pop_array()?;
    let m = interp.op_stack.pop_matrix()?;
    let result = fill_matrix(&target, &m.inverse()?)?;
    interp.op_stack.push(result);
    Ok(())
}

/// Pop the optional matrix operand of the `transform` family, falling
/// back to the CTM.
fn pop_optional_matrix(interp: &mut Interpreter) -> PsResult<Matrix> {
    if top_is_array(interp) {
        interp.op_stack.pop_matrix()
    } else {
        Ok(interp.gs().ctm)
    }
}

fn transform(interp: &mut Interpreter) -> PsResult<()> {
    let m = pop_optional_matrix(interp)?;
    let (x, y) = interp.op_stack.pop_xy()?;
    let p = m.apply(Point::new(x, y));
    interp.op_stack.push(Object::real(p.x));
    interp.op_stack.push(Object::real(p.y));
    Ok(())
}

fn itransform(interp: &mut Interpreter) -> PsResult<()> {
    let m = pop_optional_matrix(interp)?;
    let (x, y) = interp.op_stack.pop_xy()?;
    let p = m.inverse_apply(Point::new(x, y))?;
    interp.op_stack.push(Object::real(p.x));
    interp.op_stack.push(Object::real(p.y));
    Ok(())
}

fn dtransform(interp: &mut Interpreter) -> PsResult<()> {
    let m = pop_optional_matrix(interp)?;
    let (x, y) = interp.op_stack.pop_xy()?;
    let p = m.apply_distance(Point::new(x, y));
    interp.op_stack.push(Object::real(p.x));
    interp.op_stack.push(Object::real(p.y));
    Ok(())
}

fn idtransform(interp: &mut Interpreter) -> PsResult<()> {
    let m = pop_optional_matrix(interp)?;
    let (x, y) = interp.op_stack.pop_xy()?;
    let p = m.inverse_apply_distance(Point::new(x, y))?;
    interp.op_stack.push(Object::real(p.x));
    interp.op_stack.push(Object::real(p.y));
    Ok(())
}

// ---------------------------------------------------------------------------
// Line attributes
// ---------------------------------------------------------------------------

fn setlinewidth(interp: &mut Interpreter) -> PsResult<()> {
    let width = interp.op_stack.pop_real()?;
    interp.gs_mut().line_width = width.abs();
    Ok(())
}

fn currentlinewidth(interp: &mut Interpreter) -> PsResult<()> {
    let width = interp.gs().line_width;
    interp.op_stack.push(Object::real(width));
    Ok(())
}

fn setlinecap(interp: &mut Interpreter) -> PsResult<()> {
    let code = interp.op_stack.pop_int()?;
    let cap = LineCap::from_code(code)
        .ok_or_else(|| PsError::new(ErrorKind::RangeCheck, "line cap out of range"))?;
    interp.gs_mut().line_cap = cap;
    interp.device.set_line_cap(cap)
}

fn currentlinecap(interp: &mut Interpreter) -> PsResult<()> {
    let cap = interp.gs().line_cap;
    interp.op_stack.push(Object::integer(cap as i32));
    Ok(())
}

fn setlinejoin(interp: &mut Interpreter) -> PsResult<()> {
    let code = interp.op_stack.pop_int()?;
    let join = LineJoin::from_code(code)
        .ok_or_else(|| PsError::new(ErrorKind::RangeCheck, "line join out of range"))?;
    interp.gs_mut().line_join = join;
    interp.device.set_line_join(join)
}

fn currentlinejoin(interp: &mut Interpreter) -> PsResult<()> {
    let join = interp.gs().line_join;
    interp.op_stack.push(Object::integer(join as i32));
    Ok(())
}

fn setmiterlimit(interp: &mut Interpreter) -> PsResult<()> {
    let limit = interp.op_stack.pop_real()?;
    if limit < 1.0 {
        return Err(PsError::new(ErrorKind::RangeCheck, "miter limit below 1"));
    }
    interp.gs_mut().miter_limit = limit;
    interp.device.set_miter_limit(limit)
}

fn currentmiterlimit(interp: &mut Interpreter) -> PsResult<()> {
    let limit = interp.gs().miter_limit;
    interp.op_stack.push(Object::real(limit));
    Ok(())
}

fn setdash(interp: &mut Interpreter) -> PsResult<()> {
    let offset = interp.op_stack.pop_real()?;
    let arr = interp.op_stack.pop_array()?;
    let dashes: PsResult<Vec<Scalar>> = arr.snapshot().iter().map(Object::to_real).collect();
    let dashes = dashes?;
    if dashes.iter().any(|&d| d < 0.0) {
        return Err(PsError::new(ErrorKind::RangeCheck, "negative dash length"));
    }
    if !dashes.is_empty() && dashes.iter().all(|&d| d == 0.0) {
        return Err(PsError::new(ErrorKind::RangeCheck, "all-zero dash pattern"));
    }
    interp.gs_mut().dash = DashPattern { dashes, offset };
    Ok(())
}

fn currentdash(interp: &mut Interpreter) -> PsResult<()> {
    let dash = interp.gs().dash.clone();
    let arr = ArrayObj::from_objects(dash.dashes.iter().map(|&d| Object::real(d)).collect());
    interp.op_stack.push(Object::array(arr));
    interp.op_stack.push(Object::real(dash.offset));
    Ok(())
}

fn setflat(interp: &mut Interpreter) -> PsResult<()> {
    let flatness = interp.op_stack.pop_real()?;
    interp.gs_mut().flatness = flatness.clamp(0.2, 100.0);
    Ok(())
}

fn currentflat(interp: &mut Interpreter) -> PsResult<()> {
    let flatness = interp.gs().flatness;
    interp.op_stack.push(Object::real(flatness));
    Ok(())
}

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

fn apply_color(interp: &mut Interpreter, space: ColorSpace, color: Color) -> PsResult<()> {
    let gs = interp.gs_mut();
    gs.color_space = space;
    gs.color = color;
    let color = interp.gs().color.clone();
    interp.device.set_color(&color)
}

fn setgray(interp: &mut Interpreter) -> PsResult<()> {
    let g = interp.op_stack.pop_real()?;
    apply_color(interp, ColorSpace::DeviceGray, Color::gray(g))
}

fn currentgray(interp: &mut Interpreter) -> PsResult<()> {
    let g = interp.gs().color.to_gray();
    interp.op_stack.push(Object::real(g));
    Ok(())
}

fn setrgbcolor(interp: &mut Interpreter) -> PsResult<()> {
    let b = interp.op_stack.pop_real()?;
    let g = interp.op_stack.pop_real()?;
    let r = interp.op_stack.pop_real()?;
    apply_color(interp, ColorSpace::DeviceRgb, Color::rgb(r, g, b))
}

fn currentrgbcolor(interp: &mut Interpreter) -> PsResult<()> {
    let [r, g, b] = interp.gs().color.to_rgb();
    interp.op_stack.push(Object::real(r));
    interp.op_stack.push(Object::real(g));
    interp.op_stack.push(Object::real(b));
    Ok(())
}

fn sethsbcolor(interp: &mut Interpreter) -> PsResult<()> {
    let b = interp.op_stack.pop_real()?;
    let s = interp.op_stack.pop_real()?;
    let h = interp.op_stack.pop_real()?;
    apply_color(interp, ColorSpace::DeviceRgb, Color::hsb(h, s, b))
}

fn currenthsbcolor(interp: &mut Interpreter) -> PsResult<()> {
    let [r, g, b] = interp.gs().color.to_rgb();
    let (h, s, v) = rgb_to_hsb(r, g, b);
    interp.op_stack.push(Object::real(h));
    interp.op_stack.push(Object::real(s));
    interp.op_stack.push(Object::real(v));
    Ok(())
}

fn setcmykcolor(interp: &mut Interpreter) -> PsResult<()> {
    let k = interp.op_stack.pop_real()?;
    let y = interp.op_stack.pop_real()?;
    let m = interp.op_stack.pop_real()?;
    let c = interp.op_stack.pop_real()?;
    apply_color(interp, ColorSpace::DeviceCmyk, Color::cmyk(c, m, y, k))
}

fn currentcmykcolor(interp: &mut Interpreter) -> PsResult<()> {
    let color = interp.gs().color.clone();
    let (c, m, y, k) = match color {
        Color::Cmyk(c, m, y, k) => (c, m, y, k),
        other => {
            let [r, g, b] = other.to_rgb();
            let k = 1.0 - r.max(g).max(b);
            if k >= 1.0 {
                (0.0, 0.0, 0.0, 1.0)
            } else {
                (
                    (1.0 - r - k) / (1.0 - k),
                    (1.0 - g - k) / (1.0 - k),
                    (1.0 - b - k) / (1.0 - k),
                    k,
                )
            }
        }
    };
    interp.op_stack.push(Object::real(c));
    interp.op_stack.push(Object::real(m));
    interp.op_stack.push(Object::real(y));
    interp.op_stack.push(Object::real(k));
    Ok(())
}

/// `setcolor` interprets its operands in the current color space; an
/// indexed space takes a single index.
fn setcolor(interp: &mut Interpreter) -> PsResult<()> {
    let space = interp.gs().color_space.clone();
    let color = match &space {
        ColorSpace::Indexed(indexed) => {
            let index = interp.op_stack.pop_int()?;
            indexed.resolve(index)?
        }
        _ => {
            let n = space.num_components();
            let mut components = vec![0.0; n];
            for slot in components.iter_mut().rev() {
                *slot = interp.op_stack.pop_real()?;
            }
            space.resolve(&components)?
        }
    };
    let gs = interp.gs_mut();
    gs.color = color.clone();
    interp.device.set_color(&color)
}

fn currentcolor(interp: &mut Interpreter) -> PsResult<()> {
    let color = interp.gs().color.clone();
    match color {
        Color::Gray(g) => interp.op_stack.push(Object::real(g)),
        Color::Rgb(r, g, b) => {
            interp.op_stack.push(Object::real(r));
            interp.op_stack.push(Object::real(g));
            interp.op_stack.push(Object::real(b));
        }
        Color::Cmyk(c, m, y, k) => {
            interp.op_stack.push(Object::real(c));
            interp.op_stack.push(Object::real(m));
            interp.op_stack.push(Object::real(y));
            interp.op_stack.push(Object::real(k));
        }
    }
    Ok(())
}

fn setcolorspace(interp: &mut Interpreter) -> PsResult<()> {
    let obj = interp.op_stack.pop()?;
    let space = parse_colorspace(&obj)?;
    let initial = initial_color(&space)?;
    apply_color(interp, space, initial)
}

fn currentcolorspace(interp: &mut Interpreter) -> PsResult<()> {
    let name = interp.gs().color_space.family_name();
    let arr = ArrayObj::from_objects(vec![Object::literal_name(name)]);
    interp.op_stack.push(Object::array(arr));
    Ok(())
}

/// Parse a color space operand: a family name, `[/Family]`, or
/// `[/Indexed base hival lookup]`.
pub(super) fn parse_colorspace(obj: &Object) -> PsResult<ColorSpace> {
    match &obj.value {
        Value::Name(name) => family_space(name),
        Value::Array(arr) => {
            obj.check_read()?;
            if arr.is_empty() {
                return Err(PsError::new(ErrorKind::RangeCheck, "empty color space array"));
            }
            let family = arr.get(0)?;
            let family = family.to_name_text()?.to_string();
            if family == "Indexed" {
                if arr.len() != 4 {
                    return Err(PsError::new(
                        ErrorKind::RangeCheck,
                        "indexed color space needs base, hival, and lookup",
                    ));
                }
                let base = parse_colorspace(&arr.get(1)?)?;
                let hival = arr.get(2)?.to_int()?;
                let lookup = arr.get(3)?;
                let table = match &lookup.value {
                    Value::String(s) => {
                        lookup.check_read()?;
                        s.bytes()
                    }
                    _ => {
                        return Err(PsError::new(
                            ErrorKind::Unimplemented,
                            "indexed lookup must be a string",
                        ))
                    }
                };
                Ok(ColorSpace::Indexed(IndexedSpace::new(base, hival, table)?))
            } else {
                family_space(&family)
            }
        }
        _ => Err(PsError::new(
            ErrorKind::TypeCheck,
            format!("{} is not a color space", obj.type_name()),
        )),
    }
}

fn family_space(name: &str) -> PsResult<ColorSpace> {
    match name {
        "DeviceGray" => Ok(ColorSpace::DeviceGray),
        "DeviceRGB" => Ok(ColorSpace::DeviceRgb),
        "DeviceCMYK" => Ok(ColorSpace::DeviceCmyk),
        other => Err(PsError::new(
            ErrorKind::Unimplemented,
            format!("color space {other}"),
        )),
    }
}

/// The color a space starts in after `setcolorspace`.
fn initial_color(space: &ColorSpace) -> PsResult<Color> {
    Ok(match space {
        ColorSpace::DeviceGray => Color::gray(0.0),
        ColorSpace::DeviceRgb => Color::rgb(0.0, 0.0, 0.0),
        ColorSpace::DeviceCmyk => Color::cmyk(0.0, 0.0, 0.0, 1.0),
        ColorSpace::Indexed(indexed) => indexed.resolve(0)?,
    })
}

fn rgb_to_hsb(r: Scalar, g: Scalar, b: Scalar) -> (Scalar, Scalar, Scalar) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    let v = max;
    let s = if max > 0.0 { delta / max } else { 0.0 };
    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        (((g - b) / delta).rem_euclid(6.0)) / 6.0
    } else if max == g {
        ((b - r) / delta + 2.0) / 6.0
    } else {
        ((r - g) / delta + 4.0) / 6.0
    };
    (h, s, v)
}

// ---------------------------------------------------------------------------
// Shading
// ---------------------------------------------------------------------------

fn dict_entry(dict: &DictObj, key: &str) -> PsResult<Object> {
    dict.get(key)
        .ok_or_else(|| PsError::new(ErrorKind::RangeCheck, format!("shading has no {key}")))
}

fn numbers_from(obj: &Object) -> PsResult<Vec<Scalar>> {
    obj.to_array()?
        .snapshot()
        .iter()
        .map(Object::to_real)
        .collect()
}

/// `shfill` paints a type 3 (radial) shading through the device.
fn shfill(interp: &mut Interpreter) -> PsResult<()> {
    let dict = interp.op_stack.pop_dict()?;
    let shading_type = dict_entry(&dict, "ShadingType")?.to_int()?;
    if shading_type != 3 {
        return Err(PsError::new(
            ErrorKind::Unimplemented,
            format!("shading type {shading_type}"),
        ));
    }
    let space = parse_colorspace(&dict_entry(&dict, "ColorSpace")?)?;
    let coords = numbers_from(&dict_entry(&dict, "Coords")?)?;
    if coords.len() != 6 {
        return Err(PsError::new(
            ErrorKind::RangeCheck,
            "radial shading needs six coordinates",
        ));
    }
    let function = dict_entry(&dict, "Function")?.to_dict()?;
    let ramp = parse_function(&function, &space)?;
    let (extend_start, extend_end) = match dict.get("Extend") {
        Some(obj) => {
            let arr = obj.to_array()?;
            (arr.get(0)?.to_bool()?, arr.get(1)?.to_bool()?)
        }
        None => (false, false),
    };

    // Coordinates are in user space; carry them into device space
    let ctm = interp.gs().ctm;
    let scaling = ctm.mean_scaling();
    let shading = RadialShading {
        start: ctm.apply(Point::new(coords[0], coords[1])),
        r_start: coords[2] * scaling,
        end: ctm.apply(Point::new(coords[3], coords[4])),
        r_end: coords[5] * scaling,
        extend_start,
        extend_end,
        ramp,
    };
    let gs = interp.gstates.current().clone();
    interp.device.shade(&shading, &gs)?;
    interp.gs_mut().newpath();
    Ok(())
}

/// Turn a PostScript function dictionary into a [`ColorRamp`]. Types 2
/// (exponential) and 3 (stitching) are supported.
fn parse_function(dict: &DictObj, space: &ColorSpace) -> PsResult<ColorRamp> {
    let function_type = dict_entry(dict, "FunctionType")?.to_int()?;
    match function_type {
        2 => {
            let c0 = match dict.get("C0") {
                Some(obj) => numbers_from(&obj)?,
                None => vec![0.0; space.num_components()],
            };
            let c1 = match dict.get("C1") {
                Some(obj) => numbers_from(&obj)?,
                None => vec![1.0; space.num_components()],
            };
            let n = match dict.get("N") {
                Some(obj) => obj.to_real()?,
                None => 1.0,
            };
            Ok(ColorRamp::Exponential {
                c0: space.resolve(&c0)?.to_rgb(),
                c1: space.resolve(&c1)?.to_rgb(),
                n,
            })
        }
        3 => {
            let functions = dict_entry(dict, "Functions")?.to_array()?;
            let ramps: PsResult<Vec<ColorRamp>> = functions
                .snapshot()
                .iter()
                .map(|f| parse_function(&f.to_dict()?, space))
                .collect();
            let bounds = numbers_from(&dict_entry(dict, "Bounds")?)?;
            let encode_raw = numbers_from(&dict_entry(dict, "Encode")?)?;
            let encode = encode_raw.chunks_exact(2).map(|e| (e[0], e[1])).collect();
            Ok(ColorRamp::Stitched {
                bounds,
                encode,
                functions: ramps?,
            })
        }
        other => Err(PsError::new(
            ErrorKind::Unimplemented,
            format!("function type {other}"),
        )),
    }
}
