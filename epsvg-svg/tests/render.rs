//! End-to-end tests: PostScript source in, SVG markup out.

use epsvg_core::interpreter::Interpreter;
use epsvg_svg::{render, render_with_options, SvgDevice, SvgOptions};

fn svg(source: &str) -> String {
    render(source).unwrap().to_string()
}

#[test]
fn filled_triangle() {
    let out = svg("newpath 0 0 moveto 72 0 lineto 36 72 lineto closepath fill showpage");
    assert!(out.contains("<path"), "{out}");
    assert!(out.contains("fill=\"black\""), "{out}");
    assert!(out.contains('Z'), "{out}");
}

#[test]
fn y_axis_points_down_in_output() {
    let out = svg("0 72 moveto 72 72 lineto stroke");
    assert!(out.contains("-72.000"), "{out}");
    assert!(!out.contains("L72.000,72.000"), "{out}");
}

#[test]
fn rgb_color_reaches_output() {
    let out = svg("1 0 0 setrgbcolor 0 0 72 72 rectfill");
    assert!(out.contains("fill=\"#ff0000\""), "{out}");
}

#[test]
fn cmyk_color_converts_to_rgb() {
    let out = svg("1 0 0 0 setcmykcolor 0 0 10 10 rectfill");
    assert!(out.contains("fill=\"#00ffff\""), "{out}");
}

#[test]
fn dashed_stroke_carries_pattern() {
    let out = svg("[3 1] 0 setdash 2 setlinewidth 1 setlinecap 0 0 moveto 72 0 lineto stroke");
    assert!(out.contains("stroke-dasharray=\"3.000,1.000\""), "{out}");
    assert!(out.contains("stroke-width=\"2\""), "{out}");
    assert!(out.contains("stroke-linecap=\"round\""), "{out}");
}

#[test]
fn scaled_stroke_width_in_device_units() {
    // 2 setlinewidth under 2x scale strokes 4 points wide
    let out = svg("2 2 scale 2 setlinewidth 0 0 moveto 10 0 lineto stroke");
    assert!(out.contains("stroke-width=\"4\""), "{out}");
}

#[test]
fn rectclip_clips_following_paint() {
    let out = svg("0 0 36 36 rectclip 0 0 72 72 rectfill");
    assert!(out.contains("<clipPath"), "{out}");
    assert!(out.contains("clip-path=\"url(#c0)\""), "{out}");
}

#[test]
fn gsave_opens_a_group() {
    let out = svg("gsave 0 0 72 72 rectfill grestore 0 0 moveto 10 0 lineto stroke");
    assert!(out.matches("<g").count() >= 2, "{out}");
}

#[test]
fn text_uses_current_font() {
    let out = svg("/Helvetica findfont 12 scalefont setfont 10 20 moveto (Hi) show");
    assert!(out.contains("<text"), "{out}");
    assert!(out.contains("Hi"), "{out}");
    assert!(out.contains("font-family=\"Helvetica, sans-serif\""), "{out}");
    assert!(out.contains("font-size=\"12\""), "{out}");
}

#[test]
fn rotated_text_gets_rotate_transform() {
    let out = svg(
        "/Times-Roman findfont 10 scalefont setfont 90 rotate 10 10 moveto (up) show",
    );
    assert!(out.contains("rotate(-90)"), "{out}");
}

#[test]
fn radial_shading_becomes_gradient() {
    let out = svg(concat!(
        "<< /ShadingType 3 /ColorSpace /DeviceRGB ",
        "/Coords [36 36 0 36 36 36] ",
        "/Function << /FunctionType 2 /Domain [0 1] /C0 [1 0 0] /C1 [0 0 1] /N 1 >> ",
        ">> shfill"
    ));
    assert!(out.contains("<radialGradient"), "{out}");
    assert!(out.contains("stop-color=\"#ff0000\""), "{out}");
    assert!(out.contains("stop-color=\"#0000ff\""), "{out}");
    assert!(out.contains("fill=\"url(#g0)\""), "{out}");
}

#[test]
fn margin_zero_gives_tight_viewbox() {
    let opts = SvgOptions {
        margin: 0.0,
        ..SvgOptions::default()
    };
    let out = render_with_options("0 0 72 72 rectfill", &opts)
        .unwrap()
        .to_string();
    assert!(out.contains("viewBox=\"0 -72 72 72\""), "{out}");
    assert!(out.contains("width=\"72pt\""), "{out}");
}

#[test]
fn failing_program_reports_error() {
    assert!(render("1 2 frobnicate").is_err());
}

#[test]
fn failing_program_still_yields_a_document() {
    let device = SvgDevice::new();
    let handle = device.output_handle();
    let mut interp = Interpreter::new(Box::new(device));
    let result = interp.run("0 0 moveto 72 0 lineto stroke frobnicate");
    assert!(result.is_err());
    // finish ran on the error path, so the partial output is well-formed
    let doc = handle.borrow();
    let out = doc.as_ref().unwrap().to_string();
    assert!(out.contains("<path"), "{out}");
    assert!(out.contains("</svg>"), "{out}");
}

#[test]
fn procedures_and_loops_paint() {
    let out = svg(
        "/box { newpath moveto 10 0 rlineto 0 10 rlineto -10 0 rlineto closepath fill } def \
         0 1 2 { 20 mul 0 box } for",
    );
    assert_eq!(out.matches("<path").count(), 3, "{out}");
}
