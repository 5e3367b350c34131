use std::cell::RefCell;
use std::rc::Rc;

use epsvg_graphics::color::Color;
use epsvg_graphics::matrix::Matrix;
use epsvg_graphics::path::Path;
use epsvg_graphics::shading::RadialShading;
use epsvg_graphics::types::{LineCap, LineJoin, Scalar, DEVICE_UNITS_PER_POINT};
use kurbo::Point;

use crate::device::{NullDevice, OutputDevice, TextLabel};
use crate::error::{ErrorKind, PsResult};
use crate::gstate::GraphicsState;
use crate::object::{Object, Value};

use super::Interpreter;

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// A device that records the order of events it receives.
#[derive(Debug, Default)]
struct RecordingDevice {
    events: Rc<RefCell<Vec<String>>>,
}

impl RecordingDevice {
    fn new() -> (Self, Rc<RefCell<Vec<String>>>) {
        let events = Rc::new(RefCell::new(Vec::new()));
        (
            Self {
                events: events.clone(),
            },
            events,
        )
    }

    fn record(&self, event: impl Into<String>) {
        self.events.borrow_mut().push(event.into());
    }
}

impl OutputDevice for RecordingDevice {
    fn default_ctm(&self) -> Matrix {
        Matrix::scaling(DEVICE_UNITS_PER_POINT, DEVICE_UNITS_PER_POINT)
    }

    fn init(&mut self) -> PsResult<()> {
        self.record("init");
        Ok(())
    }

    fn finish(&mut self) -> PsResult<()> {
        self.record("finish");
        Ok(())
    }

    fn start_scope(&mut self) -> PsResult<()> {
        self.record("start_scope");
        Ok(())
    }

    fn end_scope(&mut self) -> PsResult<()> {
        self.record("end_scope");
        Ok(())
    }

    fn fill(&mut self, gs: &GraphicsState) -> PsResult<()> {
        self.record(format!("fill {} sections", gs.path.sections.len()));
        Ok(())
    }

    fn eofill(&mut self, _gs: &GraphicsState) -> PsResult<()> {
        self.record("eofill");
        Ok(())
    }

    fn stroke(&mut self, gs: &GraphicsState) -> PsResult<()> {
        self.record(format!("stroke {} sections", gs.path.sections.len()));
        Ok(())
    }

    fn clip(&mut self, _path: &Path) -> PsResult<()> {
        self.record("clip");
        Ok(())
    }

    fn eoclip(&mut self, _path: &Path) -> PsResult<()> {
        self.record("eoclip");
        Ok(())
    }

    fn shade(&mut self, shading: &RadialShading, _gs: &GraphicsState) -> PsResult<()> {
        self.record(format!(
            "shade extend {} {}",
            shading.extend_start, shading.extend_end
        ));
        Ok(())
    }

    fn set_color(&mut self, color: &Color) -> PsResult<()> {
        let [r, g, b] = color.to_rgb();
        self.record(format!("color {r} {g} {b}"));
        Ok(())
    }

    fn set_line_cap(&mut self, cap: LineCap) -> PsResult<()> {
        self.record(format!("cap {cap:?}"));
        Ok(())
    }

    fn set_line_join(&mut self, join: LineJoin) -> PsResult<()> {
        self.record(format!("join {join:?}"));
        Ok(())
    }

    fn set_miter_limit(&mut self, limit: Scalar) -> PsResult<()> {
        self.record(format!("miter {limit}"));
        Ok(())
    }

    fn show_text(&mut self, label: &TextLabel) -> PsResult<()> {
        self.record(format!("text '{}' {}pt", label.text, label.font_size));
        Ok(())
    }

    fn draw_dot(&mut self, _center: Point) -> PsResult<()> {
        self.record("dot");
        Ok(())
    }

    fn draw_rect(&mut self, _lower: Point, _upper: Point) -> PsResult<()> {
        self.record("rect");
        Ok(())
    }
}

fn run(source: &str) -> Interpreter {
    let mut interp = Interpreter::new(Box::new(NullDevice::new()));
    interp.run(source).unwrap();
    interp
}

fn run_err(source: &str) -> (Interpreter, ErrorKind) {
    let mut interp = Interpreter::new(Box::new(NullDevice::new()));
    let kind = interp.run(source).unwrap_err().kind;
    (interp, kind)
}

fn top_int(interp: &Interpreter) -> i32 {
    interp.op_stack.peek(0).unwrap().to_int().unwrap()
}

fn top_real(interp: &Interpreter) -> f64 {
    interp.op_stack.peek(0).unwrap().to_real().unwrap()
}

fn top_bool(interp: &Interpreter) -> bool {
    interp.op_stack.peek(0).unwrap().to_bool().unwrap()
}

// ---------------------------------------------------------------------------
// Arithmetic
// ---------------------------------------------------------------------------

#[test]
fn integer_arithmetic_stays_integer() {
    let interp = run("3 4 add");
    let top = interp.op_stack.peek(0).unwrap();
    assert!(matches!(top.value, Value::Integer(7)));
}

#[test]
fn mixed_arithmetic_promotes_to_real() {
    let interp = run("3 4.0 add");
    let top = interp.op_stack.peek(0).unwrap();
    assert!(matches!(top.value, Value::Real(r) if (r - 7.0).abs() < 1e-12));
}

#[test]
fn integer_overflow_promotes_to_real() {
    let interp = run("2147483647 1 add");
    let top = interp.op_stack.peek(0).unwrap();
    assert!(matches!(top.value, Value::Real(r) if (r - 2_147_483_648.0).abs() < 1.0));
}

#[test]
fn div_always_real() {
    let interp = run("6 3 div");
    let top = interp.op_stack.peek(0).unwrap();
    assert!(matches!(top.value, Value::Real(r) if (r - 2.0).abs() < 1e-12));
}

#[test]
fn division_by_zero_is_undefinedresult() {
    let (_, kind) = run_err("1 0 div");
    assert_eq!(kind, ErrorKind::UndefinedResult);
    let (_, kind) = run_err("1 0 idiv");
    assert_eq!(kind, ErrorKind::UndefinedResult);
}

#[test]
fn atan_normalizes_to_positive_degrees() {
    let interp = run("-1 0 atan");
    assert!((top_real(&interp) - 270.0).abs() < 1e-9);
    let interp = run("1 1 atan");
    assert!((top_real(&interp) - 45.0).abs() < 1e-9);
}

#[test]
fn round_ties_up() {
    let interp = run("0.5 round -0.5 round");
    let neg = top_real(&interp);
    assert!((neg - 0.0).abs() < 1e-12);
    let pos = interp.op_stack.peek(1).unwrap().to_real().unwrap();
    assert!((pos - 1.0).abs() < 1e-12);
}

#[test]
fn sqrt_negative_is_rangecheck() {
    let (_, kind) = run_err("-1 sqrt");
    assert_eq!(kind, ErrorKind::RangeCheck);
}

#[test]
fn srand_makes_rand_reproducible() {
    let a = run("42 srand rand");
    let b = run("42 srand rand");
    assert_eq!(top_int(&a), top_int(&b));
    assert!(top_int(&a) >= 0);
}

// ---------------------------------------------------------------------------
// Stack manipulation
// ---------------------------------------------------------------------------

#[test]
fn roll_rotates() {
    let interp = run("1 2 3 3 1 roll");
    // 1 2 3 -> 3 1 2
    assert_eq!(top_int(&interp), 2);
    assert_eq!(interp.op_stack.peek(1).unwrap().to_int().unwrap(), 1);
    assert_eq!(interp.op_stack.peek(2).unwrap().to_int().unwrap(), 3);
}

#[test]
fn copy_integer_form() {
    let interp = run("1 2 3 2 copy");
    assert_eq!(interp.op_stack.count(), 5);
    assert_eq!(top_int(&interp), 3);
    assert_eq!(interp.op_stack.peek(1).unwrap().to_int().unwrap(), 2);
}

#[test]
fn counttomark_counts() {
    let interp = run("mark 10 20 30 counttomark");
    assert_eq!(top_int(&interp), 3);
}

// ---------------------------------------------------------------------------
// Equality semantics
// ---------------------------------------------------------------------------

#[test]
fn numbers_compare_across_types() {
    let interp = run("1 1.0 eq");
    assert!(top_bool(&interp));
}

#[test]
fn name_and_string_compare_by_text() {
    let interp = run("(abc) /abc eq");
    assert!(top_bool(&interp));
}

#[test]
fn equal_content_strings_are_not_eq() {
    // eq on two strings is identity, not content
    let interp = run("(abc) (abc) eq");
    assert!(!top_bool(&interp));
    let interp = run("(abc) dup eq");
    assert!(top_bool(&interp));
}

// ---------------------------------------------------------------------------
// Dictionaries and names
// ---------------------------------------------------------------------------

#[test]
fn def_and_lookup() {
    let interp = run("/x 42 def x");
    assert_eq!(top_int(&interp), 42);
}

#[test]
fn procedures_run_when_invoked_by_name() {
    let interp = run("/double { 2 mul } def 21 double");
    assert_eq!(top_int(&interp), 42);
}

#[test]
fn procedures_push_when_scanned() {
    let interp = run("{ 2 mul }");
    assert_eq!(interp.op_stack.count(), 1);
    assert!(interp.op_stack.peek(0).unwrap().to_proc().is_ok());
}

#[test]
fn undefined_name_pushes_itself_and_fails() {
    let (interp, kind) = run_err("1 2 bogus");
    assert_eq!(kind, ErrorKind::Undefined);
    let top = interp.op_stack.peek(0).unwrap();
    assert!(matches!(top.value, Value::Name(ref n) if n == "bogus"));
    assert_eq!(interp.op_stack.count(), 3);
}

#[test]
fn dict_literal_syntax() {
    let interp = run("<< /a 1 /b 2 >> /b get");
    assert_eq!(top_int(&interp), 2);
}

#[test]
fn begin_end_scoping() {
    let interp = run("/x 1 def 2 dict begin /x 2 def x end x");
    assert_eq!(top_int(&interp), 1);
    assert_eq!(interp.op_stack.peek(1).unwrap().to_int().unwrap(), 2);
}

#[test]
fn where_finds_systemdict_names() {
    let interp = run("/add where { /found true def } { /found false def } ifelse pop");
    assert!(interp
        .dict_stack
        .lookup("found")
        .unwrap()
        .to_bool()
        .unwrap());
}

#[test]
fn integer_keys_and_name_keys_interchange() {
    let interp = run("2 dict dup 1 /one put 1 get");
    let top = interp.op_stack.peek(0).unwrap();
    assert!(matches!(top.value, Value::Name(ref n) if n == "one"));
}

// ---------------------------------------------------------------------------
// Strings
// ---------------------------------------------------------------------------

#[test]
fn search_splits_string() {
    let interp = run("(abcdef) (cd) search");
    assert!(top_bool(&interp));
    let pre = interp.op_stack.peek(1).unwrap().to_string_obj().unwrap();
    let matched = interp.op_stack.peek(2).unwrap().to_string_obj().unwrap();
    let post = interp.op_stack.peek(3).unwrap().to_string_obj().unwrap();
    assert_eq!(pre.to_text(), "ab");
    assert_eq!(matched.to_text(), "cd");
    assert_eq!(post.to_text(), "ef");
}

#[test]
fn search_miss_restores_string() {
    let interp = run("(abcdef) (xy) search");
    assert!(!top_bool(&interp));
    let original = interp.op_stack.peek(1).unwrap().to_string_obj().unwrap();
    assert_eq!(original.to_text(), "abcdef");
}

#[test]
fn cvs_writes_into_string() {
    let interp = run("42 10 string cvs");
    let s = interp.op_stack.peek(0).unwrap().to_string_obj().unwrap();
    assert_eq!(s.to_text(), "42");
}

#[test]
fn cvrs_hexadecimal() {
    let interp = run("255 16 10 string cvrs");
    let s = interp.op_stack.peek(0).unwrap().to_string_obj().unwrap();
    assert_eq!(s.to_text(), "FF");
}

#[test]
fn token_scans_and_leaves_remainder() {
    let interp = run("(12 34) token");
    assert!(top_bool(&interp));
    assert_eq!(interp.op_stack.peek(1).unwrap().to_int().unwrap(), 12);
    let rest = interp.op_stack.peek(2).unwrap().to_string_obj().unwrap();
    assert_eq!(rest.to_text(), " 34");
}

#[test]
fn shared_string_storage_via_getinterval() {
    let interp = run("/s (hello) def s 1 3 getinterval 0 88 put s");
    let s = interp.op_stack.peek(0).unwrap().to_string_obj().unwrap();
    assert_eq!(s.to_text(), "hXllo");
}

// ---------------------------------------------------------------------------
// Control flow
// ---------------------------------------------------------------------------

#[test]
fn for_counts_up() {
    let interp = run("0 1 1 4 { add } for");
    assert_eq!(top_int(&interp), 10);
}

#[test]
fn for_zero_increment_runs_never() {
    let interp = run("99 1 0 10 { pop } for");
    assert_eq!(top_int(&interp), 99);
    assert_eq!(interp.op_stack.count(), 1);
}

#[test]
fn for_wrong_sign_runs_never() {
    let interp = run("10 1 5 { pop } for 5 -1 10 { pop } for count");
    assert_eq!(top_int(&interp), 0);
}

#[test]
fn for_real_control_pushes_reals() {
    let interp = run("0.0 0.5 1.0 { } for count");
    assert_eq!(top_int(&interp), 3);
}

#[test]
fn repeat_runs_n_times() {
    let interp = run("0 5 { 1 add } repeat");
    assert_eq!(top_int(&interp), 5);
}

#[test]
fn forall_over_string_pushes_bytes() {
    let interp = run("0 (AB) { add } forall");
    assert_eq!(top_int(&interp), 65 + 66);
}

#[test]
fn forall_over_dict_pushes_pairs() {
    let interp = run("0 << /a 1 /b 2 >> { exch pop add } forall");
    assert_eq!(top_int(&interp), 3);
}

#[test]
fn stopped_catches_errors() {
    let interp = run("{ 1 0 div } stopped");
    assert!(top_bool(&interp));
    let interp = run("{ 1 2 add } stopped");
    assert!(!top_bool(&interp));
    assert_eq!(interp.op_stack.peek(1).unwrap().to_int().unwrap(), 3);
}

#[test]
fn stopped_does_not_catch_unimplemented() {
    let (_, kind) = run_err("{ 0 0 1 0 360 arc } stopped");
    assert_eq!(kind, ErrorKind::Unimplemented);
}

#[test]
fn quit_unwinds_loops() {
    let interp = run("0 1 1 1000 { add dup 10 eq { quit } if } for");
    assert!(top_int(&interp) <= 55);
}

#[test]
fn exec_runs_procedures() {
    let interp = run("{ 2 3 mul } exec");
    assert_eq!(top_int(&interp), 6);
}

#[test]
fn executable_string_runs_as_program() {
    let interp = run("(4 5 add) cvx exec");
    assert_eq!(top_int(&interp), 9);
}

#[test]
fn deep_recursion_is_limitcheck() {
    let (_, kind) = run_err("/f { f } def f");
    assert_eq!(kind, ErrorKind::ResourceLimit);
}

#[test]
fn bind_resolves_operators() {
    let interp = run("{ add } bind 0 get");
    let top = interp.op_stack.peek(0).unwrap();
    assert!(matches!(top.value, Value::Operator(_)));
}

// ---------------------------------------------------------------------------
// Graphics state
// ---------------------------------------------------------------------------

#[test]
fn moveto_and_currentpoint_round_trip() {
    let interp = run("10 20 moveto currentpoint");
    assert!((top_real(&interp) - 20.0).abs() < 1e-9);
    let x = interp.op_stack.peek(1).unwrap().to_real().unwrap();
    assert!((x - 10.0).abs() < 1e-9);
}

#[test]
fn translate_shifts_user_space() {
    let interp = run("5 7 translate 0 0 moveto currentpoint");
    // currentpoint reports user coordinates in the *current* system
    assert!((top_real(&interp) - 0.0).abs() < 1e-9);
}

#[test]
fn currentpoint_without_path_is_nocurrentpoint() {
    let (_, kind) = run_err("currentpoint");
    assert_eq!(kind, ErrorKind::NoCurrentPoint);
}

#[test]
fn closepath_restores_subpath_start() {
    let interp = run("1 2 moveto 5 6 lineto 7 8 lineto closepath currentpoint");
    assert!((top_real(&interp) - 2.0).abs() < 1e-9);
    let x = interp.op_stack.peek(1).unwrap().to_real().unwrap();
    assert!((x - 1.0).abs() < 1e-9);
}

#[test]
fn pathbbox_spans_the_path() {
    let interp = run("1 2 moveto 4 6 lineto pathbbox");
    let ury = top_real(&interp);
    let urx = interp.op_stack.peek(1).unwrap().to_real().unwrap();
    let lly = interp.op_stack.peek(2).unwrap().to_real().unwrap();
    let llx = interp.op_stack.peek(3).unwrap().to_real().unwrap();
    assert!((llx - 1.0).abs() < 1e-9 && (lly - 2.0).abs() < 1e-9);
    assert!((urx - 4.0).abs() < 1e-9 && (ury - 6.0).abs() < 1e-9);
}

#[test]
fn gsave_grestore_restore_attributes() {
    let interp = run("2 setlinewidth gsave 5 setlinewidth grestore currentlinewidth");
    assert!((top_real(&interp) - 2.0).abs() < 1e-12);
}

#[test]
fn grestore_on_bottom_is_noop() {
    let interp = run("grestore grestore 1");
    assert_eq!(top_int(&interp), 1);
}

#[test]
fn setmatrix_is_unimplemented() {
    let (_, kind) = run_err("matrix setmatrix");
    assert_eq!(kind, ErrorKind::Unimplemented);
}

#[test]
fn matrix_operators_round_trip() {
    let interp = run("matrix currentmatrix matrix invertmatrix aload pop");
    assert_eq!(interp.op_stack.count(), 6);
}

#[test]
fn transform_uses_ctm() {
    let interp = run("2 2 scale 3 4 transform matrix itransform");
    // forward through the CTM then back through identity leaves the
    // device coordinates
    assert_eq!(interp.op_stack.count(), 2);
}

#[test]
fn setdash_rejects_all_zero() {
    let (_, kind) = run_err("[0 0] 0 setdash");
    assert_eq!(kind, ErrorKind::RangeCheck);
}

#[test]
fn color_operators_convert() {
    let interp = run("1 0 0 setrgbcolor currentgray");
    assert!((top_real(&interp) - 0.3).abs() < 1e-9);
    let interp = run("0.25 setgray currentrgbcolor");
    assert!((top_real(&interp) - 0.25).abs() < 1e-9);
}

#[test]
fn indexed_color_space() {
    let interp = run("[/Indexed /DeviceRGB 1 <ff0000 00ff00>] setcolorspace 1 setcolor currentrgbcolor");
    let b = top_real(&interp);
    let g = interp.op_stack.peek(1).unwrap().to_real().unwrap();
    let r = interp.op_stack.peek(2).unwrap().to_real().unwrap();
    assert!(b.abs() < 1e-9);
    assert!((g - 1.0).abs() < 1e-9);
    assert!(r.abs() < 1e-9);
}

#[test]
fn indexed_hival_out_of_range() {
    let (_, kind) = run_err("[/Indexed /DeviceRGB 5000 (x)] setcolorspace");
    assert_eq!(kind, ErrorKind::RangeCheck);
}

// ---------------------------------------------------------------------------
// Painting events
// ---------------------------------------------------------------------------

#[test]
fn fill_sends_path_and_clears_it() {
    let (device, events) = RecordingDevice::new();
    let mut interp = Interpreter::new(Box::new(device));
    interp
        .run("0 0 moveto 10 0 lineto 10 10 lineto closepath fill currentpoint")
        .unwrap_err();
    let events = events.borrow();
    assert!(events.iter().any(|e| e == "fill 4 sections"));
    // the error above is nocurrentpoint: fill cleared the path
}

#[test]
fn device_sees_init_and_finish_on_error() {
    let (device, events) = RecordingDevice::new();
    let mut interp = Interpreter::new(Box::new(device));
    assert!(interp.run("1 0 div").is_err());
    let events = events.borrow();
    assert_eq!(events.first().map(String::as_str), Some("init"));
    assert_eq!(events.last().map(String::as_str), Some("finish"));
}

#[test]
fn gsave_opens_device_scope() {
    let (device, events) = RecordingDevice::new();
    let mut interp = Interpreter::new(Box::new(device));
    interp.run("gsave grestore").unwrap();
    let events = events.borrow();
    assert_eq!(
        *events,
        vec!["init", "start_scope", "end_scope", "finish"]
    );
}

#[test]
fn rectfill_preserves_current_path() {
    let (device, events) = RecordingDevice::new();
    let mut interp = Interpreter::new(Box::new(device));
    interp
        .run("0 0 moveto 5 5 lineto 1 1 8 8 rectfill currentpoint pop pop")
        .unwrap();
    let events = events.borrow();
    // moveto+3 linetos+closepath for the rectangle
    assert!(events.iter().any(|e| e == "fill 5 sections"));
}

#[test]
fn clip_replaces_and_reports() {
    let (device, events) = RecordingDevice::new();
    let mut interp = Interpreter::new(Box::new(device));
    interp
        .run("0 0 moveto 10 0 lineto 5 10 lineto closepath clip")
        .unwrap();
    assert!(events.borrow().iter().any(|e| e == "clip"));
}

#[test]
fn shfill_radial_reaches_device() {
    let (device, events) = RecordingDevice::new();
    let mut interp = Interpreter::new(Box::new(device));
    interp
        .run(
            "<< /ShadingType 3 /ColorSpace /DeviceRGB \
             /Coords [0 0 0 0 0 10] \
             /Function << /FunctionType 2 /C0 [1 0 0] /C1 [0 0 1] /N 1 >> \
             /Extend [true false] >> shfill",
        )
        .unwrap();
    assert!(events.borrow().iter().any(|e| e == "shade extend true false"));
}

#[test]
fn shfill_axial_is_unimplemented() {
    let (_, kind) = run_err(
        "<< /ShadingType 2 /ColorSpace /DeviceRGB /Coords [0 0 1 1] \
         /Function << /FunctionType 2 >> >> shfill",
    );
    assert_eq!(kind, ErrorKind::Unimplemented);
}

// ---------------------------------------------------------------------------
// Fonts and text
// ---------------------------------------------------------------------------

#[test]
fn findfont_scalefont_setfont() {
    let interp = run("/Courier findfont 12 scalefont setfont currentfont /FontName get");
    let top = interp.op_stack.peek(0).unwrap();
    assert!(matches!(top.value, Value::Name(ref n) if n == "Courier"));
}

#[test]
fn stringwidth_measures_courier() {
    let interp = run("/Courier findfont 10 scalefont setfont (abc) stringwidth");
    let wy = top_real(&interp);
    let wx = interp.op_stack.peek(1).unwrap().to_real().unwrap();
    assert!(wy.abs() < 1e-9);
    assert!((wx - 18.0).abs() < 1e-9);
}

#[test]
fn show_advances_current_point() {
    let (device, events) = RecordingDevice::new();
    let mut interp = Interpreter::new(Box::new(device));
    interp
        .run(
            "/Courier findfont 10 scalefont setfont \
             0 0 moveto (ab) show currentpoint pop",
        )
        .unwrap();
    let x = interp.op_stack.peek(0).unwrap().to_real().unwrap();
    assert!((x - 12.0).abs() < 1e-9);
    assert!(events.borrow().iter().any(|e| e.starts_with("text 'ab'")));
}

#[test]
fn unknown_font_substitutes() {
    let interp = run("/NoSuchFace findfont 10 scalefont setfont (ab) stringwidth pop");
    // default advance is 500/1000 em
    assert!((top_real(&interp) - 10.0).abs() < 1e-9);
}

#[test]
fn definefont_registers() {
    let interp = run(
        "/MyFont /Courier findfont definefont pop \
         /MyFont findfont /FontName get",
    );
    let top = interp.op_stack.peek(0).unwrap();
    assert!(matches!(top.value, Value::Name(ref n) if n == "Courier"));
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

#[test]
fn save_restore_are_tolerated() {
    let interp = run("save 1 2 add exch restore");
    assert_eq!(top_int(&interp), 3);
}

#[test]
fn languagelevel_and_version() {
    let interp = run("languagelevel");
    assert_eq!(top_int(&interp), 2);
}

#[test]
fn standard_encoding_is_available() {
    let interp = run("StandardEncoding 65 get");
    let top = interp.op_stack.peek(0).unwrap();
    assert!(matches!(top.value, Value::Name(ref n) if n == "A"));
}
