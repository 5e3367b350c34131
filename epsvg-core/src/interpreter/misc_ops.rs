//! Environment, output, and VM operators, plus the recognized but
//! unsupported set.
//!
//! `save`/`restore` are accepted and ignored: honoring them would need
//! full VM snapshots, and the EPS files this interpreter targets only
//! use them as brackets around the whole figure. A warning is logged so
//! the deviation is visible.

use crate::error::{ErrorKind, PsError, PsResult};
use crate::object::{Object, OpFn};

use super::Interpreter;

pub(super) const OPERATORS: &[(&str, OpFn)] = &[
    ("save", save),
    ("restore", restore),
    ("vmstatus", vmstatus),
    ("usertime", usertime),
    ("realtime", realtime),
    ("version", version),
    ("product", product),
    ("revision", revision),
    ("serialnumber", serialnumber),
    ("languagelevel", languagelevel),
    ("prompt", prompt),
    ("echo", echo),
    ("setpacking", setpacking),
    ("currentpacking", currentpacking),
    ("=", print_plain),
    ("==", print_described),
    ("stack", stack),
    ("pstack", pstack),
    ("print", print_string),
    ("flush", flush),
    // recognized but unsupported
    ("arc", unsupported_arc),
    ("arcn", unsupported_arcn),
    ("arcto", unsupported_arcto),
    ("charpath", unsupported_charpath),
    ("kshow", unsupported_kshow),
    ("image", unsupported_image),
    ("imagemask", unsupported_imagemask),
    ("colorimage", unsupported_colorimage),
    ("setmatrix", unsupported_setmatrix),
    ("settransfer", unsupported_settransfer),
    ("setcolortransfer", unsupported_setcolortransfer),
    ("setcolorrendering", unsupported_setcolorrendering),
    ("sethalftone", unsupported_sethalftone),
    ("setscreen", unsupported_setscreen),
    ("nulldevice", unsupported_nulldevice),
    ("executive", unsupported_executive),
    ("currentfile", unsupported_currentfile),
    ("readhexstring", unsupported_readhexstring),
    ("readline", unsupported_readline),
    ("readstring", unsupported_readstring),
];

// ---------------------------------------------------------------------------
// VM brackets
// ---------------------------------------------------------------------------

fn save(interp: &mut Interpreter) -> PsResult<()> {
    log::warn!("save: VM snapshots are not supported, pushing a placeholder");
    interp.op_stack.push(Object::literal_name("-save-"));
    Ok(())
}

fn restore(interp: &mut Interpreter) -> PsResult<()> {
    log::warn!("restore: VM snapshots are not supported, ignoring");
    interp.op_stack.pop()?;
    Ok(())
}

fn vmstatus(interp: &mut Interpreter) -> PsResult<()> {
    interp.op_stack.push(Object::integer(0));
    interp.op_stack.push(Object::integer(0));
    interp.op_stack.push(Object::integer(0));
    Ok(())
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

fn elapsed_ms(interp: &Interpreter) -> i32 {
    let ms = interp.start.elapsed().as_millis();
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    {
        (ms % u128::from(i32::MAX as u32)) as i32
    }
}

fn usertime(interp: &mut Interpreter) -> PsResult<()> {
    let ms = elapsed_ms(interp);
    interp.op_stack.push(Object::integer(ms));
    Ok(())
}

fn realtime(interp: &mut Interpreter) -> PsResult<()> {
    let ms = elapsed_ms(interp);
    interp.op_stack.push(Object::integer(ms));
    Ok(())
}

fn version(interp: &mut Interpreter) -> PsResult<()> {
    interp.op_stack.push(Object::string_from_text("3011"));
    Ok(())
}

fn product(interp: &mut Interpreter) -> PsResult<()> {
    interp.op_stack.push(Object::string_from_text("epsvg"));
    Ok(())
}

fn revision(interp: &mut Interpreter) -> PsResult<()> {
    interp.op_stack.push(Object::integer(0));
    Ok(())
}

fn serialnumber(interp: &mut Interpreter) -> PsResult<()> {
    interp.op_stack.push(Object::integer(0));
    Ok(())
}

fn languagelevel(interp: &mut Interpreter) -> PsResult<()> {
    interp.op_stack.push(Object::integer(2));
    Ok(())
}

/// Interactive-session operators. There is no console session, so
/// `prompt` does nothing and `echo` only consumes its flag.
fn prompt(_interp: &mut Interpreter) -> PsResult<()> {
    Ok(())
}

fn echo(interp: &mut Interpreter) -> PsResult<()> {
    interp.op_stack.pop_bool()?;
    Ok(())
}

/// Packed arrays are not distinguished from plain ones; `setpacking`
/// is accepted and has no effect.
fn setpacking(interp: &mut Interpreter) -> PsResult<()> {
    interp.op_stack.pop_bool()?;
    Ok(())
}

fn currentpacking(interp: &mut Interpreter) -> PsResult<()> {
    interp.op_stack.push(Object::boolean(false));
    Ok(())
}

// ---------------------------------------------------------------------------
// Console output
// ---------------------------------------------------------------------------

fn print_plain(interp: &mut Interpreter) -> PsResult<()> {
    let obj = interp.op_stack.pop()?;
    println!("{}", obj.cvs_text());
    Ok(())
}

fn print_described(interp: &mut Interpreter) -> PsResult<()> {
    let obj = interp.op_stack.pop()?;
    println!("{}", obj.describe());
    Ok(())
}

fn stack(interp: &mut Interpreter) -> PsResult<()> {
    for obj in interp.op_stack.snapshot().iter().rev() {
        println!("{}", obj.cvs_text());
    }
    Ok(())
}

fn pstack(interp: &mut Interpreter) -> PsResult<()> {
    for obj in interp.op_stack.snapshot().iter().rev() {
        println!("{}", obj.describe());
    }
    Ok(())
}

fn print_string(interp: &mut Interpreter) -> PsResult<()> {
    let s = interp.op_stack.pop_string()?;
    print!("{}", s.to_text());
    Ok(())
}

fn flush(_interp: &mut Interpreter) -> PsResult<()> {
    use std::io::Write;
    std::io::stdout().flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Unsupported operators
// ---------------------------------------------------------------------------

/// Each of these would silently change painted output if skipped, so
/// they fail hard instead of degrading.
macro_rules! unsupported {
    ($($func:ident => $name:literal),* $(,)?) => {
        $(
            fn $func(_interp: &mut Interpreter) -> PsResult<()> {
                Err(PsError::new(
                    ErrorKind::Unimplemented,
                    concat!($name, " is not supported"),
                ))
            }
        )*
    };
}

unsupported! {
    unsupported_arc => "arc",
    unsupported_arcn => "arcn",
    unsupported_arcto => "arcto",
    unsupported_charpath => "charpath",
    unsupported_kshow => "kshow",
    unsupported_image => "image",
    unsupported_imagemask => "imagemask",
    unsupported_colorimage => "colorimage",
    unsupported_setmatrix => "setmatrix",
    unsupported_settransfer => "settransfer",
    unsupported_setcolortransfer => "setcolortransfer",
    unsupported_setcolorrendering => "setcolorrendering",
    unsupported_sethalftone => "sethalftone",
    unsupported_setscreen => "setscreen",
    unsupported_nulldevice => "nulldevice",
    unsupported_executive => "executive",
    unsupported_currentfile => "currentfile",
    unsupported_readhexstring => "readhexstring",
    unsupported_readline => "readline",
    unsupported_readstring => "readstring",
}
