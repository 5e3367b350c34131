//! Operand stack manipulation operators.

use crate::error::{ErrorKind, PsError, PsResult};
use crate::object::{Object, OpFn, Value};

use super::Interpreter;

pub(super) const OPERATORS: &[(&str, OpFn)] = &[
    ("pop", pop),
    ("exch", exch),
    ("dup", dup),
    ("copy", copy),
    ("index", index),
    ("roll", roll),
    ("clear", clear),
    ("count", count),
    ("mark", mark),
    ("cleartomark", cleartomark),
    ("counttomark", counttomark),
    ("true", push_true),
    ("false", push_false),
    ("null", push_null),
];

fn pop(interp: &mut Interpreter) -> PsResult<()> {
    interp.op_stack.pop()?;
    Ok(())
}

fn exch(interp: &mut Interpreter) -> PsResult<()> {
    let a = interp.op_stack.pop()?;
    let b = interp.op_stack.pop()?;
    interp.op_stack.push(a);
    interp.op_stack.push(b);
    Ok(())
}

fn dup(interp: &mut Interpreter) -> PsResult<()> {
    let top = interp.op_stack.peek(0)?;
    interp.op_stack.push(top);
    Ok(())
}

/// `copy` is polymorphic: with an integer it duplicates the top `n`
/// objects; with two composites it copies contents from the first into
/// the second and returns the written part.
fn copy(interp: &mut Interpreter) -> PsResult<()> {
    let top = interp.op_stack.pop()?;
    match top.value {
        Value::Integer(n) => {
            if n < 0 {
                return Err(PsError::new(ErrorKind::RangeCheck, "copy count negative"));
            }
            #[allow(clippy::cast_sign_loss)]
            let n = n as usize;
            let copied = {
                let mut items = Vec::with_capacity(n);
                for i in (0..n).rev() {
                    items.push(interp.op_stack.peek(i)?);
                }
                items
            };
            for item in copied {
                interp.op_stack.push(item);
            }
            Ok(())
        }
        Value::Array(ref dst) => {
            let src = interp.op_stack.pop_array()?;
            dst.putinterval(0, &src)?;
            let written = dst.getinterval(0, src.len())?;
            interp.op_stack.push(Object {
                value: Value::Array(written),
                ..top
            });
            Ok(())
        }
        Value::String(ref dst) => {
            let src = interp.op_stack.pop_string()?;
            dst.putinterval(0, &src)?;
            let written = dst.getinterval(0, src.len())?;
            interp.op_stack.push(Object {
                value: Value::String(written),
                ..top
            });
            Ok(())
        }
        Value::Dict(ref dst) | Value::Font(ref dst) => {
            let src = interp.op_stack.pop_dict()?;
            for (key, value) in src.entries() {
                dst.set(key, value);
            }
            interp.op_stack.push(top);
            Ok(())
        }
        _ => Err(PsError::new(
            ErrorKind::TypeCheck,
            format!("cannot copy {}", top.type_name()),
        )),
    }
}

fn index(interp: &mut Interpreter) -> PsResult<()> {
    let n = interp.op_stack.pop_nonneg_int()?;
    #[allow(clippy::cast_sign_loss)]
    let obj = interp.op_stack.peek(n as usize)?;
    interp.op_stack.push(obj);
    Ok(())
}

fn roll(interp: &mut Interpreter) -> PsResult<()> {
    let j = interp.op_stack.pop_int()?;
    let n = interp.op_stack.pop_nonneg_int()?;
    #[allow(clippy::cast_sign_loss)]
    let n = n as usize;
    if n == 0 {
        return Ok(());
    }
    let mut items = interp.op_stack.pop_n(n)?;
    #[allow(clippy::cast_possible_wrap)]
    let shift = j.rem_euclid(n as i32) as usize;
    items.rotate_right(shift);
    for item in items {
        interp.op_stack.push(item);
    }
    Ok(())
}

fn clear(interp: &mut Interpreter) -> PsResult<()> {
    interp.op_stack.clear();
    Ok(())
}

fn count(interp: &mut Interpreter) -> PsResult<()> {
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    let n = interp.op_stack.count() as i32;
    interp.op_stack.push(Object::integer(n));
    Ok(())
}

fn mark(interp: &mut Interpreter) -> PsResult<()> {
    interp.op_stack.push(Object::mark());
    Ok(())
}

fn cleartomark(interp: &mut Interpreter) -> PsResult<()> {
    let depth = interp.op_stack.count_to_mark()?;
    interp.op_stack.pop_n(depth + 1)?;
    Ok(())
}

fn counttomark(interp: &mut Interpreter) -> PsResult<()> {
    let depth = interp.op_stack.count_to_mark()?;
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    let depth = depth as i32;
    interp.op_stack.push(Object::integer(depth));
    Ok(())
}

fn push_true(interp: &mut Interpreter) -> PsResult<()> {
    interp.op_stack.push(Object::boolean(true));
    Ok(())
}

fn push_false(interp: &mut Interpreter) -> PsResult<()> {
    interp.op_stack.push(Object::boolean(false));
    Ok(())
}

fn push_null(interp: &mut Interpreter) -> PsResult<()> {
    interp.op_stack.push(Object::null());
    Ok(())
}
