//! Control flow operators.

use crate::error::{ErrorKind, PsError, PsResult};
use crate::object::{ArrayObj, Object, OpFn, Value};

use super::Interpreter;

pub(super) const OPERATORS: &[(&str, OpFn)] = &[
    ("exec", exec),
    ("if", if_op),
    ("ifelse", ifelse),
    ("for", for_op),
    ("repeat", repeat),
    ("forall", forall),
    ("stopped", stopped),
    ("countexecstack", countexecstack),
    ("execstack", execstack),
    ("quit", quit),
    ("bind", bind),
];

/// Nesting ceiling for `bind`, which may meet self-referencing
/// procedures.
const MAX_BIND_DEPTH: usize = 100;

fn exec(interp: &mut Interpreter) -> PsResult<()> {
    let obj = interp.op_stack.pop()?;
    interp.execute_object(obj)
}

fn if_op(interp: &mut Interpreter) -> PsResult<()> {
    let proc = interp.op_stack.pop_proc()?;
    let condition = interp.op_stack.pop_bool()?;
    if condition {
        interp.run_proc(&proc)?;
    }
    Ok(())
}

fn ifelse(interp: &mut Interpreter) -> PsResult<()> {
    let proc_false = interp.op_stack.pop_proc()?;
    let proc_true = interp.op_stack.pop_proc()?;
    let condition = interp.op_stack.pop_bool()?;
    if condition {
        interp.run_proc(&proc_true)
    } else {
        interp.run_proc(&proc_false)
    }
}

/// `initial increment limit proc for`
///
/// A zero increment, or an increment pointing away from the limit,
/// yields no iterations at all. The control value is pushed as an
/// integer only when all three control operands were integers.
fn for_op(interp: &mut Interpreter) -> PsResult<()> {
    let proc = interp.op_stack.pop_proc()?;
    let limit_obj = interp.op_stack.pop()?;
    let increment_obj = interp.op_stack.pop()?;
    let initial_obj = interp.op_stack.pop()?;
    let integral = matches!(
        (&initial_obj.value, &increment_obj.value, &limit_obj.value),
        (Value::Integer(_), Value::Integer(_), Value::Integer(_))
    );
    let limit = limit_obj.to_real()?;
    let increment = increment_obj.to_real()?;
    let mut value = initial_obj.to_real()?;

    if increment == 0.0 {
        return Ok(());
    }
    if (increment > 0.0 && value > limit) || (increment < 0.0 && value < limit) {
        return Ok(());
    }
    while (increment > 0.0 && value <= limit) || (increment < 0.0 && value >= limit) {
        if interp.quit_requested() {
            break;
        }
        if integral {
            #[allow(clippy::cast_possible_truncation)]
            interp.op_stack.push(Object::integer(value as i32));
        } else {
            interp.op_stack.push(Object::real(value));
        }
        interp.run_proc(&proc)?;
        value += increment;
    }
    Ok(())
}

fn repeat(interp: &mut Interpreter) -> PsResult<()> {
    let proc = interp.op_stack.pop_proc()?;
    let n = interp.op_stack.pop_nonneg_int()?;
    for _ in 0..n {
        if interp.quit_requested() {
            break;
        }
        interp.run_proc(&proc)?;
    }
    Ok(())
}

/// `forall` visits arrays by element, dictionaries by key-value pair,
/// and strings by byte.
fn forall(interp: &mut Interpreter) -> PsResult<()> {
    let proc = interp.op_stack.pop_proc()?;
    let target = interp.op_stack.pop()?;
    target.check_read()?;
    match &target.value {
        Value::Array(a) => {
            for item in a.snapshot() {
                if interp.quit_requested() {
                    break;
                }
                interp.op_stack.push(item);
                interp.run_proc(&proc)?;
            }
            Ok(())
        }
        Value::Dict(d) | Value::Font(d) => {
            for (key, value) in d.entries() {
                if interp.quit_requested() {
                    break;
                }
                interp.op_stack.push(Object::literal_name(key));
                interp.op_stack.push(value);
                interp.run_proc(&proc)?;
            }
            Ok(())
        }
        Value::String(s) => {
            for byte in s.bytes() {
                if interp.quit_requested() {
                    break;
                }
                interp.op_stack.push(Object::integer(i32::from(byte)));
                interp.run_proc(&proc)?;
            }
            Ok(())
        }
        _ => Err(PsError::new(
            ErrorKind::TypeCheck,
            format!("cannot iterate over {}", target.type_name()),
        )),
    }
}

/// Run an object, catching every error except `unimplemented`, which
/// marks output that would silently be wrong and must stay fatal.
fn stopped(interp: &mut Interpreter) -> PsResult<()> {
    let obj = interp.op_stack.pop()?;
    match interp.execute_object(obj) {
        Ok(()) => {
            interp.op_stack.push(Object::boolean(false));
            Ok(())
        }
        Err(err) if err.kind == ErrorKind::Unimplemented => Err(err),
        Err(_) => {
            interp.op_stack.push(Object::boolean(true));
            Ok(())
        }
    }
}

/// Procedure execution nests host calls, so only the nesting depth is
/// observable; `execstack` reports an empty view.
fn countexecstack(interp: &mut Interpreter) -> PsResult<()> {
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    let depth = interp.exec_depth as i32;
    interp.op_stack.push(Object::integer(depth));
    Ok(())
}

fn execstack(interp: &mut Interpreter) -> PsResult<()> {
    let target = interp.op_stack.pop_array()?;
    let written = target.getinterval(0, 0)?;
    interp.op_stack.push(Object::array(written));
    Ok(())
}

fn quit(interp: &mut Interpreter) -> PsResult<()> {
    interp.request_quit();
    Ok(())
}

/// Replace operator names in a procedure with the operators themselves
/// and make nested procedures read-only.
fn bind(interp: &mut Interpreter) -> PsResult<()> {
    let obj = interp.op_stack.pop()?;
    let proc = obj.to_proc()?;
    bind_proc(interp, &proc, 0)?;
    interp.op_stack.push(obj);
    Ok(())
}

fn bind_proc(interp: &mut Interpreter, proc: &ArrayObj, depth: usize) -> PsResult<()> {
    if depth >= MAX_BIND_DEPTH {
        return Ok(());
    }
    for i in 0..proc.len() {
        let item = proc.get(i)?;
        if item.literal {
            continue;
        }
        match &item.value {
            Value::Name(name) => {
                if let Some(found) = interp.dict_stack.lookup(name) {
                    if matches!(found.value, Value::Operator(_)) {
                        proc.put(i, found)?;
                    }
                }
            }
            Value::Array(inner) => {
                if item.access.can_write() {
                    bind_proc(interp, inner, depth + 1)?;
                    let mut bound = item.clone();
                    bound.access = crate::object::Access::ReadOnly;
                    proc.put(i, bound)?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}
