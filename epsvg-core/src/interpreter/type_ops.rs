//! Type, attribute, and conversion operators.

use crate::error::{ErrorKind, PsError, PsResult};
use crate::lexer::ObjectReader;
use crate::object::{Access, Object, OpFn, Value};

use super::Interpreter;

pub(super) const OPERATORS: &[(&str, OpFn)] = &[
    ("type", type_of),
    ("cvlit", cvlit),
    ("cvx", cvx),
    ("xcheck", xcheck),
    ("rcheck", rcheck),
    ("wcheck", wcheck),
    ("readonly", readonly),
    ("executeonly", executeonly),
    ("noaccess", noaccess),
    ("cvi", cvi),
    ("cvr", cvr),
    ("cvn", cvn),
    ("cvs", cvs),
    ("cvrs", cvrs),
];

fn type_of(interp: &mut Interpreter) -> PsResult<()> {
    let obj = interp.op_stack.pop()?;
    interp
        .op_stack
        .push(Object::executable_name(obj.type_name()));
    Ok(())
}

fn cvlit(interp: &mut Interpreter) -> PsResult<()> {
    let obj = interp.op_stack.pop()?;
    interp.op_stack.push(obj.into_literal());
    Ok(())
}

fn cvx(interp: &mut Interpreter) -> PsResult<()> {
    let obj = interp.op_stack.pop()?;
    interp.op_stack.push(obj.into_executable());
    Ok(())
}

fn xcheck(interp: &mut Interpreter) -> PsResult<()> {
    let obj = interp.op_stack.pop()?;
    interp.op_stack.push(Object::boolean(!obj.literal));
    Ok(())
}

fn rcheck(interp: &mut Interpreter) -> PsResult<()> {
    let obj = composite(interp)?;
    interp
        .op_stack
        .push(Object::boolean(obj.access.can_read()));
    Ok(())
}

fn wcheck(interp: &mut Interpreter) -> PsResult<()> {
    let obj = composite(interp)?;
    interp
        .op_stack
        .push(Object::boolean(obj.access.can_write()));
    Ok(())
}

fn composite(interp: &mut Interpreter) -> PsResult<Object> {
    let obj = interp.op_stack.pop()?;
    match obj.value {
        Value::Array(_) | Value::Dict(_) | Value::Font(_) | Value::String(_) | Value::File(_) => {
            Ok(obj)
        }
        _ => Err(PsError::new(
            ErrorKind::TypeCheck,
            format!("{} has no access attribute", obj.type_name()),
        )),
    }
}

fn set_access(interp: &mut Interpreter, access: Access) -> PsResult<()> {
    let mut obj = composite(interp)?;
    obj.access = access;
    interp.op_stack.push(obj);
    Ok(())
}

fn readonly(interp: &mut Interpreter) -> PsResult<()> {
    set_access(interp, Access::ReadOnly)
}

fn executeonly(interp: &mut Interpreter) -> PsResult<()> {
    set_access(interp, Access::ExecuteOnly)
}

fn noaccess(interp: &mut Interpreter) -> PsResult<()> {
    set_access(interp, Access::None)
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

/// Parse the leading number out of a string operand.
fn number_from_text(text: &str) -> PsResult<f64> {
    let mut reader = ObjectReader::new(text);
    match reader.next_object()? {
        Some(obj) => obj.to_real(),
        None => Err(PsError::new(ErrorKind::TypeCheck, "empty numeric string")),
    }
}

fn pop_numeric(interp: &mut Interpreter) -> PsResult<Object> {
    let obj = interp.op_stack.pop()?;
    match obj.value {
        Value::Integer(_) | Value::Real(_) => Ok(obj),
        Value::String(ref s) => {
            obj.check_read()?;
            let r = number_from_text(&s.to_text())?;
            Ok(Object::real(r))
        }
        _ => Err(PsError::new(
            ErrorKind::TypeCheck,
            format!("cannot convert {} to a number", obj.type_name()),
        )),
    }
}

fn cvi(interp: &mut Interpreter) -> PsResult<()> {
    let obj = pop_numeric(interp)?;
    let result = match obj.value {
        Value::Integer(i) => i,
        Value::Real(r) => {
            let truncated = r.trunc();
            if truncated < f64::from(i32::MIN) || truncated > f64::from(i32::MAX) {
                return Err(PsError::new(
                    ErrorKind::RangeCheck,
                    "real too large for an integer",
                ));
            }
            #[allow(clippy::cast_possible_truncation)]
            {
                truncated as i32
            }
        }
        _ => unreachable!(),
    };
    interp.op_stack.push(Object::integer(result));
    Ok(())
}

fn cvr(interp: &mut Interpreter) -> PsResult<()> {
    let obj = pop_numeric(interp)?;
    let r = obj.to_real()?;
    interp.op_stack.push(Object::real(r));
    Ok(())
}

fn cvn(interp: &mut Interpreter) -> PsResult<()> {
    let obj = interp.op_stack.pop()?;
    obj.check_read()?;
    let s = obj.to_string_obj()?;
    let name = Object::literal_name(s.to_text());
    // The name keeps the string's executable attribute
    if obj.literal {
        interp.op_stack.push(name);
    } else {
        interp.op_stack.push(name.into_executable());
    }
    Ok(())
}

fn cvs(interp: &mut Interpreter) -> PsResult<()> {
    let target = interp.op_stack.pop()?;
    target.check_write()?;
    let target = target.to_string_obj()?;
    let obj = interp.op_stack.pop()?;
    let written = target.write_text(&obj.cvs_text())?;
    interp.op_stack.push(Object::string(written));
    Ok(())
}

fn cvrs(interp: &mut Interpreter) -> PsResult<()> {
    let target = interp.op_stack.pop()?;
    target.check_write()?;
    let target = target.to_string_obj()?;
    let radix = interp.op_stack.pop_int()?;
    let obj = interp.op_stack.pop()?;
    if !(2..=36).contains(&radix) {
        return Err(PsError::new(ErrorKind::RangeCheck, "radix out of range"));
    }
    let text = if radix == 10 {
        obj.cvs_text()
    } else {
        // Non-decimal radices reinterpret the number as a 32-bit
        // unsigned value
        let i = match obj.value {
            Value::Integer(i) => i,
            Value::Real(r) => {
                #[allow(clippy::cast_possible_truncation)]
                {
                    r.trunc() as i32
                }
            }
            _ => {
                return Err(PsError::new(
                    ErrorKind::TypeCheck,
                    format!("cannot convert {} with cvrs", obj.type_name()),
                ))
            }
        };
        #[allow(clippy::cast_sign_loss)]
        to_radix_text(i as u32, radix.unsigned_abs())
    };
    let written = target.write_text(&text)?;
    interp.op_stack.push(Object::string(written));
    Ok(())
}

fn to_radix_text(mut value: u32, radix: u32) -> String {
    const DIGITS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % radix) as usize]);
        value /= radix;
    }
    out.reverse();
    out.iter().map(|&b| char::from(b)).collect()
}
