//! Arithmetic, relational, and bitwise operators.
//!
//! Integer operations stay integer while the result fits; overflow
//! promotes to real rather than wrapping. `div` always produces a
//! real, `idiv` and `mod` demand integers.

use crate::error::{ErrorKind, PsError, PsResult};
use crate::object::{Object, OpFn, Value};

use super::Interpreter;

pub(super) const OPERATORS: &[(&str, OpFn)] = &[
    ("add", add),
    ("sub", sub),
    ("mul", mul),
    ("div", div),
    ("idiv", idiv),
    ("mod", ps_mod),
    ("neg", neg),
    ("abs", abs),
    ("ceiling", ceiling),
    ("floor", floor),
    ("round", round),
    ("truncate", truncate),
    ("sqrt", sqrt),
    ("sin", sin),
    ("cos", cos),
    ("atan", atan),
    ("exp", exp),
    ("ln", ln),
    ("log", log10),
    ("rand", rand),
    ("srand", srand),
    ("rrand", rrand),
    ("eq", eq),
    ("ne", ne),
    ("gt", gt),
    ("ge", ge),
    ("lt", lt),
    ("le", le),
    ("and", and),
    ("or", or),
    ("xor", xor),
    ("not", not),
    ("bitshift", bitshift),
];

// ---------------------------------------------------------------------------
// Numeric operands
// ---------------------------------------------------------------------------

/// A numeric operand that remembers whether it was an integer.
#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i32),
    Real(f64),
}

impl Num {
    fn as_real(self) -> f64 {
        match self {
            Self::Int(i) => f64::from(i),
            Self::Real(r) => r,
        }
    }
}

fn pop_num(interp: &mut Interpreter) -> PsResult<Num> {
    let obj = interp.op_stack.pop()?;
    match obj.value {
        Value::Integer(i) => Ok(Num::Int(i)),
        Value::Real(r) => Ok(Num::Real(r)),
        _ => Err(PsError::new(
            ErrorKind::TypeCheck,
            format!("expected number, got {}", obj.type_name()),
        )),
    }
}

fn pop_pair(interp: &mut Interpreter) -> PsResult<(Num, Num)> {
    let b = pop_num(interp)?;
    let a = pop_num(interp)?;
    Ok((a, b))
}

fn push_num(interp: &mut Interpreter, n: Num) {
    match n {
        Num::Int(i) => interp.op_stack.push(Object::integer(i)),
        Num::Real(r) => interp.op_stack.push(Object::real(r)),
    }
}

/// Apply a binary operation, staying integer when possible.
fn binary(
    interp: &mut Interpreter,
    int_op: fn(i32, i32) -> Option<i32>,
    real_op: fn(f64, f64) -> f64,
) -> PsResult<()> {
    let (a, b) = pop_pair(interp)?;
    let result = match (a, b) {
        (Num::Int(x), Num::Int(y)) => match int_op(x, y) {
            Some(i) => Num::Int(i),
            // Overflow promotes to real
            None => Num::Real(real_op(f64::from(x), f64::from(y))),
        },
        _ => Num::Real(real_op(a.as_real(), b.as_real())),
    };
    push_num(interp, result);
    Ok(())
}

// ---------------------------------------------------------------------------
// Arithmetic
// ---------------------------------------------------------------------------

fn add(interp: &mut Interpreter) -> PsResult<()> {
    binary(interp, i32::checked_add, |a, b| a + b)
}

fn sub(interp: &mut Interpreter) -> PsResult<()> {
    binary(interp, i32::checked_sub, |a, b| a - b)
}

fn mul(interp: &mut Interpreter) -> PsResult<()> {
    binary(interp, i32::checked_mul, |a, b| a * b)
}

fn div(interp: &mut Interpreter) -> PsResult<()> {
    let (a, b) = pop_pair(interp)?;
    let divisor = b.as_real();
    if divisor == 0.0 {
        return Err(PsError::new(ErrorKind::UndefinedResult, "division by zero"));
    }
    push_num(interp, Num::Real(a.as_real() / divisor));
    Ok(())
}

fn idiv(interp: &mut Interpreter) -> PsResult<()> {
    let b = interp.op_stack.pop_int()?;
    let a = interp.op_stack.pop_int()?;
    let q = a
        .checked_div(b)
        .ok_or_else(|| PsError::new(ErrorKind::UndefinedResult, "division by zero"))?;
    interp.op_stack.push(Object::integer(q));
    Ok(())
}

fn ps_mod(interp: &mut Interpreter) -> PsResult<()> {
    let b = interp.op_stack.pop_int()?;
    let a = interp.op_stack.pop_int()?;
    let r = a
        .checked_rem(b)
        .ok_or_else(|| PsError::new(ErrorKind::UndefinedResult, "division by zero"))?;
    interp.op_stack.push(Object::integer(r));
    Ok(())
}

fn neg(interp: &mut Interpreter) -> PsResult<()> {
    let n = pop_num(interp)?;
    let result = match n {
        Num::Int(i) => i.checked_neg().map_or(Num::Real(-f64::from(i)), Num::Int),
        Num::Real(r) => Num::Real(-r),
    };
    push_num(interp, result);
    Ok(())
}

fn abs(interp: &mut Interpreter) -> PsResult<()> {
    let n = pop_num(interp)?;
    let result = match n {
        Num::Int(i) => i.checked_abs().map_or(Num::Real(f64::from(i).abs()), Num::Int),
        Num::Real(r) => Num::Real(r.abs()),
    };
    push_num(interp, result);
    Ok(())
}

/// Apply a rounding function; integers pass through untouched and
/// reals stay real.
fn rounding(interp: &mut Interpreter, op: fn(f64) -> f64) -> PsResult<()> {
    let n = pop_num(interp)?;
    let result = match n {
        Num::Int(i) => Num::Int(i),
        Num::Real(r) => Num::Real(op(r)),
    };
    push_num(interp, result);
    Ok(())
}

fn ceiling(interp: &mut Interpreter) -> PsResult<()> {
    rounding(interp, f64::ceil)
}

fn floor(interp: &mut Interpreter) -> PsResult<()> {
    rounding(interp, f64::floor)
}

fn round(interp: &mut Interpreter) -> PsResult<()> {
    // Ties round toward positive infinity: -0.5 rounds to 0
    rounding(interp, |r| (r + 0.5).floor())
}

fn truncate(interp: &mut Interpreter) -> PsResult<()> {
    rounding(interp, f64::trunc)
}

fn sqrt(interp: &mut Interpreter) -> PsResult<()> {
    let x = interp.op_stack.pop_real()?;
    if x < 0.0 {
        return Err(PsError::new(
            ErrorKind::RangeCheck,
            "sqrt of a negative number",
        ));
    }
    interp.op_stack.push(Object::real(x.sqrt()));
    Ok(())
}

fn sin(interp: &mut Interpreter) -> PsResult<()> {
    let degrees = interp.op_stack.pop_real()?;
    interp.op_stack.push(Object::real(degrees.to_radians().sin()));
    Ok(())
}

fn cos(interp: &mut Interpreter) -> PsResult<()> {
    let degrees = interp.op_stack.pop_real()?;
    interp.op_stack.push(Object::real(degrees.to_radians().cos()));
    Ok(())
}

fn atan(interp: &mut Interpreter) -> PsResult<()> {
    let den = interp.op_stack.pop_real()?;
    let num = interp.op_stack.pop_real()?;
    if num == 0.0 && den == 0.0 {
        return Err(PsError::new(ErrorKind::UndefinedResult, "atan of 0 0"));
    }
    let mut degrees = num.atan2(den).to_degrees();
    if degrees < 0.0 {
        degrees += 360.0;
    }
    interp.op_stack.push(Object::real(degrees));
    Ok(())
}

fn exp(interp: &mut Interpreter) -> PsResult<()> {
    let exponent = interp.op_stack.pop_real()?;
    let base = interp.op_stack.pop_real()?;
    let result = base.powf(exponent);
    if !result.is_finite() {
        return Err(PsError::new(
            ErrorKind::UndefinedResult,
            "exp result not representable",
        ));
    }
    interp.op_stack.push(Object::real(result));
    Ok(())
}

fn ln(interp: &mut Interpreter) -> PsResult<()> {
    let x = interp.op_stack.pop_real()?;
    if x <= 0.0 {
        return Err(PsError::new(ErrorKind::RangeCheck, "ln of a non-positive number"));
    }
    interp.op_stack.push(Object::real(x.ln()));
    Ok(())
}

fn log10(interp: &mut Interpreter) -> PsResult<()> {
    let x = interp.op_stack.pop_real()?;
    if x <= 0.0 {
        return Err(PsError::new(
            ErrorKind::RangeCheck,
            "log of a non-positive number",
        ));
    }
    interp.op_stack.push(Object::real(x.log10()));
    Ok(())
}

// ---------------------------------------------------------------------------
// Pseudo-random numbers
// ---------------------------------------------------------------------------

fn rand(interp: &mut Interpreter) -> PsResult<()> {
    // Classic LCG, masked to the non-negative 31-bit range
    interp.rand_state = interp
        .rand_state
        .wrapping_mul(1_103_515_245)
        .wrapping_add(12_345);
    #[allow(clippy::cast_possible_wrap)]
    let value = (interp.rand_state & 0x7fff_ffff) as i32;
    interp.op_stack.push(Object::integer(value));
    Ok(())
}

fn srand(interp: &mut Interpreter) -> PsResult<()> {
    let seed = interp.op_stack.pop_int()?;
    #[allow(clippy::cast_sign_loss)]
    {
        interp.rand_state = seed as u32;
    }
    Ok(())
}

fn rrand(interp: &mut Interpreter) -> PsResult<()> {
    #[allow(clippy::cast_possible_wrap)]
    let state = interp.rand_state as i32;
    interp.op_stack.push(Object::integer(state));
    Ok(())
}

// ---------------------------------------------------------------------------
// Relational
// ---------------------------------------------------------------------------

fn eq(interp: &mut Interpreter) -> PsResult<()> {
    let b = interp.op_stack.pop()?;
    let a = interp.op_stack.pop()?;
    interp.op_stack.push(Object::boolean(a.ps_eq(&b)));
    Ok(())
}

fn ne(interp: &mut Interpreter) -> PsResult<()> {
    let b = interp.op_stack.pop()?;
    let a = interp.op_stack.pop()?;
    interp.op_stack.push(Object::boolean(!a.ps_eq(&b)));
    Ok(())
}

/// Ordered comparison over two numbers or two strings.
fn compare(interp: &mut Interpreter, predicate: fn(std::cmp::Ordering) -> bool) -> PsResult<()> {
    let b = interp.op_stack.pop()?;
    let a = interp.op_stack.pop()?;
    let ordering = match (&a.value, &b.value) {
        (Value::String(x), Value::String(y)) => {
            a.check_read()?;
            b.check_read()?;
            x.bytes().cmp(&y.bytes())
        }
        _ => {
            let x = a.to_real()?;
            let y = b.to_real()?;
            x.partial_cmp(&y)
                .ok_or_else(|| PsError::new(ErrorKind::UndefinedResult, "unordered comparison"))?
        }
    };
    interp.op_stack.push(Object::boolean(predicate(ordering)));
    Ok(())
}

fn gt(interp: &mut Interpreter) -> PsResult<()> {
    compare(interp, std::cmp::Ordering::is_gt)
}

fn ge(interp: &mut Interpreter) -> PsResult<()> {
    compare(interp, std::cmp::Ordering::is_ge)
}

fn lt(interp: &mut Interpreter) -> PsResult<()> {
    compare(interp, std::cmp::Ordering::is_lt)
}

fn le(interp: &mut Interpreter) -> PsResult<()> {
    compare(interp, std::cmp::Ordering::is_le)
}

// ---------------------------------------------------------------------------
// Boolean and bitwise
// ---------------------------------------------------------------------------

/// Apply a logical/bitwise pair to two booleans or two integers.
fn bitwise(
    interp: &mut Interpreter,
    bool_op: fn(bool, bool) -> bool,
    int_op: fn(i32, i32) -> i32,
) -> PsResult<()> {
    let b = interp.op_stack.pop()?;
    let a = interp.op_stack.pop()?;
    let result = match (&a.value, &b.value) {
        (Value::Boolean(x), Value::Boolean(y)) => Object::boolean(bool_op(*x, *y)),
        (Value::Integer(x), Value::Integer(y)) => Object::integer(int_op(*x, *y)),
        _ => {
            return Err(PsError::new(
                ErrorKind::TypeCheck,
                "expected two booleans or two integers",
            ))
        }
    };
    interp.op_stack.push(result);
    Ok(())
}

fn and(interp: &mut Interpreter) -> PsResult<()> {
    bitwise(interp, |a, b| a && b, |a, b| a & b)
}

fn or(interp: &mut Interpreter) -> PsResult<()> {
    bitwise(interp, |a, b| a || b, |a, b| a | b)
}

fn xor(interp: &mut Interpreter) -> PsResult<()> {
    bitwise(interp, |a, b| a ^ b, |a, b| a ^ b)
}

fn not(interp: &mut Interpreter) -> PsResult<()> {
    let a = interp.op_stack.pop()?;
    let result = match a.value {
        Value::Boolean(b) => Object::boolean(!b),
        Value::Integer(i) => Object::integer(!i),
        _ => {
            return Err(PsError::new(
                ErrorKind::TypeCheck,
                "expected a boolean or an integer",
            ))
        }
    };
    interp.op_stack.push(result);
    Ok(())
}

fn bitshift(interp: &mut Interpreter) -> PsResult<()> {
    let shift = interp.op_stack.pop_int()?;
    let value = interp.op_stack.pop_int()?;
    let result = if shift >= 32 || shift <= -32 {
        if shift < 0 && value < 0 {
            -1
        } else {
            0
        }
    } else if shift >= 0 {
        value.wrapping_shl(shift.unsigned_abs())
    } else {
        value >> shift.unsigned_abs()
    };
    interp.op_stack.push(Object::integer(result));
    Ok(())
}
