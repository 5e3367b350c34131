//! Array, dictionary, and string operators.

use crate::error::{ErrorKind, PsError, PsResult};
use crate::lexer::ObjectReader;
use crate::object::{ArrayObj, DictObj, Object, OpFn, StringObj, Value};

use super::Interpreter;

pub(super) const OPERATORS: &[(&str, OpFn)] = &[
    ("array", array),
    ("length", length),
    ("get", get),
    ("put", put),
    ("getinterval", getinterval),
    ("putinterval", putinterval),
    ("aload", aload),
    ("astore", astore),
    ("string", string),
    ("search", search),
    ("anchorsearch", anchorsearch),
    ("token", token),
    ("dict", dict),
    ("begin", begin),
    ("end", end),
    ("def", def),
    ("store", store),
    ("load", load),
    ("where", where_op),
    ("known", known),
    ("undef", undef),
    ("maxlength", maxlength),
    ("currentdict", currentdict),
    ("countdictstack", countdictstack),
    ("dictstack", dictstack),
    ("<<", dict_open),
    (">>", dict_close),
];

// ---------------------------------------------------------------------------
// Composite access
// ---------------------------------------------------------------------------

fn array(interp: &mut Interpreter) -> PsResult<()> {
    let n = interp.op_stack.pop_nonneg_int()?;
    #[allow(clippy::cast_sign_loss)]
    let arr = ArrayObj::nulls(n as usize);
    interp.op_stack.push(Object::array(arr));
    Ok(())
}

fn string(interp: &mut Interpreter) -> PsResult<()> {
    let n = interp.op_stack.pop_nonneg_int()?;
    #[allow(clippy::cast_sign_loss)]
    let s = StringObj::zeroed(n as usize);
    interp.op_stack.push(Object::string(s));
    Ok(())
}

fn length(interp: &mut Interpreter) -> PsResult<()> {
    let obj = interp.op_stack.pop()?;
    obj.check_read()?;
    let len = match &obj.value {
        Value::Array(a) => a.len(),
        Value::String(s) => s.len(),
        Value::Dict(d) | Value::Font(d) => d.len(),
        Value::Name(n) => n.len(),
        _ => {
            return Err(PsError::new(
                ErrorKind::TypeCheck,
                format!("{} has no length", obj.type_name()),
            ))
        }
    };
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    let len = len as i32;
    interp.op_stack.push(Object::integer(len));
    Ok(())
}

fn get(interp: &mut Interpreter) -> PsResult<()> {
    let index = interp.op_stack.pop()?;
    let target = interp.op_stack.pop()?;
    target.check_read()?;
    let result = match &target.value {
        Value::Array(a) => a.get(index.to_nonneg_int()?.unsigned_abs() as usize)?,
        Value::String(s) => {
            let byte = s.get(index.to_nonneg_int()?.unsigned_abs() as usize)?;
            Object::integer(i32::from(byte))
        }
        Value::Dict(d) | Value::Font(d) => {
            let key = index.to_dict_key()?;
            d.get(&key)
                .ok_or_else(|| PsError::new(ErrorKind::Undefined, format!("key {key}")))?
        }
        _ => {
            return Err(PsError::new(
                ErrorKind::TypeCheck,
                format!("cannot get from {}", target.type_name()),
            ))
        }
    };
    interp.op_stack.push(result);
    Ok(())
}

fn put(interp: &mut Interpreter) -> PsResult<()> {
    let value = interp.op_stack.pop()?;
    let index = interp.op_stack.pop()?;
    let target = interp.op_stack.pop()?;
    target.check_write()?;
    match &target.value {
        Value::Array(a) => a.put(index.to_nonneg_int()?.unsigned_abs() as usize, value)?,
        Value::String(s) => {
            let byte = value.to_int()?;
            if !(0..=255).contains(&byte) {
                return Err(PsError::new(ErrorKind::RangeCheck, "byte out of range"));
            }
            #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
            s.put(index.to_nonneg_int()?.unsigned_abs() as usize, byte as u8)?;
        }
        Value::Dict(d) | Value::Font(d) => {
            d.set(index.to_dict_key()?, value);
        }
        _ => {
            return Err(PsError::new(
                ErrorKind::TypeCheck,
                format!("cannot put into {}", target.type_name()),
            ))
        }
    }
    Ok(())
}

fn getinterval(interp: &mut Interpreter) -> PsResult<()> {
    let count = interp.op_stack.pop_nonneg_int()?.unsigned_abs() as usize;
    let index = interp.op_stack.pop_nonneg_int()?.unsigned_abs() as usize;
    let target = interp.op_stack.pop()?;
    target.check_read()?;
    let result = match &target.value {
        Value::Array(a) => Object {
            value: Value::Array(a.getinterval(index, count)?),
            ..target
        },
        Value::String(s) => Object {
            value: Value::String(s.getinterval(index, count)?),
            ..target
        },
        _ => {
            return Err(PsError::new(
                ErrorKind::TypeCheck,
                format!("cannot take an interval of {}", target.type_name()),
            ))
        }
    };
    interp.op_stack.push(result);
    Ok(())
}

fn putinterval(interp: &mut Interpreter) -> PsResult<()> {
    let source = interp.op_stack.pop()?;
    source.check_read()?;
    let index = interp.op_stack.pop_nonneg_int()?.unsigned_abs() as usize;
    let target = interp.op_stack.pop()?;
    target.check_write()?;
    match (&target.value, &source.value) {
        (Value::Array(dst), Value::Array(src)) => dst.putinterval(index, src)?,
        (Value::String(dst), Value::String(src)) => dst.putinterval(index, src)?,
        _ => {
            return Err(PsError::new(
                ErrorKind::TypeCheck,
                "putinterval operands must be two arrays or two strings",
            ))
        }
    }
    Ok(())
}

fn aload(interp: &mut Interpreter) -> PsResult<()> {
    let obj = interp.op_stack.pop()?;
    obj.check_read()?;
    let arr = obj.to_array()?;
    for item in arr.snapshot() {
        interp.op_stack.push(item);
    }
    interp.op_stack.push(obj);
    Ok(())
}

fn astore(interp: &mut Interpreter) -> PsResult<()> {
    let obj = interp.op_stack.pop()?;
    obj.check_write()?;
    let arr = obj.to_array()?;
    let items = interp.op_stack.pop_n(arr.len())?;
    for (i, item) in items.into_iter().enumerate() {
        arr.put(i, item)?;
    }
    interp.op_stack.push(obj);
    Ok(())
}

// ---------------------------------------------------------------------------
// String search and parsing
// ---------------------------------------------------------------------------

/// Byte offset of `needle` within `haystack`, if present.
fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn search(interp: &mut Interpreter) -> PsResult<()> {
    let seek = interp.op_stack.pop_string()?;
    let obj = interp.op_stack.pop()?;
    obj.check_read()?;
    let target = obj.to_string_obj()?;
    match find(&target.bytes(), &seek.bytes()) {
        Some(at) => {
            let matched = target.getinterval(at, seek.len())?;
            let pre = target.getinterval(0, at)?;
            let post = target.getinterval(at + seek.len(), target.len() - at - seek.len())?;
            interp.op_stack.push(Object::string(post));
            interp.op_stack.push(Object::string(matched));
            interp.op_stack.push(Object::string(pre));
            interp.op_stack.push(Object::boolean(true));
        }
        None => {
            interp.op_stack.push(obj);
            interp.op_stack.push(Object::boolean(false));
        }
    }
    Ok(())
}

fn anchorsearch(interp: &mut Interpreter) -> PsResult<()> {
    let seek = interp.op_stack.pop_string()?;
    let obj = interp.op_stack.pop()?;
    obj.check_read()?;
    let target = obj.to_string_obj()?;
    let target_bytes = target.bytes();
    let seek_bytes = seek.bytes();
    if target_bytes.len() >= seek_bytes.len() && target_bytes[..seek_bytes.len()] == seek_bytes[..]
    {
        let matched = target.getinterval(0, seek.len())?;
        let post = target.getinterval(seek.len(), target.len() - seek.len())?;
        interp.op_stack.push(Object::string(post));
        interp.op_stack.push(Object::string(matched));
        interp.op_stack.push(Object::boolean(true));
    } else {
        interp.op_stack.push(obj);
        interp.op_stack.push(Object::boolean(false));
    }
    Ok(())
}

/// `token` scans the first object out of a string or a file.
fn token(interp: &mut Interpreter) -> PsResult<()> {
    let obj = interp.op_stack.pop()?;
    match &obj.value {
        Value::String(s) => {
            obj.check_read()?;
            let text = s.to_text();
            let mut reader = ObjectReader::new(&text);
            match reader.next_object()? {
                Some(scanned) => {
                    let consumed = reader.pos().min(s.len());
                    let post = s.getinterval(consumed, s.len() - consumed)?;
                    interp.op_stack.push(Object::string(post));
                    interp.op_stack.push(scanned);
                    interp.op_stack.push(Object::boolean(true));
                }
                None => interp.op_stack.push(Object::boolean(false)),
            }
            Ok(())
        }
        Value::File(file) => {
            match file.next_object()? {
                Some(scanned) => {
                    interp.op_stack.push(scanned);
                    interp.op_stack.push(Object::boolean(true));
                }
                None => interp.op_stack.push(Object::boolean(false)),
            }
            Ok(())
        }
        _ => Err(PsError::new(
            ErrorKind::TypeCheck,
            format!("cannot scan a token from {}", obj.type_name()),
        )),
    }
}

// ---------------------------------------------------------------------------
// Dictionaries
// ---------------------------------------------------------------------------

fn dict(interp: &mut Interpreter) -> PsResult<()> {
    let n = interp.op_stack.pop_nonneg_int()?;
    #[allow(clippy::cast_sign_loss)]
    let d = DictObj::with_capacity(n as usize);
    interp.op_stack.push(Object::dict(d));
    Ok(())
}

fn begin(interp: &mut Interpreter) -> PsResult<()> {
    let d = interp.op_stack.pop_dict()?;
    interp.dict_stack.begin(d);
    Ok(())
}

fn end(interp: &mut Interpreter) -> PsResult<()> {
    interp.dict_stack.end()
}

fn def(interp: &mut Interpreter) -> PsResult<()> {
    let value = interp.op_stack.pop()?;
    let key = interp.op_stack.pop_key()?;
    interp.dict_stack.def(key, value);
    Ok(())
}

fn store(interp: &mut Interpreter) -> PsResult<()> {
    let value = interp.op_stack.pop()?;
    let key = interp.op_stack.pop_key()?;
    interp.dict_stack.store(key, value);
    Ok(())
}

fn load(interp: &mut Interpreter) -> PsResult<()> {
    let key = interp.op_stack.pop_key()?;
    let value = interp
        .dict_stack
        .lookup(&key)
        .ok_or_else(|| PsError::new(ErrorKind::Undefined, format!("name {key} not defined")))?;
    interp.op_stack.push(value);
    Ok(())
}

fn where_op(interp: &mut Interpreter) -> PsResult<()> {
    let key = interp.op_stack.pop_key()?;
    match interp.dict_stack.where_defined(&key) {
        Some(d) => {
            interp.op_stack.push(Object::dict(d));
            interp.op_stack.push(Object::boolean(true));
        }
        None => interp.op_stack.push(Object::boolean(false)),
    }
    Ok(())
}

fn known(interp: &mut Interpreter) -> PsResult<()> {
    let key = interp.op_stack.pop_key()?;
    let d = interp.op_stack.pop_dict()?;
    interp.op_stack.push(Object::boolean(d.contains(&key)));
    Ok(())
}

fn undef(interp: &mut Interpreter) -> PsResult<()> {
    let key = interp.op_stack.pop_key()?;
    let d = interp.op_stack.pop_dict()?;
    d.remove(&key);
    Ok(())
}

fn maxlength(interp: &mut Interpreter) -> PsResult<()> {
    let d = interp.op_stack.pop_dict()?;
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    let capacity = d.capacity() as i32;
    interp.op_stack.push(Object::integer(capacity));
    Ok(())
}

fn currentdict(interp: &mut Interpreter) -> PsResult<()> {
    let d = interp.dict_stack.current();
    interp.op_stack.push(Object::dict(d));
    Ok(())
}

fn countdictstack(interp: &mut Interpreter) -> PsResult<()> {
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    let depth = interp.dict_stack.depth() as i32;
    interp.op_stack.push(Object::integer(depth));
    Ok(())
}

fn dictstack(interp: &mut Interpreter) -> PsResult<()> {
    let target = interp.op_stack.pop_array()?;
    let dicts = interp.dict_stack.snapshot();
    if dicts.len() > target.len() {
        return Err(PsError::new(
            ErrorKind::RangeCheck,
            "array too small for the dictionary stack",
        ));
    }
    for (i, d) in dicts.iter().enumerate() {
        target.put(i, Object::dict(d.clone()))?;
    }
    let written = target.getinterval(0, dicts.len())?;
    interp.op_stack.push(Object::array(written));
    Ok(())
}

/// `<<` just drops a mark; `>>` collects the pairs above it.
fn dict_open(interp: &mut Interpreter) -> PsResult<()> {
    interp.op_stack.push(Object::mark());
    Ok(())
}

fn dict_close(interp: &mut Interpreter) -> PsResult<()> {
    let depth = interp.op_stack.count_to_mark()?;
    if depth % 2 != 0 {
        return Err(PsError::new(
            ErrorKind::RangeCheck,
            "odd number of objects between << and >>",
        ));
    }
    let mut items = interp.op_stack.pop_n(depth + 1)?;
    items.remove(0); // the mark
    let d = DictObj::with_capacity(depth / 2);
    let mut iter = items.into_iter();
    while let (Some(key), Some(value)) = (iter.next(), iter.next()) {
        d.set(key.to_dict_key()?, value);
    }
    interp.op_stack.push(Object::dict(d));
    Ok(())
}
