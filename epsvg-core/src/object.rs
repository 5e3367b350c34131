//! The tagged object model.
//!
//! Every operand is an [`Object`]: a [`Value`] plus the two attributes
//! PostScript attaches to objects rather than to values — the
//! literal/executable flag and the access level. Composite values
//! (strings, arrays, dictionaries) share their backing storage through
//! `Rc<RefCell<..>>`; array and string objects are *views* carrying an
//! offset and length, so `getinterval` aliases the original storage and
//! writes through one view are visible through every other.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use epsvg_graphics::matrix::Matrix;

use crate::error::{ErrorKind, PsError, PsResult};
use crate::interpreter::Interpreter;
use crate::lexer::ObjectReader;

/// Signature of an operator implementation.
pub type OpFn = fn(&mut Interpreter) -> PsResult<()>;

// ---------------------------------------------------------------------------
// Access attribute
// ---------------------------------------------------------------------------

/// Access level of an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Access {
    /// All operations permitted.
    #[default]
    Unlimited,
    /// Value may be read and executed, not written.
    ReadOnly,
    /// Value may only be executed.
    ExecuteOnly,
    /// No operations permitted.
    None,
}

impl Access {
    #[must_use]
    pub const fn can_read(self) -> bool {
        matches!(self, Self::Unlimited | Self::ReadOnly)
    }

    #[must_use]
    pub const fn can_write(self) -> bool {
        matches!(self, Self::Unlimited)
    }

    #[must_use]
    pub const fn can_execute(self) -> bool {
        !matches!(self, Self::None)
    }
}

// ---------------------------------------------------------------------------
// Object
// ---------------------------------------------------------------------------

/// A PostScript object: value plus per-object attributes.
#[derive(Debug, Clone)]
pub struct Object {
    /// Literal objects push themselves when executed.
    pub literal: bool,
    /// Access level.
    pub access: Access,
    /// The value, possibly shared.
    pub value: Value,
}

/// The value variants.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i32),
    Real(f64),
    Name(String),
    String(StringObj),
    Array(ArrayObj),
    Dict(DictObj),
    Operator(Operator),
    File(FileObj),
    Mark,
    Font(DictObj),
}

impl Object {
    fn literal_value(value: Value) -> Self {
        Self {
            literal: true,
            access: Access::Unlimited,
            value,
        }
    }

    // -- Constructors -------------------------------------------------------

    #[must_use]
    pub fn null() -> Self {
        Self::literal_value(Value::Null)
    }

    #[must_use]
    pub fn boolean(b: bool) -> Self {
        Self::literal_value(Value::Boolean(b))
    }

    #[must_use]
    pub fn integer(i: i32) -> Self {
        Self::literal_value(Value::Integer(i))
    }

    #[must_use]
    pub fn real(r: f64) -> Self {
        Self::literal_value(Value::Real(r))
    }

    /// A literal (slash-prefixed) name.
    #[must_use]
    pub fn literal_name(name: impl Into<String>) -> Self {
        Self::literal_value(Value::Name(name.into()))
    }

    /// An executable name.
    #[must_use]
    pub fn executable_name(name: impl Into<String>) -> Self {
        Self {
            literal: false,
            access: Access::Unlimited,
            value: Value::Name(name.into()),
        }
    }

    #[must_use]
    pub fn string(s: StringObj) -> Self {
        Self::literal_value(Value::String(s))
    }

    #[must_use]
    pub fn string_from_text(text: &str) -> Self {
        Self::string(StringObj::from_bytes(text.bytes().collect()))
    }

    /// A literal array.
    #[must_use]
    pub fn array(a: ArrayObj) -> Self {
        Self::literal_value(Value::Array(a))
    }

    /// An executable array (procedure).
    #[must_use]
    pub fn procedure(a: ArrayObj) -> Self {
        Self {
            literal: false,
            access: Access::Unlimited,
            value: Value::Array(a),
        }
    }

    #[must_use]
    pub fn dict(d: DictObj) -> Self {
        Self::literal_value(Value::Dict(d))
    }

    #[must_use]
    pub fn font(d: DictObj) -> Self {
        Self::literal_value(Value::Font(d))
    }

    #[must_use]
    pub fn operator(op: Operator) -> Self {
        Self {
            literal: false,
            access: Access::Unlimited,
            value: Value::Operator(op),
        }
    }

    #[must_use]
    pub fn file(f: FileObj) -> Self {
        Self {
            literal: false,
            access: Access::Unlimited,
            value: Value::File(f),
        }
    }

    #[must_use]
    pub fn mark() -> Self {
        Self::literal_value(Value::Mark)
    }

    /// A matrix as a six-element literal array of reals.
    #[must_use]
    pub fn from_matrix(m: &Matrix) -> Self {
        let coeffs = m.as_coeffs();
        Self::array(ArrayObj::from_objects(
            coeffs.iter().map(|&c| Self::real(c)).collect(),
        ))
    }

    // -- Attribute helpers --------------------------------------------------

    /// Flip to executable (`cvx`).
    #[must_use]
    pub fn into_executable(mut self) -> Self {
        self.literal = false;
        self
    }

    /// Flip to literal (`cvlit`).
    #[must_use]
    pub fn into_literal(mut self) -> Self {
        self.literal = true;
        self
    }

    /// The `type` operator's name for this object.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self.value {
            Value::Null => "nulltype",
            Value::Boolean(_) => "booleantype",
            Value::Integer(_) => "integertype",
            Value::Real(_) => "realtype",
            Value::Name(_) => "nametype",
            Value::String(_) => "stringtype",
            Value::Array(_) => "arraytype",
            Value::Dict(_) | Value::Font(_) => "dicttype",
            Value::Operator(_) => "operatortype",
            Value::File(_) => "filetype",
            Value::Mark => "marktype",
        }
    }

    /// Whether reading the value is permitted.
    pub fn check_read(&self) -> PsResult<()> {
        if self.access.can_read() {
            Ok(())
        } else {
            Err(PsError::new(
                ErrorKind::InvalidAccess,
                format!("{} is not readable", self.type_name()),
            ))
        }
    }

    /// Whether writing the value is permitted.
    pub fn check_write(&self) -> PsResult<()> {
        if self.access.can_write() {
            Ok(())
        } else {
            Err(PsError::new(
                ErrorKind::InvalidAccess,
                format!("{} is not writable", self.type_name()),
            ))
        }
    }

    /// Whether executing the value is permitted.
    pub fn check_execute(&self) -> PsResult<()> {
        if self.access.can_execute() {
            Ok(())
        } else {
            Err(PsError::new(
                ErrorKind::InvalidAccess,
                format!("{} is not executable", self.type_name()),
            ))
        }
    }

    // -- Coercions ----------------------------------------------------------
    //
    // Each returns TypeCheck unless the value is of (or convertible to)
    // the requested type. Real never silently becomes Integer.

    pub fn to_int(&self) -> PsResult<i32> {
        match self.value {
            Value::Integer(i) => Ok(i),
            _ => Err(self.type_error("integer")),
        }
    }

    pub fn to_nonneg_int(&self) -> PsResult<i32> {
        let n = self.to_int()?;
        if n < 0 {
            Err(PsError::new(
                ErrorKind::RangeCheck,
                format!("expected non-negative integer, got {n}"),
            ))
        } else {
            Ok(n)
        }
    }

    pub fn to_real(&self) -> PsResult<f64> {
        match self.value {
            Value::Integer(i) => Ok(f64::from(i)),
            Value::Real(r) => Ok(r),
            _ => Err(self.type_error("number")),
        }
    }

    pub fn to_bool(&self) -> PsResult<bool> {
        match self.value {
            Value::Boolean(b) => Ok(b),
            _ => Err(self.type_error("boolean")),
        }
    }

    /// The text of a name.
    pub fn to_name_text(&self) -> PsResult<&str> {
        match &self.value {
            Value::Name(n) => Ok(n),
            _ => Err(self.type_error("name")),
        }
    }

    /// Convert to a dictionary key: names and strings use their text,
    /// numbers their numeral.
    pub fn to_dict_key(&self) -> PsResult<String> {
        match &self.value {
            Value::Name(n) => Ok(n.clone()),
            Value::String(s) => {
                self.check_read()?;
                Ok(s.to_text())
            }
            Value::Integer(i) => Ok(i.to_string()),
            Value::Real(r) => Ok(format_real(*r)),
            _ => Err(self.type_error("dictionary key")),
        }
    }

    pub fn to_string_obj(&self) -> PsResult<StringObj> {
        match &self.value {
            Value::String(s) => Ok(s.clone()),
            _ => Err(self.type_error("string")),
        }
    }

    pub fn to_array(&self) -> PsResult<ArrayObj> {
        match &self.value {
            Value::Array(a) => Ok(a.clone()),
            _ => Err(self.type_error("array")),
        }
    }

    /// An executable array.
    pub fn to_proc(&self) -> PsResult<ArrayObj> {
        match &self.value {
            Value::Array(a) if !self.literal => Ok(a.clone()),
            _ => Err(self.type_error("procedure")),
        }
    }

    pub fn to_dict(&self) -> PsResult<DictObj> {
        match &self.value {
            Value::Dict(d) | Value::Font(d) => Ok(d.clone()),
            _ => Err(self.type_error("dictionary")),
        }
    }

    pub fn to_font(&self) -> PsResult<DictObj> {
        match &self.value {
            Value::Font(d) => Ok(d.clone()),
            // A plain dict with the font keys also passes (definefont
            // takes one).
            Value::Dict(d) => Ok(d.clone()),
            _ => Err(self.type_error("font")),
        }
    }

    /// A six-element numeric array as a matrix.
    pub fn to_matrix(&self) -> PsResult<Matrix> {
        let array = self.to_array()?;
        self.check_read()?;
        if array.len() != 6 {
            return Err(PsError::new(
                ErrorKind::RangeCheck,
                format!("matrix needs 6 elements, got {}", array.len()),
            ));
        }
        let mut coeffs = [0.0; 6];
        for (i, c) in coeffs.iter_mut().enumerate() {
            *c = array.get(i)?.to_real()?;
        }
        Ok(Matrix::from_coeffs(coeffs))
    }

    fn type_error(&self, expected: &str) -> PsError {
        PsError::new(
            ErrorKind::TypeCheck,
            format!("expected {expected}, got {}", self.type_name()),
        )
    }

    // -- Equality -----------------------------------------------------------

    /// The `eq` operator's notion of equality: numbers by value across
    /// Integer/Real, names and strings by text against each other,
    /// composites by shared backing storage and identical view bounds.
    #[must_use]
    pub fn ps_eq(&self, other: &Self) -> bool {
        match (&self.value, &other.value) {
            (Value::Null, Value::Null) | (Value::Mark, Value::Mark) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => a == b,
            (Value::Integer(a), Value::Real(b)) | (Value::Real(b), Value::Integer(a)) => {
                f64::from(*a) == *b
            }
            (Value::Name(a), Value::Name(b)) => a == b,
            (Value::Name(a), Value::String(b)) | (Value::String(b), Value::Name(a)) => {
                *a == b.to_text()
            }
            (Value::String(a), Value::String(b)) => a.same_view(b),
            (Value::Array(a), Value::Array(b)) => a.same_view(b),
            (Value::Dict(a), Value::Dict(b))
            | (Value::Font(a), Value::Font(b))
            | (Value::Dict(a), Value::Font(b))
            | (Value::Font(a), Value::Dict(b)) => a.ptr_eq(b),
            (Value::Operator(a), Value::Operator(b)) => a == b,
            (Value::File(a), Value::File(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    // -- Text forms ---------------------------------------------------------

    /// The `==` operator's text for this object.
    #[must_use]
    pub fn describe(&self) -> String {
        match &self.value {
            Value::Null => "null".into(),
            Value::Boolean(b) => b.to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Real(r) => format_real(*r),
            Value::Name(n) => {
                if self.literal {
                    format!("/{n}")
                } else {
                    n.clone()
                }
            }
            Value::String(s) => format!("({})", s.to_text()),
            Value::Array(a) => {
                let (open, close) = if self.literal { ("[", "]") } else { ("{", "}") };
                let items: Vec<String> = a
                    .snapshot()
                    .iter()
                    .map(Object::describe)
                    .collect();
                format!("{open}{}{close}", items.join(" "))
            }
            Value::Dict(_) => "-dict-".into(),
            Value::Font(_) => "-font-".into(),
            Value::Operator(op) => format!("--{}--", op.name),
            Value::File(_) => "-file-".into(),
            Value::Mark => "-mark-".into(),
        }
    }

    /// The `cvs` text for this object.
    #[must_use]
    pub fn cvs_text(&self) -> String {
        match &self.value {
            Value::Boolean(b) => b.to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Real(r) => format_real(*r),
            Value::Name(n) => n.clone(),
            Value::String(s) => s.to_text(),
            Value::Operator(op) => op.name.to_string(),
            _ => "--nostringval--".into(),
        }
    }
}

/// Format a real the way PostScript prints one: an integral value keeps
/// a trailing `.0`.
#[must_use]
pub fn format_real(r: f64) -> String {
    if r.is_finite() && r == r.trunc() && r.abs() < 1e15 {
        format!("{r:.1}")
    } else {
        format!("{r}")
    }
}

// ---------------------------------------------------------------------------
// Strings
// ---------------------------------------------------------------------------

/// A string value: a shared byte buffer plus a view window.
#[derive(Debug, Clone)]
pub struct StringObj {
    data: Rc<RefCell<Vec<u8>>>,
    offset: usize,
    len: usize,
}

impl StringObj {
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let len = bytes.len();
        Self {
            data: Rc::new(RefCell::new(bytes)),
            offset: 0,
            len,
        }
    }

    /// A zero-filled string of the given length (the `string` operator).
    #[must_use]
    pub fn zeroed(len: usize) -> Self {
        Self::from_bytes(vec![0; len])
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Byte at `index` within the view.
    pub fn get(&self, index: usize) -> PsResult<u8> {
        if index >= self.len {
            return Err(string_range_error(index, self.len));
        }
        Ok(self.data.borrow()[self.offset + index])
    }

    /// Store a byte at `index` within the view.
    pub fn put(&self, index: usize, byte: u8) -> PsResult<()> {
        if index >= self.len {
            return Err(string_range_error(index, self.len));
        }
        self.data.borrow_mut()[self.offset + index] = byte;
        Ok(())
    }

    /// A subview sharing this string's storage.
    pub fn getinterval(&self, index: usize, count: usize) -> PsResult<Self> {
        if index.checked_add(count).map_or(true, |end| end > self.len) {
            return Err(PsError::new(
                ErrorKind::RangeCheck,
                format!("interval {index}+{count} exceeds length {}", self.len),
            ));
        }
        Ok(Self {
            data: Rc::clone(&self.data),
            offset: self.offset + index,
            len: count,
        })
    }

    /// Copy `src` into this string starting at `index`.
    pub fn putinterval(&self, index: usize, src: &Self) -> PsResult<()> {
        if index + src.len() > self.len {
            return Err(PsError::new(
                ErrorKind::RangeCheck,
                format!(
                    "interval {index}+{} exceeds length {}",
                    src.len(),
                    self.len
                ),
            ));
        }
        let bytes = src.bytes();
        let mut data = self.data.borrow_mut();
        data[self.offset + index..self.offset + index + bytes.len()].copy_from_slice(&bytes);
        Ok(())
    }

    /// A copy of the viewed bytes.
    #[must_use]
    pub fn bytes(&self) -> Vec<u8> {
        self.data.borrow()[self.offset..self.offset + self.len].to_vec()
    }

    /// The viewed bytes decoded as Latin-1 text.
    #[must_use]
    pub fn to_text(&self) -> String {
        self.bytes().iter().map(|&b| char::from(b)).collect()
    }

    /// Overwrite the start of the view with `text`, returning the
    /// written-to subview (the `cvs` result).
    pub fn write_text(&self, text: &str) -> PsResult<Self> {
        let bytes: Vec<u8> = text.bytes().collect();
        if bytes.len() > self.len {
            return Err(PsError::new(
                ErrorKind::RangeCheck,
                format!("text of {} byte(s) exceeds string length {}", bytes.len(), self.len),
            ));
        }
        let mut data = self.data.borrow_mut();
        data[self.offset..self.offset + bytes.len()].copy_from_slice(&bytes);
        drop(data);
        self.getinterval(0, bytes.len())
    }

    /// Identity: same storage, same view bounds.
    #[must_use]
    pub fn same_view(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
            && self.offset == other.offset
            && self.len == other.len
    }
}

fn string_range_error(index: usize, len: usize) -> PsError {
    PsError::new(
        ErrorKind::RangeCheck,
        format!("index {index} outside string of length {len}"),
    )
}

// ---------------------------------------------------------------------------
// Arrays
// ---------------------------------------------------------------------------

/// An array value: shared element storage plus a view window.
#[derive(Debug, Clone)]
pub struct ArrayObj {
    data: Rc<RefCell<Vec<Object>>>,
    offset: usize,
    len: usize,
}

impl ArrayObj {
    #[must_use]
    pub fn from_objects(objects: Vec<Object>) -> Self {
        let len = objects.len();
        Self {
            data: Rc::new(RefCell::new(objects)),
            offset: 0,
            len,
        }
    }

    /// An array of `len` nulls (the `array` operator).
    #[must_use]
    pub fn nulls(len: usize) -> Self {
        Self::from_objects((0..len).map(|_| Object::null()).collect())
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Element at `index` within the view.
    pub fn get(&self, index: usize) -> PsResult<Object> {
        if index >= self.len {
            return Err(array_range_error(index, self.len));
        }
        Ok(self.data.borrow()[self.offset + index].clone())
    }

    /// Store an element at `index` within the view.
    pub fn put(&self, index: usize, obj: Object) -> PsResult<()> {
        if index >= self.len {
            return Err(array_range_error(index, self.len));
        }
        self.data.borrow_mut()[self.offset + index] = obj;
        Ok(())
    }

    /// A subview sharing this array's storage.
    pub fn getinterval(&self, index: usize, count: usize) -> PsResult<Self> {
        if index.checked_add(count).map_or(true, |end| end > self.len) {
            return Err(PsError::new(
                ErrorKind::RangeCheck,
                format!("interval {index}+{count} exceeds length {}", self.len),
            ));
        }
        Ok(Self {
            data: Rc::clone(&self.data),
            offset: self.offset + index,
            len: count,
        })
    }

    /// Copy `src`'s elements into this array starting at `index`.
    pub fn putinterval(&self, index: usize, src: &Self) -> PsResult<()> {
        if index + src.len() > self.len {
            return Err(PsError::new(
                ErrorKind::RangeCheck,
                format!(
                    "interval {index}+{} exceeds length {}",
                    src.len(),
                    self.len
                ),
            ));
        }
        let elements = src.snapshot();
        let mut data = self.data.borrow_mut();
        for (i, obj) in elements.into_iter().enumerate() {
            data[self.offset + index + i] = obj;
        }
        Ok(())
    }

    /// A copy of the viewed elements.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Object> {
        self.data.borrow()[self.offset..self.offset + self.len].to_vec()
    }

    /// Identity: same storage, same view bounds.
    #[must_use]
    pub fn same_view(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
            && self.offset == other.offset
            && self.len == other.len
    }

    /// Whether the two views share backing storage at all.
    #[must_use]
    pub fn shares_storage(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }
}

fn array_range_error(index: usize, len: usize) -> PsError {
    PsError::new(
        ErrorKind::RangeCheck,
        format!("index {index} outside array of length {len}"),
    )
}

// ---------------------------------------------------------------------------
// Dictionaries
// ---------------------------------------------------------------------------

/// A dictionary value with shared storage.
#[derive(Debug, Clone)]
pub struct DictObj {
    data: Rc<RefCell<DictData>>,
}

#[derive(Debug)]
struct DictData {
    map: HashMap<String, Object>,
    capacity: usize,
}

impl DictObj {
    /// An empty dictionary with the given nominal capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Rc::new(RefCell::new(DictData {
                map: HashMap::with_capacity(capacity),
                capacity,
            })),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<Object> {
        self.data.borrow().map.get(key).cloned()
    }

    pub fn set(&self, key: impl Into<String>, obj: Object) {
        self.data.borrow_mut().map.insert(key.into(), obj);
    }

    /// Remove a key (`undef`). Absent keys are not an error.
    pub fn remove(&self, key: &str) {
        self.data.borrow_mut().map.remove(key);
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.data.borrow().map.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.borrow().map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.borrow().map.is_empty()
    }

    /// Nominal capacity (the `dict` operand; grows past it freely).
    #[must_use]
    pub fn capacity(&self) -> usize {
        let data = self.data.borrow();
        data.capacity.max(data.map.len())
    }

    /// Snapshot of the entries, for `forall`.
    #[must_use]
    pub fn entries(&self) -> Vec<(String, Object)> {
        self.data
            .borrow()
            .map
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Identity comparison.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }
}

// ---------------------------------------------------------------------------
// Operators and files
// ---------------------------------------------------------------------------

/// A built-in operator: a name and its implementation.
#[derive(Clone, Copy)]
pub struct Operator {
    pub name: &'static str,
    pub func: OpFn,
}

impl fmt::Debug for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Operator({})", self.name)
    }
}

impl PartialEq for Operator {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.func as usize == other.func as usize
    }
}

/// A file value: a shared handle on an object reader. Executing the
/// file pulls objects from the reader until it is exhausted, so
/// execution interleaves with parsing.
#[derive(Debug, Clone)]
pub struct FileObj {
    reader: Rc<RefCell<ObjectReader>>,
}

impl FileObj {
    #[must_use]
    pub fn from_source(source: &str) -> Self {
        Self {
            reader: Rc::new(RefCell::new(ObjectReader::new(source))),
        }
    }

    /// Pull the next object, or `None` at end of input.
    pub fn next_object(&self) -> PsResult<Option<Object>> {
        self.reader.borrow_mut().next_object()
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.reader, &other.reader)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_eq_across_types() {
        assert!(Object::integer(3).ps_eq(&Object::real(3.0)));
        assert!(!Object::integer(3).ps_eq(&Object::real(3.5)));
    }

    #[test]
    fn name_string_eq_by_text() {
        let name = Object::literal_name("abc");
        let string = Object::string_from_text("abc");
        assert!(name.ps_eq(&string));
        assert!(string.ps_eq(&name));
        assert!(!name.ps_eq(&Object::string_from_text("abd")));
    }

    #[test]
    fn string_eq_is_identity() {
        let a = Object::string_from_text("abc");
        let b = Object::string_from_text("abc");
        assert!(!a.ps_eq(&b));
        assert!(a.ps_eq(&a.clone()));
    }

    #[test]
    fn array_views_share_storage() {
        let base = ArrayObj::from_objects(vec![
            Object::integer(1),
            Object::integer(2),
            Object::integer(3),
            Object::integer(4),
        ]);
        let view = base.getinterval(1, 2).unwrap();
        assert_eq!(view.len(), 2);
        assert_eq!(view.get(0).unwrap().to_int().unwrap(), 2);

        // Writing through the view is visible through the base
        view.put(0, Object::integer(99)).unwrap();
        assert_eq!(base.get(1).unwrap().to_int().unwrap(), 99);
        assert!(view.shares_storage(&base));
    }

    #[test]
    fn array_eq_requires_same_bounds() {
        let base = ArrayObj::nulls(4);
        let a = base.getinterval(0, 2).unwrap();
        let b = base.getinterval(0, 3).unwrap();
        let a2 = base.getinterval(0, 2).unwrap();
        assert!(!Object::array(a.clone()).ps_eq(&Object::array(b)));
        assert!(Object::array(a).ps_eq(&Object::array(a2)));
    }

    #[test]
    fn array_putinterval_writes_through() {
        let base = ArrayObj::nulls(5);
        let src = ArrayObj::from_objects(vec![Object::integer(7), Object::integer(8)]);
        base.putinterval(2, &src).unwrap();
        assert_eq!(base.get(2).unwrap().to_int().unwrap(), 7);
        assert_eq!(base.get(3).unwrap().to_int().unwrap(), 8);
        assert!(base.putinterval(4, &src).is_err());
    }

    #[test]
    fn string_interval_aliases() {
        let s = StringObj::from_bytes(b"hello".to_vec());
        let sub = s.getinterval(1, 3).unwrap();
        assert_eq!(sub.to_text(), "ell");
        sub.put(0, b'X').unwrap();
        assert_eq!(s.to_text(), "hXllo");
    }

    #[test]
    fn string_range_errors() {
        let s = StringObj::zeroed(3);
        assert_eq!(s.get(3).unwrap_err().kind, ErrorKind::RangeCheck);
        assert_eq!(s.put(5, 0).unwrap_err().kind, ErrorKind::RangeCheck);
        assert_eq!(
            s.getinterval(2, 2).unwrap_err().kind,
            ErrorKind::RangeCheck
        );
    }

    #[test]
    fn string_write_text_returns_subview() {
        let s = StringObj::zeroed(10);
        let sub = s.write_text("42").unwrap();
        assert_eq!(sub.len(), 2);
        assert_eq!(sub.to_text(), "42");
        assert!(s.write_text("elevenchars").is_err());
    }

    #[test]
    fn real_never_coerces_to_int() {
        assert_eq!(
            Object::real(3.0).to_int().unwrap_err().kind,
            ErrorKind::TypeCheck
        );
        assert_eq!(Object::integer(3).to_real().unwrap(), 3.0);
    }

    #[test]
    fn access_checks() {
        let mut obj = Object::string_from_text("x");
        obj.access = Access::ReadOnly;
        assert!(obj.check_read().is_ok());
        assert_eq!(obj.check_write().unwrap_err().kind, ErrorKind::InvalidAccess);
        obj.access = Access::ExecuteOnly;
        assert_eq!(obj.check_read().unwrap_err().kind, ErrorKind::InvalidAccess);
        assert!(obj.check_execute().is_ok());
        obj.access = Access::None;
        assert_eq!(
            obj.check_execute().unwrap_err().kind,
            ErrorKind::InvalidAccess
        );
    }

    #[test]
    fn matrix_conversion() {
        let m = Matrix::new(1.0, 0.0, 0.0, 1.0, 5.0, 6.0);
        let obj = Object::from_matrix(&m);
        assert_eq!(obj.to_matrix().unwrap(), m);

        let short = Object::array(ArrayObj::nulls(3));
        assert_eq!(short.to_matrix().unwrap_err().kind, ErrorKind::RangeCheck);
    }

    #[test]
    fn describe_forms() {
        assert_eq!(Object::literal_name("x").describe(), "/x");
        assert_eq!(Object::executable_name("x").describe(), "x");
        assert_eq!(Object::real(2.0).describe(), "2.0");
        assert_eq!(Object::real(2.5).describe(), "2.5");
        assert_eq!(Object::string_from_text("hi").describe(), "(hi)");
        let arr = ArrayObj::from_objects(vec![Object::integer(1), Object::integer(2)]);
        assert_eq!(Object::array(arr.clone()).describe(), "[1 2]");
        assert_eq!(Object::procedure(arr).describe(), "{1 2}");
        assert_eq!(Object::mark().describe(), "-mark-");
    }

    #[test]
    fn dict_capacity_grows() {
        let d = DictObj::with_capacity(1);
        d.set("a", Object::integer(1));
        d.set("b", Object::integer(2));
        assert_eq!(d.len(), 2);
        assert_eq!(d.capacity(), 2);
    }

    #[test]
    fn dict_key_conversions() {
        assert_eq!(Object::literal_name("k").to_dict_key().unwrap(), "k");
        assert_eq!(Object::integer(7).to_dict_key().unwrap(), "7");
        assert_eq!(Object::real(1.5).to_dict_key().unwrap(), "1.5");
        assert_eq!(
            Object::string_from_text("s").to_dict_key().unwrap(),
            "s"
        );
        assert!(Object::mark().to_dict_key().is_err());
    }
}
