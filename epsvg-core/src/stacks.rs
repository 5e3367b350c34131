//! The operand and dictionary stacks.

use epsvg_graphics::matrix::Matrix;

use crate::error::{ErrorKind, PsError, PsResult};
use crate::object::{ArrayObj, DictObj, Object, StringObj, Value};

// ---------------------------------------------------------------------------
// Operand stack
// ---------------------------------------------------------------------------

/// The operand stack.
///
/// Typed pop helpers combine the pop with a coercion. When the coercion
/// fails, the popped operands are *not* restored — failed operators
/// leave partially consumed stacks behind, as PostScript's do.
#[derive(Debug, Default)]
pub struct OperandStack {
    objects: Vec<Object>,
}

impl OperandStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn push(&mut self, obj: Object) {
        self.objects.push(obj);
    }

    pub fn pop(&mut self) -> PsResult<Object> {
        self.objects
            .pop()
            .ok_or_else(|| PsError::from_kind(ErrorKind::StackUnderflow))
    }

    /// The object `n` down from the top, without removing it.
    pub fn peek(&self, n: usize) -> PsResult<Object> {
        let count = self.objects.len();
        if n >= count {
            return Err(PsError::from_kind(ErrorKind::StackUnderflow));
        }
        Ok(self.objects[count - 1 - n].clone())
    }

    pub fn clear(&mut self) {
        self.objects.clear();
    }

    /// Remove and return the top `n` objects, bottom-most first.
    pub fn pop_n(&mut self, n: usize) -> PsResult<Vec<Object>> {
        let count = self.objects.len();
        if n > count {
            return Err(PsError::from_kind(ErrorKind::StackUnderflow));
        }
        Ok(self.objects.split_off(count - n))
    }

    /// Snapshot of the stack, bottom first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Object> {
        self.objects.clone()
    }

    /// Distance from the top to the topmost mark.
    pub fn count_to_mark(&self) -> PsResult<usize> {
        for (depth, obj) in self.objects.iter().rev().enumerate() {
            if matches!(obj.value, Value::Mark) {
                return Ok(depth);
            }
        }
        Err(PsError::from_kind(ErrorKind::UnmatchedMark))
    }

    // -- Typed pops ---------------------------------------------------------

    pub fn pop_int(&mut self) -> PsResult<i32> {
        self.pop()?.to_int()
    }

    pub fn pop_nonneg_int(&mut self) -> PsResult<i32> {
        self.pop()?.to_nonneg_int()
    }

    pub fn pop_real(&mut self) -> PsResult<f64> {
        self.pop()?.to_real()
    }

    pub fn pop_bool(&mut self) -> PsResult<bool> {
        self.pop()?.to_bool()
    }

    pub fn pop_array(&mut self) -> PsResult<ArrayObj> {
        self.pop()?.to_array()
    }

    pub fn pop_proc(&mut self) -> PsResult<ArrayObj> {
        self.pop()?.to_proc()
    }

    pub fn pop_dict(&mut self) -> PsResult<DictObj> {
        self.pop()?.to_dict()
    }

    pub fn pop_string(&mut self) -> PsResult<StringObj> {
        let obj = self.pop()?;
        obj.check_read()?;
        obj.to_string_obj()
    }

    /// Pop a key usable in a dictionary.
    pub fn pop_key(&mut self) -> PsResult<String> {
        self.pop()?.to_dict_key()
    }

    pub fn pop_matrix(&mut self) -> PsResult<Matrix> {
        self.pop()?.to_matrix()
    }

    /// Pop an (x, y) operand pair.
    pub fn pop_xy(&mut self) -> PsResult<(f64, f64)> {
        let y = self.pop_real()?;
        let x = self.pop_real()?;
        Ok((x, y))
    }
}

// ---------------------------------------------------------------------------
// Dictionary stack
// ---------------------------------------------------------------------------

/// The dictionary stack.
///
/// The bottom three entries — systemdict, globaldict, userdict — are
/// permanent: `end` never removes them.
#[derive(Debug)]
pub struct DictStack {
    dicts: Vec<DictObj>,
}

/// Number of permanent dictionaries at the bottom of the stack.
const PERMANENT: usize = 3;

impl DictStack {
    /// Build a stack from the three permanent dictionaries.
    #[must_use]
    pub fn new(systemdict: DictObj, globaldict: DictObj, userdict: DictObj) -> Self {
        Self {
            dicts: vec![systemdict, globaldict, userdict],
        }
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.dicts.len()
    }

    /// The topmost (current) dictionary.
    #[must_use]
    pub fn current(&self) -> DictObj {
        self.dicts[self.dicts.len() - 1].clone()
    }

    #[must_use]
    pub fn systemdict(&self) -> DictObj {
        self.dicts[0].clone()
    }

    #[must_use]
    pub fn userdict(&self) -> DictObj {
        self.dicts[PERMANENT - 1].clone()
    }

    /// Push a dictionary (`begin`).
    pub fn begin(&mut self, dict: DictObj) {
        self.dicts.push(dict);
    }

    /// Pop the current dictionary (`end`).
    pub fn end(&mut self) -> PsResult<()> {
        if self.dicts.len() <= PERMANENT {
            return Err(PsError::new(
                ErrorKind::DictStackUnderflow,
                "cannot end a permanent dictionary",
            ));
        }
        self.dicts.pop();
        Ok(())
    }

    /// Top-down lookup.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<Object> {
        self.dicts.iter().rev().find_map(|d| d.get(key))
    }

    /// The topmost dictionary defining `key` (`where`).
    #[must_use]
    pub fn where_defined(&self, key: &str) -> Option<DictObj> {
        self.dicts.iter().rev().find(|d| d.contains(key)).cloned()
    }

    /// Define in the current dictionary (`def`).
    pub fn def(&mut self, key: impl Into<String>, value: Object) {
        self.current().set(key, value);
    }

    /// Replace the topmost existing definition, or define in the current
    /// dictionary (`store`).
    pub fn store(&mut self, key: String, value: Object) {
        match self.where_defined(&key) {
            Some(dict) => dict.set(key, value),
            None => self.def(key, value),
        }
    }

    /// Snapshot of the stack, bottom first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<DictObj> {
        self.dicts.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn dict_stack() -> DictStack {
        DictStack::new(
            DictObj::with_capacity(16),
            DictObj::with_capacity(16),
            DictObj::with_capacity(16),
        )
    }

    #[test]
    fn pop_on_empty_underflows() {
        let mut stack = OperandStack::new();
        assert_eq!(stack.pop().unwrap_err().kind, ErrorKind::StackUnderflow);
    }

    #[test]
    fn peek_depth() {
        let mut stack = OperandStack::new();
        stack.push(Object::integer(1));
        stack.push(Object::integer(2));
        assert_eq!(stack.peek(0).unwrap().to_int().unwrap(), 2);
        assert_eq!(stack.peek(1).unwrap().to_int().unwrap(), 1);
        assert_eq!(stack.peek(2).unwrap_err().kind, ErrorKind::StackUnderflow);
    }

    #[test]
    fn pop_n_returns_bottom_first() {
        let mut stack = OperandStack::new();
        for i in 1..=4 {
            stack.push(Object::integer(i));
        }
        let popped = stack.pop_n(3).unwrap();
        let values: Vec<i32> = popped.iter().map(|o| o.to_int().unwrap()).collect();
        assert_eq!(values, vec![2, 3, 4]);
        assert_eq!(stack.count(), 1);
    }

    #[test]
    fn typed_pop_failure_keeps_operand_consumed() {
        let mut stack = OperandStack::new();
        stack.push(Object::string_from_text("nope"));
        assert!(stack.pop_int().is_err());
        assert_eq!(stack.count(), 0);
    }

    #[test]
    fn count_to_mark() {
        let mut stack = OperandStack::new();
        stack.push(Object::mark());
        stack.push(Object::integer(1));
        stack.push(Object::integer(2));
        assert_eq!(stack.count_to_mark().unwrap(), 2);
        stack.clear();
        assert_eq!(
            stack.count_to_mark().unwrap_err().kind,
            ErrorKind::UnmatchedMark
        );
    }

    #[test]
    fn def_goes_to_current_dict() {
        let mut ds = dict_stack();
        let local = DictObj::with_capacity(4);
        ds.begin(local.clone());
        ds.def("x", Object::integer(1));
        assert!(local.contains("x"));
        assert!(!ds.userdict().contains("x"));
    }

    #[test]
    fn store_overwrites_existing_definition() {
        let mut ds = dict_stack();
        ds.userdict().set("x", Object::integer(1));
        let local = DictObj::with_capacity(4);
        ds.begin(local.clone());
        ds.store("x".into(), Object::integer(2));
        // The existing lower definition was replaced; no local shadow
        assert_eq!(ds.userdict().get("x").unwrap().to_int().unwrap(), 2);
        assert!(!local.contains("x"));

        // A fresh key goes to the current dict
        ds.store("y".into(), Object::integer(3));
        assert!(local.contains("y"));
    }

    #[test]
    fn lookup_is_top_down() {
        let mut ds = dict_stack();
        ds.userdict().set("x", Object::integer(1));
        let local = DictObj::with_capacity(4);
        local.set("x", Object::integer(2));
        ds.begin(local);
        assert_eq!(ds.lookup("x").unwrap().to_int().unwrap(), 2);
        ds.end().unwrap();
        assert_eq!(ds.lookup("x").unwrap().to_int().unwrap(), 1);
    }

    #[test]
    fn end_protects_permanent_dicts() {
        let mut ds = dict_stack();
        assert_eq!(
            ds.end().unwrap_err().kind,
            ErrorKind::DictStackUnderflow
        );
        ds.begin(DictObj::with_capacity(1));
        assert!(ds.end().is_ok());
        assert_eq!(ds.depth(), 3);
    }
}
