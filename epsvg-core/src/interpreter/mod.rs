//! The PostScript interpreter.
//!
//! Execution is direct: the object reader yields one object at a time
//! and [`Interpreter::process_token`] acts on it immediately, so output
//! is produced while the input is still being read.
//!
//! Two execution entry points exist and they differ on procedures:
//! - `process_token` sees objects as they come from the scanner. A
//!   procedure body is *data* at this point and gets pushed.
//! - `execute_object` is invocation: a name looked up on the dictionary
//!   stack, or an `exec`ed object. Here a procedure runs.

mod control_ops;
mod data_ops;
mod font_ops;
mod graphics_ops;
mod math_ops;
mod misc_ops;
mod stack_ops;
mod type_ops;

#[cfg(test)]
mod tests;

use std::time::Instant;

use epsvg_fonts::{standard_encoding, BuiltinMetrics, FontMetrics};
use epsvg_graphics::matrix::Matrix;

use crate::device::OutputDevice;
use crate::error::{ErrorKind, PsError, PsResult};
use crate::gstate::{GraphicsState, GstateStack};
use crate::object::{ArrayObj, DictObj, FileObj, Object, OpFn, Operator, Value};
use crate::stacks::{DictStack, OperandStack};

/// Recursion ceiling for nested procedure execution.
const MAX_EXEC_DEPTH: usize = 500;

/// Faces registered in `FontDirectory` at startup.
const STANDARD_FACES: &[&str] = &[
    "Times-Roman",
    "Times-Bold",
    "Times-Italic",
    "Times-BoldItalic",
    "Helvetica",
    "Helvetica-Bold",
    "Helvetica-Oblique",
    "Helvetica-BoldOblique",
    "Courier",
    "Courier-Bold",
    "Courier-Oblique",
    "Courier-BoldOblique",
    "Symbol",
];

// ---------------------------------------------------------------------------
// Interpreter state
// ---------------------------------------------------------------------------

/// The PostScript interpreter.
pub struct Interpreter {
    /// Operand stack.
    pub op_stack: OperandStack,
    /// Dictionary stack.
    pub dict_stack: DictStack,
    /// Graphics state save stack.
    pub gstates: GstateStack,
    /// The output device receiving paint events.
    pub device: Box<dyn OutputDevice>,
    /// Font metric provider for text measurement.
    pub metrics: Box<dyn FontMetrics>,
    /// `FontDirectory`: defined fonts by name.
    font_directory: DictObj,
    /// Current procedure nesting depth.
    exec_depth: usize,
    /// Set by `quit`; unwinds all loops and file reads.
    quit: bool,
    /// State for `rand`/`srand`/`rrand`.
    rand_state: u32,
    /// Start of the run, for `usertime`/`realtime`.
    start: Instant,
}

impl Interpreter {
    /// Create an interpreter driving the given device, with the
    /// built-in approximate font metrics.
    #[must_use]
    pub fn new(device: Box<dyn OutputDevice>) -> Self {
        let systemdict = DictObj::with_capacity(512);
        let globaldict = DictObj::with_capacity(32);
        let userdict = DictObj::with_capacity(128);
        let font_directory = DictObj::with_capacity(32);

        for table in OPERATOR_TABLES {
            for &(name, func) in *table {
                systemdict.set(name, Object::operator(Operator { name, func }));
            }
        }
        systemdict.set("systemdict", Object::dict(systemdict.clone()));
        systemdict.set("globaldict", Object::dict(globaldict.clone()));
        systemdict.set("userdict", Object::dict(userdict.clone()));
        systemdict.set("FontDirectory", Object::dict(font_directory.clone()));
        systemdict.set(
            "StandardEncoding",
            Object::array(encoding_array(&standard_encoding())),
        );
        systemdict.set(
            "ISOLatin1Encoding",
            Object::array(encoding_array(&epsvg_fonts::isolatin1_encoding())),
        );

        for face in STANDARD_FACES {
            font_directory.set(*face, Object::font(font_ops::base_font(face)));
        }

        let initial = GraphicsState::new(device.default_ctm());
        Self {
            op_stack: OperandStack::new(),
            dict_stack: DictStack::new(systemdict, globaldict, userdict),
            gstates: GstateStack::new(initial),
            device,
            metrics: Box::new(BuiltinMetrics),
            font_directory,
            exec_depth: 0,
            quit: false,
            rand_state: 1,
            start: Instant::now(),
        }
    }

    /// Replace the font metric provider.
    pub fn set_metrics(&mut self, metrics: Box<dyn FontMetrics>) {
        self.metrics = metrics;
    }

    /// The current graphics state.
    #[must_use]
    pub fn gs(&self) -> &GraphicsState {
        self.gstates.current()
    }

    pub fn gs_mut(&mut self) -> &mut GraphicsState {
        self.gstates.current_mut()
    }

    pub(crate) fn font_directory(&self) -> &DictObj {
        &self.font_directory
    }

    // -- Execution ----------------------------------------------------------

    /// Run a whole program against the device.
    ///
    /// The device sees `init` first and `finish` last in every case. On
    /// error the operand and dictionary stacks are logged before the
    /// error propagates, so the failure context is not lost.
    pub fn run(&mut self, source: &str) -> PsResult<()> {
        self.device.init()?;
        let result = self.execute_file(&FileObj::from_source(source));
        match result {
            Ok(()) => self.device.finish(),
            Err(err) => {
                self.report_error(&err);
                let _ = self.device.finish();
                Err(err)
            }
        }
    }

    /// Pull and process objects from a file until it runs dry.
    pub(crate) fn execute_file(&mut self, file: &FileObj) -> PsResult<()> {
        while let Some(obj) = file.next_object()? {
            if self.quit {
                break;
            }
            self.process_token(obj)?;
        }
        Ok(())
    }

    /// Act on one scanned object. Literals and procedure bodies push;
    /// executable names resolve and run.
    pub(crate) fn process_token(&mut self, obj: Object) -> PsResult<()> {
        if obj.literal {
            self.op_stack.push(obj);
            return Ok(());
        }
        match &obj.value {
            Value::Name(_) => self.execute_object(obj),
            Value::Operator(op) => (op.func)(self),
            Value::File(file) => {
                let file = file.clone();
                self.execute_file(&file)
            }
            // A procedure scanned as a token is data
            _ => {
                self.op_stack.push(obj);
                Ok(())
            }
        }
    }

    /// Invoke an object: what name lookup and `exec` do. Procedures
    /// run here.
    pub(crate) fn execute_object(&mut self, obj: Object) -> PsResult<()> {
        if obj.literal {
            self.op_stack.push(obj);
            return Ok(());
        }
        obj.check_execute()?;
        match &obj.value {
            Value::Name(name) => {
                let Some(found) = self.dict_stack.lookup(name) else {
                    // The failing name stays visible on the stack
                    let message = format!("name {name} not defined");
                    self.op_stack.push(obj.clone());
                    return Err(PsError::new(ErrorKind::Undefined, message));
                };
                self.enter()?;
                let result = self.execute_object(found);
                self.leave();
                result
            }
            Value::Operator(op) => (op.func)(self),
            Value::Array(proc) => {
                let proc = proc.clone();
                self.run_proc(&proc)
            }
            Value::String(s) => {
                // An executable string runs as program text
                let source = s.to_text();
                self.execute_file(&FileObj::from_source(&source))
            }
            Value::File(file) => {
                let file = file.clone();
                self.execute_file(&file)
            }
            _ => {
                self.op_stack.push(obj);
                Ok(())
            }
        }
    }

    /// Run a procedure body token by token.
    pub(crate) fn run_proc(&mut self, proc: &ArrayObj) -> PsResult<()> {
        self.enter()?;
        let result = (|| {
            for item in proc.snapshot() {
                if self.quit {
                    break;
                }
                self.process_token(item)?;
            }
            Ok(())
        })();
        self.leave();
        result
    }

    fn enter(&mut self) -> PsResult<()> {
        if self.exec_depth >= MAX_EXEC_DEPTH {
            return Err(PsError::new(
                ErrorKind::ResourceLimit,
                "execution nested too deeply",
            ));
        }
        self.exec_depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.exec_depth = self.exec_depth.saturating_sub(1);
    }

    pub(crate) fn request_quit(&mut self) {
        self.quit = true;
    }

    pub(crate) const fn quit_requested(&self) -> bool {
        self.quit
    }

    // -- Error reporting ----------------------------------------------------

    /// Log the failure context the way PostScript's error handler
    /// prints it: the error name, then both stacks.
    fn report_error(&self, err: &PsError) {
        log::error!("execution failed: {err}");
        let operands = self.op_stack.snapshot();
        log::error!("operand stack ({} objects):", operands.len());
        for obj in operands.iter().rev() {
            log::error!("  {}", obj.describe());
        }
        let dicts = self.dict_stack.snapshot();
        log::error!("dictionary stack ({} dictionaries):", dicts.len());
        for dict in dicts.iter().rev() {
            log::error!("  -dict- ({} entries)", dict.len());
        }
    }
}

impl std::fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("op_stack", &self.op_stack)
            .field("exec_depth", &self.exec_depth)
            .field("quit", &self.quit)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Operator registration
// ---------------------------------------------------------------------------

/// All operator tables, merged into systemdict at startup.
const OPERATOR_TABLES: &[&[(&str, OpFn)]] = &[
    stack_ops::OPERATORS,
    math_ops::OPERATORS,
    type_ops::OPERATORS,
    data_ops::OPERATORS,
    control_ops::OPERATORS,
    graphics_ops::OPERATORS,
    font_ops::OPERATORS,
    misc_ops::OPERATORS,
];

/// Build an encoding vector as an array of literal names.
fn encoding_array(names: &[&'static str; 256]) -> ArrayObj {
    ArrayObj::from_objects(names.iter().map(|n| Object::literal_name(*n)).collect())
}

// -- Shared operand helpers -------------------------------------------------

/// Pop a matrix-shaped array operand and a fallback set of values; used
/// by the operators that take an optional matrix operand, like
/// `translate` and `transform`.
pub(crate) fn top_is_array(interp: &Interpreter) -> bool {
    interp
        .op_stack
        .peek(0)
        .map(|obj| matches!(obj.value, Value::Array(_)))
        .unwrap_or(false)
}

/// Write a matrix into a six-element array operand and return it.
pub(crate) fn fill_matrix(array: &ArrayObj, m: &Matrix) -> PsResult<Object> {
    if array.len() != 6 {
        return Err(PsError::new(
            ErrorKind::RangeCheck,
            "matrix array must have six elements",
        ));
    }
    for (i, value) in m.as_coeffs().iter().enumerate() {
        array.put(i, Object::real(*value))?;
    }
    Ok(Object::array(array.clone()))
}
