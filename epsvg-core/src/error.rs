//! Error types for the interpreter.
//!
//! The error taxonomy is closed and language-visible: `stopped` reports
//! these kinds to PostScript programs, so no new kinds may be invented
//! ad hoc. Everything the crate can fail with maps onto one of them.

use std::fmt;

use epsvg_graphics::error::GraphicsError;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// An error raised during scanning or execution.
#[derive(Debug, Clone)]
pub struct PsError {
    /// What went wrong.
    pub kind: ErrorKind,
    /// Human-readable detail, possibly empty.
    pub message: String,
}

impl PsError {
    /// Create an error with a detail message.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Create an error carrying only its kind.
    #[must_use]
    pub const fn from_kind(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: String::new(),
        }
    }
}

impl fmt::Display for PsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for PsError {}

// ---------------------------------------------------------------------------
// Error kinds
// ---------------------------------------------------------------------------

/// The language-visible error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Not enough operands on the operand stack.
    StackUnderflow,
    /// An operand had the wrong type.
    TypeCheck,
    /// An operand was outside its permitted range.
    RangeCheck,
    /// A name had no definition in the dictionary stack.
    Undefined,
    /// An arithmetic result is not representable (division by zero,
    /// singular matrix, domain error).
    UndefinedResult,
    /// An access attribute forbade the operation.
    InvalidAccess,
    /// A mark-consuming operator found no mark.
    UnmatchedMark,
    /// `end` would remove a permanent dictionary.
    DictStackUnderflow,
    /// A path operator needed a current point and none exists.
    NoCurrentPoint,
    /// Reading input or writing output failed.
    IoError,
    /// The operation is recognized but deliberately not implemented.
    Unimplemented,
    /// An execution limit (recursion depth) was exceeded.
    ResourceLimit,
}

impl ErrorKind {
    /// The PostScript error name, as reported by `==` style dumps.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::StackUnderflow => "stackunderflow",
            Self::TypeCheck => "typecheck",
            Self::RangeCheck => "rangecheck",
            Self::Undefined => "undefined",
            Self::UndefinedResult => "undefinedresult",
            Self::InvalidAccess => "invalidaccess",
            Self::UnmatchedMark => "unmatchedmark",
            Self::DictStackUnderflow => "dictstackunderflow",
            Self::NoCurrentPoint => "nocurrentpoint",
            Self::IoError => "ioerror",
            Self::Unimplemented => "unimplemented",
            Self::ResourceLimit => "limitcheck",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Convenience type alias for results using [`PsError`].
pub type PsResult<T> = Result<T, PsError>;

impl From<GraphicsError> for PsError {
    fn from(err: GraphicsError) -> Self {
        match err {
            GraphicsError::RangeCheck(msg) => Self::new(ErrorKind::RangeCheck, msg),
            GraphicsError::SingularMatrix => {
                Self::new(ErrorKind::UndefinedResult, "singular matrix")
            }
            GraphicsError::Malformed(msg) => Self::new(ErrorKind::TypeCheck, msg),
        }
    }
}

impl From<std::io::Error> for PsError {
    fn from(err: std::io::Error) -> Self {
        Self::new(ErrorKind::IoError, err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_with_message() {
        let err = PsError::new(ErrorKind::TypeCheck, "expected integer");
        assert_eq!(format!("{err}"), "typecheck: expected integer");
    }

    #[test]
    fn display_kind_only() {
        let err = PsError::from_kind(ErrorKind::StackUnderflow);
        assert_eq!(format!("{err}"), "stackunderflow");
    }

    #[test]
    fn graphics_error_mapping() {
        let err: PsError = GraphicsError::SingularMatrix.into();
        assert_eq!(err.kind, ErrorKind::UndefinedResult);
        let err: PsError = GraphicsError::RangeCheck("x".into()).into();
        assert_eq!(err.kind, ErrorKind::RangeCheck);
    }

    #[test]
    fn resource_limit_reports_limitcheck() {
        assert_eq!(ErrorKind::ResourceLimit.name(), "limitcheck");
    }
}
