use std::fmt;

/// Errors returned by graphics operations.
///
/// The interpreter maps these onto its own language-visible error
/// taxonomy; within this crate only the categories that can actually
/// occur are represented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    /// A numeric argument was outside its permitted range.
    RangeCheck(String),
    /// A transformation matrix was singular where an inverse was needed.
    SingularMatrix,
    /// A color or shading description did not have the expected shape.
    Malformed(String),
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RangeCheck(msg) => write!(f, "range check: {msg}"),
            Self::SingularMatrix => write!(f, "singular matrix"),
            Self::Malformed(msg) => write!(f, "malformed description: {msg}"),
        }
    }
}

impl std::error::Error for GraphicsError {}
