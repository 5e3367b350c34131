//! PostScript subset interpreter core.
//!
//! The crate is organized around the classic interpreter split:
//! - [`object`] — the tagged object model with shared composite storage
//! - [`lexer`] — tokenizer and the lazy object reader
//! - [`stacks`] — operand and dictionary stacks
//! - [`gstate`] — graphics state and its save stack
//! - [`device`] — the output device contract (plus a null device)
//! - [`text`] — text measurement and placement
//! - [`interpreter`] — operator dispatch and execution

pub mod device;
pub mod error;
pub mod gstate;
pub mod interpreter;
pub mod lexer;
pub mod object;
pub mod stacks;
pub mod text;
