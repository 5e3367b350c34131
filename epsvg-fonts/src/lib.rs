//! Font metrics and encoding tables for `epsvg`.
//!
//! This crate is intentionally independent of the interpreter and of
//! `epsvg-graphics` — all types are plain `f64`/`u8` values. The
//! interpreter consumes metrics through the [`FontMetrics`] trait so
//! alternative providers (real AFM data, embedded fonts) can be swapped
//! in without touching the text machinery.

pub mod encoding;
pub mod metrics;

pub use encoding::{isolatin1_encoding, standard_encoding, NOTDEF};
pub use metrics::{BuiltinMetrics, FontMetrics, GlyphMetrics, DEFAULT_ADVANCE};
