//! Shared types for the Quark compiler core.
//!
//! - [`span`]: byte-offset source spans and on-demand line/column lookup
//! - [`error`]: the append-only diagnostic collector and the fatal
//!   [`CompileError`] carrier returned at phase boundaries

pub mod error;
pub mod span;

pub use error::{CompileError, Errors};
pub use span::{LineIndex, Span};
