//! Quark symbol resolution and type checking.
//!
//! The front half of the compiler core, staged as:
//!
//! - [`symbols`]: fully-qualified registration and reference resolution
//! - [`ty`]: the `Ref` type witness
//! - [`typespace`]: structural descriptions of every definition, plus the
//!   node-to-type and conversion maps filled in by the checker
//! - [`construct`]: building typespace entries
//! - [`check`]: the syntax-directed checker
//! - [`instantiate`]: the monomorphisation work-list
//! - [`error`] / [`diagnostics`]: structured diagnostics and rendering

pub mod check;
pub mod construct;
pub mod diagnostics;
pub mod error;
pub mod instantiate;
pub mod symbols;
pub mod ty;
pub mod typespace;

pub use check::check_all;
pub use construct::construct_all;
pub use instantiate::{discover, Instantiations};
pub use symbols::{Binding, Symbols};
pub use ty::{Bindings, Ref};
pub use typespace::{Callable, Object, ObjectKind, TypeNode, Typespace, View};
