//! Type witnesses.
//!
//! A [`Ref`] is both the type of an expression and an address into the
//! typespace: `(name, params*)` where `name` is a fully-qualified symbol
//! and `params` are further refs. Refs are value-equal and totally
//! ordered; ordering is what keeps instantiation sets deterministic.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::Serialize;

/// Fully-qualified names of the builtin namespace's well-known types.
pub const INT: &str = "quark.int";
pub const FLOAT: &str = "quark.float";
pub const BOOL: &str = "quark.bool";
pub const STRING: &str = "quark.String";
pub const VOID: &str = "quark.void";
pub const ANY: &str = "quark.Any";
pub const SCALAR: &str = "quark.Scalar";
pub const LIST: &str = "quark.List";
pub const MAP: &str = "quark.Map";

/// Builtins that lower to dedicated IR types and need no native mapping.
pub const WELL_KNOWN: &[&str] = &[INT, FLOAT, BOOL, STRING, VOID, ANY, SCALAR];

/// A substitution from type-parameter names to concrete refs.
pub type Bindings = FxHashMap<String, Ref>;

/// The address of a ground or generic type (or callable member).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Ref {
    pub name: String,
    pub params: Vec<Ref>,
}

impl Ref {
    pub fn new(name: impl Into<String>) -> Self {
        Ref {
            name: name.into(),
            params: Vec::new(),
        }
    }

    pub fn with(name: impl Into<String>, params: Vec<Ref>) -> Self {
        Ref {
            name: name.into(),
            params,
        }
    }

    /// Structurally substitute bound parameter names.
    pub fn bind(&self, bindings: &Bindings) -> Ref {
        if self.params.is_empty() {
            if let Some(bound) = bindings.get(&self.name) {
                return bound.clone();
            }
        }
        Ref {
            name: self.name.clone(),
            params: self.params.iter().map(|p| p.bind(bindings)).collect(),
        }
    }
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.params.is_empty() {
            write!(f, "<")?;
            for (i, p) in self.params.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{p}")?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refs_are_value_equal() {
        let a = Ref::with(LIST, vec![Ref::new(INT)]);
        let b = Ref::with(LIST, vec![Ref::new(INT)]);
        assert_eq!(a, b);
        assert_ne!(a, Ref::with(LIST, vec![Ref::new(STRING)]));
    }

    #[test]
    fn bind_substitutes_structurally() {
        let mut bindings = Bindings::default();
        bindings.insert("quark.List.T".to_string(), Ref::new(INT));
        let open = Ref::with(LIST, vec![Ref::new("quark.List.T")]);
        assert_eq!(open.bind(&bindings), Ref::with(LIST, vec![Ref::new(INT)]));
    }

    #[test]
    fn bind_leaves_unbound_names_alone() {
        let bindings = Bindings::default();
        let open = Ref::with(LIST, vec![Ref::new("quark.List.T")]);
        assert_eq!(open.bind(&bindings), open);
    }

    #[test]
    fn display_shows_parameters() {
        let r = Ref::with(MAP, vec![Ref::new(STRING), Ref::new(INT)]);
        assert_eq!(r.to_string(), "quark.Map<quark.String, quark.int>");
    }
}
