//! Native template text.
//!
//! The substitution grammar is deliberately minimal: user braces are
//! doubled (`{{`, `}}`) and `{name}` placeholders are left for the emitter
//! to substitute from the template's context. Template bodies are text, not
//! source code.

/// Escape literal braces in fixed native text.
pub fn escape(text: &str) -> String {
    text.replace('{', "{{").replace('}', "}}")
}

/// The placeholder written for an in-scope variable reference.
pub fn placeholder(name: &str) -> String {
    format!("{{{name}}}")
}
