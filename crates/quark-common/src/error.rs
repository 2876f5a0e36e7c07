use std::fmt;

use serde::Serialize;

/// The append-only diagnostic collector owned by one `Compiler` instance.
///
/// User-facing errors accumulate here instead of aborting immediately; each
/// pipeline phase calls [`Errors::check`] at its boundary and stops the run
/// if anything is pending. A separate warning channel carries reports that
/// must reach the user without failing the compilation (lowering-time
/// diagnostics).
#[derive(Debug, Default)]
pub struct Errors {
    diagnostics: Vec<String>,
    warnings: Vec<String>,
}

impl Errors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic.
    pub fn add(&mut self, diagnostic: impl Into<String>) {
        self.diagnostics.push(diagnostic.into());
    }

    /// Record a non-fatal warning.
    pub fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Phase barrier: fail with the collected diagnostics if any are pending.
    pub fn check(&self) -> Result<(), CompileError> {
        if self.diagnostics.is_empty() {
            Ok(())
        } else {
            Err(CompileError {
                diagnostics: self.diagnostics.clone(),
            })
        }
    }
}

/// Aggregated failure returned at a phase boundary.
///
/// First-error-wins semantics: `Display` shows the first diagnostic (plus a
/// count when more were collected); the full list stays available for hosts
/// that report everything.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompileError {
    pub diagnostics: Vec<String>,
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.diagnostics.as_slice() {
            [] => write!(f, "compilation failed"),
            [first] => write!(f, "{first}"),
            [first, rest @ ..] => write!(f, "{first} (and {} more)", rest.len()),
        }
    }
}

impl std::error::Error for CompileError {}
