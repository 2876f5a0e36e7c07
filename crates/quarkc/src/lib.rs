//! The Quark compiler core pipeline.
//!
//! A [`Compiler`] owns its symbol table, typespace and error collector
//! exclusively; it is single-threaded and non-suspending. Phases are
//! ordered by result-type barriers: symbol registration precedes type
//! construction, construction precedes checking, and checking precedes
//! lowering. Lowering is never attempted on an ill-typed program.
//!
//! Parsing is an external collaborator: the host hands over already-built
//! [`quark_ast::item::File`] trees (or records a parse failure verbatim).
//! Emitters are external too; they consume the returned [`quark_ir::Package`].

use quark_common::{CompileError, Errors};
use quark_ast::item::File;
use quark_ir::Package;
use quark_typeck::{check_all, construct_all, discover, Symbols, Typespace};

/// One compilation: files in, a lowered package out.
#[derive(Default)]
pub struct Compiler {
    pub symbols: Symbols,
    pub types: Typespace,
    pub errors: Errors,
    checked: bool,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every declaration in a parsed file.
    pub fn add(&mut self, file: File) {
        self.symbols.add(file, &mut self.errors);
    }

    /// Record a failure reported by the external parser, verbatim.
    pub fn parse_failure(&mut self, message: impl Into<String>) {
        self.errors.add(message);
    }

    /// Resolve symbols, construct the typespace and check every body.
    ///
    /// Fails with the collected diagnostics at each phase boundary; the
    /// typespace is frozen once this succeeds.
    pub fn check(&mut self) -> Result<(), CompileError> {
        self.errors.check()?;
        self.symbols.resolve(&mut self.errors);
        self.errors.check()?;
        construct_all(&self.symbols, &mut self.types, &mut self.errors);
        check_all(&self.symbols, &mut self.types, &mut self.errors);
        self.errors.check()?;
        self.checked = true;
        Ok(())
    }

    /// Discover every reachable instantiation and lower it into one
    /// package addressed under `package_name`.
    pub fn compile(&mut self, package_name: &str) -> Result<Package, CompileError> {
        if !self.checked {
            self.check()?;
        }
        let insts = discover(&self.symbols, &self.types);
        Ok(quark_lower::lower(
            &self.symbols,
            &self.types,
            &insts,
            package_name,
            &mut self.errors,
        ))
    }

    /// Non-fatal reports collected during lowering.
    pub fn warnings(&self) -> &[String] {
        self.errors.warnings()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quark_ast::build::Builder;

    #[test]
    fn parse_failures_stop_the_pipeline() {
        let mut c = Compiler::new();
        c.parse_failure("main.q:1: unexpected token `}`");
        let err = c.check().unwrap_err();
        assert_eq!(err.diagnostics, ["main.q:1: unexpected token `}`"]);
    }

    #[test]
    fn empty_compilation_yields_an_empty_package() {
        let mut b = Builder::new();
        let file = b.file("empty.q", vec![], vec![]);
        let mut c = Compiler::new();
        c.add(file);
        c.check().unwrap();
        let pkg = c.compile("demo").unwrap();
        assert!(pkg.definitions.is_empty());
    }
}
