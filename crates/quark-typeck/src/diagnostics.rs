//! Diagnostic rendering.
//!
//! The collector stores one plain line per diagnostic; hosts that hold the
//! source text can re-render with labelled spans through ariadne. Output is
//! colorless so test expectations stay stable.

use std::ops::Range;

use ariadne::{Config, Label, Report, ReportKind, Source};
use quark_common::Span;

use crate::error::{SymbolError, TypeError};

/// One-line rendering for the error collector.
pub fn plain(code: &str, message: &str, span: Span) -> String {
    format!("error[{code}]: {message} at {}..{}", span.start, span.end)
}

pub fn render_symbol_error(err: &SymbolError) -> String {
    plain(err.code(), &err.message(), err.span())
}

pub fn render_type_error(err: &TypeError) -> String {
    plain(err.code(), &err.message(), err.span())
}

/// Labelled ariadne report for hosts that hold the source text.
pub fn report(code: &str, message: &str, span: Span, source: &str) -> String {
    let range = clamp(span, source.len());
    let report = Report::build(ReportKind::Error, range.clone())
        .with_code(code)
        .with_message(message)
        .with_config(Config::default().with_color(false))
        .with_label(Label::new(range).with_message(message))
        .finish();
    let mut buf = Vec::new();
    report
        .write(Source::from(source), &mut buf)
        .expect("failed to write diagnostic");
    String::from_utf8(buf).expect("diagnostic output should be valid UTF-8")
}

pub fn report_type_error(err: &TypeError, source: &str) -> String {
    report(err.code(), &err.message(), err.span(), source)
}

pub fn report_symbol_error(err: &SymbolError, source: &str) -> String {
    report(err.code(), &err.message(), err.span(), source)
}

// Ariadne needs an in-bounds, non-empty range.
fn clamp(span: Span, len: usize) -> Range<usize> {
    let mut range = (span.start as usize).min(len)..(span.end as usize).min(len);
    if range.end < range.start {
        range.end = range.start;
    }
    // Widen empty spans to one byte where the source allows it.
    if range.is_empty() && range.end < len {
        range.end += 1;
    }
    range
}
