//! Compiler diagnostics.
//!
//! The pipeline has a single user-facing failure mode: an input shape
//! outside the grammar a pass admits. Such errors abort the compilation;
//! no pass recovers or emits a partially rewritten program.

use crate::span::Span;

/// A compiler diagnostic.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub span: Span,
    pub notes: Vec<String>,
    pub help: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
}

impl Diagnostic {
    pub fn error(message: String, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            message,
            span,
            notes: Vec::new(),
            help: None,
        }
    }

    /// The input shape falls outside the grammar admitted by a pass.
    pub fn unsupported(what: impl Into<String>, span: Span) -> Self {
        Self::error(format!("unsupported construct: {}", what.into()), span)
    }

    pub fn with_note(mut self, note: String) -> Self {
        self.notes.push(note);
        self
    }

    pub fn with_help(mut self, help: String) -> Self {
        self.help = Some(help);
        self
    }

    /// Render the diagnostic to stderr using ariadne.
    ///
    /// The backend never sees source text itself; callers that hold it
    /// (the driver, the parser's test harness) use this for reporting.
    pub fn render(&self, filename: &str, source: &str) {
        use ariadne::{Color, Label, Report, ReportKind, Source};

        let mut report = Report::build(ReportKind::Error, filename, self.span.start as usize)
            .with_message(&self.message)
            .with_label(
                Label::new((filename, self.span.start as usize..self.span.end as usize))
                    .with_message(&self.message)
                    .with_color(Color::Red),
            );

        for note in &self.notes {
            report = report.with_note(note);
        }

        if let Some(help) = &self.help {
            report = report.with_help(help);
        }

        report
            .finish()
            .eprint((filename, Source::from(source)))
            .ok();
    }
}
