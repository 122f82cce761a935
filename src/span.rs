//! Source locations for AST nodes.
//!
//! The backend receives a ready-made AST from an external parser. Spans
//! travel with every node so diagnostics can point back into the source
//! text; synthesized nodes (temporaries) inherit the span of the
//! expression they were built from.

/// A byte offset range in the source text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// A span for nodes with no source position (tests, synthesized code).
    pub fn dummy() -> Self {
        Self { start: 0, end: 0 }
    }

    /// The smallest span covering both `self` and `other`.
    ///
    /// The passes never reshape spans; this exists for the external
    /// parser, which builds compound nodes out of their parts.
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// A value annotated with its source span.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }

    pub fn dummy(node: T) -> Self {
        Self {
            node,
            span: Span::dummy(),
        }
    }

    /// Transform the node while keeping its span. For the external
    /// parser's benefit; the passes rebuild nodes explicitly.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Spanned<U> {
        Spanned {
            node: f(self.node),
            span: self.span,
        }
    }
}
