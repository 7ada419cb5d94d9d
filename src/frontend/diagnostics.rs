use std::fmt;

use super::lexer::source_position::SourcePosition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// What the parser ran into, and what it did about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum DiagnosticKind {
    /// A statement or expression was abandoned because of an unexpected token.
    UnexpectedToken,
    /// A token that starts no statement was skipped.
    SkippedToken,
    /// A name followed by a detached `:` was turned into a label.
    RecoveredLabel,
    /// Nothing in a code block could consume a token, so it was skipped.
    StructuralStall,
    /// The statement loop gave up, the tree holds what was parsed so far.
    RecoveryExhausted,
    /// An instruction or data directive is missing its operand.
    MissingOperand,
    /// An expression nested deeper than the configured limit.
    NestingTooDeep,
}

impl DiagnosticKind {
    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticKind::RecoveredLabel | DiagnosticKind::MissingOperand => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

/// An advisory event produced while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub position: SourcePosition,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, position: SourcePosition, message: impl Into<String>) -> Self {
        Self {
            kind,
            position,
            message: message.into(),
        }
    }

    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    pub fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} [{}]: {}",
            self.position,
            self.severity(),
            self.kind,
            self.message
        )
    }
}
