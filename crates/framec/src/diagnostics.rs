/// Warnings and hard errors reported while lowering a unit.
///
/// Every message carries a tracer, `"[line L] file.ts:"`, pointing at the source
/// node that caused it.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tracer {
    pub line: u32,
    pub file: String,
}

impl fmt::Display for Tracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[line {}] {}:", self.line, self.file)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    #[serde(flatten)]
    pub tracer: Tracer,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(tracer: Tracer, message: impl Into<String>) -> Self {
        Self { severity: Severity::Warning, tracer, message: message.into() }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.tracer, self.severity, self.message)
    }
}

// ==================== Hard errors ====================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("bitwise XOR `{op}` is not supported; did you mean `**` or `**=`?")]
    BitwiseXor { op: String },

    #[error("`await` is not supported: the target cannot suspend a script")]
    Await,

    #[error("`null` has no register representation")]
    NullLiteral,

    #[error("rest parameter `...{name}` is not supported")]
    RestParameter { name: String },

    #[error("`this` can only be used inside a class")]
    ThisOutsideClass,

    #[error("`super` can only be used inside a class that extends another class")]
    SuperOutsideDerivedClass,

    #[error("expression statement must be an assignment or a call, found {kind}")]
    InvalidExpressionStatement { kind: String },

    #[error("unsupported expression kind {kind}")]
    UnsupportedExpression { kind: String },

    #[error("operator `{op}` is not supported; only assignment operators, `++` and `--` are lowered")]
    UnsupportedOperator { op: String },

    #[error("{kind} cannot be assigned to")]
    NotAssignable { kind: String },

    #[error("{kind} does not produce a value")]
    NoValue { kind: String },

    #[error("`**=` only supports the literal exponent 2")]
    UnsupportedExponent,

    #[error("`{owner}` has no member `{member}`")]
    UnknownMember { owner: String, member: String },

    #[error("destructuring declarations are not supported")]
    DestructuringDeclaration,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{tracer} {kind}")]
pub struct TranspileError {
    pub tracer: Tracer,
    pub kind: ErrorKind,
}

impl TranspileError {
    pub fn new(tracer: Tracer, kind: ErrorKind) -> Self {
        Self { tracer, kind }
    }

    pub fn line(&self) -> u32 {
        self.tracer.line
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic {
            severity: Severity::Error,
            tracer: self.tracer.clone(),
            message: self.kind.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TranspileError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn tracer() -> Tracer {
        Tracer { line: 3, file: "main.ts".to_string() }
    }

    #[test]
    fn test_tracer_format() {
        assert_eq!(tracer().to_string(), "[line 3] main.ts:");
    }

    #[test]
    fn test_error_message() {
        let err = TranspileError::new(tracer(), ErrorKind::BitwiseXor { op: "^".to_string() });
        let message = err.to_string();
        assert!(message.starts_with("[line 3] main.ts: bitwise XOR"));
        assert!(message.contains("**="));
        assert_eq!(err.line(), 3);
        assert_eq!(err.to_diagnostic().severity, Severity::Error);
    }

    #[test]
    fn test_warning_serializes_flat() {
        let warning = Diagnostic::warning(tracer(), "uncompilable statement IfStatement");
        assert_eq!(warning.to_string(), "[line 3] main.ts: warning: uncompilable statement IfStatement");
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["line"], 3);
        assert_eq!(json["file"], "main.ts");
    }
}
