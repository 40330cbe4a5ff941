use std::ops::Range;

use ariadne::{ColorGenerator, Label, Report, ReportKind, Source};
use thiserror::Error;

pub type Span = Range<usize>;

/// A dynamic error type that can hold specific error messages and the location where the error happened.
pub trait ReportableError: std::error::Error {
    /// message is used for reporting verbose message for `ariadne`.
    fn get_message(&self) -> String {
        self.to_string()
    }
    /// Label is used for indicating error with the specific position for `ariadne`.
    fn get_labels(&self) -> Vec<(Span, String)>;
}

/// Error detail - structured error information
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorDetail {
    /// Expected token not found (e.g., expected `)` but found `}`)
    #[error("Expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },
    /// Unexpected end of input
    #[error("Unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String },
    /// Invalid syntax with reason
    #[error("Invalid syntax: {reason}")]
    InvalidSyntax { reason: String },
}

/// Parser error with recovery information
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{detail}")]
pub struct ParserError {
    /// Token index where the error occurred
    pub token_index: usize,
    /// Byte range of that token
    pub span: Span,
    /// Error detail
    pub detail: ErrorDetail,
}

impl ParserError {
    pub fn unexpected_token(token_index: usize, span: Span, expected: &str, found: &str) -> Self {
        Self {
            token_index,
            span,
            detail: ErrorDetail::UnexpectedToken {
                expected: expected.to_string(),
                found: found.to_string(),
            },
        }
    }

    pub fn unexpected_eof(token_index: usize, span: Span, expected: &str) -> Self {
        Self {
            token_index,
            span,
            detail: ErrorDetail::UnexpectedEof {
                expected: expected.to_string(),
            },
        }
    }

    pub fn invalid_syntax(token_index: usize, span: Span, reason: &str) -> Self {
        Self {
            token_index,
            span,
            detail: ErrorDetail::InvalidSyntax {
                reason: reason.to_string(),
            },
        }
    }
}

impl ReportableError for ParserError {
    fn get_message(&self) -> String {
        "Parse error".to_string()
    }
    fn get_labels(&self) -> Vec<(Span, String)> {
        vec![(self.span.clone(), self.detail.to_string())]
    }
}

/// Print errors to stderr as `ariadne` reports against `src`.
pub fn report(src: &str, path: &str, errs: &[&dyn ReportableError]) {
    let mut colors = ColorGenerator::new();
    let id = path.to_string();
    let mut cache = (id.clone(), Source::from(src.to_string()));
    for e in errs {
        let rawlabels = e.get_labels();
        let Some((first, _)) = rawlabels.first() else {
            log::error!("{}", e.get_message());
            continue;
        };
        let labels = rawlabels.iter().map(|(span, message)| {
            Label::new((id.clone(), span.clone()))
                .with_message(message)
                .with_color(colors.next())
        });
        let report = Report::build(ReportKind::Error, (id.clone(), first.clone()))
            .with_message(e.get_message())
            .with_labels(labels)
            .finish();
        if let Err(err) = report.eprint(&mut cache) {
            log::error!("failed to print report: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_carry_detail() {
        let err = ParserError::unexpected_token(3, 4..5, ";", "}");
        let labels = err.get_labels();
        assert_eq!(labels, vec![(4..5, "Expected ;, found }".to_string())]);
        assert_eq!(err.to_string(), "Expected ;, found }");
    }

    #[test]
    fn test_eof_message() {
        let err = ParserError::unexpected_eof(9, 10..10, "}");
        assert_eq!(err.to_string(), "Unexpected end of input, expected }");
    }
}
