use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected token at {pos}: expected {expected}, found {found}")]
    UnexpectedToken {
        pos: usize,
        expected: String,
        found: String,
    },

    #[error("Unexpected end of file at {pos}: expected {expected}")]
    UnexpectedEof { pos: usize, expected: String },

    #[error("Closing tag at {pos} does not match: expected </{expected}>, found </{found}>")]
    MismatchedClosingTag {
        pos: usize,
        expected: String,
        found: String,
    },

    #[error("Invalid syntax at {pos}: {message}")]
    InvalidSyntax { pos: usize, message: String },

    #[error("Lexer error at {pos}: unterminated literal")]
    LexerError { pos: usize },
}

impl ParseError {
    pub fn unexpected_token(
        pos: usize,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::UnexpectedToken {
            pos,
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn unexpected_eof(pos: usize, expected: impl Into<String>) -> Self {
        Self::UnexpectedEof {
            pos,
            expected: expected.into(),
        }
    }

    pub fn mismatched_closing_tag(
        pos: usize,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::MismatchedClosingTag {
            pos,
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn invalid_syntax(pos: usize, message: impl Into<String>) -> Self {
        Self::InvalidSyntax {
            pos,
            message: message.into(),
        }
    }

    pub fn lexer_error(pos: usize) -> Self {
        Self::LexerError { pos }
    }

    /// Byte offset the error points at
    pub fn pos(&self) -> usize {
        match self {
            Self::UnexpectedToken { pos, .. }
            | Self::UnexpectedEof { pos, .. }
            | Self::MismatchedClosingTag { pos, .. }
            | Self::InvalidSyntax { pos, .. }
            | Self::LexerError { pos } => *pos,
        }
    }

    /// Render the error against its source as a labelled snippet
    #[cfg(feature = "pretty-errors")]
    pub fn report(&self, source: &str, path: &str) -> String {
        use ariadne::{Config, Label, Report, ReportKind, Source};

        let pos = self.pos().min(source.len());
        let end = source[pos..]
            .chars()
            .next()
            .map(|c| pos + c.len_utf8())
            .unwrap_or(pos);

        let mut out = Vec::new();
        let written = Report::build(ReportKind::Error, path, pos)
            .with_config(Config::default().with_color(false))
            .with_message(self.to_string())
            .with_label(Label::new((path, pos..end)).with_message(self.label()))
            .finish()
            .write((path, Source::from(source.to_string())), &mut out);

        match written {
            Ok(()) => String::from_utf8_lossy(&out).into_owned(),
            Err(_) => format!("{}: {}", path, self),
        }
    }

    #[cfg(feature = "pretty-errors")]
    fn label(&self) -> String {
        match self {
            Self::UnexpectedToken { expected, .. } => format!("expected {}", expected),
            Self::UnexpectedEof { expected, .. } => format!("input ends before {}", expected),
            Self::MismatchedClosingTag { expected, .. } => {
                format!("this should close <{}>", expected)
            }
            Self::InvalidSyntax { message, .. } => message.clone(),
            Self::LexerError { .. } => "literal starts here".to_string(),
        }
    }
}

#[cfg(all(test, feature = "pretty-errors"))]
mod tests {
    use super::*;

    #[test]
    fn test_report_mentions_path_and_message() {
        let source = "const a = <div></span>;";
        let err = ParseError::mismatched_closing_tag(15, "div", "span");
        let report = err.report(source, "app/page.tsx");

        assert!(report.contains("app/page.tsx"));
        assert!(report.contains("expected </div>"));
    }
}
