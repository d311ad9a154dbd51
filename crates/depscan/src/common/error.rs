//! Error types and diagnostic reporting

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use thiserror::Error;

use super::Span;

/// Scan error with source location.
///
/// Only malformed input that makes the dependency view of a file unreliable
/// aborts a scan. Anything else (stray tokens, unterminated plain literals,
/// unknown pragmas) is skipped and at most leaves a mark that extra tokens
/// were present.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("macro name at {span:?} must be an identifier")]
    MalformedDefineName { span: Span },

    #[error("unterminated raw string literal at {span:?}")]
    UnterminatedRawString { span: Span },

    #[error("module directive at {span:?} reaches end of input before ';'")]
    UnterminatedModuleDirective { span: Span },

    #[error("unexpected tokens at {span:?} after the ';' of a module directive")]
    TokensAfterModuleDirective { span: Span },
}

impl ScanError {
    pub fn malformed_define_name(span: Span) -> Self {
        Self::MalformedDefineName { span }
    }

    pub fn unterminated_raw_string(span: Span) -> Self {
        Self::UnterminatedRawString { span }
    }

    pub fn unterminated_module_directive(span: Span) -> Self {
        Self::UnterminatedModuleDirective { span }
    }

    pub fn tokens_after_module_directive(span: Span) -> Self {
        Self::TokensAfterModuleDirective { span }
    }

    /// Location of the offending bytes.
    pub fn span(&self) -> Span {
        match self {
            Self::MalformedDefineName { span }
            | Self::UnterminatedRawString { span }
            | Self::UnterminatedModuleDirective { span }
            | Self::TokensAfterModuleDirective { span } => *span,
        }
    }
}

pub type ScanResult<T> = Result<T, ScanError>;

/// Diagnostic reporter for pretty error output
pub struct DiagnosticReporter {
    files: SimpleFiles<String, String>,
    writer: StandardStream,
    config: term::Config,
}

impl DiagnosticReporter {
    pub fn new() -> Self {
        Self {
            files: SimpleFiles::new(),
            writer: StandardStream::stderr(ColorChoice::Auto),
            config: term::Config::default(),
        }
    }

    pub fn add_file(&mut self, name: impl Into<String>, source: impl Into<String>) -> usize {
        self.files.add(name.into(), source.into())
    }

    pub fn report_error(&self, file_id: usize, error: &ScanError) {
        let span = error.span();
        let message = match error {
            ScanError::MalformedDefineName { .. } => "#define does not name an identifier",
            ScanError::UnterminatedRawString { .. } => "raw string runs to end of file",
            ScanError::UnterminatedModuleDirective { .. } => "missing ';' to end this directive",
            ScanError::TokensAfterModuleDirective { .. } => {
                "a module directive must end its line after ';'"
            }
        };

        let diagnostic = Diagnostic::error()
            .with_message("Scan error")
            .with_labels(vec![
                Label::primary(file_id, span.start..span.end).with_message(message),
            ]);

        let _ = term::emit(&mut self.writer.lock(), &self.config, &self.files, &diagnostic);
    }
}

impl Default for DiagnosticReporter {
    fn default() -> Self {
        Self::new()
    }
}
