//! Common infrastructure shared by the lexer and the directive scanner

mod error;
mod span;

pub use error::{DiagnosticReporter, ScanError, ScanResult};
pub use span::Span;
