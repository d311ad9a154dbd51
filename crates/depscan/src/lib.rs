//! Dependency directive scanner for C, C++ and Objective-C sources
//!
//! This library tokenizes a source buffer just enough to find the
//! preprocessor directives that can change what the file depends on, and can
//! re-emit them as a minimized stand-in for the original: `#include`,
//! `#define` and the conditional skeleton survive, function bodies and
//! comments do not.
//!
//! ## Architecture
//!
//! The scanner is organized into:
//! - **Lexer** (`lexer/`): Minimal tokenizer with escaped-line-break folding,
//!   raw string handling and on-demand `<...>` header names
//! - **Directives** (`directives/`): Directive classification over the token
//!   stream and the minimized printer
//! - **Common** (`common/`): Shared infrastructure (errors, spans)

pub mod common;
pub mod lexer;
pub mod directives;

// Re-exports for convenience
pub use common::{DiagnosticReporter, ScanError, ScanResult, Span};
pub use directives::{
    Directive, DirectiveKind, DirectiveScanner, ScanOptions, ScanOutput, minimize,
    minimize_source, scan,
};
pub use lexer::{Lexer, Punct, Token, TokenKind};
