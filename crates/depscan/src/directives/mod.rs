//! Directive classification and minimized reconstruction
//!
//! The scanner reduces a source file to the directives that can change what
//! it depends on: preprocessor includes and imports, macro definitions,
//! conditionals, the pragmas that alter header search or macro state, and
//! C++ module / Objective-C `@import` declarations. Everything else is
//! skipped without being tokenized.

mod print;
mod scan;

pub use print::{minimize, minimize_source};
pub use scan::{DirectiveScanner, scan};

use std::ops::Range;

use crate::lexer::Token;

/// Lexing options.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
    /// Recognize `u`, `u8` and `U` as literal prefixes. Off by default:
    /// most callers scan headers that must also parse as C, where `u"x"`
    /// is an identifier followed by a string.
    pub unicode_literal_prefixes: bool,
}

/// What a retained directive is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    PpDefine,
    PpUndef,
    PpInclude,
    PpIncludeNext,
    PpIncludeMacros,
    PpImport,
    PpPragmaImport,
    PpPragmaPushMacro,
    PpPragmaPopMacro,
    PpPragmaIncludeAlias,
    PpPragmaOnce,
    PpPragmaSystemHeader,
    PpIf,
    PpIfdef,
    PpIfndef,
    PpElif,
    PpElifdef,
    PpElifndef,
    PpElse,
    PpEndif,
    /// Consumed during scanning, never retained.
    PpWarning,
    /// Consumed during scanning, never retained.
    PpError,
    DeclAtImport,
    CxxModuleDecl,
    CxxExportModuleDecl,
    CxxImportDecl,
    /// Marker that skipped tokens sit after the last retained directive, so
    /// the file does not end in directives alone.
    TokensPresentBeforeEof,
    /// Terminator of every successful scan.
    PpEof,
}

impl std::fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DirectiveKind::PpDefine => "pp_define",
            DirectiveKind::PpUndef => "pp_undef",
            DirectiveKind::PpInclude => "pp_include",
            DirectiveKind::PpIncludeNext => "pp_include_next",
            DirectiveKind::PpIncludeMacros => "pp___include_macros",
            DirectiveKind::PpImport => "pp_import",
            DirectiveKind::PpPragmaImport => "pp_pragma_import",
            DirectiveKind::PpPragmaPushMacro => "pp_pragma_push_macro",
            DirectiveKind::PpPragmaPopMacro => "pp_pragma_pop_macro",
            DirectiveKind::PpPragmaIncludeAlias => "pp_pragma_include_alias",
            DirectiveKind::PpPragmaOnce => "pp_pragma_once",
            DirectiveKind::PpPragmaSystemHeader => "pp_pragma_system_header",
            DirectiveKind::PpIf => "pp_if",
            DirectiveKind::PpIfdef => "pp_ifdef",
            DirectiveKind::PpIfndef => "pp_ifndef",
            DirectiveKind::PpElif => "pp_elif",
            DirectiveKind::PpElifdef => "pp_elifdef",
            DirectiveKind::PpElifndef => "pp_elifndef",
            DirectiveKind::PpElse => "pp_else",
            DirectiveKind::PpEndif => "pp_endif",
            DirectiveKind::PpWarning => "pp_warning",
            DirectiveKind::PpError => "pp_error",
            DirectiveKind::DeclAtImport => "decl_at_import",
            DirectiveKind::CxxModuleDecl => "cxx_module_decl",
            DirectiveKind::CxxExportModuleDecl => "cxx_export_module_decl",
            DirectiveKind::CxxImportDecl => "cxx_import_decl",
            DirectiveKind::TokensPresentBeforeEof => "tokens_present_before_eof",
            DirectiveKind::PpEof => "pp_eof",
        };
        write!(f, "{}", name)
    }
}

/// A retained directive: its kind plus the range of its tokens in
/// [`ScanOutput::tokens`]. Ranges are ordered and non-overlapping, and
/// include the `Eod`/`Eof` token that ended the directive when the
/// directive consumed its line (a `_Pragma("...")` operator leaves the rest
/// of its line to the scan loop). `TokensPresentBeforeEof` and `PpEof`
/// carry empty ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub kind: DirectiveKind,
    pub token_range: Range<usize>,
}

/// Product of a scan: the flat token list of all retained directives and
/// the directive list indexing into it.
#[derive(Debug, Default)]
pub struct ScanOutput {
    pub tokens: Vec<Token>,
    pub directives: Vec<Directive>,
}

impl ScanOutput {
    /// Tokens of one directive.
    pub fn directive_tokens(&self, directive: &Directive) -> &[Token] {
        &self.tokens[directive.token_range.clone()]
    }
}
