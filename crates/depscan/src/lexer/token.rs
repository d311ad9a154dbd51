//! Token definitions for the dependency directive lexer

use crate::common::Span;

/// Minimal token with source location and re-emission flags.
///
/// The lexer never materializes token text. A token is its byte range into
/// the original buffer plus just enough formatting state to reprint it:
/// whether whitespace preceded it and whether it was the first thing on its
/// line. `spliced` marks tokens whose spelling contains escaped line breaks,
/// so consumers that compare spellings know when a cleanup pass is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub leading_space: bool,
    pub start_of_line: bool,
    pub spliced: bool,
}

impl Token {
    /// True for the two kinds that terminate a directive: end of the logical
    /// line and end of input.
    pub fn ends_directive(&self) -> bool {
        matches!(self.kind, TokenKind::Eod | TokenKind::Eof)
    }

    pub fn is_punct(&self, punct: Punct) -> bool {
        self.kind == TokenKind::Punct(punct)
    }

    /// Raw bytes of the token, escaped line breaks included.
    pub fn text<'s>(&self, source: &'s [u8]) -> &'s [u8] {
        &source[self.span.start..self.span.end]
    }
}

/// Token kinds the directive scanner can tell apart.
///
/// Code that never reaches a directive is skipped without producing tokens
/// at all, so this set only has to cover what directive bodies contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    Number,
    Punct(Punct),
    StringLiteral,
    CharLiteral,
    RawStringLiteral,
    /// `<...>` include argument, only produced in header-name mode.
    HeaderName,
    /// Bytes that form no recognized token, e.g. a stray backslash or an
    /// unterminated plain literal running to end of line.
    Unknown,
    /// End of the logical line (escaped line breaks do not count).
    Eod,
    Eof,
}

/// Punctuators the directive scanner or the minimizer inspects. Everything
/// else lexes with correct extent but collapses into `Other`.
///
/// `::` is its own token so a module partition reference `import :name`
/// (single colon) and a scope reference `import::nested` (never a
/// directive) stay distinct on one token of lookahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Punct {
    Hash,
    HashHash,
    At,
    LParen,
    RParen,
    LSquare,
    RSquare,
    Comma,
    Semi,
    Colon,
    ColonColon,
    Lt,
    Other,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Identifier => write!(f, "identifier"),
            TokenKind::Number => write!(f, "number"),
            TokenKind::Punct(Punct::Hash) => write!(f, "'#'"),
            TokenKind::Punct(Punct::HashHash) => write!(f, "'##'"),
            TokenKind::Punct(Punct::At) => write!(f, "'@'"),
            TokenKind::Punct(Punct::LParen) => write!(f, "'('"),
            TokenKind::Punct(Punct::RParen) => write!(f, "')'"),
            TokenKind::Punct(Punct::LSquare) => write!(f, "'['"),
            TokenKind::Punct(Punct::RSquare) => write!(f, "']'"),
            TokenKind::Punct(Punct::Comma) => write!(f, "','"),
            TokenKind::Punct(Punct::Semi) => write!(f, "';'"),
            TokenKind::Punct(Punct::Colon) => write!(f, "':'"),
            TokenKind::Punct(Punct::ColonColon) => write!(f, "'::'"),
            TokenKind::Punct(Punct::Lt) => write!(f, "'<'"),
            TokenKind::Punct(Punct::Other) => write!(f, "punctuator"),
            TokenKind::StringLiteral => write!(f, "string literal"),
            TokenKind::CharLiteral => write!(f, "character literal"),
            TokenKind::RawStringLiteral => write!(f, "raw string literal"),
            TokenKind::HeaderName => write!(f, "header name"),
            TokenKind::Unknown => write!(f, "unknown bytes"),
            TokenKind::Eod => write!(f, "end of directive"),
            TokenKind::Eof => write!(f, "end of file"),
        }
    }
}
