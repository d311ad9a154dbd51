//! Minimized source reconstruction.
//!
//! Directives are re-emitted as their retained tokens. Token bytes are taken
//! verbatim from the original buffer, so escaped line breaks inside a token
//! survive, while the whitespace between tokens is discarded and re-created
//! from token kinds alone. Line structure comes from the retained
//! end-of-line tokens, each printed as a bare newline.

use crate::common::ScanResult;
use crate::lexer::{Punct, TokenKind};

use super::{DirectiveKind, ScanOptions, ScanOutput, scan};

/// Marker emitted in place of trailing non-directive content.
const TOKENS_BEFORE_EOF: &[u8] = b"<TokBeforeEOF>";

/// Whether a space must separate two adjacent retained tokens.
///
/// Tokens of the same kind get one so they cannot merge, brackets and parens
/// excepted. Across kinds only a few pairs are kept apart: a literal, header
/// name or `#` straight after an identifier, identifier-like tokens after a
/// closing paren, and list continuations after a comma. Everything else
/// packs tight.
fn needs_space(prev: TokenKind, next: TokenKind) -> bool {
    if prev == next {
        return !matches!(
            next,
            TokenKind::Punct(Punct::LParen | Punct::RParen | Punct::LSquare | Punct::RSquare)
        );
    }
    match prev {
        TokenKind::Identifier => matches!(
            next,
            TokenKind::Number
                | TokenKind::StringLiteral
                | TokenKind::RawStringLiteral
                | TokenKind::CharLiteral
                | TokenKind::HeaderName
                | TokenKind::Punct(Punct::Hash)
        ),
        TokenKind::Punct(Punct::RParen) => matches!(
            next,
            TokenKind::Identifier
                | TokenKind::StringLiteral
                | TokenKind::RawStringLiteral
                | TokenKind::CharLiteral
                | TokenKind::Unknown
                | TokenKind::Punct(Punct::Hash)
        ),
        TokenKind::Punct(Punct::Comma) => matches!(
            next,
            TokenKind::StringLiteral
                | TokenKind::RawStringLiteral
                | TokenKind::HeaderName
                | TokenKind::Punct(Punct::LParen | Punct::Lt)
        ),
        _ => false,
    }
}

/// Render the retained directives of `output` as minimized source text.
///
/// `source` must be the buffer the scan ran over; token spans index into it.
/// The result ends with a newline whenever it is non-empty.
pub fn minimize(source: &[u8], output: &ScanOutput) -> Vec<u8> {
    let mut out = Vec::with_capacity(output.tokens.len() * 8);
    for directive in &output.directives {
        if directive.kind == DirectiveKind::TokensPresentBeforeEof {
            out.extend_from_slice(TOKENS_BEFORE_EOF);
        }
        let mut prev: Option<TokenKind> = None;
        for token in output.directive_tokens(directive) {
            if token.ends_directive() {
                out.push(b'\n');
                prev = None;
                continue;
            }
            if let Some(prev) = prev {
                if needs_space(prev, token.kind) {
                    out.push(b' ');
                }
            }
            out.extend_from_slice(token.text(source));
            prev = Some(token.kind);
        }
    }
    if out.last().is_some_and(|&b| b != b'\n') {
        out.push(b'\n');
    }
    out
}

/// Scan `source` and render it in one step.
pub fn minimize_source(source: &[u8], options: &ScanOptions) -> ScanResult<Vec<u8>> {
    let output = scan(source, options)?;
    Ok(minimize(source, &output))
}
