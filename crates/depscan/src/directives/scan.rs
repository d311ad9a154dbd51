//! Directive recognition over the minimal token stream.
//!
//! A line is considered as a directive candidate when its first token is
//! `#`, `@`, or one of the contextual keywords `module`, `import`, `export`
//! and `_Pragma`. Candidate lines either commit to a [`Directive`] whose
//! tokens are retained, terminator included, or are abandoned: their offset
//! is remembered so the scan can tell whether skipped content trails the
//! last retained directive.

use std::mem;

use crate::common::{ScanError, ScanResult};
use crate::lexer::{Lexer, Punct, Token, TokenKind, spelling, splice_len};

use super::{Directive, DirectiveKind, ScanOptions, ScanOutput};

/// Reusable recognizer for dependency directives.
///
/// The scanner owns the growing token and directive lists plus the
/// bookkeeping needed to place the trailing-content marker. One instance can
/// serve any number of sources; every call to [`DirectiveScanner::scan`]
/// starts from a clean slate and hands the accumulated buffers back in the
/// returned [`ScanOutput`].
#[derive(Debug, Default)]
pub struct DirectiveScanner {
    tokens: Vec<Token>,
    directives: Vec<Directive>,
    /// Tokens of the directive currently being recognized.
    current: Vec<Token>,
    /// Highest offset of source text that was skipped rather than retained.
    last_skipped: Option<usize>,
}

impl DirectiveScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan `source` and return the retained tokens and directives.
    ///
    /// The directive list of a successful scan always ends with
    /// [`DirectiveKind::PpEof`], preceded by
    /// [`DirectiveKind::TokensPresentBeforeEof`] when skipped content sits
    /// after the last retained directive.
    pub fn scan(&mut self, source: &[u8], options: &ScanOptions) -> ScanResult<ScanOutput> {
        self.tokens.clear();
        self.directives.clear();
        self.current.clear();
        self.last_skipped = None;

        let mut lexer = Lexer::new(source, options.unicode_literal_prefixes);
        loop {
            let tok = lexer.next_token()?;
            match tok.kind {
                TokenKind::Eof => break,
                TokenKind::Eod => {}
                TokenKind::Punct(Punct::Hash) if tok.start_of_line => {
                    self.lex_hash(source, &mut lexer, tok)?;
                }
                TokenKind::Punct(Punct::At) if tok.start_of_line => {
                    self.lex_at(source, &mut lexer, tok)?;
                }
                TokenKind::Identifier if tok.start_of_line => {
                    match spelling(source, &tok).as_ref() {
                        b"module" | b"import" | b"export" => {
                            self.lex_module(source, &mut lexer, tok)?;
                        }
                        b"_Pragma" => self.lex_pragma_operator(source, &mut lexer, tok, options)?,
                        _ => self.skip_line(&mut lexer, &tok)?,
                    }
                }
                _ => self.skip_line(&mut lexer, &tok)?,
            }
        }

        let trailing = match (self.last_skipped, self.tokens.last()) {
            (Some(_), None) => true,
            (Some(skipped), Some(last)) => skipped > last.span.start,
            (None, _) => false,
        };
        if trailing {
            self.mark(DirectiveKind::TokensPresentBeforeEof);
        }
        self.mark(DirectiveKind::PpEof);

        Ok(ScanOutput {
            tokens: mem::take(&mut self.tokens),
            directives: mem::take(&mut self.directives),
        })
    }

    /// `#` at the start of a line: dispatch on the directive keyword.
    fn lex_hash(&mut self, source: &[u8], lexer: &mut Lexer, hash: Token) -> ScanResult<()> {
        self.current.clear();
        self.current.push(hash);
        let kw = lexer.next_token()?;
        if kw.kind != TokenKind::Identifier {
            return self.drop_candidate(lexer, &hash, &kw);
        }
        let name = spelling(source, &kw);
        self.current.push(kw);
        match name.as_ref() {
            b"define" => self.lex_define(lexer, hash),
            b"undef" => self.lex_to_eod(lexer, DirectiveKind::PpUndef),
            b"include" => self.lex_include(lexer, hash, DirectiveKind::PpInclude),
            b"include_next" => self.lex_include(lexer, hash, DirectiveKind::PpIncludeNext),
            b"__include_macros" => self.lex_include(lexer, hash, DirectiveKind::PpIncludeMacros),
            b"import" => self.lex_include(lexer, hash, DirectiveKind::PpImport),
            b"pragma" => self.lex_pragma(source, lexer, hash),
            b"if" => self.lex_to_eod(lexer, DirectiveKind::PpIf),
            b"ifdef" => self.lex_to_eod(lexer, DirectiveKind::PpIfdef),
            b"ifndef" => self.lex_to_eod(lexer, DirectiveKind::PpIfndef),
            b"elif" => self.lex_to_eod(lexer, DirectiveKind::PpElif),
            b"elifdef" => self.lex_to_eod(lexer, DirectiveKind::PpElifdef),
            b"elifndef" => self.lex_to_eod(lexer, DirectiveKind::PpElifndef),
            b"else" => self.lex_to_eod(lexer, DirectiveKind::PpElse),
            b"endif" => self.lex_endif(lexer, hash),
            b"warning" | b"error" => {
                // Message text is opaque and frequently unbalanced; consume
                // it raw so a stray quote cannot derail the lexer.
                self.current.clear();
                self.note_skipped(hash.span.start);
                lexer.skip_to_eol_raw();
                Ok(())
            }
            _ => self.drop_candidate(lexer, &hash, &kw),
        }
    }

    /// After `# define`. The macro name must be an identifier: a missing
    /// name drops the line, any other token there is malformed input. The
    /// body needs no further shaping here; re-emission spacing is decided
    /// from token kinds alone.
    fn lex_define(&mut self, lexer: &mut Lexer, hash: Token) -> ScanResult<()> {
        let name = lexer.next_token()?;
        if name.ends_directive() {
            return self.drop_candidate(lexer, &hash, &name);
        }
        if name.kind != TokenKind::Identifier {
            return Err(ScanError::malformed_define_name(name.span));
        }
        self.current.push(name);
        self.lex_to_eod(lexer, DirectiveKind::PpDefine)
    }

    /// Body of an include-like directive. The first argument token may be a
    /// `<...>` header name; the rest of the line rides along verbatim. A
    /// directive with no argument at all is dropped.
    fn lex_include(&mut self, lexer: &mut Lexer, hash: Token, kind: DirectiveKind) -> ScanResult<()> {
        let first = lexer.next_include_token()?;
        if first.ends_directive() {
            return self.drop_candidate(lexer, &hash, &first);
        }
        self.current.push(first);
        self.lex_to_eod(lexer, kind)
    }

    /// Retain the rest of the line, terminator included, as the body of
    /// `kind`.
    fn lex_to_eod(&mut self, lexer: &mut Lexer, kind: DirectiveKind) -> ScanResult<()> {
        loop {
            let tok = lexer.next_token()?;
            self.current.push(tok);
            if tok.ends_directive() {
                break;
            }
        }
        self.push_directive(kind);
        Ok(())
    }

    /// `#endif` closes the innermost conditional. An empty trailing `#else`
    /// branch is dropped first; a `#ifdef`/`#ifndef` block left empty by
    /// that collapses entirely, the `#endif` included. `#if` and `#elif`
    /// blocks always keep their skeleton, since the condition text alone can
    /// name dependencies through feature probes.
    fn lex_endif(&mut self, lexer: &mut Lexer, hash: Token) -> ScanResult<()> {
        if self.top_kind() == Some(DirectiveKind::PpElse) {
            self.pop_directive();
        }
        if matches!(
            self.top_kind(),
            Some(DirectiveKind::PpIfdef | DirectiveKind::PpIfndef)
        ) {
            self.pop_directive();
            self.current.clear();
            // The collapsed block turns back into skipped content, and this
            // line goes with it.
            self.note_skipped(hash.span.start);
            if let Some(last) = lexer.skip_rest_of_line()? {
                self.note_skipped(last);
            }
            return Ok(());
        }
        self.lex_to_eod(lexer, DirectiveKind::PpEndif)
    }

    /// `@` at the start of a line. Only `@import` opens a directive; its
    /// body runs to `;` like the C++ forms, with no further lookahead.
    fn lex_at(&mut self, source: &[u8], lexer: &mut Lexer, at: Token) -> ScanResult<()> {
        self.current.clear();
        self.current.push(at);
        let kw = lexer.next_token()?;
        if kw.kind != TokenKind::Identifier || spelling(source, &kw).as_ref() != b"import" {
            return self.drop_candidate(lexer, &at, &kw);
        }
        self.current.push(kw);
        let first = lexer.next_token()?;
        self.lex_module_tail(lexer, at, DirectiveKind::DeclAtImport, first)
    }

    /// `module`, `import` or `export` at the start of a line. One token of
    /// lookahead (two for a partition colon) decides whether this is a
    /// module directive at all; the lookahead never crosses a line break,
    /// so a keyword alone on its line stays ordinary code.
    fn lex_module(&mut self, source: &[u8], lexer: &mut Lexer, first: Token) -> ScanResult<()> {
        self.current.clear();
        self.current.push(first);
        let keyword = spelling(source, &first);
        let mut is_import = keyword.as_ref() == b"import";
        let exported = keyword.as_ref() == b"export";
        if exported {
            let second = lexer.next_token()?;
            if second.kind != TokenKind::Identifier {
                return self.abandon_module(lexer, &first);
            }
            let name = spelling(source, &second);
            is_import = name.as_ref() == b"import";
            if !is_import && name.as_ref() != b"module" {
                return self.abandon_module(lexer, &first);
            }
            self.current.push(second);
        }

        let kind = if is_import {
            DirectiveKind::CxxImportDecl
        } else if exported {
            DirectiveKind::CxxExportModuleDecl
        } else {
            DirectiveKind::CxxModuleDecl
        };

        let look = lexer.next_token()?;
        match look.kind {
            TokenKind::Identifier
            | TokenKind::StringLiteral
            | TokenKind::RawStringLiteral
            | TokenKind::Punct(Punct::Semi | Punct::Lt) => {
                self.lex_module_tail(lexer, first, kind, look)
            }
            TokenKind::Punct(Punct::Colon) => {
                // A partition (`import :name;`, `module :private;`) needs an
                // identifier right after the colon; `import:(int)x` and
                // `import::nested` are ordinary code.
                let after = lexer.next_token()?;
                if after.kind != TokenKind::Identifier {
                    return self.abandon_module(lexer, &first);
                }
                self.current.push(look);
                self.lex_module_tail(lexer, first, kind, after)
            }
            _ => self.abandon_module(lexer, &first),
        }
    }

    /// Gather tokens up to and including the terminating `;` of a
    /// module-style directive, then require the line to end. Line breaks
    /// inside the body ride along as tokens. A `#` or `@` opening a line
    /// abandons the candidate in favor of the new directive; end of input
    /// before the `;` is an error.
    fn lex_module_tail(
        &mut self,
        lexer: &mut Lexer,
        origin: Token,
        kind: DirectiveKind,
        mut tok: Token,
    ) -> ScanResult<()> {
        loop {
            if tok.kind == TokenKind::Eof {
                return Err(ScanError::unterminated_module_directive(origin.span));
            }
            if tok.start_of_line && (tok.is_punct(Punct::Hash) || tok.is_punct(Punct::At)) {
                self.current.clear();
                self.note_skipped(origin.span.start);
                lexer.seek_line_start(tok.span.start);
                return Ok(());
            }
            self.current.push(tok);
            if tok.is_punct(Punct::Semi) {
                break;
            }
            tok = lexer.next_token()?;
        }
        let after = lexer.next_token()?;
        if !after.ends_directive() {
            return Err(ScanError::tokens_after_module_directive(after.span));
        }
        self.current.push(after);
        self.push_directive(kind);
        Ok(())
    }

    /// Walk away from a speculative module line: rewind to its first token
    /// and drop that line as skipped content.
    fn abandon_module(&mut self, lexer: &mut Lexer, origin: &Token) -> ScanResult<()> {
        self.current.clear();
        lexer.seek_line_start(origin.span.start);
        self.note_skipped(origin.span.start);
        if let Some(last) = lexer.skip_rest_of_line()? {
            self.note_skipped(last);
        }
        Ok(())
    }

    /// After `# pragma`. Only the handful of pragmas that change macro
    /// state or header search are retained; everything else is dropped.
    fn lex_pragma(&mut self, source: &[u8], lexer: &mut Lexer, hash: Token) -> ScanResult<()> {
        let sub = lexer.next_token()?;
        if sub.kind != TokenKind::Identifier {
            return self.drop_candidate(lexer, &hash, &sub);
        }
        let name = spelling(source, &sub);
        self.current.push(sub);
        match name.as_ref() {
            b"once" => self.lex_to_eod(lexer, DirectiveKind::PpPragmaOnce),
            b"push_macro" => self.lex_to_eod(lexer, DirectiveKind::PpPragmaPushMacro),
            b"pop_macro" => self.lex_to_eod(lexer, DirectiveKind::PpPragmaPopMacro),
            b"include_alias" => self.lex_include_alias(lexer),
            b"clang" => {
                let second = lexer.next_token()?;
                if second.kind != TokenKind::Identifier {
                    return self.drop_candidate(lexer, &hash, &second);
                }
                match spelling(source, &second).as_ref() {
                    b"system_header" => {
                        self.current.push(second);
                        self.lex_to_eod(lexer, DirectiveKind::PpPragmaSystemHeader)
                    }
                    b"module" => {
                        self.current.push(second);
                        let third = lexer.next_token()?;
                        if third.kind == TokenKind::Identifier
                            && spelling(source, &third).as_ref() == b"import"
                        {
                            self.current.push(third);
                            self.lex_to_eod(lexer, DirectiveKind::PpPragmaImport)
                        } else {
                            self.drop_candidate(lexer, &hash, &third)
                        }
                    }
                    _ => self.drop_candidate(lexer, &hash, &second),
                }
            }
            b"GCC" => {
                let second = lexer.next_token()?;
                if second.kind == TokenKind::Identifier
                    && spelling(source, &second).as_ref() == b"system_header"
                {
                    self.current.push(second);
                    self.lex_to_eod(lexer, DirectiveKind::PpPragmaSystemHeader)
                } else {
                    self.drop_candidate(lexer, &hash, &second)
                }
            }
            _ => self.drop_candidate(lexer, &hash, &sub),
        }
    }

    /// `#pragma include_alias(<a.h>, <b.h>)`: both names lex as header
    /// names, the surrounding punctuation rides along.
    fn lex_include_alias(&mut self, lexer: &mut Lexer) -> ScanResult<()> {
        loop {
            let tok = lexer.next_include_token()?;
            self.current.push(tok);
            if tok.ends_directive() {
                break;
            }
        }
        self.push_directive(DirectiveKind::PpPragmaIncludeAlias);
        Ok(())
    }

    /// `_Pragma("string")` at the start of a line. The string content is
    /// unescaped (raw strings taken verbatim) and re-scanned as a pragma
    /// line of its own; the operator is retained only when that line names
    /// a dependency-relevant pragma. The rest of the line after `)` stays
    /// with the scan loop.
    fn lex_pragma_operator(
        &mut self,
        source: &[u8],
        lexer: &mut Lexer,
        first: Token,
        options: &ScanOptions,
    ) -> ScanResult<()> {
        self.current.clear();
        self.current.push(first);
        let lparen = lexer.next_token()?;
        if !lparen.is_punct(Punct::LParen) {
            return self.drop_candidate(lexer, &first, &lparen);
        }
        self.current.push(lparen);
        let arg = lexer.next_token()?;
        let content = match arg.kind {
            TokenKind::StringLiteral => destring(spelling(source, &arg).as_ref()),
            TokenKind::RawStringLiteral => raw_string_content(spelling(source, &arg).as_ref()).to_vec(),
            _ => return self.drop_candidate(lexer, &first, &arg),
        };
        self.current.push(arg);
        let rparen = lexer.next_token()?;
        if !rparen.is_punct(Punct::RParen) {
            return self.drop_candidate(lexer, &first, &rparen);
        }
        self.current.push(rparen);
        match pragma_directive_kind(&content, options) {
            Some(kind) => {
                self.push_directive(kind);
                Ok(())
            }
            None => self.drop_candidate(lexer, &first, &rparen),
        }
    }

    /// Abandon a candidate line. The introducer becomes skipped content and
    /// the rest of the line goes with it, unless the decision was forced by
    /// the line already being over.
    fn drop_candidate(
        &mut self,
        lexer: &mut Lexer,
        origin: &Token,
        stopped_at: &Token,
    ) -> ScanResult<()> {
        self.current.clear();
        self.note_skipped(origin.span.start);
        if stopped_at.ends_directive() {
            return Ok(());
        }
        if let Some(last) = lexer.skip_rest_of_line()? {
            self.note_skipped(last);
        }
        Ok(())
    }

    /// Record `from` as skipped content and drop the rest of its line.
    fn skip_line(&mut self, lexer: &mut Lexer, from: &Token) -> ScanResult<()> {
        self.note_skipped(from.span.start);
        if let Some(last) = lexer.skip_rest_of_line()? {
            self.note_skipped(last);
        }
        Ok(())
    }

    fn note_skipped(&mut self, offset: usize) {
        self.last_skipped = Some(match self.last_skipped {
            Some(prev) => prev.max(offset),
            None => offset,
        });
    }

    /// Seal the tokens gathered in `current` as one directive.
    fn push_directive(&mut self, kind: DirectiveKind) {
        let start = self.tokens.len();
        self.tokens.append(&mut self.current);
        self.directives.push(Directive {
            kind,
            token_range: start..self.tokens.len(),
        });
    }

    /// Drop the most recent directive together with its tokens.
    fn pop_directive(&mut self) {
        if let Some(directive) = self.directives.pop() {
            self.tokens.truncate(directive.token_range.start);
        }
    }

    fn top_kind(&self) -> Option<DirectiveKind> {
        self.directives.last().map(|d| d.kind)
    }

    /// Append a token-less marker directive.
    fn mark(&mut self, kind: DirectiveKind) {
        let here = self.tokens.len();
        self.directives.push(Directive {
            kind,
            token_range: here..here,
        });
    }
}

/// Scan `source` with a fresh scanner.
pub fn scan(source: &[u8], options: &ScanOptions) -> ScanResult<ScanOutput> {
    DirectiveScanner::new().scan(source, options)
}

/// Content of an ordinary string literal: prefix and quotes stripped,
/// escaped quotes and backslashes unescaped, escaped line breaks removed.
fn destring(bytes: &[u8]) -> Vec<u8> {
    let open = bytes.iter().position(|&b| b == b'"').map_or(0, |i| i + 1);
    let inner = &bytes[open..bytes.len().saturating_sub(1).max(open)];
    let mut out = Vec::with_capacity(inner.len());
    let mut i = 0;
    while i < inner.len() {
        if inner[i] == b'\\' {
            if let Some(n) = splice_len(inner, i) {
                i += n;
                continue;
            }
            if matches!(inner.get(i + 1), Some(b'"' | b'\\')) {
                out.push(inner[i + 1]);
                i += 2;
                continue;
            }
        }
        out.push(inner[i]);
        i += 1;
    }
    out
}

/// Content of a raw string literal, between `delim(` and `)delim"`. The
/// token shape `prefix"delim( ... )delim"` is guaranteed by the lexer.
fn raw_string_content(bytes: &[u8]) -> &[u8] {
    let open_quote = bytes.iter().position(|&b| b == b'"').unwrap_or(0);
    let open_paren = bytes
        .iter()
        .position(|&b| b == b'(')
        .unwrap_or(open_quote + 1);
    let delim = open_paren - open_quote - 1;
    let end = bytes.len().saturating_sub(delim + 2).max(open_paren + 1);
    &bytes[open_paren + 1..end]
}

/// Classify `_Pragma` content by scanning it as a directive line of its
/// own. Returns the kind when the content forms exactly one retained pragma
/// directive.
fn pragma_directive_kind(content: &[u8], options: &ScanOptions) -> Option<DirectiveKind> {
    let mut line = Vec::with_capacity(content.len() + 8);
    line.extend_from_slice(b"#pragma ");
    line.extend_from_slice(content);
    let output = DirectiveScanner::new().scan(&line, options).ok()?;
    match output.directives.as_slice() {
        [directive, eof] if eof.kind == DirectiveKind::PpEof => match directive.kind {
            kind @ (DirectiveKind::PpPragmaOnce
            | DirectiveKind::PpPragmaPushMacro
            | DirectiveKind::PpPragmaPopMacro
            | DirectiveKind::PpPragmaImport
            | DirectiveKind::PpPragmaIncludeAlias
            | DirectiveKind::PpPragmaSystemHeader) => Some(kind),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn kinds(source: &str) -> Vec<DirectiveKind> {
        scan(source.as_bytes(), &ScanOptions::default())
            .unwrap()
            .directives
            .iter()
            .map(|d| d.kind)
            .collect()
    }

    fn scan_err(source: &str) -> ScanError {
        scan(source.as_bytes(), &ScanOptions::default()).unwrap_err()
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(kinds(""), vec![DirectiveKind::PpEof]);
        assert_eq!(kinds("\n  \n\t\n"), vec![DirectiveKind::PpEof]);
    }

    #[test]
    fn test_non_directive_content_leaves_only_the_marker() {
        assert_eq!(
            kinds("int main() {\n  return 0;\n}\n"),
            vec![DirectiveKind::TokensPresentBeforeEof, DirectiveKind::PpEof]
        );
    }

    #[test]
    fn test_all_directive_kinds_in_order() {
        use DirectiveKind::*;
        let source = "#define A\n\
                      #undef A\n\
                      #endif\n\
                      #if A\n\
                      #ifdef A\n\
                      #ifndef A\n\
                      #elif A\n\
                      #elifdef A\n\
                      #elifndef A\n\
                      #else\n\
                      #include <a.h>\n\
                      #include_next <a.h>\n\
                      #__include_macros <a.h>\n\
                      #import \"a.h\"\n\
                      #pragma clang module import A\n\
                      #pragma push_macro(\"A\")\n\
                      #pragma pop_macro(\"A\")\n\
                      #pragma include_alias(<a.h>, \"b.h\")\n\
                      #pragma once\n\
                      #pragma clang system_header\n\
                      @import a;\n\
                      module m;\n\
                      export module m;\n\
                      import m;\n";
        assert_eq!(
            kinds(source),
            vec![
                PpDefine,
                PpUndef,
                PpEndif,
                PpIf,
                PpIfdef,
                PpIfndef,
                PpElif,
                PpElifdef,
                PpElifndef,
                PpElse,
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
                DeclAtImport,
                CxxModuleDecl,
                CxxExportModuleDecl,
                CxxImportDecl,
                PpEof,
            ]
        );
    }

    #[test]
    fn test_empty_conditional_blocks_collapse() {
        // The pruned pair itself counts as skipped content.
        assert_eq!(
            kinds("#ifdef A\n#endif\n"),
            vec![DirectiveKind::TokensPresentBeforeEof, DirectiveKind::PpEof]
        );
        assert_eq!(
            kinds("#ifndef A\n#endif\n"),
            vec![DirectiveKind::TokensPresentBeforeEof, DirectiveKind::PpEof]
        );
        assert_eq!(
            kinds("#ifdef A\nvoid skip();\n#endif\n"),
            vec![DirectiveKind::TokensPresentBeforeEof, DirectiveKind::PpEof]
        );
        // A later directive out-offsets the pruned lines again.
        assert_eq!(
            kinds("#ifdef A\n#endif\n#define X\n"),
            vec![DirectiveKind::PpDefine, DirectiveKind::PpEof]
        );
    }

    #[test]
    fn test_if_blocks_are_never_pruned() {
        assert_eq!(
            kinds("#if A\n#endif\n"),
            vec![DirectiveKind::PpIf, DirectiveKind::PpEndif, DirectiveKind::PpEof]
        );
    }

    #[test]
    fn test_empty_trailing_else_branch_is_dropped() {
        assert_eq!(
            kinds("#if A\n#define X\n#else\n#endif\n"),
            vec![
                DirectiveKind::PpIf,
                DirectiveKind::PpDefine,
                DirectiveKind::PpEndif,
                DirectiveKind::PpEof,
            ]
        );
    }

    #[test]
    fn test_elif_chain_survives_block_pruning() {
        assert_eq!(
            kinds("#ifdef A\nvoid skip();\n#elif B\n#elif C\n#else\n#endif\n"),
            vec![
                DirectiveKind::PpIfdef,
                DirectiveKind::PpElif,
                DirectiveKind::PpElif,
                DirectiveKind::PpEndif,
                DirectiveKind::PpEof,
            ]
        );
    }

    #[test]
    fn test_nested_empty_blocks_cascade() {
        assert_eq!(
            kinds("#ifdef A\n#ifndef B\n#endif\n#endif\n"),
            vec![DirectiveKind::TokensPresentBeforeEof, DirectiveKind::PpEof]
        );
    }

    #[test]
    fn test_retained_define_keeps_its_block() {
        assert_eq!(
            kinds("#ifdef A\n#define X 1\n#endif\n"),
            vec![
                DirectiveKind::PpIfdef,
                DirectiveKind::PpDefine,
                DirectiveKind::PpEndif,
                DirectiveKind::PpEof,
            ]
        );
    }

    #[test]
    fn test_unbalanced_conditionals_are_tolerated() {
        assert_eq!(
            kinds("#endif\n#else\n#elif A\n"),
            vec![
                DirectiveKind::PpEndif,
                DirectiveKind::PpElse,
                DirectiveKind::PpElif,
                DirectiveKind::PpEof,
            ]
        );
        // An unterminated block simply stays open.
        assert_eq!(
            kinds("#ifdef A\n#define X\n"),
            vec![DirectiveKind::PpIfdef, DirectiveKind::PpDefine, DirectiveKind::PpEof]
        );
    }

    #[test]
    fn test_module_and_import_declarations() {
        use DirectiveKind::*;
        let source = "module m;\n\
                      import m.sub;\n\
                      export module m;\n\
                      export import :part;\n\
                      import \"quoted.h\";\n\
                      import <angled>;\n\
                      module :private;\n\
                      module;\n";
        assert_eq!(
            kinds(source),
            vec![
                CxxModuleDecl,
                CxxImportDecl,
                CxxExportModuleDecl,
                CxxImportDecl,
                CxxImportDecl,
                CxxImportDecl,
                CxxModuleDecl,
                CxxModuleDecl,
                PpEof,
            ]
        );
    }

    #[test]
    fn test_module_lookahead_stays_on_the_line() {
        // `import` alone on its line is ordinary code...
        assert_eq!(
            kinds("import\nm\n;\n"),
            vec![DirectiveKind::TokensPresentBeforeEof, DirectiveKind::PpEof]
        );
        // ...unless an escaped line break carries the name up.
        assert_eq!(
            kinds("import \\\nm;\n"),
            vec![DirectiveKind::CxxImportDecl, DirectiveKind::PpEof]
        );
        // Once accepted, the body may spill across real line breaks.
        assert_eq!(
            kinds("import m\n;\n"),
            vec![DirectiveKind::CxxImportDecl, DirectiveKind::PpEof]
        );
    }

    #[test]
    fn test_contextual_keywords_left_alone() {
        let source = "import.a = 3;\n\
                      import-a;\n\
                      module ^foo;\n\
                      export void f();\n\
                      import <<= 3;\n\
                      import::inner xi = {};\n\
                      module:(int)m;\n\
                      import:(int)i;\n";
        assert_eq!(
            kinds(source),
            vec![DirectiveKind::TokensPresentBeforeEof, DirectiveKind::PpEof]
        );
    }

    #[test]
    fn test_abandoned_module_line_does_not_swallow_the_next_one() {
        // The `#` aborts the speculative import; only the import line is
        // lost and the define is still found.
        assert_eq!(
            kinds("import x\n#define A\n;\n"),
            vec![
                DirectiveKind::PpDefine,
                DirectiveKind::TokensPresentBeforeEof,
                DirectiveKind::PpEof,
            ]
        );
        assert_eq!(
            kinds("@import A\n#define X\n"),
            vec![DirectiveKind::PpDefine, DirectiveKind::PpEof]
        );
    }

    #[test]
    fn test_spliced_module_keywords_still_match() {
        assert_eq!(
            kinds("exp\\\nort imp\\\nort m;\n"),
            vec![DirectiveKind::CxxImportDecl, DirectiveKind::PpEof]
        );
    }

    #[test]
    fn test_at_import_declaration() {
        assert_eq!(
            kinds("@import Foundation;\n"),
            vec![DirectiveKind::DeclAtImport, DirectiveKind::PpEof]
        );
        // The body may spill across lines as long as the `;` arrives.
        assert_eq!(
            kinds("@import A\n;\n"),
            vec![DirectiveKind::DeclAtImport, DirectiveKind::PpEof]
        );
    }

    #[test]
    fn test_other_at_lines_are_skipped() {
        assert_eq!(
            kinds("@interface Foo\n@end\n"),
            vec![DirectiveKind::TokensPresentBeforeEof, DirectiveKind::PpEof]
        );
    }

    #[test]
    fn test_define_name_must_be_an_identifier() {
        assert!(matches!(
            scan_err("#define 0\n"),
            ScanError::MalformedDefineName { .. }
        ));
        assert!(matches!(
            scan_err("#define &\n"),
            ScanError::MalformedDefineName { .. }
        ));
    }

    #[test]
    fn test_missing_define_name_is_dropped() {
        assert_eq!(
            kinds("#define\n#define A\n"),
            vec![DirectiveKind::PpDefine, DirectiveKind::PpEof]
        );
    }

    #[test]
    fn test_module_directive_must_reach_its_semicolon() {
        assert!(matches!(
            scan_err("@import A\n"),
            ScanError::UnterminatedModuleDirective { .. }
        ));
        assert!(matches!(
            scan_err("import m\n"),
            ScanError::UnterminatedModuleDirective { .. }
        ));
    }

    #[test]
    fn test_tokens_after_module_semicolon_fail() {
        assert!(matches!(
            scan_err("import m; int x;\n"),
            ScanError::TokensAfterModuleDirective { .. }
        ));
        assert!(matches!(
            scan_err("@import A; foo\n"),
            ScanError::TokensAfterModuleDirective { .. }
        ));
    }

    #[test]
    fn test_unterminated_raw_string_aborts_anywhere() {
        assert!(matches!(
            scan_err("#define A R\"(x\n"),
            ScanError::UnterminatedRawString { .. }
        ));
        // Even inside otherwise skipped content.
        assert!(matches!(
            scan_err("const char *s = R\"(abc\n"),
            ScanError::UnterminatedRawString { .. }
        ));
    }

    #[test]
    fn test_empty_argument_directives_are_dropped() {
        assert_eq!(
            kinds("#define\n#include\n#import\n#define A\n"),
            vec![DirectiveKind::PpDefine, DirectiveKind::PpEof]
        );
        // An ifdef block holding only an empty import prunes away.
        assert_eq!(
            kinds("#ifdef A\n#import \n#endif\n"),
            vec![DirectiveKind::TokensPresentBeforeEof, DirectiveKind::PpEof]
        );
    }

    #[test]
    fn test_unknown_pragmas_are_dropped() {
        assert_eq!(
            kinds("#pragma region x\n#pragma comment(lib, \"m\")\n#pragma import(A)\n#pragma once\n"),
            vec![DirectiveKind::PpPragmaOnce, DirectiveKind::PpEof]
        );
        // Truncated recognized forms are dropped too.
        assert_eq!(
            kinds("#pragma clang\n#pragma clang module\n#pragma GCC\n#pragma once\n"),
            vec![DirectiveKind::PpPragmaOnce, DirectiveKind::PpEof]
        );
        // The full spelling commits on the `import` keyword even with no
        // module path after it.
        assert_eq!(
            kinds("#pragma clang module import\n"),
            vec![DirectiveKind::PpPragmaImport, DirectiveKind::PpEof]
        );
    }

    #[test]
    fn test_warning_and_error_text_is_consumed() {
        assert_eq!(
            kinds("#warning \"unterminated\n#error {{{\n#define A\n"),
            vec![DirectiveKind::PpDefine, DirectiveKind::PpEof]
        );
        // A trailing backslash continues the message over the next line.
        assert_eq!(
            kinds("#warning \\\n#include <a.h>\n#include <b.h>\n"),
            vec![DirectiveKind::PpInclude, DirectiveKind::PpEof]
        );
        assert_eq!(
            kinds("#warning \\\n#include <a.h>\n"),
            vec![DirectiveKind::TokensPresentBeforeEof, DirectiveKind::PpEof]
        );
    }

    #[test]
    fn test_hashhash_lines_are_not_directives() {
        assert_eq!(
            kinds("#if 0\n##pragma cool\n##include \"t.h\"\n#endif\n#define E\n"),
            vec![
                DirectiveKind::PpIf,
                DirectiveKind::PpEndif,
                DirectiveKind::PpDefine,
                DirectiveKind::PpEof,
            ]
        );
    }

    #[test]
    fn test_empty_hash_is_harmless() {
        assert_eq!(
            kinds("#\n#define A\n"),
            vec![DirectiveKind::PpDefine, DirectiveKind::PpEof]
        );
    }

    #[test]
    fn test_skipped_lines_cross_literals_whole() {
        // Directive-looking text inside literals never surfaces.
        let source = "#ifndef GUARD\n\
                      #define GUARD\n\
                      const char *a = \"#include <ha.h>\";\n\
                      static const char b[] = R\"(#endif\n#import <no.h>\n)\";\n\
                      R\"()\"\n\
                      #endif\n";
        assert_eq!(
            kinds(source),
            vec![
                DirectiveKind::PpIfndef,
                DirectiveKind::PpDefine,
                DirectiveKind::PpEndif,
                DirectiveKind::PpEof,
            ]
        );
    }

    #[test]
    fn test_pragma_operator_forms() {
        assert_eq!(
            kinds("_Pragma(\"once\")\n"),
            vec![DirectiveKind::PpPragmaOnce, DirectiveKind::PpEof]
        );
        assert_eq!(
            kinds("_Pragma(R\"(push_macro(\"A\"))\")\n"),
            vec![DirectiveKind::PpPragmaPushMacro, DirectiveKind::PpEof]
        );
        assert_eq!(
            kinds("_Pragma(\"clang module import\")\n"),
            vec![DirectiveKind::PpPragmaImport, DirectiveKind::PpEof]
        );
        assert_eq!(
            kinds("_Pragma(\"region\")\n"),
            vec![DirectiveKind::TokensPresentBeforeEof, DirectiveKind::PpEof]
        );
    }

    #[test]
    fn test_malformed_pragma_operators_are_skipped() {
        assert_eq!(
            kinds("_Pragma\n_Pragma(\n_Pragma()\n_Pragma(A)\n#define A\n"),
            vec![DirectiveKind::PpDefine, DirectiveKind::PpEof]
        );
    }

    #[test]
    fn test_unicode_string_prefixes_are_config_gated() {
        let source = b"_Pragma(u\"once\")\n";
        let output = scan(source, &ScanOptions::default()).unwrap();
        assert_eq!(
            output.directives.iter().map(|d| d.kind).collect::<Vec<_>>(),
            vec![DirectiveKind::TokensPresentBeforeEof, DirectiveKind::PpEof]
        );

        let options = ScanOptions {
            unicode_literal_prefixes: true,
        };
        let output = scan(source, &options).unwrap();
        assert_eq!(
            output.directives.iter().map(|d| d.kind).collect::<Vec<_>>(),
            vec![DirectiveKind::PpPragmaOnce, DirectiveKind::PpEof]
        );
    }

    #[test]
    fn test_trailing_marker_needs_content_after_last_directive() {
        assert_eq!(
            kinds("#define A\nint x;\n"),
            vec![
                DirectiveKind::PpDefine,
                DirectiveKind::TokensPresentBeforeEof,
                DirectiveKind::PpEof,
            ]
        );
        assert_eq!(
            kinds("int x;\n#define A\n"),
            vec![DirectiveKind::PpDefine, DirectiveKind::PpEof]
        );
    }

    #[test]
    fn test_scanner_reuse_starts_clean() {
        let mut scanner = DirectiveScanner::new();
        let output = scanner
            .scan(b"#define A\nstray\n", &ScanOptions::default())
            .unwrap();
        assert_eq!(output.directives.len(), 3);

        let output = scanner.scan(b"#define B\n", &ScanOptions::default()).unwrap();
        assert_eq!(
            output.directives.iter().map(|d| d.kind).collect::<Vec<_>>(),
            vec![DirectiveKind::PpDefine, DirectiveKind::PpEof]
        );
        assert_eq!(output.tokens.len(), 4);
    }

    #[test]
    fn test_directive_token_ranges_index_the_flat_list() {
        let source = b"#define A 1\n#include <x.h>\n";
        let output = scan(source, &ScanOptions::default()).unwrap();
        assert_eq!(output.directives[0].token_range, 0..5);
        assert_eq!(output.directives[1].token_range, 5..9);
        assert_eq!(output.directives[2].token_range, 9..9);

        let define = output.directive_tokens(&output.directives[0]);
        assert_eq!(define[2].text(source), b"A");
        assert_eq!(define[4].kind, TokenKind::Eod);
        let include = output.directive_tokens(&output.directives[1]);
        assert_eq!(include[2].text(source), b"<x.h>");
    }

    #[test]
    fn test_directive_at_eof_owns_the_eof_token() {
        let source = b"#define MACRO";
        let output = scan(source, &ScanOptions::default()).unwrap();
        assert_eq!(output.tokens.len(), 4);
        assert_eq!(output.tokens[3].kind, TokenKind::Eof);
        assert_eq!(
            output.directives.iter().map(|d| d.kind).collect::<Vec<_>>(),
            vec![DirectiveKind::PpDefine, DirectiveKind::PpEof]
        );
    }
}
