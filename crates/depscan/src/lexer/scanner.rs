//! Byte-oriented lexer for dependency directive scanning
//!
//! The lexer walks raw bytes of the input buffer exactly once. It resolves
//! escaped line breaks (a backslash, optional horizontal whitespace, then a
//! line break) wherever the language treats them as invisible, but tokens
//! keep their original byte ranges so a directive can be re-emitted
//! verbatim. Content that sits between directives is crossed with the
//! cheaper [`Lexer::skip_rest_of_line`], which understands just enough
//! (strings, comments, raw strings) not to trip over directive-looking text
//! inside literals.

use std::borrow::Cow;

use super::token::{Punct, Token, TokenKind};
use crate::common::{ScanError, ScanResult, Span};

pub(crate) fn is_horizontal_ws(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | 0x0b | 0x0c)
}

pub(crate) fn is_vertical_ws(b: u8) -> bool {
    matches!(b, b'\n' | b'\r')
}

pub(crate) fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

pub(crate) fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Length in bytes of the line break at `pos`, or 0 if there is none.
/// `\r\n` and `\n\r` count as a single break.
fn eol_len(src: &[u8], pos: usize) -> usize {
    if pos >= src.len() || !is_vertical_ws(src[pos]) {
        return 0;
    }
    if pos + 1 < src.len() && is_vertical_ws(src[pos + 1]) && src[pos + 1] != src[pos] {
        2
    } else {
        1
    }
}

/// Length of an escaped line break starting at `pos`: a backslash, any run
/// of horizontal whitespace, then a line break. Returns `None` when the
/// byte at `pos` does not start one.
pub(crate) fn splice_len(src: &[u8], pos: usize) -> Option<usize> {
    if pos >= src.len() || src[pos] != b'\\' {
        return None;
    }
    let mut i = pos + 1;
    while i < src.len() && is_horizontal_ws(src[i]) {
        i += 1;
    }
    let n = eol_len(src, i);
    if n == 0 { None } else { Some(i + n - pos) }
}

/// Spelling of a token with escaped line breaks removed. Borrows from the
/// source unless the token actually contains a splice.
pub fn spelling<'s>(source: &'s [u8], token: &Token) -> Cow<'s, [u8]> {
    if !token.spliced {
        return Cow::Borrowed(&source[token.span.start..token.span.end]);
    }
    let mut out = Vec::with_capacity(token.span.len());
    let mut i = token.span.start;
    while i < token.span.end {
        if let Some(n) = splice_len(source, i) {
            i += n;
        } else {
            out.push(source[i]);
            i += 1;
        }
    }
    Cow::Owned(out)
}

/// True when the `"` at `quote` closes a raw string prefix: `R`, `LR`,
/// `uR`, `u8R` or `UR` with no identifier character immediately before the
/// prefix.
fn is_raw_string_quote(src: &[u8], quote: usize) -> bool {
    if quote == 0 || src[quote - 1] != b'R' {
        return false;
    }
    let before_r = quote - 1;
    if before_r == 0 {
        return true;
    }
    let i = match src[before_r - 1] {
        b'u' | b'U' | b'L' => before_r - 1,
        b'8' if before_r >= 2 && src[before_r - 2] == b'u' => before_r - 2,
        c if is_ident_continue(c) => return false,
        _ => return true,
    };
    i == 0 || !is_ident_continue(src[i - 1])
}

/// Single-pass lexer over a byte buffer.
pub struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
    at_line_start: bool,
    unicode_prefixes: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a [u8], unicode_prefixes: bool) -> Self {
        Self {
            src,
            pos: 0,
            at_line_start: true,
            unicode_prefixes,
        }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Rewind to an offset known to begin a line. Used when a speculative
    /// multi-line directive is abandoned at a line that must be re-examined.
    pub fn seek_line_start(&mut self, pos: usize) {
        self.pos = pos;
        self.at_line_start = true;
    }

    /// Next token. Horizontal whitespace and comments are consumed silently;
    /// a line break yields an `Eod` token.
    pub fn next_token(&mut self) -> ScanResult<Token> {
        self.lex(false)
    }

    /// Like [`Lexer::next_token`], but a `<` opens a `<...>` header name.
    pub fn next_include_token(&mut self) -> ScanResult<Token> {
        self.lex(true)
    }

    fn lex(&mut self, header_names: bool) -> ScanResult<Token> {
        let start_of_line = self.at_line_start;
        let mut leading_space = false;
        // An escaped line break directly abutting the next token becomes part
        // of that token; followed by whitespace or a comment it dissolves.
        let mut splice_start: Option<usize> = None;

        loop {
            match self.src.get(self.pos).copied() {
                None => {
                    return Ok(Token {
                        kind: TokenKind::Eof,
                        span: Span::at(self.pos),
                        leading_space,
                        start_of_line,
                        spliced: false,
                    });
                }
                Some(b) if is_horizontal_ws(b) => {
                    self.pos += 1;
                    leading_space = true;
                    splice_start = None;
                }
                Some(b) if is_vertical_ws(b) => {
                    let n = eol_len(self.src, self.pos);
                    let span = Span::new(self.pos, self.pos + n);
                    self.pos += n;
                    self.at_line_start = true;
                    return Ok(Token {
                        kind: TokenKind::Eod,
                        span,
                        leading_space,
                        start_of_line,
                        spliced: false,
                    });
                }
                Some(b'/') if self.src.get(self.pos + 1) == Some(&b'/') => {
                    self.skip_line_comment();
                    leading_space = true;
                    splice_start = None;
                }
                Some(b'/') if self.src.get(self.pos + 1) == Some(&b'*') => {
                    self.skip_block_comment();
                    leading_space = true;
                    splice_start = None;
                }
                Some(b'\\') => match splice_len(self.src, self.pos) {
                    Some(n) => {
                        if splice_start.is_none() {
                            splice_start = Some(self.pos);
                        }
                        self.pos += n;
                    }
                    None => break,
                },
                Some(_) => break,
            }
        }

        let start = splice_start.unwrap_or(self.pos);
        let mut spliced = splice_start.is_some();
        let b = self.src[self.pos];

        let kind = if header_names && b == b'<' {
            self.lex_header_name()
        } else if is_ident_start(b) {
            self.lex_identifier_or_literal(&mut spliced)?
        } else if b.is_ascii_digit() {
            self.lex_number(&mut spliced);
            TokenKind::Number
        } else if b == b'.'
            && self
                .src
                .get(self.logical(self.pos + 1).0)
                .copied()
                .is_some_and(|c| c.is_ascii_digit())
        {
            self.lex_number(&mut spliced);
            TokenKind::Number
        } else if b == b'"' || b == b'\'' {
            self.pos += 1;
            self.lex_string_tail(b, &mut spliced)
        } else {
            self.lex_punct(&mut spliced)
        };

        self.at_line_start = false;
        Ok(Token {
            kind,
            span: Span::new(start, self.pos),
            leading_space,
            start_of_line,
            spliced,
        })
    }

    /// Position after any run of escaped line breaks at `pos`, plus whether
    /// one was crossed.
    fn logical(&self, mut pos: usize) -> (usize, bool) {
        let mut spliced = false;
        while let Some(n) = splice_len(self.src, pos) {
            pos += n;
            spliced = true;
        }
        (pos, spliced)
    }

    fn lex_identifier_or_literal(&mut self, spliced: &mut bool) -> ScanResult<TokenKind> {
        // Track the first few cleaned bytes so a literal prefix (L", u8R"...)
        // can be recognized without allocating.
        let mut head = [0u8; 3];
        let mut len = 0usize;
        head[0] = self.src[self.pos];
        len += 1;
        self.pos += 1;

        loop {
            let (p, crossed) = self.logical(self.pos);
            match self.src.get(p).copied() {
                Some(c) if is_ident_continue(c) => {
                    if len < 3 {
                        head[len] = c;
                    }
                    len += 1;
                    self.pos = p + 1;
                    *spliced |= crossed;
                }
                Some(c @ (b'"' | b'\'')) => {
                    let text: &[u8] = if len <= 3 { &head[..len] } else { b"" };
                    let (is_prefix, raw) = match text {
                        b"L" => (true, false),
                        b"u" | b"u8" | b"U" => (self.unicode_prefixes, false),
                        b"R" | b"LR" => (true, true),
                        b"uR" | b"u8R" | b"UR" => (self.unicode_prefixes, true),
                        _ => (false, false),
                    };
                    if !is_prefix || (raw && c == b'\'') {
                        break;
                    }
                    let quote = p;
                    self.pos = p + 1;
                    *spliced |= crossed;
                    if raw {
                        return self.lex_raw_string_tail(quote, spliced);
                    }
                    return Ok(self.lex_string_tail(c, spliced));
                }
                _ => break,
            }
        }
        Ok(TokenKind::Identifier)
    }

    /// Preprocessing number: identifier characters, `.`, exponent signs and
    /// digit separators, with escaped line breaks allowed between any two of
    /// them.
    fn lex_number(&mut self, spliced: &mut bool) {
        self.pos += 1;
        loop {
            let (p, crossed) = self.logical(self.pos);
            let Some(c) = self.src.get(p).copied() else {
                break;
            };
            if is_ident_continue(c) || c == b'.' {
                self.pos = p + 1;
                *spliced |= crossed;
                if matches!(c, b'e' | b'E' | b'p' | b'P') {
                    let (q, crossed_sign) = self.logical(self.pos);
                    if matches!(self.src.get(q).copied(), Some(b'+' | b'-')) {
                        self.pos = q + 1;
                        *spliced |= crossed_sign;
                    }
                }
            } else if c == b'\'' {
                // Digit separator only when something alphanumeric follows.
                let (q, crossed_sep) = self.logical(p + 1);
                if self.src.get(q).copied().is_some_and(|d| d.is_ascii_alphanumeric()) {
                    self.pos = q + 1;
                    *spliced |= crossed | crossed_sep;
                } else {
                    break;
                }
            } else {
                break;
            }
        }
    }

    /// Body of a string or character literal, opening quote already
    /// consumed. An unterminated literal ends the token right before the
    /// line break (or at end of input) and demotes it to `Unknown`.
    fn lex_string_tail(&mut self, terminator: u8, spliced: &mut bool) -> TokenKind {
        loop {
            match self.src.get(self.pos).copied() {
                None => return TokenKind::Unknown,
                Some(b) if is_vertical_ws(b) => return TokenKind::Unknown,
                Some(b) if b == terminator => {
                    self.pos += 1;
                    return if terminator == b'"' {
                        TokenKind::StringLiteral
                    } else {
                        TokenKind::CharLiteral
                    };
                }
                Some(b'\\') => {
                    if let Some(n) = splice_len(self.src, self.pos) {
                        self.pos += n;
                        *spliced = true;
                    } else {
                        self.pos += 1;
                        if self.pos < self.src.len() && !is_vertical_ws(self.src[self.pos]) {
                            self.pos += 1;
                        }
                    }
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    fn lex_raw_string_tail(&mut self, quote: usize, spliced: &mut bool) -> ScanResult<TokenKind> {
        if self.scan_raw_string_from_quote(quote)? {
            Ok(TokenKind::RawStringLiteral)
        } else {
            Ok(self.lex_string_tail(b'"', spliced))
        }
    }

    /// With `self.pos` just past the opening quote of a raw string
    /// candidate: when a `(` appears within the 16-byte delimiter limit,
    /// consume through the matching `)delim"` and return `true`. Otherwise
    /// leave the position unchanged so the quote can be rescanned as an
    /// ordinary string. Raw strings ignore escaped line breaks entirely, and
    /// one that never closes is a hard error.
    fn scan_raw_string_from_quote(&mut self, quote: usize) -> ScanResult<bool> {
        let src = self.src;
        let delim_start = quote + 1;
        let mut i = delim_start;
        let limit = src.len().min(delim_start + 16);
        while i < limit && src[i] != b'(' && src[i] != b'"' && !is_vertical_ws(src[i]) {
            i += 1;
        }
        if src.get(i) != Some(&b'(') {
            return Ok(false);
        }
        let delim = &src[delim_start..i];
        let mut pos = i + 1;
        loop {
            while pos < src.len() && src[pos] != b')' {
                pos += 1;
            }
            if pos >= src.len() {
                return Err(ScanError::unterminated_raw_string(Span::new(quote, src.len())));
            }
            pos += 1;
            if src[pos..].starts_with(delim) && src.get(pos + delim.len()) == Some(&b'"') {
                self.pos = pos + delim.len() + 1;
                return Ok(true);
            }
        }
    }

    /// `<...>` include argument. No comment or literal structure applies
    /// inside; missing `>` before the line break demotes the token to
    /// `Unknown` ending right before the break.
    fn lex_header_name(&mut self) -> TokenKind {
        let mut i = self.pos + 1;
        while i < self.src.len() && self.src[i] != b'>' && !is_vertical_ws(self.src[i]) {
            i += 1;
        }
        if self.src.get(i) == Some(&b'>') {
            self.pos = i + 1;
            TokenKind::HeaderName
        } else {
            self.pos = i;
            TokenKind::Unknown
        }
    }

    fn take_logical(&mut self, after: usize, crossed: bool, spliced: &mut bool) {
        self.pos = after + 1;
        *spliced |= crossed;
    }

    fn lex_punct(&mut self, spliced: &mut bool) -> TokenKind {
        let b = self.src[self.pos];
        self.pos += 1;
        let (p1, s1) = self.logical(self.pos);
        let c1 = self.src.get(p1).copied();

        match b {
            b'#' => {
                if c1 == Some(b'#') {
                    self.take_logical(p1, s1, spliced);
                    TokenKind::Punct(Punct::HashHash)
                } else {
                    TokenKind::Punct(Punct::Hash)
                }
            }
            b'@' => TokenKind::Punct(Punct::At),
            b'(' => TokenKind::Punct(Punct::LParen),
            b')' => TokenKind::Punct(Punct::RParen),
            b'[' => TokenKind::Punct(Punct::LSquare),
            b']' => TokenKind::Punct(Punct::RSquare),
            b',' => TokenKind::Punct(Punct::Comma),
            b';' => TokenKind::Punct(Punct::Semi),
            b':' => {
                if c1 == Some(b':') {
                    self.take_logical(p1, s1, spliced);
                    TokenKind::Punct(Punct::ColonColon)
                } else {
                    TokenKind::Punct(Punct::Colon)
                }
            }
            b'<' => match c1 {
                Some(b'<') => {
                    self.take_logical(p1, s1, spliced);
                    let (p2, s2) = self.logical(self.pos);
                    if self.src.get(p2) == Some(&b'=') {
                        self.take_logical(p2, s2, spliced);
                    }
                    TokenKind::Punct(Punct::Other)
                }
                Some(b'=') => {
                    self.take_logical(p1, s1, spliced);
                    TokenKind::Punct(Punct::Other)
                }
                _ => TokenKind::Punct(Punct::Lt),
            },
            b'>' => {
                match c1 {
                    Some(b'>') => {
                        self.take_logical(p1, s1, spliced);
                        let (p2, s2) = self.logical(self.pos);
                        if self.src.get(p2) == Some(&b'=') {
                            self.take_logical(p2, s2, spliced);
                        }
                    }
                    Some(b'=') => self.take_logical(p1, s1, spliced),
                    _ => {}
                }
                TokenKind::Punct(Punct::Other)
            }
            b'.' => {
                if c1 == Some(b'.') {
                    let (p2, s2) = self.logical(p1 + 1);
                    if self.src.get(p2) == Some(&b'.') {
                        self.pos = p2 + 1;
                        *spliced |= s1 | s2;
                    }
                }
                TokenKind::Punct(Punct::Other)
            }
            b'-' => {
                if matches!(c1, Some(b'>' | b'-' | b'=')) {
                    self.take_logical(p1, s1, spliced);
                }
                TokenKind::Punct(Punct::Other)
            }
            b'+' => {
                if matches!(c1, Some(b'+' | b'=')) {
                    self.take_logical(p1, s1, spliced);
                }
                TokenKind::Punct(Punct::Other)
            }
            b'&' => {
                if matches!(c1, Some(b'&' | b'=')) {
                    self.take_logical(p1, s1, spliced);
                }
                TokenKind::Punct(Punct::Other)
            }
            b'|' => {
                if matches!(c1, Some(b'|' | b'=')) {
                    self.take_logical(p1, s1, spliced);
                }
                TokenKind::Punct(Punct::Other)
            }
            b'=' | b'!' | b'*' | b'/' | b'%' | b'^' => {
                if c1 == Some(b'=') {
                    self.take_logical(p1, s1, spliced);
                }
                TokenKind::Punct(Punct::Other)
            }
            b'{' | b'}' | b'~' | b'?' => TokenKind::Punct(Punct::Other),
            // A backslash that reaches here is not an escaped line break.
            _ => TokenKind::Unknown,
        }
    }

    fn skip_line_comment(&mut self) {
        self.pos += 2;
        loop {
            match self.src.get(self.pos).copied() {
                None => return,
                Some(b) if is_vertical_ws(b) => {
                    // A backslash followed by only horizontal whitespace
                    // continues the comment onto the next line.
                    let mut j = self.pos;
                    while j > 0 && is_horizontal_ws(self.src[j - 1]) {
                        j -= 1;
                    }
                    if j > 0 && self.src[j - 1] == b'\\' {
                        self.pos += eol_len(self.src, self.pos);
                    } else {
                        return;
                    }
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    fn skip_block_comment(&mut self) {
        self.pos += 2;
        loop {
            match self.src.get(self.pos).copied() {
                None => return,
                Some(b'*') if self.src.get(self.pos + 1) == Some(&b'/') => {
                    self.pos += 2;
                    return;
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    /// Skip the remainder of the current line without producing tokens.
    /// Returns the offset of the last byte that held skipped source text
    /// (whitespace and comments excluded), which callers record as
    /// trailing-content evidence. A backslash directly before the line
    /// break continues the skip onto the next line; strings, raw strings
    /// and comments are crossed as wholes so their content cannot look
    /// like a directive.
    pub fn skip_rest_of_line(&mut self) -> ScanResult<Option<usize>> {
        let mut last: Option<usize> = None;
        loop {
            match self.src.get(self.pos).copied() {
                None => break,
                Some(b) if is_vertical_ws(b) => {
                    let escaped = self.pos > 0 && self.src[self.pos - 1] == b'\\';
                    self.pos += eol_len(self.src, self.pos);
                    if !escaped {
                        break;
                    }
                }
                Some(b) if is_horizontal_ws(b) => self.pos += 1,
                Some(b'/') if self.src.get(self.pos + 1) == Some(&b'/') => {
                    self.skip_line_comment();
                }
                Some(b'/') if self.src.get(self.pos + 1) == Some(&b'*') => {
                    self.skip_block_comment();
                }
                Some(b @ (b'"' | b'\'')) => {
                    last = Some(self.pos);
                    if b == b'\'' && self.pos > 0 && is_ident_continue(self.src[self.pos - 1]) {
                        // Digit separator or literal suffix; step over so the
                        // line `x = 0xfa'af'fa;` is not mistaken for an
                        // unterminated character literal.
                        self.pos += 1;
                    } else if b == b'"' && is_raw_string_quote(self.src, self.pos) {
                        let quote = self.pos;
                        self.pos += 1;
                        if !self.scan_raw_string_from_quote(quote)? {
                            let mut crossed = false;
                            let _ = self.lex_string_tail(b'"', &mut crossed);
                        }
                    } else {
                        self.pos += 1;
                        let mut crossed = false;
                        let _ = self.lex_string_tail(b, &mut crossed);
                    }
                }
                Some(_) => {
                    last = Some(self.pos);
                    self.pos += 1;
                }
            }
        }
        self.at_line_start = true;
        Ok(last)
    }

    /// Skip to the end of the line treating every byte as opaque text, the
    /// way `#warning` and `#error` messages are consumed. A backslash
    /// followed by only horizontal whitespace before the break continues
    /// onto the next line.
    pub fn skip_to_eol_raw(&mut self) {
        loop {
            match self.src.get(self.pos).copied() {
                None => break,
                Some(b) if is_vertical_ws(b) => {
                    let mut j = self.pos;
                    while j > 0 && is_horizontal_ws(self.src[j - 1]) {
                        j -= 1;
                    }
                    let continued = j > 0 && self.src[j - 1] == b'\\';
                    self.pos += eol_len(self.src, self.pos);
                    if !continued {
                        break;
                    }
                }
                Some(_) => self.pos += 1,
            }
        }
        self.at_line_start = true;
    }
}
