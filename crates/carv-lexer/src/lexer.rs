//! Core Carv lexer: converts source text to a token stream.
//!
//! Features:
//! - Every Carv token (keywords, operators, punctuation, literals)
//! - String interpolation with `${expr}` via a mode stack
//! - `//` line comments and `/* */` block comments stripped
//! - Integer literals with `_` digit separators, float and char literals
//! - Error recovery: collects up to 20 errors instead of stopping at the first
//! - Newlines are plain whitespace; `;` terminates statements

use carv_types::{CarvError, CompileErrors, ErrorCode, SourceFile, Span, MAX_ERRORS};

use crate::token::{Token, TokenKind};

/// Lexer mode: tracks whether we're scanning code or inside a string
/// interpolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Normal code scanning.
    Normal,
    /// Inside a string literal, scanning text until `"` or `${`.
    String,
    /// Inside a `${...}` interpolation expression. `brace_depth` counts
    /// nested `{` so we know when the interpolation's closing `}` is reached.
    Interpolation { brace_depth: u32 },
}

/// A saved scanner position, used as the start of a token.
#[derive(Debug, Clone, Copy)]
struct Mark {
    pos: usize,
    line: u32,
    col: u32,
}

/// The Carv lexer.
///
/// Converts source text into a vector of [`Token`]s, collecting up to
/// [`carv_types::MAX_ERRORS`] errors along the way.
pub struct Lexer<'src> {
    /// The full source text.
    text: &'src str,
    /// The same text as bytes.
    source: &'src [u8],
    /// Source file for error reporting.
    source_file: &'src SourceFile,
    /// Current byte offset into `source`.
    pos: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based, counted in characters).
    col: u32,
    /// Collected errors.
    errors: CompileErrors,
    /// Mode stack for string interpolation.
    mode_stack: Vec<Mode>,
    /// Pending tokens to emit before the next scan (used for interpolation).
    pending: Vec<Token>,
}

/// Result of lexing: tokens + any errors collected.
pub struct LexResult {
    /// The token stream (always ends with [`TokenKind::Eof`]).
    pub tokens: Vec<Token>,
    /// Errors encountered during lexing.
    pub errors: CompileErrors,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source file.
    pub fn new(source_file: &'src SourceFile) -> Self {
        Self {
            text: &source_file.source,
            source: source_file.source.as_bytes(),
            source_file,
            pos: 0,
            line: 1,
            col: 1,
            errors: CompileErrors::empty(),
            mode_stack: vec![Mode::Normal],
            pending: Vec::new(),
        }
    }

    /// Lex the entire source file into a token stream.
    pub fn lex(mut self) -> LexResult {
        let mut tokens = Vec::new();

        loop {
            if self.errors.total_errors >= MAX_ERRORS {
                break;
            }

            // Drain pending tokens first (InterpolationStart after StringStart)
            if let Some(pending) = self.pending.pop() {
                tokens.push(pending);
                continue;
            }

            let token = match self.current_mode() {
                Mode::Normal | Mode::Interpolation { .. } => self.scan_normal(),
                Mode::String => self.scan_string_continuation(),
            };

            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);

            if is_eof {
                break;
            }
        }

        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            tokens.push(Token::new(TokenKind::Eof, self.current_span()));
        }

        LexResult {
            tokens,
            errors: self.errors,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Mode stack helpers
    // ─────────────────────────────────────────────────────────────

    fn current_mode(&self) -> Mode {
        *self.mode_stack.last().unwrap_or(&Mode::Normal)
    }

    fn push_mode(&mut self, mode: Mode) {
        self.mode_stack.push(mode);
    }

    fn pop_mode(&mut self) {
        if self.mode_stack.len() > 1 {
            self.mode_stack.pop();
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.source.get(self.pos + offset).copied()
    }

    /// Advance one byte. Only used where the byte is known to be ASCII.
    fn advance(&mut self) -> Option<u8> {
        let ch = self.source.get(self.pos).copied()?;
        self.pos += 1;
        if ch == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    /// Advance one full UTF-8 character.
    fn advance_char(&mut self) -> Option<char> {
        let ch = self.text.get(self.pos..)?.chars().next()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn mark(&self) -> Mark {
        Mark {
            pos: self.pos,
            line: self.line,
            col: self.col,
        }
    }

    fn current_span(&self) -> Span {
        Span::point(self.line, self.col)
    }

    fn span_from(&self, start: Mark) -> Span {
        Span::new(
            start.line,
            start.col,
            self.line,
            self.col.saturating_sub(1).max(1),
        )
    }

    fn lexeme(&self, start: Mark) -> &'src str {
        self.text.get(start.pos..self.pos).unwrap_or("")
    }

    fn token(&self, kind: TokenKind, start: Mark) -> Token {
        Token::new(kind, self.span_from(start))
    }

    fn emit_error(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let source_line = self.source_file.line(span.start_line).unwrap_or("");
        let err = CarvError::new(&self.source_file.name, code, message, span, source_line);
        self.errors.push_error(err);
    }

    fn emit_error_with_suggestion(
        &mut self,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        suggestion: impl Into<String>,
    ) {
        let source_line = self.source_file.line(span.start_line).unwrap_or("");
        let err = CarvError::new(&self.source_file.name, code, message, span, source_line)
            .with_suggestion(suggestion);
        self.errors.push_error(err);
    }

    // ─────────────────────────────────────────────────────────────
    // Whitespace & comments
    // ─────────────────────────────────────────────────────────────

    /// Skip whitespace, line comments and block comments.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\r' | b'\n') => {
                    self.advance();
                }
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    while let Some(ch) = self.peek() {
                        if ch == b'\n' {
                            break;
                        }
                        self.advance_char();
                    }
                }
                Some(b'/') if self.peek_at(1) == Some(b'*') => self.skip_block_comment(),
                _ => break,
            }
        }
    }

    /// Skip a `/* ... */` comment. Block comments do not nest.
    fn skip_block_comment(&mut self) {
        let start = self.mark();
        self.advance();
        self.advance();
        loop {
            match self.peek() {
                None => {
                    let span = self.span_from(start);
                    self.emit_error(
                        ErrorCode::UNTERMINATED_LITERAL,
                        "unterminated block comment",
                        span,
                    );
                    return;
                }
                Some(b'*') if self.peek_at(1) == Some(b'/') => {
                    self.advance();
                    self.advance();
                    return;
                }
                _ => {
                    self.advance_char();
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Normal-mode scanning
    // ─────────────────────────────────────────────────────────────

    /// Scan one token in normal (non-string) mode.
    fn scan_normal(&mut self) -> Token {
        loop {
            self.skip_trivia();

            if self.errors.total_errors >= MAX_ERRORS {
                return Token::new(TokenKind::Eof, self.current_span());
            }

            if self.at_end() {
                if self
                    .mode_stack
                    .iter()
                    .any(|m| matches!(m, Mode::String | Mode::Interpolation { .. }))
                {
                    self.emit_error(
                        ErrorCode::UNTERMINATED_LITERAL,
                        "unterminated string interpolation",
                        self.current_span(),
                    );
                }
                return Token::new(TokenKind::Eof, self.current_span());
            }

            if let Some(token) = self.scan_token() {
                return token;
            }
            // Unknown character: error already recorded, keep scanning.
        }
    }

    /// Scan one token starting at the current (non-trivia) position.
    /// Returns `None` after recording an error for an unexpected character.
    fn scan_token(&mut self) -> Option<Token> {
        let start = self.mark();
        let ch = self.advance_char()?;

        let kind = match ch {
            '"' => return Some(self.scan_string(start)),
            '\'' => return Some(self.scan_char(start)),
            '0'..='9' => return Some(self.scan_number(start)),
            'a'..='z' | 'A'..='Z' | '_' => return Some(self.scan_identifier(start)),

            '+' => self.pick(b'=', TokenKind::PlusEq, TokenKind::Plus),
            '*' => self.pick(b'=', TokenKind::StarEq, TokenKind::Star),
            '/' => self.pick(b'=', TokenKind::SlashEq, TokenKind::Slash),
            '%' => self.pick(b'=', TokenKind::PercentEq, TokenKind::Percent),
            '^' => self.pick(b'=', TokenKind::CaretEq, TokenKind::Caret),
            '!' => self.pick(b'=', TokenKind::BangEq, TokenKind::Bang),
            '=' => self.pick(b'=', TokenKind::EqEq, TokenKind::Eq),
            '~' => TokenKind::Tilde,
            '?' => TokenKind::Question,

            '-' => {
                if self.eat(b'>') {
                    TokenKind::Arrow
                } else {
                    self.pick(b'=', TokenKind::MinusEq, TokenKind::Minus)
                }
            }
            '&' => {
                if self.eat(b'&') {
                    TokenKind::AndAnd
                } else {
                    self.pick(b'=', TokenKind::AmpEq, TokenKind::Amp)
                }
            }
            '|' => {
                if self.eat(b'|') {
                    TokenKind::OrOr
                } else if self.eat(b'>') {
                    TokenKind::PipeGt
                } else {
                    self.pick(b'=', TokenKind::PipeEq, TokenKind::Pipe)
                }
            }
            '<' => {
                if self.eat(b'<') {
                    TokenKind::Shl
                } else {
                    self.pick(b'=', TokenKind::LessEq, TokenKind::Less)
                }
            }
            '>' => {
                if self.eat(b'>') {
                    TokenKind::Shr
                } else {
                    self.pick(b'=', TokenKind::GreaterEq, TokenKind::Greater)
                }
            }

            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,
            '.' => TokenKind::Dot,

            '{' => {
                if let Some(Mode::Interpolation { brace_depth }) = self.mode_stack.last_mut() {
                    *brace_depth += 1;
                }
                TokenKind::LBrace
            }

            '}' => {
                if let Some(Mode::Interpolation { brace_depth }) = self.mode_stack.last_mut() {
                    if *brace_depth == 0 {
                        // This `}` ends the interpolation; back to string mode.
                        self.pop_mode();
                        self.push_mode(Mode::String);
                        return Some(self.token(TokenKind::InterpolationEnd, start));
                    }
                    *brace_depth -= 1;
                }
                TokenKind::RBrace
            }

            other => {
                let span = self.span_from(start);
                self.emit_error(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("unexpected character '{other}'"),
                    span,
                );
                return None;
            }
        };

        Some(self.token(kind, start))
    }

    /// Consume `next` if present and return `yes`, else return `no`.
    fn pick(&mut self, next: u8, yes: TokenKind, no: TokenKind) -> TokenKind {
        if self.eat(next) {
            yes
        } else {
            no
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Number literals
    // ─────────────────────────────────────────────────────────────

    fn scan_number(&mut self, start: Mark) -> Token {
        // The first digit was already consumed
        while let Some(b'0'..=b'9' | b'_') = self.peek() {
            self.advance();
        }

        let mut is_float = false;
        if self.peek() == Some(b'.') && matches!(self.peek_at(1), Some(b'0'..=b'9')) {
            is_float = true;
            self.advance(); // consume '.'
            while let Some(b'0'..=b'9' | b'_') = self.peek() {
                self.advance();
            }
        }

        let span = self.span_from(start);
        let text: String = self.lexeme(start).chars().filter(|&c| c != '_').collect();

        if is_float {
            let value = text.parse::<f64>().unwrap_or(0.0);
            return Token::new(TokenKind::FloatLit(value), span);
        }

        match text.parse::<i64>() {
            Ok(value) => Token::new(TokenKind::IntLit(value), span),
            Err(_) => {
                self.emit_error(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("integer literal '{text}' is out of range"),
                    span,
                );
                Token::new(TokenKind::IntLit(0), span)
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Identifiers & keywords
    // ─────────────────────────────────────────────────────────────

    fn scan_identifier(&mut self, start: Mark) -> Token {
        // First character was already consumed (letter or `_`)
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == b'_' {
                self.advance();
            } else {
                break;
            }
        }

        let text = self.lexeme(start);
        let kind = TokenKind::from_keyword(text)
            .unwrap_or_else(|| TokenKind::Identifier(text.to_string()));

        self.token(kind, start)
    }

    // ─────────────────────────────────────────────────────────────
    // Char literals
    // ─────────────────────────────────────────────────────────────

    /// Scan a char literal after the opening `'`.
    fn scan_char(&mut self, start: Mark) -> Token {
        if self.peek() == Some(b'\'') {
            self.advance();
            let span = self.span_from(start);
            self.emit_error(ErrorCode::UNEXPECTED_TOKEN, "empty character literal", span);
            return Token::new(TokenKind::CharLit('\0'), span);
        }

        let value = match self.peek() {
            None | Some(b'\n') => None,
            Some(b'\\') => self.scan_escape_sequence(),
            Some(_) => self.advance_char(),
        };

        if !self.eat(b'\'') {
            let span = self.span_from(start);
            self.emit_error_with_suggestion(
                ErrorCode::UNTERMINATED_LITERAL,
                "unterminated character literal",
                span,
                "a character literal holds exactly one character, e.g. 'a'",
            );
            // Recover: skip to the closing quote on this line, if any
            while let Some(ch) = self.peek() {
                if ch == b'\n' {
                    break;
                }
                self.advance_char();
                if ch == b'\'' {
                    break;
                }
            }
        }

        self.token(TokenKind::CharLit(value.unwrap_or('\0')), start)
    }

    // ─────────────────────────────────────────────────────────────
    // String literals & interpolation
    // ─────────────────────────────────────────────────────────────

    /// Scan a string literal starting after the opening `"`.
    /// A plain string yields `StringLiteral`; a string containing `${`
    /// yields `StringStart` and switches to interpolation mode.
    fn scan_string(&mut self, start: Mark) -> Token {
        match self.scan_string_body(start) {
            StringStop::Closed(buf) => self.token(TokenKind::StringLiteral(buf), start),
            StringStop::Interpolation(buf) => {
                self.push_mode(Mode::Interpolation { brace_depth: 0 });
                self.token(TokenKind::StringStart(buf), start)
            }
        }
    }

    /// Continue scanning string content after an interpolation ends.
    /// Called when we're in `Mode::String`.
    fn scan_string_continuation(&mut self) -> Token {
        let start = self.mark();
        match self.scan_string_body(start) {
            StringStop::Closed(buf) => {
                self.pop_mode();
                self.token(TokenKind::StringEnd(buf), start)
            }
            StringStop::Interpolation(buf) => {
                // Replace current String mode with Interpolation
                self.pop_mode();
                self.push_mode(Mode::Interpolation { brace_depth: 0 });
                self.token(TokenKind::StringPart(buf), start)
            }
        }
    }

    /// Scan string text up to the closing `"` or the next `${`.
    /// On `${`, queues an `InterpolationStart` token.
    fn scan_string_body(&mut self, start: Mark) -> StringStop {
        let mut buf = String::new();

        loop {
            match self.peek() {
                None | Some(b'\n') => {
                    let span = self.span_from(start);
                    self.emit_error(
                        ErrorCode::UNTERMINATED_LITERAL,
                        "unterminated string literal",
                        span,
                    );
                    return StringStop::Closed(buf);
                }
                Some(b'"') => {
                    self.advance();
                    return StringStop::Closed(buf);
                }
                Some(b'\\') => {
                    if let Some(escaped) = self.scan_escape_sequence() {
                        buf.push(escaped);
                    }
                }
                Some(b'$') if self.peek_at(1) == Some(b'{') => {
                    let interp = self.mark();
                    self.advance(); // consume '$'
                    self.advance(); // consume '{'
                    let interp_span = self.span_from(interp);
                    self.pending
                        .push(Token::new(TokenKind::InterpolationStart, interp_span));
                    return StringStop::Interpolation(buf);
                }
                Some(_) => {
                    if let Some(ch) = self.advance_char() {
                        buf.push(ch);
                    }
                }
            }
        }
    }

    /// Scan an escape sequence starting at the `\`.
    /// Returns the unescaped character, or `None` at end of input.
    fn scan_escape_sequence(&mut self) -> Option<char> {
        let start = self.mark();
        self.advance(); // consume the '\'

        match self.advance_char() {
            Some('"') => Some('"'),
            Some('\'') => Some('\''),
            Some('\\') => Some('\\'),
            Some('n') => Some('\n'),
            Some('t') => Some('\t'),
            Some('r') => Some('\r'),
            Some('0') => Some('\0'),
            Some('$') => Some('$'),
            Some(ch) => {
                let span = self.span_from(start);
                self.emit_error(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("invalid escape sequence '\\{ch}'"),
                    span,
                );
                Some(ch) // error recovery: keep the char as-is
            }
            None => {
                let span = self.span_from(start);
                self.emit_error(
                    ErrorCode::UNTERMINATED_LITERAL,
                    "unexpected end of file in escape sequence",
                    span,
                );
                None
            }
        }
    }
}

/// Where a run of string text stopped.
enum StringStop {
    /// At the closing `"` (or an error).
    Closed(String),
    /// At a `${`.
    Interpolation(String),
}
