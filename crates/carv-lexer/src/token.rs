//! Token types for the Carv lexer.
//!
//! Defines [`TokenKind`] covering every lexeme in Carv and [`Token`],
//! which pairs a kind with a source [`Span`].

use carv_types::Span;
use std::fmt;

/// Reserved identifiers in Carv.
///
/// These cannot be used as user-defined names. Primitive type names
/// (`int`, `string`, ...) are deliberately absent: they double as
/// conversion builtins (`int("42")`) and are recognised by the parser
/// in type position only.
pub const ALL_KEYWORDS: &[&str] = &[
    // Bindings & functions
    "let", "const", "fn", "async", "await", "return", "mut",
    // Control flow
    "if", "else", "for", "in", "while", "loop", "break", "continue",
    // Types & objects
    "class", "interface", "impl", "new", "self",
    // Modules
    "require", "from", "as",
    // Literals
    "true", "false", "nil",
];

// ─────────────────────────────────────────────────────────────────────
// Token
// ─────────────────────────────────────────────────────────────────────

/// A single token produced by the Carv lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// What kind of token this is.
    pub kind: TokenKind,
    /// Source location.
    pub span: Span,
}

impl Token {
    /// Create a new token.
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns `true` if this token is a reserved keyword.
    pub fn is_keyword(&self) -> bool {
        self.kind.is_keyword()
    }
}

// ─────────────────────────────────────────────────────────────────────
// TokenKind
// ─────────────────────────────────────────────────────────────────────

/// Every token kind in the Carv language.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ── Literals ──────────────────────────────────────────────

    /// Integer literal: `42`, `1_000`
    IntLit(i64),
    /// Float literal: `3.14`
    FloatLit(f64),
    /// Complete string literal with no interpolation: `"hello"`
    StringLiteral(String),
    /// Character literal: `'a'`
    CharLit(char),
    /// `true`
    True,
    /// `false`
    False,
    /// `nil`
    Nil,

    // ── String Interpolation ─────────────────────────────────

    /// Start of an interpolated string: text before the first `${`.
    /// Example: for `"hello ${name}"`, carries `"hello "`.
    StringStart(String),
    /// Text between a `}` and the next `${` inside an interpolated string.
    StringPart(String),
    /// End of an interpolated string: text after the last `}` to `"`.
    StringEnd(String),
    /// The `${` that opens an interpolation expression.
    InterpolationStart,
    /// The `}` that closes an interpolation expression.
    InterpolationEnd,

    // ── Identifiers ──────────────────────────────────────────

    /// User-defined identifier: `my_var`, `Point`, `int`
    Identifier(String),

    // ── Keywords ─────────────────────────────────────────────

    Let,
    Const,
    Fn,
    Async,
    Await,
    Return,
    Mut,
    If,
    Else,
    For,
    In,
    While,
    Loop,
    Break,
    Continue,
    Class,
    Interface,
    Impl,
    New,
    SelfKw,
    Require,
    From,
    As,

    // ── Operators ────────────────────────────────────────────

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    BangEq,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
    /// `!`
    Bang,
    /// `&` (bitwise and, borrow)
    Amp,
    /// `|`
    Pipe,
    /// `^`
    Caret,
    /// `~`
    Tilde,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `|>`
    PipeGt,
    /// `?`
    Question,

    // ── Assignment ───────────────────────────────────────────

    Eq,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,
    AmpEq,
    PipeEq,
    CaretEq,

    // ── Punctuation ──────────────────────────────────────────

    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Semicolon,
    Dot,
    /// `->`
    Arrow,

    // ── Special ──────────────────────────────────────────────

    /// End of file
    Eof,
}

impl TokenKind {
    /// Look up a reserved identifier. Returns `Some(kind)` for every
    /// reserved word, `None` for user identifiers.
    pub fn from_keyword(s: &str) -> Option<TokenKind> {
        Some(match s {
            "let" => TokenKind::Let,
            "const" => TokenKind::Const,
            "fn" => TokenKind::Fn,
            "async" => TokenKind::Async,
            "await" => TokenKind::Await,
            "return" => TokenKind::Return,
            "mut" => TokenKind::Mut,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "for" => TokenKind::For,
            "in" => TokenKind::In,
            "while" => TokenKind::While,
            "loop" => TokenKind::Loop,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "class" => TokenKind::Class,
            "interface" => TokenKind::Interface,
            "impl" => TokenKind::Impl,
            "new" => TokenKind::New,
            "self" => TokenKind::SelfKw,
            "require" => TokenKind::Require,
            "from" => TokenKind::From,
            "as" => TokenKind::As,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "nil" => TokenKind::Nil,
            _ => return None,
        })
    }

    /// Returns `true` if this token kind is a reserved keyword.
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Let
                | TokenKind::Const
                | TokenKind::Fn
                | TokenKind::Async
                | TokenKind::Await
                | TokenKind::Return
                | TokenKind::Mut
                | TokenKind::If
                | TokenKind::Else
                | TokenKind::For
                | TokenKind::In
                | TokenKind::While
                | TokenKind::Loop
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Class
                | TokenKind::Interface
                | TokenKind::Impl
                | TokenKind::New
                | TokenKind::SelfKw
                | TokenKind::Require
                | TokenKind::From
                | TokenKind::As
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Nil
        )
    }

    /// Returns `true` for tokens that can start a statement.
    /// The parser synchronises on these after an error.
    pub fn starts_statement(&self) -> bool {
        matches!(
            self,
            TokenKind::Let
                | TokenKind::Const
                | TokenKind::Fn
                | TokenKind::Async
                | TokenKind::Return
                | TokenKind::If
                | TokenKind::For
                | TokenKind::While
                | TokenKind::Loop
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Class
                | TokenKind::Interface
                | TokenKind::Impl
                | TokenKind::Require
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Literals
            TokenKind::IntLit(n) => write!(f, "{n}"),
            TokenKind::FloatLit(n) => write!(f, "{n}"),
            TokenKind::StringLiteral(s) => write!(f, "\"{s}\""),
            TokenKind::CharLit(c) => write!(f, "'{c}'"),
            TokenKind::True => f.write_str("true"),
            TokenKind::False => f.write_str("false"),
            TokenKind::Nil => f.write_str("nil"),
            // String interpolation
            TokenKind::StringStart(_) => f.write_str("string start"),
            TokenKind::StringPart(_) => f.write_str("string part"),
            TokenKind::StringEnd(_) => f.write_str("string end"),
            TokenKind::InterpolationStart => f.write_str("${"),
            TokenKind::InterpolationEnd => f.write_str("interpolation end"),
            // Identifiers
            TokenKind::Identifier(s) => f.write_str(s),
            // Keywords
            TokenKind::Let => f.write_str("let"),
            TokenKind::Const => f.write_str("const"),
            TokenKind::Fn => f.write_str("fn"),
            TokenKind::Async => f.write_str("async"),
            TokenKind::Await => f.write_str("await"),
            TokenKind::Return => f.write_str("return"),
            TokenKind::Mut => f.write_str("mut"),
            TokenKind::If => f.write_str("if"),
            TokenKind::Else => f.write_str("else"),
            TokenKind::For => f.write_str("for"),
            TokenKind::In => f.write_str("in"),
            TokenKind::While => f.write_str("while"),
            TokenKind::Loop => f.write_str("loop"),
            TokenKind::Break => f.write_str("break"),
            TokenKind::Continue => f.write_str("continue"),
            TokenKind::Class => f.write_str("class"),
            TokenKind::Interface => f.write_str("interface"),
            TokenKind::Impl => f.write_str("impl"),
            TokenKind::New => f.write_str("new"),
            TokenKind::SelfKw => f.write_str("self"),
            TokenKind::Require => f.write_str("require"),
            TokenKind::From => f.write_str("from"),
            TokenKind::As => f.write_str("as"),
            // Operators
            TokenKind::Plus => f.write_str("+"),
            TokenKind::Minus => f.write_str("-"),
            TokenKind::Star => f.write_str("*"),
            TokenKind::Slash => f.write_str("/"),
            TokenKind::Percent => f.write_str("%"),
            TokenKind::EqEq => f.write_str("=="),
            TokenKind::BangEq => f.write_str("!="),
            TokenKind::Less => f.write_str("<"),
            TokenKind::Greater => f.write_str(">"),
            TokenKind::LessEq => f.write_str("<="),
            TokenKind::GreaterEq => f.write_str(">="),
            TokenKind::AndAnd => f.write_str("&&"),
            TokenKind::OrOr => f.write_str("||"),
            TokenKind::Bang => f.write_str("!"),
            TokenKind::Amp => f.write_str("&"),
            TokenKind::Pipe => f.write_str("|"),
            TokenKind::Caret => f.write_str("^"),
            TokenKind::Tilde => f.write_str("~"),
            TokenKind::Shl => f.write_str("<<"),
            TokenKind::Shr => f.write_str(">>"),
            TokenKind::PipeGt => f.write_str("|>"),
            TokenKind::Question => f.write_str("?"),
            // Assignment
            TokenKind::Eq => f.write_str("="),
            TokenKind::PlusEq => f.write_str("+="),
            TokenKind::MinusEq => f.write_str("-="),
            TokenKind::StarEq => f.write_str("*="),
            TokenKind::SlashEq => f.write_str("/="),
            TokenKind::PercentEq => f.write_str("%="),
            TokenKind::AmpEq => f.write_str("&="),
            TokenKind::PipeEq => f.write_str("|="),
            TokenKind::CaretEq => f.write_str("^="),
            // Punctuation
            TokenKind::LParen => f.write_str("("),
            TokenKind::RParen => f.write_str(")"),
            TokenKind::LBrace => f.write_str("{"),
            TokenKind::RBrace => f.write_str("}"),
            TokenKind::LBracket => f.write_str("["),
            TokenKind::RBracket => f.write_str("]"),
            TokenKind::Comma => f.write_str(","),
            TokenKind::Colon => f.write_str(":"),
            TokenKind::Semicolon => f.write_str(";"),
            TokenKind::Dot => f.write_str("."),
            TokenKind::Arrow => f.write_str("->"),
            // Special
            TokenKind::Eof => f.write_str("end of file"),
        }
    }
}
