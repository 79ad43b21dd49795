//! Expression parsing with full operator precedence.
//!
//! Precedence (lowest → highest):
//! 13. `=`, `+=`, `-=`, `*=`, `/=`, `%=`, `&=`, `|=`, `^=` (right-assoc)
//! 12. `|>`
//! 11. `||`
//! 10. `&&`
//! 9. `|`
//! 8. `^`
//! 7. `&`
//! 6. `==`, `!=`
//! 5. `<`, `>`, `<=`, `>=`
//! 4. `<<`, `>>`
//! 3. `+`, `-`
//! 2. `*`, `/`, `%`
//! 1. prefix `-`, `!`, `~`, `&`, `&mut`, `*`, `await`
//! 0. postfix call `()`, member `.`, index `[]`

use carv_lexer::token::TokenKind;
use carv_types::ast::*;
use carv_types::ErrorCode;

use crate::parser::Parser;

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Entry Point
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse an expression.
    pub(crate) fn parse_expression(&mut self) -> Option<Expr> {
        if !self.enter_nesting() {
            return None;
        }
        let result = self.parse_assignment();
        self.exit_nesting();
        result
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Precedence Chain
    // ══════════════════════════════════════════════════════════════════════════

    /// `Assign = Pipe [ AssignOp Assign ]`
    fn parse_assignment(&mut self) -> Option<Expr> {
        let target = self.parse_pipe()?;
        let op = match self.peek_kind() {
            TokenKind::Eq => AssignOp::Assign,
            TokenKind::PlusEq => AssignOp::Add,
            TokenKind::MinusEq => AssignOp::Sub,
            TokenKind::StarEq => AssignOp::Mul,
            TokenKind::SlashEq => AssignOp::Div,
            TokenKind::PercentEq => AssignOp::Mod,
            TokenKind::AmpEq => AssignOp::BitAnd,
            TokenKind::PipeEq => AssignOp::BitOr,
            TokenKind::CaretEq => AssignOp::BitXor,
            _ => return Some(target),
        };
        self.advance();
        let value = self.parse_expression()?;
        let span = target.span.merge(value.span);
        Some(Expr::new(
            ExprKind::Assign {
                target: Box::new(target),
                op,
                value: Box::new(value),
            },
            span,
        ))
    }

    /// `Pipe = Or { "|>" Or }`
    fn parse_pipe(&mut self) -> Option<Expr> {
        let mut folded = 0;
        let result = self.fold_pipe(&mut folded);
        self.exit_nesting_by(folded);
        result
    }

    fn fold_pipe(&mut self, folded: &mut u32) -> Option<Expr> {
        let mut left = self.parse_binary(0)?;
        while self.eat(&TokenKind::PipeGt) {
            if !self.enter_nesting() {
                return None;
            }
            *folded += 1;
            let right = self.parse_binary(0)?;
            let span = left.span.merge(right.span);
            left = Expr::new(
                ExprKind::Pipe {
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
        Some(left)
    }

    /// Binary operator levels, loosest first. Every level is left-assoc.
    fn binary_op_at(level: usize, kind: &TokenKind) -> Option<BinOp> {
        let op = match (level, kind) {
            (0, TokenKind::OrOr) => BinOp::Or,
            (1, TokenKind::AndAnd) => BinOp::And,
            (2, TokenKind::Pipe) => BinOp::BitOr,
            (3, TokenKind::Caret) => BinOp::BitXor,
            (4, TokenKind::Amp) => BinOp::BitAnd,
            (5, TokenKind::EqEq) => BinOp::Eq,
            (5, TokenKind::BangEq) => BinOp::NotEq,
            (6, TokenKind::Less) => BinOp::Less,
            (6, TokenKind::Greater) => BinOp::Greater,
            (6, TokenKind::LessEq) => BinOp::LessEq,
            (6, TokenKind::GreaterEq) => BinOp::GreaterEq,
            (7, TokenKind::Shl) => BinOp::Shl,
            (7, TokenKind::Shr) => BinOp::Shr,
            (8, TokenKind::Plus) => BinOp::Add,
            (8, TokenKind::Minus) => BinOp::Sub,
            (9, TokenKind::Star) => BinOp::Mul,
            (9, TokenKind::Slash) => BinOp::Div,
            (9, TokenKind::Percent) => BinOp::Mod,
            _ => return None,
        };
        Some(op)
    }

    const BINARY_LEVELS: usize = 10;

    /// `Level(n) = Level(n+1) { Op(n) Level(n+1) }`, bottoming out at unary.
    ///
    /// Each folded operator deepens the left spine by one node, so it
    /// counts against the nesting limit like a parenthesis does.
    fn parse_binary(&mut self, level: usize) -> Option<Expr> {
        if level == Self::BINARY_LEVELS {
            return self.parse_unary();
        }
        let mut folded = 0;
        let result = self.fold_binary(level, &mut folded);
        self.exit_nesting_by(folded);
        result
    }

    fn fold_binary(&mut self, level: usize, folded: &mut u32) -> Option<Expr> {
        let mut left = self.parse_binary(level + 1)?;
        while let Some(op) = Self::binary_op_at(level, self.peek_kind()) {
            if !self.enter_nesting() {
                return None;
            }
            *folded += 1;
            self.advance();
            let right = self.parse_binary(level + 1)?;
            let span = left.span.merge(right.span);
            left = Expr::new(
                ExprKind::Binary {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
                span,
            );
        }
        Some(left)
    }

    /// `Unary = ( "-" | "!" | "~" | "&" [ "mut" ] | "*" | "await" ) Unary | Postfix`
    fn parse_unary(&mut self) -> Option<Expr> {
        let start = self.current_span();
        let wrap: fn(Box<Expr>) -> ExprKind = match self.peek_kind() {
            TokenKind::Minus => |e| ExprKind::Unary {
                op: UnaryOp::Neg,
                operand: e,
            },
            TokenKind::Bang => |e| ExprKind::Unary {
                op: UnaryOp::Not,
                operand: e,
            },
            TokenKind::Tilde => |e| ExprKind::Unary {
                op: UnaryOp::BitNot,
                operand: e,
            },
            TokenKind::Star => ExprKind::Deref,
            TokenKind::Await => ExprKind::Await,
            TokenKind::Amp => {
                self.advance();
                let mutable = self.eat(&TokenKind::Mut);
                let operand = self.parse_nested_unary()?;
                let span = start.merge(operand.span);
                return Some(Expr::new(
                    ExprKind::Borrow {
                        mutable,
                        operand: Box::new(operand),
                    },
                    span,
                ));
            }
            _ => return self.parse_postfix(),
        };
        self.advance();
        let operand = self.parse_nested_unary()?;
        let span = start.merge(operand.span);
        Some(Expr::new(wrap(Box::new(operand)), span))
    }

    /// A unary operand, counted against the nesting limit.
    fn parse_nested_unary(&mut self) -> Option<Expr> {
        if !self.enter_nesting() {
            return None;
        }
        let result = self.parse_unary();
        self.exit_nesting();
        result
    }

    /// `Postfix = Primary { "(" Args ")" | "." Name | "[" Expr "]" }`
    fn parse_postfix(&mut self) -> Option<Expr> {
        let mut folded = 0;
        let result = self.fold_postfix(&mut folded);
        self.exit_nesting_by(folded);
        result
    }

    fn fold_postfix(&mut self, folded: &mut u32) -> Option<Expr> {
        let mut expr = self.parse_primary()?;
        while matches!(
            self.peek_kind(),
            TokenKind::LParen | TokenKind::Dot | TokenKind::LBracket
        ) {
            if !self.enter_nesting() {
                return None;
            }
            *folded += 1;
            match self.peek_kind() {
                TokenKind::LParen => {
                    self.advance();
                    let args = self.parse_call_args()?;
                    let span = expr.span.merge(self.previous_span());
                    expr = Expr::new(
                        ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        span,
                    );
                }
                TokenKind::Dot => {
                    self.advance();
                    let member = self.expect_member_name()?;
                    let span = expr.span.merge(member.span);
                    expr = Expr::new(
                        ExprKind::Member {
                            object: Box::new(expr),
                            member,
                        },
                        span,
                    );
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(&TokenKind::RBracket)?;
                    let span = expr.span.merge(self.previous_span());
                    expr = Expr::new(
                        ExprKind::Index {
                            object: Box::new(expr),
                            index: Box::new(index),
                        },
                        span,
                    );
                }
                _ => break,
            }
        }
        Some(expr)
    }

    /// Parse call arguments up to and including `)`.
    fn parse_call_args(&mut self) -> Option<Vec<Expr>> {
        let mut args = Vec::new();
        while !self.check_exact(&TokenKind::RParen) && !self.at_end() {
            args.push(self.parse_expression()?);
            if !self.eat_comma() {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;
        Some(args)
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Primary Expressions
    // ══════════════════════════════════════════════════════════════════════════

    fn parse_primary(&mut self) -> Option<Expr> {
        let start = self.current_span();
        let kind = match self.peek_kind().clone() {
            TokenKind::IntLit(n) => {
                self.advance();
                ExprKind::IntLit(n)
            }
            TokenKind::FloatLit(n) => {
                self.advance();
                ExprKind::FloatLit(n)
            }
            TokenKind::StringLiteral(s) => {
                self.advance();
                ExprKind::StringLit(s)
            }
            TokenKind::StringStart(s) => {
                self.advance();
                self.parse_string_interpolation(s)?
            }
            TokenKind::CharLit(c) => {
                self.advance();
                ExprKind::CharLit(c)
            }
            TokenKind::True => {
                self.advance();
                ExprKind::BoolLit(true)
            }
            TokenKind::False => {
                self.advance();
                ExprKind::BoolLit(false)
            }
            TokenKind::Nil => {
                self.advance();
                ExprKind::NilLit
            }
            TokenKind::Identifier(name) => {
                self.advance();
                ExprKind::Identifier(name)
            }
            TokenKind::SelfKw => {
                self.advance();
                ExprKind::Identifier("self".to_string())
            }
            TokenKind::LBracket => {
                self.advance();
                let mut elems = Vec::new();
                while !self.check_exact(&TokenKind::RBracket) && !self.at_end() {
                    elems.push(self.parse_expression()?);
                    if !self.eat_comma() {
                        break;
                    }
                }
                self.expect(&TokenKind::RBracket)?;
                ExprKind::ArrayLit(elems)
            }
            TokenKind::LBrace => {
                self.advance();
                let mut entries = Vec::new();
                while !self.check_exact(&TokenKind::RBrace) && !self.at_end() {
                    let key = self.parse_expression()?;
                    self.expect(&TokenKind::Colon)?;
                    let value = self.parse_expression()?;
                    entries.push((key, value));
                    if !self.eat_comma() {
                        break;
                    }
                }
                self.expect(&TokenKind::RBrace)?;
                ExprKind::MapLit(entries)
            }
            TokenKind::New => {
                self.advance();
                let class = self.expect_identifier()?;
                let fields = self.parse_field_inits()?;
                ExprKind::New { class, fields }
            }
            TokenKind::Fn | TokenKind::Async => {
                return self.parse_lambda().map(|lambda| {
                    let span = lambda.span;
                    Expr::new(ExprKind::Lambda(Box::new(lambda)), span)
                });
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(&TokenKind::RParen)?;
                ExprKind::Paren(Box::new(inner))
            }
            _ => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected expression, got '{}'", self.peek_kind()),
                );
                return None;
            }
        };
        let span = start.merge(self.previous_span());
        Some(Expr::new(kind, span))
    }

    /// Parse the rest of an interpolated string after its `StringStart`.
    fn parse_string_interpolation(&mut self, first: String) -> Option<ExprKind> {
        let mut parts = Vec::new();
        if !first.is_empty() {
            parts.push(StringPart::Literal(first));
        }
        loop {
            self.expect(&TokenKind::InterpolationStart)?;
            let expr = self.parse_expression()?;
            parts.push(StringPart::Expr(expr));
            self.expect(&TokenKind::InterpolationEnd)?;

            match self.peek_kind().clone() {
                TokenKind::StringPart(s) => {
                    self.advance();
                    if !s.is_empty() {
                        parts.push(StringPart::Literal(s));
                    }
                }
                TokenKind::StringEnd(s) => {
                    self.advance();
                    if !s.is_empty() {
                        parts.push(StringPart::Literal(s));
                    }
                    return Some(ExprKind::StringInterpolation(parts));
                }
                _ => {
                    self.error_at_current(
                        ErrorCode::UNEXPECTED_TOKEN,
                        format!(
                            "expected end of interpolated string, got '{}'",
                            self.peek_kind()
                        ),
                    );
                    return None;
                }
            }
        }
    }

    /// `{ field: expr, ... }` after `new Class`
    fn parse_field_inits(&mut self) -> Option<Vec<FieldInit>> {
        self.expect(&TokenKind::LBrace)?;
        let mut fields = Vec::new();
        while !self.check_exact(&TokenKind::RBrace) && !self.at_end() {
            let name = self.expect_identifier()?;
            self.expect(&TokenKind::Colon)?;
            let value = self.parse_expression()?;
            fields.push(FieldInit { name, value });
            if !self.eat_comma() {
                break;
            }
        }
        self.expect(&TokenKind::RBrace)?;
        Some(fields)
    }

    /// `[async] fn(params) [-> Type] { body }`
    fn parse_lambda(&mut self) -> Option<LambdaExpr> {
        let start = self.current_span();
        let is_async = self.eat(&TokenKind::Async);
        self.expect(&TokenKind::Fn)?;
        self.expect(&TokenKind::LParen)?;
        let params = self.parse_params()?;
        let ret = self.parse_return_annotation()?;
        let body = self.parse_block()?;
        let span = start.merge(body.span);
        Some(LambdaExpr {
            is_async,
            params,
            ret,
            body,
            span,
        })
    }
}
