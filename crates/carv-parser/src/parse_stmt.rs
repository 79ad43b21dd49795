//! Program, block and statement parsing.

use crate::parser::Parser;
use carv_lexer::token::TokenKind;
use carv_types::ast::*;
use carv_types::Span;

impl<'src> Parser<'src> {
    /// Parse the whole token stream as a sequence of statements.
    pub(crate) fn parse_program(&mut self) -> Program {
        let start = self.current_span();
        let mut stmts = Vec::new();
        while !self.at_end() {
            if self.too_many_errors() {
                break;
            }
            if let Some(stmt) = self.parse_statement() {
                stmts.push(stmt);
            } else {
                self.synchronize();
            }
        }
        let span = start.merge(self.previous_span());
        Program { stmts, span }
    }

    /// Parse a block of statements: `{ stmts... }`
    pub(crate) fn parse_block(&mut self) -> Option<Block> {
        let start = self.current_span();
        self.expect(&TokenKind::LBrace)?;
        if !self.enter_nesting() {
            return None;
        }
        let mut stmts = Vec::new();
        while !self.check_exact(&TokenKind::RBrace) && !self.at_end() {
            if self.too_many_errors() {
                break;
            }
            if let Some(stmt) = self.parse_statement() {
                stmts.push(stmt);
            } else {
                self.synchronize();
            }
        }
        self.exit_nesting();
        self.expect(&TokenKind::RBrace)?;
        let span = start.merge(self.previous_span());
        Some(Block { stmts, span })
    }

    /// Parse a single statement.
    pub(crate) fn parse_statement(&mut self) -> Option<Stmt> {
        match self.peek_kind() {
            TokenKind::Let | TokenKind::Const => self.parse_let_stmt().map(Stmt::Let),
            TokenKind::Fn if matches!(self.look_ahead(1), TokenKind::Identifier(_)) => {
                self.parse_fn_decl().map(Stmt::Fn)
            }
            TokenKind::Async
                if *self.look_ahead(1) == TokenKind::Fn
                    && matches!(self.look_ahead(2), TokenKind::Identifier(_)) =>
            {
                self.parse_fn_decl().map(Stmt::Fn)
            }
            TokenKind::Return => self.parse_return_stmt(),
            TokenKind::Break => {
                let span = self.advance().span;
                self.expect_semicolon();
                Some(Stmt::Break(span))
            }
            TokenKind::Continue => {
                let span = self.advance().span;
                self.expect_semicolon();
                Some(Stmt::Continue(span))
            }
            TokenKind::If => self.parse_if_stmt().map(Stmt::If),
            TokenKind::For => self.parse_for_stmt(),
            TokenKind::While => self.parse_while_stmt(),
            TokenKind::Loop => {
                let start = self.advance().span;
                let body = self.parse_block()?;
                let span = start.merge(body.span);
                Some(Stmt::Loop(LoopStmt { body, span }))
            }
            TokenKind::LBrace => self.parse_block().map(Stmt::Block),
            TokenKind::Class => self.parse_class_decl().map(Stmt::Class),
            TokenKind::Interface => self.parse_interface_decl().map(Stmt::Interface),
            TokenKind::Impl => self.parse_impl_decl().map(Stmt::Impl),
            TokenKind::Require => self.parse_require_stmt().map(Stmt::Require),
            _ => {
                let expr = self.parse_expression()?;
                let span = expr.span;
                self.expect_semicolon();
                Some(Stmt::Expr(ExprStmt { expr, span }))
            }
        }
    }

    /// `let name[: Type] = expr;` / `const NAME[: Type] = expr;`
    pub(crate) fn parse_let_stmt(&mut self) -> Option<LetStmt> {
        let start = self.current_span();
        let kind = if self.advance().kind == TokenKind::Const {
            BindingKind::Const
        } else {
            BindingKind::Let
        };
        let name = self.expect_identifier()?;
        let type_ann = if self.eat(&TokenKind::Colon) {
            Some(self.parse_type_annotation()?)
        } else {
            None
        };
        self.expect(&TokenKind::Eq)?;
        let value = self.parse_expression()?;
        let span = start.merge(self.previous_span());
        self.expect_semicolon();
        Some(LetStmt {
            kind,
            name,
            type_ann,
            value,
            span,
        })
    }

    /// `return [expr];`
    fn parse_return_stmt(&mut self) -> Option<Stmt> {
        let start = self.advance().span; // eat `return`
        let value = if matches!(
            self.peek_kind(),
            TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
        ) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        let span = start.merge(self.previous_span());
        self.expect_semicolon();
        Some(Stmt::Return(ReturnStmt { value, span }))
    }

    /// `if cond { ... } [else if ... | else { ... }]`
    fn parse_if_stmt(&mut self) -> Option<IfStmt> {
        let start = self.advance().span; // eat `if`
        let condition = self.parse_expression()?;
        let then_block = self.parse_block()?;
        let else_branch = if self.eat(&TokenKind::Else) {
            if self.check_exact(&TokenKind::If) {
                Some(ElseBranch::ElseIf(Box::new(self.parse_if_stmt()?)))
            } else {
                Some(ElseBranch::Block(self.parse_block()?))
            }
        } else {
            None
        };
        let span = start.merge(self.previous_span());
        Some(IfStmt {
            condition,
            then_block,
            else_branch,
            span,
        })
    }

    /// `for (init; cond; post) { ... }` or `for item in iterable { ... }`
    fn parse_for_stmt(&mut self) -> Option<Stmt> {
        let start = self.advance().span; // eat `for`
        if self.eat(&TokenKind::LParen) {
            return self.parse_c_style_for(start).map(Stmt::For);
        }

        let item = self.expect_identifier()?;
        self.expect(&TokenKind::In)?;
        let iterable = self.parse_expression()?;
        let body = self.parse_block()?;
        let span = start.merge(body.span);
        Some(Stmt::ForIn(ForInStmt {
            item,
            iterable,
            body,
            span,
        }))
    }

    /// The rest of `for (init; cond; post) { ... }` after the `(`.
    fn parse_c_style_for(&mut self, start: Span) -> Option<ForStmt> {
        let init = match self.peek_kind() {
            TokenKind::Semicolon => {
                self.advance();
                None
            }
            TokenKind::Let | TokenKind::Const => {
                // parse_let_stmt consumes the `;`
                Some(Box::new(Stmt::Let(self.parse_let_stmt()?)))
            }
            _ => {
                let expr = self.parse_expression()?;
                let span = expr.span;
                self.expect(&TokenKind::Semicolon)?;
                Some(Box::new(Stmt::Expr(ExprStmt { expr, span })))
            }
        };

        let condition = if self.check_exact(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::Semicolon)?;

        let post = if self.check_exact(&TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::RParen)?;

        let body = self.parse_block()?;
        let span = start.merge(body.span);
        Some(ForStmt {
            init,
            condition,
            post,
            body,
            span,
        })
    }

    /// `while cond { ... }`
    fn parse_while_stmt(&mut self) -> Option<Stmt> {
        let start = self.advance().span; // eat `while`
        let condition = self.parse_expression()?;
        let body = self.parse_block()?;
        let span = start.merge(body.span);
        Some(Stmt::While(WhileStmt {
            condition,
            body,
            span,
        }))
    }
}
