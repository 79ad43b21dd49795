//! Declaration parsing: functions, classes, interfaces, impls, requires.

use carv_lexer::token::TokenKind;
use carv_types::ast::*;
use carv_types::ErrorCode;

use crate::parser::Parser;

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Functions
    // ══════════════════════════════════════════════════════════════════════════

    /// `[async] fn name(params) [-> Type] { body }`
    pub(crate) fn parse_fn_decl(&mut self) -> Option<FnDecl> {
        let start = self.current_span();
        let is_async = self.eat(&TokenKind::Async);
        self.expect(&TokenKind::Fn)?;
        let name = self.expect_identifier()?;
        self.expect(&TokenKind::LParen)?;
        let params = self.parse_params()?;
        let ret = self.parse_return_annotation()?;
        let body = self.parse_block()?;
        let span = start.merge(body.span);
        Some(FnDecl {
            name,
            is_async,
            params,
            ret,
            body,
            span,
        })
    }

    /// Parse parameters up to and including the closing `)`.
    /// The opening `(` (and any receiver) has already been consumed.
    pub(crate) fn parse_params(&mut self) -> Option<Vec<Param>> {
        let mut params = Vec::new();
        while !self.check_exact(&TokenKind::RParen) && !self.at_end() {
            let name = self.expect_identifier()?;
            let type_ann = if self.eat(&TokenKind::Colon) {
                Some(self.parse_type_annotation()?)
            } else {
                None
            };
            let span = name.span.merge(self.previous_span());
            params.push(Param {
                name,
                type_ann,
                span,
            });
            if !self.eat_comma() {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;
        Some(params)
    }

    /// Parse an optional `-> Type`. The outer `Option` signals a parse
    /// failure; the inner one whether an annotation was written.
    pub(crate) fn parse_return_annotation(&mut self) -> Option<Option<TypeAnnotation>> {
        if self.eat(&TokenKind::Arrow) {
            Some(Some(self.parse_type_annotation()?))
        } else {
            Some(None)
        }
    }

    /// Parse a method receiver right after `(`: `self`, `&self`, `&mut self`
    /// or nothing. Consumes the comma that follows a receiver.
    fn parse_receiver(&mut self) -> Receiver {
        let (receiver, len) = match (self.peek_kind(), self.look_ahead(1), self.look_ahead(2)) {
            (TokenKind::SelfKw, _, _) => (Receiver::Value, 1),
            (TokenKind::Amp, TokenKind::SelfKw, _) => (Receiver::Ref, 2),
            (TokenKind::Amp, TokenKind::Mut, TokenKind::SelfKw) => (Receiver::RefMut, 3),
            _ => return Receiver::None,
        };
        for _ in 0..len {
            self.advance();
        }
        self.eat_comma();
        receiver
    }

    /// `[async] fn name(receiver, params) [-> Type] { body }`
    fn parse_method_decl(&mut self) -> Option<MethodDecl> {
        let start = self.current_span();
        let is_async = self.eat(&TokenKind::Async);
        self.expect(&TokenKind::Fn)?;
        let name = self.expect_identifier()?;
        self.expect(&TokenKind::LParen)?;
        let receiver = self.parse_receiver();
        let params = self.parse_params()?;
        let ret = self.parse_return_annotation()?;
        let body = self.parse_block()?;
        let span = start.merge(body.span);
        Some(MethodDecl {
            name,
            is_async,
            receiver,
            params,
            ret,
            body,
            span,
        })
    }

    /// Parse `{ method* }` for an impl block.
    fn parse_method_list(&mut self) -> Option<Vec<MethodDecl>> {
        self.expect(&TokenKind::LBrace)?;
        let mut methods = Vec::new();
        while !self.check_exact(&TokenKind::RBrace) && !self.at_end() {
            if self.too_many_errors() {
                break;
            }
            match self.parse_method_decl() {
                Some(m) => methods.push(m),
                None => self.synchronize(),
            }
        }
        self.expect(&TokenKind::RBrace)?;
        Some(methods)
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Classes
    // ══════════════════════════════════════════════════════════════════════════

    /// `class Name { field: Type [= default], ... fn method(...) { ... } }`
    pub(crate) fn parse_class_decl(&mut self) -> Option<ClassDecl> {
        let start = self.advance().span; // eat `class`
        let name = self.expect_identifier()?;
        self.expect(&TokenKind::LBrace)?;

        let mut fields = Vec::new();
        let mut methods = Vec::new();
        while !self.check_exact(&TokenKind::RBrace) && !self.at_end() {
            if self.too_many_errors() {
                break;
            }
            match self.peek_kind() {
                TokenKind::Fn | TokenKind::Async => match self.parse_method_decl() {
                    Some(m) => methods.push(m),
                    None => self.synchronize(),
                },
                TokenKind::Identifier(_) => match self.parse_field_decl() {
                    Some(f) => fields.push(f),
                    None => self.synchronize(),
                },
                _ => {
                    self.error_at_current(
                        ErrorCode::UNEXPECTED_TOKEN,
                        format!(
                            "expected field or method in class body, got '{}'",
                            self.peek_kind()
                        ),
                    );
                    self.synchronize();
                }
            }
        }
        self.expect(&TokenKind::RBrace)?;
        let span = start.merge(self.previous_span());
        Some(ClassDecl {
            name,
            fields,
            methods,
            span,
        })
    }

    /// `name: Type [= default]` followed by an optional `,` or `;`
    fn parse_field_decl(&mut self) -> Option<FieldDecl> {
        let name = self.expect_identifier()?;
        self.expect(&TokenKind::Colon)?;
        let type_ann = self.parse_type_annotation()?;
        let default = if self.eat(&TokenKind::Eq) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        let span = name.span.merge(self.previous_span());
        if !self.eat_comma() {
            self.eat(&TokenKind::Semicolon);
        }
        Some(FieldDecl {
            name,
            type_ann,
            default,
            span,
        })
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Interfaces & Impls
    // ══════════════════════════════════════════════════════════════════════════

    /// `interface Name { fn method(&self, a: T) -> R; ... }`
    pub(crate) fn parse_interface_decl(&mut self) -> Option<InterfaceDecl> {
        let start = self.advance().span; // eat `interface`
        let name = self.expect_identifier()?;
        self.expect(&TokenKind::LBrace)?;

        let mut methods = Vec::new();
        while !self.check_exact(&TokenKind::RBrace) && !self.at_end() {
            if self.too_many_errors() {
                break;
            }
            match self.parse_method_sig() {
                Some(sig) => methods.push(sig),
                None => self.synchronize(),
            }
        }
        self.expect(&TokenKind::RBrace)?;
        let span = start.merge(self.previous_span());
        Some(InterfaceDecl {
            name,
            methods,
            span,
        })
    }

    /// `fn name(receiver, params) [-> Type];`
    fn parse_method_sig(&mut self) -> Option<MethodSigDecl> {
        let start = self.current_span();
        self.expect(&TokenKind::Fn)?;
        let name = self.expect_identifier()?;
        self.expect(&TokenKind::LParen)?;
        let receiver = self.parse_receiver();
        let params = self.parse_params()?;
        let ret = self.parse_return_annotation()?;
        let span = start.merge(self.previous_span());
        self.expect_semicolon();
        Some(MethodSigDecl {
            name,
            receiver,
            params,
            ret,
            span,
        })
    }

    /// `impl Interface for Class { methods... }`
    pub(crate) fn parse_impl_decl(&mut self) -> Option<ImplDecl> {
        let start = self.advance().span; // eat `impl`
        let interface = self.expect_identifier()?;
        self.expect(&TokenKind::For)?;
        let target = self.expect_identifier()?;
        let methods = self.parse_method_list()?;
        let span = start.merge(self.previous_span());
        Some(ImplDecl {
            interface,
            target,
            methods,
            span,
        })
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Modules
    // ══════════════════════════════════════════════════════════════════════════

    /// ```text
    /// require "path";
    /// require "path" as alias;
    /// require { a, b } from "path";
    /// require * from "path";
    /// ```
    pub(crate) fn parse_require_stmt(&mut self) -> Option<RequireStmt> {
        let start = self.advance().span; // eat `require`

        let (path, import) = match self.peek_kind() {
            TokenKind::Star => {
                self.advance();
                self.expect(&TokenKind::From)?;
                (self.expect_string_literal()?, ImportKind::Wildcard)
            }
            TokenKind::LBrace => {
                self.advance();
                let mut names = Vec::new();
                while !self.check_exact(&TokenKind::RBrace) && !self.at_end() {
                    names.push(self.expect_identifier()?);
                    if !self.eat_comma() {
                        break;
                    }
                }
                self.expect(&TokenKind::RBrace)?;
                self.expect(&TokenKind::From)?;
                (self.expect_string_literal()?, ImportKind::Named(names))
            }
            _ => {
                let path = self.expect_string_literal()?;
                let alias = if self.eat(&TokenKind::As) {
                    Some(self.expect_identifier()?)
                } else {
                    None
                };
                (path, ImportKind::Module { alias })
            }
        };

        let span = start.merge(self.previous_span());
        self.expect_semicolon();
        Some(RequireStmt { path, import, span })
    }
}
