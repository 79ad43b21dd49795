//! Type annotation parsing.

use carv_lexer::token::TokenKind;
use carv_types::ast::*;
use carv_types::ErrorCode;

use crate::parser::Parser;

impl<'src> Parser<'src> {
    /// Parse a type annotation.
    ///
    /// ```ebnf
    /// Type     = BaseType { "?" } ;
    /// BaseType = "int" | "float" | "bool" | "string" | "char" | "void" | "any" | "nil"
    ///          | "[" Type "]"
    ///          | "{" Type ":" Type "}"
    ///          | "fn" "(" [ Type { "," Type } ] ")" [ "->" Type ]
    ///          | "chan" "<" Type ">"
    ///          | "Future" "<" Type ">"
    ///          | "&" [ "mut" ] Type
    ///          | Identifier ;
    /// ```
    pub(crate) fn parse_type_annotation(&mut self) -> Option<TypeAnnotation> {
        if !self.enter_nesting() {
            return None;
        }
        let result = self.parse_type_inner();
        self.exit_nesting();
        result
    }

    fn parse_type_inner(&mut self) -> Option<TypeAnnotation> {
        let start = self.current_span();
        let kind = match self.peek_kind().clone() {
            TokenKind::Nil => {
                self.advance();
                TypeKind::Nil
            }
            TokenKind::LBracket => {
                self.advance();
                let elem = self.parse_type_annotation()?;
                self.expect(&TokenKind::RBracket)?;
                TypeKind::Array(Box::new(elem))
            }
            TokenKind::LBrace => {
                self.advance();
                let key = self.parse_type_annotation()?;
                self.expect(&TokenKind::Colon)?;
                let value = self.parse_type_annotation()?;
                self.expect(&TokenKind::RBrace)?;
                TypeKind::Map(Box::new(key), Box::new(value))
            }
            TokenKind::Fn => {
                self.advance();
                self.expect(&TokenKind::LParen)?;
                let mut params = Vec::new();
                while !self.check_exact(&TokenKind::RParen) && !self.at_end() {
                    params.push(self.parse_type_annotation()?);
                    if !self.eat_comma() {
                        break;
                    }
                }
                let close = self.expect(&TokenKind::RParen)?;
                let ret = if self.eat(&TokenKind::Arrow) {
                    self.parse_type_annotation()?
                } else {
                    TypeAnnotation::new(TypeKind::Void, close.span)
                };
                TypeKind::Function {
                    params,
                    ret: Box::new(ret),
                }
            }
            TokenKind::Amp => {
                self.advance();
                let mutable = self.eat(&TokenKind::Mut);
                let inner = self.parse_type_annotation()?;
                TypeKind::Reference {
                    mutable,
                    inner: Box::new(inner),
                }
            }
            TokenKind::Identifier(name) => {
                self.advance();
                match name.as_str() {
                    "int" => TypeKind::Int,
                    "float" => TypeKind::Float,
                    "bool" => TypeKind::Bool,
                    "string" => TypeKind::String,
                    "char" => TypeKind::Char,
                    "void" => TypeKind::Void,
                    "any" => TypeKind::Any,
                    "chan" if self.check_exact(&TokenKind::Less) => {
                        TypeKind::Channel(Box::new(self.parse_angle_argument()?))
                    }
                    "Future" if self.check_exact(&TokenKind::Less) => {
                        TypeKind::Future(Box::new(self.parse_angle_argument()?))
                    }
                    _ => TypeKind::Named(name),
                }
            }
            _ => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected type, got '{}'", self.peek_kind()),
                );
                return None;
            }
        };

        let mut ty = TypeAnnotation::new(kind, start.merge(self.previous_span()));
        while self.eat(&TokenKind::Question) {
            let span = start.merge(self.previous_span());
            ty = TypeAnnotation::new(TypeKind::Optional(Box::new(ty)), span);
        }
        Some(ty)
    }

    /// Parse `< Type >`, splitting a `>>` produced by nested generics.
    fn parse_angle_argument(&mut self) -> Option<TypeAnnotation> {
        self.expect(&TokenKind::Less)?;
        let inner = self.parse_type_annotation()?;
        match self.peek_kind() {
            TokenKind::Greater => {
                self.advance();
            }
            TokenKind::Shr => self.replace_current(TokenKind::Greater),
            TokenKind::GreaterEq => self.replace_current(TokenKind::Eq),
            _ => {
                self.expect(&TokenKind::Greater)?;
            }
        }
        Some(inner)
    }
}
