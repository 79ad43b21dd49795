//! `await` legality.
//!
//! An `await` must sit inside an async function body, must not suspend
//! while any borrow is live, and must be applied to a `Future`.

use carv_types::ast::Expr;
use carv_types::{ErrorCode, Span};

use crate::checker::Checker;
use crate::ty::Type;

impl Checker {
    pub(crate) fn check_await(&mut self, operand: &Expr, span: Span) -> Type {
        let ty = self.check_expr(operand);

        if !self.env.in_async() {
            self.error(
                ErrorCode::AWAIT_OUTSIDE_ASYNC,
                "'await' is only allowed inside an async function".to_string(),
                span,
            );
        }

        // Conservative: every borrow still registered in an enclosing
        // frame counts, whether or not it is used after the await.
        let held: Vec<String> = self
            .borrows
            .active()
            .into_iter()
            .map(|name| format!("'{name}'"))
            .collect();
        if !held.is_empty() {
            tracing::debug!(borrows = held.len(), "borrow held across await");
            self.error(
                ErrorCode::BORROW_ACROSS_AWAIT,
                format!("borrow of {} held across await", held.join(", ")),
                span,
            );
        }

        match ty {
            Type::Future(output) => *output,
            Type::Any | Type::Unknown => ty,
            other => {
                self.error(
                    ErrorCode::AWAIT_NON_FUTURE,
                    format!("await requires Future type, got {other}"),
                    operand.span,
                );
                other
            }
        }
    }
}
