//! Classes, interfaces and `impl` blocks.
//!
//! Declarations are registered before the walk so annotations and impls
//! may name a type declared later in the file. During the walk, class and
//! impl method bodies are checked with `self` bound per receiver kind, and
//! every impl is verified against its interface.

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use carv_types::ast::*;
use carv_types::ErrorCode;

use crate::checker::{Checker, FnBody};
use crate::ty::{ClassType, InterfaceType, MethodSig, Type};

impl Checker {
    // ══════════════════════════════════════════════════════════════════════
    // Registration
    // ══════════════════════════════════════════════════════════════════════

    /// Register every class, interface and impl relation in `stmts`.
    pub(crate) fn declare_types(&mut self, stmts: &[Stmt]) {
        // 1. Placeholders, so member types may name any declared type
        for stmt in stmts {
            match stmt {
                Stmt::Class(decl) => {
                    let name = &decl.name.name;
                    if !self.classes.contains_key(name) {
                        self.classes
                            .insert(name.clone(), Rc::new(ClassType::placeholder(name)));
                    }
                }
                Stmt::Interface(decl) => {
                    let name = &decl.name.name;
                    if !self.interfaces.contains_key(name) {
                        self.interfaces.insert(
                            name.clone(),
                            Rc::new(InterfaceType {
                                name: name.clone(),
                                methods: BTreeMap::new(),
                            }),
                        );
                    }
                }
                _ => {}
            }
        }

        // 2. Interface method signatures
        for stmt in stmts {
            if let Stmt::Interface(decl) = stmt {
                let mut methods = BTreeMap::new();
                for sig in &decl.methods {
                    let fn_type = self.signature(&sig.params, sig.ret.as_ref(), false);
                    methods.insert(
                        sig.name.name.clone(),
                        MethodSig {
                            receiver: sig.receiver,
                            fn_type,
                        },
                    );
                }
                self.interfaces.insert(
                    decl.name.name.clone(),
                    Rc::new(InterfaceType {
                        name: decl.name.name.clone(),
                        methods,
                    }),
                );
            }
        }

        // 3. Class fields and body methods
        let mut built: HashMap<String, ClassType> = HashMap::new();
        for stmt in stmts {
            if let Stmt::Class(decl) = stmt {
                let mut class = ClassType::placeholder(&decl.name.name);
                for field in &decl.fields {
                    let ty = self.resolve_type_annotation(&field.type_ann);
                    class.fields.insert(field.name.name.clone(), ty);
                }
                for method in &decl.methods {
                    let sig = self.method_sig(method);
                    class.methods.insert(method.name.name.clone(), sig);
                }
                built.insert(decl.name.name.clone(), class);
            }
        }

        // 4. Impl methods join the target's method set
        for stmt in stmts {
            if let Stmt::Impl(decl) = stmt {
                let target = &decl.target.name;
                if !built.contains_key(target) {
                    let Some(existing) = self.classes.get(target) else {
                        continue;
                    };
                    built.insert(target.clone(), existing.as_ref().clone());
                }
                let sigs: Vec<(String, MethodSig)> = decl
                    .methods
                    .iter()
                    .map(|m| (m.name.name.clone(), self.method_sig(m)))
                    .collect();
                if let Some(class) = built.get_mut(target) {
                    class.methods.extend(sigs);
                }
                if self.interfaces.contains_key(&decl.interface.name) {
                    self.impls
                        .insert((target.clone(), decl.interface.name.clone()));
                }
            }
        }

        for (name, class) in built {
            tracing::debug!(
                class = %name,
                fields = class.fields.len(),
                methods = class.methods.len(),
                "class registered"
            );
            self.classes.insert(name, Rc::new(class));
        }
    }

    /// Resolve a method's signature and remember it for the body check.
    fn method_sig(&mut self, method: &MethodDecl) -> MethodSig {
        let fn_type = self.signature(&method.params, method.ret.as_ref(), method.is_async);
        self.signatures.insert(method.span, fn_type.clone());
        MethodSig {
            receiver: method.receiver,
            fn_type,
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Bodies
    // ══════════════════════════════════════════════════════════════════════

    pub(crate) fn check_class(&mut self, decl: &ClassDecl) {
        let class = self.classes.get(&decl.name.name).cloned();

        for field in &decl.fields {
            let Some(default) = &field.default else {
                continue;
            };
            let value_ty = self.check_expr(default);
            let field_ty = class
                .as_ref()
                .and_then(|c| c.fields.get(&field.name.name))
                .cloned()
                .unwrap_or(Type::Unknown);
            if !self.assignable(&value_ty, &field_ty) {
                self.error(
                    ErrorCode::TYPE_MISMATCH,
                    format!(
                        "default for field '{}': cannot assign {value_ty} to {field_ty}",
                        field.name.name
                    ),
                    default.span,
                );
            }
        }

        let owner = class.map_or(Type::Unknown, Type::Class);
        for method in &decl.methods {
            self.check_method(&owner, method);
        }
    }

    pub(crate) fn check_impl(&mut self, decl: &ImplDecl) {
        let iface = self.interfaces.get(&decl.interface.name).cloned();
        let class = self.classes.get(&decl.target.name).cloned();

        if iface.is_none() {
            self.error(
                ErrorCode::UNKNOWN_IMPL_TARGET,
                format!("unknown interface '{}'", decl.interface.name),
                decl.interface.span,
            );
        }
        if class.is_none() {
            self.error(
                ErrorCode::UNKNOWN_IMPL_TARGET,
                format!("unknown class '{}' in impl", decl.target.name),
                decl.target.span,
            );
        }
        if let (Some(iface), Some(class)) = (&iface, &class) {
            self.check_conformance(decl, iface, class);
        }

        let owner = class.map_or(Type::Unknown, Type::Class);
        for method in &decl.methods {
            self.check_method(&owner, method);
        }
    }

    /// Check one method body with `self` bound according to its receiver.
    fn check_method(&mut self, owner: &Type, method: &MethodDecl) {
        let sig = self.declared_signature(
            method.span,
            &method.params,
            method.ret.as_ref(),
            method.is_async,
        );
        let self_ty = match method.receiver {
            Receiver::None => None,
            Receiver::Value => Some(owner.clone()),
            Receiver::Ref | Receiver::RefMut => Some(Type::Reference {
                inner: Box::new(owner.clone()),
                mutable: method.receiver == Receiver::RefMut,
            }),
        };
        self.check_function_body(FnBody {
            params: &method.params,
            sig: &sig,
            is_async: method.is_async,
            has_ret_annotation: method.ret.is_some(),
            self_ty,
            body: &method.body,
        });
    }

    // ══════════════════════════════════════════════════════════════════════
    // Conformance
    // ══════════════════════════════════════════════════════════════════════

    /// Every interface method must exist on the class with matching
    /// parameters and return type. Receiver differences only warn.
    fn check_conformance(&mut self, decl: &ImplDecl, iface: &InterfaceType, class: &ClassType) {
        for (name, required) in &iface.methods {
            let span = decl
                .methods
                .iter()
                .find(|m| m.name.name == *name)
                .map_or(decl.span, |m| m.span);

            let Some(provided) = class.methods.get(name) else {
                self.error(
                    ErrorCode::MISSING_METHOD,
                    format!(
                        "missing method '{name}' in impl of '{}' for '{}'",
                        iface.name, class.name
                    ),
                    decl.span,
                );
                continue;
            };

            let (want, have) = (&required.fn_type, &provided.fn_type);
            if want.params.len() != have.params.len() {
                self.error(
                    ErrorCode::METHOD_ARITY,
                    format!(
                        "wrong number of parameters for method '{name}': interface '{}' declares {}, found {}",
                        iface.name,
                        want.params.len(),
                        have.params.len()
                    ),
                    span,
                );
            } else {
                for (i, (w, h)) in want.params.iter().zip(&have.params).enumerate() {
                    if !self.assignable(w, h) {
                        self.error(
                            ErrorCode::PARAM_TYPE_MISMATCH,
                            format!(
                                "parameter {} of method '{name}' has type {h}, but interface '{}' declares {w}",
                                i + 1,
                                iface.name
                            ),
                            span,
                        );
                    }
                }
            }

            if !self.assignable(&have.ret, &want.ret) {
                self.error(
                    ErrorCode::RETURN_TYPE_MISMATCH,
                    format!(
                        "return type mismatch for method '{name}': interface '{}' declares {}, found {}",
                        iface.name, want.ret, have.ret
                    ),
                    span,
                );
            }

            if required.receiver != provided.receiver {
                self.warn(
                    ErrorCode::RECEIVER_MISMATCH,
                    format!(
                        "receiver mismatch for method '{name}': interface '{}' declares '{}', found '{}'",
                        iface.name,
                        required.receiver.as_str(),
                        provided.receiver.as_str()
                    ),
                    span,
                );
            }
        }
        tracing::debug!(
            class = %class.name,
            interface = %iface.name,
            "impl conformance checked"
        );
    }
}
