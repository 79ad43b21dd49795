//! Internal type representation for the Carv checker.
//!
//! [`Type`] is the semantic type used during checking. It is distinct from
//! [`carv_types::ast::TypeAnnotation`], which is the syntactic form produced
//! by the parser; annotations are resolved against the checker's class and
//! interface tables.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use carv_types::ast::Receiver;

// ══════════════════════════════════════════════════════════════════════════════
// Type
// ══════════════════════════════════════════════════════════════════════════════

/// A semantic type in Carv. Values are immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    // ── Basic ──
    Int,
    Float,
    Bool,
    String,
    Char,
    Void,
    Any,
    Nil,

    /// Type could not be determined (error recovery). Compatible with
    /// everything so one mistake does not cascade.
    Unknown,

    // ── Composites ──
    /// `[T]`
    Array(Box<Type>),
    /// `{K: V}`
    Map(Box<Type>, Box<Type>),
    /// `fn(T1, T2) -> R`
    Function(FnType),
    /// `chan<T>`
    Channel(Box<Type>),
    /// `T?`
    Optional(Box<Type>),
    /// `&T` / `&mut T`
    Reference { inner: Box<Type>, mutable: bool },
    /// `Future<T>`, produced by calling an `async fn`.
    Future(Box<Type>),

    // ── Nominal ──
    Class(Rc<ClassType>),
    Interface(Rc<InterfaceType>),
    /// An imported module, identified by its path.
    Module(std::string::String),
}

/// Copy-vs-move classification driving ownership tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Implicitly duplicated on every use; never tracked.
    Copy,
    /// Consumed when bound, passed or returned.
    Move,
}

/// A function signature.
#[derive(Debug, Clone, PartialEq)]
pub struct FnType {
    pub params: Vec<Type>,
    pub ret: Box<Type>,
}

impl FnType {
    pub fn new(params: Vec<Type>, ret: Type) -> Self {
        Self {
            params,
            ret: Box::new(ret),
        }
    }
}

/// A method signature: receiver kind plus the explicit parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSig {
    pub receiver: Receiver,
    pub fn_type: FnType,
}

/// A class: named record of fields plus its full method set
/// (body methods and every `impl` block targeting it).
///
/// Two class types are equal when their names are. Field types that name
/// a class may point at a placeholder without fields, so member lookups go
/// through the checker's class table.
#[derive(Debug, Clone)]
pub struct ClassType {
    pub name: std::string::String,
    pub fields: BTreeMap<std::string::String, Type>,
    pub methods: BTreeMap<std::string::String, MethodSig>,
}

impl ClassType {
    /// A class with no members yet.
    pub fn placeholder(name: impl Into<std::string::String>) -> Self {
        Self {
            name: name.into(),
            fields: BTreeMap::new(),
            methods: BTreeMap::new(),
        }
    }
}

impl PartialEq for ClassType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// An interface: named set of method signatures. Equal by name.
#[derive(Debug, Clone)]
pub struct InterfaceType {
    pub name: std::string::String,
    pub methods: BTreeMap<std::string::String, MethodSig>,
}

impl PartialEq for InterfaceType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Classification
// ══════════════════════════════════════════════════════════════════════════════

impl Type {
    /// Copy or Move. Total over every variant.
    pub fn category(&self) -> Category {
        match self {
            Type::Int
            | Type::Float
            | Type::Bool
            | Type::Char
            | Type::Void
            | Type::Nil
            | Type::Any
            | Type::Unknown
            | Type::Reference { .. }
            | Type::Function(_)
            | Type::Channel(_)
            | Type::Module(_) => Category::Copy,
            Type::String
            | Type::Array(_)
            | Type::Map(_, _)
            | Type::Class(_)
            | Type::Interface(_)
            | Type::Future(_) => Category::Move,
            Type::Optional(inner) => inner.category(),
        }
    }

    pub fn is_move(&self) -> bool {
        self.category() == Category::Move
    }

    /// `Any` or `Unknown`: accepted wherever a concrete type is required.
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Type::Any | Type::Unknown)
    }

    /// Returns true if this type is `int` or `float`.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int | Type::Float)
    }

    /// Returns true if values of this type can be ordered with `<`, `>`, ...
    pub fn is_comparable(&self) -> bool {
        matches!(
            self,
            Type::Int | Type::Float | Type::String | Type::Char | Type::Bool
        )
    }

    /// The type a value of this type yields when awaited, if any.
    pub fn future_output(&self) -> Option<&Type> {
        match self {
            Type::Future(inner) => Some(&**inner),
            _ => None,
        }
    }

    /// Strip one reference layer. Returns the target and whether the
    /// reference was shared (`Some(true)`), mutable (`Some(false)`), or
    /// absent (`None`).
    pub fn auto_deref(&self) -> (&Type, Option<bool>) {
        match self {
            Type::Reference { inner, mutable } => (&**inner, Some(!*mutable)),
            other => (other, None),
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Assignability
    // ══════════════════════════════════════════════════════════════════════

    /// Check if this type is assignable to `target`, with no class ever
    /// implementing an interface.
    pub fn is_assignable_to(&self, target: &Type) -> bool {
        self.assignable_with(target, &|_, _| false)
    }

    /// Check if this type is assignable to `target`.
    ///
    /// `implements(class, interface)` answers whether a class implements an
    /// interface through an `impl` block.
    ///
    /// Rules:
    /// - Same type → yes
    /// - `Any`/`Unknown` on either side → yes
    /// - `int` → `float`
    /// - `nil` → `T?`, and `T` → `T?`
    /// - Arrays, optionals, futures, channels and maps are covariant
    /// - `&mut T` → `&T`; otherwise mutability must match
    /// - Class → Interface it implements
    /// - Functions: equal arity, contravariant params, covariant return
    pub fn assignable_with<F>(&self, target: &Type, implements: &F) -> bool
    where
        F: Fn(&str, &str) -> bool,
    {
        if self == target || self.is_dynamic() || target.is_dynamic() {
            return true;
        }
        match (self, target) {
            (Type::Int, Type::Float) => true,
            (Type::Nil, Type::Optional(_)) => true,
            (Type::Optional(a), Type::Optional(b)) => a.assignable_with(b, implements),
            (_, Type::Optional(inner)) => self.assignable_with(inner, implements),
            (Type::Array(a), Type::Array(b))
            | (Type::Future(a), Type::Future(b))
            | (Type::Channel(a), Type::Channel(b)) => a.assignable_with(b, implements),
            (Type::Map(ka, va), Type::Map(kb, vb)) => {
                ka.assignable_with(kb, implements) && va.assignable_with(vb, implements)
            }
            (
                Type::Reference {
                    inner: a,
                    mutable: ma,
                },
                Type::Reference {
                    inner: b,
                    mutable: mb,
                },
            ) => (ma == mb || (*ma && !*mb)) && a.assignable_with(b, implements),
            (Type::Class(c), Type::Interface(i)) => implements(&c.name, &i.name),
            (Type::Function(a), Type::Function(b)) => {
                a.params.len() == b.params.len()
                    && a
                        .params
                        .iter()
                        .zip(&b.params)
                        .all(|(pa, pb)| pb.assignable_with(pa, implements))
                    && a.ret.assignable_with(&b.ret, implements)
            }
            _ => false,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Display
// ══════════════════════════════════════════════════════════════════════════════

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Float => write!(f, "float"),
            Type::Bool => write!(f, "bool"),
            Type::String => write!(f, "string"),
            Type::Char => write!(f, "char"),
            Type::Void => write!(f, "void"),
            Type::Any => write!(f, "any"),
            Type::Nil => write!(f, "nil"),
            Type::Unknown => write!(f, "unknown"),
            Type::Array(inner) => write!(f, "[{inner}]"),
            Type::Map(k, v) => write!(f, "{{{k}: {v}}}"),
            Type::Function(fn_type) => write!(f, "{fn_type}"),
            Type::Channel(inner) => write!(f, "chan<{inner}>"),
            Type::Optional(inner) => write!(f, "{inner}?"),
            Type::Reference { inner, mutable } => {
                if *mutable {
                    write!(f, "&mut {inner}")
                } else {
                    write!(f, "&{inner}")
                }
            }
            Type::Future(inner) => write!(f, "Future<{inner}>"),
            Type::Class(c) => write!(f, "{}", c.name),
            Type::Interface(i) => write!(f, "{}", i.name),
            Type::Module(path) => write!(f, "module \"{path}\""),
        }
    }
}

impl fmt::Display for FnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn(")?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{p}")?;
        }
        write!(f, ") -> {}", self.ret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(name: &str) -> Type {
        Type::Class(Rc::new(ClassType::placeholder(name)))
    }

    fn interface(name: &str) -> Type {
        Type::Interface(Rc::new(InterfaceType {
            name: name.to_string(),
            methods: BTreeMap::new(),
        }))
    }

    fn array(t: Type) -> Type {
        Type::Array(Box::new(t))
    }

    fn reference(t: Type, mutable: bool) -> Type {
        Type::Reference {
            inner: Box::new(t),
            mutable,
        }
    }

    #[test]
    fn test_structural_equality() {
        assert_eq!(array(Type::Int), array(Type::Int));
        assert_ne!(array(Type::Int), array(Type::Float));
        assert_eq!(class("Point"), class("Point"));
        assert_ne!(class("Point"), class("Line"));
    }

    #[test]
    fn test_category_is_total() {
        let copy = [
            Type::Int,
            Type::Float,
            Type::Bool,
            Type::Char,
            Type::Void,
            Type::Nil,
            Type::Any,
            Type::Unknown,
            reference(Type::String, false),
            Type::Function(FnType::new(vec![], Type::Void)),
            Type::Channel(Box::new(Type::Int)),
            Type::Module("net".into()),
            Type::Optional(Box::new(Type::Int)),
        ];
        for t in &copy {
            assert_eq!(t.category(), Category::Copy, "{t}");
        }
        let moved = [
            Type::String,
            array(Type::Int),
            Type::Map(Box::new(Type::String), Box::new(Type::Int)),
            class("Point"),
            interface("Shape"),
            Type::Future(Box::new(Type::Int)),
            Type::Optional(Box::new(Type::String)),
        ];
        for t in &moved {
            assert_eq!(t.category(), Category::Move, "{t}");
        }
    }

    #[test]
    fn test_assignability_is_reflexive() {
        for t in [
            Type::Int,
            Type::String,
            array(class("A")),
            reference(Type::Int, true),
            Type::Function(FnType::new(vec![Type::Int], Type::Bool)),
        ] {
            assert!(t.is_assignable_to(&t), "{t}");
        }
    }

    #[test]
    fn test_int_widens_to_float_only() {
        assert!(Type::Int.is_assignable_to(&Type::Float));
        assert!(!Type::Float.is_assignable_to(&Type::Int));
        assert!(!Type::String.is_assignable_to(&Type::Int));
    }

    #[test]
    fn test_any_and_unknown_are_permissive() {
        assert!(Type::String.is_assignable_to(&Type::Any));
        assert!(Type::Any.is_assignable_to(&Type::Int));
        assert!(Type::Unknown.is_assignable_to(&class("X")));
    }

    #[test]
    fn test_optional_accepts_nil_and_inner() {
        let opt = Type::Optional(Box::new(Type::Int));
        assert!(Type::Nil.is_assignable_to(&opt));
        assert!(Type::Int.is_assignable_to(&opt));
        assert!(!Type::String.is_assignable_to(&opt));
        assert!(!opt.is_assignable_to(&Type::Int));
    }

    #[test]
    fn test_covariant_containers() {
        assert!(array(Type::Int).is_assignable_to(&array(Type::Float)));
        assert!(!array(Type::Float).is_assignable_to(&array(Type::Int)));
        let m1 = Type::Map(Box::new(Type::String), Box::new(Type::Int));
        let m2 = Type::Map(Box::new(Type::String), Box::new(Type::Float));
        assert!(m1.is_assignable_to(&m2));
    }

    #[test]
    fn test_reference_mutability() {
        assert!(reference(Type::Int, true).is_assignable_to(&reference(Type::Int, false)));
        assert!(!reference(Type::Int, false).is_assignable_to(&reference(Type::Int, true)));
        assert!(!reference(Type::Int, false).is_assignable_to(&Type::Int));
    }

    #[test]
    fn test_class_to_interface_via_impl_table() {
        let implements = |c: &str, i: &str| c == "Circle" && i == "Shape";
        assert!(class("Circle").assignable_with(&interface("Shape"), &implements));
        assert!(!class("Square").assignable_with(&interface("Shape"), &implements));
        assert!(reference(class("Circle"), false)
            .assignable_with(&reference(interface("Shape"), false), &implements));
        assert!(!class("Circle").is_assignable_to(&interface("Shape")));
    }

    #[test]
    fn test_function_variance() {
        let takes_float = Type::Function(FnType::new(vec![Type::Float], Type::Int));
        let takes_int = Type::Function(FnType::new(vec![Type::Int], Type::Float));
        // fn(float) -> int can stand in for fn(int) -> float
        assert!(takes_float.is_assignable_to(&takes_int));
        assert!(!takes_int.is_assignable_to(&takes_float));
        let arity2 = Type::Function(FnType::new(vec![Type::Int, Type::Int], Type::Float));
        assert!(!arity2.is_assignable_to(&takes_int));
    }

    #[test]
    fn test_display() {
        assert_eq!(array(Type::Int).to_string(), "[int]");
        assert_eq!(
            Type::Map(Box::new(Type::String), Box::new(Type::Int)).to_string(),
            "{string: int}"
        );
        assert_eq!(reference(class("P"), true).to_string(), "&mut P");
        assert_eq!(
            Type::Function(FnType::new(vec![Type::Int, Type::String], Type::Void)).to_string(),
            "fn(int, string) -> void"
        );
        assert_eq!(Type::Optional(Box::new(Type::Int)).to_string(), "int?");
        assert_eq!(Type::Future(Box::new(Type::Int)).to_string(), "Future<int>");
    }

    #[test]
    fn test_numeric_and_comparable() {
        assert!(Type::Int.is_numeric());
        assert!(!Type::String.is_numeric());
        assert!(Type::Char.is_comparable());
        assert!(!array(Type::Int).is_comparable());
    }
}
