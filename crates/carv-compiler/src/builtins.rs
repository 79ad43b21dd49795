//! Builtin function and module signature registry.
//!
//! Global builtins are seeded into the checker's global scope. Builtin
//! modules (`net`, `web`) back `require` statements and member accesses on
//! the imported module value.

use std::collections::{BTreeMap, HashMap};

use crate::ty::{FnType, Type};

/// Builtins that accept any number of arguments. Arity is not checked for
/// them and bare-identifier arguments are not treated as moves.
pub const VARIADIC_BUILTINS: &[&str] = &[
    "print",
    "println",
    "exec",
    "exec_output",
    "substr",
    "exit",
    "panic",
];

pub fn is_variadic(name: &str) -> bool {
    VARIADIC_BUILTINS.contains(&name)
}

/// Registry of builtin signatures.
#[derive(Debug)]
pub struct BuiltinRegistry {
    globals: BTreeMap<String, FnType>,
    modules: HashMap<String, BTreeMap<String, FnType>>,
}

impl BuiltinRegistry {
    pub fn new() -> Self {
        let mut reg = Self {
            globals: BTreeMap::new(),
            modules: HashMap::new(),
        };
        reg.register_io();
        reg.register_conversions();
        reg.register_strings();
        reg.register_collections();
        reg.register_math();
        reg.register_system();
        reg.register_net();
        reg.register_web();
        reg
    }

    /// Global builtins in name order.
    pub fn globals(&self) -> impl Iterator<Item = (&str, &FnType)> {
        self.globals.iter().map(|(name, sig)| (name.as_str(), sig))
    }

    #[cfg(test)]
    fn global(&self, name: &str) -> Option<&FnType> {
        self.globals.get(name)
    }

    pub fn has_module(&self, module: &str) -> bool {
        self.modules.contains_key(module)
    }

    /// Look up a member signature of a builtin module.
    pub fn member(&self, module: &str, name: &str) -> Option<&FnType> {
        self.modules.get(module)?.get(name)
    }

    /// Every member of a builtin module, in name order.
    pub fn members(&self, module: &str) -> impl Iterator<Item = (&str, &FnType)> {
        self.modules
            .get(module)
            .into_iter()
            .flat_map(|members| members.iter().map(|(name, sig)| (name.as_str(), sig)))
    }

    // ──────────────────────────────────────────────────────────────────────
    // Registration helpers
    // ──────────────────────────────────────────────────────────────────────

    fn add(&mut self, name: &str, params: Vec<Type>, ret: Type) {
        self.globals
            .insert(name.to_string(), FnType::new(params, ret));
    }

    fn add_member(&mut self, module: &str, name: &str, params: Vec<Type>, ret: Type) {
        self.modules
            .entry(module.to_string())
            .or_default()
            .insert(name.to_string(), FnType::new(params, ret));
    }

    // ══════════════════════════════════════════════════════════════════════
    // Globals
    // ══════════════════════════════════════════════════════════════════════

    fn register_io(&mut self) {
        use Type::*;
        self.add("print", vec![Any], Void);
        self.add("println", vec![Any], Void);
        self.add("read_file", vec![String], String);
        self.add("write_file", vec![String, String], Bool);
        self.add("file_exists", vec![String], Bool);
    }

    fn register_conversions(&mut self) {
        use Type::*;
        self.add("len", vec![Any], Int);
        self.add("str", vec![Any], String);
        self.add("int", vec![Any], Int);
        self.add("float", vec![Any], Float);
        self.add("type_of", vec![Any], String);
        self.add("parse_int", vec![String], Int);
        self.add("parse_float", vec![String], Float);
        self.add("ord", vec![Char], Int);
        self.add("chr", vec![Int], Char);
    }

    fn register_strings(&mut self) {
        use Type::*;
        self.add("upper", vec![String], String);
        self.add("lower", vec![String], String);
        self.add("trim", vec![String], String);
        self.add("split", vec![String, String], Array(Box::new(String)));
        self.add("join", vec![Array(Box::new(String)), String], String);
        self.add("contains", vec![Any, Any], Bool);
        self.add("replace", vec![String, String, String], String);
        self.add("starts_with", vec![String, String], Bool);
        self.add("ends_with", vec![String, String], Bool);
        self.add("index_of", vec![String, String], Int);
        self.add("char_at", vec![String, Int], Char);
        self.add("substr", vec![String, Int, Int], String);
    }

    fn register_collections(&mut self) {
        use Type::*;
        let any_array = || Array(Box::new(Any));
        let any_map = || Map(Box::new(Any), Box::new(Any));
        self.add("push", vec![any_array(), Any], Void);
        self.add("pop", vec![any_array()], Any);
        self.add("keys", vec![any_map()], any_array());
        self.add("values", vec![any_map()], any_array());
        self.add("has_key", vec![any_map(), Any], Bool);
        self.add("delete", vec![any_map(), Any], Void);
        self.add("range", vec![Int, Int], Array(Box::new(Int)));
    }

    fn register_math(&mut self) {
        use Type::*;
        self.add("abs", vec![Float], Float);
        self.add("min", vec![Float, Float], Float);
        self.add("max", vec![Float, Float], Float);
        self.add("sqrt", vec![Float], Float);
    }

    fn register_system(&mut self) {
        use Type::*;
        self.add("getenv", vec![String], String);
        self.add("setenv", vec![String, String], Void);
        self.add("args", vec![], Array(Box::new(String)));
        self.add("time_now", vec![], Int);
        self.add("sleep", vec![Int], Void);
        self.add("exec", vec![String], Int);
        self.add("exec_output", vec![String], String);
        self.add("exit", vec![Int], Void);
        self.add("panic", vec![String], Void);
    }

    // ══════════════════════════════════════════════════════════════════════
    // Modules
    // ══════════════════════════════════════════════════════════════════════

    /// net: blocking TCP primitives over integer handles.
    fn register_net(&mut self) {
        use Type::*;
        self.add_member("net", "tcp_listen", vec![String, Int], Int);
        self.add_member("net", "tcp_accept", vec![Int], Int);
        self.add_member("net", "tcp_connect", vec![String, Int], Int);
        self.add_member("net", "tcp_read", vec![Int, Int], String);
        self.add_member("net", "tcp_write", vec![Int, String], Int);
        self.add_member("net", "tcp_close", vec![Int], Void);
    }

    /// web: HTTP client and a minimal router.
    fn register_web(&mut self) {
        use Type::*;
        let handler = Function(FnType::new(vec![Any], Any));
        self.add_member("web", "get", vec![String], Future(Box::new(String)));
        self.add_member("web", "serve", vec![Int], Void);
        self.add_member("web", "route", vec![String, handler], Void);
        self.add_member("web", "json", vec![Any], String);
        self.add_member("web", "response", vec![Int, String], Any);
    }
}

impl Default for BuiltinRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_globals_cover_core_builtins() {
        let reg = BuiltinRegistry::new();
        for name in ["print", "len", "str", "int", "float", "push", "read_file", "exec"] {
            assert!(reg.global(name).is_some(), "missing builtin {name}");
        }
        assert!(reg.globals().count() >= 40);
    }

    #[test]
    fn test_variadic_builtins_are_registered() {
        let reg = BuiltinRegistry::new();
        for name in VARIADIC_BUILTINS {
            assert!(reg.global(name).is_some(), "{name}");
            assert!(is_variadic(name));
        }
        assert!(!is_variadic("len"));
    }

    #[test]
    fn test_module_lookup() {
        let reg = BuiltinRegistry::new();
        assert!(reg.has_module("net"));
        assert!(reg.has_module("web"));
        assert!(!reg.has_module("os"));
        let get = reg.member("web", "get");
        assert_eq!(
            get.map(|sig| sig.ret.as_ref().clone()),
            Some(Type::Future(Box::new(Type::String)))
        );
        assert!(reg.member("net", "tcp_frobnicate").is_none());
        assert_eq!(reg.members("net").count(), 6);
        assert_eq!(reg.members("nope").count(), 0);
    }
}
