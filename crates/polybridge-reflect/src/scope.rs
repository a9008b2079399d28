//! Scopes and contexts: the namespaces backend discovery populates.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::function::Function;
use crate::types::Type;
use crate::value::Value;

/// A tagged symbol bound in a scope.
///
/// Most symbols are function-valued [`Value`]s produced by discovery;
/// backends may also export type descriptors.
#[derive(Debug, Clone)]
pub enum Symbol {
    Value(Value),
    Type(Arc<Type>),
}

impl Symbol {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Symbol::Value(v) => Some(v),
            Symbol::Type(_) => None,
        }
    }

    pub fn as_function(&self) -> Option<&Arc<Function>> {
        self.as_value()?.as_function()
    }
}

/// A namespace mapping symbol names to tagged symbols.
///
/// Names are unique within a scope; redefining a name replaces the previous
/// binding (last write wins). Insertion order carries no meaning.
#[derive(Debug, Default)]
pub struct Scope {
    symbols: HashMap<String, Symbol>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a symbol, returning the binding it replaced, if any.
    pub fn define(&mut self, name: impl Into<String>, symbol: Symbol) -> Option<Symbol> {
        self.symbols.insert(name.into(), symbol)
    }

    /// Bind a function under its scope name.
    pub fn define_function(
        &mut self,
        name: impl Into<String>,
        func: Arc<Function>,
    ) -> Option<Symbol> {
        self.define(name, Symbol::Value(Value::Function(func)))
    }

    pub fn resolve(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    /// Resolve a name to a function, if it is bound to one.
    pub fn resolve_function(&self, name: &str) -> Option<Arc<Function>> {
        self.resolve(name)?.as_function().cloned()
    }

    pub fn remove(&mut self, name: &str) -> Option<Symbol> {
        self.symbols.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn count(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Names of all bound symbols, in no particular order.
    pub fn names(&self) -> Vec<&str> {
        self.symbols.keys().map(|s| s.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Symbol)> {
        self.symbols.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Environment variable consulted by [`Context::script_root_from_env`].
pub const SCRIPT_ROOT_ENV: &str = "POLYBRIDGE_SCRIPT_ROOT";

/// The owner of a top-level scope for one loaded module set.
///
/// The optional script root is read once per discovery call to compute
/// relative display names for discovered functions; without one, discovered
/// names are the full resolved paths.
#[derive(Debug, Default)]
pub struct Context {
    scope: Scope,
    script_root: Option<PathBuf>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context whose discovered names are computed relative to
    /// `root`.
    pub fn with_script_root(root: impl Into<PathBuf>) -> Self {
        Self {
            scope: Scope::new(),
            script_root: Some(root.into()),
        }
    }

    /// Create a context taking its script root from the environment
    /// (`POLYBRIDGE_SCRIPT_ROOT`), when set.
    pub fn script_root_from_env() -> Self {
        match std::env::var_os(SCRIPT_ROOT_ENV) {
            Some(root) => Self::with_script_root(PathBuf::from(root)),
            None => Self::new(),
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn scope_mut(&mut self) -> &mut Scope {
        &mut self.scope
    }

    pub fn script_root(&self) -> Option<&Path> {
        self.script_root.as_deref()
    }

    pub fn set_script_root(&mut self, root: Option<PathBuf>) {
        self.script_root = root;
    }
}
