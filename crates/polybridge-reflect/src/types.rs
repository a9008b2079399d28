//! Named type descriptors and the per-backend type registry.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{ReflectError, ReflectResult};
use crate::value::{OpaqueValue, ValueKind};

/// An immutable type descriptor.
///
/// Backends declare the types they export (the file backend declares a
/// single "Path" type, for instance) and reference them from signatures.
/// The optional custom handle carries backend-private type information;
/// the kind tag is what the cast matrix understands.
#[derive(Debug, Clone)]
pub struct Type {
    kind: ValueKind,
    name: String,
    custom: Option<OpaqueValue>,
}

impl Type {
    /// Create a descriptor for a named type over the given kind.
    pub fn new(kind: ValueKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            custom: None,
        }
    }

    /// Attach a backend-private payload to the descriptor.
    pub fn with_custom(mut self, custom: OpaqueValue) -> Self {
        self.custom = Some(custom);
        self
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn custom(&self) -> Option<&OpaqueValue> {
        self.custom.as_ref()
    }
}

/// Registry of type descriptors, keyed by name.
///
/// Each loader backend instance owns exactly one registry; names are unique
/// within it.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: HashMap<String, Arc<Type>>,
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a type, returning the shared descriptor.
    ///
    /// Fails if a type with the same name is already defined.
    pub fn define(&mut self, ty: Type) -> ReflectResult<Arc<Type>> {
        if self.types.contains_key(ty.name()) {
            return Err(ReflectError::DuplicateType(ty.name().to_string()));
        }

        let ty = Arc::new(ty);
        self.types.insert(ty.name().to_string(), Arc::clone(&ty));
        Ok(ty)
    }

    /// Look up a type by name.
    pub fn resolve(&self, name: &str) -> Option<Arc<Type>> {
        self.types.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn count(&self) -> usize {
        self.types.len()
    }

    /// Names of all defined types, in no particular order.
    pub fn names(&self) -> Vec<&str> {
        self.types.keys().map(|s| s.as_str()).collect()
    }
}
