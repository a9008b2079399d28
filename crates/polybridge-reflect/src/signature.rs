//! Function signatures: ordered parameter slots plus a return type.

use std::sync::Arc;

use crate::types::Type;

/// A named parameter slot.
#[derive(Debug, Clone)]
pub struct Param {
    name: String,
    ty: Arc<Type>,
}

impl Param {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &Arc<Type> {
        &self.ty
    }
}

/// The ordered parameter/return contract of a function.
///
/// A signature is built up with the `with_` methods, then frozen behind an
/// `Arc` and shared by reference from the owning function — it is never
/// mutated after binding.
#[derive(Debug, Clone, Default)]
pub struct Signature {
    params: Vec<Param>,
    ret: Option<Arc<Type>>,
}

impl Signature {
    /// An empty signature: no parameters, no declared return type.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter slot.
    pub fn with_param(mut self, name: impl Into<String>, ty: Arc<Type>) -> Self {
        self.params.push(Param {
            name: name.into(),
            ty,
        });
        self
    }

    /// Set the return type.
    pub fn with_return(mut self, ty: Arc<Type>) -> Self {
        self.ret = Some(ty);
        self
    }

    /// Freeze the signature for sharing.
    pub fn freeze(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    pub fn ret(&self) -> Option<&Arc<Type>> {
        self.ret.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueKind;

    #[test]
    fn test_empty_signature() {
        let sig = Signature::new();
        assert_eq!(sig.param_count(), 0);
        assert!(sig.ret().is_none());
    }

    #[test]
    fn test_params_keep_declaration_order() {
        let int = Arc::new(Type::new(ValueKind::I32, "Int"));
        let text = Arc::new(Type::new(ValueKind::Str, "Text"));

        let sig = Signature::new()
            .with_param("count", Arc::clone(&int))
            .with_param("label", Arc::clone(&text))
            .with_return(int);

        assert_eq!(sig.param_count(), 2);
        assert_eq!(sig.params()[0].name(), "count");
        assert_eq!(sig.params()[1].name(), "label");
        assert_eq!(sig.params()[1].ty().kind(), ValueKind::Str);
        assert_eq!(sig.ret().unwrap().name(), "Int");
    }

    #[test]
    fn test_freeze_shares_by_reference() {
        let sig = Signature::new().freeze();
        let other = Arc::clone(&sig);
        assert!(Arc::ptr_eq(&sig, &other));
    }
}
