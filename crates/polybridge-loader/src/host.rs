//! The host (proxy) backend.
//!
//! Represents the embedding process itself: the embedder registers native
//! Rust callables, and foreign-runtime callbacks address "call back into
//! the host" through the same Function/Scope machinery as any other
//! backend, rather than a separate code path.

use std::any::Any;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use polybridge_reflect::{
    CallFuture, CallPromise, Context, Function, FunctionInterface, InvokeError, Signature, Type,
    TypeRegistry, Value, ValueKind,
};

use crate::backend::Loader;
use crate::config::LoaderConfig;
use crate::error::{LoadError, LoadResult};
use crate::handle::ModuleHandle;

/// Reserved tag the host backend is registered under.
pub const HOST_TAG: &str = "host";

/// A synchronous host callable.
pub type HostFn = Arc<dyn Fn(&[Value]) -> Result<Value, InvokeError> + Send + Sync>;

/// An asynchronous host callable.
///
/// Scheduled with `tokio::spawn`; the call future settles with whatever
/// the handler returns. Requires a running tokio runtime at invocation
/// time.
#[async_trait]
pub trait AsyncHostHandler: Send + Sync {
    async fn call(&self, args: Vec<Value>) -> Result<Value, InvokeError>;
}

enum HostCallable {
    Sync(HostFn),
    Async(Arc<dyn AsyncHostHandler>),
}

/// Implementation payload stored on every host function.
struct HostFunctionImpl {
    callable: HostCallable,
}

/// Dispatch table shared by all host functions.
struct HostFunctionInterface;

impl FunctionInterface for HostFunctionInterface {
    fn invoke(&self, func: &Function, args: &[Value]) -> Result<Value, InvokeError> {
        let imp = func
            .impl_as::<HostFunctionImpl>()
            .ok_or_else(|| InvokeError::Failed("host function lost its callable".to_string()))?;

        match &imp.callable {
            HostCallable::Sync(f) => f(args),
            HostCallable::Async(_) => Err(InvokeError::Failed(format!(
                "'{}' is asynchronous; use deferred invocation",
                func.name()
            ))),
        }
    }

    fn schedule(&self, func: &Function, args: Vec<Value>) -> Option<CallFuture> {
        let imp = func.impl_as::<HostFunctionImpl>()?;

        match &imp.callable {
            // A synchronous callable has no async notion; neither side of
            // the promise will ever fire.
            HostCallable::Sync(_) => None,
            HostCallable::Async(handler) => {
                let handler = Arc::clone(handler);
                let (promise, future) = CallPromise::channel();

                tokio::spawn(async move {
                    match handler.call(args).await {
                        Ok(value) => promise.resolve(value),
                        Err(err) => promise.reject(err),
                    }
                });

                Some(future)
            }
        }
    }
}

/// The proxy loader backend for the embedding process.
///
/// Load operations have no meaning here: there is nothing to resolve, the
/// callables already live in the process. Discovery publishes every
/// registered callable into the context scope.
pub struct HostLoader {
    name: String,
    functions: HashMap<String, Arc<Function>>,
    types: TypeRegistry,
    interface: Arc<HostFunctionInterface>,
}

impl HostLoader {
    /// Initialize the host backend, defining one exported type per value
    /// kind so registered signatures can reference them by name.
    pub fn initialize(config: &LoaderConfig) -> LoadResult<Self> {
        let mut types = TypeRegistry::new();

        for kind in [
            ValueKind::Bool,
            ValueKind::I8,
            ValueKind::I16,
            ValueKind::I32,
            ValueKind::I64,
            ValueKind::F32,
            ValueKind::F64,
            ValueKind::Str,
            ValueKind::Opaque,
            ValueKind::Array,
            ValueKind::Map,
            ValueKind::Function,
            ValueKind::Null,
        ] {
            types.define(Type::new(kind, kind.as_str()))?;
        }

        Ok(Self {
            name: config
                .name
                .clone()
                .unwrap_or_else(|| "Host Process".to_string()),
            functions: HashMap::new(),
            types,
            interface: Arc::new(HostFunctionInterface),
        })
    }

    fn kind_type(&self, kind: ValueKind) -> LoadResult<Arc<Type>> {
        self.types
            .resolve(kind.as_str())
            .ok_or_else(|| LoadError::UnknownType(kind.as_str().to_string()))
    }

    fn bind_callable(
        &mut self,
        name: &str,
        params: &[ValueKind],
        ret: Option<ValueKind>,
        callable: HostCallable,
    ) -> LoadResult<Arc<Function>> {
        let mut signature = Signature::new();
        for (index, kind) in params.iter().enumerate() {
            signature = signature.with_param(format!("arg{}", index), self.kind_type(*kind)?);
        }
        if let Some(kind) = ret {
            signature = signature.with_return(self.kind_type(kind)?);
        }

        let func = Function::bind(
            name,
            signature.freeze(),
            Box::new(HostFunctionImpl { callable }),
            Arc::clone(&self.interface) as Arc<dyn FunctionInterface>,
        )?;

        info!("Registered host function '{}'", name);

        // Re-registering a name replaces the previous callable.
        self.functions.insert(name.to_string(), Arc::clone(&func));
        Ok(func)
    }

    /// Register a synchronous callable.
    pub fn register_function<F>(
        &mut self,
        name: &str,
        params: &[ValueKind],
        ret: Option<ValueKind>,
        f: F,
    ) -> LoadResult<Arc<Function>>
    where
        F: Fn(&[Value]) -> Result<Value, InvokeError> + Send + Sync + 'static,
    {
        self.bind_callable(name, params, ret, HostCallable::Sync(Arc::new(f)))
    }

    /// Register an asynchronous handler.
    pub fn register_async_handler(
        &mut self,
        name: &str,
        params: &[ValueKind],
        ret: Option<ValueKind>,
        handler: Arc<dyn AsyncHostHandler>,
    ) -> LoadResult<Arc<Function>> {
        self.bind_callable(name, params, ret, HostCallable::Async(handler))
    }

    /// Look up a registered callable by name.
    pub fn function(&self, name: &str) -> Option<Arc<Function>> {
        self.functions.get(name).cloned()
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }
}

impl Loader for HostLoader {
    fn tag(&self) -> &str {
        HOST_TAG
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn execution_path(&mut self, _path: &Path) -> LoadResult<()> {
        Err(LoadError::Unsupported {
            tag: HOST_TAG.to_string(),
            op: "execution_path",
        })
    }

    fn load_from_file(&mut self, _paths: &[PathBuf]) -> LoadResult<ModuleHandle> {
        Err(LoadError::Unsupported {
            tag: HOST_TAG.to_string(),
            op: "load_from_file",
        })
    }

    fn load_from_package(&mut self, _path: &Path) -> LoadResult<ModuleHandle> {
        Err(LoadError::Unsupported {
            tag: HOST_TAG.to_string(),
            op: "load_from_package",
        })
    }

    fn discover(&self, _handle: &ModuleHandle, _ctx: &mut Context) -> LoadResult<()> {
        Err(LoadError::Unsupported {
            tag: HOST_TAG.to_string(),
            op: "discover",
        })
    }

    fn destroy(&mut self) -> LoadResult<()> {
        self.functions.clear();
        Ok(())
    }

    fn type_registry(&self) -> &TypeRegistry {
        &self.types
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl HostLoader {
    /// Publish every registered callable into the context's top-level
    /// scope. The host has no handles, so this is exposed directly rather
    /// than through `discover`.
    pub fn publish(&self, ctx: &mut Context) {
        for (name, func) in &self.functions {
            ctx.scope_mut().define_function(name.clone(), Arc::clone(func));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host() -> HostLoader {
        HostLoader::initialize(&LoaderConfig::default()).unwrap()
    }

    #[test]
    fn test_sync_function_roundtrip() {
        let mut loader = host();
        loader
            .register_function(
                "double",
                &[ValueKind::I64],
                Some(ValueKind::I64),
                |args| {
                    let n = args[0].as_i64().ok_or_else(|| {
                        InvokeError::Failed("expected an i64 argument".to_string())
                    })?;
                    Ok(Value::I64(n * 2))
                },
            )
            .unwrap();

        let func = loader.function("double").unwrap();
        assert_eq!(func.invoke(&[Value::I64(21)]).unwrap(), Value::I64(42));
    }

    #[test]
    fn test_sync_function_has_no_async_support() {
        let mut loader = host();
        loader
            .register_function("noop", &[], None, |_| Ok(Value::Null))
            .unwrap();

        let func = loader.function("noop").unwrap();
        assert!(func.invoke_deferred(vec![]).is_none());
    }

    #[test]
    fn test_reregistration_replaces() {
        let mut loader = host();
        loader
            .register_function("f", &[], Some(ValueKind::I32), |_| Ok(Value::I32(1)))
            .unwrap();
        loader
            .register_function("f", &[], Some(ValueKind::I32), |_| Ok(Value::I32(2)))
            .unwrap();

        assert_eq!(loader.function_count(), 1);
        let func = loader.function("f").unwrap();
        assert_eq!(func.invoke(&[]).unwrap(), Value::I32(2));
    }

    #[test]
    fn test_loads_are_unsupported() {
        let mut loader = host();
        assert!(matches!(
            loader.load_from_file(&[PathBuf::from("x")]),
            Err(LoadError::Unsupported { .. })
        ));
        assert!(matches!(
            loader.load_from_memory("unit", b"bytes"),
            Ok(None)
        ));
    }

    #[test]
    fn test_publish_defines_scope_symbols() {
        let mut loader = host();
        loader
            .register_function("greet", &[], Some(ValueKind::Str), |_| {
                Ok(Value::from("hello from the host"))
            })
            .unwrap();

        let mut ctx = Context::new();
        loader.publish(&mut ctx);

        let func = ctx.scope().resolve_function("greet").unwrap();
        assert_eq!(
            func.invoke(&[]).unwrap(),
            Value::from("hello from the host")
        );
    }

    struct Uppercase;

    #[async_trait]
    impl AsyncHostHandler for Uppercase {
        async fn call(&self, args: Vec<Value>) -> Result<Value, InvokeError> {
            let text = args
                .into_iter()
                .next()
                .and_then(|v| v.as_str().map(str::to_uppercase))
                .ok_or_else(|| InvokeError::Failed("expected a string".to_string()))?;
            Ok(Value::Str(text))
        }
    }

    #[tokio::test]
    async fn test_async_handler_settles_future() {
        let mut loader = host();
        loader
            .register_async_handler(
                "upper",
                &[ValueKind::Str],
                Some(ValueKind::Str),
                Arc::new(Uppercase),
            )
            .unwrap();

        let func = loader.function("upper").unwrap();
        let future = func.invoke_deferred(vec![Value::from("loud")]).unwrap();
        assert_eq!(future.await.unwrap(), Value::from("LOUD"));
    }

    #[tokio::test]
    async fn test_async_handler_rejects_sync_invocation() {
        let mut loader = host();
        loader
            .register_async_handler(
                "upper",
                &[ValueKind::Str],
                Some(ValueKind::Str),
                Arc::new(Uppercase),
            )
            .unwrap();

        let func = loader.function("upper").unwrap();
        assert!(matches!(
            func.invoke(&[Value::from("x")]),
            Err(InvokeError::Failed(_))
        ));
    }
}
