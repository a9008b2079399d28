//! # loader-mock
//!
//! An in-memory backend for testing and development. It implements the
//! full loader contract without touching the filesystem or any foreign
//! runtime, and it is deliberately the backend that exercises the parts
//! the file backend leaves unsupported:
//!
//! - `load_from_memory` is the primary entry point: the buffer is the
//!   unit, the name is its key.
//! - Discovered functions support asynchronous invocation, completing
//!   from a spawned task.
//!
//! Units loaded from memory can afterwards be "loaded" by name through
//! `load_from_file`/`load_from_package`, with the same tolerate-partial /
//! fail-on-zero contract as any path-based backend.

use std::any::Any;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use polybridge_loader::{
    Loader, LoaderConfig, LoaderFactory, LoadError, LoadResult, ModuleHandle, PathResolver,
    ResourceDescriptor,
};
use polybridge_reflect::{
    CallFuture, CallPromise, Context, Function, FunctionInterface, InvokeError, Signature, Type,
    TypeRegistry, Value, ValueKind,
};

/// Tag the mock backend is routed under.
pub const MOCK_TAG: &str = "mock";

/// Name of the resource type discovered functions return.
const TEXT_TYPE: &str = "Text";

/// Implementation payload of a discovered mock function: the unit body it
/// returns.
struct MockFunctionImpl {
    body: String,
}

/// Dispatch table shared by every mock function.
struct MockFunctionInterface;

impl MockFunctionInterface {
    fn body_of(func: &Function) -> Result<String, InvokeError> {
        func.impl_as::<MockFunctionImpl>()
            .map(|imp| imp.body.clone())
            .ok_or_else(|| InvokeError::Failed("mock function lost its unit body".to_string()))
    }
}

impl FunctionInterface for MockFunctionInterface {
    fn invoke(&self, func: &Function, _args: &[Value]) -> Result<Value, InvokeError> {
        Self::body_of(func).map(Value::Str)
    }

    fn schedule(&self, func: &Function, _args: Vec<Value>) -> Option<CallFuture> {
        let body = Self::body_of(func);
        let (promise, future) = CallPromise::channel();

        // Completion happens off the caller's stack, like a real foreign
        // event loop would deliver it.
        tokio::spawn(async move {
            match body {
                Ok(body) => promise.resolve(Value::Str(body)),
                Err(err) => promise.reject(err),
            }
        });

        Some(future)
    }
}

/// The in-memory mock loader backend.
pub struct MockLoader {
    name: String,
    units: HashMap<String, String>,
    resolver: PathResolver,
    types: TypeRegistry,
    text_type: Arc<Type>,
    interface: Arc<MockFunctionInterface>,
}

impl MockLoader {
    /// Initialize the backend: declare the "Text" type and apply the
    /// configured execution paths (used as key prefixes here).
    pub fn initialize(config: &LoaderConfig) -> LoadResult<Self> {
        let mut types = TypeRegistry::new();
        let text_type = types.define(Type::new(ValueKind::Str, TEXT_TYPE))?;

        let mut resolver = PathResolver::new();
        for path in &config.execution_paths {
            resolver.register(path);
        }

        Ok(Self {
            name: config
                .name
                .clone()
                .unwrap_or_else(|| "Mock Loader".to_string()),
            units: HashMap::new(),
            resolver,
            types,
            text_type,
            interface: Arc::new(MockFunctionInterface),
        })
    }

    /// A boxed factory for registry registration.
    pub fn factory() -> LoaderFactory {
        Box::new(|config| {
            MockLoader::initialize(config).map(|loader| Box::new(loader) as Box<dyn Loader>)
        })
    }

    /// Seed a unit directly, without going through a load call.
    pub fn insert_unit(&mut self, name: impl Into<String>, body: impl Into<String>) {
        self.units.insert(name.into(), body.into());
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    fn unit_key(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }

    fn resolve_units(&self, requested: &[PathBuf]) -> Vec<ResourceDescriptor> {
        requested
            .iter()
            .filter_map(|path| {
                self.resolver
                    .resolve_with(path, |candidate| {
                        self.units.contains_key(&Self::unit_key(candidate))
                    })
            })
            .map(ResourceDescriptor::new)
            .collect()
    }
}

impl Loader for MockLoader {
    fn tag(&self) -> &str {
        MOCK_TAG
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn execution_path(&mut self, path: &Path) -> LoadResult<()> {
        self.resolver.register(path);
        Ok(())
    }

    fn load_from_file(&mut self, paths: &[PathBuf]) -> LoadResult<ModuleHandle> {
        let resources = self.resolve_units(paths);
        ModuleHandle::new(MOCK_TAG, resources).ok_or(LoadError::NoneResolved {
            requested: paths.len(),
        })
    }

    fn load_from_memory(&mut self, name: &str, buffer: &[u8]) -> LoadResult<Option<ModuleHandle>> {
        let body = String::from_utf8_lossy(buffer).into_owned();
        debug!("Mock unit '{}' loaded from memory ({} bytes)", name, buffer.len());
        self.units.insert(name.to_string(), body);

        let handle = ModuleHandle::new(MOCK_TAG, vec![ResourceDescriptor::new(name)])
            .ok_or(LoadError::NoneResolved { requested: 1 })?;
        Ok(Some(handle))
    }

    fn load_from_package(&mut self, path: &Path) -> LoadResult<ModuleHandle> {
        self.load_from_file(std::slice::from_ref(&path.to_path_buf()))
    }

    fn discover(&self, handle: &ModuleHandle, ctx: &mut Context) -> LoadResult<()> {
        debug!("Mock module {} discovering", handle.id());

        for resource in handle.resources() {
            let key = Self::unit_key(resource.path());
            let body = self
                .units
                .get(&key)
                .ok_or_else(|| LoadError::MissingResource(key.clone()))?;

            let name = resource.display_name(ctx.script_root());
            let func = Function::bind(
                name.clone(),
                Signature::new()
                    .with_return(Arc::clone(&self.text_type))
                    .freeze(),
                Box::new(MockFunctionImpl { body: body.clone() }),
                Arc::clone(&self.interface) as Arc<dyn FunctionInterface>,
            )?;

            ctx.scope_mut().define_function(name, func);
        }

        Ok(())
    }

    fn destroy(&mut self) -> LoadResult<()> {
        self.units.clear();
        Ok(())
    }

    fn type_registry(&self) -> &TypeRegistry {
        &self.types
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
