//! The backend contract every loader implements.

use std::any::Any;
use std::path::{Path, PathBuf};

use polybridge_reflect::{Context, TypeRegistry, Value};

use crate::config::LoaderConfig;
use crate::error::LoadResult;
use crate::handle::ModuleHandle;

/// A pluggable loader backend: knows how to resolve, load, and discover
/// callable units of one specific module convention.
///
/// Construction is initialization — a [`LoaderFactory`] produces a fully
/// initialized backend (type registry populated, configured execution
/// paths applied) or an error. The registry wraps instances in the
/// Initialized → Destroyed state machine; implementations only provide the
/// per-state behavior.
pub trait Loader: Send {
    /// The backend tag this loader is routed under.
    fn tag(&self) -> &str;

    /// Human-readable backend name.
    fn name(&self) -> &str {
        self.tag()
    }

    /// Append a search root to the backend's execution paths. Duplicates
    /// are permitted; registration order decides resolution priority.
    fn execution_path(&mut self, path: &Path) -> LoadResult<()>;

    /// Resolve and load a list of paths. Individual resolution failures
    /// are tolerated; zero resolved paths is an overall failure and no
    /// handle is produced.
    fn load_from_file(&mut self, paths: &[PathBuf]) -> LoadResult<ModuleHandle>;

    /// Load a named in-memory buffer. Backend-defined; the default reports
    /// `Ok(None)` — "no notion of an anonymous in-memory unit here", an
    /// expected condition rather than a failure.
    fn load_from_memory(&mut self, name: &str, buffer: &[u8]) -> LoadResult<Option<ModuleHandle>> {
        let _ = (name, buffer);
        Ok(None)
    }

    /// Resolve and load a single packaged unit, with the same resolution
    /// rules as `load_from_file`.
    fn load_from_package(&mut self, path: &Path) -> LoadResult<ModuleHandle>;

    /// Populate the context's top-level scope with one function per
    /// resource in the handle. Idempotent per handle: re-discovery
    /// replaces prior bindings of the same names.
    fn discover(&self, handle: &ModuleHandle, ctx: &mut Context) -> LoadResult<()>;

    /// Release a handle. The default simply drops it; backends override
    /// when they keep per-handle state.
    fn clear(&mut self, handle: ModuleHandle) -> LoadResult<()> {
        drop(handle);
        Ok(())
    }

    /// Release backend state. Called exactly once by the registry, after
    /// any child loaders have been destroyed.
    fn destroy(&mut self) -> LoadResult<()> {
        Ok(())
    }

    /// The backend's exported type descriptors.
    fn type_registry(&self) -> &TypeRegistry;

    /// Introspection metadata; at least `tag` and `name`.
    fn metadata(&self) -> Value {
        Value::Map(vec![
            (Value::from("tag"), Value::from(self.tag())),
            (Value::from("name"), Value::from(self.name())),
        ])
    }

    /// Downcast support for backend-specific embedder APIs.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Factory producing an initialized backend from a configuration.
pub type LoaderFactory = Box<dyn Fn(&LoaderConfig) -> LoadResult<Box<dyn Loader>> + Send>;
