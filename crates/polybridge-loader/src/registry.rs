//! The loader registry: routing and lifecycle for backend instances.
//!
//! The registry is an explicit value owned by the embedder — there is no
//! ambient global. Backend factories are registered up front; instances
//! are created lazily on the first routed call (or eagerly through
//! [`LoaderRegistry::initialize`]), recorded in initialization order, and
//! destroyed child-first / reverse-initialization-order at shutdown.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use polybridge_reflect::{Context, Value};

use crate::backend::{Loader, LoaderFactory};
use crate::config::LoaderConfig;
use crate::error::{LoadError, LoadResult};
use crate::handle::ModuleHandle;
use crate::host::{HostLoader, HOST_TAG};

/// One live (or destroyed) backend instance plus its child edges.
struct LoaderInstance {
    /// `None` once destroyed; destruction is terminal.
    backend: Option<Box<dyn Loader>>,

    /// Tags of loaders this backend spawned; destroyed before the parent.
    children: Vec<String>,
}

/// Directory of active backend instances keyed by tag.
pub struct LoaderRegistry {
    factories: HashMap<String, LoaderFactory>,
    instances: HashMap<String, LoaderInstance>,
    init_order: Vec<String>,
}

impl LoaderRegistry {
    /// Create a registry with the host (proxy) backend factory installed
    /// under [`HOST_TAG`].
    pub fn new() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
            instances: HashMap::new(),
            init_order: Vec::new(),
        };

        registry.register_factory(HOST_TAG, |config| {
            HostLoader::initialize(config).map(|loader| Box::new(loader) as Box<dyn Loader>)
        });

        registry
    }

    /// Register a backend factory under a tag, replacing any previous
    /// factory for that tag. Live instances are unaffected.
    pub fn register_factory<F>(&mut self, tag: &str, factory: F)
    where
        F: Fn(&LoaderConfig) -> LoadResult<Box<dyn Loader>> + Send + 'static,
    {
        self.factories.insert(tag.to_string(), Box::new(factory));
    }

    /// Eagerly initialize a backend with an explicit configuration.
    pub fn initialize(&mut self, tag: &str, config: &LoaderConfig) -> LoadResult<()> {
        if let Some(instance) = self.instances.get(tag) {
            return Err(if instance.backend.is_some() {
                LoadError::AlreadyInitialized(tag.to_string())
            } else {
                LoadError::Destroyed(tag.to_string())
            });
        }

        let factory = self
            .factories
            .get(tag)
            .ok_or_else(|| LoadError::UnknownTag(tag.to_string()))?;
        let backend = factory(config)?;

        info!("Initialized loader backend '{}'", tag);
        self.instances.insert(
            tag.to_string(),
            LoaderInstance {
                backend: Some(backend),
                children: Vec::new(),
            },
        );
        self.init_order.push(tag.to_string());
        Ok(())
    }

    fn ensure_initialized(&mut self, tag: &str) -> LoadResult<()> {
        match self.instances.get(tag) {
            Some(instance) if instance.backend.is_some() => Ok(()),
            Some(_) => Err(LoadError::Destroyed(tag.to_string())),
            None => self.initialize(tag, &LoaderConfig::default()),
        }
    }

    fn backend_mut(&mut self, tag: &str) -> LoadResult<&mut Box<dyn Loader>> {
        self.ensure_initialized(tag)?;
        let instance = self
            .instances
            .get_mut(tag)
            .ok_or_else(|| LoadError::UnknownTag(tag.to_string()))?;
        instance
            .backend
            .as_mut()
            .ok_or_else(|| LoadError::Destroyed(tag.to_string()))
    }

    /// Whether the tag has a live instance.
    pub fn is_initialized(&self, tag: &str) -> bool {
        self.instances
            .get(tag)
            .map(|i| i.backend.is_some())
            .unwrap_or(false)
    }

    /// Whether the tag's instance has been destroyed.
    pub fn is_destroyed(&self, tag: &str) -> bool {
        self.instances
            .get(tag)
            .map(|i| i.backend.is_none())
            .unwrap_or(false)
    }

    /// Tags with live instances, in initialization order.
    pub fn tags(&self) -> Vec<&str> {
        self.init_order
            .iter()
            .filter(|tag| self.is_initialized(tag))
            .map(|s| s.as_str())
            .collect()
    }

    // ----- routed operations -------------------------------------------------

    /// Append an execution path to a backend's search list.
    pub fn execution_path(&mut self, tag: &str, path: &Path) -> LoadResult<()> {
        self.backend_mut(tag)?.execution_path(path)
    }

    /// Load a list of paths through a backend.
    pub fn load_from_file(&mut self, tag: &str, paths: &[PathBuf]) -> LoadResult<ModuleHandle> {
        self.backend_mut(tag)?.load_from_file(paths)
    }

    /// Load a named in-memory buffer through a backend.
    pub fn load_from_memory(
        &mut self,
        tag: &str,
        name: &str,
        buffer: &[u8],
    ) -> LoadResult<Option<ModuleHandle>> {
        self.backend_mut(tag)?.load_from_memory(name, buffer)
    }

    /// Load a single packaged unit through a backend.
    pub fn load_from_package(&mut self, tag: &str, path: &Path) -> LoadResult<ModuleHandle> {
        self.backend_mut(tag)?.load_from_package(path)
    }

    /// Discover a handle into a context; routed by the handle's tag.
    pub fn discover(&mut self, handle: &ModuleHandle, ctx: &mut Context) -> LoadResult<()> {
        let tag = handle.tag().to_string();
        self.backend_mut(&tag)?.discover(handle, ctx)
    }

    /// Release a handle; routed by the handle's tag.
    pub fn clear(&mut self, handle: ModuleHandle) -> LoadResult<()> {
        let tag = handle.tag().to_string();
        self.backend_mut(&tag)?.clear(handle)
    }

    // ----- lifecycle ---------------------------------------------------------

    /// Record that `parent` spawned `child`, so the child is destroyed
    /// first when the parent goes down. Both must be live.
    pub fn register_child(&mut self, parent: &str, child: &str) -> LoadResult<()> {
        if parent == child {
            return Err(LoadError::InvalidConfig(format!(
                "loader '{}' cannot be its own child",
                parent
            )));
        }
        if !self.is_initialized(child) {
            return Err(LoadError::UnknownTag(child.to_string()));
        }

        let instance = self
            .instances
            .get_mut(parent)
            .filter(|i| i.backend.is_some())
            .ok_or_else(|| LoadError::UnknownTag(parent.to_string()))?;
        instance.children.push(child.to_string());
        Ok(())
    }

    /// Destroy a backend instance: children first, then the backend
    /// itself. Terminal — subsequent operations on the tag are rejected.
    pub fn destroy(&mut self, tag: &str) -> LoadResult<()> {
        let instance = self
            .instances
            .get(tag)
            .ok_or_else(|| LoadError::UnknownTag(tag.to_string()))?;
        if instance.backend.is_none() {
            return Err(LoadError::Destroyed(tag.to_string()));
        }

        let children = instance.children.clone();
        for child in children {
            match self.destroy(&child) {
                Ok(()) => {}
                // A child shared between parents may already be gone.
                Err(LoadError::Destroyed(_)) | Err(LoadError::UnknownTag(_)) => {}
                Err(err) => return Err(err),
            }
        }

        let instance = self
            .instances
            .get_mut(tag)
            .ok_or_else(|| LoadError::UnknownTag(tag.to_string()))?;
        if let Some(mut backend) = instance.backend.take() {
            backend.destroy()?;
            info!("Destroyed loader backend '{}'", tag);
        }
        Ok(())
    }

    /// Destroy every remaining instance in reverse initialization order.
    /// Idempotent; runs from `Drop` as well.
    pub fn shutdown(&mut self) {
        let order: Vec<String> = self.init_order.iter().rev().cloned().collect();
        for tag in order {
            if self.is_initialized(&tag) {
                if let Err(err) = self.destroy(&tag) {
                    warn!("Failed to destroy loader '{}': {}", tag, err);
                }
            }
        }
    }

    // ----- host access -------------------------------------------------------

    /// The host (proxy) backend, initialized on first access.
    pub fn host_mut(&mut self) -> LoadResult<&mut HostLoader> {
        self.backend_mut(HOST_TAG)?
            .as_any_mut()
            .downcast_mut::<HostLoader>()
            .ok_or_else(|| {
                LoadError::Initialization("host tag is bound to a foreign backend".to_string())
            })
    }

    // ----- introspection -----------------------------------------------------

    /// Aggregated metadata of all live instances, keyed by tag.
    pub fn metadata(&self) -> Value {
        let pairs = self
            .init_order
            .iter()
            .filter_map(|tag| {
                let instance = self.instances.get(tag)?;
                let backend = instance.backend.as_ref()?;
                Some((Value::from(tag.as_str()), backend.metadata()))
            })
            .collect();
        Value::Map(pairs)
    }
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LoaderRegistry {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polybridge_reflect::{TypeRegistry, ValueKind};
    use std::any::Any;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Minimal backend that counts destroys through a shared counter.
    struct CountingLoader {
        tag: String,
        types: TypeRegistry,
        destroyed: Arc<AtomicUsize>,
    }

    impl CountingLoader {
        fn factory(tag: &str, destroyed: Arc<AtomicUsize>) -> impl Fn(&LoaderConfig) -> LoadResult<Box<dyn Loader>> + Send + 'static
        {
            let tag = tag.to_string();
            move |_config| {
                Ok(Box::new(CountingLoader {
                    tag: tag.clone(),
                    types: TypeRegistry::new(),
                    destroyed: Arc::clone(&destroyed),
                }) as Box<dyn Loader>)
            }
        }
    }

    impl Loader for CountingLoader {
        fn tag(&self) -> &str {
            &self.tag
        }

        fn execution_path(&mut self, _path: &Path) -> LoadResult<()> {
            Ok(())
        }

        fn load_from_file(&mut self, paths: &[PathBuf]) -> LoadResult<ModuleHandle> {
            let resources = paths
                .iter()
                .map(crate::handle::ResourceDescriptor::new)
                .collect();
            ModuleHandle::new(self.tag.clone(), resources).ok_or(LoadError::NoneResolved {
                requested: paths.len(),
            })
        }

        fn load_from_package(&mut self, path: &Path) -> LoadResult<ModuleHandle> {
            self.load_from_file(std::slice::from_ref(&path.to_path_buf()))
        }

        fn discover(&self, _handle: &ModuleHandle, _ctx: &mut Context) -> LoadResult<()> {
            Ok(())
        }

        fn destroy(&mut self) -> LoadResult<()> {
            self.destroyed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn type_registry(&self) -> &TypeRegistry {
            &self.types
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn registry_with(tags: &[&str], destroyed: &Arc<AtomicUsize>) -> LoaderRegistry {
        let mut registry = LoaderRegistry::new();
        for tag in tags {
            registry.register_factory(tag, CountingLoader::factory(tag, Arc::clone(destroyed)));
        }
        registry
    }

    #[test]
    fn test_lazy_initialization_on_first_routed_call() {
        let destroyed = Arc::new(AtomicUsize::new(0));
        let mut registry = registry_with(&["test"], &destroyed);

        assert!(!registry.is_initialized("test"));
        registry
            .execution_path("test", Path::new("anywhere"))
            .unwrap();
        assert!(registry.is_initialized("test"));
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        let mut registry = LoaderRegistry::new();
        assert!(matches!(
            registry.load_from_file("nope", &[PathBuf::from("x")]),
            Err(LoadError::UnknownTag(tag)) if tag == "nope"
        ));
    }

    #[test]
    fn test_double_initialize_is_rejected() {
        let destroyed = Arc::new(AtomicUsize::new(0));
        let mut registry = registry_with(&["test"], &destroyed);

        registry.initialize("test", &LoaderConfig::default()).unwrap();
        assert!(matches!(
            registry.initialize("test", &LoaderConfig::default()),
            Err(LoadError::AlreadyInitialized(_))
        ));
    }

    #[test]
    fn test_destroy_is_terminal() {
        let destroyed = Arc::new(AtomicUsize::new(0));
        let mut registry = registry_with(&["test"], &destroyed);

        registry.initialize("test", &LoaderConfig::default()).unwrap();
        registry.destroy("test").unwrap();
        assert!(registry.is_destroyed("test"));
        assert_eq!(destroyed.load(Ordering::SeqCst), 1);

        // Every further operation is rejected, including re-initialization.
        assert!(matches!(
            registry.load_from_file("test", &[PathBuf::from("x")]),
            Err(LoadError::Destroyed(_))
        ));
        assert!(matches!(
            registry.initialize("test", &LoaderConfig::default()),
            Err(LoadError::Destroyed(_))
        ));
        assert!(matches!(
            registry.destroy("test"),
            Err(LoadError::Destroyed(_))
        ));
    }

    #[test]
    fn test_children_are_destroyed_before_the_parent() {
        let destroyed = Arc::new(AtomicUsize::new(0));
        let mut registry = registry_with(&["parent", "child"], &destroyed);

        registry.initialize("parent", &LoaderConfig::default()).unwrap();
        registry.initialize("child", &LoaderConfig::default()).unwrap();
        registry.register_child("parent", "child").unwrap();

        registry.destroy("parent").unwrap();

        assert!(registry.is_destroyed("child"));
        assert!(registry.is_destroyed("parent"));
        assert_eq!(destroyed.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_register_child_validations() {
        let destroyed = Arc::new(AtomicUsize::new(0));
        let mut registry = registry_with(&["a", "b"], &destroyed);
        registry.initialize("a", &LoaderConfig::default()).unwrap();

        assert!(registry.register_child("a", "a").is_err());
        // Child not initialized yet.
        assert!(matches!(
            registry.register_child("a", "b"),
            Err(LoadError::UnknownTag(_))
        ));

        registry.initialize("b", &LoaderConfig::default()).unwrap();
        registry.register_child("a", "b").unwrap();
    }

    #[test]
    fn test_shutdown_runs_in_reverse_initialization_order() {
        let destroyed = Arc::new(AtomicUsize::new(0));
        let mut registry = registry_with(&["first", "second"], &destroyed);

        registry.initialize("first", &LoaderConfig::default()).unwrap();
        registry.initialize("second", &LoaderConfig::default()).unwrap();

        registry.shutdown();
        assert!(registry.is_destroyed("first"));
        assert!(registry.is_destroyed("second"));
        assert_eq!(destroyed.load(Ordering::SeqCst), 2);

        // Idempotent.
        registry.shutdown();
        assert_eq!(destroyed.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_clear_routes_by_handle_tag() {
        let destroyed = Arc::new(AtomicUsize::new(0));
        let mut registry = registry_with(&["test"], &destroyed);

        let handle = registry
            .load_from_file("test", &[PathBuf::from("unit.dat")])
            .unwrap();
        assert_eq!(handle.tag(), "test");
        registry.clear(handle).unwrap();
    }

    #[test]
    fn test_host_backend_is_available() {
        let mut registry = LoaderRegistry::new();
        let host = registry.host_mut().unwrap();
        host.register_function("ping", &[], Some(ValueKind::Str), |_| {
            Ok(polybridge_reflect::Value::from("pong"))
        })
        .unwrap();

        let func = registry.host_mut().unwrap().function("ping").unwrap();
        assert_eq!(
            func.invoke(&[]).unwrap(),
            polybridge_reflect::Value::from("pong")
        );
    }

    #[test]
    fn test_metadata_aggregates_live_backends() {
        let destroyed = Arc::new(AtomicUsize::new(0));
        let mut registry = registry_with(&["test"], &destroyed);
        registry.initialize("test", &LoaderConfig::default()).unwrap();
        registry.host_mut().unwrap();

        let metadata = registry.metadata();
        let backend = metadata.map_get("test").unwrap();
        assert_eq!(
            backend.map_get("tag"),
            Some(&polybridge_reflect::Value::from("test"))
        );
        assert!(metadata.map_get(HOST_TAG).is_some());

        registry.destroy("test").unwrap();
        assert!(registry.metadata().map_get("test").is_none());
    }
}
