//! # loader-file
//!
//! The file-path backend: the simplest instance of the Polybridge loader
//! contract. It does not interpret file contents at all — a "module" is a
//! set of paths that exist, and every discovered function returns its own
//! resolved path as a string.
//!
//! Useful on its own for exposing static assets through the bridge, and as
//! the reference implementation of the resolution and discovery contract.

use std::any::Any;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use polybridge_loader::{
    Loader, LoaderConfig, LoaderFactory, LoadError, LoadResult, ModuleHandle, PathResolver,
    ResourceDescriptor,
};
use polybridge_reflect::{
    Context, Function, FunctionInterface, InvokeError, Signature, Type, TypeRegistry, Value,
    ValueKind,
};

/// Tag the file backend is routed under.
pub const FILE_TAG: &str = "file";

/// Name of the resource type discovered functions return.
const PATH_TYPE: &str = "Path";

/// Implementation payload of a discovered file function: the resolved
/// resource it stands for.
struct FileFunctionImpl {
    descriptor: ResourceDescriptor,
}

/// Dispatch table shared by every file function.
///
/// Invocation returns the resolved path; asynchronous invocation is not a
/// notion this backend has, so scheduling reports unsupported.
struct FileFunctionInterface;

impl FunctionInterface for FileFunctionInterface {
    fn invoke(&self, func: &Function, _args: &[Value]) -> Result<Value, InvokeError> {
        let imp = func
            .impl_as::<FileFunctionImpl>()
            .ok_or_else(|| InvokeError::Failed("file function lost its descriptor".to_string()))?;

        Ok(Value::Str(
            imp.descriptor.path().to_string_lossy().into_owned(),
        ))
    }
}

/// The file-path loader backend.
pub struct FileLoader {
    name: String,
    resolver: PathResolver,
    types: TypeRegistry,
    path_type: Arc<Type>,
    interface: Arc<FileFunctionInterface>,
}

impl FileLoader {
    /// Initialize the backend: declare the "Path" type and apply the
    /// configured execution paths.
    pub fn initialize(config: &LoaderConfig) -> LoadResult<Self> {
        let mut types = TypeRegistry::new();
        let path_type = types.define(Type::new(ValueKind::Str, PATH_TYPE))?;

        let mut resolver = PathResolver::new();
        for path in &config.execution_paths {
            resolver.register(path);
        }

        Ok(Self {
            name: config
                .name
                .clone()
                .unwrap_or_else(|| "File Loader".to_string()),
            resolver,
            types,
            path_type,
            interface: Arc::new(FileFunctionInterface),
        })
    }

    /// A boxed factory for registry registration.
    pub fn factory() -> LoaderFactory {
        Box::new(|config| {
            FileLoader::initialize(config).map(|loader| Box::new(loader) as Box<dyn Loader>)
        })
    }

    fn load_resolved(&self, paths: &[PathBuf]) -> LoadResult<ModuleHandle> {
        let resources = self.resolver.resolve_all(paths);
        ModuleHandle::new(FILE_TAG, resources).ok_or(LoadError::NoneResolved {
            requested: paths.len(),
        })
    }
}

impl Loader for FileLoader {
    fn tag(&self) -> &str {
        FILE_TAG
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn execution_path(&mut self, path: &Path) -> LoadResult<()> {
        self.resolver.register(path);
        Ok(())
    }

    fn load_from_file(&mut self, paths: &[PathBuf]) -> LoadResult<ModuleHandle> {
        self.load_resolved(paths)
    }

    // load_from_memory keeps the trait default: this backend only handles
    // paths, an anonymous in-memory unit has no meaning here.

    fn load_from_package(&mut self, path: &Path) -> LoadResult<ModuleHandle> {
        self.load_resolved(std::slice::from_ref(&path.to_path_buf()))
    }

    fn discover(&self, handle: &ModuleHandle, ctx: &mut Context) -> LoadResult<()> {
        debug!("File module {} discovering", handle.id());

        for resource in handle.resources() {
            let name = resource.display_name(ctx.script_root());

            let func = Function::bind(
                name.clone(),
                Signature::new()
                    .with_return(Arc::clone(&self.path_type))
                    .freeze(),
                Box::new(FileFunctionImpl {
                    descriptor: resource.clone(),
                }),
                Arc::clone(&self.interface) as Arc<dyn FunctionInterface>,
            )?;

            ctx.scope_mut().define_function(name, func);
        }

        Ok(())
    }

    fn type_registry(&self) -> &TypeRegistry {
        &self.types
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"contents").unwrap();
        path
    }

    fn loader_with_roots(roots: &[&Path]) -> FileLoader {
        let mut config = LoaderConfig::default();
        for root in roots {
            config = config.with_execution_path(*root);
        }
        FileLoader::initialize(&config).unwrap()
    }

    #[test]
    fn test_initialize_declares_the_path_type() {
        let loader = loader_with_roots(&[]);
        let ty = loader.type_registry().resolve(PATH_TYPE).unwrap();
        assert_eq!(ty.kind(), ValueKind::Str);
    }

    #[test]
    fn test_first_execution_path_wins() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        touch(a.path(), "shared.dat");
        touch(b.path(), "shared.dat");

        let mut loader = loader_with_roots(&[a.path(), b.path()]);
        let handle = loader
            .load_from_file(&[PathBuf::from("shared.dat")])
            .unwrap();

        assert_eq!(handle.resource_count(), 1);
        assert_eq!(
            handle.resources()[0].path(),
            a.path().join("shared.dat")
        );
    }

    #[test]
    fn test_later_path_used_when_earlier_misses() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        touch(b.path(), "only-b.dat");

        let mut loader = loader_with_roots(&[a.path(), b.path()]);
        let handle = loader
            .load_from_file(&[PathBuf::from("only-b.dat")])
            .unwrap();

        assert_eq!(
            handle.resources()[0].path(),
            b.path().join("only-b.dat")
        );
    }

    #[test]
    fn test_partial_resolution_yields_partial_handle() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "present.dat");

        let mut loader = loader_with_roots(&[dir.path()]);
        let handle = loader
            .load_from_file(&[
                PathBuf::from("missing-one.dat"),
                PathBuf::from("present.dat"),
                PathBuf::from("missing-two.dat"),
            ])
            .unwrap();

        assert_eq!(handle.resource_count(), 1);
    }

    #[test]
    fn test_zero_resolution_is_an_error() {
        let dir = TempDir::new().unwrap();
        let mut loader = loader_with_roots(&[dir.path()]);

        let result = loader.load_from_file(&[
            PathBuf::from("missing-one.dat"),
            PathBuf::from("missing-two.dat"),
            PathBuf::from("missing-three.dat"),
        ]);

        assert!(matches!(
            result,
            Err(LoadError::NoneResolved { requested: 3 })
        ));
    }

    #[test]
    fn test_load_from_package_resolves_one_path() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "bundle.pkg");

        let mut loader = loader_with_roots(&[dir.path()]);
        let handle = loader.load_from_package(Path::new("bundle.pkg")).unwrap();
        assert_eq!(handle.resource_count(), 1);
    }

    #[test]
    fn test_load_from_memory_is_unsupported() {
        let mut loader = loader_with_roots(&[]);
        assert!(matches!(
            loader.load_from_memory("unit", b"bytes"),
            Ok(None)
        ));
    }

    #[test]
    fn test_discovered_function_returns_its_path() {
        let dir = TempDir::new().unwrap();
        let target = touch(dir.path(), "module.dat");

        let mut loader = loader_with_roots(&[dir.path()]);
        let handle = loader
            .load_from_file(&[PathBuf::from("module.dat")])
            .unwrap();

        let mut ctx = Context::new();
        loader.discover(&handle, &mut ctx).unwrap();

        let name = target.to_string_lossy().into_owned();
        let func = ctx.scope().resolve_function(&name).unwrap();

        assert_eq!(func.invoke(&[]).unwrap(), Value::Str(name));
        assert_eq!(
            func.signature().ret().unwrap().name(),
            PATH_TYPE
        );
    }

    #[test]
    fn test_discovery_names_are_relative_to_script_root() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "jobs/nightly.dat");

        let mut loader = loader_with_roots(&[dir.path()]);
        let handle = loader
            .load_from_file(&[PathBuf::from("jobs/nightly.dat")])
            .unwrap();

        let mut ctx = Context::with_script_root(dir.path());
        loader.discover(&handle, &mut ctx).unwrap();

        assert!(ctx.scope().resolve_function("jobs/nightly.dat").is_some());
    }

    #[test]
    fn test_rediscovery_replaces_bindings() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "once.dat");

        let mut loader = loader_with_roots(&[dir.path()]);
        let handle = loader.load_from_file(&[PathBuf::from("once.dat")]).unwrap();

        let mut ctx = Context::with_script_root(dir.path());
        loader.discover(&handle, &mut ctx).unwrap();
        loader.discover(&handle, &mut ctx).unwrap();

        assert_eq!(ctx.scope().count(), 1);
    }

    #[test]
    fn test_deferred_invocation_is_unsupported() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "sync-only.dat");

        let mut loader = loader_with_roots(&[dir.path()]);
        let handle = loader
            .load_from_file(&[PathBuf::from("sync-only.dat")])
            .unwrap();

        let mut ctx = Context::with_script_root(dir.path());
        loader.discover(&handle, &mut ctx).unwrap();

        let func = ctx.scope().resolve_function("sync-only.dat").unwrap();
        assert!(func.invoke_deferred(vec![]).is_none());
    }
}
