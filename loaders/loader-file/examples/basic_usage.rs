//! Basic usage example for the file loader backend
//!
//! Run with: cargo run --package loader-file --example basic_usage

use loader_file::{FileLoader, FILE_TAG};
use polybridge_loader::{Loader, LoaderRegistry};
use polybridge_reflect::{Context, Value, ValueKind};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .init();

    // Stage a couple of module files to discover.
    let dir = tempfile::TempDir::new()?;
    std::fs::write(dir.path().join("greeting.dat"), b"hello")?;
    std::fs::create_dir_all(dir.path().join("jobs"))?;
    std::fs::write(dir.path().join("jobs/nightly.dat"), b"job")?;

    // One registry per embedder; the file backend registered by tag.
    let mut registry = LoaderRegistry::new();
    registry.register_factory(FILE_TAG, |config| {
        FileLoader::initialize(config).map(|l| Box::new(l) as Box<dyn Loader>)
    });
    registry.execution_path(FILE_TAG, dir.path())?;

    // Load two relative paths; both resolve under the execution path.
    let handle = registry.load_from_file(
        FILE_TAG,
        &[
            PathBuf::from("greeting.dat"),
            PathBuf::from("jobs/nightly.dat"),
        ],
    )?;
    println!("Loaded handle {} with {} resources", handle.id(), handle.resource_count());

    // Discover relative to the staging directory and call everything.
    let mut ctx = Context::with_script_root(dir.path());
    registry.discover(&handle, &mut ctx)?;

    for name in ctx.scope().names() {
        if let Some(func) = ctx.scope().resolve_function(name) {
            println!("  {} -> {}", name, func.invoke(&[])?);
        }
    }

    // The host proxy exposes native callables through the same machinery.
    let host = registry.host_mut()?;
    host.register_function("shout", &[ValueKind::Str], Some(ValueKind::Str), |args| {
        let text = args[0].clone().cast(ValueKind::Str)?;
        Ok(Value::Str(format!("{}!", text)))
    })?;
    registry.host_mut()?.publish(&mut ctx);

    let shout = ctx
        .scope()
        .resolve_function("shout")
        .expect("just registered");
    println!("host says: {}", shout.invoke(&[Value::from("polybridge")])?);

    registry.clear(handle)?;
    registry.shutdown();
    Ok(())
}
