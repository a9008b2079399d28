//! # polybridge-loader
//!
//! The loader half of Polybridge: pluggable backends that resolve, load,
//! and discover callable units of one specific module convention, routed
//! through a registry the embedder owns.
//!
//! This crate provides:
//! - The [`Loader`] backend contract and its factory registration
//! - Module handles holding resolved resource descriptors
//! - The execution-path resolution algorithm shared by path-based backends
//! - Loader configuration parsing (TOML or JSON)
//! - The [`LoaderRegistry`] with per-backend lifecycle and teardown ordering
//! - The host (proxy) backend for callbacks into the embedding process
//!
//! ## Lifecycle
//!
//! A backend goes Uninitialized → Initialized → Destroyed. Construction is
//! initialization: factories produce a fully initialized backend or an
//! error, so partially initialized state never escapes. Destruction is
//! terminal; the registry rejects every operation on a destroyed backend
//! and always unloads child loaders before their parent.

pub mod backend;
pub mod config;
pub mod error;
pub mod handle;
pub mod host;
pub mod registry;
pub mod resolve;

pub use backend::{Loader, LoaderFactory};
pub use config::LoaderConfig;
pub use error::{LoadError, LoadResult};
pub use handle::{ModuleHandle, ResourceDescriptor};
pub use host::{AsyncHostHandler, HostLoader, HOST_TAG};
pub use registry::LoaderRegistry;
pub use resolve::PathResolver;
