//! # polybridge-reflect
//!
//! The reflection core of Polybridge: the backend-agnostic model through
//! which callers see and invoke functions loaded from arbitrary module
//! conventions.
//!
//! This crate provides:
//! - A tagged [`Value`] type with a total cast matrix between primitive kinds
//! - Named [`Type`] descriptors and a per-backend [`TypeRegistry`]
//! - Ordered parameter/return [`Signature`]s
//! - [`Scope`]/[`Context`] namespaces populated by backend discovery
//! - [`Function`] objects dispatching through a per-backend
//!   [`FunctionInterface`], with single-resolution [`CallFuture`] completion
//!   for asynchronous backends
//!
//! Loader backends live in `polybridge-loader` and the `loaders/` crates;
//! this crate has no knowledge of any particular backend.

pub mod cast;
pub mod error;
pub mod function;
pub mod scope;
pub mod signature;
pub mod types;
pub mod value;

pub use error::{CastError, InvokeError, ReflectError, ReflectResult};
pub use function::{CallFuture, CallPromise, Function, FunctionImpl, FunctionInterface};
pub use scope::{Context, Scope, Symbol};
pub use signature::{Param, Signature};
pub use types::{Type, TypeRegistry};
pub use value::{OpaqueValue, Value, ValueKind};
