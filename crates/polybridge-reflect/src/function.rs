//! Function objects and the backend dispatch protocol.
//!
//! A [`Function`] pairs a name and signature with a backend-opaque
//! implementation and a [`FunctionInterface`] — the dispatch table. Every
//! function created by one backend instance shares a single interface
//! instance, mirroring the static-table behavior of C-style plugin systems
//! without any global state.
//!
//! Asynchronous completion is a single-resolution [`CallPromise`] /
//! [`CallFuture`] pair: `resolve` and `reject` consume the promise, so at
//! most one settlement can ever happen, and dropping an unsettled promise
//! surfaces as [`InvokeError::Abandoned`] on the future rather than a hang.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};

use tokio::sync::oneshot;

use crate::error::{InvokeError, ReflectResult};
use crate::signature::Signature;
use crate::value::Value;

/// Backend-opaque implementation state carried by a function.
///
/// Backends downcast through [`Function::impl_as`]; which concrete type a
/// backend stores is part of that backend's contract.
pub type FunctionImpl = Box<dyn Any + Send + Sync>;

/// The dispatch table a backend supplies for its functions.
///
/// One shared instance per backend kind; the defaults encode the optional
/// hooks: `create` accepts, `schedule` reports "no async support here", and
/// `destroy` is a no-op.
pub trait FunctionInterface: Send + Sync {
    /// One-time hook run while the function is being bound. Returning an
    /// error aborts the binding.
    fn create(&self, func: &Function) -> ReflectResult<()> {
        let _ = func;
        Ok(())
    }

    /// Synchronous call on the caller's thread.
    ///
    /// The error channel is out-of-band from the value channel: a null
    /// result is `Ok(Value::Null)`, a failed call is `Err`.
    fn invoke(&self, func: &Function, args: &[Value]) -> Result<Value, InvokeError>;

    /// Asynchronous call: schedule work and return a future immediately.
    ///
    /// `None` means the backend has no notion of asynchronous execution —
    /// an expected condition, not a failure — and neither side of the
    /// promise will ever fire.
    fn schedule(&self, func: &Function, args: Vec<Value>) -> Option<CallFuture> {
        let _ = (func, args);
        None
    }

    /// Release backend bookkeeping for a function. Runs on drop; must
    /// tolerate functions whose implementation carries no backend state.
    fn destroy(&self, func: &Function) {
        let _ = func;
    }
}

/// A named callable produced by backend discovery.
pub struct Function {
    name: String,
    signature: Arc<Signature>,
    implementation: FunctionImpl,
    interface: Arc<dyn FunctionInterface>,
}

impl Function {
    /// Bind a function: runs the interface's `create` hook and yields the
    /// shared handle. A rejected hook aborts the binding and the
    /// implementation is released.
    pub fn bind(
        name: impl Into<String>,
        signature: Arc<Signature>,
        implementation: FunctionImpl,
        interface: Arc<dyn FunctionInterface>,
    ) -> ReflectResult<Arc<Self>> {
        let func = Self {
            name: name.into(),
            signature,
            implementation,
            interface,
        };

        Arc::clone(&func.interface).create(&func)?;
        Ok(Arc::new(func))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &Arc<Signature> {
        &self.signature
    }

    /// Borrow the backend implementation as a concrete type.
    pub fn impl_as<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.implementation.downcast_ref()
    }

    fn check_arity(&self, got: usize) -> Result<(), InvokeError> {
        let expected = self.signature.param_count();
        if got == expected {
            Ok(())
        } else {
            Err(InvokeError::Arity { expected, got })
        }
    }

    /// Invoke synchronously on the calling thread.
    pub fn invoke(&self, args: &[Value]) -> Result<Value, InvokeError> {
        self.check_arity(args.len())?;
        Arc::clone(&self.interface).invoke(self, args)
    }

    /// Invoke asynchronously.
    ///
    /// Returns `None` when the backend cannot schedule asynchronous work;
    /// otherwise the future settles exactly once, possibly from another
    /// thread or the backend's own event loop.
    pub fn invoke_deferred(&self, args: Vec<Value>) -> Option<CallFuture> {
        if let Err(err) = self.check_arity(args.len()) {
            let (promise, future) = CallPromise::channel();
            promise.reject(err);
            return Some(future);
        }

        Arc::clone(&self.interface).schedule(self, args)
    }
}

impl Drop for Function {
    fn drop(&mut self) {
        Arc::clone(&self.interface).destroy(self);
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<function {}>", self.name)
    }
}

type CallOutcome = Result<Value, InvokeError>;

/// The settling half of an asynchronous call.
///
/// `resolve` and `reject` take the promise by value: settling twice is
/// unrepresentable, and dropping the promise unsettled is observable on the
/// future as [`InvokeError::Abandoned`].
pub struct CallPromise {
    tx: oneshot::Sender<CallOutcome>,
}

impl CallPromise {
    /// Create a connected promise/future pair.
    pub fn channel() -> (CallPromise, CallFuture) {
        let (tx, rx) = oneshot::channel();
        (CallPromise { tx }, CallFuture { rx })
    }

    /// Settle the call successfully.
    pub fn resolve(self, value: Value) {
        // A dropped future means nobody is waiting; nothing to do.
        let _ = self.tx.send(Ok(value));
    }

    /// Settle the call with a failure.
    pub fn reject(self, error: InvokeError) {
        let _ = self.tx.send(Err(error));
    }
}

/// The waiting half of an asynchronous call.
pub struct CallFuture {
    rx: oneshot::Receiver<CallOutcome>,
}

impl Future for CallFuture {
    type Output = CallOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(_)) => Poll::Ready(Err(InvokeError::Abandoned)),
            Poll::Pending => Poll::Pending,
        }
    }
}
