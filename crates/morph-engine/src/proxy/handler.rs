//! The generic call handler behind delegating proxies.

use crate::descriptor::{MethodDescriptor, TypeDescriptor};
use crate::error::MorphResult;
use crate::vm::Value;

/// Receives every call made on a delegating proxy.
///
/// `iface` is the interface the proxy was built for, `method` the descriptor
/// of the invoked method and `args` the arguments in declaration order. For
/// non-void methods the returned value must conform to the declared return
/// type or the invocation fails with `InvalidResultType`.
///
/// Closures with the matching signature implement this trait:
///
/// ```ignore
/// let handler = |_: &TypeDescriptor, m: &MethodDescriptor, _: &[Value]| {
///     Ok(Value::from(m.name.clone()))
/// };
/// ```
pub trait CallHandler: Send + Sync {
    /// Handle one invocation of `method` on a proxy for `iface`.
    fn call(&self, iface: &TypeDescriptor, method: &MethodDescriptor, args: &[Value]) -> MorphResult<Value>;
}

impl<F> CallHandler for F
where
    F: Fn(&TypeDescriptor, &MethodDescriptor, &[Value]) -> MorphResult<Value> + Send + Sync,
{
    fn call(&self, iface: &TypeDescriptor, method: &MethodDescriptor, args: &[Value]) -> MorphResult<Value> {
        self(iface, method, args)
    }
}
