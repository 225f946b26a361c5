//! Delegating proxies: interface implementations whose every method is
//! forwarded to one [`CallHandler`].

pub mod builder;
pub mod handler;
pub mod hooks;

pub use builder::DelegatingProxyBuilder;
pub use handler::CallHandler;
pub use hooks::DelegatingHooks;
