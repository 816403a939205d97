//! Preload bridge between an untrusted page and the privileged browser host.
//!
//! The [`relay`] forwards whitelisted page messages to the host and republishes
//! host events into the page; the [`page_api`] is the in-page surface built on
//! top of it. Transports are injected through the traits in [`transport`].
pub mod config;
pub mod contract;
pub mod jsonrpc;
pub mod logging;
pub mod page_api;
pub mod relay;
pub mod runtime_paths;
pub mod stdio_host;
pub mod transport;

#[cfg(test)]
mod testing;
