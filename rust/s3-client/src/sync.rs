//! Cross-target bound compatibility
//!
//! Executors are shared across tasks on native targets, which requires
//! `Send + Sync`. On `wasm32-unknown-unknown` everything runs on one thread,
//! so the trait represents no bound at all.

#[allow(missing_docs)]
#[cfg(not(target_arch = "wasm32"))]
pub trait ConditionalSync: Send + Sync {}

#[cfg(not(target_arch = "wasm32"))]
impl<S> ConditionalSync for S where S: Send + Sync {}

#[allow(missing_docs)]
#[cfg(target_arch = "wasm32")]
pub trait ConditionalSync {}

#[cfg(target_arch = "wasm32")]
impl<S> ConditionalSync for S {}
