//! Resilience primitives wrapped around outbound vendor calls
//!
//! - [`CircuitBreaker`] guards every outbound call of one adapter
//! - [`with_retry`] absorbs transient failures during connection setup only

pub mod circuit_breaker;
pub mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use retry::{with_retry, RetryPolicy};
