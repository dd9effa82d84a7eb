//! Resilience layer guarding upstream calls
//!
//! Every call to the upstream API goes through the circuit breaker: each
//! attempt runs under a deadline, failed invocations are retried a bounded
//! number of times, and once the upstream looks unhealthy the breaker fails
//! fast and serves the fallback instead of waiting on a dead endpoint.

pub mod breaker;

pub use breaker::{BreakerConfig, BreakerError, BreakerState, CircuitBreaker, Execution};
