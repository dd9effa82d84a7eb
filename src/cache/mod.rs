//! Bounded in-memory cache for APOD records
//!
//! Provides an [`ApodCache`] keyed by date string with write-once semantics
//! and FIFO eviction, so repeated lookups for an already-fetched date never
//! touch the network.

pub mod store;

pub use store::ApodCache;
