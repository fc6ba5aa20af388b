//! Caching subsystem.
//!
//! A single content-addressed cache: [`response::ResponseCache`], an
//! LRU + TTL store of accepted analysis responses keyed on the hash of
//! the normalized request text. The orchestrator consults it after the
//! rate check and before any provider attempt; a hit short-circuits the
//! whole fallback chain.

pub mod response;

pub use response::{CacheConfig, CacheStats, ResponseCache, cache_key};
