//! # Repository Module
//!
//! Each repository owns the SQL for one table.
//!
//! - [`LocationRepository`](location::LocationRepository) - `courier_locations` upserts and lookups
//! - [`TokenCacheRepository`](token_cache::TokenCacheRepository) - `token_cache` slots with expiry

pub mod location;
pub mod token_cache;
