//! In-memory synchronization cache for gateway reads.
//!
//! This module provides `SyncCache`, which sits between the console and the
//! resource gateways. Entries are keyed by resource plus filter parameters
//! and served locally for five minutes by default.
//!
//! - `keys`: `CacheKey` and the `Resource` prefixes used for invalidation
//! - `invalidation`: the static table of which writes drop which prefixes
//! - `manager`: the cache itself (coalescing, freshness, mutation commits)

pub mod invalidation;
pub mod keys;
pub mod manager;

pub use invalidation::{Mutation, MutationKind};
pub use keys::{CacheKey, Resource};
pub use manager::{CachedValue, EntryInfo, SyncCache, DEFAULT_FRESHNESS};
