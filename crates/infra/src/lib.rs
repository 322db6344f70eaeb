//! Infrastructure adapters for the auth core: session caches, principal
//! stores, password hashing and seed data.
//!
//! Redis and Postgres adapters sit behind the `redis` and `postgres`
//! features; the in-memory adapters are always available and back dev
//! setups and tests.

pub mod credentials;
pub mod principal_store;
pub mod seed;
pub mod session_cache;

pub use credentials::{BcryptCredentials, HashError};
pub use principal_store::InMemoryPrincipalStore;
pub use seed::{SeedError, seed_defaults};
pub use session_cache::InMemorySessionCache;

#[cfg(feature = "postgres")]
pub use principal_store::PostgresPrincipalStore;
#[cfg(feature = "redis")]
pub use session_cache::RedisSessionCache;
