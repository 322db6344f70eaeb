//! [`SessionCache`](gotham_auth::SessionCache) adapters.

pub mod in_memory;
#[cfg(feature = "redis")]
pub mod redis;

pub use in_memory::InMemorySessionCache;
#[cfg(feature = "redis")]
pub use redis::RedisSessionCache;
