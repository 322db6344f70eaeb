//! [`PrincipalStore`](gotham_auth::PrincipalStore) and
//! [`PrincipalDirectory`](gotham_auth::PrincipalDirectory) adapters.

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use in_memory::InMemoryPrincipalStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresPrincipalStore;
