//! Service wiring: session cache, principal store, credentials and the auth
//! core built on top of them.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use gotham_auth::{
    AuthorizationResolver, CacheError, PrincipalDirectory, PrincipalStore, SessionCache,
    SessionConfig, SessionManager, SigningSecret, StoreError, TokenCodec,
};
use gotham_infra::{
    BcryptCredentials, InMemoryPrincipalStore, InMemorySessionCache, SeedError, seed_defaults,
};

#[cfg(feature = "postgres")]
use gotham_infra::PostgresPrincipalStore;
#[cfg(feature = "redis")]
use gotham_infra::RedisSessionCache;

use crate::config::ApiConfig;

#[derive(Debug, Error)]
pub enum ServicesError {
    #[error("session cache unavailable: {0}")]
    Cache(#[from] CacheError),

    #[error("principal store unavailable: {0}")]
    Store(#[from] StoreError),

    #[error("seeding failed: {0}")]
    Seed(#[from] SeedError),
}

/// Everything a handler needs, shared behind an `Arc`.
pub struct AppServices {
    pub sessions: Arc<SessionManager>,
    pub resolver: Arc<AuthorizationResolver>,
    pub directory: Arc<dyn PrincipalDirectory>,
    pub credentials: BcryptCredentials,
}

impl AppServices {
    pub fn new(
        secret: &SigningSecret,
        session: SessionConfig,
        cache: Arc<dyn SessionCache>,
        principals: Arc<dyn PrincipalStore>,
        directory: Arc<dyn PrincipalDirectory>,
        credentials: BcryptCredentials,
    ) -> Self {
        let sessions = Arc::new(SessionManager::new(
            TokenCodec::new(secret),
            cache,
            principals.clone(),
            Arc::new(credentials.clone()),
            session,
        ));
        let resolver = Arc::new(AuthorizationResolver::new(sessions.clone(), principals));

        Self {
            sessions,
            resolver,
            directory,
            credentials,
        }
    }
}

/// Build services from configuration.
///
/// Redis and Postgres are used when their URL is configured and the matching
/// feature is compiled in; otherwise the in-memory adapters are used.
pub async fn build_services(config: &ApiConfig) -> Result<AppServices, ServicesError> {
    let credentials = BcryptCredentials::new(config.bcrypt_cost);

    let cache: Arc<dyn SessionCache> = match config.redis_url.as_deref() {
        #[cfg(feature = "redis")]
        Some(url) => {
            info!("using redis session cache");
            Arc::new(RedisSessionCache::connect(url).await?)
        }
        #[cfg(not(feature = "redis"))]
        Some(_) => {
            warn!("REDIS_URL is set but the redis feature is disabled; using in-memory session cache");
            Arc::new(InMemorySessionCache::new())
        }
        None => {
            info!("using in-memory session cache");
            Arc::new(InMemorySessionCache::new())
        }
    };

    let (principals, directory): (Arc<dyn PrincipalStore>, Arc<dyn PrincipalDirectory>) =
        match config.database_url.as_deref() {
            #[cfg(feature = "postgres")]
            Some(url) => {
                info!("using postgres principal store");
                as_store_pair(Arc::new(PostgresPrincipalStore::connect(url).await?))
            }
            #[cfg(not(feature = "postgres"))]
            Some(_) => {
                warn!("DATABASE_URL is set but the postgres feature is disabled; using seeded in-memory store");
                as_store_pair(seeded_store(&credentials, &config.admin_password).await?)
            }
            None => {
                info!("using seeded in-memory principal store");
                as_store_pair(seeded_store(&credentials, &config.admin_password).await?)
            }
        };

    Ok(AppServices::new(
        &config.signing_secret,
        config.session,
        cache,
        principals,
        directory,
        credentials,
    ))
}

fn as_store_pair<S>(store: Arc<S>) -> (Arc<dyn PrincipalStore>, Arc<dyn PrincipalDirectory>)
where
    S: PrincipalStore + PrincipalDirectory + 'static,
{
    (store.clone(), store)
}

async fn seeded_store(
    credentials: &BcryptCredentials,
    admin_password: &str,
) -> Result<Arc<InMemoryPrincipalStore>, SeedError> {
    let store = Arc::new(InMemoryPrincipalStore::new());
    seed_defaults(&store, credentials, admin_password).await?;
    Ok(store)
}
