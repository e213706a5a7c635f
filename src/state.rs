use std::sync::Arc;

use roster_auth::{IdentityResolver, JwtIdentityResolver};
use roster_config::{CorsConfig, DatabaseConfig, JwtConfig, ServiceConfig, StorageBackend};

use crate::modules::classes::service::ClassService;
use crate::modules::members::service::MemberService;
use crate::storage::{ClassStore, MemoryClassStore, PgClassStore};

#[derive(Clone)]
pub struct AppState {
    pub classes: ClassService,
    pub members: MemberService,
    pub identity: Arc<dyn IdentityResolver>,
    pub cors_config: CorsConfig,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ClassStore>,
        identity: Arc<dyn IdentityResolver>,
        service_config: &ServiceConfig,
        cors_config: CorsConfig,
    ) -> Self {
        let timeout = service_config.operation_timeout;
        Self {
            classes: ClassService::new(store.clone(), timeout),
            members: MemberService::new(store, timeout),
            identity,
            cors_config,
        }
    }
}

/// Opens the configured storage backend, applying migrations first when
/// `migrate` is set.
pub async fn init_store(
    backend: StorageBackend,
    migrate: bool,
) -> anyhow::Result<Arc<dyn ClassStore>> {
    match backend {
        StorageBackend::Postgres => {
            let pool = roster_db::init_db_pool(&DatabaseConfig::from_env()).await?;
            if migrate {
                roster_db::run_migrations(&pool).await?;
            }
            Ok(Arc::new(PgClassStore::new(pool)))
        }
        StorageBackend::Memory => {
            tracing::warn!("using in-memory storage; data is lost on shutdown");
            Ok(Arc::new(MemoryClassStore::new()))
        }
    }
}

pub async fn init_app_state(migrate: bool) -> anyhow::Result<AppState> {
    let service_config = ServiceConfig::from_env();
    let store = init_store(service_config.storage_backend, migrate).await?;
    let identity = Arc::new(JwtIdentityResolver::new(JwtConfig::from_env()));

    Ok(AppState::new(
        store,
        identity,
        &service_config,
        CorsConfig::from_env(),
    ))
}
