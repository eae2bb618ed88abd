use std::sync::Arc;

use tracing::info;

use crate::auth::AuthService;
use crate::config::{AppConfig, DatabaseBackend};
use crate::database::{
    seed_villas, DatabaseError, DatabaseManager, MemoryRepository, PgRepository, Repository,
};
use crate::models::{LocalUser, UserRole, Villa, VillaNumber};
use crate::services::UserService;

/// Shared handles passed to every handler
#[derive(Clone)]
pub struct AppState {
    pub villas: Arc<dyn Repository<Villa>>,
    pub villa_numbers: Arc<dyn Repository<VillaNumber>>,
    pub users: Arc<UserService>,
    pub auth: Arc<AuthService>,
    pub cache_max_age_secs: u64,
    /// Pool owner when running on Postgres
    pub database: Option<DatabaseManager>,
}

impl AppState {
    /// Wire repositories for the configured backend, creating and seeding
    /// the schema when needed
    pub async fn from_config(config: &AppConfig) -> Result<Self, DatabaseError> {
        let auth = Arc::new(AuthService::from_config(&config.security));

        let state = match config.database.backend {
            DatabaseBackend::Memory => {
                info!("Using in-memory store");
                Self::memory(auth, config)
            }
            DatabaseBackend::Postgres => {
                let db = DatabaseManager::connect(&config.database).await?;
                db.ensure_schema().await?;
                let pool = db.pool().clone();
                let mut state = Self::build(
                    Arc::new(PgRepository::<Villa>::new(pool.clone())),
                    Arc::new(PgRepository::<VillaNumber>::new(pool.clone())),
                    Arc::new(PgRepository::<LocalUser>::new(pool.clone())),
                    Arc::new(PgRepository::<UserRole>::new(pool)),
                    auth,
                    config,
                );
                state.database = Some(db);
                state
            }
        };

        if config.database.seed {
            seed_villas(state.villas.as_ref()).await?;
        }
        Ok(state)
    }

    pub fn memory(auth: Arc<AuthService>, config: &AppConfig) -> Self {
        Self::build(
            Arc::new(MemoryRepository::<Villa>::new()),
            Arc::new(MemoryRepository::<VillaNumber>::new()),
            Arc::new(MemoryRepository::<LocalUser>::new()),
            Arc::new(MemoryRepository::<UserRole>::new()),
            auth,
            config,
        )
    }

    fn build(
        villas: Arc<dyn Repository<Villa>>,
        villa_numbers: Arc<dyn Repository<VillaNumber>>,
        users: Arc<dyn Repository<LocalUser>>,
        roles: Arc<dyn Repository<UserRole>>,
        auth: Arc<AuthService>,
        config: &AppConfig,
    ) -> Self {
        let user_service = UserService::new(users, roles, auth.clone(), config.security.default_role.clone());
        Self {
            villas,
            villa_numbers,
            users: Arc::new(user_service),
            auth,
            cache_max_age_secs: config.api.cache_max_age_secs,
            database: None,
        }
    }
}
