use std::{env, sync::Arc};

use sqlx::SqlitePool;
use tracing::info;

use super::{auth, config::Config, database, models::UserRole};

pub struct AppState {
    pub config: Config,
    pub pool: SqlitePool,
}

impl AppState {
    pub async fn new() -> Arc<Self> {
        let config = Config::load();

        let pool = database::init_pool(&config.database_url)
            .await
            .expect("Database misconfigured!");

        bootstrap_admin(&pool).await;

        Arc::new(Self { config, pool })
    }
}

/// First-run seeding: with no admin account the /admin routes are unreachable,
/// so create one from ADMIN_EMAIL / ADMIN_PASSWORD when both are set.
async fn bootstrap_admin(pool: &SqlitePool) {
    let (Ok(email), Ok(password)) = (env::var("ADMIN_EMAIL"), env::var("ADMIN_PASSWORD")) else {
        return;
    };

    let admins = database::count_role(pool, UserRole::SystemAdmin)
        .await
        .expect("Database misconfigured!");

    if admins > 0 {
        return;
    }

    let hash = auth::hash_password(&password).expect("Secrets misconfigured!");

    database::insert_user(pool, "System Admin", &email, "", &hash, UserRole::SystemAdmin)
        .await
        .expect("Database misconfigured!");

    info!("Created bootstrap admin account for {email}");
}
