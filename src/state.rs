use std::sync::Arc;

use sqlx::PgPool;

use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::db;
use crate::error::AppError;
use crate::ratings::{
    memory::InMemoryMealRecordStore,
    repo::{MealRecordStore, PgMealRecordStore},
};

#[derive(Clone)]
pub struct AppState {
    pub db: Option<PgPool>,
    pub config: Arc<AppConfig>,
    pub ratings: Arc<dyn MealRecordStore>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);
        let clock = Arc::new(SystemClock::new(config.utc_offset)) as Arc<dyn Clock>;

        let Some(url) = config.database_url.as_deref() else {
            tracing::warn!("DATABASE_URL not set; ratings are kept in memory");
            let ratings = Arc::new(InMemoryMealRecordStore::seeded()) as Arc<dyn MealRecordStore>;
            return Ok(Self::from_parts(None, config, ratings, clock));
        };

        let pool = db::connect(url, config.db_max_connections).await?;
        db::migrate(&pool).await?;
        let ratings = Arc::new(PgMealRecordStore::new(pool.clone())) as Arc<dyn MealRecordStore>;

        Ok(Self::from_parts(Some(pool), config, ratings, clock))
    }

    pub fn from_parts(
        db: Option<PgPool>,
        config: Arc<AppConfig>,
        ratings: Arc<dyn MealRecordStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            db,
            config,
            ratings,
            clock,
        }
    }

    /// The database pool, or `Unavailable` naming the feature that needed it.
    pub fn pool(&self, feature: &'static str) -> Result<&PgPool, AppError> {
        self.db.as_ref().ok_or(AppError::Unavailable(feature))
    }

    #[cfg(test)]
    pub fn fake(clock: impl Clock + 'static) -> Self {
        let config = Arc::new(AppConfig {
            database_url: None,
            db_max_connections: 1,
            host: "127.0.0.1".into(),
            port: 0,
            utc_offset: time::UtcOffset::UTC,
            enforce_windows: true,
            reset_retry: std::time::Duration::from_secs(600),
        });
        Self::from_parts(
            None,
            config,
            Arc::new(InMemoryMealRecordStore::seeded()),
            Arc::new(clock),
        )
    }
}
