use redis::Client as RedisClient;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod constants;
pub mod graceful_shutdown;

pub use domain::{entities, events, use_cases};
pub use interfaces::{handlers, repositories, routes};
pub use infrastructure::{auth, cache, db, notifications, storage, utils};

use cache::fragment_cache::{CacheInvalidator, RedisFragmentCache};
use entities::submission::ImageEvent;
use repositories::sqlx_repo::{SqlxExerciseImageRepo, SqlxLanguageRepo};
use storage::image_storage::LocalImageStorage;
use use_cases::exercise_image::ExerciseImageHandler;

pub struct AppState {
    pub image_handler: AppImageHandler,
    pub storage: LocalImageStorage,
    pub redis_client: Option<RedisClient>,
}

pub type AppCacheInvalidator = CacheInvalidator<RedisFragmentCache, SqlxLanguageRepo>;
pub type AppImageHandler =
    ExerciseImageHandler<SqlxExerciseImageRepo, AppCacheInvalidator, UnboundedSender<ImageEvent>>;

impl AppState {
    /// Builds the shared state and the receiving end of the image event
    /// queue, which the caller hands to the notification subscriber.
    pub fn new(config: &settings::AppConfig, pool: sqlx::PgPool) -> (Self, UnboundedReceiver<ImageEvent>) {
        let redis_client = config.redis_url.as_ref().and_then(|url| {
            RedisClient::open(url.as_str())
                .map_err(|e| tracing::error!("Redis connection error: {}", e))
                .ok()
        });

        let fragment_cache = RedisFragmentCache::new(redis_client.clone());
        if !fragment_cache.is_configured() {
            tracing::warn!("No Redis configured, rendered fragments will not be invalidated");
        }
        let invalidator = CacheInvalidator::new(fragment_cache, SqlxLanguageRepo::new(pool.clone()));
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let image_handler = ExerciseImageHandler::new(
            SqlxExerciseImageRepo::new(pool),
            invalidator,
            events_tx,
            config.site_domain.clone(),
        );

        let state = AppState {
            image_handler,
            storage: LocalImageStorage::new(&config.media_root),
            redis_client,
        };

        (state, events_rx)
    }
}
