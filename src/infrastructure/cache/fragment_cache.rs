use async_trait::async_trait;
use redis::{AsyncCommands, Client as RedisClient};
use tracing::{debug, warn};

use crate::{
    constants::IMAGE_FRAGMENTS,
    errors::AppError,
    repositories::language::LanguageRepository,
};

/// Store of rendered template fragments, keyed by fragment name and language
#[async_trait]
pub trait FragmentCache: Send + Sync {
    async fn delete_fragment(&self, fragment: &str, language_id: i64) -> Result<(), AppError>;
}

pub fn fragment_key(fragment: &str, language_id: i64) -> String {
    format!("template.cache.{}.{}", fragment, language_id)
}

/// Redis-backed fragment cache. Without a client every delete is a no-op.
#[derive(Clone)]
pub struct RedisFragmentCache {
    client: Option<RedisClient>,
}

impl RedisFragmentCache {
    pub fn new(client: Option<RedisClient>) -> Self {
        RedisFragmentCache { client }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }
}

#[async_trait]
impl FragmentCache for RedisFragmentCache {
    async fn delete_fragment(&self, fragment: &str, language_id: i64) -> Result<(), AppError> {
        let Some(client) = &self.client else {
            debug!("Fragment cache not configured, skipping {}", fragment);
            return Ok(());
        };

        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: () = conn.del(fragment_key(fragment, language_id)).await?;

        Ok(())
    }
}

/// Invalidates every rendered fragment that embeds exercise images
#[async_trait]
pub trait FragmentInvalidator: Send + Sync {
    /// Returns the number of fragment deletions attempted
    async fn invalidate_fragments_for(&self, exercise_base_id: i64) -> usize;
}

/// Fans fragment invalidation out over every configured language
pub struct CacheInvalidator<C, L>
where
    C: FragmentCache,
    L: LanguageRepository,
{
    pub cache: C,
    pub languages: L,
}

impl<C, L> CacheInvalidator<C, L>
where
    C: FragmentCache,
    L: LanguageRepository,
{
    pub fn new(cache: C, languages: L) -> Self {
        CacheInvalidator { cache, languages }
    }
}

#[async_trait]
impl<C, L> FragmentInvalidator for CacheInvalidator<C, L>
where
    C: FragmentCache,
    L: LanguageRepository,
{
    async fn invalidate_fragments_for(&self, exercise_base_id: i64) -> usize {
        let language_ids = match self.languages.list_language_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                warn!("Could not load languages for cache invalidation: {}", e);
                return 0;
            }
        };

        let mut attempted = 0;
        for language_id in language_ids {
            for fragment in IMAGE_FRAGMENTS {
                attempted += 1;
                if let Err(e) = self.cache.delete_fragment(fragment, language_id).await {
                    warn!(
                        "Failed to invalidate fragment {} for language {}: {}",
                        fragment, language_id, e
                    );
                }
            }
        }

        debug!(
            "Invalidated {} cached fragments after change to exercise {}",
            attempted, exercise_base_id
        );
        attempted
    }
}
