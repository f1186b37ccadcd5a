use async_trait::async_trait;

use crate::{errors::AppError, repositories::sqlx_repo::SqlxLanguageRepo};

#[async_trait]
pub trait LanguageRepository: Send + Sync {
    async fn list_language_ids(&self) -> Result<Vec<i64>, AppError>;
}

impl SqlxLanguageRepo {
    pub fn new(pool: sqlx::PgPool) -> Self {
        SqlxLanguageRepo { pool }
    }
}

#[async_trait]
impl LanguageRepository for SqlxLanguageRepo {
    async fn list_language_ids(&self) -> Result<Vec<i64>, AppError> {
        let ids = sqlx::query_scalar::<_, i64>("SELECT id FROM languages ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(ids)
    }
}
