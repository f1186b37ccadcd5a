use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    entities::exercise_image::{ExerciseImage, ExerciseImageRow, SubmissionStatus},
    errors::AppError,
    repositories::sqlx_repo::SqlxExerciseImageRepo,
};

const IMAGE_COLUMNS: &str =
    "id, uuid, exercise_base_id, image, is_main, style, status, license_id, license_author";

/// Store operations for exercise images. Listings use the default
/// ordering: main image first, then ascending id.
#[async_trait]
pub trait ExerciseImageRepository: Send + Sync {
    async fn check_connection(&self) -> Result<(), AppError>;
    async fn insert_image(&self, image: &ExerciseImage) -> Result<i64, AppError>;
    async fn update_image(&self, image: &ExerciseImage) -> Result<(), AppError>;
    async fn delete_image(&self, id: i64) -> Result<(), AppError>;
    async fn get_image_by_id(&self, id: i64) -> Result<Option<ExerciseImage>, AppError>;
    async fn get_image_by_uuid(&self, uuid: &Uuid) -> Result<Option<ExerciseImage>, AppError>;
    async fn list_images(
        &self,
        exercise_base_id: i64,
        status: Option<SubmissionStatus>,
    ) -> Result<Vec<ExerciseImage>, AppError>;
    async fn count_images(
        &self,
        exercise_base_id: i64,
        status: Option<SubmissionStatus>,
        is_main: Option<bool>,
    ) -> Result<i64, AppError>;
    /// Bulk update clearing the main flag on every image of the exercise
    async fn clear_main_flags(&self, exercise_base_id: i64) -> Result<u64, AppError>;
    async fn set_main_flag(&self, id: i64, is_main: bool) -> Result<(), AppError>;
    async fn update_status(&self, id: i64, status: SubmissionStatus) -> Result<(), AppError>;
}

impl SqlxExerciseImageRepo {
    pub fn new(pool: sqlx::PgPool) -> Self {
        SqlxExerciseImageRepo { pool }
    }
}

fn not_found_unless_affected(rows_affected: u64, id: i64) -> Result<(), AppError> {
    if rows_affected == 0 {
        Err(AppError::NotFound(format!("Exercise image {} not found", id)))
    } else {
        Ok(())
    }
}

#[async_trait]
impl ExerciseImageRepository for SqlxExerciseImageRepo {
    async fn check_connection(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(AppError::from)
    }

    async fn insert_image(&self, image: &ExerciseImage) -> Result<i64, AppError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO exercise_images (
                uuid,
                exercise_base_id,
                image,
                is_main,
                style,
                status,
                license_id,
                license_author
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(image.uuid)
        .bind(image.exercise_base_id)
        .bind(&image.image)
        .bind(image.is_main)
        .bind(image.style.code())
        .bind(image.status.code())
        .bind(image.license_id)
        .bind(&image.license_author)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn update_image(&self, image: &ExerciseImage) -> Result<(), AppError> {
        let id = image
            .id
            .ok_or_else(|| AppError::InternalError("Cannot update an unsaved image".into()))?;

        let result = sqlx::query(
            r#"
            UPDATE exercise_images
            SET
                exercise_base_id = $2,
                image = $3,
                is_main = $4,
                style = $5,
                status = $6,
                license_id = $7,
                license_author = $8,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(image.exercise_base_id)
        .bind(&image.image)
        .bind(image.is_main)
        .bind(image.style.code())
        .bind(image.status.code())
        .bind(image.license_id)
        .bind(&image.license_author)
        .execute(&self.pool)
        .await?;

        not_found_unless_affected(result.rows_affected(), id)
    }

    async fn delete_image(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM exercise_images WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        not_found_unless_affected(result.rows_affected(), id)
    }

    async fn get_image_by_id(&self, id: i64) -> Result<Option<ExerciseImage>, AppError> {
        let row = sqlx::query_as::<_, ExerciseImageRow>(&format!(
            "SELECT {IMAGE_COLUMNS} FROM exercise_images WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ExerciseImage::try_from).transpose()
    }

    async fn get_image_by_uuid(&self, uuid: &Uuid) -> Result<Option<ExerciseImage>, AppError> {
        let row = sqlx::query_as::<_, ExerciseImageRow>(&format!(
            "SELECT {IMAGE_COLUMNS} FROM exercise_images WHERE uuid = $1"
        ))
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ExerciseImage::try_from).transpose()
    }

    async fn list_images(
        &self,
        exercise_base_id: i64,
        status: Option<SubmissionStatus>,
    ) -> Result<Vec<ExerciseImage>, AppError> {
        let rows = sqlx::query_as::<_, ExerciseImageRow>(&format!(
            r#"
            SELECT {IMAGE_COLUMNS}
            FROM exercise_images
            WHERE exercise_base_id = $1
              AND ($2::varchar IS NULL OR status = $2)
            ORDER BY is_main DESC, id ASC
            "#
        ))
        .bind(exercise_base_id)
        .bind(status.map(|s| s.code()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ExerciseImage::try_from).collect()
    }

    async fn count_images(
        &self,
        exercise_base_id: i64,
        status: Option<SubmissionStatus>,
        is_main: Option<bool>,
    ) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM exercise_images
            WHERE exercise_base_id = $1
              AND ($2::varchar IS NULL OR status = $2)
              AND ($3::boolean IS NULL OR is_main = $3)
            "#,
        )
        .bind(exercise_base_id)
        .bind(status.map(|s| s.code()))
        .bind(is_main)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn clear_main_flags(&self, exercise_base_id: i64) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE exercise_images SET is_main = FALSE WHERE exercise_base_id = $1 AND is_main",
        )
        .bind(exercise_base_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn set_main_flag(&self, id: i64, is_main: bool) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE exercise_images SET is_main = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(is_main)
        .execute(&self.pool)
        .await?;

        not_found_unless_affected(result.rows_affected(), id)
    }

    async fn update_status(&self, id: i64, status: SubmissionStatus) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE exercise_images SET status = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(status.code())
        .execute(&self.pool)
        .await?;

        not_found_unless_affected(result.rows_affected(), id)
    }
}
