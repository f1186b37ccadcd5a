pub mod exercise_image;
pub mod language;
pub mod sqlx_repo;
