pub mod exercise_image;
pub mod extractors;
