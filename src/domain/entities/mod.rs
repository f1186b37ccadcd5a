pub mod exercise_image;
pub mod submission;
pub mod token;
