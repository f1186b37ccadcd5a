pub mod exercise_images;
pub mod home;
pub mod system;
