use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;

pub static START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

/// Permission that marks a contributor as trusted for image submissions
pub const ADD_IMAGE_PERMISSION: &str = "exercises.add_exerciseimage";

/// Rendered overview fragments that embed exercise images
pub const IMAGE_FRAGMENTS: [&str; 4] = [
    "muscle-overview",
    "exercise-overview",
    "exercise-overview-mobile",
    "equipment-overview",
];

pub const IMAGE_UPLOAD_DIR: &str = "exercise-images";

pub const DEFAULT_LICENSE_ID: i32 = 2;
