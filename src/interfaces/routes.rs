use actix_multipart::form::MultipartFormConfig;
use actix_web::web;

use crate::{errors::AppError, handlers::home::home};

mod exercise_images;
mod json_error;
mod system;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(home);

    cfg.service(
        web::scope("/api/v1")
            .configure(system::config_routes)
            .configure(exercise_images::config_routes)
    );

    cfg.configure(json_error::config_routes);
}

/// Upload limits for multipart bodies; rejections share the JSON error shape.
pub fn multipart_form_config(total_limit: usize) -> MultipartFormConfig {
    MultipartFormConfig::default()
        .total_limit(total_limit)
        .error_handler(|err, _req| AppError::from(err).into())
}
