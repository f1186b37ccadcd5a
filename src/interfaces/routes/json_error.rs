use actix_web::{error::{JsonPayloadError, PathError, QueryPayloadError}, web};

use crate::errors::AppError;

/// Rejected JSON bodies, query strings and path segments are reported in
/// the same JSON error shape as every other failure.
pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        json_payload_error(err).into()
    }));
    cfg.app_data(web::QueryConfig::default().error_handler(|err, _req| {
        query_payload_error(err).into()
    }));
    cfg.app_data(web::PathConfig::default().error_handler(|err, _req| {
        path_error(err).into()
    }));
}

fn json_payload_error(err: JsonPayloadError) -> AppError {
    match err {
        JsonPayloadError::OverflowKnownLength { .. } | JsonPayloadError::Overflow { .. } => {
            AppError::PayloadTooLarge(err.to_string())
        }
        JsonPayloadError::ContentType => AppError::UnsupportedMediaType(err.to_string()),
        _ => AppError::InvalidInput(format!("JSON payload error: {}", err)),
    }
}

fn query_payload_error(err: QueryPayloadError) -> AppError {
    AppError::InvalidInput(format!("Query error: {}", err))
}

fn path_error(err: PathError) -> AppError {
    AppError::InvalidInput(format!("Path error: {}", err))
}
