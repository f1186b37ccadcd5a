use actix_web::{get, web, HttpResponse, Responder};
use humantime::format_duration;
use redis::RedisResult;
use serde::Serialize;
use std::time::Duration;

use crate::{constants::START_TIME, repositories::exercise_image::ExerciseImageRepository, AppState};

#[derive(Serialize)]
struct HealthCheckResponse {
    status: String,
    uptime: String,
    timestamp: String,
    start_at: String,
    database: String,
    redis_status: String,
    version: String,
}

#[get("/health")]
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let now_utc = chrono::Utc::now();
    let uptime_duration = now_utc.signed_duration_since(*START_TIME);
    let human_uptime = format_duration(Duration::from_secs(uptime_duration.num_seconds().max(0) as u64));

    let db_status = match state.image_handler.image_repo.check_connection().await {
        Ok(_) => "OK",
        Err(e) => {
            tracing::warn!("Health check could not reach the database: {}", e);
            "Unavailable"
        }
    };

    let redis_status = if let Some(redis) = &state.redis_client {
        match redis.get_multiplexed_async_connection().await {
            Ok(mut conn) => {
                let result: RedisResult<String> = redis::AsyncCommands::ping(&mut conn).await;
                match result {
                    Ok(pong) if pong == "PONG" => "OK",
                    _ => "Unavailable",
                }
            }
            Err(_) => "Unavailable",
        }
    } else {
        "Not configured"
    };

    let status = if db_status == "OK" { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthCheckResponse {
        status: status.to_string(),
        uptime: human_uptime.to_string(),
        timestamp: now_utc.to_rfc3339(),
        start_at: START_TIME.to_rfc3339(),
        database: db_status.to_string(),
        redis_status: redis_status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
