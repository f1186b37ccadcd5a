use actix_web::{get, HttpResponse, Responder};

#[get("/")]
pub async fn home() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "Exercise image service",
        "status": "Ok",
        "version": env!("CARGO_PKG_VERSION"),
        "images": "/api/v1/exercise-images"
    }))
}
