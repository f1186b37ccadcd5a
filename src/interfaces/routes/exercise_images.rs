use actix_web::web;

use crate::handlers::exercise_images;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/exercise-images")
            .service(
                web::resource("")
                    .route(web::get().to(exercise_images::list_exercise_images))
                    .route(web::post().to(exercise_images::upload_exercise_image))
            )
            .service(
                web::resource("/{image_id}")
                    .route(web::get().to(exercise_images::get_exercise_image))
                    .route(web::patch().to(exercise_images::update_exercise_image))
                    .route(web::delete().to(exercise_images::delete_exercise_image))
            )
            .service(
                web::resource("/{image_id}/accept")
                    .route(web::post().to(exercise_images::accept_exercise_image))
            )
            .service(
                web::resource("/{image_id}/decline")
                    .route(web::post().to(exercise_images::decline_exercise_image))
            )
    );
}
