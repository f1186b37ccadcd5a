use actix_multipart::form::MultipartForm;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use tracing::instrument;

use crate::{
    entities::exercise_image::{
        ExerciseImageResponse, ExerciseImageUpload, ImageListQuery, SubmissionStatus,
        UpdateExerciseImageRequest,
    },
    errors::AppError,
    use_cases::extractors::{AuthClaims, ModeratorClaims},
    AppState,
};

#[instrument(skip(state, query))]
pub async fn list_exercise_images(
    state: web::Data<AppState>,
    query: web::Query<ImageListQuery>,
) -> Result<impl Responder, AppError> {
    let images = state.image_handler
        .list_images(query.exercise_base)
        .await?
        .into_iter()
        .map(ExerciseImageResponse::from)
        .collect::<Vec<_>>();

    Ok(HttpResponse::Ok().json(images))
}

#[instrument(skip(state))]
pub async fn get_exercise_image(
    image_id: web::Path<i64>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let image = state.image_handler.get_image(image_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ExerciseImageResponse::from(image)))
}

#[instrument(skip(claims, state, req, form), fields(user = %claims.0.username))]
pub async fn upload_exercise_image(
    claims: AuthClaims,
    state: web::Data<AppState>,
    req: HttpRequest,
    form: MultipartForm<ExerciseImageUpload>,
) -> Result<impl Responder, AppError> {
    let form = form.into_inner().into_form().await?;
    let host = req.connection_info().host().to_string();

    let saved = state.image_handler
        .upload_image(&state.storage, form, &claims.submitter(), &host)
        .await?;

    Ok(HttpResponse::Created().json(ExerciseImageResponse::from(saved)))
}

#[instrument(skip(claims, state, data))]
pub async fn update_exercise_image(
    claims: AuthClaims,
    image_id: web::Path<i64>,
    state: web::Data<AppState>,
    data: web::Json<UpdateExerciseImageRequest>,
) -> Result<impl Responder, AppError> {
    let updated = state.image_handler
        .update_image(image_id.into_inner(), &data.into_inner(), &claims.submitter())
        .await?;

    Ok(HttpResponse::Ok().json(ExerciseImageResponse::from(updated)))
}

#[instrument(skip(claims, state))]
pub async fn delete_exercise_image(
    claims: ModeratorClaims,
    image_id: web::Path<i64>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    state.image_handler
        .delete_image(image_id.into_inner(), &claims.submitter())
        .await?;

    Ok(HttpResponse::NoContent().finish())
}

#[instrument(skip(claims, state))]
pub async fn accept_exercise_image(
    claims: ModeratorClaims,
    image_id: web::Path<i64>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let image = state.image_handler
        .moderate(image_id.into_inner(), SubmissionStatus::Accepted, &claims.submitter())
        .await?;

    Ok(HttpResponse::Ok().json(ExerciseImageResponse::from(image)))
}

#[instrument(skip(claims, state))]
pub async fn decline_exercise_image(
    claims: ModeratorClaims,
    image_id: web::Path<i64>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let image = state.image_handler
        .moderate(image_id.into_inner(), SubmissionStatus::Declined, &claims.submitter())
        .await?;

    Ok(HttpResponse::Ok().json(ExerciseImageResponse::from(image)))
}
