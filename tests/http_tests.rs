use actix_multipart::form::MultipartForm;
use actix_web::{
    http::{header, StatusCode},
    test, web, App, HttpResponse, ResponseError,
};
use chrono::Duration;
use exercise_images::{
    auth::jwt::JwtService,
    cache::fragment_cache::{fragment_key, FragmentCache, RedisFragmentCache},
    constants::ADD_IMAGE_PERMISSION,
    entities::exercise_image::{ExerciseImageUpload, ImageStyle, SubmissionStatus},
    errors::AppError,
    routes::multipart_form_config,
    settings::{AppConfig, AppEnvironment},
    storage::image_storage::{
        detect_image_type, exercise_image_upload_path, validate_image_file, LocalImageStorage,
    },
    use_cases::extractors::{AuthClaims, ModeratorClaims},
    utils::host::host_without_port,
};
use uuid::Uuid;

const SECRET: &str = "test_jwt_secret_that_is_long_enough_for_hs512_1234567890";
const PNG_BYTES: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D];
const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46];
const GIF_BYTES: &[u8] = b"GIF89a\x01\x00\x01\x00\x00\x00\x00";

fn token(permissions: &[&str], lifetime: Duration) -> String {
    JwtService::from_secret(SECRET)
        .create_jwt("42", "gym_rat", permissions, lifetime)
        .expect("Failed to create token")
}

async fn whoami(claims: AuthClaims) -> HttpResponse {
    HttpResponse::Ok().body(claims.submitter().username)
}

async fn moderate(claims: ModeratorClaims) -> HttpResponse {
    HttpResponse::Ok().body(claims.submitter().username)
}

macro_rules! auth_app {
    () => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(JwtService::from_secret(SECRET)))
                .route("/whoami", web::get().to(whoami))
                .route("/moderate", web::post().to(moderate)),
        )
        .await
    };
}

#[actix_rt::test]
async fn missing_token_is_unauthorized() {
    let app = auth_app!();

    let req = test::TestRequest::get().uri("/whoami").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn valid_token_is_accepted() {
    let app = auth_app!();

    let req = test::TestRequest::get()
        .uri("/whoami")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token(&[], Duration::minutes(5)))))
        .to_request();
    let body = test::call_and_read_body(&app, req).await;

    assert_eq!(body, web::Bytes::from_static(b"gym_rat"));
}

#[actix_rt::test]
async fn expired_token_is_rejected() {
    let app = auth_app!();

    let req = test::TestRequest::get()
        .uri("/whoami")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token(&[], Duration::minutes(-10)))))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn token_signed_with_other_secret_is_rejected() {
    let app = auth_app!();
    let forged = JwtService::from_secret("another_secret_that_is_long_enough_for_hs512_0987654321")
        .create_jwt("42", "gym_rat", &[ADD_IMAGE_PERMISSION], Duration::minutes(5))
        .unwrap();

    let req = test::TestRequest::post()
        .uri("/moderate")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", forged)))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn moderation_requires_add_permission() {
    let app = auth_app!();

    let req = test::TestRequest::post()
        .uri("/moderate")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token(&[], Duration::minutes(5)))))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_rt::test]
async fn moderator_token_passes() {
    let app = auth_app!();

    let req = test::TestRequest::post()
        .uri("/moderate")
        .insert_header((
            header::AUTHORIZATION,
            format!("Bearer {}", token(&[ADD_IMAGE_PERMISSION], Duration::minutes(5))),
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn app_errors_map_to_status_codes() {
    assert_eq!(AppError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
    assert_eq!(AppError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
    assert_eq!(AppError::InvalidInput("x".into()).status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        AppError::UnsupportedMediaType("x".into()).status_code(),
        StatusCode::UNSUPPORTED_MEDIA_TYPE
    );
    assert_eq!(AppError::ForbiddenAccess.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(
        AppError::InternalError("x".into()).status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[actix_rt::test]
async fn upload_path_follows_storage_convention() {
    let uuid = Uuid::parse_str("5c4d5f1e-9b1a-4b7e-8f5e-2f1d3c4b5a69").unwrap();

    assert_eq!(
        exercise_image_upload_path(12, &uuid, "jpg"),
        "exercise-images/12/5c4d5f1e-9b1a-4b7e-8f5e-2f1d3c4b5a69.jpg"
    );
}

#[actix_rt::test]
async fn image_extension_must_match_content() {
    assert_eq!(validate_image_file("Squat Front.PNG", PNG_BYTES).unwrap(), "png");
    assert_eq!(validate_image_file("bench.jpeg", JPEG_BYTES).unwrap(), "jpeg");
    assert_eq!(validate_image_file("bench.JPG", JPEG_BYTES).unwrap(), "jpg");

    for (name, bytes) in [
        ("payload.html", PNG_BYTES),
        ("vector.svg", PNG_BYTES),
        ("noextension", PNG_BYTES),
        ("", PNG_BYTES),
        ("renamed.png", JPEG_BYTES),
        ("animated.png", GIF_BYTES),
    ] {
        assert!(
            matches!(validate_image_file(name, bytes), Err(AppError::UnsupportedMediaType(_))),
            "{name} should be rejected"
        );
    }
}

#[actix_rt::test]
async fn only_png_and_jpeg_are_accepted() {
    assert_eq!(detect_image_type(PNG_BYTES).unwrap(), "image/png");
    assert_eq!(detect_image_type(JPEG_BYTES).unwrap(), "image/jpeg");
    assert!(matches!(detect_image_type(GIF_BYTES), Err(AppError::UnsupportedMediaType(_))));
    assert!(matches!(detect_image_type(b"plain text"), Err(AppError::UnsupportedMediaType(_))));
}

#[actix_rt::test]
async fn host_port_is_stripped() {
    assert_eq!(host_without_port("wger.example:8000"), "wger.example");
    assert_eq!(host_without_port("wger.example"), "wger.example");
    assert_eq!(host_without_port("[::1]:8080"), "[::1]");
}

#[actix_rt::test]
async fn styles_parse_from_codes_and_names() {
    assert_eq!("2".parse::<ImageStyle>().unwrap(), ImageStyle::ThreeD);
    assert_eq!("line-art".parse::<ImageStyle>().unwrap(), ImageStyle::LineArt);
    assert_eq!("Low-Poly".parse::<ImageStyle>().unwrap(), ImageStyle::LowPoly);
    assert!("watercolor".parse::<ImageStyle>().is_err());
    assert_eq!(ImageStyle::default(), ImageStyle::Photo);
    assert_eq!(serde_json::to_string(&ImageStyle::ThreeD).unwrap(), "\"3d\"");
}

#[actix_rt::test]
async fn status_codes_round_trip_through_storage_codes() {
    for status in [SubmissionStatus::Pending, SubmissionStatus::Accepted, SubmissionStatus::Declined] {
        assert_eq!(SubmissionStatus::from_code(status.code()), Some(status));
    }
    assert!(!SubmissionStatus::Pending.is_terminal());
    assert!(SubmissionStatus::Accepted.is_terminal());
}

#[actix_rt::test]
async fn moderation_only_leaves_pending() {
    assert_eq!(
        SubmissionStatus::Pending.transition_to(SubmissionStatus::Declined).unwrap(),
        SubmissionStatus::Declined
    );
    assert!(matches!(
        SubmissionStatus::Pending.transition_to(SubmissionStatus::Pending),
        Err(AppError::Conflict(_))
    ));
    assert!(matches!(
        SubmissionStatus::Accepted.transition_to(SubmissionStatus::Declined),
        Err(AppError::Conflict(_))
    ));
}

#[actix_rt::test]
async fn fragment_keys_include_language() {
    assert_eq!(fragment_key("muscle-overview", 2), "template.cache.muscle-overview.2");
}

#[actix_rt::test]
async fn unconfigured_fragment_cache_is_a_noop() {
    let cache = RedisFragmentCache::new(None);

    assert!(!cache.is_configured());
    assert!(cache.delete_fragment("exercise-overview", 1).await.is_ok());
}

#[actix_rt::test]
async fn local_storage_writes_below_media_root() {
    let root = std::env::temp_dir().join(format!("exercise-images-test-{}", Uuid::new_v4()));
    let storage = LocalImageStorage::new(&root);
    let relative = exercise_image_upload_path(5, &Uuid::new_v4(), "png");

    let written = storage.store(&relative, PNG_BYTES).await.unwrap();

    assert!(written.starts_with(&root));
    assert_eq!(tokio::fs::read(&written).await.unwrap(), PNG_BYTES);

    let second = storage.store(&relative, JPEG_BYTES).await;
    assert!(matches!(second, Err(AppError::Conflict(_))));
    assert_eq!(tokio::fs::read(&written).await.unwrap(), PNG_BYTES);

    storage.discard(&relative).await;
    assert!(tokio::fs::metadata(&written).await.is_err());

    tokio::fs::remove_dir_all(&root).await.unwrap();
}

fn multipart_body(boundary: &str, parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, file_name, data) in parts {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        match file_name {
            Some(file_name) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                    name, file_name
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
            ),
        }
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    body
}

fn upload_request(parts: &[(&str, Option<&str>, &[u8])]) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/upload")
        .insert_header((header::CONTENT_TYPE, "multipart/form-data; boundary=imgboundary"))
        .set_payload(multipart_body("imgboundary", parts))
}

async fn echo_upload(form: MultipartForm<ExerciseImageUpload>) -> Result<HttpResponse, AppError> {
    let form = form.into_inner().into_form().await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "exercise_base": form.exercise_base_id,
        "is_main": form.is_main,
        "style": form.style,
        "license_author": form.license_author,
        "file_name": form.file_name,
        "file_size": form.file_data.len(),
    })))
}

macro_rules! upload_app {
    ($limit:expr) => {
        test::init_service(
            App::new()
                .app_data(multipart_form_config($limit))
                .route("/upload", web::post().to(echo_upload)),
        )
        .await
    };
}

#[actix_rt::test]
async fn upload_form_is_read_from_multipart_fields() {
    let app = upload_app!(4096);

    let req = upload_request(&[
        ("exercise_base", None, b"12"),
        ("is_main", None, b"true"),
        ("style", None, b"3"),
        ("license_author", None, b"Jane Doe"),
        ("image", Some("squat.png"), PNG_BYTES),
    ])
    .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["exercise_base"], 12);
    assert_eq!(body["is_main"], true);
    assert_eq!(body["style"], "low-poly");
    assert_eq!(body["license_author"], "Jane Doe");
    assert_eq!(body["file_name"], "squat.png");
    assert_eq!(body["file_size"], PNG_BYTES.len());
}

#[actix_rt::test]
async fn upload_form_defaults_optional_fields() {
    let app = upload_app!(4096);

    let req = upload_request(&[
        ("exercise_base", None, b"12"),
        ("image", Some("squat.jpg"), JPEG_BYTES),
    ])
    .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["is_main"], false);
    assert_eq!(body["style"], "photo");
    assert!(body["license_author"].is_null());
}

#[actix_rt::test]
async fn upload_form_requires_an_exercise() {
    let app = upload_app!(4096);

    let req = upload_request(&[("image", Some("squat.png"), PNG_BYTES)]).to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn upload_form_rejects_oversized_bodies() {
    let app = upload_app!(8);

    let req = upload_request(&[
        ("exercise_base", None, b"12"),
        ("image", Some("squat.png"), PNG_BYTES),
    ])
    .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

fn config() -> AppConfig {
    AppConfig {
        env: AppEnvironment::Testing,
        name: "Exercise Images Test".to_string(),
        port: 0,
        host: "127.0.0.1".to_string(),
        worker_count: 1,
        database_url: "postgres://localhost/exercise_images_test".to_string(),
        redis_url: None,
        cors_allowed_origins: vec!["*".to_string()],
        jwt_secret: SECRET.to_string(),
        site_domain: "wger.example".to_string(),
        media_root: "media".to_string(),
        max_upload_bytes: 1024,
        admin_emails: vec![],
        mail_webhook_url: None,
        log_json: false,
    }
}

#[actix_rt::test]
async fn config_validation_collects_errors() {
    assert!(config().validate().is_ok());

    let mut production = config();
    production.env = AppEnvironment::Production;
    production.jwt_secret = "short".to_string();
    production.mail_webhook_url = Some("http://relay.local/send".to_string());

    let message = production.validate().unwrap_err().to_string();
    assert!(message.contains("JWT_SECRET"));
    assert!(message.contains("Wildcard CORS"));
    assert!(message.contains("ADMIN_EMAILS"));
}
