use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::NormalizePath, web, App, HttpServer};
use exercise_images::{
    auth::jwt::JwtService,
    db::postgres::{create_pool, run_migrations},
    graceful_shutdown::shutdown_signal,
    notifications::admin_mail::{run_notification_subscriber, AdminNotifier, LogNotifier, MailRelayNotifier},
    routes::{configure_routes, multipart_form_config},
    settings::AppConfig,
    AppState,
};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

fn build_cors(config: &AppConfig) -> Cors {
    let origins = config.cors_origins();
    if origins.iter().any(|o| o == "*") {
        return Cors::permissive();
    }

    origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allow_any_method()
        .allow_any_header()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = match AppConfig::new() {
        Ok(cfg) => cfg,
        Err(e) => {
            init_tracing(false);
            tracing::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(config.log_json);
    tracing::info!("Loaded configuration: {:?}", config);

    let pool = match create_pool(&config.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to create database connection pool: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run_migrations(&pool).await {
        tracing::error!("Failed to run database migrations: {}", e);
        std::process::exit(1);
    }

    let (state, events) = AppState::new(&config, pool);
    let app_state = web::Data::new(state);
    let jwt_service = web::Data::new(JwtService::new(&config));

    let notifier: Arc<dyn AdminNotifier> = match &config.mail_webhook_url {
        Some(url) => Arc::new(MailRelayNotifier::new(url.clone(), config.admin_emails.clone())),
        None => {
            tracing::warn!("No mail relay configured, admin notifications will only be logged");
            Arc::new(LogNotifier)
        }
    };
    tokio::spawn(run_notification_subscriber(events, notifier));

    let server_addr = format!("{}:{}", config.host, config.port);

    tracing::info!(
        "🚀 Starting {} v{} on {}",
        config.name,
        env!("CARGO_PKG_VERSION"),
        server_addr
    );

    let server_config = config.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .app_data(jwt_service.clone())
            .app_data(multipart_form_config(server_config.max_upload_bytes))
            .wrap(build_cors(&server_config))
            .wrap(NormalizePath::trim())
            .wrap(TracingLogger::default())
            .configure(configure_routes)
    })
    .workers(config.worker_count)
    .bind(server_addr)?
    .run();

    let handle = server.handle();

    tokio::select! {
        res = server => res,
        _ = shutdown_signal() => {
            handle.stop(true).await;
            Ok(())
        }
    }
}
