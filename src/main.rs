use std::sync::Arc;
use std::time::Duration;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;

use hrm_attendance::config::Config;
use hrm_attendance::db::init_db;
use hrm_attendance::docs::ApiDoc;
use hrm_attendance::repository::mysql::{MySqlAttendanceRepository, MySqlDirectory};
use hrm_attendance::routes;
use hrm_attendance::service::AttendanceService;
use hrm_attendance::utils::policy_cache::PolicyCache;

use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Attendance service is running"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url).await?;

    let cache = PolicyCache::new(Duration::from_secs(config.policy_cache_ttl_secs));
    let directory = Arc::new(MySqlDirectory::new(pool.clone(), cache));
    let records = Arc::new(MySqlAttendanceRepository::new(pool.clone()));

    let directory_for_warmup = directory.clone();
    actix_web::rt::spawn(async move {
        // Preload department shifts in batches of 250
        if let Err(e) = directory_for_warmup.warm_up(250).await {
            warn!(error = %e, "Failed to warm up policy cache");
        }
    });

    let service = Data::new(AttendanceService::new(
        records,
        directory,
        config.policy.clone(),
    ));
    let limiter = routes::limiter_config(config.rate_protected_per_min)?;
    let api_prefix = config.api_prefix.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(service.clone())
            .service(index)
            .configure(|cfg| routes::configure(cfg, &api_prefix, &limiter))
    })
    .bind(&config.server_addr)
    .with_context(|| format!("Failed to bind {}", config.server_addr))?
    .run()
    .await?;

    Ok(())
}
