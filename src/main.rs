use std::sync::Arc;

use actix_web::middleware::{Logger, NormalizePath};
use actix_web::web::Data;
use actix_web::{App, HttpResponse, HttpServer, Responder, get};
use anyhow::Context;
use tracing::{info, warn};
use tracing_appender::rolling;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod api;
mod auth;
mod clock;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod models;
mod routes;
mod service;
mod state;
mod store;
mod sweeper;

#[cfg(test)]
mod testing;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::db::init_db;
use crate::docs::ApiDoc;
use crate::routes::Limiters;
use crate::service::{
    assignment::ShiftAssignments,
    face::{DisabledFaceMatcher, FaceMatcher, RemoteFaceMatcher},
    geocode::NominatimGeocoder,
    payroll::PayrollEngine,
    reconciler::AttendanceReconciler,
};
use crate::state::AppState;
use crate::store::{MySqlStore, Store};
use crate::sweeper::{Schedule, Sweeper};

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({"status": "ok"}))
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .pretty()
        .init();

    info!(addr = %config.server_addr, "Server starting...");

    let pool = init_db(&config.database_url).await?;
    let store: Arc<dyn Store> = Arc::new(MySqlStore::new(pool));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let geocoder = Arc::new(
        NominatimGeocoder::new(
            &config.geocoder_url,
            config.geocoder_timeout,
            config.geocode_cache_ttl,
        )
        .context("building geocoder client")?,
    );
    let face: Arc<dyn FaceMatcher> = match &config.face_match_url {
        Some(url) => Arc::new(
            RemoteFaceMatcher::new(url, config.face_match_timeout)
                .context("building face matcher client")?,
        ),
        None => {
            warn!("FACE_MATCH_URL not set; face verification is disabled");
            Arc::new(DisabledFaceMatcher)
        }
    };

    let assignments = Arc::new(ShiftAssignments::new(store.clone(), clock.clone()));
    let attendance = Arc::new(AttendanceReconciler::new(store.clone(), geocoder));
    let payroll = Arc::new(PayrollEngine::new(
        store.clone(),
        clock.clone(),
        config.payroll_concurrency,
    ));

    if config.sweeps_enabled {
        let sweeper = Arc::new(Sweeper::new(
            store.clone(),
            attendance.clone(),
            payroll.clone(),
            assignments.clone(),
            clock.clone(),
            Schedule {
                tick: config.auto_checkout_every,
                absent_at: config.absent_sweep_at,
                payroll_at: config.payroll_run_at,
            },
        ));
        sweeper.spawn();
        info!("Sweeps scheduled");
    } else {
        warn!("SWEEPS_ENABLED=false; auto-checkout, absence and payroll sweeps will not run");
    }

    let state = Data::new(AppState {
        store,
        assignments,
        attendance,
        payroll,
        face,
        clock,
    });
    let limiters = Limiters::new(&config)?;
    let server_addr = config.server_addr.clone();
    let config_data = Data::new(config);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard matches the JS/CSS assets
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(state.clone())
            .app_data(config_data.clone())
            .service(health)
            .configure(|cfg| routes::configure(cfg, &config_data, &limiters))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
