use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{routing::get, Router};
use http::HeaderValue;
use tokio::signal;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info};

use cantina_api as api;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = api::config::load_config()?;
    api::config::init_tracing(cfg.log_level(), cfg.log_json);

    let db_pool = api::db::establish_connection(&cfg).await?;
    if cfg.auto_migrate {
        api::db::run_migrations(&db_pool).await.map_err(|e| {
            error!("failed running migrations: {}", e);
            e
        })?;
    }
    let db = Arc::new(db_pool);

    // Event channel + background consumer
    let (event_sender, event_rx) = api::events::EventSender::channel(1024);
    tokio::spawn(api::events::process_events(event_rx));

    let services = api::handlers::AppServices::new(db.clone(), event_sender.clone(), &cfg);
    let auth_service = services.auth.clone();

    let app_state = api::AppState {
        db,
        config: cfg.clone(),
        event_sender,
        services,
    };

    // CORS: explicit origins when configured, permissive in development.
    let configured_origins: Option<Vec<HeaderValue>> = cfg
        .cors_allowed_origins
        .as_ref()
        .map(|raw| {
            raw.split(',')
                .filter_map(|origin| {
                    let trimmed = origin.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        HeaderValue::from_str(trimmed).ok()
                    }
                })
                .collect::<Vec<_>>()
        })
        .filter(|origins| !origins.is_empty());

    let cors_layer = match configured_origins {
        Some(origins) => CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any),
        None if cfg.is_development() => {
            info!("no CORS origins configured; using permissive CORS (development)");
            CorsLayer::permissive()
        }
        None => {
            error!("missing CORS configuration; set APP__CORS_ALLOWED_ORIGINS");
            return Err("missing CORS configuration: set APP__CORS_ALLOWED_ORIGINS".into());
        }
    };

    let app = Router::<api::AppState>::new()
        .route("/", get(|| async { "cantina-api up" }))
        .nest("/api/v1", api::api_v1_routes())
        .nest("/auth", api::auth::auth_routes())
        .merge(api::openapi::swagger_ui())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            cfg.request_timeout_secs,
        )))
        .layer(cors_layer)
        // Resolve bearer tokens into an AuthUser extension for every route
        .layer(axum::middleware::from_fn_with_state(
            auth_service,
            api::auth::auth_middleware,
        ))
        .with_state(app_state);

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port).parse()?;
    info!("cantina-api listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
