use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use atelier_api::{
    app_router,
    auth::{AuthConfig, AuthService},
    config,
    db,
    gateway::HttpPaymentGateway,
    gateway::PaymentGateway,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let app_config = config::load_config().context("Failed to load configuration")?;
    config::init_tracing(&app_config.log_level, app_config.log_json);

    info!(
        environment = %app_config.environment,
        "Starting atelier-api v{}",
        env!("CARGO_PKG_VERSION")
    );

    let db_pool = db::establish_connection_from_app_config(&app_config)
        .await
        .context("Failed to connect to database")?;

    if app_config.auto_migrate {
        info!("Running database migrations");
        db::run_migrations(&db_pool)
            .await
            .context("Failed to run migrations")?;
    }

    let auth = AuthService::new(AuthConfig {
        jwt_secret: app_config.jwt_secret.clone(),
        token_expiration: Duration::from_secs(app_config.jwt_expiration as u64),
    });

    let gateway: Option<Arc<dyn PaymentGateway>> = match HttpPaymentGateway::from_config(&app_config)
    {
        Some(client) => Some(Arc::new(client)),
        None => {
            warn!("Gateway credentials not configured; payment endpoints will return 503");
            None
        }
    };

    let addr = format!("{}:{}", app_config.host, app_config.port);

    let state = AppState {
        db: Arc::new(db_pool),
        config: Arc::new(app_config),
        auth: Arc::new(auth),
        gateway,
    };

    let app = app_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
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
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
