use std::net::SocketAddr;

use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

use booking_backend::{app, database, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with reduced SQL verbosity
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_env_filter(EnvFilter::new("booking_backend=info,sqlx=warn,info"))
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

    let pool = database::create_pool(&database_url).await?;

    // Run migrations (can be disabled via env var)
    let skip_migrations = std::env::var("SKIP_MIGRATIONS")
        .map(|v| v.to_lowercase() == "true" || v == "1")
        .unwrap_or(false);

    if skip_migrations {
        warn!("Skipping migrations due to SKIP_MIGRATIONS=true");
    } else {
        match sqlx::migrate!("./migrations").run(&pool).await {
            Ok(_) => info!("Migrations completed successfully"),
            Err(sqlx::migrate::MigrateError::VersionMismatch(version)) => {
                warn!("Migration version mismatch: {}", version);
                warn!("Database has different migration state than expected");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let state = AppState::new(pool);

    let cors = match std::env::var("ALLOWED_ORIGINS") {
        Ok(allowed_origins) => {
            let origins: Result<Vec<_>, _> = allowed_origins
                .split(',')
                .map(|origin| origin.trim().parse())
                .collect();
            match origins {
                Ok(origins) => {
                    info!("CORS configured for origins: {}", allowed_origins);
                    CorsLayer::new().allow_origin(origins)
                }
                Err(e) => {
                    warn!("Failed to parse ALLOWED_ORIGINS ({}), allowing any origin", e);
                    CorsLayer::new().allow_origin(Any)
                }
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any),
    }
    .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
    .allow_headers([
        axum::http::header::CONTENT_TYPE,
        axum::http::header::ACCEPT,
        "X-Customer-Id".parse().expect("valid header name"),
    ]);

    let app = app(state).layer(cors);

    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "3001".to_string())
        .parse::<u16>()
        .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?;

    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    info!("Server starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
