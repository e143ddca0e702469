//! Binary entry point - wires configuration, database, and the HTTP API.

use dotenvy::dotenv;
use obra_ledger::{api, config, core, errors::Result};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load the application configuration
    let settings = config::settings::load_default_settings()
        .inspect_err(|e| error!("Failed to load application configuration: {e}"))?;

    // 4. Initialize the database
    let db = config::database::create_connection()
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {e}"))?;
    config::database::create_tables(&db).await?;

    // 5. Resolve the active project (seeding it on first run)
    let proyecto = core::proyecto::asegurar_proyecto_activo(&db, &settings.proyecto)
        .await
        .inspect(|p| info!(proyecto_id = p.id, nombre = %p.nombre, "Active project ready."))
        .inspect_err(|e| error!("Failed to resolve the active project: {e}"))?;

    // 6. Serve the API
    let state = api::AppState {
        db,
        proyecto_id: proyecto.id,
    };
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&settings.server.bind).await?;
    info!("Listening on {}", settings.server.bind);
    axum::serve(listener, app).await?;

    Ok(())
}
