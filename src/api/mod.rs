//! HTTP interface - routes, handlers, and shared application state.
//!
//! Handlers stay thin: they deserialize the request, call into `core`, and
//! map the outcome onto the JSON shapes the clients expect. All domain errors
//! funnel through [`map_domain_error`] so status codes and message wording
//! stay consistent across routes.

/// Progress-item routes
pub mod avances;
/// Expense routes
pub mod gastos;
/// Standalone link/unlink and capacity-query routes
pub mod vinculaciones;

use crate::errors::Error;
use axum::{Json, Router, http::StatusCode, response::IntoResponse};
use sea_orm::DatabaseConnection;
use serde_json::json;
use tracing::error;

/// Shared state handed to every handler.
pub struct AppState {
    /// Database handle
    pub db: DatabaseConnection,
    /// Id of the single active project, resolved at startup
    pub proyecto_id: i64,
}

// `DatabaseConnection` only derives `Clone` when sea-orm's `mock` feature is
// disabled; that feature gets unified into this crate's test builds via the
// `mock` dev-dependency feature, so `#[derive(Clone)]` can't be used here
// unconditionally. Clone each variant by hand instead.
pub(crate) fn clone_db_connection(db: &DatabaseConnection) -> DatabaseConnection {
    match db {
        DatabaseConnection::SqlxSqlitePoolConnection(c) => {
            DatabaseConnection::SqlxSqlitePoolConnection(c.clone())
        }
        #[cfg(feature = "mock")]
        DatabaseConnection::MockDatabaseConnection(c) => {
            DatabaseConnection::MockDatabaseConnection(c.clone())
        }
        DatabaseConnection::Disconnected => DatabaseConnection::Disconnected,
    }
}

impl Clone for AppState {
    fn clone(&self) -> Self {
        AppState {
            db: clone_db_connection(&self.db),
            proyecto_id: self.proyecto_id,
        }
    }
}

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    Router::new().nest("/api", routes()).with_state(state)
}

fn routes() -> Router<AppState> {
    Router::new()
        .merge(gastos::routes())
        .merge(avances::routes())
        .merge(vinculaciones::routes())
}

/// Maps domain errors to HTTP responses.
///
/// Not-found errors become 404, infrastructure failures become a generic 500
/// (the details go to the log, not the client), and every business-rule
/// violation is a 400 carrying the user-facing message verbatim. The
/// link-create handler answers 400 for a missing gasto/avance before reaching
/// this mapping.
pub(crate) fn map_domain_error(e: &Error) -> axum::response::Response {
    match e {
        Error::GastoNotFound { .. }
        | Error::AvanceNotFound { .. }
        | Error::VinculacionNotFound { .. }
        | Error::ProyectoNotFound { .. } => {
            (StatusCode::NOT_FOUND, Json(json!({ "error": e.to_string() }))).into_response()
        }
        Error::Database(_) | Error::Io(_) | Error::Config { .. } => {
            error!(error = %e, "internal error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Error interno del servidor" })),
            )
                .into_response()
        }
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}
