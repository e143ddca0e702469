//! Standalone link/unlink routes and the capacity-query view.
//!
//! `POST /vincular-gasto` is the ad-hoc single link used from the avance
//! detail view; bulk link editing goes through the gasto routes instead.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::{AppState, map_domain_error};
use crate::{core::ledger, errors::Error};

/// Creates the link routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/vincular-gasto", post(vincular_gasto))
        .route("/desvincular-gasto", delete(desvincular_gasto))
        .route("/gastos-disponibles", get(gastos_disponibles))
}

/// Request body for linking a gasto to an avance.
#[derive(Debug, Deserialize)]
pub struct VincularRequest {
    /// Expense to draw from
    pub gasto_id: i64,
    /// Progress item to fund
    pub avance_obra_id: i64,
    /// Amount to allocate
    pub monto_asignado: Decimal,
    /// Optional notes
    pub notas: Option<String>,
}

/// Query parameters for unlinking.
#[derive(Debug, Deserialize)]
pub struct DesvincularQuery {
    /// Id of the link to remove
    pub id: i64,
}

/// POST `/vincular-gasto` - Link a gasto to an avance de obra.
///
/// A missing gasto or avance here is a validation failure of the request
/// body, reported as 400 like every other rejected link; only the unlink
/// route answers 404 for a missing resource.
async fn vincular_gasto(
    State(state): State<AppState>,
    Json(payload): Json<VincularRequest>,
) -> impl IntoResponse {
    match ledger::vincular(
        &state.db,
        payload.gasto_id,
        payload.avance_obra_id,
        payload.monto_asignado,
        payload.notas,
    )
    .await
    {
        Ok(vinculacion) => {
            info!(
                gasto_id = payload.gasto_id,
                avance_obra_id = payload.avance_obra_id,
                "gasto vinculado"
            );
            (
                StatusCode::CREATED,
                Json(json!({ "success": true, "vinculacion": vinculacion })),
            )
                .into_response()
        }
        Err(e @ (Error::GastoNotFound { .. } | Error::AvanceNotFound { .. })) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response(),
        Err(e) => map_domain_error(&e),
    }
}

/// DELETE `/desvincular-gasto?id=` - Remove one link unconditionally.
async fn desvincular_gasto(
    State(state): State<AppState>,
    Query(query): Query<DesvincularQuery>,
) -> impl IntoResponse {
    match ledger::desvincular(&state.db, query.id).await {
        Ok((gasto, avance)) => {
            info!(vinculacion_id = query.id, "gasto desvinculado");
            (
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "message": format!(
                        "Gasto \"{}\" desvinculado del avance \"{}\"",
                        gasto.descripcion, avance.descripcion
                    )
                })),
            )
                .into_response()
        }
        Err(e) => map_domain_error(&e),
    }
}

/// GET `/gastos-disponibles` - Gastos that still have unallocated capacity,
/// for link-selection views.
async fn gastos_disponibles(State(state): State<AppState>) -> impl IntoResponse {
    match ledger::gastos_disponibles(&state.db).await {
        Ok(disponibles) => {
            let gastos: Vec<serde_json::Value> = disponibles
                .into_iter()
                .map(|d| {
                    json!({
                        "id": d.gasto.id,
                        "descripcion": d.gasto.descripcion,
                        "monto": d.gasto.monto,
                        "fecha": d.gasto.fecha,
                        "categoria_id": d.gasto.categoria_id,
                        "monto_disponible": d.monto_disponible,
                    })
                })
                .collect();

            (StatusCode::OK, Json(json!({ "gastos": gastos }))).into_response()
        }
        Err(e) => map_domain_error(&e),
    }
}
