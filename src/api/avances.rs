//! Progress-item routes.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::{AppState, map_domain_error};
use crate::core::{
    avance::{self, CambiosAvance, DatosAvance},
    proyecto,
};

/// Creates the progress-item routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/avances", get(listar_avances))
        .route("/avances", post(crear_avance))
        .route("/avances", put(actualizar_avance))
        .route("/avances", delete(eliminar_avance))
}

/// Request body for creating an avance.
#[derive(Debug, Deserialize)]
pub struct CrearAvanceRequest {
    /// Description of the line of work
    pub descripcion: String,
    /// Provider name
    pub proveedor: String,
    /// Budgeted amount; omit for no ceiling
    pub monto_presupuestado: Option<Decimal>,
    /// Initial physical progress percentage
    pub porcentaje_avance: Option<Decimal>,
    /// Optional notes
    pub notas: Option<String>,
}

/// Request body for updating an avance.
#[derive(Debug, Deserialize)]
pub struct ActualizarAvanceRequest {
    /// Id of the avance to update
    pub id: i64,
    /// New description
    pub descripcion: Option<String>,
    /// New provider name
    pub proveedor: Option<String>,
    /// New budget
    pub monto_presupuestado: Option<Decimal>,
    /// New physical progress percentage
    pub porcentaje_avance: Option<Decimal>,
    /// New notes
    pub notas: Option<String>,
}

/// Query parameters for deletion.
#[derive(Debug, Deserialize)]
pub struct EliminarAvanceQuery {
    /// Id of the avance to delete
    pub id: i64,
}

/// GET `/avances` - Progress items of the active project with their spend
/// figures, plus the project itself.
async fn listar_avances(State(state): State<AppState>) -> impl IntoResponse {
    let proyecto = match proyecto::obtener_proyecto(&state.db, state.proyecto_id).await {
        Ok(proyecto) => proyecto,
        Err(e) => return map_domain_error(&e),
    };

    match avance::listar_avances_con_progreso(&state.db, state.proyecto_id).await {
        Ok(listado) => {
            let avances: Vec<serde_json::Value> = listado
                .iter()
                .map(|a| {
                    json!({
                        "id": a.avance.id,
                        "descripcion": a.avance.descripcion,
                        "proveedor": a.avance.proveedor,
                        "monto_presupuestado": a.avance.monto_presupuestado,
                        "porcentaje_avance": a.avance.porcentaje_avance,
                        "notas": a.avance.notas,
                        "total_gastado": a.total_gastado,
                        "porcentaje_gastado": a.porcentaje_gastado,
                        "gastos_count": a.gastos_count,
                        "created_at": a.avance.created_at,
                        "updated_at": a.avance.updated_at,
                    })
                })
                .collect();

            (
                StatusCode::OK,
                Json(json!({
                    "avances": avances,
                    "proyecto": {
                        "id": proyecto.id,
                        "nombre": proyecto.nombre,
                        "presupuesto_total": proyecto.presupuesto_total,
                    }
                })),
            )
                .into_response()
        }
        Err(e) => map_domain_error(&e),
    }
}

/// POST `/avances` - Create a progress item in the active project.
async fn crear_avance(
    State(state): State<AppState>,
    Json(payload): Json<CrearAvanceRequest>,
) -> impl IntoResponse {
    let datos = DatosAvance {
        descripcion: payload.descripcion,
        proveedor: payload.proveedor,
        monto_presupuestado: payload.monto_presupuestado,
        porcentaje_avance: payload.porcentaje_avance,
        notas: payload.notas,
    };

    match avance::crear_avance(&state.db, state.proyecto_id, datos).await {
        Ok(creado) => {
            info!(avance_id = creado.id, "avance creado");
            (
                StatusCode::CREATED,
                Json(json!({ "success": true, "avance": creado })),
            )
                .into_response()
        }
        Err(e) => map_domain_error(&e),
    }
}

/// PUT `/avances` - Update a progress item's fields.
async fn actualizar_avance(
    State(state): State<AppState>,
    Json(payload): Json<ActualizarAvanceRequest>,
) -> impl IntoResponse {
    let cambios = CambiosAvance {
        descripcion: payload.descripcion,
        proveedor: payload.proveedor,
        monto_presupuestado: payload.monto_presupuestado.map(Some),
        porcentaje_avance: payload.porcentaje_avance,
        notas: payload.notas.map(Some),
    };

    match avance::actualizar_avance(&state.db, payload.id, cambios).await {
        Ok(actualizado) => {
            info!(avance_id = actualizado.id, "avance actualizado");
            (
                StatusCode::OK,
                Json(json!({ "success": true, "avance": actualizado })),
            )
                .into_response()
        }
        Err(e) => map_domain_error(&e),
    }
}

/// DELETE `/avances?id=` - Soft-delete a progress item; refused while any
/// allocation link still references it.
async fn eliminar_avance(
    State(state): State<AppState>,
    Query(query): Query<EliminarAvanceQuery>,
) -> impl IntoResponse {
    match avance::eliminar_avance(&state.db, query.id).await {
        Ok(()) => {
            info!(avance_id = query.id, "avance eliminado");
            (
                StatusCode::OK,
                Json(json!({ "success": true, "message": "Avance eliminado correctamente" })),
            )
                .into_response()
        }
        Err(e) => map_domain_error(&e),
    }
}
