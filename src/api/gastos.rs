//! Expense routes.
//!
//! The POST and PUT bodies accept the gasto fields plus an optional
//! `vinculaciones` array. Rows with an id are kept (or dropped when
//! `to_delete` is set) and rows without one become new links; the whole set
//! is applied transactionally through the ledger.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::{AppState, map_domain_error};
use crate::{
    core::{
        gasto::{self, CambiosGasto, DatosGasto},
        ledger::CambioVinculacion,
    },
    errors::{Error, Result},
};

/// Creates the expense routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/gastos", get(listar_gastos))
        .route("/gastos", post(crear_gasto))
        .route("/gastos", put(actualizar_gasto))
        .route("/gastos", delete(eliminar_gasto))
        .route("/gastos/{id}", get(obtener_gasto))
}

/// One row of the `vinculaciones` array in a gasto payload.
#[derive(Debug, Deserialize)]
pub struct VinculacionInput {
    /// Id of an existing link; absent for new links
    pub id: Option<i64>,
    /// Progress item to fund; required for new links
    pub avance_obra_id: Option<i64>,
    /// Allocated amount
    #[serde(default)]
    pub monto_asignado: Decimal,
    /// Optional notes
    pub notas: Option<String>,
    /// Drop this link instead of keeping it
    #[serde(default)]
    pub to_delete: bool,
}

/// Request body for creating a gasto.
#[derive(Debug, Deserialize)]
pub struct CrearGastoRequest {
    /// Date of the outlay
    pub fecha: NaiveDate,
    /// Description of the expense
    pub descripcion: String,
    /// Total amount
    pub monto: Decimal,
    /// Category reference
    pub categoria_id: i64,
    /// Optional provider reference
    pub proveedor_id: Option<i64>,
    /// Optional payer reference
    pub pago_persona_id: Option<i64>,
    /// Optional payment-method reference
    pub metodo_pago_id: Option<i64>,
    /// Payment-status reference
    pub estado_id: i64,
    /// Optional receipt number
    pub numero_comprobante: Option<String>,
    /// Optional notes
    pub notas: Option<String>,
    /// Full desired link set; omit to create an unallocated gasto
    pub vinculaciones: Option<Vec<VinculacionInput>>,
}

/// Request body for updating a gasto.
#[derive(Debug, Deserialize)]
pub struct ActualizarGastoRequest {
    /// Id of the gasto to update
    pub id: i64,
    /// New date
    pub fecha: Option<NaiveDate>,
    /// New description
    pub descripcion: Option<String>,
    /// New total amount
    pub monto: Option<Decimal>,
    /// New category reference
    pub categoria_id: Option<i64>,
    /// New provider reference
    pub proveedor_id: Option<i64>,
    /// New payer reference
    pub pago_persona_id: Option<i64>,
    /// New payment-method reference
    pub metodo_pago_id: Option<i64>,
    /// New payment-status reference
    pub estado_id: Option<i64>,
    /// New receipt number
    pub numero_comprobante: Option<String>,
    /// New notes
    pub notas: Option<String>,
    /// Full replacement link set; omit to leave links untouched
    pub vinculaciones: Option<Vec<VinculacionInput>>,
}

/// Query parameters for the gasto listing.
#[derive(Debug, Deserialize)]
pub struct ListarGastosQuery {
    /// 1-based page number
    #[serde(default = "default_page")]
    pub page: u64,
    /// Page size
    #[serde(default = "default_limit")]
    pub limit: u64,
}

/// Query parameters for deletion.
#[derive(Debug, Deserialize)]
pub struct EliminarGastoQuery {
    /// Id of the gasto to delete
    pub id: i64,
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    10
}

/// Converts payload rows into the ledger's tagged change list. Rows flagged
/// `to_delete` without an id have nothing to delete and are skipped.
fn convertir_vinculaciones(entradas: Vec<VinculacionInput>) -> Result<Vec<CambioVinculacion>> {
    let mut cambios = Vec::with_capacity(entradas.len());
    for entrada in entradas {
        match (entrada.id, entrada.to_delete) {
            (Some(id), true) => cambios.push(CambioVinculacion::Eliminar { id }),
            (Some(id), false) => cambios.push(CambioVinculacion::Mantener {
                id,
                monto: entrada.monto_asignado,
                notas: entrada.notas,
            }),
            (None, true) => {}
            (None, false) => {
                let avance_obra_id = entrada.avance_obra_id.ok_or_else(|| Error::Validation {
                    message: "Avance de obra es requerido para una vinculación nueva".to_string(),
                })?;
                cambios.push(CambioVinculacion::Nueva {
                    avance_obra_id,
                    monto: entrada.monto_asignado,
                    notas: entrada.notas,
                });
            }
        }
    }
    Ok(cambios)
}

/// GET `/gastos?page=&limit=` - Paginated listing, newest fecha first.
async fn listar_gastos(
    State(state): State<AppState>,
    Query(query): Query<ListarGastosQuery>,
) -> impl IntoResponse {
    match gasto::listar_gastos(&state.db, query.page, query.limit).await {
        Ok(pagina) => (
            StatusCode::OK,
            Json(json!({
                "gastos": pagina.gastos,
                "total": pagina.total,
                "page": pagina.page,
                "total_pages": pagina.total_pages,
            })),
        )
            .into_response(),
        Err(e) => map_domain_error(&e),
    }
}

/// GET `/gastos/{id}` - One gasto with its allocation detail.
async fn obtener_gasto(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    match gasto::obtener_gasto(&state.db, id).await {
        Ok(detalle) => {
            let vinculaciones: Vec<serde_json::Value> = detalle
                .vinculaciones
                .iter()
                .map(|v| {
                    json!({
                        "id": v.vinculacion.id,
                        "avance_obra_id": v.vinculacion.avance_obra_id,
                        "monto_asignado": v.vinculacion.monto_asignado,
                        "notas": v.vinculacion.notas,
                        "avance_descripcion": v.avance_descripcion,
                    })
                })
                .collect();

            (
                StatusCode::OK,
                Json(json!({
                    "gasto": detalle.gasto,
                    "vinculaciones": vinculaciones,
                })),
            )
                .into_response()
        }
        Err(e) => map_domain_error(&e),
    }
}

/// POST `/gastos` - Create a gasto, optionally with its full link set.
async fn crear_gasto(
    State(state): State<AppState>,
    Json(payload): Json<CrearGastoRequest>,
) -> impl IntoResponse {
    let cambios = match convertir_vinculaciones(payload.vinculaciones.unwrap_or_default()) {
        Ok(cambios) => cambios,
        Err(e) => return map_domain_error(&e),
    };

    let datos = DatosGasto {
        fecha: payload.fecha,
        descripcion: payload.descripcion,
        monto: payload.monto,
        categoria_id: payload.categoria_id,
        proveedor_id: payload.proveedor_id,
        pago_persona_id: payload.pago_persona_id,
        metodo_pago_id: payload.metodo_pago_id,
        estado_id: payload.estado_id,
        numero_comprobante: payload.numero_comprobante,
        notas: payload.notas,
    };

    match gasto::crear_gasto(&state.db, state.proyecto_id, datos, cambios).await {
        Ok(creado) => {
            info!(gasto_id = creado.id, monto = %creado.monto, "gasto creado");
            (
                StatusCode::CREATED,
                Json(json!({ "success": true, "gasto": creado })),
            )
                .into_response()
        }
        Err(e) => map_domain_error(&e),
    }
}

/// PUT `/gastos` - Update a gasto; a present `vinculaciones` array replaces
/// the full link set, an absent one leaves links untouched.
async fn actualizar_gasto(
    State(state): State<AppState>,
    Json(payload): Json<ActualizarGastoRequest>,
) -> impl IntoResponse {
    let vinculaciones = match payload.vinculaciones.map(convertir_vinculaciones) {
        Some(Ok(cambios)) => Some(cambios),
        Some(Err(e)) => return map_domain_error(&e),
        None => None,
    };

    let cambios = CambiosGasto {
        fecha: payload.fecha,
        descripcion: payload.descripcion,
        monto: payload.monto,
        categoria_id: payload.categoria_id,
        proveedor_id: payload.proveedor_id.map(Some),
        pago_persona_id: payload.pago_persona_id.map(Some),
        metodo_pago_id: payload.metodo_pago_id.map(Some),
        estado_id: payload.estado_id,
        numero_comprobante: payload.numero_comprobante.map(Some),
        notas: payload.notas.map(Some),
    };

    match gasto::actualizar_gasto(&state.db, payload.id, cambios, vinculaciones).await {
        Ok(actualizado) => {
            info!(gasto_id = actualizado.id, "gasto actualizado");
            (
                StatusCode::OK,
                Json(json!({ "success": true, "gasto": actualizado })),
            )
                .into_response()
        }
        Err(e) => map_domain_error(&e),
    }
}

/// DELETE `/gastos?id=` - Soft-delete a gasto and remove its links.
async fn eliminar_gasto(
    State(state): State<AppState>,
    Query(query): Query<EliminarGastoQuery>,
) -> impl IntoResponse {
    match gasto::eliminar_gasto(&state.db, query.id).await {
        Ok(()) => {
            info!(gasto_id = query.id, "gasto eliminado");
            (
                StatusCode::OK,
                Json(json!({ "success": true, "message": "Gasto eliminado correctamente" })),
            )
                .into_response()
        }
        Err(e) => map_domain_error(&e),
    }
}
