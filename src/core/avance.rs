//! Progress-item lifecycle - create, update, and soft-delete avances de obra.
//!
//! An avance's `porcentaje_avance` is the physically observed progress and is
//! entered by the user; it is never computed from spend. The spend side
//! (`total_gastado`, `porcentaje_gastado`) lives in the progress report and
//! is derived from the allocation links.

use crate::{
    entities::{Avance, Vinculacion, avance, vinculacion},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{
    DatabaseConnection, PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*,
};

/// Fields required to create an avance.
#[derive(Debug, Clone)]
pub struct DatosAvance {
    /// Description of the line of work
    pub descripcion: String,
    /// Provider name, free text
    pub proveedor: String,
    /// Budgeted amount; None means no allocation ceiling
    pub monto_presupuestado: Option<Decimal>,
    /// Initial physical progress percentage; defaults to zero
    pub porcentaje_avance: Option<Decimal>,
    /// Optional notes
    pub notas: Option<String>,
}

/// Partial update for an avance.
#[derive(Debug, Clone, Default)]
pub struct CambiosAvance {
    /// New description
    pub descripcion: Option<String>,
    /// New provider name
    pub proveedor: Option<String>,
    /// New budget; the inner `None` removes the ceiling
    pub monto_presupuestado: Option<Option<Decimal>>,
    /// New physical progress percentage
    pub porcentaje_avance: Option<Decimal>,
    /// New notes
    pub notas: Option<Option<String>>,
}

/// Creates an avance after validating its fields.
pub async fn crear_avance(
    db: &DatabaseConnection,
    proyecto_obra_id: i64,
    datos: DatosAvance,
) -> Result<avance::Model> {
    if datos.descripcion.trim().is_empty() || datos.proveedor.trim().is_empty() {
        return Err(Error::Validation {
            message: "Descripción y proveedor son requeridos".to_string(),
        });
    }
    if let Some(presupuesto) = datos.monto_presupuestado {
        if presupuesto < Decimal::ZERO {
            return Err(Error::InvalidAmount {
                amount: presupuesto,
            });
        }
    }

    let porcentaje = datos
        .porcentaje_avance
        .unwrap_or(Decimal::ZERO)
        .max(Decimal::ZERO);

    let now = chrono::Utc::now();
    let nuevo = avance::ActiveModel {
        proyecto_obra_id: Set(proyecto_obra_id),
        descripcion: Set(datos.descripcion.trim().to_string()),
        proveedor: Set(datos.proveedor.trim().to_string()),
        monto_presupuestado: Set(datos.monto_presupuestado),
        porcentaje_avance: Set(porcentaje),
        notas: Set(datos.notas),
        deleted_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    Ok(nuevo.insert(db).await?)
}

/// Updates an avance's fields. Only the provided fields change.
pub async fn actualizar_avance(
    db: &DatabaseConnection,
    avance_obra_id: i64,
    cambios: CambiosAvance,
) -> Result<avance::Model> {
    if let Some(descripcion) = &cambios.descripcion {
        if descripcion.trim().is_empty() {
            return Err(Error::Validation {
                message: "Descripción y proveedor son requeridos".to_string(),
            });
        }
    }
    if let Some(Some(presupuesto)) = cambios.monto_presupuestado {
        if presupuesto < Decimal::ZERO {
            return Err(Error::InvalidAmount {
                amount: presupuesto,
            });
        }
    }

    let existente = Avance::find_by_id(avance_obra_id)
        .filter(avance::Column::DeletedAt.is_null())
        .one(db)
        .await?
        .ok_or(Error::AvanceNotFound { id: avance_obra_id })?;

    let mut activo: avance::ActiveModel = existente.into();
    if let Some(descripcion) = cambios.descripcion {
        activo.descripcion = Set(descripcion.trim().to_string());
    }
    if let Some(proveedor) = cambios.proveedor {
        activo.proveedor = Set(proveedor.trim().to_string());
    }
    if let Some(monto_presupuestado) = cambios.monto_presupuestado {
        activo.monto_presupuestado = Set(monto_presupuestado);
    }
    if let Some(porcentaje) = cambios.porcentaje_avance {
        activo.porcentaje_avance = Set(porcentaje.max(Decimal::ZERO));
    }
    if let Some(notas) = cambios.notas {
        activo.notas = Set(notas);
    }
    activo.updated_at = Set(chrono::Utc::now());

    Ok(activo.update(db).await?)
}

/// Soft-deletes an avance, refusing while any allocation link references it.
pub async fn eliminar_avance(db: &DatabaseConnection, avance_obra_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let avance = Avance::find_by_id(avance_obra_id)
        .filter(avance::Column::DeletedAt.is_null())
        .one(&txn)
        .await?
        .ok_or(Error::AvanceNotFound { id: avance_obra_id })?;

    let vinculados = Vinculacion::find()
        .filter(vinculacion::Column::AvanceObraId.eq(avance_obra_id))
        .count(&txn)
        .await?;
    if vinculados > 0 {
        return Err(Error::HasLinkedExpenses { count: vinculados });
    }

    let now = chrono::Utc::now();
    let mut activo: avance::ActiveModel = avance.into();
    activo.deleted_at = Set(Some(now));
    activo.updated_at = Set(now);
    activo.update(&txn).await?;

    txn.commit().await?;
    Ok(())
}

/// An avance together with its spend figures.
#[derive(Debug, Clone)]
pub struct AvanceConProgreso {
    /// The progress item itself
    pub avance: avance::Model,
    /// Sum of allocations funding this avance
    pub total_gastado: Decimal,
    /// Spend as a percentage of the budget; zero when no budget is defined
    pub porcentaje_gastado: Decimal,
    /// Number of allocation links referencing this avance
    pub gastos_count: u64,
}

/// Spend as a percentage of the budget. Returns zero when the budget is
/// undefined or zero - "spent share of nothing" is reported as no progress,
/// not an error.
#[must_use]
pub fn porcentaje_gastado(total_gastado: Decimal, presupuesto: Option<Decimal>) -> Decimal {
    match presupuesto {
        Some(presupuesto) if presupuesto > Decimal::ZERO => {
            total_gastado / presupuesto * Decimal::ONE_HUNDRED
        }
        _ => Decimal::ZERO,
    }
}

/// Non-deleted avances of the project with their spend figures, newest first.
pub async fn listar_avances_con_progreso(
    db: &DatabaseConnection,
    proyecto_obra_id: i64,
) -> Result<Vec<AvanceConProgreso>> {
    let avances = Avance::find()
        .filter(avance::Column::ProyectoObraId.eq(proyecto_obra_id))
        .filter(avance::Column::DeletedAt.is_null())
        .order_by_desc(avance::Column::CreatedAt)
        .all(db)
        .await?;

    let mut resultado = Vec::with_capacity(avances.len());
    for avance in avances {
        let enlaces = Vinculacion::find()
            .filter(vinculacion::Column::AvanceObraId.eq(avance.id))
            .all(db)
            .await?;

        let total_gastado = enlaces
            .iter()
            .fold(Decimal::ZERO, |suma, v| suma + v.monto_asignado);
        let gastado = porcentaje_gastado(total_gastado, avance.monto_presupuestado);
        let gastos_count = enlaces.len() as u64;

        resultado.push(AvanceConProgreso {
            avance,
            total_gastado,
            porcentaje_gastado: gastado,
            gastos_count,
        });
    }

    Ok(resultado)
}
