//! Allocation ledger - the invariant-enforcing logic over the link table.
//!
//! A gasto's links may never add up to more than the gasto's `monto`, and an
//! avance's links may never add up to more than its `monto_presupuestado`
//! when one is defined. Every mutating operation here is generic over
//! `ConnectionTrait` so it runs inside the caller's transaction; a validation
//! failure returns `Err` before anything is written, which rolls the whole
//! transaction back.

use crate::{
    entities::{Avance, Gasto, Vinculacion, avance, gasto, vinculacion},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, DatabaseConnection, QueryOrder, Set, TransactionTrait, prelude::*};

/// Absolute tolerance for the "links must account for the full amount" check.
/// Absorbs rounding noise from client-side parsing; capacity and budget
/// checks stay strict.
fn tolerancia() -> Decimal {
    Decimal::new(1, 2)
}

/// Sum of `monto_asignado` over every link of the given gasto.
/// Returns zero when the gasto has no links.
pub async fn monto_asignado_total<C>(conn: &C, gasto_id: i64) -> Result<Decimal>
where
    C: ConnectionTrait,
{
    let vinculaciones = Vinculacion::find()
        .filter(vinculacion::Column::GastoId.eq(gasto_id))
        .all(conn)
        .await?;

    Ok(vinculaciones
        .iter()
        .fold(Decimal::ZERO, |suma, v| suma + v.monto_asignado))
}

/// Unallocated remainder of a gasto: `monto - monto_asignado_total`.
///
/// May be negative transiently (a gasto whose amount was reduced below its
/// allocations mid-update); callers must treat negative as "no capacity".
pub async fn monto_disponible<C>(conn: &C, gasto: &gasto::Model) -> Result<Decimal>
where
    C: ConnectionTrait,
{
    let asignado = monto_asignado_total(conn, gasto.id).await?;
    Ok(gasto.monto - asignado)
}

/// Sum of `monto_asignado` over every link funding the given avance.
pub async fn monto_asignado_avance<C>(conn: &C, avance_obra_id: i64) -> Result<Decimal>
where
    C: ConnectionTrait,
{
    let vinculaciones = Vinculacion::find()
        .filter(vinculacion::Column::AvanceObraId.eq(avance_obra_id))
        .all(conn)
        .await?;

    Ok(vinculaciones
        .iter()
        .fold(Decimal::ZERO, |suma, v| suma + v.monto_asignado))
}

/// Validates a prospective allocation of `monto` from `gasto` to `avance`.
///
/// `excluir` is the id of the link being replaced, if any: its current amount
/// is excluded from both totals so an update-in-place is validated against
/// the capacity it would actually consume. The duplicate-pair check only runs
/// on create (`excluir` is `None`).
///
/// Check order: amount positivity, duplicate pair, expense capacity, avance
/// budget. Capacity and budget comparisons are strict; there is no tolerance.
pub async fn validar_vinculacion<C>(
    conn: &C,
    gasto: &gasto::Model,
    avance: &avance::Model,
    monto: Decimal,
    excluir: Option<i64>,
) -> Result<()>
where
    C: ConnectionTrait,
{
    if monto <= Decimal::ZERO {
        return Err(Error::InvalidAmount { amount: monto });
    }

    let excluida = match excluir {
        Some(id) => Vinculacion::find_by_id(id).one(conn).await?,
        None => None,
    };

    if excluir.is_none() {
        let existente = Vinculacion::find()
            .filter(vinculacion::Column::GastoId.eq(gasto.id))
            .filter(vinculacion::Column::AvanceObraId.eq(avance.id))
            .one(conn)
            .await?;

        if existente.is_some() {
            return Err(Error::DuplicateLink {
                gasto_id: gasto.id,
                avance_obra_id: avance.id,
            });
        }
    }

    let mut asignado = monto_asignado_total(conn, gasto.id).await?;
    if let Some(actual) = &excluida {
        asignado -= actual.monto_asignado;
    }
    let disponible = gasto.monto - asignado;
    if monto > disponible {
        return Err(Error::InsufficientCapacity {
            disponible,
            solicitado: monto,
        });
    }

    if let Some(presupuesto) = avance.monto_presupuestado {
        let mut asignado_avance = monto_asignado_avance(conn, avance.id).await?;
        if let Some(actual) = &excluida {
            if actual.avance_obra_id == avance.id {
                asignado_avance -= actual.monto_asignado;
            }
        }
        let disponible_avance = presupuesto - asignado_avance;
        if monto > disponible_avance {
            return Err(Error::BudgetExceeded {
                avance: avance.descripcion.clone(),
                disponible: disponible_avance,
                solicitado: monto,
            });
        }
    }

    Ok(())
}

/// Creates a link after validating it, inside the caller's transaction.
pub async fn crear_vinculacion<C>(
    conn: &C,
    gasto: &gasto::Model,
    avance: &avance::Model,
    monto: Decimal,
    notas: Option<String>,
) -> Result<vinculacion::Model>
where
    C: ConnectionTrait,
{
    validar_vinculacion(conn, gasto, avance, monto, None).await?;

    let now = chrono::Utc::now();
    let nueva = vinculacion::ActiveModel {
        gasto_id: Set(gasto.id),
        avance_obra_id: Set(avance.id),
        monto_asignado: Set(monto),
        notas: Set(notas),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    Ok(nueva.insert(conn).await?)
}

/// Updates a link's amount and notes in place after validating the new amount
/// against the capacity the link would actually consume (its own current
/// amount is excluded from both totals).
pub async fn actualizar_vinculacion<C>(
    conn: &C,
    gasto: &gasto::Model,
    vinculacion_id: i64,
    monto: Decimal,
    notas: Option<String>,
) -> Result<vinculacion::Model>
where
    C: ConnectionTrait,
{
    let actual = Vinculacion::find_by_id(vinculacion_id)
        .one(conn)
        .await?
        .ok_or(Error::VinculacionNotFound { id: vinculacion_id })?;

    if actual.gasto_id != gasto.id {
        return Err(Error::VinculacionNotFound { id: vinculacion_id });
    }

    let avance = Avance::find_by_id(actual.avance_obra_id)
        .one(conn)
        .await?
        .ok_or(Error::AvanceNotFound {
            id: actual.avance_obra_id,
        })?;

    validar_vinculacion(conn, gasto, &avance, monto, Some(vinculacion_id)).await?;

    let mut activo: vinculacion::ActiveModel = actual.into();
    activo.monto_asignado = Set(monto);
    activo.notas = Set(notas);
    activo.updated_at = Set(chrono::Utc::now());

    Ok(activo.update(conn).await?)
}

/// Deletes one link. Removing a link only frees capacity, so there is no
/// invariant to check.
pub async fn eliminar_vinculacion<C>(conn: &C, vinculacion_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let resultado = Vinculacion::delete_by_id(vinculacion_id).exec(conn).await?;
    if resultado.rows_affected == 0 {
        return Err(Error::VinculacionNotFound { id: vinculacion_id });
    }
    Ok(())
}

/// One element of a full link-set replacement for a gasto.
#[derive(Debug, Clone)]
pub enum CambioVinculacion {
    /// Keep an existing link, carrying it over with this amount and notes.
    Mantener {
        /// Id of the existing link
        id: i64,
        /// New allocated amount
        monto: Decimal,
        /// New notes
        notas: Option<String>,
    },
    /// Explicitly drop an existing link.
    Eliminar {
        /// Id of the existing link
        id: i64,
    },
    /// Create a new link.
    Nueva {
        /// Progress item the new link funds
        avance_obra_id: i64,
        /// Allocated amount
        monto: Decimal,
        /// Optional notes
        notas: Option<String>,
    },
}

/// Replaces a gasto's full link set with the desired one.
///
/// Applied as a full delete-then-recreate: every existing link is removed and
/// the desired set (kept rows with their new amounts, plus new rows) is
/// created from scratch, so per-link validation always runs against the final
/// state - a redistribution among kept links can never trip over another
/// link's stale amount. A kept row must name a live link of this gasto.
///
/// Before any write: if the desired active set is non-empty, its amounts must
/// sum to the gasto's `monto` within 0.01 (an unallocated gasto - the empty
/// set - is valid and clears every existing link). Per-link validation from
/// [`validar_vinculacion`] still applies to every recreated link.
pub async fn reemplazar_vinculaciones<C>(
    conn: &C,
    gasto: &gasto::Model,
    cambios: Vec<CambioVinculacion>,
) -> Result<()>
where
    C: ConnectionTrait,
{
    let suma = cambios.iter().fold(Decimal::ZERO, |suma, c| match c {
        CambioVinculacion::Mantener { monto, .. } | CambioVinculacion::Nueva { monto, .. } => {
            suma + *monto
        }
        CambioVinculacion::Eliminar { .. } => suma,
    });
    let hay_activas = cambios
        .iter()
        .any(|c| !matches!(c, CambioVinculacion::Eliminar { .. }));

    if hay_activas && (suma - gasto.monto).abs() > tolerancia() {
        return Err(Error::AllocationSumMismatch {
            suma,
            total: gasto.monto,
        });
    }

    let existentes = Vinculacion::find()
        .filter(vinculacion::Column::GastoId.eq(gasto.id))
        .all(conn)
        .await?;

    // Resolve every kept row to the avance its link funds before anything is
    // deleted; an id that is not a live link of this gasto aborts the whole
    // replacement.
    let mut conservadas = Vec::new();
    for cambio in &cambios {
        if let CambioVinculacion::Mantener { id, monto, notas } = cambio {
            let existente = existentes
                .iter()
                .find(|v| v.id == *id)
                .ok_or(Error::VinculacionNotFound { id: *id })?;
            conservadas.push((existente.avance_obra_id, *monto, notas.clone()));
        }
    }

    for existente in &existentes {
        eliminar_vinculacion(conn, existente.id).await?;
    }

    for (avance_obra_id, monto, notas) in conservadas {
        let avance = Avance::find_by_id(avance_obra_id)
            .one(conn)
            .await?
            .ok_or(Error::AvanceNotFound { id: avance_obra_id })?;

        crear_vinculacion(conn, gasto, &avance, monto, notas).await?;
    }

    for cambio in cambios {
        if let CambioVinculacion::Nueva {
            avance_obra_id,
            monto,
            notas,
        } = cambio
        {
            let avance = Avance::find_by_id(avance_obra_id)
                .filter(avance::Column::DeletedAt.is_null())
                .one(conn)
                .await?
                .ok_or(Error::AvanceNotFound { id: avance_obra_id })?;

            crear_vinculacion(conn, gasto, &avance, monto, notas).await?;
        }
    }

    Ok(())
}

/// Links a gasto to an avance in its own transaction - the standalone
/// link operation used from the progress-item detail view.
pub async fn vincular(
    db: &DatabaseConnection,
    gasto_id: i64,
    avance_obra_id: i64,
    monto: Decimal,
    notas: Option<String>,
) -> Result<vinculacion::Model> {
    let txn = db.begin().await?;

    let gasto = Gasto::find_by_id(gasto_id)
        .filter(gasto::Column::DeletedAt.is_null())
        .one(&txn)
        .await?
        .ok_or(Error::GastoNotFound { id: gasto_id })?;

    let avance = Avance::find_by_id(avance_obra_id)
        .filter(avance::Column::DeletedAt.is_null())
        .one(&txn)
        .await?
        .ok_or(Error::AvanceNotFound { id: avance_obra_id })?;

    let vinculacion = crear_vinculacion(&txn, &gasto, &avance, monto, notas).await?;

    txn.commit().await?;
    Ok(vinculacion)
}

/// Unlinks one allocation unconditionally, returning the gasto and avance it
/// joined so the caller can name them in the confirmation.
pub async fn desvincular(
    db: &DatabaseConnection,
    vinculacion_id: i64,
) -> Result<(gasto::Model, avance::Model)> {
    let txn = db.begin().await?;

    let vinculacion = Vinculacion::find_by_id(vinculacion_id)
        .one(&txn)
        .await?
        .ok_or(Error::VinculacionNotFound { id: vinculacion_id })?;

    let gasto = Gasto::find_by_id(vinculacion.gasto_id)
        .one(&txn)
        .await?
        .ok_or(Error::GastoNotFound {
            id: vinculacion.gasto_id,
        })?;

    let avance = Avance::find_by_id(vinculacion.avance_obra_id)
        .one(&txn)
        .await?
        .ok_or(Error::AvanceNotFound {
            id: vinculacion.avance_obra_id,
        })?;

    vinculacion.delete(&txn).await?;

    txn.commit().await?;
    Ok((gasto, avance))
}

/// A gasto that still has unallocated capacity, for link-selection views.
#[derive(Debug, Clone)]
pub struct GastoDisponible {
    /// The expense itself
    pub gasto: gasto::Model,
    /// Its unallocated remainder, always positive here
    pub monto_disponible: Decimal,
}

/// Non-deleted gastos with positive remaining capacity, newest first.
pub async fn gastos_disponibles(db: &DatabaseConnection) -> Result<Vec<GastoDisponible>> {
    let gastos = Gasto::find()
        .filter(gasto::Column::DeletedAt.is_null())
        .order_by_desc(gasto::Column::Fecha)
        .all(db)
        .await?;

    let mut disponibles = Vec::new();
    for gasto in gastos {
        let restante = monto_disponible(db, &gasto).await?;
        if restante > Decimal::ZERO {
            disponibles.push(GastoDisponible {
                gasto,
                monto_disponible: restante,
            });
        }
    }

    Ok(disponibles)
}
