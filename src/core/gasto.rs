//! Expense lifecycle - create, update, and soft-delete gastos.
//!
//! Creating or updating a gasto synchronizes its full allocation-link set
//! through the ledger inside the same transaction, so a gasto is never left
//! with links that contradict its amount. Deleting a gasto removes its links
//! outright (they carry no meaning once the expense is gone) and then
//! soft-deletes the row.

use crate::{
    core::ledger::{self, CambioVinculacion},
    entities::{Avance, Gasto, Vinculacion, gasto, vinculacion},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    DatabaseConnection, PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*,
};

/// Fields required to create a gasto. Catalog references are opaque ids.
#[derive(Debug, Clone)]
pub struct DatosGasto {
    /// Date the outlay happened
    pub fecha: NaiveDate,
    /// Description of the expense
    pub descripcion: String,
    /// Total amount, must be positive
    pub monto: Decimal,
    /// Expense category reference
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
}

/// Partial update for a gasto. `None` leaves the field untouched; the inner
/// `Option` on nullable columns sets them to a value or to null.
#[derive(Debug, Clone, Default)]
pub struct CambiosGasto {
    /// New date
    pub fecha: Option<NaiveDate>,
    /// New description
    pub descripcion: Option<String>,
    /// New total amount; existing links are re-validated against it
    pub monto: Option<Decimal>,
    /// New category reference
    pub categoria_id: Option<i64>,
    /// New provider reference
    pub proveedor_id: Option<Option<i64>>,
    /// New payer reference
    pub pago_persona_id: Option<Option<i64>>,
    /// New payment-method reference
    pub metodo_pago_id: Option<Option<i64>>,
    /// New payment-status reference
    pub estado_id: Option<i64>,
    /// New receipt number
    pub numero_comprobante: Option<Option<String>>,
    /// New notes
    pub notas: Option<Option<String>>,
}

fn validar_datos(descripcion: &str, monto: Decimal) -> Result<()> {
    if descripcion.trim().is_empty() {
        return Err(Error::Validation {
            message: "La descripción es requerida".to_string(),
        });
    }
    if monto <= Decimal::ZERO {
        return Err(Error::InvalidAmount { amount: monto });
    }
    Ok(())
}

/// Creates a gasto and, when `vinculaciones` is non-empty, its full link set
/// in one transaction. Any link failure rolls the whole creation back.
pub async fn crear_gasto(
    db: &DatabaseConnection,
    proyecto_obra_id: i64,
    datos: DatosGasto,
    vinculaciones: Vec<CambioVinculacion>,
) -> Result<gasto::Model> {
    validar_datos(&datos.descripcion, datos.monto)?;

    let txn = db.begin().await?;

    let now = chrono::Utc::now();
    let nuevo = gasto::ActiveModel {
        proyecto_obra_id: Set(proyecto_obra_id),
        fecha: Set(datos.fecha),
        descripcion: Set(datos.descripcion.trim().to_string()),
        monto: Set(datos.monto),
        categoria_id: Set(datos.categoria_id),
        proveedor_id: Set(datos.proveedor_id),
        pago_persona_id: Set(datos.pago_persona_id),
        metodo_pago_id: Set(datos.metodo_pago_id),
        estado_id: Set(datos.estado_id),
        numero_comprobante: Set(datos.numero_comprobante),
        notas: Set(datos.notas),
        deleted_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let gasto = nuevo.insert(&txn).await?;

    if !vinculaciones.is_empty() {
        ledger::reemplazar_vinculaciones(&txn, &gasto, vinculaciones).await?;
    }

    txn.commit().await?;
    Ok(gasto)
}

/// Updates a gasto's fields and, when `vinculaciones` is `Some` (even an
/// explicit empty list), replaces its full link set - all in one transaction.
/// With `vinculaciones` `None` the existing links are left untouched, but a
/// changed amount is still re-validated against them.
pub async fn actualizar_gasto(
    db: &DatabaseConnection,
    gasto_id: i64,
    cambios: CambiosGasto,
    vinculaciones: Option<Vec<CambioVinculacion>>,
) -> Result<gasto::Model> {
    if let Some(descripcion) = &cambios.descripcion {
        if descripcion.trim().is_empty() {
            return Err(Error::Validation {
                message: "La descripción es requerida".to_string(),
            });
        }
    }
    if let Some(monto) = cambios.monto {
        if monto <= Decimal::ZERO {
            return Err(Error::InvalidAmount { amount: monto });
        }
    }

    let txn = db.begin().await?;

    let existente = Gasto::find_by_id(gasto_id)
        .filter(gasto::Column::DeletedAt.is_null())
        .one(&txn)
        .await?
        .ok_or(Error::GastoNotFound { id: gasto_id })?;

    let mut activo: gasto::ActiveModel = existente.into();
    if let Some(fecha) = cambios.fecha {
        activo.fecha = Set(fecha);
    }
    if let Some(descripcion) = cambios.descripcion {
        activo.descripcion = Set(descripcion.trim().to_string());
    }
    if let Some(monto) = cambios.monto {
        activo.monto = Set(monto);
    }
    if let Some(categoria_id) = cambios.categoria_id {
        activo.categoria_id = Set(categoria_id);
    }
    if let Some(proveedor_id) = cambios.proveedor_id {
        activo.proveedor_id = Set(proveedor_id);
    }
    if let Some(pago_persona_id) = cambios.pago_persona_id {
        activo.pago_persona_id = Set(pago_persona_id);
    }
    if let Some(metodo_pago_id) = cambios.metodo_pago_id {
        activo.metodo_pago_id = Set(metodo_pago_id);
    }
    if let Some(estado_id) = cambios.estado_id {
        activo.estado_id = Set(estado_id);
    }
    if let Some(numero_comprobante) = cambios.numero_comprobante {
        activo.numero_comprobante = Set(numero_comprobante);
    }
    if let Some(notas) = cambios.notas {
        activo.notas = Set(notas);
    }
    activo.updated_at = Set(chrono::Utc::now());
    let gasto = activo.update(&txn).await?;

    if let Some(cambios_vinculaciones) = vinculaciones {
        ledger::reemplazar_vinculaciones(&txn, &gasto, cambios_vinculaciones).await?;
    } else {
        // Links untouched: a reduced amount must still cover them
        let asignado = ledger::monto_asignado_total(&txn, gasto.id).await?;
        if asignado > gasto.monto {
            return Err(Error::InsufficientCapacity {
                disponible: gasto.monto,
                solicitado: asignado,
            });
        }
    }

    txn.commit().await?;
    Ok(gasto)
}

/// Soft-deletes a gasto and hard-deletes all of its links in one transaction.
pub async fn eliminar_gasto(db: &DatabaseConnection, gasto_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let gasto = Gasto::find_by_id(gasto_id)
        .filter(gasto::Column::DeletedAt.is_null())
        .one(&txn)
        .await?
        .ok_or(Error::GastoNotFound { id: gasto_id })?;

    Vinculacion::delete_many()
        .filter(vinculacion::Column::GastoId.eq(gasto_id))
        .exec(&txn)
        .await?;

    let now = chrono::Utc::now();
    let mut activo: gasto::ActiveModel = gasto.into();
    activo.deleted_at = Set(Some(now));
    activo.updated_at = Set(now);
    activo.update(&txn).await?;

    txn.commit().await?;
    Ok(())
}

/// One page of the gasto listing.
#[derive(Debug, Clone)]
pub struct PaginaGastos {
    /// Gastos on this page, newest fecha first
    pub gastos: Vec<gasto::Model>,
    /// Total number of non-deleted gastos
    pub total: u64,
    /// 1-based page number that was fetched
    pub page: u64,
    /// Total number of pages at this page size
    pub total_pages: u64,
}

/// Lists non-deleted gastos, newest fecha first, paginated.
pub async fn listar_gastos(db: &DatabaseConnection, page: u64, limit: u64) -> Result<PaginaGastos> {
    let limit = limit.max(1);
    let page = page.max(1);

    let paginador = Gasto::find()
        .filter(gasto::Column::DeletedAt.is_null())
        .order_by_desc(gasto::Column::Fecha)
        .paginate(db, limit);

    let totales = paginador.num_items_and_pages().await?;
    let gastos = paginador.fetch_page(page - 1).await?;

    Ok(PaginaGastos {
        gastos,
        total: totales.number_of_items,
        page,
        total_pages: totales.number_of_pages,
    })
}

/// A link together with the description of the avance it funds.
#[derive(Debug, Clone)]
pub struct VinculacionConAvance {
    /// The link row
    pub vinculacion: vinculacion::Model,
    /// Description of the linked avance
    pub avance_descripcion: String,
}

/// A gasto with its full allocation detail.
#[derive(Debug, Clone)]
pub struct GastoDetalle {
    /// The expense itself
    pub gasto: gasto::Model,
    /// Its links, each with the linked avance's description
    pub vinculaciones: Vec<VinculacionConAvance>,
}

/// Fetches one non-deleted gasto with its links and linked avance names.
pub async fn obtener_gasto(db: &DatabaseConnection, gasto_id: i64) -> Result<GastoDetalle> {
    let gasto = Gasto::find_by_id(gasto_id)
        .filter(gasto::Column::DeletedAt.is_null())
        .one(db)
        .await?
        .ok_or(Error::GastoNotFound { id: gasto_id })?;

    let enlaces = Vinculacion::find()
        .filter(vinculacion::Column::GastoId.eq(gasto_id))
        .all(db)
        .await?;

    let mut vinculaciones = Vec::with_capacity(enlaces.len());
    for vinculacion in enlaces {
        let avance = Avance::find_by_id(vinculacion.avance_obra_id)
            .one(db)
            .await?
            .ok_or(Error::AvanceNotFound {
                id: vinculacion.avance_obra_id,
            })?;
        vinculaciones.push(VinculacionConAvance {
            vinculacion,
            avance_descripcion: avance.descripcion,
        });
    }

    Ok(GastoDetalle {
        gasto,
        vinculaciones,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_crear_gasto_validation() -> Result<()> {
        let (db, proyecto) = setup_with_proyecto().await?;

        let result = crear_gasto(
            &db,
            proyecto.id,
            datos_gasto("   ", dec("100")),
            Vec::new(),
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let result = crear_gasto(
            &db,
            proyecto.id,
            datos_gasto("Cemento", Decimal::ZERO),
            Vec::new(),
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::InvalidAmount { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_crear_gasto_with_links() -> Result<()> {
        let (db, proyecto) = setup_with_proyecto().await?;
        let avance1 = create_test_avance(&db, proyecto.id, None).await?;
        let avance2 = create_test_avance(&db, proyecto.id, None).await?;

        let gasto = crear_gasto(
            &db,
            proyecto.id,
            datos_gasto("Cemento", dec("1000.00")),
            vec![
                CambioVinculacion::Nueva {
                    avance_obra_id: avance1.id,
                    monto: dec("600.00"),
                    notas: None,
                },
                CambioVinculacion::Nueva {
                    avance_obra_id: avance2.id,
                    monto: dec("400.00"),
                    notas: None,
                },
            ],
        )
        .await?;

        assert_eq!(
            ledger::monto_asignado_total(&db, gasto.id).await?,
            dec("1000.00")
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_crear_gasto_rolls_back_on_link_failure() -> Result<()> {
        let (db, proyecto) = setup_with_proyecto().await?;
        // Budgeted avance that cannot take the whole amount
        let avance = create_test_avance(&db, proyecto.id, Some(dec("500.00"))).await?;

        let result = crear_gasto(
            &db,
            proyecto.id,
            datos_gasto("Cemento", dec("1000.00")),
            vec![CambioVinculacion::Nueva {
                avance_obra_id: avance.id,
                monto: dec("1000.00"),
                notas: None,
            }],
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::BudgetExceeded { .. }));

        // The gasto row itself was rolled back with the link
        let total = Gasto::find().count(&db).await?;
        assert_eq!(total, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_crear_gasto_rejects_link_sum_mismatch() -> Result<()> {
        let (db, proyecto) = setup_with_proyecto().await?;
        let avance = create_test_avance(&db, proyecto.id, None).await?;

        let result = crear_gasto(
            &db,
            proyecto.id,
            datos_gasto("Cemento", dec("1000.00")),
            vec![CambioVinculacion::Nueva {
                avance_obra_id: avance.id,
                monto: dec("600.00"),
                notas: None,
            }],
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::AllocationSumMismatch { .. }
        ));
        assert_eq!(Gasto::find().count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_actualizar_gasto_fields_only_keeps_links() -> Result<()> {
        let (db, proyecto) = setup_with_proyecto().await?;
        let gasto = create_test_gasto(&db, proyecto.id, "Cemento", dec("1000")).await?;
        let avance = create_test_avance(&db, proyecto.id, None).await?;
        ledger::vincular(&db, gasto.id, avance.id, dec("400"), None).await?;

        let cambios = CambiosGasto {
            descripcion: Some("Cemento gris".to_string()),
            ..Default::default()
        };
        let actualizado = actualizar_gasto(&db, gasto.id, cambios, None).await?;

        assert_eq!(actualizado.descripcion, "Cemento gris");
        assert_eq!(ledger::monto_asignado_total(&db, gasto.id).await?, dec("400"));
        Ok(())
    }

    #[tokio::test]
    async fn test_actualizar_gasto_rejects_amount_below_allocations() -> Result<()> {
        let (db, proyecto) = setup_with_proyecto().await?;
        let gasto = create_test_gasto(&db, proyecto.id, "Cemento", dec("1000")).await?;
        let avance = create_test_avance(&db, proyecto.id, None).await?;
        ledger::vincular(&db, gasto.id, avance.id, dec("800"), None).await?;

        let cambios = CambiosGasto {
            monto: Some(dec("500")),
            ..Default::default()
        };
        let result = actualizar_gasto(&db, gasto.id, cambios, None).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InsufficientCapacity { disponible, solicitado }
                if disponible == dec("500") && solicitado == dec("800")
        ));

        // The amount change did not survive the rollback
        let intacto = Gasto::find_by_id(gasto.id).one(&db).await?.unwrap();
        assert_eq!(intacto.monto, dec("1000"));
        Ok(())
    }

    #[tokio::test]
    async fn test_actualizar_gasto_replaces_links_when_provided() -> Result<()> {
        let (db, proyecto) = setup_with_proyecto().await?;
        let gasto = create_test_gasto(&db, proyecto.id, "Cemento", dec("1000")).await?;
        let avance1 = create_test_avance(&db, proyecto.id, None).await?;
        let avance2 = create_test_avance(&db, proyecto.id, None).await?;
        ledger::vincular(&db, gasto.id, avance1.id, dec("1000"), None).await?;

        let cambios_vinculaciones = vec![CambioVinculacion::Nueva {
            avance_obra_id: avance2.id,
            monto: dec("1000"),
            notas: None,
        }];
        actualizar_gasto(&db, gasto.id, CambiosGasto::default(), Some(cambios_vinculaciones))
            .await?;

        let enlaces = Vinculacion::find()
            .filter(vinculacion::Column::GastoId.eq(gasto.id))
            .all(&db)
            .await?;
        assert_eq!(enlaces.len(), 1);
        assert_eq!(enlaces[0].avance_obra_id, avance2.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_actualizar_gasto_empty_list_unallocates() -> Result<()> {
        let (db, proyecto) = setup_with_proyecto().await?;
        let gasto = create_test_gasto(&db, proyecto.id, "Cemento", dec("1000")).await?;
        let avance = create_test_avance(&db, proyecto.id, None).await?;
        ledger::vincular(&db, gasto.id, avance.id, dec("1000"), None).await?;

        actualizar_gasto(&db, gasto.id, CambiosGasto::default(), Some(Vec::new())).await?;

        assert_eq!(
            ledger::monto_asignado_total(&db, gasto.id).await?,
            Decimal::ZERO
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_eliminar_gasto_removes_links_and_soft_deletes() -> Result<()> {
        let (db, proyecto) = setup_with_proyecto().await?;
        let gasto = create_test_gasto(&db, proyecto.id, "Cemento", dec("1000")).await?;
        let avance = create_test_avance(&db, proyecto.id, None).await?;
        ledger::vincular(&db, gasto.id, avance.id, dec("600"), None).await?;

        eliminar_gasto(&db, gasto.id).await?;

        let enlaces = Vinculacion::find()
            .filter(vinculacion::Column::GastoId.eq(gasto.id))
            .count(&db)
            .await?;
        assert_eq!(enlaces, 0);

        // Soft-deleted: the row survives with deleted_at set
        let borrado = Gasto::find_by_id(gasto.id).one(&db).await?.unwrap();
        assert!(borrado.deleted_at.is_some());

        let result = obtener_gasto(&db, gasto.id).await;
        assert!(matches!(result.unwrap_err(), Error::GastoNotFound { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_listar_gastos_pagination_and_filtering() -> Result<()> {
        let (db, proyecto) = setup_with_proyecto().await?;
        for i in 0..5 {
            create_test_gasto(&db, proyecto.id, &format!("Gasto {i}"), dec("100")).await?;
        }
        let borrado = create_test_gasto(&db, proyecto.id, "Borrado", dec("100")).await?;
        eliminar_gasto(&db, borrado.id).await?;

        let pagina = listar_gastos(&db, 1, 2).await?;
        assert_eq!(pagina.gastos.len(), 2);
        assert_eq!(pagina.total, 5);
        assert_eq!(pagina.total_pages, 3);

        let ultima = listar_gastos(&db, 3, 2).await?;
        assert_eq!(ultima.gastos.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_obtener_gasto_includes_avance_names() -> Result<()> {
        let (db, proyecto) = setup_with_proyecto().await?;
        let gasto = create_test_gasto(&db, proyecto.id, "Cemento", dec("1000")).await?;
        let avance =
            create_custom_avance(&db, proyecto.id, "Contrapiso", "Corralón Sur", None).await?;
        ledger::vincular(&db, gasto.id, avance.id, dec("1000"), None).await?;

        let detalle = obtener_gasto(&db, gasto.id).await?;
        assert_eq!(detalle.gasto.id, gasto.id);
        assert_eq!(detalle.vinculaciones.len(), 1);
        assert_eq!(detalle.vinculaciones[0].avance_descripcion, "Contrapiso");
        Ok(())
    }
}
