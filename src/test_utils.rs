//! Shared test utilities.
//!
//! Common helpers for setting up in-memory test databases and creating test
//! entities with sensible defaults.

use crate::{
    config::settings::ProyectoConfig,
    core::{avance, gasto, ledger::CambioVinculacion, proyecto},
    entities,
    errors::Result,
};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;

/// Parses a decimal literal. Test-only convenience for readable amounts.
#[allow(clippy::unwrap_used)]
#[must_use]
pub fn dec(valor: &str) -> Decimal {
    valor.parse().unwrap()
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a test project with the given name and no total budget.
pub async fn create_test_proyecto(
    db: &DatabaseConnection,
    nombre: &str,
) -> Result<entities::proyecto::Model> {
    proyecto::asegurar_proyecto_activo(
        db,
        &ProyectoConfig {
            nombre: nombre.to_string(),
            presupuesto_total: None,
        },
    )
    .await
}

/// Sets up a database with a project. Returns (db, proyecto) for the common
/// case where tests only need somewhere to hang gastos and avances.
pub async fn setup_with_proyecto() -> Result<(DatabaseConnection, entities::proyecto::Model)> {
    let db = setup_test_db().await?;
    let proyecto = create_test_proyecto(&db, "Proyecto de Prueba").await?;
    Ok((db, proyecto))
}

/// Builds gasto creation data with test defaults.
///
/// # Defaults
/// * `fecha`: today
/// * `categoria_id`: 1
/// * `estado_id`: 1
/// * every optional reference: None
#[must_use]
pub fn datos_gasto(descripcion: &str, monto: Decimal) -> gasto::DatosGasto {
    gasto::DatosGasto {
        fecha: chrono::Utc::now().date_naive(),
        descripcion: descripcion.to_string(),
        monto,
        categoria_id: 1,
        proveedor_id: None,
        pago_persona_id: None,
        metodo_pago_id: None,
        estado_id: 1,
        numero_comprobante: None,
        notas: None,
    }
}

/// Creates a test gasto with no links.
pub async fn create_test_gasto(
    db: &DatabaseConnection,
    proyecto_obra_id: i64,
    descripcion: &str,
    monto: Decimal,
) -> Result<entities::gasto::Model> {
    gasto::crear_gasto(
        db,
        proyecto_obra_id,
        datos_gasto(descripcion, monto),
        Vec::<CambioVinculacion>::new(),
    )
    .await
}

/// Creates a test avance with default description and provider.
pub async fn create_test_avance(
    db: &DatabaseConnection,
    proyecto_obra_id: i64,
    monto_presupuestado: Option<Decimal>,
) -> Result<entities::avance::Model> {
    create_custom_avance(
        db,
        proyecto_obra_id,
        "Avance de prueba",
        "Proveedor de prueba",
        monto_presupuestado,
    )
    .await
}

/// Creates a test avance with custom description and provider.
pub async fn create_custom_avance(
    db: &DatabaseConnection,
    proyecto_obra_id: i64,
    descripcion: &str,
    proveedor: &str,
    monto_presupuestado: Option<Decimal>,
) -> Result<entities::avance::Model> {
    avance::crear_avance(
        db,
        proyecto_obra_id,
        avance::DatosAvance {
            descripcion: descripcion.to_string(),
            proveedor: proveedor.to_string(),
            monto_presupuestado,
            porcentaje_avance: None,
            notas: None,
        },
    )
    .await
}
