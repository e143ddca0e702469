//! Active-project resolution.
//!
//! The deployment manages exactly one project. Its identity comes from
//! configuration and is resolved once at startup; request handlers receive
//! the resolved id and never filter by name.

use crate::{
    config::settings::ProyectoConfig,
    entities::{Proyecto, proyecto},
    errors::{Error, Result},
};
use sea_orm::{DatabaseConnection, Set, prelude::*};

/// Finds the configured project among non-deleted rows, creating it on first
/// run. Idempotent; called once at startup.
pub async fn asegurar_proyecto_activo(
    db: &DatabaseConnection,
    config: &ProyectoConfig,
) -> Result<proyecto::Model> {
    let existente = Proyecto::find()
        .filter(proyecto::Column::Nombre.eq(&config.nombre))
        .filter(proyecto::Column::DeletedAt.is_null())
        .one(db)
        .await?;

    if let Some(proyecto) = existente {
        return Ok(proyecto);
    }

    let now = chrono::Utc::now();
    let nuevo = proyecto::ActiveModel {
        nombre: Set(config.nombre.clone()),
        presupuesto_total: Set(config.presupuesto_total),
        deleted_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    Ok(nuevo.insert(db).await?)
}

/// Fetches one non-deleted project by id.
pub async fn obtener_proyecto(db: &DatabaseConnection, proyecto_id: i64) -> Result<proyecto::Model> {
    Proyecto::find_by_id(proyecto_id)
        .filter(proyecto::Column::DeletedAt.is_null())
        .one(db)
        .await?
        .ok_or(Error::ProyectoNotFound { id: proyecto_id })
}
