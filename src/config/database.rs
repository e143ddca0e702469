//! Database configuration module.
//!
//! Handles the `SQLite` connection and table creation using `SeaORM`. Tables
//! are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the database schema always matches
//! the Rust struct definitions without manual SQL.

use crate::entities::{Avance, Gasto, Proyecto, Vinculacion};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

/// Gets the database URL from the environment or returns the default
/// `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://data/obra_ledger.sqlite?mode=rwc".to_string())
}

/// Establishes a connection to the database using the `DATABASE_URL`
/// environment variable, falling back to a local `SQLite` file.
pub async fn create_connection() -> Result<DatabaseConnection> {
    Database::connect(get_database_url()).await.map_err(Into::into)
}

/// Creates all necessary database tables from the entity definitions.
/// Existing tables are left alone, so this is safe to run at every startup.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut proyecto_table = schema.create_table_from_entity(Proyecto);
    let mut gasto_table = schema.create_table_from_entity(Gasto);
    let mut avance_table = schema.create_table_from_entity(Avance);
    let mut vinculacion_table = schema.create_table_from_entity(Vinculacion);

    db.execute(builder.build(proyecto_table.if_not_exists()))
        .await?;
    db.execute(builder.build(gasto_table.if_not_exists())).await?;
    db.execute(builder.build(avance_table.if_not_exists())).await?;
    db.execute(builder.build(vinculacion_table.if_not_exists()))
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        avance::Model as AvanceModel, gasto::Model as GastoModel,
        proyecto::Model as ProyectoModel, vinculacion::Model as VinculacionModel,
    };
    use sea_orm::{EntityTrait, QuerySelect};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Tables exist if querying them succeeds
        let _: Vec<ProyectoModel> = Proyecto::find().limit(1).all(&db).await?;
        let _: Vec<GastoModel> = Gasto::find().limit(1).all(&db).await?;
        let _: Vec<AvanceModel> = Avance::find().limit(1).all(&db).await?;
        let _: Vec<VinculacionModel> = Vinculacion::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;

        let _: Vec<GastoModel> = Gasto::find().limit(1).all(&db).await?;
        Ok(())
    }
}
