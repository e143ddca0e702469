//! Avance entity - Represents one budgeted line of work within the project.
//!
//! `monto_presupuestado` is nullable: an undefined budget is a valid state
//! meaning the item has no allocation ceiling. `porcentaje_avance` is the
//! user-entered physical progress and is never derived from spend.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Progress item database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "avances_obra")]
pub struct Model {
    /// Unique identifier for the progress item
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Project this progress item belongs to
    pub proyecto_obra_id: i64,
    /// Description of the line of work
    pub descripcion: String,
    /// Provider name, free text
    pub proveedor: String,
    /// Budgeted amount; None means no allocation ceiling
    pub monto_presupuestado: Option<Decimal>,
    /// Physical progress percentage (0-100), tracked independently of spend
    pub porcentaje_avance: Decimal,
    /// Optional free-form notes
    pub notas: Option<String>,
    /// Soft delete marker
    pub deleted_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Avance and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each progress item belongs to one project
    #[sea_orm(
        belongs_to = "super::proyecto::Entity",
        from = "Column::ProyectoObraId",
        to = "super::proyecto::Column::Id"
    )]
    Proyecto,
    /// One progress item has many allocation links
    #[sea_orm(has_many = "super::vinculacion::Entity")]
    Vinculaciones,
}

impl Related<super::proyecto::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Proyecto.def()
    }
}

impl Related<super::vinculacion::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vinculaciones.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
