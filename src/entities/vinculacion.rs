//! Vinculacion entity - The join row assigning part of a gasto to an avance.
//!
//! Links are hard-deleted, never soft-deleted. A given (gasto, avance) pair
//! may have at most one live link.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Allocation link database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "gastos_avances_obra")]
pub struct Model {
    /// Unique identifier for the link
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Expense this allocation draws from
    pub gasto_id: i64,
    /// Progress item this allocation funds
    pub avance_obra_id: i64,
    /// Allocated amount, strictly positive
    pub monto_asignado: Decimal,
    /// Optional free-form notes
    pub notas: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Vinculacion and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each link belongs to one expense
    #[sea_orm(
        belongs_to = "super::gasto::Entity",
        from = "Column::GastoId",
        to = "super::gasto::Column::Id"
    )]
    Gasto,
    /// Each link belongs to one progress item
    #[sea_orm(
        belongs_to = "super::avance::Entity",
        from = "Column::AvanceObraId",
        to = "super::avance::Column::Id"
    )]
    Avance,
}

impl Related<super::gasto::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Gasto.def()
    }
}

impl Related<super::avance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Avance.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
