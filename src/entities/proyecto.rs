//! Proyecto entity - The construction project expenses and progress belong to.
//!
//! This deployment is single-tenant by design: exactly one active project is
//! resolved at startup from configuration and every request operates on it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Project database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "proyectos_obra")]
pub struct Model {
    /// Unique identifier for the project
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Human-readable project name
    pub nombre: String,
    /// Total project budget, if one was defined
    pub presupuesto_total: Option<Decimal>,
    /// Soft delete marker - set when the project is retired
    pub deleted_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Proyecto and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One project has many expenses
    #[sea_orm(has_many = "super::gasto::Entity")]
    Gastos,
    /// One project has many progress items
    #[sea_orm(has_many = "super::avance::Entity")]
    Avances,
}

impl Related<super::gasto::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Gastos.def()
    }
}

impl Related<super::avance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Avances.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
