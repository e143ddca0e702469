//! Gasto entity - Represents one real-world outlay of money.
//!
//! Each gasto carries a fixed-point `monto` that acts as the ceiling for the
//! allocations linked to it, plus references to the catalog tables (categoría,
//! proveedor, persona, método de pago, estado de pago) kept as opaque ids.
//! Gastos are soft-deleted via `deleted_at`; their links are not.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Expense database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "gastos")]
pub struct Model {
    /// Unique identifier for the expense
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Project this expense belongs to
    pub proyecto_obra_id: i64,
    /// Date the outlay happened
    pub fecha: Date,
    /// Human-readable description of the expense
    pub descripcion: String,
    /// Total amount, always positive; ceiling for linked allocations
    pub monto: Decimal,
    /// Expense category reference
    pub categoria_id: i64,
    /// Optional provider reference
    pub proveedor_id: Option<i64>,
    /// Optional reference to the person who paid
    pub pago_persona_id: Option<i64>,
    /// Optional payment-method reference
    pub metodo_pago_id: Option<i64>,
    /// Payment-status reference
    pub estado_id: i64,
    /// Optional receipt number
    pub numero_comprobante: Option<String>,
    /// Optional free-form notes
    pub notas: Option<String>,
    /// Soft delete marker - set instead of removing the row
    pub deleted_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Gasto and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each expense belongs to one project
    #[sea_orm(
        belongs_to = "super::proyecto::Entity",
        from = "Column::ProyectoObraId",
        to = "super::proyecto::Column::Id"
    )]
    Proyecto,
    /// One expense has many allocation links
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
