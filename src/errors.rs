//! Unified error type for the whole crate.
//!
//! Domain-rule violations carry the offending identifiers and amounts so the
//! API layer can surface the exact shortfall to the caller. Their display
//! messages are the user-facing ones, verbatim. Infrastructure failures
//! (database, I/O, configuration) are separate variants that the API layer
//! reports generically.

use rust_decimal::Decimal;
use thiserror::Error;

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Startup configuration could not be loaded or parsed.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A request payload failed field validation.
    #[error("{message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An allocation amount was zero or negative.
    #[error("El monto debe ser mayor a 0")]
    InvalidAmount { amount: Decimal },

    /// A live link already exists between this gasto and avance.
    #[error("Este gasto ya está vinculado a este avance")]
    DuplicateLink { gasto_id: i64, avance_obra_id: i64 },

    /// The requested allocation exceeds the expense's unallocated remainder.
    #[error("El monto asignado ({solicitado}) no puede ser mayor al disponible ({disponible})")]
    InsufficientCapacity {
        disponible: Decimal,
        solicitado: Decimal,
    },

    /// The requested allocation exceeds the progress item's remaining budget.
    #[error(
        "Presupuesto excedido para {avance}. Disponible: {disponible:.2}, Intentando asignar: {solicitado}"
    )]
    BudgetExceeded {
        avance: String,
        disponible: Decimal,
        solicitado: Decimal,
    },

    /// A full link-set replacement does not account for the expense's total.
    #[error("La suma de vinculaciones ({suma}) no coincide con el monto total ({total})")]
    AllocationSumMismatch { suma: Decimal, total: Decimal },

    /// A progress item cannot be deleted while links still reference it.
    #[error("No se puede eliminar el avance porque tiene {count} gastos vinculados")]
    HasLinkedExpenses { count: u64 },

    #[error("Gasto no encontrado")]
    GastoNotFound { id: i64 },

    #[error("Avance de obra no encontrado")]
    AvanceNotFound { id: i64 },

    #[error("Vinculación no encontrada")]
    VinculacionNotFound { id: i64 },

    #[error("Proyecto no encontrado")]
    ProyectoNotFound { id: i64 },
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
