//! Core business logic - framework-agnostic operations over the database.
//!
//! Modules here know nothing about HTTP. Functions take a database connection
//! (or any `ConnectionTrait` implementor, so they compose into a caller's
//! transaction) and return `Result` values with domain errors.

/// Progress-item lifecycle - create, update, soft-delete, progress reporting
pub mod avance;
/// Expense lifecycle - create, update, soft-delete with transactional link sync
pub mod gasto;
/// Allocation ledger - the invariant-enforcing logic over the link table
pub mod ledger;
/// Active-project resolution and seeding
pub mod proyecto;
