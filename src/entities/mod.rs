//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod avance;
pub mod gasto;
pub mod proyecto;
pub mod vinculacion;

// Re-export specific types to avoid conflicts
pub use avance::{Column as AvanceColumn, Entity as Avance, Model as AvanceModel};
pub use gasto::{Column as GastoColumn, Entity as Gasto, Model as GastoModel};
pub use proyecto::{Column as ProyectoColumn, Entity as Proyecto, Model as ProyectoModel};
pub use vinculacion::{
    Column as VinculacionColumn, Entity as Vinculacion, Model as VinculacionModel,
};
