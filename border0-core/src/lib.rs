//! Border0 Core
//!
//! Core library of the Border0 infrastructure provider: the attribute value
//! model, schemas, typed attribute access, composite identifiers,
//! diagnostics, the host-facing Provider trait and the planning differ.

pub mod attributes;
pub mod diagnostics;
pub mod differ;
pub mod ids;
pub mod provider;
pub mod resource;
pub mod schema;
