//! Geodesy (component A) and observer resolution (component B) for the
//! iterative distributed viewshed engine.

mod observers;
mod resolution;

pub use observers::{resolve_point, ObserverTables};
pub use resolution::compute_resolution;
