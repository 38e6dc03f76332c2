//! Data model, constants and error taxonomy shared by every crate of the
//! iterative distributed viewshed engine.
//!
//! This crate carries no algorithm: it defines the immutable types that flow
//! between the geodesy, kernel, bus and driver components (`TileKey`,
//! `ElevationTile`, `VisibilityTile`, `Point6D`, `Ray`, `Direction`,
//! `Message`, ...) plus the closed `ViewshedError` taxonomy every other
//! crate returns through `anyhow::Result`.

mod constants;
mod error;
mod types;

pub use constants::*;
pub use error::ViewshedError;
pub use types::*;
