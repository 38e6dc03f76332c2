mod direction;
mod elevation_tile;
mod layer;
mod layout;
mod message;
mod metadata;
mod operator;
mod point6d;
mod point_info;
mod ray;
mod tile_key;
mod visibility_tile;

pub use direction::Direction;
pub use elevation_tile::ElevationTile;
pub use layer::Layer;
pub use layout::{Crs, Extent, Layout};
pub use message::Message;
pub use metadata::{CellType, Metadata};
pub use operator::Operator;
pub use point6d::Point6D;
pub use point_info::PointInfo;
pub use ray::{sort_rays_by_theta, Ray};
pub use tile_key::{KeyBounds, TileKey};
pub use visibility_tile::{VisibilityTile, VISIBILITY_NO_INFO};
