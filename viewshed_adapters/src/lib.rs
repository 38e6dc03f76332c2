//! Concrete local implementations of the engine's external adapters
//! (component F): the Ray Packet Bus, a partitioned dataset, a broadcast
//! snapshot, and in-memory/directory-backed layer I/O.

mod broadcast;
mod bus;
mod concurrency;
mod dataset;
mod layer_io;

pub use broadcast::Broadcast;
pub use bus::RayBus;
pub use concurrency::ConcurrencyLimits;
pub use dataset::PartitionedDataset;
pub use layer_io::{DirectoryLayerIo, InMemoryLayerReader, InMemoryLayerWriter, LayerReader, LayerWriter};
