use std::path::PathBuf;

use anyhow::{Context, Result};
use viewshed_adapters::{DirectoryLayerIo, LayerReader};
use viewshed_core::ElevationTile;

#[derive(clap::Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// directory holding a directory-backed elevation layer
	#[arg(long, value_name = "dir")]
	elevation: PathBuf,
}

#[tokio::main]
pub async fn run(arguments: &Subcommand) -> Result<()> {
	log::debug!("open {:?}", arguments.elevation);
	let reader = DirectoryLayerIo::new(arguments.elevation.as_path());
	let layer: viewshed_core::Layer<ElevationTile> = reader
		.read()
		.await
		.with_context(|| format!("reading elevation layer from {:?}", arguments.elevation))?;
	let metadata = layer.metadata();

	println!("cell type:  {:?}", metadata.cell_type);
	println!("crs:        {:?}", metadata.crs);
	println!(
		"layout:     {}x{} tiles of {}x{} pixels",
		metadata.bounds.cols(),
		metadata.bounds.rows(),
		metadata.layout.tile_cols,
		metadata.layout.tile_rows,
	);
	println!(
		"extent:     ({}, {}) .. ({}, {})",
		metadata.extent.xmin, metadata.extent.ymin, metadata.extent.xmax, metadata.extent.ymax,
	);
	println!("bounds:     {} .. {}", metadata.bounds.min_key, metadata.bounds.max_key);
	println!("tiles:      {}", layer.len());

	Ok(())
}
