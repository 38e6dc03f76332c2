use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use viewshed_adapters::{DirectoryLayerIo, LayerReader, LayerWriter};
use viewshed_core::{ElevationTile, Operator, Point6D, DEFAULT_EPSILON};
use viewshed_engine::{viewshed, EngineConfig};

#[derive(clap::Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// directory holding a directory-backed elevation layer (metadata.json plus per-tile .grid/.json files)
	#[arg(long, value_name = "dir")]
	elevation: PathBuf,

	/// CSV file of observers, one per row: x,y,viewHeight,angle,fieldOfView,altitude
	#[arg(long, value_name = "csv")]
	observers: PathBuf,

	/// directory to write the resulting visibility layer into
	#[arg(long, value_name = "dir")]
	out: PathBuf,

	/// maximum ray travel distance, in meters
	#[arg(long = "max-distance", value_name = "m")]
	max_distance: f64,

	/// disable the Earth-curvature drop applied to target elevations
	#[arg(long = "no-curvature")]
	no_curvature: bool,

	/// aggregation operator combining overlapping ray passes at a cell
	#[arg(long, value_enum, default_value = "or")]
	operator: OperatorArg,

	/// slack used to snap ray directions to the cardinal bearings, in radians
	#[arg(long, default_value_t = DEFAULT_EPSILON)]
	epsilon: f64,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default)]
enum OperatorArg {
	#[default]
	Or,
	And,
}

impl From<OperatorArg> for Operator {
	fn from(value: OperatorArg) -> Self {
		match value {
			OperatorArg::Or => Operator::Or,
			OperatorArg::And => Operator::And,
		}
	}
}

#[tokio::main]
pub async fn run(arguments: &Subcommand) -> Result<()> {
	log::info!("compute: elevation={:?} observers={:?} out={:?}", arguments.elevation, arguments.observers, arguments.out);

	let elevation_reader = DirectoryLayerIo::new(arguments.elevation.as_path());
	let elevation: viewshed_core::Layer<ElevationTile> = elevation_reader
		.read()
		.await
		.with_context(|| format!("reading elevation layer from {:?}", arguments.elevation))?;

	let points = read_observers(&arguments.observers)?;
	log::debug!("parsed {} observers", points.len());

	let config = EngineConfig {
		curvature: !arguments.no_curvature,
		operator: arguments.operator.into(),
		epsilon: arguments.epsilon,
		..EngineConfig::new(arguments.max_distance)
	};

	let visibility = viewshed(&elevation, &points, &config).await?;

	let out_writer = DirectoryLayerIo::new(arguments.out.as_path());
	out_writer
		.write(&visibility)
		.await
		.with_context(|| format!("writing visibility layer to {:?}", arguments.out))?;

	log::info!("finished computing visibility for {} observers", points.len());
	Ok(())
}

/// Parse the headerless `x,y,viewHeight,angle,fieldOfView,altitude` CSV wire
/// format of §4.I, one [`Point6D`] per row.
fn read_observers(path: &PathBuf) -> Result<Vec<Point6D>> {
	let mut reader = csv::ReaderBuilder::new()
		.has_headers(false)
		.from_path(path)
		.with_context(|| format!("opening observers CSV {path:?}"))?;

	let mut points = Vec::new();
	for (row_index, record) in reader.records().enumerate() {
		let record = record.with_context(|| format!("reading observers CSV row {row_index}"))?;
		if record.len() != 6 {
			bail!("observers CSV row {row_index} has {} fields, expected 6", record.len());
		}
		let mut fields = [0.0_f64; 6];
		for (index, field) in fields.iter_mut().enumerate() {
			*field = record[index]
				.trim()
				.parse()
				.with_context(|| format!("observers CSV row {row_index}, column {index} is not a number"))?;
		}
		points.push(Point6D::new(fields[0], fields[1], fields[2], fields[3], fields[4], fields[5]));
	}
	Ok(points)
}
