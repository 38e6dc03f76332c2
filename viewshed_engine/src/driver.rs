use std::collections::{HashMap, HashSet};

use dashmap::{DashMap, DashSet};
use futures::stream::{self, StreamExt};
use log::{debug, info};

use viewshed_adapters::{Broadcast, RayBus};
use viewshed_core::{
	sort_rays_by_theta, Direction, ElevationTile, KeyBounds, Layer, Message, Point6D, PointInfo, Ray, TileKey,
	VisibilityTile, ViewshedError,
};
use viewshed_geometry::{compute_resolution, ObserverTables};
use viewshed_kernel::{run_kernel, KernelInput, KernelParams};

use crate::config::EngineConfig;

/// Compute the visibility layer for `points` against `elevation` (§4.E,
/// §6 `viewshed(...)`).
///
/// Runs to quiescence: seeds every tile hosting an observer, then drains
/// the ray bus iteration by iteration until no tile emits a boundary
/// packet. A caller that wants a progress signal should use
/// [`viewshed_tracked`] instead.
pub async fn viewshed(
	elevation: &Layer<ElevationTile>,
	points: &[Point6D],
	config: &EngineConfig,
) -> anyhow::Result<Layer<VisibilityTile>> {
	run(elevation, points, config, None).await
}

/// Like [`viewshed`], but also records every tile key addressed by any
/// kernel invocation (seed and every iteration) into `touched_keys`, the
/// optional `touchedKeys` accumulator of §4.E "Progress monitoring".
pub async fn viewshed_tracked(
	elevation: &Layer<ElevationTile>,
	points: &[Point6D],
	config: &EngineConfig,
	touched_keys: &mut HashSet<TileKey>,
) -> anyhow::Result<Layer<VisibilityTile>> {
	run(elevation, points, config, Some(touched_keys)).await
}

async fn run(
	elevation: &Layer<ElevationTile>,
	points: &[Point6D],
	config: &EngineConfig,
	touched_keys: Option<&mut HashSet<TileKey>>,
) -> anyhow::Result<Layer<VisibilityTile>> {
	let metadata = elevation.metadata().clone();
	let resolution = compute_resolution(&metadata)?;
	let tables = Broadcast::new(ObserverTables::build(&metadata, elevation, points)?);
	let bounds = metadata.bounds;
	let cpu_concurrency = config.concurrency.cpu;

	let bus = RayBus::new();
	let visibility: DashMap<TileKey, VisibilityTile> = DashMap::new();
	let touched: DashSet<TileKey> = DashSet::new();

	info!("seeding {} tiles from {} observers", bounds.cols() * bounds.rows(), points.len());
	let seed_keys: Vec<TileKey> = bounds.iter().collect();
	let seed_results: Vec<anyhow::Result<()>> = stream::iter(seed_keys)
		.map(|key| {
			let tables = tables.clone();
			let bus = &bus;
			let visibility = &visibility;
			let touched = &touched;
			async move { seed_tile(key, elevation, &tables, bus, visibility, touched, bounds, resolution, config) }
		})
		.buffer_unordered(cpu_concurrency)
		.collect()
		.await;
	for result in seed_results {
		result?;
	}

	let mut iteration = 0usize;
	loop {
		let messages = bus.value();
		bus.reset();
		if messages.is_empty() {
			break;
		}
		iteration += 1;

		let mut grouped: HashMap<TileKey, HashMap<usize, HashMap<Direction, Vec<Ray>>>> = HashMap::new();
		for message in messages {
			grouped
				.entry(message.target_key)
				.or_default()
				.entry(message.causal_observer_index)
				.or_default()
				.entry(message.direction)
				.or_default()
				.extend(message.rays);
		}
		info!("iteration {iteration}: drained into {} tiles", grouped.len());

		let tasks: Vec<anyhow::Result<()>> = stream::iter(grouped)
			.map(|(key, by_observer)| {
				let tables = tables.clone();
				let bus = &bus;
				let visibility = &visibility;
				let touched = &touched;
				async move { process_tile(key, by_observer, elevation, &tables, bus, visibility, touched, bounds, resolution, config) }
			})
			.buffer_unordered(cpu_concurrency)
			.collect()
			.await;
		for result in tasks {
			result?;
		}
	}
	info!("quiescent after {iteration} iterations, {} tiles touched", touched.len());

	if let Some(set) = touched_keys {
		set.extend(touched.iter().map(|entry| *entry));
	}

	let tiles: HashMap<TileKey, VisibilityTile> = visibility.into_iter().collect();
	Layer::new(metadata.as_visibility_metadata(), tiles)
}

#[allow(clippy::too_many_arguments)]
fn seed_tile(
	key: TileKey,
	elevation: &Layer<ElevationTile>,
	tables: &ObserverTables,
	bus: &RayBus,
	visibility: &DashMap<TileKey, VisibilityTile>,
	touched: &DashSet<TileKey>,
	bounds: KeyBounds,
	resolution: f64,
	config: &EngineConfig,
) -> anyhow::Result<()> {
	let elevation_tile = elevation.get(key).ok_or_else(|| ViewshedError::InvalidLayer(format!("missing elevation tile {key}")))?;
	let mut tile = VisibilityTile::empty(elevation_tile.cols(), elevation_tile.rows());
	touched.insert(key);

	for index in tables.sorted_indices_at(key) {
		let info = tables.info_of(index)?;
		let view_height = tables.effective_height_of(index)?;
		let params = build_kernel_params(config, resolution, info);
		debug!("tile {key}: seeding observer {index}");
		let input = KernelInput {
			elevation: elevation_tile,
			visibility: &mut tile,
			start_col: i64::from(info.col),
			start_row: i64::from(info.row),
			view_height,
			direction: Direction::FromInside,
			rays: None,
		};
		let bundle = run_kernel(input, &params);
		emit_bundle(bus, key, index, bundle, bounds, touched);
	}

	visibility.insert(key, tile);
	Ok(())
}

#[allow(clippy::too_many_arguments)]
fn process_tile(
	key: TileKey,
	by_observer: HashMap<usize, HashMap<Direction, Vec<Ray>>>,
	elevation: &Layer<ElevationTile>,
	tables: &ObserverTables,
	bus: &RayBus,
	visibility: &DashMap<TileKey, VisibilityTile>,
	touched: &DashSet<TileKey>,
	bounds: KeyBounds,
	resolution: f64,
	config: &EngineConfig,
) -> anyhow::Result<()> {
	let elevation_tile = elevation.get(key).ok_or_else(|| ViewshedError::InvalidLayer(format!("missing elevation tile {key}")))?;
	let mut tile = visibility
		.get_mut(&key)
		.ok_or_else(|| ViewshedError::InvalidLayer(format!("no seeded visibility tile at {key}")))?;

	let mut indices: Vec<usize> = by_observer.keys().copied().collect();
	indices.sort_unstable();

	for index in indices {
		let info = tables.info_of(index)?;
		let view_height = tables.effective_height_of(index)?;
		let params = build_kernel_params(config, resolution, info);
		let start_col = (info.key.col - key.col) * i64::from(elevation_tile.cols()) + i64::from(info.col);
		let start_row = (info.key.row - key.row) * i64::from(elevation_tile.rows()) + i64::from(info.row);

		let directions = &by_observer[&index];
		for direction in Direction::PROCESSING_ORDER {
			let Some(rays) = directions.get(&direction) else { continue };
			let mut rays = rays.clone();
			sort_rays_by_theta(&mut rays);
			debug!("tile {key}: replaying {} rays from observer {index} via {direction:?}", rays.len());
			let input = KernelInput {
				elevation: elevation_tile,
				visibility: &mut tile,
				start_col,
				start_row,
				view_height,
				direction,
				rays: Some(rays),
			};
			let bundle = run_kernel(input, &params);
			emit_bundle(bus, key, index, bundle, bounds, touched);
		}
	}

	Ok(())
}

fn build_kernel_params(config: &EngineConfig, resolution: f64, info: &PointInfo) -> KernelParams {
	KernelParams {
		resolution,
		max_distance: config.max_distance,
		curvature: config.curvature,
		altitude: info.alt,
		operator: config.operator,
		camera_direction: info.angle,
		camera_fov: info.fov,
		epsilon: config.epsilon,
	}
}

/// Translate one kernel's outgoing bundle into bus messages, dropping any
/// ray that would cross the edge of the layer itself (§8 "Containment":
/// every emitted message targets a key inside `bounds(L)`).
fn emit_bundle(bus: &RayBus, source: TileKey, causal_observer_index: usize, bundle: HashMap<Direction, Vec<Ray>>, bounds: KeyBounds, touched: &DashSet<TileKey>) {
	for (direction, rays) in bundle {
		if rays.is_empty() {
			continue;
		}
		let Some(target) = source.neighbor(direction) else { continue };
		if !bounds.contains(target) {
			continue;
		}
		touched.insert(target);
		bus.add(Message::new(target, causal_observer_index, direction, rays));
	}
}
