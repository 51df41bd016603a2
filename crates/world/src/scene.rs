use crate::config::SceneConfig;
use lanescape_assets::{AssetStore, load_model_or, mesh};
use lanescape_common::Category;
use std::path::Path;

/// Build the mesh for every category.
///
/// Road, lines and terrain are procedural. Street lights, barriers and the
/// rider come from `.glb` files under `asset_dir`; a missing or broken file
/// is logged and replaced by a proxy shape.
pub fn scene_meshes(config: &SceneConfig, asset_dir: &Path) -> AssetStore {
    let _span = tracing::info_span!("scene_meshes", dir = %asset_dir.display()).entered();
    let mut store = AssetStore::new();
    let length = config.road.tile_length;

    store.bind(Category::RoadTile, mesh::plane(config.road.width, length, 1, 1));

    let line = mesh::plane(config.lane_lines.width, length, 1, 1);
    store.bind(Category::CenterLine, line.clone());
    store.bind(Category::BarrierLine, line);

    let t = &config.terrain;
    let mut bank = mesh::plane(t.width, length, t.width_segments, t.length_segments);
    mesh::curve_bank(&mut bank, t.width, t.curve_strength);
    store.bind(Category::LeftTerrain, bank.clone());
    store.bind(Category::RightTerrain, bank);

    store.bind(
        Category::StreetLight,
        load_model_or(&asset_dir.join(&config.street_lights.model), mesh::proxy_street_light),
    );
    store.bind(
        Category::RoadBarrier,
        load_model_or(&asset_dir.join(&config.road_barriers.model), mesh::proxy_road_barrier),
    );
    store.bind(
        Category::Rider,
        load_model_or(&asset_dir.join(&config.rider.model), mesh::proxy_rider),
    );

    tracing::debug!(meshes = store.len(), "scene meshes ready");
    store
}
