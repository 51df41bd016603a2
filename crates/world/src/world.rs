use crate::config::{ConfigError, PropRow, SceneConfig};
use crate::rider::Rider;
use glam::{Quat, Vec3};
use lanescape_common::{Category, Color, Transform};
use std::collections::BTreeMap;
use std::f32::consts::{FRAC_PI_2, PI};

/// Surface appearance for one category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub color: Color,
    /// Lit materials receive the hemisphere light; unlit ones show their flat colour.
    pub lit: bool,
}

/// The ordered instances of one category that scroll together.
///
/// Instances are laid out in rows at `z = -row · spacing`. The train is
/// `rows · spacing` long, and that length is the wrap distance: an instance
/// pushed past the recycle threshold reappears exactly one train length back,
/// directly behind the last row.
#[derive(Debug, Clone)]
pub struct TileTrain {
    category: Category,
    instances: Vec<Transform>,
    rows: usize,
    spacing: f32,
    wrap_length: f32,
}

impl TileTrain {
    /// Lay out `rows` rows, each holding one clone of every template in `lanes`.
    pub fn new(category: Category, spacing: f32, rows: usize, lanes: &[Transform]) -> Self {
        let mut instances = Vec::with_capacity(rows * lanes.len());
        for row in 0..rows {
            let z = -(row as f32) * spacing;
            for lane in lanes {
                let mut t = *lane;
                t.position.z = z;
                instances.push(t);
            }
        }
        Self {
            category,
            instances,
            rows,
            spacing,
            wrap_length: rows as f32 * spacing,
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn instances(&self) -> &[Transform] {
        &self.instances
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    pub fn wrap_length(&self) -> f32 {
        self.wrap_length
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Move every instance forward by `distance`, wrapping any that pass
    /// `threshold` back by whole train lengths.
    ///
    /// A wrapped instance always lands in `(threshold - wrap_length, threshold]`.
    /// Returns how many instances wrapped.
    pub fn advance(&mut self, distance: f32, threshold: f32) -> usize {
        let mut recycled = 0;
        for t in &mut self.instances {
            t.position.z += distance;
            if t.position.z > threshold {
                let laps = ((t.position.z - threshold) / self.wrap_length).ceil();
                t.position.z -= laps * self.wrap_length;
                recycled += 1;
            }
        }
        recycled
    }

    /// Lowest and highest z across the train.
    pub fn z_range(&self) -> Option<(f32, f32)> {
        let mut iter = self.instances.iter().map(|t| t.position.z);
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), z| (lo.min(z), hi.max(z))))
    }
}

/// Outcome of one [`World::update`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    pub distance: f32,
    pub recycled: usize,
}

/// The scrolling road scene.
///
/// Built once from a [`SceneConfig`]; after that only positions change.
/// Nothing is spawned or destroyed per frame.
#[derive(Debug, Clone)]
pub struct World {
    config: SceneConfig,
    trains: BTreeMap<Category, TileTrain>,
    rider: Rider,
    elapsed: f32,
    frames: u64,
    travelled: f64,
}

impl World {
    /// Validate the config and lay out every train plus the rider.
    pub fn build(config: SceneConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let lay_flat = Quat::from_rotation_x(-FRAC_PI_2);
        let spacing = config.tile_spacing();
        let mut trains = BTreeMap::new();

        let road = &config.road;
        trains.insert(
            Category::RoadTile,
            TileTrain::new(
                Category::RoadTile,
                spacing,
                road.count,
                &[Transform::from_position(Vec3::new(0.0, road.elevation, 0.0)).with_rotation(lay_flat)],
            ),
        );

        let lines = &config.lane_lines;
        let line_pair = |gap: f32| {
            [-gap, gap].map(|x| {
                Transform::from_position(Vec3::new(x, lines.elevation, 0.0)).with_rotation(lay_flat)
            })
        };
        trains.insert(
            Category::CenterLine,
            TileTrain::new(Category::CenterLine, spacing, lines.count, &line_pair(lines.center_gap)),
        );
        trains.insert(
            Category::BarrierLine,
            TileTrain::new(Category::BarrierLine, spacing, lines.count, &line_pair(lines.barrier_gap)),
        );

        let terrain = &config.terrain;
        let left_bank = Transform::from_position(Vec3::new(-terrain.offset_x, terrain.elevation, 0.0))
            .with_rotation(lay_flat)
            .with_scale(Vec3::new(-1.0, 1.0, 1.0));
        let right_bank = Transform::from_position(Vec3::new(terrain.offset_x, terrain.elevation, 0.0))
            .with_rotation(lay_flat);
        trains.insert(
            Category::LeftTerrain,
            TileTrain::new(Category::LeftTerrain, spacing, terrain.count, &[left_bank]),
        );
        trains.insert(
            Category::RightTerrain,
            TileTrain::new(Category::RightTerrain, spacing, terrain.count, &[right_bank]),
        );

        trains.insert(
            Category::StreetLight,
            prop_train(Category::StreetLight, config.street_lights.row()),
        );
        trains.insert(
            Category::RoadBarrier,
            prop_train(Category::RoadBarrier, config.road_barriers.row()),
        );

        let rider = Rider::new(config.rider.clone());
        let world = Self {
            config,
            trains,
            rider,
            elapsed: 0.0,
            frames: 0,
            travelled: 0.0,
        };
        tracing::info!(instances = world.instance_count(), "world built");
        Ok(world)
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Seconds of scene time accumulated by [`World::update`].
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Total forward distance scrolled so far.
    pub fn travelled(&self) -> f64 {
        self.travelled
    }

    pub fn train(&self, category: Category) -> Option<&TileTrain> {
        self.trains.get(&category)
    }

    pub fn trains(&self) -> impl Iterator<Item = &TileTrain> {
        self.trains.values()
    }

    pub fn rider(&self) -> &Rider {
        &self.rider
    }

    /// Every instance with its category, in category order. The rider comes last.
    pub fn instances(&self) -> impl Iterator<Item = (Category, &Transform)> {
        self.trains
            .iter()
            .flat_map(|(category, train)| train.instances().iter().map(move |t| (*category, t)))
            .chain(std::iter::once((Category::Rider, self.rider.transform())))
    }

    pub fn instance_count(&self) -> usize {
        self.trains.values().map(TileTrain::len).sum::<usize>() + 1
    }

    /// Appearance for a category.
    pub fn material(&self, category: Category) -> Material {
        let c = &self.config;
        match category {
            Category::RoadTile => Material { color: c.road.color, lit: true },
            Category::CenterLine => Material { color: c.lane_lines.center_color, lit: false },
            Category::BarrierLine => Material { color: c.lane_lines.barrier_color, lit: false },
            Category::StreetLight => Material { color: c.street_lights.color, lit: true },
            Category::RoadBarrier => Material { color: c.road_barriers.color, lit: true },
            Category::LeftTerrain | Category::RightTerrain => Material { color: c.terrain.color, lit: true },
            Category::Rider => Material { color: c.rider.color, lit: true },
        }
    }

    /// Advance the scene by `dt` seconds: scroll and recycle every train and
    /// sway the rider. Negative or non-finite deltas count as zero.
    pub fn update(&mut self, dt: f32) -> FrameStats {
        let _span = tracing::debug_span!("world_update").entered();
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        self.elapsed += dt;
        self.frames += 1;

        let distance = self.config.scroll_speed * dt;
        let threshold = self.config.recycle_z;
        let recycled = self
            .trains
            .values_mut()
            .map(|train| train.advance(distance, threshold))
            .sum();
        self.travelled += distance as f64;

        self.rider.sway(self.elapsed);

        if recycled > 0 {
            tracing::trace!(recycled, frame = self.frames, "instances recycled");
        }
        FrameStats { distance, recycled }
    }
}

/// Mirrored pair per row: left faces the road as modelled, right is turned around.
fn prop_train(category: Category, row: PropRow) -> TileTrain {
    let scale = Vec3::splat(row.scale);
    let left = Transform::from_position(Vec3::new(-row.offset_x, row.elevation, 0.0)).with_scale(scale);
    let right = Transform::from_position(Vec3::new(row.offset_x, row.elevation, 0.0))
        .with_rotation(Quat::from_rotation_y(PI))
        .with_scale(scale);
    TileTrain::new(category, row.spacing, row.count, &[left, right])
}
