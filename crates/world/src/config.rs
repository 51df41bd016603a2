use lanescape_common::Color;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors from loading or validating a scene configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid scene config: {0}")]
    Invalid(String),
}

/// Everything that shapes the procedural road scene.
///
/// Every section defaults, so a YAML file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Forward travel in units per second.
    pub scroll_speed: f32,
    /// Instances whose z passes this value are shifted back by their train length.
    pub recycle_z: f32,
    /// Overlap between consecutive tiles, hides seams.
    pub tile_overlap: f32,
    pub road: RoadConfig,
    pub lane_lines: LaneLineConfig,
    pub terrain: TerrainConfig,
    pub street_lights: StreetLightConfig,
    pub road_barriers: RoadBarrierConfig,
    pub rider: RiderConfig,
    pub atmosphere: AtmosphereConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadConfig {
    pub width: f32,
    pub tile_length: f32,
    pub count: usize,
    pub elevation: f32,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaneLineConfig {
    pub width: f32,
    /// Rows of line pairs. Each row holds a left and a right line.
    pub count: usize,
    pub elevation: f32,
    /// Half the separation between the two centre lines.
    pub center_gap: f32,
    /// Distance of the edge lines from the road axis.
    pub barrier_gap: f32,
    pub center_color: Color,
    pub barrier_color: Color,
}

/// Upper bound on terrain grid subdivisions along either axis.
pub const MAX_TERRAIN_SEGMENTS: u32 = 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub width: f32,
    /// Tiles per side.
    pub count: usize,
    pub width_segments: u32,
    pub length_segments: u32,
    pub curve_strength: f32,
    pub offset_x: f32,
    pub elevation: f32,
    pub color: Color,
}

/// Placement shared by the mirrored rows of street lights and barriers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropRow {
    pub spacing: f32,
    /// Rows of pairs.
    pub count: usize,
    pub offset_x: f32,
    pub elevation: f32,
    pub scale: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreetLightConfig {
    /// File name under the asset directory.
    pub model: String,
    pub spacing: f32,
    pub count: usize,
    pub offset_x: f32,
    pub elevation: f32,
    pub scale: f32,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadBarrierConfig {
    /// File name under the asset directory.
    pub model: String,
    pub spacing: f32,
    pub count: usize,
    pub offset_x: f32,
    pub elevation: f32,
    pub scale: f32,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiderConfig {
    pub model: String,
    pub scale: f32,
    pub elevation: f32,
    pub center_x: f32,
    pub sway_range: f32,
    pub sway_speed: f32,
    /// Peak lean angle in radians.
    pub lean: f32,
    /// Per-frame blend factor towards the target lean.
    pub lean_smoothing: f32,
    pub color: Color,
}

/// Background, lighting, fog and tone mapping shared by every viewport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtmosphereConfig {
    pub clear_color: Color,
    pub sky_color: Color,
    pub ground_color: Color,
    pub light_intensity: f32,
    pub fog_color: Color,
    /// Exponential-squared fog density.
    pub fog_density: f32,
    pub exposure: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            scroll_speed: 10.0,
            recycle_z: 30.0,
            tile_overlap: 0.05,
            road: RoadConfig::default(),
            lane_lines: LaneLineConfig::default(),
            terrain: TerrainConfig::default(),
            street_lights: StreetLightConfig::default(),
            road_barriers: RoadBarrierConfig::default(),
            rider: RiderConfig::default(),
            atmosphere: AtmosphereConfig::default(),
        }
    }
}

impl Default for RoadConfig {
    fn default() -> Self {
        Self {
            width: 7.0,
            tile_length: 30.0,
            count: 30,
            elevation: 0.55,
            color: Color::from_rgb(0x5E5D5B),
        }
    }
}

impl Default for LaneLineConfig {
    fn default() -> Self {
        Self {
            width: 0.075,
            count: 200,
            elevation: 0.6,
            center_gap: 0.1,
            barrier_gap: 2.3,
            center_color: Color::from_rgb(0xBD8311),
            barrier_color: Color::from_rgb(0xC4B593),
        }
    }
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            width: 1.5,
            count: 30,
            width_segments: 10,
            length_segments: 42,
            curve_strength: 0.25,
            offset_x: 4.2,
            elevation: 0.55,
            color: Color::from_rgb(0x5E5D5B),
        }
    }
}

impl Default for StreetLightConfig {
    fn default() -> Self {
        let spacing = 15.0;
        // Cover thirty road segments' worth of spacing, inclusive of both ends
        let count = (30.0_f32 * spacing / spacing).ceil() as usize + 1;
        Self {
            model: "streetlight.glb".into(),
            spacing,
            count,
            offset_x: 3.5,
            elevation: 0.6,
            scale: 0.35,
            color: Color::from_rgb(0x8A8D91),
        }
    }
}

impl StreetLightConfig {
    pub fn row(&self) -> PropRow {
        PropRow {
            spacing: self.spacing,
            count: self.count,
            offset_x: self.offset_x,
            elevation: self.elevation,
            scale: self.scale,
        }
    }
}

impl Default for RoadBarrierConfig {
    fn default() -> Self {
        Self {
            model: "roadBarrier.glb".into(),
            spacing: 2.7,
            count: 201,
            offset_x: 3.0,
            elevation: 0.6,
            scale: 0.3,
            color: Color::from_rgb(0xD9D4CC),
        }
    }
}

impl RoadBarrierConfig {
    pub fn row(&self) -> PropRow {
        PropRow {
            spacing: self.spacing,
            count: self.count,
            offset_x: self.offset_x,
            elevation: self.elevation,
            scale: self.scale,
        }
    }
}

impl Default for RiderConfig {
    fn default() -> Self {
        Self {
            model: "meonmoped.glb".into(),
            scale: 0.5,
            elevation: 0.6,
            center_x: 1.25,
            sway_range: 0.1,
            sway_speed: 1.0,
            lean: 0.1,
            lean_smoothing: 0.025,
            color: Color::from_rgb(0xC0392B),
        }
    }
}

impl Default for AtmosphereConfig {
    fn default() -> Self {
        Self {
            clear_color: Color::from_rgb(0x211D20),
            sky_color: Color::from_rgb(0xFFEAC7),
            ground_color: Color::from_rgb(0x008532),
            light_intensity: 5.0,
            fog_color: Color::from_rgb(0xBDB7B1),
            fog_density: 0.2,
            exposure: 0.8,
        }
    }
}

impl SceneConfig {
    /// Load a YAML scene file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Distance between consecutive road, line and terrain tiles.
    pub fn tile_spacing(&self) -> f32 {
        self.road.tile_length - self.tile_overlap
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn check(ok: bool, what: &str) -> Result<(), ConfigError> {
            if ok {
                Ok(())
            } else {
                Err(ConfigError::Invalid(what.to_string()))
            }
        }
        let positive = |v: f32| v.is_finite() && v > 0.0;

        check(
            self.scroll_speed.is_finite() && self.scroll_speed >= 0.0,
            "scroll_speed must be finite and non-negative",
        )?;
        check(self.recycle_z.is_finite(), "recycle_z must be finite")?;
        check(
            self.tile_overlap.is_finite() && self.tile_overlap >= 0.0,
            "tile_overlap must be finite and non-negative",
        )?;
        check(positive(self.road.width), "road.width must be positive")?;
        check(positive(self.tile_spacing()), "road.tile_length must exceed tile_overlap")?;
        check(self.road.count > 0, "road.count must be at least 1")?;
        check(positive(self.lane_lines.width), "lane_lines.width must be positive")?;
        check(self.lane_lines.count > 0, "lane_lines.count must be at least 1")?;
        check(positive(self.terrain.width), "terrain.width must be positive")?;
        check(self.terrain.count > 0, "terrain.count must be at least 1")?;
        check(self.terrain.curve_strength.is_finite(), "terrain.curve_strength must be finite")?;
        for (name, segments) in [
            ("terrain.width_segments", self.terrain.width_segments),
            ("terrain.length_segments", self.terrain.length_segments),
        ] {
            if segments > MAX_TERRAIN_SEGMENTS {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be at most {MAX_TERRAIN_SEGMENTS}"
                )));
            }
        }
        for (name, row) in [
            ("street_lights", self.street_lights.row()),
            ("road_barriers", self.road_barriers.row()),
        ] {
            if !positive(row.spacing) {
                return Err(ConfigError::Invalid(format!("{name}.spacing must be positive")));
            }
            if row.count == 0 {
                return Err(ConfigError::Invalid(format!("{name}.count must be at least 1")));
            }
            if !positive(row.scale) {
                return Err(ConfigError::Invalid(format!("{name}.scale must be positive")));
            }
        }
        check(positive(self.rider.scale), "rider.scale must be positive")?;
        check(
            (0.0..=1.0).contains(&self.rider.lean_smoothing),
            "rider.lean_smoothing must be within [0, 1]",
        )?;
        let a = &self.atmosphere;
        check(
            a.light_intensity.is_finite() && a.light_intensity >= 0.0,
            "atmosphere.light_intensity must be finite and non-negative",
        )?;
        check(
            a.fog_density.is_finite() && a.fog_density >= 0.0,
            "atmosphere.fog_density must be finite and non-negative",
        )?;
        check(positive(a.exposure), "atmosphere.exposure must be positive")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = SceneConfig::default();
        config.validate().unwrap();
        assert_eq!(config.street_lights.count, 31);
        assert_eq!(config.road_barriers.count, 201);
        assert!((config.tile_spacing() - 29.95).abs() < 1e-5);
    }

    #[test]
    fn yaml_round_trip() {
        let config = SceneConfig::default();
        let text = config.to_yaml().unwrap();
        assert!(text.contains("'#BD8311'") || text.contains("\"#BD8311\""));
        let back = SceneConfig::from_yaml(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = SceneConfig::from_yaml("scroll_speed: 4.0\nroad:\n  count: 5\n").unwrap();
        assert_eq!(config.scroll_speed, 4.0);
        assert_eq!(config.road.count, 5);
        assert_eq!(config.road.width, 7.0);
        assert_eq!(config.terrain, TerrainConfig::default());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = SceneConfig::from_yaml("scroll_speed: -1.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = SceneConfig::from_yaml("tile_overlap: 40.0\n").unwrap_err();
        assert!(err.to_string().contains("tile_length"));

        let err = SceneConfig::from_yaml("road_barriers:\n  spacing: 0.0\n").unwrap_err();
        assert!(err.to_string().contains("road_barriers.spacing"));
    }

    #[test]
    fn oversized_terrain_grid_is_rejected() {
        let err = SceneConfig::from_yaml("terrain:\n  width_segments: 4294967295\n").unwrap_err();
        assert!(err.to_string().contains("terrain.width_segments"), "{err}");

        let err = SceneConfig::from_yaml("terrain:\n  length_segments: 1025\n").unwrap_err();
        assert!(err.to_string().contains("terrain.length_segments"), "{err}");

        let config = SceneConfig::from_yaml("terrain:\n  length_segments: 1024\n").unwrap();
        assert_eq!(config.terrain.length_segments, MAX_TERRAIN_SEGMENTS);
    }

    #[test]
    fn partial_barrier_section_keeps_barrier_defaults() {
        let config = SceneConfig::from_yaml("road_barriers:\n  offset_x: 3.2\n").unwrap();
        assert_eq!(config.road_barriers.offset_x, 3.2);
        assert_eq!(config.road_barriers.spacing, 2.7);
        assert_eq!(config.road_barriers.model, "roadBarrier.glb");
    }

    #[test]
    fn atmosphere_overrides() {
        let config =
            SceneConfig::from_yaml("atmosphere:\n  fog_density: 0.0\n  clear_color: '#000000'\n").unwrap();
        assert_eq!(config.atmosphere.fog_density, 0.0);
        assert_eq!(config.atmosphere.clear_color, Color::from_rgb(0));
        assert_eq!(config.atmosphere.exposure, 0.8);

        let err = SceneConfig::from_yaml("atmosphere:\n  exposure: 0.0\n").unwrap_err();
        assert!(err.to_string().contains("exposure"));
    }

    #[test]
    fn bad_colour_is_a_yaml_error() {
        let err = SceneConfig::from_yaml("road:\n  color: 'not-a-colour'\n").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn load_from_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "recycle_z: 12.5").unwrap();
        tmp.flush().unwrap();
        let config = SceneConfig::load(tmp.path()).unwrap();
        assert_eq!(config.recycle_z, 12.5);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = SceneConfig::load("/nonexistent/scene.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
