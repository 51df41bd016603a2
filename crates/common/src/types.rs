use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Spatial transform: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Model matrix in scale, rotate, translate order.
    pub fn matrix(&self) -> glam::Mat4 {
        glam::Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

/// Kind of scenery instance. Every instance in the world belongs to exactly one.
///
/// Ordering is the draw and iteration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    RoadTile,
    CenterLine,
    BarrierLine,
    StreetLight,
    RoadBarrier,
    LeftTerrain,
    RightTerrain,
    Rider,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::RoadTile,
        Category::CenterLine,
        Category::BarrierLine,
        Category::StreetLight,
        Category::RoadBarrier,
        Category::LeftTerrain,
        Category::RightTerrain,
        Category::Rider,
    ];

    /// Categories that scroll and recycle. The rider stays put.
    pub const SCROLLING: [Category; 7] = [
        Category::RoadTile,
        Category::CenterLine,
        Category::BarrierLine,
        Category::StreetLight,
        Category::RoadBarrier,
        Category::LeftTerrain,
        Category::RightTerrain,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::RoadTile => "road_tile",
            Category::CenterLine => "center_line",
            Category::BarrierLine => "barrier_line",
            Category::StreetLight => "street_light",
            Category::RoadBarrier => "road_barrier",
            Category::LeftTerrain => "left_terrain",
            Category::RightTerrain => "right_terrain",
            Category::Rider => "rider",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// One of the three pre-positioned cameras, in left-to-right screen order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CameraSlot {
    Left,
    Center,
    Right,
}

impl CameraSlot {
    pub const ALL: [CameraSlot; 3] = [CameraSlot::Left, CameraSlot::Center, CameraSlot::Right];

    pub fn index(self) -> usize {
        match self {
            CameraSlot::Left => 0,
            CameraSlot::Center => 1,
            CameraSlot::Right => 2,
        }
    }
}

impl fmt::Display for CameraSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CameraSlot::Left => "Left",
            CameraSlot::Center => "Center",
            CameraSlot::Right => "Right",
        })
    }
}
