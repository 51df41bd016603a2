use crate::config::RiderConfig;
use glam::{Quat, Vec3};
use lanescape_common::Transform;

/// The moped and rider in the right-hand lane.
///
/// The rider never scrolls. It drifts sideways on a sine wave and leans into
/// the drift, easing towards the target lean a fixed fraction per frame.
#[derive(Debug, Clone)]
pub struct Rider {
    config: RiderConfig,
    transform: Transform,
    lean: f32,
}

impl Rider {
    pub fn new(config: RiderConfig) -> Self {
        let transform = Transform::from_position(Vec3::new(config.center_x, config.elevation, 0.0))
            .with_scale(Vec3::splat(config.scale));
        Self {
            config,
            transform,
            lean: 0.0,
        }
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Current lean about the Z axis, in radians.
    pub fn lean(&self) -> f32 {
        self.lean
    }

    /// Update the pose for the given scene time in seconds.
    pub fn sway(&mut self, elapsed: f32) {
        let c = &self.config;
        let phase = elapsed * c.sway_speed;
        self.transform.position.x = c.center_x + phase.sin() * c.sway_range;

        let target = phase.cos() * c.lean;
        self.lean += (target - self.lean) * c.lean_smoothing;
        self.transform.rotation = Quat::from_rotation_z(self.lean);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn starts_centred_and_upright() {
        let rider = Rider::new(RiderConfig::default());
        assert_eq!(rider.transform().position, Vec3::new(1.25, 0.6, 0.0));
        assert_eq!(rider.transform().scale, Vec3::splat(0.5));
        assert_eq!(rider.lean(), 0.0);
    }

    #[test]
    fn sway_stays_within_range() {
        let mut rider = Rider::new(RiderConfig::default());
        for frame in 0..600 {
            rider.sway(frame as f32 / 60.0);
            let x = rider.transform().position.x;
            assert!((x - 1.25).abs() <= 0.1 + 1e-6);
            assert!(rider.lean().abs() <= 0.1 + 1e-6);
        }
    }

    #[test]
    fn peak_drift_at_quarter_period() {
        let mut rider = Rider::new(RiderConfig::default());
        rider.sway(FRAC_PI_2);
        assert!((rider.transform().position.x - 1.35).abs() < 1e-5);
    }

    #[test]
    fn lean_eases_towards_target() {
        let mut rider = Rider::new(RiderConfig::default());
        // At t = 0 the target lean is the full 0.1
        rider.sway(0.0);
        assert!((rider.lean() - 0.0025).abs() < 1e-6);
        for _ in 0..1_000 {
            rider.sway(0.0);
        }
        assert!((rider.lean() - 0.1).abs() < 1e-4);
    }
}
