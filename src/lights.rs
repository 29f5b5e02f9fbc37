//! The shared light rig.
//!
//! Four lights are shared by every scene: an ambient fill, a directional
//! "sun", and two accent point lights. Scenes don't own lights; each scene
//! only declares the intensities the rig should settle on while it is active.

use glam::Vec3;

use crate::scene::SceneIndex;
use crate::tween::Tween;

/// Intensities of the four rig lights, in rig order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightLevels {
    pub ambient: f32,
    pub sun: f32,
    pub blue: f32,
    pub purple: f32,
}

impl LightLevels {
    pub const fn new(ambient: f32, sun: f32, blue: f32, purple: f32) -> Self {
        Self {
            ambient,
            sun,
            blue,
            purple,
        }
    }

    /// Target intensities while `scene` is active.
    pub fn for_scene(scene: SceneIndex) -> Self {
        match scene {
            SceneIndex::Earth => Self::new(0.3, 1.2, 0.4, 0.2),
            SceneIndex::Uranus => Self::new(0.25, 0.9, 0.8, 0.3),
            SceneIndex::Galaxy => Self::new(0.15, 0.4, 0.6, 0.9),
            SceneIndex::BlackHole => Self::new(0.05, 0.2, 0.3, 1.2),
        }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.ambient, self.sun, self.blue, self.purple]
    }

    pub fn from_array(values: [f32; 4]) -> Self {
        Self::new(values[0], values[1], values[2], values[3])
    }
}

/// The light rig with fixed placements and animatable intensities.
#[derive(Clone, Debug)]
pub struct LightRig {
    pub levels: LightLevels,
    pub sun_direction: Vec3,
    pub blue_position: Vec3,
    pub purple_position: Vec3,
}

impl LightRig {
    pub fn new(levels: LightLevels) -> Self {
        Self {
            levels,
            sun_direction: Vec3::new(-1.0, -0.3, -0.6).normalize(),
            blue_position: Vec3::new(-6.0, 3.0, 4.0),
            purple_position: Vec3::new(6.0, -2.0, 3.0),
        }
    }

    pub fn for_scene(scene: SceneIndex) -> Self {
        Self::new(LightLevels::for_scene(scene))
    }

    /// Build the per-light tweens that carry the rig from its current levels to `target`.
    pub fn fade_to(&self, target: LightLevels, start: f32, duration: f32) -> [Tween<f32>; 4] {
        let from = self.levels.to_array();
        let to = target.to_array();
        std::array::from_fn(|i| Tween::new(from[i], to[i], start, duration))
    }

    /// Apply a set of light tweens at time `now`.
    pub fn apply(&mut self, tweens: &[Tween<f32>; 4], now: f32) {
        self.levels = LightLevels::from_array(std::array::from_fn(|i| tweens[i].value_at(now)));
    }
}

impl Default for LightRig {
    fn default() -> Self {
        Self::for_scene(SceneIndex::Earth)
    }
}
