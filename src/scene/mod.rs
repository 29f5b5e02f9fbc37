//! The four themed scenes and the contract they share.
//!
//! All four scenes are built once at start-up and live for the whole run.
//! Only one is visible in the steady state; during a transition the outgoing
//! and incoming scenes are both visible while the orchestrator animates their
//! transform groups. A scene never changes its own visibility and never
//! touches the camera, the lights, or another scene.
//!
//! # Example
//!
//! ```
//! use stellar::scene::{SceneIndex, SceneSet};
//!
//! let mut scenes = SceneSet::new(7);
//! scenes.show_only(SceneIndex::Earth);
//! scenes.update_visible(0.5);
//!
//! assert!(scenes.get(SceneIndex::Earth).group().visible);
//! assert!(!scenes.get(SceneIndex::Galaxy).group().visible);
//! ```

mod black_hole;
mod earth;
mod galaxy;
mod interaction;
mod particles;
mod uranus;

pub use black_hole::BlackHoleScene;
pub use earth::EarthScene;
pub use galaxy::GalaxyScene;
pub use interaction::{InteractionEvent, Ray, Ripple};
pub use particles::{Particle, ParticleLayout, ParticleStyle, ParticleSystem};
pub use uranus::UranusScene;

use glam::{EulerRot, Mat4, Quat, Vec3};

/// Identifies one of the four scenes.
///
/// Ordering is meaningful: moving to a higher index is a "forward"
/// transition, which decides the direction objects travel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SceneIndex {
    Earth = 0,
    Uranus = 1,
    Galaxy = 2,
    BlackHole = 3,
}

impl SceneIndex {
    pub const ALL: [SceneIndex; 4] = [
        SceneIndex::Earth,
        SceneIndex::Uranus,
        SceneIndex::Galaxy,
        SceneIndex::BlackHole,
    ];

    pub const COUNT: usize = 4;

    pub fn index(self) -> usize {
        self as usize
    }

    /// Look up a scene by position, `None` when out of range.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Name shown in the scene label.
    pub fn display_name(self) -> &'static str {
        match self {
            SceneIndex::Earth => "Earth",
            SceneIndex::Uranus => "Uranus",
            SceneIndex::Galaxy => "The Galaxy",
            SceneIndex::BlackHole => "Black Hole",
        }
    }

    /// The following scene, wrapping around after the last.
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::COUNT]
    }

    /// The preceding scene, wrapping around before the first.
    pub fn previous(self) -> Self {
        Self::ALL[(self.index() + Self::COUNT - 1) % Self::COUNT]
    }

    /// `true` when travelling from `self` to `to` moves forward through the tour.
    pub fn is_forward_to(self, to: SceneIndex) -> bool {
        to > self
    }
}

impl TryFrom<usize> for SceneIndex {
    type Error = usize;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::from_index(value).ok_or(value)
    }
}

impl std::fmt::Display for SceneIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// The container for everything a scene renders.
///
/// Rotation is stored as XYZ Euler angles in radians so the orchestrator can
/// interpolate each axis independently.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformGroup {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: f32,
    pub visible: bool,
}

impl Default for TransformGroup {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: 1.0,
            visible: false,
        }
    }
}

impl TransformGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// A group is usable when every component is finite and the scale is positive.
    pub fn is_valid(&self) -> bool {
        self.position.is_finite() && self.rotation.is_finite() && self.scale.is_finite() && self.scale > 0.0
    }

    pub fn quat(&self) -> Quat {
        Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        )
    }

    /// Local-to-world matrix.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(Vec3::splat(self.scale), self.quat(), self.position)
    }

    /// Place the group back at the origin with no rotation.
    pub fn reset_pose(&mut self) {
        self.position = Vec3::ZERO;
        self.rotation = Vec3::ZERO;
        self.scale = 1.0;
    }
}

/// Bounding sphere of a scene's content, in group-local space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub center: Vec3,
    pub radius: f32,
}

/// Per-frame shading inputs a scene hands to the renderer.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Shading {
    /// Scene-specific shader parameters; their meaning is defined per theme.
    pub params: [f32; 8],
    /// Local-space point of the most recent interaction and its strength (xyz, w).
    pub highlight: [f32; 4],
}

/// Scene-local time. Restarting moves the epoch, not the global clock.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct SceneClock {
    epoch: f32,
    now: f32,
}

impl SceneClock {
    /// Record the global time and return the local time.
    pub(crate) fn tick(&mut self, time: f32) -> f32 {
        self.now = time;
        self.local()
    }

    pub(crate) fn now(&self) -> f32 {
        self.now
    }

    pub(crate) fn local(&self) -> f32 {
        (self.now - self.epoch).max(0.0)
    }

    pub(crate) fn restart(&mut self) {
        self.epoch = self.now;
    }
}

/// Distant background stars, shared by every theme.
pub(crate) fn starfield(seed: u64, count: usize) -> ParticleSystem {
    ParticleSystem::new(
        ParticleLayout::Shell {
            inner: 60.0,
            outer: 120.0,
            angular_speed: 0.004,
        },
        ParticleStyle::new([1.0, 0.97, 0.9], [0.7, 0.8, 1.0], 0.6, 1.8),
        count,
        seed,
    )
}

/// The contract every themed scene implements.
pub trait Scene {
    fn index(&self) -> SceneIndex;

    /// Build the scene's content. Called once, at construction.
    fn setup(&mut self);

    /// Advance time-driven motion for this scene only.
    fn update(&mut self, time: f32);

    /// Scene-local hit testing and feedback. Returns `true` if something was hit.
    fn handle_interaction(&mut self, event: &InteractionEvent) -> bool;

    /// Rebuild particle systems at `multiplier` times their base density.
    fn update_particle_count(&mut self, multiplier: f32);

    /// Return rotations and orbital phases to their initial values.
    fn reset(&mut self);

    fn group(&self) -> &TransformGroup;

    fn group_mut(&mut self) -> &mut TransformGroup;

    fn bounds(&self) -> Bounds;

    fn shading(&self) -> Shading;

    fn particle_systems(&self) -> &[ParticleSystem];

    /// Transform from the frame the content is built in to group space.
    fn content_frame(&self) -> Mat4 {
        Mat4::IDENTITY
    }

    /// Name of the surface texture this scene samples, if any.
    fn surface_texture(&self) -> Option<&'static str> {
        None
    }
}

/// Owns all four scenes, addressable by [`SceneIndex`].
pub struct SceneSet {
    scenes: Vec<Box<dyn Scene>>,
}

impl SceneSet {
    /// Build and set up every scene. `seed` drives particle placement.
    pub fn new(seed: u64) -> Self {
        let mut scenes: Vec<Box<dyn Scene>> = vec![
            Box::new(EarthScene::new(seed)),
            Box::new(UranusScene::new(seed.wrapping_add(1))),
            Box::new(GalaxyScene::new(seed.wrapping_add(2))),
            Box::new(BlackHoleScene::new(seed.wrapping_add(3))),
        ];
        for scene in &mut scenes {
            scene.setup();
        }
        Self { scenes }
    }

    pub fn get(&self, index: SceneIndex) -> &dyn Scene {
        self.scenes[index.index()].as_ref()
    }

    pub fn get_mut(&mut self, index: SceneIndex) -> &mut dyn Scene {
        self.scenes[index.index()].as_mut()
    }

    /// Mutable access to the transform groups of two different scenes at once.
    pub fn groups_mut(
        &mut self,
        a: SceneIndex,
        b: SceneIndex,
    ) -> Option<(&mut TransformGroup, &mut TransformGroup)> {
        let (i, j) = (a.index(), b.index());
        if i == j || i >= self.scenes.len() || j >= self.scenes.len() {
            return None;
        }
        if i < j {
            let (lo, hi) = self.scenes.split_at_mut(j);
            Some((lo[i].group_mut(), hi[0].group_mut()))
        } else {
            let (lo, hi) = self.scenes.split_at_mut(i);
            Some((hi[0].group_mut(), lo[j].group_mut()))
        }
    }

    /// Depth at which two scenes can be placed one behind the other without
    /// their bounding spheres touching.
    pub fn clearance(&self, a: SceneIndex, b: SceneIndex) -> f32 {
        let reach = |index: SceneIndex| {
            let bounds = self.get(index).bounds();
            bounds.center.length() + bounds.radius
        };
        reach(a) + reach(b)
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Scene> {
        self.scenes.iter().map(|s| s.as_ref())
    }

    /// Make `index` the only visible scene.
    pub fn show_only(&mut self, index: SceneIndex) {
        for scene in &mut self.scenes {
            let visible = scene.index() == index;
            scene.group_mut().visible = visible;
        }
    }

    pub fn visible(&self) -> impl Iterator<Item = &dyn Scene> {
        self.iter().filter(|s| s.group().visible)
    }

    /// Per-frame update for every visible scene.
    pub fn update_visible(&mut self, time: f32) {
        for scene in &mut self.scenes {
            if scene.group().visible {
                scene.update(time);
            }
        }
    }

    pub fn update_particle_count(&mut self, multiplier: f32) {
        for scene in &mut self.scenes {
            scene.update_particle_count(multiplier);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_round_trips_and_rejects_out_of_range() {
        for (i, scene) in SceneIndex::ALL.iter().enumerate() {
            assert_eq!(SceneIndex::try_from(i), Ok(*scene));
        }
        assert_eq!(SceneIndex::try_from(4), Err(4));
    }

    #[test]
    fn navigation_wraps() {
        assert_eq!(SceneIndex::BlackHole.next(), SceneIndex::Earth);
        assert_eq!(SceneIndex::Earth.previous(), SceneIndex::BlackHole);
        assert!(SceneIndex::Earth.is_forward_to(SceneIndex::Galaxy));
        assert!(!SceneIndex::BlackHole.is_forward_to(SceneIndex::Uranus));
    }

    #[test]
    fn set_is_built_in_index_order() {
        let scenes = SceneSet::new(1);
        for (scene, expected) in scenes.iter().zip(SceneIndex::ALL) {
            assert_eq!(scene.index(), expected);
        }
    }

    #[test]
    fn groups_mut_hands_out_both_groups_in_argument_order() {
        let mut scenes = SceneSet::new(1);
        {
            let (from, to) = scenes
                .groups_mut(SceneIndex::BlackHole, SceneIndex::Uranus)
                .expect("distinct scenes");
            from.position.x = 3.0;
            to.position.x = 1.0;
        }
        assert_eq!(scenes.get(SceneIndex::BlackHole).group().position.x, 3.0);
        assert_eq!(scenes.get(SceneIndex::Uranus).group().position.x, 1.0);
        assert!(scenes.groups_mut(SceneIndex::Galaxy, SceneIndex::Galaxy).is_none());
    }

    #[test]
    fn clearance_covers_both_bounding_spheres() {
        let scenes = SceneSet::new(1);
        let galaxy = scenes.get(SceneIndex::Galaxy).bounds();
        let hole = scenes.get(SceneIndex::BlackHole).bounds();
        let clearance = scenes.clearance(SceneIndex::Galaxy, SceneIndex::BlackHole);
        assert!(clearance >= galaxy.radius + hole.radius);
        assert_eq!(clearance, scenes.clearance(SceneIndex::BlackHole, SceneIndex::Galaxy));
        assert!(
            scenes.clearance(SceneIndex::Earth, SceneIndex::Uranus)
                < scenes.clearance(SceneIndex::Galaxy, SceneIndex::BlackHole)
        );
    }

    #[test]
    fn only_visible_scenes_advance() {
        let mut scenes = SceneSet::new(3);
        scenes.show_only(SceneIndex::Uranus);
        let before = scenes.get(SceneIndex::Earth).shading();
        scenes.update_visible(12.0);
        assert_eq!(scenes.get(SceneIndex::Earth).shading(), before);
        assert_eq!(scenes.visible().count(), 1);
    }

    #[test]
    fn invalid_group_is_detected() {
        let mut group = TransformGroup::new();
        assert!(group.is_valid());
        group.position.z = f32::NAN;
        assert!(!group.is_valid());
    }
}
