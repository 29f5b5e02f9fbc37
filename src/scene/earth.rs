use glam::Vec3;
use log::debug;

use super::{
    Bounds, InteractionEvent, ParticleSystem, Ripple, Scene, SceneClock, SceneIndex, Shading,
    TransformGroup, starfield,
};

const RADIUS: f32 = 1.5;
const ATMOSPHERE: f32 = 1.04;
const AXIAL_TILT_DEG: f32 = 23.44;
const SPIN_RATE: f32 = 0.1;
const CLOUD_RATE: f32 = 0.13;
const STARS: usize = 1500;
const RIPPLE_SECONDS: f32 = 1.5;

/// A textured, slowly spinning globe with a drifting cloud layer.
pub struct EarthScene {
    group: TransformGroup,
    clock: SceneClock,
    seed: u64,
    spin: f32,
    clouds: f32,
    ripple: Option<Ripple>,
    particles: Vec<ParticleSystem>,
}

impl EarthScene {
    pub fn new(seed: u64) -> Self {
        Self {
            group: TransformGroup::new(),
            clock: SceneClock::default(),
            seed,
            spin: 0.0,
            clouds: 0.0,
            ripple: None,
            particles: Vec::new(),
        }
    }

    /// Rotation of the surface about its axis, in radians.
    pub fn spin(&self) -> f32 {
        self.spin
    }

    pub fn ripple(&self) -> Option<&Ripple> {
        self.ripple.as_ref()
    }
}

impl Scene for EarthScene {
    fn index(&self) -> SceneIndex {
        SceneIndex::Earth
    }

    fn setup(&mut self) {
        self.particles = vec![starfield(self.seed, STARS)];
    }

    fn update(&mut self, time: f32) {
        let local = self.clock.tick(time);
        self.spin = local * SPIN_RATE;
        self.clouds = local * CLOUD_RATE;
        for system in &mut self.particles {
            system.advance(local);
        }
        if self.ripple.is_some_and(|r| r.is_expired(time)) {
            self.ripple = None;
        }
    }

    fn handle_interaction(&mut self, event: &InteractionEvent) -> bool {
        let ray = event.ray.to_local(self.group.matrix());
        let Some(t) = ray.intersect_sphere(Vec3::ZERO, RADIUS * ATMOSPHERE) else {
            return false;
        };
        let point = ray.point_at(t);
        debug!(target: "stellar::scene", "earth surface hit at {point:?}");
        self.ripple = Some(Ripple::new(point, event.time, RIPPLE_SECONDS));
        true
    }

    fn update_particle_count(&mut self, multiplier: f32) {
        for system in &mut self.particles {
            system.rebuild(multiplier);
            system.advance(self.clock.local());
        }
    }

    fn reset(&mut self) {
        self.clock.restart();
        self.spin = 0.0;
        self.clouds = 0.0;
        self.ripple = None;
        for system in &mut self.particles {
            system.advance(0.0);
        }
    }

    fn group(&self) -> &TransformGroup {
        &self.group
    }

    fn group_mut(&mut self) -> &mut TransformGroup {
        &mut self.group
    }

    fn bounds(&self) -> Bounds {
        Bounds {
            center: Vec3::ZERO,
            radius: RADIUS * ATMOSPHERE,
        }
    }

    fn shading(&self) -> Shading {
        Shading {
            params: [
                self.spin,
                self.clouds,
                RADIUS,
                AXIAL_TILT_DEG.to_radians(),
                ATMOSPHERE,
                0.0,
                0.0,
                0.0,
            ],
            highlight: self
                .ripple
                .map(|r| r.highlight(self.clock.now()))
                .unwrap_or_default(),
        }
    }

    fn particle_systems(&self) -> &[ParticleSystem] {
        &self.particles
    }

    fn surface_texture(&self) -> Option<&'static str> {
        Some("earth")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Ray;

    fn scene() -> EarthScene {
        let mut scene = EarthScene::new(5);
        scene.setup();
        scene
    }

    #[test]
    fn reset_returns_spin_to_zero() {
        let mut scene = scene();
        scene.update(40.0);
        assert!(scene.spin() > 0.0);
        scene.reset();
        assert_eq!(scene.spin(), 0.0);
        scene.update(41.0);
        assert!((scene.spin() - SPIN_RATE).abs() < 1e-5);
    }

    #[test]
    fn click_on_globe_leaves_a_ripple() {
        let mut scene = scene();
        let hit = InteractionEvent::new(Ray::new(Vec3::new(0.0, 0.0, 6.0), Vec3::NEG_Z), 1.0);
        assert!(scene.handle_interaction(&hit));
        assert!(scene.ripple().is_some());

        scene.update(1.2);
        assert!(scene.shading().highlight[3] > 0.0);
        scene.update(1.0 + RIPPLE_SECONDS);
        assert!(scene.ripple().is_none());
    }

    #[test]
    fn click_into_space_misses() {
        let mut scene = scene();
        let miss = InteractionEvent::new(Ray::new(Vec3::new(0.0, 0.0, 6.0), Vec3::X), 1.0);
        assert!(!scene.handle_interaction(&miss));
    }

    #[test]
    fn update_leaves_group_alone() {
        let mut scene = scene();
        scene.group_mut().position = Vec3::new(0.0, 0.0, -20.0);
        scene.update(3.0);
        assert_eq!(scene.group().position, Vec3::new(0.0, 0.0, -20.0));
    }

    #[test]
    fn star_density_follows_multiplier() {
        let mut scene = scene();
        scene.update_particle_count(0.3);
        assert_eq!(scene.particle_systems()[0].count(), 450);
    }
}
