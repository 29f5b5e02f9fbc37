use glam::Vec3;
use log::debug;

use super::{
    Bounds, InteractionEvent, ParticleLayout, ParticleStyle, ParticleSystem, Ripple, Scene,
    SceneClock, SceneIndex, Shading, TransformGroup, starfield,
};

const EXTENT: f32 = 9.0;
const CORE_RADIUS: f32 = 0.8;
const ARMS: u32 = 4;
const TWIST: f32 = 1.25;
const ARM_STARS: usize = 12_000;
const DUST: usize = 3_000;
const STARS: usize = 1000;

/// A four-armed spiral galaxy seen from above its disk.
pub struct GalaxyScene {
    group: TransformGroup,
    clock: SceneClock,
    seed: u64,
    flare: Option<Ripple>,
    particles: Vec<ParticleSystem>,
}

impl GalaxyScene {
    pub fn new(seed: u64) -> Self {
        Self {
            group: TransformGroup::new(),
            clock: SceneClock::default(),
            seed,
            flare: None,
            particles: Vec::new(),
        }
    }

    pub fn flare(&self) -> Option<&Ripple> {
        self.flare.as_ref()
    }
}

impl Scene for GalaxyScene {
    fn index(&self) -> SceneIndex {
        SceneIndex::Galaxy
    }

    fn setup(&mut self) {
        let arms = ParticleSystem::new(
            ParticleLayout::Spiral {
                arms: ARMS,
                radius: EXTENT,
                twist: TWIST,
                spread: 0.45,
                angular_speed: 0.05,
            },
            ParticleStyle::new([1.0, 0.85, 0.6], [0.45, 0.55, 1.0], 0.4, 1.4),
            ARM_STARS,
            self.seed,
        );
        let dust = ParticleSystem::new(
            ParticleLayout::Disk {
                inner: CORE_RADIUS,
                outer: EXTENT * 1.05,
                thickness: 0.3,
                angular_speed: 0.04,
            },
            ParticleStyle::new([0.6, 0.35, 0.7], [0.2, 0.15, 0.4], 1.5, 3.5),
            DUST,
            self.seed.wrapping_add(7),
        );
        self.particles = vec![starfield(self.seed.wrapping_add(29), STARS), arms, dust];
    }

    fn update(&mut self, time: f32) {
        let local = self.clock.tick(time);
        for system in &mut self.particles {
            system.advance(local);
        }
        if self.flare.is_some_and(|f| f.is_expired(time)) {
            self.flare = None;
        }
    }

    fn handle_interaction(&mut self, event: &InteractionEvent) -> bool {
        let ray = event.ray.to_local(self.group.matrix());
        let Some(t) = ray.intersect_annulus(0.0, EXTENT) else {
            return false;
        };
        let point = ray.point_at(t);
        debug!(target: "stellar::scene", "galaxy disk hit at {point:?}");
        self.flare = Some(Ripple::new(point, event.time, 2.0));
        true
    }

    fn update_particle_count(&mut self, multiplier: f32) {
        let local = self.clock.local();
        for system in &mut self.particles {
            system.rebuild(multiplier);
            system.advance(local);
        }
    }

    fn reset(&mut self) {
        self.clock.restart();
        self.flare = None;
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
            radius: EXTENT * 1.05,
        }
    }

    fn shading(&self) -> Shading {
        Shading {
            params: [
                self.clock.local(),
                CORE_RADIUS,
                EXTENT,
                ARMS as f32,
                TWIST,
                0.0,
                0.0,
                0.0,
            ],
            highlight: self
                .flare
                .map(|f| f.highlight(self.clock.now()))
                .unwrap_or_default(),
        }
    }

    fn particle_systems(&self) -> &[ParticleSystem] {
        &self.particles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Ray;

    fn scene() -> GalaxyScene {
        let mut scene = GalaxyScene::new(3);
        scene.setup();
        scene
    }

    #[test]
    fn click_on_disk_flares() {
        let mut scene = scene();
        let event = InteractionEvent::new(Ray::new(Vec3::new(3.0, 10.0, 0.0), Vec3::NEG_Y), 4.0);
        assert!(scene.handle_interaction(&event));
        let flare = scene.flare().expect("flare");
        assert!((flare.point.x - 3.0).abs() < 1e-4);
    }

    #[test]
    fn click_beyond_the_rim_misses() {
        let mut scene = scene();
        let event = InteractionEvent::new(Ray::new(Vec3::new(20.0, 10.0, 0.0), Vec3::NEG_Y), 4.0);
        assert!(!scene.handle_interaction(&event));
    }

    #[test]
    fn hit_test_follows_displaced_group() {
        let mut scene = scene();
        scene.group_mut().position = Vec3::new(100.0, 0.0, 0.0);
        let event = InteractionEvent::new(Ray::new(Vec3::new(3.0, 10.0, 0.0), Vec3::NEG_Y), 4.0);
        assert!(!scene.handle_interaction(&event));
    }

    #[test]
    fn density_scales_every_system() {
        let mut scene = scene();
        scene.update_particle_count(0.6);
        let counts: Vec<_> = scene.particle_systems().iter().map(|s| s.count()).collect();
        assert_eq!(counts, vec![600, 7200, 1800]);
    }
}
