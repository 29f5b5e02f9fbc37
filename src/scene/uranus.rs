use glam::{Mat4, Vec3};
use log::debug;

use super::{
    Bounds, InteractionEvent, ParticleLayout, ParticleStyle, ParticleSystem, Ripple, Scene,
    SceneClock, SceneIndex, Shading, TransformGroup, starfield,
};

const RADIUS: f32 = 1.2;
const AXIAL_TILT_DEG: f32 = 97.77;
/// Retrograde spin.
const SPIN_RATE: f32 = -0.14;
const RING_INNER: f32 = 1.6;
const RING_OUTER: f32 = 2.6;
const MOON_INNER: f32 = 3.4;
const MOON_OUTER: f32 = 6.0;
const STARS: usize = 1500;
const RING_PARTICLES: usize = 2500;
const MOONS: usize = 5;

/// What a click on Uranus landed on; fed to the shader as `params[5]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UranusHit {
    Planet,
    Rings,
}

/// The tilted ice giant with its thin ring system and a handful of moons.
pub struct UranusScene {
    group: TransformGroup,
    clock: SceneClock,
    seed: u64,
    spin: f32,
    ripple: Option<(Ripple, UranusHit)>,
    particles: Vec<ParticleSystem>,
}

impl UranusScene {
    pub fn new(seed: u64) -> Self {
        Self {
            group: TransformGroup::new(),
            clock: SceneClock::default(),
            seed,
            spin: 0.0,
            ripple: None,
            particles: Vec::new(),
        }
    }

    pub fn spin(&self) -> f32 {
        self.spin
    }

    pub fn last_hit(&self) -> Option<UranusHit> {
        self.ripple.map(|(_, hit)| hit)
    }

    /// Rotation from the planet's equatorial frame into group space.
    fn tilt() -> Mat4 {
        Mat4::from_rotation_z(AXIAL_TILT_DEG.to_radians())
    }

    fn moons(&self) -> Option<&ParticleSystem> {
        self.particles.get(2)
    }
}

impl Scene for UranusScene {
    fn index(&self) -> SceneIndex {
        SceneIndex::Uranus
    }

    fn setup(&mut self) {
        let rings = ParticleSystem::new(
            ParticleLayout::Disk {
                inner: RING_INNER,
                outer: RING_OUTER,
                thickness: 0.01,
                angular_speed: 0.25,
            },
            ParticleStyle::new([0.75, 0.85, 0.9], [0.45, 0.55, 0.65], 0.3, 0.7),
            RING_PARTICLES,
            self.seed,
        );
        let moons = ParticleSystem::new(
            ParticleLayout::Disk {
                inner: MOON_INNER,
                outer: MOON_OUTER,
                thickness: 0.08,
                angular_speed: 0.12,
            },
            ParticleStyle::new([0.8, 0.8, 0.78], [0.65, 0.63, 0.6], 4.0, 7.0),
            MOONS,
            self.seed.wrapping_add(17),
        );
        self.particles = vec![starfield(self.seed.wrapping_add(31), STARS), rings, moons];
    }

    fn update(&mut self, time: f32) {
        let local = self.clock.tick(time);
        self.spin = local * SPIN_RATE;
        for system in &mut self.particles {
            system.advance(local);
        }
        if self.ripple.is_some_and(|(r, _)| r.is_expired(time)) {
            self.ripple = None;
        }
    }

    fn handle_interaction(&mut self, event: &InteractionEvent) -> bool {
        // Rings and moons live in the equatorial frame.
        let ray = event.ray.to_local(self.group.matrix() * Self::tilt());

        let planet = ray.intersect_sphere(Vec3::ZERO, RADIUS);
        let rings = ray.intersect_annulus(RING_INNER, RING_OUTER);
        let hit = match (planet, rings) {
            (Some(p), Some(r)) if r < p => Some((r, UranusHit::Rings)),
            (Some(p), _) => Some((p, UranusHit::Planet)),
            (None, Some(r)) => Some((r, UranusHit::Rings)),
            (None, None) => None,
        };

        let Some((t, kind)) = hit else {
            return false;
        };
        let point = Self::tilt().transform_point3(ray.point_at(t));
        debug!(target: "stellar::scene", "uranus {kind:?} hit at {point:?}");
        self.ripple = Some((Ripple::new(point, event.time, 1.2), kind));
        true
    }

    fn update_particle_count(&mut self, multiplier: f32) {
        let local = self.clock.local();
        let moons = self.particles.len().saturating_sub(1);
        for (i, system) in self.particles.iter_mut().enumerate() {
            // Moons are individual bodies, not density.
            if i != moons {
                system.rebuild(multiplier);
            }
            system.advance(local);
        }
    }

    fn reset(&mut self) {
        self.clock.restart();
        self.spin = 0.0;
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
            radius: MOON_OUTER,
        }
    }

    fn shading(&self) -> Shading {
        let hit_kind = match self.last_hit() {
            Some(UranusHit::Planet) => 1.0,
            Some(UranusHit::Rings) => 2.0,
            None => 0.0,
        };
        Shading {
            params: [
                self.spin,
                AXIAL_TILT_DEG.to_radians(),
                RADIUS,
                RING_INNER,
                RING_OUTER,
                hit_kind,
                self.moons().map(|m| m.count() as f32).unwrap_or(0.0),
                0.0,
            ],
            highlight: self
                .ripple
                .map(|(r, _)| r.highlight(self.clock.now()))
                .unwrap_or_default(),
        }
    }

    fn particle_systems(&self) -> &[ParticleSystem] {
        &self.particles
    }

    fn content_frame(&self) -> Mat4 {
        Self::tilt()
    }

    fn surface_texture(&self) -> Option<&'static str> {
        Some("uranus")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Ray;

    fn scene() -> UranusScene {
        let mut scene = UranusScene::new(11);
        scene.setup();
        scene
    }

    #[test]
    fn moons_keep_their_number_at_low_density() {
        let mut scene = scene();
        scene.update_particle_count(0.3);
        assert_eq!(scene.moons().map(|m| m.count()), Some(MOONS));
        assert_eq!(scene.particle_systems()[1].count(), 750);
    }

    #[test]
    fn reset_restores_orbital_phases() {
        let mut scene = scene();
        let initial: Vec<_> = scene.particle_systems()[2]
            .particles()
            .iter()
            .map(|p| p.position)
            .collect();
        scene.update(25.0);
        scene.reset();
        let after: Vec<_> = scene.particle_systems()[2]
            .particles()
            .iter()
            .map(|p| p.position)
            .collect();
        assert_eq!(initial, after);
        assert_eq!(scene.spin(), 0.0);
    }

    #[test]
    fn head_on_click_hits_planet() {
        let mut scene = scene();
        let event = InteractionEvent::new(Ray::new(Vec3::new(0.0, 0.0, 7.0), Vec3::NEG_Z), 0.0);
        assert!(scene.handle_interaction(&event));
        assert_eq!(scene.last_hit(), Some(UranusHit::Planet));
    }

    #[test]
    fn click_through_ring_plane_hits_rings() {
        let mut scene = scene();
        // The 97.77 degree tilt stands the rings almost upright, facing +x.
        let event = InteractionEvent::new(Ray::new(Vec3::new(8.0, 2.0, 0.0), Vec3::NEG_X), 0.0);
        assert!(scene.handle_interaction(&event));
        assert_eq!(scene.last_hit(), Some(UranusHit::Rings));
    }
}
