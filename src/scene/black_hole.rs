use glam::Vec3;
use log::debug;

use super::{
    Bounds, InteractionEvent, ParticleLayout, ParticleStyle, ParticleSystem, Ripple, Scene,
    SceneClock, SceneIndex, Shading, TransformGroup, starfield,
};

const HORIZON: f32 = 1.0;
const PHOTON_RING: f32 = 1.5;
const DISK_INNER: f32 = 2.0;
const DISK_OUTER: f32 = 6.0;
const DISK_TILT: f32 = 0.2;
const DISK_PARTICLES: usize = 8000;
const STARS: usize = 2000;
/// Screen-space lensing strength handed to the shader. Purely cosmetic.
const LENSING: f32 = 1.0;

/// An event horizon wrapped in a fast, glowing accretion disk.
pub struct BlackHoleScene {
    group: TransformGroup,
    clock: SceneClock,
    seed: u64,
    disk_angle: f32,
    flare: Option<Ripple>,
    swallowed: Option<Ripple>,
    particles: Vec<ParticleSystem>,
}

impl BlackHoleScene {
    pub fn new(seed: u64) -> Self {
        Self {
            group: TransformGroup::new(),
            clock: SceneClock::default(),
            seed,
            disk_angle: 0.0,
            flare: None,
            swallowed: None,
            particles: Vec::new(),
        }
    }

    pub fn flare(&self) -> Option<&Ripple> {
        self.flare.as_ref()
    }

    pub fn swallowed(&self) -> Option<&Ripple> {
        self.swallowed.as_ref()
    }

    fn disk_frame(&self) -> glam::Mat4 {
        self.group.matrix() * self.content_frame()
    }
}

impl Scene for BlackHoleScene {
    fn index(&self) -> SceneIndex {
        SceneIndex::BlackHole
    }

    fn setup(&mut self) {
        let disk = ParticleSystem::new(
            ParticleLayout::Disk {
                inner: DISK_INNER,
                outer: DISK_OUTER,
                thickness: 0.06,
                angular_speed: 1.2,
            },
            ParticleStyle::new([1.0, 0.95, 0.8], [0.9, 0.35, 0.1], 0.4, 1.2),
            DISK_PARTICLES,
            self.seed,
        );
        self.particles = vec![starfield(self.seed.wrapping_add(13), STARS), disk];
    }

    fn update(&mut self, time: f32) {
        let local = self.clock.tick(time);
        self.disk_angle = local * 0.6;
        for system in &mut self.particles {
            system.advance(local);
        }
        if self.flare.is_some_and(|f| f.is_expired(time)) {
            self.flare = None;
        }
        if self.swallowed.is_some_and(|s| s.is_expired(time)) {
            self.swallowed = None;
        }
    }

    fn handle_interaction(&mut self, event: &InteractionEvent) -> bool {
        let disk_ray = event.ray.to_local(self.disk_frame());
        let disk = disk_ray.intersect_annulus(DISK_INNER, DISK_OUTER);

        let ray = event.ray.to_local(self.group.matrix());
        let horizon = ray.intersect_sphere(Vec3::ZERO, PHOTON_RING);

        match (disk, horizon) {
            (Some(d), h) if h.is_none_or(|h| d < h) => {
                let point = glam::Mat4::from_rotation_x(DISK_TILT).transform_point3(disk_ray.point_at(d));
                debug!(target: "stellar::scene", "accretion disk flare at {point:?}");
                self.flare = Some(Ripple::new(point, event.time, 1.0));
                true
            }
            (_, Some(h)) => {
                let point = ray.point_at(h);
                debug!(target: "stellar::scene", "click swallowed by the horizon");
                self.swallowed = Some(Ripple::new(point, event.time, 0.8));
                true
            }
            _ => false,
        }
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
        self.disk_angle = 0.0;
        self.flare = None;
        self.swallowed = None;
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
            radius: DISK_OUTER,
        }
    }

    fn shading(&self) -> Shading {
        let now = self.clock.now();
        let swallow = self.swallowed.map(|s| s.strength(now)).unwrap_or(0.0);
        Shading {
            params: [
                self.clock.local(),
                HORIZON,
                DISK_INNER,
                DISK_OUTER,
                LENSING,
                self.disk_angle,
                DISK_TILT,
                swallow,
            ],
            highlight: self.flare.map(|f| f.highlight(now)).unwrap_or_default(),
        }
    }

    fn particle_systems(&self) -> &[ParticleSystem] {
        &self.particles
    }

    fn content_frame(&self) -> glam::Mat4 {
        glam::Mat4::from_rotation_x(DISK_TILT)
    }
}
