//! Seeded particle systems shared by the scene themes.
//!
//! A particle system is a small builder around a layout and a seed, so the
//! quality adapter can rebuild it at a different density and get the same
//! look, just sparser or denser.

use std::f32::consts::TAU;

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// How particles are distributed and how they move.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParticleLayout {
    /// Background stars on a thick spherical shell, drifting slowly about Y.
    Shell {
        inner: f32,
        outer: f32,
        angular_speed: f32,
    },
    /// A thin disk in the local XZ plane with differential rotation,
    /// inner particles orbit faster than outer ones.
    Disk {
        inner: f32,
        outer: f32,
        thickness: f32,
        angular_speed: f32,
    },
    /// Spiral arms wound around Y.
    Spiral {
        arms: u32,
        radius: f32,
        twist: f32,
        spread: f32,
        angular_speed: f32,
    },
}

/// Colour ramp and sprite size range for a particle system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleStyle {
    /// Colour at the inner edge of the layout.
    pub inner_color: [f32; 3],
    /// Colour at the outer edge of the layout.
    pub outer_color: [f32; 3],
    pub min_size: f32,
    pub max_size: f32,
}

impl ParticleStyle {
    pub const fn new(inner_color: [f32; 3], outer_color: [f32; 3], min_size: f32, max_size: f32) -> Self {
        Self {
            inner_color,
            outer_color,
            min_size,
            max_size,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub radius: f32,
    pub angle: f32,
    /// Polar angle for shells, height above the plane otherwise.
    pub elevation: f32,
    /// Angular speed in radians per second.
    pub speed: f32,
    pub size: f32,
    pub color: [f32; 4],
    /// Twinkle phase in radians.
    pub phase: f32,
    /// Current local-space position, refreshed by [`ParticleSystem::advance`].
    pub position: Vec3,
}

#[derive(Clone, Debug)]
pub struct ParticleSystem {
    layout: ParticleLayout,
    style: ParticleStyle,
    base_count: usize,
    multiplier: f32,
    seed: u64,
    time: f32,
    particles: Vec<Particle>,
}

impl ParticleSystem {
    /// Build `base_count` particles at full density.
    pub fn new(layout: ParticleLayout, style: ParticleStyle, base_count: usize, seed: u64) -> Self {
        let mut system = Self {
            layout,
            style,
            base_count,
            multiplier: 1.0,
            seed,
            time: 0.0,
            particles: Vec::new(),
        };
        system.build();
        system
    }

    pub fn count(&self) -> usize {
        self.particles.len()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Rebuild at `multiplier` times the base density. Never drops below one particle.
    pub fn rebuild(&mut self, multiplier: f32) {
        self.multiplier = if multiplier.is_finite() { multiplier.max(0.0) } else { 1.0 };
        self.build();
    }

    /// Move every particle to where it is at local time `time`.
    pub fn advance(&mut self, time: f32) {
        self.time = time;
        let layout = self.layout;
        for particle in &mut self.particles {
            particle.position = position_at(layout, particle, time);
        }
    }

    fn target_count(&self) -> usize {
        ((self.base_count as f32 * self.multiplier).round() as usize).max(1)
    }

    fn build(&mut self) {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let count = self.target_count();
        let layout = self.layout;
        let style = self.style;

        self.particles = (0..count)
            .map(|i| {
                let mut particle = spawn(layout, style, i, &mut rng);
                particle.position = position_at(layout, &particle, self.time);
                particle
            })
            .collect();
    }
}

fn spawn(layout: ParticleLayout, style: ParticleStyle, i: usize, rng: &mut StdRng) -> Particle {
    let size = rng.gen_range(style.min_size..=style.max_size);
    let phase = rng.gen_range(0.0..TAU);

    let (radius, angle, elevation, speed, ramp) = match layout {
        ParticleLayout::Shell {
            inner,
            outer,
            angular_speed,
        } => {
            let radius = rng.gen_range(inner..=outer);
            let angle = rng.gen_range(0.0..TAU);
            let polar = rng.gen_range(-1.0_f32..1.0).acos();
            (radius, angle, polar, angular_speed, rng.gen_range(0.0..1.0))
        }
        ParticleLayout::Disk {
            inner,
            outer,
            thickness,
            angular_speed,
        } => {
            // Square-root sampling keeps the surface density even.
            let u: f32 = rng.gen_range(0.0..1.0);
            let radius = (inner * inner + u * (outer * outer - inner * inner)).sqrt();
            let angle = rng.gen_range(0.0..TAU);
            let height = rng.gen_range(-1.0_f32..1.0) * thickness;
            let speed = angular_speed * (inner / radius).powf(1.5);
            let ramp = (radius - inner) / (outer - inner).max(f32::EPSILON);
            (radius, angle, height, speed, ramp)
        }
        ParticleLayout::Spiral {
            arms,
            radius: extent,
            twist,
            spread,
            angular_speed,
        } => {
            let arm = (i as u32 % arms.max(1)) as f32;
            let r = extent * rng.gen_range(0.02_f32..1.0).powf(0.7);
            let t = r / extent;
            let base = arm * TAU / arms.max(1) as f32;
            let scatter = rng.gen_range(-1.0_f32..1.0) * spread * (1.0 - 0.5 * t);
            let angle = base + twist * t * TAU + scatter;
            let height = rng.gen_range(-1.0_f32..1.0) * 0.4 * (1.0 - t).max(0.1);
            let speed = angular_speed / (0.5 + t);
            (r, angle, height, speed, t)
        }
    };

    let c0 = style.inner_color;
    let c1 = style.outer_color;
    let color = [
        c0[0] + (c1[0] - c0[0]) * ramp,
        c0[1] + (c1[1] - c0[1]) * ramp,
        c0[2] + (c1[2] - c0[2]) * ramp,
        1.0,
    ];

    Particle {
        radius,
        angle,
        elevation,
        speed,
        size,
        color,
        phase,
        position: Vec3::ZERO,
    }
}

fn position_at(layout: ParticleLayout, p: &Particle, time: f32) -> Vec3 {
    let angle = p.angle + p.speed * time;
    match layout {
        ParticleLayout::Shell { .. } => {
            let (sin_polar, cos_polar) = p.elevation.sin_cos();
            Vec3::new(
                p.radius * sin_polar * angle.cos(),
                p.radius * cos_polar,
                p.radius * sin_polar * angle.sin(),
            )
        }
        ParticleLayout::Disk { .. } | ParticleLayout::Spiral { .. } => {
            Vec3::new(p.radius * angle.cos(), p.elevation, p.radius * angle.sin())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STYLE: ParticleStyle = ParticleStyle::new([1.0, 1.0, 1.0], [0.5, 0.5, 1.0], 0.5, 1.5);

    fn disk() -> ParticleLayout {
        ParticleLayout::Disk {
            inner: 2.0,
            outer: 4.0,
            thickness: 0.05,
            angular_speed: 1.0,
        }
    }

    #[test]
    fn same_seed_same_particles() {
        let a = ParticleSystem::new(disk(), STYLE, 200, 9);
        let b = ParticleSystem::new(disk(), STYLE, 200, 9);
        assert_eq!(a.particles(), b.particles());
    }

    #[test]
    fn rebuild_scales_density() {
        let mut system = ParticleSystem::new(disk(), STYLE, 1000, 1);
        system.rebuild(0.3);
        assert_eq!(system.count(), 300);
        system.rebuild(0.0);
        assert_eq!(system.count(), 1);
        system.rebuild(1.0);
        assert_eq!(system.count(), 1000);
    }

    #[test]
    fn disk_particles_stay_in_annulus() {
        let mut system = ParticleSystem::new(disk(), STYLE, 500, 4);
        system.advance(17.0);
        for p in system.particles() {
            let planar = Vec3::new(p.position.x, 0.0, p.position.z).length();
            assert!((1.99..=4.01).contains(&planar));
            assert!(p.position.y.abs() <= 0.05);
        }
    }

    #[test]
    fn inner_disk_orbits_faster() {
        let system = ParticleSystem::new(disk(), STYLE, 500, 4);
        let inner = system
            .particles()
            .iter()
            .min_by(|a, b| a.radius.total_cmp(&b.radius))
            .map(|p| p.speed);
        let outer = system
            .particles()
            .iter()
            .max_by(|a, b| a.radius.total_cmp(&b.radius))
            .map(|p| p.speed);
        assert!(inner > outer);
    }

    #[test]
    fn advance_is_a_function_of_time() {
        let mut system = ParticleSystem::new(
            ParticleLayout::Shell {
                inner: 40.0,
                outer: 60.0,
                angular_speed: 0.01,
            },
            STYLE,
            50,
            2,
        );
        system.advance(5.0);
        let at_five: Vec<_> = system.particles().iter().map(|p| p.position).collect();
        system.advance(30.0);
        system.advance(5.0);
        let again: Vec<_> = system.particles().iter().map(|p| p.position).collect();
        assert_eq!(at_five, again);
    }
}
