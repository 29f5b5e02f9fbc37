//! Picking rays and the local feedback a scene shows when clicked.

use glam::{Mat4, Vec3, Vec4};

/// A ray in 3D space with a normalized direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// The direction is normalized automatically.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Build a picking ray from a cursor position in physical pixels.
    pub fn from_screen(
        screen_x: f32,
        screen_y: f32,
        screen_width: f32,
        screen_height: f32,
        view_projection: Mat4,
    ) -> Self {
        let ndc_x = (2.0 * screen_x / screen_width) - 1.0;
        let ndc_y = 1.0 - (2.0 * screen_y / screen_height);

        let inv = view_projection.inverse();
        let near = inv * Vec4::new(ndc_x, ndc_y, 0.0, 1.0);
        let far = inv * Vec4::new(ndc_x, ndc_y, 1.0, 1.0);

        let near_point = near.truncate() / near.w;
        let far_point = far.truncate() / far.w;

        Self::new(near_point, far_point - near_point)
    }

    #[inline]
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Express this ray in the space whose local-to-world matrix is `matrix`.
    ///
    /// Distances along the returned ray are in local units.
    pub fn to_local(&self, matrix: Mat4) -> Ray {
        let inv = matrix.inverse();
        Ray::new(
            inv.transform_point3(self.origin),
            inv.transform_vector3(self.direction),
        )
    }

    /// Nearest positive hit distance against a sphere.
    pub fn intersect_sphere(&self, center: Vec3, radius: f32) -> Option<f32> {
        let oc = self.origin - center;
        let a = self.direction.dot(self.direction);
        let b = 2.0 * oc.dot(self.direction);
        let c = oc.dot(oc) - radius * radius;
        let discriminant = b * b - 4.0 * a * c;

        if discriminant < 0.0 || a == 0.0 {
            return None;
        }

        let sqrt_disc = discriminant.sqrt();
        let t1 = (-b - sqrt_disc) / (2.0 * a);
        let t2 = (-b + sqrt_disc) / (2.0 * a);

        if t1 > 0.0 {
            Some(t1)
        } else if t2 > 0.0 {
            Some(t2)
        } else {
            None
        }
    }

    /// Hit distance against the plane through `point` with `normal`.
    pub fn intersect_plane(&self, point: Vec3, normal: Vec3) -> Option<f32> {
        let denom = self.direction.dot(normal);
        if denom.abs() < 1e-6 {
            return None;
        }
        let t = (point - self.origin).dot(normal) / denom;
        (t > 0.0).then_some(t)
    }

    /// Hit distance against a flat annulus in the local XZ plane.
    pub fn intersect_annulus(&self, inner: f32, outer: f32) -> Option<f32> {
        let t = self.intersect_plane(Vec3::ZERO, Vec3::Y)?;
        let r = self.point_at(t).length();
        (r >= inner && r <= outer).then_some(t)
    }
}

/// A pointer interaction forwarded to the active scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InteractionEvent {
    /// World-space picking ray.
    pub ray: Ray,
    /// Time of the click on the render loop's clock.
    pub time: f32,
}

impl InteractionEvent {
    pub fn new(ray: Ray, time: f32) -> Self {
        Self { ray, time }
    }
}

/// Decaying glow at a clicked point, in scene-local coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ripple {
    pub point: Vec3,
    pub started: f32,
    pub lifetime: f32,
}

impl Ripple {
    pub fn new(point: Vec3, started: f32, lifetime: f32) -> Self {
        Self {
            point,
            started,
            lifetime: lifetime.max(f32::EPSILON),
        }
    }

    /// 1 at the moment of the click, fading quadratically to 0.
    pub fn strength(&self, now: f32) -> f32 {
        let age = now - self.started;
        if !(0.0..self.lifetime).contains(&age) {
            return 0.0;
        }
        let t = 1.0 - age / self.lifetime;
        t * t
    }

    pub fn is_expired(&self, now: f32) -> bool {
        now - self.started >= self.lifetime
    }

    /// Packed for the shader: local point in xyz, strength in w.
    pub fn highlight(&self, now: f32) -> [f32; 4] {
        [self.point.x, self.point.y, self.point.z, self.strength(now)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn ray_sphere_hits_near_side() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z);
        let t = ray.intersect_sphere(Vec3::ZERO, 1.0).expect("hit");
        assert_relative_eq!(t, 9.0, epsilon = 1e-5);
        assert!(ray.intersect_sphere(Vec3::new(5.0, 0.0, 0.0), 1.0).is_none());
    }

    #[test]
    fn screen_center_ray_points_at_target() {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 6.0), Vec3::ZERO, Vec3::Y);
        let proj = Mat4::perspective_rh(60f32.to_radians(), 16.0 / 9.0, 0.1, 100.0);
        let ray = Ray::from_screen(640.0, 360.0, 1280.0, 720.0, proj * view);
        assert_relative_eq!(ray.direction.z, -1.0, epsilon = 1e-4);
        assert!(ray.intersect_sphere(Vec3::ZERO, 1.0).is_some());
    }

    #[test]
    fn local_ray_follows_group_translation() {
        let matrix = Mat4::from_translation(Vec3::new(0.0, 0.0, -20.0));
        let ray = Ray::new(Vec3::new(0.0, 0.0, 6.0), Vec3::NEG_Z);
        let local = ray.to_local(matrix);
        assert_relative_eq!(local.origin.z, 26.0, epsilon = 1e-4);
        let t = local.intersect_sphere(Vec3::ZERO, 1.0).expect("hit");
        assert_relative_eq!(t, 25.0, epsilon = 1e-4);
    }

    #[test]
    fn annulus_rejects_hole() {
        let down = Ray::new(Vec3::new(0.5, 5.0, 0.0), Vec3::NEG_Y);
        assert!(down.intersect_annulus(1.0, 3.0).is_none());
        let on_ring = Ray::new(Vec3::new(2.0, 5.0, 0.0), Vec3::NEG_Y);
        assert!(on_ring.intersect_annulus(1.0, 3.0).is_some());
    }

    #[test]
    fn ripple_fades_out() {
        let ripple = Ripple::new(Vec3::X, 2.0, 1.0);
        assert_eq!(ripple.strength(2.0), 1.0);
        assert_relative_eq!(ripple.strength(2.5), 0.25);
        assert_eq!(ripple.strength(3.0), 0.0);
        assert!(ripple.is_expired(3.0));
    }
}
