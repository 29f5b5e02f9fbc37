//! Camera state and scripted camera paths.

use glam::{Mat4, Vec3};

use crate::scene::SceneIndex;
use crate::tween::{Easing, Lerp};

/// A perspective camera that looks at a target point.
///
/// The camera is a shared resource: the render loop owns it in the steady
/// state and the transition orchestrator drives it while a transition runs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 6.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov: 60f32.to_radians(),
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or(Vec3::NEG_Z)
    }

    /// Compute the right vector from forward and up.
    pub fn right(&self) -> Vec3 {
        self.forward().cross(self.up).normalize_or(Vec3::X)
    }

    /// Recompute up to be orthogonal to forward and right.
    pub fn orthogonal_up(&self) -> Vec3 {
        self.right().cross(self.forward()).normalize_or(Vec3::Y)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov, aspect.max(1e-3), self.near, self.far)
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }
}

/// One leg of a camera path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Waypoint {
    pub position: Vec3,
    /// Share of the total transition duration spent travelling to this waypoint.
    pub fraction: f32,
}

impl Waypoint {
    pub const fn new(position: Vec3, fraction: f32) -> Self {
        Self { position, fraction }
    }
}

/// An ordered list of waypoints consumed strictly in order.
///
/// Each leg starts where the previous one ended (the first leg starts from the
/// camera's position when the path begins) and is eased in and out.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraPath {
    pub waypoints: Vec<Waypoint>,
    pub easing: Easing,
}

impl CameraPath {
    pub fn new(waypoints: Vec<Waypoint>) -> Self {
        Self {
            waypoints,
            easing: Easing::EaseInOut,
        }
    }

    /// The scripted approach into a scene.
    pub fn for_scene(scene: SceneIndex) -> Self {
        let points = match scene {
            SceneIndex::Earth => [
                Waypoint::new(Vec3::new(0.0, 2.0, 9.0), 0.3),
                Waypoint::new(Vec3::new(3.0, 1.0, 7.0), 0.3),
                Waypoint::new(Vec3::new(0.0, 0.0, 6.0), 0.4),
            ],
            SceneIndex::Uranus => [
                Waypoint::new(Vec3::new(-4.0, 3.0, 10.0), 0.3),
                Waypoint::new(Vec3::new(-2.0, 1.5, 8.0), 0.3),
                Waypoint::new(Vec3::new(0.0, 0.8, 7.0), 0.4),
            ],
            SceneIndex::Galaxy => [
                Waypoint::new(Vec3::new(0.0, 12.0, 18.0), 0.35),
                Waypoint::new(Vec3::new(6.0, 8.0, 14.0), 0.35),
                Waypoint::new(Vec3::new(0.0, 6.0, 12.0), 0.3),
            ],
            SceneIndex::BlackHole => [
                Waypoint::new(Vec3::new(0.0, 1.0, 14.0), 0.3),
                Waypoint::new(Vec3::new(2.0, 0.5, 10.0), 0.3),
                Waypoint::new(Vec3::new(0.0, 0.4, 8.0), 0.4),
            ],
        };
        Self::new(points.to_vec())
    }

    /// Where the path ends.
    pub fn destination(&self) -> Option<Vec3> {
        self.waypoints.last().map(|w| w.position)
    }

    /// Elapsed time at which the first leg completes.
    pub fn first_leg_end(&self, duration: f32) -> f32 {
        self.waypoints
            .first()
            .map(|w| w.fraction * duration)
            .unwrap_or(0.0)
    }

    /// Camera position `elapsed` seconds into a path of total length `duration`.
    pub fn position_at(&self, start: Vec3, elapsed: f32, duration: f32) -> Vec3 {
        let mut leg_start_pos = start;
        let mut leg_start_time = 0.0;

        for waypoint in &self.waypoints {
            let leg_duration = waypoint.fraction * duration;
            let leg_end_time = leg_start_time + leg_duration;
            if elapsed < leg_end_time {
                let t = if leg_duration > 0.0 {
                    (elapsed - leg_start_time) / leg_duration
                } else {
                    1.0
                };
                return leg_start_pos.lerp_to(waypoint.position, self.easing.apply(t));
            }
            leg_start_pos = waypoint.position;
            leg_start_time = leg_end_time;
        }

        leg_start_pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn fractions_sum_to_one() {
        for scene in SceneIndex::ALL {
            let path = CameraPath::for_scene(scene);
            let total: f32 = path.waypoints.iter().map(|w| w.fraction).sum();
            assert_abs_diff_eq!(total, 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn legs_are_walked_in_order() {
        let path = CameraPath::new(vec![
            Waypoint::new(Vec3::new(10.0, 0.0, 0.0), 0.5),
            Waypoint::new(Vec3::new(10.0, 10.0, 0.0), 0.5),
        ]);
        let start = Vec3::ZERO;

        assert_eq!(path.position_at(start, 0.0, 2.0), start);
        // Halfway through the first leg the y component has not moved yet.
        let mid_first = path.position_at(start, 0.5, 2.0);
        assert_abs_diff_eq!(mid_first.x, 5.0, epsilon = 1e-5);
        assert_eq!(mid_first.y, 0.0);
        // Second leg starts from the first waypoint.
        assert_eq!(path.position_at(start, 1.0, 2.0), Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(path.position_at(start, 2.0, 2.0), Vec3::new(10.0, 10.0, 0.0));
        assert_eq!(path.position_at(start, 9.0, 2.0), Vec3::new(10.0, 10.0, 0.0));
    }

    #[test]
    fn first_leg_end_scales_with_duration() {
        let path = CameraPath::for_scene(SceneIndex::BlackHole);
        assert_abs_diff_eq!(path.first_leg_end(3.0), 0.9, epsilon = 1e-5);
    }

    #[test]
    fn camera_basis_is_orthonormal() {
        let camera = Camera::new().at(Vec3::new(3.0, 2.0, 5.0));
        let f = camera.forward();
        let r = camera.right();
        let u = camera.orthogonal_up();
        assert_abs_diff_eq!(f.dot(r), 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(f.dot(u), 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(r.length(), 1.0, epsilon = 1e-5);
    }
}
