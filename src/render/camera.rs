use glam::Vec3;

use crate::scene::{Aabb, SceneGraph};

/// Margin so the asset never touches the frame edges.
pub const FIT_HEADROOM: f32 = 1.5;
/// Lower bound on the fitted distance; covers empty or zero-size assets.
pub const MIN_FIT_DISTANCE: f32 = 0.1;
/// Upper bound on the fitted distance. Squared it still fits in an f32, so
/// `distance()` and `far` stay finite for enormous assets.
pub const MAX_FIT_DISTANCE: f32 = 1.0e18;
const CLIP_RATIO: f32 = 100.0;

/// Orbit distance limits relative to the fitted distance.
const MIN_ORBIT_FACTOR: f32 = 0.55;
const MAX_ORBIT_FACTOR: f32 = 2.5;
const PITCH_LIMIT: f32 = 1.5;
pub const DEFAULT_DAMPING: f32 = 0.06;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Horizontal field of view in degrees.
    pub fov_deg: f32,
    pub near: f32,
    pub far: f32,
}

impl CameraState {
    pub fn new(eye: Vec3, target: Vec3, fov_deg: f32) -> Self {
        Self {
            eye,
            target,
            up: Vec3::Y,
            fov_deg,
            near: 0.01,
            far: 100.0,
        }
    }

    pub fn distance(&self) -> f32 {
        self.eye.distance(self.target)
    }

    /// Unit vector from target towards the eye, `+Z` when they coincide.
    pub fn view_axis(&self) -> Vec3 {
        (self.eye - self.target).try_normalize().unwrap_or(Vec3::Z)
    }
}

impl Default for CameraState {
    fn default() -> Self {
        Self::new(Vec3::new(0.2, 0.22, 1.2), Vec3::ZERO, 45.0)
    }
}

/// Frames the whole graph, keeping the current viewing direction.
pub fn fit_camera(camera: &CameraState, graph: &SceneGraph) -> CameraState {
    fit_bounds(camera, graph.world_bounds(graph.root()))
}

pub fn fit_bounds(camera: &CameraState, bounds: Option<Aabb>) -> CameraState {
    let (center, extent) = match bounds {
        Some(bounds) if bounds.min.is_finite() && bounds.max.is_finite() => {
            (bounds.center(), bounds.max_extent())
        }
        _ => (Vec3::ZERO, 0.0),
    };
    let half_fov = (camera.fov_deg.clamp(1.0, 179.0) * 0.5).to_radians();
    let raw = (extent * 0.5) / half_fov.tan() * FIT_HEADROOM;
    let distance = if raw.is_nan() {
        MIN_FIT_DISTANCE
    } else {
        raw.clamp(MIN_FIT_DISTANCE, MAX_FIT_DISTANCE)
    };

    let eye = center + camera.view_axis() * distance;
    CameraState {
        eye,
        target: center,
        up: camera.up,
        fov_deg: camera.fov_deg,
        near: distance / CLIP_RATIO,
        far: distance * CLIP_RATIO,
    }
}

/// Damped orbit around a fixed target; pan is not offered.
#[derive(Debug, Clone, Copy)]
pub struct OrbitController {
    pub target: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    min_distance: f32,
    max_distance: f32,
    damping: f32,
    yaw_velocity: f32,
    pitch_velocity: f32,
    fov_deg: f32,
    up: Vec3,
}

impl OrbitController {
    /// Starts from a fitted camera; zoom limits scale with its distance.
    pub fn from_fit(camera: &CameraState) -> Self {
        let distance = camera.distance().max(MIN_FIT_DISTANCE);
        let (yaw, pitch) = axis_to_yaw_pitch(camera.view_axis());
        Self {
            target: camera.target,
            yaw,
            pitch,
            distance,
            min_distance: distance * MIN_ORBIT_FACTOR,
            max_distance: distance * MAX_ORBIT_FACTOR,
            damping: DEFAULT_DAMPING,
            yaw_velocity: 0.0,
            pitch_velocity: 0.0,
            fov_deg: camera.fov_deg,
            up: camera.up,
        }
    }

    pub fn with_damping(mut self, damping: f32) -> Self {
        self.damping = damping.clamp(0.0, 1.0);
        self
    }

    pub fn distance_limits(&self) -> (f32, f32) {
        (self.min_distance, self.max_distance)
    }

    /// Queues a rotation; it is spread over later `update` calls.
    pub fn rotate(&mut self, yaw_delta: f32, pitch_delta: f32) {
        self.yaw_velocity += yaw_delta;
        self.pitch_velocity += pitch_delta;
    }

    /// `factor` < 1 moves closer.
    pub fn zoom(&mut self, factor: f32) {
        if factor.is_finite() && factor > 0.0 {
            self.distance = (self.distance * factor).clamp(self.min_distance, self.max_distance);
        }
    }

    /// Advances damping by one frame. Returns true while still moving.
    pub fn update(&mut self) -> bool {
        if self.damping <= 0.0 {
            self.yaw += self.yaw_velocity;
            self.pitch += self.pitch_velocity;
            self.yaw_velocity = 0.0;
            self.pitch_velocity = 0.0;
        } else {
            self.yaw += self.yaw_velocity * self.damping;
            self.pitch += self.pitch_velocity * self.damping;
            self.yaw_velocity *= 1.0 - self.damping;
            self.pitch_velocity *= 1.0 - self.damping;
        }
        wrap_yaw(&mut self.yaw);
        self.pitch = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);

        let moving = self.yaw_velocity.abs() > 1e-5 || self.pitch_velocity.abs() > 1e-5;
        if !moving {
            self.yaw_velocity = 0.0;
            self.pitch_velocity = 0.0;
        }
        moving
    }

    pub fn state(&self) -> CameraState {
        let cos_pitch = self.pitch.cos();
        let axis = Vec3::new(
            self.yaw.cos() * cos_pitch,
            self.pitch.sin(),
            self.yaw.sin() * cos_pitch,
        );
        let eye = self.target + axis * self.distance;
        CameraState {
            eye,
            target: self.target,
            up: self.up,
            fov_deg: self.fov_deg,
            near: self.distance / CLIP_RATIO,
            far: self.distance * CLIP_RATIO,
        }
    }
}

fn axis_to_yaw_pitch(axis: Vec3) -> (f32, f32) {
    let axis = axis.try_normalize().unwrap_or(Vec3::Z);
    (axis.z.atan2(axis.x), axis.y.clamp(-1.0, 1.0).asin())
}

fn wrap_yaw(yaw: &mut f32) {
    const TWO_PI: f32 = std::f32::consts::PI * 2.0;
    if yaw.is_finite() {
        *yaw = (*yaw + std::f32::consts::PI).rem_euclid(TWO_PI) - std::f32::consts::PI;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Material, Mesh, Node};

    fn looking_down_z() -> CameraState {
        CameraState::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, 45.0)
    }

    #[test]
    fn fits_unit_cube_at_45_degrees() {
        let bounds = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let fitted = fit_bounds(&looking_down_z(), Some(bounds));
        let distance = fitted.distance();

        let expected = 1.0 / 22.5f32.to_radians().tan() * FIT_HEADROOM;
        assert!(distance > 0.0);
        assert!((distance - expected).abs() < 1e-4);
        assert_eq!(fitted.target, Vec3::ZERO);
        assert!(fitted.near > 0.0);
        assert!(fitted.near < fitted.far);
        assert!((fitted.eye - Vec3::new(0.0, 0.0, expected)).length() < 1e-4);
    }

    #[test]
    fn degenerate_bounds_clamp_to_minimum() {
        let point = Aabb::new(Vec3::ONE, Vec3::ONE);
        for bounds in [Some(point), None] {
            let fitted = fit_bounds(&looking_down_z(), bounds);
            let distance = fitted.distance();
            assert!(distance.is_finite());
            assert!(distance >= MIN_FIT_DISTANCE * 0.999);
            assert!(fitted.near > 0.0 && fitted.near < fitted.far);
        }
    }

    #[test]
    fn enormous_bounds_give_a_finite_fit() {
        let bounds = Aabb::new(Vec3::splat(-3.0e38), Vec3::splat(3.0e38));
        let fitted = fit_bounds(&looking_down_z(), Some(bounds));
        assert_eq!(fitted.target, Vec3::ZERO);
        assert_eq!(fitted.eye, Vec3::new(0.0, 0.0, MAX_FIT_DISTANCE));
        assert!((fitted.distance() - MAX_FIT_DISTANCE).abs() <= MAX_FIT_DISTANCE * 1e-6);
        assert!(fitted.far.is_finite());
        assert!(fitted.near > 0.0 && fitted.near < fitted.far);
    }

    #[test]
    fn coincident_eye_and_target_falls_back_to_z_axis() {
        let camera = CameraState::new(Vec3::ZERO, Vec3::ZERO, 45.0);
        let fitted = fit_bounds(&camera, Some(Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0))));
        assert!(fitted.eye.z > 0.0);
        assert!(fitted.eye.x.abs() < 1e-6 && fitted.eye.y.abs() < 1e-6);
    }

    #[test]
    fn fit_uses_offset_asset_center() {
        let mut graph = SceneGraph::new();
        graph.add_child(
            graph.root(),
            Node::mesh(
                Some("shaft"),
                Mesh {
                    bounds: Aabb::new(Vec3::new(9.0, -1.0, -1.0), Vec3::new(11.0, 1.0, 1.0)),
                    material: Some(Material::default()),
                },
            ),
        );
        let fitted = fit_camera(&looking_down_z(), &graph);
        assert!((fitted.target - Vec3::new(10.0, 0.0, 0.0)).length() < 1e-5);
        assert!(fitted.eye.z > fitted.target.z);
    }

    #[test]
    fn orbit_zoom_is_clamped() {
        let fitted = fit_bounds(
            &looking_down_z(),
            Some(Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0))),
        );
        let mut orbit = OrbitController::from_fit(&fitted);
        let (min, max) = orbit.distance_limits();
        orbit.zoom(0.01);
        assert!((orbit.distance - min).abs() < 1e-6);
        orbit.zoom(1000.0);
        assert!((orbit.distance - max).abs() < 1e-6);
    }

    #[test]
    fn orbit_starts_where_fit_left_off() {
        let fitted = fit_bounds(
            &looking_down_z(),
            Some(Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0))),
        );
        let orbit = OrbitController::from_fit(&fitted);
        assert!((orbit.state().eye - fitted.eye).length() < 1e-4);
    }

    #[test]
    fn damped_rotation_settles_and_stays_finite() {
        let fitted = fit_bounds(&looking_down_z(), None);
        let mut orbit = OrbitController::from_fit(&fitted);
        orbit.rotate(0.5, 3.0);
        let mut frames = 0;
        while orbit.update() {
            frames += 1;
            assert!(frames < 10_000);
        }
        let state = orbit.state();
        assert!(state.eye.is_finite());
        assert!(orbit.pitch <= PITCH_LIMIT);
        assert!((state.distance() - orbit.distance).abs() < 1e-4);
    }
}
