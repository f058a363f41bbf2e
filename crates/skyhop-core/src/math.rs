//! Math utilities
//!
//! Re-exports from glam and the few geometric helpers the simulation needs.

pub use glam::{EulerRot, Mat3, Mat4, Quat, Vec2, Vec3, Vec4};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Aabb {
    /// Box of `half_extents` around `center`
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }
}

/// Ray for raycasting
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Ray origin
    pub origin: Vec3,
    /// Ray direction
    pub direction: Vec3,
}

impl Ray {
    /// Create a new ray with a normalized direction
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Create a ray without normalizing the direction.
    ///
    /// Used for rays mapped into a scaled local space, where the parameter `t`
    /// must keep measuring distance along the caller's world-space ray.
    pub fn from_raw(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Map the ray through an affine matrix
    pub fn transformed(&self, matrix: Mat4) -> Ray {
        Ray::from_raw(
            matrix.transform_point3(self.origin),
            matrix.transform_vector3(self.direction),
        )
    }

    /// Slab test against an AABB.
    ///
    /// Returns the unclamped `(t_enter, t_exit)` pair when the ray's line
    /// crosses the box ahead of the origin. `t_enter` is negative when the
    /// origin lies inside the box.
    pub fn intersect_aabb(&self, aabb: &Aabb) -> Option<(f32, f32)> {
        let inv_dir = Vec3::new(
            1.0 / self.direction.x,
            1.0 / self.direction.y,
            1.0 / self.direction.z,
        );

        let t1 = (aabb.min - self.origin) * inv_dir;
        let t2 = (aabb.max - self.origin) * inv_dir;

        let t_min = t1.min(t2);
        let t_max = t1.max(t2);

        let t_enter = t_min.x.max(t_min.y).max(t_min.z);
        let t_exit = t_max.x.min(t_max.y).min(t_max.z);

        if t_enter <= t_exit && t_exit >= 0.0 {
            Some((t_enter, t_exit))
        } else {
            None
        }
    }
}

/// Keep only the rotation about +Y.
///
/// The x and z quaternion components are forced to zero and the remainder is
/// renormalized, so roll and pitch never survive.
pub fn yaw_component(rotation: Quat) -> Quat {
    let yaw = Quat::from_xyzw(0.0, rotation.y, 0.0, rotation.w);
    if yaw.length_squared() <= f32::EPSILON {
        Quat::IDENTITY
    } else {
        yaw.normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_aabb_intersection() {
        let ray = Ray::new(Vec3::new(-5.0, 0.5, 0.5), Vec3::X);
        let aabb = Aabb::from_center_half_extents(Vec3::splat(0.5), Vec3::splat(0.5));

        let (t_enter, t_exit) = ray.intersect_aabb(&aabb).unwrap();
        assert!((t_enter - 5.0).abs() < 0.001);
        assert!((t_exit - 6.0).abs() < 0.001);
    }

    #[test]
    fn test_ray_starting_inside_reports_negative_enter() {
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Y);
        let aabb = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::ONE);

        let (t_enter, t_exit) = ray.intersect_aabb(&aabb).unwrap();
        assert!(t_enter < 0.0);
        assert!((t_exit - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_ray_pointing_away_misses() {
        let ray = Ray::new(Vec3::new(0.0, 3.0, 0.0), Vec3::Y);
        let aabb = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::ONE);
        assert!(ray.intersect_aabb(&aabb).is_none());
    }

    #[test]
    fn test_scaled_ray_keeps_world_distance() {
        let world = Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y);
        // Unit box scaled by 4 along Y, so its top face sits at y = 2.
        let to_local = Mat4::from_scale(Vec3::new(1.0, 4.0, 1.0)).inverse();
        let local = world.transformed(to_local);

        let unit = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(0.5));
        let (t_enter, _) = local.intersect_aabb(&unit).unwrap();
        assert!((t_enter - 3.0).abs() < 0.001);
    }

    #[test]
    fn test_yaw_component_discards_tilt() {
        let tilted = Quat::from_euler(EulerRot::YXZ, 0.7, 0.3, -0.2);
        let yaw = yaw_component(tilted);

        assert_eq!(yaw.x, 0.0);
        assert_eq!(yaw.z, 0.0);
        assert!((yaw.length() - 1.0).abs() < 1e-5);
        assert!(yaw.y.abs() > 0.0);
    }

    #[test]
    fn test_yaw_component_of_pure_yaw_is_unchanged() {
        let q = Quat::from_rotation_y(1.2);
        assert!(yaw_component(q).abs_diff_eq(q, 1e-6));
    }
}
