//! glam ↔ rapier (nalgebra) conversions

use glam::{Quat, Vec3};
use rapier3d::na::{Quaternion, Translation3, UnitQuaternion};
use rapier3d::prelude::*;

use crate::MotionState;

pub fn to_vector(v: Vec3) -> Vector<Real> {
    vector![v.x, v.y, v.z]
}

pub fn from_vector(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

/// Normalizes on the way in, so slightly drifted quaternions are accepted.
pub fn to_rotation(q: Quat) -> UnitQuaternion<Real> {
    UnitQuaternion::new_normalize(Quaternion::new(q.w, q.x, q.y, q.z))
}

pub fn from_rotation(q: &UnitQuaternion<Real>) -> Quat {
    Quat::from_xyzw(q.i, q.j, q.k, q.w)
}

pub fn to_isometry(state: &MotionState) -> Isometry<Real> {
    Isometry::from_parts(
        Translation3::from(to_vector(state.origin)),
        to_rotation(state.rotation),
    )
}

pub fn from_isometry(iso: &Isometry<Real>) -> MotionState {
    MotionState {
        origin: from_vector(&iso.translation.vector),
        rotation: from_rotation(&iso.rotation),
    }
}
