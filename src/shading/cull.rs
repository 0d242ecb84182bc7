//! Two-phase GPU culling: frustum then HZB occlusion (spec §4.9 steps 5–10,
//! §8 scenario 5).
//!
//! The actual per-instance tests run in compute shaders the core doesn't
//! own (spec §1: raw shader text is a host concern); what lives here is the
//! dispatch-size arithmetic and a CPU reference model of the two-phase
//! protocol, used to pin down the "all behind an occluder survive zero"
//! invariant in tests.

use glam::Vec3;

/// Threads per workgroup for clear-visibility / frustum-cull /
/// reset-instance-counts / occlusion-cull compute passes.
pub const WORKGROUP_SIZE: u32 = 64;

#[must_use]
pub fn dispatch_count(instance_count: u32) -> u32 {
    instance_count.div_ceil(WORKGROUP_SIZE)
}

/// An axis-aligned bounding box in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    #[must_use]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

/// A camera-space frustum plane `dot(normal, p) + d >= 0` for points inside.
#[derive(Clone, Copy, Debug)]
pub struct FrustumPlane {
    pub normal: Vec3,
    pub d: f32,
}

/// Six-plane view frustum (left, right, top, bottom, near, far).
pub struct Frustum {
    pub planes: [FrustumPlane; 6],
}

impl Frustum {
    /// Conservative AABB-vs-frustum test: an AABB is outside if any plane's
    /// "positive half" doesn't contain its positive-extent corner.
    #[must_use]
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        self.planes.iter().all(|plane| {
            let positive = Vec3::new(
                if plane.normal.x >= 0.0 { aabb.max.x } else { aabb.min.x },
                if plane.normal.y >= 0.0 { aabb.max.y } else { aabb.min.y },
                if plane.normal.z >= 0.0 { aabb.max.z } else { aabb.min.z },
            );
            plane.normal.dot(positive) + plane.d >= 0.0
        })
    }
}

/// A single-value conservative occluder depth proxy, standing in for an
/// HZB mip sample: an AABB is occluded if its nearest point is farther from
/// the camera than `occluder_depth` (larger `z` = farther, matching a
/// standard, non-reversed depth convention).
#[must_use]
pub fn occluded_by_depth(aabb: &Aabb, camera_forward_z: impl Fn(Vec3) -> f32, occluder_depth: f32) -> bool {
    let nearest_corner_z = [aabb.min, aabb.max]
        .iter()
        .map(|&v| camera_forward_z(v))
        .fold(f32::INFINITY, f32::min);
    nearest_corner_z > occluder_depth
}

/// Result of running frustum cull then occlusion cull over one view's
/// instances, matching the two-phase protocol (spec §4.9 steps 6, 10).
#[must_use]
pub fn simulate_two_pass_cull(
    instances: &[Aabb],
    frustum: &Frustum,
    camera_forward_z: impl Fn(Vec3) -> f32,
    occluder_depth: f32,
) -> Vec<bool> {
    instances
        .iter()
        .map(|aabb| frustum.intersects_aabb(aabb) && !occluded_by_depth(aabb, &camera_forward_z, occluder_depth))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_frustum() -> Frustum {
        let planes = [
            FrustumPlane { normal: Vec3::new(1.0, 0.0, 0.0), d: 1000.0 },
            FrustumPlane { normal: Vec3::new(-1.0, 0.0, 0.0), d: 1000.0 },
            FrustumPlane { normal: Vec3::new(0.0, 1.0, 0.0), d: 1000.0 },
            FrustumPlane { normal: Vec3::new(0.0, -1.0, 0.0), d: 1000.0 },
            FrustumPlane { normal: Vec3::new(0.0, 0.0, 1.0), d: 1000.0 },
            FrustumPlane { normal: Vec3::new(0.0, 0.0, -1.0), d: 1000.0 },
        ];
        Frustum { planes }
    }

    #[test]
    fn dispatch_count_rounds_up() {
        assert_eq!(dispatch_count(64), 1);
        assert_eq!(dispatch_count(65), 2);
    }

    #[test]
    fn all_instances_inside_frustum_but_behind_occluder_yield_zero_survivors() {
        let frustum = identity_frustum();
        let instances: Vec<Aabb> = (0..1000)
            .map(|i| {
                let x = (i % 10) as f32;
                Aabb::new(Vec3::new(x, 0.0, 50.0), Vec3::new(x + 0.5, 0.5, 50.5))
            })
            .collect();

        let visible = simulate_two_pass_cull(&instances, &frustum, |v| v.z, 10.0);
        assert!(visible.iter().all(|&v| !v));
    }

    #[test]
    fn an_unoccluded_in_frustum_instance_survives() {
        let frustum = identity_frustum();
        let instances = vec![Aabb::new(Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.5, 0.5, 1.5))];
        let visible = simulate_two_pass_cull(&instances, &frustum, |v| v.z, 10.0);
        assert_eq!(visible, vec![true]);
    }

    #[test]
    fn an_instance_outside_the_frustum_is_culled_regardless_of_occlusion() {
        let frustum = identity_frustum();
        let instances = vec![Aabb::new(Vec3::new(5000.0, 0.0, 1.0), Vec3::new(5000.5, 0.5, 1.5))];
        let visible = simulate_two_pass_cull(&instances, &frustum, |v| v.z, 10_000.0);
        assert_eq!(visible, vec![false]);
    }
}
