//! Debug/overlay line renderer (spec §4.9 step 14): a compute pass builds
//! per-line transforms, then a graphics pass draws a quad instanced by the
//! visible line count.

pub const TRANSFORM_BUILD_WORKGROUP_SIZE: u32 = 64;

#[must_use]
pub fn dispatch_count(line_count: u32) -> u32 {
    line_count.div_ceil(TRANSFORM_BUILD_WORKGROUP_SIZE)
}

/// A CPU-declared line segment before transform-building; width is in
/// screen-space pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineSegment {
    pub start: glam::Vec3,
    pub end: glam::Vec3,
    pub width: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_count_rounds_up_to_full_workgroups() {
        assert_eq!(dispatch_count(64), 1);
        assert_eq!(dispatch_count(65), 2);
        assert_eq!(dispatch_count(0), 0);
    }
}
