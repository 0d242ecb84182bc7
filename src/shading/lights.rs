//! Active-light compaction (spec §4.9 step 2).
//!
//! Sparse `LightFragment` rows (one slot per possible light, many unused)
//! are packed by a compute pass into two dense buffers — all lights, and
//! shadow-casting lights only — plus a small count header. The workgroup
//! size and dispatch math live here so they're covered by a unit test
//! without needing a device.

/// Threads per workgroup for the compaction compute pass (spec §4.9 step 2:
/// "Atomic indexing; 128-thread workgroups").
pub const COMPACT_LIGHTS_WORKGROUP_SIZE: u32 = 128;

/// A sparse per-slot light record as read by the compaction pass. Unused
/// slots have `active = false` and are skipped.
#[derive(Clone, Copy, Debug)]
pub struct LightFragment {
    pub active: bool,
    pub casts_shadows: bool,
}

/// Dispatch width for compacting `slot_count` sparse light slots.
#[must_use]
pub fn dispatch_count(slot_count: u32) -> u32 {
    slot_count.div_ceil(COMPACT_LIGHTS_WORKGROUP_SIZE)
}

/// CPU-side reference model of what the compaction compute pass computes,
/// used to validate the atomic-indexing contract in tests: all active
/// lights packed densely, shadow casters packed into their own dense list,
/// both counts reported via a 2×u32 header.
#[must_use]
pub fn compact(fragments: &[LightFragment]) -> (Vec<usize>, Vec<usize>) {
    let mut all = Vec::new();
    let mut shadow_casters = Vec::new();
    for (slot, fragment) in fragments.iter().enumerate() {
        if !fragment.active {
            continue;
        }
        all.push(slot);
        if fragment.casts_shadows {
            shadow_casters.push(slot);
        }
    }
    (all, shadow_casters)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_count_rounds_up_to_full_workgroups() {
        assert_eq!(dispatch_count(128), 1);
        assert_eq!(dispatch_count(129), 2);
        assert_eq!(dispatch_count(0), 0);
    }

    #[test]
    fn compact_skips_inactive_slots_and_separates_shadow_casters() {
        let fragments = [
            LightFragment { active: true, casts_shadows: true },
            LightFragment { active: false, casts_shadows: true },
            LightFragment { active: true, casts_shadows: false },
        ];
        let (all, shadow_casters) = compact(&fragments);
        assert_eq!(all, vec![0, 2]);
        assert_eq!(shadow_casters, vec![0]);
    }
}
