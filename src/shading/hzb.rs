//! Hierarchical-Z reduction (spec §4.9 step 8, §8 scenario 4).
//!
//! `npot(x)` ("next power of two") rounds a dimension up before taking
//! `log2`, so an odd depth-buffer size still gets a full mip chain down to
//! `1×1`. Mip `i`'s uniform carries the tuple the reduction shader needs to
//! address its source/destination texel grids without a divide.

use bytemuck::{Pod, Zeroable};

/// Per-mip uniform for the reduction shader: `(src_w, src_h, dst_w, dst_h)`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct HzbMipParams {
    pub src_width: u32,
    pub src_height: u32,
    pub dst_width: u32,
    pub dst_height: u32,
}

fn next_pow2(x: u32) -> u32 {
    if x <= 1 {
        1
    } else {
        1u32 << (32 - (x - 1).leading_zeros())
    }
}

/// Number of reduction passes needed to go from `(width, height)` down to
/// `1×1`: `max(log2(npot(width)), log2(npot(height)))`, at least 1 (even a
/// `1×1` source still runs one reduction pass reading the depth texture).
#[must_use]
pub fn mip_count(width: u32, height: u32) -> u32 {
    let w = next_pow2(width.max(1));
    let h = next_pow2(height.max(1));
    w.trailing_zeros().max(h.trailing_zeros()).max(1)
}

/// Dimensions of mip `i`, clamped to at least `1×1` (spec §8: "mip `i`
/// dimensions = `max(1, W>>i) × max(1, H>>i)`").
#[must_use]
pub fn mip_dims(width: u32, height: u32, mip: u32) -> (u32, u32) {
    ((width >> mip).max(1), (height >> mip).max(1))
}

/// Builds the full chain of per-mip uniform contents for a `(width, height)`
/// depth buffer, mip 0 reading the depth texture itself.
#[must_use]
pub fn build_mip_chain(width: u32, height: u32) -> Vec<HzbMipParams> {
    let count = mip_count(width, height);
    (0..count)
        .map(|mip| {
            let (dst_w, dst_h) = mip_dims(width, height, mip + 1);
            let (src_w, src_h) = if mip == 0 {
                (width, height)
            } else {
                mip_dims(width, height, mip)
            };
            HzbMipParams {
                src_width: src_w,
                src_height: src_h,
                dst_width: dst_w,
                dst_height: dst_h,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mip_count_matches_1920x1080_worked_example() {
        assert_eq!(mip_count(1920, 1080), 11);
    }

    #[test]
    fn mip_count_is_one_for_a_1x1_source() {
        assert_eq!(mip_count(1, 1), 1);
    }

    #[test]
    fn mip_dims_clamp_to_one_at_the_bottom_of_the_chain() {
        assert_eq!(mip_dims(1920, 1080, 11), (1, 1));
        assert_eq!(mip_dims(3, 3, 1), (1, 1));
    }

    #[test]
    fn build_mip_chain_has_mip_count_entries_and_halves_each_step() {
        let chain = build_mip_chain(1920, 1080);
        assert_eq!(chain.len(), 11);
        assert_eq!(
            chain[0],
            HzbMipParams {
                src_width: 1920,
                src_height: 1080,
                dst_width: 960,
                dst_height: 540,
            }
        );
        assert_eq!(
            chain[10],
            HzbMipParams {
                src_width: 1,
                src_height: 1,
                dst_width: 1,
                dst_height: 1,
            }
        );
    }
}
