//! Bloom post-processing (spec §4.9 step 18): 4 downsample iterations, 3
//! upsample iterations, then a fullscreen resolve.

use bytemuck::{Pod, Zeroable};

pub const DOWNSAMPLE_ITERATIONS: u32 = 4;
pub const UPSAMPLE_ITERATIONS: u32 = 3;

/// Per-iteration uniform for both the downsample and upsample compute
/// passes: source/destination extents plus which step this is.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct BloomStepParams {
    pub src_width: u32,
    pub src_height: u32,
    pub dst_width: u32,
    pub dst_height: u32,
    pub step_index: u32,
    pub _pad: [u32; 3],
}

/// Builds the mip-chain dimensions the downsample chain produces, each step
/// halving both extents (minimum `1×1`).
#[must_use]
pub fn downsample_chain(width: u32, height: u32) -> Vec<BloomStepParams> {
    let mut params = Vec::with_capacity(DOWNSAMPLE_ITERATIONS as usize);
    let (mut src_w, mut src_h) = (width, height);
    for step in 0..DOWNSAMPLE_ITERATIONS {
        let dst_w = (src_w / 2).max(1);
        let dst_h = (src_h / 2).max(1);
        params.push(BloomStepParams {
            src_width: src_w,
            src_height: src_h,
            dst_width: dst_w,
            dst_height: dst_h,
            step_index: step,
            _pad: [0; 3],
        });
        src_w = dst_w;
        src_h = dst_h;
    }
    params
}

/// Builds the upsample chain, walking the downsample chain's extents
/// backwards from the coarsest mip towards mip 0.
#[must_use]
pub fn upsample_chain(downsample: &[BloomStepParams]) -> Vec<BloomStepParams> {
    let mut params = Vec::with_capacity(UPSAMPLE_ITERATIONS as usize);
    for step in 0..UPSAMPLE_ITERATIONS {
        let coarse = &downsample[(downsample.len() - 1 - step as usize)];
        params.push(BloomStepParams {
            src_width: coarse.dst_width,
            src_height: coarse.dst_height,
            dst_width: coarse.src_width,
            dst_height: coarse.src_height,
            step_index: step,
            _pad: [0; 3],
        });
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downsample_chain_has_four_steps_each_halving() {
        let chain = downsample_chain(1920, 1080);
        assert_eq!(chain.len(), 4);
        assert_eq!(chain[0].dst_width, 960);
        assert_eq!(chain[3].dst_width, 120);
    }

    #[test]
    fn downsample_chain_never_goes_below_one_pixel() {
        let chain = downsample_chain(3, 1);
        assert!(chain.iter().all(|p| p.dst_width >= 1 && p.dst_height >= 1));
    }

    #[test]
    fn upsample_chain_has_three_steps_walking_back_from_the_coarsest_mip() {
        let down = downsample_chain(1920, 1080);
        let up = upsample_chain(&down);
        assert_eq!(up.len(), 3);
        assert_eq!(up[0].src_width, down[3].dst_width);
        assert_eq!(up[0].dst_width, down[3].src_width);
    }
}
