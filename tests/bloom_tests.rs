//! Bloom downsample/upsample chain shape (spec §4.9 step 18).

use nightforge::shading::bloom::{downsample_chain, upsample_chain, DOWNSAMPLE_ITERATIONS, UPSAMPLE_ITERATIONS};

#[test]
fn downsample_chain_has_exactly_four_iterations_regardless_of_resolution() {
    for (w, h) in [(1920u32, 1080u32), (640, 360), (7, 5)] {
        let chain = downsample_chain(w, h);
        assert_eq!(chain.len() as u32, DOWNSAMPLE_ITERATIONS);
    }
}

#[test]
fn upsample_chain_has_exactly_three_iterations_and_mirrors_the_downsample_extents() {
    let down = downsample_chain(1920, 1080);
    let up = upsample_chain(&down);
    assert_eq!(up.len() as u32, UPSAMPLE_ITERATIONS);
    for (step, params) in up.iter().enumerate() {
        let coarse = &down[down.len() - 1 - step];
        assert_eq!(params.src_width, coarse.dst_width);
        assert_eq!(params.dst_width, coarse.src_width);
    }
}

#[test]
fn the_full_chain_never_collapses_below_one_pixel_on_a_tiny_source() {
    let down = downsample_chain(3, 2);
    assert!(down.iter().all(|p| p.dst_width >= 1 && p.dst_height >= 1));
    let up = upsample_chain(&down);
    assert!(up.iter().all(|p| p.dst_width >= 1 && p.dst_height >= 1));
}
