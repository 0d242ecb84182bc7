//! AS-VSM tile-grid and LRU-ring invariants (spec §8 scenario 6).

use nightforge::shading::vsm::tiles::{LruRing, VsmSettings, DEFAULT_MAX_REQUESTS_PER_VIEW};

fn settings(tile_size: u32, virtual_dim: u32, atlas_size: u32, max_lods: u32) -> VsmSettings {
    VsmSettings {
        tile_size,
        virtual_dim,
        atlas_size,
        max_lods,
        max_requests_per_view: DEFAULT_MAX_REQUESTS_PER_VIEW,
    }
}

#[test]
fn one_light_atlas_2048_tile_32_virtual_4096_matches_the_spec_worked_example() {
    let s = settings(32, 4096, 2048, 1);
    assert_eq!(s.virtual_tiles_per_row(), 128);
    assert_eq!(s.physical_tiles_per_row(), 64);
    assert_eq!(s.total_virtual_tiles(), 16384);
    assert_eq!(s.total_physical_tiles(), 4096);
    assert_eq!(s.bitmask_word_count(), 512);

    let ring = LruRing::new(s.total_physical_tiles());
    assert_eq!(ring.head, 0);
    assert_eq!(ring.payload, (0..4096).collect::<Vec<u32>>());
}

#[test]
fn a_second_max_lod_quadruples_total_tile_counts() {
    let s = settings(32, 4096, 2048, 2);
    assert_eq!(s.total_virtual_tiles(), 16384 * 2);
    assert_eq!(s.total_physical_tiles(), 4096 * 2);
}

#[test]
fn eviction_cycles_through_every_physical_slot_before_repeating() {
    let mut ring = LruRing::new(8);
    let mut evicted = Vec::new();
    for _ in 0..8 {
        evicted.push(ring.evict_lru().unwrap());
    }
    evicted.sort_unstable();
    assert_eq!(evicted, (0..8).collect::<Vec<u32>>());
    // the ninth eviction wraps back to slot 0
    assert_eq!(ring.evict_lru(), Some(0));
}
