//! Manual micro-benchmark for the render-graph compile step (cull +
//! ordering), the hottest CPU-side path run once per frame. No GPU device
//! is involved — `[[bench]] harness = false` in `Cargo.toml` runs this as a
//! plain binary rather than through `libtest`'s bencher, so it prints its
//! own timings.

use std::time::Instant;

use nightforge::graph::{cull, order_passes, Pass, PassFlags, PassInput, ResourceHandle, ResourceKind, ResourceMetadata};
use nightforge::Name;
use rustc_hash::FxHashMap;

/// Builds a long linear chain of passes, each consuming the previous pass's
/// single output and producing one of its own, with the final pass
/// force-kept (as a `Present` pass would be). This is the shape a deferred
/// renderer's per-frame graph actually has: a long dependency chain, not a
/// wide fan-out.
fn build_chain(depth: usize) -> (Vec<Pass>, FxHashMap<ResourceHandle, ResourceMetadata>) {
    let mut passes = Vec::with_capacity(depth);
    let mut resources = FxHashMap::default();

    let mut prev_handle: Option<ResourceHandle> = None;
    for i in 0..depth {
        let name = Name::new(&format!("chain_resource_{i}"));
        let handle = ResourceHandle::new(i as u32, ResourceKind::Image, 0);
        let mut meta = ResourceMetadata::new(name, false);

        let flags = if i + 1 == depth {
            PassFlags::GRAPHICS | PassFlags::PRESENT
        } else {
            PassFlags::GRAPHICS
        };

        let inputs = prev_handle.map_or_else(Vec::new, |h| {
            if let Some(prev_meta) = resources.get_mut(&h) {
                prev_meta.add_consumer(i);
            }
            vec![PassInput::Bound { handle: h, binding: 0 }]
        });
        meta.add_producer(i);
        resources.insert(handle, meta);
        passes.push(Pass::new(Name::new(&format!("chain_pass_{i}")), flags, inputs, vec![handle]));

        prev_handle = Some(handle);
    }

    (passes, resources)
}

fn run_once(depth: usize) -> std::time::Duration {
    let (mut passes, mut resources) = build_chain(depth);
    let start = Instant::now();
    cull(&mut passes, &mut resources);
    let _ordered = order_passes(&passes, None);
    start.elapsed()
}

fn main() {
    env_logger::init();

    for depth in [32usize, 128, 512, 2048] {
        let mut total = std::time::Duration::ZERO;
        const ITERS: u32 = 50;
        for _ in 0..ITERS {
            total += run_once(depth);
        }
        let avg = total / ITERS;
        println!("compile({depth:>5} passes): avg {avg:?} over {ITERS} iterations");
    }
}
