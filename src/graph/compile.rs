//! Render-graph compilation: culling and pass ordering (spec §4.8
//! "Compilation (`_compile`) on `submit`").
//!
//! First/last-user tracking is maintained incrementally by
//! [`crate::graph::resource::ResourceMetadata::add_producer`]/`add_consumer`
//! as passes are recorded, so this module only implements the two
//! compile-time steps that need a full view of the frame: culling
//! unreferenced passes, and applying a custom per-scene pass order.

use rustc_hash::FxHashMap;

use crate::graph::handle::ResourceHandle;
use crate::graph::pass::Pass;
use crate::graph::resource::ResourceMetadata;
use crate::name::Name;

/// Culls passes transitively unreferenced by anything force-kept (spec §4.8
/// step 1). Mutates `passes[i].culled` in place and decrements resource
/// refcounts as passes fall away; this is a destructive, one-shot pass over
/// the frame's bookkeeping — call it exactly once per `submit()`.
pub fn cull(passes: &mut [Pass], resources: &mut FxHashMap<ResourceHandle, ResourceMetadata>) {
    // Pass refcount: one unit per declared output. A pass survives as long
    // as at least one of its outputs is still referenced transitively.
    let mut pass_refcount: Vec<u32> = passes.iter().map(|p| p.outputs.len() as u32).collect();

    let mut stack: Vec<ResourceHandle> = resources
        .iter()
        .filter(|(_, meta)| meta.reference_count == 0)
        .map(|(handle, _)| *handle)
        .collect();

    while let Some(handle) = stack.pop() {
        let producers = match resources.get(&handle) {
            Some(meta) => meta.producers.clone(),
            None => continue,
        };

        for pass_index in producers {
            if pass_refcount[pass_index] == 0 {
                continue;
            }
            pass_refcount[pass_index] -= 1;
            if pass_refcount[pass_index] == 0 && !passes[pass_index].force_keep {
                passes[pass_index].culled = true;
                let inputs: Vec<ResourceHandle> = passes[pass_index].inputs.iter().map(|i| i.handle()).collect();
                for input_handle in inputs {
                    if let Some(input_meta) = resources.get_mut(&input_handle) {
                        if input_meta.release() {
                            stack.push(input_handle);
                        }
                    }
                }
            }
        }
    }
}

/// Returns the indices of non-culled passes from `passes`, in execution
/// order. When `custom_order` is `Some`, passes named in it sort by their
/// position there; passes not named sort after all of them, and ties (two
/// passes both absent from `custom_order`, or — impossible since names are
/// unique — sharing a position) break by original insertion order (spec
/// §4.8 step 2).
#[must_use]
pub fn order_passes(passes: &[Pass], custom_order: Option<&[Name]>) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..passes.len()).filter(|&i| !passes[i].culled).collect();

    if let Some(order) = custom_order {
        let rank: FxHashMap<Name, usize> = order.iter().enumerate().map(|(i, n)| (*n, i)).collect();
        indices.sort_by_key(|&i| (rank.get(&passes[i].name).copied().unwrap_or(usize::MAX), i));
    }

    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::handle::ResourceKind;
    use crate::graph::pass::{PassFlags, PassInput};

    fn handle(index: u32) -> ResourceHandle {
        ResourceHandle::new(index, ResourceKind::Image, 0)
    }

    #[test]
    fn unreferenced_pass_is_culled() {
        let h_out = handle(0);
        let mut passes = vec![Pass::new(Name::new("unused_pass"), PassFlags::GRAPHICS, vec![], vec![h_out])];
        let mut resources = FxHashMap::default();
        resources.insert(h_out, ResourceMetadata::new(Name::new("unused_image"), false));

        cull(&mut passes, &mut resources);
        assert!(passes[0].culled);
    }

    #[test]
    fn referenced_pass_and_its_producer_chain_survive() {
        let h_gbuffer = handle(0);
        let h_lit = handle(1);

        let gbuffer_pass = Pass::new(Name::new("gbuffer"), PassFlags::GRAPHICS, vec![], vec![h_gbuffer]);
        let lighting_pass = Pass::new(
            Name::new("lighting"),
            PassFlags::GRAPHICS | PassFlags::PRESENT,
            vec![PassInput::Bound {
                handle: h_gbuffer,
                binding: 0,
            }],
            vec![h_lit],
        );

        let mut passes = vec![gbuffer_pass, lighting_pass];
        let mut resources = FxHashMap::default();
        let mut gbuffer_meta = ResourceMetadata::new(Name::new("gbuffer_albedo"), false);
        gbuffer_meta.add_producer(0);
        gbuffer_meta.add_consumer(1);
        resources.insert(h_gbuffer, gbuffer_meta);

        let mut lit_meta = ResourceMetadata::new(Name::new("lit"), false);
        lit_meta.add_producer(1);
        resources.insert(h_lit, lit_meta);

        cull(&mut passes, &mut resources);
        assert!(!passes[0].culled);
        assert!(!passes[1].culled);
    }

    #[test]
    fn present_pass_is_never_culled_even_with_no_consumers() {
        let h_out = handle(0);
        let mut passes = vec![Pass::new(
            Name::new("present"),
            PassFlags::GRAPHICS | PassFlags::PRESENT,
            vec![],
            vec![h_out],
        )];
        let mut resources = FxHashMap::default();
        resources.insert(h_out, ResourceMetadata::new(Name::new("swapchain"), true));

        cull(&mut passes, &mut resources);
        assert!(!passes[0].culled);
    }

    #[test]
    fn custom_order_sorts_named_passes_and_pushes_unnamed_to_the_end() {
        let passes = vec![
            Pass::new(Name::new("c"), PassFlags::GRAPHICS, vec![], vec![]),
            Pass::new(Name::new("unnamed"), PassFlags::GRAPHICS, vec![], vec![]),
            Pass::new(Name::new("a"), PassFlags::GRAPHICS, vec![], vec![]),
            Pass::new(Name::new("b"), PassFlags::GRAPHICS, vec![], vec![]),
        ];
        let order = [Name::new("a"), Name::new("b"), Name::new("c")];
        let ordered = order_passes(&passes, Some(&order));
        assert_eq!(ordered, vec![2, 3, 0, 1]);
    }

    #[test]
    fn no_custom_order_preserves_insertion_order() {
        let passes = vec![
            Pass::new(Name::new("x"), PassFlags::GRAPHICS, vec![], vec![]),
            Pass::new(Name::new("y"), PassFlags::GRAPHICS, vec![], vec![]),
        ];
        let ordered = order_passes(&passes, None);
        assert_eq!(ordered, vec![0, 1]);
    }
}
