//! Mesh task queue: indirect-draw batching and per-view visibility buffers
//! (spec §4.6).
//!
//! The batching pipeline is kept pure (no device access) so its invariants —
//! instance-count conservation, batch contiguity, and material-family
//! ordering — can be unit-tested directly. GPU buffer upload
//! ([`MeshTaskQueue::plan_upload`]) is likewise split into a pure sizing
//! decision and a thin device-touching wrapper, the same separation
//! [`crate::gpu::shader`] uses for text preprocessing vs. compilation.

use rustc_hash::FxHashMap;

use crate::alloc::ring_buffer::RingBufferAllocator;
use crate::gpu::buffer::{Buffer, BufferConfig};

/// Symmetric injective pairing ℕ² → ℕ (Szudzik 2006), used as the
/// `(mesh_id, material_id)` dedup key (spec §4.6, §9 glossary).
#[must_use]
pub const fn szudzik_pair(a: u32, b: u32) -> u64 {
    let (a, b) = (a as u64, b as u64);
    if a >= b {
        a * a + a + b
    } else {
        a + b * b
    }
}

/// Coarse material sort group. `Opaque < Transparent` (spec §4.6, §8).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum MaterialFamily {
    Opaque,
    Transparent,
}

/// Static per-mesh geometry descriptor, registered once when a mesh is
/// uploaded and referenced by every batch that draws it.
#[derive(Clone, Copy, Debug, Default)]
pub struct MeshDescriptor {
    pub index_buffer_id: u32,
    pub first_index: u32,
    pub index_count: u32,
    pub base_vertex: u32,
}

#[derive(Clone, Copy, Debug)]
struct MeshTask {
    mesh_id: u32,
    material_id: u32,
    instance_count: u32,
    row: u32,
    family: MaterialFamily,
}

/// One coalesced, indirect-drawable batch (spec §3 "Indirect Draw Batch").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndirectDrawBatch {
    pub mesh_id: u32,
    pub material_id: u32,
    pub family: MaterialFamily,
    pub index_buffer_id: u32,
    pub first_index: u32,
    pub index_count: u32,
    pub base_vertex: u32,
    pub base_instance: u32,
    pub instance_count: u32,
}

impl IndirectDrawBatch {
    /// The 5 × u32 wire layout uploaded to the indirect-draw table.
    /// `instance_count` is always serialized as zero — the GPU cull pass
    /// increments it atomically (spec §4.6 invariant).
    #[must_use]
    pub fn to_indirect_words(self) -> [u32; 5] {
        [self.index_count, 0, self.first_index, self.base_vertex, self.base_instance]
    }
}

/// `(batch_index, row)` — `row` encodes `(slot, chunk_index)` of ECS storage
/// (spec §3 "Object Instance Entry").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObjectInstanceEntry {
    pub batch_index: u32,
    pub row: u32,
}

impl ObjectInstanceEntry {
    #[must_use]
    pub const fn to_words(self) -> [u32; 2] {
        [self.batch_index, self.row]
    }
}

/// Per-view GPU-side visibility buffers (spec §4.6: "`allocate_view_data`").
pub struct IndirectDrawObject {
    pub indirect_draw_buffer: Buffer,
    pub visible_instance_buffer_no_occlusion: Buffer,
    pub visible_instance_buffer: Buffer,
    pub capacity: u64,
}

/// Whether a planned upload needed to grow its backing buffer — callers
/// must mark dependent bind groups dirty when this is `Some`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UploadPlan {
    pub span: std::ops::Range<usize>,
    pub grow_to: Option<u64>,
}

/// Decides this frame's contiguous upload span and whether the backing
/// buffer must grow first, given `total_len` logical words, the buffer's
/// `current_capacity` words, and a `per_frame_budget` (spec §4.6: "bounded
/// per-frame write budget that cycles across buffered frames ... reallocates
/// buffers with geometric growth when capacity is exceeded").
pub fn plan_upload(
    total_len: usize,
    current_capacity: u64,
    per_frame_budget: usize,
    ring: &mut RingBufferAllocator,
) -> UploadPlan {
    let grow_to = if total_len as u64 > current_capacity {
        Some((current_capacity.max(1) * 2).max(total_len as u64))
    } else {
        None
    };
    if let Some(new_cap) = grow_to {
        ring.grow_to(new_cap as usize);
    }
    let span = ring.take(per_frame_budget.min(total_len));
    UploadPlan { span, grow_to }
}

/// Collects per-frame mesh draws and batches them into indirect-draw tables.
#[derive(Default)]
pub struct MeshTaskQueue {
    mesh_descriptors: FxHashMap<u32, MeshDescriptor>,
    tasks: FxHashMap<(u32, u64), MeshTask>,
    needs_sort: bool,
    batches: Vec<IndirectDrawBatch>,
    object_instances: Vec<ObjectInstanceEntry>,
    view_data: FxHashMap<u32, IndirectDrawObject>,
}

impl MeshTaskQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_mesh(&mut self, mesh_id: u32, descriptor: MeshDescriptor) {
        self.mesh_descriptors.insert(mesh_id, descriptor);
    }

    /// Inserts or replaces the task for `entity`'s `(mesh_id, material_id)`
    /// pair. Replacing an existing task (same entity, same pair) updates its
    /// `instance_count`/`row`/`family` in place rather than duplicating it
    /// (spec §4.6: "dedupes on `(mesh_id, material_id)` per entity via a
    /// Szudzik pairing key").
    pub fn new_task(
        &mut self,
        mesh_id: u32,
        entity: u32,
        material_id: u32,
        instance_count: u32,
        row: u32,
        family: MaterialFamily,
        resort: bool,
    ) {
        let key = szudzik_pair(mesh_id, material_id);
        self.tasks.insert(
            (entity, key),
            MeshTask {
                mesh_id,
                material_id,
                instance_count,
                row,
                family,
            },
        );
        if resort {
            self.needs_sort = true;
        }
    }

    /// Removes every task belonging to `entity`.
    pub fn remove(&mut self, entity: u32) {
        let before = self.tasks.len();
        self.tasks.retain(|(e, _), _| *e != entity);
        if self.tasks.len() != before {
            self.needs_sort = true;
        }
    }

    #[must_use]
    pub const fn needs_sort(&self) -> bool {
        self.needs_sort
    }

    #[must_use]
    pub fn batches(&self) -> &[IndirectDrawBatch] {
        &self.batches
    }

    #[must_use]
    pub fn object_instances(&self) -> &[ObjectInstanceEntry] {
        &self.object_instances
    }

    /// Orders tasks by `(mesh_id, material_id)`, coalesces consecutive
    /// same-pair tasks into batches, re-sorts batches by material family, and
    /// flattens entity rows into `object_instances` (spec §4.6).
    pub fn sort_and_batch(&mut self) {
        let mut sorted: Vec<&MeshTask> = self.tasks.values().collect();
        sorted.sort_by_key(|t| (t.mesh_id, t.material_id));

        struct WorkingBatch {
            mesh_id: u32,
            material_id: u32,
            family: MaterialFamily,
            instance_count: u32,
            rows: Vec<u32>,
        }

        let mut working: Vec<WorkingBatch> = Vec::new();
        for t in sorted {
            if let Some(last) = working.last_mut() {
                if last.mesh_id == t.mesh_id && last.material_id == t.material_id {
                    last.instance_count += t.instance_count;
                    last.rows.push(t.row);
                    continue;
                }
            }
            working.push(WorkingBatch {
                mesh_id: t.mesh_id,
                material_id: t.material_id,
                family: t.family,
                instance_count: t.instance_count,
                rows: vec![t.row],
            });
        }

        // Stable sort preserves the mesh/material order established above
        // within each family.
        working.sort_by_key(|b| b.family);

        let mut batches = Vec::with_capacity(working.len());
        let mut object_instances = Vec::new();
        let mut cumulative = 0u32;

        for (index, batch) in working.into_iter().enumerate() {
            let descriptor = self.mesh_descriptors.get(&batch.mesh_id).copied().unwrap_or_default();
            let base_instance = cumulative;

            for row in &batch.rows {
                object_instances.push(ObjectInstanceEntry {
                    batch_index: index as u32,
                    row: *row,
                });
            }

            batches.push(IndirectDrawBatch {
                mesh_id: batch.mesh_id,
                material_id: batch.material_id,
                family: batch.family,
                index_buffer_id: descriptor.index_buffer_id,
                first_index: descriptor.first_index,
                index_count: descriptor.index_count,
                base_vertex: descriptor.base_vertex,
                base_instance,
                instance_count: batch.instance_count,
            });

            cumulative += batch.instance_count;
        }

        self.batches = batches;
        self.object_instances = object_instances;
        self.needs_sort = false;
    }

    /// Serializes the indirect-draw table: 5 × u32 per batch.
    #[must_use]
    pub fn indirect_draw_words(&self) -> Vec<u32> {
        self.batches.iter().flat_map(|b| b.to_indirect_words()).collect()
    }

    /// Serializes the object-instance table: 2 × u32 per entry.
    #[must_use]
    pub fn object_instance_words(&self) -> Vec<u32> {
        self.object_instances.iter().flat_map(|e| e.to_words()).collect()
    }

    /// Allocates (or returns the existing) per-view visibility buffers.
    pub fn allocate_view_data(
        &mut self,
        device: &wgpu::Device,
        view_index: u32,
        initial_buffer_size: u64,
        buffered_frame_count: usize,
    ) -> &IndirectDrawObject {
        self.view_data.entry(view_index).or_insert_with(|| {
            let make = |name: &str, usage: wgpu::BufferUsages| {
                Buffer::create(
                    device,
                    &BufferConfig::new(name, initial_buffer_size, usage),
                    buffered_frame_count,
                )
            };
            IndirectDrawObject {
                indirect_draw_buffer: make(
                    "indirect_draw_buffer",
                    wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::INDIRECT | wgpu::BufferUsages::COPY_DST,
                ),
                visible_instance_buffer_no_occlusion: make(
                    "visible_instance_no_occlusion",
                    wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
                ),
                visible_instance_buffer: make(
                    "visible_instance",
                    wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
                ),
                capacity: initial_buffer_size,
            }
        })
    }

    #[must_use]
    pub fn view_data(&self, view_index: u32) -> Option<&IndirectDrawObject> {
        self.view_data.get(&view_index)
    }

    /// Issues one indexed-indirect draw per batch matching the given
    /// filters. `indirect_override` lets a depth prepass draw against a
    /// different view's indirect buffer than the one the batch owns.
    /// `depth_only` restricts to the depth-writing path: transparent
    /// batches composite through the accum/reveal targets rather than
    /// writing depth, so a depth-only submission excludes them regardless
    /// of `opaque_only` (spec §4.9 step 7: "opaque-only, depth-only").
    pub fn submit_indexed_indirect_draws<'a>(
        &'a self,
        pass: &mut wgpu::RenderPass<'a>,
        indirect_buffer: &'a wgpu::Buffer,
        opaque_only: bool,
        depth_only: bool,
    ) {
        let restrict_to_opaque = opaque_only || depth_only;
        for (i, batch) in self.batches.iter().enumerate() {
            if restrict_to_opaque && batch.family != MaterialFamily::Opaque {
                continue;
            }
            let offset = (i * std::mem::size_of::<[u32; 5]>()) as u64;
            pass.draw_indexed_indirect(indirect_buffer, offset);
        }
    }

    /// Issues indexed-indirect draws for batches matching `material_id` only.
    pub fn submit_material_indexed_indirect_draws<'a>(
        &'a self,
        pass: &mut wgpu::RenderPass<'a>,
        indirect_buffer: &'a wgpu::Buffer,
        material_id: u32,
    ) {
        for (i, batch) in self.batches.iter().enumerate() {
            if batch.material_id != material_id {
                continue;
            }
            let offset = (i * std::mem::size_of::<[u32; 5]>()) as u64;
            pass.draw_indexed_indirect(indirect_buffer, offset);
        }
    }

    /// Issues direct (non-indirect) indexed draws for every batch — used by
    /// hosts that disable GPU culling entirely.
    pub fn submit_indexed_draws<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        for batch in &self.batches {
            let end = batch.first_index + batch.index_count;
            pass.draw_indexed(
                batch.first_index..end,
                batch.base_vertex as i32,
                batch.base_instance..batch.base_instance + batch.instance_count,
            );
        }
    }

    /// Draws a single full-screen quad (2 triangles, no index/vertex buffer
    /// bound — the vertex shader is expected to synthesize positions from
    /// `vertex_index`), used by post-process and present passes.
    pub fn draw_quad<'a>(&self, pass: &mut wgpu::RenderPass<'a>) {
        pass.draw(0..6, 0..1);
    }

    /// Draws a single unit cube (36 vertices, no index buffer), used by DDGI
    /// probe debug visualization and skybox passes.
    pub fn draw_cube<'a>(&self, pass: &mut wgpu::RenderPass<'a>) {
        pass.draw(0..36, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn szudzik_pairing_is_injective_over_a_grid() {
        let mut seen = std::collections::HashSet::new();
        for a in 0..64u32 {
            for b in 0..64u32 {
                assert!(seen.insert(szudzik_pair(a, b)), "collision at ({a}, {b})");
            }
        }
    }

    #[test]
    fn new_task_dedupes_same_entity_and_pair() {
        let mut q = MeshTaskQueue::new();
        q.new_task(1, 100, 2, 4, 0, MaterialFamily::Opaque, true);
        q.new_task(1, 100, 2, 9, 0, MaterialFamily::Opaque, true);
        assert_eq!(q.tasks.len(), 1);
        q.sort_and_batch();
        assert_eq!(q.batches()[0].instance_count, 9);
    }

    #[test]
    fn remove_clears_all_tasks_for_entity() {
        let mut q = MeshTaskQueue::new();
        q.new_task(1, 100, 2, 1, 0, MaterialFamily::Opaque, true);
        q.new_task(3, 100, 4, 1, 0, MaterialFamily::Opaque, true);
        q.new_task(1, 200, 2, 1, 0, MaterialFamily::Opaque, true);
        q.remove(100);
        q.sort_and_batch();
        let total_instances: u32 = q.batches().iter().map(|b| b.instance_count).sum();
        assert_eq!(total_instances, 1);
    }

    #[test]
    fn sort_and_batch_conserves_instance_count() {
        let mut q = MeshTaskQueue::new();
        q.new_task(1, 1, 10, 3, 0, MaterialFamily::Opaque, true);
        q.new_task(1, 2, 10, 5, 1, MaterialFamily::Opaque, true);
        q.new_task(2, 3, 10, 2, 2, MaterialFamily::Transparent, true);
        q.sort_and_batch();

        let batch_sum: u32 = q.batches().iter().map(|b| b.instance_count).sum();
        assert_eq!(batch_sum as usize, q.object_instances().len());
    }

    #[test]
    fn batches_are_contiguous_in_base_instance() {
        let mut q = MeshTaskQueue::new();
        q.new_task(1, 1, 10, 3, 0, MaterialFamily::Opaque, true);
        q.new_task(2, 2, 10, 5, 1, MaterialFamily::Opaque, true);
        q.new_task(3, 3, 11, 2, 2, MaterialFamily::Opaque, true);
        q.sort_and_batch();

        let batches = q.batches();
        for i in 0..batches.len() - 1 {
            assert_eq!(batches[i + 1].base_instance, batches[i].base_instance + batches[i].instance_count);
        }
    }

    #[test]
    fn material_family_orders_opaque_before_transparent() {
        let mut q = MeshTaskQueue::new();
        q.new_task(5, 1, 99, 1, 0, MaterialFamily::Transparent, true);
        q.new_task(1, 2, 10, 1, 1, MaterialFamily::Opaque, true);
        q.sort_and_batch();

        let families: Vec<MaterialFamily> = q.batches().iter().map(|b| b.family).collect();
        assert!(families.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn indirect_words_always_zero_instance_count_field() {
        let mut q = MeshTaskQueue::new();
        q.new_task(1, 1, 10, 7, 0, MaterialFamily::Opaque, true);
        q.sort_and_batch();
        let words = q.indirect_draw_words();
        assert_eq!(words[1], 0);
    }

    #[test]
    fn plan_upload_signals_growth_only_when_needed() {
        let mut ring = RingBufferAllocator::new(16);
        let plan = plan_upload(8, 16, 4, &mut ring);
        assert!(plan.grow_to.is_none());

        let mut ring2 = RingBufferAllocator::new(4);
        let plan2 = plan_upload(20, 4, 4, &mut ring2);
        assert_eq!(plan2.grow_to, Some(20));
    }
}
