//! Compute-rasterization task queue (spec §4.7).
//!
//! Used for primitives cheaper to rasterize in a compute shader than through
//! the fixed-function pipeline (DDGI probe border fixup lines, VSM tile
//! debug overlays, particle quads): each task writes directly into
//! caller-supplied storage-image bindings rather than through a render pass.

use crate::name::Name;

/// Primitive topology a compute-raster task rasterizes.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Primitive {
    Point,
    Line,
    Triangle,
    Quad,
}

/// Fixed workgroup size for every compute-raster dispatch (spec §4.7).
pub const WORKGROUP_SIZE: u32 = 256;

/// One declared compute-raster dispatch.
#[derive(Clone, Debug)]
pub struct ComputeRasterTask {
    pub points: Vec<Name>,
    pub connections: Vec<(u32, u32)>,
    pub inputs: Vec<Name>,
    pub primitive: Primitive,
    pub num_primitives: u32,
}

impl ComputeRasterTask {
    /// `⌈num_primitives / 256⌉` (spec §4.7).
    #[must_use]
    pub const fn dispatch_count(&self) -> u32 {
        self.num_primitives.div_ceil(WORKGROUP_SIZE)
    }
}

#[derive(Default)]
pub struct ComputeRasterTaskQueue {
    tasks: Vec<ComputeRasterTask>,
}

impl ComputeRasterTaskQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_task(
        &mut self,
        points: &[&str],
        connections: &[(u32, u32)],
        inputs: &[&str],
        primitive: Primitive,
    ) {
        let num_primitives = match primitive {
            Primitive::Point => points.len() as u32,
            Primitive::Line => connections.len() as u32,
            Primitive::Triangle => (points.len() as u32) / 3,
            Primitive::Quad => (points.len() as u32) / 4,
        };
        self.tasks.push(ComputeRasterTask {
            points: points.iter().map(|s| Name::new(s)).collect(),
            connections: connections.to_vec(),
            inputs: inputs.iter().map(|s| Name::new(s)).collect(),
            primitive,
            num_primitives,
        });
    }

    #[must_use]
    pub fn tasks(&self) -> &[ComputeRasterTask] {
        &self.tasks
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_count_rounds_up() {
        let mut q = ComputeRasterTaskQueue::new();
        q.new_task(&["a"; 257], &[], &[], Primitive::Point);
        assert_eq!(q.tasks()[0].dispatch_count(), 2);
    }

    #[test]
    fn dispatch_count_exact_multiple_needs_no_extra_group() {
        let mut q = ComputeRasterTaskQueue::new();
        q.new_task(&["a"; 512], &[], &[], Primitive::Point);
        assert_eq!(q.tasks()[0].dispatch_count(), 2);
    }

    #[test]
    fn line_primitive_counts_connections() {
        let mut q = ComputeRasterTaskQueue::new();
        q.new_task(&["a", "b", "c"], &[(0, 1), (1, 2)], &[], Primitive::Line);
        assert_eq!(q.tasks()[0].num_primitives, 2);
    }
}
