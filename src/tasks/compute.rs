//! Compute task queue (spec §4.7).
//!
//! `ComputeTaskQueue` just records declarative dispatch requests;
//! [`ComputeTaskQueue::compile_rg_passes`] is where they actually become
//! graph passes, auto-promoting raw buffer/texture names into
//! [`crate::graph::handle::ResourceHandle`]s registered against the graph.

use crate::graph::graph::RenderGraph;
use crate::graph::pass::PassFlags;
use crate::name::Name;

/// One declared compute dispatch, not yet lowered into a graph pass.
#[derive(Clone, Debug)]
pub struct ComputeTask {
    pub name: Name,
    pub shader: Name,
    pub inputs: Vec<Name>,
    pub outputs: Vec<Name>,
    pub dispatch: (u32, u32, u32),
}

#[derive(Default)]
pub struct ComputeTaskQueue {
    tasks: Vec<ComputeTask>,
}

impl ComputeTaskQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues a compute dispatch. `dy`/`dz` default to 1 for 1D dispatches.
    pub fn new_task(&mut self, name: &str, shader: &str, inputs: &[&str], outputs: &[&str], dx: u32, dy: u32, dz: u32) {
        self.tasks.push(ComputeTask {
            name: Name::new(name),
            shader: Name::new(shader),
            inputs: inputs.iter().map(|s| Name::new(s)).collect(),
            outputs: outputs.iter().map(|s| Name::new(s)).collect(),
            dispatch: (dx, dy, dz),
        });
    }

    #[must_use]
    pub fn tasks(&self) -> &[ComputeTask] {
        &self.tasks
    }

    /// Registers every queued task as a compute pass on `graph`, promoting
    /// its raw input/output names into already-registered graph resources
    /// (the caller is expected to have `register_buffer`/`register_image`d
    /// them, or `create_*`d them earlier in the frame — this call does not
    /// create resources itself, matching `add_pass`'s "record the pass and
    /// update reference counts" contract in spec §4.8).
    pub fn compile_rg_passes(&self, graph: &mut RenderGraph) {
        for task in &self.tasks {
            graph.add_pass(task.name, PassFlags::COMPUTE, &task.inputs, &task.outputs);
        }
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_records_dispatch_dims() {
        let mut q = ComputeTaskQueue::new();
        q.new_task("hzb_reduce", "hzb.wgsl", &["depth"], &["hzb_mip0"], 60, 34, 1);
        assert_eq!(q.tasks()[0].dispatch, (60, 34, 1));
    }

    #[test]
    fn clear_empties_the_queue() {
        let mut q = ComputeTaskQueue::new();
        q.new_task("a", "a.wgsl", &[], &[], 1, 1, 1);
        q.clear();
        assert!(q.tasks().is_empty());
    }
}
