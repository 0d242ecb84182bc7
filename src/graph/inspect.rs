//! Render-graph inspector, gated behind the `rdg_inspector` feature.
//!
//! Dumps the compiled pass list and resource lifetimes as plain data for
//! external tooling (an editor overlay, a frame-capture viewer) — no wgpu
//! dependency, so a host can print or serialize it without a device.

use crate::graph::graph::RenderGraph;
use crate::graph::pass::PassFlags;
use crate::name::Name;

/// One compiled pass as exposed to inspector tooling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PassSnapshot {
    pub name: Name,
    pub flags: PassFlags,
    pub culled: bool,
}

/// One resource's per-frame lifetime as exposed to inspector tooling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResourceSnapshot {
    pub name: Name,
    pub reference_count: u32,
    pub first_user: Option<usize>,
    pub last_user: Option<usize>,
    pub is_persistent: bool,
}

/// A full dump of one compiled frame: every recorded pass (culled or not)
/// in insertion order, plus every tracked resource's lifetime.
#[derive(Clone, Debug, Default)]
pub struct GraphSnapshot {
    pub passes: Vec<PassSnapshot>,
    pub resources: Vec<ResourceSnapshot>,
}

impl GraphSnapshot {
    #[must_use]
    pub fn surviving_pass_names(&self) -> Vec<Name> {
        self.passes.iter().filter(|p| !p.culled).map(|p| p.name).collect()
    }
}

/// Captures a [`GraphSnapshot`] of `graph` as it stands after its most
/// recent [`RenderGraph::compile`] (or [`RenderGraph::submit`]) call.
#[must_use]
pub fn snapshot(graph: &RenderGraph) -> GraphSnapshot {
    GraphSnapshot {
        passes: graph.inspect_passes(),
        resources: graph.inspect_resources(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::graph::RenderGraph;
    use crate::gpu::texture::TextureConfig;

    #[test]
    fn a_culled_pass_is_reported_but_flagged_culled() {
        let mut graph = RenderGraph::new(2);
        graph.begin();
        graph.create_image("scratch", TextureConfig::render_target_2d("scratch", 1, 1, wgpu::TextureFormat::Rgba8Unorm));
        graph.add_pass(Name::new("produce_scratch"), PassFlags::GRAPHICS, &[], &[Name::new("scratch")]);
        graph.compile();

        let snap = snapshot(&graph);
        assert_eq!(snap.passes.len(), 1);
        assert!(snap.passes[0].culled);
        assert!(snap.surviving_pass_names().is_empty());
    }

    #[test]
    fn a_present_pass_survives_into_the_snapshot() {
        let mut graph = RenderGraph::new(2);
        graph.begin();
        graph.create_image("swapchain", TextureConfig::render_target_2d("swapchain", 1, 1, wgpu::TextureFormat::Rgba8Unorm));
        graph.add_pass(Name::new("present"), PassFlags::GRAPHICS | PassFlags::PRESENT, &[], &[Name::new("swapchain")]);
        graph.compile();

        let snap = snapshot(&graph);
        assert_eq!(snap.surviving_pass_names(), vec![Name::new("present")]);
    }
}
