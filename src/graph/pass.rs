//! Recorded render-graph passes (spec §4.8).

use bitflags::bitflags;

use crate::graph::handle::ResourceHandle;
use crate::name::Name;

bitflags! {
    /// Pass kind and special compilation behavior.
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct PassFlags: u8 {
        const GRAPHICS = 1 << 0;
        const COMPUTE = 1 << 1;
        /// A present pass is always force-kept, even with refcount 0.
        const PRESENT = 1 << 2;
        /// A graph-local pass exists only to set up state for others within
        /// this frame and is never itself an execution target.
        const GRAPH_LOCAL = 1 << 3;
    }
}

/// A pass input, classified as a regular bind or a bindless sub-slot
/// reference (spec §4.8 step "classify each input").
#[derive(Clone, Copy, Debug)]
pub enum PassInput {
    Bound { handle: ResourceHandle, binding: u32 },
    Bindless { handle: ResourceHandle, slot: u32 },
}

impl PassInput {
    #[must_use]
    pub const fn handle(self) -> ResourceHandle {
        match self {
            Self::Bound { handle, .. } | Self::Bindless { handle, .. } => handle,
        }
    }
}

/// Which shader modules a pass's pipeline is built from (spec §4.8: "create
/// pipeline state from shader + attachments"). A compute pass only sets
/// `compute`; a graphics pass sets `vertex` and, usually, `fragment`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ShaderSetup {
    pub vertex: Option<Name>,
    pub fragment: Option<Name>,
    pub compute: Option<Name>,
}

impl ShaderSetup {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.vertex.is_none() && self.fragment.is_none() && self.compute.is_none()
    }
}

/// Picks which sub-view of a multi-mip/multi-layer texture a pass input or
/// output binds to (spec §4.8: "using the pass's `output_views[i]` for
/// per-mip / per-layer targeting"). `None` in both fields means the
/// texture's default view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ViewSelector {
    pub mip: Option<u32>,
    pub layer: Option<u32>,
}

/// A recorded pass, as added via `RenderGraph::add_pass`.
pub struct Pass {
    pub name: Name,
    pub flags: PassFlags,
    pub inputs: Vec<PassInput>,
    pub outputs: Vec<ResourceHandle>,
    pub force_keep: bool,
    pub skip_pass_bind_group_setup: bool,
    pub skip_pass_pipeline_setup: bool,
    pub culled: bool,
    /// Shader(s) the render graph synthesizes the pass's bind groups and
    /// pipeline from at `submit()` time. Empty for `GRAPH_LOCAL` passes that
    /// only exist to set up state for others.
    pub shader_setup: ShaderSetup,
    /// Color attachment resource names, in `wgpu` color-target order.
    pub attachments: Vec<Name>,
    pub depth_stencil_attachment: Option<Name>,
    /// Per-resource view overrides for passes that target a single mip or
    /// array layer instead of a texture's default view.
    pub output_views: Vec<(Name, ViewSelector)>,
}

impl Pass {
    #[must_use]
    pub fn new(name: Name, flags: PassFlags, inputs: Vec<PassInput>, outputs: Vec<ResourceHandle>) -> Self {
        let force_keep = flags.contains(PassFlags::PRESENT);
        Self {
            name,
            flags,
            inputs,
            outputs,
            force_keep,
            skip_pass_bind_group_setup: false,
            skip_pass_pipeline_setup: false,
            culled: false,
            shader_setup: ShaderSetup::default(),
            attachments: Vec::new(),
            depth_stencil_attachment: None,
            output_views: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_shader_setup(mut self, setup: ShaderSetup) -> Self {
        self.shader_setup = setup;
        self
    }

    #[must_use]
    pub fn with_attachments(mut self, attachments: Vec<Name>) -> Self {
        self.attachments = attachments;
        self
    }

    #[must_use]
    pub fn with_depth_stencil_attachment(mut self, name: Name) -> Self {
        self.depth_stencil_attachment = Some(name);
        self
    }

    #[must_use]
    pub fn with_output_view(mut self, name: Name, selector: ViewSelector) -> Self {
        self.output_views.push((name, selector));
        self
    }
}
