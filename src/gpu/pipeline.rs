//! Pipeline state.
//!
//! [`PipelineState`] wraps either a `wgpu::RenderPipeline` or a
//! `wgpu::ComputePipeline`, built from a declarative descriptor plus the
//! reflected bind-group layouts of its shader(s) (spec §4.4). Like every
//! other GPU wrapper it is held by [`crate::name::Name`] in the resource
//! cache; nothing stores an `Arc` of it directly.
//!
//! [`PipelineCache`] is the pool [`crate::graph::graph::RenderGraph::submit`]
//! builds against: a pipeline is compiled once per pass name and reused every
//! frame after, keyed by a [`slotmap::SlotMap`] so the cache can drop and
//! recreate a single entry (a pass's shader changed, a feature toggled) in
//! O(1) without disturbing every other pass's key.

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};

use crate::gpu::reflection::ShaderReflection;
use crate::name::Name;

/// Declarative configuration for a render pipeline. `vertex_layouts` and
/// `color_targets` are provided by the caller (mesh vertex layout / pass
/// output formats) rather than reflected, since WGSL reflection alone can't
/// recover vertex-buffer stride/attribute layout or target blend intent.
pub struct RenderPipelineDescriptor<'a> {
    pub name: Name,
    pub vertex_module: &'a wgpu::ShaderModule,
    pub vertex_entry: &'a str,
    pub fragment_module: Option<&'a wgpu::ShaderModule>,
    pub fragment_entry: &'a str,
    pub vertex_layouts: &'a [wgpu::VertexBufferLayout<'a>],
    pub color_targets: &'a [Option<wgpu::ColorTargetState>],
    pub depth_stencil: Option<wgpu::DepthStencilState>,
    pub topology: wgpu::PrimitiveTopology,
    pub cull_mode: Option<wgpu::Face>,
    pub bind_group_layouts: &'a [&'a wgpu::BindGroupLayout],
}

/// Declarative configuration for a compute pipeline.
pub struct ComputePipelineDescriptor<'a> {
    pub name: Name,
    pub module: &'a wgpu::ShaderModule,
    pub entry_point: &'a str,
    pub bind_group_layouts: &'a [&'a wgpu::BindGroupLayout],
}

/// Either kind of pipeline, cached by `Name`.
pub enum PipelineState {
    Render {
        name: Name,
        pipeline: wgpu::RenderPipeline,
        reflection: ShaderReflection,
    },
    Compute {
        name: Name,
        pipeline: wgpu::ComputePipeline,
        reflection: ShaderReflection,
    },
}

impl PipelineState {
    #[must_use]
    pub fn create_render(
        device: &wgpu::Device,
        desc: &RenderPipelineDescriptor<'_>,
        reflection: ShaderReflection,
    ) -> Self {
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("render-pipeline-layout"),
            bind_group_layouts: desc.bind_group_layouts,
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: None,
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: desc.vertex_module,
                entry_point: Some(desc.vertex_entry),
                buffers: desc.vertex_layouts,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: desc.fragment_module.map(|module| wgpu::FragmentState {
                module,
                entry_point: Some(desc.fragment_entry),
                targets: desc.color_targets,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: desc.topology,
                cull_mode: desc.cull_mode,
                ..Default::default()
            },
            depth_stencil: desc.depth_stencil.clone(),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self::Render {
            name: desc.name,
            pipeline,
            reflection,
        }
    }

    #[must_use]
    pub fn create_compute(
        device: &wgpu::Device,
        desc: &ComputePipelineDescriptor<'_>,
        reflection: ShaderReflection,
    ) -> Self {
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("compute-pipeline-layout"),
            bind_group_layouts: desc.bind_group_layouts,
            immediate_size: 0,
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: None,
            layout: Some(&layout),
            module: desc.module,
            entry_point: Some(desc.entry_point),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        });

        Self::Compute {
            name: desc.name,
            pipeline,
            reflection,
        }
    }

    #[must_use]
    pub const fn name(&self) -> Name {
        match self {
            Self::Render { name, .. } | Self::Compute { name, .. } => *name,
        }
    }

    #[must_use]
    pub const fn reflection(&self) -> &ShaderReflection {
        match self {
            Self::Render { reflection, .. } | Self::Compute { reflection, .. } => reflection,
        }
    }

    #[must_use]
    pub const fn as_render(&self) -> Option<&wgpu::RenderPipeline> {
        match self {
            Self::Render { pipeline, .. } => Some(pipeline),
            Self::Compute { .. } => None,
        }
    }

    #[must_use]
    pub const fn as_compute(&self) -> Option<&wgpu::ComputePipeline> {
        match self {
            Self::Compute { pipeline, .. } => Some(pipeline),
            Self::Render { .. } => None,
        }
    }
}

new_key_type! {
    /// Stable key into [`PipelineCache`], immune to the churn of removing and
    /// reinserting other pipelines.
    pub struct PipelineKey;
}

/// A cached pipeline plus the exact bind-group layouts it was built against.
///
/// wgpu treats `BindGroupLayout` identity, not structural equality, as the
/// binding-compatibility test: a `BindGroup` built against a layout with the
/// same entries but a different object won't validate against a pipeline
/// built from the original. So the layouts live as long as the pipeline does
/// and are reused, not rebuilt, on every frame that binds this pass.
pub struct PipelineEntry {
    pub state: PipelineState,
    pub global_layout: wgpu::BindGroupLayout,
    pub pass_layout: wgpu::BindGroupLayout,
}

/// Per-pass-name pool of compiled pipelines (spec §4.4: "cached once per pass
/// name; rebuilt only when invalidated").
#[derive(Default)]
pub struct PipelineCache {
    slots: SlotMap<PipelineKey, PipelineEntry>,
    by_name: FxHashMap<Name, PipelineKey>,
}

impl PipelineCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, name: Name) -> Option<&PipelineEntry> {
        self.by_name.get(&name).and_then(|key| self.slots.get(*key))
    }

    /// Inserts `entry` under `name`, dropping any prior entry for that name.
    pub fn insert(&mut self, name: Name, entry: PipelineEntry) {
        if let Some(key) = self.by_name.get(&name).copied() {
            self.slots.remove(key);
        }
        let key = self.slots.insert(entry);
        self.by_name.insert(name, key);
    }

    /// Drops the cached entry for `name`, forcing a rebuild on next use.
    pub fn invalidate(&mut self, name: Name) {
        if let Some(key) = self.by_name.remove(&name) {
            self.slots.remove(key);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
