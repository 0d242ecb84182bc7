//! The render graph (spec §4.8).
//!
//! Per-frame lifecycle: [`RenderGraph::begin`] → `create_image` /
//! `register_image` / `create_buffer` / `register_buffer` / `add_pass` →
//! [`RenderGraph::submit`] → [`RenderGraph::reset`]. `submit` runs
//! [`crate::graph::compile::cull`] and [`crate::graph::compile::order_passes`]
//! before materializing and executing the surviving passes in order.

use rustc_hash::FxHashMap;

use crate::cache::{Category, ResourceCache};
use crate::errors::{EngineError, Result};
use crate::gpu::bind_group::{BindGroup, BindGroupSlot, ResolvedBinding};
use crate::gpu::buffer::{Buffer, BufferConfig};
use crate::gpu::pipeline::{ComputePipelineDescriptor, PipelineCache, PipelineEntry, PipelineState, RenderPipelineDescriptor};
use crate::gpu::reflection::{BindingReflection, ResourceType, ShaderReflection};
use crate::gpu::shader::Shader;
use crate::gpu::texture::{LoadOp, StoreOp, Texture, TextureConfig};
use crate::graph::compile;
use crate::graph::handle::{ResourceHandle, ResourceKind};
use crate::graph::pass::{Pass, PassFlags, PassInput, ShaderSetup, ViewSelector};
use crate::graph::resource::ResourceMetadata;
use crate::name::Name;
use crate::queue::DeletionQueue;

/// A pass executor. `Graphics`/`Compute` run against the physical render or
/// compute pass [`RenderGraph::submit`] opens once it has synthesized the
/// pass's pipeline and bound its global(0)/pass(1) bind groups (spec §4.8).
/// `Raw` runs directly against the shared command encoder, without any of
/// that synthesis — the only form available to `GRAPH_LOCAL` passes, which
/// exist to set up state rather than to be bound and drawn into.
pub enum PassExecutor {
    Graphics(Box<dyn FnMut(&mut wgpu::RenderPass<'_>)>),
    Compute(Box<dyn FnMut(&mut wgpu::ComputePass<'_>)>),
    Raw(Box<dyn FnMut(&mut wgpu::CommandEncoder, &wgpu::Device, &wgpu::Queue)>),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum ResourceOrigin {
    /// Physical object already exists (persistent); `register_*` path.
    Registered,
    /// Physical object is materialized lazily on first use; `create_*` path.
    Created,
}

struct LogicalResource {
    handle: ResourceHandle,
    origin: ResourceOrigin,
    buffer_config: Option<BufferConfig>,
    texture_config: Option<TextureConfig>,
}

/// The per-frame declarative pass scheduler.
#[derive(Default)]
pub struct RenderGraph {
    passes: Vec<Pass>,
    executors: Vec<Option<PassExecutor>>,
    resources: FxHashMap<ResourceHandle, ResourceMetadata>,
    name_to_handle: FxHashMap<Name, ResourceHandle>,
    logical: FxHashMap<ResourceHandle, LogicalResource>,
    next_index: u32,
    custom_order: Option<Vec<Name>>,
    buffered_frame_count: usize,
    ordered_pass_indices: Vec<usize>,
    /// Names resolved into the group-0 (global) bind group, positionally
    /// matched against each shader's reflected `@group(0)` bindings.
    global_inputs: Vec<Name>,
    /// Compiled pipelines, one per pass name, persisted across `reset()`
    /// calls (spec §4.4: pipelines outlive the frame that first built them).
    pipeline_cache: PipelineCache,
    /// Lazily built fallback for reflected `sampler` bindings, since a
    /// `ResourceHandle` has no sampler kind of its own to resolve against.
    default_sampler: Option<wgpu::Sampler>,
}

impl RenderGraph {
    #[must_use]
    pub fn new(buffered_frame_count: usize) -> Self {
        Self {
            buffered_frame_count: buffered_frame_count.max(1),
            ..Self::default()
        }
    }

    pub fn set_custom_pass_order(&mut self, order: Vec<Name>) {
        self.custom_order = Some(order);
    }

    /// Sets the resource names resolved into every synthesized pass's
    /// group-0 bind group, in reflected-binding order (spec §4.5: the
    /// `Global` slot).
    pub fn set_global_inputs(&mut self, inputs: Vec<Name>) {
        self.global_inputs = inputs;
    }

    /// Mutable access to a recorded pass, for attaching `shader_setup` /
    /// `attachments` / `output_views` after `add_pass` returns its index.
    pub fn pass_mut(&mut self, pass_index: usize) -> &mut Pass {
        &mut self.passes[pass_index]
    }

    /// Starts a new frame's recording. Per-frame bookkeeping
    /// (passes/handles/resources) from the previous frame must already have
    /// been cleared by [`RenderGraph::reset`].
    pub fn begin(&mut self) {
        debug_assert!(self.passes.is_empty(), "begin() called without a preceding reset()");
    }

    fn new_handle(&mut self, kind: ResourceKind) -> ResourceHandle {
        let index = self.next_index;
        self.next_index += 1;
        ResourceHandle::new(index, kind, 0)
    }

    /// Allocates a new logical image resource, materialized lazily on first
    /// use (spec §4.8: "`create_*` allocates a new logical resource whose
    /// physical instance is materialized on first use").
    pub fn create_image(&mut self, name: &str, config: TextureConfig) -> ResourceHandle {
        let handle = self.new_handle(ResourceKind::Image);
        let logical_name = Name::new(name);
        self.name_to_handle.insert(logical_name, handle);
        self.resources.insert(handle, ResourceMetadata::new(logical_name, false));
        self.logical.insert(
            handle,
            LogicalResource {
                handle,
                origin: ResourceOrigin::Created,
                buffer_config: None,
                texture_config: Some(config),
            },
        );
        handle
    }

    /// Wraps an already-existing persistent image under a graph-local
    /// handle (spec §4.8: "`register_*` wraps an already-existing physical
    /// resource (persistent)").
    pub fn register_image(&mut self, name: &str) -> ResourceHandle {
        let handle = self.new_handle(ResourceKind::Image);
        let logical_name = Name::new(name);
        self.name_to_handle.insert(logical_name, handle);
        self.resources.insert(handle, ResourceMetadata::new(logical_name, true));
        self.logical.insert(
            handle,
            LogicalResource {
                handle,
                origin: ResourceOrigin::Registered,
                buffer_config: None,
                texture_config: None,
            },
        );
        handle
    }

    pub fn create_buffer(&mut self, name: &str, config: BufferConfig) -> ResourceHandle {
        let handle = self.new_handle(ResourceKind::Buffer);
        let logical_name = Name::new(name);
        self.name_to_handle.insert(logical_name, handle);
        self.resources.insert(handle, ResourceMetadata::new(logical_name, false));
        self.logical.insert(
            handle,
            LogicalResource {
                handle,
                origin: ResourceOrigin::Created,
                buffer_config: Some(config),
                texture_config: None,
            },
        );
        handle
    }

    pub fn register_buffer(&mut self, name: &str) -> ResourceHandle {
        let handle = self.new_handle(ResourceKind::Buffer);
        let logical_name = Name::new(name);
        self.name_to_handle.insert(logical_name, handle);
        self.resources.insert(handle, ResourceMetadata::new(logical_name, true));
        self.logical.insert(
            handle,
            LogicalResource {
                handle,
                origin: ResourceOrigin::Registered,
                buffer_config: None,
                texture_config: None,
            },
        );
        handle
    }

    /// Resolves `name` to a handle, auto-registering an opaque persistent
    /// buffer-kind placeholder if the name hasn't been created/registered
    /// yet this frame ([`crate::tasks::compute::ComputeTaskQueue::compile_rg_passes`]
    /// relies on this to "auto-promote" raw resource names into handles).
    fn resolve_or_register(&mut self, name: Name) -> ResourceHandle {
        if let Some(handle) = self.name_to_handle.get(&name) {
            return *handle;
        }
        let handle = self.new_handle(ResourceKind::Buffer);
        self.name_to_handle.insert(name, handle);
        self.resources.insert(handle, ResourceMetadata::new(name, true));
        handle
    }

    /// Records a pass and updates reference counts (spec §4.8: "each output
    /// increments pass refcount; each input with existing metadata
    /// increments that resource's refcount and records producer/consumer
    /// links"). Present passes (`flags` containing [`PassFlags::PRESENT`])
    /// are force-kept regardless of refcount.
    pub fn add_pass(&mut self, name: Name, flags: PassFlags, inputs: &[Name], outputs: &[Name]) -> usize {
        self.add_pass_with_executor(name, flags, inputs, outputs, None)
    }

    pub fn add_pass_with_executor(
        &mut self,
        name: Name,
        flags: PassFlags,
        inputs: &[Name],
        outputs: &[Name],
        executor: Option<PassExecutor>,
    ) -> usize {
        let output_handles: Vec<ResourceHandle> = outputs.iter().map(|n| self.resolve_or_register(*n)).collect();
        let input_handles: Vec<ResourceHandle> = inputs.iter().map(|n| self.resolve_or_register(*n)).collect();

        let pass_index = self.passes.len();

        for handle in &output_handles {
            if let Some(meta) = self.resources.get_mut(handle) {
                meta.add_producer(pass_index);
            }
        }
        let pass_inputs: Vec<PassInput> = input_handles
            .iter()
            .enumerate()
            .map(|(binding, handle)| {
                if let Some(meta) = self.resources.get_mut(handle) {
                    meta.add_consumer(pass_index);
                }
                PassInput::Bound {
                    handle: *handle,
                    binding: binding as u32,
                }
            })
            .collect();

        self.passes.push(Pass::new(name, flags, pass_inputs, output_handles));
        self.executors.push(executor);
        pass_index
    }

    /// Runs the device-free half of compilation (cull, then custom-order
    /// sort) and caches the result, returning the surviving pass indices in
    /// execution order. Split out from [`RenderGraph::submit`] so the
    /// `rdg_inspector` feature (and tests) can inspect the compiled pass
    /// list without a `wgpu::Device` in hand.
    pub fn compile(&mut self) -> &[usize] {
        compile::cull(&mut self.passes, &mut self.resources);
        self.ordered_pass_indices = compile::order_passes(&self.passes, self.custom_order.as_deref());
        &self.ordered_pass_indices
    }

    /// `true` if pass index `pass_index` survived the most recent
    /// [`RenderGraph::compile`] call.
    #[must_use]
    pub fn is_culled(&self, pass_index: usize) -> bool {
        self.passes[pass_index].culled
    }

    #[must_use]
    pub fn pass_name(&self, pass_index: usize) -> Name {
        self.passes[pass_index].name
    }

    /// In-crate test hook: a recorded pass's flags, without pulling in the
    /// `rdg_inspector` feature's public snapshot surface.
    #[cfg(test)]
    pub(crate) fn pass_flags(&self, pass_index: usize) -> PassFlags {
        self.passes[pass_index].flags
    }

    /// In-crate test hook: the recorded attachment names for a pass.
    #[cfg(test)]
    pub(crate) fn pass_attachments(&self, pass_index: usize) -> &[Name] {
        &self.passes[pass_index].attachments
    }

    /// Compiles (cull + order) and executes the frame's passes, returning
    /// the number of passes that survived culling. For every non-local pass
    /// that carries a `shader_setup`, this synthesizes the pass bind group
    /// from its shader's reflection, creates (or reuses) its pipeline state,
    /// opens the physical render/compute pass scoped to its attachments, and
    /// binds the global(0)/pass(1) groups before handing control to the
    /// pass's own executor (spec §4.8).
    pub fn submit(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, cache: &mut ResourceCache<PhysicalObject>) -> Result<usize> {
        self.compile();

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render-graph-submit"),
        });

        let ordered = self.ordered_pass_indices.clone();
        for pass_index in ordered {
            if let Err(err) = self.materialize_pass_resources(pass_index, device, cache) {
                log::error!("render graph: pass '{}' aborted: {err}", self.passes[pass_index].name.raw());
                return Err(err);
            }

            let is_graph_local = self.passes[pass_index].flags.contains(PassFlags::GRAPH_LOCAL);
            let has_shader_setup = !self.passes[pass_index].shader_setup.is_empty();

            if !is_graph_local && has_shader_setup {
                if let Err(err) = self.synthesize_and_dispatch(pass_index, device, &mut encoder, cache) {
                    log::error!("render graph: pass '{}' aborted: {err}", self.passes[pass_index].name.raw());
                    return Err(err);
                }
                continue;
            }

            match self.executors[pass_index].as_mut() {
                Some(PassExecutor::Raw(run)) => run(&mut encoder, device, queue),
                Some(PassExecutor::Graphics(_) | PassExecutor::Compute(_)) => {
                    let err = EngineError::NullPassExecutor(self.passes[pass_index].name.raw().to_string());
                    log::error!(
                        "render graph: pass '{}' registered a Graphics/Compute executor but has no shader_setup to synthesize against: {err}",
                        self.passes[pass_index].name.raw()
                    );
                    return Err(err);
                }
                None if self.passes[pass_index].skip_pass_pipeline_setup => {
                    let err = EngineError::NullPassExecutor(self.passes[pass_index].name.raw().to_string());
                    log::error!("render graph: {err}");
                    return Err(err);
                }
                None => {}
            }
        }

        log::debug!("render graph: submitted {} of {} recorded passes", self.ordered_pass_indices.len(), self.passes.len());
        queue.submit(Some(encoder.finish()));
        Ok(self.ordered_pass_indices.len())
    }

    /// Builds (or reuses) the pass's pipeline, synthesizes its global(0) and
    /// pass(1) bind groups, opens the physical pass, and runs its executor.
    fn synthesize_and_dispatch(
        &mut self,
        pass_index: usize,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        cache: &mut ResourceCache<PhysicalObject>,
    ) -> Result<()> {
        let pass_name = self.passes[pass_index].name;
        let is_compute = self.passes[pass_index].flags.contains(PassFlags::COMPUTE);

        if self.pipeline_cache.get(pass_name).is_none() {
            let entry = self.build_pipeline_entry(pass_index, device, cache)?;
            self.pipeline_cache.insert(pass_name, entry);
        }
        let pipeline_entry = self.pipeline_cache.get(pass_name).expect("just inserted above");

        if self.default_sampler.is_none() {
            self.default_sampler = Some(device.create_sampler(&wgpu::SamplerDescriptor::default()));
        }
        let default_sampler = self.default_sampler.as_ref().expect("just set above");

        let reflection = pipeline_entry.state.reflection();
        let global_candidates: Vec<Option<ResourceHandle>> =
            self.global_inputs.iter().map(|name| self.name_to_handle.get(name).copied()).collect();
        let pass_candidates: Vec<Option<ResourceHandle>> = self.passes[pass_index]
            .inputs
            .iter()
            .map(PassInput::handle)
            .chain(self.passes[pass_index].outputs.iter().copied())
            .map(Some)
            .collect();

        let global_entries = resolve_group_entries(
            &self.resources,
            reflection.bindings_in_group(BindGroupSlot::Global.index()),
            &global_candidates,
            pass_name,
            "global",
            &self.passes[pass_index].output_views,
            cache,
            default_sampler,
        )?;
        let pass_entries = resolve_group_entries(
            &self.resources,
            reflection.bindings_in_group(BindGroupSlot::Pass.index()),
            &pass_candidates,
            pass_name,
            "pass",
            &self.passes[pass_index].output_views,
            cache,
            default_sampler,
        )?;

        let global_group = BindGroup::create(device, pass_name, BindGroupSlot::Global, &pipeline_entry.global_layout, &global_entries);
        let pass_group = BindGroup::create(device, pass_name, BindGroupSlot::Pass, &pipeline_entry.pass_layout, &pass_entries);

        if is_compute {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("render-graph-compute-pass"),
                timestamp_writes: None,
            });
            let pipeline = pipeline_entry.state.as_compute().expect("compute pass built a compute pipeline");
            compute_pass.set_pipeline(pipeline);
            compute_pass.set_bind_group(BindGroupSlot::Global.index(), &global_group.group, &[]);
            compute_pass.set_bind_group(BindGroupSlot::Pass.index(), &pass_group.group, &[]);
            match self.executors[pass_index].as_mut() {
                Some(PassExecutor::Compute(run)) => run(&mut compute_pass),
                _ => {}
            }
        } else {
            let color_attachments = self.color_attachments(pass_index, cache);
            let depth_stencil_attachment = self.depth_stencil_attachment(pass_index, cache);
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("render-graph-render-pass"),
                color_attachments: &color_attachments,
                depth_stencil_attachment,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            let pipeline = pipeline_entry.state.as_render().expect("graphics pass built a render pipeline");
            render_pass.set_pipeline(pipeline);
            render_pass.set_bind_group(BindGroupSlot::Global.index(), &global_group.group, &[]);
            render_pass.set_bind_group(BindGroupSlot::Pass.index(), &pass_group.group, &[]);
            match self.executors[pass_index].as_mut() {
                Some(PassExecutor::Graphics(run)) => run(&mut render_pass),
                _ => {}
            }
        }

        Ok(())
    }

    fn build_pipeline_entry(&self, pass_index: usize, device: &wgpu::Device, cache: &ResourceCache<PhysicalObject>) -> Result<PipelineEntry> {
        let pass = &self.passes[pass_index];
        let pass_name = pass.name;

        if pass.flags.contains(PassFlags::COMPUTE) {
            let shader_name = pass.shader_setup.compute.ok_or_else(|| EngineError::MissingShaderModule(pass_name.raw().to_string()))?;
            let shader = fetch_shader(cache, shader_name)?;
            let module = shader.module.as_ref().ok_or_else(|| EngineError::MissingShaderModule(shader_name.raw().to_string()))?;

            let global_layout = crate::gpu::bind_group::layout_from_reflection(
                device,
                BindGroupSlot::Global,
                shader.reflection.bindings_in_group(BindGroupSlot::Global.index()),
            );
            let pass_layout = crate::gpu::bind_group::layout_from_reflection(
                device,
                BindGroupSlot::Pass,
                shader.reflection.bindings_in_group(BindGroupSlot::Pass.index()),
            );

            let state = PipelineState::create_compute(
                device,
                &ComputePipelineDescriptor {
                    name: pass_name,
                    module,
                    entry_point: "cs_main",
                    bind_group_layouts: &[&global_layout, &pass_layout],
                },
                shader.reflection.clone(),
            );

            return Ok(PipelineEntry {
                state,
                global_layout,
                pass_layout,
            });
        }

        let vertex_name = pass
            .shader_setup
            .vertex
            .or(pass.shader_setup.fragment)
            .ok_or_else(|| EngineError::MissingShaderModule(pass_name.raw().to_string()))?;
        let vertex_shader = fetch_shader(cache, vertex_name)?;
        let vertex_module = vertex_shader.module.as_ref().ok_or_else(|| EngineError::MissingShaderModule(vertex_name.raw().to_string()))?;

        let fragment_name = pass.shader_setup.fragment.unwrap_or(vertex_name);
        let fragment_shader = fetch_shader(cache, fragment_name)?;
        let fragment_module = fragment_shader
            .module
            .as_ref()
            .ok_or_else(|| EngineError::MissingShaderModule(fragment_name.raw().to_string()))?;

        let reflection = merge_reflections(&vertex_shader.reflection, Some(&fragment_shader.reflection));

        let global_layout =
            crate::gpu::bind_group::layout_from_reflection(device, BindGroupSlot::Global, reflection.bindings_in_group(BindGroupSlot::Global.index()));
        let pass_layout =
            crate::gpu::bind_group::layout_from_reflection(device, BindGroupSlot::Pass, reflection.bindings_in_group(BindGroupSlot::Pass.index()));

        let color_targets = self.color_targets(pass_index, cache);
        let depth_stencil = self.depth_stencil_state(pass_index, cache);

        let state = PipelineState::create_render(
            device,
            &RenderPipelineDescriptor {
                name: pass_name,
                vertex_module,
                vertex_entry: "vs_main",
                fragment_module: Some(fragment_module),
                fragment_entry: "fs_main",
                vertex_layouts: &[],
                color_targets: &color_targets,
                depth_stencil,
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                bind_group_layouts: &[&global_layout, &pass_layout],
            },
            reflection,
        );

        Ok(PipelineEntry {
            state,
            global_layout,
            pass_layout,
        })
    }

    fn color_targets(&self, pass_index: usize, cache: &ResourceCache<PhysicalObject>) -> Vec<Option<wgpu::ColorTargetState>> {
        self.passes[pass_index]
            .attachments
            .iter()
            .map(|name| match cache.fetch(Category::Image, *name) {
                Some(PhysicalObject::Texture(texture)) => Some(wgpu::ColorTargetState {
                    format: texture.config.format,
                    blend: texture.config.blend,
                    write_mask: wgpu::ColorWrites::ALL,
                }),
                _ => None,
            })
            .collect()
    }

    fn depth_stencil_state(&self, pass_index: usize, cache: &ResourceCache<PhysicalObject>) -> Option<wgpu::DepthStencilState> {
        let name = self.passes[pass_index].depth_stencil_attachment?;
        let Some(PhysicalObject::Texture(texture)) = cache.fetch(Category::Image, name) else {
            return None;
        };
        Some(wgpu::DepthStencilState {
            format: texture.config.format,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        })
    }

    fn color_attachments<'a>(
        &self,
        pass_index: usize,
        cache: &'a ResourceCache<PhysicalObject>,
    ) -> Vec<Option<wgpu::RenderPassColorAttachment<'a>>> {
        self.passes[pass_index]
            .attachments
            .iter()
            .map(|name| {
                let Some(PhysicalObject::Texture(texture)) = cache.fetch(Category::Image, *name) else {
                    return None;
                };
                let (mip, layer) = self.passes[pass_index]
                    .output_views
                    .iter()
                    .find(|(n, _)| n == name)
                    .map_or((None, None), |(_, v)| (v.mip, v.layer));
                let view = texture.view_for(mip, layer);
                let load = match texture.config.load_op {
                    LoadOp::Clear => wgpu::LoadOp::Clear(texture.config.clear_value),
                    LoadOp::Load => wgpu::LoadOp::Load,
                };
                let store = match texture.config.store_op {
                    StoreOp::Store => wgpu::StoreOp::Store,
                    StoreOp::Discard => wgpu::StoreOp::Discard,
                };
                Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations { load, store },
                    depth_slice: None,
                })
            })
            .collect()
    }

    fn depth_stencil_attachment<'a>(
        &self,
        pass_index: usize,
        cache: &'a ResourceCache<PhysicalObject>,
    ) -> Option<wgpu::RenderPassDepthStencilAttachment<'a>> {
        let name = self.passes[pass_index].depth_stencil_attachment?;
        let Some(PhysicalObject::Texture(texture)) = cache.fetch(Category::Image, name) else {
            return None;
        };
        Some(wgpu::RenderPassDepthStencilAttachment {
            view: &texture.default_view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        })
    }

    fn materialize_pass_resources(
        &mut self,
        pass_index: usize,
        device: &wgpu::Device,
        cache: &mut ResourceCache<PhysicalObject>,
    ) -> Result<()> {
        let handles: Vec<ResourceHandle> = self.passes[pass_index]
            .inputs
            .iter()
            .map(PassInput::handle)
            .chain(self.passes[pass_index].outputs.iter().copied())
            .collect();

        for handle in handles {
            let Some(meta) = self.resources.get(&handle) else {
                continue;
            };
            if cache.contains(Category::Image, meta.name) || cache.contains(Category::Buffer, meta.name) {
                continue;
            }
            let Some(logical) = self.logical.get(&handle) else {
                continue;
            };
            match logical.origin {
                ResourceOrigin::Registered => {
                    // Already exists externally; absence here is the
                    // host's bug, not ours, and is fatal per spec §4.8.
                    if !cache.contains(Category::Image, meta.name) && !cache.contains(Category::Buffer, meta.name) {
                        return Err(EngineError::MissingPhysicalResource(handle));
                    }
                }
                ResourceOrigin::Created => {
                    if let Some(config) = &logical.buffer_config {
                        let buffer = Buffer::create(device, config, self.buffered_frame_count);
                        cache.store(Category::Buffer, meta.name, PhysicalObject::Buffer(buffer));
                    } else if let Some(config) = &logical.texture_config {
                        let texture = Texture::create(device, config.clone());
                        cache.store(Category::Image, meta.name, PhysicalObject::Texture(texture));
                    }
                }
            }
        }
        Ok(())
    }

    /// Ends the frame: schedules every transient resource materialized this
    /// frame for destruction `max_frame_lifetime` frames hence (spec §4.8,
    /// §8: "destruction happens at exactly `last_user_frame +
    /// max_frame_lifetime`"), then drops per-frame pass/resource bookkeeping,
    /// ready for the next `begin()`. Persistent (`register_*`) resources and
    /// the pipeline cache are untouched — they outlive the frame that
    /// created them.
    pub fn reset(&mut self, deletion_queue: &mut DeletionQueue<Box<dyn FnOnce(&mut ResourceCache<PhysicalObject>)>>) {
        for (handle, meta) in &self.resources {
            if meta.is_persistent {
                continue;
            }
            let name = meta.name;
            let category = match handle.kind() {
                ResourceKind::Buffer => Category::Buffer,
                ResourceKind::Image => Category::Image,
            };
            deletion_queue.schedule(
                meta.max_frame_lifetime,
                Box::new(move |cache: &mut ResourceCache<PhysicalObject>| {
                    cache.remove(category, name);
                }),
            );
        }

        self.passes.clear();
        self.executors.clear();
        self.resources.clear();
        self.name_to_handle.clear();
        self.logical.clear();
        self.next_index = 0;
        self.ordered_pass_indices.clear();
    }

    #[must_use]
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    #[must_use]
    pub fn surviving_pass_count(&self) -> usize {
        self.ordered_pass_indices.len()
    }

    /// Pass data for [`crate::graph::inspect`]. Exposed only under the
    /// `rdg_inspector` feature so the inspector's shape doesn't leak into
    /// the default public surface.
    #[cfg(feature = "rdg_inspector")]
    #[must_use]
    pub fn inspect_passes(&self) -> Vec<crate::graph::inspect::PassSnapshot> {
        self.passes
            .iter()
            .map(|p| crate::graph::inspect::PassSnapshot {
                name: p.name,
                flags: p.flags,
                culled: p.culled,
            })
            .collect()
    }

    #[cfg(feature = "rdg_inspector")]
    #[must_use]
    pub fn inspect_resources(&self) -> Vec<crate::graph::inspect::ResourceSnapshot> {
        self.resources
            .values()
            .map(|m| crate::graph::inspect::ResourceSnapshot {
                name: m.name,
                reference_count: m.reference_count,
                first_user: m.first_user,
                last_user: m.last_user,
                is_persistent: m.is_persistent,
            })
            .collect()
    }
}

/// The type-erased physical object a graph-materialized handle resolves to.
/// Shaders are stored under `Category::Shader` by the host before `submit()`
/// runs; the graph itself never compiles one (it has no search roots or
/// `#define` context of its own).
pub enum PhysicalObject {
    Buffer(Buffer),
    Texture(Texture),
    Shader(Shader),
}

fn fetch_shader(cache: &ResourceCache<PhysicalObject>, name: Name) -> Result<&Shader> {
    match cache.fetch(Category::Shader, name) {
        Some(PhysicalObject::Shader(shader)) => Ok(shader),
        _ => Err(EngineError::MissingShaderModule(name.raw().to_string())),
    }
}

/// Unions two shaders' reflected bindings, group by group, preferring the
/// first shader's entry when both declare the same `binding` number (spec
/// §4.8: a graphics pass's vertex and fragment stage share one pass bind
/// group synthesized from the union of what each stage reflects).
fn merge_reflections(a: &ShaderReflection, b: Option<&ShaderReflection>) -> ShaderReflection {
    let mut merged = a.clone();
    let Some(b) = b else {
        return merged;
    };
    for (group, bindings) in &b.groups {
        let entry = merged.groups.entry(*group).or_default();
        for binding in bindings {
            if !entry.iter().any(|e| e.binding == binding.binding) {
                entry.push(binding.clone());
            }
        }
    }
    merged
}

fn resolve_binding<'a>(
    resources: &FxHashMap<ResourceHandle, ResourceMetadata>,
    cache: &'a ResourceCache<PhysicalObject>,
    handle: ResourceHandle,
    view: Option<(Option<u32>, Option<u32>)>,
) -> Option<ResolvedBinding<'a>> {
    let meta = resources.get(&handle)?;
    match handle.kind() {
        ResourceKind::Buffer => match cache.fetch(Category::Buffer, meta.name)? {
            PhysicalObject::Buffer(buffer) => Some(ResolvedBinding::Buffer {
                buffer: &buffer.buffer,
                offset: 0,
                size: buffer.size,
            }),
            _ => None,
        },
        ResourceKind::Image => match cache.fetch(Category::Image, meta.name)? {
            PhysicalObject::Texture(texture) => {
                let (mip, layer) = view.unwrap_or((None, None));
                Some(ResolvedBinding::TextureView(texture.view_for(mip, layer)))
            }
            _ => None,
        },
    }
}

/// Resolves a reflected group's bindings against a pass's candidate handles,
/// positionally matching each [`BindingReflection::binding`] index into
/// `candidates` (spec §4.8: "synthesize the pass bind group from
/// fragment/vertex/compute reflection"). Reflected `sampler` bindings have no
/// handle of their own and always resolve to `default_sampler`.
#[allow(clippy::too_many_arguments)]
fn resolve_group_entries<'a>(
    resources: &FxHashMap<ResourceHandle, ResourceMetadata>,
    bindings: &[BindingReflection],
    candidates: &[Option<ResourceHandle>],
    pass_name: Name,
    group_label: &'static str,
    output_views: &[(Name, ViewSelector)],
    cache: &'a ResourceCache<PhysicalObject>,
    default_sampler: &'a wgpu::Sampler,
) -> Result<Vec<(u32, ResolvedBinding<'a>)>> {
    let mut entries = Vec::with_capacity(bindings.len());
    for binding in bindings {
        if binding.kind == ResourceType::Sampler {
            entries.push((binding.binding, ResolvedBinding::Sampler(default_sampler)));
            continue;
        }
        let missing = || EngineError::MissingPassInput {
            pass: pass_name.raw().to_string(),
            group: group_label,
            binding: binding.binding,
        };
        let handle = candidates.get(binding.binding as usize).copied().flatten().ok_or_else(missing)?;
        let view = resources
            .get(&handle)
            .and_then(|meta| output_views.iter().find(|(n, _)| *n == meta.name).map(|(_, v)| (v.mip, v.layer)));
        let resolved = resolve_binding(resources, cache, handle, view).ok_or_else(missing)?;
        entries.push((binding.binding, resolved));
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_frame_submits_zero_passes() {
        let mut graph = RenderGraph::new(2);
        graph.begin();
        compile::cull(&mut graph.passes, &mut graph.resources);
        let ordered = compile::order_passes(&graph.passes, None);
        assert!(ordered.is_empty());
    }

    #[test]
    fn present_pass_with_no_consumers_still_survives_cull() {
        let mut graph = RenderGraph::new(2);
        graph.begin();
        graph.create_image("swapchain", TextureConfig::render_target_2d("swapchain", 1, 1, wgpu::TextureFormat::Rgba8Unorm));
        graph.add_pass(Name::new("present"), PassFlags::GRAPHICS | PassFlags::PRESENT, &[], &[Name::new("swapchain")]);

        compile::cull(&mut graph.passes, &mut graph.resources);
        assert!(!graph.passes[0].culled);
    }

    #[test]
    fn pass_with_no_downstream_consumer_is_culled() {
        let mut graph = RenderGraph::new(2);
        graph.begin();
        graph.create_image("scratch", TextureConfig::render_target_2d("scratch", 1, 1, wgpu::TextureFormat::Rgba8Unorm));
        graph.add_pass(Name::new("produce_scratch"), PassFlags::GRAPHICS, &[], &[Name::new("scratch")]);

        compile::cull(&mut graph.passes, &mut graph.resources);
        assert!(graph.passes[0].culled);
    }

    #[test]
    fn custom_pass_order_is_honored_after_cull() {
        let mut graph = RenderGraph::new(2);
        graph.begin();
        graph.create_image("a", TextureConfig::render_target_2d("a", 1, 1, wgpu::TextureFormat::Rgba8Unorm));
        graph.create_image("b", TextureConfig::render_target_2d("b", 1, 1, wgpu::TextureFormat::Rgba8Unorm));
        graph.add_pass(Name::new("pass_a"), PassFlags::GRAPHICS | PassFlags::PRESENT, &[], &[Name::new("a")]);
        graph.add_pass(Name::new("pass_b"), PassFlags::GRAPHICS | PassFlags::PRESENT, &[], &[Name::new("b")]);
        graph.set_custom_pass_order(vec![Name::new("pass_b"), Name::new("pass_a")]);

        compile::cull(&mut graph.passes, &mut graph.resources);
        let ordered = compile::order_passes(&graph.passes, graph.custom_order.as_deref());
        assert_eq!(ordered, vec![1, 0]);
    }
}
