//! Deferred shading strategy: the full per-frame pass sequence that wires
//! everything else in this module together onto a render graph.

pub mod bloom;
pub mod cull;
pub mod ddgi;
pub mod gbuffer;
pub mod hzb;
pub mod lights;
pub mod line_renderer;
pub mod postprocess;
pub mod present;
pub mod vsm;

use crate::graph::graph::RenderGraph;
use crate::graph::pass::PassFlags;
use crate::name::Name;
use crate::tasks::{ComputeRasterTaskQueue, ComputeTaskQueue, MeshTaskQueue};

use ddgi::DdgiVolume;
use postprocess::{PostProcessChain, PostProcessPass};
use present::DebugView;
use vsm::VsmState;

/// Per-scene feature toggles read once at the start of a frame.
#[derive(Clone, Copy, Debug)]
pub struct ShadingConfig {
    pub depth_prepass: bool,
    pub gi_enabled: bool,
    pub shadows_enabled: bool,
    pub line_renderer_enabled: bool,
    pub compute_raster_enabled: bool,
    pub debug_view: DebugView,
}

impl Default for ShadingConfig {
    fn default() -> Self {
        Self {
            depth_prepass: true,
            gi_enabled: true,
            shadows_enabled: true,
            line_renderer_enabled: false,
            compute_raster_enabled: false,
            debug_view: DebugView::None,
        }
    }
}

/// Owns the cross-frame state the strategy needs beyond what's rebuilt
/// every frame from the scene: the DDGI probe cursor, AS-VSM's per-light
/// LRU rings, and the post-process ping-pong side.
pub struct DeferredShadingStrategy {
    config: ShadingConfig,
    ddgi: Option<DdgiVolume>,
    vsm: Option<VsmState>,
    post_process: PostProcessChain,
    post_process_passes: Vec<PostProcessPass>,
    mid_frame: bool,
}

impl DeferredShadingStrategy {
    #[must_use]
    pub fn new(config: ShadingConfig) -> Self {
        Self {
            config,
            ddgi: None,
            vsm: None,
            post_process: PostProcessChain::new(Name::new("post_process_ping"), Name::new("post_process_pong")),
            post_process_passes: Vec::new(),
            mid_frame: false,
        }
    }

    pub fn set_ddgi_volume(&mut self, volume: DdgiVolume) {
        self.ddgi = Some(volume);
    }

    pub fn set_vsm_state(&mut self, state: VsmState) {
        self.vsm = Some(state);
    }

    pub fn set_post_process_passes(&mut self, passes: Vec<PostProcessPass>) {
        self.post_process_passes = passes;
    }

    /// Records the full deferred-shading sequence for one frame: clear the
    /// G-Buffer, compact active lights, skybox, two-phase cull, rasterize
    /// (compute or graphics), shade, shadow and GI updates, post-process,
    /// and present. Every step after the initial clear consumes resources
    /// the previous step produced, so the graph's own refcount-driven cull
    /// removes whichever steps this frame's config disables.
    pub fn compile_frame(
        &mut self,
        graph: &mut RenderGraph,
        width: u32,
        height: u32,
        force_recreate: bool,
        mesh_tasks: &MeshTaskQueue,
        compute_tasks: &ComputeTaskQueue,
        compute_raster_tasks: &ComputeRasterTaskQueue,
        active_shadow_requests: u32,
    ) {
        if force_recreate {
            log::info!("deferred shading: resolution change, recreating persistent targets at {width}x{height}");
        }

        let depth = Name::new("g_buffer_depth");
        let lit_scene_color = Name::new("lit_scene_color");
        let dense_all_lights = Name::new("dense_all_lights");
        let dense_shadow_casters = Name::new("dense_shadow_casting_lights");
        let hzb = Name::new("hzb_pyramid");
        let instance_counts = Name::new("instance_counts");
        let visible_instances = Name::new("visible_instances");

        for config in gbuffer::target_configs(width, height, force_recreate) {
            graph.create_image(config.name, config);
        }
        graph.create_buffer(
            "dense_all_lights",
            crate::gpu::buffer::BufferConfig::new("dense_all_lights", 1, wgpu::BufferUsages::STORAGE),
        );
        graph.create_buffer(
            "dense_shadow_casting_lights",
            crate::gpu::buffer::BufferConfig::new("dense_shadow_casting_lights", 1, wgpu::BufferUsages::STORAGE),
        );

        graph.add_pass(Name::new("clear_g_buffer"), PassFlags::GRAPH_LOCAL | PassFlags::GRAPHICS, &[], &gbuffer::target_names());
        graph.add_pass(Name::new("compact_active_lights"), PassFlags::COMPUTE, &[], &[dense_all_lights, dense_shadow_casters]);
        graph.add_pass(Name::new("skybox"), PassFlags::GRAPHICS, &[], &[Name::new("g_buffer_albedo")]);

        self.mid_frame = true;

        graph.add_pass(Name::new("clear_visibility"), PassFlags::COMPUTE, &[], &[visible_instances]);
        graph.add_pass(Name::new("frustum_cull"), PassFlags::COMPUTE, &[], &[visible_instances]);

        if self.config.depth_prepass {
            graph.add_pass(Name::new("depth_prepass"), PassFlags::GRAPHICS, &[visible_instances], &[depth]);
            graph.add_pass(Name::new("hzb_reduce"), PassFlags::COMPUTE, &[depth], &[hzb]);
            graph.add_pass(Name::new("reset_instance_counts"), PassFlags::COMPUTE, &[], &[instance_counts]);
            graph.add_pass(Name::new("occlusion_cull"), PassFlags::COMPUTE, &[hzb, visible_instances], &[instance_counts, visible_instances]);
        }

        if self.config.compute_raster_enabled {
            compute_raster_tasks.clear();
            graph.add_pass(Name::new("compute_rasterization"), PassFlags::COMPUTE, &[visible_instances], &[Name::new("g_buffer_albedo")]);
        }
        compute_tasks.compile_rg_passes(graph);
        let _ = mesh_tasks.batches();

        graph.add_pass(
            Name::new("g_buffer_base"),
            PassFlags::GRAPHICS,
            &[visible_instances],
            &gbuffer::target_names(),
        );
        graph.add_pass(
            Name::new("transparency_composite"),
            PassFlags::GRAPHICS,
            &[Name::new("g_buffer_transparency_accum"), Name::new("g_buffer_transparency_reveal")],
            &[Name::new("g_buffer_albedo")],
        );

        if self.config.line_renderer_enabled {
            graph.add_pass(Name::new("line_renderer"), PassFlags::GRAPHICS, &[], &[Name::new("g_buffer_albedo")]);
        }

        if self.config.shadows_enabled {
            if let Some(vsm) = &self.vsm {
                vsm.compile_passes(graph, active_shadow_requests);
            }
        }

        if self.config.gi_enabled {
            if let Some(ddgi) = &mut self.ddgi {
                ddgi.compile_passes(graph);
            }
        }

        let deferred_lighting_pass = graph.add_pass(
            Name::new("deferred_lighting"),
            PassFlags::GRAPHICS,
            &gbuffer::target_names(),
            &[lit_scene_color],
        );
        graph.pass_mut(deferred_lighting_pass).attachments = vec![lit_scene_color];

        let bloom_result = self.compile_bloom_chain(graph, lit_scene_color, width, height);

        let mut post_process_result = bloom_result;
        for pass in &self.post_process_passes {
            let (input, output) = self.post_process.step(post_process_result);
            let pass_index = graph.add_pass(pass.name, PassFlags::GRAPHICS, &[input], &[output]);
            graph.pass_mut(pass_index).attachments = vec![output];
            post_process_result = output;
        }

        let present_source = present::present_source(self.config.debug_view, post_process_result);
        graph.add_pass(Name::new("fullscreen_present"), PassFlags::GRAPHICS | PassFlags::PRESENT, &[present_source], &[]);

        self.mid_frame = false;
        graph.add_pass(Name::new("clear_dirty_flags"), PassFlags::GRAPH_LOCAL | PassFlags::COMPUTE, &[], &[]);
    }

    #[must_use]
    pub const fn is_mid_frame(&self) -> bool {
        self.mid_frame
    }

    /// Records bloom as the spec's 4 downsample + 3 upsample compute passes
    /// plus a fullscreen graphics resolve (spec §4.9 step 18), instead of
    /// one opaque pass. Each iteration's `(src_w, src_h, dst_w, dst_h,
    /// step_index)` uniform comes from [`bloom::downsample_chain`] /
    /// [`bloom::upsample_chain`]; the pass names carry the step index so
    /// the executor attached later can look its own params back up.
    fn compile_bloom_chain(&self, graph: &mut RenderGraph, lit_scene_color: Name, width: u32, height: u32) -> Name {
        let downsample = bloom::downsample_chain(width, height);
        let upsample = bloom::upsample_chain(&downsample);

        let mut input = lit_scene_color;
        for step in &downsample {
            let output = Name::new(&format!("bloom_downsample_{}", step.step_index));
            graph.add_pass(Name::new(&format!("bloom_downsample_pass_{}", step.step_index)), PassFlags::COMPUTE, &[input], &[output]);
            input = output;
        }
        let coarsest = input;

        let mut input = coarsest;
        for step in &upsample {
            let output = Name::new(&format!("bloom_upsample_{}", step.step_index));
            graph.add_pass(Name::new(&format!("bloom_upsample_pass_{}", step.step_index)), PassFlags::COMPUTE, &[input], &[output]);
            input = output;
        }

        let bloom_result = Name::new("bloom_result");
        let resolve_pass = graph.add_pass(Name::new("bloom_resolve"), PassFlags::GRAPHICS, &[lit_scene_color, input], &[bloom_result]);
        graph.pass_mut(resolve_pass).attachments = vec![bloom_result];
        bloom_result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::{ComputeRasterTaskQueue, ComputeTaskQueue, MeshTaskQueue};

    #[test]
    fn a_disabled_depth_prepass_skips_hzb_and_occlusion_passes() {
        let mut strategy = DeferredShadingStrategy::new(ShadingConfig {
            depth_prepass: false,
            gi_enabled: false,
            shadows_enabled: false,
            line_renderer_enabled: false,
            compute_raster_enabled: false,
            debug_view: DebugView::None,
        });
        let mut graph = RenderGraph::new(3);
        graph.begin();
        let mesh_tasks = MeshTaskQueue::new();
        let compute_tasks = ComputeTaskQueue::new();
        let compute_raster_tasks = ComputeRasterTaskQueue::new();
        strategy.compile_frame(&mut graph, 1920, 1080, true, &mesh_tasks, &compute_tasks, &compute_raster_tasks, 0);
        assert!(graph.pass_count() > 0);
    }

    /// Finds a recorded pass's index by name, across the full (uncompiled)
    /// pass list — used by tests that only care about wiring, not culling.
    fn find_pass(graph: &RenderGraph, name: Name) -> usize {
        (0..graph.pass_count())
            .find(|&i| graph.pass_name(i) == name)
            .unwrap_or_else(|| panic!("no pass named {name:?} was recorded"))
    }

    #[test]
    fn bloom_compiles_to_four_downsamples_three_upsamples_and_one_graphics_resolve() {
        let mut strategy = DeferredShadingStrategy::new(ShadingConfig::default());
        let mut graph = RenderGraph::new(3);
        graph.begin();
        let mesh_tasks = MeshTaskQueue::new();
        let compute_tasks = ComputeTaskQueue::new();
        let compute_raster_tasks = ComputeRasterTaskQueue::new();
        strategy.compile_frame(&mut graph, 1920, 1080, false, &mesh_tasks, &compute_tasks, &compute_raster_tasks, 0);

        for i in 0..4 {
            let idx = find_pass(&graph, Name::new(&format!("bloom_downsample_pass_{i}")));
            assert!(graph.pass_flags(idx).contains(PassFlags::COMPUTE));
        }
        for i in 0..3 {
            let idx = find_pass(&graph, Name::new(&format!("bloom_upsample_pass_{i}")));
            assert!(graph.pass_flags(idx).contains(PassFlags::COMPUTE));
        }

        let resolve = find_pass(&graph, Name::new("bloom_resolve"));
        assert!(graph.pass_flags(resolve).contains(PassFlags::GRAPHICS));
        assert_eq!(graph.pass_attachments(resolve), &[Name::new("bloom_result")]);
        assert!((0..graph.pass_count()).all(|i| graph.pass_name(i) != Name::new("bloom")));
    }

    #[test]
    fn deferred_lighting_is_a_graphics_pass_with_lit_scene_color_attached() {
        let mut strategy = DeferredShadingStrategy::new(ShadingConfig::default());
        let mut graph = RenderGraph::new(3);
        graph.begin();
        let mesh_tasks = MeshTaskQueue::new();
        let compute_tasks = ComputeTaskQueue::new();
        let compute_raster_tasks = ComputeRasterTaskQueue::new();
        strategy.compile_frame(&mut graph, 1920, 1080, false, &mesh_tasks, &compute_tasks, &compute_raster_tasks, 0);

        let lighting = find_pass(&graph, Name::new("deferred_lighting"));
        assert!(graph.pass_flags(lighting).contains(PassFlags::GRAPHICS));
        assert_eq!(graph.pass_attachments(lighting), &[Name::new("lit_scene_color")]);
    }

    #[test]
    fn post_process_passes_are_graphics_passes_writing_ping_pong_attachments() {
        let mut strategy = DeferredShadingStrategy::new(ShadingConfig::default());
        strategy.set_post_process_passes(vec![
            PostProcessPass { name: Name::new("tonemap") },
            PostProcessPass { name: Name::new("vignette") },
        ]);
        let mut graph = RenderGraph::new(3);
        graph.begin();
        let mesh_tasks = MeshTaskQueue::new();
        let compute_tasks = ComputeTaskQueue::new();
        let compute_raster_tasks = ComputeRasterTaskQueue::new();
        strategy.compile_frame(&mut graph, 1920, 1080, false, &mesh_tasks, &compute_tasks, &compute_raster_tasks, 0);

        let tonemap = find_pass(&graph, Name::new("tonemap"));
        let vignette = find_pass(&graph, Name::new("vignette"));
        assert!(graph.pass_flags(tonemap).contains(PassFlags::GRAPHICS));
        assert!(graph.pass_flags(vignette).contains(PassFlags::GRAPHICS));
        assert_eq!(graph.pass_attachments(tonemap), &[Name::new("post_process_ping")]);
        assert_eq!(graph.pass_attachments(vignette), &[Name::new("post_process_pong")]);
    }

    #[test]
    fn mid_frame_flag_is_false_before_and_after_compiling_a_frame() {
        let mut strategy = DeferredShadingStrategy::new(ShadingConfig::default());
        assert!(!strategy.is_mid_frame());
        let mut graph = RenderGraph::new(3);
        graph.begin();
        let mesh_tasks = MeshTaskQueue::new();
        let compute_tasks = ComputeTaskQueue::new();
        let compute_raster_tasks = ComputeRasterTaskQueue::new();
        strategy.compile_frame(&mut graph, 1920, 1080, false, &mesh_tasks, &compute_tasks, &compute_raster_tasks, 0);
        assert!(!strategy.is_mid_frame());
    }
}
