//! Per-frame AS-VSM pass sequence (spec §4.10).
//!
//! Registers the shadow-tile pipeline (Init → Histogram → Split-Depth Sum →
//! Feedback → Gather → Update Page Table → Render Tiles) onto a
//! [`crate::graph::graph::RenderGraph`]. The compute kernels themselves are
//! host-supplied WGSL (shader text is not part of this core, spec §1); this
//! module owns the CPU-side resource layout, buffer sizing, and pass
//! wiring around them.

use crate::gpu::buffer::BufferConfig;
use crate::gpu::texture::TextureConfig;
use crate::graph::graph::RenderGraph;
use crate::graph::pass::PassFlags;
use crate::name::Name;
use crate::shading::vsm::tiles::{LruRing, VsmSettings, HISTOGRAM_BINS};

/// One CPU-visible entry appended to the requested-tiles buffer by the
/// Gather pass: `(virtual_tile_index, light_index, lod)`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestedTile {
    pub virtual_tile_index: u32,
    pub light_index: u32,
    pub lod: u32,
}

/// Per-light-shadow-caster state that persists across frames.
pub struct LightShadowState {
    pub light_index: u32,
    pub lru: LruRing,
}

/// Owns the AS-VSM resources for one frame's worth of shadow-casting
/// lights. Created once (`force_recreate` on cache invalidation), else the
/// same names are `register_*`-ed into the graph every frame.
pub struct VsmState {
    pub settings: VsmSettings,
    pub shadow_caster_count: u32,
    pub lights: Vec<LightShadowState>,
}

impl VsmState {
    #[must_use]
    pub fn new(settings: VsmSettings, shadow_caster_count: u32) -> Self {
        let total_physical = settings.total_physical_tiles();
        let lights = (0..shadow_caster_count)
            .map(|light_index| LightShadowState {
                light_index,
                lru: LruRing::new(total_physical),
            })
            .collect();
        Self {
            settings,
            shadow_caster_count,
            lights,
        }
    }

    /// Requested-tiles buffer size in bytes: a `1`-word count header plus
    /// `3` words per request, bounded by `max_requests_per_view`.
    #[must_use]
    pub fn requested_tiles_buffer_size(&self) -> u64 {
        u64::from(1 + self.settings.max_requests_per_view * 3) * 4
    }

    #[must_use]
    pub fn bitmask_buffer_size(&self) -> u64 {
        u64::from(self.settings.bitmask_word_count()) * 4
    }

    #[must_use]
    pub fn histogram_buffer_size(&self) -> u64 {
        u64::from(HISTOGRAM_BINS) * 4
    }

    /// Registers the shadow-atlas texture and page-table/bitmask/request
    /// buffers onto the graph and records the per-frame compute/graphics
    /// passes (spec §4.10 "Per-frame passes"). `active_request_count` is
    /// the value read back one frame late from the CPU shadow of the
    /// requested-tiles buffer (spec §8 scenario 7's latency applies here
    /// too — "consumed one frame late, by design").
    pub fn compile_passes(&self, graph: &mut RenderGraph, active_request_count: u32) {
        let atlas = Name::new("as_vsm_shadow_atlas");
        let page_table = Name::new("as_vsm_page_table");
        let bitmask = Name::new("as_vsm_bitmask");
        let requests = Name::new("as_vsm_requested_tiles");
        let histogram = Name::new("as_vsm_histogram");
        let depth = Name::new("g_buffer_depth");
        let dense_lights = Name::new("dense_shadow_casting_lights");

        graph.create_image(
            "as_vsm_shadow_atlas",
            TextureConfig {
                depth_or_layers: self.shadow_caster_count.max(1),
                dimension: wgpu::TextureDimension::D2,
                view_dimension: wgpu::TextureViewDimension::D2Array,
                one_view_per_layer: true,
                format: wgpu::TextureFormat::Depth32Float,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
                ..TextureConfig::render_target_2d("as_vsm_shadow_atlas", self.settings.atlas_size, self.settings.atlas_size, wgpu::TextureFormat::Depth32Float)
            },
        );
        graph.create_image(
            "as_vsm_page_table",
            TextureConfig {
                depth_or_layers: self.settings.max_lods,
                dimension: wgpu::TextureDimension::D2,
                view_dimension: wgpu::TextureViewDimension::D2Array,
                format: wgpu::TextureFormat::R32Uint,
                usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
                ..TextureConfig::render_target_2d(
                    "as_vsm_page_table",
                    self.settings.virtual_tiles_per_row(),
                    self.settings.virtual_tiles_per_row(),
                    wgpu::TextureFormat::R32Uint,
                )
            },
        );
        graph.create_buffer(
            "as_vsm_bitmask",
            BufferConfig::new(
                "as_vsm_bitmask",
                self.bitmask_buffer_size(),
                wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            ),
        );
        graph.create_buffer(
            "as_vsm_requested_tiles",
            BufferConfig::new(
                "as_vsm_requested_tiles",
                self.requested_tiles_buffer_size(),
                wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            )
            .with_readback(true),
        );
        graph.create_buffer(
            "as_vsm_histogram",
            BufferConfig::new(
                "as_vsm_histogram",
                self.histogram_buffer_size(),
                wgpu::BufferUsages::STORAGE,
            ),
        );

        graph.add_pass(Name::new("as_vsm_init"), PassFlags::COMPUTE | PassFlags::GRAPH_LOCAL, &[], &[histogram, bitmask, requests]);
        graph.add_pass(Name::new("as_vsm_histogram"), PassFlags::COMPUTE, &[depth], &[histogram]);
        graph.add_pass(Name::new("as_vsm_split_depth_sum"), PassFlags::COMPUTE, &[histogram], &[]);
        graph.add_pass(Name::new("as_vsm_feedback"), PassFlags::COMPUTE, &[depth], &[bitmask]);
        graph.add_pass(Name::new("as_vsm_gather"), PassFlags::COMPUTE, &[bitmask, page_table, dense_lights], &[requests]);
        graph.add_pass(Name::new("as_vsm_update_page_table"), PassFlags::COMPUTE, &[requests], &[page_table]);

        for request_index in 0..active_request_count.min(self.settings.max_requests_per_view) {
            let pass_name = Name::new(&format!("as_vsm_render_tile_{request_index}"));
            graph.add_pass(pass_name, PassFlags::GRAPHICS, &[requests], &[atlas]);
        }

        #[cfg(feature = "debug_view")]
        self.compile_debug_passes(graph, atlas, page_table);
    }

    /// Registers the two debug-visualization passes named in spec §4.10
    /// ("when `debug_view ∈ {ASVSM_ShadowAtlas, ASVSM_ShadowPageTable}`"):
    /// a blit-style compute pass that tonemaps the raw atlas/page-table
    /// contents into an image [`crate::shading::present`] can source the
    /// swapchain from. Only compiled under the `debug_view` feature so a
    /// release build carries no dead visualization shaders.
    #[cfg(feature = "debug_view")]
    fn compile_debug_passes(&self, graph: &mut RenderGraph, atlas: Name, page_table: Name) {
        let debug_atlas = Name::new("as_vsm_debug_shadow_atlas");
        let debug_page_table = Name::new("as_vsm_debug_shadow_page_table");

        graph.create_image(
            "as_vsm_debug_shadow_atlas",
            TextureConfig::render_target_2d("as_vsm_debug_shadow_atlas", self.settings.atlas_size, self.settings.atlas_size, wgpu::TextureFormat::Rgba8Unorm),
        );
        graph.create_image(
            "as_vsm_debug_shadow_page_table",
            TextureConfig::render_target_2d(
                "as_vsm_debug_shadow_page_table",
                self.settings.virtual_tiles_per_row(),
                self.settings.virtual_tiles_per_row(),
                wgpu::TextureFormat::Rgba8Unorm,
            ),
        );

        graph.add_pass(Name::new("as_vsm_debug_visualize_atlas"), PassFlags::COMPUTE, &[atlas], &[debug_atlas]);
        graph.add_pass(Name::new("as_vsm_debug_visualize_page_table"), PassFlags::COMPUTE, &[page_table], &[debug_page_table]);
    }
}
