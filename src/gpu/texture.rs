//! Texture wrapper.
//!
//! `Texture::create` allocates a 2D/3D/array/cube texture from a declarative
//! [`TextureConfig`] and auto-creates one default view plus, optionally, one
//! view per mip level and/or one view per array layer — used by passes that
//! need to render into (or read from) a single mip or layer at a time (spec
//! §4.2, §4.9's HZB reduction and DDGI's per-probe cubemap array layers).

use bitflags::bitflags;

use crate::name::Name;

bitflags! {
    /// Extra per-texture behavior flags beyond wgpu's own `TextureUsages`.
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct TextureFlags: u8 {
        const NONE = 0;
        /// Treated as a bindless sampled texture (see `BindingTable`).
        const BINDLESS = 1 << 0;
        /// Persistent across frames (not subject to transient aliasing).
        const PERSISTENT = 1 << 1;
    }
}

/// How a render-pass color/depth attachment should treat the texture's
/// previous contents, mirroring `wgpu::LoadOp` without forcing a clear
/// value choice at config time.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum LoadOp {
    Clear,
    Load,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum StoreOp {
    Store,
    Discard,
}

/// Declarative configuration for [`Texture::create`].
#[derive(Clone)]
pub struct TextureConfig {
    pub name: Name,
    pub width: u32,
    pub height: u32,
    pub depth_or_layers: u32,
    pub mip_levels: u32,
    pub sample_count: u32,
    pub dimension: wgpu::TextureDimension,
    pub view_dimension: wgpu::TextureViewDimension,
    pub format: wgpu::TextureFormat,
    pub usage: wgpu::TextureUsages,
    pub clear_value: wgpu::Color,
    pub load_op: LoadOp,
    pub store_op: StoreOp,
    pub one_view_per_mip: bool,
    pub one_view_per_layer: bool,
    pub blend: Option<wgpu::BlendState>,
    pub flags: TextureFlags,
    pub force: bool,
}

impl TextureConfig {
    #[must_use]
    pub fn render_target_2d(name: &str, width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        Self {
            name: Name::new(name),
            width,
            height,
            depth_or_layers: 1,
            mip_levels: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            view_dimension: wgpu::TextureViewDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            clear_value: wgpu::Color::TRANSPARENT,
            load_op: LoadOp::Clear,
            store_op: StoreOp::Store,
            one_view_per_mip: false,
            one_view_per_layer: false,
            blend: None,
            flags: TextureFlags::NONE,
            force: false,
        }
    }
}

/// A cached, named texture plus its default and per-mip/per-layer views.
pub struct Texture {
    pub name: Name,
    pub texture: wgpu::Texture,
    pub default_view: wgpu::TextureView,
    pub mip_views: Vec<wgpu::TextureView>,
    pub layer_views: Vec<wgpu::TextureView>,
    pub config: TextureConfig,
}

impl Texture {
    #[must_use]
    pub fn create(device: &wgpu::Device, config: TextureConfig) -> Self {
        let size = wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: config.depth_or_layers.max(1),
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: None,
            size,
            mip_level_count: config.mip_levels.max(1),
            sample_count: config.sample_count.max(1),
            dimension: config.dimension,
            format: config.format,
            usage: config.usage | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let default_view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: None,
            dimension: Some(config.view_dimension),
            ..Default::default()
        });

        let mip_views = if config.one_view_per_mip {
            (0..config.mip_levels.max(1))
                .map(|mip| {
                    texture.create_view(&wgpu::TextureViewDescriptor {
                        label: None,
                        dimension: Some(wgpu::TextureViewDimension::D2),
                        base_mip_level: mip,
                        mip_level_count: Some(1),
                        ..Default::default()
                    })
                })
                .collect()
        } else {
            Vec::new()
        };

        let layer_views = if config.one_view_per_layer {
            (0..config.depth_or_layers.max(1))
                .map(|layer| {
                    texture.create_view(&wgpu::TextureViewDescriptor {
                        label: None,
                        dimension: Some(wgpu::TextureViewDimension::D2),
                        base_array_layer: layer,
                        array_layer_count: Some(1),
                        ..Default::default()
                    })
                })
                .collect()
        } else {
            Vec::new()
        };

        Self {
            name: config.name,
            texture,
            default_view,
            mip_views,
            layer_views,
            config,
        }
    }

    /// Picks a view for pass input/output targeting: per-mip when `mip` is
    /// set and per-mip views exist, else per-layer, else the default view
    /// (spec §4.8: "using the pass's `output_views[i]` for per-mip /
    /// per-layer targeting").
    #[must_use]
    pub fn view_for(&self, mip: Option<u32>, layer: Option<u32>) -> &wgpu::TextureView {
        if let Some(mip) = mip {
            if let Some(v) = self.mip_views.get(mip as usize) {
                return v;
            }
        }
        if let Some(layer) = layer {
            if let Some(v) = self.layer_views.get(layer as usize) {
                return v;
            }
        }
        &self.default_view
    }
}

/// Pure helper used by shader reflection to pick a sample type from a pixel
/// format (spec §4.2).
#[must_use]
pub fn filter_type_from_format(format: wgpu::TextureFormat) -> wgpu::TextureSampleType {
    use wgpu::TextureFormat as F;
    match format {
        F::Depth16Unorm | F::Depth24Plus | F::Depth24PlusStencil8 | F::Depth32Float => {
            wgpu::TextureSampleType::Depth
        }
        F::R32Uint | F::Rg32Uint | F::Rgba32Uint | F::R16Uint | F::Rg16Uint | F::Rgba16Uint => {
            wgpu::TextureSampleType::Uint
        }
        F::R32Sint | F::Rg32Sint | F::Rgba32Sint | F::R16Sint | F::Rg16Sint | F::Rgba16Sint => {
            wgpu::TextureSampleType::Sint
        }
        F::R32Float | F::Rg32Float | F::Rgba32Float => wgpu::TextureSampleType::Float {
            filterable: false,
        },
        _ => wgpu::TextureSampleType::Float { filterable: true },
    }
}

/// Pure helper used by shader reflection to map a WGSL texture type token
/// (e.g. `texture_2d_array`, `texture_cube`) to the matching view dimension.
#[must_use]
pub fn dimension_from_type_name(type_name: &str) -> wgpu::TextureViewDimension {
    match type_name {
        "texture_1d" => wgpu::TextureViewDimension::D1,
        "texture_2d_array" => wgpu::TextureViewDimension::D2Array,
        "texture_cube" => wgpu::TextureViewDimension::Cube,
        "texture_cube_array" => wgpu::TextureViewDimension::CubeArray,
        "texture_3d" => wgpu::TextureViewDimension::D3,
        _ => wgpu::TextureViewDimension::D2,
    }
}
