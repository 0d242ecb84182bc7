//! Sampler wrapper.

use crate::name::Name;

/// Declarative sampler configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SamplerConfig {
    pub name: Name,
    pub address_mode: wgpu::AddressMode,
    pub mag_filter: wgpu::FilterMode,
    pub min_filter: wgpu::FilterMode,
    pub mipmap_filter: wgpu::FilterMode,
    pub compare: Option<wgpu::CompareFunction>,
    pub anisotropy_clamp: u16,
}

impl SamplerConfig {
    #[must_use]
    pub fn linear(name: &str) -> Self {
        Self {
            name: Name::new(name),
            address_mode: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            compare: None,
            anisotropy_clamp: 1,
        }
    }

    #[must_use]
    pub fn shadow_compare(name: &str) -> Self {
        Self {
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Self::linear(name)
        }
    }
}

/// A cached, named sampler.
pub struct Sampler {
    pub name: Name,
    pub sampler: wgpu::Sampler,
}

impl Sampler {
    #[must_use]
    pub fn create(device: &wgpu::Device, config: &SamplerConfig) -> Self {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: None,
            address_mode_u: config.address_mode,
            address_mode_v: config.address_mode,
            address_mode_w: config.address_mode,
            mag_filter: config.mag_filter,
            min_filter: config.min_filter,
            mipmap_filter: config.mipmap_filter,
            compare: config.compare,
            anisotropy_clamp: config.anisotropy_clamp,
            ..Default::default()
        });
        Self {
            name: config.name,
            sampler,
        }
    }
}
