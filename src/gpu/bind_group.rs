//! Bind group synthesis and bindless sub-slot tables.
//!
//! A [`BindGroup`] is built either against an inferred layout (pulled off an
//! existing [`crate::gpu::pipeline::PipelineState`]) or an explicit layout
//! synthesized from [`crate::gpu::reflection::ShaderReflection`]. Group index
//! is always one of [`BindGroupSlot::Global`] (0), [`BindGroupSlot::Pass`]
//! (1), [`BindGroupSlot::Material`] (2) (spec §4.5).
//!
//! [`BindingTable`] is the bindless sub-slot table behind a
//! `texture_2d_array`/`storage` binding: callers hand it resources and get
//! back a stable `u32` index to embed in a per-draw uniform, instead of
//! re-binding per draw (spec §4.5, §9).

use smallvec::SmallVec;

use crate::errors::{EngineError, Result};
use crate::alloc::sparse_random_access::SparseRandomAccessAllocator;
use crate::gpu::reflection::{BindingReflection, ResourceType, ShaderReflection};
use crate::name::Name;

/// Which of the three fixed bind-group slots a group occupies.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BindGroupSlot {
    Global = 0,
    Pass = 1,
    Material = 2,
}

impl BindGroupSlot {
    #[must_use]
    pub const fn index(self) -> u32 {
        self as u32
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Pass => "pass",
            Self::Material => "material",
        }
    }
}

/// One resolved binding entry fed into [`wgpu::BindGroupDescriptor`].
pub enum ResolvedBinding<'a> {
    Buffer {
        buffer: &'a wgpu::Buffer,
        offset: u64,
        size: u64,
    },
    TextureView(&'a wgpu::TextureView),
    Sampler(&'a wgpu::Sampler),
}

/// Builds a `wgpu::BindGroupLayout` directly from a reflected group's
/// bindings, without needing an existing pipeline (spec §4.5: "an explicit
/// layout built from reflection").
#[must_use]
pub fn layout_from_reflection(
    device: &wgpu::Device,
    slot: BindGroupSlot,
    bindings: &[BindingReflection],
) -> wgpu::BindGroupLayout {
    // Most bind groups in this core carry well under eight entries (spec
    // §4.5's three fixed slots each hold a handful of bindings); `SmallVec`
    // keeps the common case off the heap without capping the rare wider one.
    let entries: SmallVec<[wgpu::BindGroupLayoutEntry; 8]> = bindings
        .iter()
        .map(|b| wgpu::BindGroupLayoutEntry {
            binding: b.binding,
            visibility: b.visibility,
            ty: binding_type(b),
            count: None,
        })
        .collect();

    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(slot.label()),
        entries: &entries,
    })
}

fn binding_type(b: &BindingReflection) -> wgpu::BindingType {
    match b.kind {
        ResourceType::Uniform => wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        ResourceType::Storage => wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage {
                read_only: b.access == crate::gpu::reflection::BindingAccess::Read,
            },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        ResourceType::Texture => wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: crate::gpu::texture::dimension_from_type_name(&b.view_dimension_token),
            multisampled: false,
        },
        ResourceType::StorageTexture => wgpu::BindingType::StorageTexture {
            access: match b.access {
                crate::gpu::reflection::BindingAccess::Read => wgpu::StorageTextureAccess::ReadOnly,
                crate::gpu::reflection::BindingAccess::Write => wgpu::StorageTextureAccess::WriteOnly,
                crate::gpu::reflection::BindingAccess::ReadWrite => wgpu::StorageTextureAccess::ReadWrite,
            },
            format: wgpu::TextureFormat::Rgba8Unorm,
            view_dimension: crate::gpu::texture::dimension_from_type_name(&b.view_dimension_token),
        },
        ResourceType::Sampler => wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
    }
}

/// A synthesized bind group plus the `Name` of the layout it was built
/// against, so later frames can detect a reflection change and rebuild.
pub struct BindGroup {
    pub name: Name,
    pub slot: BindGroupSlot,
    pub group: wgpu::BindGroup,
}

impl BindGroup {
    /// Builds a bind group from already-resolved entries, in binding order.
    pub fn create(
        device: &wgpu::Device,
        name: Name,
        slot: BindGroupSlot,
        layout: &wgpu::BindGroupLayout,
        bindings: &[(u32, ResolvedBinding<'_>)],
    ) -> Self {
        let entries: SmallVec<[wgpu::BindGroupEntry; 8]> = bindings
            .iter()
            .map(|(binding, resolved)| wgpu::BindGroupEntry {
                binding: *binding,
                resource: match resolved {
                    ResolvedBinding::Buffer { buffer, offset, size } => wgpu::BindingResource::Buffer(
                        wgpu::BufferBinding {
                            buffer,
                            offset: *offset,
                            size: std::num::NonZeroU64::new(*size),
                        },
                    ),
                    ResolvedBinding::TextureView(view) => wgpu::BindingResource::TextureView(view),
                    ResolvedBinding::Sampler(sampler) => wgpu::BindingResource::Sampler(sampler),
                },
            })
            .collect();

        let group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(slot.label()),
            layout,
            entries: &entries,
        });

        Self { name, slot, group }
    }
}

/// A bindless sub-slot table for one binding of one bind-group slot: a
/// free-list-backed array of logical resource handles (spec §4.5, §9).
/// `T` is typically a small `Copy` struct (a texture/sampler index pair) or
/// just a `u32` resource id — the table itself only manages slot identity.
pub struct BindingTable<T> {
    slot: BindGroupSlot,
    label: &'static str,
    capacity: u32,
    alloc: SparseRandomAccessAllocator<T>,
}

impl<T> BindingTable<T> {
    #[must_use]
    pub fn new(slot: BindGroupSlot, label: &'static str, capacity: u32) -> Self {
        Self {
            slot,
            label,
            capacity,
            alloc: SparseRandomAccessAllocator::new(),
        }
    }

    #[must_use]
    pub const fn slot(&self) -> BindGroupSlot {
        self.slot
    }

    /// Allocates a new bindless handle for `value`. Errors once `capacity`
    /// live entries are in use.
    pub fn get_new(&mut self, value: T) -> Result<u32> {
        if self.alloc.live_count() as u32 >= self.capacity {
            return Err(EngineError::BindingTableExhausted {
                slot: self.label,
                capacity: self.capacity,
            });
        }
        Ok(self.alloc.get_new(value))
    }

    /// Frees a previously allocated handle. Errors on double-free or an
    /// out-of-range handle (spec §9: "Double-free is an error").
    pub fn free(&mut self, handle: u32) -> Result<()> {
        if self.alloc.free(handle) {
            Ok(())
        } else {
            Err(EngineError::DoubleFree {
                slot: self.label,
                handle,
            })
        }
    }

    #[must_use]
    pub fn get(&self, handle: u32) -> Option<&T> {
        self.alloc.get(handle)
    }

    /// Frees every live handle, resetting the table to empty.
    pub fn reset(&mut self) {
        self.alloc.reset();
    }

    #[must_use]
    pub fn live_count(&self) -> usize {
        self.alloc.live_count()
    }
}
