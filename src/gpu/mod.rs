//! GPU Resources
//!
//! `Buffer`, `Texture`, `Sampler`, `Shader` (with reflection),
//! `PipelineState`, `RenderPass`, and `BindGroup` wrappers over the native
//! graphics API, all cached by [`crate::name::Name`] through
//! [`crate::cache::ResourceCache`]. Per spec §9, every wrapper stores only
//! the `Name` of the things it references and fetches on use — this is how
//! the cyclic material ↔ bind group ↔ pipeline ↔ shader references are
//! broken.

pub mod bind_group;
pub mod buffer;
pub mod pipeline;
pub mod reflection;
pub mod sampler;
pub mod shader;
pub mod texture;

pub use bind_group::{BindGroup, BindGroupSlot, BindingTable};
pub use buffer::{Buffer, BufferConfig};
pub use pipeline::{ComputePipelineDescriptor, PipelineState, RenderPipelineDescriptor};
pub use reflection::{BindingAccess, BindingReflection, ResourceType, ShaderReflection};
pub use sampler::Sampler;
pub use shader::Shader;
pub use texture::{Texture, TextureConfig};
