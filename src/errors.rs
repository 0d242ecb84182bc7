//! Error Types
//!
//! This module defines the error types used throughout the render core.
//!
//! # Overview
//!
//! [`EngineError`] covers the failure modes the frame-graph driver itself can
//! raise: configuration mistakes (bad binding slots, exhausted free-lists,
//! duplicate templates), fatal per-frame conditions (a reflected shader
//! binding with no matching pass input, a missing physical resource), and
//! device/adapter plumbing. Per spec, resource-lookup misses at the cache
//! layer are *not* errors — [`crate::cache::ResourceCache::fetch`] returns
//! `Option`, and callers decide whether absence is fatal.
//!
//! # Usage
//!
//! All public APIs that can fail return [`Result<T>`].

use thiserror::Error;

/// The error type for the Nightforge render core.
#[derive(Error, Debug)]
pub enum EngineError {
    // ========================================================================
    // GPU & device errors
    // ========================================================================
    /// Failed to request a compatible GPU adapter.
    #[error("failed to request a compatible GPU adapter: {0}")]
    AdapterRequestFailed(String),

    /// Failed to create the GPU device.
    #[error("failed to create GPU device: {0}")]
    DeviceCreateFailed(#[from] wgpu::RequestDeviceError),

    // ========================================================================
    // Configuration errors (spec §7: fatal for the frame)
    // ========================================================================
    /// A `BindingTable` slot index was out of range or unknown.
    #[error("unknown bindless slot {slot} in group {group}")]
    UnknownBindingSlot { group: &'static str, slot: u32 },

    /// `BindingTable::get_new` was called on an exhausted free-list.
    #[error("bindless slot table '{slot}' is exhausted (capacity {capacity})")]
    BindingTableExhausted { slot: &'static str, capacity: u32 },

    /// `BindingTable::free` was called twice on the same handle.
    #[error("double free of bindless handle {handle} in slot '{slot}'")]
    DoubleFree { slot: &'static str, handle: u32 },

    /// A material template with the same name was registered twice.
    #[error("duplicate material template: {0}")]
    DuplicateMaterialTemplate(String),

    /// Referenced a material template that doesn't exist.
    #[error("unknown material template: {0}")]
    UnknownMaterialTemplate(String),

    /// A reflected shader binding has no corresponding `pass_inputs` entry.
    #[error("pass '{pass}' is missing an input for reflected binding {binding} in group {group}")]
    MissingPassInput {
        pass: String,
        group: &'static str,
        binding: u32,
    },

    /// A handle referenced a physical resource that was never materialized.
    #[error("no physical resource materialized for handle {0:?}")]
    MissingPhysicalResource(crate::graph::handle::ResourceHandle),

    /// `execute()` was called with a null/absent pass executor.
    #[error("pass '{0}' has no executor bound")]
    NullPassExecutor(String),

    /// A pass's `shader_setup` names a shader that was never registered into
    /// `Category::Shader` before `submit()` ran.
    #[error("pass '{0}' references a shader module that was never registered with the cache")]
    MissingShaderModule(String),

    // ========================================================================
    // Shader errors
    // ========================================================================
    /// `#include` resolution failed against every search root.
    #[error("could not resolve #include \"{0}\" against any search root")]
    ShaderIncludeNotFound(String),

    /// `#include` cycle detected while resolving shader source.
    #[error("#include cycle detected: {0}")]
    ShaderIncludeCycle(String),

    /// Malformed `#if`/`#else`/`#endif`/`#ifndef` nesting.
    #[error("malformed shader conditional block in {file}: {reason}")]
    MalformedShaderConditional { file: String, reason: String },

    /// I/O error while loading shader source.
    #[error("shader I/O error: {0}")]
    IoError(#[from] std::io::Error),

    // ========================================================================
    // AS-VSM / allocator errors
    // ========================================================================
    /// The virtual-tile LRU ring had no free physical slot to evict.
    #[error("AS-VSM LRU ring exhausted for light {0}")]
    VsmLruExhausted(u32),
}

/// Alias for `Result<T, EngineError>`.
pub type Result<T> = std::result::Result<T, EngineError>;
