//! G-Buffer layout (spec §4.9 steps 1, 4, 12, 21).
//!
//! Nine render targets plus helpers to flip their load ops between `clear`
//! (start of frame) and `load` (preserve contents across the many passes
//! that write into the G-Buffer across one frame).

use crate::gpu::texture::{LoadOp, TextureConfig};
use crate::name::Name;

/// One render target's declared name and format, in creation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GBufferTarget {
    pub name: &'static str,
    pub format: wgpu::TextureFormat,
}

pub const ALBEDO: GBufferTarget = GBufferTarget { name: "g_buffer_albedo", format: wgpu::TextureFormat::Rgba8Unorm };
pub const EMISSIVE: GBufferTarget = GBufferTarget { name: "g_buffer_emissive", format: wgpu::TextureFormat::Rgba16Float };
pub const SMRA: GBufferTarget = GBufferTarget { name: "g_buffer_smra", format: wgpu::TextureFormat::Rgba8Unorm };
pub const NORMAL: GBufferTarget = GBufferTarget { name: "g_buffer_normal", format: wgpu::TextureFormat::Rgba16Float };
pub const POSITION: GBufferTarget = GBufferTarget { name: "g_buffer_position", format: wgpu::TextureFormat::Rgba32Float };
pub const ENTITY_ID: GBufferTarget = GBufferTarget { name: "g_buffer_entity_id", format: wgpu::TextureFormat::R32Uint };
pub const TRANSPARENCY_ACCUM: GBufferTarget = GBufferTarget { name: "g_buffer_transparency_accum", format: wgpu::TextureFormat::Rgba16Float };
pub const TRANSPARENCY_REVEAL: GBufferTarget = GBufferTarget { name: "g_buffer_transparency_reveal", format: wgpu::TextureFormat::R8Unorm };
pub const DEPTH: GBufferTarget = GBufferTarget { name: "g_buffer_depth", format: wgpu::TextureFormat::Depth32Float };

/// All nine targets, in the order they're created (spec §4.9 step 1).
pub const TARGETS: [GBufferTarget; 9] = [
    ALBEDO,
    EMISSIVE,
    SMRA,
    NORMAL,
    POSITION,
    ENTITY_ID,
    TRANSPARENCY_ACCUM,
    TRANSPARENCY_REVEAL,
    DEPTH,
];

/// Builds the creation-time configs for every G-Buffer target at
/// `(width, height)`, `force` set when a `resolution_change` event fired
/// (spec §4.9: "propagates `force: true` to each new-frame image/buffer
/// config").
#[must_use]
pub fn target_configs(width: u32, height: u32, force: bool) -> Vec<TextureConfig> {
    TARGETS
        .iter()
        .map(|t| TextureConfig {
            force,
            ..TextureConfig::render_target_2d(t.name, width, height, t.format)
        })
        .collect()
}

/// Names of all nine targets, handy for bulk load-op flips.
#[must_use]
pub fn target_names() -> [Name; 9] {
    TARGETS.map(|t| Name::new(t.name))
}

/// Whether `load_op` should be `Load` (mid-frame, to preserve earlier
/// writes) or `Clear` (start/end of frame).
#[must_use]
pub const fn load_op_for_phase(mid_frame: bool) -> LoadOp {
    if mid_frame {
        LoadOp::Load
    } else {
        LoadOp::Clear
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nine_targets_are_declared() {
        assert_eq!(TARGETS.len(), 9);
    }

    #[test]
    fn target_configs_propagate_force_flag() {
        let configs = target_configs(1920, 1080, true);
        assert!(configs.iter().all(|c| c.force));
        assert_eq!(configs.len(), 9);
    }

    #[test]
    fn load_op_flips_between_clear_and_load() {
        assert_eq!(load_op_for_phase(false), LoadOp::Clear);
        assert_eq!(load_op_for_phase(true), LoadOp::Load);
    }
}
