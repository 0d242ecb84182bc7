//! Fullscreen present (spec §4.9 step 20).
//!
//! The present pass always runs last (spec §5: "the present pass is always
//! last") and is `force_keep=true` via [`crate::graph::pass::PassFlags::PRESENT`].
//! When a debug view is selected, the present shader's source input is
//! swapped from the lit scene image to the chosen AS-VSM debug image.

use crate::name::Name;

/// Which debug image, if any, the present pass should source from instead
/// of the normal lit scene color (spec §4.10 "Debug"). The two AS-VSM
/// variants only exist under the `debug_view` feature, since they name
/// images [`crate::shading::vsm::passes::VsmState`] only registers when
/// that feature is compiled in.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum DebugView {
    #[default]
    None,
    #[cfg(feature = "debug_view")]
    AsVsmShadowAtlas,
    #[cfg(feature = "debug_view")]
    AsVsmShadowPageTable,
}

/// Resolves the present pass's source image name given the selected debug
/// view, falling back to the normal lit scene color when none is active.
#[must_use]
pub fn present_source(debug_view: DebugView, lit_scene_color: Name) -> Name {
    match debug_view {
        DebugView::None => lit_scene_color,
        #[cfg(feature = "debug_view")]
        DebugView::AsVsmShadowAtlas => Name::new("as_vsm_debug_shadow_atlas"),
        #[cfg(feature = "debug_view")]
        DebugView::AsVsmShadowPageTable => Name::new("as_vsm_debug_shadow_page_table"),
    }
}
