//! Adaptive Sparse Virtual Shadow Maps (spec §4.10).

pub mod passes;
pub mod tiles;

pub use passes::{LightShadowState, RequestedTile, VsmState};
pub use tiles::{LruRing, VsmSettings, DEFAULT_MAX_REQUESTS_PER_VIEW, HISTOGRAM_BINS, UNMAPPED_PAGE};
