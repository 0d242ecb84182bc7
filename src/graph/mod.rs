//! Render Graph
//!
//! The frame-graph pass scheduler: [`handle::ResourceHandle`] is the
//! graph-local reference a pass declares as input/output, [`resource::ResourceMetadata`]
//! tracks its per-frame lifetime, [`pass::Pass`] is a recorded pass, and
//! [`compile`] implements the two compile-time steps (culling, custom
//! ordering) that [`graph::RenderGraph::submit`] runs before executing
//! the surviving passes (spec §4.8).

pub mod compile;
pub mod graph;
pub mod handle;
#[cfg(feature = "rdg_inspector")]
pub mod inspect;
pub mod pass;
pub mod resource;

pub use compile::{cull, order_passes};
pub use graph::{PassExecutor, PhysicalObject, RenderGraph};
pub use handle::{ResourceHandle, ResourceKind};
pub use pass::{Pass, PassFlags, PassInput};
pub use resource::ResourceMetadata;
