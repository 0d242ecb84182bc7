//! Nightforge
//!
//! A declarative frame-graph renderer core over a WebGPU-class API (wgpu):
//! pass scheduling and DAG compilation ([`graph`]), a named resource cache
//! with transient/persistent lifetimes ([`cache`], [`queue`]), bind-group
//! and pipeline synthesis from shader reflection ([`gpu`]), indirect-draw
//! mesh batching and compute task queues ([`tasks`]), and the two-phase
//! GPU-culled deferred shading pipeline with AS-VSM shadows, DDGI, and
//! bloom ([`shading`]).
//!
//! This crate owns scheduling and GPU object lifetime; it does not own a
//! window, an ECS, or asset loading — those are the host's job, reached
//! through the narrow trait seams in [`external`].

pub mod alloc;
pub mod cache;
pub mod errors;
pub mod external;
pub mod gpu;
pub mod graph;
pub mod name;
pub mod queue;
pub mod readback;
pub mod shading;
pub mod tasks;
pub mod util;

pub use errors::{EngineError, Result};
pub use name::Name;
