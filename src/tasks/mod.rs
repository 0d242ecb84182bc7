//! Task Queues
//!
//! [`mesh::MeshTaskQueue`] collects per-frame mesh draws into indirect-draw
//! batches and per-view visibility buffers (spec §4.6). [`compute::ComputeTaskQueue`]
//! and [`compute_raster::ComputeRasterTaskQueue`] are the compute-dispatch and
//! compute-rasterization analogues (spec §4.7).

pub mod compute;
pub mod compute_raster;
pub mod mesh;

pub use compute::ComputeTaskQueue;
pub use compute_raster::{ComputeRasterTaskQueue, Primitive};
pub use mesh::{IndirectDrawBatch, IndirectDrawObject, MaterialFamily, MeshTaskQueue, ObjectInstanceEntry};
