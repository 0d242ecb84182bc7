//! Allocators
//!
//! Four allocator shapes back the task/instance/resource descriptor pools
//! used throughout the core (spec §2.4):
//!
//! - [`FrameAllocator`]: a bump arena reset every [`crate::graph::graph::RenderGraph::begin`].
//!   All per-frame `RGResource`/`RGPass`/metadata records live here (spec §9).
//! - [`RandomAccessAllocator`]: a growable slot array with O(1) indexed
//!   access, used where callers address slots by a stable index they chose
//!   themselves (e.g. object-instance rows).
//! - [`RingBufferAllocator`]: a fixed-capacity ring used for the per-frame
//!   write budgets that cycle across buffered frames (spec §4.6,
//!   "bounded per-frame write budget that cycles across buffered frames").
//! - [`SparseRandomAccessAllocator`]: a `RandomAccessAllocator` plus a
//!   LIFO free-list, giving O(1) alloc/free of sparse indices (spec §9,
//!   "Bindless free-lists: array plus LIFO free-stack").

mod frame;
mod random_access;
mod ring_buffer;
mod sparse_random_access;

pub use frame::FrameAllocator;
pub use random_access::RandomAccessAllocator;
pub use ring_buffer::RingBufferAllocator;
pub use sparse_random_access::SparseRandomAccessAllocator;
