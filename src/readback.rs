//! Buffered CPU Readback
//!
//! `Buffer{cpu_readback:true}` (spec §4.2, §4.12) already owns its own
//! shadow-buffer ring and per-frame `device -> shadow[frame % N]` copy;
//! [`BufferSync`] is the process-wide registry that collects readback
//! requests across a frame and drains them once the graph has submitted,
//! so callers don't have to remember which buffers they asked for.

use rustc_hash::FxHashMap;

use crate::cache::{Category, ResourceCache};
use crate::graph::graph::PhysicalObject;
use crate::name::Name;

/// Collects readback requests and the most recent successfully-read bytes
/// per buffer name.
#[derive(Default)]
pub struct BufferSync {
    requested: Vec<Name>,
    latest: FxHashMap<Name, Vec<u8>>,
}

impl BufferSync {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues `name` for a readback attempt on the next
    /// [`BufferSync::process_readbacks`] call. Idempotent within a frame.
    pub fn request_readback(&mut self, name: Name) {
        if !self.requested.contains(&name) {
            self.requested.push(name);
        }
    }

    /// Attempts to read `read_len` bytes from offset 0 of each requested
    /// buffer's current shadow. A buffer whose shadow is still mapped is
    /// silently skipped (spec §7: "readback races ... ignored; the stale
    /// value from the prior frame is retained"). Clears the request list
    /// afterwards.
    pub fn process_readbacks(&mut self, cache: &mut ResourceCache<PhysicalObject>, read_len: u64) {
        for name in self.requested.drain(..) {
            let Some(PhysicalObject::Buffer(buffer)) = cache.fetch_mut(Category::Buffer, name) else {
                continue;
            };
            let mut out = vec![0u8; read_len as usize];
            if buffer.read(&mut out, 0, read_len) {
                self.latest.insert(name, out);
            }
        }
    }

    #[must_use]
    pub fn latest(&self, name: Name) -> Option<&[u8]> {
        self.latest.get(&name).map(Vec::as_slice)
    }
}

/// Pure reference model of the N-buffered-frame readback-latency contract
/// (spec §8 scenario 7), independent of any GPU buffer — pins the invariant
/// down without needing a device: reading right after submit `k` sees the
/// value written at submit `k - N`, or nothing if `k < N`.
pub struct ReadbackLatencyModel<T> {
    buffered_frame_count: usize,
    history: Vec<T>,
}

impl<T> ReadbackLatencyModel<T> {
    #[must_use]
    pub fn new(buffered_frame_count: usize) -> Self {
        Self {
            buffered_frame_count: buffered_frame_count.max(1),
            history: Vec::new(),
        }
    }

    pub fn write(&mut self, value: T) {
        self.history.push(value);
    }

    #[must_use]
    pub fn read_after_submit(&self, k: usize) -> Option<&T> {
        if k < self.buffered_frame_count {
            return None;
        }
        self.history.get(k - self.buffered_frame_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_before_the_buffering_depth_are_unavailable() {
        let mut model = ReadbackLatencyModel::new(2);
        model.write("v0");
        model.write("v1");
        model.write("v2");
        assert_eq!(model.read_after_submit(0), None);
        assert_eq!(model.read_after_submit(1), None);
    }

    #[test]
    fn reads_at_and_past_the_buffering_depth_see_the_value_from_n_frames_back() {
        let mut model = ReadbackLatencyModel::new(2);
        model.write("v0");
        model.write("v1");
        model.write("v2");
        assert_eq!(model.read_after_submit(2), Some(&"v0"));
        assert_eq!(model.read_after_submit(3), Some(&"v1"));
    }

    #[test]
    fn request_readback_is_idempotent_within_a_frame() {
        let mut sync = BufferSync::new();
        let name = Name::new("positions_readback");
        sync.request_readback(name);
        sync.request_readback(name);
        assert_eq!(sync.requested.len(), 1);
    }
}
