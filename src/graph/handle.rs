//! Graph-local resource handles.
//!
//! A [`ResourceHandle`] is a packed `(index:24, type:8, version:16)` triple
//! (spec §3, §4.8), alive for exactly one frame. It is the unit of reference
//! the graph compiler reasons about before any physical resource exists —
//! `submit()` is what turns a handle into an actual `wgpu::Buffer`/`Texture`.

/// What kind of logical resource a handle refers to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ResourceKind {
    Image,
    Buffer,
}

impl ResourceKind {
    const fn to_bits(self) -> u8 {
        match self {
            Self::Image => 0,
            Self::Buffer => 1,
        }
    }

    const fn from_bits(bits: u8) -> Self {
        match bits {
            0 => Self::Image,
            _ => Self::Buffer,
        }
    }
}

/// A packed `(index:24, type:8, version:16)` handle (spec §3).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ResourceHandle(u64);

const INDEX_BITS: u32 = 24;
const TYPE_BITS: u32 = 8;
const VERSION_BITS: u32 = 16;

const INDEX_MASK: u64 = (1 << INDEX_BITS) - 1;
const TYPE_MASK: u64 = (1 << TYPE_BITS) - 1;
const VERSION_MASK: u64 = (1 << VERSION_BITS) - 1;

impl ResourceHandle {
    /// Packs `(index, kind, version)` into a single handle. `index` and
    /// `version` are truncated to their field width if they overflow.
    #[must_use]
    pub const fn new(index: u32, kind: ResourceKind, version: u16) -> Self {
        let index = (index as u64) & INDEX_MASK;
        let ty = (kind.to_bits() as u64) & TYPE_MASK;
        let version = (version as u64) & VERSION_MASK;
        Self((index << (TYPE_BITS + VERSION_BITS)) | (ty << VERSION_BITS) | version)
    }

    #[must_use]
    pub const fn index(self) -> u32 {
        ((self.0 >> (TYPE_BITS + VERSION_BITS)) & INDEX_MASK) as u32
    }

    #[must_use]
    pub const fn kind(self) -> ResourceKind {
        ResourceKind::from_bits(((self.0 >> VERSION_BITS) & TYPE_MASK) as u8)
    }

    #[must_use]
    pub const fn version(self) -> u16 {
        (self.0 & VERSION_MASK) as u16
    }

    /// Returns a handle identical to `self` but with `version` incremented,
    /// used when a resource is rewritten within the same frame (e.g. a
    /// ping-pong post-process target).
    #[must_use]
    pub const fn next_version(self) -> Self {
        Self::new(self.index(), self.kind(), self.version().wrapping_add(1))
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_index_kind_version() {
        let h = ResourceHandle::new(12345, ResourceKind::Buffer, 42);
        assert_eq!(h.index(), 12345);
        assert_eq!(h.kind(), ResourceKind::Buffer);
        assert_eq!(h.version(), 42);
    }

    #[test]
    fn round_trips_over_a_grid_of_values() {
        for index in [0u32, 1, 255, 1000, (1 << 24) - 1] {
            for kind in [ResourceKind::Image, ResourceKind::Buffer] {
                for version in [0u16, 1, 1000, u16::MAX] {
                    let h = ResourceHandle::new(index, kind, version);
                    assert_eq!(h.index(), index);
                    assert_eq!(h.kind(), kind);
                    assert_eq!(h.version(), version);
                }
            }
        }
    }

    #[test]
    fn next_version_increments_only_version() {
        let h = ResourceHandle::new(5, ResourceKind::Image, 3);
        let h2 = h.next_version();
        assert_eq!(h2.index(), 5);
        assert_eq!(h2.kind(), ResourceKind::Image);
        assert_eq!(h2.version(), 4);
    }

    #[test]
    fn distinct_triples_yield_distinct_handles() {
        let a = ResourceHandle::new(1, ResourceKind::Image, 0);
        let b = ResourceHandle::new(1, ResourceKind::Buffer, 0);
        let c = ResourceHandle::new(1, ResourceKind::Image, 1);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(b, c);
    }
}
