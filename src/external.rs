//! External Interfaces
//!
//! The host (window/canvas, input, config persistence, ECS, asset loaders,
//! dev tooling) is out of scope for this core (spec §1) and is reached only
//! through the narrow seams below. Production hosts provide their own
//! implementations; the `Memory*` types here are in-process stand-ins
//! usable in tests and headless embeddings.

use rustc_hash::FxHashMap;

use crate::name::Name;

/// Per-scene pass ordering persistence (spec §6: "two maps per scene ID,
/// `default` and `custom`, each an ordered list of pass names ... keys
/// `rg.pass_order.default`, `rg.pass_order.custom`"). The render graph
/// consults `custom_order` first, falling back to `default_order`.
pub trait PassOrderStore {
    fn default_order(&self, scene_id: u64) -> Option<&[Name]>;
    fn custom_order(&self, scene_id: u64) -> Option<&[Name]>;
    fn set_custom_order(&mut self, scene_id: u64, order: Vec<Name>);
}

/// An in-memory [`PassOrderStore`], standing in for a host-backed
/// `renderer.config` key/value store.
#[derive(Default)]
pub struct MemoryPassOrderStore {
    default_orders: FxHashMap<u64, Vec<Name>>,
    custom_orders: FxHashMap<u64, Vec<Name>>,
}

impl MemoryPassOrderStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_default_order(&mut self, scene_id: u64, order: Vec<Name>) {
        self.default_orders.insert(scene_id, order);
    }
}

impl PassOrderStore for MemoryPassOrderStore {
    fn default_order(&self, scene_id: u64) -> Option<&[Name]> {
        self.default_orders.get(&scene_id).map(Vec::as_slice)
    }

    fn custom_order(&self, scene_id: u64) -> Option<&[Name]> {
        self.custom_orders.get(&scene_id).map(Vec::as_slice)
    }

    fn set_custom_order(&mut self, scene_id: u64, order: Vec<Name>) {
        self.custom_orders.insert(scene_id, order);
    }
}

/// An opaque view into the host's ECS fragment storage: a flat byte slice
/// plus a fixed row stride, consumed by mesh-task submission and culling
/// passes without this core knowing the ECS's actual layout (spec §1:
/// "the ECS fragment storage (consumed as opaque 'entity-data buffers')").
pub struct EntityDataBuffer<'a> {
    pub bytes: &'a [u8],
    pub row_stride: u32,
}

impl<'a> EntityDataBuffer<'a> {
    #[must_use]
    pub fn new(bytes: &'a [u8], row_stride: u32) -> Self {
        Self { bytes, row_stride }
    }

    #[must_use]
    pub fn row_count(&self) -> u32 {
        if self.row_stride == 0 {
            0
        } else {
            (self.bytes.len() as u32) / self.row_stride
        }
    }

    #[must_use]
    pub fn row(&self, index: u32) -> Option<&'a [u8]> {
        let start = (index * self.row_stride) as usize;
        let end = start + self.row_stride as usize;
        self.bytes.get(start..end)
    }
}

/// Window/canvas host seam: the core only needs a swapchain size and a way
/// to know a resolution change happened (spec §4.9: "re-materialization on
/// resolution change is signalled by a global `resolution_change` event").
pub trait HostSurface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn half_float_supported(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_order_falls_back_to_none_when_unset() {
        let store = MemoryPassOrderStore::new();
        assert!(store.custom_order(1).is_none());
    }

    #[test]
    fn set_custom_order_is_readable_back() {
        let mut store = MemoryPassOrderStore::new();
        let order = vec![Name::new("a"), Name::new("b")];
        store.set_custom_order(7, order.clone());
        assert_eq!(store.custom_order(7), Some(order.as_slice()));
    }

    #[test]
    fn entity_data_buffer_rows_are_sliced_by_stride() {
        let bytes = [1u8, 2, 3, 4, 5, 6];
        let buf = EntityDataBuffer::new(&bytes, 2);
        assert_eq!(buf.row_count(), 3);
        assert_eq!(buf.row(1), Some(&[3u8, 4][..]));
        assert_eq!(buf.row(3), None);
    }
}
