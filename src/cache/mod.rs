//! Resource Cache
//!
//! A process-wide keyed store for GPU objects, grouped by category. This is
//! the only component that exclusively owns physical GPU objects (spec §3,
//! "Ownership"); every other wrapper (`Buffer`, `Texture`, `PipelineState`,
//! `BindGroup`, ...) stores only a [`crate::name::Name`] of its referents and
//! fetches from here on use — this is how the core breaks the cyclic
//! material/bind-group/pipeline/shader references (spec §9).
//!
//! `remove` never destroys the underlying object; destruction is the
//! caller's responsibility (typically via [`crate::queue::DeletionQueue`]).

use rustc_hash::FxHashMap;

use crate::name::Name;

/// The categories of GPU object the cache stores, one map per category.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Category {
    Shader,
    Pipeline,
    Pass,
    BindGroup,
    BindGroupLayout,
    Buffer,
    Image,
    Sampler,
    Mesh,
    Material,
}

const CATEGORY_COUNT: usize = 10;

impl Category {
    const fn index(self) -> usize {
        match self {
            Category::Shader => 0,
            Category::Pipeline => 1,
            Category::Pass => 2,
            Category::BindGroup => 3,
            Category::BindGroupLayout => 4,
            Category::Buffer => 5,
            Category::Image => 6,
            Category::Sampler => 7,
            Category::Mesh => 8,
            Category::Material => 9,
        }
    }
}

/// A process-wide keyed store for GPU objects of type `T`, grouped by
/// [`Category`]. Most consumers use the type-erased `Any`-boxed variant
/// ([`ResourceCache`]); this generic map is the building block.
struct CategoryMap<T> {
    maps: [FxHashMap<Name, T>; CATEGORY_COUNT],
}

impl<T> Default for CategoryMap<T> {
    fn default() -> Self {
        Self {
            maps: Default::default(),
        }
    }
}

impl<T> CategoryMap<T> {
    fn map(&self, category: Category) -> &FxHashMap<Name, T> {
        &self.maps[category.index()]
    }

    fn map_mut(&mut self, category: Category) -> &mut FxHashMap<Name, T> {
        &mut self.maps[category.index()]
    }
}

/// Keyed lookup/store/remove of GPU objects, grouped by [`Category`].
///
/// `T` is typically a small `enum` of Arc/Rc-wrapped GPU object handles so a
/// single cache instance can hold every category; see [`crate::gpu`] for the
/// concrete wrappers this backs.
pub struct ResourceCache<T> {
    entries: CategoryMap<T>,
}

impl<T> Default for ResourceCache<T> {
    fn default() -> Self {
        Self {
            entries: CategoryMap::default(),
        }
    }
}

impl<T> ResourceCache<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// O(1) average lookup. Returns `None` on a miss — a miss is not an
    /// error at this layer (spec §7).
    #[must_use]
    pub fn fetch(&self, category: Category, name: Name) -> Option<&T> {
        self.entries.map(category).get(&name)
    }

    pub fn fetch_mut(&mut self, category: Category, name: Name) -> Option<&mut T> {
        self.entries.map_mut(category).get_mut(&name)
    }

    /// Inserts or overwrites an entry. Overwriting does not destroy the
    /// previous value implicitly; the caller must have already scheduled its
    /// destruction if that matters.
    pub fn store(&mut self, category: Category, name: Name, obj: T) -> Option<T> {
        self.entries.map_mut(category).insert(name, obj)
    }

    /// Removes and returns the entry without destroying it.
    pub fn remove(&mut self, category: Category, name: Name) -> Option<T> {
        self.entries.map_mut(category).remove(&name)
    }

    #[must_use]
    pub fn size(&self, category: Category) -> usize {
        self.entries.map(category).len()
    }

    #[must_use]
    pub fn contains(&self, category: Category, name: Name) -> bool {
        self.entries.map(category).contains_key(&name)
    }

    pub fn entry_or_insert_with(
        &mut self,
        category: Category,
        name: Name,
        make: impl FnOnce() -> T,
    ) -> &mut T {
        self.entries.map_mut(category).entry(name).or_insert_with(make)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_on_miss_returns_none() {
        let cache: ResourceCache<u32> = ResourceCache::new();
        assert!(cache.fetch(Category::Buffer, Name::new("x")).is_none());
    }

    #[test]
    fn store_then_fetch_round_trips() {
        let mut cache: ResourceCache<u32> = ResourceCache::new();
        let name = Name::new("gbuffer_albedo");
        cache.store(Category::Image, name, 7);
        assert_eq!(cache.fetch(Category::Image, name), Some(&7));
    }

    #[test]
    fn categories_are_independent() {
        let mut cache: ResourceCache<u32> = ResourceCache::new();
        let name = Name::new("shared_name");
        cache.store(Category::Buffer, name, 1);
        cache.store(Category::Image, name, 2);
        assert_eq!(cache.fetch(Category::Buffer, name), Some(&1));
        assert_eq!(cache.fetch(Category::Image, name), Some(&2));
    }

    #[test]
    fn remove_does_not_panic_and_returns_value() {
        let mut cache: ResourceCache<u32> = ResourceCache::new();
        let name = Name::new("n");
        cache.store(Category::Mesh, name, 42);
        assert_eq!(cache.remove(Category::Mesh, name), Some(42));
        assert_eq!(cache.fetch(Category::Mesh, name), None);
    }

    #[test]
    fn size_reflects_entry_count() {
        let mut cache: ResourceCache<u32> = ResourceCache::new();
        cache.store(Category::Sampler, Name::new("a"), 1);
        cache.store(Category::Sampler, Name::new("b"), 2);
        assert_eq!(cache.size(Category::Sampler), 2);
        assert_eq!(cache.size(Category::Buffer), 0);
    }
}
