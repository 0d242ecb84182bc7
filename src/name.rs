//! Stable hashed cache keys.
//!
//! A [`Name`] is a 64-bit `xxh3` hash of a string, used everywhere in the
//! core as a stable key: [`crate::cache::ResourceCache`] entries, graph
//! handle materialization, pass names, bind-group cache keys. Equal strings
//! hash equally; collisions are assumed not to occur in production (xxh3-64
//! gives a wide enough codomain for engine-scale name counts).

use std::fmt;

/// A hashed, `Copy`, totally-ordered stable identifier for a string.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name(u64);

impl Name {
    /// Hashes `s` into a `Name`. Two calls with equal `s` always produce
    /// equal `Name`s.
    #[must_use]
    pub fn new(s: &str) -> Self {
        Self(xxhash_rust::xxh3::xxh3_64(s.as_bytes()))
    }

    /// Builds a `Name` directly from a precomputed hash, e.g. when the
    /// caller already interned or cached the hash elsewhere.
    #[must_use]
    pub const fn from_raw(hash: u64) -> Self {
        Self(hash)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({:#018x})", self.0)
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Name {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}
