//! Content hashing for cache keys.
//!
//! A compiled renderer depends on the template text, the input type, the
//! accumulator kind and the compiler settings that change the generated
//! unit. The memory cache keys on exactly that; the disk cache additionally
//! folds in the schema and function fingerprints so artifacts built against
//! other registrations are never reused.

use std::fmt;
use std::hash::{Hash, Hasher};

use fpath_lower::ResolutionPolicy;
use rustc_hash::FxHasher;

/// A 64-bit content hash, printed as 16 hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash(u64);

impl ContentHash {
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    pub fn from_hex(s: &str) -> Option<Self> {
        u64::from_str_radix(s, 16).ok().map(Self)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

pub fn hash_str(s: &str) -> ContentHash {
    let mut hasher = FxHasher::default();
    s.hash(&mut hasher);
    ContentHash(hasher.finish())
}

/// Combine hashes in order.
pub fn combine_hashes(hashes: &[ContentHash]) -> ContentHash {
    let mut state = FxHasher::default();
    for hash in hashes {
        hash.0.hash(&mut state);
    }
    ContentHash(state.finish())
}

/// Everything that identifies one compiled renderer.
#[derive(Debug, Clone, Copy)]
pub struct KeyParts<'a> {
    pub template: &'a str,
    pub input: &'a str,
    pub accumulator: &'a str,
    pub policy: ResolutionPolicy,
    pub optimize: bool,
    pub max_depth: usize,
}

impl KeyParts<'_> {
    pub fn hash(&self) -> ContentHash {
        let mut hasher = FxHasher::default();
        self.template.hash(&mut hasher);
        self.input.hash(&mut hasher);
        self.accumulator.hash(&mut hasher);
        self.policy.hash(&mut hasher);
        self.optimize.hash(&mut hasher);
        self.max_depth.hash(&mut hasher);
        ContentHash(hasher.finish())
    }
}
