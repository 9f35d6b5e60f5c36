//! Vocabulary — the content-addressed name → vector registry.
//!
//! The registry is append-only and memoizing: `get_or_create` is
//! referentially transparent for the lifetime of the session. A mutex
//! guards the maps so that a multi-session host may share one registry;
//! the reference configuration is one vocabulary per session.

use std::sync::Arc;

use parking_lot::Mutex;

use super::{Codec, Vector};

/// Names with this prefix are operator/type markers, pre-registered at
/// construction.
pub const MARKER_PREFIX: &str = "__";
/// Names with this prefix are bootstrap primitives.
pub const PRIMITIVE_PREFIX: &str = "___";

/// Pre-registered operator/type markers.
pub const RESERVED_MARKERS: &[&str] = &[
    "__Entity", "__Relation", "__Type", "__Property", "__Rule", "__Default",
];

/// Pre-registered bootstrap primitives.
pub const RESERVED_PRIMITIVES: &[&str] = &[
    "___Bind", "___Unbind", "___Bundle", "___Sequence", "___Similarity",
];

struct VocabInner {
    vectors: hashbrown::HashMap<String, Vector>,
    positions: hashbrown::HashMap<usize, Vector>,
}

/// Shared name → vector registry plus the positional marker cache.
#[derive(Clone)]
pub struct Vocabulary {
    inner: Arc<Mutex<VocabInner>>,
    codec: Arc<dyn Codec>,
}

impl Vocabulary {
    pub fn new(codec: Arc<dyn Codec>) -> Self {
        let vocab = Self {
            inner: Arc::new(Mutex::new(VocabInner {
                vectors: hashbrown::HashMap::new(),
                positions: hashbrown::HashMap::new(),
            })),
            codec,
        };
        for name in RESERVED_MARKERS.iter().chain(RESERVED_PRIMITIVES) {
            vocab.get_or_create(name);
        }
        vocab
    }

    /// Return the existing vector or allocate via the codec.
    ///
    /// Idempotent and deterministic: repeated lookup returns the same vector.
    pub fn get_or_create(&self, name: &str) -> Vector {
        let mut inner = self.inner.lock();
        if let Some(v) = inner.vectors.get(name) {
            return v.clone();
        }
        let v = self.codec.new_vector(name);
        inner.vectors.insert(name.to_owned(), v.clone());
        v
    }

    /// Positional marker `Pos_k` — a memoized pure function of
    /// (strategy, geometry, k).
    pub fn position(&self, k: usize) -> Vector {
        let mut inner = self.inner.lock();
        if let Some(v) = inner.positions.get(&k) {
            return v.clone();
        }
        let v = self.codec.new_vector(&format!("__Pos{k}"));
        inner.positions.insert(k, v.clone());
        v
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.lock().vectors.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn codec(&self) -> &Arc<dyn Codec> {
        &self.codec
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hdc::{build_codec, Strategy, UnbindMode};

    fn vocab() -> Vocabulary {
        Vocabulary::new(build_codec(Strategy::DenseBinary, 2048, 0, UnbindMode::A))
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let v = vocab();
        let a = v.get_or_create("dog");
        let b = v.get_or_create("dog");
        assert_eq!(a, b);
    }

    #[test]
    fn test_reserved_names_preregistered() {
        let v = vocab();
        for name in RESERVED_MARKERS.iter().chain(RESERVED_PRIMITIVES) {
            assert!(v.contains(name), "{name} missing");
        }
    }

    #[test]
    fn test_positions_are_memoized_and_distinct() {
        let v = vocab();
        let p0 = v.position(0);
        let p1 = v.position(1);
        assert_eq!(p0, v.position(0));
        assert_ne!(p0, p1);
    }

    #[test]
    fn test_shared_registry_across_clones() {
        let v = vocab();
        let v2 = v.clone();
        let a = v.get_or_create("shared");
        assert_eq!(v2.get_or_create("shared"), a);
    }
}
