//! Interned identifiers.
//!
//! Every subject, relation, object, operator and rule name is interned once
//! per session and addressed by a stable `Atom` index. Interning is
//! append-only: an atom never changes its index for the lifetime of the
//! session, which keeps facts, rules and journal entries cheap to copy.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Opaque interned identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Atom(pub u32);

impl std::fmt::Display for Atom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Session-scoped string interner.
///
/// `intern` is idempotent: the same token always yields the same `Atom`.
/// Lookups by atom are infallible for atoms produced by this interner.
#[derive(Debug, Default, Clone)]
pub struct Interner {
    names: Vec<String>,
    index: hashbrown::HashMap<String, Atom>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a token, allocating an atom on first sight.
    ///
    /// Empty tokens are rejected — an identifier is a non-empty token.
    pub fn intern(&mut self, name: &str) -> Result<Atom> {
        if name.is_empty() {
            return Err(Error::Parse {
                message: "empty identifier".into(),
                location: None,
            });
        }
        if let Some(&atom) = self.index.get(name) {
            return Ok(atom);
        }
        let atom = Atom(self.names.len() as u32);
        self.names.push(name.to_owned());
        self.index.insert(name.to_owned(), atom);
        Ok(atom)
    }

    /// Look up an already-interned token without allocating.
    pub fn get(&self, name: &str) -> Option<Atom> {
        self.index.get(name).copied()
    }

    /// Resolve an atom back to its token.
    pub fn name(&self, atom: Atom) -> &str {
        &self.names[atom.0 as usize]
    }

    /// Number of interned atoms.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// All atoms in interning order.
    pub fn atoms(&self) -> impl Iterator<Item = Atom> + '_ {
        (0..self.names.len() as u32).map(Atom)
    }
}
