//! Interned identifiers with O(1) equality and cloning.

use lasso::ThreadedRodeo;
use serde::{Deserialize, Serialize};

/// An interned name: a `u32` index into a session-wide string interner.
///
/// Wire names, cell names, and module names are all `Ident`s. Ordering
/// compares the raw indices, which is stable within one session but
/// carries no lexicographic meaning; code that needs name order must
/// resolve through the [`Interner`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Ident(u32);

impl Ident {
    /// Creates an `Ident` from a raw index. Intended for deserialization
    /// and tests; normal code goes through [`Interner::intern`].
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

// SAFETY: `Ident` wraps a `u32`, which always fits in `usize` on the
// platforms Vela supports. `try_from_usize` rejects values over `u32::MAX`.
unsafe impl lasso::Key for Ident {
    fn into_usize(self) -> usize {
        self.0 as usize
    }

    fn try_from_usize(int: usize) -> Option<Self> {
        u32::try_from(int).ok().map(Ident)
    }
}

/// Thread-safe string interner backed by [`lasso::ThreadedRodeo`].
///
/// One interner lives for the duration of a toolchain invocation; every
/// name in every design is interned through it.
pub struct Interner {
    rodeo: ThreadedRodeo<Ident>,
}

impl Interner {
    /// Creates an empty interner.
    pub fn new() -> Self {
        Self {
            rodeo: ThreadedRodeo::new(),
        }
    }

    /// Interns `s`, returning its [`Ident`]. Repeated calls with the same
    /// string return the same identifier.
    pub fn intern(&self, s: &str) -> Ident {
        self.rodeo.get_or_intern(s)
    }

    /// Looks up an already-interned string without allocating.
    pub fn get(&self, s: &str) -> Option<Ident> {
        self.rodeo.get(s)
    }

    /// Resolves an [`Ident`] back to its string.
    ///
    /// # Panics
    ///
    /// Panics if `ident` was not produced by this interner.
    pub fn resolve(&self, ident: Ident) -> &str {
        self.rodeo.resolve(&ident)
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}
