//! Element identity and display names.
//!
//! These are two different things and must not be conflated:
//!
//! - [`ElementId`] is the stable, opaque identity of a live node. It is
//!   assigned when the node is constructed (or reconstructed from a
//!   snapshot) and is never written into serialized form.
//! - [`Name`] is the user-visible label (`"Title"`, `"login_btn"`). Names
//!   are interned for cheap comparison and *are* serialized, which makes
//!   them the fallback key when a live element must be re-located after a
//!   wholesale tree replacement.

use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global string interner for display names.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Stable, opaque, process-unique identity of a live scene element.
///
/// Monotonically assigned; identity 0 is never issued, so `ElementId`
/// values from different sessions of the same process never collide.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl ElementId {
    /// Mint a fresh identity.
    pub fn next() -> Self {
        ElementId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A lightweight, interned display name.
/// Internally a `Spur` index: 4 bytes, Copy, with O(1) equality and hashing.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Name(Spur);

impl Name {
    /// Intern a new string as a Name, or return existing if already interned.
    pub fn intern(s: &str) -> Self {
        Name(INTERNER.get_or_intern(s))
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.as_str())
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.as_str())
    }
}

impl Serialize for Name {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Name::intern(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrip() {
        let a = Name::intern("login_form");
        let b = Name::intern("login_form");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "login_form");
    }

    #[test]
    fn element_ids_are_unique() {
        let a = ElementId::next();
        let b = ElementId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn name_is_not_identity() {
        let a = ElementId::next();
        let b = ElementId::next();
        let n = Name::intern("same");
        // Two elements may share a display name yet stay distinct.
        assert_eq!(n, Name::intern("same"));
        assert_ne!(a, b);
    }
}
