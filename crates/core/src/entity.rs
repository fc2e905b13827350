//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// A panel is the canonical entity here: every snapshot received for it
/// carries the same identifier, even though the snapshot contents change.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
