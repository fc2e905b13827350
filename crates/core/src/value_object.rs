//! Value object trait: equality by value, not identity.
//!
//! Value objects are domain objects that have **no identity** - they are defined entirely
//! by their attribute values. Two value objects with the same values are considered equal.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. A normalised
/// confidence score or a classification result is a value object: two results
/// derived from the same snapshot are interchangeable, and neither is ever stored
/// or looked up by key.
///
/// ## Value Object vs Entity
///
/// - **Value Object**: No identity (two value objects with same values are equal)
/// - **Entity**: Has identity (two entities with same ID are the same entity)
///
/// Example:
/// - `Confidence(0.92)` is a value object
/// - `PanelSnapshot { panel_id: "P-1", .. }` is an entity
///
/// The trait requires `Clone`, `PartialEq` and `Debug`.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
