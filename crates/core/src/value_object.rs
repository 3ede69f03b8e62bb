//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value** — two amounts
/// of `100.00` are the same amount regardless of where they came from.
/// Identity does not apply; to "modify" one, build a new one.
///
/// The bounds keep value objects cheap to copy, comparable by their
/// attributes, and debuggable:
///
/// ```ignore
/// // Money { minor: 10_000 } is a value object;
/// // Account { id: AccountId(..), .. } is an entity.
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
