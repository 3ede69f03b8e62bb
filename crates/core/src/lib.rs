//! `tillbooks-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! strongly-typed identifiers, the fixed-point [`Money`] value object, and the
//! small entity/value-object traits shared by the ledger modules.

pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod value_object;

pub use entity::Entity;
pub use error::{CoreError, CoreResult};
pub use id::{AccountId, BranchId, JournalEntryId, OrganizationId, UserId};
pub use money::Money;
pub use value_object::ValueObject;
