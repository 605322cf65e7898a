//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, roles, errors)
//! - `tracking` - Namespaces, rooms, presence and fan-out rules

pub mod foundation;
pub mod tracking;
