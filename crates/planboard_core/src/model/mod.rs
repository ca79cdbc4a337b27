//! Domain model for the project-management graph.
//!
//! # Responsibility
//! - Define the entities referenced by permission checks.
//! - Define membership mutation values and the mutation response envelope.
//!
//! # Invariants
//! - Every domain object is identified by a stable `EntityId`.
//! - Permission checks only reference entities by id; they never own them.

pub mod entity;
pub mod member;
