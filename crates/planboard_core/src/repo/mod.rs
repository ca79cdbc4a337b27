//! Persistence layer for the entity graph.
//!
//! # Responsibility
//! - Define the id-keyed lookup contract permission checks read through.
//! - Provide SQLite implementations for lookups and membership mutations.
//!
//! # Invariants
//! - Lookups return `Ok(None)` for unknown ids; errors are infrastructure only.
//! - Membership mutations run inside one immediate transaction.

pub mod entity_repo;
pub mod membership_repo;
