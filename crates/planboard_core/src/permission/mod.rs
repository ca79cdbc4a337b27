//! Declarative field authorization.
//!
//! # Responsibility
//! - Define permission predicates and their evaluation rules.
//! - Combine predicates into per-field policies.
//! - Guard graph field resolution, failing closed.
//!
//! # Invariants
//! - Authorization is opt-in: a field without a policy is denied.
//! - Denial never reveals which predicate failed.

pub mod error;
pub mod evaluator;
pub mod policy;
pub mod registry;
pub mod variant;
