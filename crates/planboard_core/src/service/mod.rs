//! Mutation use-case services.
//!
//! # Responsibility
//! - Turn authorized graph mutations into repository calls.
//! - Keep the query engine decoupled from storage details.

pub mod membership_service;
