//! Request-scoped inputs to authorization.
//!
//! Identity and request context are always passed explicitly into each
//! evaluation; nothing here is process-wide.

pub mod request;

pub use request::{GraphRequest, Identity, RequestArguments};
