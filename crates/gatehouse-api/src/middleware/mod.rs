//! Axum middleware stack.

pub mod authenticate;
pub mod authorize;
pub mod cors;
pub mod logging;

pub use authenticate::authenticate;
pub use authorize::{RouteGuard, authorize};
