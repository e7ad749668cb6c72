//! Request and response bodies.

pub mod request;
pub mod response;

pub use request::LoginForm;
pub use response::HealthReport;
