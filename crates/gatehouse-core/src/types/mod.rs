//! Shared domain types.

pub mod policy_rule;
pub mod response;
pub mod subject;

pub use policy_rule::PolicyRule;
pub use response::RestResponse;
pub use subject::Subject;
