//! Concrete repository implementations.

pub mod policy_rule;
