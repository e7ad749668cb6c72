//! Custom Axum extractors.

pub mod subject;

pub use subject::CurrentSubject;
