//! Extractor for the subject bound by the authentication gate.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use gatehouse_core::error::AppError;
use gatehouse_core::types::Subject;

use crate::error::ApiError;
use crate::middleware::authenticate::NOT_LOGGED_IN;

/// The authenticated subject of the current request.
///
/// Only available on routes behind [`crate::middleware::authenticate`];
/// elsewhere extraction fails with `401`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentSubject(pub Subject);

impl<S> FromRequestParts<S> for CurrentSubject
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Subject>()
            .cloned()
            .map(CurrentSubject)
            .ok_or_else(|| AppError::unauthenticated(NOT_LOGGED_IN).into())
    }
}
