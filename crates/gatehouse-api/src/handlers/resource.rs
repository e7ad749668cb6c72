//! The protected sample resource.

use axum::Json;
use tracing::debug;

use gatehouse_core::types::RestResponse;

use crate::extractors::CurrentSubject;

/// Payload returned by both resource routes.
const RESOURCE: &str = "resource";

/// GET /api/resource
pub async fn read_resource(
    CurrentSubject(subject): CurrentSubject,
) -> Json<RestResponse<&'static str>> {
    debug!(subject = %subject, "Reading resource");
    Json(RestResponse::ok("read resource successfully", RESOURCE))
}

/// POST /api/resource
pub async fn write_resource(
    CurrentSubject(subject): CurrentSubject,
) -> Json<RestResponse<&'static str>> {
    debug!(subject = %subject, "Writing resource");
    Json(RestResponse::ok("write resource successfully", RESOURCE))
}
