/// Admin service for competition setup and operation.
pub mod admin_service;
/// Session token issuance and lookup.
pub mod auth_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Public service for read-only competition views.
pub mod public_service;
/// HTML export of the final ranking.
pub mod report;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Storage connection supervisor and state restoration.
pub mod storage_supervisor;
