//! OpenAPI document for the `/docs` RapiDoc surface (spec.md §1: the Swagger
//! surface is a collaborator interface, not part of the pipeline's core).

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(description = "Asynchronous file-ingestion and transformation service"),
    components(schemas(crate::handlers::upload::SignedUrlResponse, crate::error::ErrorResponse)),
    tags((name = "upload", description = "Upload dispatch, reads, and deletes"))
)]
pub struct ApiDoc;

pub fn get_openapi_spec() -> serde_json::Value {
    serde_json::to_value(ApiDoc::openapi()).unwrap_or_default()
}
