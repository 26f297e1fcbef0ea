//! HTTP API for tutorhub.
//!
//! Every endpoint is a `POST` taking a JSON body (multipart for uploads)
//! and answering with an [`ApiResponse`] envelope. The caller is resolved
//! from the `Authorization: Bearer` header by [`middleware::auth_middleware`].

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::AppState;
pub use response::ApiResponse;
