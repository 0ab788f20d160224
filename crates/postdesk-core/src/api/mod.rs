//! REST API module for the admin backend.
//!
//! - `ApiClient`: the transport; injects the bearer token and classifies
//!   failures (network, 401, 403, 422, 5xx) in one place
//! - `BlogGateway`, `CategoryGateway`, `AuthorGateway`: stateless request
//!   builders per resource, wrapping failures in a `GatewayError`
//!
//! A 401 from any call signs the session out before the error surfaces.

pub mod authors;
pub mod blogs;
pub mod categories;
pub mod client;
pub mod error;

pub use authors::AuthorGateway;
pub use blogs::BlogGateway;
pub use categories::CategoryGateway;
pub use client::{ApiClient, Request, DEFAULT_REQUEST_TIMEOUT_SECS};
pub use error::{classify_status, ApiError, ErrorKind, FieldErrors, GatewayError};
