use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::sync::Arc;

use thiserror::Error;

use crate::utils::truncate_string;

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Fallback message when a 422 response carries no readable message.
const DEFAULT_VALIDATION_MESSAGE: &str = "Invalid data provided";

/// Field name to the messages reported against it.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Coarse failure category callers can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Network,
    Authentication,
    Authorization,
    Validation,
    Server,
    UnexpectedStatus,
    InvalidResponse,
    InvalidRequest,
}

/// Ordered status classification table. First matching range wins; statuses
/// matching no row pass through to the caller untouched.
const STATUS_CLASSIFICATION: &[(RangeInclusive<u16>, ErrorKind)] = &[
    (401..=401, ErrorKind::Authentication),
    (403..=403, ErrorKind::Authorization),
    (422..=422, ErrorKind::Validation),
    (500..=u16::MAX, ErrorKind::Server),
];

/// Classify an HTTP status code. `None` means the response is not an error
/// at the transport level.
pub fn classify_status(status: u16) -> Option<ErrorKind> {
    STATUS_CLASSIFICATION
        .iter()
        .find(|(range, _)| range.contains(&status))
        .map(|(_, kind)| *kind)
}

#[derive(Error, Debug, Clone)]
pub enum ApiError {
    #[error("Network error. Check your connection and try again")]
    Network(#[source] Arc<reqwest::Error>),

    #[error("Your session has expired. Please log in again")]
    Authentication,

    #[error("You do not have permission to perform this action")]
    Authorization,

    #[error("{message}")]
    Validation { message: String, fields: FieldErrors },

    #[error("An unexpected server error occurred (status {status})")]
    Server { status: u16, body: String },

    #[error("Unexpected response status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        truncate_string(body, MAX_ERROR_BODY_LENGTH)
    }

    /// Build the error for a status the classification table matched.
    pub fn from_classified(kind: ErrorKind, status: u16, body: &str) -> Self {
        match kind {
            ErrorKind::Authentication => ApiError::Authentication,
            ErrorKind::Authorization => ApiError::Authorization,
            ErrorKind::Validation => Self::from_validation_body(body),
            ErrorKind::Server => ApiError::Server {
                status,
                body: Self::truncate_body(body),
            },
            _ => Self::unexpected_status(status, body),
        }
    }

    pub fn unexpected_status(status: u16, body: &str) -> Self {
        ApiError::UnexpectedStatus {
            status,
            body: Self::truncate_body(body),
        }
    }

    /// Parse server-supplied field detail out of a 422 body.
    ///
    /// Accepts `{"message": "...", "errors": {"field": "msg" | ["msg", ...]}}`;
    /// anything unparseable yields a generic message with no fields.
    fn from_validation_body(body: &str) -> Self {
        let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();

        let message = parsed
            .as_ref()
            .and_then(|v| v.get("message"))
            .and_then(|m| m.as_str())
            .unwrap_or(DEFAULT_VALIDATION_MESSAGE)
            .to_string();

        let mut fields = FieldErrors::new();
        if let Some(errors) = parsed
            .as_ref()
            .and_then(|v| v.get("errors"))
            .and_then(|e| e.as_object())
        {
            for (field, detail) in errors {
                let messages: Vec<String> = match detail {
                    serde_json::Value::String(s) => vec![s.clone()],
                    serde_json::Value::Array(items) => items
                        .iter()
                        .filter_map(|i| i.as_str().map(str::to_string))
                        .collect(),
                    other => vec![other.to_string()],
                };
                fields.insert(field.clone(), messages);
            }
        }

        ApiError::Validation { message, fields }
    }

    /// A local validation failure against a single field.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut fields = FieldErrors::new();
        fields.insert(field.into(), vec![message.clone()]);
        ApiError::Validation { message, fields }
    }

    /// A local validation failure across one or more fields. The message
    /// joins every field message so it can be shown verbatim.
    pub fn from_fields(fields: FieldErrors) -> Self {
        let message = fields
            .values()
            .flatten()
            .cloned()
            .collect::<Vec<_>>()
            .join("; ");
        let message = if message.is_empty() {
            DEFAULT_VALIDATION_MESSAGE.to_string()
        } else {
            message
        };
        ApiError::Validation { message, fields }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Network(_) => ErrorKind::Network,
            ApiError::Authentication => ErrorKind::Authentication,
            ApiError::Authorization => ErrorKind::Authorization,
            ApiError::Validation { .. } => ErrorKind::Validation,
            ApiError::Server { .. } => ErrorKind::Server,
            ApiError::UnexpectedStatus { .. } => ErrorKind::UnexpectedStatus,
            ApiError::InvalidResponse(_) => ErrorKind::InvalidResponse,
            ApiError::InvalidRequest(_) => ErrorKind::InvalidRequest,
        }
    }

    /// Field-level detail for validation failures.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            ApiError::Validation { fields, .. } => Some(fields),
            _ => None,
        }
    }

    /// Transient failures a user may reasonably retry by hand.
    pub fn is_transient(&self) -> bool {
        matches!(self.kind(), ErrorKind::Network | ErrorKind::Server)
    }
}

/// A gateway failure: a domain message ("Failed to create blog") wrapping the
/// classified transport error.
#[derive(Error, Debug, Clone)]
#[error("{context}: {source}")]
pub struct GatewayError {
    context: &'static str,
    source: ApiError,
}

impl GatewayError {
    pub fn new(context: &'static str, source: ApiError) -> Self {
        Self { context, source }
    }

    /// Classification of the underlying transport error.
    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }

    pub fn context(&self) -> &'static str {
        self.context
    }

    pub fn api_error(&self) -> &ApiError {
        &self.source
    }

    pub fn into_api_error(self) -> ApiError {
        self.source
    }
}
