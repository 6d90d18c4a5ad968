//! Error types for `cmk-client`.
//!
//! Failures are split the way callers have to react to them: access errors
//! carry a closed set of reasons and route the user to a restricted-access
//! view, HTTP errors keep the raw backend payload for support diagnostics,
//! and workflow errors always mean "do not perform the gated mutation".

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Message shown instead of the caller's text when the backend reports an
/// internal error.
pub const GENERIC_ERROR_MESSAGE: &str =
    "Something went wrong. Contact support and include the details below.";

/// Reason a request was refused by the access layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessErrorCode {
    /// The user holds more than one role in the tenant.
    MultipleRolesNotAllowed,
    /// The user has no role in the tenant.
    NoTenantAccess,
    /// The session could not be (re-)established.
    AuthenticationFailed,
    /// Generic refusal.
    Forbidden,
}

impl AccessErrorCode {
    /// Wire name, also used as the `errorCode` query value of the
    /// restricted-access route.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MultipleRolesNotAllowed => "MULTIPLE_ROLES_NOT_ALLOWED",
            Self::NoTenantAccess => "NO_TENANT_ACCESS",
            Self::AuthenticationFailed => "AUTHENTICATION_FAILED",
            Self::Forbidden => "FORBIDDEN",
        }
    }

    /// Map a backend error code onto a known reason.
    ///
    /// Returns `None` for codes outside the closed set.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "MULTIPLE_ROLES_NOT_ALLOWED" => Some(Self::MultipleRolesNotAllowed),
            "NO_TENANT_ACCESS" => Some(Self::NoTenantAccess),
            "AUTHENTICATION_FAILED" => Some(Self::AuthenticationFailed),
            "FORBIDDEN" => Some(Self::Forbidden),
            _ => None,
        }
    }

    /// User-facing explanation for the restricted-access view.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::MultipleRolesNotAllowed => {
                "Permission denied: your user is assigned more than one role in this tenant."
            }
            Self::NoTenantAccess => "Permission denied: your user has no role in this tenant.",
            Self::AuthenticationFailed => {
                "Authentication failed. Sign in again to continue."
            }
            Self::Forbidden => "You are not allowed to access this resource.",
        }
    }

    /// Whether the restricted-access view should offer a new login.
    #[must_use]
    pub const fn allows_login_retry(self) -> bool {
        matches!(self, Self::AuthenticationFailed)
    }

    /// Restricted-access route for a tenant, e.g.
    /// `/tenant1/forbidden?errorCode=NO_TENANT_ACCESS`.
    #[must_use]
    pub fn forbidden_route(self, tenant_id: &str) -> String {
        format!("/{tenant_id}/forbidden?errorCode={}", self.as_str())
    }
}

impl fmt::Display for AccessErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed access error (401/403 classified into a known reason).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct AccessError {
    code: AccessErrorCode,
    message: String,
}

impl AccessError {
    #[must_use]
    pub fn new(code: AccessErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn code(&self) -> AccessErrorCode {
        self.code
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A non-success response the client could not classify any further.
///
/// `Display` renders the diagnostic JSON document
/// `{"error": {"data", "status", "statusText"}, "status", "message"}` so the
/// backend code sits at `error.data.error.code`.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpError {
    status: u16,
    status_text: String,
    payload: Value,
}

impl HttpError {
    #[must_use]
    pub fn new(status: u16, status_text: impl Into<String>, payload: Value) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            payload,
        }
    }

    /// HTTP status code of the response.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Canonical reason phrase of the status code (`"Conflict"` for 409),
    /// or the numeric code for statuses without one. The server's own
    /// reason phrase is not available through the HTTP stack.
    #[must_use]
    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// Raw response body (JSON when parseable, otherwise a string).
    #[must_use]
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// The diagnostic document `Display` serializes.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "error": {
                "data": self.payload,
                "status": self.status,
                "statusText": self.status_text,
            },
            "status": self.status,
            "message": self.status_text,
        })
    }

    fn backend_error(&self) -> Option<&Value> {
        self.payload.get("error")
    }

    fn backend_str(&self, field: &str) -> Option<&str> {
        self.backend_error()?.get(field)?.as_str()
    }

    /// Machine-readable code reported by the backend.
    #[must_use]
    pub fn error_code(&self) -> Option<&str> {
        self.backend_str("code")
    }

    /// Backend request id used for support correlation.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.backend_str("requestID")
    }

    /// Detail message reported by the backend.
    #[must_use]
    pub fn data_message(&self) -> Option<&str> {
        self.backend_str("message")
    }

    /// `error.context.reason` reported by the backend.
    #[must_use]
    pub fn context_reason(&self) -> Option<&str> {
        self.backend_error()?.get("context")?.get("reason")?.as_str()
    }

    /// Status the backend reports inside its error body, falling back to the
    /// HTTP status.
    #[must_use]
    pub fn backend_status(&self) -> u16 {
        self.backend_error()
            .and_then(|e| e.get("status"))
            .and_then(Value::as_u64)
            .and_then(|s| u16::try_from(s).ok())
            .unwrap_or(self.status)
    }

    /// Build the support record shown to the user, stamped now.
    #[must_use]
    pub fn report(&self, user_message: &str) -> ErrorReport {
        self.report_at(user_message, Utc::now())
    }

    /// Build the support record shown to the user with an explicit timestamp.
    #[must_use]
    pub fn report_at(&self, user_message: &str, at: DateTime<Utc>) -> ErrorReport {
        let message = if self.backend_status() == 500 || user_message.is_empty() {
            GENERIC_ERROR_MESSAGE.to_owned()
        } else {
            user_message.to_owned()
        };
        ErrorReport {
            message,
            request_id: self.request_id().unwrap_or_default().to_owned(),
            timestamp: at.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl std::error::Error for HttpError {}

/// What a user sees for a failed backend call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    /// Human-readable message; never the raw backend payload.
    pub message: String,
    /// Backend request id (empty when the backend sent none).
    #[serde(rename = "requestID")]
    pub request_id: String,
    /// UTC timestamp, second precision.
    pub timestamp: String,
}

/// Login redirect could not be started.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("login initiation failed: {reason}")]
pub struct LoginError {
    pub reason: String,
}

/// All errors the API client can return.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The client was built from an unusable configuration.
    #[error("cmk config error: {0}")]
    Config(String),

    /// The request was refused for a known access reason.
    #[error("cmk access error: {0}")]
    Access(#[from] AccessError),

    /// The backend returned an error status; the message is the JSON
    /// diagnostic document.
    #[error("{0}")]
    Http(HttpError),

    /// Network or HTTP client error (no response received).
    #[error("cmk network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Request or response body could not be (de)serialized.
    #[error("cmk json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    /// Access reason, if this is a typed access error.
    #[must_use]
    pub fn access_code(&self) -> Option<AccessErrorCode> {
        match self {
            Self::Access(e) => Some(e.code()),
            _ => None,
        }
    }

    /// Underlying HTTP error, if the backend answered with a failure status.
    #[must_use]
    pub fn http(&self) -> Option<&HttpError> {
        match self {
            Self::Http(e) => Some(e),
            _ => None,
        }
    }
}

/// Errors from the workflow gate. Any of them means the gated mutation must
/// not run.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// A workflow call succeeded without a usable body, or the session was
    /// being re-established.
    #[error("workflow request returned no response")]
    NoResponse,

    /// The underlying API call failed.
    #[error("workflow request failed: {0}")]
    Api(#[from] ApiError),
}

/// Errors while loading client configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A config file could not be read.
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A config document is malformed.
    #[error("invalid config '{origin}': {reason}")]
    Parse { origin: String, reason: String },

    /// `config.json` could not be fetched.
    #[error("failed to fetch config from '{url}': {reason}")]
    Fetch { url: String, reason: String },

    /// The API base URL is not an absolute http(s) URL.
    #[error("invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}
