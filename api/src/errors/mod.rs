/// Error handling module
///
/// Provides unified error responses
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use std::fmt;

use crate::navigation::Page;
use crate::purchase::PurchaseError;
use crate::session::{AuthError, FormError};

#[derive(Debug)]
pub enum ApiError {
    Internal {
        reason: String,
    },
    BadRequest {
        missing: Vec<String>,
        reason: Option<String>,
    },
    NotFound {
        resource: String,
    },
    ServiceUnavailable {
        details: String,
    },
    /// Missing session or rejected credentials; `redirect` names the client route to go to
    Unauthorized {
        reason: String,
        redirect: Option<String>,
    },
    /// Request not allowed in the current state of the resource
    Conflict {
        reason: String,
    },
    /// An external service could not be reached or answered garbage
    Upstream {
        service: String,
        details: String,
    },
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl ApiError {
    pub fn login_required(reason: impl Into<String>) -> Self {
        ApiError::Unauthorized {
            reason: reason.into(),
            redirect: Some(Page::Login.path()),
        }
    }

    pub fn missing_fields(missing: Vec<String>) -> Self {
        ApiError::BadRequest {
            missing,
            reason: Some("Please fill in all fields".to_string()),
        }
    }

    pub fn bad_request(reason: impl Into<String>) -> Self {
        ApiError::BadRequest {
            missing: vec![],
            reason: Some(reason.into()),
        }
    }

    pub fn database_unavailable() -> Self {
        ApiError::ServiceUnavailable {
            details: "Database not available".to_string(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Internal { reason } => write!(f, "Internal error: {}", reason),
            ApiError::BadRequest { missing, reason } => {
                write!(f, "Bad request: {:?}, {:?}", missing, reason)
            }
            ApiError::NotFound { resource } => write!(f, "Not found: {}", resource),
            ApiError::ServiceUnavailable { details } => {
                write!(f, "Service unavailable: {}", details)
            }
            ApiError::Unauthorized { reason, .. } => write!(f, "Unauthorized: {}", reason),
            ApiError::Conflict { reason } => write!(f, "Conflict: {}", reason),
            ApiError::Upstream { service, details } => {
                write!(f, "Upstream {} failed: {}", service, details)
            }
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let response = match self {
            ApiError::Internal { reason } => ErrorResponse {
                error: "Internal server error".to_string(),
                details: Some(reason.clone()),
                missing: None,
                redirect: None,
            },
            ApiError::BadRequest { missing, reason } => ErrorResponse {
                error: "Bad request".to_string(),
                details: reason.clone(),
                missing: if missing.is_empty() {
                    None
                } else {
                    Some(missing.clone())
                },
                redirect: None,
            },
            ApiError::NotFound { resource } => ErrorResponse {
                error: format!("{} not found", resource),
                details: None,
                missing: None,
                redirect: None,
            },
            ApiError::ServiceUnavailable { details } => ErrorResponse {
                error: "Service unavailable".to_string(),
                details: Some(details.clone()),
                missing: None,
                redirect: None,
            },
            ApiError::Unauthorized { reason, redirect } => ErrorResponse {
                error: "Unauthorized".to_string(),
                details: Some(reason.clone()),
                missing: None,
                redirect: redirect.clone(),
            },
            ApiError::Conflict { reason } => ErrorResponse {
                error: "Conflict".to_string(),
                details: Some(reason.clone()),
                missing: None,
                redirect: None,
            },
            ApiError::Upstream { service, details } => ErrorResponse {
                error: format!("{} service error", service),
                details: Some(details.clone()),
                missing: None,
                redirect: None,
            },
        };
        HttpResponse::build(status).json(response)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            // Surface the auth service's own message verbatim
            AuthError::Rejected(message) => ApiError::Unauthorized {
                reason: message,
                redirect: None,
            },
            AuthError::Transport(details) | AuthError::Decode(details) => ApiError::Upstream {
                service: "auth".to_string(),
                details,
            },
        }
    }
}

impl From<FormError> for ApiError {
    fn from(err: FormError) -> Self {
        match err {
            FormError::Missing(missing) => ApiError::missing_fields(missing),
            FormError::PasswordMismatch => {
                ApiError::bad_request(FormError::PasswordMismatch.to_string())
            }
        }
    }
}

impl From<PurchaseError> for ApiError {
    fn from(err: PurchaseError) -> Self {
        match err {
            PurchaseError::LoginRequired => ApiError::login_required(err.to_string()),
            PurchaseError::DialogNotFound => ApiError::NotFound {
                resource: "purchase".to_string(),
            },
            PurchaseError::ListingNotFound(_) => ApiError::NotFound {
                resource: "listing".to_string(),
            },
            PurchaseError::InvalidTransition { .. } => ApiError::Conflict {
                reason: err.to_string(),
            },
            PurchaseError::InvalidPrice(_) => ApiError::bad_request(err.to_string()),
        }
    }
}
