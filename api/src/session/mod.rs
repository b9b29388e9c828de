// Session management on top of the hosted auth service
// The service owns sessions; this layer only mirrors them per request

pub mod forms;
pub mod gotrue;
pub mod manager;

pub use forms::{Credentials, FormError, LoginForm, RegisterForm};
pub use gotrue::GoTrueClient;
pub use manager::{spawn_session_audit, AuthSubscription, SessionManager};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub user: AuthUser,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SignUpOutcome {
    /// The account exists but the email address still has to be confirmed
    VerificationPending { email: String },
    /// Auto-confirmed accounts get a session straight away
    SignedIn(Session),
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// The auth service refused the request; the message is shown to the user as-is
    #[error("{0}")]
    Rejected(String),
    #[error("Auth service unreachable: {0}")]
    Transport(String),
    #[error("Unexpected auth service response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEventKind {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthEvent {
    pub kind: AuthEventKind,
    pub user_id: Option<Uuid>,
    pub email: Option<String>,
    pub at: DateTime<Utc>,
}

impl AuthEvent {
    pub fn new(kind: AuthEventKind, user: Option<&AuthUser>) -> Self {
        Self {
            kind,
            user_id: user.map(|u| u.id),
            email: user.and_then(|u| u.email.clone()),
            at: Utc::now(),
        }
    }
}

/// Session as seen by one request. Handlers receive it explicitly; nothing
/// reads session state from ambient globals.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionContext {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<AuthUser>,
    #[serde(skip)]
    pub access_token: Option<String>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(user: AuthUser, access_token: String) -> Self {
        Self {
            authenticated: true,
            user: Some(user),
            access_token: Some(access_token),
        }
    }

    pub fn email(&self) -> Option<&str> {
        self.user.as_ref().and_then(|u| u.email.as_deref())
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.user.as_ref().map(|u| u.id)
    }
}

/// Operations of the hosted auth service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;

    async fn refresh(&self, refresh_token: &str) -> Result<Session, AuthError>;

    /// `Ok(None)` when the token is unknown or expired
    async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>, AuthError>;

    async fn verify_email(&self, email: &str, token: &str) -> Result<Session, AuthError>;
}
