/// Authentication routes
///
/// Login, registration, logout, session probe, token refresh and email
/// verification. Successful logins also set an HTTP-only session cookie.
use actix_web::{
    cookie::{time::Duration as CookieDuration, Cookie, SameSite},
    web, HttpResponse, Responder,
};
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::config::SessionConfig;
use crate::errors::ApiError;
use crate::navigation::Page;
use crate::session::{AuthUser, LoginForm, RegisterForm, Session, SessionContext, SignUpOutcome};

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub redirect: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<AuthUser>,
}

impl AuthResponse {
    fn redirect(page: &str) -> Self {
        Self {
            redirect: page.to_string(),
            access_token: None,
            refresh_token: None,
            expires_in: None,
            user: None,
        }
    }

    fn with_session(page: &str, session: Session) -> Self {
        Self {
            redirect: page.to_string(),
            access_token: Some(session.access_token),
            refresh_token: session.refresh_token,
            expires_in: session.expires_in,
            user: Some(session.user),
        }
    }
}

#[derive(Debug, Serialize)]
struct SessionResponse {
    authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<uuid::Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    pub email: Option<String>,
    pub token: Option<String>,
}

fn session_cookie(config: &SessionConfig, session: &Session) -> Cookie<'static> {
    let mut cookie = Cookie::build(config.cookie_name.clone(), session.access_token.clone())
        .path("/")
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(SameSite::Lax)
        .finish();
    if let Some(expires_in) = session.expires_in {
        cookie.set_max_age(CookieDuration::seconds(expires_in as i64));
    }
    cookie
}

fn removal_cookie(config: &SessionConfig) -> Cookie<'static> {
    let mut cookie = Cookie::build(config.cookie_name.clone(), "")
        .path("/")
        .http_only(true)
        .finish();
    cookie.make_removal();
    cookie
}

fn signed_in(state: &AppState, page: &str, session: Session) -> HttpResponse {
    let cookie = session_cookie(&state.session_config, &session);
    HttpResponse::Ok()
        .cookie(cookie)
        .json(AuthResponse::with_session(page, session))
}

// POST /api/auth/login
pub async fn login(
    form: web::Json<LoginForm>,
    state: web::Data<AppState>,
) -> Result<impl Responder, ApiError> {
    let credentials = form.into_inner().into_credentials()?;

    let session = state.sessions.sign_in(&credentials).await.map_err(|e| {
        tracing::warn!(error = %e, "Login failed");
        ApiError::from(e)
    })?;

    Ok(signed_in(&state, &Page::Dashboard.path(), session))
}

// POST /api/auth/register
pub async fn register(
    form: web::Json<RegisterForm>,
    state: web::Data<AppState>,
) -> Result<impl Responder, ApiError> {
    let credentials = form.into_inner().into_credentials()?;

    let outcome = state.sessions.sign_up(&credentials).await.map_err(|e| {
        tracing::warn!(error = %e, "Registration failed");
        ApiError::from(e)
    })?;

    let email = match &outcome {
        SignUpOutcome::VerificationPending { email } => email.clone(),
        SignUpOutcome::SignedIn(session) => session
            .user
            .email
            .clone()
            .unwrap_or_else(|| credentials.email.clone()),
    };
    let redirect = verify_email_redirect(&email);
    tracing::info!(email = %email, "Registration accepted, awaiting verification");

    Ok(match outcome {
        SignUpOutcome::SignedIn(session) => signed_in(&state, &redirect, session),
        SignUpOutcome::VerificationPending { .. } => {
            HttpResponse::Ok().json(AuthResponse::redirect(&redirect))
        }
    })
}

fn verify_email_redirect(email: &str) -> String {
    let query: String = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("email", email)
        .finish();
    format!("{}?{}", Page::VerifyEmail.path(), query)
}

// POST /api/auth/logout
pub async fn logout(
    session: SessionContext,
    state: web::Data<AppState>,
) -> Result<impl Responder, ApiError> {
    // The cookie goes regardless; a stale token on the auth side expires on its own
    if let Err(e) = state.sessions.sign_out(&session).await {
        tracing::warn!(error = %e, "Sign-out at auth service failed");
    }

    Ok(HttpResponse::Ok()
        .cookie(removal_cookie(&state.session_config))
        .json(AuthResponse::redirect(&Page::Home.path())))
}

// GET /api/auth/session
pub async fn session(session: SessionContext) -> impl Responder {
    HttpResponse::Ok().json(SessionResponse {
        authenticated: session.authenticated,
        email: session.email().map(str::to_string),
        user_id: session.user_id(),
    })
}

// POST /api/auth/refresh
pub async fn refresh(
    body: web::Json<RefreshRequest>,
    state: web::Data<AppState>,
) -> Result<impl Responder, ApiError> {
    let refresh_token = body.refresh_token.trim();
    if refresh_token.is_empty() {
        return Err(ApiError::missing_fields(vec!["refresh_token".to_string()]));
    }

    let session = state.sessions.refresh(refresh_token).await?;
    Ok(signed_in(&state, &Page::Dashboard.path(), session))
}

// GET /api/auth/verify?email=...&token=...
pub async fn verify(
    query: web::Query<VerifyQuery>,
    state: web::Data<AppState>,
) -> Result<impl Responder, ApiError> {
    let present = |v: &Option<String>| v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);
    let (email, token) = match (present(&query.email), present(&query.token)) {
        (Some(email), Some(token)) => (email, token),
        _ => return Err(ApiError::bad_request("Invalid verification link")),
    };

    let session = state.sessions.verify_email(&email, &token).await.map_err(|e| {
        tracing::warn!(error = %e, email = %email, "Email verification failed");
        ApiError::from(e)
    })?;

    Ok(signed_in(&state, &Page::Dashboard.path(), session))
}
