/// Request extractors for the caller's session
///
/// The session gate middleware stores the resolved `SessionContext` in the
/// request extensions; routes outside the gate resolve it on demand.
use actix_web::{dev::Payload, http::header, web, FromRequest, HttpMessage, HttpRequest};
use futures_util::future::LocalBoxFuture;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::errors::ApiError;
use crate::session::SessionContext;

/// Bearer token first, then the session cookie
pub fn access_token(req: &HttpRequest, cookie_name: &str) -> Option<String> {
    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    bearer.or_else(|| {
        req.cookie(cookie_name)
            .map(|c| c.value().to_string())
            .filter(|t| !t.is_empty())
    })
}

pub(crate) async fn resolve_session(req: &HttpRequest) -> SessionContext {
    if let Some(ctx) = req.extensions().get::<SessionContext>() {
        return ctx.clone();
    }

    let Some(state) = req.app_data::<web::Data<AppState>>().cloned() else {
        return SessionContext::anonymous();
    };

    let token = access_token(req, &state.session_config.cookie_name);
    let ctx = state.sessions.current(token.as_deref()).await;
    req.extensions_mut().insert(ctx.clone());
    ctx
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move { Ok(resolve_session(&req).await) })
    }
}

/// A caller with an active session; anything else is turned away with a
/// redirect to the login page
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub session: SessionContext,
}

impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            let session = resolve_session(&req).await;
            match (&session.user, session.authenticated) {
                (Some(user), true) => Ok(AuthenticatedUser {
                    id: user.id,
                    email: user.email.clone(),
                    session: session.clone(),
                }),
                _ => Err(ApiError::login_required("Please log in to continue")),
            }
        })
    }
}
