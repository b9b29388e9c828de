/// Session gate middleware
///
/// Resolves the caller's session and turns anonymous callers away from
/// protected prefixes before any handler (and any backend query) runs.
use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage, ResponseError,
};
use futures_util::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    rc::Rc,
};

use crate::errors::ApiError;
use crate::http::extract::{access_token, resolve_session};

#[derive(Clone)]
pub struct SessionGate {
    protect_prefixes: Vec<String>,
    cookie_name: String,
}

impl SessionGate {
    pub fn new(protect_prefixes: Vec<String>, cookie_name: String) -> Self {
        Self {
            protect_prefixes,
            cookie_name,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionGateMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionGateMiddleware {
            service: Rc::new(service),
            protect_prefixes: Rc::new(self.protect_prefixes.clone()),
            cookie_name: Rc::new(self.cookie_name.clone()),
        }))
    }
}

pub struct SessionGateMiddleware<S> {
    service: Rc<S>,
    protect_prefixes: Rc<Vec<String>>,
    cookie_name: Rc<String>,
}

impl<S> SessionGateMiddleware<S> {
    fn is_protected(&self, path: &str) -> bool {
        self.protect_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }
}

impl<S, B> Service<ServiceRequest> for SessionGateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let protected = self.is_protected(req.path());
        let has_token = access_token(req.request(), &self.cookie_name).is_some();
        let service = self.service.clone();

        // Public route without credentials: nothing to resolve
        if !protected && !has_token {
            return Box::pin(async move {
                let res = service.call(req).await?;
                Ok(res.map_into_left_body())
            });
        }

        Box::pin(async move {
            let session = resolve_session(req.request()).await;

            if protected && !session.authenticated {
                tracing::info!(path = %req.path(), "Anonymous access to protected route");
                let response = ApiError::login_required("Please log in to continue").error_response();
                let (req, _) = req.into_parts();
                return Ok(ServiceResponse::new(req, response).map_into_right_body());
            }

            req.extensions_mut().insert(session);
            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}
