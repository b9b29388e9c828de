/// Access log middleware
///
/// One event per request, emitted once the response is known. The caller is
/// taken from the `SessionContext` the session gate leaves on the request.
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::StatusCode,
    Error, HttpMessage,
};
use futures_util::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    rc::Rc,
    time::Instant,
};
use uuid::Uuid;

use super::request_id::RequestIdValue;
use crate::session::SessionContext;

pub struct AccessLog;

/// Request facts captured before the inner services run
struct AccessEntry {
    request_id: String,
    method: String,
    path: String,
    peer: String,
    started: Instant,
}

#[derive(Debug, Default, PartialEq)]
struct Caller {
    user_id: Option<Uuid>,
    authenticated: bool,
}

impl Caller {
    fn of(session: Option<&SessionContext>) -> Self {
        session
            .map(|s| Caller {
                user_id: s.user_id(),
                authenticated: s.authenticated,
            })
            .unwrap_or_default()
    }
}

/// Coarse status class, so denied requests can be filtered apart from bad input
fn outcome(status: StatusCode) -> &'static str {
    match status.as_u16() {
        401 | 403 => "denied",
        500..=599 => "server_error",
        400..=499 => "client_error",
        300..=399 => "redirect",
        _ => "ok",
    }
}

impl AccessEntry {
    fn begin(req: &ServiceRequest) -> Self {
        let request_id = req
            .extensions()
            .get::<RequestIdValue>()
            .map(|r| r.0.clone())
            .unwrap_or_else(|| "-".to_string());
        let peer = req
            .connection_info()
            .peer_addr()
            .unwrap_or("-")
            .to_string();

        Self {
            request_id,
            method: req.method().to_string(),
            path: req.path().to_string(),
            peer,
            started: Instant::now(),
        }
    }

    fn finish(self, status: StatusCode, caller: Caller) {
        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        let user_id = caller
            .user_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());

        if status.is_server_error() {
            tracing::error!(
                request_id = %self.request_id,
                method = %self.method,
                path = %self.path,
                status = status.as_u16(),
                elapsed_ms,
                peer = %self.peer,
                user_id = %user_id,
                authenticated = caller.authenticated,
                "Request failed"
            );
        } else {
            tracing::info!(
                request_id = %self.request_id,
                method = %self.method,
                path = %self.path,
                status = status.as_u16(),
                outcome = outcome(status),
                elapsed_ms,
                peer = %self.peer,
                user_id = %user_id,
                authenticated = caller.authenticated,
                "Request served"
            );
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AccessLog
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AccessLogMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AccessLogMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct AccessLogMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AccessLogMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let entry = AccessEntry::begin(&req);
        let service = self.service.clone();

        Box::pin(async move {
            let res = service.call(req).await?;
            let caller = Caller::of(res.request().extensions().get::<SessionContext>());
            entry.finish(res.status(), caller);
            Ok(res)
        })
    }
}
