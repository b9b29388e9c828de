/// Request ID middleware
///
/// Propagates the caller's request id, or generates one, and echoes it back
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderName, HeaderValue},
    Error, HttpMessage,
};
use futures_util::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    rc::Rc,
};
use uuid::Uuid;

const MAX_REQUEST_ID_LEN: usize = 128;

pub struct RequestId {
    header_name: String,
}

impl RequestId {
    pub fn new(header_name: String) -> Self {
        Self { header_name }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequestId
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestIdMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestIdMiddleware {
            service: Rc::new(service),
            header_name: HeaderName::from_bytes(self.header_name.as_bytes()).ok(),
        }))
    }
}

pub struct RequestIdMiddleware<S> {
    service: Rc<S>,
    /// `None` when the configured name is not a valid header name
    header_name: Option<HeaderName>,
}

/// Accept caller ids that are short printable ASCII, otherwise mint a fresh one
fn sanitize(incoming: Option<&str>) -> String {
    incoming
        .map(str::trim)
        .filter(|id| {
            !id.is_empty()
                && id.len() <= MAX_REQUEST_ID_LEN
                && id.chars().all(|c| c.is_ascii_graphic())
        })
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

impl<S, B> Service<ServiceRequest> for RequestIdMiddleware<S>
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
        let incoming = self
            .header_name
            .as_ref()
            .and_then(|name| req.headers().get(name))
            .and_then(|h| h.to_str().ok());
        let request_id = sanitize(incoming);

        req.extensions_mut()
            .insert(RequestIdValue(request_id.clone()));

        let service = self.service.clone();
        let header_name = self.header_name.clone();

        Box::pin(async move {
            let mut res = service.call(req).await?;
            if let (Some(name), Ok(value)) = (header_name, HeaderValue::from_str(&request_id)) {
                res.headers_mut().insert(name, value);
            }
            Ok(res)
        })
    }
}

#[derive(Clone)]
pub struct RequestIdValue(pub String);
