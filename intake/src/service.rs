use crate::errors::{IntakeError, SubmissionError};
use crate::submission::SubmissionHandler;
use http_body_util::combinators::BoxBody;
use hyper::body::{Body, Bytes, Incoming};
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};
use shared::http::{
    TEXT_CONTENT_TYPE, make_boxed_error_response, make_boxed_response, make_health_response,
};
use sheets::Sheet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub const ACKNOWLEDGED: &str = "Form data received";

/// Builds the acknowledgment for a submission.
///
/// The status is always 200, failures included: the webhook caller would
/// otherwise retry or flag the integration. Only the body tells the two apart.
pub fn acknowledge<E: 'static>(
    result: &Result<Sheet, SubmissionError>,
) -> Response<BoxBody<Bytes, E>> {
    let body = match result {
        Ok(_) => ACKNOWLEDGED.to_string(),
        Err(e) => format!("Error: {e}"),
    };
    make_boxed_response(StatusCode::OK, TEXT_CONTENT_TYPE, body)
}

/// Webhook service: `GET` answers the health check, `POST` records a submission.
#[derive(Clone)]
pub struct IntakeService {
    handler: Arc<SubmissionHandler>,
}

impl IntakeService {
    pub fn new(handler: Arc<SubmissionHandler>) -> Self {
        Self { handler }
    }

    pub async fn respond<B, E>(&self, req: Request<B>) -> Response<BoxBody<Bytes, E>>
    where
        B: Body + Send,
        B::Data: Send,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
        E: 'static,
    {
        let method = req.method().clone();
        match method {
            Method::GET | Method::HEAD => make_health_response(),
            Method::POST => acknowledge(&self.handler.handle_request(req).await),
            _ => {
                tracing::warn!(
                    method = %method,
                    path = %req.uri().path(),
                    "Unsupported method"
                );
                make_boxed_error_response(StatusCode::METHOD_NOT_ALLOWED)
            }
        }
    }
}

impl Service<Request<Incoming>> for IntakeService {
    type Response = Response<BoxBody<Bytes, Self::Error>>;
    type Error = IntakeError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let service = self.clone();
        Box::pin(async move { Ok(service.respond(req).await) })
    }
}
