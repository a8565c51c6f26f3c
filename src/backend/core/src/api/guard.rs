//! Per-route webservice guard.
//!
//! Wraps a route with one webservice id: the guard decodes the caller's
//! identity, runs the permission chain, and either rejects with the generic
//! denial payload or injects the populated [`RequestContext`] as a request
//! extension for the handler and any guarded queries it runs.

use axum::{
    body::Body,
    extract::{FromRequestParts, Request},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

use crate::access::chain::PermissionChain;
use crate::access::context::RequestContext;
use crate::auth::token::TokenService;
use crate::error::PalisadeError;
use crate::registry::webservice::WebserviceId;

/// Header carrying service-to-service tokens.
const SERVICE_TOKEN_HEADER: &str = "x-service-token";

// ═══════════════════════════════════════════════════════════════════════════════
// Layer
// ═══════════════════════════════════════════════════════════════════════════════

/// Guard layer bound to one webservice id.
#[derive(Clone)]
pub struct RequireWebserviceLayer {
    chain: Arc<PermissionChain>,
    tokens: Arc<TokenService>,
    webservice: WebserviceId,
}

impl RequireWebserviceLayer {
    pub fn new(
        chain: Arc<PermissionChain>,
        tokens: Arc<TokenService>,
        webservice: impl Into<WebserviceId>,
    ) -> Self {
        Self {
            chain,
            tokens,
            webservice: webservice.into(),
        }
    }
}

impl<S> Layer<S> for RequireWebserviceLayer {
    type Service = RequireWebserviceService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequireWebserviceService {
            inner,
            chain: self.chain.clone(),
            tokens: self.tokens.clone(),
            webservice: self.webservice.clone(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Service
// ═══════════════════════════════════════════════════════════════════════════════

/// Service enforcing one webservice's permission per request.
#[derive(Clone)]
pub struct RequireWebserviceService<S> {
    inner: S,
    chain: Arc<PermissionChain>,
    tokens: Arc<TokenService>,
    webservice: WebserviceId,
}

impl<S> RequireWebserviceService<S> {
    /// Build the request context from the caller's credentials.
    fn context_from_request(
        tokens: &TokenService,
        request: &Request<Body>,
    ) -> Result<RequestContext, PalisadeError> {
        let headers = request.headers();

        let bearer = headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| {
                value
                    .strip_prefix("Bearer ")
                    .or_else(|| value.strip_prefix("bearer "))
            });

        let mut context = if let Some(token) = bearer {
            RequestContext::for_user(tokens.decode(token)?)
        } else if let Some(token) = headers
            .get(SERVICE_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
        {
            RequestContext::for_service(tokens.decode_service_token(token)?)
        } else {
            RequestContext::anonymous()
        };

        if let Some(request_id) = headers
            .get("x-request-id")
            .and_then(|value| value.to_str().ok())
        {
            context = context.with_request_id(request_id);
        }

        Ok(context)
    }
}

impl<S> Service<Request<Body>> for RequireWebserviceService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        let chain = self.chain.clone();
        let tokens = self.tokens.clone();
        let webservice = self.webservice.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let mut context = match Self::context_from_request(&tokens, &request) {
                Ok(context) => context,
                Err(error) => return Ok(error.into_response()),
            };

            if let Err(error) = chain.authorize(&webservice, &mut context).await {
                return Ok(error.into_response());
            }

            request.extensions_mut().insert(context);
            inner.call(request).await
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Extractor
// ═══════════════════════════════════════════════════════════════════════════════

#[axum::async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = PalisadeError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<RequestContext>().cloned().ok_or_else(|| {
            PalisadeError::internal(
                "request context missing; is the webservice guard applied to this route?",
            )
        })
    }
}
