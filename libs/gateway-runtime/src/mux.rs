//! Route registry and HTTP dispatcher.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use http::header::{CONTENT_TYPE, HeaderValue};
use http::{Method, Request, Response, StatusCode};
use http_body_util::LengthLimitError;
use tokio_util::sync::CancellationToken;
use tonic::{Code, Status};

use crate::binding::{BindInput, Binding};
use crate::error::{ErrorBody, FALLBACK_ERROR_BODY, RegistryError, http_status_from_code};
use crate::marshal::{Marshaler, MarshalerRegistry};
use crate::metadata::{grpc_timeout, incoming_metadata, write_response_metadata};
use crate::operation::{
    CallContext, OperationDescriptor, OperationHandler, Reply, RouteHandler, UnaryOperation,
};
use crate::pattern::{PathParams, PathTemplate, split_path};

/// Default upper bound for buffered request bodies.
pub const DEFAULT_MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

struct Route {
    descriptor: OperationDescriptor,
    template: PathTemplate,
    handler: Box<dyn RouteHandler>,
}

enum Lookup<'a> {
    Found(&'a Route, PathParams),
    MethodNotAllowed,
    NotFound,
}

/// Collects routes, then freezes into a [`ServeMux`].
pub struct ServeMuxBuilder {
    routes: Vec<Route>,
    marshalers: MarshalerRegistry,
    max_body_bytes: usize,
}

impl Default for ServeMuxBuilder {
    fn default() -> Self {
        Self {
            routes: Vec::new(),
            marshalers: MarshalerRegistry::default(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ServeMuxBuilder {
    /// Register marshaler for `mime`. Replaces an existing entry.
    #[must_use]
    pub fn marshaler(mut self, mime: impl Into<String>, marshaler: Arc<dyn Marshaler>) -> Self {
        self.marshalers.insert(mime, marshaler);
        self
    }

    #[must_use]
    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// Add operation `O`, dispatching to `service`.
    ///
    /// # Errors
    /// Fails when the pattern is malformed, when the binding disagrees with
    /// the pattern's variables, or when another route already serves the
    /// same method and path shape.
    pub fn register<O: UnaryOperation>(
        &mut self,
        service: Arc<O::Service>,
    ) -> Result<&mut Self, RegistryError> {
        let descriptor = O::DESCRIPTOR;
        let template = PathTemplate::parse(descriptor.pattern).map_err(|source| {
            RegistryError::MalformedPattern {
                pattern: descriptor.pattern,
                source,
            }
        })?;

        check_binding(&descriptor, &template)?;

        if let Some(existing) = self.routes.iter().find(|route| {
            route.descriptor.method == descriptor.method && route.template.same_shape(&template)
        }) {
            return Err(RegistryError::DuplicateRoute {
                method: descriptor.method,
                pattern: descriptor.pattern,
                rpc: descriptor.rpc_method,
                existing_pattern: existing.descriptor.pattern,
                existing_rpc: existing.descriptor.rpc_method,
            });
        }

        tracing::debug!(
            method = %descriptor.method,
            pattern = descriptor.pattern,
            rpc = descriptor.rpc_method,
            "route registered"
        );

        self.routes.push(Route {
            descriptor,
            template,
            handler: Box::new(OperationHandler::<O>::new(service)),
        });
        Ok(self)
    }

    #[must_use]
    pub fn build(self) -> ServeMux {
        ServeMux {
            routes: self.routes,
            marshalers: self.marshalers,
            max_body_bytes: self.max_body_bytes,
        }
    }
}

fn check_binding(
    descriptor: &OperationDescriptor,
    template: &PathTemplate,
) -> Result<(), RegistryError> {
    let mismatch = |reason: String| RegistryError::BindingMismatch {
        rpc: descriptor.rpc_method,
        pattern: descriptor.pattern,
        reason,
    };

    let bound = descriptor.binding.path_variables();
    for var in template.variables() {
        if !bound.contains(&var) {
            return Err(mismatch(format!("path variable `{var}` is not bound")));
        }
    }
    for var in bound {
        if !template.variables().any(|declared| declared == *var) {
            return Err(mismatch(format!("`{var}` is not a variable of the pattern")));
        }
    }

    if descriptor.binding.reads_body() && matches!(descriptor.method, Method::GET | Method::DELETE)
    {
        return Err(mismatch(format!("{} requests carry no body", descriptor.method)));
    }
    if matches!(descriptor.binding, Binding::Query) && descriptor.method != Method::GET {
        return Err(mismatch("query binding is only used with GET".to_owned()));
    }
    Ok(())
}

/// Immutable route table serving HTTP requests.
pub struct ServeMux {
    routes: Vec<Route>,
    marshalers: MarshalerRegistry,
    max_body_bytes: usize,
}

impl ServeMux {
    #[must_use]
    pub fn builder() -> ServeMuxBuilder {
        ServeMuxBuilder::default()
    }

    /// Descriptors of all registered routes, in registration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &OperationDescriptor> {
        self.routes.iter().map(|route| &route.descriptor)
    }

    fn lookup(&self, method: &Method, path: &str) -> Lookup<'_> {
        let components = split_path(path);
        let mut path_matched = false;
        let mut best: Option<(&Route, PathParams)> = None;

        for route in &self.routes {
            let Some(params) = route.template.match_components(&components) else {
                continue;
            };
            path_matched = true;
            if route.descriptor.method != *method {
                continue;
            }
            let better = best.as_ref().is_none_or(|(current, _)| {
                route.template.specificity() > current.template.specificity()
            });
            if better {
                best = Some((route, params));
            }
        }

        match best {
            Some((route, params)) => Lookup::Found(route, params),
            None if path_matched => Lookup::MethodNotAllowed,
            None => Lookup::NotFound,
        }
    }

    /// Serve one HTTP request: decode, invoke, encode.
    ///
    /// Dropping the returned future abandons the call and fires its
    /// [`CallCancellation`](crate::operation::CallCancellation).
    pub async fn handle(&self, request: Request<Body>) -> Response<Body> {
        let cancel = CancellationToken::new();
        let _cancel_on_drop = cancel.clone().drop_guard();

        let (parts, body) = request.into_parts();
        let (inbound, outbound) = self.marshalers.for_request(&parts.headers);

        let (route, params) = match self.lookup(&parts.method, parts.uri.path()) {
            Lookup::Found(route, params) => (route, params),
            Lookup::MethodNotAllowed => {
                return routing_error(StatusCode::METHOD_NOT_ALLOWED, Code::Unimplemented, outbound.as_ref());
            }
            Lookup::NotFound => {
                return routing_error(StatusCode::NOT_FOUND, Code::NotFound, outbound.as_ref());
            }
        };

        let rpc = route.descriptor.rpc_method;
        let bytes = match axum::body::to_bytes(body, self.max_body_bytes).await {
            Ok(bytes) => bytes,
            Err(e) if exceeds_limit(&e) => {
                tracing::debug!(rpc, limit = self.max_body_bytes, "request body too large");
                let status = Status::resource_exhausted(format!(
                    "request body exceeds {} bytes",
                    self.max_body_bytes
                ));
                return overridden_error(StatusCode::PAYLOAD_TOO_LARGE, &status, outbound.as_ref());
            }
            Err(e) => {
                let status = Status::invalid_argument(format!("failed to read request body: {e}"));
                return error_response(&status, outbound.as_ref());
            }
        };

        let result = async {
            let timeout = grpc_timeout(&parts.headers)?;
            let peer = parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| *addr);
            let metadata = incoming_metadata(&parts.headers, peer);

            let input = BindInput::new(params, parts.uri.query(), bytes, inbound);

            let ctx = CallContext {
                metadata,
                timeout,
                cancel: cancel.clone(),
            };
            route.handler.serve(input, ctx).await
        }
        .await;

        match result {
            Ok(reply) => success_response(reply, outbound.as_ref()),
            Err(status) => {
                tracing::debug!(
                    rpc,
                    code = %status.code(),
                    message = status.message(),
                    "call failed"
                );
                error_response(&status, outbound.as_ref())
            }
        }
    }

    /// Mount the mux as the fallback of an axum router.
    #[must_use]
    pub fn into_router(self) -> Router {
        let mux = Arc::new(self);
        Router::new().fallback(move |request: Request<Body>| {
            let mux = Arc::clone(&mux);
            async move { mux.handle(request).await }
        })
    }
}

fn encoded_response(status: StatusCode, bytes: Vec<u8>, marshaler: &dyn Marshaler) -> Response<Body> {
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, marshaler.content_type());
    response
}

fn success_response(reply: Reply, marshaler: &dyn Marshaler) -> Response<Body> {
    let bytes = match marshaler.encode(&reply.body) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, "failed to marshal response");
            return error_response(&Status::internal(e.to_string()), marshaler);
        }
    };

    let mut response = encoded_response(StatusCode::OK, bytes, marshaler);
    write_response_metadata(reply.metadata, response.headers_mut());
    response
}

/// Render a failed call: mapped HTTP status and the error envelope.
pub(crate) fn error_response(status: &Status, marshaler: &dyn Marshaler) -> Response<Body> {
    let http_status = http_status_from_code(status.code());
    let body = ErrorBody::from(status).to_value();

    let mut response = match marshaler.encode(&body) {
        Ok(bytes) => encoded_response(http_status, bytes, marshaler),
        Err(e) => {
            tracing::error!(error = %e, "failed to marshal error message");
            let mut response = Response::new(Body::from(FALLBACK_ERROR_BODY));
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            return response;
        }
    };

    write_response_metadata(status.metadata().clone(), response.headers_mut());
    response
}

fn routing_error(http_status: StatusCode, code: Code, marshaler: &dyn Marshaler) -> Response<Body> {
    let message = http_status.canonical_reason().unwrap_or_default();
    overridden_error(http_status, &Status::new(code, message), marshaler)
}

/// Error envelope for `status`, sent with `http_status` instead of the
/// code's usual mapping.
fn overridden_error(http_status: StatusCode, status: &Status, marshaler: &dyn Marshaler) -> Response<Body> {
    let mut response = error_response(status, marshaler);
    *response.status_mut() = http_status;
    response
}

/// Whether reading the body stopped at the configured limit. Covers both
/// a declared `Content-Length` and a chunked body that grows past it.
fn exceeds_limit(err: &axum::Error) -> bool {
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        if cause.is::<LengthLimitError>() {
            return true;
        }
        source = cause.source();
    }
    false
}
