//! Operation descriptors and the typed decode, invoke and project contract.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tonic::Status;
use tonic::metadata::MetadataMap;

use crate::binding::{BindInput, Binding};

/// Which part of the response becomes the HTTP body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// The full response message.
    Envelope,
    /// One named field of the response; the rest of the envelope is dropped.
    Field(&'static str),
}

/// Static description of one HTTP route onto one RPC.
#[derive(Debug, Clone)]
pub struct OperationDescriptor {
    /// Fully qualified method, e.g. `/books.v1.BooksService/GetBook`.
    pub rpc_method: &'static str,
    pub method: http::Method,
    pub pattern: &'static str,
    pub binding: Binding,
    pub projection: Projection,
}

/// A unary RPC exposed over HTTP.
///
/// Implementors are marker types; the associated functions carry the typed
/// request construction, the call itself and the response projection.
pub trait UnaryOperation: 'static {
    /// Service the call is dispatched to.
    type Service: ?Sized + Send + Sync + 'static;
    type Request: Send + 'static;
    type Response: Send + 'static;
    /// HTTP body produced by [`UnaryOperation::project`].
    type Body: Serialize;

    const DESCRIPTOR: OperationDescriptor;

    /// Build the request message from path, query and body.
    ///
    /// # Errors
    /// `InvalidArgument` when a parameter is missing or malformed.
    fn bind(input: &BindInput) -> Result<Self::Request, Status>;

    fn call(
        service: Arc<Self::Service>,
        request: tonic::Request<Self::Request>,
    ) -> BoxFuture<'static, Result<tonic::Response<Self::Response>, Status>>;

    fn project(response: Self::Response) -> Self::Body;
}

/// Cancellation handle of the inbound HTTP request.
///
/// Inserted into the extensions of every call request. It fires when the
/// HTTP exchange ends, including when the client goes away mid-call, so
/// work spawned by an in-process implementation can stop with it.
#[derive(Debug, Clone)]
pub struct CallCancellation(pub CancellationToken);

impl CallCancellation {
    /// Handle attached to `request`, if it came through the gateway.
    #[must_use]
    pub fn of<T>(request: &tonic::Request<T>) -> Option<&CancellationToken> {
        request.extensions().get::<Self>().map(|c| &c.0)
    }
}

/// Per-call state derived from the inbound request.
pub(crate) struct CallContext {
    pub metadata: MetadataMap,
    pub timeout: Option<Duration>,
    pub cancel: CancellationToken,
}

/// Successful call: the projected body and the response metadata.
pub(crate) struct Reply {
    pub body: serde_json::Value,
    pub metadata: MetadataMap,
}

#[async_trait::async_trait]
pub(crate) trait RouteHandler: Send + Sync {
    async fn serve(&self, input: BindInput, ctx: CallContext) -> Result<Reply, Status>;
}

pub(crate) struct OperationHandler<O: UnaryOperation> {
    service: Arc<O::Service>,
    _op: PhantomData<fn() -> O>,
}

impl<O: UnaryOperation> OperationHandler<O> {
    pub(crate) fn new(service: Arc<O::Service>) -> Self {
        Self {
            service,
            _op: PhantomData,
        }
    }
}

#[async_trait::async_trait]
impl<O: UnaryOperation> RouteHandler for OperationHandler<O> {
    async fn serve(&self, input: BindInput, ctx: CallContext) -> Result<Reply, Status> {
        let message = O::bind(&input)?;

        let mut request = tonic::Request::new(message);
        *request.metadata_mut() = ctx.metadata;
        request.extensions_mut().insert(CallCancellation(ctx.cancel));
        if let Some(timeout) = ctx.timeout {
            request.set_timeout(timeout);
        }

        let call = O::call(Arc::clone(&self.service), request);
        let response = match ctx.timeout {
            Some(timeout) => tokio::time::timeout(timeout, call)
                .await
                .map_err(|_| Status::deadline_exceeded("context deadline exceeded"))??,
            None => call.await?,
        };

        let (metadata, message, _) = response.into_parts();
        let body = serde_json::to_value(O::project(message))
            .map_err(|e| Status::internal(format!("failed to encode response: {e}")))?;

        Ok(Reply { body, metadata })
    }
}
