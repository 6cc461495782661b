//! Attach the books routes to a [`ServeMuxBuilder`].
//!
//! Four entry points cover the two dispatch modes. The routes are identical
//! in both; only the service behind them differs.

use std::sync::Arc;

use anyhow::Context;
use books_sdk::{BooksService, BooksServiceClient, RemoteBooksService, SERVICE_NAME};
use gateway_runtime::{RegistryError, ServeMuxBuilder};
use tonic::transport::Channel;
use transport_grpc::GrpcClientConfig;

use crate::api::rest::operations::{
    BooksByTags, BooksByTitleYear, CreateAuthor, CreateBook, DeleteBook, GetAuthor, GetBook,
    UpdateBook, UpdateBookIsbn,
};

/// Register all nine routes, dispatching in-process to `server`.
///
/// # Errors
/// Fails when a route collides with one already in `builder`; routes
/// registered before the collision stay registered.
pub fn register_books_service_handler_server(
    builder: &mut ServeMuxBuilder,
    server: Arc<dyn BooksService>,
) -> Result<(), RegistryError> {
    tracing::info!(service = SERVICE_NAME, mode = "embedded", "registering books routes");
    register_routes(builder, server)
}

fn register_routes(
    builder: &mut ServeMuxBuilder,
    server: Arc<dyn BooksService>,
) -> Result<(), RegistryError> {
    builder
        .register::<BooksByTags>(Arc::clone(&server))?
        .register::<BooksByTitleYear>(Arc::clone(&server))?
        .register::<CreateAuthor>(Arc::clone(&server))?
        .register::<CreateBook>(Arc::clone(&server))?
        .register::<DeleteBook>(Arc::clone(&server))?
        .register::<GetAuthor>(Arc::clone(&server))?
        .register::<GetBook>(Arc::clone(&server))?
        .register::<UpdateBook>(Arc::clone(&server))?
        .register::<UpdateBookIsbn>(server)?;
    Ok(())
}

/// Register all nine routes, forwarding over an existing channel.
///
/// # Errors
/// See [`register_books_service_handler_server`].
pub fn register_books_service_handler(
    builder: &mut ServeMuxBuilder,
    channel: Channel,
) -> Result<(), RegistryError> {
    register_books_service_handler_client(builder, BooksServiceClient::new(channel))
}

/// Register all nine routes, forwarding through `client`.
///
/// # Errors
/// See [`register_books_service_handler_server`].
pub fn register_books_service_handler_client(
    builder: &mut ServeMuxBuilder,
    client: BooksServiceClient<Channel>,
) -> Result<(), RegistryError> {
    tracing::info!(service = SERVICE_NAME, mode = "forwarding", "registering books routes");
    register_routes(builder, Arc::new(RemoteBooksService::new(client)))
}

/// Dial `endpoint`, then register all nine routes forwarding to it.
///
/// Dialing retries per `cfg`. Nothing is registered when the dial fails.
///
/// # Errors
/// Fails when the endpoint stays unreachable or a route collides.
pub async fn register_books_service_handler_from_endpoint(
    builder: &mut ServeMuxBuilder,
    endpoint: impl Into<String>,
    cfg: &GrpcClientConfig,
) -> anyhow::Result<()> {
    let endpoint = endpoint.into();
    let remote = books_sdk::connect(endpoint.clone(), cfg)
        .await
        .with_context(|| format!("failed to dial books endpoint {endpoint}"))?;

    tracing::info!(service = SERVICE_NAME, mode = "forwarding", %endpoint, "registering books routes");
    register_routes(builder, Arc::new(remote))?;
    Ok(())
}
