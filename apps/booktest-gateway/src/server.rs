use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use gateway_runtime::ServeMux;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::config::{AppConfig, BackendConfig};

/// Build the books router forwarding to the configured backend.
///
/// # Errors
/// Fails when the backend cannot be dialed or the routes do not register.
pub async fn build_router(config: &AppConfig) -> anyhow::Result<Router> {
    let mut builder = ServeMux::builder().max_body_bytes(config.server.body_limit_bytes);
    wire_backend(&mut builder, &config.backend).await?;

    Ok(builder
        .build()
        .into_router()
        .layer(TraceLayer::new_for_http()))
}

async fn wire_backend(
    builder: &mut gateway_runtime::ServeMuxBuilder,
    backend: &BackendConfig,
) -> anyhow::Result<()> {
    let client = backend.client_config();
    if backend.lazy {
        let channel = transport_grpc::connect_lazy(backend.endpoint.as_str(), &client)?;
        books_gateway::register_books_service_handler(builder, channel)?;
        return Ok(());
    }
    books_gateway::register_books_service_handler_from_endpoint(
        builder,
        backend.endpoint.as_str(),
        &client,
    )
    .await
}

/// Serve `router` on `config.server.bind_addr` until `cancel` fires.
///
/// In-flight requests get `shutdown_timeout` to finish once shutdown starts.
///
/// # Errors
/// Fails when the listener cannot bind or the server stops with an error.
pub async fn serve(
    router: Router,
    config: &AppConfig,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.server.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_addr))?;
    let addr = listener.local_addr()?;
    tracing::info!(%addr, backend = %config.backend.endpoint, "books gateway listening");

    serve_on(listener, router, cancel, config.server.shutdown_timeout).await
}

async fn serve_on(
    listener: TcpListener,
    router: Router,
    cancel: CancellationToken,
    shutdown_timeout: Duration,
) -> anyhow::Result<()> {
    let stopping = cancel.clone();
    let server = axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(stopping.cancelled_owned());
    let mut server = std::pin::pin!(server.into_future());

    tokio::select! {
        result = &mut server => return result.context("http server failed"),
        () = cancel.cancelled() => {}
    }

    if tokio::time::timeout(shutdown_timeout, server).await.is_err() {
        tracing::warn!(
            timeout_secs = shutdown_timeout.as_secs_f64(),
            "graceful shutdown timed out, dropping connections"
        );
    } else {
        tracing::info!("http server stopped");
    }
    Ok(())
}
