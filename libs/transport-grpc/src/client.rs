//! Outbound channel setup for forwarding-mode gateways.
//!
//! The channel built here is shared by every proxied call: tonic multiplexes
//! requests over one HTTP/2 connection and reconnects on its own. Nothing in
//! this module sets a per-request timeout; a call only carries the deadline
//! its caller supplied.

use std::time::Duration;
use tonic::transport::{Channel, Endpoint};
use tracing::Instrument;

fn duration_to_u64_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Transport settings for the outbound gRPC channel.
///
/// `max_retries`, `base_backoff` and `max_backoff` only govern establishing
/// the connection in [`connect_with_retry`]. Individual calls are never retried.
#[derive(Debug, Clone)]
pub struct GrpcClientConfig {
    /// Timeout for establishing the connection.
    pub connect_timeout: Duration,

    /// Connection attempts after the first one.
    pub max_retries: u32,

    /// Backoff unit, multiplied by the attempt number.
    pub base_backoff: Duration,

    /// Upper bound for a single backoff sleep.
    pub max_backoff: Duration,

    /// Interval between HTTP/2 keepalive pings.
    pub keepalive_interval: Duration,

    /// Service name used in spans and logs.
    pub service_name: &'static str,
}

impl Default for GrpcClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            max_retries: 3,
            base_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(5),
            keepalive_interval: Duration::from_secs(30),
            service_name: "grpc_client",
        }
    }
}

impl GrpcClientConfig {
    #[must_use]
    pub fn new(service_name: &'static str) -> Self {
        Self {
            service_name,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    #[must_use]
    pub fn with_backoff(mut self, base: Duration, max: Duration) -> Self {
        self.base_backoff = base;
        self.max_backoff = max;
        self
    }

    #[must_use]
    pub fn with_keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval;
        self
    }

    /// Sleep before the given (1-based) retry attempt.
    #[must_use]
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.base_backoff.saturating_mul(attempt).min(self.max_backoff)
    }
}

/// Build a tonic `Endpoint` with the connect timeout and keepalive settings.
fn build_endpoint(uri: String, cfg: &GrpcClientConfig) -> Result<Endpoint, tonic::transport::Error> {
    let endpoint = Endpoint::from_shared(uri)?
        .connect_timeout(cfg.connect_timeout)
        .tcp_keepalive(Some(cfg.keepalive_interval))
        .http2_keep_alive_interval(cfg.keepalive_interval)
        .keep_alive_timeout(Duration::from_secs(10))
        .keep_alive_while_idle(true);

    Ok(endpoint)
}

/// Connect once to `uri` and wrap the channel into `TClient`.
///
/// # Errors
/// Returns an error if the URI is invalid or the connection cannot be established.
pub async fn connect_with_stack<TClient>(
    uri: impl Into<String>,
    cfg: &GrpcClientConfig,
) -> anyhow::Result<TClient>
where
    TClient: From<Channel>,
{
    let uri_string = uri.into();
    let span = tracing::debug_span!(
        "grpc_connect",
        service = cfg.service_name,
        uri = %uri_string
    );

    async move {
        let endpoint = build_endpoint(uri_string, cfg)?;
        let channel = endpoint.connect().await?;

        tracing::info!(
            service = cfg.service_name,
            connect_timeout_ms = duration_to_u64_ms(cfg.connect_timeout),
            "gRPC channel connected"
        );

        Ok(TClient::from(channel))
    }
    .instrument(span)
    .await
}

/// Connect to `uri`, retrying failed connection attempts with linear backoff.
///
/// # Errors
/// Returns the last connection error once `max_retries` is exhausted.
pub async fn connect_with_retry<TClient>(
    uri: impl Into<String>,
    cfg: &GrpcClientConfig,
) -> anyhow::Result<TClient>
where
    TClient: From<Channel>,
{
    use anyhow::Context;

    let uri_string = uri.into();
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;

        match connect_with_stack::<TClient>(uri_string.clone(), cfg).await {
            Ok(client) => {
                if attempt > 1 {
                    tracing::info!(
                        service = cfg.service_name,
                        attempt,
                        "gRPC connection established after retries"
                    );
                }
                return Ok(client);
            }
            Err(e) if attempt <= cfg.max_retries => {
                let backoff = cfg.backoff_for(attempt);
                tracing::warn!(
                    service = cfg.service_name,
                    attempt,
                    max_retries = cfg.max_retries,
                    error = %e,
                    backoff_ms = duration_to_u64_ms(backoff),
                    "gRPC connection failed, retrying"
                );
                tokio::time::sleep(backoff).await;
            }
            Err(e) => {
                tracing::error!(
                    service = cfg.service_name,
                    attempt,
                    error = %e,
                    "gRPC connection failed after all retries"
                );
                return Err(e).context(format!(
                    "failed to connect to {} after {attempt} attempts",
                    cfg.service_name
                ));
            }
        }
    }
}

/// Build a channel that connects on first use.
///
/// Calls made while the endpoint is down fail with `Unavailable` instead of
/// blocking startup.
///
/// # Errors
/// Returns an error if the URI is invalid.
pub fn connect_lazy<TClient>(uri: impl Into<String>, cfg: &GrpcClientConfig) -> anyhow::Result<TClient>
where
    TClient: From<Channel>,
{
    let uri_string = uri.into();
    tracing::debug!(service = cfg.service_name, uri = %uri_string, "lazy gRPC channel created");
    let channel = build_endpoint(uri_string, cfg)?.connect_lazy();
    Ok(TClient::from(channel))
}
