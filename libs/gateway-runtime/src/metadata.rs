//! Mapping between HTTP headers and gRPC call metadata.

use std::net::SocketAddr;
use std::time::Duration;

use http::header::{HOST, HeaderName, HeaderValue};
use http::HeaderMap;
use tonic::Status;
use tonic::metadata::MetadataMap;

/// Request headers forwarded verbatim, minus this prefix.
pub const METADATA_HEADER_PREFIX: &str = "grpc-metadata-";

/// Prefix applied to well-known HTTP headers forwarded as metadata.
pub const METADATA_PREFIX: &str = "grpcgateway-";

pub const GRPC_TIMEOUT_HEADER: &str = "grpc-timeout";

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_FORWARDED_HOST: &str = "x-forwarded-host";

const PERMANENT_HEADERS: &[&str] = &[
    "accept",
    "accept-charset",
    "accept-language",
    "accept-ranges",
    "authorization",
    "cache-control",
    "content-type",
    "cookie",
    "date",
    "expect",
    "from",
    "host",
    "if-match",
    "if-modified-since",
    "if-none-match",
    "if-schedule-tag-match",
    "if-unmodified-since",
    "max-forwards",
    "origin",
    "pragma",
    "referer",
    "user-agent",
    "via",
    "warning",
];

/// Metadata keys owned by the transport; never surfaced as response headers.
fn is_reserved_response_key(key: &str) -> bool {
    key.starts_with("grpc-")
        || matches!(
            key,
            "content-type" | "te" | "user-agent" | "date" | "content-length" | "trailer"
        )
}

fn metadata_key_for(header: &HeaderName) -> Option<HeaderName> {
    let name = header.as_str();
    if PERMANENT_HEADERS.contains(&name) {
        return HeaderName::try_from(format!("{METADATA_PREFIX}{name}")).ok();
    }
    name.strip_prefix(METADATA_HEADER_PREFIX)
        .filter(|key| !key.is_empty())
        .and_then(|key| HeaderName::try_from(key).ok())
}

/// Build outgoing call metadata from inbound request headers.
///
/// `Grpc-Metadata-*` headers lose their prefix, well-known HTTP headers gain
/// the `grpcgateway-` prefix, `Authorization` is also passed unprefixed and
/// `x-forwarded-host`/`x-forwarded-for` are filled in. Everything else is
/// dropped.
#[must_use]
pub fn incoming_metadata(headers: &HeaderMap, peer: Option<SocketAddr>) -> MetadataMap {
    let mut out = HeaderMap::new();

    for (name, value) in headers {
        if name == http::header::AUTHORIZATION {
            out.append(http::header::AUTHORIZATION, value.clone());
        }
        if let Some(key) = metadata_key_for(name) {
            out.append(key, value.clone());
        }
    }

    let forwarded_host = headers
        .get(X_FORWARDED_HOST)
        .or_else(|| headers.get(HOST))
        .cloned();
    if let Some(host) = forwarded_host {
        out.insert(HeaderName::from_static(X_FORWARDED_HOST), host);
    }

    if let Some(peer) = peer {
        let ip = peer.ip().to_string();
        let chain = match headers.get(X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
            Some(existing) if !existing.is_empty() => format!("{existing}, {ip}"),
            _ => ip,
        };
        if let Ok(value) = HeaderValue::try_from(chain) {
            out.insert(HeaderName::from_static(X_FORWARDED_FOR), value);
        }
    }

    MetadataMap::from_headers(out)
}

/// Parse a `Grpc-Timeout` header: up to eight digits and a unit out of
/// `H M S m u n`.
///
/// # Errors
/// Returns `InvalidArgument` when the header is present but malformed.
pub fn grpc_timeout(headers: &HeaderMap) -> Result<Option<Duration>, Status> {
    let Some(raw) = headers.get(GRPC_TIMEOUT_HEADER) else {
        return Ok(None);
    };
    let invalid = || Status::invalid_argument("invalid grpc-timeout header");

    let text = raw.to_str().map_err(|_| invalid())?;
    if text.len() < 2 || text.len() > 9 {
        return Err(invalid());
    }
    let (digits, unit) = text.split_at(text.len() - 1);
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let value: u64 = digits.parse().map_err(|_| invalid())?;

    let timeout = match unit {
        "H" => Duration::from_secs(value * 3600),
        "M" => Duration::from_secs(value * 60),
        "S" => Duration::from_secs(value),
        "m" => Duration::from_millis(value),
        "u" => Duration::from_micros(value),
        "n" => Duration::from_nanos(value),
        _ => return Err(invalid()),
    };
    Ok(Some(timeout))
}

/// Copy call metadata onto response headers as `Grpc-Metadata-<key>`.
///
/// Entries that cannot form a valid header are skipped with a warning; the
/// response itself is never dropped because of them.
///
/// tonic folds the trailers of a unary call into the metadata of its
/// `Response` or `Status`, so headers and trailers arrive here as one map.
/// Trailing entries therefore surface as `Grpc-Metadata-<key>` too; no
/// `Grpc-Trailer-<key>` header is ever written.
pub fn write_response_metadata(metadata: MetadataMap, target: &mut HeaderMap) {
    let headers = metadata.into_headers();
    let mut current: Option<HeaderName> = None;

    // `HeaderMap::into_iter` yields `None` names for repeated values.
    for (name, value) in headers {
        if let Some(name) = name {
            current = Some(name);
        }
        let Some(key) = current.as_ref() else {
            continue;
        };
        if is_reserved_response_key(key.as_str()) {
            continue;
        }
        match HeaderName::try_from(format!("{METADATA_HEADER_PREFIX}{}", key.as_str())) {
            Ok(header) => {
                target.append(header, value);
            }
            Err(error) => {
                tracing::warn!(key = key.as_str(), %error, "dropping response metadata entry");
            }
        }
    }
}
