//! Parameter binding: where an operation's request fields come from.

use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

use axum::body::Bytes;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tonic::Status;

use crate::marshal::Marshaler;
use crate::pattern::PathParams;

/// Which part of the body is decoded into the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodySelector {
    /// The whole request message (`body: "*"`).
    Whole,
    /// A single request field (`body: "<field>"`).
    Field(&'static str),
}

/// Source of an operation's request fields.
///
/// Path variables and body fields of one operation are disjoint; a field is
/// never filled from two sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Body(BodySelector),
    Query,
    Path(&'static [&'static str]),
    PathAndBody {
        path: &'static [&'static str],
        body: BodySelector,
    },
}

impl Binding {
    #[must_use]
    pub fn path_variables(&self) -> &'static [&'static str] {
        match self {
            Self::Path(vars) | Self::PathAndBody { path: vars, .. } => vars,
            Self::Body(_) | Self::Query => &[],
        }
    }

    #[must_use]
    pub fn reads_body(&self) -> bool {
        matches!(self, Self::Body(_) | Self::PathAndBody { .. })
    }
}

/// Raw request parts available to an operation's `bind` function.
pub struct BindInput {
    path: PathParams,
    query: String,
    body: Bytes,
    marshaler: Arc<dyn Marshaler>,
}

impl BindInput {
    #[must_use]
    pub fn new(path: PathParams, query: Option<&str>, body: Bytes, marshaler: Arc<dyn Marshaler>) -> Self {
        Self {
            path,
            query: query.unwrap_or_default().to_owned(),
            body,
            marshaler,
        }
    }

    /// Parse path variable `name` as `T`.
    ///
    /// # Errors
    /// `InvalidArgument` naming the parameter when it is absent, empty or
    /// does not parse.
    pub fn path_param<T>(&self, name: &str) -> Result<T, Status>
    where
        T: FromStr,
        T::Err: Display,
    {
        let raw = self
            .path
            .get(name)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| Status::invalid_argument(format!("missing parameter {name}")))?;

        raw.parse().map_err(|e: T::Err| {
            Status::invalid_argument(format!("type mismatch, parameter: {name}, error: {e}"))
        })
    }

    /// Decode the body as the whole request message. An empty body yields
    /// `T::default()`.
    ///
    /// # Errors
    /// `InvalidArgument` when the body is not an object or a field does not
    /// decode; the message names the field.
    pub fn body<T>(&self) -> Result<T, Status>
    where
        T: DeserializeOwned + Default,
    {
        let Some(value) = self.decoded_body()? else {
            return Ok(T::default());
        };
        let Value::Object(fields) = value else {
            return Err(Status::invalid_argument(
                "invalid request body: expected a JSON object",
            ));
        };

        serde_json::from_value(Value::Object(fields.clone()))
            .map_err(|e| Status::invalid_argument(explain_message_error::<T>(fields, &e)))
    }

    /// Decode the body as the single request field `name`. An empty body
    /// yields `T::default()`.
    ///
    /// # Errors
    /// `InvalidArgument` naming `name` when the body does not decode.
    pub fn body_field<T>(&self, name: &str) -> Result<T, Status>
    where
        T: DeserializeOwned + Default,
    {
        let Some(value) = self.decoded_body()? else {
            return Ok(T::default());
        };
        serde_json::from_value(value)
            .map_err(|e| Status::invalid_argument(format!("invalid value for field {name}: {e}")))
    }

    fn decoded_body(&self) -> Result<Option<Value>, Status> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        self.marshaler
            .decode(&self.body)
            .map(Some)
            .map_err(|e| Status::invalid_argument(format!("invalid request body: {e}")))
    }

    /// Decode the query string into `T`.
    ///
    /// # Errors
    /// `InvalidArgument` for unknown or repeated keys and values of the
    /// wrong type, as reported by `T`'s deserializer.
    pub fn query<T>(&self) -> Result<T, Status>
    where
        T: DeserializeOwned,
    {
        serde_urlencoded::from_str(&self.query)
            .map_err(|e| Status::invalid_argument(format!("invalid query parameters: {e}")))
    }
}

/// Find the first field that fails to decode on its own, so the message
/// names it instead of the message type.
fn explain_message_error<T: DeserializeOwned>(fields: Map<String, Value>, err: &serde_json::Error) -> String {
    for (name, value) in fields {
        let mut single = Map::new();
        single.insert(name.clone(), value);
        if let Err(e) = serde_json::from_value::<T>(Value::Object(single)) {
            return format!("invalid value for field {name}: {e}");
        }
    }
    format!("invalid request body: {err}")
}
