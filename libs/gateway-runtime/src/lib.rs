//! Runtime for HTTP/JSON gateways in front of gRPC services.
//!
//! A gateway is a [`ServeMux`] holding one route per [`UnaryOperation`]. Each
//! request is bound into a typed message, dispatched either to a local
//! implementation or through a remote client, and the response is projected
//! and encoded back to HTTP. Failures are gRPC statuses rendered as
//! `{code, message, details}` with the mapped HTTP status.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

pub mod binding;
pub mod error;
pub mod marshal;
pub mod metadata;
pub mod mux;
pub mod operation;
pub mod pattern;

pub use binding::{BindInput, Binding, BodySelector};
pub use error::{ErrorBody, RegistryError, http_status_from_code};
pub use marshal::{JsonMarshaler, MarshalError, Marshaler, MarshalerRegistry};
pub use mux::{ServeMux, ServeMuxBuilder};
pub use operation::{CallCancellation, OperationDescriptor, Projection, UnaryOperation};
pub use pattern::{PathParams, PathTemplate, PatternError};
