//! HTTP/JSON routes for `books.v1.BooksService`.
//!
//! Nine unary operations, each bound to one verb and path template:
//! [`api::rest::operations`] holds the table, [`api::rest::dto`] the JSON
//! shapes, and the `register_*` functions attach the routes to a
//! [`gateway_runtime::ServeMuxBuilder`] in embedded or forwarding mode.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

pub mod api;
mod registration;

pub use registration::{
    register_books_service_handler, register_books_service_handler_client,
    register_books_service_handler_from_endpoint, register_books_service_handler_server,
};
