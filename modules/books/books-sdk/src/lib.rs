//! Books SDK
//!
//! The `books.v1` contract shared by the gateway, service implementations and
//! forwarding clients:
//! - generated prost messages and tonic client/server stubs (`proto`)
//! - [`RemoteBooksService`], the `BooksService` trait backed by a channel
//! - [`connect`] and [`connect_lazy`] to dial a remote books endpoint
//!
//! Every generated `BooksService` method has a default body answering
//! `Unimplemented`, so an implementation may override only the operations it
//! supports.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

mod client;
pub use client::{RemoteBooksService, connect, connect_lazy};

/// Generated protobuf types for `books.v1`.
#[allow(clippy::all, clippy::pedantic, unused_variables)]
pub mod proto {
    tonic::include_proto!("books.v1");
}

pub use proto::books_service_client::BooksServiceClient;
pub use proto::books_service_server::{BooksService, BooksServiceServer};

/// Fully qualified gRPC service name.
pub const SERVICE_NAME: &str = "books.v1.BooksService";

/// Fully qualified method paths, as they appear on the wire.
pub mod methods {
    pub const BOOKS_BY_TAGS: &str = "/books.v1.BooksService/BooksByTags";
    pub const BOOKS_BY_TITLE_YEAR: &str = "/books.v1.BooksService/BooksByTitleYear";
    pub const CREATE_AUTHOR: &str = "/books.v1.BooksService/CreateAuthor";
    pub const CREATE_BOOK: &str = "/books.v1.BooksService/CreateBook";
    pub const DELETE_BOOK: &str = "/books.v1.BooksService/DeleteBook";
    pub const GET_AUTHOR: &str = "/books.v1.BooksService/GetAuthor";
    pub const GET_BOOK: &str = "/books.v1.BooksService/GetBook";
    pub const UPDATE_BOOK: &str = "/books.v1.BooksService/UpdateBook";
    pub const UPDATE_BOOK_ISBN: &str = "/books.v1.BooksService/UpdateBookISBN";
}
