#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

pub mod client;

pub use client::{GrpcClientConfig, connect_lazy, connect_with_retry, connect_with_stack};
