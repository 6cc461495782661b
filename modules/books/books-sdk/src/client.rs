//! `BooksService` over a tonic channel.

use anyhow::Result;
use tonic::transport::Channel;
use tonic::{Request, Response, Status};
use transport_grpc::GrpcClientConfig;

use crate::SERVICE_NAME;
use crate::proto::books_service_client::BooksServiceClient;
use crate::proto::books_service_server::BooksService;
use crate::proto::{
    BooksByTagsRequest, BooksByTagsResponse, BooksByTitleYearRequest, BooksByTitleYearResponse,
    CreateAuthorRequest, CreateAuthorResponse, CreateBookRequest, CreateBookResponse,
    DeleteBookRequest, DeleteBookResponse, GetAuthorRequest, GetAuthorResponse, GetBookRequest,
    GetBookResponse, UpdateBookIsbnRequest, UpdateBookIsbnResponse, UpdateBookRequest,
    UpdateBookResponse,
};

/// Forwards every `BooksService` call to a remote endpoint.
///
/// The client is cloned per call; clones share one channel, so concurrent
/// calls are multiplexed over the same connection. Metadata, deadline and
/// status travel untouched in both directions.
#[derive(Clone)]
pub struct RemoteBooksService {
    inner: BooksServiceClient<Channel>,
}

impl RemoteBooksService {
    #[must_use]
    pub fn new(client: BooksServiceClient<Channel>) -> Self {
        Self { inner: client }
    }

    #[must_use]
    pub fn from_channel(channel: Channel) -> Self {
        Self::new(BooksServiceClient::new(channel))
    }
}

impl From<Channel> for RemoteBooksService {
    fn from(channel: Channel) -> Self {
        Self::from_channel(channel)
    }
}

#[tonic::async_trait]
impl BooksService for RemoteBooksService {
    async fn books_by_tags(
        &self,
        request: Request<BooksByTagsRequest>,
    ) -> Result<Response<BooksByTagsResponse>, Status> {
        self.inner.clone().books_by_tags(request).await
    }

    async fn books_by_title_year(
        &self,
        request: Request<BooksByTitleYearRequest>,
    ) -> Result<Response<BooksByTitleYearResponse>, Status> {
        self.inner.clone().books_by_title_year(request).await
    }

    async fn create_author(
        &self,
        request: Request<CreateAuthorRequest>,
    ) -> Result<Response<CreateAuthorResponse>, Status> {
        self.inner.clone().create_author(request).await
    }

    async fn create_book(
        &self,
        request: Request<CreateBookRequest>,
    ) -> Result<Response<CreateBookResponse>, Status> {
        self.inner.clone().create_book(request).await
    }

    async fn delete_book(
        &self,
        request: Request<DeleteBookRequest>,
    ) -> Result<Response<DeleteBookResponse>, Status> {
        self.inner.clone().delete_book(request).await
    }

    async fn get_author(
        &self,
        request: Request<GetAuthorRequest>,
    ) -> Result<Response<GetAuthorResponse>, Status> {
        self.inner.clone().get_author(request).await
    }

    async fn get_book(
        &self,
        request: Request<GetBookRequest>,
    ) -> Result<Response<GetBookResponse>, Status> {
        self.inner.clone().get_book(request).await
    }

    async fn update_book(
        &self,
        request: Request<UpdateBookRequest>,
    ) -> Result<Response<UpdateBookResponse>, Status> {
        self.inner.clone().update_book(request).await
    }

    async fn update_book_isbn(
        &self,
        request: Request<UpdateBookIsbnRequest>,
    ) -> Result<Response<UpdateBookIsbnResponse>, Status> {
        self.inner.clone().update_book_isbn(request).await
    }
}

/// Dial the books endpoint, retrying the connection per `cfg`.
///
/// # Errors
/// Returns an error when the endpoint stays unreachable after all retries.
pub async fn connect(uri: impl Into<String>, cfg: &GrpcClientConfig) -> Result<RemoteBooksService> {
    let service = transport_grpc::connect_with_retry::<RemoteBooksService>(uri, cfg).await?;
    tracing::info!(service = SERVICE_NAME, "remote BooksService wired");
    Ok(service)
}

/// Create a remote service whose channel connects on first call.
///
/// # Errors
/// Returns an error if the URI is invalid.
pub fn connect_lazy(uri: impl Into<String>, cfg: &GrpcClientConfig) -> Result<RemoteBooksService> {
    let service = transport_grpc::connect_lazy::<RemoteBooksService>(uri, cfg)?;
    tracing::info!(service = SERVICE_NAME, "remote BooksService wired (lazy)");
    Ok(service)
}
