//! The books route table.
//!
//! | Verb   | Path                   | Binding      | Body       |
//! |--------|------------------------|--------------|------------|
//! | POST   | `/books-by-tags`       | body `dollar_1` | `list`  |
//! | GET    | `/books-by-title-year` | query        | `list`     |
//! | POST   | `/author`              | body         | `author`   |
//! | POST   | `/book`                | body         | `book`     |
//! | DELETE | `/book/{book_id}`      | path         | envelope   |
//! | GET    | `/author/{author_id}`  | path         | `author`   |
//! | GET    | `/book/{book_id}`      | path         | `book`     |
//! | PUT    | `/book`                | body         | envelope   |
//! | PUT    | `/book-isbn`           | body         | envelope   |

use std::sync::Arc;

use books_sdk::BooksService;
use books_sdk::methods;
use books_sdk::proto::{
    BooksByTagsRequest, BooksByTagsResponse, BooksByTitleYearRequest, BooksByTitleYearResponse,
    CreateAuthorRequest, CreateAuthorResponse, CreateBookRequest, CreateBookResponse,
    DeleteBookRequest, DeleteBookResponse, GetAuthorRequest, GetAuthorResponse, GetBookRequest,
    GetBookResponse, UpdateBookIsbnRequest, UpdateBookIsbnResponse, UpdateBookRequest,
    UpdateBookResponse,
};
use futures::future::BoxFuture;
use gateway_runtime::{
    BindInput, Binding, BodySelector, OperationDescriptor, Projection, UnaryOperation,
};
use http::Method;
use tonic::{Request, Response, Status};

use super::dto::{
    AuthorDto, BookDto, BooksByTagsRowDto, BooksByTitleYearQuery, CreateAuthorBody,
    CreateBookBody, Empty, UpdateBookBody, UpdateBookIsbnBody,
};

type Call<T> = BoxFuture<'static, Result<Response<T>, Status>>;

pub struct BooksByTags;

impl UnaryOperation for BooksByTags {
    type Service = dyn BooksService;
    type Request = BooksByTagsRequest;
    type Response = BooksByTagsResponse;
    type Body = Vec<BooksByTagsRowDto>;

    const DESCRIPTOR: OperationDescriptor = OperationDescriptor {
        rpc_method: methods::BOOKS_BY_TAGS,
        method: Method::POST,
        pattern: "/books-by-tags",
        binding: Binding::Body(BodySelector::Field("dollar_1")),
        projection: Projection::Field("list"),
    };

    fn bind(input: &BindInput) -> Result<Self::Request, Status> {
        Ok(BooksByTagsRequest {
            dollar_1: input.body_field("dollar_1")?,
        })
    }

    fn call(service: Arc<dyn BooksService>, request: Request<Self::Request>) -> Call<Self::Response> {
        Box::pin(async move { service.books_by_tags(request).await })
    }

    fn project(response: Self::Response) -> Self::Body {
        response.list.into_iter().map(Into::into).collect()
    }
}

pub struct BooksByTitleYear;

impl UnaryOperation for BooksByTitleYear {
    type Service = dyn BooksService;
    type Request = BooksByTitleYearRequest;
    type Response = BooksByTitleYearResponse;
    type Body = Vec<BookDto>;

    const DESCRIPTOR: OperationDescriptor = OperationDescriptor {
        rpc_method: methods::BOOKS_BY_TITLE_YEAR,
        method: Method::GET,
        pattern: "/books-by-title-year",
        binding: Binding::Query,
        projection: Projection::Field("list"),
    };

    fn bind(input: &BindInput) -> Result<Self::Request, Status> {
        input.query::<BooksByTitleYearQuery>().map(Into::into)
    }

    fn call(service: Arc<dyn BooksService>, request: Request<Self::Request>) -> Call<Self::Response> {
        Box::pin(async move { service.books_by_title_year(request).await })
    }

    fn project(response: Self::Response) -> Self::Body {
        response.list.into_iter().map(Into::into).collect()
    }
}

pub struct CreateAuthor;

impl UnaryOperation for CreateAuthor {
    type Service = dyn BooksService;
    type Request = CreateAuthorRequest;
    type Response = CreateAuthorResponse;
    type Body = Option<AuthorDto>;

    const DESCRIPTOR: OperationDescriptor = OperationDescriptor {
        rpc_method: methods::CREATE_AUTHOR,
        method: Method::POST,
        pattern: "/author",
        binding: Binding::Body(BodySelector::Whole),
        projection: Projection::Field("author"),
    };

    fn bind(input: &BindInput) -> Result<Self::Request, Status> {
        input.body::<CreateAuthorBody>().map(Into::into)
    }

    fn call(service: Arc<dyn BooksService>, request: Request<Self::Request>) -> Call<Self::Response> {
        Box::pin(async move { service.create_author(request).await })
    }

    fn project(response: Self::Response) -> Self::Body {
        response.author.map(Into::into)
    }
}

pub struct CreateBook;

impl UnaryOperation for CreateBook {
    type Service = dyn BooksService;
    type Request = CreateBookRequest;
    type Response = CreateBookResponse;
    type Body = Option<BookDto>;

    const DESCRIPTOR: OperationDescriptor = OperationDescriptor {
        rpc_method: methods::CREATE_BOOK,
        method: Method::POST,
        pattern: "/book",
        binding: Binding::Body(BodySelector::Whole),
        projection: Projection::Field("book"),
    };

    fn bind(input: &BindInput) -> Result<Self::Request, Status> {
        input.body::<CreateBookBody>().map(Into::into)
    }

    fn call(service: Arc<dyn BooksService>, request: Request<Self::Request>) -> Call<Self::Response> {
        Box::pin(async move { service.create_book(request).await })
    }

    fn project(response: Self::Response) -> Self::Body {
        response.book.map(Into::into)
    }
}

pub struct DeleteBook;

impl UnaryOperation for DeleteBook {
    type Service = dyn BooksService;
    type Request = DeleteBookRequest;
    type Response = DeleteBookResponse;
    type Body = Empty;

    const DESCRIPTOR: OperationDescriptor = OperationDescriptor {
        rpc_method: methods::DELETE_BOOK,
        method: Method::DELETE,
        pattern: "/book/{book_id}",
        binding: Binding::Path(&["book_id"]),
        projection: Projection::Envelope,
    };

    fn bind(input: &BindInput) -> Result<Self::Request, Status> {
        Ok(DeleteBookRequest {
            book_id: input.path_param("book_id")?,
        })
    }

    fn call(service: Arc<dyn BooksService>, request: Request<Self::Request>) -> Call<Self::Response> {
        Box::pin(async move { service.delete_book(request).await })
    }

    fn project(_response: Self::Response) -> Self::Body {
        Empty
    }
}

pub struct GetAuthor;

impl UnaryOperation for GetAuthor {
    type Service = dyn BooksService;
    type Request = GetAuthorRequest;
    type Response = GetAuthorResponse;
    type Body = Option<AuthorDto>;

    const DESCRIPTOR: OperationDescriptor = OperationDescriptor {
        rpc_method: methods::GET_AUTHOR,
        method: Method::GET,
        pattern: "/author/{author_id}",
        binding: Binding::Path(&["author_id"]),
        projection: Projection::Field("author"),
    };

    fn bind(input: &BindInput) -> Result<Self::Request, Status> {
        Ok(GetAuthorRequest {
            author_id: input.path_param("author_id")?,
        })
    }

    fn call(service: Arc<dyn BooksService>, request: Request<Self::Request>) -> Call<Self::Response> {
        Box::pin(async move { service.get_author(request).await })
    }

    fn project(response: Self::Response) -> Self::Body {
        response.author.map(Into::into)
    }
}

pub struct GetBook;

impl UnaryOperation for GetBook {
    type Service = dyn BooksService;
    type Request = GetBookRequest;
    type Response = GetBookResponse;
    type Body = Option<BookDto>;

    const DESCRIPTOR: OperationDescriptor = OperationDescriptor {
        rpc_method: methods::GET_BOOK,
        method: Method::GET,
        pattern: "/book/{book_id}",
        binding: Binding::Path(&["book_id"]),
        projection: Projection::Field("book"),
    };

    fn bind(input: &BindInput) -> Result<Self::Request, Status> {
        Ok(GetBookRequest {
            book_id: input.path_param("book_id")?,
        })
    }

    fn call(service: Arc<dyn BooksService>, request: Request<Self::Request>) -> Call<Self::Response> {
        Box::pin(async move { service.get_book(request).await })
    }

    fn project(response: Self::Response) -> Self::Body {
        response.book.map(Into::into)
    }
}

pub struct UpdateBook;

impl UnaryOperation for UpdateBook {
    type Service = dyn BooksService;
    type Request = UpdateBookRequest;
    type Response = UpdateBookResponse;
    type Body = Empty;

    const DESCRIPTOR: OperationDescriptor = OperationDescriptor {
        rpc_method: methods::UPDATE_BOOK,
        method: Method::PUT,
        pattern: "/book",
        binding: Binding::Body(BodySelector::Whole),
        projection: Projection::Envelope,
    };

    fn bind(input: &BindInput) -> Result<Self::Request, Status> {
        input.body::<UpdateBookBody>().map(Into::into)
    }

    fn call(service: Arc<dyn BooksService>, request: Request<Self::Request>) -> Call<Self::Response> {
        Box::pin(async move { service.update_book(request).await })
    }

    fn project(_response: Self::Response) -> Self::Body {
        Empty
    }
}

pub struct UpdateBookIsbn;

impl UnaryOperation for UpdateBookIsbn {
    type Service = dyn BooksService;
    type Request = UpdateBookIsbnRequest;
    type Response = UpdateBookIsbnResponse;
    type Body = Empty;

    const DESCRIPTOR: OperationDescriptor = OperationDescriptor {
        rpc_method: methods::UPDATE_BOOK_ISBN,
        method: Method::PUT,
        pattern: "/book-isbn",
        binding: Binding::Body(BodySelector::Whole),
        projection: Projection::Envelope,
    };

    fn bind(input: &BindInput) -> Result<Self::Request, Status> {
        input.body::<UpdateBookIsbnBody>().map(Into::into)
    }

    fn call(service: Arc<dyn BooksService>, request: Request<Self::Request>) -> Call<Self::Response> {
        Box::pin(async move { service.update_book_isbn(request).await })
    }

    fn project(_response: Self::Response) -> Self::Body {
        Empty
    }
}
