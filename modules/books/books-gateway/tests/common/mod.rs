#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

//! In-memory `BooksService` with a fixed seed and deterministic ids.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use books_gateway::register_books_service_handler_server;
use books_sdk::BooksService;
use books_sdk::proto::{
    Author, Book, BooksByTagsRequest, BooksByTagsResponse, BooksByTagsRow,
    BooksByTitleYearRequest, BooksByTitleYearResponse, CreateAuthorRequest, CreateAuthorResponse,
    CreateBookRequest, CreateBookResponse, DeleteBookRequest, DeleteBookResponse,
    GetAuthorRequest, GetAuthorResponse, GetBookRequest, GetBookResponse, UpdateBookIsbnRequest,
    UpdateBookIsbnResponse, UpdateBookRequest, UpdateBookResponse,
};
use gateway_runtime::ServeMux;
use http::{HeaderMap, Method, Request, StatusCode};
use http_body_util::BodyExt;
use prost_types::Timestamp;
use tonic::{Response, Status};
use tower::ServiceExt;

/// 2020-01-01T00:00:00Z
pub const DUNE_AVAILABLE: i64 = 1_577_836_800;

#[derive(Default)]
struct Shelf {
    authors: BTreeMap<i32, Author>,
    books: BTreeMap<i32, Book>,
    next_author_id: i32,
    next_book_id: i32,
}

/// Books service backed by two maps.
///
/// Seeded with author 1 and books 7 and 8; book 8 points at an author that
/// does not exist. New authors start at id 3, new books at id 9.
pub struct Library {
    shelf: Mutex<Shelf>,
    calls: Mutex<Vec<&'static str>>,
}

impl Library {
    pub fn seeded() -> Arc<Self> {
        let mut shelf = Shelf {
            next_author_id: 3,
            next_book_id: 9,
            ..Shelf::default()
        };
        shelf.authors.insert(
            1,
            Author {
                author_id: 1,
                name: "Frank Herbert".to_owned(),
            },
        );
        shelf.books.insert(
            7,
            Book {
                book_id: 7,
                author_id: 1,
                isbn: "978-0441013593".to_owned(),
                book_type: "FICTION".to_owned(),
                title: "Dune".to_owned(),
                year: 1965,
                available: Some(Timestamp {
                    seconds: DUNE_AVAILABLE,
                    nanos: 0,
                }),
                tags: vec!["scifi".to_owned(), "classic".to_owned()],
            },
        );
        shelf.books.insert(
            8,
            Book {
                book_id: 8,
                author_id: 99,
                isbn: "978-0393320978".to_owned(),
                book_type: "FICTION".to_owned(),
                title: "Beowulf".to_owned(),
                year: 1000,
                available: None,
                tags: vec!["classic".to_owned()],
            },
        );

        Arc::new(Self {
            shelf: Mutex::new(shelf),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Names of the operations invoked so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn book(&self, book_id: i32) -> Option<Book> {
        self.shelf.lock().unwrap().books.get(&book_id).cloned()
    }

    fn record(&self, op: &'static str) {
        self.calls.lock().unwrap().push(op);
    }
}

fn not_found(kind: &str, id: i32) -> Status {
    Status::not_found(format!("{kind} {id} not found"))
}

#[tonic::async_trait]
impl BooksService for Library {
    async fn books_by_tags(
        &self,
        request: tonic::Request<BooksByTagsRequest>,
    ) -> Result<Response<BooksByTagsResponse>, Status> {
        self.record("BooksByTags");
        let wanted = request.into_inner().dollar_1;
        let shelf = self.shelf.lock().unwrap();
        let list = shelf
            .books
            .values()
            .filter(|book| book.tags.iter().any(|tag| wanted.contains(tag)))
            .map(|book| BooksByTagsRow {
                book_id: book.book_id,
                title: book.title.clone(),
                name: shelf.authors.get(&book.author_id).map(|a| a.name.clone()),
                isbn: book.isbn.clone(),
                tags: book.tags.clone(),
            })
            .collect();
        Ok(Response::new(BooksByTagsResponse { list }))
    }

    async fn books_by_title_year(
        &self,
        request: tonic::Request<BooksByTitleYearRequest>,
    ) -> Result<Response<BooksByTitleYearResponse>, Status> {
        self.record("BooksByTitleYear");
        let query = request.into_inner();
        let list = self
            .shelf
            .lock()
            .unwrap()
            .books
            .values()
            .filter(|book| book.title == query.title && book.year == query.year)
            .cloned()
            .collect();
        Ok(Response::new(BooksByTitleYearResponse { list }))
    }

    async fn create_author(
        &self,
        request: tonic::Request<CreateAuthorRequest>,
    ) -> Result<Response<CreateAuthorResponse>, Status> {
        self.record("CreateAuthor");
        let name = request.into_inner().name;
        if name.is_empty() {
            return Err(Status::invalid_argument("author name is required"));
        }
        let mut shelf = self.shelf.lock().unwrap();
        let author = Author {
            author_id: shelf.next_author_id,
            name,
        };
        shelf.next_author_id += 1;
        shelf.authors.insert(author.author_id, author.clone());
        Ok(Response::new(CreateAuthorResponse {
            author: Some(author),
        }))
    }

    async fn create_book(
        &self,
        request: tonic::Request<CreateBookRequest>,
    ) -> Result<Response<CreateBookResponse>, Status> {
        self.record("CreateBook");
        let req = request.into_inner();
        let mut shelf = self.shelf.lock().unwrap();
        let book = Book {
            book_id: shelf.next_book_id,
            author_id: req.author_id,
            isbn: req.isbn,
            book_type: req.book_type,
            title: req.title,
            year: req.year,
            available: req.available,
            tags: req.tags,
        };
        shelf.next_book_id += 1;
        shelf.books.insert(book.book_id, book.clone());
        Ok(Response::new(CreateBookResponse { book: Some(book) }))
    }

    async fn delete_book(
        &self,
        request: tonic::Request<DeleteBookRequest>,
    ) -> Result<Response<DeleteBookResponse>, Status> {
        self.record("DeleteBook");
        let book_id = request.into_inner().book_id;
        self.shelf
            .lock()
            .unwrap()
            .books
            .remove(&book_id)
            .ok_or_else(|| not_found("book", book_id))?;
        Ok(Response::new(DeleteBookResponse {}))
    }

    async fn get_author(
        &self,
        request: tonic::Request<GetAuthorRequest>,
    ) -> Result<Response<GetAuthorResponse>, Status> {
        self.record("GetAuthor");
        let author_id = request.into_inner().author_id;
        let author = self
            .shelf
            .lock()
            .unwrap()
            .authors
            .get(&author_id)
            .cloned()
            .ok_or_else(|| not_found("author", author_id))?;
        Ok(Response::new(GetAuthorResponse {
            author: Some(author),
        }))
    }

    async fn get_book(
        &self,
        request: tonic::Request<GetBookRequest>,
    ) -> Result<Response<GetBookResponse>, Status> {
        self.record("GetBook");
        let book_id = request.into_inner().book_id;
        let book = self.book(book_id).ok_or_else(|| not_found("book", book_id))?;
        Ok(Response::new(GetBookResponse { book: Some(book) }))
    }

    async fn update_book(
        &self,
        request: tonic::Request<UpdateBookRequest>,
    ) -> Result<Response<UpdateBookResponse>, Status> {
        self.record("UpdateBook");
        let req = request.into_inner();
        let mut shelf = self.shelf.lock().unwrap();
        let book = shelf
            .books
            .get_mut(&req.book_id)
            .ok_or_else(|| not_found("book", req.book_id))?;
        book.title = req.title;
        book.tags = req.tags;
        book.book_type = req.book_type;
        Ok(Response::new(UpdateBookResponse {}))
    }

    async fn update_book_isbn(
        &self,
        request: tonic::Request<UpdateBookIsbnRequest>,
    ) -> Result<Response<UpdateBookIsbnResponse>, Status> {
        self.record("UpdateBookISBN");
        let req = request.into_inner();
        let mut shelf = self.shelf.lock().unwrap();
        let book = shelf
            .books
            .get_mut(&req.book_id)
            .ok_or_else(|| not_found("book", req.book_id))?;
        book.title = req.title;
        book.tags = req.tags;
        book.isbn = req.isbn;
        Ok(Response::new(UpdateBookIsbnResponse {}))
    }
}

/// Embedded gateway over `library`.
pub fn embedded(library: Arc<Library>) -> Router {
    let mut builder = ServeMux::builder();
    register_books_service_handler_server(&mut builder, library).unwrap();
    builder.build().into_router()
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: serde_json::Value,
    pub raw: Vec<u8>,
}

pub async fn send(router: &Router, method: Method, uri: &str, body: &str) -> Reply {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_owned()))
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let raw = response.into_body().collect().await.unwrap().to_bytes().to_vec();
    let body = serde_json::from_slice(&raw).unwrap();
    Reply {
        status,
        headers,
        body,
        raw,
    }
}
