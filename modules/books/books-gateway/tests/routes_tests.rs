#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Every books route served in-process against the seeded [`Library`].

mod common;

use std::sync::Arc;

use books_gateway::register_books_service_handler_server;
use books_sdk::BooksService;
use common::{Library, embedded, send};
use gateway_runtime::{RegistryError, ServeMux};
use http::{Method, StatusCode};
use serde_json::json;

/// Implements nothing; every call gets the generated `Unimplemented`.
struct Bare;

impl BooksService for Bare {}

#[tokio::test]
async fn get_book_projects_the_book_field() {
    let router = embedded(Library::seeded());

    let reply = send(&router, Method::GET, "/book/7", "").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        reply.body,
        json!({
            "bookId": 7,
            "authorId": 1,
            "isbn": "978-0441013593",
            "bookType": "FICTION",
            "title": "Dune",
            "year": 1965,
            "available": "2020-01-01T00:00:00Z",
            "tags": ["scifi", "classic"],
        })
    );
}

#[tokio::test]
async fn unset_timestamp_is_null() {
    let router = embedded(Library::seeded());

    let reply = send(&router, Method::GET, "/book/8", "").await;
    assert_eq!(reply.body["available"], serde_json::Value::Null);
}

#[tokio::test]
async fn missing_book_is_404_with_status_envelope() {
    let router = embedded(Library::seeded());

    let reply = send(&router, Method::GET, "/book/404", "").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(
        reply.body,
        json!({"code": 5, "message": "book 404 not found", "details": []})
    );
}

#[tokio::test]
async fn non_numeric_book_id_never_reaches_the_service() {
    let library = Library::seeded();
    let router = embedded(Arc::clone(&library));

    let reply = send(&router, Method::GET, "/book/abc", "").await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["code"], 3);
    assert!(
        reply.body["message"]
            .as_str()
            .unwrap()
            .starts_with("type mismatch, parameter: book_id")
    );
    assert!(library.calls().is_empty());
}

#[tokio::test]
async fn book_id_beyond_int32_is_rejected() {
    let library = Library::seeded();
    let router = embedded(Arc::clone(&library));

    let reply = send(&router, Method::DELETE, "/book/4294967296", "").await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(library.calls().is_empty());
}

#[tokio::test]
async fn delete_book_returns_empty_object() {
    let library = Library::seeded();
    let router = embedded(Arc::clone(&library));

    let reply = send(&router, Method::DELETE, "/book/7", "").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.raw, b"{}");
    assert_eq!(library.calls(), ["DeleteBook"]);
    assert!(library.book(7).is_none());
}

#[tokio::test]
async fn get_author_projects_the_author_field() {
    let router = embedded(Library::seeded());

    let reply = send(&router, Method::GET, "/author/1", "").await;
    assert_eq!(reply.body, json!({"authorId": 1, "name": "Frank Herbert"}));
}

#[tokio::test]
async fn create_author_assigns_next_id() {
    let router = embedded(Library::seeded());

    let reply = send(&router, Method::POST, "/author", r#"{"name":"Ursula K. Le Guin"}"#).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, json!({"authorId": 3, "name": "Ursula K. Le Guin"}));

    let reply = send(&router, Method::GET, "/author/3", "").await;
    assert_eq!(reply.body["name"], "Ursula K. Le Guin");
}

#[tokio::test]
async fn create_author_with_empty_body_sends_default_request() {
    let library = Library::seeded();
    let router = embedded(Arc::clone(&library));

    let reply = send(&router, Method::POST, "/author", "").await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["message"], "author name is required");
    assert_eq!(library.calls(), ["CreateAuthor"]);
}

#[tokio::test]
async fn create_book_accepts_json_and_proto_names() {
    let library = Library::seeded();
    let router = embedded(Arc::clone(&library));

    let body = r#"{
        "author_id": 1,
        "isbn": "978-0441172719",
        "bookType": "FICTION",
        "title": "Dune Messiah",
        "year": "1969",
        "available": "2021-06-01T12:30:00.250+02:00",
        "tags": ["scifi"]
    }"#;
    let reply = send(&router, Method::POST, "/book", body).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["bookId"], 9);
    assert_eq!(reply.body["year"], 1969);
    assert_eq!(reply.body["available"], "2021-06-01T10:30:00.250Z");

    let stored = library.book(9).unwrap();
    assert_eq!(stored.author_id, 1);
    assert_eq!(stored.book_type, "FICTION");
}

#[tokio::test]
async fn create_book_with_empty_body_creates_blank_book() {
    let library = Library::seeded();
    let router = embedded(Arc::clone(&library));

    let reply = send(&router, Method::POST, "/book", "").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        reply.body,
        json!({
            "bookId": 9,
            "authorId": 0,
            "isbn": "",
            "bookType": "",
            "title": "",
            "year": 0,
            "available": null,
            "tags": [],
        })
    );
}

#[tokio::test]
async fn malformed_book_body_is_400() {
    let library = Library::seeded();
    let router = embedded(Arc::clone(&library));

    let reply = send(&router, Method::POST, "/book", r#"{"year": "nineteen"}"#).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["code"], 3);
    assert!(library.calls().is_empty());
}

#[tokio::test]
async fn non_object_book_body_never_reaches_the_service() {
    let library = Library::seeded();
    let router = embedded(Arc::clone(&library));

    for (method, path, body) in [
        (Method::POST, "/book", "[]"),
        (Method::POST, "/author", "\"Ursula\""),
        (Method::PUT, "/book-isbn", "\"x\""),
        (Method::PUT, "/book", "42"),
    ] {
        let reply = send(&router, method, path, body).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "{path} {body}");
        assert_eq!(reply.body["code"], 3);
    }
    assert!(library.calls().is_empty());
}

#[tokio::test]
async fn bad_field_messages_name_the_field() {
    let router = embedded(Library::seeded());

    for (method, path, body, field) in [
        (Method::PUT, "/book-isbn", r#"{"bookId":true}"#, "bookId"),
        (Method::POST, "/book", r#"{"authorId":true}"#, "authorId"),
        (Method::POST, "/book", r#"{"tags":"scifi"}"#, "tags"),
        (Method::POST, "/book", r#"{"available":"soon"}"#, "available"),
        (Method::POST, "/books-by-tags", r#"{"tag":"x"}"#, "dollar_1"),
    ] {
        let reply = send(&router, method, path, body).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "{body}");
        let message = reply.body["message"].as_str().unwrap();
        assert!(message.contains(field), "{message}");
        assert!(!message.contains("struct "), "{message}");
        assert!(!message.contains("enum "), "{message}");
    }
}

#[tokio::test]
async fn response_keys_follow_field_order() {
    let router = embedded(Library::seeded());

    let reply = send(&router, Method::GET, "/book/8", "").await;
    let text = String::from_utf8(reply.raw).unwrap();
    assert!(
        text.starts_with(r#"{"bookId":8,"authorId":"#),
        "{text}"
    );
    let order: Vec<usize> = ["\"isbn\"", "\"bookType\"", "\"title\"", "\"year\"", "\"available\"", "\"tags\""]
        .iter()
        .map(|key| text.find(key).unwrap())
        .collect();
    assert!(order.windows(2).all(|pair| pair[0] < pair[1]), "{text}");
}

#[tokio::test]
async fn books_by_tags_binds_body_to_the_tag_list() {
    let router = embedded(Library::seeded());

    let reply = send(&router, Method::POST, "/books-by-tags", r#"["classic"]"#).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        reply.body,
        json!([
            {
                "bookId": 7,
                "title": "Dune",
                "name": "Frank Herbert",
                "isbn": "978-0441013593",
                "tags": ["scifi", "classic"],
            },
            {
                "bookId": 8,
                "title": "Beowulf",
                "name": null,
                "isbn": "978-0393320978",
                "tags": ["classic"],
            },
        ])
    );
}

#[tokio::test]
async fn books_by_tags_without_match_is_empty_array() {
    let router = embedded(Library::seeded());

    let reply = send(&router, Method::POST, "/books-by-tags", r#"["poetry"]"#).await;
    assert_eq!(reply.raw, b"[]");
}

#[tokio::test]
async fn books_by_title_year_reads_the_query() {
    let router = embedded(Library::seeded());

    let reply = send(&router, Method::GET, "/books-by-title-year?title=Dune&year=1965", "").await;
    assert_eq!(reply.status, StatusCode::OK);
    let list = reply.body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["bookId"], 7);

    let reply = send(&router, Method::GET, "/books-by-title-year?title=Dune&year=1966", "").await;
    assert_eq!(reply.body, json!([]));
}

#[tokio::test]
async fn books_by_title_year_rejects_unknown_keys() {
    let library = Library::seeded();
    let router = embedded(Arc::clone(&library));

    let reply = send(&router, Method::GET, "/books-by-title-year?author=Herbert", "").await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(library.calls().is_empty());
}

#[tokio::test]
async fn update_book_rewrites_the_record() {
    let library = Library::seeded();
    let router = embedded(Arc::clone(&library));

    let body = r#"{"bookId": 7, "title": "Dune (1965)", "tags": ["sf"], "book_type": "NOVEL"}"#;
    let reply = send(&router, Method::PUT, "/book", body).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.raw, b"{}");

    let book = library.book(7).unwrap();
    assert_eq!(book.title, "Dune (1965)");
    assert_eq!(book.tags, ["sf"]);
    assert_eq!(book.book_type, "NOVEL");
    assert_eq!(book.isbn, "978-0441013593");
}

#[tokio::test]
async fn update_book_isbn_rewrites_the_isbn() {
    let library = Library::seeded();
    let router = embedded(Arc::clone(&library));

    let body = r#"{"book_id": 8, "title": "Beowulf", "tags": [], "isbn": "978-0374111199"}"#;
    let reply = send(&router, Method::PUT, "/book-isbn", body).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.raw, b"{}");
    assert_eq!(library.calls(), ["UpdateBookISBN"]);
    assert_eq!(library.book(8).unwrap().isbn, "978-0374111199");
}

#[tokio::test]
async fn update_of_missing_book_is_404() {
    let router = embedded(Library::seeded());

    let reply = send(&router, Method::PUT, "/book", r#"{"bookId": 55}"#).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn wrong_verb_on_known_path_is_405() {
    let router = embedded(Library::seeded());

    let reply = send(&router, Method::PATCH, "/book", "{}").await;
    assert_eq!(reply.status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn unimplemented_operation_is_501() {
    let mut builder = ServeMux::builder();
    register_books_service_handler_server(&mut builder, Arc::new(Bare)).unwrap();
    let router = builder.build().into_router();

    let reply = send(&router, Method::GET, "/author/1", "").await;
    assert_eq!(reply.status, StatusCode::NOT_IMPLEMENTED);
    assert_eq!(reply.body["code"], 12);
}

#[test]
fn registering_twice_is_rejected() {
    let mut builder = ServeMux::builder();
    register_books_service_handler_server(&mut builder, Library::seeded()).unwrap();

    let err = register_books_service_handler_server(&mut builder, Library::seeded()).unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateRoute { .. }));
}

#[test]
fn all_nine_routes_are_registered() {
    let mut builder = ServeMux::builder();
    register_books_service_handler_server(&mut builder, Library::seeded()).unwrap();
    let mux = builder.build();

    let rpcs: Vec<_> = mux.descriptors().map(|d| d.rpc_method).collect();
    assert_eq!(
        rpcs,
        [
            books_sdk::methods::BOOKS_BY_TAGS,
            books_sdk::methods::BOOKS_BY_TITLE_YEAR,
            books_sdk::methods::CREATE_AUTHOR,
            books_sdk::methods::CREATE_BOOK,
            books_sdk::methods::DELETE_BOOK,
            books_sdk::methods::GET_AUTHOR,
            books_sdk::methods::GET_BOOK,
            books_sdk::methods::UPDATE_BOOK,
            books_sdk::methods::UPDATE_BOOK_ISBN,
        ]
    );
}
