use books_sdk::proto::{
    Author, Book, BooksByTagsRow, BooksByTitleYearRequest, CreateAuthorRequest,
    CreateBookRequest, UpdateBookIsbnRequest, UpdateBookRequest,
};

use super::dto::{
    AuthorDto, BookDto, BooksByTagsRowDto, BooksByTitleYearQuery, CreateAuthorBody,
    CreateBookBody, Rfc3339, UpdateBookBody, UpdateBookIsbnBody,
};

impl From<Author> for AuthorDto {
    fn from(author: Author) -> Self {
        Self {
            author_id: author.author_id,
            name: author.name,
        }
    }
}

impl From<Book> for BookDto {
    fn from(book: Book) -> Self {
        Self {
            book_id: book.book_id,
            author_id: book.author_id,
            isbn: book.isbn,
            book_type: book.book_type,
            title: book.title,
            year: book.year,
            available: book.available.map(Rfc3339),
            tags: book.tags,
        }
    }
}

impl From<BooksByTagsRow> for BooksByTagsRowDto {
    fn from(row: BooksByTagsRow) -> Self {
        Self {
            book_id: row.book_id,
            title: row.title,
            name: row.name,
            isbn: row.isbn,
            tags: row.tags,
        }
    }
}

impl From<BooksByTitleYearQuery> for BooksByTitleYearRequest {
    fn from(query: BooksByTitleYearQuery) -> Self {
        Self {
            title: query.title,
            year: query.year,
        }
    }
}

impl From<CreateAuthorBody> for CreateAuthorRequest {
    fn from(body: CreateAuthorBody) -> Self {
        Self { name: body.name }
    }
}

impl From<CreateBookBody> for CreateBookRequest {
    fn from(body: CreateBookBody) -> Self {
        Self {
            author_id: body.author_id,
            isbn: body.isbn,
            book_type: body.book_type,
            title: body.title,
            year: body.year,
            available: body.available.map(|ts| ts.0),
            tags: body.tags,
        }
    }
}

impl From<UpdateBookBody> for UpdateBookRequest {
    fn from(body: UpdateBookBody) -> Self {
        Self {
            title: body.title,
            tags: body.tags,
            book_type: body.book_type,
            book_id: body.book_id,
        }
    }
}

impl From<UpdateBookIsbnBody> for UpdateBookIsbnRequest {
    fn from(body: UpdateBookIsbnBody) -> Self {
        Self {
            title: body.title,
            tags: body.tags,
            book_id: body.book_id,
            isbn: body.isbn,
        }
    }
}
