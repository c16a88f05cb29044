//! Fixed-schema book repository.
//!
//! # Responsibility
//! - Provide CRUD APIs over the typed `books` table.
//!
//! # Invariants
//! - Write paths call `Book::validate()` before SQL mutations.
//! - Read paths reject invalid persisted rows instead of masking them.

use crate::model::book::{Book, BookId};
use crate::repo::{ensure_table_ready, push_pagination, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const BOOK_SELECT_SQL: &str = "SELECT
    id,
    name,
    author,
    last_readed
FROM books";

/// Pagination options for listing books.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookListQuery {
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for fixed-schema book CRUD.
pub trait BookRepository {
    fn create_book(&self, book: &Book) -> RepoResult<BookId>;
    fn update_book(&self, book: &Book) -> RepoResult<()>;
    fn get_book(&self, id: BookId) -> RepoResult<Option<Book>>;
    fn list_books(&self, query: &BookListQuery) -> RepoResult<Vec<Book>>;
    fn delete_book(&self, id: BookId) -> RepoResult<()>;
}

/// SQLite-backed book repository.
pub struct SqliteBookRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBookRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, "books", &["id", "name", "author", "last_readed"])?;
        Ok(Self { conn })
    }
}

impl BookRepository for SqliteBookRepository<'_> {
    fn create_book(&self, book: &Book) -> RepoResult<BookId> {
        book.validate()?;
        if let Some(id) = book.id {
            return Err(RepoError::InvalidData(format!(
                "book already persisted with id {id}"
            )));
        }

        self.conn.execute(
            "INSERT INTO books (name, author, last_readed) VALUES (?1, ?2, ?3);",
            params![book.name.as_str(), book.author.as_str(), book.last_readed],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn update_book(&self, book: &Book) -> RepoResult<()> {
        book.validate()?;
        let id = book
            .id
            .ok_or_else(|| RepoError::InvalidData("cannot update unsaved book".to_string()))?;

        let changed = self.conn.execute(
            "UPDATE books
             SET
                name = ?1,
                author = ?2,
                last_readed = ?3
             WHERE id = ?4;",
            params![book.name.as_str(), book.author.as_str(), book.last_readed, id],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn get_book(&self, id: BookId) -> RepoResult<Option<Book>> {
        let book = self
            .conn
            .query_row(
                &format!("{BOOK_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_book_row,
            )
            .optional()?;

        match book {
            Some(book) => {
                book.validate()?;
                Ok(Some(book))
            }
            None => Ok(None),
        }
    }

    fn list_books(&self, query: &BookListQuery) -> RepoResult<Vec<Book>> {
        let mut sql = format!("{BOOK_SELECT_SQL} ORDER BY id ASC");
        let mut bind_values: Vec<Value> = Vec::new();
        push_pagination(&mut sql, &mut bind_values, query.limit, query.offset);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut books = Vec::new();
        while let Some(row) = rows.next()? {
            let book = parse_book_row(row)?;
            book.validate()?;
            books.push(book);
        }

        Ok(books)
    }

    fn delete_book(&self, id: BookId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM books WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

fn parse_book_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: Some(row.get("id")?),
        name: row.get("name")?,
        author: row.get("author")?,
        last_readed: row.get("last_readed")?,
    })
}
