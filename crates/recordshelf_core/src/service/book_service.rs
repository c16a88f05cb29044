//! Fixed-schema book use-cases.

use crate::model::book::{Book, BookId};
use crate::repo::book_repo::{BookListQuery, BookRepository};
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum BookServiceError {
    BookNotFound(BookId),
    Repo(RepoError),
    InconsistentState(&'static str),
}

impl Display for BookServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BookNotFound(id) => write!(f, "book not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent book state: {details}"),
        }
    }
}

impl Error for BookServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for BookServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::BookNotFound(id),
            other => Self::Repo(other),
        }
    }
}

pub struct BookService<R: BookRepository> {
    repo: R,
}

impl<R: BookRepository> BookService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Validates and stores a new book, returning it with its key.
    pub fn create_book(&self, book: &Book) -> Result<Book, BookServiceError> {
        let id = self.repo.create_book(book)?;
        self.repo
            .get_book(id)?
            .ok_or(BookServiceError::InconsistentState(
                "created book not found in read-back",
            ))
    }

    pub fn get_book(&self, id: BookId) -> Result<Book, BookServiceError> {
        self.repo
            .get_book(id)?
            .ok_or(BookServiceError::BookNotFound(id))
    }

    pub fn list_books(&self, limit: Option<u32>, offset: u32) -> Result<Vec<Book>, BookServiceError> {
        Ok(self.repo.list_books(&BookListQuery { limit, offset })?)
    }

    /// Replaces all columns of an existing book.
    pub fn update_book(&self, book: &Book) -> Result<Book, BookServiceError> {
        self.repo.update_book(book)?;
        let id = book
            .id
            .ok_or(BookServiceError::InconsistentState("updated book has no id"))?;
        self.repo
            .get_book(id)?
            .ok_or(BookServiceError::InconsistentState(
                "updated book not found in read-back",
            ))
    }

    pub fn delete_book(&self, id: BookId) -> Result<(), BookServiceError> {
        Ok(self.repo.delete_book(id)?)
    }
}
