//! Store contracts consumed by the services.
//!
//! Services never talk to a database directly; they receive these traits as
//! `Arc<dyn ...>` handles so the PostgreSQL store and the in-memory store are
//! interchangeable.

#[cfg(test)]
use mockall::automock;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Book, BookReview, Page, PageRequest, SimilarityEntry, User, UserLibrary},
};

/// Popular books: many ratings and a high average
pub const POPULAR_MIN_TOTAL_RATINGS: i64 = 20_000;
pub const POPULAR_MIN_AVG_RATING: f64 = 4.0;

/// Catalog search filter. At least one of the two is set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookQuery {
    /// Case-insensitive substring matched on title, authors and genres
    pub term: Option<String>,
    /// Exact genre the book must carry
    pub genre: Option<String>,
}

/// Books and precomputed similarity data
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    async fn find_book_by_isbn10(&self, isbn: &str) -> AppResult<Option<Book>>;

    /// Matching books in catalog insertion order, regardless of the order of `isbns`
    async fn find_books_by_isbn10_list(&self, isbns: &[String]) -> AppResult<Vec<Book>>;

    /// Books sharing at least one author, excluding `exclude_isbn`
    async fn find_books_by_any_author(
        &self,
        authors: &[String],
        exclude_isbn: &str,
    ) -> AppResult<Vec<Book>>;

    async fn find_similarity_entry(&self, key: &str) -> AppResult<Option<SimilarityEntry>>;

    /// Matching books in catalog insertion order, regardless of the order of `ids`
    async fn find_books_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Book>>;

    /// Inserts or replaces the book with the same ISBN, returning the stored row
    async fn upsert_book(&self, book: &Book) -> AppResult<Book>;

    /// Books above the popularity thresholds, best first
    async fn find_popular_books(&self, page: PageRequest) -> AppResult<Page<Book>>;

    /// Matching books in catalog insertion order
    async fn search_books(&self, query: &BookQuery, page: PageRequest) -> AppResult<Page<Book>>;

    /// Genres carried by more than `min_books` books, ascending
    async fn list_genres(&self, min_books: usize) -> AppResult<Vec<String>>;
}

/// Users, their profiles and their libraries
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn create_user(&self, user: &User) -> AppResult<()>;

    /// Persists name, bio and profile image
    async fn save_profile(&self, user: &User) -> AppResult<()>;

    /// Replaces the user's shelves, ratings and reading progress
    async fn save_library(&self, user_id: Uuid, library: &UserLibrary) -> AppResult<()>;

    /// Every user's rating entry for `book_id`, reviewed or not
    async fn find_reviews_for_book(&self, book_id: Uuid) -> AppResult<Vec<BookReview>>;
}
