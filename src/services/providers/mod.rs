//! Book metadata provider abstraction
//!
//! The catalog is enriched from an external metadata source: when a stored
//! book has never been matched against the provider, and when a search finds
//! too few local results. Google Books is the only implementation.
//!
//! Review text can be polished by a generative model; Gemini backs that seam.

use crate::{error::AppResult, models::GoogleVolume};

#[cfg(test)]
use mockall::automock;

pub mod gemini;
pub mod google_books;

pub use gemini::GeminiReviewEnhancer;
pub use google_books::{isbn_from_volume, GoogleBooksProvider};

/// Trait for external book metadata sources
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait BookMetadataProvider: Send + Sync {
    /// Volumes matching an exact ISBN (10 or 13 digits)
    async fn lookup_isbn(&self, isbn: &str) -> AppResult<Vec<GoogleVolume>>;

    /// Free-text volume search
    async fn search(&self, term: &str) -> AppResult<Vec<GoogleVolume>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Trait for services that rewrite a user's review
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait ReviewEnhancer: Send + Sync {
    /// Enhanced text of `review`, written about the book titled `book_title`
    async fn enhance(&self, book_title: &str, review: &str) -> AppResult<String>;

    fn name(&self) -> &'static str;
}
