use serde::Serialize;
use std::sync::Arc;

use crate::{
    db::{BookQuery, CatalogStore, UserStore},
    error::{AppError, AppResult},
    models::{book::rank_books, Book, BookReview, Page, PageRequest},
    services::providers::{isbn_from_volume, BookMetadataProvider},
};

pub const AUTHOR_BOOKS_LIMIT: usize = 20;
pub const POPULAR_PAGE_SIZE: usize = 10;
pub const DEFAULT_SEARCH_LIMIT: usize = 21;
/// Larger client-supplied limits are capped to this
pub const MAX_SEARCH_LIMIT: usize = 100;
pub const REVIEWS_PAGE_SIZE: usize = 5;

/// A genre must be used by more than this many books to be listed
pub const GENRE_MIN_BOOKS: usize = 100;

/// Searches with fewer catalog matches than this also ask the provider
const SEARCH_ENRICH_BELOW: usize = 20;

#[derive(Debug, Serialize)]
pub struct AuthorBooks {
    pub author: Vec<String>,
    pub books: Vec<Book>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularBooks {
    pub total_books: usize,
    pub current_page: usize,
    pub total_pages: usize,
    pub books: Vec<Book>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub fallback: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_results: Option<usize>,
    pub current_page: usize,
    pub total_pages: usize,
    pub books: Vec<Book>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookReviews {
    pub total_reviews: usize,
    pub current_page: usize,
    pub total_pages: usize,
    pub reviews: Vec<BookReview>,
}

/// Parameters of a catalog search as received from the client
#[derive(Debug, Default, Clone)]
pub struct SearchParams {
    pub term: Option<String>,
    pub genre: Option<String>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

/// Read side of the catalog, with on-demand enrichment from the metadata provider
#[derive(Clone)]
pub struct CatalogService {
    catalog: Arc<dyn CatalogStore>,
    users: Arc<dyn UserStore>,
    metadata: Arc<dyn BookMetadataProvider>,
}

impl CatalogService {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        users: Arc<dyn UserStore>,
        metadata: Arc<dyn BookMetadataProvider>,
    ) -> Self {
        Self {
            catalog,
            users,
            metadata,
        }
    }

    async fn require_book(&self, isbn: &str) -> AppResult<Book> {
        self.catalog
            .find_book_by_isbn10(isbn)
            .await?
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))
    }

    /// Returns a catalog book, completing it from the provider the first time
    /// it is requested.
    pub async fn get_book(&self, isbn: &str) -> AppResult<Book> {
        let mut book = self.require_book(isbn).await?;

        if book.google_books_id.is_some() {
            return Ok(book);
        }

        let volumes = match self.metadata.lookup_isbn(isbn).await {
            Ok(volumes) => volumes,
            Err(e) => {
                tracing::warn!(
                    isbn = %isbn,
                    provider = self.metadata.name(),
                    error = %e,
                    "Metadata lookup failed"
                );
                Vec::new()
            }
        };

        let Some(volume) = volumes.first() else {
            return Err(AppError::NotFound("No data from Google API".to_string()));
        };

        book.merge_volume(volume);
        let book = self.catalog.upsert_book(&book).await?;

        tracing::info!(isbn = %isbn, title = %book.title, "Book enriched from provider");

        Ok(book)
    }

    pub async fn books_by_author(&self, isbn: &str) -> AppResult<AuthorBooks> {
        let book = self
            .catalog
            .find_book_by_isbn10(isbn)
            .await?
            .filter(|b| !b.authors.is_empty())
            .ok_or_else(|| AppError::NotFound("No authors found for this book".to_string()))?;

        let books = self
            .catalog
            .find_books_by_any_author(&book.authors, isbn)
            .await?;

        Ok(AuthorBooks {
            author: book.authors,
            books: rank_books(books, AUTHOR_BOOKS_LIMIT),
        })
    }

    pub async fn popular(&self, page: Option<usize>) -> AppResult<PopularBooks> {
        let page = PageRequest::new(page, POPULAR_PAGE_SIZE);
        let Page { items, total } = self.catalog.find_popular_books(page).await?;

        Ok(PopularBooks {
            total_books: total,
            current_page: page.page,
            total_pages: page.total_pages(total),
            books: items,
        })
    }

    /// Free-text and genre search over the catalog.
    ///
    /// Thin result sets for a term trigger a provider search whose volumes are
    /// added to the catalog before the query is repeated.
    pub async fn search(&self, params: SearchParams) -> AppResult<SearchResponse> {
        let term = params
            .term
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        let genre = params.genre.filter(|g| !g.is_empty());
        let page = PageRequest::new(
            params.page,
            params
                .limit
                .filter(|l| *l > 0)
                .map_or(DEFAULT_SEARCH_LIMIT, |l| l.min(MAX_SEARCH_LIMIT)),
        );

        if term.is_none() && genre.is_none() {
            let Page { items, total } = self.catalog.find_popular_books(page).await?;
            return Ok(SearchResponse {
                fallback: true,
                message: "No search term provided. Showing popular books.".to_string(),
                results: None,
                total_results: None,
                current_page: page.page,
                total_pages: page.total_pages(total),
                books: items,
            });
        }

        let query = BookQuery {
            term: term.clone(),
            genre,
        };
        let mut found = self.catalog.search_books(&query, page).await?;

        if let Some(term) = term.as_deref() {
            if found.total < SEARCH_ENRICH_BELOW {
                let added = self.import_search_results(term).await?;
                if added > 0 {
                    found = self.catalog.search_books(&query, page).await?;
                }
            }
        }

        tracing::info!(
            term = ?term,
            genre = ?query.genre,
            total = found.total,
            page = page.page,
            "Catalog search completed"
        );

        Ok(SearchResponse {
            fallback: false,
            message: format!("Search results for: {}", term.as_deref().unwrap_or_default()),
            results: Some(found.items.len()),
            total_results: Some(found.total),
            current_page: page.page,
            total_pages: page.total_pages(found.total),
            books: found.items,
        })
    }

    /// Adds provider volumes that are not yet in the catalog. Returns how many
    /// were inserted.
    async fn import_search_results(&self, term: &str) -> AppResult<usize> {
        let volumes = match self.metadata.search(term).await {
            Ok(volumes) => volumes,
            Err(e) => {
                tracing::warn!(
                    term = %term,
                    provider = self.metadata.name(),
                    error = %e,
                    "Provider search failed"
                );
                return Ok(0);
            }
        };

        let mut added = 0;
        for volume in &volumes {
            let Some(isbn) = isbn_from_volume(&volume.volume_info) else {
                continue;
            };
            if self.catalog.find_book_by_isbn10(&isbn).await?.is_some() {
                continue;
            }
            self.catalog
                .upsert_book(&Book::from_volume(isbn, volume))
                .await?;
            added += 1;
        }

        tracing::info!(
            term = %term,
            returned = volumes.len(),
            added,
            "Imported provider search results"
        );

        Ok(added)
    }

    pub async fn genres(&self) -> AppResult<Vec<String>> {
        self.catalog.list_genres(GENRE_MIN_BOOKS).await
    }

    /// Rated, non-blank reviews of a book from every user
    pub async fn reviews(&self, isbn: &str, page: Option<usize>) -> AppResult<BookReviews> {
        let book = self.require_book(isbn).await?;
        let page = PageRequest::new(page, REVIEWS_PAGE_SIZE);

        let reviews: Vec<BookReview> = self
            .users
            .find_reviews_for_book(book.id)
            .await?
            .into_iter()
            .filter(|r| r.rating.is_some())
            .filter(|r| r.review.as_deref().is_some_and(|t| !t.trim().is_empty()))
            .collect();

        Ok(BookReviews {
            total_reviews: reviews.len(),
            current_page: page.page,
            total_pages: page.total_pages(reviews.len()),
            reviews: page.slice(&reviews).to_vec(),
        })
    }
}
