//! Recommendation resolution.
//!
//! Recommendations for a seed book come from an ordered chain of strategies.
//! Each strategy either produces candidate books or passes, and the first
//! non-empty answer wins:
//!
//! 1. [`SimilarityTableStrategy`]: the precomputed similarity table, keyed by
//!    ISBN-13 (with a retry on the raw seed key for inconsistently stored
//!    rows), resolved against the catalog and re-ranked by rating.
//! 2. [`AuthorOverlapStrategy`]: books sharing at least one author with the
//!    seed.
//!
//! The personalized feed runs the same chain for every seed book of a user.

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{CatalogStore, UserStore},
    error::{AppError, AppResult},
    isbn::{to_isbn10, to_isbn13},
    models::{
        book::rank_books, Book, PageRequest, PersonalizedRecommendations, RecommendationResult,
        RecommendationSource, SeedRecommendations,
    },
};

/// Upper bound on books returned for one seed
pub const MAX_RECOMMENDATIONS: usize = 10;

/// Seed books per page of the personalized feed
pub const DEFAULT_USER_PAGE_SIZE: usize = 4;

/// One tier of the recommendation chain
#[async_trait::async_trait]
pub trait RecommendationStrategy: Send + Sync {
    /// Tag attached to results this strategy produces
    fn source(&self) -> RecommendationSource;

    /// Ranked candidates for `seed_isbn10`, or `None` when this tier has
    /// nothing to offer and the next one should be tried
    async fn candidates(
        &self,
        catalog: &dyn CatalogStore,
        seed_isbn10: &str,
    ) -> AppResult<Option<Vec<Book>>>;
}

/// Looks the seed up in the precomputed similarity table
pub struct SimilarityTableStrategy;

#[async_trait::async_trait]
impl RecommendationStrategy for SimilarityTableStrategy {
    fn source(&self) -> RecommendationSource {
        RecommendationSource::Similar
    }

    async fn candidates(
        &self,
        catalog: &dyn CatalogStore,
        seed_isbn10: &str,
    ) -> AppResult<Option<Vec<Book>>> {
        let mut top_similar = Vec::new();

        if let Some(isbn13) = to_isbn13(seed_isbn10) {
            if let Some(entry) = catalog.find_similarity_entry(&isbn13).await? {
                top_similar = entry.top_similar;
            }
        }

        // Some rows are keyed by the catalog's own format
        if top_similar.is_empty() {
            if let Some(entry) = catalog.find_similarity_entry(seed_isbn10).await? {
                top_similar = entry.top_similar;
            }
        }

        if top_similar.is_empty() {
            tracing::debug!(isbn = %seed_isbn10, "No similarity entry for seed");
            return Ok(None);
        }

        let isbn10_list: Vec<String> = top_similar.iter().filter_map(|c| to_isbn10(c)).collect();
        let books = catalog.find_books_by_isbn10_list(&isbn10_list).await?;

        tracing::debug!(
            isbn = %seed_isbn10,
            listed = top_similar.len(),
            convertible = isbn10_list.len(),
            in_catalog = books.len(),
            "Resolved similarity candidates"
        );

        Ok(Some(rank_books(books, MAX_RECOMMENDATIONS)))
    }
}

/// Books sharing at least one author with the seed
pub struct AuthorOverlapStrategy;

#[async_trait::async_trait]
impl RecommendationStrategy for AuthorOverlapStrategy {
    fn source(&self) -> RecommendationSource {
        RecommendationSource::Author
    }

    async fn candidates(
        &self,
        catalog: &dyn CatalogStore,
        seed_isbn10: &str,
    ) -> AppResult<Option<Vec<Book>>> {
        let Some(seed) = catalog.find_book_by_isbn10(seed_isbn10).await? else {
            return Ok(None);
        };

        if seed.authors.is_empty() {
            return Ok(None);
        }

        let books = catalog
            .find_books_by_any_author(&seed.authors, seed_isbn10)
            .await?;

        Ok(Some(rank_books(books, MAX_RECOMMENDATIONS)))
    }
}

/// Resolves recommendations for seed books and users
///
/// Holds only shared store handles, so clones are cheap and resolution is
/// safe to run concurrently.
#[derive(Clone)]
pub struct RecommendationResolver {
    catalog: Arc<dyn CatalogStore>,
    users: Arc<dyn UserStore>,
    strategies: Arc<[Box<dyn RecommendationStrategy>]>,
}

impl RecommendationResolver {
    /// Resolver with the default chain: similarity table, then author overlap
    pub fn new(catalog: Arc<dyn CatalogStore>, users: Arc<dyn UserStore>) -> Self {
        Self::with_strategies(
            catalog,
            users,
            vec![
                Box::new(SimilarityTableStrategy),
                Box::new(AuthorOverlapStrategy),
            ],
        )
    }

    pub fn with_strategies(
        catalog: Arc<dyn CatalogStore>,
        users: Arc<dyn UserStore>,
        strategies: Vec<Box<dyn RecommendationStrategy>>,
    ) -> Self {
        Self {
            catalog,
            users,
            strategies: strategies.into(),
        }
    }

    /// Runs the strategy chain for one seed ISBN-10.
    ///
    /// When every tier comes up empty the result is an empty list tagged with
    /// the last tier's source.
    pub async fn resolve_similar(&self, seed_isbn10: &str) -> AppResult<RecommendationResult> {
        let mut last_source = RecommendationSource::Author;

        for strategy in self.strategies.iter() {
            last_source = strategy.source();
            match strategy.candidates(self.catalog.as_ref(), seed_isbn10).await? {
                Some(books) if !books.is_empty() => {
                    tracing::debug!(
                        isbn = %seed_isbn10,
                        source = ?last_source,
                        count = books.len(),
                        "Recommendations resolved"
                    );
                    return Ok(RecommendationResult {
                        source: last_source,
                        books,
                    });
                }
                _ => continue,
            }
        }

        Ok(RecommendationResult {
            source: last_source,
            books: Vec::new(),
        })
    }

    /// Recommendations for a book that must exist in the catalog
    pub async fn recommend_for_seed(&self, isbn: &str) -> AppResult<RecommendationResult> {
        if self.catalog.find_book_by_isbn10(isbn).await?.is_none() {
            return Err(AppError::NotFound("Book not found".to_string()));
        }

        self.resolve_similar(isbn).await
    }

    /// One page of the user's personalized feed.
    ///
    /// Seeds are the user's completed and highly rated books. Seeds on the
    /// page are resolved concurrently; any failure fails the whole page.
    pub async fn recommend_for_user(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> AppResult<PersonalizedRecommendations> {
        let user = self
            .users
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let seeds = user.library.recommendation_seeds();
        let total = seeds.len();
        let page_ids = page.slice(&seeds);

        let mut seed_books = self.catalog.find_books_by_ids(page_ids).await?;
        seed_books.sort_by_key(|book| page_ids.iter().position(|id| *id == book.id));

        if seed_books.len() < page_ids.len() {
            tracing::warn!(
                user_id = %user_id,
                missing = page_ids.len() - seed_books.len(),
                "Seed books missing from catalog"
            );
        }

        let mut tasks = Vec::with_capacity(seed_books.len());
        for book in seed_books {
            let resolver = self.clone();
            tasks.push(tokio::spawn(async move {
                let result = resolver.resolve_similar(&book.isbn).await?;
                Ok::<_, AppError>(SeedRecommendations {
                    title: book.title,
                    isbn: book.isbn,
                    recommendations: result.books,
                })
            }));
        }

        let mut personalized = Vec::with_capacity(tasks.len());
        for task in tasks {
            let seed = task
                .await
                .map_err(|e| AppError::Internal(format!("Recommendation task failed: {}", e)))??;
            personalized.push(seed);
        }

        tracing::info!(
            user_id = %user_id,
            seeds = total,
            page = page.page,
            resolved = personalized.len(),
            "Personalized recommendations built"
        );

        Ok(PersonalizedRecommendations {
            total_books_considered: total,
            current_page: page.page,
            total_pages: page.total_pages(total),
            personalized_recommendations: personalized,
        })
    }
}
