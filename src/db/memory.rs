use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    db::store::{
        BookQuery, CatalogStore, UserStore, POPULAR_MIN_AVG_RATING, POPULAR_MIN_TOTAL_RATINGS,
    },
    error::AppResult,
    models::{Book, BookReview, Page, PageRequest, SimilarityEntry, User, UserLibrary},
};

/// Volatile store backing both catalog and users
///
/// Books are kept in insertion order so that unsorted queries behave like a
/// table scan.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<InMemoryStoreInner>>,
}

#[derive(Default)]
struct InMemoryStoreInner {
    books: Vec<Book>,
    similar: HashMap<String, SimilarityEntry>,
    users: Vec<User>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the precomputed similarity table, replacing any entry with the same key
    pub async fn insert_similarity_entry(&self, entry: SimilarityEntry) {
        let mut inner = self.inner.write().await;
        inner.similar.insert(entry.isbn.clone(), entry);
    }
}

#[async_trait::async_trait]
impl CatalogStore for InMemoryStore {
    async fn find_book_by_isbn10(&self, isbn: &str) -> AppResult<Option<Book>> {
        let inner = self.inner.read().await;
        Ok(inner.books.iter().find(|b| b.isbn == isbn).cloned())
    }

    async fn find_books_by_isbn10_list(&self, isbns: &[String]) -> AppResult<Vec<Book>> {
        let inner = self.inner.read().await;
        Ok(inner
            .books
            .iter()
            .filter(|b| isbns.contains(&b.isbn))
            .cloned()
            .collect())
    }

    async fn find_books_by_any_author(
        &self,
        authors: &[String],
        exclude_isbn: &str,
    ) -> AppResult<Vec<Book>> {
        let inner = self.inner.read().await;
        Ok(inner
            .books
            .iter()
            .filter(|b| b.isbn != exclude_isbn && b.shares_author_with(authors))
            .cloned()
            .collect())
    }

    async fn find_similarity_entry(&self, key: &str) -> AppResult<Option<SimilarityEntry>> {
        let inner = self.inner.read().await;
        Ok(inner.similar.get(key).cloned())
    }

    async fn find_books_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Book>> {
        let inner = self.inner.read().await;
        Ok(inner
            .books
            .iter()
            .filter(|b| ids.contains(&b.id))
            .cloned()
            .collect())
    }

    async fn upsert_book(&self, book: &Book) -> AppResult<Book> {
        let mut inner = self.inner.write().await;
        match inner.books.iter_mut().find(|b| b.isbn == book.isbn) {
            Some(existing) => {
                let id = existing.id;
                let created_at = existing.created_at;
                *existing = Book {
                    id,
                    created_at,
                    ..book.clone()
                };
                Ok(existing.clone())
            }
            None => {
                inner.books.push(book.clone());
                Ok(book.clone())
            }
        }
    }

    async fn find_popular_books(&self, page: PageRequest) -> AppResult<Page<Book>> {
        let inner = self.inner.read().await;
        let mut popular: Vec<Book> = inner
            .books
            .iter()
            .filter(|b| {
                b.total_ratings >= POPULAR_MIN_TOTAL_RATINGS && b.avg_rating >= POPULAR_MIN_AVG_RATING
            })
            .cloned()
            .collect();
        popular.sort_by(Book::by_popularity);

        Ok(Page {
            total: popular.len(),
            items: page.slice(&popular).to_vec(),
        })
    }

    async fn search_books(&self, query: &BookQuery, page: PageRequest) -> AppResult<Page<Book>> {
        let needle = query.term.as_ref().map(|t| t.to_lowercase());
        let inner = self.inner.read().await;
        let matches: Vec<Book> = inner
            .books
            .iter()
            .filter(|b| needle.as_deref().map_or(true, |n| b.matches_term(n)))
            .filter(|b| query.genre.as_ref().map_or(true, |g| b.genre.contains(g)))
            .cloned()
            .collect();

        Ok(Page {
            total: matches.len(),
            items: page.slice(&matches).to_vec(),
        })
    }

    async fn list_genres(&self, min_books: usize) -> AppResult<Vec<String>> {
        let inner = self.inner.read().await;
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for genre in inner.books.iter().flat_map(|b| b.genre.iter()) {
            if !genre.is_empty() {
                *counts.entry(genre.as_str()).or_default() += 1;
            }
        }

        Ok(counts
            .into_iter()
            .filter(|(_, count)| *count > min_books)
            .map(|(genre, _)| genre.to_string())
            .collect())
    }
}

#[async_trait::async_trait]
impl UserStore for InMemoryStore {
    async fn find_user_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, user: &User) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner.users.push(user.clone());
        Ok(())
    }

    async fn save_profile(&self, user: &User) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner.users.iter_mut().find(|u| u.id == user.id) {
            existing.name = user.name.clone();
            existing.bio = user.bio.clone();
            existing.profile_img = user.profile_img.clone();
        }
        Ok(())
    }

    async fn save_library(&self, user_id: Uuid, library: &UserLibrary) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner.users.iter_mut().find(|u| u.id == user_id) {
            existing.library = library.clone();
        }
        Ok(())
    }

    async fn find_reviews_for_book(&self, book_id: Uuid) -> AppResult<Vec<BookReview>> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .iter()
            .filter_map(|user| {
                user.library.rating_for(book_id).map(|entry| BookReview {
                    name: user.name.clone(),
                    profile_img: user.profile_img.clone(),
                    rating: entry.rating,
                    review: entry.review.clone(),
                    date: entry.updated_at,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewUser, ReadingStatus};

    fn user(email: &str) -> User {
        User::new(NewUser {
            name: "Reader".to_string(),
            email: email.to_string(),
            bio: None,
        })
    }

    #[tokio::test]
    async fn test_upsert_keeps_identity() {
        let store = InMemoryStore::new();
        let original = store
            .upsert_book(&Book::new("0306406152", "First"))
            .await
            .unwrap();

        let updated = store
            .upsert_book(&Book::new("0306406152", "Second"))
            .await
            .unwrap();

        assert_eq!(updated.id, original.id);
        assert_eq!(updated.title, "Second");
        let found = store.find_book_by_isbn10("0306406152").await.unwrap().unwrap();
        assert_eq!(found.title, "Second");
    }

    #[tokio::test]
    async fn test_batch_lookups_follow_insertion_order() {
        let store = InMemoryStore::new();
        let mut ids = Vec::new();
        for isbn in ["0000000001", "0000000002", "0000000003"] {
            ids.push(store.upsert_book(&Book::new(isbn, "Ordered")).await.unwrap().id);
        }

        let by_isbn = store
            .find_books_by_isbn10_list(&["0000000003".to_string(), "0000000001".to_string()])
            .await
            .unwrap();
        let found: Vec<&str> = by_isbn.iter().map(|b| b.isbn.as_str()).collect();
        assert_eq!(found, vec!["0000000001", "0000000003"]);

        let by_id = store.find_books_by_ids(&[ids[2], ids[1]]).await.unwrap();
        assert_eq!(by_id.iter().map(|b| b.id).collect::<Vec<_>>(), vec![ids[1], ids[2]]);
    }

    #[tokio::test]
    async fn test_find_books_by_any_author_excludes_seed() {
        let store = InMemoryStore::new();
        store
            .upsert_book(&Book::new("0000000001", "Seed").with_authors(["A"]))
            .await
            .unwrap();
        store
            .upsert_book(&Book::new("0000000002", "Co").with_authors(["B", "A"]))
            .await
            .unwrap();
        store
            .upsert_book(&Book::new("0000000003", "Other").with_authors(["C"]))
            .await
            .unwrap();

        let books = store
            .find_books_by_any_author(&["A".to_string()], "0000000001")
            .await
            .unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].isbn, "0000000002");
    }

    #[tokio::test]
    async fn test_popular_books_thresholds() {
        let store = InMemoryStore::new();
        store
            .upsert_book(&Book::new("0000000001", "Hit").with_rating(4.1, 25_000))
            .await
            .unwrap();
        store
            .upsert_book(&Book::new("0000000002", "Bigger hit").with_rating(4.6, 30_000))
            .await
            .unwrap();
        store
            .upsert_book(&Book::new("0000000003", "Niche").with_rating(4.9, 50))
            .await
            .unwrap();

        let page = store
            .find_popular_books(PageRequest::new(Some(1), 10))
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].isbn, "0000000002");
    }

    #[tokio::test]
    async fn test_search_books_by_term_and_genre() {
        let store = InMemoryStore::new();
        store
            .upsert_book(&Book::new("0000000001", "Dune").with_genres(["Fiction"]))
            .await
            .unwrap();
        store
            .upsert_book(&Book::new("0000000002", "Dune Messiah").with_genres(["Classics"]))
            .await
            .unwrap();

        let query = BookQuery {
            term: Some("DUNE".to_string()),
            genre: None,
        };
        let page = store
            .search_books(&query, PageRequest::new(Some(1), 21))
            .await
            .unwrap();
        assert_eq!(page.total, 2);

        let query = BookQuery {
            term: Some("dune".to_string()),
            genre: Some("Classics".to_string()),
        };
        let page = store
            .search_books(&query, PageRequest::new(Some(1), 21))
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].title, "Dune Messiah");
    }

    #[tokio::test]
    async fn test_list_genres_threshold() {
        let store = InMemoryStore::new();
        for i in 0..3 {
            store
                .upsert_book(&Book::new(format!("000000000{}", i), "x").with_genres(["Fantasy"]))
                .await
                .unwrap();
        }
        store
            .upsert_book(&Book::new("0000000009", "y").with_genres(["Poetry"]))
            .await
            .unwrap();

        assert_eq!(store.list_genres(2).await.unwrap(), vec!["Fantasy".to_string()]);
        assert_eq!(
            store.list_genres(0).await.unwrap(),
            vec!["Fantasy".to_string(), "Poetry".to_string()]
        );
    }

    #[tokio::test]
    async fn test_library_round_trip_and_reviews() {
        let store = InMemoryStore::new();
        let reader = user("reader@example.com");
        store.create_user(&reader).await.unwrap();

        let book_id = Uuid::new_v4();
        let mut library = UserLibrary::default();
        library.shelve(book_id, ReadingStatus::Completed, Some(5), Some("Loved it".into()), None);
        store.save_library(reader.id, &library).await.unwrap();

        let found = store.find_user_by_id(reader.id).await.unwrap().unwrap();
        assert_eq!(found.library, library);

        let reviews = store.find_reviews_for_book(book_id).await.unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].review.as_deref(), Some("Loved it"));

        assert!(store
            .find_user_by_email("reader@example.com")
            .await
            .unwrap()
            .is_some());
    }
}
