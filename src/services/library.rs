//! Per-user reading library: registration, profile, shelves, ratings and
//! reviews.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    db::{CatalogStore, UserStore},
    error::{AppError, AppResult},
    models::{
        user::MAX_RATING, Book, ImageLinks, NewUser, ReadingStatus, RatingEntry, User,
        UserLibrary,
    },
};

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

/// Request to put a book on one of the user's shelves
#[derive(Debug, Clone, Deserialize)]
pub struct AddBookRequest {
    pub isbn: String,
    pub status: String,
    #[serde(default)]
    pub pages: Option<i32>,
    #[serde(default)]
    pub rating: Option<i64>,
    #[serde(default)]
    pub review: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub books_planned: usize,
    pub books_reading: usize,
    pub books_completed: usize,
    pub total_reviews: usize,
    pub total_ratings: usize,
    /// Two decimals, "0.00" when nothing is rated
    pub avg_rating: String,
}

/// How many of the user's entries carry each rating
#[derive(Debug, Default, Serialize, PartialEq)]
pub struct RatingsStats {
    #[serde(rename = "N/A")]
    pub unrated: usize,
    #[serde(rename = "1")]
    pub one: usize,
    #[serde(rename = "2")]
    pub two: usize,
    #[serde(rename = "3")]
    pub three: usize,
    #[serde(rename = "4")]
    pub four: usize,
    #[serde(rename = "5")]
    pub five: usize,
}

impl RatingsStats {
    fn record(&mut self, rating: Option<u8>) {
        match rating.unwrap_or(0) {
            1 => self.one += 1,
            2 => self.two += 1,
            3 => self.three += 1,
            4 => self.four += 1,
            5 => self.five += 1,
            _ => self.unrated += 1,
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub bio: String,
    pub stats: DashboardStats,
    pub ratings_stats: RatingsStats,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookStatus {
    pub already_added: bool,
    pub status: Option<ReadingStatus>,
}

/// A shelved book with the user's progress and rating
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShelfEntry {
    #[serde(flatten)]
    pub book: Book,
    pub pages_read: i32,
    pub rating: Option<u8>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookSummary {
    pub isbn: String,
    pub title: String,
    pub authors: Vec<String>,
    pub image_links: Option<ImageLinks>,
}

impl From<&Book> for BookSummary {
    fn from(book: &Book) -> Self {
        Self {
            isbn: book.isbn.clone(),
            title: book.title.clone(),
            authors: book.authors.clone(),
            image_links: book.image_links.clone(),
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserReview {
    #[serde(flatten)]
    pub entry: RatingEntry,
    /// `None` when the book has since left the catalog
    pub book: Option<BookSummary>,
    pub pages_read: i32,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserBookReview {
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages_read: Option<i32>,
}

#[derive(Clone)]
pub struct LibraryService {
    catalog: Arc<dyn CatalogStore>,
    users: Arc<dyn UserStore>,
}

impl LibraryService {
    pub fn new(catalog: Arc<dyn CatalogStore>, users: Arc<dyn UserStore>) -> Self {
        Self { catalog, users }
    }

    async fn require_user(&self, user_id: Uuid) -> AppResult<User> {
        self.users
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    async fn require_book(&self, isbn: &str) -> AppResult<Book> {
        self.catalog
            .find_book_by_isbn10(isbn)
            .await?
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))
    }

    pub async fn register(&self, new_user: NewUser) -> AppResult<User> {
        let new_user = NewUser {
            name: new_user.name.trim().to_string(),
            email: new_user.email.trim().to_lowercase(),
            bio: new_user.bio,
        };

        if new_user.name.is_empty() || new_user.email.is_empty() {
            return Err(AppError::InvalidInput(
                "Enter all essential details".to_string(),
            ));
        }

        if self.users.find_user_by_email(&new_user.email).await?.is_some() {
            return Err(AppError::InvalidInput("User already exists".to_string()));
        }

        let user = User::new(new_user);
        self.users.create_user(&user).await?;

        tracing::info!(user_id = %user.id, "User registered");

        Ok(user)
    }

    pub async fn profile(&self, user_id: Uuid) -> AppResult<User> {
        self.require_user(user_id).await
    }

    /// Blank fields leave the stored value untouched
    pub async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> AppResult<User> {
        let mut user = self.require_user(user_id).await?;

        if let Some(name) = update.name.filter(|n| !n.trim().is_empty()) {
            user.name = name;
        }
        if let Some(bio) = update.bio.filter(|b| !b.trim().is_empty()) {
            user.bio = bio;
        }

        self.users.save_profile(&user).await?;
        Ok(user)
    }

    pub async fn dashboard(&self, user_id: Uuid) -> AppResult<Dashboard> {
        let user = self.require_user(user_id).await?;
        let library = &user.library;
        let entries = &library.ratings_and_reviews;

        let total_reviews = entries.iter().filter(|r| r.has_review()).count();
        let total_ratings = entries
            .iter()
            .filter(|r| r.rating.is_some_and(|rating| rating > 0))
            .count();
        let rating_sum: u32 = entries
            .iter()
            .map(|r| u32::from(r.rating.unwrap_or(0)))
            .sum();
        let avg_rating = if total_ratings > 0 {
            format!("{:.2}", f64::from(rating_sum) / total_ratings as f64)
        } else {
            "0.00".to_string()
        };

        let mut ratings_stats = RatingsStats::default();
        for entry in entries {
            ratings_stats.record(entry.rating);
        }

        Ok(Dashboard {
            bio: user.bio.clone(),
            stats: DashboardStats {
                books_planned: library.plan_to_read.len(),
                books_reading: library.reading.len(),
                books_completed: library.completed.len(),
                total_reviews,
                total_ratings,
                avg_rating,
            },
            ratings_stats,
        })
    }

    /// Moves a book onto a shelf and replaces the user's rating, review and
    /// progress for it
    pub async fn add_book(&self, user_id: Uuid, request: AddBookRequest) -> AppResult<()> {
        let status: ReadingStatus = request.status.parse()?;

        let rating = request
            .rating
            .map(|r| {
                u8::try_from(r)
                    .ok()
                    .filter(|r| *r <= MAX_RATING)
                    .ok_or_else(|| {
                        AppError::InvalidInput(format!("Rating must be between 0 and {}", MAX_RATING))
                    })
            })
            .transpose()?;

        let book = self.require_book(&request.isbn).await?;
        let mut user = self.require_user(user_id).await?;

        user.library
            .shelve(book.id, status, rating, request.review, request.pages);
        self.users.save_library(user.id, &user.library).await?;

        tracing::info!(
            user_id = %user_id,
            isbn = %book.isbn,
            status = %status,
            "Book shelved"
        );

        Ok(())
    }

    pub async fn book_status(&self, user_id: Uuid, isbn: &str) -> AppResult<BookStatus> {
        if isbn.trim().is_empty() {
            return Err(AppError::InvalidInput("ISBN is required".to_string()));
        }

        let book = self.require_book(isbn).await?;
        let user = self.require_user(user_id).await?;
        let status = user.library.status_of(book.id);

        Ok(BookStatus {
            already_added: status.is_some(),
            status,
        })
    }

    /// Books on one shelf, in the order they were shelved
    pub async fn shelf(&self, user_id: Uuid, status: ReadingStatus) -> AppResult<Vec<ShelfEntry>> {
        let user = self.require_user(user_id).await?;
        let library = &user.library;
        let ids = library.shelf(status);

        let mut books = self.catalog.find_books_by_ids(ids).await?;
        books.sort_by_key(|book| ids.iter().position(|id| *id == book.id));

        Ok(books
            .into_iter()
            .map(|book| ShelfEntry {
                pages_read: library.pages_read_for(book.id),
                rating: library.rating_for(book.id).and_then(|r| r.rating),
                book,
            })
            .collect())
    }

    /// Entries of the user carrying a non-blank review
    pub async fn user_reviews(&self, user_id: Uuid) -> AppResult<Vec<UserReview>> {
        let user = self.require_user(user_id).await?;
        let library: &UserLibrary = &user.library;

        let reviewed: Vec<&RatingEntry> = library
            .ratings_and_reviews
            .iter()
            .filter(|r| r.has_review())
            .collect();
        let ids: Vec<Uuid> = reviewed.iter().map(|r| r.book_id).collect();
        let books = self.catalog.find_books_by_ids(&ids).await?;

        Ok(reviewed
            .into_iter()
            .map(|entry| UserReview {
                book: books
                    .iter()
                    .find(|b| b.id == entry.book_id)
                    .map(BookSummary::from),
                pages_read: library.pages_read_for(entry.book_id),
                entry: entry.clone(),
            })
            .collect())
    }

    pub async fn user_book_review(&self, user_id: Uuid, isbn: &str) -> AppResult<UserBookReview> {
        let book = self.require_book(isbn).await?;
        let user = self.require_user(user_id).await?;

        let Some(entry) = user.library.rating_for(book.id) else {
            return Ok(UserBookReview {
                exists: false,
                book_title: None,
                rating: None,
                review: None,
                pages_read: None,
            });
        };

        Ok(UserBookReview {
            exists: true,
            book_title: Some(book.title),
            rating: entry.rating,
            review: entry.review.clone(),
            pages_read: Some(user.library.pages_read_for(book.id)),
        })
    }

    pub async fn remove_book(&self, user_id: Uuid, isbn: &str) -> AppResult<()> {
        let book = self.require_book(isbn).await?;
        let mut user = self.require_user(user_id).await?;

        if user.library.remove(book.id) {
            self.users.save_library(user.id, &user.library).await?;
            tracing::info!(user_id = %user_id, isbn = %isbn, "Book removed from library");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryStore;

    struct Fixture {
        store: InMemoryStore,
        library: LibraryService,
    }

    async fn fixture() -> Fixture {
        let store = InMemoryStore::new();
        for (isbn, title) in [
            ("0306406152", "First"),
            ("080442957X", "Second"),
            ("0451524934", "Third"),
        ] {
            store.upsert_book(&Book::new(isbn, title)).await.unwrap();
        }
        let library = LibraryService::new(Arc::new(store.clone()), Arc::new(store.clone()));
        Fixture { store, library }
    }

    async fn register(f: &Fixture) -> User {
        f.library
            .register(NewUser {
                name: "Reader".to_string(),
                email: "Reader@Example.com".to_string(),
                bio: None,
            })
            .await
            .unwrap()
    }

    fn add(isbn: &str, status: &str, rating: Option<i64>, review: Option<&str>) -> AddBookRequest {
        AddBookRequest {
            isbn: isbn.to_string(),
            status: status.to_string(),
            pages: Some(42),
            rating,
            review: review.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates_and_blanks() {
        let f = fixture().await;
        let user = register(&f).await;
        assert_eq!(user.email, "reader@example.com");

        let duplicate = f
            .library
            .register(NewUser {
                name: "Other".to_string(),
                email: "reader@example.com".to_string(),
                bio: None,
            })
            .await;
        assert!(matches!(duplicate, Err(AppError::InvalidInput(msg)) if msg == "User already exists"));

        let blank = f
            .library
            .register(NewUser {
                name: "  ".to_string(),
                email: "x@example.com".to_string(),
                bio: None,
            })
            .await;
        assert!(matches!(blank, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_update_profile_ignores_blank_fields() {
        let f = fixture().await;
        let user = register(&f).await;

        let updated = f
            .library
            .update_profile(
                user.id,
                ProfileUpdate {
                    name: Some("".to_string()),
                    bio: Some("Reads at night".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Reader");
        let stored = f.library.profile(user.id).await.unwrap();
        assert_eq!(stored.bio, "Reads at night");
    }

    #[tokio::test]
    async fn test_add_book_moves_between_shelves() {
        let f = fixture().await;
        let user = register(&f).await;

        f.library
            .add_book(user.id, add("0306406152", "reading", None, None))
            .await
            .unwrap();
        f.library
            .add_book(user.id, add("0306406152", "completed", Some(5), Some("Great")))
            .await
            .unwrap();

        let status = f.library.book_status(user.id, "0306406152").await.unwrap();
        assert_eq!(
            status,
            BookStatus {
                already_added: true,
                status: Some(ReadingStatus::Completed)
            }
        );
        assert!(f
            .library
            .shelf(user.id, ReadingStatus::Reading)
            .await
            .unwrap()
            .is_empty());

        let completed = f.library.shelf(user.id, ReadingStatus::Completed).await.unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].rating, Some(5));
        assert_eq!(completed[0].pages_read, 42);
    }

    #[tokio::test]
    async fn test_add_book_validation() {
        let f = fixture().await;
        let user = register(&f).await;

        let bad_status = f
            .library
            .add_book(user.id, add("0306406152", "finished", None, None))
            .await;
        assert!(matches!(bad_status, Err(AppError::InvalidInput(_))));

        let bad_rating = f
            .library
            .add_book(user.id, add("0306406152", "reading", Some(6), None))
            .await;
        assert!(matches!(bad_rating, Err(AppError::InvalidInput(_))));

        let unknown_book = f
            .library
            .add_book(user.id, add("0140449132", "reading", None, None))
            .await;
        assert!(matches!(unknown_book, Err(AppError::NotFound(_))));

        let unknown_user = f
            .library
            .add_book(Uuid::new_v4(), add("0306406152", "reading", None, None))
            .await;
        assert!(matches!(unknown_user, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_shelf_keeps_shelving_order() {
        let f = fixture().await;
        let user = register(&f).await;

        for isbn in ["0451524934", "0306406152", "080442957X"] {
            f.library
                .add_book(user.id, add(isbn, "planToRead", None, None))
                .await
                .unwrap();
        }

        let titles: Vec<String> = f
            .library
            .shelf(user.id, ReadingStatus::PlanToRead)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.book.title)
            .collect();
        assert_eq!(titles, vec!["Third", "First", "Second"]);
    }

    #[tokio::test]
    async fn test_dashboard_stats() {
        let f = fixture().await;
        let user = register(&f).await;

        f.library
            .add_book(user.id, add("0306406152", "completed", Some(5), Some("Loved it")))
            .await
            .unwrap();
        f.library
            .add_book(user.id, add("080442957X", "reading", Some(4), Some("  ")))
            .await
            .unwrap();
        f.library
            .add_book(user.id, add("0451524934", "planToRead", None, None))
            .await
            .unwrap();

        let dashboard = f.library.dashboard(user.id).await.unwrap();
        assert_eq!(dashboard.stats.books_completed, 1);
        assert_eq!(dashboard.stats.books_reading, 1);
        assert_eq!(dashboard.stats.books_planned, 1);
        assert_eq!(dashboard.stats.total_reviews, 1);
        assert_eq!(dashboard.stats.total_ratings, 2);
        assert_eq!(dashboard.stats.avg_rating, "4.50");
        assert_eq!(dashboard.ratings_stats.five, 1);
        assert_eq!(dashboard.ratings_stats.four, 1);
        assert_eq!(dashboard.ratings_stats.unrated, 1);
    }

    #[tokio::test]
    async fn test_dashboard_without_ratings() {
        let f = fixture().await;
        let user = register(&f).await;

        let dashboard = f.library.dashboard(user.id).await.unwrap();
        assert_eq!(dashboard.stats.avg_rating, "0.00");
        assert_eq!(dashboard.ratings_stats, RatingsStats::default());
    }

    #[tokio::test]
    async fn test_reviews_and_removal() {
        let f = fixture().await;
        let user = register(&f).await;

        f.library
            .add_book(user.id, add("0306406152", "completed", Some(3), Some("Fine")))
            .await
            .unwrap();
        f.library
            .add_book(user.id, add("080442957X", "completed", Some(4), None))
            .await
            .unwrap();

        let reviews = f.library.user_reviews(user.id).await.unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].book.as_ref().map(|b| b.title.as_str()), Some("First"));
        assert_eq!(reviews[0].pages_read, 42);

        let review = f.library.user_book_review(user.id, "0306406152").await.unwrap();
        assert!(review.exists);
        assert_eq!(review.book_title.as_deref(), Some("First"));
        assert_eq!(review.rating, Some(3));

        f.library.remove_book(user.id, "0306406152").await.unwrap();

        let review = f.library.user_book_review(user.id, "0306406152").await.unwrap();
        assert!(!review.exists);
        let stored = f.store.find_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.library.completed.len(), 1);
        assert_eq!(stored.library.pages_read.len(), 1);
    }
}
