use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

use super::GoogleVolume;

/// Cover image URLs in the sizes Google Books provides
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub small_thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub small: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub large: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_large: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RetailPrice {
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub currency_code: Option<String>,
}

/// A catalog entry, keyed by its ISBN-10
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Identity referenced from user shelves and ratings
    pub id: Uuid,
    pub isbn: String,
    pub google_books_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub genre: Vec<String>,
    pub publisher: Option<String>,
    pub published_date: Option<String>,
    pub description: Option<String>,
    pub page_count: Option<i32>,
    pub print_type: Option<String>,
    pub image_links: Option<ImageLinks>,
    pub language: Option<String>,
    pub retail_price: Option<RetailPrice>,
    #[serde(default)]
    pub avg_rating: f64,
    #[serde(default)]
    pub total_ratings: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// Creates a bare catalog entry with no ratings or metadata
    pub fn new(isbn: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            isbn: isbn.into(),
            google_books_id: None,
            title: title.into(),
            authors: Vec::new(),
            genre: Vec::new(),
            publisher: None,
            published_date: None,
            description: None,
            page_count: None,
            print_type: None,
            image_links: None,
            language: None,
            retail_price: None,
            avg_rating: 0.0,
            total_ratings: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authors = authors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genre = genres.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_rating(mut self, avg_rating: f64, total_ratings: i64) -> Self {
        self.avg_rating = avg_rating;
        self.total_ratings = total_ratings;
        self
    }

    /// Builds a new catalog entry from a Google Books volume
    pub fn from_volume(isbn: impl Into<String>, volume: &GoogleVolume) -> Self {
        let info = &volume.volume_info;
        let mut book = Book::new(isbn, info.title.clone().unwrap_or_default());

        book.google_books_id = Some(volume.id.clone());
        book.authors = info.authors.clone().unwrap_or_default();
        book.genre = info.categories.clone().unwrap_or_default();
        book.publisher = info.publisher.clone();
        book.published_date = info.published_date.clone();
        book.description = info.description.clone();
        book.page_count = info.page_count;
        book.print_type = info.print_type.clone();
        book.image_links = info.image_links.clone();
        book.language = info.language.clone();
        book.avg_rating = info.average_rating.unwrap_or(0.0);
        book.total_ratings = info.ratings_count.unwrap_or(0);
        book.retail_price = volume
            .sale_info
            .as_ref()
            .and_then(|sale| sale.retail_price.clone());
        book
    }

    /// Fills this entry with metadata from a Google Books volume.
    ///
    /// Fields the volume supplies overwrite the stored ones. Rating figures
    /// are only taken over while the catalog has none of its own.
    pub fn merge_volume(&mut self, volume: &GoogleVolume) {
        let info = &volume.volume_info;

        self.google_books_id = Some(volume.id.clone());
        if let Some(title) = info.title.as_ref().filter(|t| !t.is_empty()) {
            self.title = title.clone();
        }
        if let Some(authors) = &info.authors {
            self.authors = authors.clone();
        }
        if let Some(categories) = &info.categories {
            self.genre = categories.clone();
        }
        self.publisher = info.publisher.clone().or(self.publisher.take());
        self.published_date = info.published_date.clone().or(self.published_date.take());
        self.description = info.description.clone().or(self.description.take());
        self.page_count = info.page_count.filter(|p| *p > 0).or(self.page_count);
        self.print_type = info.print_type.clone().or(self.print_type.take());
        self.image_links = info.image_links.clone().or(self.image_links.take());
        self.language = info.language.clone().or(self.language.take());

        if self.avg_rating == 0.0 {
            self.avg_rating = info.average_rating.unwrap_or(self.avg_rating);
        }
        if self.total_ratings == 0 {
            self.total_ratings = info.ratings_count.unwrap_or(self.total_ratings);
        }

        if let Some(price) = volume.sale_info.as_ref().and_then(|s| s.retail_price.clone()) {
            self.retail_price = Some(price);
        }

        self.updated_at = Utc::now();
    }

    /// Ordering used everywhere books are ranked: average rating descending,
    /// then number of ratings descending
    pub fn by_popularity(a: &Book, b: &Book) -> Ordering {
        b.avg_rating
            .total_cmp(&a.avg_rating)
            .then_with(|| b.total_ratings.cmp(&a.total_ratings))
    }

    pub fn shares_author_with(&self, authors: &[String]) -> bool {
        self.authors.iter().any(|a| authors.contains(a))
    }

    /// Case-insensitive substring match on title, any author or any genre.
    /// `needle` must already be lowercase.
    pub fn matches_term(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.authors.iter().any(|a| a.to_lowercase().contains(needle))
            || self.genre.iter().any(|g| g.to_lowercase().contains(needle))
    }
}

/// Sorts by popularity and keeps the top `limit`. The sort is stable.
pub fn rank_books(mut books: Vec<Book>, limit: usize) -> Vec<Book> {
    books.sort_by(Book::by_popularity);
    books.truncate(limit);
    books
}
