use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Display;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::AppError;

/// Ratings at or above this value make a book a recommendation seed
pub const HIGH_RATING_THRESHOLD: u8 = 4;

pub const MAX_RATING: u8 = 5;

pub const DEFAULT_BIO: &str = "I am an avid reader!";

pub const DEFAULT_PROFILE_IMG: &str = "/images/default-profile.png";

/// The shelf a book sits on in a user's library
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ReadingStatus {
    PlanToRead,
    Reading,
    Completed,
}

impl ReadingStatus {
    pub const ALL: [ReadingStatus; 3] = [
        ReadingStatus::PlanToRead,
        ReadingStatus::Reading,
        ReadingStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingStatus::PlanToRead => "planToRead",
            ReadingStatus::Reading => "reading",
            ReadingStatus::Completed => "completed",
        }
    }
}

impl Display for ReadingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReadingStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReadingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| AppError::InvalidInput("Invalid reading status".to_string()))
    }
}

/// A user's rating and/or review of one book
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RatingEntry {
    pub book_id: Uuid,
    /// 0-5; `None` or 0 means unrated
    pub rating: Option<u8>,
    pub review: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RatingEntry {
    pub fn has_review(&self) -> bool {
        self.review.as_deref().is_some_and(|r| !r.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PagesRead {
    pub book_id: Uuid,
    pub pages_read: i32,
}

/// Shelves, ratings and reading progress of one user
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserLibrary {
    pub plan_to_read: Vec<Uuid>,
    pub reading: Vec<Uuid>,
    pub completed: Vec<Uuid>,
    pub ratings_and_reviews: Vec<RatingEntry>,
    pub pages_read: Vec<PagesRead>,
}

impl UserLibrary {
    pub fn shelf(&self, status: ReadingStatus) -> &[Uuid] {
        match status {
            ReadingStatus::PlanToRead => &self.plan_to_read,
            ReadingStatus::Reading => &self.reading,
            ReadingStatus::Completed => &self.completed,
        }
    }

    fn shelf_mut(&mut self, status: ReadingStatus) -> &mut Vec<Uuid> {
        match status {
            ReadingStatus::PlanToRead => &mut self.plan_to_read,
            ReadingStatus::Reading => &mut self.reading,
            ReadingStatus::Completed => &mut self.completed,
        }
    }

    /// The shelf holding `book_id`, if any
    pub fn status_of(&self, book_id: Uuid) -> Option<ReadingStatus> {
        ReadingStatus::ALL
            .into_iter()
            .find(|status| self.shelf(*status).contains(&book_id))
    }

    pub fn rating_for(&self, book_id: Uuid) -> Option<&RatingEntry> {
        self.ratings_and_reviews.iter().find(|r| r.book_id == book_id)
    }

    pub fn pages_read_for(&self, book_id: Uuid) -> i32 {
        self.pages_read
            .iter()
            .find(|p| p.book_id == book_id)
            .map(|p| p.pages_read)
            .unwrap_or(0)
    }

    /// Moves a book onto `status` (appended last) and replaces its rating,
    /// review and reading progress
    pub fn shelve(
        &mut self,
        book_id: Uuid,
        status: ReadingStatus,
        rating: Option<u8>,
        review: Option<String>,
        pages: Option<i32>,
    ) {
        let created_at = self
            .rating_for(book_id)
            .map(|r| r.created_at)
            .unwrap_or_else(Utc::now);

        self.remove(book_id);
        self.shelf_mut(status).push(book_id);
        self.ratings_and_reviews.push(RatingEntry {
            book_id,
            rating,
            review,
            created_at,
            updated_at: Utc::now(),
        });
        if let Some(pages_read) = pages {
            self.pages_read.push(PagesRead {
                book_id,
                pages_read,
            });
        }
    }

    /// Drops every trace of `book_id`. Returns whether anything was removed.
    pub fn remove(&mut self, book_id: Uuid) -> bool {
        let before = self.len_all();
        for status in ReadingStatus::ALL {
            self.shelf_mut(status).retain(|id| *id != book_id);
        }
        self.ratings_and_reviews.retain(|r| r.book_id != book_id);
        self.pages_read.retain(|p| p.book_id != book_id);
        before != self.len_all()
    }

    fn len_all(&self) -> usize {
        self.plan_to_read.len()
            + self.reading.len()
            + self.completed.len()
            + self.ratings_and_reviews.len()
            + self.pages_read.len()
    }

    /// Books the personalized feed is built from: every completed book, then
    /// every book rated at least [`HIGH_RATING_THRESHOLD`]. Each book appears
    /// once, at its first position.
    pub fn recommendation_seeds(&self) -> Vec<Uuid> {
        let high_rated = self
            .ratings_and_reviews
            .iter()
            .filter(|r| r.rating.is_some_and(|rating| rating >= HIGH_RATING_THRESHOLD))
            .map(|r| r.book_id);

        let mut seen = HashSet::new();
        self.completed
            .iter()
            .copied()
            .chain(high_rated)
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub bio: String,
    pub profile_img: String,
    #[serde(skip)]
    pub library: UserLibrary,
    pub created_at: DateTime<Utc>,
}

/// Registration payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub bio: Option<String>,
}

impl User {
    pub fn new(new_user: NewUser) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            bio: new_user
                .bio
                .filter(|b| !b.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BIO.to_string()),
            profile_img: DEFAULT_PROFILE_IMG.to_string(),
            library: UserLibrary::default(),
            created_at: Utc::now(),
        }
    }
}

/// A review of a book as shown on the book's page
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookReview {
    pub name: String,
    pub profile_img: String,
    pub rating: Option<u8>,
    pub review: Option<String>,
    pub date: DateTime<Utc>,
}
