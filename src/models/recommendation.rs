use serde::{Deserialize, Serialize};

use super::Book;

/// Precomputed, offline-generated list of books similar to `isbn`.
///
/// Both the key and the candidates are ISBN-13, ranked most to least similar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimilarityEntry {
    pub isbn: String,
    #[serde(default)]
    pub top_similar: Vec<String>,
}

/// Which tier of the recommendation chain produced a result
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationSource {
    /// Precomputed similarity table
    Similar,
    /// Books sharing an author with the seed
    Author,
}

/// Recommendations for a single seed book
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecommendationResult {
    pub source: RecommendationSource,
    pub books: Vec<Book>,
}

/// Recommendations derived from one of the user's seed books
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SeedRecommendations {
    pub title: String,
    pub isbn: String,
    pub recommendations: Vec<Book>,
}

/// One page of a user's personalized feed
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersonalizedRecommendations {
    pub total_books_considered: usize,
    pub current_page: usize,
    pub total_pages: usize,
    pub personalized_recommendations: Vec<SeedRecommendations>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_serialization() {
        assert_eq!(
            serde_json::to_string(&RecommendationSource::Similar).unwrap(),
            "\"similar\""
        );
        assert_eq!(
            serde_json::to_string(&RecommendationSource::Author).unwrap(),
            "\"author\""
        );
    }

    #[test]
    fn test_personalized_recommendations_keys() {
        let feed = PersonalizedRecommendations {
            total_books_considered: 0,
            current_page: 1,
            total_pages: 0,
            personalized_recommendations: vec![],
        };

        let json = serde_json::to_value(&feed).unwrap();
        assert_eq!(json["totalBooksConsidered"], 0);
        assert_eq!(json["currentPage"], 1);
        assert_eq!(json["totalPages"], 0);
        assert!(json["personalizedRecommendations"].as_array().unwrap().is_empty());
    }
}
