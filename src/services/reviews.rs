//! Review enhancement: validates the request and delegates the rewrite to the
//! configured [`ReviewEnhancer`].

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    services::providers::ReviewEnhancer,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhanceReviewRequest {
    #[serde(default)]
    pub review: Option<String>,
    #[serde(default)]
    pub book_title: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedReview {
    pub enhanced_review: String,
}

#[derive(Clone)]
pub struct ReviewService {
    enhancer: Arc<dyn ReviewEnhancer>,
}

impl ReviewService {
    pub fn new(enhancer: Arc<dyn ReviewEnhancer>) -> Self {
        Self { enhancer }
    }

    pub async fn enhance(&self, request: EnhanceReviewRequest) -> AppResult<EnhancedReview> {
        let review = non_blank(request.review.as_deref());
        let book_title = non_blank(request.book_title.as_deref());

        let (Some(review), Some(book_title)) = (review, book_title) else {
            return Err(AppError::InvalidInput(
                "Review and bookTitle are required".to_string(),
            ));
        };

        let enhanced = self.enhancer.enhance(book_title, review).await?;

        tracing::info!(
            book_title = %book_title,
            provider = self.enhancer.name(),
            "Review enhancement completed"
        );

        Ok(EnhancedReview {
            enhanced_review: enhanced.trim().to_string(),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
