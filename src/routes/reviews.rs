use axum::{extract::State, Extension, Json};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    routes::AppState,
    services::reviews::{EnhanceReviewRequest, EnhancedReview},
};

/// Handler that rewrites a review with the configured language model
pub async fn enhance(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<EnhanceReviewRequest>,
) -> AppResult<Json<EnhancedReview>> {
    tracing::info!(request_id = %request_id, "Enhancing review");

    let enhanced = state.reviews.enhance(request).await?;
    Ok(Json(enhanced))
}
