use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::{PageRequest, PersonalizedRecommendations},
    routes::{books::PageQuery, AppState},
    services::recommendations::DEFAULT_USER_PAGE_SIZE,
};

/// Handler for recommendations seeded by one book
pub async fn for_book(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(isbn): Path<String>,
) -> AppResult<Json<Value>> {
    tracing::info!(request_id = %request_id, isbn = %isbn, "Processing book recommendation request");

    let result = state.recommender.recommend_for_seed(&isbn).await?;

    tracing::info!(
        request_id = %request_id,
        source = ?result.source,
        count = result.books.len(),
        "Book recommendations completed"
    );

    Ok(Json(json!({
        "source": result.source,
        "recommendations": result.books,
    })))
}

/// Handler for a user's personalized feed
pub async fn for_user(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<Uuid>,
    Query(params): Query<PageQuery>,
) -> AppResult<Json<PersonalizedRecommendations>> {
    tracing::info!(
        request_id = %request_id,
        user_id = %user_id,
        page = ?params.page,
        "Processing personalized recommendation request"
    );

    let feed = state
        .recommender
        .recommend_for_user(user_id, PageRequest::new(params.page, DEFAULT_USER_PAGE_SIZE))
        .await?;

    Ok(Json(feed))
}
