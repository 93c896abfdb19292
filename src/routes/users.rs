use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::{NewUser, ReadingStatus, User},
    routes::AppState,
    services::library::{
        AddBookRequest, BookStatus, Dashboard, ProfileUpdate, UserBookReview,
    },
};

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    #[serde(default)]
    pub isbn: String,
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(new_user): Json<NewUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    tracing::info!(request_id = %request_id, "Processing registration");

    let user = state.library.register(new_user).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn profile(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<User>> {
    let user = state.library.profile(user_id).await?;
    Ok(Json(user))
}

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Json(update): Json<ProfileUpdate>,
) -> AppResult<Json<Value>> {
    let user = state.library.update_profile(user_id, update).await?;
    Ok(Json(json!({ "message": "Profile updated successfully", "user": user })))
}

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Dashboard>> {
    let dashboard = state.library.dashboard(user_id).await?;
    Ok(Json(dashboard))
}

/// Handler for shelving a book
pub async fn add_book(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<Uuid>,
    Json(request): Json<AddBookRequest>,
) -> AppResult<Json<Value>> {
    tracing::info!(
        request_id = %request_id,
        user_id = %user_id,
        isbn = %request.isbn,
        status = %request.status,
        "Processing add book request"
    );

    state.library.add_book(user_id, request).await?;
    Ok(Json(json!({ "message": "Book added to your list successfully" })))
}

pub async fn book_status(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Query(params): Query<StatusQuery>,
) -> AppResult<Json<BookStatus>> {
    let status = state.library.book_status(user_id, &params.isbn).await?;
    Ok(Json(status))
}

pub async fn book_review(
    State(state): State<Arc<AppState>>,
    Path((user_id, isbn)): Path<(Uuid, String)>,
) -> AppResult<Json<UserBookReview>> {
    let review = state.library.user_book_review(user_id, &isbn).await?;
    Ok(Json(review))
}

async fn shelf_response(
    state: &AppState,
    user_id: Uuid,
    status: ReadingStatus,
) -> AppResult<Json<Value>> {
    let books = state.library.shelf(user_id, status).await?;
    Ok(Json(json!({ status.as_str(): books })))
}

pub async fn reading(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    shelf_response(&state, user_id, ReadingStatus::Reading).await
}

pub async fn completed(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    shelf_response(&state, user_id, ReadingStatus::Completed).await
}

pub async fn planned(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    shelf_response(&state, user_id, ReadingStatus::PlanToRead).await
}

pub async fn reviews(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let reviews = state.library.user_reviews(user_id).await?;
    Ok(Json(json!({ "reviews": reviews })))
}

pub async fn remove_book(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path((user_id, isbn)): Path<(Uuid, String)>,
) -> AppResult<Json<Value>> {
    tracing::info!(request_id = %request_id, user_id = %user_id, isbn = %isbn, "Removing book");

    state.library.remove_book(user_id, &isbn).await?;
    Ok(Json(json!({ "message": "Book removed from your profile" })))
}
