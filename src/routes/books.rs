use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::Book,
    routes::AppState,
    services::catalog::{AuthorBooks, BookReviews, PopularBooks, SearchParams, SearchResponse},
};

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub search_term: Option<String>,
    pub genre: Option<String>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

/// Handler for a single book, completed from Google Books on first access
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(isbn): Path<String>,
) -> AppResult<Json<Value>> {
    tracing::info!(request_id = %request_id, isbn = %isbn, "Fetching book");

    let book: Book = state.catalog.get_book(&isbn).await?;
    Ok(Json(json!({ "message": "Success", "book": book })))
}

pub async fn by_author(
    State(state): State<Arc<AppState>>,
    Path(isbn): Path<String>,
) -> AppResult<Json<AuthorBooks>> {
    let books = state.catalog.books_by_author(&isbn).await?;
    Ok(Json(books))
}

pub async fn reviews(
    State(state): State<Arc<AppState>>,
    Path(isbn): Path<String>,
    Query(params): Query<PageQuery>,
) -> AppResult<Json<BookReviews>> {
    let reviews = state.catalog.reviews(&isbn, params.page).await?;
    Ok(Json(reviews))
}

pub async fn popular(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageQuery>,
) -> AppResult<Json<PopularBooks>> {
    let books = state.catalog.popular(params.page).await?;
    Ok(Json(books))
}

/// Handler for catalog search
pub async fn search(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<SearchResponse>> {
    tracing::info!(
        request_id = %request_id,
        search_term = ?params.search_term,
        genre = ?params.genre,
        "Processing search request"
    );

    let response = state
        .catalog
        .search(SearchParams {
            term: params.search_term,
            genre: params.genre,
            page: params.page,
            limit: params.limit,
        })
        .await?;

    Ok(Json(response))
}

pub async fn genres(State(state): State<Arc<AppState>>) -> AppResult<Json<Value>> {
    let genres = state.catalog.genres().await?;
    Ok(Json(json!({ "genres": genres })))
}
