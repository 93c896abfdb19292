use axum::{
    http::{HeaderValue, Method, StatusCode},
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    db::{CatalogStore, UserStore},
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
    services::{
        providers::{BookMetadataProvider, ReviewEnhancer},
        CatalogService, LibraryService, RecommendationResolver, ReviewService,
    },
};

pub mod books;
pub mod recommendations;
pub mod reviews;
pub mod users;

/// Shared application state
pub struct AppState {
    pub catalog: CatalogService,
    pub library: LibraryService,
    pub recommender: RecommendationResolver,
    pub reviews: ReviewService,
}

impl AppState {
    /// Wires every service to the same stores and external providers
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        users: Arc<dyn UserStore>,
        metadata: Arc<dyn BookMetadataProvider>,
        enhancer: Arc<dyn ReviewEnhancer>,
    ) -> Self {
        Self {
            catalog: CatalogService::new(catalog.clone(), users.clone(), metadata),
            library: LibraryService::new(catalog.clone(), users.clone()),
            recommender: RecommendationResolver::new(catalog, users),
            reviews: ReviewService::new(enhancer),
        }
    }
}

/// Creates the application router with all routes
///
/// `frontend_uri` restricts CORS to one origin; any origin is allowed when unset.
pub fn create_router(state: Arc<AppState>, frontend_uri: Option<&str>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(cors_layer(frontend_uri)),
        )
}

/// API routes under /api
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/books/popular", get(books::popular))
        .route("/books/search", get(books::search))
        .route("/books/genres", get(books::genres))
        .route("/books/:isbn/author", get(books::by_author))
        .route("/books/:isbn/reviews", get(books::reviews))
        .route("/books/:isbn", get(books::get_book))
        .route("/recommendation/book/:isbn", get(recommendations::for_book))
        .route("/recommendation/user/:user_id", get(recommendations::for_user))
        .route("/users", post(users::register))
        .route(
            "/users/:user_id/profile",
            get(users::profile).put(users::update_profile),
        )
        .route("/users/:user_id/dashboard", get(users::dashboard))
        .route("/users/:user_id/book", post(users::add_book))
        .route("/users/:user_id/book/status", get(users::book_status))
        .route("/users/:user_id/book/:isbn/review", get(users::book_review))
        .route("/users/:user_id/reading", get(users::reading))
        .route("/users/:user_id/completed", get(users::completed))
        .route("/users/:user_id/planned", get(users::planned))
        .route("/users/:user_id/reviews", get(users::reviews))
        .route("/users/:user_id/books/:isbn", delete(users::remove_book))
        .route("/gemini/enhance", post(reviews::enhance))
}

fn cors_layer(frontend_uri: Option<&str>) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    match frontend_uri.and_then(|uri| HeaderValue::from_str(uri).ok()) {
        Some(origin) => cors.allow_origin(origin),
        None => cors.allow_origin(Any),
    }
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
