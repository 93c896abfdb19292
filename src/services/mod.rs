pub mod catalog;
pub mod library;
pub mod providers;
pub mod recommendations;
pub mod reviews;

pub use catalog::CatalogService;
pub use library::LibraryService;
pub use recommendations::RecommendationResolver;
pub use reviews::ReviewService;
