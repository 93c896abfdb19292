/// Google Books API provider
///
/// API Flow:
/// 1. ISBN lookup: /volumes?q=isbn:{isbn} → volumes carrying that identifier
/// 2. Search: /volumes?q={term}&maxResults=40 → best matches for free text
///
/// Both responses are cached in Redis.
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    isbn::to_isbn10,
    models::{GoogleVolume, IndustryIdentifier, VolumeInfo, VolumesResponse},
    services::providers::BookMetadataProvider,
};
use reqwest::Client as HttpClient;

const ISBN_CACHE_TTL: u64 = 604800; // 1 week
const SEARCH_CACHE_TTL: u64 = 3600; // 1 hour
const SEARCH_MAX_RESULTS: &str = "40";

#[derive(Clone)]
pub struct GoogleBooksProvider {
    http_client: HttpClient,
    api_key: Option<String>,
    api_url: String,
    cache: Cache,
}

impl GoogleBooksProvider {
    pub fn new(cache: Cache, api_key: Option<String>, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            cache,
        }
    }

    /// Query parameters shared by every call, plus the API key when configured
    fn query_params<'a>(&'a self, q: &'a str, extra: &[(&'a str, &'a str)]) -> Vec<(&'a str, &'a str)> {
        let mut params = vec![("q", q)];
        params.extend_from_slice(extra);
        if let Some(key) = self.api_key.as_deref() {
            params.push(("key", key));
        }
        params
    }

    async fn fetch_volumes(&self, params: &[(&str, &str)]) -> AppResult<Vec<GoogleVolume>> {
        let url = format!("{}/volumes", self.api_url);

        let response = self.http_client.get(&url).query(params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %body,
                "Google Books request failed"
            );
            return Err(AppError::ExternalApi(format!(
                "Google Books API returned status {}: {}",
                status, body
            )));
        }

        let volumes: VolumesResponse = response.json().await?;
        Ok(volumes.items)
    }
}

/// Catalog key for a volume: its ISBN-10 identifier, or its ISBN-13 converted
/// to ISBN-10. `None` when neither is usable.
pub fn isbn_from_volume(info: &VolumeInfo) -> Option<String> {
    fn find<'a>(identifiers: &'a [IndustryIdentifier], kind: &str) -> Option<&'a str> {
        identifiers
            .iter()
            .find(|id| id.id_type == kind)
            .map(|id| id.identifier.as_str())
    }

    let identifiers = info.industry_identifiers.as_deref()?;

    if let Some(isbn10) = find(identifiers, "ISBN_10") {
        return Some(isbn10.to_string());
    }

    find(identifiers, "ISBN_13").and_then(to_isbn10)
}

#[async_trait::async_trait]
impl BookMetadataProvider for GoogleBooksProvider {
    async fn lookup_isbn(&self, isbn: &str) -> AppResult<Vec<GoogleVolume>> {
        cached!(
            self.cache,
            CacheKey::IsbnLookup(isbn.to_string()),
            ISBN_CACHE_TTL,
            async move {
                let q = format!("isbn:{}", isbn);
                let volumes = self.fetch_volumes(&self.query_params(&q, &[])).await?;

                tracing::info!(
                    isbn = %isbn,
                    volumes = volumes.len(),
                    provider = self.name(),
                    "ISBN lookup completed"
                );

                Ok::<_, AppError>(volumes)
            }
        )
    }

    async fn search(&self, term: &str) -> AppResult<Vec<GoogleVolume>> {
        if term.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search term cannot be empty".to_string(),
            ));
        }

        cached!(
            self.cache,
            CacheKey::VolumeSearch(term.to_string()),
            SEARCH_CACHE_TTL,
            async move {
                let params = self.query_params(term, &[("maxResults", SEARCH_MAX_RESULTS)]);
                let volumes = self.fetch_volumes(&params).await?;

                tracing::info!(
                    term = %term,
                    volumes = volumes.len(),
                    provider = self.name(),
                    "Volume search completed"
                );

                Ok::<_, AppError>(volumes)
            }
        )
    }

    fn name(&self) -> &'static str {
        "google_books"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identifiers(pairs: &[(&str, &str)]) -> VolumeInfo {
        VolumeInfo {
            industry_identifiers: Some(
                pairs
                    .iter()
                    .map(|(kind, id)| IndustryIdentifier {
                        id_type: kind.to_string(),
                        identifier: id.to_string(),
                    })
                    .collect(),
            ),
            ..Default::default()
        }
    }

    async fn create_test_provider(api_key: Option<&str>) -> GoogleBooksProvider {
        let client = redis::Client::open("redis://localhost:6379").unwrap();
        GoogleBooksProvider::new(
            Cache::new(client).await.0,
            api_key.map(str::to_string),
            "http://test.local".to_string(),
        )
    }

    #[test]
    fn test_isbn_from_volume_prefers_isbn10() {
        let info = identifiers(&[("ISBN_13", "9780553804577"), ("ISBN_10", "055380457X")]);
        assert_eq!(isbn_from_volume(&info).as_deref(), Some("055380457X"));
    }

    #[test]
    fn test_isbn_from_volume_converts_isbn13() {
        let info = identifiers(&[("ISBN_13", "9780306406153")]);
        assert_eq!(isbn_from_volume(&info).as_deref(), Some("0306406152"));
    }

    #[test]
    fn test_isbn_from_volume_rejects_979_and_other_ids() {
        let info = identifiers(&[("ISBN_13", "9791032305690"), ("OTHER", "UOM:39015")]);
        assert_eq!(isbn_from_volume(&info), None);
        assert_eq!(isbn_from_volume(&VolumeInfo::default()), None);
    }

    #[tokio::test]
    async fn test_query_params_include_key_when_configured() {
        let provider = create_test_provider(Some("secret")).await;
        let params = provider.query_params("isbn:0306406152", &[]);
        assert_eq!(params, vec![("q", "isbn:0306406152"), ("key", "secret")]);
    }

    #[tokio::test]
    async fn test_query_params_without_key() {
        let provider = create_test_provider(None).await;
        let params = provider.query_params("dune", &[("maxResults", SEARCH_MAX_RESULTS)]);
        assert_eq!(params, vec![("q", "dune"), ("maxResults", "40")]);
    }

    #[tokio::test]
    async fn test_search_rejects_blank_term() {
        let provider = create_test_provider(None).await;
        let result = provider.search("   ").await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }
}
