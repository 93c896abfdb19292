//! Gemini review enhancer
//!
//! API Flow:
//! POST /models/{model}:generateContent?key={key} → candidates with text parts
//!
//! Responses are not cached; the same review is rarely enhanced twice.
use crate::{
    error::{AppError, AppResult},
    models::{GenerateContentRequest, GenerateContentResponse},
    services::providers::ReviewEnhancer,
};
use reqwest::Client as HttpClient;

#[derive(Clone)]
pub struct GeminiReviewEnhancer {
    http_client: HttpClient,
    api_key: Option<String>,
    api_url: String,
    model: String,
}

impl GeminiReviewEnhancer {
    pub fn new(api_key: Option<String>, api_url: String, model: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            model,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_url, self.model)
    }
}

/// Instruction sent to the model: polish wording, keep the content
pub fn build_prompt(book_title: &str, review: &str) -> String {
    format!(
        "Enhance the following review for the book titled \"{book_title}\". \
         Make it more descriptive but ensure that the description stays true to the \
         original review (i.e. do not add more content to the review):\n\n\"{review}\" \
         Note - Only return one version of the review. Do not return any unnecessary \
         comments as the response will be shown to the users using this service."
    )
}

#[async_trait::async_trait]
impl ReviewEnhancer for GeminiReviewEnhancer {
    async fn enhance(&self, book_title: &str, review: &str) -> AppResult<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(AppError::ExternalApi(
                "Review enhancement is not configured".to_string(),
            ));
        };

        let body = GenerateContentRequest::from_prompt(build_prompt(book_title, review));

        let response = self
            .http_client
            .post(self.endpoint())
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %body,
                "Gemini request failed"
            );
            return Err(AppError::ExternalApi(format!(
                "Gemini API returned status {}",
                status
            )));
        }

        let generated: GenerateContentResponse = response.json().await?;
        let text = generated
            .text()
            .ok_or_else(|| AppError::ExternalApi("Gemini returned no text".to_string()))?;

        tracing::info!(
            model = %self.model,
            provider = self.name(),
            "Review enhanced"
        );

        Ok(text)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}
