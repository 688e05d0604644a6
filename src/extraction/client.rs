//! HTTP adapter for the generative language API.
//!
//! One extraction is two sequential `generateContent` calls: a grounded
//! search that returns free-text notes about clinics in the postal code,
//! then a structuring call that turns those notes into JSON records.

use super::parser::{candidate_text, parse_records, service_error_message};
use super::prompts::PromptBook;
use super::responses::GenerateContentRequest;
use crate::algebras::{ExtractionError, Extractor};
use crate::error::AppError;
use crate::model::ExtractedRecord;
use crate::types::{ApiKey, PostalCode, ServiceUrl};
use async_trait::async_trait;
use reqwest::{header, Client};

const SEARCH_STAGE: &str = "search";
const STRUCTURE_STAGE: &str = "structure";

/// Extracts clinic records with a Gemini model.
pub struct GeminiExtractor {
    client: Client,
    endpoint: String,
    prompts: PromptBook,
}

impl GeminiExtractor {
    /// Creates an extractor calling `model` under `base_url`.
    pub fn new(api_key: &ApiKey, base_url: &ServiceUrl, model: &str) -> Result<Self, AppError> {
        let client = Client::builder()
            .default_headers(Self::create_headers(api_key)?)
            .build()?;
        let endpoint = base_url.endpoint(&format!("models/{}:generateContent", model));
        log::debug!("Extraction endpoint: {}", endpoint);

        Ok(Self {
            client,
            endpoint,
            prompts: PromptBook::new()?,
        })
    }

    fn create_headers(api_key: &ApiKey) -> Result<header::HeaderMap, AppError> {
        let mut headers = header::HeaderMap::new();

        let mut key = header::HeaderValue::from_str(api_key.as_str()).map_err(|e| {
            AppError::MissingConfiguration(format!("Invalid API key format: {}", e))
        })?;
        key.set_sensitive(true);
        headers.insert("x-goog-api-key", key);

        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        Ok(headers)
    }

    /// Sends one request and returns the answer text.
    async fn generate(
        &self,
        request: &GenerateContentRequest,
        stage: &'static str,
    ) -> Result<String, ExtractionError> {
        let response = self.client.post(&self.endpoint).json(request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ExtractionError::Service {
                status: status.as_u16(),
                message: service_error_message(&body),
            });
        }
        candidate_text(&body, stage)
    }
}

#[async_trait]
impl Extractor for GeminiExtractor {
    async fn extract(
        &self,
        code: &PostalCode,
        known: &[ExtractedRecord],
    ) -> Result<Vec<ExtractedRecord>, ExtractionError> {
        let search = GenerateContentRequest::from_prompt(self.prompts.search(code, known)?).with_search();
        let notes = self.generate(&search, SEARCH_STAGE).await?;
        log::debug!("{}: {} chars of search notes", code, notes.len());

        let structure =
            GenerateContentRequest::from_prompt(self.prompts.structure(code, &notes, known)?)
                .expecting_json();
        let answer = self.generate(&structure, STRUCTURE_STAGE).await?;

        let records = parse_records(&answer)?;
        log::debug!("{}: parsed {} records", code, records.len());
        Ok(records)
    }
}
