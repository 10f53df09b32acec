//! Backend API client for the Labwise server.
//!
//! Thin typed layer over the four endpoints the client consumes: upload,
//! job status, biomarkers, and categories. Every call runs inside
//! [`with_retry`], so callers see either a value or a classified
//! [`ApiError`] — never a raw transport error.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::biomarker::dedupe::dedupe;
use crate::biomarker::Biomarker;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::job::poller::JobStatusSource;
use crate::net::connectivity::NetworkStatus;
use crate::net::retry::{with_retry, RetryPolicy};

/// Connect timeout; request bodies are small, uploads excepted.
const CONNECT_TIMEOUT_SECS: u64 = 10;
/// Overall per-request timeout.
const REQUEST_TIMEOUT_SECS: u64 = 60;
/// Page size for biomarker history fetches.
const BIOMARKER_PAGE_SIZE: u32 = 200;

/// Response from `POST /upload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub file_id: String,
    pub filename: String,
    pub status: String,
}

/// Response from `GET /status/{file_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub status: String,
    pub error_message: Option<String>,
}

/// Query parameters for `GET /biomarkers`.
#[derive(Debug, Clone)]
pub struct BiomarkerQuery {
    pub profile_id: Uuid,
    pub category: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

/// Error body shape the backend uses for non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

/// Typed client for the Labwise backend.
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    connectivity: NetworkStatus,
    retry: RetryPolicy,
}

impl ApiClient {
    /// Build a client from configuration and the shared connectivity flag.
    pub fn new(config: &ClientConfig, connectivity: NetworkStatus) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            http,
            connectivity,
            retry: config.retry.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Upload a PDF report for asynchronous processing. The returned
    /// `file_id` feeds the job poller.
    pub async fn upload_report(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadResponse, ApiError> {
        let url = format!("{}/upload", self.base_url);
        with_retry(&self.connectivity, &self.retry, || {
            let url = url.clone();
            let filename = filename.to_string();
            let bytes = bytes.clone();
            async move {
                let part = reqwest::multipart::Part::bytes(bytes)
                    .file_name(filename)
                    .mime_str("application/pdf")
                    .map_err(|e| ApiError::Client {
                        status: 0,
                        message: format!("Invalid upload part: {e}"),
                    })?;
                let form = reqwest::multipart::Form::new().part("file", part);
                let response = self
                    .http
                    .post(&url)
                    .multipart(form)
                    .send()
                    .await
                    .map_err(ApiError::from)?;
                Self::decode(response).await
            }
        })
        .await
    }

    /// Current processing status of an uploaded report.
    pub async fn job_status(&self, file_id: &str) -> Result<JobStatusResponse, ApiError> {
        self.get_json(&format!("/status/{file_id}"), &[]).await
    }

    /// One page of biomarker records for a profile.
    pub async fn biomarkers(&self, query: &BiomarkerQuery) -> Result<Vec<Biomarker>, ApiError> {
        let mut params: Vec<(&str, String)> = vec![
            ("profile_id", query.profile_id.to_string()),
            ("limit", query.limit.to_string()),
            ("offset", query.offset.to_string()),
        ];
        if let Some(category) = &query.category {
            params.push(("category", category.clone()));
        }
        self.get_json("/biomarkers", &params).await
    }

    /// Full deduplicated biomarker history for a profile — pages through
    /// the offset contract until a short page. The dashboard ranking needs
    /// the complete set to compute global recency.
    pub async fn fetch_all_biomarkers(
        &self,
        profile_id: Uuid,
        category: Option<&str>,
    ) -> Result<Vec<Biomarker>, ApiError> {
        let mut merged = Vec::new();
        let mut offset = 0;
        loop {
            let page = self
                .biomarkers(&BiomarkerQuery {
                    profile_id,
                    category: category.map(String::from),
                    limit: BIOMARKER_PAGE_SIZE,
                    offset,
                })
                .await?;
            let page_len = page.len() as u32;
            merged.extend(page);
            if page_len < BIOMARKER_PAGE_SIZE {
                break;
            }
            offset += BIOMARKER_PAGE_SIZE;
        }
        tracing::debug!(profile_id = %profile_id, records = merged.len(), "Biomarker history fetched");
        Ok(dedupe(merged))
    }

    /// Available biomarker categories for filter dropdowns.
    pub async fn categories(&self) -> Result<Vec<String>, ApiError> {
        self.get_json("/biomarkers/categories", &[]).await
    }

    // ── Internal ────────────────────────────────────────────

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        with_retry(&self.connectivity, &self.retry, || {
            let url = url.clone();
            async move {
                let response = self
                    .http
                    .get(&url)
                    .query(params)
                    .send()
                    .await
                    .map_err(ApiError::from)?;
                Self::decode(response).await
            }
        })
        .await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(
                status.as_u16(),
                extract_error_message(&body, status),
            ));
        }
        response.json::<T>().await.map_err(ApiError::from)
    }
}

impl JobStatusSource for ApiClient {
    fn fetch_status(
        &self,
        file_id: &str,
    ) -> impl std::future::Future<Output = Result<JobStatusResponse, ApiError>> + Send {
        self.job_status(file_id)
    }
}

/// Prefer the backend's structured `detail` field, fall back to the raw
/// body, then to the status line.
fn extract_error_message(body: &str, status: reqwest::StatusCode) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return parsed.detail;
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    status
        .canonical_reason()
        .unwrap_or("Request failed")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_response_parses_wire_shape() {
        let json = r#"{"file_id": "abc-123", "filename": "labs.pdf", "status": "pending"}"#;
        let parsed: UploadResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.file_id, "abc-123");
        assert_eq!(parsed.status, "pending");
    }

    #[test]
    fn status_response_parses_with_and_without_message() {
        let ok: JobStatusResponse =
            serde_json::from_str(r#"{"status": "processing"}"#).unwrap();
        assert_eq!(ok.status, "processing");
        assert!(ok.error_message.is_none());

        let failed: JobStatusResponse = serde_json::from_str(
            r#"{"status": "error", "error_message": "Unreadable PDF"}"#,
        )
        .unwrap();
        assert_eq!(failed.error_message.as_deref(), Some("Unreadable PDF"));
    }

    #[test]
    fn extract_error_message_prefers_detail_field() {
        let status = reqwest::StatusCode::UNPROCESSABLE_ENTITY;
        assert_eq!(
            extract_error_message(r#"{"detail": "profile_id is required"}"#, status),
            "profile_id is required"
        );
    }

    #[test]
    fn extract_error_message_falls_back_to_body_then_status() {
        let status = reqwest::StatusCode::BAD_GATEWAY;
        assert_eq!(extract_error_message("upstream down", status), "upstream down");
        assert_eq!(extract_error_message("  ", status), "Bad Gateway");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let config = ClientConfig {
            api_base_url: "http://localhost:8000/".to_string(),
            ..ClientConfig::default()
        };
        let client = ApiClient::new(&config, NetworkStatus::new());
        assert_eq!(client.base_url(), "http://localhost:8000");
    }
}
