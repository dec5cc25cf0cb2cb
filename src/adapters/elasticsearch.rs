use crate::core::query::QueryDocument;
use crate::core::{ConfigProvider, Record, ResultPage, SearchBackend};
use crate::utils::error::{EtlError, Result};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "_scroll_id")]
    scroll_id: Option<String>,
    hits: Option<HitsEnvelope>,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    hits: Vec<Record>,
}

/// Renders a lease as an Elasticsearch time unit (`2m`, `90s`).
pub fn format_lease(lease: Duration) -> String {
    let secs = lease.as_secs().max(1);
    if secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}

/// Pulls the most specific reason out of an Elasticsearch error body.
fn error_reason(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.to_string();
    };
    let error = &value["error"];
    error["root_cause"][0]["reason"]
        .as_str()
        .or_else(|| error["reason"].as_str())
        .or_else(|| error.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| body.to_string())
}

/// Builder errors (bad header names or values) are configuration errors.
fn send_error(e: reqwest::Error) -> EtlError {
    if e.is_builder() {
        EtlError::ConfigError {
            message: format!("Cannot build search request: {}", e),
        }
    } else {
        EtlError::BackendUnavailable(e)
    }
}

/// [`SearchBackend`] over the Elasticsearch scroll API.
#[derive(Debug, Clone)]
pub struct ElasticsearchBackend {
    client: Client,
    base_url: Url,
    headers: Vec<(String, String)>,
    timeout: Option<Duration>,
}

impl ElasticsearchBackend {
    pub fn new(endpoint: &str) -> Result<Self> {
        let mut base_url = Url::parse(endpoint).map_err(|e| EtlError::InvalidConfigValueError {
            field: "endpoint".to_string(),
            value: endpoint.to_string(),
            reason: format!("Invalid URL format: {}", e),
        })?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client: Client::new(),
            base_url,
            headers: Vec::new(),
            timeout: None,
        })
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        let mut backend = Self::new(config.endpoint())?.with_headers(config.headers());
        if let Some(secs) = config.timeout_seconds() {
            backend = backend.with_timeout(Duration::from_secs(secs));
        }
        Ok(backend)
    }

    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn post(&self, path: &str) -> Result<RequestBuilder> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| EtlError::ConfigError {
                message: format!("Cannot build search URL for '{}': {}", path, e),
            })?;

        let mut request = self.client.post(url);
        for (name, value) in &self.headers {
            request = request.header(name, value);
        }
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        Ok(request)
    }

    async fn read_page(&self, response: Response, scrolling: bool) -> Result<ResultPage> {
        let status = response.status();
        let body = response.text().await?;
        tracing::debug!("📡 Search response status: {} ({} bytes)", status, body.len());

        if !status.is_success() {
            let reason = error_reason(&body);
            return Err(match status {
                StatusCode::BAD_REQUEST => EtlError::InvalidQuery {
                    status: status.as_u16(),
                    reason,
                },
                StatusCode::NOT_FOUND if scrolling => EtlError::LeaseExpired { message: reason },
                _ => EtlError::BackendError {
                    status: status.as_u16(),
                    message: reason,
                },
            });
        }

        let parsed: SearchResponse =
            serde_json::from_str(&body).map_err(|e| EtlError::MalformedResponse {
                message: format!("cannot decode search response: {}", e),
            })?;
        let scroll_id = parsed.scroll_id.ok_or_else(|| EtlError::MalformedResponse {
            message: "response has no _scroll_id".to_string(),
        })?;
        let hits = parsed.hits.ok_or_else(|| EtlError::MalformedResponse {
            message: "response has no hits.hits".to_string(),
        })?;

        Ok(ResultPage {
            scroll_id,
            hits: hits.hits,
        })
    }
}

#[async_trait::async_trait]
impl SearchBackend for ElasticsearchBackend {
    async fn search(
        &self,
        index: &str,
        query: &QueryDocument,
        page_size: usize,
        lease: Duration,
    ) -> Result<ResultPage> {
        let request = self
            .post(&format!("{}/_search", index))?
            .query(&[
                ("scroll", format_lease(lease)),
                ("size", page_size.to_string()),
            ])
            .json(query);

        let response = request.send().await.map_err(send_error)?;
        self.read_page(response, false).await
    }

    async fn scroll(&self, scroll_id: &str, lease: Duration) -> Result<ResultPage> {
        let request = self.post("_search/scroll")?.json(&serde_json::json!({
            "scroll": format_lease(lease),
            "scroll_id": scroll_id,
        }));

        let response = request.send().await.map_err(send_error)?;
        self.read_page(response, true).await
    }
}
