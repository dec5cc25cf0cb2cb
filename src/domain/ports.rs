use crate::core::query::{FilterParameters, QueryDocument, Variant};
use crate::core::scroll::ScrollSettings;
use crate::domain::model::{Record, ResultPage, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// A search engine that serves scrolled (continuation-token) result sets.
///
/// Implementations must not retry: every failure is returned to the caller.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Runs `query` against `index` and opens a scroll context held for `lease`.
    async fn search(
        &self,
        index: &str,
        query: &QueryDocument,
        page_size: usize,
        lease: Duration,
    ) -> Result<ResultPage>;

    /// Fetches the page after the one `scroll_id` was returned with,
    /// renewing the scroll context for another `lease`.
    async fn scroll(&self, scroll_id: &str, lease: Duration) -> Result<ResultPage>;
}

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn endpoint(&self) -> &str;
    fn headers(&self) -> Vec<(String, String)>;
    fn timeout_seconds(&self) -> Option<u64>;
    fn variant(&self) -> Variant;
    fn filter_parameters(&self) -> FilterParameters;
    fn scroll_settings(&self) -> ScrollSettings;
    fn output_path(&self) -> &str;
    fn output_formats(&self) -> &[String];
    /// Archive name when outputs should be bundled into a zip.
    fn zip_filename(&self) -> Option<&str>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<Record>>;
    async fn transform(&self, data: Vec<Record>) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}
