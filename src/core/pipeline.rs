use crate::core::flatten::flatten;
use crate::core::query::build_query;
use crate::core::scroll::fetch_all;
use crate::core::{ConfigProvider, Pipeline, Record, SearchBackend, Storage, TransformResult};
use crate::utils::error::{EtlError, Result};
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

const OUTPUT_STEM: &str = "applications";

/// Fetch → flatten → write pipeline for one filter variant.
pub struct ApplicationsPipeline<S: Storage, C: ConfigProvider, B: SearchBackend> {
    storage: S,
    config: C,
    backend: B,
}

impl<S: Storage, C: ConfigProvider, B: SearchBackend> ApplicationsPipeline<S, C, B> {
    pub fn new(storage: S, config: C, backend: B) -> Self {
        Self {
            storage,
            config,
            backend,
        }
    }

    fn render(&self, format: &str, result: &TransformResult) -> Result<Vec<u8>> {
        match format {
            "csv" => Ok(result.csv_output.clone().into_bytes()),
            "tsv" => Ok(result.tsv_output.clone().into_bytes()),
            "json" => Ok(serde_json::to_vec_pretty(&result.table.to_json_rows())?),
            other => Err(EtlError::InvalidConfigValueError {
                field: "output_formats".to_string(),
                value: other.to_string(),
                reason: "Unsupported output format".to_string(),
            }),
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider, B: SearchBackend> Pipeline for ApplicationsPipeline<S, C, B> {
    async fn extract(&self) -> Result<Vec<Record>> {
        let variant = self.config.variant();
        let params = self.config.filter_parameters();
        tracing::info!(
            "📡 Querying {} for {} >= {} (valid_date {} .. {})",
            self.config.endpoint(),
            variant,
            params.threshold,
            params.since_date,
            params.until_date
        );

        let query = build_query(variant, &params);
        fetch_all(&self.backend, &query, &self.config.scroll_settings()).await
    }

    async fn transform(&self, data: Vec<Record>) -> Result<TransformResult> {
        let table = flatten(data);
        tracing::info!(
            "🔄 Flattened table: {} rows x {} columns",
            table.len(),
            table.columns().len()
        );

        let formats = self.config.output_formats();
        let csv_output = if formats.iter().any(|f| f == "csv") {
            table.to_csv()?
        } else {
            String::new()
        };
        let tsv_output = if formats.iter().any(|f| f == "tsv") {
            table.to_tsv()?
        } else {
            String::new()
        };

        Ok(TransformResult {
            table,
            csv_output,
            tsv_output,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let base = self.config.output_path().trim_end_matches('/');

        if let Some(pattern) = self.config.zip_filename() {
            let archive = archive_name(pattern);
            let zip_data = {
                let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
                for format in self.config.output_formats() {
                    let name = format!("{}.{}", OUTPUT_STEM, format);
                    zip.start_file::<_, ()>(name.as_str(), FileOptions::default())?;
                    zip.write_all(&self.render(format, &result)?)?;
                }
                zip.finish()?.into_inner()
            };

            tracing::debug!("💾 Writing {} ({} bytes)", archive, zip_data.len());
            self.storage.write_file(&archive, &zip_data).await?;
            return Ok(format!("{}/{}", base, archive));
        }

        let mut written = Vec::new();
        for format in self.config.output_formats() {
            let name = format!("{}.{}", OUTPUT_STEM, format);
            let data = self.render(format, &result)?;
            tracing::debug!("💾 Writing {} ({} bytes)", name, data.len());
            self.storage.write_file(&name, &data).await?;
            written.push(format!("{}/{}", base, name));
        }

        Ok(written.join(", "))
    }
}

/// Expands `{timestamp}` (UTC, `%Y%m%d_%H%M%S`) in an archive file name.
fn archive_name(pattern: &str) -> String {
    pattern.replace(
        "{timestamp}",
        &chrono::Utc::now().format("%Y%m%d_%H%M%S").to_string(),
    )
}
