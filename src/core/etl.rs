use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::RunMonitor;
use tokio::sync::Mutex;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: Mutex<RunMonitor>,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: Mutex::new(RunMonitor::new(monitor_enabled)),
        }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("🚀 Starting extraction");

        let records = self.pipeline.extract().await?;
        tracing::info!("📥 Extracted {} records", records.len());
        self.monitor.lock().await.end_phase("extract");

        let result = self.pipeline.transform(records).await?;
        tracing::info!(
            "🔄 Transformed into {} rows x {} columns",
            result.table.len(),
            result.table.columns().len()
        );
        self.monitor.lock().await.end_phase("transform");

        let output_path = self.pipeline.load(result).await?;
        tracing::info!("💾 Output saved to: {}", output_path);

        let mut monitor = self.monitor.lock().await;
        monitor.end_phase("load");
        monitor.log_final_stats();

        Ok(output_path)
    }
}
