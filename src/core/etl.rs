use crate::core::Pipeline;
use crate::utils::error::Result;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting QC report collection...");

        // Extract
        tracing::info!("Searching for log files...");
        let files = self.pipeline.extract().await?;
        tracing::info!("Found {} candidate log files", files.len());

        // Transform
        tracing::info!("Parsing logs...");
        let result = self.pipeline.transform(files).await?;
        tracing::info!(
            "Parsed {} module reports, {} samples in general statistics",
            result.reports.len(),
            result.general_stats.data.len()
        );

        // Load
        tracing::info!("Writing data files...");
        let output_path = self.pipeline.load(result).await?;
        tracing::info!("Output saved to: {}", output_path);

        Ok(output_path)
    }
}
