use crate::domain::model::{LogFile, ModuleInfo, SearchPattern, TransformResult};
use crate::report::{DataFormat, ModuleReport};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn analysis_paths(&self) -> &[String];
    fn output_path(&self) -> &str;
    /// Module keys to run; empty means every available module.
    fn enabled_modules(&self) -> &[String];
    /// Overrides the module's built-in search pattern.
    fn search_pattern(&self, module_key: &str) -> Option<SearchPattern>;
    fn ignore_patterns(&self) -> &[String];
    fn clean_extensions(&self) -> Vec<String>;
    fn max_file_size(&self) -> u64;
    fn follow_symlinks(&self) -> bool;
    fn output_formats(&self) -> Vec<DataFormat>;
    /// File name of the ZIP bundle; `None` disables bundling.
    fn archive_name(&self) -> Option<&str>;
}

/// A parser for one tool's logs.
pub trait QcModule: Send + Sync {
    fn info(&self) -> &ModuleInfo;

    fn search_pattern(&self) -> SearchPattern;

    /// Parses every file and assembles the module's report.
    ///
    /// Returns `QcError::NoReportsFound` when none of the files could be used.
    fn build(&self, files: &[LogFile]) -> Result<ModuleReport>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<LogFile>>;
    async fn transform(&self, files: Vec<LogFile>) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}
