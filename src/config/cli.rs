use crate::core::Storage;
use crate::utils::error::Result;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }
}

impl Storage for LocalStorage {
    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = Path::new(&self.base_path).join(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(full_path, data).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_creates_directories() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().to_string_lossy().to_string());

        tokio_test::block_on(async {
            storage
                .write_file("nested/multiqc_pycoqc.txt", b"Sample\n")
                .await
                .unwrap();
        });

        let data = std::fs::read(dir.path().join("nested/multiqc_pycoqc.txt")).unwrap();
        assert_eq!(data, b"Sample\n");
    }

    #[tokio::test]
    async fn test_write_overwrites_existing_file() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().to_string_lossy().to_string());

        storage.write_file("qc_report.json", b"{}").await.unwrap();
        storage.write_file("qc_report.json", b"[]").await.unwrap();

        let data = tokio::fs::read(dir.path().join("qc_report.json")).await.unwrap();
        assert_eq!(data, b"[]");
    }
}
