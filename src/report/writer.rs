use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::Write;
use std::str::FromStr;
use zip::write::{FileOptions, ZipWriter};

use crate::domain::model::{SampleTable, SourceFile};
use crate::utils::error::{QcError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    Tsv,
    Csv,
    Json,
}

impl DataFormat {
    pub const ALL: [&'static str; 3] = ["tsv", "csv", "json"];

    pub fn extension(&self) -> &'static str {
        match self {
            DataFormat::Tsv => "txt",
            DataFormat::Csv => "csv",
            DataFormat::Json => "json",
        }
    }
}

impl FromStr for DataFormat {
    type Err = QcError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tsv" => Ok(DataFormat::Tsv),
            "csv" => Ok(DataFormat::Csv),
            "json" => Ok(DataFormat::Json),
            other => Err(QcError::InvalidConfigValueError {
                field: "output.formats".to_string(),
                value: other.to_string(),
                reason: format!(
                    "Unsupported format. Valid formats: {}",
                    DataFormat::ALL.join(", ")
                ),
            }),
        }
    }
}

fn cell(value: Option<&serde_json::Value>) -> String {
    match value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Renders a sample table in the given format.
///
/// Delimited formats get a `Sample` column followed by the union of all
/// field names in sorted order; missing values are left empty.
pub fn render_table(table: &SampleTable, format: DataFormat) -> Result<Vec<u8>> {
    let delimiter = match format {
        DataFormat::Json => return Ok(serde_json::to_vec_pretty(table)?),
        DataFormat::Tsv => b'\t',
        DataFormat::Csv => b',',
    };

    let fields: BTreeSet<&str> = table
        .values()
        .flat_map(|record| record.data.keys().map(String::as_str))
        .collect();

    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());

    let mut header = vec!["Sample"];
    header.extend(fields.iter().copied());
    writer.write_record(&header)?;

    for (sample, record) in table {
        let mut row = vec![sample.clone()];
        row.extend(fields.iter().map(|f| cell(record.get(f))));
        writer.write_record(&row)?;
    }

    writer
        .into_inner()
        .map_err(|e| QcError::IoError(e.into_error()))
}

/// Tab-separated list of the file each sample was read from.
pub fn render_sources(sources: &[SourceFile]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(Vec::new());

    writer.write_record(["Module", "Sample Name", "Source"])?;
    for source in sources {
        writer.write_record([
            source.module.as_str(),
            source.sample_name.as_str(),
            source.path.as_str(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| QcError::IoError(e.into_error()))
}

/// Packs `(name, bytes)` entries into an in-memory ZIP archive.
pub fn bundle_zip(entries: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

    for (name, data) in entries {
        zip.start_file::<_, ()>(name.as_str(), FileOptions::default())?;
        zip.write_all(data)?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Record;

    fn table() -> SampleTable {
        let mut table = SampleTable::new();

        let mut a = Record::new();
        a.insert("total", 100);
        a.insert("percent_aligned", 12.5);
        table.insert("sample_a".to_string(), a);

        let mut b = Record::new();
        b.insert("total", 7);
        table.insert("sample_b".to_string(), b);

        table
    }

    #[test]
    fn test_render_tsv() {
        let bytes = render_table(&table(), DataFormat::Tsv).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Sample\tpercent_aligned\ttotal");
        assert_eq!(lines[1], "sample_a\t12.5\t100");
        assert_eq!(lines[2], "sample_b\t\t7");
    }

    #[test]
    fn test_render_csv() {
        let bytes = render_table(&table(), DataFormat::Csv).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("Sample,percent_aligned,total\n"));
        assert!(text.contains("sample_b,,7"));
    }

    #[test]
    fn test_render_json() {
        let bytes = render_table(&table(), DataFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["sample_a"]["total"], 100);
        assert_eq!(value["sample_b"]["total"], 7);
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("TSV".parse::<DataFormat>().unwrap(), DataFormat::Tsv);
        assert_eq!(" json ".parse::<DataFormat>().unwrap(), DataFormat::Json);
        assert!("xlsx".parse::<DataFormat>().is_err());
        assert_eq!(DataFormat::Tsv.extension(), "txt");
    }

    #[test]
    fn test_render_sources() {
        let sources = vec![SourceFile {
            module: "Adapter Removal".to_string(),
            sample_name: "s1".to_string(),
            path: "runs/s1.settings".to_string(),
        }];
        let text = String::from_utf8(render_sources(&sources).unwrap()).unwrap();
        assert_eq!(
            text,
            "Module\tSample Name\tSource\nAdapter Removal\ts1\truns/s1.settings\n"
        );
    }

    #[test]
    fn test_bundle_zip() {
        let entries = vec![
            ("a.txt".to_string(), b"alpha".to_vec()),
            ("b.json".to_string(), b"{}".to_vec()),
        ];
        let bytes = bundle_zip(&entries).unwrap();

        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);

        let mut content = String::new();
        std::io::Read::read_to_string(&mut archive.by_name("a.txt").unwrap(), &mut content)
            .unwrap();
        assert_eq!(content, "alpha");
    }
}
