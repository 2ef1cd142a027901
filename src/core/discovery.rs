use glob::Pattern;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

use crate::domain::model::{LogFile, SearchPattern};
use crate::utils::error::{QcError, Result};

/// Default extensions cut from file names to derive sample names.
pub const DEFAULT_CLEAN_EXTENSIONS: &[&str] = &[
    ".gz",
    ".settings",
    ".yaml",
    ".yml",
    ".json",
    ".txt",
    ".log",
    ".out",
    ".stderr",
    "_pycoqc",
];

pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Compiles a shell-style glob (`*`, `?`, `[seq]`, `[!seq]`) matched against
/// bare file names.
pub fn compile_glob(glob: &str) -> Result<Pattern> {
    Pattern::new(glob).map_err(|e| QcError::InvalidConfigValueError {
        field: "search pattern".to_string(),
        value: glob.to_string(),
        reason: e.to_string(),
    })
}

/// Cuts the file name at the first occurrence of any clean extension.
pub fn clean_sample_name(file_name: &str, clean_extensions: &[String]) -> String {
    let mut name = file_name;
    for ext in clean_extensions {
        if ext.is_empty() {
            continue;
        }
        if let Some(idx) = name.find(ext.as_str()) {
            name = &name[..idx];
        }
    }

    let trimmed = name.trim_matches(|c: char| c == '.' || c == '_' || c == '-' || c == ' ');
    if trimmed.is_empty() {
        file_name.to_string()
    } else {
        trimmed.to_string()
    }
}

struct CompiledPattern {
    module: String,
    fn_globs: Vec<Pattern>,
    contents: Option<String>,
    num_lines: usize,
}

impl CompiledPattern {
    fn matches_name(&self, file_name: &str) -> bool {
        self.fn_globs.is_empty() || self.fn_globs.iter().any(|p| p.matches(file_name))
    }

    fn matches_contents(&self, text: &str) -> bool {
        let Some(needle) = &self.contents else {
            return true;
        };
        if self.num_lines == 0 {
            return text.contains(needle.as_str());
        }
        text.lines()
            .take(self.num_lines)
            .any(|line| line.contains(needle.as_str()))
    }
}

/// Walks analysis paths and collects log files for each module.
pub struct FileSearcher {
    patterns: Vec<CompiledPattern>,
    ignore: Vec<Pattern>,
    clean_extensions: Vec<String>,
    max_file_size: u64,
    follow_symlinks: bool,
}

impl FileSearcher {
    pub fn new(
        patterns: Vec<(String, SearchPattern)>,
        ignore_patterns: &[String],
        clean_extensions: Vec<String>,
        max_file_size: u64,
        follow_symlinks: bool,
    ) -> Result<Self> {
        let mut compiled = Vec::with_capacity(patterns.len());
        for (module, pattern) in patterns {
            if pattern.fn_globs.is_empty() && pattern.contents.is_none() {
                return Err(QcError::InvalidConfigValueError {
                    field: format!("search_patterns.{}", module),
                    value: String::new(),
                    reason: "Pattern needs at least a file-name glob or a contents string"
                        .to_string(),
                });
            }
            compiled.push(CompiledPattern {
                module,
                fn_globs: pattern
                    .fn_globs
                    .iter()
                    .map(|g| compile_glob(g))
                    .collect::<Result<_>>()?,
                contents: pattern.contents,
                num_lines: pattern.num_lines,
            });
        }

        let ignore = ignore_patterns
            .iter()
            .map(|g| compile_glob(g))
            .collect::<Result<_>>()?;

        Ok(Self {
            patterns: compiled,
            ignore,
            clean_extensions,
            max_file_size,
            follow_symlinks,
        })
    }

    fn is_ignored(&self, entry: &DirEntry) -> bool {
        // the root is never ignored, only what's found beneath it
        if entry.depth() == 0 {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        self.ignore.iter().any(|p| p.matches(&name))
    }

    /// Returns every matching file, one `LogFile` per (file, module) pair,
    /// ordered by path.
    pub fn search(&self, paths: &[String]) -> Result<Vec<LogFile>> {
        let mut found = Vec::new();

        for root in paths {
            let root_path = Path::new(root);
            if !root_path.exists() {
                return Err(QcError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("Analysis path not found: {}", root),
                )));
            }

            let walker = WalkDir::new(root_path)
                .follow_links(self.follow_symlinks)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| !self.is_ignored(e));

            for entry in walker {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        tracing::warn!("Skipping unreadable path: {}", e);
                        continue;
                    }
                };
                if !entry.file_type().is_file() {
                    continue;
                }
                found.extend(self.match_file(&entry));
            }
        }

        tracing::debug!("File search matched {} log files", found.len());
        Ok(found)
    }

    fn match_file(&self, entry: &DirEntry) -> Vec<LogFile> {
        let file_name = entry.file_name().to_string_lossy().to_string();
        let candidates: Vec<&CompiledPattern> = self
            .patterns
            .iter()
            .filter(|p| p.matches_name(&file_name))
            .collect();
        if candidates.is_empty() {
            return Vec::new();
        }

        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        if size > self.max_file_size {
            tracing::debug!(
                "Ignoring {} ({} bytes exceeds the {} byte limit)",
                entry.path().display(),
                size,
                self.max_file_size
            );
            return Vec::new();
        }

        let Some(contents) = read_log(entry.path()) else {
            return Vec::new();
        };

        let sample_name = clean_sample_name(&file_name, &self.clean_extensions);
        candidates
            .into_iter()
            .filter(|p| p.matches_contents(&contents))
            .map(|p| LogFile {
                module: p.module.clone(),
                path: entry.path().to_path_buf(),
                file_name: file_name.clone(),
                sample_name: sample_name.clone(),
                contents: contents.clone(),
            })
            .collect()
    }
}

/// Reads a candidate log as text; unreadable and non UTF-8 files yield `None`.
fn read_log(path: &Path) -> Option<String> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("Skipping unreadable file {}: {}", path.display(), e);
            return None;
        }
    };
    match String::from_utf8(bytes) {
        Ok(text) => Some(text),
        Err(_) => {
            tracing::debug!("Ignoring non UTF-8 file {}", path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn defaults() -> Vec<String> {
        DEFAULT_CLEAN_EXTENSIONS.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_compile_glob() {
        let p = compile_glob("*.settings").unwrap();
        assert!(p.matches("sample1.settings"));
        assert!(!p.matches("sample1.settings.bak"));
        assert!(!p.matches("sample1xsettings"));

        let p = compile_glob("run?.yaml").unwrap();
        assert!(p.matches("run1.yaml"));
        assert!(!p.matches("run12.yaml"));
    }

    #[test]
    fn test_compile_glob_character_classes() {
        let p = compile_glob("sample[12].settings").unwrap();
        assert!(p.matches("sample1.settings"));
        assert!(p.matches("sample2.settings"));
        assert!(!p.matches("sample3.settings"));

        let p = compile_glob("run[!0-4]_pycoqc.yaml").unwrap();
        assert!(p.matches("run7_pycoqc.yaml"));
        assert!(!p.matches("run3_pycoqc.yaml"));

        assert!(compile_glob("broken[").is_err());
    }

    #[test]
    fn test_clean_sample_name() {
        assert_eq!(clean_sample_name("sampleA.settings", &defaults()), "sampleA");
        assert_eq!(clean_sample_name("run_1_pycoqc.yaml", &defaults()), "run_1");
        assert_eq!(clean_sample_name("reads.fastq.gz", &defaults()), "reads.fastq");
        assert_eq!(clean_sample_name(".settings", &defaults()), ".settings");
    }

    #[test]
    fn test_search_matches_name_and_contents() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.settings"), "AdapterRemoval ver. 2.2.2\n").unwrap();
        std::fs::write(dir.path().join("b.settings"), "something else\n").unwrap();
        std::fs::write(dir.path().join("c.txt"), "AdapterRemoval\n").unwrap();

        let searcher = FileSearcher::new(
            vec![(
                "adapter_removal".to_string(),
                SearchPattern {
                    fn_globs: vec!["*.settings".to_string()],
                    contents: Some("AdapterRemoval".to_string()),
                    num_lines: 1,
                },
            )],
            &[],
            defaults(),
            DEFAULT_MAX_FILE_SIZE,
            false,
        )
        .unwrap();

        let found = searcher
            .search(&[dir.path().to_string_lossy().to_string()])
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].sample_name, "a");
        assert_eq!(found[0].module, "adapter_removal");
    }

    #[test]
    fn test_search_respects_ignore_and_size_limit() {
        let dir = TempDir::new().unwrap();
        let skipped = dir.path().join("work");
        std::fs::create_dir(&skipped).unwrap();
        std::fs::write(skipped.join("x.settings"), "AdapterRemoval\n").unwrap();
        std::fs::write(dir.path().join("big.settings"), "AdapterRemoval\n".repeat(10)).unwrap();
        std::fs::write(dir.path().join("ok.settings"), "AdapterRemoval\n").unwrap();

        let searcher = FileSearcher::new(
            vec![(
                "adapter_removal".to_string(),
                SearchPattern {
                    fn_globs: vec!["*.settings".to_string()],
                    contents: None,
                    num_lines: 0,
                },
            )],
            &["work".to_string()],
            defaults(),
            32,
            false,
        )
        .unwrap();

        let found = searcher
            .search(&[dir.path().to_string_lossy().to_string()])
            .unwrap();
        let names: Vec<&str> = found.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, vec!["ok.settings"]);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let searcher = FileSearcher::new(Vec::new(), &[], defaults(), 1, false).unwrap();
        assert!(searcher.search(&["/definitely/not/here".to_string()]).is_err());
    }

    #[test]
    fn test_empty_pattern_is_rejected() {
        let result = FileSearcher::new(
            vec![(
                "pycoqc".to_string(),
                SearchPattern {
                    fn_globs: vec![],
                    contents: None,
                    num_lines: 0,
                },
            )],
            &[],
            defaults(),
            1,
            false,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_unreadable_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("ok.settings"), "AdapterRemoval\n").unwrap();
        std::fs::write(dir.path().join("binary.settings"), [0xffu8, 0xfe, 0x00]).unwrap();

        assert!(read_log(dir.path()).is_none());
        assert!(read_log(&dir.path().join("missing.settings")).is_none());
        assert!(read_log(&dir.path().join("binary.settings")).is_none());
        assert_eq!(
            read_log(&dir.path().join("ok.settings")).as_deref(),
            Some("AdapterRemoval\n")
        );
    }
}
