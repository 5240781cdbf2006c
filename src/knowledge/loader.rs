//! Loading knowledge-base documents from disk.

use crate::error::{Result, StudyError};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A document read from the knowledge-base directory.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    /// Path of the file, as found under the input directory.
    pub source: String,
    /// File name without extension.
    pub page_title: String,
    /// Full UTF-8 content.
    pub content: String,
}

/// Recursively load every file with the given extension under `dir`.
///
/// Files are returned in path order. Files that are not valid UTF-8 are
/// skipped with a warning.
pub fn load_documents(dir: &Path, extension: &str) -> Result<Vec<SourceDocument>> {
    if !dir.is_dir() {
        return Err(StudyError::Knowledge(format!(
            "Knowledge base directory not found: {}",
            dir.display()
        )));
    }

    let mut paths = Vec::new();
    collect_files(dir, extension, &mut paths)?;
    paths.sort();

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let page_title = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or_default()
                    .to_string();
                debug!("Loaded {}", path.display());
                documents.push(SourceDocument {
                    source: path.display().to_string(),
                    page_title,
                    content,
                });
            }
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                warn!("Skipping {} (not valid UTF-8)", path.display());
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(documents)
}

fn collect_files(dir: &Path, extension: &str, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, extension, out)?;
        } else if has_extension(&path, extension) {
            out.push(path);
        }
    }
    Ok(())
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(extension.trim_start_matches('.')))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_documents_recursively() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("unit1")).unwrap();
        std::fs::write(dir.path().join("algebra.txt"), "Variables stand for numbers.").unwrap();
        std::fs::write(dir.path().join("unit1").join("geometry.TXT"), "A triangle has three sides.").unwrap();
        std::fs::write(dir.path().join("notes.md"), "# ignored").unwrap();
        std::fs::write(dir.path().join("binary.txt"), [0xff, 0xfe, 0x00]).unwrap();

        let docs = load_documents(dir.path(), "txt").unwrap();
        let titles: Vec<&str> = docs.iter().map(|d| d.page_title.as_str()).collect();
        assert_eq!(titles, vec!["algebra", "geometry"]);
        assert!(docs[1].source.ends_with("geometry.TXT"));
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_documents(&dir.path().join("missing"), "txt");
        assert!(matches!(result, Err(StudyError::Knowledge(_))));
    }
}
