use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

use crate::config::ScanConfig;
use crate::errors::CorpusError;
use crate::types::DisplayName;

/// Recursive walker that lists record files under a root.
///
/// Results are sorted lexicographically by path so every run (and every
/// platform) sees the same traversal order.
#[derive(Clone, Debug)]
pub struct CorpusWalker {
    root: PathBuf,
    follow_links: bool,
    skip_hidden: bool,
    extensions: Vec<String>,
    excluded_dirs: Vec<String>,
    excluded_paths: Vec<PathBuf>,
}

impl CorpusWalker {
    /// Create a walker rooted at `root` with default settings.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::from_config(root, &ScanConfig::default())
    }

    /// Create a walker rooted at `root` using `config`.
    pub fn from_config(root: impl Into<PathBuf>, config: &ScanConfig) -> Self {
        Self {
            root: root.into(),
            follow_links: config.follow_links,
            skip_hidden: config.skip_hidden,
            extensions: config.extensions.clone(),
            excluded_dirs: config.excluded_dirs.clone(),
            excluded_paths: Vec::new(),
        }
    }

    /// Skip directories whose name matches any entry, at any depth.
    pub fn with_excluded_dirs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_dirs.extend(names.into_iter().map(Into::into));
        self
    }

    /// Skip one specific path (for example an output directory under the root).
    pub fn with_excluded_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.excluded_paths.push(path.into());
        self
    }

    /// Root being walked.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List every matching file under the root in lexicographic order.
    ///
    /// A root that is itself a file is returned as the only entry, regardless
    /// of its extension. Entries that cannot be visited are logged and skipped.
    pub fn files(&self) -> Result<Vec<PathBuf>, CorpusError> {
        let metadata = std::fs::metadata(&self.root)
            .map_err(|err| CorpusError::unreadable(&self.root, err))?;
        if metadata.is_file() {
            return Ok(vec![self.root.clone()]);
        }
        if !metadata.is_dir() {
            return Err(CorpusError::unreadable(
                &self.root,
                io::Error::new(io::ErrorKind::InvalidInput, "not a file or directory"),
            ));
        }

        // Excluded paths are compared canonically so `./out` and `out` match.
        let excluded: Vec<PathBuf> = self
            .excluded_paths
            .iter()
            .filter_map(|path| std::fs::canonicalize(path).ok())
            .collect();
        let mut files = Vec::new();
        let walker = WalkDir::new(&self.root).follow_links(self.follow_links);
        for entry in walker
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.is_skipped_dir(entry, &excluded))
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(
                        root = %self.root.display(),
                        error = %err,
                        "skipping unreadable directory entry"
                    );
                    continue;
                }
            };
            if entry.file_type().is_file() && has_extension(entry.path(), &self.extensions) {
                files.push(entry.into_path());
            }
        }
        files.sort();
        Ok(files)
    }

    fn is_skipped_dir(&self, entry: &DirEntry, excluded: &[PathBuf]) -> bool {
        if !entry.file_type().is_dir() {
            return false;
        }
        if !excluded.is_empty()
            && std::fs::canonicalize(entry.path())
                .map(|path| excluded.contains(&path))
                .unwrap_or(false)
        {
            return true;
        }
        let Some(name) = entry.file_name().to_str() else {
            return false;
        };
        (self.skip_hidden && name.starts_with('.'))
            || self.excluded_dirs.iter().any(|excluded| excluded == name)
    }
}

/// True if the path's extension is one of `extensions` (case-insensitive).
pub fn has_extension<S: AsRef<str>>(path: &Path, extensions: &[S]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            extensions
                .iter()
                .any(|candidate| ext.eq_ignore_ascii_case(candidate.as_ref()))
        })
        .unwrap_or(false)
}

/// File name for display, falling back to the full path.
pub fn display_name(path: &Path) -> DisplayName {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"{}\n").unwrap();
    }

    #[test]
    fn files_are_recursive_filtered_and_sorted() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        touch(&root.join("b/two.json"));
        touch(&root.join("a/one.JSONL"));
        touch(&root.join("a/notes.txt"));
        touch(&root.join("c/d/three.json"));

        let files = CorpusWalker::new(root).files().unwrap();
        let relative: Vec<PathBuf> = files
            .iter()
            .map(|path| path.strip_prefix(root).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            relative,
            vec![
                PathBuf::from("a/one.JSONL"),
                PathBuf::from("b/two.json"),
                PathBuf::from("c/d/three.json"),
            ]
        );
    }

    #[test]
    fn excluded_and_hidden_directories_are_skipped() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        touch(&root.join("keep/a.json"));
        touch(&root.join("nuevos_andres check 2/b.json"));
        touch(&root.join(".cache/c.json"));
        touch(&root.join("output_data/train.json"));

        let files = CorpusWalker::new(root)
            .with_excluded_dirs(["nuevos_andres check 2"])
            .with_excluded_path(root.join("output_data"))
            .files()
            .unwrap();
        assert_eq!(files, vec![root.join("keep/a.json")]);
    }

    #[test]
    fn file_root_is_returned_directly() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("single.data");
        touch(&path);
        assert_eq!(CorpusWalker::new(&path).files().unwrap(), vec![path]);
    }

    #[test]
    fn missing_root_is_unreadable() {
        let temp = tempdir().unwrap();
        let err = CorpusWalker::new(temp.path().join("missing"))
            .files()
            .unwrap_err();
        assert!(matches!(err, CorpusError::UnreadableFile { .. }));
    }

    #[test]
    fn display_name_prefers_file_name() {
        assert_eq!(display_name(Path::new("a/b/c.json")), "c.json");
    }
}
