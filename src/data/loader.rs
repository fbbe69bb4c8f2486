// ============================================================
// Layer 4 — 20 Newsgroups Loader
// ============================================================
// Loads the "bydate" distribution of the 20 Newsgroups corpus
// from a directory tree laid out as:
//
//   data_dir/
//     20news-bydate-train/
//       alt.atheism/49960
//       comp.graphics/37261
//       ...
//     20news-bydate-test/
//       ...
//
// Every sub-directory is one class. Class names are sorted so
// label indices are stable across the train and test subsets.
//
// Articles are decoded as Latin-1: every byte maps to exactly
// one char, so no article is ever rejected for its encoding.

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::document::{NewsDocument, Subset};
use crate::domain::traits::CorpusSource;

/// Loads labelled articles from a 20 Newsgroups directory.
pub struct Text20News {
    /// Directory containing the `20news-bydate-*` folders
    data_dir: PathBuf,
}

impl Text20News {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into() }
    }

    fn subset_dir(&self, subset: Subset) -> PathBuf {
        self.data_dir.join(subset.dir_name())
    }
}

impl CorpusSource for Text20News {
    fn load_subset(&self, subset: Subset) -> Result<(Vec<NewsDocument>, Vec<String>)> {
        let dir = self.subset_dir(subset);

        let class_names = sorted_entries(&dir, |p| p.is_dir())
            .with_context(|| format!("Cannot list classes in '{}'", dir.display()))?
            .into_iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
            .collect::<Vec<_>>();

        if class_names.is_empty() {
            anyhow::bail!("No class directories found in '{}'", dir.display());
        }

        let mut documents = Vec::new();

        for (label, class_name) in class_names.iter().enumerate() {
            let class_dir = dir.join(class_name);
            let files = sorted_entries(&class_dir, |p| p.is_file())
                .with_context(|| format!("Cannot list '{}'", class_dir.display()))?;

            for path in files {
                match fs::read(&path) {
                    Ok(bytes) => {
                        let file_name = path
                            .file_name()
                            .and_then(|n| n.to_str())
                            .unwrap_or("unknown");
                        documents.push(NewsDocument::new(
                            format!("{class_name}/{file_name}"),
                            decode_latin1(&bytes),
                            label,
                        ));
                    }
                    Err(e) => {
                        tracing::warn!("Skipping '{}': {}", path.display(), e);
                    }
                }
            }

            tracing::debug!("Loaded class {} '{}'", label, class_name);
        }

        tracing::info!(
            "Loaded {} documents in {} classes from '{}'",
            documents.len(),
            class_names.len(),
            dir.display()
        );

        Ok((documents, class_names))
    }
}

/// Every entry of `dir` accepted by `keep`, sorted by path.
fn sorted_entries(dir: &Path, keep: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if keep(&path) {
            entries.push(path);
        }
    }
    entries.sort();
    Ok(entries)
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(path: &Path, contents: &[u8]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_loads_sorted_classes_with_labels() {
        let tmp   = tempdir().unwrap();
        let train = tmp.path().join("20news-bydate-train");
        write(&train.join("sci.space/2"), b"orbit launch");
        write(&train.join("alt.atheism/1"), b"faith");
        write(&train.join("sci.space/1"), b"rocket");

        let (docs, classes) = Text20News::new(tmp.path()).load_subset(Subset::Train).unwrap();

        assert_eq!(classes, vec!["alt.atheism", "sci.space"]);
        assert_eq!(docs.len(), 3);
        assert_eq!(docs[0].label, 0);
        assert_eq!(docs[1].source, "sci.space/1");
        assert_eq!(docs[1].label, 1);
    }

    #[test]
    fn test_missing_subset_is_an_error() {
        let tmp = tempdir().unwrap();
        assert!(Text20News::new(tmp.path()).load_subset(Subset::Test).is_err());
    }

    #[test]
    fn test_latin1_bytes_are_kept() {
        assert_eq!(decode_latin1(&[0x63, 0x61, 0x66, 0xE9]), "café");
    }
}
