//! Markdown corpus loader

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde_json::json;

use arag_core::{Document, Error, Metadata, Result};

/// Front matter keys lifted into document metadata
const FRONT_MATTER_KEYS: [&str; 4] = ["title", "category", "source_file", "source_path"];

fn front_matter_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\A---\r?\n(.*?)\r?\n---").expect("valid front matter pattern"))
}

/// Parse the `key: value` lines of a leading `---` block
pub fn parse_front_matter(content: &str) -> Metadata {
    let mut metadata = Metadata::new();
    let Some(captures) = front_matter_regex().captures(content) else {
        return metadata;
    };

    for line in captures[1].lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if FRONT_MATTER_KEYS.contains(&key) {
            metadata.insert(key.to_string(), json!(value.trim()));
        }
    }

    metadata
}

/// Loads the processed markdown corpus from disk
#[derive(Debug, Clone)]
pub struct MarkdownLoader {
    data_dir: PathBuf,
}

impl MarkdownLoader {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Load every `*.md` file under the data directory, or under its
    /// `campaign` subdirectory. `index.md` is skipped.
    pub fn load(&self, campaign: Option<&str>) -> Result<Vec<Document>> {
        let root = match campaign {
            Some(name) => self.data_dir.join(name),
            None => self.data_dir.clone(),
        };
        if !root.is_dir() {
            return Err(Error::InvalidInput(format!(
                "Data directory not found: {}",
                root.display()
            )));
        }

        let mut files = Vec::new();
        collect_markdown(&root, &mut files)?;
        files.sort();

        let mut documents = Vec::with_capacity(files.len());
        for path in files {
            match fs::read_to_string(&path) {
                Ok(content) => {
                    let mut metadata = parse_front_matter(&content);
                    metadata.insert("file_path".to_string(), json!(self.relative_path(&path)));
                    documents.push(Document::with_metadata(content, metadata));
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable file");
                }
            }
        }

        tracing::debug!(count = documents.len(), root = %root.display(), "Loaded markdown documents");
        Ok(documents)
    }

    fn relative_path(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.data_dir).unwrap_or(path);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

fn collect_markdown(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_markdown(&path, files)?;
        } else if path.extension().is_some_and(|ext| ext == "md")
            && path.file_name().is_some_and(|name| name != "index.md")
        {
            files.push(path);
        }
    }
    Ok(())
}
