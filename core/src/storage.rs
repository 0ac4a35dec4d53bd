use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::error::RecipeBoxError;

/// Directory-backed public image bucket for recipe photos.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
    public_base: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub key: String,
    pub public_url: String,
}

/// Replace anything outside `[A-Za-z0-9._-]` so the key is a single path segment.
fn sanitize_filename(filename: &str) -> String {
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Object key for an upload: `{unix_millis}-{filename}`.
#[must_use]
pub fn object_key(filename: &str, millis: i64) -> String {
    format!("{millis}-{}", sanitize_filename(filename))
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}

/// MIME type guessed from the key's extension.
#[must_use]
pub fn content_type(key: &str) -> &'static str {
    let ext = key.rsplit_once('.').map(|(_, e)| e.to_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>, public_base: &str) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create image directory: {}", root.display()))?;
        Ok(Self {
            root,
            public_base: public_base.trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/images/{key}", self.public_base)
    }

    pub fn put(&self, filename: &str, bytes: &[u8]) -> Result<StoredImage> {
        if bytes.is_empty() {
            bail!(RecipeBoxError::invalid("Image upload is empty"));
        }
        let key = object_key(filename, chrono::Utc::now().timestamp_millis());
        let path = self.root.join(&key);
        std::fs::write(&path, bytes)
            .with_context(|| format!("Failed to write image: {}", path.display()))?;
        tracing::debug!(key = %key, size = bytes.len(), "stored recipe image");
        Ok(StoredImage {
            public_url: self.public_url(&key),
            key,
        })
    }

    /// Read an object. Unknown or malformed keys yield `None`.
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if !is_valid_key(key) {
            return Ok(None);
        }
        let path = self.root.join(key);
        if !path.is_file() {
            return Ok(None);
        }
        let bytes = std::fs::read(&path)
            .with_context(|| format!("Failed to read image: {}", path.display()))?;
        Ok(Some(bytes))
    }
}
