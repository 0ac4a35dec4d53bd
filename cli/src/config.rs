use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

use recipebox_core::chef::{DEFAULT_BASE_URL, DEFAULT_MODEL};

pub const DEFAULT_USER: &str = "local";
pub const DEFAULT_PUBLIC_URL: &str = "http://127.0.0.1:8080";

/// Settings for the OpenRouter-backed AI Chef.
#[derive(Debug, Clone)]
pub struct ChefSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub referer: String,
}

impl ChefSettings {
    /// Build settings from a variable lookup, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        Self {
            api_key: non_empty("OPENROUTER_API_KEY"),
            model: non_empty("RECIPEBOX_CHEF_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: non_empty("RECIPEBOX_CHEF_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            referer: non_empty("RECIPEBOX_PUBLIC_URL")
                .unwrap_or_else(|| DEFAULT_PUBLIC_URL.to_string()),
        }
    }
}

pub struct Config {
    pub db_path: PathBuf,
    pub images_dir: PathBuf,
    pub username: String,
    pub public_url: Option<String>,
    pub chef: ChefSettings,
}

impl Config {
    pub fn load() -> Result<Self> {
        // A missing .env file is fine.
        dotenv::dotenv().ok();

        let proj_dirs =
            ProjectDirs::from("", "", "recipebox").context("Could not determine home directory")?;

        let data_dir = proj_dirs.data_dir().to_path_buf();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let db_path = data_dir.join("recipebox.db");
        let images_dir = data_dir.join("images");

        let lookup = |key: &str| std::env::var(key).ok();
        let username = lookup("RECIPEBOX_USER")
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_USER.to_string());
        let public_url = lookup("RECIPEBOX_PUBLIC_URL").filter(|u| !u.trim().is_empty());

        tracing::debug!(db = %db_path.display(), user = %username, "loaded config");

        Ok(Config {
            db_path,
            images_dir,
            username,
            public_url,
            chef: ChefSettings::from_lookup(lookup),
        })
    }

    /// Base URL that stored image links point at.
    pub fn public_url_or(&self, fallback: &str) -> String {
        self.public_url
            .clone()
            .unwrap_or_else(|| fallback.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_chef_settings_defaults() {
        let settings = ChefSettings::from_lookup(lookup_from(&[]));
        assert!(settings.api_key.is_none());
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert_eq!(settings.base_url, "https://openrouter.ai/api/v1");
        assert_eq!(settings.referer, DEFAULT_PUBLIC_URL);
    }

    #[test]
    fn test_chef_settings_overrides() {
        let settings = ChefSettings::from_lookup(lookup_from(&[
            ("OPENROUTER_API_KEY", "sk-test"),
            ("RECIPEBOX_CHEF_MODEL", "openai/gpt-4o-mini"),
            ("RECIPEBOX_CHEF_URL", "http://127.0.0.1:9999/v1"),
            ("RECIPEBOX_PUBLIC_URL", "https://recipes.example"),
        ]));
        assert_eq!(settings.api_key.as_deref(), Some("sk-test"));
        assert_eq!(settings.model, "openai/gpt-4o-mini");
        assert_eq!(settings.base_url, "http://127.0.0.1:9999/v1");
        assert_eq!(settings.referer, "https://recipes.example");
    }

    #[test]
    fn test_blank_api_key_is_missing() {
        let settings = ChefSettings::from_lookup(lookup_from(&[("OPENROUTER_API_KEY", "   ")]));
        assert!(settings.api_key.is_none());
    }
}
