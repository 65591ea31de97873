// Settings: where the drop box lives and which key unlocks it.
// Values come from CLI flags / environment (resolved by clap), then from
// a small JSON file in the user's config directory, then from defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use url::form_urlencoded;
use url::Url;

use crate::error;

pub const DEFAULT_BASE_URL: &str = "https://danoutils.danocloud.com";

/// Server-side name meaning "the most recently uploaded file".
pub const LAST_FILE: &str = "LAST_FILE";

const UPLOAD_PATH: &str = "uploadafile";
const DOWNLOAD_PATH: &str = "apidownload/";
const CLIP_UPLOAD_PATH: &str = "pasteaclip";
const CLIP_DOWNLOAD_PATH: &str = "apigetclip";

/// On-disk shape of the config file. Every field is optional so a file
/// holding only the key (or only the URL) is valid.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_key: Option<String>,
}

impl ConfigFile {
    /// `<config dir>/danft/config.json`, falling back to the current
    /// directory when the platform has no config dir.
    pub fn default_path() -> PathBuf {
        let dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        dir.join("danft").join("config.json")
    }

    /// Load the config file. A missing file is an empty config.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("no config file at {}", path.display());
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg = serde_json::from_str(&data)
            .with_context(|| format!("Parsing config file {}", path.display()))?;
        Ok(cfg)
    }

    /// Write the config file, creating its parent directory if needed.
    pub fn persist(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config dir {}", dir.display()))?;
        }
        let data = serde_json::to_string_pretty(self).context("Serializing config")?;
        fs::write(path, data)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }
}

/// Fully resolved settings for one invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    base_url: Url,
    upload_key: String,
}

impl Settings {
    pub fn new(base_url: &str, upload_key: impl Into<String>) -> error::Result<Self> {
        let upload_key = upload_key.into();
        if upload_key.is_empty() {
            return Err(error::Error::validation(
                "no upload key configured; set DANFT_UPLOAD_KEY or run 'danft configure'",
            ));
        }
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            upload_key,
        })
    }

    /// Merge explicit values (flags or environment) over the config file.
    pub fn resolve(
        base_url: Option<String>,
        upload_key: Option<String>,
        file: ConfigFile,
    ) -> error::Result<Self> {
        let base_url = base_url
            .or(file.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let upload_key = upload_key.or(file.upload_key).unwrap_or_default();
        Self::new(&base_url, upload_key)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn upload_key(&self) -> &str {
        &self.upload_key
    }

    pub fn upload_url(&self) -> error::Result<Url> {
        Ok(self.base_url.join(UPLOAD_PATH)?)
    }

    pub fn clip_upload_url(&self) -> error::Result<Url> {
        Ok(self.base_url.join(CLIP_UPLOAD_PATH)?)
    }

    pub fn clip_download_url(&self) -> error::Result<Url> {
        Ok(self.base_url.join(CLIP_DOWNLOAD_PATH)?)
    }

    /// Download URL for `name`; an empty name asks for [`LAST_FILE`].
    /// The name is query-escaped, so a space becomes `+`.
    pub fn download_url(&self, name: &str) -> error::Result<Url> {
        let name = if name.is_empty() { LAST_FILE } else { name };
        // URL normalisation would turn these into path navigation.
        if name == "." || name == ".." {
            return Err(error::Error::validation(format!(
                "invalid file name to 'get': {name:?}"
            )));
        }
        let escaped: String = form_urlencoded::byte_serialize(name.as_bytes()).collect();
        Ok(self.base_url.join(&format!("{DOWNLOAD_PATH}{escaped}"))?)
    }
}

fn parse_base_url(raw: &str) -> error::Result<Url> {
    let raw = if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };
    // Endpoints are joined relative to the base, which needs a trailing slash.
    let raw = if raw.ends_with('/') { raw } else { format!("{raw}/") };
    Ok(Url::parse(&raw)?)
}
