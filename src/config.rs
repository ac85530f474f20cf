use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Persisted CLI defaults, so a `select` invocation doesn't need to repeat
/// the same flags every time.
#[derive(Default, Deserialize, Serialize)]
pub struct Config {
    pub default_spec: Option<String>,
    pub merge_output_format: Option<String>,
    #[serde(default)]
    pub allow_multiple_audio_streams: bool,
    #[serde(default)]
    pub allow_multiple_video_streams: bool,
}

impl Config {
    pub fn load() -> Result<Option<Self>> {
        let path = Config::assert_config_file_path(true)?;

        if let Some(p) = path {
            if p.exists() {
                let content = fs::read_to_string(p)?;
                return Ok(Some(toml::from_str(&content)?));
            }
        }
        Ok(None)
    }

    pub fn write(&self) -> Result<()> {
        let path = Config::assert_config_file_path(false)?.unwrap();
        Ok(fs::write(path, toml::to_string(self)?)?)
    }

    pub fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|config_dir| config_dir.join("fmtsel.conf"))
    }

    fn assert_config_file_path(ignore_non_existing_config_dir: bool) -> Result<Option<PathBuf>> {
        let Some(path) = Config::config_file_path() else {
            if ignore_non_existing_config_dir {
                return Ok(None);
            }
            bail!("Cannot find config directory")
        };

        if path.exists() && path.is_dir() {
            bail!(
                "Config path ({}) is a directory (must be a normal file)",
                path.to_string_lossy()
            )
        }

        Ok(Some(path))
    }
}
