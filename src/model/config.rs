use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

const DEFAULT_CONFIG: &str = include_str!("../../config/default.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub editor: EditorConfig,
    pub quick_link: QuickLinkConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    pub vault_path: String,
    pub scratch_file: String,
    pub auto_save_debounce_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EditorConfig {
    pub scroll_off: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuickLinkConfig {
    pub prefill_query: bool,
    pub include_hidden: bool,
}

/// User overrides; every section present replaces the default one.
#[derive(Debug, Default, Deserialize)]
struct UserConfig {
    general: Option<GeneralConfig>,
    editor: Option<EditorConfig>,
    quick_link: Option<QuickLinkConfig>,
}

impl AppConfig {
    /// Load configuration with layering: defaults → user config.
    ///
    /// `explicit` takes the place of the per-user config file when given.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let user_path = explicit.map(Path::to_path_buf).or_else(|| {
            directories::ProjectDirs::from("", "", "quicklink")
                .map(|dirs| dirs.config_dir().join("config.toml"))
                .filter(|path| path.exists())
        });

        let user = match user_path {
            Some(path) => Some(
                fs::read_to_string(&path).map_err(|err| ConfigError::io(&path, err))?,
            ),
            None => None,
        };

        let mut config = Self::from_layers(user.as_deref())?;
        config.general.vault_path = expand_home(&config.general.vault_path)?;
        Ok(config)
    }

    fn from_layers(user: Option<&str>) -> Result<Self, ConfigError> {
        let mut config: AppConfig = toml::from_str(DEFAULT_CONFIG)
            .map_err(|err| ConfigError::parse("defaults", err))?;

        if let Some(raw) = user {
            let user: UserConfig =
                toml::from_str(raw).map_err(|err| ConfigError::parse("user config", err))?;
            if let Some(general) = user.general {
                config.general = general;
            }
            if let Some(editor) = user.editor {
                config.editor = editor;
            }
            if let Some(quick_link) = user.quick_link {
                config.quick_link = quick_link;
            }
        }

        Ok(config)
    }

    pub fn vault_path(&self) -> PathBuf {
        PathBuf::from(&self.general.vault_path)
    }

    pub fn scratch_path(&self) -> PathBuf {
        self.vault_path().join(&self.general.scratch_file)
    }
}

fn expand_home(path: &str) -> Result<String, ConfigError> {
    if !path.starts_with('~') {
        return Ok(path.to_string());
    }

    let home = directories::BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .ok_or(ConfigError::NoHome)?;
    Ok(path.replacen('~', &home.to_string_lossy(), 1))
}
