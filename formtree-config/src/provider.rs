//! Settings provider using Figment

use crate::{
    error::ConfigError,
    settings::FormSettings,
    ConfigResult,
};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// File stem searched for in the settings directory
pub const SETTINGS_FILE_STEM: &str = "formtree";

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "FORMTREE_";

/// Settings provider using figment
///
/// Sources are merged in precedence order (later sources override earlier ones):
/// 1. Default values
/// 2. `formtree.{toml,yaml,yml,json}` in the settings directory, if one is given
/// 3. Environment variables with the `FORMTREE_` prefix
pub struct SettingsProvider {
    directory: Option<PathBuf>,
}

impl SettingsProvider {
    /// Provider reading only defaults and the environment
    pub fn new() -> Self {
        Self { directory: None }
    }

    /// Provider that also reads settings files from `directory`
    pub fn with_directory(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: Some(directory.into()),
        }
    }

    /// Load and validate settings from all sources
    pub fn load(&self) -> ConfigResult<FormSettings> {
        debug!("Loading form settings");

        let settings: FormSettings = self.build_figment()?.extract()?;
        settings.validate()?;

        debug!(
            related = %settings.related_endpoint,
            view = %settings.default_view_type,
            "form settings loaded"
        );
        Ok(settings)
    }

    fn build_figment(&self) -> ConfigResult<Figment> {
        let mut figment = Figment::new().merge(Serialized::defaults(FormSettings::default()));

        if let Some(dir) = &self.directory {
            figment = figment.merge(Self::load_files(dir)?);
        }

        Ok(figment.merge(Env::prefixed(ENV_PREFIX).map(|key| key.as_str().to_lowercase().into())))
    }

    fn load_files(dir: &Path) -> ConfigResult<Figment> {
        if !dir.is_dir() {
            return Err(ConfigError::DirectoryNotFound {
                path: dir.to_path_buf(),
            });
        }

        let mut figment = Figment::new();
        for ext in ["toml", "yaml", "yml", "json"] {
            let path = dir.join(format!("{SETTINGS_FILE_STEM}.{ext}"));
            if !path.is_file() {
                continue;
            }
            trace!("Loading settings file: {}", path.display());
            figment = match ext {
                "toml" => figment.merge(Toml::file(&path)),
                "json" => figment.merge(Json::file(&path)),
                _ => figment.merge(Yaml::file(&path)),
            };
        }
        Ok(figment)
    }
}

impl Default for SettingsProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn test_load_defaults() {
        let settings = SettingsProvider::new().load().unwrap();
        assert_eq!(settings, FormSettings::default());
    }

    #[test]
    #[serial]
    fn test_toml_file_overrides_defaults() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("formtree.toml"),
            "related_endpoint = \"Custom#related\"\n",
        )
        .unwrap();

        let settings = SettingsProvider::with_directory(temp.path()).load().unwrap();
        assert_eq!(settings.related_endpoint, "Custom#related");
        assert_eq!(settings.default_view_type, "edit");
    }

    #[test]
    #[serial]
    fn test_yaml_file_is_read() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("formtree.yaml"), "default_view_type: view\n").unwrap();

        let settings = SettingsProvider::with_directory(temp.path()).load().unwrap();
        assert_eq!(settings.default_view_type, "view");
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("formtree.json"),
            r#"{"query_builder_endpoint": "File#qb"}"#,
        )
        .unwrap();

        std::env::set_var("FORMTREE_QUERY_BUILDER_ENDPOINT", "Env#qb");
        let result = SettingsProvider::with_directory(temp.path()).load();
        std::env::remove_var("FORMTREE_QUERY_BUILDER_ENDPOINT");

        assert_eq!(result.unwrap().query_builder_endpoint, "Env#qb");
    }

    #[test]
    #[serial]
    fn test_missing_directory_errors() {
        let result = SettingsProvider::with_directory("/definitely/not/here").load();
        assert!(matches!(result, Err(ConfigError::DirectoryNotFound { .. })));
    }

    #[test]
    #[serial]
    fn test_invalid_file_value_rejected() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("formtree.toml"), "default_wrapper = \"\"\n").unwrap();

        let result = SettingsProvider::with_directory(temp.path()).load();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }
}
