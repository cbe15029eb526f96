//! Configuration контейнера
//!
//! Источники, по возрастанию приоритета:
//! 1. значения по умолчанию
//! 2. файл конфигурации (TOML, JSON, YAML), путь из `<PREFIX>_CONFIG`
//! 3. переменные окружения `<PREFIX>_*`

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

/// Префикс переменных окружения по умолчанию
pub const DEFAULT_ENV_PREFIX: &str = "DI";

/// Настройки контейнера
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Имя контейнера, попадает в логи и сообщения об ошибках
    pub name: String,
    /// Логировать перезапись регистрации как warn (иначе debug)
    pub warn_on_overwrite: bool,
    /// Логировать каждое разрешение зависимости
    pub trace_resolutions: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            warn_on_overwrite: false,
            trace_resolutions: false,
        }
    }
}

impl ContainerConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_overwrite_warnings(mut self, enabled: bool) -> Self {
        self.warn_on_overwrite = enabled;
        self
    }

    pub fn with_resolution_tracing(mut self, enabled: bool) -> Self {
        self.trace_resolutions = enabled;
        self
    }
}

/// Загрузчик конфигурации из файлов и окружения
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    env_prefix: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
        }
    }

    /// Set environment variable prefix (default: "DI")
    pub fn env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Загрузить конфигурацию: файл из `<PREFIX>_CONFIG` (если задан) + переменные окружения
    pub fn load(&self) -> Result<ContainerConfig> {
        let mut config = match env::var(self.var("CONFIG")) {
            Ok(path) if !path.trim().is_empty() => self.load_from_file(path.trim())?,
            _ => ContainerConfig::default(),
        };

        self.apply_env(&mut config)?;
        Ok(config)
    }

    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<ContainerConfig> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read container config {}", path.display()))?;

        let config = match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => self.load_from_toml(&content),
            Some("json") => self.load_from_json(&content),
            Some("yaml") | Some("yml") => self.load_from_yaml(&content),
            _ => Err(anyhow!(
                "Unsupported configuration file format: {:?}",
                path.extension()
            )),
        };

        config.with_context(|| format!("Invalid container config {}", path.display()))
    }

    pub fn load_from_toml(&self, content: &str) -> Result<ContainerConfig> {
        Ok(toml::from_str(content)?)
    }

    pub fn load_from_json(&self, content: &str) -> Result<ContainerConfig> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn load_from_yaml(&self, content: &str) -> Result<ContainerConfig> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Применить переменные окружения `<PREFIX>_CONTAINER_NAME`,
    /// `<PREFIX>_WARN_ON_OVERWRITE`, `<PREFIX>_TRACE_RESOLUTIONS`
    pub fn apply_env(&self, config: &mut ContainerConfig) -> Result<()> {
        if let Ok(name) = env::var(self.var("CONTAINER_NAME")) {
            if !name.trim().is_empty() {
                config.name = name.trim().to_string();
            }
        }
        if let Some(flag) = self.env_flag("WARN_ON_OVERWRITE")? {
            config.warn_on_overwrite = flag;
        }
        if let Some(flag) = self.env_flag("TRACE_RESOLUTIONS")? {
            config.trace_resolutions = flag;
        }
        Ok(())
    }

    fn var(&self, key: &str) -> String {
        format!("{}_{}", self.env_prefix, key)
    }

    fn env_flag(&self, key: &str) -> Result<Option<bool>> {
        let var = self.var(key);
        match env::var(&var) {
            Ok(value) => parse_flag(&value)
                .map(Some)
                .ok_or_else(|| anyhow!("{} must be a boolean, got '{}'", var, value)),
            Err(_) => Ok(None),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ContainerConfig::default();
        assert_eq!(config.name, "default");
        assert!(!config.warn_on_overwrite);
        assert!(!config.trace_resolutions);
    }

    #[test]
    fn test_builder_methods() {
        let config = ContainerConfig::named("plugins")
            .with_overwrite_warnings(true)
            .with_resolution_tracing(true);

        assert_eq!(config.name, "plugins");
        assert!(config.warn_on_overwrite);
        assert!(config.trace_resolutions);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ConfigLoader::new()
            .load_from_toml("name = \"app\"\n")
            .expect("valid toml");

        assert_eq!(config.name, "app");
        assert!(!config.warn_on_overwrite);
    }

    #[test]
    fn test_json_and_yaml_formats() {
        let loader = ConfigLoader::new();

        let json = loader
            .load_from_json(r#"{"name": "json", "trace_resolutions": true}"#)
            .expect("valid json");
        assert_eq!(json.name, "json");
        assert!(json.trace_resolutions);

        let yaml = loader
            .load_from_yaml("name: yaml\nwarn_on_overwrite: true\n")
            .expect("valid yaml");
        assert_eq!(yaml.name, "yaml");
        assert!(yaml.warn_on_overwrite);
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let result = ConfigLoader::new().load_from_toml("warn_on_overwrite = \"maybe\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" off "), Some(false));
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag("maybe"), None);
    }
}
