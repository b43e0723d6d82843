use crate::errors::{AppError, AppResult};
use crate::merger::MergeSettings;
use crate::models::MergeGroup;
use crate::utils::time::OutputTimezone;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

pub const DEFAULT_CONFIG_FILE: &str = "epg-merge.toml";
pub const CONFIG_FILE_ENV: &str = "EPG_MERGE_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default = "default_groups")]
    pub groups: Vec<MergeGroup>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_generator_info_name")]
    pub generator_info_name: String,
    #[serde(default = "default_generator_info_url")]
    pub generator_info_url: String,
    /// Timezone for the root `date` stamp: UTC offset or IANA name
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_generator_info_name() -> String {
    "tvsilo.vip".to_string()
}

fn default_generator_info_url() -> String {
    "https://github.com/g12777/TV".to_string()
}

fn default_timezone() -> String {
    "+08:00".to_string()
}

fn default_groups() -> Vec<MergeGroup> {
    vec![
        MergeGroup::new(
            "epg/1d.xml",
            ["epg/e.xml", "epg/plsy1_1d.xml", "epg/112114.xml"],
        ),
        MergeGroup::new("epg/7d.xml", ["epg/all.xml", "epg/plsy1_7d.xml"]),
    ]
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            generator_info_name: default_generator_info_name(),
            generator_info_url: default_generator_info_url(),
            timezone: default_timezone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output: OutputConfig::default(),
            groups: default_groups(),
        }
    }
}

impl OutputConfig {
    pub fn timezone(&self) -> AppResult<OutputTimezone> {
        OutputTimezone::parse(&self.timezone).map_err(AppError::configuration)
    }

    /// Merge settings stamped with the current time
    pub fn merge_settings(&self) -> AppResult<MergeSettings> {
        Ok(MergeSettings {
            generator_info_name: self.generator_info_name.clone(),
            generator_info_url: self.generator_info_url.clone(),
            generated_at: self.timezone()?.now_stamp(),
        })
    }
}

impl Config {
    /// Load from a file if it exists, otherwise use the built-in defaults
    pub fn load_from(path: &Path) -> AppResult<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config = Self::from_toml(&contents)?;
            info!("Configuration loaded from: {}", path.display());
            Ok(config)
        } else {
            info!(
                "No configuration at {}, using built-in merge groups",
                path.display()
            );
            Ok(Self::default())
        }
    }

    pub fn from_toml(contents: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(contents)
            .map_err(|e| AppError::configuration(format!("invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        self.output.timezone()?;

        for (i, group) in self.groups.iter().enumerate() {
            if group.output.as_os_str().is_empty() {
                return Err(AppError::configuration(format!(
                    "merge group {} has an empty output path",
                    i + 1
                )));
            }
            if group.inputs.is_empty() {
                return Err(AppError::configuration(format!(
                    "merge group '{}' has no inputs",
                    group.label()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.groups.len(), 2);
        assert_eq!(config.groups[0].output, PathBuf::from("epg/1d.xml"));
        assert_eq!(config.groups[0].base(), Some(Path::new("epg/e.xml")));
        assert_eq!(config.groups[1].inputs.len(), 2);
        assert_eq!(config.output.generator_info_name, "tvsilo.vip");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let config = Config::from_toml(
            r#"
[output]
generator_info_name = "my-guide"
timezone = "Asia/Shanghai"

[[groups]]
name = "daily"
output = "out/daily.xml"
inputs = ["a.xml", "b.xml"]
"#,
        )
        .unwrap();

        assert_eq!(config.output.generator_info_name, "my-guide");
        assert_eq!(
            config.output.generator_info_url,
            "https://github.com/g12777/TV"
        );
        assert_eq!(config.groups.len(), 1);
        assert_eq!(config.groups[0].label(), "daily");
        assert_eq!(
            config.groups[0].inputs,
            vec![PathBuf::from("a.xml"), PathBuf::from("b.xml")]
        );
    }

    #[test]
    fn test_missing_groups_use_defaults() {
        let config = Config::from_toml("[output]\ntimezone = \"+00:00\"\n").unwrap();
        assert_eq!(config.groups.len(), 2);
    }

    #[test]
    fn test_invalid_configs_are_rejected() {
        assert!(Config::from_toml("[output]\ntimezone = \"Mars/Olympus\"\n").is_err());
        assert!(Config::from_toml("[[groups]]\noutput = \"o.xml\"\ninputs = []\n").is_err());
        assert!(Config::from_toml("[[groups]]\noutput = \"\"\ninputs = [\"a.xml\"]\n").is_err());
        assert!(Config::from_toml("groups = 3").is_err());
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.groups.len(), 2);
    }

    #[test]
    fn test_merge_settings_stamp() {
        let settings = OutputConfig::default().merge_settings().unwrap();
        assert_eq!(settings.generated_at.len(), 14);
        assert_eq!(settings.generator_info_url, "https://github.com/g12777/TV");
    }
}
