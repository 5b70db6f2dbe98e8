use crate::Result;
use crate::config::{ArchivedToolConfig, ToolConfig};
use crate::facts::RepoSpec;
use camino::{Utf8Path, Utf8PathBuf};
use core::time::Duration;
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io;

/// The default configuration, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Owner that bare repository names are resolved against
    pub owner: String,

    #[serde(default = "default_web_base_url")]
    pub web_base_url: String,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Number of minutes to keep repository stats and commit lists before re-fetching
    #[serde(default = "default_hosting_cache_ttl")]
    pub hosting_cache_ttl: u64,

    /// Number of seconds to keep telemetry responses before re-querying
    #[serde(default = "default_telemetry_cache_ttl")]
    pub telemetry_cache_ttl: u64,

    /// Number of minutes between two refreshes of the fleet
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,

    /// Number of days of history counted for the trend label
    #[serde(default = "default_recent_commit_window")]
    pub recent_commit_window: u64,

    #[serde(default)]
    pub telemetry: TelemetryConfig,

    #[serde(default)]
    pub tools: Vec<ToolConfig>,

    #[serde(default)]
    pub archived: Vec<ArchivedToolConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfig {
    /// Prefix shared by all telemetry metric names
    #[serde(default = "default_metric_prefix")]
    pub metric_prefix: String,

    /// Seconds covered by a range query when no start is given
    #[serde(default = "default_range")]
    pub default_range: u64,

    /// Resolution of a range query when no step is given
    #[serde(default = "default_step")]
    pub default_step: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            metric_prefix: default_metric_prefix(),
            default_range: default_range(),
            default_step: default_step(),
        }
    }
}

fn default_web_base_url() -> String {
    "https://github.com".to_string()
}

fn default_api_base_url() -> String {
    "https://api.github.com".to_string()
}

const fn default_hosting_cache_ttl() -> u64 {
    30
}

const fn default_telemetry_cache_ttl() -> u64 {
    60
}

const fn default_refresh_interval() -> u64 {
    5
}

const fn default_recent_commit_window() -> u64 {
    30
}

fn default_metric_prefix() -> String {
    "claude_code".to_string()
}

const fn default_range() -> u64 {
    3600
}

fn default_step() -> String {
    "60".to_string()
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn load(base_path: &Utf8Path, config_path: Option<&Utf8PathBuf>) -> Result<(Self, Vec<String>)> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading fleetmon configuration from {path}"))?;
            (path.clone(), text)
        } else {
            let candidates = [
                base_path.join("fleet.toml"),
                base_path.join("fleet.yml"),
                base_path.join("fleet.yaml"),
                base_path.join("fleet.json"),
            ];

            let mut found = None;
            for path in &candidates {
                match fs::read_to_string(path) {
                    Ok(text) => {
                        found = Some((path.clone(), text));
                        break;
                    }
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e).into_app_err_with(|| format!("reading fleetmon configuration from {path}")),
                }
            }

            let Some(result) = found else {
                let config = Self::default();
                let mut warnings = Vec::new();
                config.validate(&mut warnings);
                return Ok((config, warnings));
            };
            result
        };

        let config = Self::parse(&final_path, &text)?;

        let mut warnings = Vec::new();
        config.validate(&mut warnings);
        Ok((config, warnings))
    }

    fn parse(path: &Utf8Path, text: &str) -> Result<Self> {
        let extension = path.extension().unwrap_or_default();
        let config = match extension {
            "toml" => toml::from_str(text).into_app_err_with(|| format!("parsing TOML configuration from {path}"))?,
            "yml" | "yaml" => serde_yaml::from_str(text).into_app_err_with(|| format!("parsing YAML configuration from {path}"))?,
            "json" => serde_json::from_str(text).into_app_err_with(|| format!("parsing JSON configuration from {path}"))?,
            _ => return Err(app_err!("unsupported configuration file extension: {extension}")),
        };

        Ok(config)
    }

    /// Save configuration to a file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save(&self, output_path: &Utf8Path) -> Result<()> {
        let extension = output_path.extension().unwrap_or_default();
        let text = match extension {
            "toml" => toml::to_string_pretty(self)
                .into_app_err_with(|| format!("serializing configuration to TOML for saving to {output_path}"))?,
            "yml" | "yaml" => serde_yaml::to_string(self)
                .into_app_err_with(|| format!("serializing configuration to YAML for saving to {output_path}"))?,
            "json" => serde_json::to_string_pretty(self)
                .into_app_err_with(|| format!("serializing configuration to JSON for saving to {output_path}"))?,
            _ => return Err(app_err!("unsupported configuration file extension: {extension}")),
        };

        fs::write(output_path, text).into_app_err_with(|| format!("writing configuration to {output_path}"))?;
        Ok(())
    }

    /// Save the default configuration to a file, keeping the comments when writing TOML
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn save_default_with_comments(&self, output_path: &Utf8Path) -> Result<()> {
        if output_path.extension() == Some("toml") {
            fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
        } else {
            self.save(output_path)?;
        }

        Ok(())
    }

    #[must_use]
    pub const fn hosting_ttl(&self) -> Duration {
        Duration::from_secs(self.hosting_cache_ttl.saturating_mul(60))
    }

    #[must_use]
    pub const fn telemetry_ttl(&self) -> Duration {
        Duration::from_secs(self.telemetry_cache_ttl)
    }

    /// Time between watch refreshes, never shorter than one minute
    #[must_use]
    pub const fn refresh_period(&self) -> Duration {
        let minutes = if self.refresh_interval == 0 { 1 } else { self.refresh_interval };
        Duration::from_secs(minutes.saturating_mul(60))
    }

    /// Resolve a repository reference from the configuration or the command line
    ///
    /// # Errors
    ///
    /// Returns an error if the reference is not a valid repository
    pub fn repo_spec(&self, repo: &str) -> Result<RepoSpec> {
        RepoSpec::parse(repo, &self.owner)
    }

    /// Browser URL of a repository
    #[must_use]
    pub fn repo_url(&self, repo: &RepoSpec) -> String {
        format!("{}/{}/{}", self.web_base_url.trim_end_matches('/'), repo.owner(), repo.repo())
    }

    /// Detect configurations that would produce confusing dashboards
    fn validate(&self, warnings: &mut Vec<String>) {
        if self.owner.trim().is_empty() {
            warnings.push("owner is empty; bare repository names cannot be resolved".to_string());
        }

        if self.hosting_cache_ttl == 0 {
            warnings.push("hosting_cache_ttl is 0; every request will go to GitHub".to_string());
        }

        if self.telemetry_cache_ttl == 0 {
            warnings.push("telemetry_cache_ttl is 0; every telemetry query will be sent to the backend".to_string());
        }

        if self.refresh_interval == 0 {
            warnings.push("refresh_interval is 0; watch mode will use a 1 minute interval".to_string());
        }

        let mut names = HashSet::new();
        let mut repos = HashSet::new();

        let entries = self
            .tools
            .iter()
            .map(|t| (t.name.as_str(), t.repo.as_str()))
            .chain(self.archived.iter().map(|a| (a.name.as_str(), a.repo.as_str())));

        for (name, repo) in entries {
            if !names.insert(name) {
                warnings.push(format!("tool '{name}' is defined more than once"));
            }

            match self.repo_spec(repo) {
                Ok(spec) => {
                    if !repos.insert(spec.to_string().to_lowercase()) {
                        warnings.push(format!("repository '{spec}' is used by more than one tool"));
                    }
                }
                Err(e) => warnings.push(format!("tool '{name}': {e}")),
            }
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG_TOML).expect("default_config.toml should be valid TOML that deserializes to Config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        let mut warnings = Vec::new();
        config.validate(&mut warnings);

        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
        assert_eq!(config.hosting_ttl(), Duration::from_secs(30 * 60));
        assert_eq!(config.telemetry_ttl(), Duration::from_secs(60));
        assert_eq!(config.refresh_period(), Duration::from_secs(5 * 60));
        assert_eq!(config.recent_commit_window, 30);
        assert!(!config.tools.is_empty());
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::parse(Utf8Path::new("fleet.toml"), r#"owner = "acme""#).unwrap();

        assert_eq!(config.api_base_url, "https://api.github.com");
        assert_eq!(config.hosting_cache_ttl, 30);
        assert_eq!(config.telemetry.metric_prefix, "claude_code");
        assert_eq!(config.telemetry.default_step, "60");
        assert!(config.tools.is_empty());
    }

    #[test]
    fn test_yaml_and_json_configs() {
        let yaml = "owner: acme\nrefresh_interval: 10\n";
        let config = Config::parse(Utf8Path::new("fleet.yaml"), yaml).unwrap();
        assert_eq!(config.refresh_interval, 10);

        let json = r#"{ "owner": "acme", "telemetry_cache_ttl": 5 }"#;
        let config = Config::parse(Utf8Path::new("fleet.json"), json).unwrap();
        assert_eq!(config.telemetry_cache_ttl, 5);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = Config::parse(Utf8Path::new("fleet.ini"), "owner = acme").unwrap_err();
        assert!(err.to_string().contains("unsupported configuration file extension"));
    }

    #[test]
    fn test_validate_reports_duplicates() {
        let toml = r#"
            owner = "acme"

            [[tools]]
            name = "A"
            repo = "one"
            kind = "TOOL"

            [[tools]]
            name = "A"
            repo = "acme/One"
            kind = "BOT"
        "#;

        let config = Config::parse(Utf8Path::new("fleet.toml"), toml).unwrap();
        let mut warnings = Vec::new();
        config.validate(&mut warnings);

        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("tool 'A' is defined more than once"));
        assert!(warnings[1].contains("used by more than one tool"));
    }

    #[test]
    fn test_validate_reports_zero_ttl() {
        let config = Config::parse(Utf8Path::new("fleet.toml"), "owner = \"acme\"\nhosting_cache_ttl = 0\n").unwrap();
        let mut warnings = Vec::new();
        config.validate(&mut warnings);

        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("hosting_cache_ttl"));
    }

    #[test]
    fn test_zero_refresh_interval_uses_one_minute() {
        let config = Config::parse(Utf8Path::new("fleet.toml"), "owner = \"acme\"\nrefresh_interval = 0\n").unwrap();
        assert_eq!(config.refresh_period(), Duration::from_secs(60));

        let mut warnings = Vec::new();
        config.validate(&mut warnings);
        assert!(warnings.iter().any(|w| w.contains("1 minute interval")));
    }

    #[test]
    fn test_huge_durations_saturate() {
        let config = Config {
            hosting_cache_ttl: u64::MAX / 2,
            refresh_interval: u64::MAX,
            ..Config::default()
        };

        assert_eq!(config.hosting_ttl(), Duration::from_secs(u64::MAX));
        assert_eq!(config.refresh_period(), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_repo_url() {
        let config = Config::default();
        let spec = config.repo_spec("Lead").unwrap();
        assert_eq!(config.repo_url(&spec), "https://github.com/C9-Tech-GtitHub/Lead");
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_load_without_file_falls_back_to_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let base = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap();

        let (config, warnings) = Config::load(&base, None).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(config.owner, Config::default().owner);
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_save_and_load_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let base = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap();
        let path = base.join("fleet.json");

        let mut config = Config::default();
        config.refresh_interval = 15;
        config.save(&path).unwrap();

        let (loaded, _) = Config::load(&base, None).unwrap();
        assert_eq!(loaded.refresh_interval, 15);
        assert_eq!(loaded.tools.len(), config.tools.len());
    }
}
