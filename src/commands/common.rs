//! Setup shared by all commands that talk to GitHub or the telemetry backend.

use camino::Utf8PathBuf;
use chrono::Utc;
use clap::{Args, ValueEnum};
use directories::BaseDirs;
use fleetmon::Result;
use fleetmon::config::Config;
use fleetmon::facts::hosting::{Client, Provider, RetryPolicy};
use fleetmon::facts::telemetry::{TelemetryClient, TelemetryCredentials};
use fleetmon::facts::{FileStore, TtlCache};
use fleetmon::reports::ColorMode;
use ohno::IntoAppError;
use std::path::PathBuf;
use std::sync::Arc;

pub const HOSTING_CACHE_FILE: &str = "github-cache.json";
pub const TELEMETRY_CACHE_FILE: &str = "telemetry-cache.json";

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    None,
    /// Only error messages
    Error,
    /// Warning and error messages
    Warn,
    /// Info, warning, and error messages
    Info,
    /// Debug and above messages
    Debug,
    /// All messages including trace
    Trace,
}

/// Arguments shared by every command that fetches data
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// GitHub personal access token
    #[arg(long, value_name = "TOKEN", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Base URL of the Prometheus-compatible telemetry backend
    #[arg(long, value_name = "URL", env = "GRAFANA_PROMETHEUS_URL", help_heading = "Telemetry")]
    pub prometheus_url: Option<String>,

    /// Instance ID used as the telemetry basic-auth user
    #[arg(long, value_name = "ID", env = "GRAFANA_INSTANCE_ID", help_heading = "Telemetry")]
    pub grafana_instance_id: Option<String>,

    /// API token used as the telemetry basic-auth password
    #[arg(long, value_name = "TOKEN", env = "GRAFANA_API_TOKEN", hide_env_values = true, help_heading = "Telemetry")]
    pub grafana_api_token: Option<String>,

    /// Path to configuration file [default: one of fleet.[toml|yml|yaml|json] ]
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Directory where API responses are cached [default: platform cache directory]
    #[arg(long, value_name = "PATH")]
    pub cache_dir: Option<Utf8PathBuf>,

    /// Control when to use colored output
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    pub color: ColorMode,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none", global = true)]
    pub log_level: LogLevel,
}

#[derive(Debug)]
pub struct Common {
    pub config: Config,
    pub color: ColorMode,
    hosting_cache: Arc<TtlCache>,
    telemetry_cache: Arc<TtlCache>,
    github_token: Option<String>,
    telemetry_credentials: Option<TelemetryCredentials>,
}

impl Common {
    /// Initialize logging, load the configuration, and open both caches
    pub fn new(args: &CommonArgs) -> Result<Self> {
        init_logging(args.log_level);

        let (config, warnings) = Config::load(&Utf8PathBuf::from("."), args.config.as_ref())?;
        print_warnings(&warnings);

        let cache_dir = cache_dir(args.cache_dir.as_ref())?;
        let now = Utc::now();

        let hosting_cache = TtlCache::load(FileStore::new(cache_dir.join(HOSTING_CACHE_FILE)), config.hosting_ttl(), now);
        let telemetry_cache = TtlCache::load(FileStore::new(cache_dir.join(TELEMETRY_CACHE_FILE)), config.telemetry_ttl(), now);

        Ok(Self {
            config,
            color: args.color,
            hosting_cache: Arc::new(hosting_cache),
            telemetry_cache: Arc::new(telemetry_cache),
            github_token: args.github_token.clone(),
            telemetry_credentials: TelemetryCredentials::from_parts(
                args.prometheus_url.as_deref(),
                args.grafana_instance_id.as_deref(),
                args.grafana_api_token.as_deref(),
            ),
        })
    }

    /// GitHub-backed provider sharing the hosting cache
    pub fn provider(&self, retry: RetryPolicy) -> Result<Provider> {
        let client = Client::new(self.github_token.as_deref(), &self.config.api_base_url, retry)?;
        Ok(Provider::new(client, Arc::clone(&self.hosting_cache)))
    }

    pub fn telemetry_client(&self) -> Result<TelemetryClient> {
        TelemetryClient::new(
            self.telemetry_credentials.clone(),
            self.config.telemetry.clone(),
            Arc::clone(&self.telemetry_cache),
        )
    }
}

/// Resolve the cache directory: the given path, or the platform cache directory
pub fn cache_dir(requested: Option<&Utf8PathBuf>) -> Result<PathBuf> {
    if let Some(path) = requested {
        return Ok(path.as_std_path().to_path_buf());
    }

    Ok(BaseDirs::new()
        .into_app_err("Failed to determine cache directory")?
        .cache_dir()
        .join("fleetmon"))
}

pub fn print_warnings(warnings: &[String]) {
    if !warnings.is_empty() {
        eprintln!("\n⚠️  Configuration validation warnings:");
        for warning in warnings {
            eprintln!("   {warning}");
        }
        eprintln!();
    }
}

/// Initialize logger based on log level
pub fn init_logging(log_level: LogLevel) {
    let level = match log_level {
        LogLevel::None => return,
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    };

    let env = env_logger::Env::default().filter_or("RUST_LOG", level);

    env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(matches!(log_level, LogLevel::Debug | LogLevel::Trace))
        .init();
}
