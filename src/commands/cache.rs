use super::common::{HOSTING_CACHE_FILE, LogLevel, TELEMETRY_CACHE_FILE, cache_dir, init_logging};
use camino::Utf8PathBuf;
use clap::Parser;
use fleetmon::Result;
use fleetmon::facts::{CacheStore, FileStore};

#[derive(Parser, Debug)]
pub struct ClearCacheArgs {
    /// Directory where API responses are cached [default: platform cache directory]
    #[arg(long, value_name = "PATH")]
    pub cache_dir: Option<Utf8PathBuf>,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none")]
    pub log_level: LogLevel,
}

pub fn clear_cache(args: &ClearCacheArgs) -> Result<()> {
    init_logging(args.log_level);

    let dir = cache_dir(args.cache_dir.as_ref())?;
    for name in [HOSTING_CACHE_FILE, TELEMETRY_CACHE_FILE] {
        FileStore::new(dir.join(name)).remove()?;
    }

    println!("Cleared caches in {}", dir.display());
    Ok(())
}
