use super::common::print_warnings;
use camino::Utf8PathBuf;
use clap::Parser;
use fleetmon::Result;
use fleetmon::config::Config;

#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file [default: one of fleet.[toml|yml|yaml|json] ]
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,
}

#[expect(clippy::unnecessary_wraps, reason = "Consistent interface with other subcommands")]
pub fn validate_config(args: &ValidateArgs) -> Result<()> {
    let base_path = Utf8PathBuf::from(".");
    let config_path = args.config.as_ref();

    match Config::load(&base_path, config_path) {
        Ok((config, warnings)) => {
            println!("Configuration validation successful");
            if let Some(path) = config_path {
                println!("Config file: {path}");
            }
            println!("{} tools, {} archived tools, owner '{}'", config.tools.len(), config.archived.len(), config.owner);

            print_warnings(&warnings);
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ Configuration validation failed: {e}");
            std::process::exit(1);
        }
    }
}
