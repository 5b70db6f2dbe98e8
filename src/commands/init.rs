use camino::Utf8PathBuf;
use clap::Parser;
use fleetmon::Result;
use fleetmon::config::Config;
use ohno::bail;

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Where to write the configuration
    #[arg(value_name = "PATH", default_value = "fleet.toml")]
    pub output: Utf8PathBuf,

    /// Overwrite the file if it already exists
    #[arg(long)]
    pub force: bool,
}

pub fn init_config(args: &InitArgs) -> Result<()> {
    if args.output.exists() && !args.force {
        bail!("'{}' already exists, use --force to overwrite it", args.output);
    }

    let config = Config::default();
    config.save_default_with_comments(&args.output)?;

    println!(
        "Wrote {} with {} tools and {} archived tools owned by '{}'",
        args.output,
        config.tools.len(),
        config.archived.len(),
        config.owner
    );
    println!("Set GITHUB_TOKEN to raise the GitHub rate limit, then run `fleetmon fleet`");
    Ok(())
}
