use crate::cli::output::Output;
use crate::config::{GistwatchConfig, find_config_file};
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Display the effective configuration with secrets masked
    Show {
        /// Output format: toml or json
        #[arg(short, long, default_value = "toml")]
        format: String,
    },
    /// Print which configuration file is in use
    Path,
}

pub fn execute(
    args: ConfigArgs,
    config: GistwatchConfig,
    custom_config: Option<&str>,
    output: &Output,
) -> Result<()> {
    match args.command {
        ConfigCommand::Show { format } => {
            let config = config.redacted();
            let rendered = match format.to_lowercase().as_str() {
                "toml" => toml::to_string_pretty(&config)?,
                "json" => serde_json::to_string_pretty(&config)?,
                _ => anyhow::bail!("Unsupported format: {}. Use toml or json", format),
            };
            println!("{}", rendered.trim_end());
        }
        ConfigCommand::Path => match custom_config.map(std::path::PathBuf::from).or_else(find_config_file) {
            Some(path) => println!("{}", path.display()),
            None => output.info("No configuration file found, using built-in defaults"),
        },
    }
    Ok(())
}
