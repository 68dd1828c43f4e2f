use clap::Parser;

use crate::domain::MapLevel;

#[derive(Debug, Parser)]
#[command(
    name = "agrivision",
    version,
    about = "Agricultural statistics map and dashboard for the terminal"
)]
pub struct CliArgs {
    /// Print statistics and exit
    #[arg(long)]
    pub headless: bool,

    /// Print headless statistics as JSON
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Override the API base URL
    #[arg(long = "api-url", value_name = "URL")]
    pub api_url: Option<String>,

    /// Initial map level (regions, departements, communes)
    #[arg(long, value_name = "LEVEL", value_parser = parse_level)]
    pub level: Option<MapLevel>,

    /// Override the log directory
    #[arg(long = "log-dir", value_name = "PATH")]
    pub log_dir: Option<String>,
}

fn parse_level(value: &str) -> Result<MapLevel, String> {
    MapLevel::parse(value).ok_or_else(|| {
        format!("unknown map level {value:?} (expected regions, departements or communes)")
    })
}

impl CliArgs {
    pub fn apply_env_overrides(&self) {
        if let Some(url) = &self.api_url {
            std::env::set_var("AGRIVISION_API_URL", url);
        }
        if let Some(dir) = &self.log_dir {
            std::env::set_var("AGRIVISION_LOG_DIR", dir);
        }
        if self.debug {
            std::env::set_var("DEBUG", "1");
        }
    }
}
