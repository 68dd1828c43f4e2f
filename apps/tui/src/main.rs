use agrivision::api::ApiClient;
use agrivision::app::App;
use agrivision::cli::CliArgs;
use agrivision::config::init_app_config;
use agrivision::logging::init_logging;
use agrivision::{event, terminal};
use clap::Parser;
use color_eyre::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // Setup error handling
    color_eyre::install()?;

    let args = CliArgs::parse();
    args.apply_env_overrides();

    let config = init_app_config()?;
    let _log_guard = init_logging(&config.log_dir, config.debug)?;
    tracing::info!(api = %config.api.base_url, "starting agrivision");

    let client = ApiClient::new(&config.api)?;
    let sweeper = client.spawn_sweeper(config.api.sweep_interval);

    // Check if we're running in a terminal
    if args.headless || !is_terminal() {
        let result = event::run_headless(&client, args.json).await;
        sweeper.abort();
        return result;
    }

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let mut app = App::new(client, args.level.unwrap_or_default(), tx);

    // Setup terminal
    let mut terminal = terminal::setup()?;

    // Run the application
    let result = event::run(&mut terminal, &mut app, &mut rx);

    // Restore terminal
    terminal::cleanup(true, true);
    sweeper.abort();

    if let Err(e) = &result {
        tracing::error!(error = %e, "application exited with an error");
    }
    result
}

// Check if we're running in a terminal
fn is_terminal() -> bool {
    atty::is(atty::Stream::Stdout)
}
