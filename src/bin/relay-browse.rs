use std::path::PathBuf;

use clap::Parser;
use serde_json::json;

use relay_gateway::config::loader::load_or_default;
use relay_gateway::navigation::{Browser, FetchPhase};
use relay_gateway::observability::logging;

#[derive(Parser)]
#[command(name = "relay-browse")]
#[command(about = "Load a page through the relay gateway", long_about = None)]
struct Cli {
    /// TOML configuration file; only the [navigation] section is used.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Gateway base URL, overriding the configuration.
    #[arg(short, long)]
    gateway: Option<String>,

    /// Print the page body instead of a summary.
    #[arg(short, long)]
    body: bool,

    /// URL, host name or search terms. Loads the home page when omitted.
    input: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = load_or_default(cli.config.as_deref())?;
    if let Some(gateway) = cli.gateway {
        config.navigation.gateway_url = gateway;
    }
    logging::init_logging(&config.observability);

    let mut browser = Browser::new(&config.navigation)?;
    let input = cli.input.join(" ");
    if browser.engine_mut().submit(&input).is_none() {
        browser.engine_mut().home();
    }

    let mut last_countdown = None;
    loop {
        let phase = browser.engine().state().phase;
        if !matches!(phase, FetchPhase::Loading | FetchPhase::Retrying) {
            break;
        }
        if let Some(remaining) = browser.engine().retry_remaining() {
            let secs = remaining.as_secs_f64().ceil() as u64;
            if last_countdown != Some(secs) {
                eprintln!("Retrying in {secs}s...");
                last_countdown = Some(secs);
            }
        }
        if !browser.step().await {
            break;
        }
    }

    let engine = browser.engine();
    let state = engine.state();
    match state.phase {
        FetchPhase::Loaded if cli.body => {
            if let Some(page) = engine.last_page() {
                println!("{}", String::from_utf8_lossy(&page.body));
            }
        }
        FetchPhase::Failed => {
            let report = json!({
                "url": state.url,
                "attempts": state.attempt_count,
                "failure": engine.failure(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
            std::process::exit(1);
        }
        _ => {
            let page = engine.last_page();
            let report = json!({
                "url": state.url,
                "phase": state.phase,
                "status": page.map(|p| p.status),
                "contentType": page.and_then(|p| p.content_type.clone()),
                "bytes": page.map(|p| p.body.len()),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
