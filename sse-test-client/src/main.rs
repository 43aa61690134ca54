use anyhow::Result;
use clap::Parser;
use colored::*;
use serde_json::json;
use std::time::Duration;

mod api_client;
mod sse_client;

use api_client::ApiClient;
use sse_client::Connection;

const EVENT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "sse-test-client")]
#[command(about = "Event Relay SSE Integration Testing Tool")]
struct Cli {
    /// Base URL of the relay backend (e.g., http://localhost:4000)
    #[arg(long, default_value = "http://localhost:4000")]
    base_url: String,

    /// Test scenario to run
    #[arg(long, value_enum)]
    scenario: ScenarioChoice,

    /// Enable verbose output
    #[arg(long, short)]
    verbose: bool,
}

#[derive(clap::ValueEnum, Clone)]
enum ScenarioChoice {
    /// Subscribe and verify the server hands out a subscription id
    ConnectionTest,
    /// Publish an event and verify it arrives on a live connection
    LiveEvent,
    /// Publish while disconnected and verify the backlog drains on reconnect
    ReconnectBacklog,
    /// Run all scenarios
    All,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    }

    let api = ApiClient::new(cli.base_url.clone());

    match cli.scenario {
        ScenarioChoice::ConnectionTest => connection_test(&api).await?,
        ScenarioChoice::LiveEvent => live_event_test(&api).await?,
        ScenarioChoice::ReconnectBacklog => reconnect_backlog_test(&api).await?,
        ScenarioChoice::All => {
            connection_test(&api).await?;
            live_event_test(&api).await?;
            reconnect_backlog_test(&api).await?;
        }
    }

    println!("\n{}", "All scenarios passed".green().bold());
    Ok(())
}

async fn connection_test(api: &ApiClient) -> Result<()> {
    println!("{}", "=== CONNECTION TEST ===".bright_white().bold());

    let mut connection =
        Connection::establish(&api.base_url, None, "subscriber".to_string()).await?;
    let event = connection.wait_for_event("subscription", EVENT_TIMEOUT).await?;

    println!(
        "{} Received subscription id: {}",
        "✓".green(),
        event.data["subscriptionId"]
    );
    connection.close();
    Ok(())
}

async fn live_event_test(api: &ApiClient) -> Result<()> {
    println!("{}", "=== LIVE EVENT TEST ===".bright_white().bold());

    let mut connection =
        Connection::establish(&api.base_url, None, "subscriber".to_string()).await?;
    connection.wait_for_event("subscription", EVENT_TIMEOUT).await?;

    api.publish_event("relay.smoke", json!({ "id": "smoke-1" }))
        .await?;
    let event = connection.wait_for_event("relay.smoke", EVENT_TIMEOUT).await?;

    println!(
        "{} Live event delivered (resultId: {})",
        "✓".green(),
        event.data["result"]["id"]
    );
    connection.close();
    Ok(())
}

async fn reconnect_backlog_test(api: &ApiClient) -> Result<()> {
    println!("{}", "=== RECONNECT BACKLOG TEST ===".bright_white().bold());

    let mut connection =
        Connection::establish(&api.base_url, None, "subscriber".to_string()).await?;
    let subscription = connection.wait_for_event("subscription", EVENT_TIMEOUT).await?;
    let subscription_id = subscription.data["subscriptionId"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("subscription frame carried no id"))?;

    println!(
        "{} Connected with subscription id {subscription_id}, disconnecting",
        "→".blue()
    );
    connection.close();

    // Give the relay a beat to notice the dead channel before publishing.
    tokio::time::sleep(Duration::from_millis(500)).await;
    api.publish_event("relay.backlog", json!({ "id": "backlog-1" }))
        .await?;

    println!("{} Reconnecting with the same subscription id", "→".blue());
    let mut reconnected = Connection::establish(
        &api.base_url,
        Some(&subscription_id),
        "subscriber".to_string(),
    )
    .await?;
    reconnected
        .wait_for_event("subscription", EVENT_TIMEOUT)
        .await?;
    let event = reconnected
        .wait_for_event("relay.backlog", EVENT_TIMEOUT)
        .await?;

    println!(
        "{} Backlog drained after reconnect (resultId: {})",
        "✓".green(),
        event.data["result"]["id"]
    );
    reconnected.close();
    Ok(())
}
