//! SubSync CLI - Command-line interface for the SubSync daemon

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;
use tabled::{Table, Tabled};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9528";
const WATCH_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Parser)]
#[command(name = "subsync")]
#[command(about = "Move subscriptions between Reddit and YouTube accounts", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "SUBSYNC_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum Role {
    Source,
    Target,
}

impl Role {
    fn as_str(self) -> &'static str {
        match self {
            Role::Source => "source",
            Role::Target => "target",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List platforms and whether they are configured
    Platforms,

    /// Create a session, or show one with --id
    Session {
        #[arg(long)]
        id: Option<String>,
    },

    /// Delete a session and forget its connected accounts
    Logout {
        #[arg(long, env = "SUBSYNC_SESSION")]
        session: String,
    },

    /// Begin OAuth for one side of the session
    Login {
        #[arg(long, env = "SUBSYNC_SESSION")]
        session: String,

        /// reddit or youtube
        #[arg(long)]
        platform: String,

        #[arg(long, value_enum)]
        role: Role,
    },

    /// Finish OAuth with the state and code from the redirect
    Callback {
        #[arg(long, env = "SUBSYNC_SESSION")]
        session: String,

        #[arg(long)]
        state: String,

        #[arg(long)]
        code: String,
    },

    /// List the source account's subscriptions
    Subscriptions {
        #[arg(long, env = "SUBSYNC_SESSION")]
        session: String,
    },

    /// Subscribe the target account to the given ids
    Start {
        #[arg(long, env = "SUBSYNC_SESSION")]
        session: String,

        /// Subscription ids from the source listing
        #[arg(required = true)]
        ids: Vec<String>,

        /// Saved-content snapshot to replay (from `export`)
        #[arg(long)]
        content: Option<PathBuf>,

        /// Poll until the transfer finishes
        #[arg(long)]
        watch: bool,
    },

    /// Unsubscribe the target account from everything
    ClearAll {
        #[arg(long, env = "SUBSYNC_SESSION")]
        session: String,

        #[arg(long)]
        watch: bool,
    },

    /// Show transfer progress
    Status {
        transfer_id: String,

        /// Refresh every second until the transfer finishes
        #[arg(long)]
        watch: bool,
    },

    /// Export the source account's saved content to a JSON file
    Export {
        #[arg(long, env = "SUBSYNC_SESSION")]
        session: String,

        /// Defaults to `<platform>-content-<user>-<date>.json`
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: serde_json::Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: u64,
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

#[derive(Deserialize, Tabled)]
struct PlatformRow {
    id: String,
    name: String,
    enabled: bool,
}

#[derive(Deserialize, Tabled)]
struct SubscriptionRow {
    id: String,
    #[serde(rename = "displayName")]
    #[tabled(rename = "name")]
    display_name: String,
    #[serde(rename = "subscriberCount", default)]
    #[tabled(rename = "subscribers", display_with = "display_count")]
    subscriber_count: Option<u64>,
}

fn display_count(count: &Option<u64>) -> String {
    count.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemResult {
    target_id: String,
    target_name: String,
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    already_exists: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Progress {
    total: usize,
    processed: usize,
    successful: usize,
    failed: usize,
    #[serde(default)]
    results: Vec<ItemResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentStatus {
    enabled: bool,
    #[serde(default)]
    warning: Option<String>,
    #[serde(flatten)]
    progress: Progress,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransferStatus {
    id: String,
    status: String,
    #[serde(flatten)]
    progress: Progress,
    source_account: String,
    target_account: String,
    #[serde(default)]
    content_transfer: Option<ContentStatus>,
    #[serde(default)]
    error: Option<String>,
}

impl TransferStatus {
    fn is_terminal(&self) -> bool {
        matches!(self.status.as_str(), "completed" | "failed")
    }
}

#[derive(Tabled)]
struct ResultRow {
    #[tabled(rename = "#")]
    index: usize,
    id: String,
    name: String,
    outcome: String,
}

fn result_rows(results: &[ItemResult]) -> Vec<ResultRow> {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| ResultRow {
            index: i + 1,
            id: r.target_id.clone(),
            name: r.target_name.clone(),
            outcome: outcome(r),
        })
        .collect()
}

fn outcome(result: &ItemResult) -> String {
    match (result.success, result.already_exists) {
        (true, Some(true)) => "already subscribed".to_string(),
        (true, Some(false)) => "not subscribed".to_string(),
        (true, None) => "ok".to_string(),
        (false, _) => result
            .error
            .clone()
            .unwrap_or_else(|| "failed".to_string()),
    }
}

async fn call_rpc(url: &str, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: method.to_string(),
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response: JsonRpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .context("Failed to connect to daemon")?
        .json()
        .await
        .context("Failed to parse response")?;

    if let Some(error) = response.error {
        anyhow::bail!("RPC error ({}): {}", error.code, error.message);
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

fn print_status(status: &TransferStatus) {
    let label = match status.status.as_str() {
        "completed" => status.status.green().bold(),
        "failed" => status.status.red().bold(),
        _ => status.status.yellow().bold(),
    };
    println!("{} {} [{}]", "Transfer".cyan().bold(), status.id, label);
    println!(
        "  {} {} → {}",
        "Accounts:".bold(),
        status.source_account,
        status.target_account
    );
    let p = &status.progress;
    println!(
        "  {} {}/{} ({} ok, {} failed)",
        "Progress:".bold(),
        p.processed,
        p.total,
        p.successful.to_string().green(),
        p.failed.to_string().red()
    );
    if let Some(error) = &status.error {
        println!("  {} {}", "Error:".bold(), error.red());
    }

    if !p.results.is_empty() {
        println!();
        println!("{}", Table::new(result_rows(&p.results)));
    }

    if let Some(content) = &status.content_transfer {
        println!();
        if content.enabled {
            let c = &content.progress;
            println!(
                "  {} {}/{} ({} ok, {} failed)",
                "Saved content:".bold(),
                c.processed,
                c.total,
                c.successful.to_string().green(),
                c.failed.to_string().red()
            );
        } else if let Some(warning) = &content.warning {
            println!("  {} {}", "Saved content skipped:".bold(), warning.yellow());
        }
    }
}

async fn fetch_status(url: &str, transfer_id: &str) -> Result<TransferStatus> {
    let result = call_rpc(
        url,
        "transfer.status.v1",
        json!({ "transfer_id": transfer_id }),
    )
    .await?;
    serde_json::from_value(result).context("Unexpected transfer status shape")
}

async fn show_status(url: &str, transfer_id: &str, watch: bool) -> Result<()> {
    loop {
        let status = fetch_status(url, transfer_id).await?;
        if !watch || status.is_terminal() {
            print_status(&status);
            return Ok(());
        }
        let p = &status.progress;
        println!(
            "{} {}/{} ({} ok, {} failed)",
            "…".dimmed(),
            p.processed,
            p.total,
            p.successful,
            p.failed
        );
        tokio::time::sleep(WATCH_INTERVAL).await;
    }
}

async fn started(url: &str, result: serde_json::Value, watch: bool) -> Result<()> {
    let transfer_id = result["transfer_id"]
        .as_str()
        .context("No transfer_id in response")?
        .to_string();
    println!(
        "{}",
        format!("✓ Transfer {} started", transfer_id).green().bold()
    );
    if watch {
        println!();
        show_status(url, &transfer_id, true).await?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let url = cli.rpc_url.as_str();

    match cli.command {
        Commands::Platforms => {
            let result = call_rpc(url, "platforms.list.v1", json!({})).await?;
            let rows: Vec<PlatformRow> = serde_json::from_value(result["platforms"].clone())?;
            println!("{}", Table::new(rows));
        }

        Commands::Session { id: None } => {
            let result = call_rpc(url, "session.create.v1", json!({})).await?;
            let session_id = result["session_id"].as_str().unwrap_or_default();
            println!("{}", "✓ Session created".green().bold());
            println!("  export SUBSYNC_SESSION={}", session_id);
        }

        Commands::Session { id: Some(id) } => {
            let result = call_rpc(url, "session.status.v1", json!({ "session_id": id })).await?;
            println!("{} {}", "Session".cyan().bold(), id);
            for role in ["source", "target"] {
                let account = &result[role];
                if account.is_null() {
                    println!("  {} {}", format!("{}:", role).bold(), "not connected".yellow());
                } else {
                    println!(
                        "  {} {} ({}) on {}",
                        format!("{}:", role).bold(),
                        account["display_name"].as_str().unwrap_or_default(),
                        account["username"].as_str().unwrap_or_default(),
                        account["platform"].as_str().unwrap_or_default()
                    );
                }
            }
        }

        Commands::Logout { session } => {
            let result = call_rpc(url, "session.delete.v1", json!({ "session_id": session })).await?;
            if result["deleted"].as_bool().unwrap_or(false) {
                println!("{} {}", "✓ Session deleted:".green().bold(), session);
            } else {
                println!("{} {}", "Session not found:".yellow(), session);
            }
        }

        Commands::Login {
            session,
            platform,
            role,
        } => {
            let params = json!({
                "session_id": session,
                "platform": platform.to_ascii_lowercase(),
                "role": role.as_str(),
            });
            let result = call_rpc(url, "auth.begin.v1", params).await?;
            println!("{}", "Open this URL to authorize:".cyan().bold());
            println!("  {}", result["auth_url"].as_str().unwrap_or_default());
            println!();
            println!(
                "Then run: subsync callback --session {} --state {} --code <code>",
                session,
                result["state"].as_str().unwrap_or_default()
            );
        }

        Commands::Callback {
            session,
            state,
            code,
        } => {
            let params = json!({ "session_id": session, "state": state, "code": code });
            let result = call_rpc(url, "auth.complete.v1", params).await?;
            println!(
                "{}",
                format!(
                    "✓ Connected {} as {} ({})",
                    result["role"].as_str().unwrap_or_default(),
                    result["display_name"].as_str().unwrap_or_default(),
                    result["platform"].as_str().unwrap_or_default()
                )
                .green()
                .bold()
            );
        }

        Commands::Subscriptions { session } => {
            let result =
                call_rpc(url, "subscriptions.list.v1", json!({ "session_id": session })).await?;
            let rows: Vec<SubscriptionRow> = serde_json::from_value(result)?;
            println!("{} subscriptions", rows.len().to_string().bold());
            println!("{}", Table::new(rows));
        }

        Commands::Start {
            session,
            ids,
            content,
            watch,
        } => {
            let snapshot = match content {
                Some(path) => {
                    let raw = tokio::fs::read_to_string(&path)
                        .await
                        .with_context(|| format!("Failed to read {}", path.display()))?;
                    let value: serde_json::Value = serde_json::from_str(&raw)
                        .with_context(|| format!("{} is not valid JSON", path.display()))?;
                    Some(value)
                }
                None => None,
            };
            let params = json!({
                "session_id": session,
                "subscriptions": ids,
                "transfer_saved_posts": snapshot.is_some(),
                "saved_posts_data": snapshot,
            });
            let result = call_rpc(url, "transfer.start.v1", params).await?;
            started(url, result, watch).await?;
        }

        Commands::ClearAll { session, watch } => {
            let result =
                call_rpc(url, "transfer.clear_all.v1", json!({ "session_id": session })).await?;
            started(url, result, watch).await?;
        }

        Commands::Status { transfer_id, watch } => {
            show_status(url, &transfer_id, watch).await?;
        }

        Commands::Export { session, out } => {
            let snapshot =
                call_rpc(url, "content.export.v1", json!({ "session_id": session })).await?;
            let path = out.unwrap_or_else(|| PathBuf::from(default_export_name(&snapshot)));
            let count = snapshot["content"].as_array().map(Vec::len).unwrap_or(0);

            let body = serde_json::to_string_pretty(&snapshot)?;
            tokio::fs::write(&path, body)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "{}",
                format!("✓ Exported {} items to {}", count, path.display())
                    .green()
                    .bold()
            );
        }
    }

    Ok(())
}

fn default_export_name(snapshot: &serde_json::Value) -> String {
    let date = snapshot["exportedAt"]
        .as_str()
        .and_then(|s| s.get(..10))
        .unwrap_or("export");
    format!(
        "{}-content-{}-{}.json",
        snapshot["platform"].as_str().unwrap_or("platform"),
        snapshot["username"].as_str().unwrap_or("user"),
        date
    )
}
