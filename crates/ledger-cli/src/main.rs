use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use ledger_core::validate_chain;
use ledger_node::{api::MineRequest, constants::MINE_PATH, sync::fetch_chain};
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ledger-cli")]
#[command(about = "CLI client for the proof-of-work ledger node")]
struct Cli {
    /// Node base URL (e.g. http://127.0.0.1:5001)
    #[arg(long, global = true, default_value = "http://127.0.0.1:5001")]
    node: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Mine a block carrying DATA (parsed as JSON, otherwise sent as a string)
    Mine {
        #[arg(long)]
        data: String,
    },
    /// Print the node's full chain
    Chain,
    /// Fetch the node's chain and validate it locally
    Validate,
}

fn parse_payload(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    let node = cli.node.trim_end_matches('/');
    let client = reqwest::Client::new();

    match cli.cmd {
        Command::Mine { data } => {
            let req = MineRequest {
                data: parse_payload(&data),
            };
            debug!("submitting {}", req.data);
            let res = client
                .post(format!("{node}{MINE_PATH}"))
                .json(&req)
                .send()
                .await?;
            let status = res.status();
            let body = res.text().await?;
            println!("status: {}", status);
            println!("{body}");
        }
        Command::Chain => {
            let chain = fetch_chain(&client, node).await?;
            println!("{}", serde_json::to_string_pretty(&chain)?);
        }
        Command::Validate => {
            let chain = fetch_chain(&client, node).await?;
            let valid = validate_chain(&chain);
            println!("length: {}", chain.len());
            if let Some(tip) = chain.last() {
                println!("tip: {} (difficulty {})", tip.hash, tip.difficulty);
            }
            println!("valid: {valid}");
            if !valid {
                return Err(anyhow!("chain served by {node} failed validation"));
            }
        }
    }
    Ok(())
}
