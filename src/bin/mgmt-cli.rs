use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "mgmt-cli")]
#[command(about = "Client for the HTTP management interface", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:9990")]
    url: String,

    /// Bearer token, required when the interface is secured.
    #[arg(short, long)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Liveness and drain phase
    Health,
    /// Read the root resource
    ReadResource,
    /// Read one attribute of the root resource
    ReadAttribute { name: String },
    /// Execute a raw JSON operation
    Op { json: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(token) = &cli.token {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", token))?);
    }

    let res = match cli.command {
        Commands::Health => client.get(format!("{}/health", cli.url)).send().await?,
        Commands::ReadResource => {
            client
                .get(format!("{}/management", cli.url))
                .headers(headers)
                .send()
                .await?
        }
        Commands::ReadAttribute { name } => {
            client
                .post(format!("{}/management", cli.url))
                .headers(headers)
                .json(&json!({ "operation": "read-attribute", "address": [], "name": name }))
                .send()
                .await?
        }
        Commands::Op { json } => {
            let operation: Value = serde_json::from_str(&json)?;
            client
                .post(format!("{}/management", cli.url))
                .headers(headers)
                .json(&operation)
                .send()
                .await?
        }
    };
    print_response(res).await?;

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Err(format!("management interface returned status {}", status).into());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
