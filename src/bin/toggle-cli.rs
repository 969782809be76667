use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "toggle-cli")]
#[command(about = "Query a running flag toggle service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a toggle and print its value and reason
    Get {
        /// Flag key
        name: String,
    },
    /// Show service health
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Get { name } => {
            let res = client
                .get(format!("{}/get-toggle", base))
                .query(&[("toggleName", name.as_str())])
                .send()
                .await?;
            let reason = res
                .headers()
                .get("x-flag-reason")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            if let Some(value) = print_response(res).await? {
                match reason {
                    Some(reason) => println!("{} ({})", value, reason),
                    None => println!("{}", value),
                }
            }
        }
        Commands::Health => {
            let res = client.get(format!("{}/health", base)).send().await?;
            if let Some(value) = print_response(res).await? {
                println!("{}", serde_json::to_string_pretty(&value)?);
            }
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: service returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(None);
    }

    Ok(Some(res.json().await?))
}
