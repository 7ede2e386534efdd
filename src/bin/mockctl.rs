use std::collections::BTreeMap;

use clap::{Parser, Subcommand};
use serde_json::{Map, Value};

#[derive(Parser)]
#[command(name = "mockctl")]
#[command(about = "Management CLI for the mock API server", long_about = None)]
struct Cli {
    #[arg(short, long, env = "MOCK_URL", default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every registered route
    List,
    /// Show one route
    Get { id: u64 },
    /// Register a new route
    Create {
        #[arg(short, long)]
        method: String,
        #[arg(short, long)]
        path: String,
        #[arg(short, long, default_value_t = 200)]
        status: u16,
        /// Response body as JSON
        #[arg(short, long, default_value = "null")]
        response: String,
        /// Response header as `Name: value`; repeatable
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
    },
    /// Change fields of an existing route
    Update {
        id: u64,
        #[arg(short, long)]
        method: Option<String>,
        #[arg(short, long)]
        path: Option<String>,
        #[arg(short, long)]
        status: Option<u16>,
        /// Response body as JSON
        #[arg(short, long)]
        response: Option<String>,
        /// Response header as `Name: value`; repeatable, replaces all headers
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
    },
    /// Remove a route
    Delete { id: u64 },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = format!("{}/admin/routes", cli.url.trim_end_matches('/'));

    match cli.command {
        Commands::List => {
            let res = client.get(&base).send().await?;
            print_response(res).await?;
        }
        Commands::Get { id } => {
            let res = client.get(format!("{base}/{id}")).send().await?;
            print_response(res).await?;
        }
        Commands::Create {
            method,
            path,
            status,
            response,
            headers,
        } => {
            let mut body = Map::new();
            body.insert("method".into(), Value::String(method));
            body.insert("path".into(), Value::String(path));
            body.insert("status".into(), Value::from(status));
            body.insert("response".into(), serde_json::from_str(&response)?);
            if !headers.is_empty() {
                body.insert("headers".into(), serde_json::to_value(parse_headers(&headers)?)?);
            }

            let res = client.post(&base).json(&body).send().await?;
            print_response(res).await?;
        }
        Commands::Update {
            id,
            method,
            path,
            status,
            response,
            headers,
        } => {
            let mut body = Map::new();
            if let Some(method) = method {
                body.insert("method".into(), Value::String(method));
            }
            if let Some(path) = path {
                body.insert("path".into(), Value::String(path));
            }
            if let Some(status) = status {
                body.insert("status".into(), Value::from(status));
            }
            if let Some(response) = response {
                body.insert("response".into(), serde_json::from_str(&response)?);
            }
            if !headers.is_empty() {
                body.insert("headers".into(), serde_json::to_value(parse_headers(&headers)?)?);
            }

            let res = client.put(format!("{base}/{id}")).json(&body).send().await?;
            print_response(res).await?;
        }
        Commands::Delete { id } => {
            let res = client.delete(format!("{base}/{id}")).send().await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

fn parse_headers(raw: &[String]) -> Result<BTreeMap<String, String>, String> {
    raw.iter()
        .map(|header| {
            header
                .split_once(':')
                .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
                .ok_or_else(|| format!("header '{header}' must look like 'Name: value'"))
        })
        .collect()
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let text = res.text().await?;
    if text.is_empty() {
        println!("{}", status);
        return Ok(());
    }

    let json: Value = serde_json::from_str(&text)?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
