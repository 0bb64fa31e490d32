use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "weather-cli")]
#[command(about = "Query CLI for the weather monitor", long_about = None)]
struct Cli {
    #[arg(short, long, env = "WEATHER_MONITOR_URL", default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the most recent observation
    Current,
    /// List observations from the last N hours
    History {
        #[arg(long, default_value_t = 24)]
        hours: i64,
        #[arg(long, default_value_t = 100)]
        limit: u32,
    },
    /// Show aggregates over the last N hours
    Stats {
        #[arg(long, default_value_t = 24)]
        hours: i64,
    },
    /// Liveness probe
    Health,
    /// Readiness probe
    Ready,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let request = match cli.command {
        Commands::Current => client.get(format!("{}/api/weather/current", base)),
        Commands::History { hours, limit } => client
            .get(format!("{}/api/weather/history", base))
            .query(&[("hours", hours.to_string()), ("limit", limit.to_string())]),
        Commands::Stats { hours } => client
            .get(format!("{}/api/weather/stats", base))
            .query(&[("hours", hours.to_string())]),
        Commands::Health => client.get(format!("{}/health", base)),
        Commands::Ready => client.get(format!("{}/ready", base)),
    };

    let res = request.send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: weather monitor returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
