use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "punch", about = "Punch attendance terminal CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record the start of your shift
    ClockIn {
        /// Optional note attached to the record (e.g., "on-site visit")
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Record the end of your shift
    ClockOut {
        /// Optional note attached to the record
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Show daemon status
    Status,
    /// List available camera devices
    Devices,
}

#[zbus::proxy(
    interface = "dev.punch.Clock1",
    default_service = "dev.punch.Clock1",
    default_path = "/dev/punch/Clock1"
)]
trait Clock {
    fn clock_in(&self, notes: &str) -> zbus::Result<String>;
    fn clock_out(&self, notes: &str) -> zbus::Result<String>;
    fn status(&self) -> zbus::Result<String>;
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::ClockIn { notes } => {
            let proxy = connect().await?;
            let result = proxy.clock_in(notes.as_deref().unwrap_or("")).await?;
            print_clock_result(&result);
        }
        Commands::ClockOut { notes } => {
            let proxy = connect().await?;
            let result = proxy.clock_out(notes.as_deref().unwrap_or("")).await?;
            print_clock_result(&result);
        }
        Commands::Status => {
            let proxy = connect().await?;
            let status = proxy.status().await?;
            println!("{}", pretty(&status));
        }
        Commands::Devices => {
            let devices = punch_hw::Camera::list_devices();
            if devices.is_empty() {
                println!("No video capture devices found");
            }
            for dev in devices {
                println!("{}  {} ({})", dev.path, dev.name, dev.driver);
            }
        }
    }

    Ok(())
}

async fn connect() -> Result<ClockProxy<'static>> {
    let conn = zbus::Connection::session()
        .await
        .context("failed to connect to the session bus")?;
    ClockProxy::new(&conn)
        .await
        .context("punchd is not running (dev.punch.Clock1 not found)")
}

/// Render the daemon's JSON clock result for a terminal.
fn print_clock_result(raw: &str) {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) else {
        println!("{raw}");
        return;
    };

    let success = value["success"].as_bool().unwrap_or(false);
    let message = value["message"].as_str().unwrap_or("");
    println!("{}: {message}", if success { "OK" } else { "FAILED" });

    let data = &value["data"];
    if let Some(status) = data["clockInStatus"].as_str() {
        println!("  status: {status}");
    }
    if let Some(status) = data["clockOutStatus"].as_str() {
        println!("  status: {status}");
    }
    if let Some(late) = data["lateMinutes"].as_i64() {
        println!("  late: {late} min");
    }
    if let Some(worked) = data["workMinutes"].as_i64() {
        println!("  worked: {worked} min");
    }
    if let Some(distance) = data["location"]["distance"].as_f64() {
        let valid = data["location"]["isValid"].as_bool().unwrap_or(false);
        println!("  distance: {distance:.0} m ({})", if valid { "in range" } else { "out of range" });
    }
}

fn pretty(raw: &str) -> String {
    serde_json::from_str::<serde_json::Value>(raw)
        .and_then(|v| serde_json::to_string_pretty(&v))
        .unwrap_or_else(|_| raw.to_string())
}
