use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use vitalroute::config::{LogFormat, LoggingConfig, TriageConfig};
use vitalroute::queue::{QueueId, QueueStore};
use vitalroute::session::{format_queue, format_summary};
use vitalroute::triage::{AlertLog, Dispatcher, VitalReading};

#[derive(Parser)]
#[command(
    name = "vitalroute",
    about = "Edge/cloud triage of streamed patient vital signs",
    version,
    long_about = None
)]
struct Cli {
    /// Configuration file (TOML). Defaults to $VITALROUTE_CONFIG, then ./vitalroute.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Triage a CSV file of sensor readings
    Process {
        /// CSV with patient_id, heart_rate, blood_pressure, glucose_level columns
        #[arg(long)]
        input: PathBuf,

        /// Only report this queue (edge or cloud)
        #[arg(long)]
        queue: Option<String>,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Score a single reading
    Score {
        #[arg(long, allow_hyphen_values = true)]
        heart_rate: f64,

        #[arg(long, allow_hyphen_values = true)]
        blood_pressure: f64,

        #[arg(long, allow_hyphen_values = true)]
        glucose: f64,

        /// Patient identifier
        #[arg(long, default_value = "cli")]
        patient: String,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration
    Config,
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = TriageConfig::resolve(cli.config.as_deref())?;
    init_tracing(&config.logging);

    match cli.command {
        Commands::Process { input, queue, json } => {
            let only: Option<QueueId> = queue.as_deref().map(str::parse::<QueueId>).transpose()?;
            let mut report = vitalroute::run_batch(&input, &config).await?;
            match only {
                Some(QueueId::Edge) => report.cloud.clear(),
                Some(QueueId::Cloud) => report.edge.clear(),
                None => {}
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("\n=== vitalroute Triage Report ===\n");
                if only != Some(QueueId::Cloud) {
                    println!("{}", format_queue(QueueId::Edge, &report.edge));
                }
                if only != Some(QueueId::Edge) {
                    println!("{}", format_queue(QueueId::Cloud, &report.cloud));
                }
                if !report.alarms.is_empty() {
                    println!("Alarms:");
                    for alarm in &report.alarms {
                        println!(
                            " !!! Patient {} needs immediate attention (priority {:.2})",
                            alarm.patient_id, alarm.priority
                        );
                    }
                    println!();
                }
                println!("{}", format_summary(&report.summary));
            }
        }
        Commands::Score {
            heart_rate,
            blood_pressure,
            glucose,
            patient,
            json,
        } => {
            let reading = VitalReading::new(patient, heart_rate, blood_pressure, glucose)
                .context("invalid reading")?;
            let store = Arc::new(QueueStore::new());
            let dispatcher = Dispatcher::new(&config, store.clone(), Arc::new(AlertLog::new()))?;
            let result = dispatcher.dispatch(reading);
            let task = store
                .peek(result.destination)
                .context("dispatched task missing from queue")?;

            if json {
                let out = serde_json::json!({
                    "result": result,
                    "task": task,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("Patient:     {}", result.patient_id);
                println!("Priority:    {:.2}", result.priority);
                println!(
                    "Dominant:    {} (weight {:.1})",
                    task.dominant_vital(),
                    task.urgency_weight()
                );
                println!("Destination: {}", result.destination);
                println!("Alarm:       {}", if result.alarm_triggered() { "YES" } else { "no" });
            }
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}
