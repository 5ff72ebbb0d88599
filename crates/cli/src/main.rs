//! Admission predictor CLI
//!
//! Submits applicant records to the prediction service and browses the
//! values each field accepts.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{catalog, health, predict};
use tabled::Tabled;

/// Admission predictor CLI
#[derive(Parser)]
#[command(name = "admit")]
#[command(author, version, about = "CLI for the Admission Predictor", long_about = None)]
pub struct Cli {
    /// API endpoint URL (defaults to the config file, then http://localhost:8080)
    #[arg(long, env = "ADMIT_API_URL")]
    pub api_url: Option<String>,

    /// Output format [table, json]
    #[arg(long, short)]
    pub format: Option<output::OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Predict the admission outcome for one applicant
    Predict(predict::PredictArgs),

    /// Show the values each field accepts
    Catalog {
        /// Column name, e.g. MODALIDAD (all fields if omitted)
        field: Option<String>,
    },

    /// Show service health and readiness
    Health,
}

#[derive(Tabled)]
struct ViolationRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Problem")]
    reason: String,
}

fn report(err: &anyhow::Error) {
    output::print_error(&format!("{:#}", err));

    if let Some(failure) = err.downcast_ref::<client::ApiFailure>() {
        if !failure.violations.is_empty() {
            let rows: Vec<ViolationRow> = failure
                .violations
                .iter()
                .map(|v| ViolationRow {
                    field: v.field.clone(),
                    value: v.value.clone(),
                    reason: v.reason.clone(),
                })
                .collect();
            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            eprintln!("{}", table);
        }
        if failure.status.is_server_error() {
            output::print_warning("The service failed while handling the request");
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = config::Config::load()?;
    let format = config.format(cli.format);
    let client = client::ApiClient::new(&config.api_url(cli.api_url))?;

    match cli.command {
        Commands::Predict(args) => predict::predict(&client, &args, format).await?,
        Commands::Catalog { field: Some(field) } => {
            catalog::show_field(&client, &field, format).await?
        }
        Commands::Catalog { field: None } => catalog::list_catalog(&client, format).await?,
        Commands::Health => health::show_health(&client, format).await?,
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run(Cli::parse()).await {
        report(&err);
        std::process::exit(1);
    }
}
