//! Service health command

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use tabled::Tabled;

use crate::client::{ApiClient, HealthResponse, ReadinessResponse};
use crate::output::{color_status, format_timestamp, print_json, print_success, OutputFormat};

#[derive(Tabled)]
struct ComponentRow {
    #[tabled(rename = "Component")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Message")]
    message: String,
    #[tabled(rename = "Last Check")]
    last_check: String,
}

#[derive(Serialize)]
struct HealthReport {
    health: HealthResponse,
    readiness: ReadinessResponse,
}

pub async fn show_health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health = client.health().await?;
    let readiness = client.readiness().await?;

    if format == OutputFormat::Json {
        return print_json(&HealthReport { health, readiness });
    }

    println!("{}", "Service Health".bold());
    println!("{}", "=".repeat(40));
    println!("Status: {}", color_status(&health.status));
    let ready = if readiness.ready { "ready" } else { "not ready" };
    match &readiness.reason {
        Some(reason) => println!("Readiness: {} ({})", color_status(ready), reason),
        None => println!("Readiness: {}", color_status(ready)),
    }
    println!();

    let rows: Vec<ComponentRow> = health
        .components
        .iter()
        .map(|(name, c)| ComponentRow {
            name: name.clone(),
            status: color_status(&c.status),
            message: c.message.clone().unwrap_or_else(|| "-".to_string()),
            last_check: format_timestamp(c.last_check_timestamp),
        })
        .collect();
    let table = tabled::Table::new(rows)
        .with(tabled::settings::Style::rounded())
        .to_string();
    println!("{}", table);

    if readiness.ready {
        print_success("Service is ready to serve predictions");
    }
    Ok(())
}
