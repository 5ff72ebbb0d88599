//! Catalog commands: valid values for each field

use anyhow::Result;
use colored::Colorize;
use serde_json::Value;
use tabled::Tabled;

use crate::client::{ApiClient, CatalogEntry};
use crate::output::{print_json, print_table, OutputFormat};

#[derive(Tabled)]
struct CatalogRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Description")]
    label: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Accepts")]
    accepts: String,
}

#[derive(Tabled)]
struct ValueRow {
    #[tabled(rename = "Value")]
    value: String,
}

/// Values shown inline before the summary is truncated
const INLINE_VALUES: usize = 4;

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn accepts(entry: &CatalogEntry) -> String {
    match (&entry.values, entry.min, entry.max) {
        (Some(values), _, _) => {
            let shown: Vec<String> = values.iter().take(INLINE_VALUES).map(value_text).collect();
            if values.len() > INLINE_VALUES {
                format!("{}, ... ({} values)", shown.join(", "), values.len())
            } else {
                shown.join(", ")
            }
        }
        (None, Some(min), Some(max)) => format!("{} to {}", min, max),
        _ => "any number".to_string(),
    }
}

pub async fn list_catalog(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let entries = client.catalog().await?;
    let rows: Vec<CatalogRow> = entries
        .iter()
        .map(|e| CatalogRow {
            field: e.field.clone(),
            label: e.label.clone(),
            kind: e.kind.clone(),
            accepts: accepts(e),
        })
        .collect();
    print_table(rows, &entries, format)
}

pub async fn show_field(client: &ApiClient, field: &str, format: OutputFormat) -> Result<()> {
    let entry = client.catalog_field(field).await?;
    if format == OutputFormat::Json {
        return print_json(&entry);
    }

    println!("{} ({})", entry.field.cyan().bold(), entry.label);
    match &entry.values {
        Some(values) => {
            let rows: Vec<ValueRow> = values
                .iter()
                .map(|v| ValueRow { value: value_text(v) })
                .collect();
            print_table(rows, &entry, format)?;
            println!("\nTotal: {} values", values.len());
        }
        None => println!("Accepts: {}", accepts(&entry)),
    }
    Ok(())
}
