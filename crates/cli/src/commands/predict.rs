//! Prediction commands

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tabled::Tabled;

use crate::client::{ApiClient, Explanation, Prediction};
use crate::output::{color_label, format_probability, print_json, print_table, OutputFormat};

/// Columns whose flag values are sent as JSON numbers
const NUMERIC_COLUMNS: [&str; 5] = [
    "CICLO_POSTULA",
    "ANIO_POSTULA",
    "ANIO_NACIMIENTO",
    "COLEGIO_ANIO_EGRESO",
    "CALIF_FINAL",
];

/// Applicant values, given as flags and/or a JSON file
#[derive(Args, Debug, Default)]
pub struct PredictArgs {
    /// JSON object of column name to value; flags override its entries
    #[arg(long, short)]
    pub file: Option<PathBuf>,

    /// Also show the feature row the model saw
    #[arg(long)]
    pub explain: bool,

    /// Sex (SEXO)
    #[arg(long)]
    pub sex: Option<String>,
    /// Application cycle (CICLO_POSTULA)
    #[arg(long)]
    pub cycle: Option<String>,
    /// Admission modality (MODALIDAD)
    #[arg(long)]
    pub modality: Option<String>,
    /// Application year (ANIO_POSTULA)
    #[arg(long)]
    pub application_year: Option<String>,
    /// Birth year (ANIO_NACIMIENTO)
    #[arg(long)]
    pub birth_year: Option<String>,
    /// School graduation year (COLEGIO_ANIO_EGRESO)
    #[arg(long)]
    pub graduation_year: Option<String>,
    /// Final score, 0 to 20 (CALIF_FINAL)
    #[arg(long)]
    pub score: Option<String>,
    /// Birth country (NACIMIENTO_PAIS)
    #[arg(long)]
    pub birth_country: Option<String>,
    /// Residence department (DOMICILIO_DEPA)
    #[arg(long)]
    pub residence_department: Option<String>,
    /// School department (COLEGIO_DEPA)
    #[arg(long)]
    pub school_department: Option<String>,
    /// Birth department (NACIMIENTO_DEPA)
    #[arg(long)]
    pub birth_department: Option<String>,
    /// Specialty applied to (ESPECIALIDAD)
    #[arg(long)]
    pub specialty: Option<String>,
    /// Residence province (DOMICILIO_PROV)
    #[arg(long)]
    pub residence_province: Option<String>,
    /// School province (COLEGIO_PROV)
    #[arg(long)]
    pub school_province: Option<String>,
    /// Birth province (NACIMIENTO_PROV)
    #[arg(long)]
    pub birth_province: Option<String>,
    /// Residence district (DOMICILIO_DIST)
    #[arg(long)]
    pub residence_district: Option<String>,
    /// School district (COLEGIO_DIST)
    #[arg(long)]
    pub school_district: Option<String>,
    /// Birth district (NACIMIENTO_DIST)
    #[arg(long)]
    pub birth_district: Option<String>,
    /// School name (COLEGIO)
    #[arg(long)]
    pub school: Option<String>,
}

impl PredictArgs {
    /// `(column, flag, value)` for every field
    fn fields(&self) -> [(&'static str, &'static str, Option<&String>); 19] {
        [
            ("SEXO", "--sex", self.sex.as_ref()),
            ("CICLO_POSTULA", "--cycle", self.cycle.as_ref()),
            ("MODALIDAD", "--modality", self.modality.as_ref()),
            ("ANIO_POSTULA", "--application-year", self.application_year.as_ref()),
            ("ANIO_NACIMIENTO", "--birth-year", self.birth_year.as_ref()),
            ("COLEGIO_ANIO_EGRESO", "--graduation-year", self.graduation_year.as_ref()),
            ("CALIF_FINAL", "--score", self.score.as_ref()),
            ("NACIMIENTO_PAIS", "--birth-country", self.birth_country.as_ref()),
            ("DOMICILIO_DEPA", "--residence-department", self.residence_department.as_ref()),
            ("COLEGIO_DEPA", "--school-department", self.school_department.as_ref()),
            ("NACIMIENTO_DEPA", "--birth-department", self.birth_department.as_ref()),
            ("ESPECIALIDAD", "--specialty", self.specialty.as_ref()),
            ("DOMICILIO_PROV", "--residence-province", self.residence_province.as_ref()),
            ("COLEGIO_PROV", "--school-province", self.school_province.as_ref()),
            ("NACIMIENTO_PROV", "--birth-province", self.birth_province.as_ref()),
            ("DOMICILIO_DIST", "--residence-district", self.residence_district.as_ref()),
            ("COLEGIO_DIST", "--school-district", self.school_district.as_ref()),
            ("NACIMIENTO_DIST", "--birth-district", self.birth_district.as_ref()),
            ("COLEGIO", "--school", self.school.as_ref()),
        ]
    }

    /// Build the request body; without a file every flag is required
    pub fn record(&self) -> Result<Map<String, Value>> {
        let mut record = match &self.file {
            Some(path) => read_record(path)?,
            None => Map::new(),
        };

        let mut missing = Vec::new();
        for (column, flag, value) in self.fields() {
            match value {
                Some(raw) if NUMERIC_COLUMNS.contains(&column) => {
                    record.insert(column.to_string(), parse_number(raw));
                }
                Some(raw) => {
                    record.insert(column.to_string(), Value::String(raw.clone()));
                }
                None if !record.contains_key(column) => missing.push(flag),
                None => {}
            }
        }

        if self.file.is_none() && !missing.is_empty() {
            anyhow::bail!("missing required values: {}", missing.join(", "));
        }
        Ok(record)
    }
}

fn read_record(path: &Path) -> Result<Map<String, Value>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    match serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?
    {
        Value::Object(map) => Ok(map),
        _ => anyhow::bail!("{} must contain a JSON object", path.display()),
    }
}

/// Numbers become JSON numbers; anything else is sent as text for the
/// server to reject
fn parse_number(raw: &str) -> Value {
    let trimmed = raw.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::from(i);
    }
    if let Some(n) = trimmed
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
    {
        return Value::Number(n);
    }
    Value::String(raw.to_string())
}

#[derive(Tabled)]
struct ResultRow {
    #[tabled(rename = "Outcome")]
    label: String,
    #[tabled(rename = "Probability")]
    probability: String,
}

#[derive(Tabled)]
struct FeatureRow {
    #[tabled(rename = "Column")]
    column: String,
    #[tabled(rename = "Value")]
    value: String,
}

pub async fn predict(client: &ApiClient, args: &PredictArgs, format: OutputFormat) -> Result<()> {
    let record = args.record()?;

    if args.explain {
        let explanation = client.explain(&record).await?;
        return print_explanation(&explanation, format);
    }

    let prediction: Prediction = client.predict(&record).await?;
    let rows = vec![ResultRow {
        label: color_label(&prediction.label, prediction.admitted),
        probability: format_probability(prediction.probability),
    }];
    print_table(rows, &prediction, format)
}

fn print_explanation(explanation: &Explanation, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(explanation);
    }

    let admitted = explanation.label == "ADMITTED";
    println!(
        "{} {} ({})",
        "Outcome:".bold(),
        color_label(&explanation.label, admitted),
        format_probability(explanation.probability)
    );
    println!();

    let rows: Vec<FeatureRow> = explanation
        .features
        .iter()
        .map(|f| FeatureRow {
            column: f.column.clone(),
            value: match f.value {
                Some(v) => format!("{:.4}", v),
                None => "null".dimmed().to_string(),
            },
        })
        .collect();
    print_table(rows, explanation, format)?;

    if !explanation.filled.is_empty() {
        println!("\nFilled as null: {}", explanation.filled.join(", "));
    }
    if !explanation.dropped.is_empty() {
        println!("Dropped: {}", explanation.dropped.join(", "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn full_args() -> PredictArgs {
        let text = |s: &str| Some(s.to_string());
        PredictArgs {
            sex: text("FEMENINO"),
            cycle: text("1"),
            modality: text("ORDINARIO"),
            application_year: text("2023"),
            birth_year: text("2004"),
            graduation_year: text("2021"),
            score: text("15.5"),
            birth_country: text("PERU"),
            residence_department: text("LIMA"),
            school_department: text("LIMA"),
            birth_department: text("LIMA"),
            specialty: text("INGENIERIA CIVIL"),
            residence_province: text("LIMA"),
            school_province: text("LIMA"),
            birth_province: text("LIMA"),
            residence_district: text("RIMAC"),
            school_district: text("RIMAC"),
            birth_district: text("RIMAC"),
            school: text("TRILCE"),
            ..Default::default()
        }
    }

    #[test]
    fn test_flags_build_typed_record() {
        let record = full_args().record().unwrap();
        assert_eq!(record.len(), 19);
        assert_eq!(record["CICLO_POSTULA"], Value::from(1));
        assert_eq!(record["CALIF_FINAL"], Value::from(15.5));
        assert_eq!(record["SEXO"], Value::from("FEMENINO"));
    }

    #[test]
    fn test_selection_codes_stay_text() {
        let args = PredictArgs {
            school_district: Some("010101".to_string()),
            application_year: Some("2024".to_string()),
            ..full_args()
        };
        let record = args.record().unwrap();
        assert_eq!(record["COLEGIO_DIST"], Value::from("010101"));
        assert_eq!(record["ANIO_POSTULA"], Value::from(2024));
    }

    #[test]
    fn test_non_numeric_score_is_sent_as_text() {
        let args = PredictArgs {
            score: Some("high".to_string()),
            ..full_args()
        };
        assert_eq!(args.record().unwrap()["CALIF_FINAL"], Value::from("high"));
    }

    #[test]
    fn test_missing_flags_are_listed() {
        let args = PredictArgs {
            score: None,
            school: None,
            ..full_args()
        };
        let err = args.record().unwrap_err().to_string();
        assert!(err.contains("--score"));
        assert!(err.contains("--school"));
    }

    #[test]
    fn test_flags_override_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("record.json");
        std::fs::write(&path, r#"{"SEXO": "MASCULINO", "CALIF_FINAL": 11.0}"#).unwrap();

        let args = PredictArgs {
            file: Some(path),
            sex: Some("FEMENINO".to_string()),
            ..Default::default()
        };
        let record = args.record().unwrap();
        assert_eq!(record["SEXO"], Value::from("FEMENINO"));
        assert_eq!(record["CALIF_FINAL"], Value::from(11.0));
    }

    #[test]
    fn test_file_must_hold_an_object() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("record.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        let args = PredictArgs {
            file: Some(path),
            ..Default::default()
        };
        assert!(args.record().is_err());
    }
}
