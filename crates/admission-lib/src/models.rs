//! Core data models for the admission predictor

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single raw value as entered at intake
///
/// Variant order matters for untagged deserialization: JSON integers land in
/// `Integer`, other numbers in `Float`, strings in `Text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    /// Canonical categorical form used to look values up in fitted vocabularies.
    ///
    /// Integers render in decimal, whole floats keep one decimal place (`15.0`)
    /// and text is returned as entered.
    pub fn as_category(&self) -> String {
        match self {
            FieldValue::Integer(v) => v.to_string(),
            FieldValue::Float(v) if v.is_finite() && v.fract() == 0.0 => format!("{:.1}", v),
            FieldValue::Float(v) => v.to_string(),
            FieldValue::Text(s) => s.clone(),
        }
    }

    /// Numeric view of the value; text is never coerced
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(v) => Some(*v as f64),
            FieldValue::Float(v) => Some(*v),
            FieldValue::Text(_) => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, FieldValue::Text(_))
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_category())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

/// How a field is entered at intake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Chosen from a list of valid values
    Selection,
    /// Free numeric entry
    Numeric,
}

/// The applicant fields collected per prediction request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Sex,
    ApplicationCycle,
    Modality,
    ApplicationYear,
    BirthYear,
    GraduationYear,
    FinalScore,
    BirthCountry,
    ResidenceDepartment,
    SchoolDepartment,
    BirthDepartment,
    Specialty,
    ResidenceProvince,
    SchoolProvince,
    BirthProvince,
    ResidenceDistrict,
    SchoolDistrict,
    BirthDistrict,
    School,
}

impl Field {
    /// All fields in intake order
    pub const ALL: [Field; 19] = [
        Field::Sex,
        Field::ApplicationCycle,
        Field::Modality,
        Field::ApplicationYear,
        Field::BirthYear,
        Field::GraduationYear,
        Field::FinalScore,
        Field::BirthCountry,
        Field::ResidenceDepartment,
        Field::SchoolDepartment,
        Field::BirthDepartment,
        Field::Specialty,
        Field::ResidenceProvince,
        Field::SchoolProvince,
        Field::BirthProvince,
        Field::ResidenceDistrict,
        Field::SchoolDistrict,
        Field::BirthDistrict,
        Field::School,
    ];

    /// Column name used by the fitted artifacts
    pub fn column(&self) -> &'static str {
        match self {
            Field::Sex => "SEXO",
            Field::ApplicationCycle => "CICLO_POSTULA",
            Field::Modality => "MODALIDAD",
            Field::ApplicationYear => "ANIO_POSTULA",
            Field::BirthYear => "ANIO_NACIMIENTO",
            Field::GraduationYear => "COLEGIO_ANIO_EGRESO",
            Field::FinalScore => "CALIF_FINAL",
            Field::BirthCountry => "NACIMIENTO_PAIS",
            Field::ResidenceDepartment => "DOMICILIO_DEPA",
            Field::SchoolDepartment => "COLEGIO_DEPA",
            Field::BirthDepartment => "NACIMIENTO_DEPA",
            Field::Specialty => "ESPECIALIDAD",
            Field::ResidenceProvince => "DOMICILIO_PROV",
            Field::SchoolProvince => "COLEGIO_PROV",
            Field::BirthProvince => "NACIMIENTO_PROV",
            Field::ResidenceDistrict => "DOMICILIO_DIST",
            Field::SchoolDistrict => "COLEGIO_DIST",
            Field::BirthDistrict => "NACIMIENTO_DIST",
            Field::School => "COLEGIO",
        }
    }

    pub fn from_column(name: &str) -> Option<Field> {
        Field::ALL.iter().copied().find(|f| f.column() == name)
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Field::BirthYear | Field::GraduationYear | Field::FinalScore => FieldKind::Numeric,
            _ => FieldKind::Selection,
        }
    }

    /// Human-readable label for forms and tables
    pub fn label(&self) -> &'static str {
        match self {
            Field::Sex => "Sex",
            Field::ApplicationCycle => "Application cycle",
            Field::Modality => "Admission modality",
            Field::ApplicationYear => "Application year",
            Field::BirthYear => "Birth year",
            Field::GraduationYear => "School graduation year",
            Field::FinalScore => "Final qualifying score",
            Field::BirthCountry => "Country of birth",
            Field::ResidenceDepartment => "Department of residence",
            Field::SchoolDepartment => "School department",
            Field::BirthDepartment => "Department of birth",
            Field::Specialty => "Chosen specialty",
            Field::ResidenceProvince => "Province of residence",
            Field::SchoolProvince => "School province",
            Field::BirthProvince => "Province of birth",
            Field::ResidenceDistrict => "District of residence",
            Field::SchoolDistrict => "School district",
            Field::BirthDistrict => "District of birth",
            Field::School => "School name",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// One applicant's inputs, exactly one value per [`Field`]
///
/// Built by [`crate::predictor::FeatureAssembler`]; values are kept as entered.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "BTreeMap<String, FieldValue>")]
pub struct RawRecord {
    values: BTreeMap<Field, FieldValue>,
}

impl RawRecord {
    /// Caller guarantees every field is present
    pub(crate) fn from_complete(values: BTreeMap<Field, FieldValue>) -> Self {
        debug_assert_eq!(values.len(), Field::ALL.len());
        Self { values }
    }

    pub fn get(&self, field: Field) -> &FieldValue {
        // Construction guarantees completeness
        &self.values[&field]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &FieldValue)> {
        self.values.iter().map(|(f, v)| (*f, v))
    }

    /// Copy of this record with one field replaced
    pub fn with_value(&self, field: Field, value: impl Into<FieldValue>) -> Self {
        let mut values = self.values.clone();
        values.insert(field, value.into());
        Self { values }
    }
}

impl From<RawRecord> for BTreeMap<String, FieldValue> {
    fn from(record: RawRecord) -> Self {
        record
            .values
            .into_iter()
            .map(|(f, v)| (f.column().to_string(), v))
            .collect()
    }
}

/// Binary admission outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdmissionLabel {
    Admitted,
    NotAdmitted,
}

impl AdmissionLabel {
    pub fn is_admitted(&self) -> bool {
        matches!(self, AdmissionLabel::Admitted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AdmissionLabel::Admitted => "ADMITTED",
            AdmissionLabel::NotAdmitted => "NOT_ADMITTED",
        }
    }
}

impl fmt::Display for AdmissionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one prediction request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub label: AdmissionLabel,
    /// Probability mass assigned to the admitted class
    pub probability: f32,
}

/// Ordered numeric feature columns for a single record
///
/// Missing values are `NaN`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureRow {
    columns: Vec<String>,
    values: Vec<f32>,
}

impl FeatureRow {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            columns: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, column: impl Into<String>, value: f32) {
        self.columns.push(column.into());
        self.values.push(value);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, column: &str) -> Option<f32> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| self.values[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_forms() {
        assert_eq!(FieldValue::Integer(2023).as_category(), "2023");
        assert_eq!(FieldValue::Float(15.0).as_category(), "15.0");
        assert_eq!(FieldValue::Float(12.5).as_category(), "12.5");
        assert_eq!(FieldValue::from("ORDINARIO").as_category(), "ORDINARIO");
    }

    #[test]
    fn test_untagged_deserialization() {
        let values: Vec<FieldValue> = serde_json::from_str(r#"[1, 15.5, "LIMA"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                FieldValue::Integer(1),
                FieldValue::Float(15.5),
                FieldValue::Text("LIMA".to_string())
            ]
        );
    }

    #[test]
    fn test_text_is_not_numeric() {
        assert_eq!(FieldValue::from("2004").as_f64(), None);
        assert_eq!(FieldValue::Integer(2004).as_f64(), Some(2004.0));
    }

    #[test]
    fn test_field_columns_round_trip() {
        for field in Field::ALL {
            assert_eq!(Field::from_column(field.column()), Some(field));
        }
        assert_eq!(Field::from_column("NOT_A_FIELD"), None);
    }

    #[test]
    fn test_numeric_fields() {
        let numeric: Vec<_> = Field::ALL
            .iter()
            .filter(|f| f.kind() == FieldKind::Numeric)
            .collect();
        assert_eq!(numeric.len(), 3);
    }

    #[test]
    fn test_label_serialization() {
        let json = serde_json::to_string(&AdmissionLabel::NotAdmitted).unwrap();
        assert_eq!(json, "\"NOT_ADMITTED\"");
    }

    #[test]
    fn test_feature_row_lookup() {
        let mut row = FeatureRow::with_capacity(2);
        row.push("SEXO", 0.0);
        row.push("CALIF_FINAL", 0.25);
        assert_eq!(row.get("CALIF_FINAL"), Some(0.25));
        assert_eq!(row.get("MISSING"), None);
        assert_eq!(row.len(), 2);
    }
}
