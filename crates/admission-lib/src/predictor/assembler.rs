//! Feature assembly and intake policy
//!
//! The assembler turns named raw values into a [`RawRecord`] without altering
//! them. The intake policy (catalog membership, numeric ranges) belongs to the
//! intake layer and is checked separately; the transformation pipeline never
//! relies on it.

use crate::encoders::EncoderRegistry;
use crate::error::IntakeError;
use crate::models::{Field, FieldKind, FieldValue, RawRecord};
use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

/// Builds raw records from named field values
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureAssembler;

impl FeatureAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Assemble a record from `(column name, value)` pairs
    ///
    /// Every field must be present exactly once and numeric fields must hold
    /// numbers. Values are otherwise passed through unchanged.
    pub fn assemble<K, I>(&self, values: I) -> Result<RawRecord, IntakeError>
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, FieldValue)>,
    {
        let mut record = BTreeMap::new();
        for (name, value) in values {
            let name = name.as_ref();
            let field = Field::from_column(name)
                .ok_or_else(|| IntakeError::UnknownField(name.to_string()))?;
            if field.kind() == FieldKind::Numeric && !value.is_numeric() {
                return Err(IntakeError::InvalidValue {
                    field: name.to_string(),
                    value: value.as_category(),
                    expected: "a number",
                });
            }
            record.insert(field, value);
        }

        if let Some(missing) = Field::ALL.iter().find(|f| !record.contains_key(f)) {
            return Err(IntakeError::MissingField(missing.column().to_string()));
        }

        Ok(RawRecord::from_complete(record))
    }
}

/// One intake policy breach
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyViolation {
    pub field: String,
    pub value: String,
    pub reason: String,
}

/// Intake-layer constraints on raw records
#[derive(Debug, Clone)]
pub struct IntakePolicy {
    ranges: Vec<(Field, RangeInclusive<f64>)>,
    enforce_catalog: bool,
}

impl Default for IntakePolicy {
    fn default() -> Self {
        Self {
            ranges: vec![
                (Field::BirthYear, 1980.0..=2010.0),
                (Field::GraduationYear, 2000.0..=2024.0),
                (Field::FinalScore, 0.0..=20.0),
            ],
            enforce_catalog: true,
        }
    }
}

impl IntakePolicy {
    pub fn with_range(mut self, field: Field, range: RangeInclusive<f64>) -> Self {
        self.ranges.retain(|(f, _)| *f != field);
        self.ranges.push((field, range));
        self
    }

    pub fn with_catalog_enforcement(mut self, enforce: bool) -> Self {
        self.enforce_catalog = enforce;
        self
    }

    pub fn range(&self, field: Field) -> Option<&RangeInclusive<f64>> {
        self.ranges.iter().find(|(f, _)| *f == field).map(|(_, r)| r)
    }

    pub fn ranges(&self) -> impl Iterator<Item = (Field, &RangeInclusive<f64>)> {
        self.ranges.iter().map(|(f, r)| (*f, r))
    }

    /// All violations in `record`, in field order
    pub fn check(
        &self,
        record: &RawRecord,
        registry: &EncoderRegistry,
    ) -> Result<(), Vec<PolicyViolation>> {
        let mut violations = Vec::new();

        for (field, value) in record.iter() {
            match field.kind() {
                FieldKind::Numeric => {
                    if let (Some(range), Some(x)) = (self.range(field), value.as_f64()) {
                        if !range.contains(&x) {
                            violations.push(PolicyViolation {
                                field: field.column().to_string(),
                                value: value.as_category(),
                                reason: format!(
                                    "must be between {} and {}",
                                    range.start(),
                                    range.end()
                                ),
                            });
                        }
                    }
                }
                FieldKind::Selection if self.enforce_catalog => {
                    let wanted = value.as_category();
                    let known = registry
                        .valid_values(field)
                        .map(|values| values.iter().any(|v| v.as_category() == wanted));
                    if known == Some(false) {
                        violations.push(PolicyViolation {
                            field: field.column().to_string(),
                            value: wanted,
                            reason: "not a valid choice".to_string(),
                        });
                    }
                }
                FieldKind::Selection => {}
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}
