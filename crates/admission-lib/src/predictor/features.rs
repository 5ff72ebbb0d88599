//! Transformation pipeline
//!
//! Converts a raw record into a numeric feature row, one field group at a
//! time, concatenated as [label, robust-scaled, min-max-scaled, one-hot].
//! Pass-through fields are not transformed and never reach the row.

use super::layout::{FieldGroup, GroupLayout};
use crate::encoders::{
    EncoderRegistry, GroupEncoder, LabelEncoders, MinMaxScaler, OneHotEncoder, RobustScaler,
};
use crate::error::{IntakeError, PredictError};
use crate::models::{FeatureRow, Field, RawRecord};
use tracing::debug;

/// Applies the fitted encoders to their field groups
pub struct TransformationPipeline<'a> {
    registry: &'a EncoderRegistry,
    layout: &'a GroupLayout,
}

impl<'a> TransformationPipeline<'a> {
    pub fn new(registry: &'a EncoderRegistry, layout: &'a GroupLayout) -> Self {
        Self { registry, layout }
    }

    pub fn transform(&self, record: &RawRecord) -> Result<FeatureRow, PredictError> {
        let mut row = FeatureRow::with_capacity(self.output_width());

        for group in FieldGroup::ENCODED {
            match self.registry.encoder(group) {
                GroupEncoder::Label(encoders) => self.encode_labels(encoders, record, &mut row)?,
                GroupEncoder::Robust(scaler) => scale_robust(scaler, record, &mut row)?,
                GroupEncoder::MinMax(scaler) => scale_min_max(scaler, record, &mut row)?,
                GroupEncoder::OneHot(encoder) => encode_one_hot(encoder, record, &mut row)?,
                GroupEncoder::PassThrough => {}
            }
        }

        debug!(
            columns = row.len(),
            pass_through = self.layout.fields(FieldGroup::PassThrough).len(),
            "Record transformed"
        );
        Ok(row)
    }

    /// Number of columns `transform` produces
    pub fn output_width(&self) -> usize {
        self.layout.fields(FieldGroup::Label).len()
            + self.registry.robust_scaler().feature_names_in.len()
            + self.registry.minmax_scaler().feature_names_in.len()
            + self.registry.one_hot().feature_names_out().len()
    }

    /// Each label column is encoded independently
    fn encode_labels(
        &self,
        encoders: &LabelEncoders,
        record: &RawRecord,
        row: &mut FeatureRow,
    ) -> Result<(), PredictError> {
        for field in self.layout.fields(FieldGroup::Label) {
            let column = field.column();
            let encoder = encoders.get(column).ok_or_else(|| {
                PredictError::SchemaMismatch(format!("no label encoder for {}", column))
            })?;
            row.push(column, encoder.transform(column, record.get(*field))?);
        }
        Ok(())
    }
}

/// The scaler's fit-time column list decides which fields it reads
fn scale_robust(
    scaler: &RobustScaler,
    record: &RawRecord,
    row: &mut FeatureRow,
) -> Result<(), PredictError> {
    let input = numeric_columns(&scaler.feature_names_in, record)?;
    let scaled = scaler.transform(&input)?;
    push_all(row, &scaler.feature_names_in, &scaled);
    Ok(())
}

fn scale_min_max(
    scaler: &MinMaxScaler,
    record: &RawRecord,
    row: &mut FeatureRow,
) -> Result<(), PredictError> {
    let input = numeric_columns(&scaler.feature_names_in, record)?;
    let scaled = scaler.transform(&input)?;
    push_all(row, &scaler.feature_names_in, &scaled);
    Ok(())
}

/// Values are matched in their categorical string form
fn encode_one_hot(
    encoder: &OneHotEncoder,
    record: &RawRecord,
    row: &mut FeatureRow,
) -> Result<(), PredictError> {
    let input = encoder
        .feature_names_in()
        .iter()
        .map(|column| resolve(column).map(|field| record.get(field).as_category()))
        .collect::<Result<Vec<_>, _>>()?;
    let indicators = encoder.transform(&input)?;
    for (name, value) in encoder.feature_names_out().iter().zip(indicators) {
        row.push(name.as_str(), value);
    }
    Ok(())
}

fn numeric_columns(columns: &[String], record: &RawRecord) -> Result<Vec<f64>, PredictError> {
    columns
        .iter()
        .map(|column| {
            let field = resolve(column)?;
            let value = record.get(field);
            value.as_f64().ok_or_else(|| {
                PredictError::Intake(IntakeError::InvalidValue {
                    field: column.clone(),
                    value: value.as_category(),
                    expected: "a number",
                })
            })
        })
        .collect()
}

fn resolve(column: &str) -> Result<Field, PredictError> {
    Field::from_column(column).ok_or_else(|| {
        PredictError::SchemaMismatch(format!("fitted column {} is not an intake field", column))
    })
}

fn push_all(row: &mut FeatureRow, columns: &[String], values: &[f64]) {
    for (column, value) in columns.iter().zip(values) {
        row.push(column.as_str(), *value as f32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldValue;
    use crate::testing;

    #[test]
    fn test_column_order() {
        let registry = testing::registry();
        let layout = GroupLayout::default();
        let pipeline = TransformationPipeline::new(&registry, &layout);
        let row = pipeline.transform(&testing::record()).unwrap();

        let columns: Vec<&str> = row.columns().iter().map(String::as_str).collect();
        assert_eq!(
            &columns[..5],
            &[
                "SEXO",
                "CICLO_POSTULA",
                "CALIF_FINAL",
                "ANIO_NACIMIENTO",
                "COLEGIO_ANIO_EGRESO"
            ]
        );
        assert!(columns[5..]
            .iter()
            .all(|c| c.starts_with("MODALIDAD_") || c.starts_with("ANIO_POSTULA_")));
        assert_eq!(row.len(), pipeline.output_width());
    }

    #[test]
    fn test_values_are_encoded() {
        let registry = testing::registry();
        let layout = GroupLayout::default();
        let row = TransformationPipeline::new(&registry, &layout)
            .transform(&testing::record())
            .unwrap();

        assert_eq!(row.get("SEXO"), Some(0.0));
        assert_eq!(row.get("CICLO_POSTULA"), Some(0.0));
        assert_eq!(row.get("CALIF_FINAL"), Some(0.75));
        assert_eq!(row.get("MODALIDAD_ORDINARIO"), Some(1.0));
        assert_eq!(row.get("MODALIDAD_INTERESADO"), Some(0.0));
        assert_eq!(row.get("ANIO_POSTULA_2023"), Some(1.0));
        let birth = row.get("ANIO_NACIMIENTO").unwrap();
        assert!((0.0..=1.0).contains(&birth));
    }

    #[test]
    fn test_pass_through_fields_excluded() {
        let registry = testing::registry();
        let layout = GroupLayout::default();
        let row = TransformationPipeline::new(&registry, &layout)
            .transform(&testing::record())
            .unwrap();
        for field in layout.fields(FieldGroup::PassThrough) {
            assert!(row.get(field.column()).is_none(), "{} leaked", field);
        }
    }

    #[test]
    fn test_unknown_label_category() {
        let registry = testing::registry();
        let layout = GroupLayout::default();
        let record = testing::record().with_value(Field::Sex, "NO BINARIO");
        let err = TransformationPipeline::new(&registry, &layout)
            .transform(&record)
            .unwrap_err();
        assert_eq!(
            err,
            PredictError::UnknownCategory {
                field: "SEXO".to_string(),
                value: "NO BINARIO".to_string()
            }
        );
    }

    #[test]
    fn test_unseen_one_hot_category_is_zero_block() {
        let registry = testing::registry();
        let layout = GroupLayout::default();
        let record = testing::record().with_value(Field::Modality, "OTROS");
        let row = TransformationPipeline::new(&registry, &layout)
            .transform(&record)
            .unwrap();
        let modality_sum: f32 = row
            .iter()
            .filter(|(c, _)| c.starts_with("MODALIDAD_"))
            .map(|(_, v)| v)
            .sum();
        assert_eq!(modality_sum, 0.0);
    }

    #[test]
    fn test_min_max_boundaries() {
        let registry = testing::registry();
        let layout = GroupLayout::default();
        let pipeline = TransformationPipeline::new(&registry, &layout);
        for year in [1980, 2010] {
            let record = testing::record().with_value(Field::BirthYear, FieldValue::Integer(year));
            let value = pipeline.transform(&record).unwrap().get("ANIO_NACIMIENTO").unwrap();
            assert!((0.0..=1.0).contains(&value), "{} scaled to {}", year, value);
        }
    }
}
