//! Encoder registry: the fitted transformers and valid-value catalog
//!
//! Loaded once at startup and never mutated afterwards.

use super::store::{keys, ArtifactFiles, ArtifactStore};
use super::{
    LabelEncoder, LabelEncoders, MinMaxScaler, OneHotEncoder, RobustScaler, TargetEncoder,
    ValueCatalog,
};
use crate::error::LoadError;
use crate::models::{Field, FieldKind, FieldValue};
use crate::predictor::FieldGroup;
use tracing::info;

/// The fitted encoder responsible for one field group
#[derive(Debug, Clone, Copy)]
pub enum GroupEncoder<'a> {
    Label(&'a LabelEncoders),
    Robust(&'a RobustScaler),
    MinMax(&'a MinMaxScaler),
    OneHot(&'a OneHotEncoder),
    PassThrough,
}

#[derive(Debug, Clone)]
pub struct EncoderRegistry {
    label_encoders: LabelEncoders,
    robust_scaler: RobustScaler,
    minmax_scaler: MinMaxScaler,
    one_hot: OneHotEncoder,
    target_encoder: TargetEncoder,
    catalog: ValueCatalog,
}

impl EncoderRegistry {
    /// Assemble a registry from already-fitted parts
    pub fn new(
        label_encoders: LabelEncoders,
        robust_scaler: RobustScaler,
        minmax_scaler: MinMaxScaler,
        one_hot: OneHotEncoder,
        target_encoder: TargetEncoder,
        catalog: ValueCatalog,
    ) -> Result<Self, LoadError> {
        robust_scaler.validate().map_err(|reason| invalid(keys::ROBUST_SCALER, reason))?;
        minmax_scaler.validate().map_err(|reason| invalid(keys::MINMAX_SCALER, reason))?;
        target_encoder.validate().map_err(|reason| invalid(keys::TARGET_ENCODER, reason))?;

        Ok(Self {
            label_encoders,
            robust_scaler,
            minmax_scaler,
            one_hot,
            target_encoder,
            catalog,
        })
    }

    /// Load all six encoder artifacts; any failure is fatal
    pub fn load(store: &ArtifactStore, files: &ArtifactFiles) -> Result<Self, LoadError> {
        let label_encoders: LabelEncoders =
            store.read_json(keys::LABEL_ENCODERS, &files.label_encoders)?;
        let robust_scaler: RobustScaler =
            store.read_json(keys::ROBUST_SCALER, &files.robust_scaler)?;
        let minmax_scaler: MinMaxScaler =
            store.read_json(keys::MINMAX_SCALER, &files.minmax_scaler)?;
        let one_hot: OneHotEncoder = store.read_json(keys::ONE_HOT, &files.one_hot)?;
        let target_encoder: TargetEncoder =
            store.read_json(keys::TARGET_ENCODER, &files.target_encoder)?;
        let catalog: ValueCatalog = store.read_json(keys::VALUE_CATALOG, &files.value_catalog)?;

        let registry = Self::new(
            label_encoders,
            robust_scaler,
            minmax_scaler,
            one_hot,
            target_encoder,
            catalog,
        )?;

        info!(
            dir = %store.dir().display(),
            label_columns = registry.label_encoders.columns().count(),
            one_hot_columns = registry.one_hot.feature_names_out().len(),
            catalog_fields = registry.catalog.columns().count(),
            verified = store.is_verified(),
            "Encoder artifacts loaded"
        );

        Ok(registry)
    }

    /// Fitted encoder for `group`
    pub fn encoder(&self, group: FieldGroup) -> GroupEncoder<'_> {
        match group {
            FieldGroup::Label => GroupEncoder::Label(&self.label_encoders),
            FieldGroup::RobustScaled => GroupEncoder::Robust(&self.robust_scaler),
            FieldGroup::MinMaxScaled => GroupEncoder::MinMax(&self.minmax_scaler),
            FieldGroup::OneHot => GroupEncoder::OneHot(&self.one_hot),
            FieldGroup::PassThrough => GroupEncoder::PassThrough,
        }
    }

    pub fn label_encoders(&self) -> &LabelEncoders {
        &self.label_encoders
    }

    pub fn label_encoder(&self, field: Field) -> Option<&LabelEncoder> {
        self.label_encoders.get(field.column())
    }

    pub fn robust_scaler(&self) -> &RobustScaler {
        &self.robust_scaler
    }

    pub fn minmax_scaler(&self) -> &MinMaxScaler {
        &self.minmax_scaler
    }

    pub fn one_hot(&self) -> &OneHotEncoder {
        &self.one_hot
    }

    /// Loaded with the other artifacts; not used by the feature pipeline
    pub fn target_encoder(&self) -> &TargetEncoder {
        &self.target_encoder
    }

    pub fn catalog(&self) -> &ValueCatalog {
        &self.catalog
    }

    /// Values a user may choose for a selection field
    ///
    /// The catalog wins when it lists the field; otherwise the vocabulary of
    /// the field's label or one-hot encoder is used. Numeric fields have none.
    pub fn valid_values(&self, field: Field) -> Option<&[FieldValue]> {
        if field.kind() == FieldKind::Numeric {
            return None;
        }
        self.catalog
            .values(field.column())
            .or_else(|| self.label_encoder(field).map(LabelEncoder::classes))
            .or_else(|| self.one_hot.categories(field.column()))
    }
}

fn invalid(key: &str, reason: String) -> LoadError {
    LoadError::Invalid {
        key: key.to_string(),
        reason,
    }
}
