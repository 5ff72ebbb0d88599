//! Field groups: which transformation applies to which field
//!
//! The layout is a typed mapping from group to an ordered field list. It is
//! reconciled once against the fitted artifacts at startup, so per-request
//! code never discovers a group/artifact disagreement.

use crate::encoders::EncoderRegistry;
use crate::error::LoadError;
use crate::models::{Field, FieldKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldGroup {
    Label,
    RobustScaled,
    MinMaxScaled,
    OneHot,
    PassThrough,
}

impl FieldGroup {
    /// Encoded groups in output concatenation order
    pub const ENCODED: [FieldGroup; 4] = [
        FieldGroup::Label,
        FieldGroup::RobustScaled,
        FieldGroup::MinMaxScaled,
        FieldGroup::OneHot,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldGroup::Label => "label",
            FieldGroup::RobustScaled => "robust_scaled",
            FieldGroup::MinMaxScaled => "min_max_scaled",
            FieldGroup::OneHot => "one_hot",
            FieldGroup::PassThrough => "pass_through",
        }
    }
}

impl fmt::Display for FieldGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Disjoint partition of all fields into groups
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupLayout {
    groups: BTreeMap<FieldGroup, Vec<Field>>,
}

impl Default for GroupLayout {
    fn default() -> Self {
        Self {
            groups: BTreeMap::from([
                (FieldGroup::Label, vec![Field::Sex, Field::ApplicationCycle]),
                (FieldGroup::RobustScaled, vec![Field::FinalScore]),
                (
                    FieldGroup::MinMaxScaled,
                    vec![Field::BirthYear, Field::GraduationYear],
                ),
                (
                    FieldGroup::OneHot,
                    vec![Field::Modality, Field::ApplicationYear],
                ),
                (
                    FieldGroup::PassThrough,
                    vec![
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
                    ],
                ),
            ]),
        }
    }
}

impl GroupLayout {
    /// Build a layout, checking every field belongs to exactly one group
    pub fn new(groups: BTreeMap<FieldGroup, Vec<Field>>) -> Result<Self, LoadError> {
        let mut owner: BTreeMap<Field, FieldGroup> = BTreeMap::new();
        for (group, fields) in &groups {
            for field in fields {
                if let Some(previous) = owner.insert(*field, *group) {
                    return Err(LoadError::SchemaMismatch(format!(
                        "field {} is in both {} and {} groups",
                        field, previous, group
                    )));
                }
            }
        }
        if let Some(orphan) = Field::ALL.iter().find(|f| !owner.contains_key(f)) {
            return Err(LoadError::SchemaMismatch(format!(
                "field {} belongs to no group",
                orphan
            )));
        }
        for numeric in [FieldGroup::RobustScaled, FieldGroup::MinMaxScaled] {
            if let Some(field) = groups
                .get(&numeric)
                .into_iter()
                .flatten()
                .find(|f| f.kind() != FieldKind::Numeric)
            {
                return Err(LoadError::SchemaMismatch(format!(
                    "selection field {} cannot be {}",
                    field, numeric
                )));
            }
        }
        Ok(Self { groups })
    }

    pub fn fields(&self, group: FieldGroup) -> &[Field] {
        self.groups.get(&group).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn group_of(&self, field: Field) -> FieldGroup {
        self.groups
            .iter()
            .find(|(_, fields)| fields.contains(&field))
            .map(|(group, _)| *group)
            // Construction assigns every field
            .unwrap_or(FieldGroup::PassThrough)
    }

    /// Check the fitted artifacts agree with this layout
    ///
    /// Scaler and one-hot column lists recorded at fit time must equal the
    /// policy groups in the same order; every label field needs an encoder.
    pub fn reconcile(&self, registry: &EncoderRegistry) -> Result<(), LoadError> {
        for field in self.fields(FieldGroup::Label) {
            if registry.label_encoder(*field).is_none() {
                return Err(LoadError::SchemaMismatch(format!(
                    "no label encoder for field {}",
                    field
                )));
            }
        }

        self.expect_columns(
            FieldGroup::RobustScaled,
            "robust scaler",
            &registry.robust_scaler().feature_names_in,
        )?;
        self.expect_columns(
            FieldGroup::MinMaxScaled,
            "min-max scaler",
            &registry.minmax_scaler().feature_names_in,
        )?;
        self.expect_columns(
            FieldGroup::OneHot,
            "one-hot encoder",
            registry.one_hot().feature_names_in(),
        )?;
        Ok(())
    }

    fn expect_columns(
        &self,
        group: FieldGroup,
        what: &str,
        fitted: &[String],
    ) -> Result<(), LoadError> {
        let policy: Vec<&str> = self.fields(group).iter().map(Field::column).collect();
        if policy != fitted {
            return Err(LoadError::SchemaMismatch(format!(
                "{} was fitted on {:?} but the {} group is {:?}",
                what, fitted, group, policy
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_partitions_all_fields() {
        let layout = GroupLayout::default();
        let total: usize = [
            FieldGroup::Label,
            FieldGroup::RobustScaled,
            FieldGroup::MinMaxScaled,
            FieldGroup::OneHot,
            FieldGroup::PassThrough,
        ]
        .iter()
        .map(|g| layout.fields(*g).len())
        .sum();
        assert_eq!(total, Field::ALL.len());
        assert_eq!(layout.fields(FieldGroup::PassThrough).len(), 12);
        assert!(GroupLayout::new(layout.groups.clone()).is_ok());
    }

    #[test]
    fn test_group_of() {
        let layout = GroupLayout::default();
        assert_eq!(layout.group_of(Field::Sex), FieldGroup::Label);
        assert_eq!(layout.group_of(Field::FinalScore), FieldGroup::RobustScaled);
        assert_eq!(layout.group_of(Field::ApplicationYear), FieldGroup::OneHot);
        assert_eq!(layout.group_of(Field::School), FieldGroup::PassThrough);
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let mut groups = GroupLayout::default().groups;
        groups
            .get_mut(&FieldGroup::OneHot)
            .unwrap()
            .push(Field::Sex);
        assert!(matches!(
            GroupLayout::new(groups),
            Err(LoadError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_orphan_field_rejected() {
        let mut groups = GroupLayout::default().groups;
        groups.get_mut(&FieldGroup::PassThrough).unwrap().pop();
        assert!(GroupLayout::new(groups).is_err());
    }

    #[test]
    fn test_selection_field_cannot_be_scaled() {
        let mut groups = GroupLayout::default().groups;
        groups.get_mut(&FieldGroup::PassThrough).unwrap().retain(|f| *f != Field::School);
        groups
            .get_mut(&FieldGroup::RobustScaled)
            .unwrap()
            .push(Field::School);
        assert!(GroupLayout::new(groups).is_err());
    }
}
