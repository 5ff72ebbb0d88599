//! Valid-value catalog for selection fields

use crate::models::FieldValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Column name -> values a user may choose
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ValueCatalog {
    values: BTreeMap<String, Vec<FieldValue>>,
}

impl ValueCatalog {
    pub fn new(values: impl IntoIterator<Item = (String, Vec<FieldValue>)>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    pub fn values(&self, column: &str) -> Option<&[FieldValue]> {
        self.values.get(column).map(Vec::as_slice)
    }

    pub fn contains(&self, column: &str, value: &FieldValue) -> Option<bool> {
        let wanted = value.as_category();
        self.values(column)
            .map(|values| values.iter().any(|v| v.as_category() == wanted))
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}
