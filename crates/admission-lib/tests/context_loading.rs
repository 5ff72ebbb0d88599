//! Loading a prediction context from an artifact directory

use admission_lib::encoders::{compute_checksum, keys, ArtifactFiles, Manifest, MANIFEST_FILE};
use admission_lib::{ArtifactConfig, FieldValue, LoadError, ModelFormat, PredictionContext};
use serde_json::{json, Value};
use std::path::Path;
use tempfile::TempDir;

const GEOGRAPHY: [(&str, &str); 12] = [
    ("NACIMIENTO_PAIS", "PERU"),
    ("DOMICILIO_DEPA", "LIMA"),
    ("COLEGIO_DEPA", "LIMA"),
    ("NACIMIENTO_DEPA", "LIMA"),
    ("ESPECIALIDAD", "ARQUITECTURA"),
    ("DOMICILIO_PROV", "LIMA"),
    ("COLEGIO_PROV", "LIMA"),
    ("NACIMIENTO_PROV", "LIMA"),
    ("DOMICILIO_DIST", "RIMAC"),
    ("COLEGIO_DIST", "RIMAC"),
    ("NACIMIENTO_DIST", "RIMAC"),
    ("COLEGIO", "TRILCE"),
];

fn artifacts() -> Vec<(&'static str, Value)> {
    let catalog: serde_json::Map<String, Value> = GEOGRAPHY
        .iter()
        .map(|(column, value)| (column.to_string(), json!([value])))
        .collect();

    vec![
        (
            keys::LABEL_ENCODERS,
            json!({
                "SEXO": { "classes": ["FEMENINO", "MASCULINO"] },
                "CICLO_POSTULA": { "classes": [1, 2] }
            }),
        ),
        (
            keys::ROBUST_SCALER,
            json!({ "feature_names_in": ["CALIF_FINAL"], "center": [11.0], "scale": [3.0] }),
        ),
        (
            keys::MINMAX_SCALER,
            json!({
                "feature_names_in": ["ANIO_NACIMIENTO", "COLEGIO_ANIO_EGRESO"],
                "min": [-66.0, -83.333333333333333],
                "scale": [0.033333333333333333, 0.041666666666666667],
                "clip": true
            }),
        ),
        (
            keys::ONE_HOT,
            json!({
                "feature_names_in": ["MODALIDAD", "ANIO_POSTULA"],
                "categories": [["ORDINARIO", "TALENTO BECA 18"], [2023, 2024]]
            }),
        ),
        (
            keys::TARGET_ENCODER,
            json!({
                "feature_names_in": [],
                "categories": [],
                "encodings": [],
                "target_mean": 0.3
            }),
        ),
        (keys::VALUE_CATALOG, Value::Object(catalog)),
        (
            keys::FEATURE_SCHEMA,
            json!([
                "SEXO",
                "CICLO_POSTULA",
                "CALIF_FINAL",
                "ANIO_NACIMIENTO",
                "COLEGIO_ANIO_EGRESO",
                "MODALIDAD_ORDINARIO",
                "MODALIDAD_TALENTO BECA 18",
                "ANIO_POSTULA_2023",
                "ANIO_POSTULA_2024"
            ]),
        ),
        (
            keys::MODEL,
            json!({ "intercept": 0.1, "weights": { "CALIF_FINAL": 0.9 } }),
        ),
    ]
}

fn file_for(files: &ArtifactFiles, key: &str) -> String {
    match key {
        keys::LABEL_ENCODERS => files.label_encoders.clone(),
        keys::ROBUST_SCALER => files.robust_scaler.clone(),
        keys::MINMAX_SCALER => files.minmax_scaler.clone(),
        keys::ONE_HOT => files.one_hot.clone(),
        keys::TARGET_ENCODER => files.target_encoder.clone(),
        keys::VALUE_CATALOG => files.value_catalog.clone(),
        keys::FEATURE_SCHEMA => files.feature_schema.clone(),
        _ => "model.json".to_string(),
    }
}

/// Write every artifact, recording checksums in a manifest when asked
fn write_dir(dir: &Path, overrides: &[(&str, Value)], with_manifest: bool) {
    let files = ArtifactFiles::default();
    let mut manifest = Manifest::default();
    for (key, value) in artifacts() {
        let value = overrides
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.clone())
            .unwrap_or(value);
        let bytes = serde_json::to_vec(&value).unwrap();
        manifest
            .artifacts
            .insert(key.to_string(), compute_checksum(&bytes));
        std::fs::write(dir.join(file_for(&files, key)), bytes).unwrap();
    }
    if with_manifest {
        std::fs::write(dir.join(MANIFEST_FILE), serde_json::to_vec(&manifest).unwrap()).unwrap();
    }
}

fn config(dir: &Path) -> ArtifactConfig {
    ArtifactConfig::new(dir).with_model(ModelFormat::Linear, "model.json")
}

fn applicant(score: f64) -> Vec<(&'static str, FieldValue)> {
    let mut values = vec![
        ("SEXO", FieldValue::from("MASCULINO")),
        ("CICLO_POSTULA", FieldValue::Integer(2)),
        ("MODALIDAD", FieldValue::from("ORDINARIO")),
        ("ANIO_POSTULA", FieldValue::Integer(2024)),
        ("ANIO_NACIMIENTO", FieldValue::Integer(2005)),
        ("COLEGIO_ANIO_EGRESO", FieldValue::Integer(2022)),
        ("CALIF_FINAL", FieldValue::Float(score)),
    ];
    values.extend(GEOGRAPHY.iter().map(|(c, v)| (*c, FieldValue::from(*v))));
    values
}

#[test]
fn test_load_with_manifest_and_predict() {
    let dir = TempDir::new().unwrap();
    write_dir(dir.path(), &[], true);

    let context = PredictionContext::load(&config(dir.path())).unwrap();
    assert!(context.is_verified());
    assert_eq!(context.classifier_name(), "linear");
    assert_eq!(context.schema().len(), 9);

    let strong = context.assemble(applicant(19.0)).unwrap();
    let weak = context.assemble(applicant(2.0)).unwrap();
    let strong = context.predict(&strong).unwrap();
    let weak = context.predict(&weak).unwrap();
    assert!(strong.label.is_admitted());
    assert!(!weak.label.is_admitted());
    assert!(strong.probability > weak.probability);
}

#[test]
fn test_load_without_manifest_is_unverified() {
    let dir = TempDir::new().unwrap();
    write_dir(dir.path(), &[], false);

    let context = PredictionContext::load(&config(dir.path())).unwrap();
    assert!(!context.is_verified());
}

#[test]
fn test_empty_manifest_is_unverified() {
    let dir = TempDir::new().unwrap();
    write_dir(dir.path(), &[], false);
    std::fs::write(dir.path().join(MANIFEST_FILE), r#"{"artifacts": {}}"#).unwrap();

    let context = PredictionContext::load(&config(dir.path())).unwrap();
    assert!(!context.is_verified());
}

#[test]
fn test_manifest_missing_model_checksum_is_unverified() {
    let dir = TempDir::new().unwrap();
    write_dir(dir.path(), &[], true);
    let mut manifest: Manifest =
        serde_json::from_slice(&std::fs::read(dir.path().join(MANIFEST_FILE)).unwrap()).unwrap();
    manifest.artifacts.remove(keys::MODEL);
    std::fs::write(dir.path().join(MANIFEST_FILE), serde_json::to_vec(&manifest).unwrap()).unwrap();

    let context = PredictionContext::load(&config(dir.path())).unwrap();
    assert!(!context.is_verified());
}

#[test]
fn test_tampered_artifact_fails_checksum() {
    let dir = TempDir::new().unwrap();
    write_dir(dir.path(), &[], true);
    std::fs::write(
        dir.path().join("robust_scaler.json"),
        r#"{"feature_names_in": ["CALIF_FINAL"], "center": [0.0], "scale": [1.0]}"#,
    )
    .unwrap();

    let result = PredictionContext::load(&config(dir.path()));
    assert!(
        matches!(result, Err(LoadError::Checksum { ref key, .. }) if key == keys::ROBUST_SCALER)
    );
}

#[test]
fn test_model_weight_outside_schema_fails() {
    let dir = TempDir::new().unwrap();
    write_dir(
        dir.path(),
        &[(keys::MODEL, json!({ "intercept": 0.0, "weights": { "EDAD": 1.0 } }))],
        false,
    );

    let result = PredictionContext::load(&config(dir.path()));
    assert!(matches!(result, Err(LoadError::Model { .. })));
}

#[test]
fn test_scaler_columns_must_match_field_groups() {
    let dir = TempDir::new().unwrap();
    write_dir(
        dir.path(),
        &[(
            keys::MINMAX_SCALER,
            json!({
                "feature_names_in": ["COLEGIO_ANIO_EGRESO", "ANIO_NACIMIENTO"],
                "min": [-83.333333333333333, -66.0],
                "scale": [0.041666666666666667, 0.033333333333333333]
            }),
        )],
        false,
    );

    let result = PredictionContext::load(&config(dir.path()));
    assert!(matches!(result, Err(LoadError::SchemaMismatch(_))));
}

#[test]
fn test_pass_through_column_in_schema_fails() {
    let dir = TempDir::new().unwrap();
    write_dir(
        dir.path(),
        &[
            (keys::FEATURE_SCHEMA, json!(["SEXO", "CICLO_POSTULA", "COLEGIO"])),
            (keys::MODEL, json!({ "intercept": 0.0, "weights": { "SEXO": 1.0 } })),
        ],
        false,
    );

    let result = PredictionContext::load(&config(dir.path()));
    assert!(matches!(result, Err(LoadError::SchemaMismatch(_))));
}

#[test]
fn test_missing_directory_fails() {
    let dir = TempDir::new().unwrap();
    let result = PredictionContext::load(&config(&dir.path().join("absent")));
    assert!(matches!(result, Err(LoadError::Missing { .. })));
}
