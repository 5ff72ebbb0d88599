//! Shared fixtures for unit tests

use crate::encoders::{
    EncoderRegistry, LabelEncoder, LabelEncoders, MinMaxScaler, OneHotEncoder, RobustScaler,
    TargetEncoder, UnknownCategoryPolicy, ValueCatalog,
};
use crate::models::{Field, FieldValue, RawRecord};
use crate::predictor::{
    Classifier, FeatureAssembler, FeatureSchema, GroupLayout, LinearClassifier,
    LinearModelArtifact, PredictionContext,
};
use std::collections::BTreeMap;

/// Listed by the schema but produced by no encoder
pub const UNENCODED_COLUMN: &str = "MODALIDAD_OTROS";

pub fn registry() -> EncoderRegistry {
    let label_encoders = LabelEncoders::new([
        (
            "SEXO".to_string(),
            LabelEncoder::new(vec!["FEMENINO".into(), "MASCULINO".into()]).unwrap(),
        ),
        (
            "CICLO_POSTULA".to_string(),
            LabelEncoder::new(vec![FieldValue::Integer(1), FieldValue::Integer(2)]).unwrap(),
        ),
    ]);

    let robust = RobustScaler {
        feature_names_in: vec!["CALIF_FINAL".into()],
        center: vec![12.0],
        scale: vec![4.0],
    };

    let minmax = MinMaxScaler::fit_bounds(
        vec!["ANIO_NACIMIENTO".into(), "COLEGIO_ANIO_EGRESO".into()],
        vec![1980.0, 2000.0],
        vec![2010.0, 2024.0],
        (0.0, 1.0),
    );

    let one_hot = OneHotEncoder::new(
        vec!["MODALIDAD".into(), "ANIO_POSTULA".into()],
        vec![
            vec![
                "INTERESADO".into(),
                "ORDINARIO".into(),
                "TALENTO BECA 18".into(),
            ],
            vec![
                FieldValue::Integer(2022),
                FieldValue::Integer(2023),
                FieldValue::Integer(2024),
            ],
        ],
        UnknownCategoryPolicy::Ignore,
    )
    .unwrap();

    let target = TargetEncoder {
        feature_names_in: vec!["ESPECIALIDAD".into()],
        categories: vec![vec!["ARQUITECTURA".into(), "INGENIERIA CIVIL".into()]],
        encodings: vec![vec![0.12, 0.31]],
        target_mean: 0.2,
    };

    let catalog = ValueCatalog::new(
        geographic_values()
            .into_iter()
            .map(|(field, values)| {
                (
                    field.column().to_string(),
                    values.iter().map(|v| FieldValue::from(*v)).collect(),
                )
            }),
    );

    EncoderRegistry::new(label_encoders, robust, minmax, one_hot, target, catalog).unwrap()
}

fn geographic_values() -> Vec<(Field, [&'static str; 2])> {
    vec![
        (Field::BirthCountry, ["PERU", "CHILE"]),
        (Field::ResidenceDepartment, ["LIMA", "CUSCO"]),
        (Field::SchoolDepartment, ["LIMA", "CUSCO"]),
        (Field::BirthDepartment, ["LIMA", "AREQUIPA"]),
        (Field::Specialty, ["INGENIERIA CIVIL", "ARQUITECTURA"]),
        (Field::ResidenceProvince, ["LIMA", "CUSCO"]),
        (Field::SchoolProvince, ["LIMA", "CUSCO"]),
        (Field::BirthProvince, ["LIMA", "AREQUIPA"]),
        (Field::ResidenceDistrict, ["RIMAC", "SAN MIGUEL"]),
        (Field::SchoolDistrict, ["RIMAC", "LINCE"]),
        (Field::BirthDistrict, ["RIMAC", "CERCADO"]),
        (Field::School, ["SACO OLIVEROS", "TRILCE"]),
    ]
}

/// Deliberately not in pipeline output order
pub fn schema() -> FeatureSchema {
    FeatureSchema::new(
        [
            "CALIF_FINAL",
            "SEXO",
            "CICLO_POSTULA",
            "ANIO_NACIMIENTO",
            "COLEGIO_ANIO_EGRESO",
            "MODALIDAD_INTERESADO",
            "MODALIDAD_ORDINARIO",
            UNENCODED_COLUMN,
            "MODALIDAD_TALENTO BECA 18",
            "ANIO_POSTULA_2022",
            "ANIO_POSTULA_2023",
            "ANIO_POSTULA_2024",
        ]
        .iter()
        .map(|c| c.to_string())
        .collect(),
    )
    .unwrap()
}

pub fn classifier(schema: &FeatureSchema) -> Box<dyn Classifier> {
    let artifact = LinearModelArtifact {
        intercept: -0.4,
        weights: BTreeMap::from([
            ("CALIF_FINAL".to_string(), 1.2),
            ("SEXO".to_string(), -0.1),
            ("ANIO_NACIMIENTO".to_string(), 0.5),
            ("MODALIDAD_ORDINARIO".to_string(), 0.3),
        ]),
    };
    Box::new(LinearClassifier::from_artifact(artifact, schema).unwrap())
}

pub fn context() -> PredictionContext {
    let schema = schema();
    let classifier = classifier(&schema);
    PredictionContext::new(registry(), GroupLayout::default(), schema, classifier).unwrap()
}

/// A catalog-valid applicant
pub fn record() -> RawRecord {
    let mut values: Vec<(&str, FieldValue)> = vec![
        ("SEXO", "FEMENINO".into()),
        ("CICLO_POSTULA", FieldValue::Integer(1)),
        ("MODALIDAD", "ORDINARIO".into()),
        ("ANIO_POSTULA", FieldValue::Integer(2023)),
        ("ANIO_NACIMIENTO", FieldValue::Integer(2004)),
        ("COLEGIO_ANIO_EGRESO", FieldValue::Integer(2021)),
        ("CALIF_FINAL", FieldValue::Float(15.0)),
    ];
    for (field, choices) in geographic_values() {
        values.push((field.column(), choices[0].into()));
    }
    FeatureAssembler::new().assemble(values).unwrap()
}
