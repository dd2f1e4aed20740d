use medi_data::{load_profiles_from_file, load_profiles_from_str, InputVector, RegistryError};

const PROFILE: &str = r#"[
  {
    "key": "anaemia",
    "title": "Anaemia Prediction",
    "ranges": [{"name": "Hb", "min": 5.0, "max": 20.0}],
    "model_inputs": ["Hb", "Sex"],
    "dataset": {"file": "anaemia.csv", "feature_columns": ["Hb", "Sex"], "target_column": "Result"},
    "diagnosis": {"positive": "Anaemic ({p}%).", "negative": "Not anaemic ({p}%)."}
  }
]"#;

#[test]
fn json_profiles_load_and_validate() {
    let reg = load_profiles_from_str(PROFILE).expect("load");
    assert_eq!(reg.len(), 1);
    let r = reg.validate("anaemia", &InputVector::new().with("Hb", 25.0));
    assert_eq!(
        r.message,
        "Invalid value for 'Hb'. Please enter a value between 5 and 20."
    );
    assert!(reg.get("diabetes").is_none());
}

#[test]
fn inverted_range_in_file_is_rejected() {
    let tmp = tempfile::tempdir().expect("tmpdir");
    let path = tmp.path().join("profiles.json");
    std::fs::write(&path, PROFILE.replace("\"max\": 20.0", "\"max\": 1.0")).expect("write");
    let err = load_profiles_from_file(&path).unwrap_err();
    assert!(matches!(err, RegistryError::InvalidRange { .. }));
}

#[test]
fn column_count_must_match_inputs() {
    let bad = PROFILE.replace(r#""feature_columns": ["Hb", "Sex"]"#, r#""feature_columns": ["Hb"]"#);
    assert!(matches!(
        load_profiles_from_str(&bad),
        Err(RegistryError::ColumnCountMismatch { .. })
    ));
}
