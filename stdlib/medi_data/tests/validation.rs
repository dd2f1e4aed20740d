use medi_data::{validate, DiseaseRegistry, InputVector, ValidationResult};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn in_range_breast_cancer() -> InputVector {
    let reg = DiseaseRegistry::builtin();
    let profile = reg.get("breast-cancer").unwrap();
    profile
        .model_inputs
        .iter()
        .map(|name| {
            let value = profile
                .range(name)
                .map(|r| (r.min() + r.max()) / 2.0)
                .unwrap_or(0.01);
            (name.clone(), value)
        })
        .collect()
}

#[test]
fn breast_cancer_radius_mean_fifteen_is_valid() {
    let mut input = in_range_breast_cancer();
    input.insert("radius_mean", 15.0);
    let r = validate(DiseaseRegistry::builtin(), "breast-cancer", &input);
    assert_eq!(r, ValidationResult::ok("All inputs are valid."));
}

#[test]
fn concave_points_se_is_not_screened() {
    let mut input = in_range_breast_cancer();
    input.insert("concave_points_se", 999.0);
    assert!(validate(DiseaseRegistry::builtin(), "breast-cancer", &input).valid);
}

#[test]
fn diabetes_glucose_message_is_exact() {
    let input = InputVector::new().with("Glucose", 250.0);
    let r = validate(DiseaseRegistry::builtin(), "diabetes", &input);
    assert_eq!(
        r,
        ValidationResult::rejected(
            "Invalid value for 'Glucose'. Please enter a value between 1 and 200."
        )
    );
}

fn rejection(disease: &str, feature: &str, value: f64) -> String {
    let input = InputVector::new().with(feature, value);
    validate(DiseaseRegistry::builtin(), disease, &input).message
}

#[test]
fn float_bounds_keep_their_decimal_point() {
    assert_eq!(
        rejection("liver", "Total Bilirubin", 0.1),
        "Invalid value for 'Total Bilirubin'. Please enter a value between 0.4 and 75.0."
    );
    assert_eq!(
        rejection("heart", "oldpeak", -1.0),
        "Invalid value for 'oldpeak'. Please enter a value between 0.0 and 6.2."
    );
    assert_eq!(
        rejection("breast-cancer", "area_mean", 3000.0),
        "Invalid value for 'area_mean'. Please enter a value between 143.5 and 2501.0."
    );
}

#[test]
fn integer_bounds_and_tiny_floats() {
    assert_eq!(
        rejection("liver", "Age", 95.0),
        "Invalid value for 'Age'. Please enter a value between 4 and 90."
    );
    assert_eq!(
        rejection("parkinsons", "MDVP:Jitter(Abs)", 0.5),
        "Invalid value for 'MDVP:Jitter(Abs)'. Please enter a value between 7e-06 and 0.00026."
    );
}

#[test]
fn every_bound_accepted_and_every_neighbour_rejected() {
    let reg = DiseaseRegistry::builtin();
    for profile in reg.profiles() {
        for range in &profile.ranges {
            let step = (range.max() - range.min()).abs().max(1.0) * 1e-6;
            for (value, expected) in [
                (range.min(), true),
                (range.max(), true),
                (range.min() - step, false),
                (range.max() + step, false),
            ] {
                let input = InputVector::new().with(range.name(), value);
                let r = validate(reg, &profile.key, &input);
                assert_eq!(
                    r.valid, expected,
                    "{} / {} = {}",
                    profile.key,
                    range.name(),
                    value
                );
            }
        }
    }
}

proptest! {
    #[test]
    fn unregistered_disease_always_valid(value in any::<f64>(), name in "[a-zA-Z]{1,12}") {
        let input = InputVector::new().with(name, value);
        let r = validate(DiseaseRegistry::builtin(), "not-a-disease", &input);
        prop_assert!(r.valid);
        prop_assert_eq!(r.message, "No validation rules found for this model.");
    }

    #[test]
    fn unknown_keys_never_fail(value in any::<f64>()) {
        let input = InputVector::new().with("Glucose", 100.0).with("shoe_size", value);
        prop_assert!(validate(DiseaseRegistry::builtin(), "diabetes", &input).valid);
    }

    #[test]
    fn glucose_outside_bounds_rejected(value in prop_oneof![-1e6f64..0.999, 200.001f64..1e6]) {
        let input = InputVector::new().with("Glucose", value);
        prop_assert!(!validate(DiseaseRegistry::builtin(), "diabetes", &input).valid);
    }
}
