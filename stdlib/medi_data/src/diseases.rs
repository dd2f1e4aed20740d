//! Built-in disease tables.
//!
//! Ranges are the screening bounds applied to user input. They are keyed by
//! the names the input forms use, which for liver disease are the human
//! readable labels rather than the CSV column names.

use crate::number::Number::{self, Float as F, Int as I};
use crate::registry::{DatasetLayout, DiagnosisText, DiseaseProfile, FeatureRange};

/// Bounds keep the integer or float form of the published tables.
type RangeRow = (&'static str, Number, Number);

const DIABETES_RANGES: &[RangeRow] = &[
    ("Pregnancies", I(0), I(4)),
    ("Glucose", I(1), I(200)),
    ("BloodPressure", I(1), I(122)),
    ("SkinThickness", I(0), I(99)),
    ("Insulin", I(0), I(846)),
    ("BMI", F(0.1), F(67.1)),
    ("DiabetesPedigreeFunction", F(0.078), F(2.42)),
    ("Age", I(21), I(81)),
];

const DIABETES_INPUTS: &[&str] = &[
    "Pregnancies",
    "Glucose",
    "BloodPressure",
    "SkinThickness",
    "Insulin",
    "BMI",
    "DiabetesPedigreeFunction",
    "Age",
];

const HEART_RANGES: &[RangeRow] = &[
    ("age", I(29), I(77)),
    ("trestbps", I(94), I(200)),
    ("chol", I(126), I(564)),
    ("thalach", I(71), I(202)),
    ("oldpeak", F(0.0), F(6.2)),
];

const HEART_INPUTS: &[&str] = &[
    "age", "sex", "cp", "trestbps", "chol", "fbs", "restecg", "thalach", "exang", "oldpeak",
    "slope", "ca", "thal",
];

const PARKINSONS_RANGES: &[RangeRow] = &[
    ("MDVP:Fo(Hz)", F(88.333), F(260.105)),
    ("MDVP:Fhi(Hz)", F(102.145), F(592.03)),
    ("MDVP:Flo(Hz)", F(65.476), F(239.17)),
    ("MDVP:Jitter(%)", F(0.00168), F(0.0331)),
    ("MDVP:Jitter(Abs)", F(0.000007), F(0.00026)),
    ("MDVP:RAP", F(0.00068), F(0.022)),
    ("MDVP:PPQ", F(0.00092), F(0.0333)),
    ("Jitter:DDP", F(0.00204), F(0.0660)),
    ("MDVP:Shimmer", F(0.00161), F(0.0685)),
    ("MDVP:Shimmer(dB)", F(0.014), F(0.648)),
    ("Shimmer:APQ3", F(0.00065), F(0.0331)),
    ("Shimmer:APQ5", F(0.00094), F(0.0371)),
    ("MDVP:APQ", F(0.00115), F(0.0573)),
    ("Shimmer:DDA", F(0.00196), F(0.10278)),
    ("NHR", F(0.00065), F(0.3424)),
    ("HNR", F(8.441), F(33.047)),
    ("RPDE", F(0.25657), F(0.68516)),
    ("DFA", F(0.57428), F(0.82522)),
    ("spread1", F(-7.96498), F(-2.43403)),
    ("spread2", F(0.00627), F(0.45049)),
    ("D2", F(1.42328), F(3.67116)),
    ("PPE", F(0.04439), F(0.52737)),
];

const LIVER_RANGES: &[RangeRow] = &[
    ("Age", I(4), I(90)),
    ("Total Bilirubin", F(0.4), F(75.0)),
    ("Direct Bilirubin", F(0.1), F(19.7)),
    ("Alkaline Phosphotase", I(63), I(2110)),
    ("Alamine Aminotransferase (ALT)", I(10), I(2000)),
    ("Aspartate Aminotransferase (AST)", I(10), I(1500)),
    ("Total Proteins", F(2.7), F(9.6)),
    ("Albumin", F(0.9), F(5.5)),
    ("Albumin and Globulin Ratio", F(0.3), F(2.8)),
];

const LIVER_INPUTS: &[&str] = &[
    "Age",
    "Gender",
    "Total Bilirubin",
    "Direct Bilirubin",
    "Alkaline Phosphotase",
    "Alamine Aminotransferase (ALT)",
    "Aspartate Aminotransferase (AST)",
    "Total Proteins",
    "Albumin",
    "Albumin and Globulin Ratio",
];

const LIVER_COLUMNS: &[&str] = &[
    "Age",
    "Gender",
    "Total_Bilirubin",
    "Direct_Bilirubin",
    "Alkaline_Phosphotase",
    "Alamine_Aminotransferase",
    "Aspartate_Aminotransferase",
    "Total_Protiens",
    "Albumin",
    "Albumin_and_Globulin_Ratio",
];

const BREAST_CANCER_RANGES: &[RangeRow] = &[
    ("radius_mean", F(6.981), F(28.11)),
    ("texture_mean", F(9.71), F(39.28)),
    ("perimeter_mean", F(43.79), F(188.5)),
    ("area_mean", F(143.5), F(2501.0)),
    ("smoothness_mean", F(0.05263), F(0.1634)),
    ("compactness_mean", F(0.01938), F(0.3454)),
    ("concavity_mean", F(0.025), F(0.4268)),
    ("concave points_mean", F(0.0), F(0.2012)),
    ("symmetry_mean", F(0.106), F(0.304)),
    ("fractal_dimension_mean", F(0.04996), F(0.09744)),
    ("radius_se", F(0.1115), F(2.873)),
    ("texture_se", F(0.3602), F(4.885)),
    ("perimeter_se", F(0.757), F(21.98)),
    ("area_se", F(6.802), F(542.2)),
    ("smoothness_se", F(0.001713), F(0.03113)),
    ("compactness_se", F(0.002252), F(0.1354)),
    ("concavity_se", F(0.20), F(0.396)),
    ("concave points_se", F(0.05), F(0.05279)),
    ("symmetry_se", F(0.007882), F(0.07895)),
    ("fractal_dimension_se", F(0.000895), F(0.02984)),
    ("radius_worst", F(7.93), F(36.04)),
    ("texture_worst", F(12.02), F(49.54)),
    ("perimeter_worst", F(50.41), F(251.2)),
    ("area_worst", F(185.2), F(4254.0)),
    ("smoothness_worst", F(0.07117), F(0.2226)),
    ("compactness_worst", F(0.02729), F(1.058)),
    ("concavity_worst", F(0.0), F(1.252)),
    ("concave points_worst", F(0.0), F(0.291)),
    ("symmetry_worst", F(0.1565), F(0.6638)),
    ("fractal_dimension_worst", F(0.05504), F(0.2075)),
];

// The input form submits `concave_points_se` with an underscore, so the
// `concave points_se` range above never matches a submitted key.
const BREAST_CANCER_INPUTS: &[&str] = &[
    "radius_mean",
    "texture_mean",
    "perimeter_mean",
    "area_mean",
    "smoothness_mean",
    "compactness_mean",
    "concavity_mean",
    "concave points_mean",
    "symmetry_mean",
    "fractal_dimension_mean",
    "radius_se",
    "texture_se",
    "perimeter_se",
    "area_se",
    "smoothness_se",
    "compactness_se",
    "concavity_se",
    "concave_points_se",
    "symmetry_se",
    "fractal_dimension_se",
    "radius_worst",
    "texture_worst",
    "perimeter_worst",
];

fn ranges(rows: &[RangeRow]) -> Vec<FeatureRange> {
    rows.iter()
        .map(|&(name, min, max)| FeatureRange::from_table(name, min, max))
        .collect()
}

fn names(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn range_names(rows: &[RangeRow]) -> Vec<String> {
    rows.iter().map(|(name, _, _)| name.to_string()).collect()
}

fn diagnosis(positive: &str, negative: &str) -> DiagnosisText {
    DiagnosisText {
        positive: positive.to_string(),
        negative: negative.to_string(),
    }
}

fn layout(file: &str, feature_columns: Vec<String>, target: &str) -> DatasetLayout {
    DatasetLayout {
        file: file.to_string(),
        feature_columns,
        target_column: target.to_string(),
    }
}

pub(crate) fn builtin_profiles() -> Vec<DiseaseProfile> {
    vec![
        DiseaseProfile {
            key: "diabetes".into(),
            title: "Diabetes Prediction".into(),
            ranges: ranges(DIABETES_RANGES),
            model_inputs: names(DIABETES_INPUTS),
            dataset: layout("diabetes.csv", names(DIABETES_INPUTS), "Outcome"),
            diagnosis: diagnosis(
                "The person is diabetic (probability: {p}%). Please consult a doctor.",
                "The person is not diabetic (probability of diabetes: {p}%).",
            ),
        },
        DiseaseProfile {
            key: "heart".into(),
            title: "Heart Disease Prediction".into(),
            ranges: ranges(HEART_RANGES),
            model_inputs: names(HEART_INPUTS),
            dataset: layout("heart.csv", names(HEART_INPUTS), "target"),
            diagnosis: diagnosis(
                "The person is predicted to have Heart Disease (probability: {p}%). Please consult a cardiologist.",
                "The person is predicted not to have Heart Disease (probability of disease: {p}%).",
            ),
        },
        DiseaseProfile {
            key: "parkinsons".into(),
            title: "Parkinsons Prediction".into(),
            ranges: ranges(PARKINSONS_RANGES),
            model_inputs: range_names(PARKINSONS_RANGES),
            dataset: layout("parkinsons.csv", range_names(PARKINSONS_RANGES), "status"),
            diagnosis: diagnosis(
                "The person is predicted to have Parkinson's Disease (probability: {p}%). Please consult a neurologist.",
                "The person is predicted not to have Parkinson's Disease (probability of disease: {p}%).",
            ),
        },
        DiseaseProfile {
            key: "liver".into(),
            title: "Liver Disease Prediction".into(),
            ranges: ranges(LIVER_RANGES),
            model_inputs: names(LIVER_INPUTS),
            dataset: layout("indian_liver_patient.csv", names(LIVER_COLUMNS), "Dataset"),
            diagnosis: diagnosis(
                "The person is predicted to have Liver Disease (probability: {p}%). Please consult a hepatologist.",
                "The person is predicted not to have Liver Disease (probability of disease: {p}%).",
            ),
        },
        DiseaseProfile {
            key: "breast-cancer".into(),
            title: "Breast Cancer Prediction".into(),
            ranges: ranges(BREAST_CANCER_RANGES),
            model_inputs: names(BREAST_CANCER_INPUTS),
            dataset: layout("cancer.csv", names(BREAST_CANCER_INPUTS), "diagnosis"),
            diagnosis: diagnosis(
                "The person is predicted to have Malignant Breast Cancer (probability: {p}%). Please consult an oncologist.",
                "The person is predicted to have Benign Breast Cancer (probability of malignancy: {p}%).",
            ),
        },
    ]
}
