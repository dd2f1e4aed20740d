//! Data primitives for multi-disease screening.
//!
//! - Disease profiles (clinical ranges, model input schema, dataset layout)
//!   held in a read-only [`DiseaseRegistry`]
//! - Inclusive range validation of named inputs via [`validate()`]
//! - CSV tables, label encoding and seeded stratified splitting
//! - A small file-backed account table
//!
//! Validating a form submission:
//! ```
//! use medi_data::{DiseaseRegistry, InputVector};
//! let input = InputVector::new().with("Glucose", 250.0).with("Age", 40.0);
//! let result = DiseaseRegistry::builtin().validate("diabetes", &input);
//! assert!(!result.valid);
//! assert_eq!(
//!     result.message,
//!     "Invalid value for 'Glucose'. Please enter a value between 1 and 200."
//! );
//! ```
//!
//! Loading a benchmark table:
//! ```
//! use medi_data::dataset::{Dataset, Table};
//! let csv = "x,sex,y\n1.0,M,0\n2.0,F,1\n";
//! let table = Table::from_reader(csv.as_bytes()).unwrap();
//! let data = Dataset::from_table(&table, &["x".into(), "sex".into()], "y").unwrap();
//! assert_eq!(data.rows[1], vec![2.0, 0.0]);
//! ```
pub mod accounts;
pub mod dataset;
mod diseases;
pub mod number;
pub mod registry;
pub mod split;
pub mod storage_file;
pub mod validate;

pub use accounts::{Account, AccountStore, AuthError};
pub use dataset::{Column, DataError, Dataset, LabelEncoder, Table};
pub use number::Number;
pub use registry::{
    load_profiles_from_file, load_profiles_from_str, DatasetLayout, DiagnosisText,
    DiseaseProfile, DiseaseRegistry, FeatureRange, RegistryError,
};
pub use split::{stratified_split, Split};
pub use validate::{validate, InputVector, MissingInput, ValidationResult};
