//! CSV tables and their conversion into numeric training data.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to open dataset {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("dataset has no rows")]
    Empty,
    #[error("missing column '{0}'")]
    MissingColumn(String),
    #[error("target column '{column}' has {found} classes, expected 2")]
    NotBinary { column: String, found: usize },
    #[error("target column '{0}' has empty cells")]
    MissingTarget(String),
    #[error("class {class} has {count} member(s); at least 2 are needed to stratify")]
    ClassTooSmall { class: f64, count: usize },
    #[error("cannot split {n} rows into non-empty train and test sets for {classes} classes")]
    SplitTooSmall { n: usize, classes: usize },
}

/// One CSV column. A column is numeric when every non-empty cell parses as a
/// number; empty cells in a numeric column become NaN.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Numeric(Vec<f64>),
    Text(Vec<String>),
}

impl Column {
    fn from_cells(cells: Vec<String>) -> Self {
        let numeric = cells
            .iter()
            .all(|c| c.is_empty() || c.parse::<f64>().is_ok());
        if numeric {
            Column::Numeric(
                cells
                    .iter()
                    .map(|c| c.parse::<f64>().unwrap_or(f64::NAN))
                    .collect(),
            )
        } else {
            Column::Text(cells)
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Column::Numeric(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    columns: Vec<Column>,
}

impl Table {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DataError::Open {
            path: path.display().to_string(),
            source,
        })?;
        let table = Self::from_reader(file)?;
        log::debug!(
            "loaded {} rows x {} columns from {}",
            table.n_rows(),
            table.headers.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DataError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        for record in rdr.records() {
            let record = record?;
            for (i, col) in cells.iter_mut().enumerate() {
                col.push(record.get(i).unwrap_or("").to_string());
            }
        }
        if cells.first().map_or(true, Vec::is_empty) {
            return Err(DataError::Empty);
        }
        let columns = cells.into_iter().map(Column::from_cells).collect();
        Ok(Self { headers, columns })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    pub fn column(&self, name: &str) -> Result<&Column, DataError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .map(|i| &self.columns[i])
            .ok_or_else(|| DataError::MissingColumn(name.to_string()))
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }
}

/// Maps sorted distinct strings to `0..n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn fit(values: &[String]) -> Self {
        let mut classes = values.to_vec();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn encode(&self, value: &str) -> Option<f64> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(value))
            .ok()
            .map(|i| i as f64)
    }

    pub fn transform(&self, values: &[String]) -> Vec<f64> {
        values
            .iter()
            .map(|v| self.encode(v).unwrap_or(f64::NAN))
            .collect()
    }
}

/// Numeric feature matrix and binary target ready for training.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub feature_names: Vec<String>,
    /// Row-major feature values.
    pub rows: Vec<Vec<f64>>,
    pub target: Vec<f64>,
    /// Sorted distinct target values.
    pub classes: Vec<f64>,
    /// Original strings for a label-encoded target, indexed like `classes`.
    pub class_names: Option<Vec<String>>,
    /// True when no feature column needed label encoding.
    pub all_numeric: bool,
}

impl Dataset {
    /// Select `features` and `target` from `table`, label-encoding text columns.
    pub fn from_table(table: &Table, features: &[String], target: &str) -> Result<Self, DataError> {
        let mut columns = Vec::with_capacity(features.len());
        let mut all_numeric = true;
        for name in features {
            let values = match table.column(name)? {
                Column::Numeric(v) => v.clone(),
                Column::Text(v) => {
                    all_numeric = false;
                    let enc = LabelEncoder::fit(v);
                    log::debug!("label-encoded '{}' into {} classes", name, enc.classes().len());
                    enc.transform(v)
                }
            };
            columns.push(values);
        }

        let (target_values, class_names) = match table.column(target)? {
            Column::Numeric(v) => {
                if v.iter().any(|x| x.is_nan()) {
                    return Err(DataError::MissingTarget(target.to_string()));
                }
                (v.clone(), None)
            }
            Column::Text(v) => {
                let enc = LabelEncoder::fit(v);
                (enc.transform(v), Some(enc.classes().to_vec()))
            }
        };

        let classes = distinct_sorted(&target_values);
        if classes.len() != 2 {
            return Err(DataError::NotBinary {
                column: target.to_string(),
                found: classes.len(),
            });
        }

        let n = table.n_rows();
        let rows = (0..n)
            .map(|i| columns.iter().map(|c| c[i]).collect())
            .collect();

        Ok(Self {
            feature_names: features.to_vec(),
            rows,
            target: target_values,
            classes,
            class_names,
            all_numeric,
        })
    }

    pub fn load(path: impl AsRef<Path>, features: &[String], target: &str) -> Result<Self, DataError> {
        let table = Table::from_path(path)?;
        Self::from_table(&table, features, target)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The class treated as positive: label `1` when present, else the larger label.
    pub fn positive_class(&self) -> f64 {
        positive_class(&self.classes)
    }

    pub fn select(&self, indices: &[usize]) -> (Vec<Vec<f64>>, Vec<f64>) {
        let x = indices.iter().map(|&i| self.rows[i].clone()).collect();
        let y = indices.iter().map(|&i| self.target[i]).collect();
        (x, y)
    }
}

pub fn distinct_sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(f64::total_cmp);
    out.dedup();
    out
}

pub fn positive_class(classes: &[f64]) -> f64 {
    if classes.contains(&1.0) {
        1.0
    } else {
        classes.last().copied().unwrap_or(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CSV: &str = "\
age,sex,score,label
40,M,1.5,yes
,F,2.5,no
55,F,3.5,yes
";

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn column_kinds_are_inferred() {
        let t = Table::from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(t.n_rows(), 3);
        assert!(t.column("age").unwrap().is_numeric());
        assert!(!t.column("sex").unwrap().is_numeric());
        match t.column("age").unwrap() {
            Column::Numeric(v) => assert!(v[1].is_nan()),
            Column::Text(_) => unreachable!(),
        }
    }

    #[test]
    fn text_columns_are_label_encoded() {
        let t = Table::from_reader(CSV.as_bytes()).unwrap();
        let d = Dataset::from_table(&t, &names(&["sex", "score"]), "label").unwrap();
        assert!(!d.all_numeric);
        assert_eq!(d.rows[0], vec![1.0, 1.5]);
        assert_eq!(d.rows[1], vec![0.0, 2.5]);
        assert_eq!(d.target, vec![1.0, 0.0, 1.0]);
        assert_eq!(d.class_names, Some(names(&["no", "yes"])));
        assert_eq!(d.positive_class(), 1.0);
    }

    #[test]
    fn missing_column_is_reported() {
        let t = Table::from_reader(CSV.as_bytes()).unwrap();
        let err = Dataset::from_table(&t, &names(&["weight"]), "label").unwrap_err();
        assert!(matches!(err, DataError::MissingColumn(c) if c == "weight"));
    }

    #[test]
    fn multiclass_target_is_rejected() {
        let csv = "x,y\n1,a\n2,b\n3,c\n";
        let t = Table::from_reader(csv.as_bytes()).unwrap();
        let err = Dataset::from_table(&t, &names(&["x"]), "y").unwrap_err();
        assert!(matches!(err, DataError::NotBinary { found: 3, .. }));
    }

    #[test]
    fn header_only_file_is_empty() {
        let err = Table::from_reader("a,b\n".as_bytes()).unwrap_err();
        assert!(matches!(err, DataError::Empty));
    }

    #[test]
    fn positive_class_prefers_one() {
        assert_eq!(positive_class(&[1.0, 2.0]), 1.0);
        assert_eq!(positive_class(&[0.0, 1.0]), 1.0);
        assert_eq!(positive_class(&[-1.0, 3.0]), 3.0);
    }
}
