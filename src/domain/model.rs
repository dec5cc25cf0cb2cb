use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One raw search hit, nested exactly as the backend returned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub data: Map<String, Value>,
}

impl Record {
    /// Looks up a nested field by its dotted path, e.g. `_source.valid_date`.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.data.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }
}

/// One page of a scrolled search together with the handle for the next page.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultPage {
    pub scroll_id: String,
    pub hits: Vec<Record>,
}

impl ResultPage {
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Rectangular view of a record batch: one row per record, dotted column names.
///
/// `None` marks a field the record did not have; `Some(Value::Null)` is an
/// explicit null. Both render as an empty cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatTable {
    columns: Vec<String>,
    rows: Vec<Vec<Option<Value>>>,
}

impl FlatTable {
    /// Rows shorter than `columns` are padded with missing cells.
    pub fn new(columns: Vec<String>, mut rows: Vec<Vec<Option<Value>>>) -> Self {
        let width = columns.len();
        for row in &mut rows {
            row.resize(width, None);
        }
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Option<Value>>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index)?.as_ref()
    }

    pub fn column(&self, name: &str) -> Option<Vec<Option<&Value>>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[index].as_ref()).collect())
    }

    /// Renders the table with a header row; `b','` gives CSV, `b'\t'` gives TSV.
    pub fn to_delimited(&self, delimiter: u8) -> crate::utils::error::Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(Vec::new());

        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(cell_text))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| crate::utils::error::EtlError::IoError(e.into_error()))?;
        String::from_utf8(bytes).map_err(|e| crate::utils::error::EtlError::ProcessingError {
            message: format!("Rendered table is not valid UTF-8: {}", e),
        })
    }

    pub fn to_csv(&self) -> crate::utils::error::Result<String> {
        self.to_delimited(b',')
    }

    pub fn to_tsv(&self) -> crate::utils::error::Result<String> {
        self.to_delimited(b'\t')
    }

    /// Rows as JSON objects keyed by column name; missing cells are left out.
    pub fn to_json_rows(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row)
                    .filter_map(|(column, cell)| cell.clone().map(|v| (column.clone(), v)))
                    .collect()
            })
            .collect()
    }
}

/// Text form of a single cell.
pub fn cell_text(cell: &Option<Value>) -> String {
    match cell {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub table: FlatTable,
    pub csv_output: String,
    pub tsv_output: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_get_path_walks_nested_objects() {
        let hit = record(json!({
            "_id": "abc",
            "_source": {"application_details": {"residential_details": {"site_area": 1.5}}}
        }));

        assert_eq!(
            hit.get_path("_source.application_details.residential_details.site_area"),
            Some(&json!(1.5))
        );
        assert_eq!(hit.get_path("_source.missing"), None);
        assert_eq!(hit.get_path("_id.nested"), None);
    }

    #[test]
    fn test_rows_are_padded_to_width() {
        let table = FlatTable::new(
            vec!["a".to_string(), "b".to_string()],
            vec![vec![Some(json!(1))]],
        );

        assert_eq!(table.rows()[0].len(), 2);
        assert_eq!(table.get(0, "a"), Some(&json!(1)));
        assert_eq!(table.get(0, "b"), None);
    }

    #[test]
    fn test_csv_rendering_quotes_and_blanks() {
        let table = FlatTable::new(
            vec!["site_name".to_string(), "polygon".to_string(), "uprn".to_string()],
            vec![
                vec![
                    Some(json!("Flat 1, High St")),
                    Some(json!([[0.1, 51.5]])),
                    Some(Value::Null),
                ],
                vec![Some(json!("Depot")), None, Some(json!(100021))],
            ],
        );

        let csv = table.to_csv().unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "site_name,polygon,uprn");
        assert_eq!(lines[1], "\"Flat 1, High St\",\"[[0.1,51.5]]\",");
        assert_eq!(lines[2], "Depot,,100021");
    }

    #[test]
    fn test_tsv_rendering() {
        let table = FlatTable::new(
            vec!["borough".to_string(), "decision".to_string()],
            vec![vec![Some(json!("Camden")), Some(json!("Approved"))]],
        );

        assert_eq!(table.to_tsv().unwrap(), "borough\tdecision\nCamden\tApproved\n");
    }

    #[test]
    fn test_json_rows_skip_missing_keep_null() {
        let table = FlatTable::new(
            vec!["a".to_string(), "b".to_string()],
            vec![vec![None, Some(Value::Null)]],
        );

        let rows = table.to_json_rows();
        assert!(!rows[0].contains_key("a"));
        assert_eq!(rows[0].get("b"), Some(&Value::Null));
    }
}
