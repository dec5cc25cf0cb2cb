use crate::core::{FlatTable, Record};
use serde_json::{Map, Value};
use std::collections::HashMap;

pub const SEPARATOR: char = '.';

/// Flattens one record into `(dotted column, value)` pairs in key order.
///
/// Nested objects are expanded recursively; an empty object yields no column.
/// Arrays are kept whole in a single cell.
pub fn flatten_record(record: Record) -> Vec<(String, Value)> {
    let mut cells = Vec::new();
    flatten_into(record.data, None, &mut cells);
    cells
}

fn flatten_into(object: Map<String, Value>, prefix: Option<&str>, cells: &mut Vec<(String, Value)>) {
    for (key, value) in object {
        let name = match prefix {
            Some(prefix) => format!("{}{}{}", prefix, SEPARATOR, key),
            None => key,
        };
        match value {
            Value::Object(nested) => flatten_into(nested, Some(&name), cells),
            other => cells.push((name, other)),
        }
    }
}

/// Builds a table with one row per record, in input order.
///
/// Columns are the union of every flattened field, ordered by first appearance.
pub fn flatten(records: impl IntoIterator<Item = Record>) -> FlatTable {
    let mut columns: Vec<String> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut rows = Vec::new();

    for record in records {
        let mut row: Vec<Option<Value>> = vec![None; columns.len()];
        for (name, value) in flatten_record(record) {
            let position = *positions.entry(name).or_insert_with_key(|name| {
                columns.push(name.clone());
                columns.len() - 1
            });
            if position >= row.len() {
                row.resize(position + 1, None);
            }
            row[position] = Some(value);
        }
        rows.push(row);
    }

    tracing::debug!(
        "🔄 Flattened {} records into {} columns",
        rows.len(),
        columns.len()
    );
    FlatTable::new(columns, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        serde_json::from_value(value).unwrap()
    }

    fn hits() -> Vec<Record> {
        vec![
            record(json!({
                "_id": "1",
                "_source": {
                    "borough": "Hackney",
                    "application_details": {
                        "residential_details": {"site_area": 0.4, "total_no_proposed_residential_units": 120}
                    },
                    "polygon": {"type": "Polygon", "coordinates": [[[0.1, 51.5], [0.2, 51.6]]]}
                }
            })),
            record(json!({
                "_id": "2",
                "_source": {
                    "borough": "Camden",
                    "postcode": "NW1 0AA",
                    "application_details": {}
                }
            })),
        ]
    }

    #[test]
    fn test_nested_keys_become_dotted_columns() {
        let table = flatten(hits());

        assert_eq!(
            table.columns(),
            &[
                "_id",
                "_source.borough",
                "_source.application_details.residential_details.site_area",
                "_source.application_details.residential_details.total_no_proposed_residential_units",
                "_source.polygon.type",
                "_source.polygon.coordinates",
                "_source.postcode",
            ]
        );
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_sparse_fields_leave_empty_cells() {
        let table = flatten(vec![
            record(json!({"a": {"b": 1}})),
            record(json!({"c": 2})),
        ]);

        assert_eq!(table.column("a.b").unwrap(), vec![Some(&json!(1)), None]);
        assert_eq!(table.get(0, "c"), None);
        assert_eq!(table.get(1, "c"), Some(&json!(2)));
    }

    #[test]
    fn test_arrays_stay_in_one_cell() {
        let table = flatten(hits());

        assert_eq!(
            table.get(0, "_source.polygon.coordinates"),
            Some(&json!([[[0.1, 51.5], [0.2, 51.6]]]))
        );
        assert!(table.column_index("_source.polygon.coordinates.0").is_none());
    }

    #[test]
    fn test_empty_object_adds_no_column() {
        let table = flatten(vec![record(json!({"a": {}, "b": null}))]);

        assert_eq!(table.columns(), &["b"]);
        assert_eq!(table.rows()[0], vec![Some(Value::Null)]);
    }

    #[test]
    fn test_flattening_is_deterministic() {
        let first = flatten(hits());
        let second = flatten(hits());

        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_batch_gives_empty_table() {
        let table = flatten(Vec::new());

        assert!(table.is_empty());
        assert!(table.columns().is_empty());
    }

    #[test]
    fn test_flatten_record_preserves_key_order() {
        let cells = flatten_record(record(json!({"z": 1, "a": {"y": 2, "b": 3}})));
        let names: Vec<&str> = cells.iter().map(|(n, _)| n.as_str()).collect();

        assert_eq!(names, vec!["z", "a.y", "a.b"]);
    }
}
