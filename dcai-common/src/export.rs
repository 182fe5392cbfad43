//! Export formatters for the tabular artifact
//!
//! All formatters read the grid/record views produced by [`crate::tabular`];
//! none of them mutate wizard state.

use crate::tabular::Record;
use serde_json::Value;

/// Serialize a grid (header row + value rows) to CSV text.
///
/// Every cell is quoted; embedded quotes are escaped by doubling. No
/// locale-specific separators.
pub fn to_csv(grid: &[Vec<String>]) -> String {
    grid.iter()
        .map(|row| {
            row.iter()
                .map(|cell| format!("\"{}\"", cell.replace('"', "\"\"")))
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Serialize records to pretty-printed JSON (2-space indent), reduced to the
/// given column order. Missing keys become empty strings.
pub fn to_json(records: &[Record], column_order: &[String]) -> String {
    let ordered: Vec<Record> = records
        .iter()
        .map(|record| {
            let headers: Vec<String> = if column_order.is_empty() {
                record.keys().cloned().collect()
            } else {
                column_order.to_vec()
            };
            let mut ordered_record = Record::new();
            for header in headers {
                let value = match record.get(&header) {
                    Some(Value::Null) | None => Value::String(String::new()),
                    Some(v) => v.clone(),
                };
                ordered_record.insert(header, value);
            }
            ordered_record
        })
        .collect();

    serde_json::to_string_pretty(&ordered).unwrap_or_else(|_| "[]".to_string())
}

/// Generate a SQL script for the grid: a `CREATE TABLE IF NOT EXISTS` with a
/// surrogate auto-increment primary key and one TEXT column per header
/// (snake_cased), followed by one INSERT per data row.
///
/// String values escape single quotes by doubling. No type inference, no
/// NULL handling beyond the empty string.
pub fn insert_script(table_name: &str, grid: &[Vec<String>]) -> String {
    let Some((headers, rows)) = grid.split_first() else {
        return String::new();
    };

    let columns: Vec<String> = headers.iter().map(|h| sql_identifier(h)).collect();

    let mut script = String::from("-- Create table structure\n");
    script.push_str(&format!("CREATE TABLE IF NOT EXISTS {} (\n", table_name));
    script.push_str("    id INTEGER PRIMARY KEY AUTOINCREMENT");
    for column in &columns {
        script.push_str(&format!(",\n    {} TEXT", column));
    }
    script.push_str("\n);\n\n");

    let inserts: Vec<String> = rows
        .iter()
        .map(|row| {
            let values = row
                .iter()
                .map(|cell| format!("'{}'", cell.replace('\'', "''")))
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "INSERT INTO {} ({}) VALUES ({});",
                table_name,
                columns.join(", "),
                values
            )
        })
        .collect();
    script.push_str(&inserts.join("\n"));

    script
}

/// Lowercase a header and replace whitespace runs with underscores
fn sql_identifier(header: &str) -> String {
    header
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(pairs: &[(&str, &str)]) -> Record {
        let mut r = Record::new();
        for (k, v) in pairs {
            r.insert(k.to_string(), json!(v));
        }
        r
    }

    #[test]
    fn csv_quotes_every_cell() {
        let grid = vec![
            vec!["val".to_string(), "name".to_string()],
            vec!["world".to_string(), "Hello".to_string()],
        ];

        assert_eq!(to_csv(&grid), "\"val\",\"name\"\n\"world\",\"Hello\"");
    }

    #[test]
    fn csv_doubles_embedded_quotes() {
        let grid = vec![vec!["say \"hi\"".to_string()]];

        assert_eq!(to_csv(&grid), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn json_reduces_to_column_order() {
        let records = vec![record(&[("a", "1"), ("b", "2")])];
        let order = vec!["b".to_string()];

        let json_text = to_json(&records, &order);
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&json_text).unwrap();

        assert_eq!(parsed[0], json!({"b": "2"}));
        assert!(json_text.contains("\n  "), "expected 2-space indentation");
    }

    #[test]
    fn json_fills_missing_keys_with_empty_strings() {
        let records = vec![record(&[("a", "1")])];
        let order = vec!["a".to_string(), "b".to_string()];

        let parsed: Vec<serde_json::Value> =
            serde_json::from_str(&to_json(&records, &order)).unwrap();

        assert_eq!(parsed[0], json!({"a": "1", "b": ""}));
    }

    #[test]
    fn sql_script_creates_table_and_inserts() {
        let grid = vec![
            vec!["First Name".to_string(), "Age".to_string()],
            vec!["Ada".to_string(), "36".to_string()],
        ];

        let script = insert_script("people", &grid);

        assert!(script.starts_with("-- Create table structure\n"));
        assert!(script.contains("CREATE TABLE IF NOT EXISTS people (\n"));
        assert!(script.contains("id INTEGER PRIMARY KEY AUTOINCREMENT"));
        assert!(script.contains("first_name TEXT"));
        assert!(script.contains("age TEXT"));
        assert!(script.contains("INSERT INTO people (first_name, age) VALUES ('Ada', '36');"));
    }

    #[test]
    fn sql_values_double_single_quotes() {
        let grid = vec![
            vec!["note".to_string()],
            vec!["it's fine".to_string()],
        ];

        let script = insert_script("notes", &grid);

        assert!(script.contains("VALUES ('it''s fine');"));
    }

    #[test]
    fn sql_script_empty_grid_is_empty() {
        assert_eq!(insert_script("t", &[]), "");
    }
}
