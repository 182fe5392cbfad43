//! Tabular data transformation
//!
//! Maintains the two-way mapping between cleaned records (ordered
//! column-name → cell-value mappings, the AI-cleaning output) and the
//! processed grid (header row + value rows), driven entirely by the
//! user-controlled column order. Records are the source of truth;
//! reordering never mutates them.

use serde_json::Value;

/// A single cleaned record: an ordered mapping from column name to cell value
pub type Record = serde_json::Map<String, Value>;

/// Render a cell value for display.
///
/// Missing keys and JSON nulls become the empty string (display-safety
/// policy, not an error condition); strings are rendered bare; other
/// scalars use their JSON text.
pub fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Column names of a record, in key order
pub fn record_keys(record: &Record) -> Vec<String> {
    record.keys().cloned().collect()
}

/// Convert records to the 2D grid view: `[column_order, ...rows]` where each
/// row is `column_order.map(col => record[col] ?? "")`.
pub fn records_to_grid(records: &[Record], column_order: &[String]) -> Vec<Vec<String>> {
    if records.is_empty() {
        return Vec::new();
    }

    let mut grid = Vec::with_capacity(records.len() + 1);
    grid.push(column_order.to_vec());
    for record in records {
        grid.push(
            column_order
                .iter()
                .map(|col| cell_text(record.get(col)))
                .collect(),
        );
    }
    grid
}

/// Convert a grid (header row + value rows) back to records by zipping each
/// row against the header row positionally.
pub fn grid_to_records(grid: &[Vec<String>]) -> Vec<Record> {
    let Some((headers, rows)) = grid.split_first() else {
        return Vec::new();
    };

    rows.iter()
        .map(|row| {
            let mut record = Record::new();
            for (i, header) in headers.iter().enumerate() {
                let cell = row.get(i).cloned().unwrap_or_default();
                record.insert(header.clone(), Value::String(cell));
            }
            record
        })
        .collect()
}

/// Parse a legacy CSV-shaped AI response (header line + data lines) into
/// records. Fields are comma-separated; quoted fields may contain commas
/// and escape embedded quotes by doubling.
pub fn parse_delimited(text: &str) -> Vec<Record> {
    let grid: Vec<Vec<String>> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_delimited_line)
        .collect();
    grid_to_records(&grid)
}

/// Parse a single comma-separated line, honoring double-quoted fields
fn parse_delimited_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        current.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => current.push(c),
            }
        } else if c == '"' && current.is_empty() {
            in_quotes = true;
        } else if c == ',' {
            fields.push(std::mem::take(&mut current).trim().to_string());
        } else {
            current.push(c);
        }
    }
    fields.push(current.trim().to_string());

    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(pairs: &[(&str, Value)]) -> Record {
        let mut r = Record::new();
        for (k, v) in pairs {
            r.insert(k.to_string(), v.clone());
        }
        r
    }

    #[test]
    fn grid_header_row_matches_column_order() {
        let records = vec![
            record(&[("name", json!("Hello")), ("val", json!("world"))]),
            record(&[("name", json!("a")), ("val", json!("b"))]),
        ];
        let order = vec!["val".to_string(), "name".to_string()];

        let grid = records_to_grid(&records, &order);

        assert_eq!(grid[0], vec!["val", "name"]);
        assert_eq!(grid[1], vec!["world", "Hello"]);
        assert_eq!(grid[2], vec!["b", "a"]);
    }

    #[test]
    fn missing_keys_render_as_empty_string() {
        let records = vec![record(&[("a", json!("1"))])];
        let order = vec!["a".to_string(), "b".to_string()];

        let grid = records_to_grid(&records, &order);

        assert_eq!(grid[1], vec!["1", ""]);
    }

    #[test]
    fn null_cells_render_as_empty_string() {
        let records = vec![record(&[("a", Value::Null), ("b", json!(42))])];
        let order = vec!["a".to_string(), "b".to_string()];

        let grid = records_to_grid(&records, &order);

        assert_eq!(grid[1], vec!["", "42"]);
    }

    #[test]
    fn empty_records_produce_empty_grid() {
        let grid = records_to_grid(&[], &["a".to_string()]);
        assert!(grid.is_empty());
    }

    #[test]
    fn reordering_is_reversible() {
        let records = vec![record(&[("x", json!("1")), ("y", json!("2"))])];
        let forward = vec!["y".to_string(), "x".to_string()];
        let back = vec!["x".to_string(), "y".to_string()];

        let reordered = records_to_grid(&records, &forward);
        let restored = records_to_grid(&records, &back);

        assert_eq!(reordered[0], vec!["y", "x"]);
        assert_eq!(restored[0], vec!["x", "y"]);
        assert_eq!(restored[1], vec!["1", "2"]);
    }

    #[test]
    fn grid_round_trips_to_records() {
        let grid = vec![
            vec!["name".to_string(), "val".to_string()],
            vec!["Hello".to_string(), "world".to_string()],
        ];

        let records = grid_to_records(&grid);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("name"), Some(&json!("Hello")));
        assert_eq!(records[0].get("val"), Some(&json!("world")));
    }

    #[test]
    fn short_rows_pad_with_empty_cells() {
        let grid = vec![
            vec!["a".to_string(), "b".to_string()],
            vec!["1".to_string()],
        ];

        let records = grid_to_records(&grid);

        assert_eq!(records[0].get("b"), Some(&json!("")));
    }

    #[test]
    fn parse_delimited_basic() {
        let records = parse_delimited("name,val\nHello,world");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("name"), Some(&json!("Hello")));
        assert_eq!(records[0].get("val"), Some(&json!("world")));
    }

    #[test]
    fn parse_delimited_handles_quoted_commas() {
        let records = parse_delimited("a,b,c\n1,\"two, three\",4");

        assert_eq!(records[0].get("b"), Some(&json!("two, three")));
        assert_eq!(records[0].get("c"), Some(&json!("4")));
    }

    #[test]
    fn parse_delimited_handles_doubled_quotes() {
        let records = parse_delimited("a\n\"say \"\"hi\"\"\"");

        assert_eq!(records[0].get("a"), Some(&json!("say \"hi\"")));
    }

    #[test]
    fn parse_delimited_skips_blank_lines() {
        let records = parse_delimited("a,b\n\n1,2\n");

        assert_eq!(records.len(), 1);
    }
}
