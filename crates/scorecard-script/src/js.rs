//! JavaScript literal rendering
//!
//! Renders JSON values as compact single-line JS literals (`[1, "a"]`,
//! `{"k": v}`). Strings are JSON-escaped, which is also valid JS apart from
//! U+2028/U+2029; the script sanitizer escapes those afterwards.

use scorecard_core::CellContent;
use serde_json::Value;

/// Render `value` as a JS literal
pub fn to_js(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        // Display of a JSON string value is its quoted, escaped form
        Value::String(_) => out.push_str(&value.to_string()),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => {
            out.push('{');
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push_str(": ");
                write_value(out, item);
            }
            out.push('}');
        }
    }
}

/// Cell content as a `setValues` entry: blanks become `""`, whole numbers
/// lose their fraction
pub fn cell_value(content: &CellContent) -> Value {
    match content {
        CellContent::Empty => Value::String(String::new()),
        CellContent::Text(s) | CellContent::Formula(s) => Value::String(s.clone()),
        CellContent::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => Value::from(*n as i64),
        CellContent::Number(n) => Value::from(*n),
    }
}

/// A grid of cells as a JS array-of-arrays literal
pub fn rows_literal(rows: &[Vec<CellContent>]) -> String {
    let rows = rows
        .iter()
        .map(|row| Value::Array(row.iter().map(cell_value).collect()))
        .collect();
    to_js(&Value::Array(rows))
}
