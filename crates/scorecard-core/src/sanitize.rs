//! Post-render cleanup
//!
//! Emitters run every rendered formula and the final script text through
//! these passes exactly once, just before serialization.

/// Remove implicit-intersection markers (`@`) outside string literals
///
/// Spreadsheet applications insert `@` in front of functions that may
/// return arrays; formulas written with it do not evaluate the same way in
/// older calculation engines.
///
/// # Examples
/// ```
/// use scorecard_core::sanitize::sanitize_formula;
///
/// assert_eq!(sanitize_formula(r#"=@INDEX(A1:A3,1)&"@""#), r#"=INDEX(A1:A3,1)&"@""#);
/// ```
pub fn sanitize_formula(formula: &str) -> String {
    let mut out = String::with_capacity(formula.len());
    let mut in_string = false;

    for c in formula.chars() {
        match c {
            // A doubled quote inside a literal toggles twice and stays inside
            '"' => {
                in_string = !in_string;
                out.push(c);
            }
            '@' if !in_string => {}
            _ => out.push(c),
        }
    }

    out
}

/// Make rendered script text safe to load
///
/// Line and paragraph separators are legal in JSON strings but end a line
/// in older JavaScript engines, so they are written as escapes. Line
/// endings are normalized to `\n`.
pub fn sanitize_script(script: &str) -> String {
    let mut out = String::with_capacity(script.len());
    let mut chars = script.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            '\r' => {
                if chars.peek() != Some(&'\n') {
                    out.push('\n');
                }
            }
            _ => out.push(c),
        }
    }

    out
}
