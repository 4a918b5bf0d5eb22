//! Cell contents written through a grid sink

use std::fmt;

/// What a layout or emitter writes into one cell
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellContent {
    /// Empty cell
    #[default]
    Empty,
    /// Literal text
    Text(String),
    /// Literal number
    Number(f64),
    /// Formula text, including the leading `=`
    Formula(String),
}

impl CellContent {
    /// Create a formula cell, adding the leading `=` if missing
    pub fn formula(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.starts_with('=') {
            CellContent::Formula(text)
        } else {
            CellContent::Formula(format!("={}", text))
        }
    }

    /// Check if the cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellContent::Empty)
    }

    /// Check if the cell holds a formula
    pub fn is_formula(&self) -> bool {
        matches!(self, CellContent::Formula(_))
    }

    /// Get as text, if this is a text cell
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellContent::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get as number, if this is a number cell
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellContent::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the formula text, if this is a formula cell
    pub fn as_formula(&self) -> Option<&str> {
        match self {
            CellContent::Formula(f) => Some(f),
            _ => None,
        }
    }

    /// Display length used for fitting column widths
    pub fn display_len(&self) -> usize {
        match self {
            CellContent::Empty => 0,
            CellContent::Text(s) | CellContent::Formula(s) => s.chars().count(),
            CellContent::Number(n) => n.to_string().len(),
        }
    }
}

impl fmt::Display for CellContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellContent::Empty => Ok(()),
            CellContent::Text(s) | CellContent::Formula(s) => f.write_str(s),
            CellContent::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for CellContent {
    fn from(s: &str) -> Self {
        CellContent::Text(s.to_string())
    }
}

impl From<String> for CellContent {
    fn from(s: String) -> Self {
        CellContent::Text(s)
    }
}

impl From<f64> for CellContent {
    fn from(n: f64) -> Self {
        CellContent::Number(n)
    }
}

impl From<usize> for CellContent {
    fn from(n: usize) -> Self {
        CellContent::Number(n as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formula_prefix() {
        assert_eq!(
            CellContent::formula("SUM(A1:A2)"),
            CellContent::Formula("=SUM(A1:A2)".into())
        );
        assert_eq!(
            CellContent::formula("=A1"),
            CellContent::Formula("=A1".into())
        );
    }

    #[test]
    fn test_display_len() {
        assert_eq!(CellContent::from("Not sure").display_len(), 8);
        assert_eq!(CellContent::from(0.5).display_len(), 3);
        assert_eq!(CellContent::Empty.display_len(), 0);
    }
}
