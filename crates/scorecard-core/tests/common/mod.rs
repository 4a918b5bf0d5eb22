//! Shared test helpers: sample assessments and a small evaluator for the
//! formula IR, close enough to a spreadsheet engine to compare dialects.

#![allow(dead_code)]

use std::collections::HashMap;

use scorecard_core::{
    Assessment, CellContent, CellRef, Expr, Function, MemoryGrid, Question, QuestionType,
    Section, NOT_SURE,
};

/// A single-select question with the given (label, score) options
pub fn dropdown(id: &str, options: &[(&str, f64)]) -> Question {
    options.iter().fold(
        Question::new(id, format!("Question {id}"), QuestionType::SingleSelect)
            .with_description(format!("Describe {id}")),
        |q, (label, score)| q.with_option(*label, *score),
    )
}

/// Low / Medium / High / Not sure, with the sentinel stored as 0.0
pub fn low_medium_high(id: &str) -> Question {
    dropdown(
        id,
        &[("Low", 0.0), ("Medium", 0.5), ("High", 1.0), (NOT_SURE, 0.0)],
    )
}

pub fn identification() -> Section {
    Section::new("0", "Data Product Information")
        .with_question(Question::new("0.1", "Data product name", QuestionType::FreeText))
        .with_question(Question::new("0.2", "Owner", QuestionType::FreeText))
}

/// Identification section plus one scorable section of two questions
pub fn two_question_assessment() -> Assessment {
    Assessment::new(
        "Data Product Complexity",
        identification(),
        vec![Section::new("1", "Data Sources")
            .with_question(low_medium_high("1.1"))
            .with_question(low_medium_high("1.2"))],
    )
}

/// Evaluated value of an expression
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Bool(bool),
    Blank,
    Error,
    /// Rows of values; inline arrays are a single row
    Array(Vec<Vec<Value>>),
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    fn flatten(&self) -> Vec<Value> {
        match self {
            Value::Array(rows) => rows.iter().flatten().cloned().collect(),
            other => vec![other.clone()],
        }
    }

    fn to_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Blank => Some(0.0),
            _ => None,
        }
    }

    fn matches(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Text(a), Value::Text(b)) => a.eq_ignore_ascii_case(b),
            (Value::Blank, Value::Text(s)) | (Value::Text(s), Value::Blank) => s.is_empty(),
            (Value::Blank, Value::Blank) => true,
            (a, b) => match (a.to_number(), b.to_number()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }
}

/// Evaluates [`Expr`] trees against a [`MemoryGrid`]
///
/// Cells may additionally hold expressions (registered with
/// [`Evaluator::with_formula`]), which are evaluated on read.
pub struct Evaluator<'a> {
    grid: &'a MemoryGrid,
    formulas: HashMap<CellRef, Expr>,
}

impl<'a> Evaluator<'a> {
    pub fn new(grid: &'a MemoryGrid) -> Self {
        Self {
            grid,
            formulas: HashMap::new(),
        }
    }

    pub fn with_formula(mut self, cell: CellRef, expr: Expr) -> Self {
        self.formulas.insert(cell, expr);
        self
    }

    pub fn eval(&self, expr: &Expr) -> Value {
        match expr {
            Expr::Number(n) => Value::Number(*n),
            Expr::Text(s) => Value::Text(s.clone()),
            Expr::Bool(b) => Value::Bool(*b),
            Expr::Cell(cell) => self.read(cell),
            Expr::Range(range) => Value::Array(
                (range.row..=range.end_row())
                    .map(|row| {
                        (range.col..=range.end_col())
                            .map(|col| self.read(&CellRef::new(range.table.clone(), row, col)))
                            .collect()
                    })
                    .collect(),
            ),
            Expr::Array(items) => Value::Array(vec![items.iter().map(|e| self.eval(e)).collect()]),
            Expr::Eq(a, b) => {
                let (a, b) = (self.eval(a), self.eval(b));
                if a == Value::Error || b == Value::Error {
                    return Value::Error;
                }
                Value::Bool(a.matches(&b))
            }
            Expr::Add(a, b) => self.arithmetic(a, b, |x, y| x + y),
            Expr::Mul(a, b) => self.arithmetic(a, b, |x, y| x * y),
            Expr::Call(function, args) => self.call(*function, args),
        }
    }

    fn read(&self, cell: &CellRef) -> Value {
        if let Some(expr) = self.formulas.get(cell) {
            return self.eval(expr);
        }
        match self.grid.get(cell) {
            CellContent::Empty => Value::Blank,
            CellContent::Text(s) => Value::Text(s.clone()),
            CellContent::Number(n) => Value::Number(*n),
            CellContent::Formula(f) => panic!("cannot evaluate formula text {f} at {cell}"),
        }
    }

    fn arithmetic(&self, a: &Expr, b: &Expr, op: impl Fn(f64, f64) -> f64) -> Value {
        match (self.eval(a).to_number(), self.eval(b).to_number()) {
            (Some(x), Some(y)) => Value::Number(op(x, y)),
            _ => Value::Error,
        }
    }

    fn call(&self, function: Function, args: &[Expr]) -> Value {
        let arg = |i: usize| self.eval(&args[i]);
        match function {
            Function::If => match arg(0) {
                Value::Error => Value::Error,
                cond if cond.to_number().is_some_and(|n| n != 0.0) => arg(1),
                _ => arg(2),
            },
            Function::IfError => match arg(0) {
                Value::Error => arg(1),
                value => value,
            },
            Function::IsBlank => Value::Bool(arg(0) == Value::Blank),
            Function::VLookup => {
                let key = arg(0);
                let Value::Array(rows) = arg(1) else {
                    return Value::Error;
                };
                let col = arg(2).to_number().unwrap_or(0.0) as usize;
                rows.iter()
                    .find(|row| row.first().is_some_and(|first| first.matches(&key)))
                    .and_then(|row| row.get(col.wrapping_sub(1)).cloned())
                    .unwrap_or(Value::Error)
            }
            Function::Match => {
                let key = arg(0);
                if key == Value::Blank {
                    return Value::Error;
                }
                arg(1)
                    .flatten()
                    .iter()
                    .position(|v| v.matches(&key))
                    .map(|i| Value::Number((i + 1) as f64))
                    .unwrap_or(Value::Error)
            }
            Function::Index => {
                let values = arg(0).flatten();
                match arg(1) {
                    Value::Number(n) if n >= 1.0 => {
                        values.get(n as usize - 1).cloned().unwrap_or(Value::Error)
                    }
                    _ => Value::Error,
                }
            }
            Function::Average => {
                let mut numbers = Vec::new();
                for value in args.iter().flat_map(|a| self.eval(a).flatten()) {
                    match value {
                        Value::Error => return Value::Error,
                        Value::Number(n) => numbers.push(n),
                        _ => {}
                    }
                }
                if numbers.is_empty() {
                    return Value::Error;
                }
                Value::Number(numbers.iter().sum::<f64>() / numbers.len() as f64)
            }
            // Floors the raw double, like both spreadsheet engines
            Function::Int => match arg(0).to_number() {
                Some(n) => Value::Number(n.floor()),
                None => Value::Error,
            },
            Function::Round => match (arg(0).to_number(), arg(1).to_number()) {
                (Some(n), Some(digits)) => {
                    let scale = 10f64.powi(digits as i32);
                    Value::Number((n * scale).round() / scale)
                }
                _ => Value::Error,
            },
            Function::Min => {
                let numbers: Option<Vec<f64>> =
                    args.iter().map(|a| self.eval(a).to_number()).collect();
                match numbers {
                    Some(ns) if !ns.is_empty() => {
                        Value::Number(ns.into_iter().fold(f64::INFINITY, f64::min))
                    }
                    _ => Value::Error,
                }
            }
        }
    }
}
