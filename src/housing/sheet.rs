use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use std::{fs, path::Path};
use tracing::debug;

use crate::process::{
    clean_header, decode::decode_with_fallback, parse_delimited, utils::parse_number, Columns,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Numeric coercion: non-numeric text and empty cells are missing.
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if n.is_finite() => Some(*n),
            Cell::Number(_) | Cell::Empty => None,
            Cell::Text(s) => parse_number(s),
        }
    }

    pub fn to_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Number(n) => n.to_string(),
            Cell::Text(s) => s.clone(),
        }
    }
}

impl From<&Data> for Cell {
    fn from(value: &Data) -> Self {
        match value {
            Data::Empty => Cell::Empty,
            Data::Int(n) => Cell::Number(*n as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::String(s) if s.trim().is_empty() => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            other => Cell::Text(other.to_string()),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        if value.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }
}

/// First worksheet (or CSV) as a header row plus data rows.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub columns: Columns,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let columns = Columns::from_names(headers.iter().map(String::as_str));
        Self {
            headers,
            columns,
            rows,
        }
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        const EMPTY: &Cell = &Cell::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(EMPTY)
    }
}

/// Load `path` by extension: `.csv` as text, anything else as a workbook.
pub fn load_sheet<P: AsRef<Path>>(path: P) -> Result<Sheet> {
    let path = path.as_ref();
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);
    if is_csv {
        load_csv(path)
    } else {
        load_workbook(path)
    }
}

fn load_workbook(path: &Path) -> Result<Sheet> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("failed to open workbook {}", path.display()))?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| anyhow!("workbook {} has no worksheets", path.display()))?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("failed to read sheet {:?} of {}", sheet_name, path.display()))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|r| r.iter().map(|c| clean_header(&c.to_string())).collect())
        .unwrap_or_default();
    let data = data_rows(rows);

    debug!(sheet = %sheet_name, columns = headers.len(), rows = data.len(), "workbook loaded");
    Ok(Sheet::new(headers, data))
}

/// Convert worksheet rows to cells, dropping rows with no content at all.
fn data_rows<'a, I>(rows: I) -> Vec<Vec<Cell>>
where
    I: Iterator<Item = &'a [Data]>,
{
    rows.map(|r| r.iter().map(Cell::from).collect::<Vec<Cell>>())
        .filter(|r| r.iter().any(|c| *c != Cell::Empty))
        .collect()
}

fn load_csv(path: &Path) -> Result<Sheet> {
    let source = path.display().to_string();
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", source))?;
    let (text, encoding) = decode_with_fallback(&bytes);
    let table = parse_delimited(&text, b',', &source)?;
    let rows: Vec<Vec<Cell>> = table
        .rows
        .iter()
        .map(|r| r.iter().map(Cell::from).collect())
        .collect();

    debug!(%encoding, columns = table.headers.len(), rows = rows.len(), "csv sheet loaded");
    Ok(Sheet::new(table.headers, rows))
}
