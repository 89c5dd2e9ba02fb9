// src/process/mod.rs
pub mod decode;
pub mod utils;
pub mod write;

use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, StringRecord};
use std::collections::HashMap;

/// Header name → column position for one parsed table.
#[derive(Debug, Clone, Default)]
pub struct Columns {
    index: HashMap<String, usize>,
}

impl Columns {
    pub fn from_names<'a, I>(names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut index = HashMap::new();
        for (i, name) in names.into_iter().enumerate() {
            // first occurrence wins on repeated header names
            index.entry(clean_header(name)).or_insert(i);
        }
        Self { index }
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn contains_all(&self, names: &[&str]) -> bool {
        names.iter().all(|n| self.index.contains_key(*n))
    }

    /// Resolve every name in `names`, failing with the full list of absent
    /// columns if any is missing. `source` only labels the error.
    pub fn require<const N: usize>(&self, names: [&str; N], source: &str) -> Result<[usize; N]> {
        let found = names.map(|n| self.get(n));
        let missing: Vec<&str> = names
            .iter()
            .zip(found.iter())
            .filter(|(_, idx)| idx.is_none())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            bail!("{} is missing required column(s): {}", source, missing.join(", "));
        }
        Ok(found.map(|idx| idx.unwrap_or_default()))
    }
}

/// Trim whitespace and a leading byte-order mark from a header cell.
pub fn clean_header(raw: &str) -> String {
    raw.trim().trim_start_matches('\u{feff}').trim().to_string()
}

#[derive(Debug)]
pub struct RawTable {
    /// Header names as they appear in the file, cleaned.
    pub headers: Vec<String>,
    pub columns: Columns,
    /// Every data record, in file order.
    pub rows: Vec<StringRecord>,
}

impl RawTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Trimmed value of column `idx`; short records read as empty.
pub fn field(row: &StringRecord, idx: usize) -> &str {
    row.get(idx).map(str::trim).unwrap_or("")
}

/// Parse already-decoded delimited text into a [`RawTable`].
///
/// The first record is the header. Records with fewer or more fields than the
/// header are accepted; missing trailing fields read as empty.
pub fn parse_delimited(text: &str, delimiter: u8, source: &str) -> Result<RawTable> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(text.as_bytes());

    let header_record = rdr
        .headers()
        .with_context(|| format!("failed to read header of {}", source))?
        .clone();
    let headers: Vec<String> = header_record.iter().map(clean_header).collect();
    let columns = Columns::from_names(headers.iter().map(String::as_str));

    let mut rows = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record =
            result.with_context(|| format!("CSV parse error in {} at record {}", source, idx))?;
        rows.push(record);
    }

    Ok(RawTable {
        headers,
        columns,
        rows,
    })
}

#[cfg(test)]
pub(crate) fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,regional_etl=debug")),
        )
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_headers_and_short_rows() -> Result<()> {
        let text = "\u{feff} ADM_CD |ADM_SECT_NM|extra\n1111051500|청운효자동|x\n11110\n";
        let table = parse_delimited(text, b'|', "inline")?;

        assert_eq!(table.headers, vec!["ADM_CD", "ADM_SECT_NM", "extra"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.columns.get("ADM_CD"), Some(0));
        assert_eq!(field(&table.rows[0], 1), "청운효자동");
        assert_eq!(field(&table.rows[1], 1), "");
        Ok(())
    }

    #[test]
    fn require_lists_every_missing_column() -> Result<()> {
        let table = parse_delimited("a,b\n1,2\n", b',', "sample.csv")?;
        let [b] = table.columns.require(["b"], "sample.csv")?;
        assert_eq!(b, 1);

        let err = table
            .columns
            .require(["a", "amt", "admi_cty_no"], "sample.csv")
            .unwrap_err()
            .to_string();
        assert!(err.contains("sample.csv"));
        assert!(err.contains("amt, admi_cty_no"));
        Ok(())
    }
}
