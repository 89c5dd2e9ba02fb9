//! Administrative district code table.
//!
//! The raw table lists every administrative unit down to sub-district level.
//! Only municipal (city/county) codes are kept: the 8-character prefix of
//! `ADM_CD` ending in `"00"`.

use anyhow::{Context, Result};
use serde::Serialize;
use std::{
    collections::{HashMap, HashSet},
    fs,
    path::Path,
};
use tracing::{debug, info, instrument};

use crate::process::{
    decode::{decode_cp949, decode_with_fallback},
    field, parse_delimited,
    write::write_bom_csv,
    RawTable,
};

pub const CODE_COLUMN: &str = "ADM_CD";
pub const NAME_COLUMN: &str = "ADM_SECT_NM";

const CODE_LEN: usize = 8;
const MUNICIPAL_SUFFIX: &str = "00";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AdminCodeRecord {
    pub code: String,
    pub district_name: String,
}

impl AdminCodeRecord {
    pub fn is_municipal(&self) -> bool {
        self.code.chars().count() == CODE_LEN && self.code.ends_with(MUNICIPAL_SUFFIX)
    }
}

/// Read the pipe-delimited CP949 code table at `input`, keep municipal codes
/// and write them to `output` as `ADM_CD,ADM_SECT_NM`.
#[instrument(level = "info", skip_all, fields(input = %input.as_ref().display()))]
pub fn normalize_admin_codes<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
) -> Result<Vec<AdminCodeRecord>> {
    let (input, output) = (input.as_ref(), output.as_ref());
    let source = input.display().to_string();

    let bytes =
        fs::read(input).with_context(|| format!("failed to read admin code table {}", source))?;
    let text = decode_cp949(&bytes).with_context(|| format!("decoding {}", source))?;
    let table = parse_delimited(&text, b'|', &source)?;
    debug!(rows = table.len(), "admin code table parsed");

    let records = municipal_codes(&table, &source)?;
    write_bom_csv(output, &[CODE_COLUMN, NAME_COLUMN], &records)?;

    info!(output = %output.display(), rows = records.len(), "admin code table saved");
    Ok(records)
}

/// Truncate codes to 8 characters, keep the `"00"`-suffixed ones and drop
/// repeated (code, name) pairs, preserving first-seen order.
pub fn municipal_codes(table: &RawTable, source: &str) -> Result<Vec<AdminCodeRecord>> {
    let [code_idx, name_idx] = table.columns.require([CODE_COLUMN, NAME_COLUMN], source)?;

    let mut seen = HashSet::new();
    let mut records = Vec::new();
    for row in &table.rows {
        let record = AdminCodeRecord {
            code: field(row, code_idx).chars().take(CODE_LEN).collect(),
            district_name: field(row, name_idx).to_string(),
        };
        if record.is_municipal() && seen.insert(record.clone()) {
            records.push(record);
        }
    }
    Ok(records)
}

/// Lookup from code to district name(s), used as the join table for card
/// spending. A code listed under several names maps to all of them.
#[derive(Debug, Default, Clone)]
pub struct CodeMap {
    names: HashMap<String, Vec<String>>,
}

impl CodeMap {
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a AdminCodeRecord>,
    {
        let mut names: HashMap<String, Vec<String>> = HashMap::new();
        for r in records {
            names
                .entry(r.code.clone())
                .or_default()
                .push(r.district_name.clone());
        }
        Self { names }
    }

    pub fn lookup(&self, code: &str) -> Option<&[String]> {
        self.names.get(code).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Load any CSV with `ADM_CD` and `ADM_SECT_NM` columns as a [`CodeMap`].
/// Codes are taken verbatim; no municipal filtering is applied here.
#[instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
pub fn load_code_map<P: AsRef<Path>>(path: P) -> Result<CodeMap> {
    let path = path.as_ref();
    let source = path.display().to_string();
    let bytes = fs::read(path).with_context(|| format!("failed to read code map {}", source))?;
    let (text, encoding) = decode_with_fallback(&bytes);
    let table = parse_delimited(&text, b',', &source)?;
    let [code_idx, name_idx] = table.columns.require([CODE_COLUMN, NAME_COLUMN], &source)?;

    let records: Vec<AdminCodeRecord> = table
        .rows
        .iter()
        .map(|row| AdminCodeRecord {
            code: field(row, code_idx).to_string(),
            district_name: field(row, name_idx).to_string(),
        })
        .collect();
    let map = CodeMap::from_records(&records);
    debug!(%encoding, codes = map.len(), "code map loaded");
    Ok(map)
}
