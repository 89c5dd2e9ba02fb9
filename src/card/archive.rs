// src/card/archive.rs
use anyhow::{anyhow, Context, Result};
use std::{cmp::Ordering, collections::HashMap, fs::File, io::Read, path::Path};
use tracing::{debug, warn};
use zip::ZipArchive;

use crate::process::{
    decode::{decode_with_fallback, TextEncoding},
    field, parse_delimited,
    utils::{is_missing, parse_number},
    RawTable,
};

use super::{AMOUNT_COLUMN, SUB_DISTRICT_COLUMN};

/// Spending of one CSV member, summed per sub-district code.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberSpending {
    pub member: String,
    pub encoding: TextEncoding,
    /// `(sub-district code, summed amount)`, ordered by code.
    pub totals: Vec<(String, f64)>,
}

/// Open `zip_path`, decode every `.csv` member and sum `amt` per
/// `admi_cty_no` within each member.
///
/// Members without both columns are skipped. Only members that contributed a
/// table are returned, in archive order.
#[tracing::instrument(level = "debug", skip(zip_path), fields(path = %zip_path.as_ref().display()))]
pub fn read_archive<P: AsRef<Path>>(zip_path: P) -> Result<Vec<MemberSpending>> {
    let zip_path = zip_path.as_ref();

    // 1) Buffer each .csv entry, in archive order
    let buffers = {
        let file = File::open(zip_path)
            .with_context(|| format!("Failed to open ZIP file: {:?}", zip_path))?;
        let mut archive = ZipArchive::new(file)
            .with_context(|| format!("Failed to read ZIP archive: {:?}", zip_path))?;

        let mut buffers: Vec<(String, Vec<u8>)> = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).with_context(|| {
                format!("Failed to access ZIP entry #{} in {:?}", i, zip_path)
            })?;
            let name = entry.name().to_string();
            if !entry.is_file() || !name.ends_with(".csv") {
                continue;
            }
            let mut buf = Vec::with_capacity(entry.size() as usize);
            entry
                .read_to_end(&mut buf)
                .with_context(|| format!("Failed to read {} into memory", name))?;
            buffers.push((name, buf));
        }
        buffers
        // archive and its file handle are released here
    };

    // 2) Decode and aggregate each member
    let mut members = Vec::with_capacity(buffers.len());
    for (name, bytes) in buffers {
        let source = format!("{}!{}", zip_path.display(), name);
        let (text, encoding) = decode_with_fallback(&bytes);
        if encoding == TextEncoding::Windows1252Lossy {
            warn!(member = %name, "member is neither utf-8 nor cp949; decoded lossily");
        }
        let table = parse_delimited(&text, b',', &source)?;

        if !table.columns.contains_all(&[AMOUNT_COLUMN, SUB_DISTRICT_COLUMN]) {
            debug!(
                member = %name,
                headers = ?table.headers,
                "skipping member without amt/admi_cty_no"
            );
            continue;
        }

        let totals = sum_by_code(&table, &source)?;
        debug!(
            member = %name,
            %encoding,
            rows = table.len(),
            codes = totals.len(),
            "member aggregated"
        );
        members.push(MemberSpending {
            member: name,
            encoding,
            totals,
        });
    }

    Ok(members)
}

/// Sum `amt` per `admi_cty_no`. Empty amounts and NA tokens (`NaN`, `N/A`,
/// ...) count as missing; rows without a code are dropped. Any other value
/// that is not a finite number is an error.
pub fn sum_by_code(table: &RawTable, source: &str) -> Result<Vec<(String, f64)>> {
    let [code_idx, amt_idx] = table
        .columns
        .require([SUB_DISTRICT_COLUMN, AMOUNT_COLUMN], source)?;

    let mut totals: HashMap<String, f64> = HashMap::new();
    for (idx, row) in table.rows.iter().enumerate() {
        let code = field(row, code_idx);
        if is_missing(code) {
            continue;
        }
        let total = totals.entry(code.to_string()).or_insert(0.0);
        let raw_amt = field(row, amt_idx);
        if is_missing(raw_amt) {
            continue;
        }
        let amt = parse_number(raw_amt).ok_or_else(|| {
            anyhow!(
                "non-numeric {} value {:?} in {} at record {}",
                AMOUNT_COLUMN,
                raw_amt,
                source,
                idx
            )
        })?;
        *total += amt;
    }

    let mut totals: Vec<(String, f64)> = totals.into_iter().collect();
    totals.sort_by(|(a, _), (b, _)| compare_codes(a, b));
    Ok(totals)
}

/// Integer codes first in numeric order, then any other code lexically.
fn compare_codes(a: &str, b: &str) -> Ordering {
    fn key(code: &str) -> (u8, i64, &str) {
        match code.parse::<i64>() {
            Ok(n) => (0, n, code),
            Err(_) => (1, 0, code),
        }
    }
    key(a).cmp(&key(b))
}
