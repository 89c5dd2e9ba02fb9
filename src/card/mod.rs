//! Card-spending aggregation.
//!
//! Monthly archives (`*_YYYYMM.zip`) each hold one or more CSV members with
//! per-sub-district spending. Members are summed per code, tagged with the
//! archive's year and quarter, joined to the municipal code table and then
//! totalled per region, year and quarter.

pub mod archive;

use anyhow::{bail, Context, Result};
use glob::{glob, Pattern};
use serde::Serialize;
use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument, warn};

use crate::admin::{load_code_map, CodeMap};
use crate::process::{
    utils::{format_amount, period_from_archive_name},
    write::write_bom_csv,
};

pub const AMOUNT_COLUMN: &str = "amt";
pub const SUB_DISTRICT_COLUMN: &str = "admi_cty_no";

pub const OUTPUT_HEADER: [&str; 5] = ["지역", "연도", "분기", "소비금액", "소비금액(억)"];

/// One hundred million won, the display unit of the scaled column.
const EOK: f64 = 1e8;

/// Per-file spending of one sub-district, tagged with the archive period.
#[derive(Debug, Clone, PartialEq)]
pub struct CardSpendingRecord {
    pub sub_district_code: String,
    pub year: i32,
    pub quarter: u32,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuarterlySpendingRecord {
    /// `None` when the sub-district code had no match in the code table.
    pub region: Option<String>,
    pub year: i32,
    pub quarter: u32,
    pub total_amount: f64,
}

impl QuarterlySpendingRecord {
    pub fn total_amount_scaled(&self) -> f64 {
        scale_to_eok(self.total_amount)
    }
}

#[derive(Serialize)]
struct OutputRow<'a> {
    region: &'a str,
    year: i32,
    quarter: u32,
    amount: String,
    amount_eok: f64,
}

impl<'a> From<&'a QuarterlySpendingRecord> for OutputRow<'a> {
    fn from(r: &'a QuarterlySpendingRecord) -> Self {
        OutputRow {
            region: r.region.as_deref().unwrap_or(""),
            year: r.year,
            quarter: r.quarter,
            amount: format_amount(r.total_amount),
            amount_eok: r.total_amount_scaled(),
        }
    }
}

/// `amount / 1e8`, rounded to one decimal with ties to even.
pub fn scale_to_eok(amount: f64) -> f64 {
    (amount / EOK * 10.0).round_ties_even() / 10.0
}

/// Aggregate every archive under `zip_dir` into quarterly regional totals and
/// write them to `output`.
#[instrument(level = "info", skip_all, fields(zip_dir = %zip_dir.as_ref().display()))]
pub fn aggregate_card_spending<P, Q, R>(
    zip_dir: P,
    code_map_path: Q,
    output: R,
) -> Result<Vec<QuarterlySpendingRecord>>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    R: AsRef<Path>,
{
    let output = output.as_ref();
    let code_map = load_code_map(code_map_path)?;
    let spending = collect_spending(zip_dir)?;

    let (records, unmatched) = aggregate_quarterly(&spending, &code_map);
    if !unmatched.is_empty() {
        let sample: Vec<&str> = unmatched.iter().take(10).map(String::as_str).collect();
        warn!(
            codes = unmatched.len(),
            ?sample,
            "sub-district codes without a region; totalled under a blank region"
        );
    }

    write_bom_csv(output, &OUTPUT_HEADER, records.iter().map(OutputRow::from))?;
    info!(output = %output.display(), rows = records.len(), "card spending saved");
    Ok(records)
}

/// Read every `*.zip` directly under `zip_dir`, in file-name order.
///
/// Fails if the directory is missing or if no archive member carried both
/// `amt` and `admi_cty_no`.
pub fn collect_spending<P: AsRef<Path>>(zip_dir: P) -> Result<Vec<CardSpendingRecord>> {
    let zip_dir = zip_dir.as_ref();
    if !zip_dir.is_dir() {
        bail!("card archive directory {} does not exist", zip_dir.display());
    }

    let pattern = format!("{}/*.zip", Pattern::escape(&zip_dir.to_string_lossy()));
    let mut zips: Vec<PathBuf> = Vec::new();
    for entry in glob(&pattern).with_context(|| format!("bad glob pattern {}", pattern))? {
        zips.push(entry.context("listing card archives")?);
    }
    zips.sort();
    debug!(archives = zips.len(), "card archives found");

    let mut spending = Vec::new();
    let mut tables = 0usize;
    for zip_path in &zips {
        let name = zip_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let period = period_from_archive_name(&name)?;
        let quarter = period.quarter();

        let members = archive::read_archive(zip_path)?;
        debug!(
            archive = %name,
            year = period.year,
            quarter,
            members = members.len(),
            "archive read"
        );
        for member in members {
            tables += 1;
            spending.extend(member.totals.into_iter().map(|(code, amount)| {
                CardSpendingRecord {
                    sub_district_code: code,
                    year: period.year,
                    quarter,
                    amount,
                }
            }));
        }
    }

    if tables == 0 {
        bail!(
            "no card-spending tables with `{}` and `{}` columns found in {} ({} archives)",
            SUB_DISTRICT_COLUMN,
            AMOUNT_COLUMN,
            zip_dir.display(),
            zips.len()
        );
    }
    Ok(spending)
}

/// Left-join spending to `code_map` and total per (region, year, quarter).
///
/// Returns the sorted totals and the set of codes that found no region.
pub fn aggregate_quarterly(
    spending: &[CardSpendingRecord],
    code_map: &CodeMap,
) -> (Vec<QuarterlySpendingRecord>, BTreeSet<String>) {
    let mut groups: BTreeMap<(Option<String>, i32, u32), f64> = BTreeMap::new();
    let mut unmatched = BTreeSet::new();

    for rec in spending {
        match code_map.lookup(&rec.sub_district_code) {
            Some(names) => {
                for name in names {
                    *groups
                        .entry((Some(name.clone()), rec.year, rec.quarter))
                        .or_insert(0.0) += rec.amount;
                }
            }
            None => {
                unmatched.insert(rec.sub_district_code.clone());
                *groups
                    .entry((None, rec.year, rec.quarter))
                    .or_insert(0.0) += rec.amount;
            }
        }
    }

    let mut records: Vec<QuarterlySpendingRecord> = groups
        .into_iter()
        .map(|((region, year, quarter), total_amount)| QuarterlySpendingRecord {
            region,
            year,
            quarter,
            total_amount,
        })
        .collect();
    sort_records(&mut records);
    (records, unmatched)
}

/// Year ascending, quarter ascending, amount descending. Stable.
pub fn sort_records(records: &mut [QuarterlySpendingRecord]) {
    records.sort_by(|a, b| {
        a.year
            .cmp(&b.year)
            .then(a.quarter.cmp(&b.quarter))
            .then(b.total_amount.total_cmp(&a.total_amount))
    });
}
