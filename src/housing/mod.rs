//! Monthly apartment price-index spreadsheets → quarterly means per region.

pub mod sheet;

use anyhow::{bail, Context, Result};
use std::path::Path;
use tracing::{info, instrument};

use crate::process::write::write_bom_csv;
use sheet::{load_sheet, Sheet};

pub const REGION_COLUMN: &str = "지역";

/// Column holding `month` of `year`, e.g. `2024년 3월`.
pub fn month_column(year: i32, month: u32) -> String {
    format!("{}년 {}월", year, month)
}

/// Output column for `quarter` of `year`, e.g. `2024_3분기`.
pub fn quarter_column(year: i32, quarter: u32) -> String {
    format!("{}_{}분기", year, quarter)
}

#[derive(Debug, Clone, PartialEq)]
pub struct HousingIndexRecord {
    pub region: String,
    /// Q1..Q4 means; `None` when every month of the quarter was missing.
    pub quarters: [Option<f64>; 4],
}

/// Read the index sheet at `input`, average each quarter of `year` per region
/// and write `지역, {year}_1분기 .. {year}_4분기` to `output`.
#[instrument(level = "info", skip_all, fields(input = %input.as_ref().display(), year = year))]
pub fn quarterize_housing_index<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    year: i32,
) -> Result<Vec<HousingIndexRecord>> {
    let (input, output) = (input.as_ref(), output.as_ref());
    let sheet = load_sheet(input)
        .with_context(|| format!("loading housing index {}", input.display()))?;
    let records = quarterly_means(&sheet, year, &input.display().to_string())?;

    let header: Vec<String> = std::iter::once(REGION_COLUMN.to_string())
        .chain((1..=4).map(|q| quarter_column(year, q)))
        .collect();
    let rows = records.iter().map(|r| {
        let [q1, q2, q3, q4] = r.quarters;
        (r.region.as_str(), q1, q2, q3, q4)
    });
    write_bom_csv(output, header.as_slice(), rows)?;

    info!(output = %output.display(), rows = records.len(), "housing index saved");
    Ok(records)
}

/// Mean of each quarter's three monthly columns, per row of `sheet`.
///
/// Non-numeric cells are excluded from the mean. The region column and all
/// twelve month columns must be present.
pub fn quarterly_means(sheet: &Sheet, year: i32, source: &str) -> Result<Vec<HousingIndexRecord>> {
    let Some(region_idx) = sheet.columns.get(REGION_COLUMN) else {
        bail!("{} is missing required column(s): {}", source, REGION_COLUMN);
    };

    let month_names: Vec<String> = (1..=12).map(|m| month_column(year, m)).collect();
    let month_idx: Vec<Option<usize>> = month_names.iter().map(|n| sheet.columns.get(n)).collect();
    let missing: Vec<&str> = month_names
        .iter()
        .zip(&month_idx)
        .filter(|(_, idx)| idx.is_none())
        .map(|(name, _)| name.as_str())
        .collect();
    if !missing.is_empty() {
        bail!("{} is missing required column(s): {}", source, missing.join(", "));
    }
    let month_idx: Vec<usize> = month_idx.into_iter().flatten().collect();

    let records = (0..sheet.rows.len())
        .map(|row| HousingIndexRecord {
            region: sheet.cell(row, region_idx).to_text(),
            quarters: std::array::from_fn(|q| {
                mean(
                    month_idx[q * 3..q * 3 + 3]
                        .iter()
                        .filter_map(|&col| sheet.cell(row, col).to_number()),
                )
            }),
        })
        .collect();
    Ok(records)
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

#[cfg(test)]
mod tests {
    use super::sheet::Cell;
    use super::*;
    use crate::process::init_test_logging;
    use std::fs;
    use tempfile::TempDir;

    fn header(year: i32) -> Vec<String> {
        std::iter::once(REGION_COLUMN.to_string())
            .chain((1..=12).map(|m| month_column(year, m)))
            .collect()
    }

    fn row(region: &str, months: [&str; 12]) -> Vec<Cell> {
        std::iter::once(Cell::from(region))
            .chain(months.iter().map(|m| Cell::from(*m)))
            .collect()
    }

    #[test]
    fn missing_months_are_excluded_from_mean() -> Result<()> {
        let sheet = Sheet::new(
            header(2024),
            vec![
                row(
                    "서울",
                    ["10", "N/A", "30", "", "", "", "1", "2", "3", "100", "100", "101"],
                ),
                row(
                    "부산",
                    ["1", "1", "1", "2", "2", "2", "3", "3", "3", "4", "4", "4"],
                ),
            ],
        );

        let records = quarterly_means(&sheet, 2024, "inline")?;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].region, "서울");
        assert_eq!(records[0].quarters[0], Some(20.0));
        assert_eq!(records[0].quarters[1], None);
        assert_eq!(records[0].quarters[2], Some(2.0));
        assert_eq!(records[0].quarters[3], Some(301.0 / 3.0));
        assert_eq!(
            records[1].quarters,
            [Some(1.0), Some(2.0), Some(3.0), Some(4.0)]
        );
        Ok(())
    }

    #[test]
    fn numeric_cells_are_used_directly() -> Result<()> {
        let mut cells = vec![Cell::Text("경기".into())];
        cells.extend((1..=12).map(|m| Cell::Number(m as f64)));
        let sheet = Sheet::new(header(2024), vec![cells]);

        let records = quarterly_means(&sheet, 2024, "inline")?;
        assert_eq!(
            records[0].quarters,
            [Some(2.0), Some(5.0), Some(8.0), Some(11.0)]
        );
        Ok(())
    }

    #[test]
    fn missing_columns_are_named() {
        let mut cols = header(2024);
        cols.retain(|c| c != "2024년 7월");
        let err = quarterly_means(&Sheet::new(cols, vec![]), 2024, "sale.xlsx")
            .unwrap_err()
            .to_string();
        assert!(err.contains("2024년 7월"), "{}", err);

        let no_region = Sheet::new(header(2024)[1..].to_vec(), vec![]);
        let err = quarterly_means(&no_region, 2024, "sale.xlsx")
            .unwrap_err()
            .to_string();
        assert!(err.contains(REGION_COLUMN), "{}", err);

        // wrong year is a missing-column error too
        assert!(quarterly_means(&Sheet::new(header(2023), vec![]), 2024, "sale.xlsx").is_err());
    }

    #[test]
    fn writes_quarterly_csv() -> Result<()> {
        init_test_logging();
        let dir = TempDir::new()?;
        let input = dir.path().join("sale.csv");
        let mut text = header(2024).join(",");
        text.push('\n');
        text.push_str("서울,10,N/A,30,4,5,6,,,,100,100,100\n");
        fs::write(&input, text)?;
        let output = dir.path().join("매매지수_2024분기.csv");

        let records = quarterize_housing_index(&input, &output, 2024)?;
        assert_eq!(records.len(), 1);

        let written = fs::read_to_string(&output)?;
        assert_eq!(
            written,
            "\u{feff}지역,2024_1분기,2024_2분기,2024_3분기,2024_4분기\n서울,20.0,5.0,,100.0\n"
        );
        Ok(())
    }
}
