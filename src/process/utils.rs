use anyhow::{anyhow, bail, Result};
use chrono::NaiveDate;

/// Year and month a monthly archive covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn quarter(&self) -> u32 {
        quarter_of_month(self.month)
    }
}

/// 1..=3 → 1, 4..=6 → 2, 7..=9 → 3, 10..=12 → 4.
pub fn quarter_of_month(month: u32) -> u32 {
    month.saturating_sub(1) / 3 + 1
}

/// Extracts the period from an archive name ending in `YYYYMM` plus a
/// four-character extension, e.g. `카드소비 데이터_202401.zip`.
pub fn period_from_archive_name(file_name: &str) -> Result<Period> {
    let chars: Vec<char> = file_name.chars().collect();
    if chars.len() < 10 {
        bail!("archive name {:?} is too short to carry a YYYYMM suffix", file_name);
    }
    let n = chars.len();
    let year_str: String = chars[n - 10..n - 6].iter().collect();
    let month_str: String = chars[n - 6..n - 4].iter().collect();

    if !year_str.chars().all(|c| c.is_ascii_digit())
        || !month_str.chars().all(|c| c.is_ascii_digit())
    {
        bail!(
            "archive name {:?} has no numeric YYYYMM suffix (found {:?}{:?})",
            file_name,
            year_str,
            month_str
        );
    }
    let year: i32 = year_str.parse()?;
    let month: u32 = month_str.parse()?;

    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| anyhow!("archive name {:?} has invalid month {}", file_name, month))?;

    Ok(Period { year, month })
}

/// Cell values read as missing rather than as data, alongside the empty cell.
pub const NA_TOKENS: [&str; 18] = [
    "NA", "N/A", "NaN", "nan", "null", "NULL", "#N/A", "-NaN", "<NA>", "None", "n/a", "-nan",
    "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "1.#IND", "1.#QNAN",
];

pub fn is_missing(raw: &str) -> bool {
    let raw = raw.trim();
    raw.is_empty() || NA_TOKENS.contains(&raw)
}

/// Lenient numeric coercion: anything that is not a finite number is missing.
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Integral values print without a fractional part.
pub fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_from_monthly_archive() -> Result<()> {
        let p = period_from_archive_name("카드소비 데이터_202401.zip")?;
        assert_eq!(p, Period { year: 2024, month: 1 });
        assert_eq!(p.quarter(), 1);

        let p = period_from_archive_name("card_202311.zip")?;
        assert_eq!((p.year, p.month, p.quarter()), (2023, 11, 4));
        Ok(())
    }

    #[test]
    fn period_rejects_bad_suffix() {
        assert!(period_from_archive_name("a.zip").is_err());
        assert!(period_from_archive_name("card_2024ab.zip").is_err());
        assert!(period_from_archive_name("card_202413.zip").is_err());
        assert!(period_from_archive_name("card_202400.zip").is_err());
    }

    #[test]
    fn quarters_cover_the_year() {
        let quarters: Vec<u32> = (1..=12).map(quarter_of_month).collect();
        assert_eq!(quarters, vec![1, 1, 1, 2, 2, 2, 3, 3, 3, 4, 4, 4]);
    }

    #[test]
    fn numeric_coercion() {
        assert_eq!(parse_number(" 101.5 "), Some(101.5));
        assert_eq!(parse_number("N/A"), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("NaN"), None);
    }

    #[test]
    fn na_tokens_are_missing() {
        for token in ["", " ", "NA", "N/A", "NaN", "null", "#N/A", "<NA>", "-1.#IND"] {
            assert!(is_missing(token), "{:?} should be missing", token);
        }
        assert!(!is_missing("0"));
        assert!(!is_missing("inf"));
        assert!(!is_missing("nil"));
    }

    #[test]
    fn amounts_format_without_trailing_zero() {
        assert_eq!(format_amount(250_000_000.0), "250000000");
        assert_eq!(format_amount(12.25), "12.25");
    }
}
