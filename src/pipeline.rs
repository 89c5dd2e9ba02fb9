use anyhow::Result;
use std::time::Instant;
use tracing::info;

use crate::{admin, card, config::PipelinePaths, housing};

/// Run every stage in order; the first failure aborts the run.
pub fn run(paths: &PipelinePaths) -> Result<()> {
    let start = Instant::now();

    // ─── 1) municipal code table ─────────────────────────────────────
    admin::normalize_admin_codes(&paths.admin_code_input, &paths.admin_code_output)?;

    // ─── 2) card spending, joined to the code table ──────────────────
    card::aggregate_card_spending(
        &paths.card_zip_dir,
        &paths.admin_code_output,
        &paths.card_output,
    )?;

    // ─── 3) sale and rent price indices ──────────────────────────────
    housing::quarterize_housing_index(
        &paths.sale_index_input,
        &paths.sale_index_output,
        paths.housing_year,
    )?;
    housing::quarterize_housing_index(
        &paths.rent_index_input,
        &paths.rent_index_output,
        paths.housing_year,
    )?;

    info!(elapsed = ?start.elapsed(), "all preprocessing done");
    Ok(())
}
