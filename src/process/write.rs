use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::Serialize;
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use tracing::debug;

pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Write `header` then one serialized row per record as UTF-8 CSV with a BOM.
///
/// The file is written to a temporary sibling and renamed over `path`, so a
/// failure never leaves a partial output behind. Returns the number of rows.
pub fn write_bom_csv<P, H, I, T>(path: P, header: &[H], records: I) -> Result<usize>
where
    P: AsRef<Path>,
    H: AsRef<[u8]>,
    I: IntoIterator<Item = T>,
    T: Serialize,
{
    let path = path.as_ref();
    let dir: PathBuf = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)
        .with_context(|| format!("creating output directory {}", dir.display()))?;

    let mut tmp = NamedTempFile::new_in(&dir)
        .with_context(|| format!("creating temp file in {}", dir.display()))?;
    tmp.write_all(UTF8_BOM)?;

    let mut rows = 0usize;
    {
        let mut wtr = WriterBuilder::new()
            .has_headers(false)
            .from_writer(tmp.as_file_mut());
        wtr.write_record(header)
            .with_context(|| format!("writing header of {}", path.display()))?;
        for record in records {
            wtr.serialize(record)
                .with_context(|| format!("writing row {} of {}", rows, path.display()))?;
            rows += 1;
        }
        wtr.flush()
            .with_context(|| format!("flushing {}", path.display()))?;
    }

    tmp.persist(path)
        .with_context(|| format!("moving temp file onto {}", path.display()))?;
    debug!(path = %path.display(), rows, "csv written");
    Ok(rows)
}
