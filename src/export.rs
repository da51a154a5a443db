use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::ExportConfig;
use crate::error::{Error, Result};
use crate::models::{Column, ColumnProjection, ReviewBatch};
use crate::normalizer::project_columns;

const FILE_SUFFIX: &str = "_reviews.csv";
const FALLBACK_STEM: &str = "app";
const MAX_FILE_NAME_BYTES: usize = 255;
const RESERVED: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Export-time choices that shape the CSV header
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportOptions {
    pub include_review_id: bool,
    pub projection: ColumnProjection,
}

impl From<&ExportConfig> for ExportOptions {
    fn from(config: &ExportConfig) -> Self {
        Self {
            include_review_id: config.include_review_id,
            projection: config.projection,
        }
    }
}

/// Serializes a review batch to UTF-8 CSV
pub struct Exporter {
    options: ExportOptions,
}

impl Exporter {
    pub fn new(options: ExportOptions) -> Self {
        Self { options }
    }

    /// Header columns this exporter would write for `batch`
    pub fn columns(&self, batch: &ReviewBatch) -> Vec<Column> {
        project_columns(
            batch.rows(),
            self.options.projection,
            self.options.include_review_id,
        )
    }

    /// Render `batch` as CSV bytes: a header row, then one row per review
    pub fn export(&self, batch: &ReviewBatch) -> Result<Vec<u8>> {
        let columns = self.columns(batch);

        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        writer.write_record(columns.iter().map(|c| c.header()))?;
        for row in batch.rows() {
            writer.write_record(columns.iter().map(|&c| row.cell(c)))?;
        }
        writer.flush()?;

        let bytes = writer.into_inner().map_err(|e| Error::Io(e.into_error()))?;
        debug!(rows = batch.len(), bytes = bytes.len(), "Rendered CSV export");

        Ok(bytes)
    }

    /// Write the export into `dir` under the file name derived from `label`
    pub fn write_to_dir(&self, batch: &ReviewBatch, dir: &Path, label: &str) -> Result<PathBuf> {
        let bytes = self.export(batch)?;

        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
        let path = dir.join(file_name(label));
        fs::write(&path, bytes)?;

        info!(path = %path.display(), rows = batch.len(), "Wrote review export");

        Ok(path)
    }
}

/// Derive the export file name for an app name or batch label.
///
/// Lower-cases, turns spaces into underscores, strips parentheses and appends `_reviews.csv`.
/// Path separators and other reserved characters become underscores, control characters and
/// leading dots are dropped. The whole name fits in 255 bytes; a longer stem is cut on a
/// char boundary and loses any trailing underscores.
pub fn file_name(label: &str) -> String {
    let stem: String = label
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '(' | ')') && !c.is_control())
        .map(|c| if c == ' ' || RESERVED.contains(&c) { '_' } else { c })
        .collect();
    let mut stem = stem.trim_start_matches('.');

    let max_stem = MAX_FILE_NAME_BYTES - FILE_SUFFIX.len();
    if stem.len() > max_stem {
        let mut cut = max_stem;
        while !stem.is_char_boundary(cut) {
            cut -= 1;
        }
        stem = stem[..cut].trim_end_matches('_');
    }

    if stem.is_empty() {
        format!("{}{}", FALLBACK_STEM, FILE_SUFFIX)
    } else {
        format!("{}{}", stem, FILE_SUFFIX)
    }
}
