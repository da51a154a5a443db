use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::{Error, Result};
use crate::models::AppReference;

const REQUIRED_COLUMNS: [&str; 2] = ["app_name", "package_name"];

#[derive(Debug, Deserialize)]
struct AppRow {
    app_name: String,
    package_name: String,
}

/// Read an app list table with `app_name` and `package_name` columns.
/// Other columns are ignored.
pub fn read_app_list<R: Read>(reader: R) -> Result<Vec<AppReference>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?;
    let has_required = REQUIRED_COLUMNS
        .iter()
        .all(|col| headers.iter().any(|h| h == *col));
    if !has_required {
        return Err(Error::Validation(
            "CSV must contain columns: app_name and package_name".to_string(),
        ));
    }

    let mut references = Vec::new();
    for row in reader.deserialize::<AppRow>() {
        let row = row?;
        references.push(AppReference::direct(row.app_name, row.package_name));
    }

    Ok(references)
}

/// Read an app list from a CSV file on disk
pub fn read_app_list_file(path: impl AsRef<Path>) -> Result<Vec<AppReference>> {
    let path = path.as_ref();
    let references = read_app_list(File::open(path)?)?;
    info!(path = %path.display(), apps = references.len(), "Loaded app list");
    Ok(references)
}
