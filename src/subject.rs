use std::path::Path;

use log::{info, warn};

/// Read subject IDs from the first column of a headerless CSV file
///
/// Other columns are ignored and rows can have any number of them. Order and duplicates are kept.
pub fn read_subjects(path: &Path) -> Result<Vec<String>, csv::Error> {
    info!("Reading subjects from {}", path.display());
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut subjects: Vec<String> = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        match record.get(0) {
            Some(id) if !id.is_empty() => subjects.push(id.to_string()),
            _ => warn!("Row {} of {} has no subject ID, ignoring it", i + 1, path.display()),
        }
    }

    info!("Read {} subjects", subjects.len());
    Ok(subjects)
}
